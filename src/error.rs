//! Typed errors for the remote collaborators and the code generation core.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required configuration: {}", .0.join(", "))]
    Missing(Vec<&'static str>),

    #[error("Config file not found: {0}")]
    NotFound(String),

    #[error("Unsupported config extension '.{extension}' for file {path}")]
    UnsupportedFormat { extension: String, path: String },

    #[error("Invalid configuration: {0}")]
    Invalid(#[from] Box<figment::Error>),
}

#[derive(Debug, Error)]
pub enum GitHubError {
    #[error("GitHub API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("GitHub request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Path {0} is a directory")]
    IsDirectory(String),

    #[error("Invalid GitHub API URL: {0}")]
    InvalidUrl(String),

    #[error("Unexpected GitHub response: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Failed to decode content of {path}: {reason}")]
    Decode { path: String, reason: String },
}

impl GitHubError {
    pub fn status(&self) -> Option<u16> {
        match self {
            GitHubError::Api { status, .. } => Some(*status),
            GitHubError::Transport(err) => err.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }

    /// Rate limiting, auth hiccups and server errors are worth another attempt.
    pub fn is_retryable(&self) -> bool {
        match self.status() {
            Some(status) => status == 403 || status == 429 || status >= 500,
            None => matches!(self, GitHubError::Transport(_)),
        }
    }
}

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("LLM API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("LLM request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Failed to parse LLM response: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("LLM response contained no message content")]
    EmptyResponse,

    #[error("Embedding response had {got} vectors for {expected} inputs")]
    EmbeddingCount { expected: usize, got: usize },
}

/// Why a single planned file produced no change.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SynthesisFailureKind {
    #[error("response is missing the {0} marker")]
    MissingMarker(&'static str),

    #[error("response contained an empty file path")]
    EmptyPath,
}
