//! Resolved runtime configuration.

use serde::{Deserialize, Deserializer, Serialize};
use std::path::PathBuf;

/// What to do with a planned `create` for a file that already exists.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DuplicateCreatePolicy {
    /// Keep the entry as planned.
    #[default]
    Allow,
    /// Turn the entry into a `modify` of the existing file.
    Convert,
    /// Drop the entry from the plan.
    Reject,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub github_token: String,
    pub openai_api_key: String,
    pub github_owner: String,
    pub github_repo: String,
    pub db_path: Option<PathBuf>,
    pub embeddings_model: String,
    pub completion_model: String,
    pub openai_base_url: String,
    pub github_api_url: String,
    #[serde(deserialize_with = "string_or_list")]
    pub include_globs: Vec<String>,
    #[serde(deserialize_with = "string_or_list")]
    pub exclude_globs: Vec<String>,
    pub context_limit: usize,
    pub max_files: usize,
    pub search_limit: usize,
    pub duplicate_create_policy: DuplicateCreatePolicy,
    pub pr_title_prefix: Option<String>,
    pub request_timeout_secs: u64,
    pub chunk_tokens: usize,
    pub chunk_overlap: usize,
    pub embedding_batch_size: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            github_token: String::new(),
            openai_api_key: String::new(),
            github_owner: String::new(),
            github_repo: String::new(),
            db_path: None,
            embeddings_model: "text-embedding-ada-002".to_string(),
            completion_model: "gpt-4".to_string(),
            openai_base_url: "https://api.openai.com/v1".to_string(),
            github_api_url: "https://api.github.com".to_string(),
            include_globs: default_include_globs().iter().map(|s| s.to_string()).collect(),
            exclude_globs: default_exclude_globs().iter().map(|s| s.to_string()).collect(),
            context_limit: 5,
            max_files: 5,
            search_limit: 10,
            duplicate_create_policy: DuplicateCreatePolicy::Allow,
            pr_title_prefix: None,
            request_timeout_secs: 120,
            chunk_tokens: 375,
            chunk_overlap: 60,
            embedding_batch_size: 100,
        }
    }
}

impl Config {
    /// `owner/name` slug used to tag indexed chunks.
    pub fn repo_slug(&self) -> String {
        format!("{}/{}", self.github_owner, self.github_repo)
    }

    /// Names of required settings that are still empty.
    pub fn missing_required(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.github_token.trim().is_empty() {
            missing.push("GITHUB_TOKEN");
        }
        if self.openai_api_key.trim().is_empty() {
            missing.push("OPENAI_API_KEY");
        }
        if self.github_owner.trim().is_empty() {
            missing.push("GITHUB_OWNER");
        }
        if self.github_repo.trim().is_empty() {
            missing.push("GITHUB_REPO");
        }
        missing
    }
}

pub fn default_include_globs() -> &'static [&'static str] {
    &[
        "**/*.ts", "**/*.tsx", "**/*.js", "**/*.jsx", "**/*.py", "**/*.rb", "**/*.rs", "**/*.go",
        "**/*.java",
    ]
}

pub fn default_exclude_globs() -> &'static [&'static str] {
    &[
        "**/node_modules/**",
        "**/dist/**",
        "**/.git/**",
        "**/build/**",
        "**/target/**",
        "**/__pycache__/**",
        "**/*.min.js",
        "**/*.min.css",
    ]
}

/// Accept either a list of strings or one comma-separated string.
fn string_or_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum StringOrList {
        One(String),
        Many(Vec<String>),
    }

    let raw = match StringOrList::deserialize(deserializer)? {
        StringOrList::One(value) => value.split(',').map(str::to_string).collect::<Vec<_>>(),
        StringOrList::Many(values) => values,
    };
    Ok(raw.into_iter().map(|v| v.trim().to_string()).filter(|v| !v.is_empty()).collect())
}
