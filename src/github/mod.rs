//! Remote repository access: the `SourceHost` seam, its GitHub REST
//! implementation, and the degrading accessor used by code generation.

pub mod accessor;
pub mod client;
pub mod filter;

use crate::domain::FileChange;
use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub use accessor::RepositoryAccessor;
pub use client::GitHubClient;
pub use filter::PathFilter;

/// Everything needed to open a pull request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullRequestDraft {
    pub title: String,
    pub body: String,
    pub base_branch: String,
    /// Generated from the title when absent.
    pub head_branch: Option<String>,
    pub files: Vec<FileChange>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequest {
    pub number: u64,
    pub url: String,
}

#[async_trait]
pub trait SourceHost: Send + Sync {
    async fn default_branch(&self) -> Result<String>;

    /// Every blob path reachable from `git_ref`.
    async fn list_files(&self, git_ref: &str) -> Result<Vec<String>>;

    /// `Ok(None)` when the path does not exist at `git_ref`
    /// (default branch when `None`).
    async fn get_file_content(&self, path: &str, git_ref: Option<&str>) -> Result<Option<String>>;

    async fn create_pull_request(&self, draft: &PullRequestDraft) -> Result<PullRequest>;
}
