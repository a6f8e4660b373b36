//! Read access to the target repository that degrades instead of failing.

use super::{PathFilter, PullRequest, PullRequestDraft, SourceHost};
use crate::domain::FileChange;
use anyhow::Result;
use std::collections::BTreeSet;
use std::sync::Arc;

/// Wraps a [`SourceHost`] for the code generation pipeline.
///
/// Listing and content reads never fail: remote errors are logged and
/// reported as "nothing there". Pull request creation propagates errors.
#[derive(Clone)]
pub struct RepositoryAccessor {
    host: Arc<dyn SourceHost>,
    filter: PathFilter,
}

impl RepositoryAccessor {
    pub fn new(host: Arc<dyn SourceHost>, filter: PathFilter) -> Self {
        Self { host, filter }
    }

    pub fn host(&self) -> &Arc<dyn SourceHost> {
        &self.host
    }

    /// Filtered paths on `git_ref` (default branch when `None`).
    pub async fn list_matching_files(&self, git_ref: Option<&str>) -> Result<Vec<String>> {
        let git_ref = match git_ref {
            Some(r) => r.to_string(),
            None => self.host.default_branch().await?,
        };
        let files = self.host.list_files(&git_ref).await?;
        Ok(self.filter.apply(files))
    }

    /// Filtered paths on the default branch; empty on any remote failure.
    pub async fn list_existing_files(&self) -> BTreeSet<String> {
        match self.list_matching_files(None).await {
            Ok(files) => files.into_iter().collect(),
            Err(err) => {
                tracing::warn!("Error getting existing files: {:#}", err);
                BTreeSet::new()
            }
        }
    }

    /// File text on the default branch; `None` when missing or unreadable.
    pub async fn get_file_content(&self, path: &str) -> Option<String> {
        match self.host.get_file_content(path, None).await {
            Ok(Some(content)) => Some(content),
            Ok(None) => {
                tracing::debug!("File not found: {}", path);
                None
            }
            Err(err) => {
                tracing::warn!("Error fetching {}: {:#}", path, err);
                None
            }
        }
    }

    /// Open a pull request against `base_branch` (default branch when `None`).
    pub async fn create_pull_request(
        &self,
        title: &str,
        body: &str,
        files: Vec<FileChange>,
        base_branch: Option<&str>,
    ) -> Result<PullRequest> {
        let base_branch = match base_branch {
            Some(branch) => branch.to_string(),
            None => self.host.default_branch().await?,
        };
        let draft = PullRequestDraft {
            title: title.to_string(),
            body: body.to_string(),
            base_branch,
            head_branch: None,
            files,
        };
        self.host.create_pull_request(&draft).await
    }
}
