//! Shared CLI utilities.

use crate::config::default_index_path;
use crate::domain::Config;
use crate::github::{GitHubClient, PathFilter, RepositoryAccessor};
use crate::index::{IndexSearch, SearchFilter, VectorStore};
use crate::llm::OpenAiClient;
use crate::retrieve::ContextRetriever;
use anyhow::{Context, Result};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Parse a comma-separated string into a `Vec<String>`, trimming whitespace and
/// discarding empty segments.  Returns `None` when `value` is `None`.
pub fn parse_csv(value: &Option<String>) -> Option<Vec<String>> {
    value.as_ref().map(|s| {
        s.split(',')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(|part| part.to_string())
            .collect::<Vec<_>>()
    })
}

/// Remote clients built from a validated configuration.
pub struct Services {
    pub config: Config,
    pub github: Arc<GitHubClient>,
    pub openai: Arc<OpenAiClient>,
}

impl Services {
    pub fn new(config: Config) -> Result<Self> {
        let timeout = Duration::from_secs(config.request_timeout_secs);
        let github = GitHubClient::new(
            &config.github_token,
            &config.github_api_url,
            &config.github_owner,
            &config.github_repo,
            timeout,
        )?;
        let openai = OpenAiClient::new(
            &config.openai_api_key,
            &config.openai_base_url,
            &config.embeddings_model,
            timeout,
        )?;
        Ok(Self { config, github: Arc::new(github), openai: Arc::new(openai) })
    }

    /// Accessor filtered by the configured globs, or by `include`/`exclude`
    /// when given.
    pub fn accessor(
        &self,
        include: Option<Vec<String>>,
        exclude: Option<Vec<String>>,
    ) -> Result<RepositoryAccessor> {
        let include = include.unwrap_or_else(|| self.config.include_globs.clone());
        let exclude = exclude.unwrap_or_else(|| self.config.exclude_globs.clone());
        let filter = PathFilter::new(&include, &exclude)?;
        Ok(RepositoryAccessor::new(self.github.clone(), filter))
    }

    pub fn index_path(&self) -> PathBuf {
        self.config.db_path.clone().unwrap_or_else(default_index_path)
    }

    pub fn open_store(&self) -> Result<VectorStore> {
        let path = self.index_path();
        tracing::debug!("Opening index at {}", path.display());
        VectorStore::open(&path).with_context(|| format!("Failed opening index {}", path.display()))
    }

    /// Filter restricting search to chunks of the configured repository.
    pub fn repo_filter(&self) -> SearchFilter {
        SearchFilter { repo: Some(self.config.repo_slug()), ..SearchFilter::default() }
    }

    pub fn index_search(&self, filter: SearchFilter) -> Result<IndexSearch> {
        Ok(IndexSearch::new(self.open_store()?, self.openai.clone(), filter))
    }

    pub fn retriever(&self) -> Result<ContextRetriever> {
        let search = self.index_search(self.repo_filter())?;
        Ok(ContextRetriever::new(Arc::new(search)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_csv_trims_and_drops_empty() {
        assert_eq!(
            parse_csv(&Some(" **/*.py, ,**/*.rs".to_string())),
            Some(vec!["**/*.py".to_string(), "**/*.rs".to_string()])
        );
        assert_eq!(parse_csv(&None), None);
    }

    #[test]
    fn services_use_configured_index_path() {
        let tmp = tempfile::TempDir::new().expect("tmp");
        let db = tmp.path().join("nested").join("index.sqlite");
        let config = Config {
            github_token: "t".into(),
            openai_api_key: "k".into(),
            github_owner: "octo".into(),
            github_repo: "demo".into(),
            db_path: Some(db.clone()),
            ..Config::default()
        };
        let services = Services::new(config).expect("services");
        assert_eq!(services.index_path(), db);
        let store = services.open_store().expect("store");
        assert_eq!(store.stats().expect("stats").chunks, 0);
        assert_eq!(services.repo_filter().repo.as_deref(), Some("octo/demo"));
    }
}
