//! Repository indexing: fetch, chunk, embed, store.

pub mod search;
pub mod store;

pub use search::IndexSearch;
pub use store::{IndexStats, SearchFilter, VectorStore};

use crate::chunk::{chunk_content, SourceFile};
use crate::domain::Chunk;
use crate::github::RepositoryAccessor;
use crate::llm::{embed_batched, Embedder};
use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use serde::Serialize;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IndexReport {
    pub branch: String,
    pub files_total: usize,
    pub files_indexed: usize,
    pub files_failed: usize,
    pub chunks: usize,
}

#[derive(Debug, Clone, Copy)]
pub struct IndexOptions {
    pub chunk_tokens: usize,
    pub chunk_overlap: usize,
    pub batch_size: usize,
    pub progress: bool,
}

impl Default for IndexOptions {
    fn default() -> Self {
        Self { chunk_tokens: 375, chunk_overlap: 60, batch_size: 100, progress: false }
    }
}

pub struct CodebaseIndexer {
    accessor: RepositoryAccessor,
    embedder: Arc<dyn Embedder>,
    options: IndexOptions,
}

impl CodebaseIndexer {
    pub fn new(
        accessor: RepositoryAccessor,
        embedder: Arc<dyn Embedder>,
        options: IndexOptions,
    ) -> Self {
        Self { accessor, embedder, options }
    }

    /// Rebuild `store` from `branch` (default branch when `None`). The store
    /// is cleared only once every embedding has been computed.
    pub async fn index(
        &self,
        store: &mut VectorStore,
        repo: &str,
        branch: Option<&str>,
    ) -> Result<IndexReport> {
        let branch = match branch {
            Some(b) => b.to_string(),
            None => self.accessor.host().default_branch().await?,
        };
        let paths = self
            .accessor
            .list_matching_files(Some(&branch))
            .await
            .with_context(|| format!("Failed listing files on {branch}"))?;
        tracing::info!("Indexing {} files from {}@{}", paths.len(), repo, branch);

        let fetch_bar = self.bar(paths.len(), "Fetching")?;
        let mut fetched = Vec::with_capacity(paths.len());
        let mut files_failed = 0;
        for path in &paths {
            fetch_bar.set_message(path.clone());
            match self.accessor.host().get_file_content(path, Some(&branch)).await {
                Ok(Some(content)) => fetched.push((SourceFile::new(path.as_str()), content)),
                Ok(None) => {
                    tracing::warn!("Skipping {}: not found on {}", path, branch);
                    files_failed += 1;
                }
                Err(err) => {
                    tracing::warn!("Skipping {}: {:#}", path, err);
                    files_failed += 1;
                }
            }
            fetch_bar.inc(1);
        }
        fetch_bar.finish_and_clear();

        let chunks = self.chunk_all(&fetched);
        tracing::debug!("Produced {} chunks from {} files", chunks.len(), fetched.len());

        let texts: Vec<String> = chunks.iter().map(|c| c.content.clone()).collect();
        let embed_bar = self.bar(texts.len(), "Embedding")?;
        let vectors =
            embed_batched(self.embedder.as_ref(), &texts, self.options.batch_size, |done| {
                embed_bar.set_position(done as u64)
            })
            .await
            .context("Failed embedding chunks")?;
        embed_bar.finish_and_clear();

        store.clear()?;
        let stored = store.insert(&chunks, &vectors, repo, &branch)?;

        Ok(IndexReport {
            branch,
            files_total: paths.len(),
            files_indexed: fetched.len(),
            files_failed,
            chunks: stored,
        })
    }

    fn chunk_all(&self, files: &[(SourceFile, String)]) -> Vec<Chunk> {
        let (max_tokens, overlap) = (self.options.chunk_tokens, self.options.chunk_overlap);
        files
            .par_iter()
            .flat_map_iter(|(file, content)| chunk_content(file, content, max_tokens, overlap))
            .collect()
    }

    fn bar(&self, len: usize, prefix: &'static str) -> Result<ProgressBar> {
        if !self.options.progress {
            return Ok(ProgressBar::hidden());
        }
        let bar = ProgressBar::new(len as u64);
        bar.set_style(
            ProgressStyle::default_bar()
                .template("{prefix:>10.cyan} [{bar:30}] {pos}/{len} {wide_msg}")?
                .progress_chars("=> "),
        );
        bar.set_prefix(prefix);
        Ok(bar)
    }
}
