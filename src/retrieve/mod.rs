//! Semantic context retrieval over the vector index.

use crate::domain::{ContextItem, SearchHit};
use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;

/// Nearest-neighbour search over indexed chunks, most similar first.
#[async_trait]
pub trait VectorSearch: Send + Sync {
    async fn search(&self, query: &str, top_k: usize) -> Result<Vec<SearchHit>>;
}

#[derive(Clone)]
pub struct ContextRetriever {
    search: Arc<dyn VectorSearch>,
}

impl ContextRetriever {
    pub fn new(search: Arc<dyn VectorSearch>) -> Self {
        Self { search }
    }

    /// At most `limit` snippets for `query`. A blank query or zero limit
    /// returns nothing without touching the index.
    pub async fn retrieve(&self, query: &str, limit: usize) -> Result<Vec<ContextItem>> {
        let query = query.trim();
        if query.is_empty() || limit == 0 {
            return Ok(Vec::new());
        }

        let hits = self.search.search(query, limit).await?;
        tracing::debug!("Retrieved {} snippets for {:?}", hits.len(), query);
        Ok(hits.into_iter().take(limit).map(ContextItem::from).collect())
    }
}

/// Prompt text for `items`: `File: <name>\n<content>` blocks separated by
/// blank lines.
pub fn format_context(items: &[ContextItem]) -> String {
    items.iter().map(ContextItem::to_prompt_block).collect::<Vec<_>>().join("\n\n")
}
