//! `VectorSearch` over the local SQLite index.

use super::store::{SearchFilter, VectorStore};
use crate::domain::SearchHit;
use crate::llm::Embedder;
use crate::retrieve::VectorSearch;
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::sync::{Arc, Mutex};

pub struct IndexSearch {
    store: Mutex<VectorStore>,
    embedder: Arc<dyn Embedder>,
    filter: SearchFilter,
}

impl IndexSearch {
    pub fn new(store: VectorStore, embedder: Arc<dyn Embedder>, filter: SearchFilter) -> Self {
        Self { store: Mutex::new(store), embedder, filter }
    }
}

#[async_trait]
impl VectorSearch for IndexSearch {
    async fn search(&self, query: &str, top_k: usize) -> Result<Vec<SearchHit>> {
        let mut vectors = self.embedder.embed(&[query.to_string()]).await?;
        let vector = vectors.pop().ok_or_else(|| anyhow!("Embedder returned no vector for query"))?;

        let store = self.store.lock().map_err(|_| anyhow!("Index store lock poisoned"))?;
        store.search(&vector, &self.filter, top_k)
    }
}
