//! Chat completion and embedding collaborators.

pub mod openai;

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub use openai::OpenAiClient;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// A single chat message.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self { role: Role::User, content: content.into() }
    }
}

/// Returns the text of the first choice.
#[async_trait]
pub trait CompletionModel: Send + Sync {
    async fn complete(&self, model: &str, messages: &[ChatMessage]) -> Result<String>;
}

/// One vector per input text, in input order.
#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;
}

/// Embed `texts` in sequential batches of `batch_size`, calling
/// `on_batch(done)` after each batch.
pub async fn embed_batched<F>(
    embedder: &dyn Embedder,
    texts: &[String],
    batch_size: usize,
    mut on_batch: F,
) -> Result<Vec<Vec<f32>>>
where
    F: FnMut(usize),
{
    let batch_size = batch_size.max(1);
    let mut vectors = Vec::with_capacity(texts.len());
    for batch in texts.chunks(batch_size) {
        let embedded = embedder.embed(batch).await?;
        if embedded.len() != batch.len() {
            anyhow::bail!(crate::error::LlmError::EmbeddingCount {
                expected: batch.len(),
                got: embedded.len(),
            });
        }
        vectors.extend(embedded);
        on_batch(vectors.len());
    }
    Ok(vectors)
}
