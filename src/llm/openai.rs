//! OpenAI-compatible chat completion and embedding client over raw HTTP.

use super::{ChatMessage, CompletionModel, Embedder};
use crate::error::LlmError;
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

const MAX_ERROR_BODY_LEN: usize = 200;

pub struct OpenAiClient {
    client: Client,
    api_key: String,
    base_url: String,
    embeddings_model: String,
}

impl std::fmt::Debug for OpenAiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiClient")
            .field("base_url", &self.base_url)
            .field("embeddings_model", &self.embeddings_model)
            .field("api_key", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    #[serde(default)]
    index: usize,
    embedding: Vec<f32>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorEnvelope {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
}

impl OpenAiClient {
    pub fn new(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
        embeddings_model: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let client =
            Client::builder().timeout(timeout).build().context("Failed to create HTTP client")?;
        let base_url = base_url.into().trim_end_matches('/').to_string();
        tracing::debug!(base_url = %base_url, "Creating OpenAI-compatible client");
        Ok(Self {
            client,
            api_key: api_key.into(),
            base_url,
            embeddings_model: embeddings_model.into(),
        })
    }

    async fn post(&self, endpoint: &str, body: serde_json::Value) -> Result<String, LlmError> {
        let response = self
            .client
            .post(format!("{}/{}", self.base_url, endpoint))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        if status.is_success() {
            return Ok(text);
        }
        Err(LlmError::Api { status: status.as_u16(), message: error_message(&text) })
    }
}

/// Structured `error.message` when present, otherwise the truncated body.
fn error_message(body: &str) -> String {
    if let Ok(envelope) = serde_json::from_str::<ApiErrorEnvelope>(body) {
        return envelope.error.message;
    }
    if body.len() > MAX_ERROR_BODY_LEN {
        let cut: String = body.chars().take(MAX_ERROR_BODY_LEN).collect();
        format!("{cut}... (truncated)")
    } else {
        body.to_string()
    }
}

fn parse_chat_response(text: &str) -> Result<String, LlmError> {
    let response: ChatResponse = serde_json::from_str(text)?;
    response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .ok_or(LlmError::EmptyResponse)
}

fn parse_embedding_response(text: &str, expected: usize) -> Result<Vec<Vec<f32>>, LlmError> {
    let mut response: EmbeddingResponse = serde_json::from_str(text)?;
    if response.data.len() != expected {
        return Err(LlmError::EmbeddingCount { expected, got: response.data.len() });
    }
    response.data.sort_by_key(|d| d.index);
    Ok(response.data.into_iter().map(|d| d.embedding).collect())
}

#[async_trait]
impl CompletionModel for OpenAiClient {
    async fn complete(&self, model: &str, messages: &[ChatMessage]) -> Result<String> {
        let body = json!({ "model": model, "messages": messages });
        tracing::debug!(model, messages = messages.len(), "Requesting chat completion");
        let text = self.post("chat/completions", body).await?;
        Ok(parse_chat_response(&text)?)
    }
}

#[async_trait]
impl Embedder for OpenAiClient {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        let body = json!({ "model": self.embeddings_model, "input": texts });
        let text = self.post("embeddings", body).await?;
        Ok(parse_embedding_response(&text, texts.len())?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_chat_response() {
        let body = r#"{"choices":[{"index":0,"message":{"role":"assistant","content":"FILE: a.ts"}}]}"#;
        assert_eq!(parse_chat_response(body).expect("content"), "FILE: a.ts");
    }

    #[test]
    fn test_parse_chat_response_without_content() {
        let body = r#"{"choices":[{"message":{"role":"assistant","content":null}}]}"#;
        assert!(matches!(parse_chat_response(body), Err(LlmError::EmptyResponse)));
        assert!(matches!(parse_chat_response(r#"{"choices":[]}"#), Err(LlmError::EmptyResponse)));
    }

    #[test]
    fn test_parse_embedding_response_orders_by_index() {
        let body = r#"{"data":[{"index":1,"embedding":[0.5]},{"index":0,"embedding":[0.25]}]}"#;
        let vectors = parse_embedding_response(body, 2).expect("vectors");
        assert_eq!(vectors, vec![vec![0.25], vec![0.5]]);
    }

    #[test]
    fn test_parse_embedding_response_count_mismatch() {
        let body = r#"{"data":[{"index":0,"embedding":[0.5]}]}"#;
        assert!(matches!(
            parse_embedding_response(body, 3),
            Err(LlmError::EmbeddingCount { expected: 3, got: 1 })
        ));
    }

    #[test]
    fn test_error_message_prefers_structured_error() {
        let body = r#"{"error":{"message":"Incorrect API key provided","type":"invalid_request_error"}}"#;
        assert_eq!(error_message(body), "Incorrect API key provided");
        let long = "x".repeat(500);
        assert!(error_message(&long).ends_with("... (truncated)"));
    }

    #[test]
    fn test_debug_redacts_key() {
        let client = OpenAiClient::new(
            "sk-secret",
            "https://api.openai.com/v1/",
            "text-embedding-ada-002",
            Duration::from_secs(5),
        )
        .expect("client");
        let debug = format!("{client:?}");
        assert!(!debug.contains("sk-secret"));
        assert!(debug.contains("https://api.openai.com/v1\""));
    }
}
