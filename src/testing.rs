//! In-memory collaborators shared by unit tests.

use crate::domain::SearchHit;
use crate::github::{PullRequest, PullRequestDraft, SourceHost};
use crate::llm::{ChatMessage, CompletionModel, Embedder};
use crate::retrieve::VectorSearch;
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::collections::{BTreeMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

#[derive(Default)]
pub struct MockHost {
    pub files: BTreeMap<String, String>,
    pub fail_listing: bool,
    pub fail_content: bool,
    pub fail_pull_request: bool,
    pub fetched: Mutex<Vec<String>>,
    pub drafts: Mutex<Vec<PullRequestDraft>>,
}

impl MockHost {
    pub fn with_files(files: &[(&str, &str)]) -> Self {
        Self {
            files: files.iter().map(|(p, c)| (p.to_string(), c.to_string())).collect(),
            ..Self::default()
        }
    }

    pub fn fetched(&self) -> Vec<String> {
        self.fetched.lock().expect("lock").clone()
    }

    pub fn drafts(&self) -> Vec<PullRequestDraft> {
        self.drafts.lock().expect("lock").clone()
    }
}

#[async_trait]
impl SourceHost for MockHost {
    async fn default_branch(&self) -> Result<String> {
        if self.fail_listing {
            return Err(anyhow!("GitHub API error (503): unavailable"));
        }
        Ok("main".to_string())
    }

    async fn list_files(&self, _git_ref: &str) -> Result<Vec<String>> {
        if self.fail_listing {
            return Err(anyhow!("GitHub API error (503): unavailable"));
        }
        Ok(self.files.keys().cloned().collect())
    }

    async fn get_file_content(&self, path: &str, _git_ref: Option<&str>) -> Result<Option<String>> {
        self.fetched.lock().expect("lock").push(path.to_string());
        if self.fail_content {
            return Err(anyhow!("GitHub API error (500): boom"));
        }
        Ok(self.files.get(path).cloned())
    }

    async fn create_pull_request(&self, draft: &PullRequestDraft) -> Result<PullRequest> {
        if self.fail_pull_request {
            return Err(anyhow!("GitHub API error (422): Validation Failed"));
        }
        let mut drafts = self.drafts.lock().expect("lock");
        drafts.push(draft.clone());
        let number = 41 + drafts.len() as u64;
        Ok(PullRequest { number, url: format!("https://github.com/octo/demo/pull/{number}") })
    }
}

/// Replays canned completions in order and records every prompt.
#[derive(Default)]
pub struct ScriptedModel {
    responses: Mutex<VecDeque<String>>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedModel {
    pub fn new(responses: &[&str]) -> Self {
        Self {
            responses: Mutex::new(responses.iter().map(|r| r.to_string()).collect()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().expect("lock").clone()
    }
}

#[async_trait]
impl CompletionModel for ScriptedModel {
    async fn complete(&self, _model: &str, messages: &[ChatMessage]) -> Result<String> {
        let prompt = messages.iter().map(|m| m.content.as_str()).collect::<Vec<_>>().join("\n");
        self.prompts.lock().expect("lock").push(prompt);
        self.responses
            .lock()
            .expect("lock")
            .pop_front()
            .ok_or_else(|| anyhow!("LLM API error (500): no scripted response left"))
    }
}

/// Bag-of-words hashing into a small fixed space; identical text gives
/// identical vectors.
pub struct HashEmbedder;

const DIMS: usize = 16;

#[async_trait]
impl Embedder for HashEmbedder {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts
            .iter()
            .map(|text| {
                let mut vector = vec![0.0f32; DIMS];
                for word in text.split(|c: char| !c.is_alphanumeric()).filter(|w| !w.is_empty()) {
                    let bucket = word
                        .to_lowercase()
                        .bytes()
                        .fold(7usize, |acc, b| acc.wrapping_mul(31).wrapping_add(b as usize));
                    vector[bucket % DIMS] += 1.0;
                }
                vector
            })
            .collect())
    }
}

#[derive(Default)]
pub struct StaticSearch {
    pub hits: Vec<SearchHit>,
    pub calls: AtomicUsize,
}

impl StaticSearch {
    pub fn new(hits: Vec<SearchHit>) -> Self {
        Self { hits, calls: AtomicUsize::new(0) }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl VectorSearch for StaticSearch {
    async fn search(&self, _query: &str, top_k: usize) -> Result<Vec<SearchHit>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.hits.iter().take(top_k).cloned().collect())
    }
}

pub fn hit(path: &str, content: &str, score: f32) -> SearchHit {
    SearchHit {
        path: path.to_string(),
        content: content.to_string(),
        start_line: 1,
        end_line: content.lines().count().max(1),
        language: crate::lang::language_for_path(path).to_string(),
        score,
    }
}
