//! Index chunks and retrieval results.

use serde::{Deserialize, Serialize};

/// A slice of a repository file stored in the vector index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    pub id: String,
    pub path: String,
    pub language: String,
    pub start_line: usize,
    pub end_line: usize,
    pub content: String,
    pub token_estimate: usize,
}

/// A raw hit returned by a vector search, most similar first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub path: String,
    pub content: String,
    pub start_line: usize,
    pub end_line: usize,
    pub language: String,
    pub score: f32,
}

/// A retrieved snippet used to build prompts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextItem {
    pub file_name: String,
    pub content: String,
    pub start_line: usize,
    pub end_line: usize,
}

impl ContextItem {
    pub fn description(&self) -> String {
        format!("Code from {} (lines {}-{})", self.file_name, self.start_line, self.end_line)
    }

    /// Prompt block in the `File: <name>\n<content>` form.
    pub fn to_prompt_block(&self) -> String {
        format!("File: {}\n{}", self.file_name, self.content)
    }
}

impl From<SearchHit> for ContextItem {
    fn from(hit: SearchHit) -> Self {
        Self {
            file_name: hit.path,
            content: hit.content,
            start_line: hit.start_line,
            end_line: hit.end_line,
        }
    }
}
