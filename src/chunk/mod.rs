//! Content chunking strategies

use crate::domain::Chunk;
use crate::lang::language_for_path;
use crate::utils::{estimate_tokens, stable_hash};

use code_chunker::CodeChunker;
use line_chunker::LineChunker;

pub mod code_chunker;
pub mod line_chunker;

/// A fetched repository file about to be chunked.
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub path: String,
    pub language: String,
}

impl SourceFile {
    pub fn new(path: impl Into<String>) -> Self {
        let path = path.into();
        let language = language_for_path(&path).to_string();
        Self { path, language }
    }

    pub(crate) fn chunk(&self, content: String, start: usize, end: usize) -> Chunk {
        Chunk {
            id: stable_hash(&content, &self.path, start, end),
            path: self.path.clone(),
            language: self.language.clone(),
            start_line: start,
            end_line: end,
            token_estimate: estimate_tokens(&content),
            content,
        }
    }
}

/// Split `content` into chunks of roughly `max_tokens`, preferring
/// definition boundaries for code. Never empty for non-blank content.
pub fn chunk_content(
    file: &SourceFile,
    content: &str,
    max_tokens: usize,
    overlap_tokens: usize,
) -> Vec<Chunk> {
    if content.trim().is_empty() {
        return Vec::new();
    }

    let chunks = if is_code_language(&file.language) {
        CodeChunker::new().chunk(file, content, max_tokens, overlap_tokens)
    } else {
        LineChunker::new().chunk(file, content, max_tokens, overlap_tokens)
    };

    if !chunks.is_empty() {
        return chunks;
    }

    let line_count = content.lines().count().max(1);
    vec![file.chunk(content.to_string(), 1, line_count)]
}

fn is_code_language(language: &str) -> bool {
    matches!(
        language,
        "python"
            | "javascript"
            | "typescript"
            | "go"
            | "java"
            | "rust"
            | "c"
            | "cpp"
            | "csharp"
            | "ruby"
            | "php"
            | "swift"
            | "kotlin"
            | "scala"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_content_has_no_chunks() {
        assert!(chunk_content(&SourceFile::new("a.py"), "  \n\n", 100, 0).is_empty());
    }

    #[test]
    fn test_small_file_is_single_chunk() {
        let file = SourceFile::new("notes.txt");
        let chunks = chunk_content(&file, "one\ntwo\nthree\n", 375, 60);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].start_line, 1);
        assert_eq!(chunks[0].end_line, 3);
        assert_eq!(chunks[0].language, "text");
        assert_eq!(chunks[0].id.len(), 16);
    }

    #[test]
    fn test_chunks_cover_lines_in_order() {
        let file = SourceFile::new("src/long.md");
        let content: String = (1..=200).map(|i| format!("line number {i} of the notes\n")).collect();
        let chunks = chunk_content(&file, &content, 50, 10);
        assert!(chunks.len() > 1);
        assert_eq!(chunks[0].start_line, 1);
        assert_eq!(chunks.last().map(|c| c.end_line), Some(200));
        for pair in chunks.windows(2) {
            assert!(pair[0].start_line < pair[1].start_line);
        }
    }
}
