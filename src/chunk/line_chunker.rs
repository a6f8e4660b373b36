//! Line-window chunking with soft boundaries.

use crate::chunk::SourceFile;
use crate::domain::Chunk;
use crate::utils::estimate_tokens;

#[derive(Debug, Default)]
pub struct LineChunker;

impl LineChunker {
    pub fn new() -> Self {
        Self
    }

    /// Windows of about `max_tokens`, stretched or shrunk to the nearest
    /// definition or blank line, overlapping by about `overlap_tokens`.
    pub fn chunk(
        &self,
        file: &SourceFile,
        content: &str,
        max_tokens: usize,
        overlap_tokens: usize,
    ) -> Vec<Chunk> {
        let lines: Vec<&str> = content.split_inclusive('\n').collect();
        if lines.is_empty() {
            return Vec::new();
        }

        let per_line = (estimate_tokens(content).max(1) / lines.len()).max(1);
        let window = (max_tokens / per_line).max(1);
        let overlap = overlap_tokens / per_line;

        let mut chunks = Vec::new();
        let mut start = 0usize;

        while start < lines.len() {
            let mut end = (start + window).min(lines.len());
            if end < lines.len() {
                let from = (start + window * 4 / 5).min(end);
                let to = (end + 10).min(lines.len());
                if let Some(boundary) = best_break(&lines, from, to) {
                    if boundary > start {
                        end = boundary;
                    }
                }
            }

            let text = lines[start..end].concat();
            if !text.trim().is_empty() {
                chunks.push(file.chunk(text, start + 1, end));
            }

            if end >= lines.len() {
                break;
            }
            let next = end.saturating_sub(overlap);
            start = if next <= start { end } else { next };
        }

        chunks
    }
}

/// Index of the strongest break candidate in `lines[from..to]`.
fn best_break(lines: &[&str], from: usize, to: usize) -> Option<usize> {
    let mut best: Option<(usize, u8)> = None;
    for (idx, line) in lines.iter().enumerate().take(to).skip(from) {
        let weight = break_weight(line);
        if weight > 0 && best.map_or(true, |(_, w)| weight > w) {
            best = Some((idx, weight));
        }
    }
    best.map(|(idx, _)| idx)
}

fn break_weight(line: &str) -> u8 {
    let trimmed = line.trim_start();
    const DEFINITIONS: &[&str] =
        &["def ", "async def ", "fn ", "pub fn ", "async fn ", "pub async fn ", "func ", "function "];
    if trimmed.starts_with("class ") || trimmed.starts_with("export class ") {
        4
    } else if DEFINITIONS.iter().any(|prefix| trimmed.starts_with(prefix)) {
        3
    } else if trimmed.is_empty() {
        1
    } else {
        0
    }
}
