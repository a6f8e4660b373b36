//! Definition-aware chunking for source code.

use crate::chunk::line_chunker::LineChunker;
use crate::chunk::SourceFile;
use crate::domain::Chunk;
use crate::lang::grammar_for;
use crate::utils::estimate_tokens;
use tree_sitter::Parser;

#[derive(Debug, Default)]
pub struct CodeChunker;

impl CodeChunker {
    pub fn new() -> Self {
        Self
    }

    /// Split at top-level definitions (tree-sitter when a grammar is bundled,
    /// keyword heuristics otherwise); oversized sections go through the
    /// line chunker.
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

        let boundaries = tree_sitter_boundaries(file, content, lines.len())
            .unwrap_or_else(|| keyword_boundaries(&lines, &file.language));
        if boundaries.len() <= 2 {
            return LineChunker::new().chunk(file, content, max_tokens, overlap_tokens);
        }

        let mut chunks = Vec::new();
        for window in boundaries.windows(2) {
            let (start, end) = (window[0], window[1].min(lines.len()));
            if end <= start {
                continue;
            }

            let section = lines[start..end].concat();
            if section.trim().is_empty() {
                continue;
            }

            if estimate_tokens(&section) <= max_tokens {
                chunks.push(file.chunk(section, start + 1, end));
                continue;
            }

            for nested in LineChunker::new().chunk(file, &section, max_tokens, overlap_tokens) {
                chunks.push(file.chunk(
                    nested.content,
                    nested.start_line + start,
                    nested.end_line + start,
                ));
            }
        }

        if chunks.is_empty() {
            return LineChunker::new().chunk(file, content, max_tokens, overlap_tokens);
        }
        chunks.sort_by_key(|c| c.start_line);
        chunks
    }
}

fn definition_kinds(language: &str) -> &'static [&'static str] {
    match language {
        "python" => &["function_definition", "class_definition", "decorated_definition"],
        "rust" => {
            &["function_item", "impl_item", "struct_item", "enum_item", "trait_item", "mod_item"]
        }
        "javascript" => &[
            "function_declaration",
            "class_declaration",
            "lexical_declaration",
            "export_statement",
        ],
        "typescript" => &[
            "function_declaration",
            "class_declaration",
            "interface_declaration",
            "type_alias_declaration",
            "lexical_declaration",
            "export_statement",
        ],
        "go" => &["function_declaration", "method_declaration", "type_declaration"],
        _ => &[],
    }
}

/// Row boundaries `[0, def rows.., line_count]`, or `None` without a grammar.
fn tree_sitter_boundaries(
    file: &SourceFile,
    content: &str,
    line_count: usize,
) -> Option<Vec<usize>> {
    let grammar = grammar_for(&file.language, &file.path)?;
    let mut parser = Parser::new();
    parser.set_language(&grammar).ok()?;
    let tree = parser.parse(content, None)?;
    let root = tree.root_node();
    let kinds = definition_kinds(&file.language);

    let mut boundaries = vec![0usize];
    let mut cursor = root.walk();
    for child in root.named_children(&mut cursor) {
        if kinds.contains(&child.kind()) {
            boundaries.push(child.start_position().row);
        }
    }
    boundaries.push(line_count);
    boundaries.sort_unstable();
    boundaries.dedup();
    Some(boundaries)
}

fn keyword_boundaries(lines: &[&str], language: &str) -> Vec<usize> {
    let prefixes: &[&str] = match language {
        "python" => &["def ", "async def ", "class "],
        "ruby" => &["def ", "class ", "module "],
        "java" | "csharp" | "kotlin" | "scala" => {
            &["public ", "private ", "protected ", "class ", "interface ", "fun ", "def "]
        }
        _ => &["def ", "class ", "fn ", "function ", "func "],
    };

    let mut boundaries = vec![0usize];
    for (idx, line) in lines.iter().enumerate().skip(1) {
        if prefixes.iter().any(|p| line.starts_with(p)) {
            boundaries.push(idx);
        }
    }
    boundaries.push(lines.len());
    boundaries.dedup();
    boundaries
}

#[cfg(test)]
mod tests {
    use super::CodeChunker;
    use crate::chunk::SourceFile;

    #[test]
    fn code_chunker_splits_python_definitions() {
        let file = SourceFile::new("main.py");
        let content = "def a():\n    pass\n\ndef b():\n    pass\n\ndef c():\n    pass\n";
        let chunks = CodeChunker::new().chunk(&file, content, 20, 0);
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].start_line, 1);
        assert!(chunks[1].content.starts_with("def b"));
    }

    #[test]
    fn code_chunker_supports_rust_tree_sitter() {
        let file = SourceFile::new("src/main.rs");
        let content = "struct S;\nfn a() {}\nimpl S { fn b(&self) {} }\nfn c() {}\n";
        let chunks = CodeChunker::new().chunk(&file, content, 20, 0);
        assert_eq!(chunks.len(), 4);
        assert_eq!(chunks[3].start_line, 4);
    }

    #[test]
    fn code_chunker_supports_typescript_exports() {
        let file = SourceFile::new("src/login.ts");
        let content = "import { api } from './api';\n\nexport function login() {\n  return api();\n}\n\nexport class LoginForm {}\n";
        let chunks = CodeChunker::new().chunk(&file, content, 50, 0);
        assert!(chunks.len() >= 2);
        assert!(chunks.iter().any(|c| c.content.starts_with("export class LoginForm")));
    }

    #[test]
    fn code_chunker_keyword_fallback_for_java() {
        let file = SourceFile::new("App.java");
        let content = "package app;\npublic class App {}\npublic class Other {}\n";
        let chunks = CodeChunker::new().chunk(&file, content, 50, 0);
        assert_eq!(chunks.len(), 3);
    }
}
