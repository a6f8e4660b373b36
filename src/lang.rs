//! Language detection by extension and the tree-sitter grammars we ship.

use tree_sitter::Language;

/// Languages with a bundled tree-sitter grammar.
pub fn supported_tree_sitter_languages() -> &'static [&'static str] {
    &["python", "rust", "javascript", "typescript", "go"]
}

/// Language name for a repository path, `"text"` when unknown.
pub fn language_for_path(path: &str) -> &'static str {
    let name = path.rsplit('/').next().unwrap_or(path).to_ascii_lowercase();
    if name == "dockerfile" {
        return "dockerfile";
    }
    if name == "makefile" {
        return "make";
    }

    let ext = match name.rsplit_once('.') {
        Some((_, ext)) => ext,
        None => return "text",
    };
    match ext {
        "py" | "pyi" => "python",
        "rs" => "rust",
        "js" | "jsx" | "mjs" | "cjs" => "javascript",
        "ts" | "tsx" | "mts" | "cts" => "typescript",
        "go" => "go",
        "java" => "java",
        "rb" => "ruby",
        "c" | "h" => "c",
        "cc" | "cpp" | "cxx" | "hpp" => "cpp",
        "cs" => "csharp",
        "php" => "php",
        "swift" => "swift",
        "kt" | "kts" => "kotlin",
        "scala" => "scala",
        "md" | "markdown" => "markdown",
        "json" => "json",
        "yml" | "yaml" => "yaml",
        "toml" => "toml",
        "sh" | "bash" => "shell",
        _ => "text",
    }
}

/// Grammar for `language`. TSX files use the TSX dialect.
pub fn grammar_for(language: &str, path: &str) -> Option<Language> {
    let language = match language {
        "python" => tree_sitter_python::LANGUAGE.into(),
        "rust" => tree_sitter_rust::LANGUAGE.into(),
        "javascript" => tree_sitter_javascript::LANGUAGE.into(),
        "typescript" if path.ends_with(".tsx") => tree_sitter_typescript::LANGUAGE_TSX.into(),
        "typescript" => tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into(),
        "go" => tree_sitter_go::LANGUAGE.into(),
        _ => return None,
    };
    Some(language)
}
