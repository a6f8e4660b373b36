//! Definition extraction with tree-sitter.

use crate::lang::{grammar_for, language_for_path};
use tree_sitter::{Node, Parser};

/// A named definition and its full source text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Symbol {
    /// Qualified by the enclosing class, impl, trait or module
    /// (`LoginForm.submit`).
    pub name: String,
    pub kind: &'static str,
    pub start_line: usize,
    pub text: String,
}

/// Definitions in `content`, in source order. Empty for languages without a
/// bundled grammar or content that fails to parse.
pub fn extract_symbols(path: &str, content: &str) -> Vec<Symbol> {
    let language = language_for_path(path);
    let Some(grammar) = grammar_for(language, path) else {
        return Vec::new();
    };
    let mut parser = Parser::new();
    if parser.set_language(&grammar).is_err() {
        return Vec::new();
    }
    let Some(tree) = parser.parse(content, None) else {
        return Vec::new();
    };

    let mut symbols = Vec::new();
    collect(tree.root_node(), content.as_bytes(), language, None, &mut symbols);
    symbols
}

/// `(kind, opens_scope)` for definition nodes.
fn classify(node: Node<'_>, language: &str) -> Option<(&'static str, bool)> {
    let kind = match (language, node.kind()) {
        ("python", "function_definition") => ("function", false),
        ("python", "class_definition") => ("class", true),

        ("rust", "function_item") => ("function", false),
        ("rust", "struct_item") => ("struct", false),
        ("rust", "enum_item") => ("enum", false),
        ("rust", "type_item") => ("type", false),
        ("rust", "trait_item") => ("trait", true),
        ("rust", "mod_item") => ("module", true),

        ("javascript" | "typescript", "function_declaration")
        | ("javascript" | "typescript", "generator_function_declaration") => ("function", false),
        ("javascript" | "typescript", "class_declaration")
        | ("typescript", "abstract_class_declaration") => ("class", true),
        ("javascript" | "typescript", "method_definition") => ("method", false),
        ("javascript" | "typescript", "variable_declarator") => {
            let value = node.child_by_field_name("value")?;
            if !matches!(value.kind(), "arrow_function" | "function_expression" | "function") {
                return None;
            }
            ("function", false)
        }
        ("typescript", "interface_declaration") => ("interface", false),
        ("typescript", "type_alias_declaration") => ("type", false),
        ("typescript", "enum_declaration") => ("enum", false),

        ("go", "function_declaration") => ("function", false),
        ("go", "method_declaration") => ("method", false),
        ("go", "type_spec") => ("type", false),
        _ => return None,
    };
    Some(kind)
}

fn collect(
    node: Node<'_>,
    source: &[u8],
    language: &str,
    scope: Option<&str>,
    out: &mut Vec<Symbol>,
) {
    let mut cursor = node.walk();
    for child in node.named_children(&mut cursor) {
        // Rust impl blocks have no name of their own; their methods are
        // qualified by the implemented type.
        if language == "rust" && child.kind() == "impl_item" {
            let owner = child
                .child_by_field_name("type")
                .and_then(|t| t.utf8_text(source).ok())
                .map(|t| qualify(scope, t));
            collect(child, source, language, owner.as_deref().or(scope), out);
            continue;
        }

        let Some((kind, opens_scope)) = classify(child, language) else {
            collect(child, source, language, scope, out);
            continue;
        };
        let Some(name) =
            child.child_by_field_name("name").and_then(|n| n.utf8_text(source).ok())
        else {
            continue;
        };
        let qualified = qualify(scope, name);
        let text = child.utf8_text(source).unwrap_or_default().to_string();
        out.push(Symbol {
            name: qualified.clone(),
            kind,
            start_line: child.start_position().row + 1,
            text,
        });
        if opens_scope {
            collect(child, source, language, Some(&qualified), out);
        }
    }
}

fn qualify(scope: Option<&str>, name: &str) -> String {
    match scope {
        Some(scope) => format!("{scope}.{name}"),
        None => name.to_string(),
    }
}
