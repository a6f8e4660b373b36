//! Pull request title and body.

use crate::analysis::{ImpactReport, SymbolRef};
use crate::domain::FileChangeWithType;
use std::collections::HashSet;

const TITLE_CHARS: usize = 50;
const MAX_SYMBOLS: usize = 50;

/// Optional prefix plus the first 50 characters of the description's first
/// line.
pub fn render_pr_title(prefix: Option<&str>, description: &str) -> String {
    let first_line = description.trim_start().lines().next().unwrap_or_default();
    let head: String = first_line.chars().take(TITLE_CHARS).collect();
    format!("{}{}", prefix.unwrap_or_default(), head.trim_end())
}

pub fn render_pr_description(
    description: &str,
    changes: &[FileChangeWithType],
    impact: &ImpactReport,
) -> String {
    let mut out = String::new();
    out.push_str("## Description\n");
    out.push_str(description.trim());
    out.push_str("\n\n## Changes Made\n");

    // A path produced twice is listed once, under its first change type.
    let mut seen = HashSet::new();
    let listed: Vec<&FileChangeWithType> =
        changes.iter().filter(|c| seen.insert(c.path.as_str())).collect();

    out.push_str("\n### Files Created\n");
    for change in listed.iter().filter(|c| c.is_create()) {
        out.push_str(&format!("- `{}` - New file\n", change.path));
    }
    out.push_str("\n### Files Modified\n");
    for change in listed.iter().filter(|c| !c.is_create()) {
        out.push_str(&format!("- `{}` - Updated\n", change.path));
    }

    out.push_str("\n## Impact Analysis\n");
    render_symbols(&mut out, "New Symbols", &impact.new_symbols);
    render_symbols(&mut out, "Modified Symbols", &impact.modified_symbols);
    render_symbols(&mut out, "Affected Symbols", &impact.affected_symbols);
    out
}

fn render_symbols(out: &mut String, heading: &str, symbols: &[SymbolRef]) {
    out.push_str(&format!("\n### {heading}\n"));
    if symbols.is_empty() {
        out.push_str("- None\n");
        return;
    }
    for symbol in symbols.iter().take(MAX_SYMBOLS) {
        out.push_str(&format!("- `{}` ({}) in `{}`\n", symbol.name, symbol.kind, symbol.path));
    }
    if symbols.len() > MAX_SYMBOLS {
        out.push_str(&format!("- ... and {} more\n", symbols.len() - MAX_SYMBOLS));
    }
}
