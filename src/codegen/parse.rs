//! Parsers for the line-oriented formats the model is asked to answer in.

use crate::domain::{Plan, PlanAction, PlannedFile};
use crate::error::SynthesisFailureKind;
use crate::utils::clean_file_path;
use once_cell::sync::Lazy;
use regex::Regex;

static LIST_MARKER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?:[-*+]\s+|\d+[.)]\s+)").expect("valid list marker regex"));

const FILE_MARKER: &str = "FILE:";
const ACTION_MARKER: &str = "ACTION:";
const CONTENT_MARKER: &str = "CONTENT:";
const END_MARKER: &str = "END_CONTENT";
const INSERT_MARKER: &str = "INSERT_AFTER_LINE:";

/// Value after `key` when `line` is a `KEY: value` field. Tolerates list
/// markers and bold markup around the key.
fn field<'a>(line: &'a str, key: &str) -> Option<&'a str> {
    let line = line.trim();
    let line = LIST_MARKER.find(line).map_or(line, |m| &line[m.end()..]);
    let line = line.trim_start_matches("**");
    let rest = line.strip_prefix(key)?;
    Some(rest.trim_start_matches("**").trim())
}

/// Parse a planning answer. `FILE:` opens an entry; the other fields attach
/// to the open entry and are ignored when none is open. A repeated path keeps
/// its first entry.
pub fn parse_plan(raw: &str) -> Plan {
    let mut files: Vec<PlannedFile> = Vec::new();
    let mut current: Option<usize> = None;

    for line in raw.lines() {
        if let Some(value) = field(line, FILE_MARKER) {
            let path = clean_file_path(value);
            if path.is_empty() {
                current = None;
            } else if files.iter().any(|f| f.path == path) {
                tracing::debug!("Ignoring repeated plan entry for {}", path);
                current = None;
            } else {
                files.push(PlannedFile::new(path, PlanAction::Unknown));
                current = Some(files.len() - 1);
            }
            continue;
        }

        let Some(entry) = current.and_then(|idx| files.get_mut(idx)) else {
            continue;
        };
        if let Some(value) = field(line, ACTION_MARKER) {
            entry.action = PlanAction::parse(value);
        } else if let Some(value) = field(line, "PURPOSE:") {
            entry.purpose = non_empty(value);
        } else if let Some(value) = field(line, "DEPENDS_ON:") {
            entry.depends_on = value
                .split(',')
                .map(clean_file_path)
                .filter(|p| !p.is_empty() && !p.eq_ignore_ascii_case("none"))
                .collect();
        } else if let Some(value) = field(line, "CHANGES:") {
            entry.changes = non_empty(value);
        }
    }

    Plan { files, raw: raw.to_string() }
}

fn non_empty(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

/// One file as echoed back by a synthesis answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedChange {
    pub path: String,
    pub action: Option<PlanAction>,
    pub insert_after_line: Option<usize>,
    pub content: String,
}

/// Parse a synthesis answer of the form
/// `FILE:`/`ACTION:`/`INSERT_AFTER_LINE:`/`CONTENT:` ... `END_CONTENT`.
pub fn parse_change(response: &str) -> Result<ParsedChange, SynthesisFailureKind> {
    if !response.contains(FILE_MARKER) {
        return Err(SynthesisFailureKind::MissingMarker(FILE_MARKER));
    }
    let Some((header, body)) = response.split_once(CONTENT_MARKER) else {
        return Err(SynthesisFailureKind::MissingMarker(CONTENT_MARKER));
    };

    let path = response
        .split_once(FILE_MARKER)
        .and_then(|(_, rest)| rest.lines().next())
        .map(clean_file_path)
        .unwrap_or_default();
    if path.is_empty() {
        return Err(SynthesisFailureKind::EmptyPath);
    }

    let action = header.lines().find_map(|l| field(l, ACTION_MARKER)).map(PlanAction::parse);
    let mut insert_after_line =
        header.lines().find_map(|l| field(l, INSERT_MARKER)).and_then(parse_line_number);

    let body = body.split(END_MARKER).next().unwrap_or_default();
    let mut lines: Vec<&str> = strip_fences(body.trim()).lines().collect();
    if let Some(idx) = lines.iter().position(|l| l.trim_start().starts_with(INSERT_MARKER)) {
        let directive = lines.remove(idx);
        if insert_after_line.is_none() {
            insert_after_line = field(directive, INSERT_MARKER).and_then(parse_line_number);
        }
    }
    let content = strip_fences(lines.join("\n").trim()).trim().to_string();

    Ok(ParsedChange { path, action, insert_after_line, content })
}

fn parse_line_number(value: &str) -> Option<usize> {
    let parsed = value.trim().parse().ok();
    if parsed.is_none() {
        tracing::debug!("Ignoring unparseable INSERT_AFTER_LINE value {:?}", value);
    }
    parsed
}

/// Drop a leading ```lang line and a trailing ``` line.
fn strip_fences(text: &str) -> &str {
    let mut text = text;
    if text.starts_with("```") {
        text = text.split_once('\n').map_or("", |(_, rest)| rest);
    }
    let trimmed = text.trim_end();
    match trimmed.strip_suffix("```") {
        Some(rest) if rest.is_empty() || rest.ends_with('\n') => rest,
        _ => text,
    }
}
