//! Turning synthesized changes into final file contents.

use crate::domain::{ChangeType, FileChange, FileChangeWithType};

/// Insert `addition` after line `after` (0-based) of `original`:
/// `L[0..=after] ++ addition ++ L[after + 1..]`. An index past the last line
/// appends. A trailing newline on `original` is preserved.
pub fn splice(original: &str, addition: &str, after: usize) -> String {
    let lines: Vec<&str> = original.lines().collect();
    let split = (after + 1).min(lines.len());

    let mut out: Vec<&str> = Vec::with_capacity(lines.len() + addition.lines().count());
    out.extend_from_slice(&lines[..split]);
    out.extend(addition.lines());
    out.extend_from_slice(&lines[split..]);

    let mut spliced = out.join("\n");
    if original.ends_with('\n') {
        spliced.push('\n');
    }
    spliced
}

/// Final content for `change`: creates are verbatim, modifies with an
/// insertion point are spliced, other modifies replace the file.
pub fn finalize(change: &FileChangeWithType) -> FileChange {
    if change.change_type == ChangeType::Create {
        return FileChange::new(&change.path, &change.content);
    }

    let original = change.original_content.clone();
    let content = match (original.as_deref(), change.insert_after_line) {
        (Some(original), Some(after)) => {
            if !change.is_well_formed() {
                tracing::warn!(
                    "INSERT_AFTER_LINE {} is past the end of {} ({} lines); appending",
                    after,
                    change.path,
                    original.lines().count()
                );
            }
            splice(original, &change.content, after)
        }
        _ => change.content.clone(),
    };
    FileChange::new(&change.path, content).with_original(original)
}
