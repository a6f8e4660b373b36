//! File change records produced by synthesis and consumed by PR assembly.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Final content of a single file, ready to be committed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileChange {
    pub path: String,
    pub content: String,
    pub original_content: Option<String>,
}

impl FileChange {
    pub fn new(path: impl Into<String>, content: impl Into<String>) -> Self {
        Self { path: path.into(), content: content.into(), original_content: None }
    }

    pub fn with_original(mut self, original: Option<String>) -> Self {
        self.original_content = original;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeType {
    Create,
    Modify,
}

impl ChangeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeType::Create => "create",
            ChangeType::Modify => "modify",
        }
    }
}

impl fmt::Display for ChangeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A synthesized change as returned by the model, before splicing.
///
/// For `Modify`, `original_content` holds the file as it exists in the
/// repository and `content` may be only the incremental part, to be spliced
/// after `insert_after_line` (0-based, inclusive).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileChangeWithType {
    pub path: String,
    pub content: String,
    pub change_type: ChangeType,
    pub original_content: Option<String>,
    pub insert_after_line: Option<usize>,
}

impl FileChangeWithType {
    pub fn create(path: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            content: content.into(),
            change_type: ChangeType::Create,
            original_content: None,
            insert_after_line: None,
        }
    }

    pub fn modify(
        path: impl Into<String>,
        content: impl Into<String>,
        original_content: impl Into<String>,
        insert_after_line: Option<usize>,
    ) -> Self {
        Self {
            path: path.into(),
            content: content.into(),
            change_type: ChangeType::Modify,
            original_content: Some(original_content.into()),
            insert_after_line,
        }
    }

    pub fn is_create(&self) -> bool {
        self.change_type == ChangeType::Create
    }

    /// Whether the modify invariants hold: a non-empty original and an
    /// insertion point inside it.
    pub fn is_well_formed(&self) -> bool {
        match self.change_type {
            ChangeType::Create => self.insert_after_line.is_none(),
            ChangeType::Modify => {
                let Some(original) = self.original_content.as_deref() else {
                    return false;
                };
                if original.is_empty() {
                    return false;
                }
                match self.insert_after_line {
                    Some(line) => line < original.lines().count(),
                    None => true,
                }
            }
        }
    }
}
