//! Implementation plan emitted by the change planner.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlanAction {
    Create,
    Modify,
    Unknown,
}

impl PlanAction {
    /// Parse an `ACTION:` value. Anything other than create/modify is unknown.
    pub fn parse(value: &str) -> Self {
        let lower = value.trim().trim_matches('`').to_ascii_lowercase();
        if lower.starts_with("create") {
            PlanAction::Create
        } else if lower.starts_with("modify") {
            PlanAction::Modify
        } else {
            PlanAction::Unknown
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PlanAction::Create => "create",
            PlanAction::Modify => "modify",
            PlanAction::Unknown => "unknown",
        }
    }
}

impl fmt::Display for PlanAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlannedFile {
    pub path: String,
    pub action: PlanAction,
    pub purpose: Option<String>,
    pub depends_on: Vec<String>,
    pub changes: Option<String>,
}

impl PlannedFile {
    pub fn new(path: impl Into<String>, action: PlanAction) -> Self {
        Self { path: path.into(), action, purpose: None, depends_on: Vec::new(), changes: None }
    }
}

/// Ordered plan entries (fundamental files first) plus the raw plan text,
/// which is re-sent to the model for every synthesized file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Plan {
    pub files: Vec<PlannedFile>,
    pub raw: String,
}

impl Plan {
    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// A plan is incomplete when any entry lacks a usable action.
    pub fn is_complete(&self) -> bool {
        self.files.iter().all(|f| f.action != PlanAction::Unknown)
    }

    pub fn summary(&self) -> Vec<String> {
        self.files.iter().map(|f| format!("{} ({})", f.path, f.action)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_action_variants() {
        assert_eq!(PlanAction::parse("create"), PlanAction::Create);
        assert_eq!(PlanAction::parse(" Modify "), PlanAction::Modify);
        assert_eq!(PlanAction::parse("create|modify"), PlanAction::Create);
        assert_eq!(PlanAction::parse("delete"), PlanAction::Unknown);
    }

    #[test]
    fn plan_completeness_tracks_unknown_actions() {
        let mut plan = Plan {
            files: vec![PlannedFile::new("a.ts", PlanAction::Create)],
            raw: String::new(),
        };
        assert!(plan.is_complete());
        plan.files.push(PlannedFile::new("b.ts", PlanAction::Unknown));
        assert!(!plan.is_complete());
        assert_eq!(plan.summary(), vec!["a.ts (create)", "b.ts (unknown)"]);
    }
}
