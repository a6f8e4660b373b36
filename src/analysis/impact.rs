//! Symbol-level impact of a change set.

use super::symbols::{extract_symbols, Symbol};
use crate::domain::FileChange;
use crate::github::RepositoryAccessor;
use async_trait::async_trait;
use serde::Serialize;
use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SymbolRef {
    pub path: String,
    pub name: String,
    pub kind: &'static str,
}

impl SymbolRef {
    fn new(path: &str, symbol: &Symbol) -> Self {
        Self { path: path.to_string(), name: symbol.name.clone(), kind: symbol.kind }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImpactReport {
    /// Only present after the change.
    pub new_symbols: Vec<SymbolRef>,
    /// Present before and after with different text, or removed.
    pub modified_symbols: Vec<SymbolRef>,
    /// Present before and after with identical text.
    pub affected_symbols: Vec<SymbolRef>,
}

#[async_trait]
pub trait ImpactAnalyzer: Send + Sync {
    async fn analyze(&self, changes: &[FileChange]) -> ImpactReport;
}

/// Compares definitions before and after each change. The previous version
/// is the change's `original_content`, or the repository copy when absent.
pub struct SymbolImpactAnalyzer {
    accessor: RepositoryAccessor,
}

impl SymbolImpactAnalyzer {
    pub fn new(accessor: RepositoryAccessor) -> Self {
        Self { accessor }
    }
}

#[async_trait]
impl ImpactAnalyzer for SymbolImpactAnalyzer {
    async fn analyze(&self, changes: &[FileChange]) -> ImpactReport {
        let mut report = ImpactReport::default();
        for change in changes {
            let old = match &change.original_content {
                Some(original) => Some(original.clone()),
                None => self.accessor.get_file_content(&change.path).await,
            };
            compare(&change.path, old.as_deref().unwrap_or_default(), &change.content, &mut report);
        }
        report
    }
}

/// Add the symbol differences between `old` and `new` versions of `path`.
pub fn compare(path: &str, old: &str, new: &str, report: &mut ImpactReport) {
    let before = extract_symbols(path, old);
    let after = extract_symbols(path, new);
    let before_text: HashMap<&str, &str> =
        before.iter().map(|s| (s.name.as_str(), s.text.as_str())).collect();
    let after_names: HashSet<&str> = after.iter().map(|s| s.name.as_str()).collect();

    for symbol in &after {
        let entry = SymbolRef::new(path, symbol);
        match before_text.get(symbol.name.as_str()) {
            None => report.new_symbols.push(entry),
            Some(text) if *text == symbol.text => report.affected_symbols.push(entry),
            Some(_) => report.modified_symbols.push(entry),
        }
    }
    for symbol in &before {
        if !after_names.contains(symbol.name.as_str()) {
            report.modified_symbols.push(SymbolRef::new(path, symbol));
        }
    }
}
