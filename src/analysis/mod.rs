//! Static analysis of synthesized changes.

pub mod impact;
pub mod symbols;

pub use impact::{ImpactAnalyzer, ImpactReport, SymbolImpactAnalyzer, SymbolRef};
pub use symbols::{extract_symbols, Symbol};
