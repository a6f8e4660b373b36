//! Token estimation

/// Rough token count: Unicode scalar values divided by four.
pub fn estimate_tokens(text: &str) -> usize {
    text.chars().count() / 4
}
