//! Blank-line and trailing-whitespace normalization.

use super::{rewrite_shared, FileMap, NoiseFilter};

/// Drops blank lines and trailing whitespace on both sides.
pub struct WhitespaceFilter;

impl NoiseFilter for WhitespaceFilter {
    fn name(&self) -> &'static str {
        "whitespace"
    }

    fn apply(&self, before: &mut FileMap, after: &mut FileMap) -> Vec<String> {
        rewrite_shared(before, after, strip_whitespace)
    }
}

/// Strip trailing whitespace from every line and drop lines left empty.
pub fn strip_whitespace(lines: &[String]) -> Vec<String> {
    lines
        .iter()
        .map(|l| l.trim_end())
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect()
}
