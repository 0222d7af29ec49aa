//! Engine configuration.
//!
//! The engine never reads files; collaborators deserialize these structs
//! (e.g. from the `[filter]` and `[analyzer]` sections of `.apidrift.toml`)
//! and pass them in.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

/// Documentation-tag handling for the ignored-tag filter.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct FilterConfig {
    /// Tags whose whole occurrence is irrelevant.
    #[serde(default)]
    pub ignored_tags: Vec<String>,
    /// Tags whose presence matters but whose value text does not.
    #[serde(default)]
    pub value_ignored_tags: Vec<String>,
}

impl FilterConfig {
    pub fn new(ignored_tags: &[&str], value_ignored_tags: &[&str]) -> Self {
        Self {
            ignored_tags: ignored_tags.iter().map(|t| t.to_string()).collect(),
            value_ignored_tags: value_ignored_tags.iter().map(|t| t.to_string()).collect(),
        }
    }

    /// Lower-cased lookup sets, with any leading `@` removed.
    pub fn tag_sets(&self) -> (HashSet<String>, HashSet<String>) {
        let fold = |tags: &[String]| -> HashSet<String> {
            tags.iter()
                .map(|t| t.trim().trim_start_matches('@').to_lowercase())
                .filter(|t| !t.is_empty())
                .collect()
        };
        (fold(&self.ignored_tags), fold(&self.value_ignored_tags))
    }

    /// Check if a tag occurrence is irrelevant in its entirety.
    pub fn is_fully_ignored(&self, tag: &str) -> bool {
        let tag = tag.trim_start_matches('@');
        self.ignored_tags
            .iter()
            .any(|t| t.trim_start_matches('@').eq_ignore_ascii_case(tag))
    }

    /// Check if only a tag's value text is irrelevant.
    pub fn is_value_ignored(&self, tag: &str) -> bool {
        let tag = tag.trim_start_matches('@');
        self.value_ignored_tags
            .iter()
            .any(|t| t.trim_start_matches('@').eq_ignore_ascii_case(tag))
    }
}

/// How removals of non-API surface are treated.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InternalSurface {
    /// No operation for internal-only removals.
    #[default]
    Ignore,
    /// Internal-only removals are reported as MINOR.
    Report,
}

/// Rule-table switches for the comparator.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct AnalyzerConfig {
    #[serde(default)]
    pub internal_removals: InternalSurface,
    /// Skip visibility and signature rules for members the parser flagged
    /// as lifecycle members. Removal is still reported.
    #[serde(default)]
    pub exempt_lifecycle_members: bool,
}

impl AnalyzerConfig {
    pub fn reports_internal_removals(&self) -> bool {
        self.internal_removals == InternalSurface::Report
    }
}
