//! Noise filter pipeline.
//!
//! Normalizes before/after file pairs so that differences with no semantic
//! weight never reach the parser. Filters run in a fixed order:
//!
//! 1. [`DocCommentFilter`] - canonical documentation-comment spacing
//! 2. [`WhitespaceFilter`] - blank lines and trailing whitespace
//! 3. [`IgnoredTagFilter`] - configured documentation tags
//!
//! Later filters rely on the comment block boundaries the first one
//! normalizes. After each filter, any file pair whose two sides became
//! identical is removed from both mappings. Files present on one side only
//! are never touched.
//!
//! # Example
//!
//! ```rust
//! use apidrift_core::config::FilterConfig;
//! use apidrift_core::filter::{FileMap, FilterPipeline};
//!
//! let mut before = FileMap::new();
//! let mut after = FileMap::new();
//! before.insert("a.src".into(), vec!["namespace Acme;".into(), "f();  ".into()]);
//! after.insert("a.src".into(), vec!["namespace Acme;".into(), "".into(), "f();".into()]);
//!
//! let pipeline = FilterPipeline::new(&FilterConfig::default());
//! let summary = pipeline.run(&mut before, &mut after);
//!
//! assert!(before.is_empty() && after.is_empty());
//! assert_eq!(summary.removed.len(), 1);
//! ```

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::debug;

use crate::config::FilterConfig;

pub mod comment;
pub mod tags;
pub mod whitespace;

pub use comment::DocCommentFilter;
pub use tags::IgnoredTagFilter;
pub use whitespace::WhitespaceFilter;

/// File path -> ordered line sequence, for one snapshot side.
pub type FileMap = BTreeMap<String, Vec<String>>;

/// A file identity plus its lines.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SourceUnit {
    pub path: String,
    pub lines: Vec<String>,
}

impl SourceUnit {
    /// Split raw text into lines (without terminators).
    pub fn from_text(path: impl Into<String>, text: &str) -> Self {
        Self {
            path: path.into(),
            lines: text.lines().map(str::to_string).collect(),
        }
    }
}

/// Collect source units into a file map. A later unit wins on path collision.
pub fn file_map(units: impl IntoIterator<Item = SourceUnit>) -> FileMap {
    units.into_iter().map(|u| (u.path, u.lines)).collect()
}

/// A normalization pass over both sides of a diff.
pub trait NoiseFilter {
    /// Stage name used in logs and summaries.
    fn name(&self) -> &'static str;

    /// Rewrite the shared files of both mappings in place, then drop pairs
    /// that became identical. Returns the dropped paths.
    fn apply(&self, before: &mut FileMap, after: &mut FileMap) -> Vec<String>;
}

/// Rewrite every path present on both sides with `rewrite`, then remove the
/// pairs whose two sides are now identical. Single-sided paths are skipped.
pub fn rewrite_shared<F>(before: &mut FileMap, after: &mut FileMap, rewrite: F) -> Vec<String>
where
    F: Fn(&[String]) -> Vec<String>,
{
    let shared: Vec<String> = before
        .keys()
        .filter(|path| after.contains_key(*path))
        .cloned()
        .collect();

    let mut removed = Vec::new();
    for path in shared {
        let (Some(old), Some(new)) = (before.get_mut(&path), after.get_mut(&path)) else {
            continue;
        };
        *old = rewrite(old);
        *new = rewrite(new);
        if old == new {
            removed.push(path);
        }
    }

    for path in &removed {
        before.remove(path);
        after.remove(path);
    }
    removed
}

/// A file pair the pipeline dropped, and the stage that dropped it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RemovedFile {
    pub path: String,
    pub stage: &'static str,
}

/// What a pipeline run did.
#[derive(Clone, Debug, Default, Serialize)]
pub struct FilterSummary {
    pub removed: Vec<RemovedFile>,
}

impl FilterSummary {
    pub fn removed_by(&self, stage: &str) -> usize {
        self.removed.iter().filter(|r| r.stage == stage).count()
    }
}

/// The fixed filter sequence.
pub struct FilterPipeline {
    filters: Vec<Box<dyn NoiseFilter>>,
}

impl FilterPipeline {
    pub fn new(config: &FilterConfig) -> Self {
        Self {
            filters: vec![
                Box::new(DocCommentFilter),
                Box::new(WhitespaceFilter),
                Box::new(IgnoredTagFilter::new(config)),
            ],
        }
    }

    /// Stage names, in execution order.
    pub fn stages(&self) -> Vec<&'static str> {
        self.filters.iter().map(|f| f.name()).collect()
    }

    /// Run every filter over both mappings.
    pub fn run(&self, before: &mut FileMap, after: &mut FileMap) -> FilterSummary {
        let mut summary = FilterSummary::default();
        for filter in &self.filters {
            let removed = filter.apply(before, after);
            debug!(
                stage = filter.name(),
                removed = removed.len(),
                remaining = before.len().min(after.len()),
                "noise filter applied"
            );
            summary
                .removed
                .extend(removed.into_iter().map(|path| RemovedFile {
                    path,
                    stage: filter.name(),
                }));
        }
        summary
    }
}
