//! The run result: ordered operations plus non-fatal diagnostics.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::differ::{Operation, Severity};
use crate::error::Side;

/// Kind of non-fatal condition recorded next to the operations.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    /// A parent, interface or trait outside the scanned modules.
    UnresolvedReference,
}

/// A degraded condition that does not prevent a verdict.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub module: String,
    pub target: String,
    pub message: String,
    pub kind: DiagnosticKind,
    pub side: Side,
}

/// Ordered operations of one run.
#[derive(Clone, Debug, Default, Serialize)]
pub struct Report {
    pub operations: Vec<Operation>,
    pub diagnostics: Vec<Diagnostic>,
}

impl Report {
    pub fn new(mut operations: Vec<Operation>, mut diagnostics: Vec<Diagnostic>) -> Self {
        operations.sort_by(|a, b| {
            (&a.module, &a.target, a.code.code(), &a.reason).cmp(&(
                &b.module,
                &b.target,
                b.code.code(),
                &b.reason,
            ))
        });
        operations.dedup();
        diagnostics.sort_by(|a, b| {
            (&a.module, &a.target, &a.message, a.side.as_str()).cmp(&(
                &b.module,
                &b.target,
                &b.message,
                b.side.as_str(),
            ))
        });
        diagnostics.dedup();
        Self {
            operations,
            diagnostics,
        }
    }

    /// Aggregate run severity; PATCH when nothing was reported.
    pub fn max_severity(&self) -> Severity {
        self.operations
            .iter()
            .map(|op| op.severity)
            .max()
            .unwrap_or(Severity::Patch)
    }

    /// Operations grouped by category, categories sorted.
    pub fn by_category(&self) -> BTreeMap<&'static str, Vec<&Operation>> {
        let mut groups: BTreeMap<&'static str, Vec<&Operation>> = BTreeMap::new();
        for op in &self.operations {
            groups.entry(op.category()).or_default().push(op);
        }
        groups
    }

    pub fn count(&self, severity: Severity) -> usize {
        self.operations
            .iter()
            .filter(|op| op.severity == severity)
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }
}
