//! Error types for apidrift-core.
//!
//! Only structural failures live here. Every classified change (removed,
//! narrowed, visibility decreased, ...) is an [`Operation`](crate::differ::Operation),
//! never an error.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias for apidrift-core operations.
pub type Result<T> = std::result::Result<T, DiffError>;

/// Which snapshot a registry or graph was built from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Before,
    After,
}

impl Side {
    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Before => "before",
            Side::After => "after",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fatal errors that abort a run. No partial report survives one of these.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DiffError {
    /// The same unique key was declared twice in one module of one snapshot.
    #[error("Duplicate key '{key}' in module '{module}' ({side} snapshot)")]
    DuplicateKey {
        /// Snapshot the duplicate was found in.
        side: Side,
        /// Declaring module.
        module: String,
        /// The colliding key.
        key: String,
    },

    /// A construct arrived without an identity.
    #[error("Construct with empty key in module '{module}' ({side} snapshot)")]
    EmptyKey {
        /// Snapshot the construct belongs to.
        side: Side,
        /// Declaring module.
        module: String,
    },

    /// The extends/implements/uses graph contains a cycle.
    #[error("Inheritance cycle in {side} snapshot: {}", members.join(" -> "))]
    HierarchyCycle {
        /// Snapshot the cycle was found in.
        side: Side,
        /// Keys participating in the cycle, sorted.
        members: Vec<String>,
    },
}

impl DiffError {
    /// Snapshot side the error originated from.
    pub fn side(&self) -> Side {
        match self {
            DiffError::DuplicateKey { side, .. }
            | DiffError::EmptyKey { side, .. }
            | DiffError::HierarchyCycle { side, .. } => *side,
        }
    }
}
