//! Presence-only analysis for layout, style, schema and test constructs.

use crate::types::Construct;

use super::operation::{Operation, OperationCode};

/// Removal of a presence-only construct. `None` for class-likes.
pub fn removed(module: &str, key: &str, construct: &Construct) -> Option<Operation> {
    let kind = construct.domain_kind()?;
    Some(
        Operation::new(OperationCode::ElementRemoved(kind), module, key)
            .at(construct.location())
            .because(format!("{} '{}' was removed", kind.prefix(), display_name(key))),
    )
}

/// Addition of a presence-only construct. `None` for class-likes.
pub fn added(module: &str, key: &str, construct: &Construct) -> Option<Operation> {
    let kind = construct.domain_kind()?;
    Some(
        Operation::new(OperationCode::ElementAdded(kind), module, key)
            .at(construct.location())
            .because(format!("{} '{}' was added", kind.prefix(), display_name(key))),
    )
}

fn display_name(key: &str) -> &str {
    key.split_once(':').map(|(_, name)| name).unwrap_or(key)
}
