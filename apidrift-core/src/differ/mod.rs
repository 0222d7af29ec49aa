//! Semantic-versioning diff engine over resolved snapshots.
//!
//! # Features
//!
//! - **Rule table**: visibility, signature, type, exception and class-shape rules
//! - **Inheritance aware**: members are compared through effective tables
//! - **Presence-only domains**: layout, style, schema and test elements
//! - **Stable taxonomy**: every rule maps to one code with a fixed severity
//!
//! # Example
//!
//! ```rust
//! use apidrift_core::config::AnalyzerConfig;
//! use apidrift_core::differ::{Comparator, OperationCode, Severity};
//! use apidrift_core::error::Side;
//! use apidrift_core::hierarchy::ResolvedSnapshot;
//! use apidrift_core::registry::Registry;
//! use apidrift_core::types::{ClassDef, ClassKind, MemberDef, ModuleStream};
//!
//! let class = |members: Vec<MemberDef>| {
//!     let mut class = ClassDef::new("Acme\\Repo", ClassKind::Class).api();
//!     class.members = members;
//!     ModuleStream::new("Acme_Catalog", vec![class.into()])
//! };
//! let before = Registry::from_streams(Side::Before, vec![class(vec![MemberDef::method("save")])]).unwrap();
//! let after = Registry::from_streams(Side::After, vec![class(vec![])]).unwrap();
//! let before = ResolvedSnapshot::resolve(before).unwrap();
//! let after = ResolvedSnapshot::resolve(after).unwrap();
//!
//! let report = Comparator::new(&before, &after, &AnalyzerConfig::default()).compare();
//! assert_eq!(report.operations[0].code, OperationCode::MethodRemoved);
//! assert_eq!(report.max_severity(), Severity::Major);
//! ```

pub mod comparator;
pub mod domain;
pub mod operation;
pub mod signature;

pub use comparator::Comparator;
pub use operation::{Operation, OperationCode, Severity};
pub use signature::{classify_type_change, TypeChange, TypeSet};
