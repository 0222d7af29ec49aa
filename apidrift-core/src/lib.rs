//! apidrift core - semantic-versioning impact of API changes.
//!
//! Decides, per declared API element of a modular codebase, whether a change
//! between two snapshots is breaking (MAJOR), a compatible addition (MINOR)
//! or has no reportable effect (PATCH).
//!
//! # Features
//!
//! - **Noise filtering**: drop file pairs whose differences carry no meaning
//! - **Registry**: per-snapshot construct index with fatal duplicate detection
//! - **Hierarchy resolution**: effective members and API status via petgraph
//! - **Rule table**: classified, severity-tagged operations in a stable order
//!
//! # Pipeline
//!
//! ```text
//! raw files -> FilterPipeline -> (parser) -> ModuleStream -> Registry
//!           -> ResolvedSnapshot -> Comparator -> Report
//! ```
//!
//! # Usage
//!
//! ```rust
//! use apidrift_core::config::AnalyzerConfig;
//! use apidrift_core::types::{ClassDef, ClassKind, MemberDef, ModuleStream};
//!
//! let before = vec![ModuleStream::new(
//!     "Acme_Catalog",
//!     vec![ClassDef::new("Acme\\Repo", ClassKind::Class).api().into()],
//! )];
//! let after = vec![ModuleStream::new(
//!     "Acme_Catalog",
//!     vec![ClassDef::new("Acme\\Repo", ClassKind::Class)
//!         .api()
//!         .with_member(MemberDef::method("count"))
//!         .into()],
//! )];
//!
//! let report = apidrift_core::analyze(before, after, &AnalyzerConfig::default()).unwrap();
//! assert_eq!(report.len(), 1);
//! ```

pub mod config;
pub mod differ;
pub mod error;
pub mod filter;
pub mod hierarchy;
pub mod registry;
pub mod report;
pub mod types;

use tracing::info;

use config::{AnalyzerConfig, FilterConfig};
use error::{Result, Side};
use filter::{FileMap, FilterPipeline, FilterSummary};
use hierarchy::ResolvedSnapshot;
use registry::Registry;
use types::ModuleStream;

pub use differ::{Operation, OperationCode, Severity};
pub use error::DiffError;
pub use report::{Diagnostic, Report};

/// Build, resolve and compare both snapshots.
///
/// Any structural error aborts the run; no partial report is returned.
pub fn analyze(
    before: Vec<ModuleStream>,
    after: Vec<ModuleStream>,
    config: &AnalyzerConfig,
) -> Result<Report> {
    let before = ResolvedSnapshot::resolve(Registry::from_streams(Side::Before, before)?)?;
    let after = ResolvedSnapshot::resolve(Registry::from_streams(Side::After, after)?)?;

    let report = differ::Comparator::new(&before, &after, config).compare();
    info!(
        operations = report.len(),
        diagnostics = report.diagnostics.len(),
        severity = %report.max_severity(),
        "analysis complete"
    );
    Ok(report)
}

/// Run the noise filter pipeline over both file maps in place.
pub fn filter_files(before: &mut FileMap, after: &mut FileMap, config: &FilterConfig) -> FilterSummary {
    FilterPipeline::new(config).run(before, after)
}
