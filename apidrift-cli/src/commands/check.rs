//! Check command - semantic-versioning verdict between two parsed snapshots
//!
//! Reads the construct streams of both sides, runs registry, hierarchy and
//! comparator, and reports every classified operation.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use apidrift_core::config::AnalyzerConfig;
use apidrift_core::types::ModuleStream;
use apidrift_core::{Operation, Report, Severity};
use colored::Colorize;
use ignore::WalkBuilder;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::output::{Alignment, Column, Output, OutputConfig, Outputter, TableOutput};

/// A stream file holds one module or a list of them.
#[derive(Deserialize)]
#[serde(untagged)]
enum StreamDocument {
    Many(Vec<ModuleStream>),
    One(ModuleStream),
}

/// Load construct streams from a JSON file, or from every `*.json` file
/// under a directory in path order.
pub fn load_streams(path: &Path) -> Result<Vec<ModuleStream>> {
    if !path.is_dir() {
        return read_document(path);
    }

    let mut files: Vec<PathBuf> = Vec::new();
    for entry in WalkBuilder::new(path).git_ignore(false).parents(false).build() {
        let entry = entry.with_context(|| format!("Failed to walk {}", path.display()))?;
        let is_json = entry.path().extension().is_some_and(|ext| ext == "json");
        if is_json && entry.file_type().is_some_and(|t| t.is_file()) {
            files.push(entry.into_path());
        }
    }
    files.sort();

    let mut streams = Vec::new();
    for file in &files {
        streams.extend(read_document(file)?);
    }
    debug!(path = %path.display(), files = files.len(), modules = streams.len(), "construct streams loaded");
    Ok(streams)
}

fn read_document(path: &Path) -> Result<Vec<ModuleStream>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let document: StreamDocument = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse construct stream {}", path.display()))?;
    Ok(match document {
        StreamDocument::Many(streams) => streams,
        StreamDocument::One(stream) => vec![stream],
    })
}

#[derive(Debug, Serialize)]
pub struct SeverityCounts {
    pub major: usize,
    pub minor: usize,
    pub patch: usize,
}

/// Result of a check run.
#[derive(Debug, Serialize)]
pub struct CheckResult {
    pub before: String,
    pub after: String,
    /// Highest severity in the report.
    pub verdict: Severity,
    pub fail_on: Severity,
    /// True when some non-warning operation reaches `fail_on`.
    pub failed: bool,
    pub counts: SeverityCounts,
    #[serde(flatten)]
    pub report: Report,
}

impl CheckResult {
    pub fn new(before: &Path, after: &Path, report: Report, fail_on: Severity) -> Self {
        let failed = report
            .operations
            .iter()
            .any(|op| !op.code.is_warning() && op.severity >= fail_on);
        Self {
            before: before.display().to_string(),
            after: after.display().to_string(),
            verdict: report.max_severity(),
            fail_on,
            failed,
            counts: SeverityCounts {
                major: report.count(Severity::Major),
                minor: report.count(Severity::Minor),
                patch: report.count(Severity::Patch),
            },
            report,
        }
    }
}

#[derive(Serialize)]
struct CategoryRow {
    category: &'static str,
    operations: usize,
    major: usize,
}

fn painted_severity(severity: Severity) -> colored::ColoredString {
    let label = severity.to_string();
    match severity {
        Severity::Major => label.red().bold(),
        Severity::Minor => label.yellow().bold(),
        Severity::Patch => label.green(),
    }
}

fn push_operation(output: &mut String, op: &Operation) {
    output.push_str(&format!(
        "  {} {}\n",
        op.target.bold(),
        format!("[{}]", op.code.code()).dimmed()
    ));
    output.push_str(&format!("     {}\n", op.reason));
    if !op.location.file.is_empty() {
        output.push_str(&format!("     {}\n", op.location.to_string().dimmed()));
    }
}

impl Outputter for CheckResult {
    fn to_table(&self, config: &OutputConfig) -> String {
        let mut output = String::new();

        output.push_str(&format!(
            "{} {} -> {}\n",
            "CHECK:".cyan().bold(),
            self.before.yellow(),
            self.after.green()
        ));
        output.push_str(&format!(
            "Found {} operations ({} major, {} minor, {} patch)\n\n",
            self.report.len().to_string().cyan(),
            self.counts.major.to_string().red(),
            self.counts.minor.to_string().yellow(),
            self.counts.patch
        ));

        if self.report.is_empty() {
            output.push_str(&format!("{}\n", "No API changes detected.".dimmed()));
        }

        for severity in [Severity::Major, Severity::Minor, Severity::Patch] {
            let ops: Vec<&Operation> = self
                .report
                .operations
                .iter()
                .filter(|op| op.severity == severity)
                .collect();
            if ops.is_empty() {
                continue;
            }
            output.push_str(&format!("{}\n", painted_severity(severity)));
            output.push_str(&format!("{}\n", "-".repeat(60)));
            let mut module = "";
            for op in ops {
                if op.module != module {
                    module = &op.module;
                    output.push_str(&format!("{}\n", module.cyan()));
                }
                push_operation(&mut output, op);
            }
            output.push('\n');
        }

        if self.report.len() > 1 {
            let rows: Vec<CategoryRow> = self
                .report
                .by_category()
                .into_iter()
                .map(|(category, ops)| CategoryRow {
                    category,
                    operations: ops.len(),
                    major: ops.iter().filter(|op| op.severity == Severity::Major).count(),
                })
                .collect();
            let columns = vec![
                Column::new("Category", "category"),
                Column::new("Operations", "operations").with_alignment(Alignment::Right),
                Column::new("Major", "major").with_alignment(Alignment::Right),
            ];
            output.push_str(&TableOutput::format_with_columns(&rows, &columns, config));
            output.push_str("\n\n");
        }

        if !self.report.diagnostics.is_empty() {
            output.push_str(&format!(
                "{} ({})\n",
                "DIAGNOSTICS".yellow().bold(),
                self.report.diagnostics.len()
            ));
            for diagnostic in &self.report.diagnostics {
                output.push_str(&format!(
                    "  {} {} {}\n",
                    format!("[{}]", diagnostic.side).dimmed(),
                    diagnostic.target,
                    diagnostic.message.dimmed()
                ));
            }
            output.push('\n');
        }

        let status = if self.failed {
            "FAIL".red().bold()
        } else {
            "OK".green().bold()
        };
        output.push_str(&format!(
            "Verdict: {} (fail on {}) {}",
            painted_severity(self.verdict),
            self.fail_on,
            status
        ));
        output
    }
}

/// Run the check and map the verdict to an exit status.
pub fn run(
    before: &Path,
    after: &Path,
    analyzer: &AnalyzerConfig,
    fail_on: Severity,
    output: OutputConfig,
) -> Result<ExitCode> {
    let before_streams = load_streams(before)?;
    let after_streams = load_streams(after)?;

    let report = apidrift_core::analyze(before_streams, after_streams, analyzer)
        .context("Snapshots are structurally invalid")?;

    let result = CheckResult::new(before, after, report, fail_on);
    let code = if result.failed {
        ExitCode::from(1)
    } else {
        ExitCode::SUCCESS
    };
    Output::new(result, output).render()?;
    Ok(code)
}
