//! Codes command - print the operation taxonomy

use anyhow::Result;
use apidrift_core::{OperationCode, Severity};
use colored::Colorize;
use serde::Serialize;

use crate::output::{Column, Output, OutputConfig, Outputter, TableOutput};

#[derive(Debug, Serialize)]
pub struct CodeEntry {
    pub code: String,
    pub severity: Severity,
    pub category: &'static str,
    pub description: &'static str,
}

impl From<OperationCode> for CodeEntry {
    fn from(code: OperationCode) -> Self {
        Self {
            code: code.code().to_string(),
            severity: code.severity(),
            category: code.category(),
            description: code.description(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CodeList {
    pub codes: Vec<CodeEntry>,
}

impl CodeList {
    /// Every code, optionally narrowed to one category and/or severity.
    pub fn collect(category: Option<&str>, severity: Option<Severity>) -> Self {
        let codes = OperationCode::all()
            .into_iter()
            .filter(|code| category.map_or(true, |c| code.category().eq_ignore_ascii_case(c)))
            .filter(|code| severity.map_or(true, |s| code.severity() == s))
            .map(CodeEntry::from)
            .collect();
        Self { codes }
    }
}

#[derive(Serialize)]
struct CodeRow<'a> {
    code: &'a str,
    severity: String,
    category: &'static str,
    description: &'static str,
}

impl Outputter for CodeList {
    fn to_table(&self, config: &OutputConfig) -> String {
        if self.codes.is_empty() {
            return format!("{}", "No operation codes match.".dimmed());
        }
        let rows: Vec<CodeRow> = self
            .codes
            .iter()
            .map(|entry| CodeRow {
                code: &entry.code,
                severity: entry.severity.to_string(),
                category: entry.category,
                description: entry.description,
            })
            .collect();
        let columns = vec![
            Column::new("Code", "code"),
            Column::new("Severity", "severity"),
            Column::new("Category", "category"),
            Column::new("Description", "description").with_max_width(60),
        ];
        TableOutput::format_with_columns(&rows, &columns, config)
    }
}

pub fn run(category: Option<&str>, severity: Option<Severity>, output: OutputConfig) -> Result<()> {
    Output::new(CodeList::collect(category, severity), output).render()
}
