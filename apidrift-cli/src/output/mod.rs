//! Rendering of command results
//!
//! A result renders either as colored text with `tabled` tables or as
//! pretty-printed JSON. Colors and wrapping follow whether stdout is a TTY.

use clap::ValueEnum;
use serde::Serialize;
use std::io::IsTerminal;
use std::str::FromStr;

mod table;

pub use self::table::TableOutput;

/// How results are printed
#[derive(Debug, Clone, Copy, Default, ValueEnum, PartialEq, Eq)]
pub enum OutputFormat {
    /// Sections and tables for people
    #[default]
    Table,
    /// Pretty-printed JSON for CI tooling
    Json,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "table" => Ok(OutputFormat::Table),
            "json" => Ok(OutputFormat::Json),
            _ => Err(format!("Unknown output format: '{}'", s)),
        }
    }
}

/// Rendering settings resolved once per run
#[derive(Debug, Clone)]
pub struct OutputConfig {
    pub format: OutputFormat,
    pub no_color: bool,
    /// Keep long cells intact instead of wrapping to the terminal
    pub no_truncate: bool,
}

impl OutputConfig {
    pub fn new(format: OutputFormat) -> Self {
        Self {
            format,
            no_color: false,
            no_truncate: false,
        }
    }

    /// Detect the terminal. Piped output is never wrapped, and is only
    /// colored when `color_override` is `Some(true)`.
    pub fn auto_detect(format: OutputFormat, color_override: Option<bool>) -> Self {
        let is_tty = std::io::stdout().is_terminal();
        Self {
            no_color: !color_override.unwrap_or(is_tty),
            no_truncate: !is_tty,
            ..Self::new(format)
        }
    }

    /// Terminal width, 100 columns when it cannot be read.
    pub fn terminal_width(&self) -> usize {
        terminal_size::terminal_size()
            .map(|(w, _)| w.0 as usize)
            .unwrap_or(100)
    }

    pub fn use_colors(&self) -> bool {
        !self.no_color
    }

    pub fn should_truncate(&self) -> bool {
        !self.no_truncate
    }
}

#[cfg(test)]
impl OutputConfig {
    /// Uncolored and unwrapped, for stable assertions.
    pub fn plain(format: OutputFormat) -> Self {
        Self {
            no_color: true,
            no_truncate: true,
            ..Self::new(format)
        }
    }
}

/// A table column: header text plus the serialized field it shows
#[derive(Debug, Clone)]
pub struct Column {
    pub name: String,
    pub key: String,
    /// Cells longer than this are cut with `...` on a terminal
    pub max_width: Option<usize>,
    pub align: Alignment,
}

impl Column {
    pub fn new(name: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            key: key.into(),
            max_width: None,
            align: Alignment::Left,
        }
    }

    pub fn with_max_width(mut self, width: usize) -> Self {
        self.max_width = Some(width);
        self
    }

    pub fn with_alignment(mut self, align: Alignment) -> Self {
        self.align = align;
        self
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Alignment {
    #[default]
    Left,
    Right,
}

/// A command result that can be printed in every supported format.
pub trait Outputter: Serialize {
    /// Colored sections and tables
    fn to_table(&self, config: &OutputConfig) -> String;

    fn to_json(&self, _config: &OutputConfig) -> String {
        serde_json::to_string_pretty(self)
            .unwrap_or_else(|e| format!("{{\n  \"error\": \"{}\"\n}}", e))
    }

    fn render(&self, config: &OutputConfig) -> String {
        match config.format {
            OutputFormat::Table => self.to_table(config),
            OutputFormat::Json => self.to_json(config),
        }
    }
}

/// A result bound to its rendering settings
pub struct Output<T> {
    data: T,
    config: OutputConfig,
}

impl<T: Outputter> Output<T> {
    pub fn new(data: T, config: OutputConfig) -> Self {
        Self { data, config }
    }

    /// Print to stdout
    pub fn render(&self) -> anyhow::Result<()> {
        println!("{}", self.data.render(&self.config));
        Ok(())
    }
}

/// Cut a string to `max_width` characters, ending in `...` when cut.
pub fn truncate(s: &str, max_width: usize) -> String {
    if s.chars().count() <= max_width {
        s.to_string()
    } else if max_width <= 3 {
        s.chars().take(max_width).collect()
    } else {
        let kept: String = s.chars().take(max_width - 3).collect();
        format!("{}...", kept)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use apidrift_core::{Operation, OperationCode};

    #[test]
    fn test_truncate_keeps_short_values() {
        assert_eq!(truncate("save()", 10), "save()");
    }

    #[test]
    fn test_truncate_cuts_long_targets() {
        assert_eq!(truncate("Acme\\Catalog\\Repo::save()", 10), "Acme\\Ca...");
        assert_eq!(truncate("abcdef", 2), "ab");
    }

    #[test]
    fn test_format_from_str() {
        assert_eq!(" JSON".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
        assert!("csv".parse::<OutputFormat>().is_err());
    }

    #[test]
    fn test_render_follows_format() {
        let op = Operation::new(OperationCode::MethodRemoved, "Acme_Catalog", "Acme\\Repo::save()");

        let json = op_render(&op, OutputFormat::Json);
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["code"], "method.removed");
        assert_eq!(value["severity"], "major");

        assert_eq!(op_render(&op, OutputFormat::Table), "Acme\\Repo::save() [method.removed]");
    }

    #[derive(Serialize)]
    struct Single<'a>(&'a Operation);

    impl Outputter for Single<'_> {
        fn to_table(&self, _config: &OutputConfig) -> String {
            format!("{} [{}]", self.0.target, self.0.code.code())
        }
    }

    fn op_render(op: &Operation, format: OutputFormat) -> String {
        Single(op).render(&OutputConfig::plain(format))
    }

    #[test]
    fn test_piped_output_is_not_wrapped() {
        let config = OutputConfig::plain(OutputFormat::Table);
        assert!(!config.use_colors());
        assert!(!config.should_truncate());
    }
}
