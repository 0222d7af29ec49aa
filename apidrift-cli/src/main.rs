//! apidrift CLI - semantic-versioning verdicts for API changes
//!
//! Compares two parsed snapshots of a modular codebase and classifies every
//! change to its declared API as MAJOR, MINOR or PATCH.

use std::path::PathBuf;
use std::process::ExitCode;

use apidrift_core::Severity;
use clap::{CommandFactory, Parser, Subcommand};
use colored::Colorize;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod commands;
mod config;
mod output;

use commands::*;
use config::ApidriftConfig;
use output::{OutputConfig, OutputFormat};

/// Parse a severity name (`major`, `minor`, `patch`)
fn parse_severity(s: &str) -> Result<Severity, String> {
    s.parse()
}

/// Semantic-versioning impact of API changes.
///
/// apidrift compares two snapshots of a codebase's declared API and reports
/// which changes are breaking, which are compatible additions, and which
/// carry no API effect at all.
#[derive(Parser)]
#[command(name = "apidrift")]
#[command(author, version)]
#[command(about = "Semantic-versioning impact of API changes")]
#[command(propagate_version = true)]
#[command(next_help_heading = "Options")]
#[command(after_help = "Examples:
  apidrift check --before v1.json --after v2.json
  apidrift filter --before release-1.0/ --after release-1.1/
  apidrift codes --category method")]
pub struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Enable verbose output (debug logging)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Output format (overrides config default)
    #[arg(long, global = true, value_enum)]
    format: Option<OutputFormat>,

    /// Configuration file (default: ./.apidrift.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Fail on configuration errors instead of falling back to defaults
    #[arg(long, global = true)]
    strict: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Classify the API changes between two parsed snapshots
    Check {
        /// Construct stream JSON (file or directory) of the old snapshot
        #[arg(long)]
        before: PathBuf,

        /// Construct stream JSON (file or directory) of the new snapshot
        #[arg(long)]
        after: PathBuf,

        /// Lowest severity that fails the check (overrides config)
        #[arg(long, value_parser = parse_severity)]
        fail_on: Option<Severity>,
    },

    /// List which changed files survive the noise filters
    Filter {
        /// Source tree of the old snapshot
        #[arg(long)]
        before: PathBuf,

        /// Source tree of the new snapshot
        #[arg(long)]
        after: PathBuf,
    },

    /// Print the operation taxonomy
    Codes {
        /// Only codes of this category (class, method, property, layout, ...)
        #[arg(short, long)]
        category: Option<String>,

        /// Only codes of this severity
        #[arg(short, long, value_parser = parse_severity)]
        severity: Option<Severity>,
    },
}

fn setup_logging(verbose: bool, quiet: bool) {
    let filter = if quiet {
        "error"
    } else if verbose {
        "debug"
    } else {
        "warn"
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .init();
}

fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    let config = ApidriftConfig::load(std::path::Path::new("."), cli.config.as_deref(), cli.strict)?;

    // Resolve output format: CLI flag > config default > Table
    let format = match cli.format {
        Some(format) => format,
        None => match config.default_format() {
            Some(name) => name.parse().unwrap_or_else(|e: String| {
                tracing::warn!("{}; using table output", e);
                OutputFormat::Table
            }),
            None => OutputFormat::Table,
        },
    };
    let output = OutputConfig::auto_detect(format, config.use_color());
    colored::control::set_override(output.use_colors());

    let command = match cli.command {
        Some(cmd) => cmd,
        None => {
            let _ = Cli::command().print_help();
            println!();
            return Ok(ExitCode::SUCCESS);
        }
    };

    match command {
        Commands::Check {
            before,
            after,
            fail_on,
        } => {
            let fail_on = fail_on.unwrap_or_else(|| config.fail_on());
            check::run(&before, &after, &config.analyzer, fail_on, output)
        }
        Commands::Filter { before, after } => {
            filter::run(&before, &after, &config.filter, output).map(|()| ExitCode::SUCCESS)
        }
        Commands::Codes { category, severity } => {
            codes::run(category.as_deref(), severity, output).map(|()| ExitCode::SUCCESS)
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    setup_logging(cli.verbose, cli.quiet);

    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{} {:#}", "error:".red().bold(), e);
            ExitCode::from(2)
        }
    }
}
