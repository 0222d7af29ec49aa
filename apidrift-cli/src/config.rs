//! apidrift configuration loading from `.apidrift.toml`.
//!
//! Configuration is optional: without a file every section uses its
//! defaults.
//!
//! # Example Configuration
//!
//! ```toml
//! [filter]
//! ignored_tags = ["since", "author"]
//! value_ignored_tags = ["see", "link"]
//!
//! [analyzer]
//! internal_removals = "report"
//! exempt_lifecycle_members = false
//!
//! [check]
//! fail_on = "major"
//!
//! [output]
//! format = "table"
//! color = true
//! ```

use std::path::Path;

use anyhow::{Context, Result};
use apidrift_core::config::{AnalyzerConfig, FilterConfig};
use apidrift_core::Severity;
use serde::Deserialize;

/// File looked up in the working directory when `--config` is not given.
pub const CONFIG_FILE: &str = ".apidrift.toml";

/// Root configuration structure loaded from `.apidrift.toml`.
#[derive(Debug, Deserialize, Default)]
pub struct ApidriftConfig {
    /// Noise filter tag sets.
    #[serde(default)]
    pub filter: FilterConfig,

    /// Comparator switches.
    #[serde(default)]
    pub analyzer: AnalyzerConfig,

    /// Verdict threshold for `apidrift check`.
    #[serde(default)]
    pub check: CheckSettings,

    /// Output formatting preferences.
    #[serde(default)]
    pub output: OutputSettings,
}

#[derive(Debug, Deserialize, Default)]
pub struct CheckSettings {
    /// Lowest severity that makes `apidrift check` exit non-zero.
    ///
    /// Default: `major`
    #[serde(default)]
    pub fail_on: Option<Severity>,
}

/// Output formatting preferences.
///
/// Command-line flags (e.g., `--format json`) override these settings.
#[derive(Debug, Deserialize, Default)]
pub struct OutputSettings {
    /// Valid values: `table`, `json`
    #[serde(default)]
    pub format: Option<String>,

    /// Defaults to `true` when stdout is a TTY.
    #[serde(default)]
    pub color: Option<bool>,
}

impl ApidriftConfig {
    /// Load configuration from an explicit path or `.apidrift.toml` under `root`.
    ///
    /// A missing default file yields defaults. An explicit path must exist.
    /// A file that cannot be read or parsed is logged as a warning, or
    /// returned as an error when `strict` is set.
    pub fn load(root: &Path, explicit: Option<&Path>, strict: bool) -> Result<Self> {
        let config_path = match explicit {
            Some(path) => {
                if !path.exists() {
                    anyhow::bail!("config file not found: {}", path.display());
                }
                path.to_path_buf()
            }
            None => root.join(CONFIG_FILE),
        };
        if !config_path.exists() {
            return Ok(Self::default());
        }

        let parsed = std::fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read {}", config_path.display()))
            .and_then(|content| {
                toml::from_str::<Self>(&content)
                    .with_context(|| format!("Failed to parse {}", config_path.display()))
            });

        match parsed {
            Ok(config) => Ok(config),
            Err(e) if strict => Err(e),
            Err(e) => {
                tracing::warn!("{:#}; using defaults", e);
                Ok(Self::default())
            }
        }
    }

    /// Get the verdict threshold, `major` unless configured.
    pub fn fail_on(&self) -> Severity {
        self.check.fail_on.unwrap_or(Severity::Major)
    }

    /// Get the default output format, if configured.
    pub fn default_format(&self) -> Option<&str> {
        self.output.format.as_deref()
    }

    /// Returns the configured value, or `None` to use auto-detection.
    pub fn use_color(&self) -> Option<bool> {
        self.output.color
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use apidrift_core::config::InternalSurface;

    #[test]
    fn test_default_config() {
        let config = ApidriftConfig::default();
        assert!(config.filter.ignored_tags.is_empty());
        assert_eq!(config.analyzer.internal_removals, InternalSurface::Ignore);
        assert_eq!(config.fail_on(), Severity::Major);
        assert!(config.default_format().is_none());
    }

    #[test]
    fn test_parse_full_config() {
        let toml_content = r#"
[filter]
ignored_tags = ["since", "author"]
value_ignored_tags = ["see"]

[analyzer]
internal_removals = "report"
exempt_lifecycle_members = true

[check]
fail_on = "minor"

[output]
format = "json"
color = false
"#;
        let config: ApidriftConfig = toml::from_str(toml_content).unwrap();

        assert_eq!(config.filter.ignored_tags, vec!["since", "author"]);
        assert!(config.filter.is_value_ignored("@SEE"));
        assert!(config.analyzer.reports_internal_removals());
        assert!(config.analyzer.exempt_lifecycle_members);
        assert_eq!(config.fail_on(), Severity::Minor);
        assert_eq!(config.default_format(), Some("json"));
        assert_eq!(config.use_color(), Some(false));
    }

    #[test]
    fn test_missing_default_file_uses_defaults() {
        let dir = std::env::temp_dir().join("apidrift-config-missing");
        let config = ApidriftConfig::load(&dir, None, true).unwrap();
        assert_eq!(config.fail_on(), Severity::Major);
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let path = Path::new("/definitely/not/here/.apidrift.toml");
        assert!(ApidriftConfig::load(Path::new("."), Some(path), false).is_err());
    }

    #[test]
    fn test_unknown_severity_is_rejected() {
        let result: std::result::Result<ApidriftConfig, _> = toml::from_str("[check]\nfail_on = \"huge\"\n");
        assert!(result.is_err());
    }
}
