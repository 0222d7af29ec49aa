//! Filter command - which changed files carry meaning
//!
//! Walks two source trees, drops identical files, runs the noise filter
//! pipeline over the rest and lists what survives.

use std::path::Path;

use anyhow::{Context, Result};
use apidrift_core::config::FilterConfig;
use apidrift_core::filter::{FileMap, FilterPipeline, RemovedFile};
use colored::Colorize;
use ignore::WalkBuilder;
use serde::Serialize;
use tracing::debug;

use crate::output::{Column, Output, OutputConfig, Outputter, TableOutput};

/// Per-tree ignore file, in `.gitignore` syntax.
pub const IGNORE_FILE: &str = ".apidriftignore";

/// Read every regular file under `root` into a map keyed by `/`-separated
/// relative path. Hidden entries and `.apidriftignore` matches are skipped.
pub fn read_tree(root: &Path) -> Result<FileMap> {
    if !root.is_dir() {
        anyhow::bail!("not a directory: {}", root.display());
    }

    let mut files = FileMap::new();
    let walker = WalkBuilder::new(root)
        .git_ignore(false)
        .git_global(false)
        .git_exclude(false)
        .parents(false)
        .add_custom_ignore_filename(IGNORE_FILE)
        .build();

    for entry in walker {
        let entry = entry.with_context(|| format!("Failed to walk {}", root.display()))?;
        if !entry.file_type().is_some_and(|t| t.is_file()) {
            continue;
        }
        let path = entry.path();
        let relative = path.strip_prefix(root).unwrap_or(path);
        let key = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        let bytes = std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
        let text = String::from_utf8_lossy(&bytes);
        files.insert(key, text.lines().map(str::to_string).collect());
    }

    debug!(root = %root.display(), files = files.len(), "source tree loaded");
    Ok(files)
}

/// Outcome of filtering two trees.
#[derive(Debug, Default, Serialize)]
pub struct FilterResult {
    /// Pipeline stage names in execution order.
    pub stages: Vec<&'static str>,
    /// Files present on both sides that still differ.
    pub changed: Vec<String>,
    /// Files identical before any filter ran.
    pub unchanged: usize,
    /// Pairs the pipeline proved equivalent, with the stage that did it.
    pub filtered: Vec<RemovedFile>,
    pub only_before: Vec<String>,
    pub only_after: Vec<String>,
}

/// Drop identical pairs, then run the pipeline over what is left.
pub fn filter_trees(mut before: FileMap, mut after: FileMap, config: &FilterConfig) -> FilterResult {
    let identical: Vec<String> = before
        .iter()
        .filter(|(path, lines)| after.get(*path) == Some(*lines))
        .map(|(path, _)| path.clone())
        .collect();
    for path in &identical {
        before.remove(path);
        after.remove(path);
    }

    let only_before = before.keys().filter(|p| !after.contains_key(*p)).cloned().collect();
    let only_after = after.keys().filter(|p| !before.contains_key(*p)).cloned().collect();

    let pipeline = FilterPipeline::new(config);
    let summary = pipeline.run(&mut before, &mut after);
    let changed = before.keys().filter(|p| after.contains_key(*p)).cloned().collect();

    FilterResult {
        stages: pipeline.stages(),
        changed,
        unchanged: identical.len(),
        filtered: summary.removed,
        only_before,
        only_after,
    }
}

#[derive(Serialize)]
struct StageRow {
    stage: &'static str,
    files: usize,
}

impl Outputter for FilterResult {
    fn to_table(&self, config: &OutputConfig) -> String {
        let mut output = String::new();

        output.push_str(&format!(
            "{} {} changed, {} filtered as noise, {} unchanged\n\n",
            "FILTER:".cyan().bold(),
            self.changed.len().to_string().yellow(),
            self.filtered.len().to_string().green(),
            self.unchanged
        ));

        let rows: Vec<StageRow> = self
            .stages
            .iter()
            .map(|&stage| StageRow {
                stage,
                files: self.filtered.iter().filter(|r| r.stage == stage).count(),
            })
            .collect();
        let columns = vec![Column::new("Stage", "stage"), Column::new("Files", "files")];
        output.push_str(&TableOutput::format_with_columns(&rows, &columns, config));
        output.push_str("\n\n");

        let sections = [
            ("CHANGED", &self.changed),
            ("ONLY BEFORE", &self.only_before),
            ("ONLY AFTER", &self.only_after),
        ];
        for (title, paths) in sections {
            if paths.is_empty() {
                continue;
            }
            output.push_str(&format!("{} ({})\n", title.bold(), paths.len()));
            for path in paths.iter() {
                output.push_str(&format!("  {}\n", path));
            }
            output.push('\n');
        }

        output.trim_end().to_string()
    }
}

pub fn run(before: &Path, after: &Path, config: &FilterConfig, output: OutputConfig) -> Result<()> {
    let before_files = read_tree(before)?;
    let after_files = read_tree(after)?;

    let result = filter_trees(before_files, after_files, config);
    Output::new(result, output).render()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(text: &str) -> Vec<String> {
        text.lines().map(str::to_string).collect()
    }

    #[test]
    fn test_filter_trees_classifies_every_path() {
        let mut before = FileMap::new();
        let mut after = FileMap::new();
        before.insert("Same.src".into(), lines("namespace Acme;\nf();"));
        after.insert("Same.src".into(), lines("namespace Acme;\nf();"));
        before.insert("Spacing.src".into(), lines("namespace Acme;\nf();   "));
        after.insert("Spacing.src".into(), lines("namespace Acme;\n\nf();"));
        before.insert("Real.src".into(), lines("namespace Acme;\nf();"));
        after.insert("Real.src".into(), lines("namespace Acme;\ng();"));
        before.insert("Gone.src".into(), lines("x"));
        after.insert("New.src".into(), lines("y"));

        let result = filter_trees(before, after, &FilterConfig::default());

        assert_eq!(result.unchanged, 1);
        assert_eq!(result.changed, vec!["Real.src"]);
        assert_eq!(result.filtered.len(), 1);
        assert_eq!(result.filtered[0].path, "Spacing.src");
        assert_eq!(result.filtered[0].stage, "whitespace");
        assert_eq!(result.only_before, vec!["Gone.src"]);
        assert_eq!(result.only_after, vec!["New.src"]);
    }

    #[test]
    fn test_read_tree_requires_a_directory() {
        assert!(read_tree(Path::new("/definitely/not/a/dir")).is_err());
    }
}
