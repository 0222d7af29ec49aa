//! Ignored documentation-tag normalization.
//!
//! Two configured, case-insensitive tag sets drive the rewrite:
//!
//! - fully ignored: every occurrence is dropped, value and continuation
//!   lines included
//! - value ignored: the occurrence is kept as a bare `@tag`, so adding or
//!   removing it still shows up as a difference
//!
//! Anything else is left exactly as written. A line that starts like a tag
//! but cannot be parsed as one is left verbatim.

use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use super::comment::{canonicalize_block, doc_block_ranges};
use super::{rewrite_shared, FileMap, NoiseFilter};
use crate::config::FilterConfig;

static TAG_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(?P<lead>\s*(?:/\*\*|\*)\s*)@(?P<tag>[A-Za-z_][A-Za-z0-9_\-:\\]*)(?P<value>.*?)(?P<close>\s*\*/)?\s*$",
    )
    .unwrap()
});

static TAG_START: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*(?:/\*\*|\*)?\s*@").unwrap());

/// Rewrites configured tags inside documentation blocks.
pub struct IgnoredTagFilter {
    ignored: HashSet<String>,
    value_ignored: HashSet<String>,
}

impl IgnoredTagFilter {
    pub fn new(config: &FilterConfig) -> Self {
        let (ignored, value_ignored) = config.tag_sets();
        Self {
            ignored,
            value_ignored,
        }
    }

    fn is_noop(&self) -> bool {
        self.ignored.is_empty() && self.value_ignored.is_empty()
    }

    /// Rewrite every documentation block of a file.
    pub fn rewrite(&self, lines: &[String]) -> Vec<String> {
        if self.is_noop() {
            return lines.to_vec();
        }
        let ranges = doc_block_ranges(lines);
        let mut out = Vec::with_capacity(lines.len());
        let mut cursor = 0;
        for range in ranges {
            out.extend_from_slice(&lines[cursor..*range.start()]);
            out.extend(self.rewrite_block(&lines[range.clone()]));
            cursor = range.end() + 1;
        }
        out.extend_from_slice(&lines[cursor..]);
        out
    }

    fn rewrite_block(&self, block: &[String]) -> Vec<String> {
        let last = block.len() - 1;
        let mut out = Vec::with_capacity(block.len());
        // Inside the value of a tag we dropped or blanked.
        let mut swallowing = false;

        for (idx, line) in block.iter().enumerate() {
            let is_closer = idx == last && idx != 0;

            if let Some(caps) = TAG_LINE.captures(line) {
                let tag = caps["tag"].to_lowercase();
                let lead = &caps["lead"];
                let close = if caps.name("close").is_some() { " */" } else { "" };

                if self.ignored.contains(&tag) {
                    swallowing = true;
                    if lead.contains("/**") || !close.is_empty() {
                        out.push(format!("{}{}", lead.trim_end(), close));
                    }
                    continue;
                }
                if self.value_ignored.contains(&tag) {
                    swallowing = true;
                    out.push(format!("{}@{}{}", lead, &caps["tag"], close));
                    continue;
                }
                swallowing = false;
                out.push(line.clone());
                continue;
            }

            if TAG_START.is_match(line) {
                debug!(line = line.as_str(), "malformed documentation tag left verbatim");
                swallowing = false;
                out.push(line.clone());
                continue;
            }

            if swallowing {
                if is_closer {
                    if is_bare_closer(line) {
                        out.push(line.clone());
                        continue;
                    }
                    let indent: String = line.chars().take_while(|c| c.is_whitespace()).collect();
                    out.push(format!("{}*/", indent));
                    continue;
                }
                if is_blank_comment(line) {
                    swallowing = false;
                    out.push(line.clone());
                }
                continue;
            }

            out.push(line.clone());
        }

        if out.len() >= 2 {
            canonicalize_block(&out)
        } else {
            out
        }
    }
}

fn is_blank_comment(line: &str) -> bool {
    let t = line.trim();
    t.is_empty() || t == "*"
}

/// A closing line with nothing but gutter before the `*/`.
fn is_bare_closer(line: &str) -> bool {
    let t = line.trim();
    t == "*/" || t.trim_start_matches('*').trim_start() == "*/"
}

impl NoiseFilter for IgnoredTagFilter {
    fn name(&self) -> &'static str {
        "ignored-tag"
    }

    fn apply(&self, before: &mut FileMap, after: &mut FileMap) -> Vec<String> {
        rewrite_shared(before, after, |lines| self.rewrite(lines))
    }
}
