//! Documentation-comment spacing normalization.

use std::ops::RangeInclusive;

use super::{rewrite_shared, FileMap, NoiseFilter};

/// Canonicalizes spacing inside every `/** ... */` block.
pub struct DocCommentFilter;

impl NoiseFilter for DocCommentFilter {
    fn name(&self) -> &'static str {
        "doc-comment"
    }

    fn apply(&self, before: &mut FileMap, after: &mut FileMap) -> Vec<String> {
        rewrite_shared(before, after, canonicalize_doc_comments)
    }
}

/// Find documentation comment blocks as inclusive line ranges.
///
/// A block opens on a line whose first non-blank characters are `/**` and
/// closes on the first line (the same one included) that has `*/` after
/// the opener. An unterminated block is not a block.
pub fn doc_block_ranges(lines: &[String]) -> Vec<RangeInclusive<usize>> {
    let mut ranges = Vec::new();
    let mut i = 0;
    while i < lines.len() {
        let trimmed = lines[i].trim_start();
        if trimmed.starts_with("/**") && !trimmed.starts_with("/**/") {
            let tail = &trimmed[3..];
            if tail.contains("*/") {
                ranges.push(i..=i);
                i += 1;
                continue;
            }
            if let Some(end) = (i + 1..lines.len()).find(|&j| lines[j].contains("*/")) {
                ranges.push(i..=end);
                i = end + 1;
                continue;
            }
        }
        i += 1;
    }
    ranges
}

/// Rewrite every documentation block of a file into canonical spacing.
pub fn canonicalize_doc_comments(lines: &[String]) -> Vec<String> {
    let ranges = doc_block_ranges(lines);
    if ranges.is_empty() {
        return lines.to_vec();
    }

    let mut out = Vec::with_capacity(lines.len());
    let mut cursor = 0;
    for range in ranges {
        out.extend_from_slice(&lines[cursor..*range.start()]);
        out.extend(canonicalize_block(&lines[range.clone()]));
        cursor = range.end() + 1;
    }
    out.extend_from_slice(&lines[cursor..]);
    out
}

/// An interior line carrying nothing but the comment gutter.
fn is_blank_comment_line(line: &str) -> bool {
    let t = line.trim();
    t.is_empty() || t == "*"
}

/// Canonicalize one block (opener line through closer line).
///
/// Trailing whitespace is stripped from every line. Interior blank comment
/// lines are trimmed at both ends of the block and collapsed to a single
/// `<indent> *` line elsewhere.
pub fn canonicalize_block(block: &[String]) -> Vec<String> {
    let block: Vec<String> = block.iter().map(|l| l.trim_end().to_string()).collect();
    if block.len() < 2 {
        return block;
    }

    let opener = &block[0];
    let closer = &block[block.len() - 1];
    let indent: String = opener.chars().take_while(|c| c.is_whitespace()).collect();
    let blank = format!("{} *", indent);

    let interior = &block[1..block.len() - 1];
    let first = interior.iter().position(|l| !is_blank_comment_line(l));
    let last = interior.iter().rposition(|l| !is_blank_comment_line(l));

    let mut out = Vec::with_capacity(block.len());
    out.push(opener.clone());
    if let (Some(first), Some(last)) = (first, last) {
        let mut previous_blank = false;
        for line in &interior[first..=last] {
            if is_blank_comment_line(line) {
                if !previous_blank {
                    out.push(blank.clone());
                }
                previous_blank = true;
            } else {
                out.push(line.clone());
                previous_blank = false;
            }
        }
    }
    out.push(closer.clone());
    out
}
