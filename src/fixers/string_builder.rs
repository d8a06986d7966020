//! Replace `s += expr` inside loops with a strings.Builder.
//!
//! The builder is declared immediately before the loop, every flagged `+=`
//! in the loop body becomes a WriteString, and the accumulated value is
//! assigned back right after the loop closes. One builder per loop even
//! when several lines are flagged.

use super::{
    apply_fixer, entries_from_smells, find_balanced_end, find_enclosing_for, FixEntry, FixResult,
    Track,
};
use regex::Regex;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::OnceLock;

pub fn detect_string_concat(root: &Path, exclusions: &[&str]) -> Vec<FixEntry> {
    entries_from_smells(root, exclusions, &["string_concat_loop"])
}

fn concat_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(\s*)(\w+)\s*\+=\s*(.+)$").expect("valid regex"))
}

fn transform(mut lines: Vec<String>, entries: &[&FixEntry]) -> (Vec<String>, Vec<String>) {
    let mut removed = Vec::new();

    // Resolve each entry to its enclosing loop before any mutation, then
    // rewrite loops bottom-up so insertions never shift pending indexes.
    let mut loops: BTreeMap<usize, Vec<(usize, u32)>> = BTreeMap::new();
    for entry in entries {
        let idx = entry.line as usize - 1;
        if idx >= lines.len() || !concat_re().is_match(&lines[idx]) {
            continue;
        }
        if let Some(for_idx) = find_enclosing_for(&lines, idx) {
            loops.entry(for_idx).or_default().push((idx, entry.line));
        }
    }

    let loop_indexes: Vec<usize> = loops.keys().rev().copied().collect();
    for for_idx in loop_indexes {
        let mut var_name = None;
        for &(idx, line_no) in &loops[&for_idx] {
            let Some(caps) = concat_re().captures(&lines[idx]) else {
                continue;
            };
            let indent = caps[1].to_string();
            var_name = Some(caps[2].to_string());
            let expr = caps[3].trim().to_string();
            lines[idx] = format!("{indent}sb.WriteString({expr})");
            removed.push(format!("string-builder::{line_no}"));
        }
        let Some(var_name) = var_name else {
            continue;
        };

        let for_line = &lines[for_idx];
        let for_indent = for_line[..for_line.len() - for_line.trim_start().len()].to_string();
        lines.insert(for_idx, format!("{for_indent}var sb strings.Builder"));

        // The loop header moved down one; find where its body closes.
        let loop_end = find_balanced_end(&lines, for_idx + 1, Track::Braces, lines.len())
            .unwrap_or(for_idx + 1);
        lines.insert(loop_end + 1, format!("{for_indent}{var_name} = sb.String()"));
    }

    (lines, removed)
}

pub fn fix_string_builder(entries: Vec<FixEntry>, dry_run: bool) -> Vec<FixResult> {
    apply_fixer(entries, transform, dry_run)
}
