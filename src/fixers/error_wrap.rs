//! Wrap bare `return err` with fmt.Errorf context.
//!
//! Covers both the bare return and the single-line
//! `if err != nil { return err }` form; the wrapping context is the
//! enclosing function's name.

use super::{apply_fixer, entries_from_smells, find_enclosing_func, FixEntry, FixResult};
use regex::Regex;
use std::collections::HashSet;
use std::path::Path;
use std::sync::OnceLock;

pub fn detect_bare_errors(root: &Path, exclusions: &[&str]) -> Vec<FixEntry> {
    entries_from_smells(root, exclusions, &["bare_error_return", "empty_error_check"])
}

fn bare_return_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(\s*)return\s+err\s*$").expect("valid regex"))
}

fn single_line_check_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(\s*)if\s+err\s*!=\s*nil\s*\{\s*return\s+err\s*\}").expect("valid regex")
    })
}

fn transform(mut lines: Vec<String>, entries: &[&FixEntry]) -> (Vec<String>, Vec<String>) {
    let entry_lines: HashSet<u32> = entries.iter().map(|e| e.line).collect();
    let mut removed = Vec::new();

    for i in 0..lines.len() {
        let line_num = i as u32 + 1;
        if !entry_lines.contains(&line_num) {
            continue;
        }

        let func_name =
            find_enclosing_func(&lines, i).unwrap_or_else(|| "operation".to_string());

        if let Some(caps) = single_line_check_re().captures(&lines[i]) {
            let indent = caps[1].to_string();
            lines[i] = format!(
                "{indent}if err != nil {{ return fmt.Errorf(\"{func_name}: %w\", err) }}"
            );
            removed.push(format!("error-wrap::{line_num}"));
            continue;
        }

        if let Some(caps) = bare_return_re().captures(&lines[i]) {
            let indent = caps[1].to_string();
            lines[i] = format!("{indent}return fmt.Errorf(\"{func_name}: %w\", err)");
            removed.push(format!("error-wrap::{line_num}"));
        }
    }

    (lines, removed)
}

pub fn fix_error_wrap(entries: Vec<FixEntry>, dry_run: bool) -> Vec<FixResult> {
    apply_fixer(entries, transform, dry_run)
}
