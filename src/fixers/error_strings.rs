//! Normalize error-message strings: lowercase the first letter and strip a
//! trailing period. Only lines the smell detector flagged are touched.

use super::{apply_fixer, entries_from_smells, FixEntry, FixResult};
use regex::Regex;
use std::collections::HashSet;
use std::path::Path;
use std::sync::OnceLock;

pub fn detect_error_strings(root: &Path, exclusions: &[&str]) -> Vec<FixEntry> {
    entries_from_smells(root, exclusions, &["error_string_format"])
}

fn error_string_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"((?:errors\.New|fmt\.Errorf)\s*\(\s*")([A-Z])((?:[^"\\]|\\.)*")"#)
            .expect("valid regex")
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

        let Some(caps) = error_string_re().captures(&lines[i]) else {
            continue;
        };
        let whole = caps.get(0).expect("group 0");
        let prefix = &caps[1];
        let first = caps[2].to_lowercase();
        let mut rest = caps[3].to_string();
        if rest.ends_with(".\"") {
            rest.truncate(rest.len() - 2);
            rest.push('"');
        }

        let mut new_line = String::with_capacity(lines[i].len());
        new_line.push_str(&lines[i][..whole.start()]);
        new_line.push_str(prefix);
        new_line.push_str(&first);
        new_line.push_str(&rest);
        new_line.push_str(&lines[i][whole.end()..]);
        lines[i] = new_line;
        removed.push(format!("error-string::{line_num}"));
    }

    (lines, removed)
}

pub fn fix_error_strings(entries: Vec<FixEntry>, dry_run: bool) -> Vec<FixResult> {
    apply_fixer(entries, transform, dry_run)
}
