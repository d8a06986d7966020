//! Convert by-value sync.Mutex parameters to pointers.
//!
//! Parameters already declared `*sync.Mutex` are left alone.

use super::{apply_fixer, entries_from_smells, FixEntry, FixResult};
use regex::Regex;
use std::collections::HashSet;
use std::path::Path;
use std::sync::OnceLock;

pub fn detect_mutex_copy(root: &Path, exclusions: &[&str]) -> Vec<FixEntry> {
    entries_from_smells(root, exclusions, &["mutex_copy"])
}

fn mutex_value_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(\w+)\s+sync\.Mutex\b").expect("valid regex"))
}

fn transform(mut lines: Vec<String>, entries: &[&FixEntry]) -> (Vec<String>, Vec<String>) {
    let entry_lines: HashSet<u32> = entries.iter().map(|e| e.line).collect();
    let mut removed = Vec::new();

    for i in 0..lines.len() {
        let line_num = i as u32 + 1;
        if !entry_lines.contains(&line_num) {
            continue;
        }
        if lines[i].contains("*sync.Mutex") {
            continue;
        }

        let new_line = mutex_value_re()
            .replace_all(&lines[i], "$1 *sync.Mutex")
            .into_owned();
        if new_line != lines[i] {
            lines[i] = new_line;
            removed.push(format!("mutex-pointer::{line_num}"));
        }
    }

    (lines, removed)
}

pub fn fix_mutex_pointer(entries: Vec<FixEntry>, dry_run: bool) -> Vec<FixResult> {
    apply_fixer(entries, transform, dry_run)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn run_fix(src: &str, entry_lines: &[u32]) -> String {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("lib.go");
        fs::write(&file, src).unwrap();
        let entries = entry_lines
            .iter()
            .map(|&line| FixEntry {
                file: file.clone(),
                line,
                name: format!("mutex_copy::{line}"),
                content: String::new(),
            })
            .collect();
        fix_mutex_pointer(entries, false);
        fs::read_to_string(&file).unwrap()
    }

    #[test]
    fn test_value_param_becomes_pointer() {
        let src = "package lib\n\nfunc withLock(mu sync.Mutex, f func()) {\n\tmu.Lock()\n}\n";
        let fixed = run_fix(src, &[3]);
        assert!(fixed.contains("func withLock(mu *sync.Mutex, f func())"));
    }

    #[test]
    fn test_pointer_param_untouched() {
        let src = "package lib\n\nfunc withLock(mu *sync.Mutex) {\n\tmu.Lock()\n}\n";
        let fixed = run_fix(src, &[3]);
        assert_eq!(fixed, src);
    }

    #[test]
    fn test_idempotent() {
        let src = "package lib\n\nfunc f(mu sync.Mutex) {}\n";
        let once = run_fix(src, &[3]);
        let twice = run_fix(&once, &[3]);
        assert_eq!(once, twice);
        assert!(once.contains("mu *sync.Mutex"));
    }
}
