//! Python smell checks, line-based.
//!
//! A reduced catalog compared to Go: no string-literal suppression beyond
//! skipping comment lines, since the checks here rarely appear in strings.

use crate::detectors::smells::{sort_entries, Severity, SmellEntry, SmellMatch};
use crate::discovery::find_source_files;
use regex::Regex;
use std::path::Path;
use std::sync::OnceLock;
use tracing::debug;

struct Check {
    id: &'static str,
    label: &'static str,
    severity: Severity,
    pattern: Regex,
}

fn checks() -> &'static [Check] {
    static CHECKS: OnceLock<Vec<Check>> = OnceLock::new();
    CHECKS.get_or_init(|| {
        let check = |id, label, severity, pattern: &str| Check {
            id,
            label,
            severity,
            pattern: Regex::new(pattern).expect("valid regex"),
        };
        vec![
            check(
                "bare_except",
                "bare except clause",
                Severity::High,
                r"^\s*except\s*:",
            ),
            check(
                "eval_usage",
                "eval/exec on dynamic input",
                Severity::High,
                r"\b(?:eval|exec)\s*\(",
            ),
            check(
                "mutable_default_arg",
                "mutable default argument",
                Severity::Medium,
                r"def\s+\w+\s*\([^)]*=\s*(?:\[\]|\{\}|\(\))",
            ),
            check(
                "wildcard_import",
                "wildcard import",
                Severity::Medium,
                r"^\s*from\s+[\w.]+\s+import\s+\*",
            ),
            check(
                "print_debug",
                "print call in library code",
                Severity::Low,
                r"^\s*print\s*\(",
            ),
            check(
                "todo_fixme",
                "TODO/FIXME comment",
                Severity::Low,
                r"#\s*(?:TODO|FIXME|XXX)\b",
            ),
        ]
    })
}

/// Scan all .py files under `path`. Returns sorted entries and the number
/// of files checked.
pub fn detect_smells(path: &Path, exclusions: &[&str]) -> (Vec<SmellEntry>, usize) {
    let files = find_source_files(path, &[".py"], exclusions);

    let mut matches_by_check: Vec<Vec<SmellMatch>> = checks().iter().map(|_| Vec::new()).collect();
    for file in &files {
        let content = match std::fs::read_to_string(file) {
            Ok(c) => c,
            Err(err) => {
                debug!(file = %file.display(), %err, "skipping unreadable file");
                continue;
            }
        };
        for (line_idx, line) in content.lines().enumerate() {
            let is_comment = line.trim_start().starts_with('#');
            for (check_idx, check) in checks().iter().enumerate() {
                // comment-only checks still apply to comments
                if is_comment && check.id != "todo_fixme" {
                    continue;
                }
                if check.pattern.is_match(line) {
                    matches_by_check[check_idx].push(SmellMatch::new(
                        file.clone(),
                        line_idx as u32 + 1,
                        line,
                    ));
                }
            }
        }
    }

    let mut entries: Vec<SmellEntry> = checks()
        .iter()
        .zip(matches_by_check)
        .filter(|(_, matches)| !matches.is_empty())
        .map(|(check, matches)| SmellEntry::new(check.id, check.label, check.severity, matches))
        .collect();
    sort_entries(&mut entries);
    (entries, files.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::discovery::clear_cache;
    use std::fs;

    fn scan(source: &str) -> Vec<SmellEntry> {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("app.py"), source).unwrap();
        clear_cache();
        detect_smells(dir.path(), &[]).0
    }

    #[test]
    fn test_bare_except_flagged() {
        let entries = scan("try:\n    work()\nexcept:\n    pass\n");
        assert!(entries.iter().any(|e| e.id == "bare_except"));
    }

    #[test]
    fn test_typed_except_not_flagged() {
        let entries = scan("try:\n    work()\nexcept ValueError:\n    pass\n");
        assert!(!entries.iter().any(|e| e.id == "bare_except"));
    }

    #[test]
    fn test_mutable_default_and_wildcard_import() {
        let entries = scan("from os.path import *\n\ndef add(item, bucket=[]):\n    pass\n");
        assert!(entries.iter().any(|e| e.id == "wildcard_import"));
        assert!(entries.iter().any(|e| e.id == "mutable_default_arg"));
    }

    #[test]
    fn test_comment_lines_only_match_todo() {
        let entries = scan("# print(debug)\n# TODO: remove shim\n");
        assert!(!entries.iter().any(|e| e.id == "print_debug"));
        assert!(entries.iter().any(|e| e.id == "todo_fixme"));
    }
}
