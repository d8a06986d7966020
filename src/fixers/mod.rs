//! Fixer framework
//!
//! A fixer pairs a detect step (reusing the smell catalog, flattened to
//! per-line entries) with a pure line transform. `apply_fixer` owns the
//! file loop: group entries by file, read once, transform, and write back
//! atomically only when content changed. A failing file is reported and
//! skipped; the rest of the batch proceeds.

pub mod error_strings;
pub mod error_wrap;
pub mod mutex_pointer;
pub mod regex_hoist;
pub mod string_builder;

use regex::Regex;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use thiserror::Error;
use tracing::warn;

#[derive(Debug, Error)]
pub enum FixError {
    #[error("reading {file}: {source}")]
    Read {
        file: PathBuf,
        source: std::io::Error,
    },
    #[error("writing {file}: {source}")]
    Write {
        file: PathBuf,
        source: std::io::Error,
    },
}

/// One line flagged by a fixer's detect step
#[derive(Debug, Clone, Serialize)]
pub struct FixEntry {
    pub file: PathBuf,
    /// 1-indexed
    pub line: u32,
    /// Synthetic id, e.g. "error_string::42"
    pub name: String,
    pub content: String,
}

/// Per-file change record
#[derive(Debug, Clone, Serialize)]
pub struct FixResult {
    pub file: PathBuf,
    /// Ids of the issues the transform resolved
    pub removed: Vec<String>,
    /// Net line-count change (positive = lines deleted)
    pub lines_removed: i64,
}

/// Pure transform: `(lines, entries for this file) -> (new lines, removed
/// ids)`. Lines carry no terminators.
pub type TransformFn = fn(Vec<String>, &[&FixEntry]) -> (Vec<String>, Vec<String>);

/// A registered fixer: detect feeds fix, both runnable independently.
pub struct Fixer {
    pub name: &'static str,
    pub label: &'static str,
    /// Smell id the detect step derives from
    pub category: &'static str,
    /// Reporting verbs, e.g. ("wrap", "wrapped")
    pub verb: &'static str,
    pub verb_past: &'static str,
    pub detect: fn(&Path, &[&str]) -> Vec<FixEntry>,
    pub fix: fn(Vec<FixEntry>, bool) -> Vec<FixResult>,
}

/// Group `entries` by file and run `transform` over each. Writes are
/// atomic (temp sibling + rename) and suppressed under `dry_run`; the
/// change report is produced either way.
pub fn apply_fixer(entries: Vec<FixEntry>, transform: TransformFn, dry_run: bool) -> Vec<FixResult> {
    let mut by_file: BTreeMap<PathBuf, Vec<FixEntry>> = BTreeMap::new();
    for entry in entries {
        by_file.entry(entry.file.clone()).or_default().push(entry);
    }

    let mut results = Vec::new();
    for (file, file_entries) in by_file {
        match fix_one_file(&file, &file_entries, transform, dry_run) {
            Ok(Some(result)) => results.push(result),
            Ok(None) => {}
            Err(err) => warn!(%err, "skipping file"),
        }
    }
    results
}

fn fix_one_file(
    file: &Path,
    entries: &[FixEntry],
    transform: TransformFn,
    dry_run: bool,
) -> Result<Option<FixResult>, FixError> {
    let original = std::fs::read_to_string(file).map_err(|source| FixError::Read {
        file: file.to_path_buf(),
        source,
    })?;
    let had_trailing_newline = original.ends_with('\n');
    let lines: Vec<String> = original.lines().map(str::to_string).collect();
    let original_count = lines.len() as i64;

    let entry_refs: Vec<&FixEntry> = entries.iter().collect();
    let (new_lines, removed) = transform(lines, &entry_refs);

    let mut new_content = new_lines.join("\n");
    if had_trailing_newline && !new_content.is_empty() {
        new_content.push('\n');
    }
    if new_content == original {
        return Ok(None);
    }

    let result = FixResult {
        file: file.to_path_buf(),
        removed,
        lines_removed: original_count - new_lines.len() as i64,
    };

    if !dry_run {
        write_atomic(file, &new_content)?;
    }
    Ok(Some(result))
}

/// Temp-sibling write then rename; the temp file is removed on any failure
/// so the original is never left partially written.
fn write_atomic(file: &Path, content: &str) -> Result<(), FixError> {
    let mut tmp = file.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    let write_err = |source| FixError::Write {
        file: file.to_path_buf(),
        source,
    };
    if let Err(source) = std::fs::write(&tmp, content) {
        let _ = std::fs::remove_file(&tmp);
        return Err(write_err(source));
    }
    if let Err(source) = std::fs::rename(&tmp, file) {
        let _ = std::fs::remove_file(&tmp);
        return Err(write_err(source));
    }
    Ok(())
}

/// Filter out removed indices and collapse runs of blank lines to one.
pub fn collapse_blank_lines(lines: Vec<String>, removed: &std::collections::HashSet<usize>) -> Vec<String> {
    let mut result = Vec::with_capacity(lines.len());
    let mut prev_blank = false;
    for (idx, line) in lines.into_iter().enumerate() {
        if removed.contains(&idx) {
            continue;
        }
        let is_blank = line.trim().is_empty();
        if is_blank && prev_blank {
            continue;
        }
        result.push(line);
        prev_blank = is_blank;
    }
    result
}

fn func_header_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^func\s+(?:\([^)]*\)\s+)?(\w+)\s*\(").expect("valid regex"))
}

/// Backward scan for the nearest enclosing function name. Receiver-aware:
/// `func (r *T) Method(` yields "Method".
pub fn find_enclosing_func(lines: &[String], line_idx: usize) -> Option<String> {
    for i in (0..=line_idx.min(lines.len().saturating_sub(1))).rev() {
        if let Some(caps) = func_header_re().captures(&lines[i]) {
            return Some(caps[1].to_string());
        }
    }
    None
}

fn for_header_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\s*for\s+").expect("valid regex"))
}

/// Backward scan for the enclosing for/range loop's header line. Brace
/// tracking keeps the scan from escaping into an outer function: the loop
/// header is the line whose opening brace takes the running depth to -1.
pub fn find_enclosing_for(lines: &[String], line_idx: usize) -> Option<usize> {
    let mut brace_depth = 0i32;
    for i in (0..=line_idx.min(lines.len().saturating_sub(1))).rev() {
        for ch in lines[i].chars().rev() {
            match ch {
                '}' => brace_depth += 1,
                '{' => brace_depth -= 1,
                _ => {}
            }
        }
        if for_header_re().is_match(&lines[i]) && brace_depth == -1 {
            return Some(i);
        }
        if brace_depth < 0 {
            return None;
        }
    }
    None
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Track {
    Parens,
    Braces,
}

/// Find the line where brackets opened at `start` balance back to zero.
/// String-aware; gives up after `max_lines`.
pub fn find_balanced_end(lines: &[String], start: usize, track: Track, max_lines: usize) -> Option<usize> {
    let mut paren_depth = 0i32;
    let mut brace_depth = 0i32;

    for (idx, line) in lines.iter().enumerate().skip(start).take(max_lines) {
        let mut in_str: Option<char> = None;
        let mut prev = '\0';
        for ch in line.chars() {
            if let Some(quote) = in_str {
                if ch == quote && prev != '\\' {
                    in_str = None;
                }
                prev = ch;
                continue;
            }
            match ch {
                '\'' | '"' | '`' => in_str = Some(ch),
                '(' => paren_depth += 1,
                ')' => {
                    paren_depth -= 1;
                    if track == Track::Parens && paren_depth <= 0 {
                        return Some(idx);
                    }
                }
                '{' => brace_depth += 1,
                '}' => {
                    brace_depth -= 1;
                    if track == Track::Braces && brace_depth <= 0 {
                        return Some(idx);
                    }
                }
                _ => {}
            }
            prev = ch;
        }
    }
    None
}

/// Flatten smell matches for the given check ids into fix entries.
pub fn entries_from_smells(
    root: &Path,
    exclusions: &[&str],
    smell_ids: &[&str],
) -> Vec<FixEntry> {
    let (entries, _) = crate::lang::go::smells::detect_smells(root, exclusions);
    let mut flat = Vec::new();
    for entry in entries {
        if !smell_ids.contains(&entry.id.as_str()) {
            continue;
        }
        for m in &entry.matches {
            flat.push(FixEntry {
                file: m.file.clone(),
                line: m.line,
                name: format!("{}::{}", entry.id, m.line),
                content: m.content.clone(),
            });
        }
    }
    flat
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::fs;

    fn lines(src: &[&str]) -> Vec<String> {
        src.iter().map(|s| s.to_string()).collect()
    }

    fn upcase_first_entry_line(
        mut lines: Vec<String>,
        entries: &[&FixEntry],
    ) -> (Vec<String>, Vec<String>) {
        let mut removed = Vec::new();
        for e in entries {
            let idx = e.line as usize - 1;
            if idx < lines.len() {
                lines[idx] = lines[idx].to_uppercase();
                removed.push(e.name.clone());
            }
        }
        (lines, removed)
    }

    fn entry(file: &Path, line: u32) -> FixEntry {
        FixEntry {
            file: file.to_path_buf(),
            line,
            name: format!("test::{line}"),
            content: String::new(),
        }
    }

    #[test]
    fn test_apply_writes_changed_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("a.go");
        fs::write(&file, "alpha\nbeta\n").unwrap();

        let results = apply_fixer(vec![entry(&file, 2)], upcase_first_entry_line, false);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].removed, vec!["test::2"]);
        assert_eq!(fs::read_to_string(&file).unwrap(), "alpha\nBETA\n");
    }

    #[test]
    fn test_dry_run_reports_without_writing() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("a.go");
        fs::write(&file, "alpha\n").unwrap();

        let results = apply_fixer(vec![entry(&file, 1)], upcase_first_entry_line, true);
        assert_eq!(results.len(), 1);
        assert_eq!(fs::read_to_string(&file).unwrap(), "alpha\n");
        assert!(!dir.path().join("a.go.tmp").exists());
    }

    #[test]
    fn test_unchanged_file_not_reported() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("a.go");
        fs::write(&file, "ALPHA\n").unwrap();

        let results = apply_fixer(vec![entry(&file, 1)], upcase_first_entry_line, false);
        assert!(results.is_empty());
    }

    #[test]
    fn test_missing_file_skipped_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let present = dir.path().join("a.go");
        fs::write(&present, "alpha\n").unwrap();
        let missing = dir.path().join("gone.go");

        let results = apply_fixer(
            vec![entry(&missing, 1), entry(&present, 1)],
            upcase_first_entry_line,
            false,
        );
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].file, present);
    }

    #[test]
    fn test_collapse_blank_lines() {
        let input = lines(&["a", "", "", "b", ""]);
        let out = collapse_blank_lines(input, &HashSet::new());
        assert_eq!(out, lines(&["a", "", "b", ""]));

        let input = lines(&["a", "x", "b"]);
        let removed: HashSet<usize> = [1].into();
        assert_eq!(collapse_blank_lines(input, &removed), lines(&["a", "b"]));
    }

    #[test]
    fn test_find_enclosing_func_handles_methods() {
        let src = lines(&[
            "func (s *Server) Start() error {",
            "\tif err != nil {",
            "\t\treturn err",
            "\t}",
            "}",
        ]);
        assert_eq!(find_enclosing_func(&src, 2).as_deref(), Some("Start"));
    }

    #[test]
    fn test_find_enclosing_for_stops_at_function_boundary() {
        let src = lines(&[
            "func f() {",
            "\tfor i := range items {",
            "\t\tdoWork(i)",
            "\t}",
            "\tafterLoop()",
            "}",
        ]);
        assert_eq!(find_enclosing_for(&src, 2), Some(1));
        // afterLoop is outside the loop
        assert_eq!(find_enclosing_for(&src, 4), None);
    }

    #[test]
    fn test_find_balanced_end_braces() {
        let src = lines(&["for x {", "\tinner()", "}"]);
        assert_eq!(find_balanced_end(&src, 0, Track::Braces, 80), Some(2));
    }
}
