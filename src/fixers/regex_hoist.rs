//! Hoist regexp.Compile/MustCompile out of for loops.
//!
//! The compilation moves to just above the enclosing loop, at the loop's
//! indentation, as a fresh `:=` binding.

use super::{apply_fixer, entries_from_smells, find_enclosing_for, FixEntry, FixResult};
use regex::Regex;
use std::path::Path;
use std::sync::OnceLock;

pub fn detect_regex_in_loop(root: &Path, exclusions: &[&str]) -> Vec<FixEntry> {
    entries_from_smells(root, exclusions, &["regex_in_loop"])
}

fn regex_assign_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(\s*)(\w+)\s*:?=\s*(regexp\.(?:MustCompile|Compile)\s*\(.*\))\s*$")
            .expect("valid regex")
    })
}

fn transform(mut lines: Vec<String>, entries: &[&FixEntry]) -> (Vec<String>, Vec<String>) {
    let mut removed = Vec::new();

    // Highest line first so insertions never shift pending entries.
    let mut sorted: Vec<&&FixEntry> = entries.iter().collect();
    sorted.sort_by(|a, b| b.line.cmp(&a.line));

    for entry in sorted {
        let idx = entry.line as usize - 1;
        if idx >= lines.len() {
            continue;
        }

        let Some(caps) = regex_assign_re().captures(&lines[idx]) else {
            continue;
        };
        let var_name = caps[2].to_string();
        let regex_call = caps[3].to_string();

        let Some(for_idx) = find_enclosing_for(&lines, idx) else {
            continue;
        };
        let for_line = &lines[for_idx];
        let for_indent = &for_line[..for_line.len() - for_line.trim_start().len()];
        let hoisted = format!("{for_indent}{var_name} := {regex_call}");

        lines.remove(idx);
        lines.insert(for_idx, hoisted);
        removed.push(format!("regex-hoist::{}", entry.line));
    }

    (lines, removed)
}

pub fn fix_regex_hoist(entries: Vec<FixEntry>, dry_run: bool) -> Vec<FixResult> {
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
                name: format!("regex_in_loop::{line}"),
                content: String::new(),
            })
            .collect();
        fix_regex_hoist(entries, false);
        fs::read_to_string(&file).unwrap()
    }

    #[test]
    fn test_hoists_above_loop_preserving_indentation() {
        let src = concat!(
            "package lib\n\n",
            "func f(items []string) {\n",
            "\tfor _, item := range items {\n",
            "\t\tre := regexp.MustCompile(`\\d+`)\n",
            "\t\tuse(re, item)\n",
            "\t}\n",
            "}\n",
        );
        let fixed = run_fix(src, &[5]);
        let lines: Vec<&str> = fixed.lines().collect();
        // compilation now sits above the loop at the loop's indent
        assert_eq!(lines[3], "\tre := regexp.MustCompile(`\\d+`)");
        assert_eq!(lines[4], "\tfor _, item := range items {");
        assert!(!lines[5].contains("MustCompile"));
    }

    #[test]
    fn test_compile_outside_loop_untouched() {
        let src = concat!(
            "package lib\n\n",
            "func f() {\n",
            "\tre := regexp.MustCompile(`x`)\n",
            "\tuse(re)\n",
            "}\n",
        );
        let fixed = run_fix(src, &[4]);
        assert_eq!(fixed, src);
    }

    #[test]
    fn test_two_hoists_in_one_file() {
        let src = concat!(
            "package lib\n\n",
            "func f(items []string) {\n",
            "\tfor _, a := range items {\n",
            "\t\tx := regexp.MustCompile(`a`)\n",
            "\t\tuse(x, a)\n",
            "\t}\n",
            "\tfor _, b := range items {\n",
            "\t\ty := regexp.MustCompile(`b`)\n",
            "\t\tuse(y, b)\n",
            "\t}\n",
            "}\n",
        );
        let fixed = run_fix(src, &[5, 9]);
        let lines: Vec<&str> = fixed.lines().collect();
        assert_eq!(lines[3], "\tx := regexp.MustCompile(`a`)");
        assert_eq!(lines[7], "\ty := regexp.MustCompile(`b`)");
    }
}
