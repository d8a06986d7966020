//! Go code-smell catalog
//!
//! Single-line checks are regex-per-line with string/comment suppression;
//! the empty-error-check and loop-body checks are multi-line and track
//! braces. Raw string literals (backticks) can span lines, so a per-file
//! pass first marks every line inside one and the scanners skip those.

use crate::detectors::smells::{sort_entries, Severity, SmellEntry, SmellMatch};
use crate::discovery::find_source_files;
use regex::Regex;
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::OnceLock;
use tracing::debug;

pub struct SmellCheck {
    pub id: &'static str,
    pub label: &'static str,
    pub severity: Severity,
    pub pattern: Option<Regex>,
}

fn check(id: &'static str, label: &'static str, severity: Severity, pattern: &str) -> SmellCheck {
    SmellCheck {
        id,
        label,
        severity,
        pattern: Some(Regex::new(pattern).expect("valid smell regex")),
    }
}

fn multiline(id: &'static str, label: &'static str, severity: Severity) -> SmellCheck {
    SmellCheck {
        id,
        label,
        severity,
        pattern: None,
    }
}

pub fn smell_checks() -> &'static [SmellCheck] {
    static CHECKS: OnceLock<Vec<SmellCheck>> = OnceLock::new();
    CHECKS.get_or_init(|| {
        use Severity::{High, Low, Medium};
        vec![
            // Error handling
            check(
                "bare_error_return",
                "Bare error return without wrapping context",
                Medium,
                r"^\s*return\s+err\s*$",
            ),
            check(
                "ignored_error",
                "Error assigned to _ (ignored)",
                High,
                r"_\s*(?:,\s*_\s*)?=\s*\w+.*\(",
            ),
            check(
                "panic_in_lib",
                "panic() outside main/test files",
                High,
                r"\bpanic\s*\(",
            ),
            multiline(
                "empty_error_check",
                "if err != nil { return err } without context",
                Medium,
            ),
            check(
                "error_string_format",
                "Error string starts with capital letter or ends with punctuation",
                Low,
                r#"(?:errors\.New|fmt\.Errorf)\s*\(\s*"[A-Z]"#,
            ),
            check(
                "nil_error_init",
                "var err error without immediate use",
                Low,
                r"^\s*var\s+err\s+error\s*$",
            ),
            // Code quality
            check(
                "init_function",
                "func init() usage",
                Medium,
                r"^func\s+init\s*\(\s*\)\s*\{",
            ),
            check(
                "global_mutable",
                "Package-level var with mutable type (slice/map)",
                Medium,
                r"^var\s+\w+\s*=?\s*(?:map\[|(?:\[\]))",
            ),
            check(
                "magic_number",
                "Magic numbers (>1000 in logic)",
                Low,
                r"(?:==|!=|>=?|<=?|[+\-*/])\s*\d{4,}",
            ),
            check(
                "todo_fixme",
                "TODO/FIXME/HACK/XXX comments",
                Low,
                r"//\s*(?:TODO|FIXME|HACK|XXX)",
            ),
            check(
                "hardcoded_url",
                "Hardcoded URL in source code",
                Medium,
                r#"["']https?://[^\s"']+["']"#,
            ),
            check(
                "empty_interface",
                "interface{} or any as parameter type",
                Low,
                r"func\s+\w+\([^)]*\b(?:interface\{\}|\bany\b)",
            ),
            // Performance
            multiline(
                "string_concat_loop",
                "String concatenation with += inside a for loop",
                Medium,
            ),
            multiline("defer_in_loop", "defer inside a for/range loop", High),
            multiline(
                "regex_in_loop",
                "regexp.Compile/MustCompile inside a for loop",
                Medium,
            ),
            // Goroutines
            check(
                "goroutine_leak",
                "go func() without WaitGroup or channel signal",
                Medium,
                r"go\s+func\s*\(",
            ),
            check(
                "mutex_copy",
                "Passing sync.Mutex by value",
                High,
                r"func\s+\w+\([^)]*\bsync\.Mutex\b",
            ),
            check(
                "unbuffered_channel",
                "make(chan ...) without buffer size",
                Low,
                r"make\(\s*chan\s+\w+\s*\)",
            ),
        ]
    })
}

/// Mark every 0-indexed line that sits inside a multi-line raw string
/// literal. Interpreted strings cannot span lines and are skipped over so a
/// backtick inside one never opens a raw string.
pub fn build_string_line_set(lines: &[&str]) -> HashSet<usize> {
    let mut in_raw = false;
    let mut string_lines = HashSet::new();

    for (i, line) in lines.iter().enumerate() {
        let bytes = line.as_bytes();
        if in_raw {
            string_lines.insert(i);
            if bytes.contains(&b'`') {
                in_raw = false;
            }
            continue;
        }

        let mut pos = 0;
        while pos < bytes.len() {
            match bytes[pos] {
                b'"' => {
                    pos += 1;
                    while pos < bytes.len() {
                        match bytes[pos] {
                            b'\\' => pos += 2,
                            b'"' => {
                                pos += 1;
                                break;
                            }
                            _ => pos += 1,
                        }
                    }
                }
                b'/' if pos + 1 < bytes.len() && bytes[pos + 1] == b'/' => break,
                b'`' => match line[pos + 1..].find('`') {
                    Some(close) => pos += close + 2,
                    None => {
                        in_raw = true;
                        break;
                    }
                },
                _ => pos += 1,
            }
        }
    }

    string_lines
}

/// Whether a byte offset within one line falls inside a string literal or a
/// line comment.
pub fn match_is_in_string(line: &str, match_start: usize) -> bool {
    let bytes = line.as_bytes();
    let mut in_string: Option<u8> = None;
    let mut i = 0;

    while i < bytes.len() {
        if i == match_start {
            return in_string.is_some();
        }
        let ch = bytes[i];
        match in_string {
            None => {
                if ch == b'/' && i + 1 < bytes.len() && bytes[i + 1] == b'/' {
                    return match_start > i;
                }
                if ch == b'"' || ch == b'`' {
                    in_string = Some(ch);
                }
                i += 1;
            }
            Some(b'"') => {
                if ch == b'\\' {
                    i += 2;
                    continue;
                }
                if ch == b'"' {
                    in_string = None;
                }
                i += 1;
            }
            Some(_) => {
                if ch == b'`' {
                    in_string = None;
                }
                i += 1;
            }
        }
    }

    in_string.is_some()
}

fn single_line_err_check_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"if\s+err\s*!=\s*nil\s*\{\s*return\s+err\s*\}").expect("valid regex")
    })
}

fn multi_line_err_open_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^if\s+err\s*!=\s*nil\s*\{").expect("valid regex"))
}

fn bare_return_err_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\s*return\s+err\s*$").expect("valid regex"))
}

/// `if err != nil { return err }` with no added context, in both its
/// single-line form and the three-line block form (blank lines allowed
/// between the parts).
fn detect_empty_error_check(
    file: &Path,
    lines: &[&str],
    matches: &mut HashMap<&'static str, Vec<SmellMatch>>,
) {
    for (i, line) in lines.iter().enumerate() {
        let stripped = line.trim();

        if single_line_err_check_re().is_match(stripped) {
            matches
                .entry("empty_error_check")
                .or_default()
                .push(SmellMatch::new(file, i as u32 + 1, stripped));
            continue;
        }

        if multi_line_err_open_re().is_match(stripped) {
            let mut j = i + 1;
            while j < lines.len() && lines[j].trim().is_empty() {
                j += 1;
            }
            if j < lines.len() && bare_return_err_re().is_match(lines[j]) {
                let mut k = j + 1;
                while k < lines.len() && lines[k].trim().is_empty() {
                    k += 1;
                }
                if k < lines.len() && lines[k].trim() == "}" {
                    matches
                        .entry("empty_error_check")
                        .or_default()
                        .push(SmellMatch::new(file, i as u32 + 1, stripped));
                }
            }
        }
    }
}

fn for_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\s*for\s+").expect("valid regex"))
}

fn defer_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\s*defer\s+").expect("valid regex"))
}

fn concat_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\w+\s*\+=\s*").expect("valid regex"))
}

fn regexp_compile_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"regexp\.(?:Compile|MustCompile)\s*\(").expect("valid regex"))
}

/// Loop-body smells: defer, string `+=`, regexp compilation. Brace tracking
/// bounds each for-loop body; lines inside raw strings are skipped.
fn detect_loop_smells(
    file: &Path,
    lines: &[&str],
    string_lines: &HashSet<usize>,
    matches: &mut HashMap<&'static str, Vec<SmellMatch>>,
) {
    let mut i = 0;
    while i < lines.len() {
        if string_lines.contains(&i) || !for_re().is_match(lines[i]) {
            i += 1;
            continue;
        }

        let loop_start = i;
        let mut brace_depth = 0i32;
        let mut found_open = false;
        let mut j = i;
        while j < lines.len() {
            if string_lines.contains(&j) {
                j += 1;
                continue;
            }
            for ch in lines[j].chars() {
                match ch {
                    '{' => {
                        brace_depth += 1;
                        found_open = true;
                    }
                    '}' => brace_depth -= 1,
                    _ => {}
                }
            }
            if found_open && brace_depth <= 0 {
                break;
            }
            j += 1;
        }
        let loop_end = j;

        for k in (loop_start + 1)..lines.len().min(loop_end + 1) {
            if string_lines.contains(&k) {
                continue;
            }
            let body = lines[k].trim();
            if defer_re().is_match(body) {
                matches
                    .entry("defer_in_loop")
                    .or_default()
                    .push(SmellMatch::new(file, k as u32 + 1, body));
            }
            if concat_re().is_match(body) {
                matches
                    .entry("string_concat_loop")
                    .or_default()
                    .push(SmellMatch::new(file, k as u32 + 1, body));
            }
            if regexp_compile_re().is_match(body) {
                matches
                    .entry("regex_in_loop")
                    .or_default()
                    .push(SmellMatch::new(file, k as u32 + 1, body));
            }
        }

        i = loop_end + 1;
    }
}

/// The ignored-result check must not fire on declarations or comments.
/// `_ :=` never matches the pattern itself (the `=` must follow the blank
/// directly, not a `:`). `for`-prefixed lines are skipped wholesale; that
/// also suppresses discards in loop headers, a known accepted imprecision.
fn ignored_error_guard(stripped: &str) -> bool {
    stripped.starts_with("import")
        || stripped.starts_with("var")
        || stripped.starts_with("//")
        || stripped.starts_with("for")
}

/// Run every smell check over the Go files under `path`.
///
/// Returns entries sorted by severity then descending count, plus the number
/// of files checked (the scoring denominator).
pub fn detect_smells(path: &Path, exclusions: &[&str]) -> (Vec<SmellEntry>, usize) {
    let files = find_source_files(path, &[".go"], exclusions);
    let mut matches: HashMap<&'static str, Vec<SmellMatch>> = HashMap::new();

    for file in &files {
        let content = match std::fs::read_to_string(file) {
            Ok(c) => c,
            Err(err) => {
                debug!(file = %file.display(), %err, "skipping unreadable file");
                continue;
            }
        };
        let lines: Vec<&str> = content.lines().collect();
        let string_lines = build_string_line_set(&lines);

        let is_main = content.contains("package main");
        let file_str = file.to_string_lossy();
        let is_test = file_str.ends_with("_test.go");
        let basename = file.file_name().map(|n| n.to_string_lossy().to_string());

        for check in smell_checks() {
            let Some(pattern) = &check.pattern else {
                continue;
            };

            if check.id == "panic_in_lib"
                && (basename.as_deref() == Some("main.go") || is_main || is_test)
            {
                continue;
            }

            for (i, line) in lines.iter().enumerate() {
                if string_lines.contains(&i) {
                    continue;
                }
                let Some(m) = pattern.find(line) else {
                    continue;
                };
                if match_is_in_string(line, m.start()) {
                    continue;
                }
                if check.id == "ignored_error" && ignored_error_guard(line.trim()) {
                    continue;
                }
                matches
                    .entry(check.id)
                    .or_default()
                    .push(SmellMatch::new(file, i as u32 + 1, line));
            }
        }

        detect_empty_error_check(file, &lines, &mut matches);
        detect_loop_smells(file, &lines, &string_lines, &mut matches);
    }

    let mut entries: Vec<SmellEntry> = smell_checks()
        .iter()
        .filter_map(|check| {
            let found = matches.remove(check.id)?;
            Some(SmellEntry::new(check.id, check.label, check.severity, found))
        })
        .collect();
    sort_entries(&mut entries);

    (entries, files.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::discovery::clear_cache;
    use std::fs;

    fn scan(sources: &[(&str, &str)]) -> Vec<SmellEntry> {
        let dir = tempfile::tempdir().unwrap();
        for (name, content) in sources {
            let path = dir.path().join(name);
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent).unwrap();
            }
            fs::write(path, content).unwrap();
        }
        clear_cache();
        let (entries, _) = detect_smells(dir.path(), &[]);
        entries
    }

    fn ids(entries: &[SmellEntry]) -> Vec<String> {
        entries.iter().map(|e| e.id.clone()).collect()
    }

    #[test]
    fn test_bare_error_return() {
        let entries = scan(&[(
            "lib.go",
            "package lib\n\nfunc f() error {\n\tif bad {\n\t\treturn err\n\t}\n\treturn nil\n}\n",
        )]);
        assert!(ids(&entries).contains(&"bare_error_return".to_string()));
    }

    #[test]
    fn test_ignored_error_discard_flagged() {
        let entries = scan(&[(
            "lib.go",
            "package lib\n\nfunc f() {\n\t_ = doSomething()\n}\n",
        )]);
        assert!(ids(&entries).contains(&"ignored_error".to_string()));
    }

    #[test]
    fn test_short_declaration_and_range_not_flagged() {
        let entries = scan(&[(
            "lib.go",
            "package lib\n\nfunc f() {\n\tx := doSomething()\n\tfor _ = range getItems() {\n\t}\n\t_ = x\n}\n",
        )]);
        let ignored = entries.iter().find(|e| e.id == "ignored_error");
        // only the plain `_ = x` line has no paren, so nothing fires
        assert!(ignored.is_none());
    }

    #[test]
    fn test_panic_suppressed_in_main_and_tests() {
        let entries = scan(&[
            ("main.go", "package main\n\nfunc main() {\n\tpanic(\"boom\")\n}\n"),
            ("lib_test.go", "package lib\n\nfunc TestX(t *testing.T) {\n\tpanic(\"boom\")\n}\n"),
        ]);
        assert!(!ids(&entries).contains(&"panic_in_lib".to_string()));
    }

    #[test]
    fn test_panic_flagged_in_library_code() {
        let entries = scan(&[(
            "lib.go",
            "package lib\n\nfunc f() {\n\tpanic(\"boom\")\n}\n",
        )]);
        assert!(ids(&entries).contains(&"panic_in_lib".to_string()));
    }

    #[test]
    fn test_empty_error_check_both_forms() {
        let entries = scan(&[(
            "lib.go",
            concat!(
                "package lib\n\n",
                "func a() error {\n\tif err != nil { return err }\n\treturn nil\n}\n\n",
                "func b() error {\n\tif err != nil {\n\t\treturn err\n\t}\n\treturn nil\n}\n",
            ),
        )]);
        let entry = entries.iter().find(|e| e.id == "empty_error_check").unwrap();
        assert_eq!(entry.count, 2);
    }

    #[test]
    fn test_wrapped_error_check_not_flagged() {
        let entries = scan(&[(
            "lib.go",
            "package lib\n\nfunc a() error {\n\tif err != nil {\n\t\treturn fmt.Errorf(\"reading config: %w\", err)\n\t}\n\treturn nil\n}\n",
        )]);
        assert!(!ids(&entries).contains(&"empty_error_check".to_string()));
    }

    #[test]
    fn test_loop_smells() {
        let entries = scan(&[(
            "lib.go",
            concat!(
                "package lib\n\nfunc f(items []string) string {\n",
                "\tout := \"\"\n",
                "\tfor _, item := range items {\n",
                "\t\tdefer cleanup(item)\n",
                "\t\tout += item\n",
                "\t\tre := regexp.MustCompile(`x+`)\n",
                "\t\t_ = re\n",
                "\t}\n\treturn out\n}\n",
            ),
        )]);
        let found = ids(&entries);
        assert!(found.contains(&"defer_in_loop".to_string()));
        assert!(found.contains(&"string_concat_loop".to_string()));
        assert!(found.contains(&"regex_in_loop".to_string()));
    }

    #[test]
    fn test_matches_inside_strings_suppressed() {
        let entries = scan(&[(
            "lib.go",
            "package lib\n\nvar doc = `\nfor x { defer f() }\npanic(\"nope\")\n`\n\nfunc f() {\n\ts := \"panic(\"\n\t_ = s\n}\n",
        )]);
        let found = ids(&entries);
        assert!(!found.contains(&"panic_in_lib".to_string()));
        assert!(!found.contains(&"defer_in_loop".to_string()));
    }

    #[test]
    fn test_todo_and_url() {
        let entries = scan(&[(
            "lib.go",
            "package lib\n\n// TODO: remove after migration\nvar endpoint = \"https://api.example.com/v1\"\n",
        )]);
        let found = ids(&entries);
        assert!(found.contains(&"todo_fixme".to_string()));
        assert!(found.contains(&"hardcoded_url".to_string()));
    }

    #[test]
    fn test_sorted_high_first() {
        let entries = scan(&[(
            "lib.go",
            concat!(
                "package lib\n\n",
                "// TODO: one\n// TODO: two\n// TODO: three\n",
                "func f() {\n\tpanic(\"x\")\n}\n",
            ),
        )]);
        assert!(entries.len() >= 2);
        assert_eq!(entries[0].id, "panic_in_lib");
        assert_eq!(entries[0].severity, Severity::High);
    }
}
