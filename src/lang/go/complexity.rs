//! Go complexity compute functions and signal catalog

use crate::detectors::complexity::ComplexitySignal;
use regex::Regex;
use std::sync::OnceLock;

/// Weighted signal catalog for Go files.
pub fn go_complexity_signals() -> Vec<ComplexitySignal> {
    vec![
        ComplexitySignal::pattern("if_else", r"\bif\b.*\belse\b", 1),
        ComplexitySignal::pattern("switch", r"\bswitch\b", 2),
        ComplexitySignal::pattern("select", r"\bselect\b", 2),
        ComplexitySignal::pattern("goroutine", r"\bgo\s+\w", 2),
        ComplexitySignal::pattern("channel_op", r"<-", 1),
        ComplexitySignal::pattern("nested_func", r"\bfunc\s*\(", 2),
        ComplexitySignal::compute("max_params", compute_max_params, 3),
        ComplexitySignal::compute("nesting_depth", compute_nesting_depth, 3),
        ComplexitySignal::compute("long_function", compute_long_functions, 2),
    ]
}

fn func_open_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?m)^func\s+(?:\([^)]+\)\s+)?\w+\s*\(").expect("valid regex"))
}

/// Largest parameter count across all functions, when over 5.
pub fn compute_max_params(content: &str, _lines: &[&str]) -> Option<(u32, String)> {
    let mut max_params = 0usize;

    for m in func_open_re().find_iter(content) {
        let start = m.end();
        let bytes = content.as_bytes();
        let mut depth = 1i32;
        let mut i = start;
        while i < bytes.len() && depth > 0 {
            match bytes[i] {
                b'(' => depth += 1,
                b')' => depth -= 1,
                _ => {}
            }
            i += 1;
        }
        if depth != 0 {
            continue;
        }
        let param_str = content[start..i - 1].trim();
        if param_str.is_empty() {
            continue;
        }
        let count = split_top_level_commas(param_str)
            .iter()
            .filter(|p| !p.trim().is_empty())
            .count();
        max_params = max_params.max(count);
    }

    if max_params > 5 {
        let n = max_params as u32;
        Some((n, format!("function with {n} params")))
    } else {
        None
    }
}

fn split_top_level_commas(s: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut start = 0usize;
    for (i, ch) in s.char_indices() {
        match ch {
            '(' | '[' | '{' => depth += 1,
            ')' | ']' | '}' => depth -= 1,
            ',' if depth == 0 => {
                parts.push(&s[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&s[start..]);
    parts
}

/// Maximum brace-nesting depth (string-aware), minus one for the enclosing
/// function scope, when over 4.
pub fn compute_nesting_depth(_content: &str, lines: &[&str]) -> Option<(u32, String)> {
    let mut max_depth = 0i32;
    let mut current = 0i32;
    let mut in_string = false;
    let mut in_raw = false;

    for line in lines {
        let stripped = line.trim();
        if stripped.is_empty() || stripped.starts_with("//") {
            continue;
        }
        let mut skip_next = false;
        for ch in stripped.chars() {
            if skip_next {
                skip_next = false;
                continue;
            }
            if in_raw {
                if ch == '`' {
                    in_raw = false;
                }
                continue;
            }
            if in_string {
                match ch {
                    '\\' => skip_next = true,
                    '"' => in_string = false,
                    _ => {}
                }
                continue;
            }
            match ch {
                '"' => in_string = true,
                '`' => in_raw = true,
                '{' => {
                    current += 1;
                    max_depth = max_depth.max(current);
                }
                '}' => current -= 1,
                _ => {}
            }
        }
        // interpreted strings end at the line
        in_string = false;
    }

    let effective = max_depth - 1;
    if effective > 4 {
        let depth = effective as u32;
        Some((depth, format!("nesting depth {depth}")))
    } else {
        None
    }
}

fn func_keyword_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?m)^func\s+").expect("valid regex"))
}

fn func_name_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"func\s+(?:\([^)]+\)\s+)?(\w+)").expect("valid regex"))
}

/// Longest function over 80 LOC, with its name in the label.
pub fn compute_long_functions(content: &str, _lines: &[&str]) -> Option<(u32, String)> {
    let mut longest: Option<(String, u32)> = None;

    for m in func_keyword_re().find_iter(content) {
        let fn_line = content[..m.start()].matches('\n').count();
        let rest = &content[m.start()..];
        let Some(brace_rel) = rest.find('{') else {
            continue;
        };

        let abs_start = m.start() + brace_rel;
        let mut depth = 0i32;
        for (offset, ch) in content[abs_start..].char_indices() {
            match ch {
                '{' => depth += 1,
                '}' => {
                    depth -= 1;
                    if depth == 0 {
                        let end = abs_start + offset;
                        let end_line = content[..=end].matches('\n').count();
                        let loc = (end_line - fn_line + 1) as u32;
                        if loc > 80 {
                            let name = func_name_re()
                                .captures(rest)
                                .map(|c| c[1].to_string())
                                .unwrap_or_else(|| "?".to_string());
                            if longest.as_ref().is_none_or(|(_, best)| loc > *best) {
                                longest = Some((name, loc));
                            }
                        }
                        break;
                    }
                }
                _ => {}
            }
        }
    }

    longest.map(|(name, loc)| (loc, format!("long function ({name}: {loc} LOC)")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(content: &str) -> Vec<&str> {
        content.lines().collect()
    }

    #[test]
    fn test_max_params_over_threshold() {
        let src = "package a\n\nfunc f(a int, b int, c int, d int, e int, g int) {}\n";
        let (value, label) = compute_max_params(src, &lines(src)).unwrap();
        assert_eq!(value, 6);
        assert!(label.contains("6 params"));
    }

    #[test]
    fn test_max_params_under_threshold_silent() {
        let src = "package a\n\nfunc f(a int, b int) {}\n";
        assert!(compute_max_params(src, &lines(src)).is_none());
    }

    #[test]
    fn test_max_params_ignores_nested_commas() {
        let src = "package a\n\nfunc f(m map[string]int, g func(int, int) error) {}\n";
        assert!(compute_max_params(src, &lines(src)).is_none());
    }

    #[test]
    fn test_nesting_depth_discounts_function_scope() {
        // five brace levels inside the function body = depth 6, effective 5
        let src = "func f() {\n\tif a {\n\t\tif b {\n\t\t\tif c {\n\t\t\t\tif d {\n\t\t\t\t\tif e {\n\t\t\t\t\t}\n\t\t\t\t}\n\t\t\t}\n\t\t}\n\t}\n}\n";
        let (depth, _) = compute_nesting_depth(src, &lines(src)).unwrap();
        assert_eq!(depth, 5);
    }

    #[test]
    fn test_nesting_depth_skips_braces_in_strings() {
        let src = "func f() {\n\ts := \"{{{{{{\"\n\tr := `{{{{{{`\n\t_ = s\n\t_ = r\n}\n";
        assert!(compute_nesting_depth(src, &lines(src)).is_none());
    }

    #[test]
    fn test_long_function_reports_name() {
        let body: String = (0..100).map(|i| format!("\tx{i} := {i}\n")).collect();
        let src = format!("package a\n\nfunc bigFunc() {{\n{body}}}\n");
        let (loc, label) = compute_long_functions(&src, &lines(&src)).unwrap();
        assert!(loc > 80);
        assert!(label.contains("bigFunc"));
    }

    #[test]
    fn test_short_functions_silent() {
        let src = "package a\n\nfunc f() {\n\treturn\n}\n";
        assert!(compute_long_functions(src, &lines(src)).is_none());
    }
}
