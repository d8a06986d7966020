//! Python complexity compute functions and signal catalog
//!
//! Indentation-based where the Go equivalents count braces: the indent unit
//! is derived from the GCD of observed indents so tab-width conventions
//! don't matter.

use crate::detectors::complexity::ComplexitySignal;
use regex::Regex;
use std::sync::OnceLock;

pub fn python_complexity_signals() -> Vec<ComplexitySignal> {
    vec![
        ComplexitySignal::pattern("if_elif", r"\belif\b", 1),
        ComplexitySignal::pattern("try_except", r"\bexcept\b", 2),
        ComplexitySignal::pattern("comprehension", r"\bfor\b.*\bin\b.*\]", 1),
        ComplexitySignal::pattern("lambda", r"\blambda\b", 2),
        ComplexitySignal::compute("max_params", compute_max_params, 3),
        ComplexitySignal::compute("nesting_depth", compute_nesting_depth, 3),
        ComplexitySignal::compute("long_function", compute_long_functions, 2),
    ]
}

fn def_params_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)def\s+\w+\s*\(([^)]*)\)").expect("valid regex"))
}

/// Largest parameter count across all functions (excluding `self`, `cls`,
/// and starred params), when over 7.
pub fn compute_max_params(content: &str, _lines: &[&str]) -> Option<(u32, String)> {
    let mut max_params = 0usize;
    for caps in def_params_re().captures_iter(content) {
        let count = caps[1]
            .split(',')
            .map(str::trim)
            .filter(|p| !p.is_empty() && *p != "self" && *p != "cls" && !p.starts_with('*'))
            .count();
        max_params = max_params.max(count);
    }
    if max_params > 7 {
        let n = max_params as u32;
        Some((n, format!("function with {n} params")))
    } else {
        None
    }
}

/// Indent unit from the GCD of observed indents (capped at 16 columns).
fn detect_indent_unit(lines: &[&str]) -> usize {
    fn gcd(a: usize, b: usize) -> usize {
        if b == 0 {
            a
        } else {
            gcd(b, a % b)
        }
    }

    let mut unit = 0usize;
    let mut seen_any = false;
    for line in lines {
        let stripped = line.trim_start();
        if stripped.is_empty() || stripped.starts_with('#') {
            continue;
        }
        let indent = line.len() - stripped.len();
        if indent > 0 && indent <= 16 {
            unit = gcd(unit, indent);
            seen_any = true;
        }
    }
    if seen_any {
        unit.max(1)
    } else {
        4
    }
}

/// Maximum indentation depth in indent units, when over 4.
pub fn compute_nesting_depth(_content: &str, lines: &[&str]) -> Option<(u32, String)> {
    let unit = detect_indent_unit(lines);
    let mut max_depth = 0usize;
    for line in lines {
        let stripped = line.trim_start();
        if stripped.is_empty() || stripped.starts_with('#') {
            continue;
        }
        let depth = (line.len() - stripped.len()) / unit;
        max_depth = max_depth.max(depth);
    }
    if max_depth > 4 {
        let depth = max_depth as u32;
        Some((depth, format!("nesting depth {depth}")))
    } else {
        None
    }
}

fn def_header_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(\s*)def\s+(\w+)").expect("valid regex"))
}

/// Longest function over 80 LOC by indentation span, with its name in the
/// label.
pub fn compute_long_functions(_content: &str, lines: &[&str]) -> Option<(u32, String)> {
    let mut longest: Option<(String, u32)> = None;

    let mut i = 0;
    while i < lines.len() {
        let Some(caps) = def_header_re().captures(lines[i]) else {
            i += 1;
            continue;
        };
        let fn_indent = caps[1].len();
        let fn_name = caps[2].to_string();
        let fn_start = i;

        let mut j = i + 1;
        while j < lines.len() {
            let stripped = lines[j].trim();
            if stripped.is_empty() {
                j += 1;
                continue;
            }
            let indent = lines[j].len() - lines[j].trim_start().len();
            if indent <= fn_indent {
                break;
            }
            j += 1;
        }

        let loc = (j - fn_start) as u32;
        if loc > 80 && longest.as_ref().is_none_or(|(_, best)| loc > *best) {
            longest = Some((fn_name, loc));
        }
        i = j;
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
    fn test_self_and_star_params_excluded() {
        let src = "def method(self, a, b, *args, **kwargs):\n    pass\n";
        // only a and b count
        assert!(compute_max_params(src, &lines(src)).is_none());
    }

    #[test]
    fn test_max_params_over_threshold() {
        let src = "def f(a, b, c, d, e, g, h, i):\n    pass\n";
        let (value, _) = compute_max_params(src, &lines(src)).unwrap();
        assert_eq!(value, 8);
    }

    #[test]
    fn test_indent_unit_from_two_space_file() {
        let src = "def f():\n  if a:\n    if b:\n      if c:\n        if d:\n          x = 1\n";
        let (depth, _) = compute_nesting_depth(src, &lines(src)).unwrap();
        assert_eq!(depth, 5);
    }

    #[test]
    fn test_shallow_file_silent() {
        let src = "def f():\n    return 1\n";
        assert!(compute_nesting_depth(src, &lines(src)).is_none());
    }

    #[test]
    fn test_long_function_by_indent_span() {
        let body: String = (0..90).map(|i| format!("    x{i} = {i}\n")).collect();
        let src = format!("def big():\n{body}\ndef small():\n    pass\n");
        let (loc, label) = compute_long_functions(&src, &lines(&src)).unwrap();
        assert!(loc > 80);
        assert!(label.contains("big"));
    }
}
