//! Go declaration extraction
//!
//! Lexical extraction of functions and structs via regex headers plus
//! depth-counted paren/brace scanning — no full parser. The scanner tracks
//! string state (interpreted strings, backtick raw strings, line comments)
//! so braces inside literals don't skew depth counts. Known accepted
//! limitations: block comments containing unbalanced braces and multi-line
//! raw strings opened inside a parameter list will confuse the scanner.

use crate::models::{FunctionInfo, StructInfo};
use regex::Regex;
use std::collections::HashMap;
use std::path::Path;
use std::sync::OnceLock;
use tracing::debug;
use xxhash_rust::xxh3::xxh3_64;

/// Function headers, with optional receiver: `func (r *T) Name(` / `func Name(`.
fn func_header_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?m)^func\s+(?:\(([^)]*)\)\s+)?(\w+)\s*\(").expect("valid regex")
    })
}

fn struct_header_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?m)^type\s+(\w+)\s+struct\s*\{").expect("valid regex"))
}

/// Extract all functions and methods from a Go file.
///
/// Unreadable files yield an empty list; declarations with unbalanced
/// brackets are skipped. Never fatal.
pub fn extract_functions(path: &Path) -> Vec<FunctionInfo> {
    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(err) => {
            debug!(file = %path.display(), %err, "skipping unreadable file");
            return Vec::new();
        }
    };
    extract_functions_from(path, &content)
}

pub fn extract_functions_from(path: &Path, content: &str) -> Vec<FunctionInfo> {
    let mut functions = Vec::new();

    for header in func_header_re().captures_iter(content) {
        let whole = header.get(0).expect("group 0");
        let name = header[2].to_string();
        let receiver = header
            .get(1)
            .map(|m| receiver_type_name(m.as_str()))
            .unwrap_or_default();

        // The header regex ends just past the open paren of the param list.
        let params_start = whole.end();
        let Some(params_end) = scan_to_close_paren(content, params_start) else {
            continue; // unbalanced declaration
        };
        let params = split_params(&content[params_start..params_end]);

        // Find the body's opening brace after the parameter list.
        let Some(brace_rel) = content[params_end..].find('{') else {
            continue; // forward declaration or interface method, no body
        };
        let brace_idx = params_end + brace_rel;
        let Some(body_end) = scan_to_close_brace(content, brace_idx) else {
            continue;
        };

        let start_line = line_of(content, whole.start());
        let end_line = line_of(content, body_end);
        let body = content[brace_idx..=body_end].to_string();
        let normalized_body = normalize_body(&body);
        let body_hash = xxh3_64(normalized_body.as_bytes());

        functions.push(FunctionInfo {
            exported: is_exported(&name),
            name,
            file: path.to_path_buf(),
            line: start_line,
            end_line,
            loc: end_line - start_line + 1,
            params,
            body,
            normalized_body,
            body_hash,
            receiver,
        });
    }

    functions
}

/// Extract all structs from a Go file, with methods attached by receiver.
pub fn extract_structs(path: &Path) -> Vec<StructInfo> {
    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(err) => {
            debug!(file = %path.display(), %err, "skipping unreadable file");
            return Vec::new();
        }
    };
    extract_structs_from(path, &content)
}

pub fn extract_structs_from(path: &Path, content: &str) -> Vec<StructInfo> {
    let mut structs = Vec::new();

    for header in struct_header_re().captures_iter(content) {
        let whole = header.get(0).expect("group 0");
        let name = header[1].to_string();

        let brace_idx = whole.end() - 1;
        let Some(body_end) = scan_to_close_brace(content, brace_idx) else {
            continue;
        };

        let start_line = line_of(content, whole.start());
        let end_line = line_of(content, body_end);
        let body = &content[brace_idx + 1..body_end];
        let (fields, embedded) = parse_struct_fields(body);

        structs.push(StructInfo {
            exported: is_exported(&name),
            name,
            file: path.to_path_buf(),
            line: start_line,
            loc: end_line - start_line + 1,
            fields,
            embedded,
            methods: Vec::new(),
        });
    }

    // Attach methods by receiver type name.
    let mut methods_by_receiver: HashMap<String, Vec<String>> = HashMap::new();
    for func in extract_functions_from(path, content) {
        if !func.receiver.is_empty() {
            methods_by_receiver
                .entry(func.receiver)
                .or_default()
                .push(func.name);
        }
    }
    for s in &mut structs {
        if let Some(methods) = methods_by_receiver.remove(&s.name) {
            s.methods = methods;
        }
    }

    structs
}

/// Scan forward from just past an opening paren, returning the index of the
/// matching close-paren. String-state aware.
fn scan_to_close_paren(content: &str, start: usize) -> Option<usize> {
    let mut depth = 1i32;
    let mut scanner = StringState::default();
    for (offset, ch) in content[start..].char_indices() {
        if !scanner.step(ch) {
            continue;
        }
        match ch {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth == 0 {
                    return Some(start + offset);
                }
            }
            _ => {}
        }
    }
    None
}

/// Scan forward from an opening brace, returning the index of the matching
/// close-brace.
fn scan_to_close_brace(content: &str, brace_idx: usize) -> Option<usize> {
    let mut depth = 0i32;
    let mut scanner = StringState::default();
    for (offset, ch) in content[brace_idx..].char_indices() {
        if !scanner.step(ch) {
            continue;
        }
        match ch {
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(brace_idx + offset);
                }
            }
            _ => {}
        }
    }
    None
}

/// Minimal string/comment state for depth scanning. `step` consumes one
/// character and returns true when the character is structural (outside any
/// literal or comment).
#[derive(Default)]
struct StringState {
    in_string: bool,
    in_raw: bool,
    in_line_comment: bool,
    escaped: bool,
    prev_slash: bool,
}

impl StringState {
    fn step(&mut self, ch: char) -> bool {
        if ch == '\n' {
            self.in_line_comment = false;
            self.in_string = false; // interpreted strings cannot span lines
            self.escaped = false;
            self.prev_slash = false;
            return false;
        }
        if self.in_line_comment {
            return false;
        }
        if self.in_raw {
            if ch == '`' {
                self.in_raw = false;
            }
            return false;
        }
        if self.in_string {
            if self.escaped {
                self.escaped = false;
            } else if ch == '\\' {
                self.escaped = true;
            } else if ch == '"' {
                self.in_string = false;
            }
            return false;
        }
        match ch {
            '"' => {
                self.in_string = true;
                self.prev_slash = false;
                false
            }
            '`' => {
                self.in_raw = true;
                self.prev_slash = false;
                false
            }
            '/' => {
                if self.prev_slash {
                    self.in_line_comment = true;
                    self.prev_slash = false;
                } else {
                    self.prev_slash = true;
                }
                false
            }
            _ => {
                self.prev_slash = false;
                true
            }
        }
    }
}

/// Split a raw parameter list on top-level commas and pull out the names.
///
/// Go params read `name Type` with trailing-word types; `a, b string` yields
/// the tokens `a` and `b string`. A bare single-word token counts as a name
/// only when it is a lowercase-initial identifier, which keeps bare types in
/// weird signatures from inflating the count.
pub fn split_params(param_str: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut depth = 0i32;
    let mut current = String::new();
    for ch in param_str.chars() {
        match ch {
            '(' | '[' | '{' => {
                depth += 1;
                current.push(ch);
            }
            ')' | ']' | '}' => {
                depth -= 1;
                current.push(ch);
            }
            ',' if depth == 0 => {
                tokens.push(std::mem::take(&mut current));
            }
            _ => current.push(ch),
        }
    }
    tokens.push(current);

    let mut names = Vec::new();
    for token in tokens {
        let token = token.trim();
        if token.is_empty() {
            continue;
        }
        let words: Vec<&str> = token.split_whitespace().collect();
        match words.len() {
            0 => {}
            1 => {
                let word = words[0];
                let is_ident = word.chars().all(|c| c.is_alphanumeric() || c == '_');
                if is_ident && word.starts_with(|c: char| c.is_lowercase() || c == '_') {
                    names.push(word.to_string());
                }
            }
            _ => {
                // Last word is the type; everything before it is names.
                for word in &words[..words.len() - 1] {
                    let name = word.trim_end_matches(',');
                    if !name.is_empty() {
                        names.push(name.to_string());
                    }
                }
            }
        }
    }
    names
}

/// Pull the receiver type name out of receiver text like `s *Server`.
fn receiver_type_name(receiver: &str) -> String {
    let last = receiver.split_whitespace().last().unwrap_or("");
    let stripped = last.trim_start_matches('*');
    // Generic receivers read `T[P]`; keep the base name.
    match stripped.find('[') {
        Some(idx) => stripped[..idx].to_string(),
        None => stripped.to_string(),
    }
}

/// Drop blanks, comment-only lines, inline comment suffixes, and logging
/// calls from a function body. Idempotent: normalizing twice is a no-op.
pub fn normalize_body(body: &str) -> String {
    let logging_prefixes = ["log.", "logger.", "fmt.Print", "fmt.Fprint"];
    let mut out: Vec<String> = Vec::new();

    for line in body.lines() {
        let line = strip_inline_comment(line);
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        if logging_prefixes.iter().any(|p| trimmed.starts_with(p)) {
            continue;
        }
        out.push(trimmed.to_string());
    }

    out.join("\n")
}

/// Remove a trailing `//` comment that sits outside any string literal.
fn strip_inline_comment(line: &str) -> &str {
    let mut in_string = false;
    let mut in_raw = false;
    let mut escaped = false;
    let mut prev_slash: Option<usize> = None;

    for (idx, ch) in line.char_indices() {
        if in_raw {
            if ch == '`' {
                in_raw = false;
            }
            continue;
        }
        if in_string {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == '"' {
                in_string = false;
            }
            continue;
        }
        match ch {
            '"' => {
                in_string = true;
                prev_slash = None;
            }
            '`' => {
                in_raw = true;
                prev_slash = None;
            }
            '/' => {
                if let Some(start) = prev_slash {
                    return &line[..start];
                }
                prev_slash = Some(idx);
            }
            _ => prev_slash = None,
        }
    }
    line
}

/// 1-indexed line number of a byte offset.
fn line_of(content: &str, byte_idx: usize) -> u32 {
    (content[..byte_idx].matches('\n').count() + 1) as u32
}

fn is_exported(name: &str) -> bool {
    name.chars().next().is_some_and(|c| c.is_uppercase())
}

/// Parse struct body lines into (named fields, embedded types).
///
/// Only depth-0 lines relative to the struct body are considered; tags and
/// comment suffixes are stripped first. A lone capitalized identifier
/// (optionally `*`-prefixed or package-qualified) is an embedded type.
fn parse_struct_fields(body: &str) -> (Vec<String>, Vec<String>) {
    let mut fields = Vec::new();
    let mut embedded = Vec::new();
    let mut depth = 0i32;

    for raw_line in body.lines() {
        let line = strip_inline_comment(raw_line);
        // Strip struct tags (backtick-delimited).
        let line = match line.find('`') {
            Some(idx) => &line[..idx],
            None => line,
        };
        let trimmed = line.trim();

        if depth == 0 && !trimmed.is_empty() {
            let words: Vec<&str> = trimmed.split_whitespace().collect();
            if words.len() == 1 {
                // Capitalization is checked on the bare name, but the
                // recorded type keeps its `*` prefix.
                let bare = words[0].trim_start_matches('*');
                let base = bare.rsplit('.').next().unwrap_or(bare);
                if base.chars().next().is_some_and(|c| c.is_uppercase()) {
                    embedded.push(words[0].to_string());
                }
            } else {
                // `Name Type` or `A, B Type`: everything before the type is names.
                let names_part = &words[..words.len() - 1];
                for word in names_part {
                    for name in word.split(',') {
                        let name = name.trim();
                        if !name.is_empty() {
                            fields.push(name.to_string());
                        }
                    }
                }
            }
        }

        for ch in trimmed.chars() {
            match ch {
                '{' => depth += 1,
                '}' => depth -= 1,
                _ => {}
            }
        }
    }

    (fields, embedded)
}
