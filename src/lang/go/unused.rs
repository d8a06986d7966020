//! Unused-symbol detection for Go
//!
//! Two tiers: `go vet ./...` when the toolchain and a go.mod are present,
//! otherwise a regex fallback that only catches explicit result discards
//! (`_ = expr`). Vet runs as a blocking subprocess with a hard timeout;
//! timeout or launch failure means "tool unavailable", never an error.

use crate::discovery::find_source_files;
use regex::Regex;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::OnceLock;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

const VET_TIMEOUT_SECS: u64 = 60;

#[derive(Debug, Clone, Serialize)]
pub struct UnusedEntry {
    pub file: PathBuf,
    pub line: u32,
    /// `unused_import`, `unused_var`, `ignored_error`, or `other`
    pub category: String,
    pub name: String,
}

fn vet_line_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(.+?):(\d+):(\d+):\s*(.+)$").expect("valid regex"))
}

fn quoted_name_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"["']([^"']+)["']"#).expect("valid regex"))
}

/// Classify one vet diagnostic by its message text.
pub fn categorise_vet_message(message: &str) -> (String, String) {
    let quoted = || {
        quoted_name_re()
            .captures(message)
            .map(|c| c[1].to_string())
            .unwrap_or_else(|| message.to_string())
    };

    if message.contains("imported and not used") {
        ("unused_import".to_string(), quoted())
    } else if message.contains("unused variable") || message.contains("unused parameter") {
        ("unused_var".to_string(), quoted())
    } else {
        ("other".to_string(), message.to_string())
    }
}

/// Run `go vet ./...` under `root`. `None` means the tool path is
/// unavailable (no go.mod, no binary, timeout) and the caller should fall
/// back to the heuristic.
pub fn try_go_vet(root: &Path) -> Option<Vec<UnusedEntry>> {
    if !root.join("go.mod").exists() {
        return None;
    }

    let mut child = match Command::new("go")
        .args(["vet", "./..."])
        .current_dir(root)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
    {
        Ok(child) => child,
        Err(err) => {
            debug!(%err, "go binary unavailable");
            return None;
        }
    };

    // Poll for completion; vet can hang on broken module caches.
    let start = Instant::now();
    let timeout = Duration::from_secs(VET_TIMEOUT_SECS);
    loop {
        match child.try_wait() {
            Ok(Some(_)) => break,
            Ok(None) => {
                if start.elapsed() > timeout {
                    let _ = child.kill();
                    warn!("go vet timed out after {VET_TIMEOUT_SECS}s");
                    return None;
                }
                std::thread::sleep(Duration::from_millis(100));
            }
            Err(err) => {
                debug!(%err, "failed waiting for go vet");
                return None;
            }
        }
    }

    let output = match child.wait_with_output() {
        Ok(output) => output,
        Err(err) => {
            debug!(%err, "failed collecting go vet output");
            return None;
        }
    };
    let stderr = String::from_utf8_lossy(&output.stderr);
    Some(parse_vet_output(root, &stderr))
}

/// Parse vet diagnostics (`path:line:col: message`) from stderr text.
/// Package header lines (`# pkg`) and anything non-conforming are skipped.
pub fn parse_vet_output(root: &Path, stderr: &str) -> Vec<UnusedEntry> {
    let mut entries = Vec::new();
    for line in stderr.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let Some(caps) = vet_line_re().captures(line) else {
            continue;
        };
        let raw_path = caps[1].trim_start_matches("./");
        let file = {
            let p = Path::new(raw_path);
            if p.is_absolute() {
                p.to_path_buf()
            } else {
                root.join(p)
            }
        };
        let Ok(line_no) = caps[2].parse::<u32>() else {
            continue;
        };
        let (category, name) = categorise_vet_message(&caps[4]);
        entries.push(UnusedEntry {
            file,
            line: line_no,
            category,
            name,
        });
    }
    entries
}

fn discard_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^_\s*(?:,\s*_\s*)*=[^=]").expect("valid regex"))
}

/// Fallback heuristic: explicit result discards only. `_ :=` is a fresh
/// declaration, `for`-range bindings are loop plumbing, and comments don't
/// count.
pub fn detect_unused_regex(files: &[PathBuf]) -> Vec<UnusedEntry> {
    let mut entries = Vec::new();

    for file in files {
        let content = match std::fs::read_to_string(file) {
            Ok(c) => c,
            Err(err) => {
                debug!(file = %file.display(), %err, "skipping unreadable file");
                continue;
            }
        };
        for (i, line) in content.lines().enumerate() {
            let stripped = line.trim();
            if stripped.starts_with("//") || stripped.starts_with("for") {
                continue;
            }
            if stripped.contains(":=") {
                continue;
            }
            if discard_re().is_match(stripped) {
                entries.push(UnusedEntry {
                    file: file.clone(),
                    line: i as u32 + 1,
                    category: "ignored_error".to_string(),
                    name: stripped.chars().take(100).collect(),
                });
            }
        }
    }

    entries
}

/// Detect unused symbols under `path`, preferring vet, filtering to
/// `category` unless it is "all". Returns entries plus the number of Go
/// files checked.
pub fn detect_unused(path: &Path, category: &str, exclusions: &[&str]) -> (Vec<UnusedEntry>, usize) {
    let files = find_source_files(path, &[".go"], exclusions);

    let mut entries = match try_go_vet(path) {
        Some(entries) => entries,
        None => {
            debug!("go vet unavailable, using discard heuristic");
            detect_unused_regex(&files)
        }
    };

    if category != "all" {
        entries.retain(|e| e.category == category);
    }

    (entries, files.len())
}
