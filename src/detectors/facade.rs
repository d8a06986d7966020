//! Facade detection
//!
//! A facade file re-exports declarations from elsewhere and adds no logic.
//! After stripping the package clause, imports, comments, and block
//! punctuation, every remaining line must be an alias form
//! (`var X = pkg.Y`, `type X = pkg.Y`, `const X = pkg.Y`) and there must be
//! at least one.

use regex::Regex;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::OnceLock;
use tracing::debug;

#[derive(Debug, Clone, Serialize)]
pub struct FacadeEntry {
    pub file: PathBuf,
    /// Number of re-exported symbols
    pub reexports: usize,
}

fn reexport_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(?:var|type|const)\s+\w+\s*=\s*\w+\.\w+$").expect("valid regex")
    })
}

/// Classify one file: `Some(count)` when it is purely re-exports.
pub fn facade_reexports(content: &str) -> Option<usize> {
    let mut reexports = 0usize;
    let mut in_import_block = false;

    for raw in content.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with("//") || line.starts_with("package ") {
            continue;
        }
        if in_import_block {
            if line == ")" {
                in_import_block = false;
            }
            continue;
        }
        if line.starts_with("import") {
            if line.ends_with('(') {
                in_import_block = true;
            }
            continue;
        }
        if reexport_re().is_match(line) {
            reexports += 1;
        } else {
            return None; // real logic present
        }
    }

    (reexports > 0).then_some(reexports)
}

/// Scan `files` for facades. Potential is the number of files scanned.
pub fn detect_facades(files: &[PathBuf]) -> (Vec<FacadeEntry>, usize) {
    let mut entries = Vec::new();

    for file in files {
        let content = match std::fs::read_to_string(file) {
            Ok(c) => c,
            Err(err) => {
                debug!(file = %file.display(), %err, "skipping unreadable file");
                continue;
            }
        };
        if let Some(reexports) = facade_reexports(&content) {
            entries.push(FacadeEntry {
                file: file.clone(),
                reexports,
            });
        }
    }

    entries.sort_by(|a, b| b.reexports.cmp(&a.reexports).then_with(|| a.file.cmp(&b.file)));
    (entries, files.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pure_reexport_file_is_facade() {
        let src = concat!(
            "package api\n\n",
            "import (\n\t\"example.com/app/internal/core\"\n)\n\n",
            "// Public aliases.\n",
            "var NewClient = core.NewClient\n",
            "type Client = core.Client\n",
            "const DefaultTimeout = core.DefaultTimeout\n",
        );
        assert_eq!(facade_reexports(src), Some(3));
    }

    #[test]
    fn test_any_logic_disqualifies() {
        let src = concat!(
            "package api\n\n",
            "var NewClient = core.NewClient\n\n",
            "func helper() int { return 1 }\n",
        );
        assert_eq!(facade_reexports(src), None);
    }

    #[test]
    fn test_empty_file_is_not_a_facade() {
        assert_eq!(facade_reexports("package api\n"), None);
    }
}
