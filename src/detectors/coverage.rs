//! Test-coverage gap detection
//!
//! Production files of meaningful size whose directory carries no test file
//! at all. A lexical stand-in for real coverage data: it finds whole
//! packages nobody ever wrote a test for, not partially-tested ones.

use crate::zones::{classify, Zone, ZoneRule};
use serde::Serialize;
use std::collections::HashSet;
use std::path::PathBuf;
use tracing::debug;

/// Files below this LOC are too small to demand a test.
pub const MIN_LOC: usize = 40;

#[derive(Debug, Clone, Serialize)]
pub struct CoverageGapEntry {
    pub file: PathBuf,
    pub loc: u32,
}

/// Flag production files ≥ [`MIN_LOC`] whose directory has no file matching
/// `test_suffix` (e.g. `_test.go`). Potential is the production file count.
pub fn detect_coverage_gaps(
    files: &[PathBuf],
    rules: &[ZoneRule],
    test_suffix: &str,
) -> (Vec<CoverageGapEntry>, usize) {
    let tested_dirs: HashSet<PathBuf> = files
        .iter()
        .filter(|f| f.to_string_lossy().ends_with(test_suffix))
        .filter_map(|f| f.parent().map(|p| p.to_path_buf()))
        .collect();

    let mut entries = Vec::new();
    let mut production = 0usize;

    for file in files {
        if classify(file, rules) != Zone::Production {
            continue;
        }
        production += 1;

        if file
            .parent()
            .is_some_and(|dir| tested_dirs.contains(dir))
        {
            continue;
        }

        let loc = match std::fs::read_to_string(file) {
            Ok(content) => content.lines().count(),
            Err(err) => {
                debug!(file = %file.display(), %err, "skipping unreadable file");
                continue;
            }
        };
        if loc >= MIN_LOC {
            entries.push(CoverageGapEntry {
                file: file.clone(),
                loc: loc as u32,
            });
        }
    }

    entries.sort_by(|a, b| b.loc.cmp(&a.loc).then_with(|| a.file.cmp(&b.file)));
    (entries, production)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::zones::common_zone_rules;
    use std::fs;

    fn go_rules() -> Vec<ZoneRule> {
        let mut rules = vec![ZoneRule::new(Zone::Test, &["_test.go"])];
        rules.extend(common_zone_rules());
        rules
    }

    #[test]
    fn test_untested_package_flagged() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("core")).unwrap();
        let core = dir.path().join("core/engine.go");
        fs::write(&core, "x\n".repeat(50)).unwrap();

        let (entries, potential) =
            detect_coverage_gaps(&[core.clone()], &go_rules(), "_test.go");
        assert_eq!(potential, 1);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].file, core);
    }

    #[test]
    fn test_sibling_test_file_covers_directory() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("core")).unwrap();
        let engine = dir.path().join("core/engine.go");
        let test = dir.path().join("core/engine_test.go");
        fs::write(&engine, "x\n".repeat(50)).unwrap();
        fs::write(&test, "x\n".repeat(10)).unwrap();

        let (entries, _) = detect_coverage_gaps(&[engine, test], &go_rules(), "_test.go");
        assert!(entries.is_empty());
    }

    #[test]
    fn test_small_files_exempt() {
        let dir = tempfile::tempdir().unwrap();
        let tiny = dir.path().join("doc.go");
        fs::write(&tiny, "x\n".repeat(5)).unwrap();

        let (entries, potential) = detect_coverage_gaps(&[tiny], &go_rules(), "_test.go");
        assert!(entries.is_empty());
        assert_eq!(potential, 1);
    }
}
