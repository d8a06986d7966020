//! Large-file detection
//!
//! Production-zone files over the LOC threshold. Test, generated, config
//! and script files never count, in either the findings or the potential.

use crate::zones::{classify, Zone, ZoneRule};
use serde::Serialize;
use std::path::PathBuf;
use tracing::debug;

#[derive(Debug, Clone, Serialize)]
pub struct LargeEntry {
    pub file: PathBuf,
    pub loc: u32,
}

/// Returns entries over `threshold` LOC (descending) and the production
/// file count as the potential.
pub fn detect_large(
    files: &[PathBuf],
    rules: &[ZoneRule],
    threshold: usize,
) -> (Vec<LargeEntry>, usize) {
    let mut entries = Vec::new();
    let mut production = 0usize;

    for file in files {
        if classify(file, rules) != Zone::Production {
            continue;
        }
        production += 1;

        let loc = match std::fs::read_to_string(file) {
            Ok(content) => content.lines().count(),
            Err(err) => {
                debug!(file = %file.display(), %err, "skipping unreadable file");
                continue;
            }
        };
        if loc > threshold {
            entries.push(LargeEntry {
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

    #[test]
    fn test_large_production_file_flagged() {
        let dir = tempfile::tempdir().unwrap();
        let big = dir.path().join("big.go");
        fs::write(&big, "x\n".repeat(600)).unwrap();
        let small = dir.path().join("small.go");
        fs::write(&small, "x\n".repeat(10)).unwrap();

        let (entries, potential) =
            detect_large(&[big.clone(), small], &common_zone_rules(), 500);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].file, big);
        assert_eq!(entries[0].loc, 600);
        assert_eq!(potential, 2);
    }

    #[test]
    fn test_test_zone_files_skipped_entirely() {
        let dir = tempfile::tempdir().unwrap();
        let test_file = dir.path().join("big_test.go");
        fs::write(&test_file, "x\n".repeat(600)).unwrap();

        let mut rules = vec![ZoneRule::new(Zone::Test, &["_test.go"])];
        rules.extend(common_zone_rules());
        let (entries, potential) = detect_large(&[test_file], &rules, 500);
        assert!(entries.is_empty());
        assert_eq!(potential, 0);
    }
}
