//! Orphaned-file detection
//!
//! A file is orphaned when nothing imports it, it matches no entry pattern
//! (main files, command directories, generated suffixes), and it is not a
//! barrel/index file by name.

use crate::graph::DepGraph;
use serde::Serialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Debug, Clone, Serialize)]
pub struct OrphanEntry {
    pub file: PathBuf,
    pub loc: u32,
}

pub fn is_entry_file(path: &Path, entry_patterns: &[String]) -> bool {
    let path_str = path.to_string_lossy().replace('\\', "/");
    entry_patterns
        .iter()
        .any(|p| path_str.contains(p.as_str()) || path_str.ends_with(p.as_str()))
}

/// Find orphaned files in the graph. Potential is the graph's node count.
pub fn detect_orphaned(
    graph: &DepGraph,
    entry_patterns: &[String],
    barrel_names: &HashSet<String>,
) -> (Vec<OrphanEntry>, usize) {
    let mut entries = Vec::new();

    for (file, node) in graph.iter() {
        if node.importer_count > 0 {
            continue;
        }
        if is_entry_file(file, entry_patterns) {
            continue;
        }
        let stem = file
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default();
        if barrel_names.contains(&stem) {
            continue;
        }

        let loc = match std::fs::read_to_string(file) {
            Ok(content) => content.lines().count() as u32,
            Err(err) => {
                debug!(file = %file.display(), %err, "unreadable orphan candidate");
                0
            }
        };
        entries.push(OrphanEntry {
            file: file.clone(),
            loc,
        });
    }

    entries.sort_by(|a, b| b.loc.cmp(&a.loc).then_with(|| a.file.cmp(&b.file)));
    (entries, graph.len())
}
