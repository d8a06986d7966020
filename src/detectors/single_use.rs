//! Single-use abstraction detection
//!
//! A file imported by exactly one consumer is unnecessary indirection more
//! often than not. Entry-pattern files (commands, handlers, generated code)
//! are skipped regardless of use count.

use crate::detectors::orphaned::is_entry_file;
use crate::graph::DepGraph;
use serde::Serialize;
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize)]
pub struct SingleUseEntry {
    pub file: PathBuf,
    /// The one consumer
    pub importer: PathBuf,
}

/// Find files with exactly one importer. Potential is the graph's node
/// count.
pub fn detect_single_use(graph: &DepGraph, entry_patterns: &[String]) -> (Vec<SingleUseEntry>, usize) {
    let mut entries = Vec::new();

    for (file, node) in graph.iter() {
        if node.importer_count != 1 {
            continue;
        }
        if is_entry_file(file, entry_patterns) {
            continue;
        }
        let importer = node
            .importers
            .iter()
            .next()
            .cloned()
            .unwrap_or_default();
        entries.push(SingleUseEntry {
            file: file.clone(),
            importer,
        });
    }

    (entries, graph.len())
}
