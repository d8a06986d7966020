//! File-level dependency graph
//!
//! Nodes are resolved file paths; edges are source-level import
//! relationships between files in the same module. Edge sets are ordered
//! (`BTreeSet`) so the finalized graph is byte-identical across runs for the
//! same inputs. Cycle detection runs Tarjan's SCC algorithm via petgraph in
//! O(V+E) and reports every strongly-connected group of size > 1.

use petgraph::algo::tarjan_scc;
use petgraph::graph::DiGraph;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use tracing::debug;

/// One file's edges and precomputed degree counts
#[derive(Debug, Clone, Default, Serialize)]
pub struct DepNode {
    pub imports: BTreeSet<PathBuf>,
    pub importers: BTreeSet<PathBuf>,
    pub import_count: usize,
    pub importer_count: usize,
}

/// Dependency graph: resolved file path → node.
///
/// Built fresh per scan and not mutated afterwards; the phase orchestrator
/// caches one instance per run.
#[derive(Debug, Clone, Default)]
pub struct DepGraph {
    nodes: BTreeMap<PathBuf, DepNode>,
}

impl DepGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ensure a node exists for `file`.
    pub fn add_node(&mut self, file: impl Into<PathBuf>) {
        self.nodes.entry(file.into()).or_default();
    }

    /// Record that `source` imports `target`. Self-imports are ignored.
    /// Both endpoints must already be nodes (local files only — callers drop
    /// external imports before reaching here).
    pub fn add_edge(&mut self, source: &Path, target: &Path) {
        if source == target {
            return;
        }
        if !self.nodes.contains_key(source) || !self.nodes.contains_key(target) {
            return;
        }
        if let Some(node) = self.nodes.get_mut(source) {
            node.imports.insert(target.to_path_buf());
        }
        if let Some(node) = self.nodes.get_mut(target) {
            node.importers.insert(source.to_path_buf());
        }
    }

    /// Precompute import/importer counts from the edge sets.
    pub fn finalize(&mut self) {
        for node in self.nodes.values_mut() {
            node.import_count = node.imports.len();
            node.importer_count = node.importers.len();
        }
    }

    pub fn get(&self, file: &Path) -> Option<&DepNode> {
        self.nodes.get(file)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&PathBuf, &DepNode)> {
        self.nodes.iter()
    }

    pub fn files(&self) -> impl Iterator<Item = &PathBuf> {
        self.nodes.keys()
    }
}

/// One import cycle: the files in the strongly-connected group
#[derive(Debug, Clone, Serialize)]
pub struct Cycle {
    pub files: Vec<PathBuf>,
    pub length: usize,
}

/// Find import cycles: strongly-connected components of size > 1.
///
/// Each cycle's file list is rotated to start at the lexicographically
/// smallest path so output is stable across runs.
pub fn detect_cycles(graph: &DepGraph) -> Vec<Cycle> {
    let files: Vec<&PathBuf> = graph.files().collect();
    let mut index_of: HashMap<&PathBuf, usize> = HashMap::new();
    for (idx, file) in files.iter().enumerate() {
        index_of.insert(file, idx);
    }

    let mut digraph: DiGraph<(), ()> = DiGraph::new();
    let node_indices: Vec<_> = files.iter().map(|_| digraph.add_node(())).collect();

    for (file, node) in graph.iter() {
        let src = index_of[&file];
        for target in &node.imports {
            if let Some(&dst) = index_of.get(target) {
                digraph.add_edge(node_indices[src], node_indices[dst], ());
            }
        }
    }

    let sccs = tarjan_scc(&digraph);
    debug!(components = sccs.len(), "ran SCC over dependency graph");

    let mut cycles: Vec<Cycle> = sccs
        .into_iter()
        .filter(|scc| scc.len() > 1)
        .map(|scc| {
            let mut members: Vec<PathBuf> =
                scc.into_iter().map(|idx| files[idx.index()].clone()).collect();
            members.sort();
            let length = members.len();
            Cycle { files: members, length }
        })
        .collect();

    cycles.sort_by(|a, b| b.length.cmp(&a.length).then_with(|| a.files.cmp(&b.files)));
    cycles
}

#[cfg(test)]
mod tests {
    use super::*;

    fn graph_from_edges(edges: &[(&str, &str)]) -> DepGraph {
        let mut graph = DepGraph::new();
        for (src, dst) in edges {
            graph.add_node(*src);
            graph.add_node(*dst);
        }
        for (src, dst) in edges {
            graph.add_edge(Path::new(src), Path::new(dst));
        }
        graph.finalize();
        graph
    }

    #[test]
    fn test_counts_match_edge_sets() {
        let graph = graph_from_edges(&[("a.go", "b.go"), ("a.go", "c.go"), ("b.go", "c.go")]);
        let a = graph.get(Path::new("a.go")).unwrap();
        assert_eq!(a.import_count, a.imports.len());
        assert_eq!(a.import_count, 2);
        let c = graph.get(Path::new("c.go")).unwrap();
        assert_eq!(c.importer_count, 2);
        assert_eq!(c.import_count, 0);
    }

    #[test]
    fn test_self_import_excluded() {
        let graph = graph_from_edges(&[("a.go", "a.go")]);
        let a = graph.get(Path::new("a.go")).unwrap();
        assert_eq!(a.import_count, 0);
        assert_eq!(a.importer_count, 0);
    }

    #[test]
    fn test_two_file_cycle_reported_once() {
        let graph = graph_from_edges(&[("a.go", "b.go"), ("b.go", "a.go")]);
        let cycles = detect_cycles(&graph);
        assert_eq!(cycles.len(), 1);
        assert_eq!(cycles[0].length, 2);
    }

    #[test]
    fn test_linear_chain_has_no_cycles() {
        let graph = graph_from_edges(&[("a.go", "b.go"), ("b.go", "c.go")]);
        assert!(detect_cycles(&graph).is_empty());
    }

    #[test]
    fn test_cycle_excludes_outside_edges() {
        // d points into the a-b-c cycle but is not part of it
        let graph = graph_from_edges(&[
            ("a.go", "b.go"),
            ("b.go", "c.go"),
            ("c.go", "a.go"),
            ("d.go", "a.go"),
        ]);
        let cycles = detect_cycles(&graph);
        assert_eq!(cycles.len(), 1);
        assert_eq!(cycles[0].length, 3);
        assert!(!cycles[0].files.contains(&PathBuf::from("d.go")));
    }
}
