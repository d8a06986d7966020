//! Go dependency graph builder
//!
//! Parses import statements, resolves local (intra-module) packages to the
//! files that make them up, and produces the file-level [`DepGraph`].
//! External imports are dropped during resolution and never become nodes.

use crate::discovery::find_source_files;
use crate::graph::DepGraph;
use regex::Regex;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing::debug;

/// Single-line imports: `import "pkg"` or `import alias "pkg"`.
/// The alias can be an identifier, a dot, or an underscore.
fn single_import_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"(?m)^\s*import\s+(?:[\w.]+\s+)?"([^"]+)""#).expect("valid regex"))
}

/// Grouped import blocks: `import ( ... )`.
fn group_import_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)import\s*\((.*?)\)").expect("valid regex"))
}

/// Individual import lines within a group (with optional alias).
fn import_line_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"(?:[\w.]+\s+)?"([^"]+)""#).expect("valid regex"))
}

fn module_decl_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?m)^module\s+(\S+)").expect("valid regex"))
}

/// Parse go.mod to get the module path.
///
/// Searches `path` and its parents for a go.mod file. Returns `None` when no
/// manifest exists — local imports then stay unresolved and the graph has
/// isolated nodes only, which is reduced resolution rather than an error.
pub fn parse_module_path(path: &Path) -> Option<String> {
    let mut candidate = path.join("go.mod");
    if !candidate.exists() {
        let mut found = None;
        for parent in path.ancestors().skip(1) {
            let go_mod = parent.join("go.mod");
            if go_mod.exists() {
                found = Some(go_mod);
                break;
            }
        }
        candidate = found?;
    }

    let content = std::fs::read_to_string(&candidate).ok()?;
    module_decl_re()
        .captures(&content)
        .map(|cap| cap[1].to_string())
}

/// Extract import paths from Go source text.
///
/// Handles bare imports, aliased imports, and grouped blocks. Grouped-block
/// spans are recorded so the single-import scan never double-counts an
/// import that sits inside a block.
pub fn extract_imports(content: &str) -> Vec<String> {
    let mut imports = Vec::new();

    let mut group_spans: Vec<(usize, usize)> = Vec::new();
    for group in group_import_re().captures_iter(content) {
        let whole = group.get(0).expect("group 0");
        group_spans.push((whole.start(), whole.end()));
        let block = &group[1];
        for line in import_line_re().captures_iter(block) {
            imports.push(line[1].to_string());
        }
    }

    for single in single_import_re().captures_iter(content) {
        let start = single.get(0).expect("group 0").start();
        let in_group = group_spans.iter().any(|&(gs, ge)| gs <= start && start < ge);
        if !in_group {
            imports.push(single[1].to_string());
        }
    }

    imports
}

/// Find all non-test .go files, excluding vendor/ and testdata/.
fn find_go_source_files(path: &Path) -> Vec<PathBuf> {
    find_source_files(path, &[".go"], &["vendor", "testdata"])
        .into_iter()
        .filter(|f| !f.to_string_lossy().ends_with("_test.go"))
        .collect()
}

/// Build the Go dependency graph under `path`.
///
/// Parses go.mod for the module path, discovers all .go files, extracts
/// import statements, and resolves intra-module imports to file edges.
/// Unreadable files are skipped; the build itself never fails.
pub fn build_dep_graph(path: &Path) -> DepGraph {
    let root = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
    let module_path = parse_module_path(&root);
    let files = find_go_source_files(&root);

    // Map package import paths to their source files.
    let mut pkg_to_files: HashMap<String, Vec<PathBuf>> = HashMap::new();
    for file in &files {
        let dir = file.parent().unwrap_or(&root);
        let rel_dir = dir.strip_prefix(&root).unwrap_or(dir);
        let rel_str = rel_dir.to_string_lossy().replace('\\', "/");

        let pkg_path = match &module_path {
            Some(module) if rel_str.is_empty() => module.clone(),
            Some(module) => format!("{module}/{rel_str}"),
            None => rel_str,
        };

        pkg_to_files.entry(pkg_path).or_default().push(file.clone());
    }

    let mut graph = DepGraph::new();
    for file in &files {
        graph.add_node(file.clone());
    }

    for file in &files {
        let content = match std::fs::read_to_string(file) {
            Ok(c) => c,
            Err(err) => {
                debug!(file = %file.display(), %err, "skipping unreadable file");
                continue;
            }
        };

        for import in extract_imports(&content) {
            // Only imports naming a known local package become edges.
            if let Some(targets) = pkg_to_files.get(&import) {
                for target in targets {
                    graph.add_edge(file, target);
                }
            }
        }
    }

    graph.finalize();
    debug!(files = graph.len(), module = ?module_path, "built Go dependency graph");
    graph
}
