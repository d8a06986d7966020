//! Language registry
//!
//! Each supported language contributes one static configuration record:
//! file extensions, zone rules, a dependency-graph builder, declaration
//! extractors, the phase list the scanner runs, and the fixer table. The
//! registry is a fixed mapping from a language tag to that record; adding a
//! language means adding one `LangConfig` value here, nothing dynamic.
//!
//! Exclusions, entry patterns, and thresholds are not part of the record:
//! they live in the merged config overlay ([`crate::config::load_overrides`]),
//! seeded from the embedded per-language defaults.

pub mod go;
pub mod python;

use crate::fixers::Fixer;
use crate::graph::DepGraph;
use crate::models::{FunctionInfo, StructInfo};
use crate::phases::Phase;
use crate::zones::ZoneRule;
use std::path::{Path, PathBuf};

/// Declarative configuration for one language.
#[derive(Debug)]
pub struct LangConfig {
    pub name: &'static str,
    /// Filename suffixes that count as source files
    pub extensions: &'static [&'static str],
    /// Suffix that marks a test file, e.g. `_test.go`
    pub test_suffix: &'static str,
    /// File stems that exist to aggregate re-exports; never orphans
    pub barrel_names: &'static [&'static str],
    /// Path fragments exempt from the single-importer check
    pub single_use_skip_dirs: &'static [&'static str],
    /// Language-specific zone rules; common rules are appended by the
    /// orchestrator after these and the overlay's additions
    pub zone_rules: fn() -> Vec<ZoneRule>,
    pub build_dep_graph: fn(&Path) -> DepGraph,
    pub extract_functions: Option<fn(&Path) -> Vec<FunctionInfo>>,
    pub extract_structs: Option<fn(&Path) -> Vec<StructInfo>>,
    pub phases: fn() -> Vec<Phase>,
    pub fixers: fn() -> Vec<Fixer>,
}

static GO: LangConfig = LangConfig {
    name: "go",
    extensions: &[".go"],
    test_suffix: "_test.go",
    barrel_names: &["doc"],
    single_use_skip_dirs: &["/cmd/", "/internal/cli/"],
    zone_rules: go::zone_rules,
    build_dep_graph: go::deps::build_dep_graph,
    extract_functions: Some(go::extract::extract_functions),
    extract_structs: Some(go::extract::extract_structs),
    phases: go::phases,
    fixers: go::fixers,
};

static PYTHON: LangConfig = LangConfig {
    name: "python",
    extensions: &[".py"],
    test_suffix: "_test.py",
    barrel_names: &["__init__"],
    single_use_skip_dirs: &["/scripts/", "/bin/"],
    zone_rules: python::zone_rules,
    build_dep_graph: python::build_dep_graph,
    extract_functions: None,
    extract_structs: None,
    phases: python::phases,
    fixers: python::fixers,
};

/// Look up a language by tag.
pub fn get_lang(name: &str) -> Option<&'static LangConfig> {
    match name {
        "go" => Some(&GO),
        "python" => Some(&PYTHON),
        _ => None,
    }
}

pub fn available_langs() -> &'static [&'static str] {
    &["go", "python"]
}

/// Pick a language by which one owns more files. Used when the CLI is
/// invoked without `--lang`.
pub fn infer_lang(counts: &[(&'static str, Vec<PathBuf>)]) -> Option<&'static str> {
    counts
        .iter()
        .filter(|(_, files)| !files.is_empty())
        .max_by_key(|(_, files)| files.len())
        .map(|(name, _)| *name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_lookup() {
        assert!(get_lang("go").is_some());
        assert!(get_lang("python").is_some());
        assert!(get_lang("cobol").is_none());
    }

    #[test]
    fn test_lang_config_is_debuggable() {
        // Error paths format the record (e.g. unwrap_err in CLI tests).
        let rendered = format!("{:?}", get_lang("go").unwrap());
        assert!(rendered.contains("\"go\""));
    }

    #[test]
    fn test_go_config_is_fully_wired() {
        let go = get_lang("go").unwrap();
        assert_eq!(go.extensions, &[".go"]);
        assert!(go.extract_functions.is_some());
        assert!(go.extract_structs.is_some());
        assert!(!(go.phases)().is_empty());
        assert!(!(go.fixers)().is_empty());
    }

    #[test]
    fn test_python_config_is_partial() {
        let py = get_lang("python").unwrap();
        assert!(py.extract_functions.is_none());
        assert!((py.fixers)().is_empty());
        assert!(!(py.phases)().is_empty());
    }

    #[test]
    fn test_infer_lang_prefers_majority() {
        let counts = vec![
            ("go", vec![PathBuf::from("a.go")]),
            (
                "python",
                vec![PathBuf::from("a.py"), PathBuf::from("b.py")],
            ),
        ];
        assert_eq!(infer_lang(&counts), Some("python"));

        let empty: Vec<(&'static str, Vec<PathBuf>)> = vec![
            ("go", Vec::new()),
            ("python", Vec::new()),
        ];
        assert_eq!(infer_lang(&empty), None);
    }
}
