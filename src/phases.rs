//! Phase orchestration
//!
//! A scan is a fixed sequence of phases supplied by the language config.
//! Phases run strictly sequentially; each returns its findings plus the
//! scoring denominators for its categories. A failing phase logs a warning
//! and contributes nothing, so one broken tool never aborts the scan.

use crate::config::{load_overrides, LangOverrides};
use crate::discovery::find_source_files;
use crate::graph::DepGraph;
use crate::lang::LangConfig;
use crate::models::{merge_potentials, Finding, Potentials};
use crate::zones::{classify, common_zone_rules, Zone, ZoneRule};
use anyhow::Result;
use std::cell::OnceCell;
use std::path::PathBuf;
use tracing::{debug, info, warn};

/// One named step of a scan.
pub struct Phase {
    pub label: &'static str,
    /// Slow phases are skipped under `--skip-slow`
    pub slow: bool,
    pub run: fn(&ScanContext) -> Result<(Vec<Finding>, Potentials)>,
}

/// Everything a phase needs: the scan root, the language record, the merged
/// config overlay, and a lazily-built dependency graph. The graph is built
/// by the first phase that asks for it and only read afterwards; phases are
/// single-threaded so a plain `OnceCell` suffices.
pub struct ScanContext {
    pub root: PathBuf,
    pub lang: &'static LangConfig,
    pub overrides: LangOverrides,
    dep_graph: OnceCell<DepGraph>,
}

impl ScanContext {
    pub fn new(root: impl Into<PathBuf>, lang: &'static LangConfig) -> Self {
        let root = root.into();
        let overrides = load_overrides(&root, lang.name);
        Self {
            root,
            lang,
            overrides,
            dep_graph: OnceCell::new(),
        }
    }

    /// Context with extra exclusion patterns appended, for CLI `--exclude`.
    pub fn with_exclusions(mut self, extra: &[String]) -> Self {
        for pattern in extra {
            if !self.overrides.exclusions.contains(pattern) {
                self.overrides.exclusions.push(pattern.clone());
            }
        }
        self
    }

    pub fn exclusions(&self) -> Vec<&str> {
        self.overrides
            .exclusions
            .iter()
            .map(String::as_str)
            .collect()
    }

    /// Ordered zone rules: language rules, then overlay additions, then the
    /// rules common to every language.
    pub fn zone_rules(&self) -> Vec<ZoneRule> {
        let mut rules = (self.lang.zone_rules)();
        for (name, patterns) in &self.overrides.zone_patterns {
            let Some(zone) = Zone::from_name(name) else {
                debug!(zone = %name, "ignoring unknown zone in overlay");
                continue;
            };
            let refs: Vec<&str> = patterns.iter().map(String::as_str).collect();
            rules.push(ZoneRule::new(zone, &refs));
        }
        rules.extend(common_zone_rules());
        rules
    }

    pub fn source_files(&self) -> Vec<PathBuf> {
        find_source_files(&self.root, self.lang.extensions, &self.exclusions())
    }

    pub fn production_files(&self) -> Vec<PathBuf> {
        let rules = self.zone_rules();
        self.source_files()
            .into_iter()
            .filter(|f| classify(f, &rules) == Zone::Production)
            .collect()
    }

    pub fn dep_graph(&self) -> &DepGraph {
        self.dep_graph
            .get_or_init(|| (self.lang.build_dep_graph)(&self.root))
    }
}

/// Run every phase in order, concatenating findings and summing potentials.
pub fn run_phases(ctx: &ScanContext, skip_slow: bool) -> (Vec<Finding>, Potentials) {
    let mut findings = Vec::new();
    let mut potentials = Potentials::new();

    for phase in (ctx.lang.phases)() {
        if skip_slow && phase.slow {
            debug!(phase = phase.label, "skipping slow phase");
            continue;
        }
        info!(phase = phase.label, "running phase");
        match (phase.run)(ctx) {
            Ok((phase_findings, phase_potentials)) => {
                debug!(
                    phase = phase.label,
                    findings = phase_findings.len(),
                    "phase complete"
                );
                findings.extend(phase_findings);
                merge_potentials(&mut potentials, phase_potentials);
            }
            Err(err) => warn!(phase = phase.label, %err, "phase failed, continuing"),
        }
    }

    (findings, potentials)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::discovery::clear_cache;
    use crate::lang::get_lang;
    use std::fs;

    fn go_tree() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("go.mod"), "module example.com/app\n").unwrap();
        fs::write(
            dir.path().join("main.go"),
            "package main\n\nimport \"example.com/app/util\"\n\nfunc main() {\n\tutil.Greet()\n}\n",
        )
        .unwrap();
        fs::create_dir(dir.path().join("util")).unwrap();
        fs::write(
            dir.path().join("util/util.go"),
            "package util\n\nimport \"fmt\"\n\nfunc Greet() {\n\tfmt.Println(\"hi\")\n}\n",
        )
        .unwrap();
        dir
    }

    #[test]
    fn test_scan_context_builds_graph_once() {
        let dir = go_tree();
        clear_cache();
        let ctx = ScanContext::new(dir.path(), get_lang("go").unwrap());
        let first = ctx.dep_graph() as *const DepGraph;
        let second = ctx.dep_graph() as *const DepGraph;
        assert_eq!(first, second);
        assert_eq!(ctx.dep_graph().len(), 2);
    }

    #[test]
    fn test_extra_exclusions_are_appended_once() {
        let dir = go_tree();
        let ctx = ScanContext::new(dir.path(), get_lang("go").unwrap())
            .with_exclusions(&["thirdparty".to_string(), "vendor".to_string()]);
        let exclusions = ctx.exclusions();
        assert!(exclusions.contains(&"thirdparty"));
        assert_eq!(exclusions.iter().filter(|e| **e == "vendor").count(), 1);
    }

    #[test]
    fn test_zone_rules_include_overlay_and_common() {
        let dir = go_tree();
        fs::create_dir(dir.path().join(".descruft")).unwrap();
        fs::write(
            dir.path().join(".descruft/go.yaml"),
            "zones:\n  generated: [\"_wire.go\"]\n",
        )
        .unwrap();

        let ctx = ScanContext::new(dir.path(), get_lang("go").unwrap());
        let rules = ctx.zone_rules();
        assert_eq!(
            classify(std::path::Path::new("pkg/di_wire.go"), &rules),
            Zone::Generated
        );
        // common rules still apply after language and overlay rules
        assert_eq!(
            classify(std::path::Path::new("a/tests/fixture.go"), &rules),
            Zone::Test
        );
    }

    #[test]
    fn test_run_phases_skips_slow_when_asked() {
        let dir = go_tree();
        clear_cache();
        let ctx = ScanContext::new(dir.path(), get_lang("go").unwrap());
        // Both calls must complete; the skip-slow pass omits duplicate analysis.
        let (_, with_slow) = run_phases(&ctx, false);
        let (_, without_slow) = run_phases(&ctx, true);
        assert!(with_slow.contains_key("dupes"));
        assert!(!without_slow.contains_key("dupes"));
    }

    #[test]
    fn test_run_phases_merges_potentials() {
        let dir = go_tree();
        clear_cache();
        let ctx = ScanContext::new(dir.path(), get_lang("go").unwrap());
        let (_, potentials) = run_phases(&ctx, true);
        assert!(potentials.get("smells").copied().unwrap_or(0) >= 2);
        assert!(potentials.contains_key("structural"));
    }
}
