//! Python language support: a second registry entry with structural and
//! smell coverage. No declaration extractors, dependency graph, or fixers
//! yet, so the phases that need those are not registered.

pub mod complexity;
pub mod smells;

use crate::detectors::complexity::detect_complexity;
use crate::detectors::large::detect_large;
use crate::detectors::smells::entries_to_findings;
use crate::fixers::Fixer;
use crate::graph::DepGraph;
use crate::models::{Finding, Potentials};
use crate::phases::{Phase, ScanContext};
use crate::zones::{Zone, ZoneRule};
use anyhow::Result;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

pub fn zone_rules() -> Vec<ZoneRule> {
    vec![
        ZoneRule::new(Zone::Generated, &["_pb2.py"]),
        ZoneRule::new(Zone::Test, &["_test.py", "/test_", "conftest.py"]),
        ZoneRule::new(Zone::Config, &["setup.py", "setup.cfg"]),
    ]
}

/// Python import resolution is not implemented; graph-backed phases are not
/// registered, and anything handed this graph sees an empty one.
pub fn build_dep_graph(_path: &Path) -> DepGraph {
    DepGraph::new()
}

pub fn phases() -> Vec<Phase> {
    vec![
        Phase {
            label: "Structural analysis",
            slow: false,
            run: phase_structural,
        },
        Phase {
            label: "Code smells",
            slow: false,
            run: phase_smells,
        },
    ]
}

pub fn fixers() -> Vec<Fixer> {
    Vec::new()
}

fn phase_structural(ctx: &ScanContext) -> Result<(Vec<Finding>, Potentials)> {
    let rules = ctx.zone_rules();
    let files = ctx.source_files();
    let production = ctx.production_files();

    let (large, _) = detect_large(&files, &rules, ctx.overrides.thresholds.large_file);
    let (complex, _) = detect_complexity(
        &production,
        &complexity::python_complexity_signals(),
        ctx.overrides.thresholds.complexity,
    );

    let mut per_file: BTreeMap<PathBuf, Vec<String>> = BTreeMap::new();
    for entry in large {
        per_file.entry(entry.file).or_default().push(format!(
            "{} lines (max {})",
            entry.loc, ctx.overrides.thresholds.large_file
        ));
    }
    for entry in complex {
        let slot = per_file.entry(entry.file).or_default();
        slot.push(format!("complexity {}", entry.score));
        slot.extend(entry.signals);
    }

    let findings = per_file
        .into_iter()
        .map(|(file, signals)| {
            Finding::new("structural", file, signals.join("; "))
                .with_detail(serde_json::json!({ "signals": signals }))
        })
        .collect();

    Ok((
        findings,
        Potentials::from([("structural".to_string(), production.len())]),
    ))
}

fn phase_smells(ctx: &ScanContext) -> Result<(Vec<Finding>, Potentials)> {
    let (entries, files_checked) = smells::detect_smells(&ctx.root, &ctx.exclusions());
    Ok((
        entries_to_findings(&entries),
        Potentials::from([("smells".to_string(), files_checked)]),
    ))
}
