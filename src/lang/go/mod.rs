//! Go language support: full detector, phase, and fixer wiring.

pub mod complexity;
pub mod deps;
pub mod extract;
pub mod smells;
pub mod unused;

use crate::detectors::complexity::detect_complexity;
use crate::detectors::coverage::detect_coverage_gaps;
use crate::detectors::dupes::{detect_duplicates, DupeKind};
use crate::detectors::facade::detect_facades;
use crate::detectors::gods::{detect_gods, go_god_rules};
use crate::detectors::large::detect_large;
use crate::detectors::orphaned::detect_orphaned;
use crate::detectors::single_use::detect_single_use;
use crate::detectors::smells::entries_to_findings;
use crate::fixers::{self, Fixer};
use crate::graph::detect_cycles;
use crate::models::{Confidence, Finding, Potentials};
use crate::phases::{Phase, ScanContext};
use crate::zones::{Zone, ZoneRule};
use anyhow::Result;
use std::collections::{BTreeMap, HashSet};
use std::path::PathBuf;

/// Near-duplicate similarity cutoff for function bodies
const DUPE_THRESHOLD: f64 = 0.8;

/// Import cycles spanning more than this many files are top-tier.
const LARGE_CYCLE: usize = 3;

/// Go-specific zone rules. Common rules and overlay additions are appended
/// by the scan context.
pub fn zone_rules() -> Vec<ZoneRule> {
    vec![
        ZoneRule::new(Zone::Generated, &[".pb.go", "_pb2.go", "_string.go"]),
        ZoneRule::new(Zone::Test, &["_test.go", "/testdata/", "/testutil/"]),
        ZoneRule::new(Zone::Config, &["go.mod", "go.sum"]),
    ]
}

pub fn phases() -> Vec<Phase> {
    vec![
        Phase {
            label: "Unused (go vet)",
            slow: false,
            run: phase_unused,
        },
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
        Phase {
            label: "Duplicate functions",
            slow: true,
            run: phase_dupes,
        },
        Phase {
            label: "Coupling analysis",
            slow: false,
            run: phase_coupling,
        },
        Phase {
            label: "Dependency hygiene",
            slow: false,
            run: phase_deps,
        },
        Phase {
            label: "Test coverage",
            slow: false,
            run: phase_coverage,
        },
    ]
}

pub fn fixers() -> Vec<Fixer> {
    vec![
        Fixer {
            name: "error-strings",
            label: "Lowercase error strings, strip trailing periods",
            category: "error_string_format",
            verb: "normalize",
            verb_past: "normalized",
            detect: fixers::error_strings::detect_error_strings,
            fix: fixers::error_strings::fix_error_strings,
        },
        Fixer {
            name: "error-wrap",
            label: "Wrap bare error returns with fmt.Errorf",
            category: "bare_error_return",
            verb: "wrap",
            verb_past: "wrapped",
            detect: fixers::error_wrap::detect_bare_errors,
            fix: fixers::error_wrap::fix_error_wrap,
        },
        Fixer {
            name: "regex-hoist",
            label: "Hoist regexp compilation out of loops",
            category: "regex_in_loop",
            verb: "hoist",
            verb_past: "hoisted",
            detect: fixers::regex_hoist::detect_regex_in_loop,
            fix: fixers::regex_hoist::fix_regex_hoist,
        },
        Fixer {
            name: "string-builder",
            label: "Replace loop string concatenation with strings.Builder",
            category: "string_concat_loop",
            verb: "rewrite",
            verb_past: "rewrote",
            detect: fixers::string_builder::detect_string_concat,
            fix: fixers::string_builder::fix_string_builder,
        },
        Fixer {
            name: "mutex-pointer",
            label: "Pass sync.Mutex parameters by pointer",
            category: "mutex_copy",
            verb: "convert",
            verb_past: "converted",
            detect: fixers::mutex_pointer::detect_mutex_copy,
            fix: fixers::mutex_pointer::fix_mutex_pointer,
        },
    ]
}

fn phase_unused(ctx: &ScanContext) -> Result<(Vec<Finding>, Potentials)> {
    let (entries, total) = unused::detect_unused(&ctx.root, "all", &ctx.exclusions());

    let findings = entries
        .into_iter()
        .map(|e| {
            let (summary, confidence) = match e.category.as_str() {
                "unused_import" => (format!("unused import {}", e.name), Confidence::High),
                "unused_var" => (format!("unused variable {}", e.name), Confidence::High),
                "ignored_error" => (format!("ignored error: {}", e.name), Confidence::Medium),
                _ => (e.name.clone(), Confidence::Medium),
            };
            Finding::new("unused", e.file.clone(), summary)
                .with_name(e.name.clone())
                .with_tier(3)
                .with_confidence(confidence)
                .with_detail(serde_json::json!({
                    "line": e.line,
                    "kind": e.category,
                }))
        })
        .collect();

    Ok((findings, Potentials::from([("unused".to_string(), total)])))
}

/// Large-file, complexity, and god-struct signals collapse into one finding
/// per file so a 2000-line tangle is reported once, with everything wrong
/// about it listed together.
fn phase_structural(ctx: &ScanContext) -> Result<(Vec<Finding>, Potentials)> {
    let rules = ctx.zone_rules();
    let files = ctx.source_files();
    let production = ctx.production_files();

    let (large, _) = detect_large(&files, &rules, ctx.overrides.thresholds.large_file);
    let (complex, _) = detect_complexity(
        &production,
        &complexity::go_complexity_signals(),
        ctx.overrides.thresholds.complexity,
    );
    let structs: Vec<_> = production.iter().flat_map(|f| extract::extract_structs(f)).collect();
    let (gods, _) = detect_gods(&structs, &go_god_rules());

    // A single function past the monster cap is a structural problem even
    // when the file as a whole stays under the other thresholds.
    let monster = ctx.overrides.thresholds.monster_function;
    let monsters: Vec<_> = production
        .iter()
        .flat_map(|f| extract::extract_functions(f))
        .filter(|func| func.loc > monster)
        .collect();

    let mut per_file: BTreeMap<PathBuf, (Vec<String>, u8)> = BTreeMap::new();
    for entry in large {
        let slot = per_file.entry(entry.file).or_insert((Vec::new(), 2));
        slot.0.push(format!(
            "{} lines (max {})",
            entry.loc, ctx.overrides.thresholds.large_file
        ));
    }
    for entry in complex {
        let slot = per_file.entry(entry.file).or_insert((Vec::new(), 2));
        slot.0.push(format!("complexity {}", entry.score));
        slot.0.extend(entry.signals);
    }
    for entry in gods {
        let slot = per_file.entry(entry.file).or_insert((Vec::new(), 2));
        slot.0.push(format!(
            "god struct {}: {}",
            entry.name,
            entry.reasons.join(", ")
        ));
        slot.1 = 1;
    }
    for func in monsters {
        let slot = per_file.entry(func.file).or_insert((Vec::new(), 2));
        slot.0.push(format!(
            "monster function {} ({} lines, max {monster})",
            func.name, func.loc
        ));
    }

    let findings = per_file
        .into_iter()
        .map(|(file, (signals, tier))| {
            Finding::new("structural", file, signals.join("; "))
                .with_tier(tier)
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

fn phase_dupes(ctx: &ScanContext) -> Result<(Vec<Finding>, Potentials)> {
    let functions: Vec<_> = ctx
        .production_files()
        .iter()
        .flat_map(|f| extract::extract_functions(f))
        .collect();
    let (entries, total) = detect_duplicates(&functions, DUPE_THRESHOLD);

    let mut findings = Vec::new();
    for entry in entries {
        let confidence = match entry.kind {
            DupeKind::Exact => Confidence::High,
            DupeKind::Near => Confidence::Medium,
        };
        let summary = format!(
            "{} duplicates {} ({:.0}%)",
            entry.fn_a.name,
            entry.fn_b.name,
            entry.similarity * 100.0
        );
        findings.push(
            Finding::new("dupes", entry.fn_a.file.clone(), summary)
                .with_name(entry.fn_a.name.clone())
                .with_tier(2)
                .with_confidence(confidence)
                .with_detail(serde_json::to_value(&entry)?),
        );
    }

    Ok((findings, Potentials::from([("dupes".to_string(), total)])))
}

fn phase_coupling(ctx: &ScanContext) -> Result<(Vec<Finding>, Potentials)> {
    let graph = ctx.dep_graph();

    let mut skip = ctx.overrides.entry_patterns.clone();
    skip.extend(ctx.lang.single_use_skip_dirs.iter().map(|s| s.to_string()));
    let (singles, graph_total) = detect_single_use(graph, &skip);

    let mut findings: Vec<Finding> = singles
        .into_iter()
        .map(|e| {
            Finding::new(
                "single_use",
                e.file.clone(),
                format!("only imported by {}", e.importer.display()),
            )
            .with_tier(3)
            .with_confidence(Confidence::Low)
            .with_detail(serde_json::json!({ "importer": e.importer }))
        })
        .collect();

    let production = ctx.production_files();
    let (facades, scanned) = detect_facades(&production);
    findings.extend(facades.into_iter().map(|e| {
        Finding::new(
            "facade",
            e.file.clone(),
            format!("pure facade with {} re-exports", e.reexports),
        )
        .with_tier(3)
        .with_detail(serde_json::json!({ "reexports": e.reexports }))
    }));

    Ok((
        findings,
        Potentials::from([
            ("single_use".to_string(), graph_total),
            ("facade".to_string(), scanned),
        ]),
    ))
}

fn phase_deps(ctx: &ScanContext) -> Result<(Vec<Finding>, Potentials)> {
    let graph = ctx.dep_graph();
    let mut findings = Vec::new();

    for cycle in detect_cycles(graph) {
        let tier = if cycle.length > LARGE_CYCLE { 1 } else { 2 };
        findings.push(
            Finding::new(
                "cycles",
                cycle.files[0].clone(),
                format!("import cycle of {} files", cycle.length),
            )
            .with_tier(tier)
            .with_confidence(Confidence::High)
            .with_detail(serde_json::to_value(&cycle)?),
        );
    }

    let barrels: HashSet<String> = ctx
        .lang
        .barrel_names
        .iter()
        .map(|s| s.to_string())
        .collect();
    let (orphans, _) = detect_orphaned(graph, &ctx.overrides.entry_patterns, &barrels);
    findings.extend(orphans.into_iter().map(|e| {
        Finding::new(
            "orphaned",
            e.file.clone(),
            format!("never imported ({} lines)", e.loc),
        )
        .with_tier(3)
        .with_detail(serde_json::json!({ "loc": e.loc }))
    }));

    Ok((
        findings,
        Potentials::from([
            ("cycles".to_string(), graph.len()),
            ("orphaned".to_string(), graph.len()),
        ]),
    ))
}

fn phase_coverage(ctx: &ScanContext) -> Result<(Vec<Finding>, Potentials)> {
    let rules = ctx.zone_rules();
    let files = ctx.source_files();
    let (entries, production) = detect_coverage_gaps(&files, &rules, ctx.lang.test_suffix);

    let findings = entries
        .into_iter()
        .map(|e| {
            Finding::new(
                "coverage",
                e.file.clone(),
                format!("{} lines, no tests in directory", e.loc),
            )
            .with_tier(3)
            .with_confidence(Confidence::Low)
            .with_detail(serde_json::json!({ "loc": e.loc }))
        })
        .collect();

    Ok((
        findings,
        Potentials::from([("coverage".to_string(), production)]),
    ))
}
