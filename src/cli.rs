//! CLI command definitions and handlers
//!
//! Thin presentation glue: argument parsing, language resolution, and
//! rendering. All analysis lives in the library layers.

use crate::discovery::find_source_files;
use crate::fixers::{FixEntry, Fixer};
use crate::lang::{available_langs, get_lang, infer_lang, LangConfig};
use crate::models::{Finding, Potentials};
use crate::phases::{run_phases, ScanContext};
use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use console::style;
use std::path::PathBuf;

/// descruft - find and scrape off code cruft
#[derive(Parser, Debug)]
#[command(name = "descruft")]
#[command(
    version,
    about = "Detect code smells, god structs, duplicate functions, and import cycles - and auto-fix the mechanical bits",
    after_help = "\
Examples:
  descruft scan .                      Scan the current directory
  descruft scan . --skip-slow --json   Fast scan, JSON output
  descruft detect smells . --top 10    One detector, ten worst findings
  descruft fix error-strings . --dry-run
  descruft langs                       List supported languages"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run every detector phase and print the findings
    Scan {
        /// Path to the project root
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Language to analyze (inferred from file counts when omitted)
        #[arg(long)]
        lang: Option<String>,

        /// Skip slow phases (duplicate-function analysis)
        #[arg(long)]
        skip_slow: bool,

        /// Emit JSON instead of the text report
        #[arg(long)]
        json: bool,
    },

    /// Run a single detector category
    Detect {
        /// Detector: unused, structural, smells, dupes, single_use, facade,
        /// cycles, orphaned, coverage
        detector: String,

        #[arg(default_value = ".")]
        path: PathBuf,

        #[arg(long)]
        lang: Option<String>,

        #[arg(long)]
        json: bool,

        /// Keep only the first N findings
        #[arg(long)]
        top: Option<usize>,

        /// Override the detector's numeric threshold (large-file LOC or
        /// complexity score)
        #[arg(long)]
        threshold: Option<usize>,

        /// Extra path exclusions, repeatable
        #[arg(long)]
        exclude: Vec<String>,
    },

    /// Detect and apply one auto-fixer
    Fix {
        /// Fixer name as listed by `descruft langs`
        fixer: String,

        #[arg(default_value = ".")]
        path: PathBuf,

        #[arg(long)]
        lang: Option<String>,

        /// Report what would change without writing files
        #[arg(long)]
        dry_run: bool,
    },

    /// List supported languages and their fixers
    Langs,
}

pub fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Scan {
            path,
            lang,
            skip_slow,
            json,
        } => run_scan(&path, lang.as_deref(), skip_slow, json),
        Commands::Detect {
            detector,
            path,
            lang,
            json,
            top,
            threshold,
            exclude,
        } => run_detect(
            &detector,
            &path,
            lang.as_deref(),
            json,
            top,
            threshold,
            &exclude,
        ),
        Commands::Fix {
            fixer,
            path,
            lang,
            dry_run,
        } => run_fix(&fixer, &path, lang.as_deref(), dry_run),
        Commands::Langs => run_langs(),
    }
}

/// Resolve `--lang`, or infer the language owning the most files.
fn resolve_lang(path: &std::path::Path, lang: Option<&str>) -> Result<&'static LangConfig> {
    if let Some(name) = lang {
        return get_lang(name).ok_or_else(|| {
            anyhow::anyhow!(
                "unknown language '{}'. Supported: {}",
                name,
                available_langs().join(", ")
            )
        });
    }

    let counts: Vec<(&'static str, Vec<PathBuf>)> = available_langs()
        .iter()
        .filter_map(|name| {
            let config = get_lang(name)?;
            Some((*name, find_source_files(path, config.extensions, &[])))
        })
        .collect();
    match infer_lang(&counts) {
        // the filter above guarantees the tag resolves
        Some(name) => Ok(get_lang(name).expect("inferred language is registered")),
        None => bail!(
            "no source files found under {}. Supported languages: {}",
            path.display(),
            available_langs().join(", ")
        ),
    }
}

fn run_scan(path: &std::path::Path, lang: Option<&str>, skip_slow: bool, json: bool) -> Result<()> {
    let lang = resolve_lang(path, lang)?;
    let ctx = ScanContext::new(path, lang);
    let (findings, potentials) = run_phases(&ctx, skip_slow);

    if json {
        print_json(&findings, &potentials)?;
    } else {
        print_report(lang.name, &findings, &potentials);
    }
    Ok(())
}

fn run_detect(
    detector: &str,
    path: &std::path::Path,
    lang: Option<&str>,
    json: bool,
    top: Option<usize>,
    threshold: Option<usize>,
    exclude: &[String],
) -> Result<()> {
    let lang = resolve_lang(path, lang)?;
    let mut ctx = ScanContext::new(path, lang).with_exclusions(exclude);

    if let Some(t) = threshold {
        match detector {
            "structural" => {
                ctx.overrides.thresholds.large_file = t;
                ctx.overrides.thresholds.complexity = t as u32;
            }
            _ => eprintln!(
                "{} --threshold only applies to the structural detector",
                style("warning:").yellow()
            ),
        }
    }

    // Slow phases only run when their category was asked for.
    let skip_slow = detector != "dupes";
    let (all_findings, potentials) = run_phases(&ctx, skip_slow);

    let mut findings: Vec<Finding> = all_findings
        .into_iter()
        .filter(|f| f.category == detector)
        .collect();
    if findings.is_empty() && !potentials.contains_key(detector) {
        bail!(
            "unknown detector '{}' for language {}",
            detector,
            lang.name
        );
    }
    if let Some(top) = top {
        findings.truncate(top);
    }

    let mut potentials = potentials;
    potentials.retain(|category, _| category.as_str() == detector);

    if json {
        print_json(&findings, &potentials)?;
    } else {
        print_report(lang.name, &findings, &potentials);
    }
    Ok(())
}

fn run_fix(fixer: &str, path: &std::path::Path, lang: Option<&str>, dry_run: bool) -> Result<()> {
    let lang = resolve_lang(path, lang)?;
    let table = (lang.fixers)();
    let Some(entry) = table.iter().find(|f| f.name == fixer) else {
        let names: Vec<&str> = table.iter().map(|f| f.name).collect();
        bail!(
            "unknown fixer '{}' for language {}. Available: {}",
            fixer,
            lang.name,
            if names.is_empty() {
                "none".to_string()
            } else {
                names.join(", ")
            }
        );
    };

    let ctx = ScanContext::new(path, lang);
    let entries: Vec<FixEntry> = (entry.detect)(&ctx.root, &ctx.exclusions());
    if entries.is_empty() {
        println!("{} nothing to {}", style("ok:").green(), entry.verb);
        return Ok(());
    }

    let found = entries.len();
    let results = (entry.fix)(entries, dry_run);
    print_fix_results(entry, found, &results, dry_run);
    Ok(())
}

fn run_langs() -> Result<()> {
    for name in available_langs() {
        // registry names always resolve
        let config = get_lang(name).expect("registered language");
        let phases = (config.phases)();
        let fixers = (config.fixers)();
        println!(
            "{} ({} phases, extensions: {})",
            style(name).bold(),
            phases.len(),
            config.extensions.join(" ")
        );
        for fixer in &fixers {
            println!("  {} {}", style(fixer.name).cyan(), fixer.label);
        }
        if fixers.is_empty() {
            println!("  {}", style("no fixers").dim());
        }
    }
    Ok(())
}

fn print_json(findings: &[Finding], potentials: &Potentials) -> Result<()> {
    let payload = serde_json::json!({
        "findings": findings,
        "potentials": potentials,
    });
    println!("{}", serde_json::to_string_pretty(&payload)?);
    Ok(())
}

fn tier_tag(tier: u8) -> console::StyledObject<String> {
    let tag = format!("[T{tier}]");
    match tier {
        1 => style(tag).red().bold(),
        2 => style(tag).yellow(),
        _ => style(tag).dim(),
    }
}

fn print_report(lang: &str, findings: &[Finding], potentials: &Potentials) {
    println!("\n{} ({lang})", style("descruft report").bold());

    let mut sorted: Vec<&Finding> = findings.iter().collect();
    sorted.sort_by(|a, b| a.tier.cmp(&b.tier).then_with(|| a.category.cmp(&b.category)));

    for finding in &sorted {
        let name = finding
            .name
            .as_deref()
            .map(|n| format!(" {n}"))
            .unwrap_or_default();
        println!(
            "{} {:<11}{} {} {}",
            tier_tag(finding.tier),
            finding.category,
            style(name).cyan(),
            style(finding.file.display()).underlined(),
            finding.summary,
        );
    }
    if sorted.is_empty() {
        println!("{}", style("no findings").green());
    }

    let mut categories: Vec<(&String, &usize)> = potentials.iter().collect();
    categories.sort();
    println!("\n{}", style("checked").dim());
    for (category, total) in categories {
        let count = findings.iter().filter(|f| &f.category == category).count();
        println!("  {category}: {count} findings / {total} checked");
    }
}

fn print_fix_results(
    fixer: &Fixer,
    found: usize,
    results: &[crate::fixers::FixResult],
    dry_run: bool,
) {
    let fixed: usize = results.iter().map(|r| r.removed.len()).sum();
    if dry_run {
        println!(
            "{} would {} {fixed} of {found} issues in {} files",
            style("dry run:").yellow(),
            fixer.verb,
            results.len()
        );
    } else {
        println!(
            "{} {} {fixed} of {found} issues in {} files",
            style("done:").green(),
            fixer.verb_past,
            results.len()
        );
    }
    for result in results {
        println!(
            "  {} ({} issues, net {} lines removed)",
            result.file.display(),
            result.removed.len(),
            result.lines_removed
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::discovery::clear_cache;
    use std::fs;

    #[test]
    fn test_cli_parses_scan_flags() {
        let cli = Cli::try_parse_from(["descruft", "scan", "/tmp/x", "--skip-slow", "--json"])
            .unwrap();
        match cli.command {
            Commands::Scan {
                path,
                skip_slow,
                json,
                lang,
            } => {
                assert_eq!(path, PathBuf::from("/tmp/x"));
                assert!(skip_slow);
                assert!(json);
                assert!(lang.is_none());
            }
            other => panic!("parsed wrong command: {other:?}"),
        }
    }

    #[test]
    fn test_cli_parses_detect_with_excludes() {
        let cli = Cli::try_parse_from([
            "descruft", "detect", "smells", ".", "--exclude", "vendor", "--exclude", "gen",
            "--top", "5",
        ])
        .unwrap();
        match cli.command {
            Commands::Detect {
                detector,
                exclude,
                top,
                ..
            } => {
                assert_eq!(detector, "smells");
                assert_eq!(exclude, vec!["vendor".to_string(), "gen".to_string()]);
                assert_eq!(top, Some(5));
            }
            other => panic!("parsed wrong command: {other:?}"),
        }
    }

    #[test]
    fn test_resolve_lang_rejects_unknown() {
        let err = resolve_lang(std::path::Path::new("."), Some("cobol")).unwrap_err();
        assert!(err.to_string().contains("unknown language"));
    }

    #[test]
    fn test_resolve_lang_infers_from_files() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.py"), "x = 1\n").unwrap();
        fs::write(dir.path().join("b.py"), "y = 2\n").unwrap();
        clear_cache();
        let lang = resolve_lang(dir.path(), None).unwrap();
        assert_eq!(lang.name, "python");
    }

    #[test]
    fn test_resolve_lang_empty_tree_fails() {
        let dir = tempfile::tempdir().unwrap();
        clear_cache();
        assert!(resolve_lang(dir.path(), None).is_err());
    }
}
