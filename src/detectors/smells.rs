//! Code-smell aggregation
//!
//! Language catalogs (see `lang::go::smells`) produce raw per-line matches;
//! this module groups them by check, caps samples, orders by severity then
//! volume, and converts entries into findings.

use crate::models::{Confidence, Finding};
use serde::Serialize;
use std::collections::HashSet;
use std::path::PathBuf;

/// Number of sample matches kept per check.
pub const MAX_SAMPLES: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    High,
    Medium,
    Low,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::High => write!(f, "high"),
            Severity::Medium => write!(f, "medium"),
            Severity::Low => write!(f, "low"),
        }
    }
}

impl Severity {
    /// Priority band for findings: high smells are tier 1, low tier 3.
    pub fn tier(self) -> u8 {
        match self {
            Severity::High => 1,
            Severity::Medium => 2,
            Severity::Low => 3,
        }
    }
}

/// One matched line
#[derive(Debug, Clone, Serialize)]
pub struct SmellMatch {
    pub file: PathBuf,
    /// 1-indexed
    pub line: u32,
    /// Matched line content, trimmed and truncated
    pub content: String,
}

impl SmellMatch {
    pub fn new(file: impl Into<PathBuf>, line: u32, content: &str) -> Self {
        let trimmed = content.trim();
        let content = trimmed.chars().take(100).collect();
        Self {
            file: file.into(),
            line,
            content,
        }
    }
}

/// All matches for one check across the scanned tree
#[derive(Debug, Clone, Serialize)]
pub struct SmellEntry {
    pub id: String,
    pub label: String,
    pub severity: Severity,
    pub count: usize,
    /// Distinct files with at least one match
    pub files: usize,
    /// Up to [`MAX_SAMPLES`] sample matches
    pub matches: Vec<SmellMatch>,
}

impl SmellEntry {
    pub fn new(id: &str, label: &str, severity: Severity, matches: Vec<SmellMatch>) -> Self {
        let count = matches.len();
        let files = matches
            .iter()
            .map(|m| m.file.as_path())
            .collect::<HashSet<_>>()
            .len();
        let mut matches = matches;
        matches.truncate(MAX_SAMPLES);
        Self {
            id: id.to_string(),
            label: label.to_string(),
            severity,
            count,
            files,
            matches,
        }
    }
}

/// Order entries by severity (high first), then by descending match count.
pub fn sort_entries(entries: &mut [SmellEntry]) {
    entries.sort_by(|a, b| {
        a.severity
            .cmp(&b.severity)
            .then_with(|| b.count.cmp(&a.count))
    });
}

/// One finding per check entry. The file is the first sample's; the full
/// sample list rides in the detail payload.
pub fn entries_to_findings(entries: &[SmellEntry]) -> Vec<Finding> {
    entries
        .iter()
        .filter(|e| !e.matches.is_empty())
        .map(|e| {
            let confidence = match e.severity {
                Severity::High => Confidence::High,
                Severity::Medium => Confidence::Medium,
                Severity::Low => Confidence::Low,
            };
            Finding::new(
                "smells",
                e.matches[0].file.clone(),
                format!("{} ({} matches in {} files)", e.label, e.count, e.files),
            )
            .with_name(e.id.clone())
            .with_tier(e.severity.tier())
            .with_confidence(confidence)
            .with_detail(serde_json::json!({
                "severity": e.severity,
                "count": e.count,
                "files": e.files,
                "matches": e.matches,
            }))
        })
        .collect()
}
