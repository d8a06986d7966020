//! God-object detection
//!
//! A struct is flagged when any rule's measured value exceeds its threshold.
//! The entry records every rule that fired, not just the first.

use crate::models::StructInfo;
use serde::Serialize;
use std::path::PathBuf;

/// One independent size/complexity axis
pub struct GodRule {
    pub id: &'static str,
    pub label: &'static str,
    pub extract: fn(&StructInfo) -> usize,
    pub threshold: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct GodEntry {
    pub file: PathBuf,
    pub name: String,
    pub loc: u32,
    /// Human-readable rule violations, e.g. "23 fields (max 20)"
    pub reasons: Vec<String>,
}

/// Default rules for Go structs.
pub fn go_god_rules() -> Vec<GodRule> {
    vec![
        GodRule {
            id: "loc",
            label: "lines of code",
            extract: |s| s.loc as usize,
            threshold: 500,
        },
        GodRule {
            id: "methods",
            label: "methods",
            extract: |s| s.methods.len(),
            threshold: 15,
        },
        GodRule {
            id: "fields",
            label: "fields",
            extract: |s| s.fields.len(),
            threshold: 20,
        },
        GodRule {
            id: "embedded",
            label: "embedded types",
            extract: |s| s.embedded.len(),
            threshold: 5,
        },
    ]
}

/// Flag every struct violating at least one rule. Potential is the number
/// of structs examined.
pub fn detect_gods(structs: &[StructInfo], rules: &[GodRule]) -> (Vec<GodEntry>, usize) {
    let mut entries = Vec::new();

    for s in structs {
        let mut reasons = Vec::new();
        for rule in rules {
            let value = (rule.extract)(s);
            if value > rule.threshold {
                reasons.push(format!("{value} {} (max {})", rule.label, rule.threshold));
            }
        }
        if !reasons.is_empty() {
            entries.push(GodEntry {
                file: s.file.clone(),
                name: s.name.clone(),
                loc: s.loc,
                reasons,
            });
        }
    }

    entries.sort_by(|a, b| {
        b.reasons
            .len()
            .cmp(&a.reasons.len())
            .then_with(|| b.loc.cmp(&a.loc))
    });
    (entries, structs.len())
}
