//! Core data models for descruft
//!
//! These models are used throughout the codebase for representing
//! findings, extracted declarations, and scoring denominators.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// Confidence level attached to a finding
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    Low,
    #[default]
    Medium,
    High,
}

impl std::fmt::Display for Confidence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Confidence::Low => write!(f, "low"),
            Confidence::Medium => write!(f, "medium"),
            Confidence::High => write!(f, "high"),
        }
    }
}

/// One reported issue instance.
///
/// The key set here is the contract other layers depend on: findings
/// serialize to `{category, file, name, tier, confidence, summary, detail}`.
/// `detail` is detector-specific but always acyclic JSON. Findings are
/// append-only output; nothing mutates one after creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Finding {
    /// Detector/category id, e.g. "smells" or "structural"
    pub category: String,
    /// File the finding applies to
    pub file: PathBuf,
    /// Optional sub-name (function or struct name for per-symbol findings)
    #[serde(default)]
    pub name: Option<String>,
    /// Severity/priority band; 1 is the worst
    pub tier: u8,
    pub confidence: Confidence,
    /// Human-readable one-line summary
    pub summary: String,
    /// Detector-specific structured payload
    #[serde(default)]
    pub detail: serde_json::Value,
}

impl Finding {
    pub fn new(
        category: impl Into<String>,
        file: impl Into<PathBuf>,
        summary: impl Into<String>,
    ) -> Self {
        Self {
            category: category.into(),
            file: file.into(),
            name: None,
            tier: 2,
            confidence: Confidence::Medium,
            summary: summary.into(),
            detail: serde_json::Value::Null,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_tier(mut self, tier: u8) -> Self {
        self.tier = tier;
        self
    }

    pub fn with_confidence(mut self, confidence: Confidence) -> Self {
        self.confidence = confidence;
        self
    }

    pub fn with_detail(mut self, detail: serde_json::Value) -> Self {
        self.detail = detail;
        self
    }
}

/// Scoring denominators, keyed by detector category.
///
/// Each detector reports how many units were eligible (e.g. total
/// production files); downstream scoring turns finding counts into
/// percentages against these.
pub type Potentials = HashMap<String, usize>;

/// Merge `other` into `base`, summing counts per category.
pub fn merge_potentials(base: &mut Potentials, other: Potentials) {
    for (category, count) in other {
        *base.entry(category).or_insert(0) += count;
    }
}

/// A function or method extracted from source text
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionInfo {
    pub name: String,
    pub file: PathBuf,
    /// 1-indexed start line of the declaration
    pub line: u32,
    pub end_line: u32,
    pub loc: u32,
    /// Parameter names (not types)
    pub params: Vec<String>,
    /// Raw body text including braces
    pub body: String,
    /// Body with blanks, comments, and logging lines stripped
    pub normalized_body: String,
    /// xxh3 hash of the normalized body, for duplicate comparison
    pub body_hash: u64,
    /// Receiver type name for methods, empty for plain functions
    #[serde(default)]
    pub receiver: String,
    pub exported: bool,
}

/// A struct (or equivalent record type) extracted from source text
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StructInfo {
    pub name: String,
    pub file: PathBuf,
    pub line: u32,
    pub loc: u32,
    /// Named field identifiers
    pub fields: Vec<String>,
    /// Embedded/base type names
    pub embedded: Vec<String>,
    /// Methods attached by receiver name
    pub methods: Vec<String>,
    pub exported: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_finding_serializes_fixed_keys() {
        let finding = Finding::new("smells", "pkg/a.go", "bare error return")
            .with_name("Handler")
            .with_tier(1)
            .with_confidence(Confidence::High)
            .with_detail(serde_json::json!({"line": 12}));

        let value = serde_json::to_value(&finding).unwrap();
        let obj = value.as_object().unwrap();
        for key in [
            "category",
            "file",
            "name",
            "tier",
            "confidence",
            "summary",
            "detail",
        ] {
            assert!(obj.contains_key(key), "missing key {key}");
        }
        assert_eq!(obj["confidence"], "high");
        assert_eq!(obj["tier"], 1);
    }

    #[test]
    fn test_merge_potentials_sums_per_category() {
        let mut base = Potentials::new();
        base.insert("smells".to_string(), 10);

        let mut other = Potentials::new();
        other.insert("smells".to_string(), 5);
        other.insert("structural".to_string(), 3);

        merge_potentials(&mut base, other);
        assert_eq!(base["smells"], 15);
        assert_eq!(base["structural"], 3);
    }
}
