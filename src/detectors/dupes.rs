//! Duplicate-function detection
//!
//! Exact duplicates share a normalized-body hash; near duplicates score
//! above the similarity threshold on a line-multiset ratio over normalized
//! bodies. Cross-file pairs only — intra-file duplication is usually
//! intentional (overloads, table-driven variants) and never reported.

use crate::models::FunctionInfo;
use serde::Serialize;
use std::collections::HashMap;
use std::path::PathBuf;
use tracing::debug;

/// Functions with fewer normalized lines than this are too small to call
/// duplicates.
const MIN_BODY_LINES: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DupeKind {
    Exact,
    Near,
}

#[derive(Debug, Clone, Serialize)]
pub struct DupeFn {
    pub name: String,
    pub file: PathBuf,
    pub line: u32,
}

impl From<&FunctionInfo> for DupeFn {
    fn from(f: &FunctionInfo) -> Self {
        Self {
            name: f.name.clone(),
            file: f.file.clone(),
            line: f.line,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DupeEntry {
    pub fn_a: DupeFn,
    pub fn_b: DupeFn,
    pub similarity: f64,
    pub kind: DupeKind,
}

/// Similarity of two normalized bodies: 2·|common lines| / (|a| + |b|),
/// counting multiplicity.
fn line_similarity(a: &str, b: &str) -> f64 {
    let mut counts: HashMap<&str, i64> = HashMap::new();
    let mut len_a = 0i64;
    for line in a.lines() {
        *counts.entry(line).or_insert(0) += 1;
        len_a += 1;
    }
    let mut len_b = 0i64;
    let mut common = 0i64;
    for line in b.lines() {
        len_b += 1;
        if let Some(count) = counts.get_mut(line) {
            if *count > 0 {
                *count -= 1;
                common += 1;
            }
        }
    }
    if len_a + len_b == 0 {
        return 0.0;
    }
    (2 * common) as f64 / (len_a + len_b) as f64
}

/// Find duplicate function pairs above `threshold`. Potential is the number
/// of functions examined.
pub fn detect_duplicates(functions: &[FunctionInfo], threshold: f64) -> (Vec<DupeEntry>, usize) {
    let eligible: Vec<&FunctionInfo> = functions
        .iter()
        .filter(|f| f.normalized_body.lines().count() >= MIN_BODY_LINES)
        .collect();
    debug!(
        total = functions.len(),
        eligible = eligible.len(),
        "comparing functions for duplication"
    );

    let mut entries = Vec::new();

    for (i, a) in eligible.iter().enumerate() {
        for b in &eligible[i + 1..] {
            if a.file == b.file {
                continue;
            }
            if a.body_hash == b.body_hash {
                entries.push(DupeEntry {
                    fn_a: DupeFn::from(*a),
                    fn_b: DupeFn::from(*b),
                    similarity: 1.0,
                    kind: DupeKind::Exact,
                });
                continue;
            }
            let similarity = line_similarity(&a.normalized_body, &b.normalized_body);
            if similarity >= threshold {
                entries.push(DupeEntry {
                    fn_a: DupeFn::from(*a),
                    fn_b: DupeFn::from(*b),
                    similarity,
                    kind: DupeKind::Near,
                });
            }
        }
    }

    entries.sort_by(|x, y| {
        y.similarity
            .partial_cmp(&x.similarity)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| x.fn_a.file.cmp(&y.fn_a.file))
    });
    (entries, functions.len())
}
