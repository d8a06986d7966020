//! Complexity-signal scoring
//!
//! A signal is either a regex counted against file text (score contribution
//! weight × occurrence count) or a custom compute function over the full
//! text and its line list that fires only past its threshold (contribution
//! weight × 1, with a descriptive label). Files whose summed score exceeds
//! the language complexity threshold are reported, highest score first.

use regex::Regex;
use serde::Serialize;
use std::path::PathBuf;
use tracing::debug;

/// Compute-function contract: `(content, lines) -> Some((value, label))`
/// when the measured value exceeds the signal's threshold.
pub type ComputeFn = fn(&str, &[&str]) -> Option<(u32, String)>;

pub enum SignalKind {
    Pattern(Regex),
    Compute(ComputeFn),
}

pub struct ComplexitySignal {
    pub id: &'static str,
    pub weight: u32,
    pub kind: SignalKind,
}

impl ComplexitySignal {
    pub fn pattern(id: &'static str, pattern: &str, weight: u32) -> Self {
        Self {
            id,
            weight,
            kind: SignalKind::Pattern(Regex::new(pattern).expect("valid signal regex")),
        }
    }

    pub fn compute(id: &'static str, f: ComputeFn, weight: u32) -> Self {
        Self {
            id,
            weight,
            kind: SignalKind::Compute(f),
        }
    }
}

/// One file over the complexity threshold
#[derive(Debug, Clone, Serialize)]
pub struct ComplexityEntry {
    pub file: PathBuf,
    pub loc: u32,
    pub score: u32,
    /// Labels of every signal that contributed
    pub signals: Vec<String>,
}

/// Score `files` against `signals`. Returns entries over `threshold`
/// (descending score) and the number of files checked.
pub fn detect_complexity(
    files: &[PathBuf],
    signals: &[ComplexitySignal],
    threshold: u32,
) -> (Vec<ComplexityEntry>, usize) {
    let mut entries = Vec::new();

    for file in files {
        let content = match std::fs::read_to_string(file) {
            Ok(c) => c,
            Err(err) => {
                debug!(file = %file.display(), %err, "skipping unreadable file");
                continue;
            }
        };
        let lines: Vec<&str> = content.lines().collect();

        let mut score = 0u32;
        let mut fired = Vec::new();
        for signal in signals {
            match &signal.kind {
                SignalKind::Pattern(re) => {
                    let count = re.find_iter(&content).count() as u32;
                    if count > 0 {
                        score += signal.weight * count;
                        fired.push(format!("{} x{count}", signal.id));
                    }
                }
                SignalKind::Compute(f) => {
                    if let Some((_, label)) = f(&content, &lines) {
                        score += signal.weight;
                        fired.push(label);
                    }
                }
            }
        }

        if score > threshold {
            entries.push(ComplexityEntry {
                file: file.clone(),
                loc: lines.len() as u32,
                score,
                signals: fired,
            });
        }
    }

    entries.sort_by(|a, b| b.score.cmp(&a.score).then_with(|| a.file.cmp(&b.file)));
    (entries, files.len())
}
