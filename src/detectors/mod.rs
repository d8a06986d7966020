//! Detector families
//!
//! Each detector consumes raw file text, extracted declarations, or the
//! dependency graph, and returns `(entries, potential)`. The potential is
//! the scoring denominator for its category.

pub mod complexity;
pub mod coverage;
pub mod dupes;
pub mod facade;
pub mod gods;
pub mod large;
pub mod orphaned;
pub mod single_use;
pub mod smells;
