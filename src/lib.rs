//! descruft - code cruft detector and fixer
//!
//! Scans a source tree, classifies files into zones, runs per-language
//! detector phases (smells, structure, duplication, coupling, dependency
//! hygiene), and can auto-fix a small set of mechanical issues. Library
//! layers never abort a scan: unreadable files, broken tools, and failing
//! phases are logged and skipped.

pub mod cli;
pub mod config;
pub mod detectors;
pub mod discovery;
pub mod fixers;
pub mod graph;
pub mod lang;
pub mod models;
pub mod phases;
pub mod zones;
