//! Source file discovery
//!
//! Walks a root directory with `ignore::WalkBuilder` (gitignore-aware),
//! filters by extension and exclusion substrings, and returns a stable,
//! sorted, deduplicated list. Results are cached per
//! `(root, extensions, exclusions)` key — extra exclusions are part of the
//! key rather than process-global state, so changing them mid-process just
//! selects a different cache slot.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::debug;

type CacheKey = (PathBuf, Vec<String>, Vec<String>);

static CACHE: Mutex<Option<HashMap<CacheKey, Vec<PathBuf>>>> = Mutex::new(None);

/// Find all source files under `root` with one of `extensions`, skipping any
/// path that contains an exclusion substring as a component.
pub fn find_source_files(root: &Path, extensions: &[&str], exclusions: &[&str]) -> Vec<PathBuf> {
    let key: CacheKey = (
        root.to_path_buf(),
        extensions.iter().map(|e| e.to_string()).collect(),
        exclusions.iter().map(|e| e.to_string()).collect(),
    );

    {
        let guard = CACHE.lock().expect("discovery cache poisoned");
        if let Some(cache) = guard.as_ref() {
            if let Some(hit) = cache.get(&key) {
                return hit.clone();
            }
        }
    }

    let files = walk(root, extensions, exclusions);
    debug!(root = %root.display(), count = files.len(), "discovered source files");

    let mut guard = CACHE.lock().expect("discovery cache poisoned");
    guard
        .get_or_insert_with(HashMap::new)
        .insert(key, files.clone());
    files
}

/// Drop all cached discovery results. Tests use this between temp trees.
pub fn clear_cache() {
    let mut guard = CACHE.lock().expect("discovery cache poisoned");
    *guard = None;
}

fn walk(root: &Path, extensions: &[&str], exclusions: &[&str]) -> Vec<PathBuf> {
    let walker = ignore::WalkBuilder::new(root)
        .hidden(true)
        .git_ignore(true)
        .git_global(true)
        .git_exclude(true)
        .require_git(false)
        .add_custom_ignore_filename(".descruftignore")
        .build();

    let mut files: Vec<PathBuf> = walker
        .filter_map(|entry| {
            let entry = entry.ok()?;
            let path = entry.path();
            if !path.is_file() {
                return None;
            }

            let path_str = path.to_string_lossy();
            if exclusions.iter().any(|ex| {
                path_str.contains(&format!("/{ex}/")) || path_str.starts_with(&format!("{ex}/"))
            }) {
                return None;
            }

            let name = path.file_name()?.to_str()?;
            if !extensions.iter().any(|ext| name.ends_with(ext)) {
                return None;
            }

            Some(path.to_path_buf())
        })
        .collect();

    files.sort();
    files.dedup();
    files
}
