//! Per-repo configuration overlay
//!
//! Language defaults can be overridden from `.descruft/<lang>.yaml` in the
//! project root. Merge semantics: lists are unioned (appended, deduplicated),
//! nested mappings merge recursively, scalars are replaced. A malformed or
//! unreadable file falls back silently to the defaults.

use serde_yaml::Value;
use std::path::Path;
use tracing::debug;

/// Detector thresholds, overridable per repo
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Thresholds {
    /// Production files above this LOC are reported as large
    pub large_file: usize,
    /// Per-file complexity score above which a file is reported
    pub complexity: u32,
    /// A single function above this LOC is always worth a finding
    pub monster_function: u32,
}

/// Merged configuration for one language in one repository
#[derive(Debug, Clone)]
pub struct LangOverrides {
    /// Extra zone patterns, keyed by zone name (generated/test/config/script)
    pub zone_patterns: Vec<(String, Vec<String>)>,
    pub entry_patterns: Vec<String>,
    pub exclusions: Vec<String>,
    pub thresholds: Thresholds,
}

fn go_defaults() -> Value {
    serde_yaml::from_str(
        r#"
zones:
  generated: ["_gen.go", "_mock.go", "_string.go"]
  test: ["/testutil/"]
  config: ["Makefile", "Dockerfile"]
  script: ["/tools/"]
entry_patterns:
  - main.go
  - /cmd/
  - _test.go
  - /testdata/
  - /lambda/
  - handler.go
  - /migrations/
  - .pb.go
  - _gen.go
  - _mock.go
  - doc.go
exclusions: [vendor, .git, testdata, bin]
thresholds:
  large_file: 500
  complexity: 20
  monster_function: 150
"#,
    )
    .expect("builtin defaults parse")
}

fn python_defaults() -> Value {
    serde_yaml::from_str(
        r#"
zones:
  generated: ["_pb2.py"]
  test: ["conftest.py"]
  config: ["setup.py"]
  script: ["/bin/"]
entry_patterns:
  - __main__.py
  - setup.py
  - conftest.py
  - manage.py
exclusions: [.venv, venv, .git, __pycache__, .tox]
thresholds:
  large_file: 500
  complexity: 20
  monster_function: 150
"#,
    )
    .expect("builtin defaults parse")
}

fn defaults_for(lang: &str) -> Value {
    match lang {
        "python" => python_defaults(),
        _ => go_defaults(),
    }
}

/// Load per-repo overrides for `lang`, merged onto the builtin defaults.
pub fn load_overrides(project_root: &Path, lang: &str) -> LangOverrides {
    let mut config = defaults_for(lang);

    let config_file = project_root.join(".descruft").join(format!("{lang}.yaml"));
    if config_file.exists() {
        match std::fs::read_to_string(&config_file) {
            Ok(text) => match serde_yaml::from_str::<Value>(&text) {
                Ok(overrides) => merge_value(&mut config, overrides),
                Err(err) => {
                    debug!(file = %config_file.display(), %err, "malformed overlay, using defaults")
                }
            },
            Err(err) => {
                debug!(file = %config_file.display(), %err, "unreadable overlay, using defaults")
            }
        }
    }

    materialize(&config)
}

/// Merge `overrides` into `base`: recursive for mappings, union for
/// sequences, replacement for scalars.
fn merge_value(base: &mut Value, overrides: Value) {
    match (base, overrides) {
        (Value::Mapping(base_map), Value::Mapping(over_map)) => {
            for (key, value) in over_map {
                match base_map.get_mut(&key) {
                    Some(existing) => merge_value(existing, value),
                    None => {
                        base_map.insert(key, value);
                    }
                }
            }
        }
        (Value::Sequence(base_seq), Value::Sequence(over_seq)) => {
            for item in over_seq {
                if !base_seq.contains(&item) {
                    base_seq.push(item);
                }
            }
        }
        (slot, value) => *slot = value,
    }
}

fn string_list(value: Option<&Value>) -> Vec<String> {
    value
        .and_then(Value::as_sequence)
        .map(|seq| {
            seq.iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

fn materialize(config: &Value) -> LangOverrides {
    let zones = config.get("zones").and_then(Value::as_mapping);
    let zone_patterns = zones
        .map(|map| {
            map.iter()
                .filter_map(|(k, v)| {
                    let name = k.as_str()?.to_string();
                    Some((name, string_list(Some(v))))
                })
                .collect()
        })
        .unwrap_or_default();

    let thresholds = config.get("thresholds");
    let threshold = |key: &str, default: u64| -> u64 {
        thresholds
            .and_then(|t| t.get(key))
            .and_then(Value::as_u64)
            .unwrap_or(default)
    };

    LangOverrides {
        zone_patterns,
        entry_patterns: string_list(config.get("entry_patterns")),
        exclusions: string_list(config.get("exclusions")),
        thresholds: Thresholds {
            large_file: threshold("large_file", 500) as usize,
            complexity: threshold("complexity", 20) as u32,
            monster_function: threshold("monster_function", 150) as u32,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_defaults_without_overlay() {
        let dir = tempfile::tempdir().unwrap();
        let overrides = load_overrides(dir.path(), "go");
        assert_eq!(overrides.thresholds.large_file, 500);
        assert_eq!(overrides.thresholds.complexity, 20);
        assert!(overrides.exclusions.contains(&"vendor".to_string()));
        assert!(overrides.entry_patterns.contains(&"main.go".to_string()));
    }

    #[test]
    fn test_overlay_merges_lists_and_replaces_scalars() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join(".descruft")).unwrap();
        fs::write(
            dir.path().join(".descruft/go.yaml"),
            "exclusions: [thirdparty, vendor]\nthresholds:\n  large_file: 800\n",
        )
        .unwrap();

        let overrides = load_overrides(dir.path(), "go");
        // scalar replaced
        assert_eq!(overrides.thresholds.large_file, 800);
        // untouched scalar kept
        assert_eq!(overrides.thresholds.complexity, 20);
        // list unioned, no duplicate "vendor"
        let vendor_count = overrides
            .exclusions
            .iter()
            .filter(|e| e.as_str() == "vendor")
            .count();
        assert_eq!(vendor_count, 1);
        assert!(overrides.exclusions.contains(&"thirdparty".to_string()));
    }

    #[test]
    fn test_nested_mapping_merge() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join(".descruft")).unwrap();
        fs::write(
            dir.path().join(".descruft/go.yaml"),
            "zones:\n  generated: [\"_wire.go\"]\n",
        )
        .unwrap();

        let overrides = load_overrides(dir.path(), "go");
        let generated = overrides
            .zone_patterns
            .iter()
            .find(|(name, _)| name == "generated")
            .map(|(_, pats)| pats.clone())
            .unwrap();
        // default patterns survive alongside the addition
        assert!(generated.contains(&"_gen.go".to_string()));
        assert!(generated.contains(&"_wire.go".to_string()));
        // sibling zone keys untouched
        assert!(overrides
            .zone_patterns
            .iter()
            .any(|(name, _)| name == "test"));
    }

    #[test]
    fn test_malformed_overlay_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join(".descruft")).unwrap();
        fs::write(dir.path().join(".descruft/go.yaml"), ":: not yaml {{{\n").unwrap();

        let overrides = load_overrides(dir.path(), "go");
        assert_eq!(overrides.thresholds.large_file, 500);
    }
}
