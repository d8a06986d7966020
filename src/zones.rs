//! Zone classification
//!
//! Maps a file path to a zone label (production/test/generated/config/script)
//! via ordered pattern rules. Zones scope detectors — structural analysis
//! skips generated and test files — and decide which files count toward
//! health-score denominators (production only).

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Role of a file within the project
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Zone {
    #[default]
    Production,
    Test,
    Generated,
    Config,
    Script,
}

impl Zone {
    /// Parse a zone name as it appears in config overlays.
    pub fn from_name(name: &str) -> Option<Zone> {
        match name {
            "production" => Some(Zone::Production),
            "test" => Some(Zone::Test),
            "generated" => Some(Zone::Generated),
            "config" => Some(Zone::Config),
            "script" => Some(Zone::Script),
            _ => None,
        }
    }
}

impl std::fmt::Display for Zone {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Zone::Production => write!(f, "production"),
            Zone::Test => write!(f, "test"),
            Zone::Generated => write!(f, "generated"),
            Zone::Config => write!(f, "config"),
            Zone::Script => write!(f, "script"),
        }
    }
}

/// One ordered classification rule: a zone plus the path patterns that
/// select it. A pattern matches when the path contains it or ends with it.
#[derive(Debug, Clone)]
pub struct ZoneRule {
    pub zone: Zone,
    pub patterns: Vec<String>,
}

impl ZoneRule {
    pub fn new(zone: Zone, patterns: &[&str]) -> Self {
        Self {
            zone,
            patterns: patterns.iter().map(|p| p.to_string()).collect(),
        }
    }

    fn matches(&self, path: &str) -> bool {
        self.patterns
            .iter()
            .any(|p| path.contains(p.as_str()) || path.ends_with(p.as_str()))
    }
}

/// Zone rules that apply to every language, appended after the
/// language-specific rules.
pub fn common_zone_rules() -> Vec<ZoneRule> {
    vec![
        ZoneRule::new(Zone::Test, &["/tests/", "/test/", "/__tests__/", "/spec/"]),
        ZoneRule::new(Zone::Generated, &["/generated/", "/gen/", "/dist/", "/build/"]),
        ZoneRule::new(Zone::Config, &[".yaml", ".yml", ".toml", ".json", "Makefile", "Dockerfile"]),
        ZoneRule::new(Zone::Script, &["/scripts/", "/tools/", "/hack/"]),
    ]
}

/// Classify a file path against ordered rules. First matching rule wins;
/// a path matching nothing is production. Pure and total.
pub fn classify(path: &Path, rules: &[ZoneRule]) -> Zone {
    let path_str = path.to_string_lossy().replace('\\', "/");
    for rule in rules {
        if rule.matches(&path_str) {
            return rule.zone;
        }
    }
    Zone::Production
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn go_rules() -> Vec<ZoneRule> {
        let mut rules = vec![
            ZoneRule::new(Zone::Generated, &[".pb.go", "_string.go"]),
            ZoneRule::new(Zone::Test, &["_test.go", "/testdata/", "/testutil/"]),
            ZoneRule::new(Zone::Config, &["go.mod", "go.sum"]),
        ];
        rules.extend(common_zone_rules());
        rules
    }

    #[test]
    fn test_first_matching_rule_wins() {
        let rules = go_rules();
        // .pb.go matches the generated rule before anything else
        assert_eq!(
            classify(&PathBuf::from("api/v1/service.pb.go"), &rules),
            Zone::Generated
        );
        assert_eq!(
            classify(&PathBuf::from("pkg/server/server_test.go"), &rules),
            Zone::Test
        );
        assert_eq!(classify(&PathBuf::from("go.mod"), &rules), Zone::Config);
    }

    #[test]
    fn test_defaults_to_production() {
        let rules = go_rules();
        assert_eq!(
            classify(&PathBuf::from("pkg/server/server.go"), &rules),
            Zone::Production
        );
        // Total: empty rule set still returns a zone
        assert_eq!(classify(&PathBuf::from("anything.go"), &[]), Zone::Production);
    }

    #[test]
    fn test_deterministic() {
        let rules = go_rules();
        let path = PathBuf::from("internal/tools/gen.go");
        let first = classify(&path, &rules);
        for _ in 0..10 {
            assert_eq!(classify(&path, &rules), first);
        }
    }
}
