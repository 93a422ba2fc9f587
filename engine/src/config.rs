//! Engine configuration
//!
//! Defaults reproduce the interview's fixed gating. Every field can be
//! overridden from `ARENA_*` environment variables or a TOML file.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};
use crate::questions::QuestionSelection;

/// Thresholds and sources used by the engine and the response processor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Below this the current cluster is kept regardless of triggers
    pub stay_threshold: u8,
    /// Triggers and default progression only move to clusters below this
    pub switch_gate: u8,
    /// Completion gate (a): every cluster at or above this
    pub cluster_floor: u8,
    /// Completion gate (b): every critical cluster at or above this
    pub critical_floor: u8,
    /// Completion gate (c): the mean at or above this
    pub mean_floor: u8,
    /// Confidence removed when the user corrects earlier answers
    pub contradiction_penalty: u8,
    /// Shorter completion replies are replaced by the canned message
    pub min_completion_message_chars: usize,
    /// Deterministic follow-up question selection when set
    pub question_seed: Option<u64>,
    /// TOML rubric to use instead of the built-in catalog
    pub catalog_path: Option<PathBuf>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            stay_threshold: 70,
            switch_gate: 80,
            cluster_floor: 70,
            critical_floor: 80,
            mean_floor: 85,
            contradiction_penalty: 20,
            min_completion_message_chars: 20,
            question_seed: None,
            catalog_path: None,
        }
    }
}

impl EngineConfig {
    /// Defaults overridden by `ARENA_*` environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overridden by whatever `lookup` returns for each `ARENA_*` key.
    /// Unparseable values are ignored.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        let percent = |key: &str, slot: &mut u8| {
            if let Some(v) = lookup(key).and_then(|v| v.trim().parse().ok()) {
                *slot = v;
            }
        };
        percent("ARENA_STAY_THRESHOLD", &mut config.stay_threshold);
        percent("ARENA_SWITCH_GATE", &mut config.switch_gate);
        percent("ARENA_CLUSTER_FLOOR", &mut config.cluster_floor);
        percent("ARENA_CRITICAL_FLOOR", &mut config.critical_floor);
        percent("ARENA_MEAN_FLOOR", &mut config.mean_floor);
        percent(
            "ARENA_CONTRADICTION_PENALTY",
            &mut config.contradiction_penalty,
        );

        if let Some(n) = lookup("ARENA_MIN_COMPLETION_CHARS").and_then(|v| v.trim().parse().ok()) {
            config.min_completion_message_chars = n;
        }
        if let Some(seed) = lookup("ARENA_QUESTION_SEED").and_then(|v| v.trim().parse().ok()) {
            config.question_seed = Some(seed);
        }
        if let Some(path) = lookup("ARENA_CATALOG_PATH").filter(|p| !p.trim().is_empty()) {
            config.catalog_path = Some(PathBuf::from(path));
        }

        config
    }

    /// Parse a TOML document; missing fields keep their defaults.
    pub fn from_toml_str(s: &str) -> EngineResult<Self> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> EngineResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| EngineError::FileRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Reject thresholds outside 0–100.
    pub fn validate(&self) -> EngineResult<()> {
        let fields = [
            ("stay_threshold", self.stay_threshold),
            ("switch_gate", self.switch_gate),
            ("cluster_floor", self.cluster_floor),
            ("critical_floor", self.critical_floor),
            ("mean_floor", self.mean_floor),
            ("contradiction_penalty", self.contradiction_penalty),
        ];
        for (name, value) in fields {
            if value > 100 {
                return Err(EngineError::Config(format!(
                    "{name} must be at most 100, got {value}"
                )));
            }
        }
        Ok(())
    }

    pub fn question_selection(&self) -> QuestionSelection {
        match self.question_seed {
            Some(seed) => QuestionSelection::Seeded(seed),
            None => QuestionSelection::Random,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let c = EngineConfig::default();
        assert_eq!(c.stay_threshold, 70);
        assert_eq!(c.switch_gate, 80);
        assert_eq!(c.mean_floor, 85);
        assert_eq!(c.question_selection(), QuestionSelection::Random);
        assert!(c.validate().is_ok());
    }

    #[test]
    fn test_lookup_overrides() {
        let env: HashMap<&str, &str> = [
            ("ARENA_MEAN_FLOOR", "90"),
            ("ARENA_QUESTION_SEED", "7"),
            ("ARENA_STAY_THRESHOLD", "not a number"),
            ("ARENA_CATALOG_PATH", "/tmp/rubric.toml"),
        ]
        .into_iter()
        .collect();
        let c = EngineConfig::from_lookup(|k| env.get(k).map(|v| v.to_string()));
        assert_eq!(c.mean_floor, 90);
        assert_eq!(c.stay_threshold, 70);
        assert_eq!(c.question_selection(), QuestionSelection::Seeded(7));
        assert_eq!(c.catalog_path, Some(PathBuf::from("/tmp/rubric.toml")));
    }

    #[test]
    fn test_toml_partial_override() {
        let c = EngineConfig::from_toml_str("critical_floor = 75\nquestion_seed = 3\n").unwrap();
        assert_eq!(c.critical_floor, 75);
        assert_eq!(c.cluster_floor, 70);
        assert_eq!(c.question_seed, Some(3));
    }

    #[test]
    fn test_validate_rejects_out_of_range() {
        let err = EngineConfig::from_toml_str("mean_floor = 120").unwrap_err();
        assert!(matches!(err, EngineError::Config(ref m) if m.contains("mean_floor")));
    }

    #[test]
    fn test_load_from_file() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        writeln!(f, "contradiction_penalty = 10").unwrap();
        let c = EngineConfig::load(f.path()).unwrap();
        assert_eq!(c.contradiction_penalty, 10);

        let missing = EngineConfig::load(Path::new("/nonexistent/arena.toml")).unwrap_err();
        assert!(matches!(missing, EngineError::FileRead { .. }));
    }
}
