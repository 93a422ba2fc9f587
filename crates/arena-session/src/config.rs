//! Session driver configuration.

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use arena_engine::EngineConfig;
use serde::{Deserialize, Serialize};

/// Driver settings plus the engine settings it passes through.
///
/// ```toml
/// dialogue_timeout_secs = 45
///
/// [engine]
/// mean_floor = 85
/// question_seed = 7
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Upper bound on one dialogue model call
    pub dialogue_timeout_secs: u64,
    pub engine: EngineConfig,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            dialogue_timeout_secs: 30,
            engine: EngineConfig::default(),
        }
    }
}

impl SessionConfig {
    /// Defaults overridden by `ARENA_DIALOGUE_TIMEOUT_SECS` and the engine's
    /// own `ARENA_*` variables.
    pub fn from_env() -> Self {
        let mut config = Self {
            engine: EngineConfig::from_env(),
            ..Self::default()
        };
        if let Ok(secs) = std::env::var("ARENA_DIALOGUE_TIMEOUT_SECS") {
            if let Ok(n) = secs.trim().parse() {
                config.dialogue_timeout_secs = n;
            }
        }
        config
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let config: Self =
            toml::from_str(&content).context("Failed to parse session config TOML")?;
        config
            .engine
            .validate()
            .context("Invalid engine section in session config")?;
        Ok(config)
    }

    pub fn dialogue_timeout(&self) -> Duration {
        Duration::from_secs(self.dialogue_timeout_secs.max(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let c = SessionConfig::default();
        assert_eq!(c.dialogue_timeout(), Duration::from_secs(30));
        assert_eq!(c.engine, EngineConfig::default());
    }

    #[test]
    fn test_load_with_engine_section() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        write!(
            f,
            "dialogue_timeout_secs = 5\n\n[engine]\nquestion_seed = 9\nmean_floor = 80\n"
        )
        .unwrap();
        let c = SessionConfig::load(f.path()).unwrap();
        assert_eq!(c.dialogue_timeout_secs, 5);
        assert_eq!(c.engine.question_seed, Some(9));
        assert_eq!(c.engine.mean_floor, 80);
        assert_eq!(c.engine.stay_threshold, 70);
    }

    #[test]
    fn test_load_rejects_invalid_engine_values() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        write!(f, "[engine]\ncluster_floor = 101\n").unwrap();
        let err = SessionConfig::load(f.path()).unwrap_err();
        assert!(format!("{err:#}").contains("cluster_floor"));
    }

    #[test]
    fn test_zero_timeout_is_raised_to_one_second() {
        let c = SessionConfig {
            dialogue_timeout_secs: 0,
            ..SessionConfig::default()
        };
        assert_eq!(c.dialogue_timeout(), Duration::from_secs(1));
    }
}
