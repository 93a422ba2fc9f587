//! Recorded interviews and offline replay.
//!
//! A transcript is a JSON list of user messages paired with the dialogue
//! model's reply to each:
//!
//! ```json
//! {
//!   "session_id": "demo",
//!   "turns": [
//!     { "user": "Vi har problem med ...", "reply": "Hur ofta händer det?" }
//!   ]
//! }
//! ```

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use arena_engine::ArenaLogicEngine;
use serde::{Deserialize, Serialize};

use crate::config::SessionConfig;
use crate::dialogue::ScriptedDialogue;
use crate::session::{SessionDriver, SessionSnapshot, TurnReport};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscriptTurn {
    pub user: String,
    pub reply: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transcript {
    #[serde(default = "default_session_id")]
    pub session_id: String,
    pub turns: Vec<TranscriptTurn>,
}

fn default_session_id() -> String {
    "replay".to_string()
}

impl Transcript {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse transcript {}", path.display()))
    }
}

/// Final state and per-turn reports of a replayed transcript.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplaySummary {
    pub snapshot: SessionSnapshot,
    pub reports: Vec<TurnReport>,
}

/// Drive every turn of `transcript` through a fresh session.
///
/// Stops early once a turn confirms completion.
pub async fn replay(
    engine: Arc<ArenaLogicEngine>,
    transcript: &Transcript,
    config: &SessionConfig,
) -> Result<ReplaySummary> {
    let dialogue = Arc::new(ScriptedDialogue::new(
        transcript.turns.iter().map(|t| t.reply.clone()),
    ));
    let mut snapshot = SessionSnapshot::new(transcript.session_id.clone(), &engine);
    let driver = SessionDriver::new(engine, dialogue, config);

    let mut reports = Vec::with_capacity(transcript.turns.len());
    for (i, turn) in transcript.turns.iter().enumerate() {
        let report = driver
            .turn(&mut snapshot, &turn.user)
            .await
            .with_context(|| format!("Replay failed at turn {}", i + 1))?;
        reports.push(report);
        if snapshot.complete {
            break;
        }
    }

    Ok(ReplaySummary { snapshot, reports })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn load_defaults_session_id() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        write!(f, r#"{{"turns":[{{"user":"Hej","reply":"Hej hej"}}]}}"#).unwrap();
        let t = Transcript::load(f.path()).unwrap();
        assert_eq!(t.session_id, "replay");
        assert_eq!(t.turns.len(), 1);
    }

    #[test]
    fn load_reports_bad_json() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        write!(f, "not json").unwrap();
        let err = Transcript::load(f.path()).unwrap_err();
        assert!(err.to_string().contains("Failed to parse transcript"));
    }

    #[tokio::test]
    async fn replay_runs_each_turn() {
        let transcript = Transcript {
            session_id: "t".into(),
            turns: vec![
                TranscriptTurn {
                    user: "Hej".into(),
                    reply: "Vad är det största problemet?".into(),
                },
                TranscriptTurn {
                    user: "Vi har problem med manuella fakturor".into(),
                    reply: "Vad kostar det?".into(),
                },
            ],
        };
        let summary = replay(
            Arc::new(ArenaLogicEngine::new()),
            &transcript,
            &SessionConfig::default(),
        )
        .await
        .unwrap();
        assert_eq!(summary.reports.len(), 2);
        assert_eq!(summary.snapshot.history.len(), 4);
        assert_eq!(
            summary.snapshot.clusters[arena_engine::ClusterId::PainPoint].confidence,
            25
        );
    }
}
