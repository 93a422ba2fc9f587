//! Session driver — one user turn end to end.
//!
//! ```text
//! claim in-flight ticket ─► engine.score_turn (on a copy of the state)
//!     ─► dialogue model (with timeout) ─► ResponseProcessor
//!     ─► commit state, redirect and history ─► TurnReport
//! ```
//!
//! A failed or timed-out dialogue call commits nothing, so the caller can
//! retry the same message against the same snapshot.

use std::sync::Arc;
use std::time::Duration;

use arena_engine::{
    ArenaLogicEngine, ClusterId, ClusterMap, ClusterState, ProcessedResponse, ResponseContext,
    ResponseProcessor, TurnOutcome,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::SessionConfig;
use crate::dialogue::{DialogueModel, DialogueRequest, HistoryEntry};
use crate::guard::InFlightGuard;

#[derive(Debug, Error)]
pub enum SessionError {
    /// Another turn for this session is still running.
    #[error("session {0} already has a turn in progress")]
    Busy(String),

    #[error("dialogue model did not answer within {0:?}")]
    DialogueTimeout(Duration),

    #[error("dialogue model failed: {0}")]
    Dialogue(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Everything the caller persists between turns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub session_id: String,
    pub current_cluster: ClusterId,
    pub clusters: ClusterMap<ClusterState>,
    #[serde(default)]
    pub history: Vec<HistoryEntry>,
    #[serde(default)]
    pub complete: bool,
}

impl SessionSnapshot {
    pub fn new(session_id: impl Into<String>, engine: &ArenaLogicEngine) -> Self {
        Self {
            session_id: session_id.into(),
            current_cluster: ClusterId::PainPoint,
            clusters: engine.initialize_clusters(),
            history: Vec::new(),
            complete: false,
        }
    }
}

/// Result of one driven turn.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TurnReport {
    pub outcome: TurnOutcome,
    pub response: ProcessedResponse,
    /// Cluster the next user message will be scored against
    pub next_cluster: ClusterId,
}

pub struct SessionDriver {
    engine: Arc<ArenaLogicEngine>,
    processor: ResponseProcessor,
    dialogue: Arc<dyn DialogueModel>,
    guard: Arc<InFlightGuard>,
    timeout: Duration,
}

impl SessionDriver {
    pub fn new(
        engine: Arc<ArenaLogicEngine>,
        dialogue: Arc<dyn DialogueModel>,
        config: &SessionConfig,
    ) -> Self {
        Self {
            processor: ResponseProcessor::from_config(engine.config()),
            engine,
            dialogue,
            guard: Arc::new(InFlightGuard::new()),
            timeout: config.dialogue_timeout(),
        }
    }

    /// Share an in-flight guard with other drivers.
    pub fn with_guard(mut self, guard: Arc<InFlightGuard>) -> Self {
        self.guard = guard;
        self
    }

    pub fn engine(&self) -> &ArenaLogicEngine {
        &self.engine
    }

    pub fn guard(&self) -> &Arc<InFlightGuard> {
        &self.guard
    }

    pub async fn turn(
        &self,
        snapshot: &mut SessionSnapshot,
        message: &str,
    ) -> Result<TurnReport, SessionError> {
        let _ticket = self
            .guard
            .try_acquire(&snapshot.session_id)
            .ok_or_else(|| SessionError::Busy(snapshot.session_id.clone()))?;

        let scored_cluster = snapshot.current_cluster;
        let mut clusters = snapshot.clusters.clone();
        let outcome = self.engine.score_turn(scored_cluster, message, &mut clusters);
        debug!(
            session = %snapshot.session_id,
            cluster = %scored_cluster,
            confidence = outcome.update.confidence,
            next = %outcome.next_cluster,
            "Turn scored"
        );

        let request = DialogueRequest {
            session_id: snapshot.session_id.clone(),
            target_cluster: outcome.next_cluster,
            follow_up: outcome
                .analysis
                .as_ref()
                .and_then(|a| a.next_question.clone()),
            overall_confidence: outcome.overall_confidence,
            history: snapshot.history.clone(),
            message: message.to_string(),
        };
        let reply = match tokio::time::timeout(self.timeout, self.dialogue.reply(&request)).await
        {
            Ok(Ok(reply)) => reply,
            Ok(Err(e)) => {
                warn!(session = %snapshot.session_id, error = %e, "Dialogue model failed");
                return Err(SessionError::Dialogue(e.into()));
            }
            Err(_) => {
                warn!(session = %snapshot.session_id, timeout = ?self.timeout, "Dialogue model timed out");
                return Err(SessionError::DialogueTimeout(self.timeout));
            }
        };

        let response = self.processor.process(
            &reply,
            &ResponseContext {
                cluster_id: scored_cluster,
                previous_confidence: outcome.previous_confidence,
                states: &clusters,
                suggested_next: Some(outcome.next_cluster),
            },
        );
        let next_cluster = response.next_cluster.unwrap_or(outcome.next_cluster);

        snapshot.clusters = clusters;
        snapshot.current_cluster = next_cluster;
        snapshot.complete = response.is_complete;
        snapshot
            .history
            .push(HistoryEntry::user(message, scored_cluster));
        snapshot
            .history
            .push(HistoryEntry::assistant(response.message.clone(), next_cluster));

        info!(
            session = %snapshot.session_id,
            cluster = %scored_cluster,
            next = %next_cluster,
            overall = outcome.overall_confidence,
            complete = response.is_complete,
            "Turn complete"
        );

        Ok(TurnReport {
            outcome,
            response,
            next_cluster,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialogue::ScriptedDialogue;
    use anyhow::Result;
    use arena_engine::{ClusterStatus, CompletionVerdict};
    use async_trait::async_trait;

    const PAIN: &str = "Vi har problem med manuella fakturor som kostar oss 50 000 kr varje månad och hela ekonomiteamet drabbas";

    struct SlowDialogue;

    #[async_trait]
    impl DialogueModel for SlowDialogue {
        async fn reply(&self, _request: &DialogueRequest) -> Result<String> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok("för sent".into())
        }
    }

    struct BrokenDialogue;

    #[async_trait]
    impl DialogueModel for BrokenDialogue {
        async fn reply(&self, _request: &DialogueRequest) -> Result<String> {
            anyhow::bail!("upstream 503")
        }
    }

    fn driver(dialogue: Arc<dyn DialogueModel>) -> SessionDriver {
        let engine = Arc::new(ArenaLogicEngine::new());
        SessionDriver::new(engine, dialogue, &SessionConfig::default())
    }

    #[tokio::test]
    async fn turn_commits_state_and_history() {
        let d = driver(Arc::new(ScriptedDialogue::new([
            "Tack! Hur påverkar det verksamheten?",
        ])));
        let mut snap = SessionSnapshot::new("s1", d.engine());
        let report = d.turn(&mut snap, PAIN).await.unwrap();

        assert_eq!(report.outcome.update.status, ClusterStatus::Complete);
        assert_eq!(report.response.verdict, CompletionVerdict::NotClaimed);
        assert_eq!(report.next_cluster, ClusterId::ImpactUrgency);
        assert_eq!(snap.current_cluster, ClusterId::ImpactUrgency);
        assert_eq!(snap.clusters[ClusterId::PainPoint].confidence, 100);
        assert_eq!(snap.history.len(), 2);
        assert!(!snap.complete);
        assert!(!d.guard().is_active("s1"));
    }

    #[tokio::test]
    async fn premature_claim_redirects_session() {
        let d = driver(Arc::new(ScriptedDialogue::new(["ANALYS_KLAR"])));
        let mut snap = SessionSnapshot::new("s1", d.engine());
        let report = d.turn(&mut snap, PAIN).await.unwrap();

        assert!(!report.response.is_complete);
        assert_eq!(
            report.response.verdict,
            CompletionVerdict::Overridden {
                redirect_to: ClusterId::ImpactUrgency
            }
        );
        assert_eq!(snap.current_cluster, ClusterId::ImpactUrgency);
        assert!(!snap.history[1].content.contains("ANALYS_KLAR"));
    }

    #[tokio::test]
    async fn busy_session_is_refused() {
        let d = driver(Arc::new(ScriptedDialogue::new(["hej"])));
        let mut snap = SessionSnapshot::new("s1", d.engine());
        let guard = Arc::clone(d.guard());
        let _held = guard.try_acquire("s1").unwrap();

        let err = d.turn(&mut snap, PAIN).await.unwrap_err();
        assert!(matches!(err, SessionError::Busy(ref id) if id == "s1"));
        assert_eq!(snap.clusters[ClusterId::PainPoint].confidence, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn dialogue_timeout_commits_nothing() {
        let d = driver(Arc::new(SlowDialogue));
        let mut snap = SessionSnapshot::new("s1", d.engine());
        let before = snap.clone();

        let err = d.turn(&mut snap, PAIN).await.unwrap_err();
        assert!(matches!(err, SessionError::DialogueTimeout(t) if t == Duration::from_secs(30)));
        assert_eq!(snap, before);
        assert!(!d.guard().is_active("s1"));
    }

    #[tokio::test]
    async fn dialogue_error_is_wrapped() {
        let d = driver(Arc::new(BrokenDialogue));
        let mut snap = SessionSnapshot::new("s1", d.engine());
        let err = d.turn(&mut snap, "Hej").await.unwrap_err();
        assert!(matches!(err, SessionError::Dialogue(_)));
        assert!(err.to_string().contains("upstream 503"));
        assert!(snap.history.is_empty());
    }

    #[test]
    fn snapshot_round_trips_as_json() {
        let engine = ArenaLogicEngine::new();
        let snap = SessionSnapshot::new("s1", &engine);
        let json = serde_json::to_string(&snap).unwrap();
        let back: SessionSnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(back, snap);
    }
}
