//! Arena Logic Engine — per-turn orchestration
//!
//! Combines analyzer output, triggers and the caller's cluster state to decide
//! where the interview goes next. Deterministic apart from follow-up question
//! wording; holds no session state of its own.

use std::collections::HashSet;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::analyzer::{AnalysisResult, InformationAnalyzer, MessageScorer};
use crate::catalog::RequirementCatalog;
use crate::cluster::{ClusterId, ClusterMap};
use crate::completion::{overall_confidence, CompletionGates, CompletionPolicy};
use crate::config::EngineConfig;
use crate::contradiction::ContradictionDetector;
use crate::error::{EngineError, EngineResult};
use crate::state::{self, ClusterState, ClusterStatus, ClusterUpdate, Contradiction};
use crate::triggers::{Trigger, TriggerDetector};

/// Trigger routing, checked in this order. The first rule whose target is
/// still below the switch gate wins.
const TRIGGER_ROUTES: [(Trigger, ClusterId); 5] = [
    (Trigger::UrgencyDetected, ClusterId::ImpactUrgency),
    (Trigger::ResourceConstraint, ClusterId::Resources),
    (Trigger::SuccessCriteria, ClusterId::SuccessCheck),
    (Trigger::OrgContext, ClusterId::OrgReality),
    (Trigger::AlternativeMentioned, ClusterId::Alternatives),
];

/// Everything one turn produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TurnOutcome {
    /// Cluster the message was scored against
    pub cluster_id: ClusterId,
    pub previous_confidence: u8,
    /// `None` when scoring failed and the turn left confidence unchanged
    pub analysis: Option<AnalysisResult>,
    pub update: ClusterUpdate,
    /// Triggers raised by this message
    pub triggers: Vec<Trigger>,
    /// Correction phrase, when this turn recorded a contradiction
    pub contradiction: Option<String>,
    pub next_cluster: ClusterId,
    pub overall_confidence: u8,
    pub session_complete: bool,
}

impl TurnOutcome {
    pub fn confidence_delta(&self) -> i32 {
        i32::from(self.update.confidence) - i32::from(self.previous_confidence)
    }
}

/// The orchestrator. Cheap to share behind an `Arc` across sessions.
pub struct ArenaLogicEngine {
    config: EngineConfig,
    catalog: Arc<RequirementCatalog>,
    scorer: Arc<dyn MessageScorer>,
    triggers: TriggerDetector,
    contradictions: ContradictionDetector,
    policy: CompletionPolicy,
}

impl Default for ArenaLogicEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl ArenaLogicEngine {
    /// Built-in catalog and default thresholds
    pub fn new() -> Self {
        let config = EngineConfig::default();
        let catalog = RequirementCatalog::builtin();
        let scorer = InformationAnalyzer::new().with_catalog(Arc::clone(&catalog));
        Self::assemble(config, catalog, Arc::new(scorer))
    }

    /// Validate `config` and load its catalog, if one is named.
    pub fn with_config(config: EngineConfig) -> EngineResult<Self> {
        config.validate()?;
        let catalog = match &config.catalog_path {
            Some(path) => Arc::new(RequirementCatalog::load(path)?),
            None => RequirementCatalog::builtin(),
        };
        let scorer = InformationAnalyzer::new()
            .with_catalog(Arc::clone(&catalog))
            .with_selection(config.question_selection());
        Ok(Self::assemble(config, catalog, Arc::new(scorer)))
    }

    /// Replace the scorer. Status transitions still use this engine's catalog.
    pub fn with_scorer(mut self, scorer: Arc<dyn MessageScorer>) -> Self {
        self.scorer = scorer;
        self
    }

    fn assemble(
        config: EngineConfig,
        catalog: Arc<RequirementCatalog>,
        scorer: Arc<dyn MessageScorer>,
    ) -> Self {
        Self {
            policy: CompletionPolicy::from_config(&config),
            config,
            catalog,
            scorer,
            triggers: TriggerDetector::new(),
            contradictions: ContradictionDetector::new(),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn catalog(&self) -> &Arc<RequirementCatalog> {
        &self.catalog
    }

    pub fn policy(&self) -> &CompletionPolicy {
        &self.policy
    }

    /// Score a message directly, without touching any state. Errors and
    /// panics are not contained here.
    pub fn analyze(&self, cluster: ClusterId, message: &str) -> EngineResult<AnalysisResult> {
        self.scorer.analyze(cluster, message)
    }

    pub fn detect_triggers(&self, message: &str) -> Vec<Trigger> {
        self.triggers.detect(message)
    }

    pub fn initialize_clusters(&self) -> ClusterMap<ClusterState> {
        state::initialize_clusters()
    }

    /// Pick the cluster the next question should target.
    pub fn select_next_cluster(
        &self,
        current: ClusterId,
        states: &ClusterMap<ClusterState>,
        last_message: &str,
        external_triggers: &[Trigger],
    ) -> ClusterId {
        let here = &states[current];
        if here.confidence < self.config.stay_threshold && !here.has_open_contradictions() {
            return current;
        }

        let mut active: HashSet<Trigger> = external_triggers.iter().copied().collect();
        active.extend(self.triggers.detect(last_message));

        for (trigger, target) in TRIGGER_ROUTES {
            if active.contains(&trigger) && states[target].confidence < self.config.switch_gate {
                tracing::debug!(from = %current, to = %target, trigger = %trigger, "Trigger route");
                return target;
            }
        }

        self.default_progression(current, states)
    }

    /// First cluster below the switch gate, scanning forward from `current`
    /// and wrapping. `alternatives` when every cluster is past the gate.
    fn default_progression(&self, current: ClusterId, states: &ClusterMap<ClusterState>) -> ClusterId {
        let start = current.position();
        (0..ClusterId::ALL.len())
            .map(|offset| ClusterId::ALL[(start + offset) % ClusterId::ALL.len()])
            .find(|id| states[*id].confidence < self.config.switch_gate)
            .unwrap_or(ClusterId::Alternatives)
    }

    pub fn calculate_overall_confidence(&self, states: &ClusterMap<ClusterState>) -> u8 {
        overall_confidence(states)
    }

    pub fn is_session_complete(&self, states: &ClusterMap<ClusterState>) -> bool {
        self.policy.is_complete(states)
    }

    pub fn completion_gates(&self, states: &ClusterMap<ClusterState>) -> CompletionGates {
        self.policy.gates(states)
    }

    /// Run one user turn against `current`, updating `states` in place.
    ///
    /// Scoring failures, whether returned or panicked, leave the cluster's
    /// confidence unchanged and never reach the caller.
    pub fn score_turn(
        &self,
        current: ClusterId,
        message: &str,
        states: &mut ClusterMap<ClusterState>,
    ) -> TurnOutcome {
        let now = Utc::now();
        let requirement = self.catalog.requirement(current);
        let analysis = self.contained_analysis(current, message);
        let correction = self.contradictions.detect(message);

        let cluster = &mut states[current];
        if cluster.id != current {
            tracing::warn!(slot = %current, stored = %cluster.id, "Cluster state stored under the wrong slot");
            cluster.id = current;
        }
        let previous_confidence = cluster.confidence;
        let had_insights = !cluster.key_insights.is_empty();
        let mut contradiction = None;

        if let Some(result) = &analysis {
            let confirmed: HashSet<&str> = result.found().map(|p| p.key.as_str()).collect();
            for finding in result.found() {
                let excerpt = finding.extracted_text.as_deref().unwrap_or(message);
                cluster.record_insight(&finding.key, excerpt, now);
            }

            let mut confidence = previous_confidence.max(result.total_score);
            if let Some(phrase) = correction.filter(|_| had_insights) {
                for insight in cluster
                    .key_insights
                    .iter_mut()
                    .filter(|i| !confirmed.contains(i.point_key.as_str()))
                {
                    insight.disputed = true;
                }
                cluster.contradictions.push(Contradiction {
                    note: phrase.clone(),
                    detected_at: now,
                    resolved: false,
                });
                confidence = confidence.saturating_sub(self.config.contradiction_penalty);
                tracing::debug!(cluster = %current, phrase = %phrase, "Contradiction recorded");
                contradiction = Some(phrase);
            } else {
                let covered: HashSet<&str> = cluster.covered_points().collect();
                confidence = confidence.max(requirement.coverage(&covered));
                if !confirmed.is_empty() {
                    let resolved = cluster.resolve_contradictions();
                    if resolved > 0 {
                        tracing::debug!(cluster = %current, resolved, "Contradictions resolved");
                    }
                }
            }
            cluster.set_confidence(i32::from(confidence));

            tracing::debug!(
                cluster = %current,
                score = result.total_score,
                found = result.found_count(),
                previous = previous_confidence,
                confidence = cluster.confidence,
                "Turn scored"
            );
        }

        // a failed analysis leaves status and timestamps alone
        if analysis.is_some() {
            let covered: HashSet<&str> = cluster.covered_points().collect();
            let covered_count = requirement
                .points
                .iter()
                .filter(|p| covered.contains(p.key.as_str()))
                .count();
            let met = cluster.confidence >= requirement.progress_threshold
                && covered_count >= requirement.minimum_points;
            let before = cluster.status;
            let after = cluster.transition(met, now);
            if before != after {
                match after {
                    ClusterStatus::Complete => {
                        tracing::info!(cluster = %current, confidence = cluster.confidence, "Cluster complete")
                    }
                    ClusterStatus::NeedsRevisit => {
                        tracing::info!(cluster = %current, confidence = cluster.confidence, "Cluster needs revisit")
                    }
                    _ => {}
                }
            }
        }

        let triggers = self.triggers.detect(message);
        for t in &triggers {
            if !cluster.triggers.contains(t) {
                cluster.triggers.push(*t);
            }
        }
        let update = states.update_for(current);

        let next_cluster = self.select_next_cluster(current, states, message, &[]);
        let gates = self.policy.gates(states);
        if gates.is_complete() {
            tracing::info!(overall = gates.overall_confidence, "All completion gates hold");
        }

        TurnOutcome {
            cluster_id: current,
            previous_confidence,
            analysis,
            update,
            triggers,
            contradiction,
            next_cluster,
            overall_confidence: gates.overall_confidence,
            session_complete: gates.is_complete(),
        }
    }

    /// Run the scorer behind a boundary that turns errors and panics into
    /// `None`.
    fn contained_analysis(&self, cluster: ClusterId, message: &str) -> Option<AnalysisResult> {
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| self.scorer.analyze(cluster, message)));
        let failure = match outcome {
            Ok(Ok(result)) => return Some(result),
            Ok(Err(e)) => e,
            Err(payload) => EngineError::AnalysisFailure {
                cluster: cluster.to_string(),
                reason: panic_message(payload.as_ref()),
            },
        };
        tracing::warn!(cluster = %cluster, error = %failure, "Analysis failed, confidence unchanged");
        None
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "scorer panicked".to_string()
    }
}
