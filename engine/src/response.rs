//! Response Processor — reconciles the dialogue model's completion claim with
//! the engine's gating
//!
//! The model signals that it considers the interview done by including
//! [`COMPLETION_MARKER`] in its reply. That claim is advisory: it is confirmed
//! only when every completion gate holds, and is otherwise replaced by a
//! redirect to the weakest cluster.

use serde::{Deserialize, Serialize};

use crate::cluster::{ClusterId, ClusterMap};
use crate::completion::CompletionPolicy;
use crate::config::EngineConfig;
use crate::state::{ClusterState, ClusterUpdate};

/// Literal the dialogue model emits when it believes the interview is done.
pub const COMPLETION_MARKER: &str = "ANALYS_KLAR";

/// Used when a confirmed completion reply is too short to show on its own.
pub const COMPLETION_MESSAGE: &str = "Tack! Nu har jag all information jag behöver. Jag sammanställer analysen och återkommer med en rapport.";

/// What the processor concluded about a completion claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum CompletionVerdict {
    /// Reply did not contain the marker
    NotClaimed,
    /// Marker present and every gate holds
    Confirmed,
    /// Marker present but gating failed; the reply was replaced
    Overridden { redirect_to: ClusterId },
}

/// Per-turn inputs besides the reply itself.
#[derive(Debug, Clone, Copy)]
pub struct ResponseContext<'a> {
    /// Cluster scored this turn
    pub cluster_id: ClusterId,
    /// Its confidence before the turn
    pub previous_confidence: u8,
    /// Session state after the turn
    pub states: &'a ClusterMap<ClusterState>,
    /// Engine's next-cluster suggestion
    pub suggested_next: Option<ClusterId>,
}

/// Final outward message and flags for the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessedResponse {
    pub message: String,
    pub is_complete: bool,
    pub cluster_update: ClusterUpdate,
    /// Display only
    pub confidence_impact: i32,
    pub next_cluster: Option<ClusterId>,
    pub verdict: CompletionVerdict,
}

#[derive(Debug, Clone, Copy)]
pub struct ResponseProcessor {
    policy: CompletionPolicy,
    min_completion_message_chars: usize,
}

impl Default for ResponseProcessor {
    fn default() -> Self {
        Self::from_config(&EngineConfig::default())
    }
}

impl ResponseProcessor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self {
            policy: CompletionPolicy::from_config(config),
            min_completion_message_chars: config.min_completion_message_chars,
        }
    }

    pub fn process(&self, reply: &str, ctx: &ResponseContext<'_>) -> ProcessedResponse {
        let claimed = reply.contains(COMPLETION_MARKER);
        let text = strip_marker(reply);
        let current = &ctx.states[ctx.cluster_id];
        let cluster_update = ctx.states.update_for(ctx.cluster_id);
        let confidence_impact =
            i32::from(current.confidence) - i32::from(ctx.previous_confidence);

        let (message, is_complete, next_cluster, verdict) = if !claimed {
            (text, false, ctx.suggested_next, CompletionVerdict::NotClaimed)
        } else {
            match self.policy.lowest_unmet(ctx.states) {
                None => {
                    let message = if text.chars().count() < self.min_completion_message_chars {
                        COMPLETION_MESSAGE.to_string()
                    } else {
                        text
                    };
                    tracing::info!(cluster = %ctx.cluster_id, "Completion confirmed");
                    (message, true, None, CompletionVerdict::Confirmed)
                }
                Some(target) => {
                    let gates = self.policy.gates(ctx.states);
                    tracing::warn!(
                        redirect_to = %target,
                        overall = gates.overall_confidence,
                        all_clusters = gates.all_clusters,
                        critical_clusters = gates.critical_clusters,
                        mean = gates.mean,
                        "Premature completion claim overridden"
                    );
                    (
                        redirect_message(target),
                        false,
                        Some(target),
                        CompletionVerdict::Overridden {
                            redirect_to: target,
                        },
                    )
                }
            }
        };

        ProcessedResponse {
            message,
            is_complete,
            cluster_update,
            confidence_impact,
            next_cluster,
            verdict,
        }
    }
}

/// Remove every marker occurrence and tidy the whitespace around it.
pub fn strip_marker(reply: &str) -> String {
    reply
        .split(COMPLETION_MARKER)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Message steering the interview back to `cluster`.
pub fn redirect_message(cluster: ClusterId) -> String {
    format!(
        "Innan vi sammanfattar behöver jag veta lite mer om {}. {}",
        cluster.topic(),
        cluster.opening_question()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::initialize_clusters;

    fn with(confidences: [u8; 6]) -> ClusterMap<ClusterState> {
        let mut states = initialize_clusters();
        for (id, c) in ClusterId::ALL.into_iter().zip(confidences) {
            states[id].confidence = c;
        }
        states
    }

    fn ctx(states: &ClusterMap<ClusterState>) -> ResponseContext<'_> {
        ResponseContext {
            cluster_id: ClusterId::Resources,
            previous_confidence: 60,
            states,
            suggested_next: Some(ClusterId::OrgReality),
        }
    }

    #[test]
    fn test_plain_reply_passes_through() {
        let states = with([80, 80, 80, 75, 40, 0]);
        let out = ResponseProcessor::new().process("  Hur många är ni?  ", &ctx(&states));
        assert_eq!(out.message, "Hur många är ni?");
        assert!(!out.is_complete);
        assert_eq!(out.verdict, CompletionVerdict::NotClaimed);
        assert_eq!(out.next_cluster, Some(ClusterId::OrgReality));
        assert_eq!(out.confidence_impact, 15);
        assert_eq!(out.cluster_update.cluster_id, ClusterId::Resources);
    }

    #[test]
    fn test_premature_claim_redirects_to_weakest_unmet() {
        let states = with([90, 90, 85, 75, 72, 0]);
        let out = ResponseProcessor::new().process("Bra jobbat! ANALYS_KLAR", &ctx(&states));
        assert!(!out.is_complete);
        assert_eq!(
            out.verdict,
            CompletionVerdict::Overridden {
                redirect_to: ClusterId::Alternatives
            }
        );
        assert_eq!(out.next_cluster, Some(ClusterId::Alternatives));
        assert!(out.message.contains(ClusterId::Alternatives.topic()));
        assert!(!out.message.contains(COMPLETION_MARKER));
    }

    #[test]
    fn test_confirmed_short_reply_gets_canned_message() {
        let states = with([95, 95, 90, 90, 80, 80]);
        let out = ResponseProcessor::new().process("Klart! ANALYS_KLAR", &ctx(&states));
        assert!(out.is_complete);
        assert_eq!(out.verdict, CompletionVerdict::Confirmed);
        assert_eq!(out.message, COMPLETION_MESSAGE);
        assert_eq!(out.next_cluster, None);
    }

    #[test]
    fn test_confirmed_long_reply_is_kept() {
        let states = with([95, 95, 90, 90, 80, 80]);
        let out = ResponseProcessor::new().process(
            "Tack för ett mycket givande samtal, nu sammanfattar jag. ANALYS_KLAR",
            &ctx(&states),
        );
        assert!(out.is_complete);
        assert_eq!(
            out.message,
            "Tack för ett mycket givande samtal, nu sammanfattar jag."
        );
    }

    #[test]
    fn test_strip_marker_mid_text() {
        assert_eq!(strip_marker("Tack. ANALYS_KLAR Vi hörs!"), "Tack. Vi hörs!");
        assert_eq!(strip_marker("ANALYS_KLAR"), "");
    }

    #[test]
    fn test_verdict_serializes_with_kind_tag() {
        let v = CompletionVerdict::Overridden {
            redirect_to: ClusterId::PainPoint,
        };
        assert_eq!(
            serde_json::to_string(&v).unwrap(),
            r#"{"kind":"overridden","redirect_to":"pain-point"}"#
        );
    }
}
