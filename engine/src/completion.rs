//! Session completion gating
//!
//! Three gates, each checked on its own:
//!
//! ```text
//! (a) every cluster          >= cluster_floor  (70)
//! (b) every critical cluster >= critical_floor (80)
//! (c) mean of all six        >= mean_floor     (85)
//! ```
//!
//! None implies another: six clusters at 84 pass (a) and (b) but fail (c),
//! and a critical cluster at 75 can fail (b) while the mean still clears (c).

use serde::{Deserialize, Serialize};

use crate::cluster::{ClusterId, ClusterMap};
use crate::config::EngineConfig;
use crate::state::ClusterState;

/// Result of evaluating each completion gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionGates {
    pub all_clusters: bool,
    pub critical_clusters: bool,
    pub mean: bool,
    pub overall_confidence: u8,
}

impl CompletionGates {
    pub fn is_complete(&self) -> bool {
        self.all_clusters && self.critical_clusters && self.mean
    }
}

/// Completion thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompletionPolicy {
    pub cluster_floor: u8,
    pub critical_floor: u8,
    pub mean_floor: u8,
}

impl Default for CompletionPolicy {
    fn default() -> Self {
        Self::from_config(&EngineConfig::default())
    }
}

impl CompletionPolicy {
    pub fn from_config(config: &EngineConfig) -> Self {
        Self {
            cluster_floor: config.cluster_floor,
            critical_floor: config.critical_floor,
            mean_floor: config.mean_floor,
        }
    }

    /// The confidence `id` must reach for gates (a) and (b).
    pub fn bar(&self, id: ClusterId) -> u8 {
        if id.is_critical() {
            self.critical_floor.max(self.cluster_floor)
        } else {
            self.cluster_floor
        }
    }

    pub fn gates(&self, states: &ClusterMap<ClusterState>) -> CompletionGates {
        let all_clusters = states.values().all(|s| s.confidence >= self.cluster_floor);
        let critical_clusters = states
            .iter()
            .filter(|(id, _)| id.is_critical())
            .all(|(_, s)| s.confidence >= self.critical_floor);
        let overall = overall_confidence(states);
        CompletionGates {
            all_clusters,
            critical_clusters,
            mean: overall >= self.mean_floor,
            overall_confidence: overall,
        }
    }

    pub fn is_complete(&self, states: &ClusterMap<ClusterState>) -> bool {
        self.gates(states).is_complete()
    }

    /// The cluster an interview should return to before it can finish.
    ///
    /// Lowest-confidence cluster below its bar; if every cluster clears its
    /// bar but the mean does not, the lowest-confidence cluster overall.
    /// Ties go to the earlier cluster. `None` once the session is complete.
    pub fn lowest_unmet(&self, states: &ClusterMap<ClusterState>) -> Option<ClusterId> {
        if self.is_complete(states) {
            return None;
        }
        lowest(states, |id, s| s.confidence < self.bar(id)).or_else(|| lowest(states, |_, _| true))
    }
}

fn lowest(
    states: &ClusterMap<ClusterState>,
    include: impl Fn(ClusterId, &ClusterState) -> bool,
) -> Option<ClusterId> {
    let mut best: Option<(ClusterId, u8)> = None;
    for (id, s) in states.iter().filter(|(id, s)| include(*id, *s)) {
        if best.map_or(true, |(_, c)| s.confidence < c) {
            best = Some((id, s.confidence));
        }
    }
    best.map(|(id, _)| id)
}

/// Unweighted mean of the six cluster confidences, rounded.
pub fn overall_confidence(states: &ClusterMap<ClusterState>) -> u8 {
    let sum: u32 = states.values().map(|s| u32::from(s.confidence)).sum();
    (f64::from(sum) / ClusterId::ALL.len() as f64).round() as u8
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

    #[test]
    fn test_gates_are_independent() {
        let policy = CompletionPolicy::default();

        // all at 84: (a) and (b) hold, (c) fails
        let g = policy.gates(&with([84; 6]));
        assert!(g.all_clusters && g.critical_clusters && !g.mean);

        // critical at 75, rest high: (a) holds, (b) fails, (c) holds
        let g = policy.gates(&with([75, 95, 95, 95, 100, 100]));
        assert!(g.all_clusters && !g.critical_clusters && g.mean);
        assert!(!g.is_complete());

        // non-critical at 60: (a) fails only
        let g = policy.gates(&with([100, 100, 100, 100, 60, 100]));
        assert!(!g.all_clusters && g.critical_clusters && g.mean);

        assert!(policy.is_complete(&with([90, 90, 85, 85, 80, 80])));
    }

    #[test]
    fn test_overall_confidence_rounds_mean() {
        assert_eq!(overall_confidence(&with([60, 80, 80, 80, 80, 80])), 77);
        assert_eq!(overall_confidence(&with([0; 6])), 0);
        assert_eq!(overall_confidence(&with([100; 6])), 100);
        assert_eq!(overall_confidence(&with([1, 0, 0, 0, 0, 2])), 1);
    }

    #[test]
    fn test_lowest_unmet_prefers_clusters_below_their_bar() {
        let policy = CompletionPolicy::default();
        // org-reality at 72 clears its bar of 70; resources at 78 misses 80
        let states = with([90, 90, 90, 78, 72, 90]);
        assert_eq!(policy.lowest_unmet(&states), Some(ClusterId::Resources));
    }

    #[test]
    fn test_lowest_unmet_falls_back_to_lowest_overall() {
        let policy = CompletionPolicy::default();
        let states = with([84, 84, 84, 84, 84, 84]);
        assert_eq!(policy.lowest_unmet(&states), Some(ClusterId::PainPoint));
        let states = with([84, 84, 84, 84, 71, 84]);
        assert_eq!(policy.lowest_unmet(&states), Some(ClusterId::OrgReality));
    }

    #[test]
    fn test_lowest_unmet_ties_use_fixed_order() {
        let policy = CompletionPolicy::default();
        let states = with([90, 50, 90, 50, 90, 90]);
        assert_eq!(policy.lowest_unmet(&states), Some(ClusterId::ImpactUrgency));
        assert_eq!(policy.lowest_unmet(&with([100; 6])), None);
    }
}
