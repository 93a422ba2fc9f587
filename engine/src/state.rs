//! Per-session cluster state, owned and round-tripped by the caller.

use chrono::{DateTime, Utc};
use serde::{de, Deserialize, Deserializer, Serialize};

use crate::cluster::{ClusterId, ClusterMap};
use crate::error::{EngineError, EngineResult};
use crate::triggers::Trigger;

/// Lifecycle of a single cluster within a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ClusterStatus {
    NotStarted,
    InProgress,
    Complete,
    /// Was complete, then fell back below its threshold
    NeedsRevisit,
}

impl std::fmt::Display for ClusterStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotStarted => write!(f, "not-started"),
            Self::InProgress => write!(f, "in-progress"),
            Self::Complete => write!(f, "complete"),
            Self::NeedsRevisit => write!(f, "needs-revisit"),
        }
    }
}

/// An information point the user has covered, with the text that covered it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyInsight {
    /// Key of the catalog point this insight satisfies
    pub point_key: String,
    /// Excerpt of the user's message that satisfied it
    pub excerpt: String,
    /// Set when a later correction put this insight in doubt
    #[serde(default)]
    pub disputed: bool,
    pub recorded_at: DateTime<Utc>,
}

/// A correction the user made after insights had been recorded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contradiction {
    /// The correction phrase that was detected
    pub note: String,
    pub detected_at: DateTime<Utc>,
    #[serde(default)]
    pub resolved: bool,
}

/// State of one cluster in one session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterState {
    pub id: ClusterId,
    pub status: ClusterStatus,
    /// 0–100
    #[serde(deserialize_with = "deserialize_confidence")]
    pub confidence: u8,
    #[serde(default)]
    pub key_insights: Vec<KeyInsight>,
    #[serde(default)]
    pub contradictions: Vec<Contradiction>,
    #[serde(default)]
    pub triggers: Vec<Trigger>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub last_updated: Option<DateTime<Utc>>,
}

impl ClusterState {
    /// Fresh, untouched cluster.
    pub fn new(id: ClusterId) -> Self {
        Self {
            id,
            status: ClusterStatus::NotStarted,
            confidence: 0,
            key_insights: Vec::new(),
            contradictions: Vec::new(),
            triggers: Vec::new(),
            completed_at: None,
            last_updated: None,
        }
    }

    /// Set the confidence, clamped to 0–100.
    pub fn set_confidence(&mut self, value: i32) {
        self.confidence = clamp_confidence(value);
    }

    pub fn has_open_contradictions(&self) -> bool {
        self.contradictions.iter().any(|c| !c.resolved)
    }

    pub fn resolve_contradictions(&mut self) -> usize {
        let mut n = 0;
        for c in self.contradictions.iter_mut().filter(|c| !c.resolved) {
            c.resolved = true;
            n += 1;
        }
        n
    }

    /// Keys of insights that are not currently disputed.
    pub fn covered_points(&self) -> impl Iterator<Item = &str> + '_ {
        self.key_insights
            .iter()
            .filter(|i| !i.disputed)
            .map(|i| i.point_key.as_str())
    }

    /// Record or re-confirm an insight for `point_key`.
    pub fn record_insight(&mut self, point_key: &str, excerpt: &str, now: DateTime<Utc>) {
        if let Some(existing) = self
            .key_insights
            .iter_mut()
            .find(|i| i.point_key == point_key)
        {
            existing.disputed = false;
            if excerpt.len() > existing.excerpt.len() {
                existing.excerpt = excerpt.to_string();
            }
            existing.recorded_at = now;
            return;
        }
        self.key_insights.push(KeyInsight {
            point_key: point_key.to_string(),
            excerpt: excerpt.to_string(),
            disputed: false,
            recorded_at: now,
        });
    }

    /// Advance the status machine after an analysis pass.
    ///
    /// `requirement_met` is the full completion criterion for this cluster
    /// (confidence threshold and minimum covered points).
    pub fn transition(&mut self, requirement_met: bool, now: DateTime<Utc>) -> ClusterStatus {
        let next = match (self.status, requirement_met) {
            (_, true) => ClusterStatus::Complete,
            (ClusterStatus::Complete | ClusterStatus::NeedsRevisit, false) => {
                ClusterStatus::NeedsRevisit
            }
            (ClusterStatus::NotStarted | ClusterStatus::InProgress, false) => {
                ClusterStatus::InProgress
            }
        };
        match next {
            ClusterStatus::Complete if self.status != ClusterStatus::Complete => {
                self.completed_at = Some(now);
            }
            ClusterStatus::NeedsRevisit => self.completed_at = None,
            _ => {}
        }
        self.status = next;
        self.last_updated = Some(now);
        next
    }
}

impl ClusterMap<ClusterState> {
    /// Check state handed back by a caller: each slot must hold its own
    /// cluster and every confidence must be within 0–100.
    pub fn validate(&self) -> EngineResult<()> {
        for (slot, state) in self.iter() {
            if state.id != slot {
                return Err(EngineError::InvalidClusterId(format!(
                    "{} stored under {slot}",
                    state.id
                )));
            }
            if state.confidence > 100 {
                return Err(EngineError::ConfidenceOutOfRange {
                    cluster: slot.to_string(),
                    value: state.confidence,
                });
            }
        }
        Ok(())
    }

    /// Delta for `id`, tagged with the slot it was read from.
    pub fn update_for(&self, id: ClusterId) -> ClusterUpdate {
        let state = &self[id];
        ClusterUpdate {
            cluster_id: id,
            confidence: state.confidence,
            status: state.status,
            last_updated: state.last_updated.unwrap_or_else(Utc::now),
        }
    }
}

impl<'de> Deserialize<'de> for ClusterMap<ClusterState> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(rename_all = "kebab-case")]
        struct Slots {
            pain_point: ClusterState,
            impact_urgency: ClusterState,
            success_check: ClusterState,
            resources: ClusterState,
            org_reality: ClusterState,
            alternatives: ClusterState,
        }

        let slots = Slots::deserialize(deserializer)?;
        let states = ClusterMap {
            pain_point: slots.pain_point,
            impact_urgency: slots.impact_urgency,
            success_check: slots.success_check,
            resources: slots.resources,
            org_reality: slots.org_reality,
            alternatives: slots.alternatives,
        };
        states.validate().map_err(de::Error::custom)?;
        Ok(states)
    }
}

/// Delta the caller merges into its own copy of the session state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterUpdate {
    pub cluster_id: ClusterId,
    #[serde(deserialize_with = "deserialize_confidence")]
    pub confidence: u8,
    pub status: ClusterStatus,
    pub last_updated: DateTime<Utc>,
}

fn deserialize_confidence<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u8, D::Error> {
    let value = u8::deserialize(deserializer)?;
    if value > 100 {
        return Err(de::Error::custom(format!(
            "confidence {value} is outside 0-100"
        )));
    }
    Ok(value)
}

/// Clamp any integer into the 0–100 confidence range.
pub fn clamp_confidence(value: i32) -> u8 {
    value.clamp(0, 100) as u8
}

/// State for a brand-new session: pain-point in progress, everything else
/// untouched, all confidences zero.
pub fn initialize_clusters() -> ClusterMap<ClusterState> {
    ClusterMap::from_fn(|id| {
        let mut state = ClusterState::new(id);
        if id == ClusterId::PainPoint {
            state.status = ClusterStatus::InProgress;
        }
        state
    })
}
