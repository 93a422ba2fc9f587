//! Cluster identifiers and the closed per-cluster record.

use std::ops::{Index, IndexMut};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::EngineError;

/// The six fixed thematic stages of the interview.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ClusterId {
    /// What hurts, how much, how often, and for whom
    PainPoint,
    /// Business impact and how soon it must be fixed
    ImpactUrgency,
    /// How success will be recognised and measured
    SuccessCheck,
    /// Budget, people, competence and time
    Resources,
    /// Decision makers, stakeholders and existing systems
    OrgReality,
    /// Options considered, tried or competing
    Alternatives,
}

impl ClusterId {
    /// Default progression order. Also the tie-break order everywhere.
    pub const ALL: [ClusterId; 6] = [
        Self::PainPoint,
        Self::ImpactUrgency,
        Self::SuccessCheck,
        Self::Resources,
        Self::OrgReality,
        Self::Alternatives,
    ];

    /// Critical clusters must clear the stricter completion floor.
    pub fn is_critical(&self) -> bool {
        matches!(
            self,
            Self::PainPoint | Self::ImpactUrgency | Self::SuccessCheck | Self::Resources
        )
    }

    /// Position in the default progression order.
    pub fn position(&self) -> usize {
        match self {
            Self::PainPoint => 0,
            Self::ImpactUrgency => 1,
            Self::SuccessCheck => 2,
            Self::Resources => 3,
            Self::OrgReality => 4,
            Self::Alternatives => 5,
        }
    }

    /// Kebab-case id as used on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PainPoint => "pain-point",
            Self::ImpactUrgency => "impact-urgency",
            Self::SuccessCheck => "success-check",
            Self::Resources => "resources",
            Self::OrgReality => "org-reality",
            Self::Alternatives => "alternatives",
        }
    }

    /// Short user-facing phrase describing what the cluster covers.
    pub fn topic(&self) -> &'static str {
        match self {
            Self::PainPoint => "utmaningen ni vill lösa",
            Self::ImpactUrgency => "hur problemet påverkar er och hur brådskande det är",
            Self::SuccessCheck => "hur ni kommer att mäta att lösningen lyckats",
            Self::Resources => "vilka resurser ni kan avsätta",
            Self::OrgReality => "hur beslut fattas och vilka som berörs i organisationen",
            Self::Alternatives => "vilka alternativ ni har övervägt",
        }
    }

    /// Opening question used when steering the interview into this cluster.
    pub fn opening_question(&self) -> &'static str {
        match self {
            Self::PainPoint => "Vilket är det största problemet ni vill lösa just nu?",
            Self::ImpactUrgency => {
                "Vad händer med verksamheten om problemet inte blir löst de närmaste månaderna?"
            }
            Self::SuccessCheck => "Hur skulle ni märka att en lösning faktiskt fungerar?",
            Self::Resources => "Vilken budget och vilka personer kan ni avsätta för det här?",
            Self::OrgReality => "Vem fattar beslutet och vilka andra behöver vara med?",
            Self::Alternatives => "Vilka andra lösningar har ni tittat på eller testat?",
        }
    }
}

impl std::fmt::Display for ClusterId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ClusterId {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|id| id.as_str() == s.trim())
            .ok_or_else(|| EngineError::InvalidClusterId(s.to_string()))
    }
}

/// One value per cluster, as a closed record.
///
/// Serializes as an object keyed by cluster id. Every cluster is always
/// present, so lookups cannot fail. Only `ClusterMap<ClusterState>` is
/// deserialized, through a checked impl in `state`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct ClusterMap<T> {
    pub pain_point: T,
    pub impact_urgency: T,
    pub success_check: T,
    pub resources: T,
    pub org_reality: T,
    pub alternatives: T,
}

impl<T> ClusterMap<T> {
    /// Build a map by calling `f` once per cluster, in progression order.
    pub fn from_fn(mut f: impl FnMut(ClusterId) -> T) -> Self {
        Self {
            pain_point: f(ClusterId::PainPoint),
            impact_urgency: f(ClusterId::ImpactUrgency),
            success_check: f(ClusterId::SuccessCheck),
            resources: f(ClusterId::Resources),
            org_reality: f(ClusterId::OrgReality),
            alternatives: f(ClusterId::Alternatives),
        }
    }

    pub fn get(&self, id: ClusterId) -> &T {
        match id {
            ClusterId::PainPoint => &self.pain_point,
            ClusterId::ImpactUrgency => &self.impact_urgency,
            ClusterId::SuccessCheck => &self.success_check,
            ClusterId::Resources => &self.resources,
            ClusterId::OrgReality => &self.org_reality,
            ClusterId::Alternatives => &self.alternatives,
        }
    }

    pub fn get_mut(&mut self, id: ClusterId) -> &mut T {
        match id {
            ClusterId::PainPoint => &mut self.pain_point,
            ClusterId::ImpactUrgency => &mut self.impact_urgency,
            ClusterId::SuccessCheck => &mut self.success_check,
            ClusterId::Resources => &mut self.resources,
            ClusterId::OrgReality => &mut self.org_reality,
            ClusterId::Alternatives => &mut self.alternatives,
        }
    }

    /// Iterate in progression order.
    pub fn iter(&self) -> impl Iterator<Item = (ClusterId, &T)> + '_ {
        ClusterId::ALL.iter().map(move |&id| (id, self.get(id)))
    }

    pub fn values(&self) -> impl Iterator<Item = &T> + '_ {
        self.iter().map(|(_, v)| v)
    }

    pub fn map<U>(&self, mut f: impl FnMut(ClusterId, &T) -> U) -> ClusterMap<U> {
        ClusterMap::from_fn(|id| f(id, self.get(id)))
    }
}

impl<T> Index<ClusterId> for ClusterMap<T> {
    type Output = T;

    fn index(&self, id: ClusterId) -> &T {
        self.get(id)
    }
}

impl<T> IndexMut<ClusterId> for ClusterMap<T> {
    fn index_mut(&mut self, id: ClusterId) -> &mut T {
        self.get_mut(id)
    }
}
