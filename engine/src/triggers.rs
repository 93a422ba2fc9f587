//! Trigger Detection — coarse topic signals in a single message
//!
//! Triggers are independent of the cluster currently being scored. Several
//! can fire on the same message; the engine decides which one wins.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::EngineError;

/// Topic signal raised by a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Trigger {
    PainPointDetected,
    UrgencyDetected,
    ResourceConstraint,
    SuccessCriteria,
    OrgContext,
    AlternativeMentioned,
}

impl Trigger {
    pub const ALL: [Trigger; 6] = [
        Self::PainPointDetected,
        Self::UrgencyDetected,
        Self::ResourceConstraint,
        Self::SuccessCriteria,
        Self::OrgContext,
        Self::AlternativeMentioned,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PainPointDetected => "pain-point-detected",
            Self::UrgencyDetected => "urgency-detected",
            Self::ResourceConstraint => "resource-constraint",
            Self::SuccessCriteria => "success-criteria",
            Self::OrgContext => "org-context",
            Self::AlternativeMentioned => "alternative-mentioned",
        }
    }

    /// Lowercase keyword group that raises this trigger.
    fn keywords(&self) -> &'static [&'static str] {
        match self {
            Self::PainPointDetected => &[
                "problem",
                "utmaning",
                "frustrer",
                "krångl",
                "ineffektiv",
                "flaskhals",
                "tidskrävande",
                "struggle",
                "pain point",
            ],
            Self::UrgencyDetected => &[
                "bråttom",
                "brådskande",
                "akut",
                "omgående",
                "så snart som möjligt",
                "deadline",
                "senast",
                "asap",
                "urgent",
            ],
            Self::ResourceConstraint => &[
                "budget",
                "resurser",
                "bemanning",
                "ont om tid",
                "brist på",
                "inte råd",
                "kapacitet",
                "underbemannad",
                "headcount",
            ],
            Self::SuccessCriteria => &[
                "framgång",
                "lyckat",
                "lyckas",
                "mål",
                "kpi",
                "nyckeltal",
                "mätbar",
                "success",
            ],
            Self::OrgContext => &[
                "ledning",
                "styrelse",
                "organisation",
                "chef",
                "beslutsfattare",
                "förankr",
                "ägare",
                "management",
            ],
            Self::AlternativeMentioned => &[
                "alternativ",
                "konkurrent",
                "annan lösning",
                "andra lösningar",
                "leverantör",
                "istället",
                "tittat på",
                "competitor",
            ],
        }
    }
}

impl std::fmt::Display for Trigger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Trigger {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == s.trim())
            .ok_or_else(|| EngineError::InvalidTrigger(s.to_string()))
    }
}

/// Keyword scanner for topic triggers.
#[derive(Debug, Clone, Copy, Default)]
pub struct TriggerDetector;

impl TriggerDetector {
    pub fn new() -> Self {
        Self
    }

    /// All triggers whose keyword group appears in `message`, in declaration
    /// order and without duplicates.
    pub fn detect(&self, message: &str) -> Vec<Trigger> {
        let lower = message.to_lowercase();
        Trigger::ALL
            .iter()
            .copied()
            .filter(|t| t.keywords().iter().any(|kw| lower.contains(kw)))
            .collect()
    }
}
