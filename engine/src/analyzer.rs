//! Information Analyzer — scores one message against one cluster's rubric
//!
//! Per point: 10 per distinct keyword hit, 25 per distinct pattern hit, plus
//! 10 for messages over 100 characters and another 10 over 200, capped at
//! 100. A point counts as found at 30. The cluster score is the unweighted
//! share of found points.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::catalog::{ratio_percent, ClusterRequirement, InformationPoint, RequirementCatalog};
use crate::cluster::ClusterId;
use crate::error::EngineResult;
use crate::questions::QuestionSelection;

const KEYWORD_SCORE: u32 = 10;
const PATTERN_SCORE: u32 = 25;
const LENGTH_BONUS: u32 = 10;
const LONG_MESSAGE_CHARS: usize = 100;
const VERY_LONG_MESSAGE_CHARS: usize = 200;
/// Point confidence at which a point counts as found
pub const FOUND_THRESHOLD: u8 = 30;

/// Scores a message for a cluster.
///
/// The engine talks to scoring only through this trait, so a failing or
/// panicking scorer can be injected in tests.
pub trait MessageScorer: Send + Sync {
    fn analyze(&self, cluster: ClusterId, message: &str) -> EngineResult<AnalysisResult>;
}

/// Which scoring path produced a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ScoringMode {
    /// Scored against the cluster's information points
    Catalog,
    /// Cluster has no point catalog; scored by message length
    LengthHeuristic,
}

/// Evidence for a single information point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointFinding {
    pub key: String,
    pub found: bool,
    /// 0–100
    pub confidence: u8,
    pub extracted_text: Option<String>,
}

/// Outcome of scoring one message against one cluster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub cluster_id: ClusterId,
    pub found_points: Vec<PointFinding>,
    /// `round(100 * found / total)`, 0–100
    pub total_score: u8,
    /// Descriptions of the points not yet found
    pub missing_points: Vec<String>,
    pub can_progress: bool,
    pub next_question: Option<String>,
    pub mode: ScoringMode,
}

impl AnalysisResult {
    pub fn found_count(&self) -> usize {
        self.found_points.iter().filter(|p| p.found).count()
    }

    pub fn found(&self) -> impl Iterator<Item = &PointFinding> + '_ {
        self.found_points.iter().filter(|p| p.found)
    }

    /// One-line summary for logs
    pub fn summary(&self) -> String {
        format!(
            "{} score={} found={}/{} progress={} mode={:?}",
            self.cluster_id,
            self.total_score,
            self.found_count(),
            self.found_points.len(),
            self.can_progress,
            self.mode
        )
    }
}

/// Rubric-driven scorer. Pure apart from random question selection.
#[derive(Debug, Clone)]
pub struct InformationAnalyzer {
    catalog: Arc<RequirementCatalog>,
    selection: QuestionSelection,
}

impl Default for InformationAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl InformationAnalyzer {
    /// Built-in catalog, random question selection
    pub fn new() -> Self {
        Self {
            catalog: RequirementCatalog::builtin(),
            selection: QuestionSelection::Random,
        }
    }

    pub fn with_catalog(mut self, catalog: Arc<RequirementCatalog>) -> Self {
        self.catalog = catalog;
        self
    }

    pub fn with_selection(mut self, selection: QuestionSelection) -> Self {
        self.selection = selection;
        self
    }

    pub fn catalog(&self) -> &Arc<RequirementCatalog> {
        &self.catalog
    }

    /// Score `message` against `cluster`.
    pub fn analyze_message(&self, cluster: ClusterId, message: &str) -> AnalysisResult {
        let requirement = self.catalog.requirement(cluster);
        if requirement.is_gap() {
            tracing::debug!(cluster = %cluster, "No point catalog, using length heuristic");
            return self.analyze_by_length(requirement, message);
        }

        let lower = message.to_lowercase();
        let length_bonus = length_bonus(message.chars().count());
        let found_points: Vec<PointFinding> = requirement
            .points
            .iter()
            .map(|p| score_point(p, message, &lower, length_bonus))
            .collect();

        let found_count = found_points.iter().filter(|p| p.found).count();
        let total_score = ratio_percent(found_count, requirement.points.len());
        let can_progress = found_count >= requirement.minimum_points
            && total_score >= requirement.progress_threshold;

        let missing: Vec<&InformationPoint> = requirement
            .points
            .iter()
            .zip(&found_points)
            .filter(|(_, f)| !f.found)
            .map(|(p, _)| p)
            .collect();
        let next_question = missing.first().map(|p| {
            self.catalog
                .questions()
                .pick(self.selection, cluster, &p.key, &p.description, message)
        });

        AnalysisResult {
            cluster_id: cluster,
            found_points,
            total_score,
            missing_points: missing.iter().map(|p| p.description.clone()).collect(),
            can_progress,
            next_question,
            mode: ScoringMode::Catalog,
        }
    }

    fn analyze_by_length(&self, requirement: &ClusterRequirement, message: &str) -> AnalysisResult {
        let total_score = length_heuristic_score(message.chars().count());
        let can_progress = total_score >= requirement.progress_threshold;
        AnalysisResult {
            cluster_id: requirement.id,
            found_points: Vec::new(),
            total_score,
            missing_points: if can_progress {
                Vec::new()
            } else {
                vec![requirement.description.clone()]
            },
            can_progress,
            next_question: (!can_progress).then(|| requirement.id.opening_question().to_string()),
            mode: ScoringMode::LengthHeuristic,
        }
    }
}

impl MessageScorer for InformationAnalyzer {
    fn analyze(&self, cluster: ClusterId, message: &str) -> EngineResult<AnalysisResult> {
        Ok(self.analyze_message(cluster, message))
    }
}

fn length_bonus(chars: usize) -> u32 {
    let mut bonus = 0;
    if chars > LONG_MESSAGE_CHARS {
        bonus += LENGTH_BONUS;
    }
    if chars > VERY_LONG_MESSAGE_CHARS {
        bonus += LENGTH_BONUS;
    }
    bonus
}

/// Score for clusters without a point catalog.
pub fn length_heuristic_score(chars: usize) -> u8 {
    match chars {
        c if c >= 200 => 80,
        c if c >= 100 => 50,
        c if c >= 40 => 25,
        _ => 0,
    }
}

fn score_point(
    point: &InformationPoint,
    message: &str,
    lower: &str,
    length_bonus: u32,
) -> PointFinding {
    let keyword_hits: Vec<&str> = point
        .keywords
        .iter()
        .filter(|kw| lower.contains(kw.as_str()))
        .map(|kw| kw.trim())
        .collect();

    let mut pattern_hits = 0u32;
    let mut longest: Option<&str> = None;
    for re in &point.patterns {
        if let Some(m) = re.find(message) {
            pattern_hits += 1;
            if longest.map_or(true, |l| m.as_str().len() > l.len()) {
                longest = Some(m.as_str());
            }
        }
    }

    let raw = keyword_hits.len() as u32 * KEYWORD_SCORE + pattern_hits * PATTERN_SCORE + length_bonus;
    let confidence = raw.min(100) as u8;

    let extracted_text = match longest {
        Some(m) => Some(m.trim().to_string()),
        None if !keyword_hits.is_empty() => Some(keyword_hits.join(", ")),
        None => None,
    };

    PointFinding {
        key: point.key.clone(),
        found: confidence >= FOUND_THRESHOLD,
        confidence,
        extracted_text,
    }
}
