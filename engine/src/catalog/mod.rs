//! Requirement Catalog — the per-cluster scoring rubric
//!
//! Each cluster lists the information points an interview must surface, with
//! the keywords and patterns that evidence them. The built-in rubric is
//! compiled once; alternative rubrics can be loaded from TOML.
//!
//! # TOML layout
//!
//! ```toml
//! [pain-point]
//! name = "Smärtpunkt"
//! minimum_points = 3
//! progress_threshold = 75
//!
//! [[pain-point.points]]
//! key = "problem_description"
//! description = "Beskrivning av huvudproblemet"
//! keywords = ["problem", "utmaning"]
//! patterns = ['(?i)\bproblem\w*\s+med\b']
//! weight = 4
//! questions = [{ text = "Vad är det största problemet?", weight = 2 }]
//! ```
//!
//! Clusters absent from the file, or present with no points, are scored by
//! the length heuristic instead.

mod builtin;

use std::collections::{BTreeMap, HashSet};
use std::path::Path;
use std::sync::{Arc, LazyLock};

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::cluster::{ClusterId, ClusterMap};
use crate::error::{EngineError, EngineResult};
use crate::questions::{QuestionBank, QuestionTemplate};

static BUILTIN_CATALOG: LazyLock<Arc<RequirementCatalog>> = LazyLock::new(|| {
    let specs = ClusterMap::from_fn(|id| Some(builtin::definition(id).to_spec()));
    Arc::new(
        RequirementCatalog::from_specs(specs, QuestionBank::builtin())
            .expect("built-in catalog is valid"),
    )
});

/// One discrete fact a cluster needs, with its evidence rules.
#[derive(Debug, Clone)]
pub struct InformationPoint {
    pub key: String,
    pub description: String,
    /// Lowercase substrings
    pub keywords: Vec<String>,
    pub patterns: Vec<Regex>,
    /// 1–4. Declared importance; not used by the score aggregate.
    pub weight: u8,
}

/// Rubric for a single cluster.
#[derive(Debug, Clone)]
pub struct ClusterRequirement {
    pub id: ClusterId,
    pub name: String,
    pub description: String,
    pub points: Vec<InformationPoint>,
    /// Points that must be found before the cluster can progress
    pub minimum_points: usize,
    /// Score (percent) required before the cluster can progress
    pub progress_threshold: u8,
}

impl ClusterRequirement {
    /// No point catalog; scored by the length heuristic.
    pub fn is_gap(&self) -> bool {
        self.points.is_empty()
    }

    pub fn point(&self, key: &str) -> Option<&InformationPoint> {
        self.points.iter().find(|p| p.key == key)
    }

    /// Equal-weight coverage of `covered` keys, as a percentage.
    pub fn coverage(&self, covered: &HashSet<&str>) -> u8 {
        if self.points.is_empty() {
            return 0;
        }
        let n = self
            .points
            .iter()
            .filter(|p| covered.contains(p.key.as_str()))
            .count();
        ratio_percent(n, self.points.len())
    }

    /// Weight-adjusted coverage. Reported for telemetry only; confidence and
    /// gating use [`ClusterRequirement::coverage`].
    pub fn weighted_coverage(&self, covered: &HashSet<&str>) -> u8 {
        let total: u32 = self.points.iter().map(|p| u32::from(p.weight)).sum();
        if total == 0 {
            return 0;
        }
        let hit: u32 = self
            .points
            .iter()
            .filter(|p| covered.contains(p.key.as_str()))
            .map(|p| u32::from(p.weight))
            .sum();
        ((f64::from(hit) * 100.0) / f64::from(total)).round() as u8
    }
}

/// `round(100 * n / total)`, zero when `total` is zero.
pub(crate) fn ratio_percent(n: usize, total: usize) -> u8 {
    if total == 0 {
        return 0;
    }
    ((n as f64 * 100.0) / total as f64).round().min(100.0) as u8
}

/// Uncompiled point definition, as written in TOML.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PointSpec {
    pub key: String,
    pub description: String,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub patterns: Vec<String>,
    #[serde(default = "default_point_weight")]
    pub weight: u8,
    #[serde(default)]
    pub questions: Vec<QuestionTemplate>,
}

fn default_point_weight() -> u8 {
    1
}

/// Uncompiled cluster rubric, as written in TOML.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequirementSpec {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub minimum_points: usize,
    #[serde(default = "default_progress_threshold")]
    pub progress_threshold: u8,
    #[serde(default)]
    pub points: Vec<PointSpec>,
}

fn default_progress_threshold() -> u8 {
    75
}

/// The complete rubric for all six clusters plus their follow-up questions.
#[derive(Debug, Clone)]
pub struct RequirementCatalog {
    requirements: ClusterMap<ClusterRequirement>,
    questions: QuestionBank,
}

impl RequirementCatalog {
    /// Shared handle to the compiled built-in catalog.
    pub fn builtin() -> Arc<Self> {
        Arc::clone(&BUILTIN_CATALOG)
    }

    /// Compile a catalog. `None` marks a cluster with no point catalog.
    pub fn from_specs(
        specs: ClusterMap<Option<RequirementSpec>>,
        mut questions: QuestionBank,
    ) -> EngineResult<Self> {
        let mut first_error = None;
        let requirements = specs.map(|id, spec| {
            let compiled = match spec {
                Some(spec) => compile_requirement(id, spec, &mut questions),
                None => Ok(gap_requirement(id)),
            };
            compiled.unwrap_or_else(|e| {
                first_error.get_or_insert(e);
                gap_requirement(id)
            })
        });
        if let Some(e) = first_error {
            return Err(e);
        }
        Ok(Self {
            requirements,
            questions,
        })
    }

    /// Parse a TOML catalog. Clusters missing from the document become gaps.
    pub fn from_toml_str(content: &str) -> EngineResult<Self> {
        let raw: BTreeMap<String, RequirementSpec> = toml::from_str(content)?;
        let mut by_id = BTreeMap::new();
        for (key, spec) in raw {
            by_id.insert(key.parse::<ClusterId>()?, spec);
        }
        let specs = ClusterMap::from_fn(|id| by_id.remove(&id));
        Self::from_specs(specs, QuestionBank::builtin())
    }

    pub fn load(path: &Path) -> EngineResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| EngineError::FileRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    pub fn requirement(&self, id: ClusterId) -> &ClusterRequirement {
        self.requirements.get(id)
    }

    pub fn requirements(&self) -> &ClusterMap<ClusterRequirement> {
        &self.requirements
    }

    pub fn questions(&self) -> &QuestionBank {
        &self.questions
    }
}

fn gap_requirement(id: ClusterId) -> ClusterRequirement {
    ClusterRequirement {
        id,
        name: id.as_str().to_string(),
        description: id.topic().to_string(),
        points: Vec::new(),
        minimum_points: 0,
        progress_threshold: default_progress_threshold(),
    }
}

fn compile_requirement(
    id: ClusterId,
    spec: &RequirementSpec,
    questions: &mut QuestionBank,
) -> EngineResult<ClusterRequirement> {
    if spec.progress_threshold > 100 {
        return Err(EngineError::Config(format!(
            "{id}: progress_threshold {} exceeds 100",
            spec.progress_threshold
        )));
    }
    if spec.minimum_points > spec.points.len() {
        return Err(EngineError::Config(format!(
            "{id}: minimum_points {} exceeds the {} defined points",
            spec.minimum_points,
            spec.points.len()
        )));
    }

    let mut seen = HashSet::new();
    let mut points = Vec::with_capacity(spec.points.len());
    for p in &spec.points {
        if !seen.insert(p.key.as_str()) {
            return Err(EngineError::Config(format!(
                "{id}: duplicate point key {}",
                p.key
            )));
        }
        if !(1..=4).contains(&p.weight) {
            return Err(EngineError::Config(format!(
                "{id}/{}: weight {} outside 1-4",
                p.key, p.weight
            )));
        }
        let patterns = p
            .patterns
            .iter()
            .map(|src| {
                Regex::new(src).map_err(|source| EngineError::InvalidPattern {
                    point: p.key.clone(),
                    source,
                })
            })
            .collect::<EngineResult<Vec<_>>>()?;
        if !p.questions.is_empty() {
            questions.set(&p.key, p.questions.clone());
        }
        points.push(InformationPoint {
            key: p.key.clone(),
            description: p.description.clone(),
            keywords: p.keywords.iter().map(|k| k.to_lowercase()).collect(),
            patterns,
            weight: p.weight,
        });
    }

    Ok(ClusterRequirement {
        id,
        name: if spec.name.is_empty() {
            id.as_str().to_string()
        } else {
            spec.name.clone()
        },
        description: if spec.description.is_empty() {
            id.topic().to_string()
        } else {
            spec.description.clone()
        },
        points,
        minimum_points: spec.minimum_points,
        progress_threshold: spec.progress_threshold,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_has_four_points_everywhere() {
        let catalog = RequirementCatalog::builtin();
        for (id, req) in catalog.requirements().iter() {
            assert_eq!(req.points.len(), 4, "{id}");
            assert!(!req.is_gap());
            assert!(req.minimum_points <= req.points.len());
            for p in &req.points {
                assert!((1..=4).contains(&p.weight));
                assert!(!p.keywords.is_empty());
                assert!(!p.patterns.is_empty());
                assert!(
                    catalog.questions().templates(&p.key).len() >= 2,
                    "{} lacks questions",
                    p.key
                );
            }
        }
    }

    #[test]
    fn test_builtin_keys_are_unique_across_clusters() {
        let catalog = RequirementCatalog::builtin();
        let mut keys = HashSet::new();
        for req in catalog.requirements().values() {
            for p in &req.points {
                assert!(keys.insert(p.key.clone()), "duplicate key {}", p.key);
            }
        }
        assert_eq!(keys.len(), 24);
    }

    #[test]
    fn test_coverage_is_equal_weight() {
        let catalog = RequirementCatalog::builtin();
        let req = catalog.requirement(ClusterId::PainPoint);
        let covered: HashSet<&str> = ["problem_description"].into_iter().collect();
        assert_eq!(req.coverage(&covered), 25);
        // problem_description carries weight 4 of 12
        assert_eq!(req.weighted_coverage(&covered), 33);
    }

    #[test]
    fn test_bad_pattern_is_rejected() {
        let toml = r#"
            [resources]
            minimum_points = 1
            [[resources.points]]
            key = "budget"
            description = "Budget"
            patterns = ["(unclosed"]
        "#;
        let err = RequirementCatalog::from_toml_str(toml).unwrap_err();
        assert!(matches!(err, EngineError::InvalidPattern { ref point, .. } if point == "budget"));
    }

    #[test]
    fn test_minimum_points_beyond_catalog_is_rejected() {
        let toml = r#"
            [resources]
            minimum_points = 2
            [[resources.points]]
            key = "budget"
            description = "Budget"
        "#;
        assert!(matches!(
            RequirementCatalog::from_toml_str(toml),
            Err(EngineError::Config(_))
        ));
    }

    #[test]
    fn test_weight_out_of_range_is_rejected() {
        let toml = r#"
            [[alternatives.points]]
            key = "x"
            description = "X"
            weight = 9
        "#;
        assert!(matches!(
            RequirementCatalog::from_toml_str(toml),
            Err(EngineError::Config(_))
        ));
    }

    #[test]
    fn test_unknown_cluster_key_is_rejected() {
        let toml = r#"
            [budget]
            minimum_points = 0
        "#;
        assert!(matches!(
            RequirementCatalog::from_toml_str(toml),
            Err(EngineError::InvalidClusterId(ref s)) if s == "budget"
        ));
    }

    #[test]
    fn test_missing_clusters_become_gaps() {
        let toml = r#"
            [pain-point]
            name = "Problem"
            minimum_points = 1
            progress_threshold = 50
            [[pain-point.points]]
            key = "problem_description"
            description = "Huvudproblemet"
            keywords = ["PROBLEM"]
            questions = [{ text = "Vad är problemet?" }]
        "#;
        let catalog = RequirementCatalog::from_toml_str(toml).unwrap();
        let pain = catalog.requirement(ClusterId::PainPoint);
        assert_eq!(pain.name, "Problem");
        assert_eq!(pain.points[0].keywords, vec!["problem".to_string()]);
        assert_eq!(pain.points[0].weight, 1);
        assert_eq!(
            catalog.questions().templates("problem_description")[0].text,
            "Vad är problemet?"
        );
        for id in [ClusterId::Resources, ClusterId::OrgReality] {
            let req = catalog.requirement(id);
            assert!(req.is_gap());
            assert_eq!(req.minimum_points, 0);
        }
    }
}
