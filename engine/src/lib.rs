//! Arena Engine — adaptive cluster progression for guided business interviews
//!
//! Scores each user message against a fixed rubric of six information
//! clusters, decides which cluster the interview should target next, and
//! gates the interview's completion. Pure, synchronous and deterministic
//! apart from follow-up question wording; the caller owns and round-trips
//! all session state.
//!
//! # Turn flow
//!
//! ```text
//! user message
//!     │
//!     ├─ InformationAnalyzer (current cluster) ── AnalysisResult
//!     │      └─ empty rubric → length heuristic
//!     ├─ ClusterState: insights, confidence, contradictions, status
//!     ├─ TriggerDetector (independent scan)
//!     │
//!     ▼
//! ArenaLogicEngine::select_next_cluster
//!     │  stay below 70 ─► trigger routes (target < 80) ─► default order
//!     ▼
//! dialogue model reply (external)
//!     │
//!     ▼
//! ResponseProcessor ── ANALYS_KLAR confirmed only if every gate holds,
//!                      otherwise redirected to the weakest cluster
//! ```

pub mod analyzer;
pub mod catalog;
pub mod cluster;
pub mod completion;
pub mod config;
pub mod contradiction;
pub mod engine;
pub mod error;
pub mod questions;
pub mod response;
pub mod state;
pub mod triggers;

pub use analyzer::{
    AnalysisResult, InformationAnalyzer, MessageScorer, PointFinding, ScoringMode,
    FOUND_THRESHOLD,
};
pub use catalog::{
    ClusterRequirement, InformationPoint, PointSpec, RequirementCatalog, RequirementSpec,
};
pub use cluster::{ClusterId, ClusterMap};
pub use completion::{overall_confidence, CompletionGates, CompletionPolicy};
pub use config::EngineConfig;
pub use contradiction::ContradictionDetector;
pub use engine::{ArenaLogicEngine, TurnOutcome};
pub use error::{EngineError, EngineResult};
pub use questions::{QuestionBank, QuestionSelection, QuestionTemplate};
pub use response::{
    CompletionVerdict, ProcessedResponse, ResponseContext, ResponseProcessor, COMPLETION_MARKER,
};
pub use state::{
    initialize_clusters, ClusterState, ClusterStatus, ClusterUpdate, Contradiction, KeyInsight,
};
pub use triggers::{Trigger, TriggerDetector};
