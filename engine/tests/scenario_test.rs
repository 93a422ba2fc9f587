//! Integration tests for the interview engine
//!
//! Drives the public API end to end: scoring, routing, completion gating and
//! response reconciliation.

use arena_engine::{
    initialize_clusters, ArenaLogicEngine, ClusterId, ClusterMap, ClusterState, ClusterStatus,
    CompletionVerdict, EngineConfig, InformationAnalyzer, QuestionSelection, ResponseContext,
    ResponseProcessor, RequirementCatalog, Trigger, COMPLETION_MARKER,
};

const SCENARIO_A: &str = "Vi har problem med manuella fakturor som kostar oss 50 000 kr varje månad och hela ekonomiteamet drabbas";

fn seeded_engine() -> ArenaLogicEngine {
    ArenaLogicEngine::with_config(EngineConfig {
        question_seed: Some(11),
        ..EngineConfig::default()
    })
    .expect("default config is valid")
}

fn with(confidences: [u8; 6]) -> ClusterMap<ClusterState> {
    let mut states = initialize_clusters();
    for (id, c) in ClusterId::ALL.into_iter().zip(confidences) {
        states[id].confidence = c;
    }
    states
}

/// Test: a rich pain-point message satisfies the whole cluster
#[test]
fn test_scenario_a_full_pain_point() {
    let result = seeded_engine()
        .analyze(ClusterId::PainPoint, SCENARIO_A)
        .unwrap();
    assert_eq!(result.found_count(), 4);
    assert_eq!(result.total_score, 100);
    assert!(result.can_progress);
}

/// Test: a greeting scores nothing and asks about the first missing point
#[test]
fn test_scenario_b_greeting() {
    let engine = seeded_engine();
    let result = engine.analyze(ClusterId::PainPoint, "Hej").unwrap();
    assert_eq!(result.found_count(), 0);
    assert_eq!(result.total_score, 0);
    assert!(!result.can_progress);

    let question = result.next_question.expect("a follow-up question");
    let templates = engine.catalog().questions().templates("problem_description");
    assert!(templates.iter().any(|t| t.text == question));
}

/// Test: one weak critical cluster blocks completion
#[test]
fn test_scenario_c_weak_pain_point() {
    let engine = ArenaLogicEngine::new();
    let states = with([60, 80, 80, 80, 80, 80]);
    assert!(!engine.is_session_complete(&states));
    assert_eq!(engine.calculate_overall_confidence(&states), 77);
}

/// Test: a premature completion claim is overridden and redirected
#[test]
fn test_scenario_d_premature_claim() {
    let states = with([85, 82, 40, 65, 75, 70]);
    let ctx = ResponseContext {
        cluster_id: ClusterId::SuccessCheck,
        previous_confidence: 30,
        states: &states,
        suggested_next: None,
    };
    let out = ResponseProcessor::new().process("Bra jobbat! ANALYS_KLAR", &ctx);
    assert!(!out.is_complete);
    assert_eq!(out.next_cluster, Some(ClusterId::SuccessCheck));
    assert_eq!(
        out.verdict,
        CompletionVerdict::Overridden {
            redirect_to: ClusterId::SuccessCheck
        }
    );
    assert!(!out.message.contains(COMPLETION_MARKER));
    assert!(out.message.contains(ClusterId::SuccessCheck.opening_question()));
    assert_eq!(out.confidence_impact, 10);
}

/// Test: an org-context trigger pulls the interview to org-reality
#[test]
fn test_scenario_e_trigger_routing() {
    let engine = ArenaLogicEngine::new();
    let states = with([90, 90, 90, 85, 40, 0]);
    let next = engine.select_next_cluster(
        ClusterId::Resources,
        &states,
        "Ingen kommentar",
        &[Trigger::OrgContext],
    );
    assert_eq!(next, ClusterId::OrgReality);

    let from_message = engine.select_next_cluster(
        ClusterId::Resources,
        &states,
        "Det är styrelsen som bestämmer",
        &[],
    );
    assert_eq!(from_message, ClusterId::OrgReality);
}

/// Test: critical gate holds even when the mean clears 85
#[test]
fn test_critical_gate_regression_guard() {
    let engine = ArenaLogicEngine::new();
    let states = with([79, 100, 100, 100, 100, 100]);
    let gates = engine.completion_gates(&states);
    assert!(gates.mean);
    assert!(gates.all_clusters);
    assert!(!gates.critical_clusters);
    assert!(!engine.is_session_complete(&states));
}

/// Test: overall confidence does not depend on JSON key order
#[test]
fn test_overall_confidence_ignores_key_order() {
    let states = with([10, 20, 30, 40, 50, 60]);
    let json = serde_json::to_value(&states).unwrap();
    let obj = json.as_object().unwrap();

    let reversed: Vec<String> = obj
        .iter()
        .rev()
        .map(|(k, v)| format!("{}:{}", serde_json::to_string(k).unwrap(), v))
        .collect();
    let text = format!("{{{}}}", reversed.join(","));
    let back: ClusterMap<ClusterState> = serde_json::from_str(&text).unwrap();

    let engine = ArenaLogicEngine::new();
    assert_eq!(engine.calculate_overall_confidence(&back), 35);
    assert_eq!(back, states);
}

/// Test: caller state cannot smuggle confidences past the completion gates
#[test]
fn test_round_trip_rejects_inflated_confidence() {
    let mut json = serde_json::to_value(initialize_clusters()).unwrap();
    for slot in json.as_object_mut().unwrap().values_mut() {
        slot["confidence"] = serde_json::json!(250);
        slot["status"] = serde_json::json!("complete");
    }
    let err = serde_json::from_value::<ClusterMap<ClusterState>>(json).unwrap_err();
    assert!(err.to_string().contains("250"));
}

/// Test: a state filed under the wrong cluster is refused on load
#[test]
fn test_round_trip_rejects_mismatched_slot() {
    let mut json = serde_json::to_value(initialize_clusters()).unwrap();
    json["pain-point"]["id"] = serde_json::json!("alternatives");
    assert!(serde_json::from_value::<ClusterMap<ClusterState>>(json).is_err());
}

/// Test: stay rule wins over every trigger
#[test]
fn test_stay_rule_with_all_triggers() {
    let engine = ArenaLogicEngine::new();
    for c in [0u8, 30, 69] {
        let states = with([c, 0, 0, 0, 0, 0]);
        let next = engine.select_next_cluster(
            ClusterId::PainPoint,
            &states,
            "akut budget kpi ledning konkurrent",
            &Trigger::ALL,
        );
        assert_eq!(next, ClusterId::PainPoint);
    }
}

/// Test: a scripted interview runs every cluster to completion
#[test]
fn test_full_interview_reaches_completion() {
    let engine = seeded_engine();
    let processor = ResponseProcessor::from_config(engine.config());
    let mut states = engine.initialize_clusters();
    let mut current = ClusterId::PainPoint;

    let answers = [
        SCENARIO_A,
        "Det påverkar oss mycket, vi förlorar kunder. Det är väldigt bråttom och måste vara löst innan sommaren, om vi inte agerar riskerar vi att tappa fler.",
        "Framgång är att fakturorna hanteras automatiskt. Vi vill minska handpåläggningen med 80 procent inom sex månader och följa upp i en månadsrapport.",
        "Vi har en budget på 300 000 kr och två personer på deltid. Vår IT-avdelning har kompetens inom integrationer, men vi har ont om tid i december.",
        "Ekonomichefen fattar beslutet tillsammans med VD, men vi behöver förankra det hos ekonomiavdelningen. Det finns ett visst motstånd mot förändring, och vi använder Visma idag.",
        "Vi har tittat på alternativ och testat en annan leverantör tidigare, priset var avgörande.",
    ];

    for answer in answers {
        let outcome = engine.score_turn(current, answer, &mut states);
        assert!(outcome.analysis.is_some());
        assert_eq!(
            outcome.update.status,
            ClusterStatus::Complete,
            "{current} did not complete: {:?}",
            outcome.analysis.as_ref().map(|a| a.summary())
        );
        current = outcome.next_cluster;
    }

    assert!(engine.is_session_complete(&states));
    let ctx = ResponseContext {
        cluster_id: ClusterId::Alternatives,
        previous_confidence: 0,
        states: &states,
        suggested_next: None,
    };
    let out = processor.process("ANALYS_KLAR", &ctx);
    assert!(out.is_complete);
    assert_eq!(out.verdict, CompletionVerdict::Confirmed);
    assert_eq!(out.confidence_impact, 100);
}

/// Test: a catalog with empty clusters scores them by length
#[test]
fn test_heuristic_fallback_through_engine() {
    let toml = r#"
[pain-point]
minimum_points = 1
progress_threshold = 50

[[pain-point.points]]
key = "problem"
description = "Problemet"
keywords = ["problem"]
"#;
    let catalog = std::sync::Arc::new(RequirementCatalog::from_toml_str(toml).unwrap());
    let analyzer = InformationAnalyzer::new()
        .with_catalog(catalog)
        .with_selection(QuestionSelection::Seeded(3));
    let engine = ArenaLogicEngine::new().with_scorer(std::sync::Arc::new(analyzer));

    let mut states = engine.initialize_clusters();
    let long = "Vi har ungefär en halv miljon att röra oss med och kan frigöra två personer under våren, men de har annat att göra också och det är tight med tiden.";
    assert!(long.chars().count() >= 100);
    let outcome = engine.score_turn(ClusterId::Resources, long, &mut states);
    let analysis = outcome.analysis.unwrap();
    assert_eq!(analysis.total_score, 50);
    assert!(analysis.found_points.is_empty());
    assert_eq!(states[ClusterId::Resources].confidence, 50);
}
