//! End-to-end integration tests for Vigil
//!
//! These tests exercise real multi-component scenarios:
//! - Full analyze flows through both fusion policies
//! - Case-log forwarding for high/critical outcomes
//! - Knowledge-base rebuild atomicity under concurrent retrieval
//! - Fail-open behavior with a broken classifier artifact
//! - Configuration defaults carrying the fusion constants

use std::collections::HashMap;
use std::sync::Arc;

use vigil_core::case_log::CaseLog;
use vigil_core::config::{RetrievalConfig, VigilConfig};
use vigil_risk::classifier::{ClassifierHandle, LinearModel};
use vigil_risk::knowledge::{KnowledgeDocument, KnowledgeStore};
use vigil_risk::risk_engine::{FusionPolicy, RiskEngine};
use vigil_risk::types::{AnalysisRequest, ContextMessage, RiskLevel};

fn request(text: &str, messages: Vec<ContextMessage>) -> AnalysisRequest {
    AnalysisRequest {
        text: text.into(),
        conversation_id: Some("conv-1".into()),
        user_id: Some("user-1".into()),
        context_messages: messages,
    }
}

fn user(content: &str) -> ContextMessage {
    ContextMessage { role: "user".into(), content: content.into() }
}

fn positive_classifier() -> ClassifierHandle {
    let mut vocabulary = HashMap::new();
    vocabulary.insert("myself".to_string(), 0usize);
    let model = LinearModel {
        vocabulary,
        idf: vec![1.0],
        coefficients: vec![8.0],
        intercept: -3.0,
    };
    ClassifierHandle::from_model(model, 0.5)
}

// ── Scenario 1: Simplified flow forwards critical cases ──────────────────

#[test]
fn test_critical_case_is_forwarded_to_case_log() {
    let case_log = Arc::new(CaseLog::new(100));
    let engine = RiskEngine::new(FusionPolicy::Simplified, positive_classifier())
        .with_case_log(case_log.clone());

    let assessment =
        engine.analyze(&request("I want to kill myself tonight, I have a plan", vec![]));

    assert_eq!(assessment.risk_level, RiskLevel::Critical);
    assert!(assessment.flagged);
    assert_eq!(case_log.total_logged(), 1);

    let cases = case_log.recent(1);
    assert_eq!(cases[0].risk_level, "critical");
    assert!(cases[0].requires_immediate_attention);
    assert_eq!(cases[0].user_id.as_deref(), Some("user-1"));
}

#[test]
fn test_case_log_sink_fault_never_blocks_the_assessment() {
    let case_log =
        Arc::new(CaseLog::new(100).with_file("/nonexistent-dir/vigil/cases.jsonl"));
    let engine = RiskEngine::new(FusionPolicy::Simplified, positive_classifier())
        .with_case_log(case_log.clone());

    let assessment =
        engine.analyze(&request("I want to kill myself tonight, I have a plan", vec![]));

    assert_eq!(assessment.risk_level, RiskLevel::Critical);
    assert_eq!(case_log.total_sink_failures(), 1);
    assert_eq!(case_log.recent(1).len(), 1);
}

#[test]
fn test_low_outcomes_are_not_forwarded() {
    let case_log = Arc::new(CaseLog::new(100));
    let engine = RiskEngine::new(FusionPolicy::Simplified, ClassifierHandle::unavailable())
        .with_case_log(case_log.clone());

    let assessment = engine.analyze(&request("I had a good day", vec![]));
    assert_eq!(assessment.risk_level, RiskLevel::Low);
    assert_eq!(case_log.total_logged(), 0);
}

// ── Scenario 2: Enhanced flow end-to-end ─────────────────────────────────

#[test]
fn test_enhanced_flow_with_corpus_and_context() {
    let store = Arc::new(KnowledgeStore::new(RetrievalConfig::default()));
    let engine = RiskEngine::new(FusionPolicy::Enhanced, positive_classifier())
        .with_knowledge(store)
        .with_top_k(5);

    let messages = vec![
        user("the pain never stops, i want to die"),
        user("i am a burden, everything is hopeless, i want to end it"),
    ];
    let assessment =
        engine.analyze(&request("I want to kill myself, I have a plan to end my life", messages));

    assert!(assessment.classifier_positive);
    assert!(assessment.risk_level >= RiskLevel::High);
    assert!(assessment.flagged);
    assert!(assessment
        .risk_factors
        .iter()
        .any(|f| f.starts_with("Machine learning classification")));
    assert!(assessment
        .risk_factors
        .iter()
        .any(|f| f.contains("Escalating pattern")));
    assert!(assessment.knowledge_matches.len() <= 3);
    assert!((0.0..=1.0).contains(&assessment.confidence));
}

// ── Scenario 3: Rebuild atomicity under concurrent retrieval ─────────────

#[test]
fn test_concurrent_rebuild_never_yields_a_mixed_result_set() {
    // Two single-passage documents before the update, four after. Every
    // retrieval during the update must see exactly one generation: a result
    // of 2 or 4 passages, never 3.
    let seed = vec![
        KnowledgeDocument {
            title: "One".into(),
            content: "first seeded reference document with enough words to pass the filter".into(),
            category: "warning_signs".into(),
        },
        KnowledgeDocument {
            title: "Two".into(),
            content: "second seeded reference document with enough words to pass the filter".into(),
            category: "resources".into(),
        },
    ];
    let store = Arc::new(KnowledgeStore::with_documents(seed, RetrievalConfig::default()));
    assert_eq!(store.passage_count(), 2);

    let writer = {
        let store = store.clone();
        std::thread::spawn(move || {
            store.add_documents(vec![
                KnowledgeDocument {
                    title: "Three".into(),
                    content: "third appended reference document with enough words to pass the filter".into(),
                    category: "risk_factors".into(),
                },
                KnowledgeDocument {
                    title: "Four".into(),
                    content: "fourth appended reference document with enough words to pass the filter".into(),
                    category: "intervention".into(),
                },
            ]);
        })
    };

    let readers: Vec<_> = (0..4)
        .map(|_| {
            let store = store.clone();
            std::thread::spawn(move || {
                for _ in 0..200 {
                    let len = store.retrieve("reference document", 5).len();
                    assert!(len == 2 || len == 4, "mixed result set of {} passages", len);
                }
            })
        })
        .collect();

    writer.join().expect("writer thread");
    for reader in readers {
        reader.join().expect("reader thread");
    }
    assert_eq!(store.passage_count(), 4);
}

// ── Scenario 4: Broken classifier artifact fails open ────────────────────

#[test]
fn test_broken_artifact_degrades_to_lexical_signals() {
    let dir = std::env::temp_dir().join("vigil-integration");
    std::fs::create_dir_all(&dir).expect("temp dir");
    let path = dir.join("corrupt_model.json");
    std::fs::write(&path, "{ not json at all").expect("write artifact");

    let handle = ClassifierHandle::load(path.to_str().expect("utf8 path"), 0.5);
    assert!(!handle.is_loaded());

    let engine = RiskEngine::new(FusionPolicy::Simplified, handle);
    let assessment =
        engine.analyze(&request("I want to kill myself tonight, I have a plan", vec![]));

    // The lexical signal still carries the decision; only the critical
    // classifier gate is out of reach.
    assert_eq!(assessment.risk_level, RiskLevel::High);
    assert!(!assessment.classifier_positive);
    assert_eq!(engine.stats().total_classifier_unavailable, 1);
}

// ── Scenario 5: Configuration defaults ───────────────────────────────────

#[test]
fn test_default_config_carries_fusion_constants() {
    let config = VigilConfig::default();
    assert_eq!(config.fusion.classifier_amplification, 8.0);
    assert_eq!(config.fusion.high_total, 15.0);
    assert_eq!(config.fusion.medium_total, 8.0);
    assert_eq!(config.fusion.enhanced_critical, 12.0);
    assert_eq!(config.fusion.enhanced_high, 8.0);
    assert_eq!(config.fusion.enhanced_medium, 4.0);
    assert_eq!(config.retrieval.top_k, 5);
    assert_eq!(config.server.port, 8002);
}

#[test]
fn test_missing_config_file_falls_back_to_defaults() {
    let config = VigilConfig::load("/nonexistent/vigil.toml").expect("defaults");
    assert_eq!(config.fusion.knowledge_match_bonus, 3.0);
    assert!(config.retrieval.enabled);
}
