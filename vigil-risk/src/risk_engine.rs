//! Risk Fusion Engine — combines the independent partial signals into one
//! ordinal decision.
//!
//! Two fusion policies share the engine:
//!
//! - **Simplified** — lexical pattern score + context score drive the total;
//!   the classifier is a guard/amplifier, never a sole trigger. A positive
//!   classification with zero lexical or contextual evidence cannot escalate
//!   risk above low, bounding false positives from the statistical model.
//! - **Enhanced** — classifier contributes unconditionally, context and
//!   knowledge-match evidence are folded into an internal risk score with
//!   fixed level thresholds. A deliberately looser policy than the
//!   simplified guard.
//!
//! Every sub-signal is independently fault-tolerant: classifier failure,
//! a missing knowledge index, or empty conversation history degrade to a
//! zero/empty contribution rather than aborting the fusion. The risk level is
//! a pure function of the fused score and the classifier guards; `flagged`
//! is derived from it at construction. Confidence is a display/triage aid
//! computed by an independent formula and may disagree with the level.
//!
//! High and critical outcomes are forwarded to the case log and recorded in
//! the engine's bounded alert buffer; forwarding faults never block the
//! already-computed assessment.

use crate::classifier::{ClassifierHandle, ClassifierVerdict};
use crate::context_analyzer::{self, ContextSignal, ESCALATION_BONUS};
use crate::knowledge::{KnowledgePassage, KnowledgeStore};
use crate::pattern_matcher;
use crate::types::*;
use parking_lot::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::warn;
use vigil_core::case_log::{CaseLog, HighRiskCase};
use vigil_core::config::FusionConfig;

const MAX_ALERTS: usize = 5_000;

/// Knowledge categories whose high-relevance matches add fusion evidence.
const HIGH_RISK_CATEGORIES: &[&str] = &["crisis_phrases", "warning_signs"];

/// Relevance floor for a passage to appear as a contextual cue.
const CUE_RELEVANCE_FLOOR: f64 = 0.6;

const HOTLINE_APPENDIX: &str = " Crisis resources: National Suicide Prevention Lifeline (988), Crisis Text Line (text HOME to 741741).";

/// Which fusion policy the engine runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum FusionPolicy {
    Simplified,
    Enhanced,
}

#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct EngineStats {
    pub total_analyses: u64,
    pub total_low: u64,
    pub total_medium: u64,
    pub total_high: u64,
    pub total_critical: u64,
    pub total_escalations: u64,
    pub total_classifier_unavailable: u64,
    pub policy: String,
}

pub struct RiskEngine {
    policy: FusionPolicy,
    config: FusionConfig,
    classifier: ClassifierHandle,
    knowledge: Option<Arc<KnowledgeStore>>,
    case_log: Option<Arc<CaseLog>>,
    top_k: usize,

    alerts: RwLock<Vec<RiskAlert>>,
    total_analyses: AtomicU64,
    total_low: AtomicU64,
    total_medium: AtomicU64,
    total_high: AtomicU64,
    total_critical: AtomicU64,
    total_escalations: AtomicU64,
    total_classifier_unavailable: AtomicU64,
}

impl RiskEngine {
    pub fn new(policy: FusionPolicy, classifier: ClassifierHandle) -> Self {
        Self {
            policy,
            config: FusionConfig::default(),
            classifier,
            knowledge: None,
            case_log: None,
            top_k: 5,
            alerts: RwLock::new(Vec::new()),
            total_analyses: AtomicU64::new(0),
            total_low: AtomicU64::new(0),
            total_medium: AtomicU64::new(0),
            total_high: AtomicU64::new(0),
            total_critical: AtomicU64::new(0),
            total_escalations: AtomicU64::new(0),
            total_classifier_unavailable: AtomicU64::new(0),
        }
    }

    pub fn with_fusion_config(mut self, config: FusionConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_knowledge(mut self, store: Arc<KnowledgeStore>) -> Self {
        self.knowledge = Some(store);
        self
    }

    pub fn with_case_log(mut self, log: Arc<CaseLog>) -> Self {
        self.case_log = Some(log);
        self
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    // ── Main API ────────────────────────────────────────────────────────────

    /// Analyze one request. Total: every sub-signal degrades independently,
    /// and identical requests against an unchanged corpus/classifier yield
    /// identical assessments.
    pub fn analyze(&self, request: &AnalysisRequest) -> RiskAssessment {
        self.total_analyses.fetch_add(1, Ordering::Relaxed);

        let context = context_analyzer::analyze_context(&request.context_messages);
        if context.escalation_detected {
            self.total_escalations.fetch_add(1, Ordering::Relaxed);
        }

        let verdict = self.classifier.classify(&request.text);
        if verdict == ClassifierVerdict::Unavailable {
            self.total_classifier_unavailable.fetch_add(1, Ordering::Relaxed);
        }
        let (positive, confidence) = verdict.signal();

        let assessment = match self.policy {
            FusionPolicy::Simplified => {
                self.analyze_simplified(request, &context, positive, confidence)
            }
            FusionPolicy::Enhanced => {
                self.analyze_enhanced(request, &context, positive, confidence)
            }
        };

        self.record_outcome(request, &assessment);
        assessment
    }

    // ── Simplified policy ───────────────────────────────────────────────────

    fn analyze_simplified(
        &self,
        request: &AnalysisRequest,
        context: &ContextSignal,
        positive: bool,
        classifier_confidence: f64,
    ) -> RiskAssessment {
        let pattern = pattern_matcher::match_patterns(&request.text);
        let context_score = context.score_with_bonus();

        let risk_level =
            self.fuse_simplified(pattern.score, context_score, positive, classifier_confidence);

        let total = pattern.score + context_score;
        let confidence = (total / 20.0 * 0.7 + classifier_confidence * 0.3).clamp(0.0, 1.0);

        RiskAssessment {
            risk_level,
            confidence,
            risk_factors: pattern.factors,
            contextual_cues: context.cues.clone(),
            classifier_positive: positive,
            recommended_action: simplified_action(risk_level).into(),
            flagged: risk_level != RiskLevel::Low,
            knowledge_matches: level_reference_matches(risk_level),
        }
    }

    /// The simplified decision function. The classifier only amplifies, never
    /// originates: with zero pattern and context evidence a positive
    /// classification cannot leave `Low`.
    fn fuse_simplified(
        &self,
        pattern_score: f64,
        context_score: f64,
        positive: bool,
        confidence: f64,
    ) -> RiskLevel {
        let mut total = pattern_score + context_score;
        if positive && (pattern_score > 0.0 || context_score > 0.0) {
            total += confidence * self.config.classifier_amplification;
        }

        if positive
            && (pattern_score >= 10.0
                || total >= self.config.critical_total
                || (pattern_score > 0.0 && confidence > 0.95))
        {
            RiskLevel::Critical
        } else if total >= self.config.high_total
            || (positive && (pattern_score >= 6.0 || (pattern_score > 0.0 && confidence > 0.8)))
        {
            RiskLevel::High
        } else if total >= self.config.medium_total
            || (positive && (pattern_score >= 3.0 || (pattern_score > 0.0 && confidence > 0.6)))
        {
            RiskLevel::Medium
        } else {
            RiskLevel::Low
        }
    }

    // ── Enhanced policy ─────────────────────────────────────────────────────

    fn analyze_enhanced(
        &self,
        request: &AnalysisRequest,
        context: &ContextSignal,
        positive: bool,
        classifier_confidence: f64,
    ) -> RiskAssessment {
        let matches = match self.knowledge {
            Some(ref store) => store.retrieve(&request.text, self.top_k),
            None => Vec::new(),
        };

        let risk_level =
            self.fuse_enhanced(context, positive, classifier_confidence, &matches);

        let strong_matches = matches
            .iter()
            .filter(|m| m.relevance_score > self.config.knowledge_relevance_floor)
            .count();
        let confidence = (classifier_confidence * 0.4
            + context.score / 10.0 * 0.3
            + strong_matches as f64 / self.top_k.max(1) as f64 * 0.3)
            .clamp(0.0, 1.0);

        let mut risk_factors = Vec::new();
        if positive {
            risk_factors.push(format!(
                "Machine learning classification (confidence: {:.2})",
                classifier_confidence
            ));
        }
        if context.escalation_detected {
            risk_factors.push("Escalating pattern detected in conversation".into());
        }

        let contextual_cues = matches
            .iter()
            .filter(|m| m.relevance_score > CUE_RELEVANCE_FLOOR)
            .map(|m| format!("{}: {}...", m.category, snippet(&m.text, 100)))
            .collect();

        let knowledge_matches = matches
            .iter()
            .take(3)
            .map(|m| format!("{}: {}...", m.title, snippet(&m.text, 150)))
            .collect();

        let mut recommended_action = enhanced_action(risk_level).to_string();
        let has_resources = matches.iter().any(|m| m.category == "resources");
        if has_resources && risk_level >= RiskLevel::High {
            recommended_action.push_str(HOTLINE_APPENDIX);
        }

        RiskAssessment {
            risk_level,
            confidence,
            risk_factors,
            contextual_cues,
            classifier_positive: positive,
            recommended_action,
            flagged: risk_level != RiskLevel::Low,
            knowledge_matches,
        }
    }

    /// The enhanced decision function. The classifier contributes
    /// unconditionally here, unlike the simplified guard.
    fn fuse_enhanced(
        &self,
        context: &ContextSignal,
        positive: bool,
        confidence: f64,
        matches: &[KnowledgePassage],
    ) -> RiskLevel {
        let mut risk_score = 0.0;

        if positive {
            risk_score += confidence * self.config.enhanced_classifier_weight;
        }
        if context.escalation_detected {
            risk_score += ESCALATION_BONUS;
        }
        risk_score += context.score;

        for m in matches {
            if HIGH_RISK_CATEGORIES.contains(&m.category.as_str())
                && m.relevance_score > self.config.knowledge_relevance_floor
            {
                risk_score += self.config.knowledge_match_bonus;
            }
        }

        if risk_score >= self.config.enhanced_critical {
            RiskLevel::Critical
        } else if risk_score >= self.config.enhanced_high {
            RiskLevel::High
        } else if risk_score >= self.config.enhanced_medium {
            RiskLevel::Medium
        } else {
            RiskLevel::Low
        }
    }

    // ── Outcome recording ───────────────────────────────────────────────────

    fn record_outcome(&self, request: &AnalysisRequest, assessment: &RiskAssessment) {
        match assessment.risk_level {
            RiskLevel::Low => {
                self.total_low.fetch_add(1, Ordering::Relaxed);
            }
            RiskLevel::Medium => {
                self.total_medium.fetch_add(1, Ordering::Relaxed);
            }
            RiskLevel::High => {
                self.total_high.fetch_add(1, Ordering::Relaxed);
            }
            RiskLevel::Critical => {
                self.total_critical.fetch_add(1, Ordering::Relaxed);
            }
        }

        if assessment.risk_level < RiskLevel::High {
            return;
        }

        let now = chrono::Utc::now().timestamp();
        warn!(
            level = assessment.risk_level.as_str(),
            confidence = assessment.confidence,
            factors = assessment.risk_factors.len(),
            user = request.user_id.as_deref().unwrap_or("-"),
            "High-risk assessment"
        );
        self.add_alert(
            now,
            assessment.risk_level,
            "High-risk case",
            &format!(
                "level={}, confidence={:.2}, user={:?}, conversation={:?}",
                assessment.risk_level.as_str(),
                assessment.confidence,
                request.user_id,
                request.conversation_id
            ),
        );

        if let Some(ref log) = self.case_log {
            log.record(HighRiskCase {
                timestamp: now,
                user_id: request.user_id.clone(),
                conversation_id: request.conversation_id.clone(),
                message_content: request.text.clone(),
                risk_level: assessment.risk_level.as_str().into(),
                requires_immediate_attention: assessment.risk_level == RiskLevel::Critical,
            });
        }
    }

    fn add_alert(&self, ts: i64, level: RiskLevel, title: &str, details: &str) {
        let mut alerts = self.alerts.write();
        if alerts.len() >= MAX_ALERTS {
            let drain = alerts.len() - MAX_ALERTS + 1;
            alerts.drain(..drain);
        }
        alerts.push(RiskAlert {
            timestamp: ts,
            level,
            component: "risk_engine".into(),
            title: title.into(),
            details: details.into(),
        });
    }

    // ── Query methods ───────────────────────────────────────────────────────

    pub fn policy(&self) -> FusionPolicy {
        self.policy
    }

    pub fn classifier_loaded(&self) -> bool {
        self.classifier.is_loaded()
    }

    pub fn knowledge_store(&self) -> Option<&Arc<KnowledgeStore>> {
        self.knowledge.as_ref()
    }

    pub fn alerts(&self) -> Vec<RiskAlert> {
        self.alerts.read().clone()
    }

    pub fn stats(&self) -> EngineStats {
        EngineStats {
            total_analyses: self.total_analyses.load(Ordering::Relaxed),
            total_low: self.total_low.load(Ordering::Relaxed),
            total_medium: self.total_medium.load(Ordering::Relaxed),
            total_high: self.total_high.load(Ordering::Relaxed),
            total_critical: self.total_critical.load(Ordering::Relaxed),
            total_escalations: self.total_escalations.load(Ordering::Relaxed),
            total_classifier_unavailable: self
                .total_classifier_unavailable
                .load(Ordering::Relaxed),
            policy: format!("{:?}", self.policy),
        }
    }
}

// ── Action and reference tables ─────────────────────────────────────────────

fn simplified_action(level: RiskLevel) -> &'static str {
    match level {
        RiskLevel::Critical => "IMMEDIATE EMERGENCY INTERVENTION: Contact 911 or crisis hotline (988) immediately. Do not leave person alone.",
        RiskLevel::High => "URGENT PROFESSIONAL INTERVENTION: Contact mental health crisis team. Implement safety planning.",
        RiskLevel::Medium => "PROFESSIONAL CONSULTATION: Schedule mental health assessment within 24-48 hours.",
        RiskLevel::Low => "SUPPORTIVE MONITORING: Continue therapeutic conversation. Provide resources if appropriate.",
    }
}

fn enhanced_action(level: RiskLevel) -> &'static str {
    match level {
        RiskLevel::Critical => "IMMEDIATE EMERGENCY INTERVENTION: Contact 911 or crisis hotline (988) immediately. Do not leave person alone. Escort to emergency services.",
        RiskLevel::High => "URGENT PROFESSIONAL INTERVENTION: Contact mental health crisis team. Implement safety planning. Monitor continuously.",
        RiskLevel::Medium => "PROFESSIONAL CONSULTATION: Schedule mental health assessment within 24-48 hours. Provide crisis resources.",
        RiskLevel::Low => "SUPPORTIVE MONITORING: Continue therapeutic conversation. Provide mental health resources if appropriate.",
    }
}

/// Fixed per-level reference strings for simplified deployments, which run
/// without the retrieval index.
fn level_reference_matches(level: RiskLevel) -> Vec<String> {
    match level {
        RiskLevel::Critical => vec![
            "Crisis Resources: National Suicide Prevention Lifeline (988)".into(),
            "Immediate Action: Contact emergency services".into(),
            "Safety Protocol: Do not leave person alone".into(),
        ],
        RiskLevel::High => vec![
            "Warning Signs: Expressions of hopelessness and specific plans".into(),
            "Intervention: Professional mental health assessment needed".into(),
            "Resources: Crisis text line (text HOME to 741741)".into(),
        ],
        RiskLevel::Medium => vec![
            "Risk Factors: Emotional distress and concerning language".into(),
            "Prevention: Supportive conversation and resource provision".into(),
        ],
        RiskLevel::Low => vec![
            "Preventive Resources: Mental health support information".into(),
        ],
    }
}

fn snippet(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
