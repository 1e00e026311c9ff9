//! Shared types for the risk analysis layer.

/// Ordinal risk severity. Ordering is total and monotonic: `Low < Medium <
/// High < Critical`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
            RiskLevel::Critical => "critical",
        }
    }
}

/// One message of conversation history. Insertion order is chronological.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ContextMessage {
    pub role: String,
    pub content: String,
}

/// An analysis request as received on the wire.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct AnalysisRequest {
    pub text: String,
    #[serde(default)]
    pub conversation_id: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub context_messages: Vec<ContextMessage>,
}

/// The fused analysis result returned to the caller.
///
/// `flagged` is derived from `risk_level` at construction and is never set
/// independently.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct RiskAssessment {
    pub risk_level: RiskLevel,
    pub confidence: f64,
    pub risk_factors: Vec<String>,
    pub contextual_cues: Vec<String>,
    pub classifier_positive: bool,
    pub recommended_action: String,
    pub flagged: bool,
    pub knowledge_matches: Vec<String>,
}

/// A recorded alert for a high-risk decision, kept in the engine's bounded
/// buffer and exposed on the admin surface.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct RiskAlert {
    pub timestamp: i64,
    pub level: RiskLevel,
    pub component: String,
    pub title: String,
    pub details: String,
}
