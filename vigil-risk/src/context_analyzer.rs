//! Context Escalation Analyzer — conversation-level risk trend detection.
//!
//! A single message may read as low risk while the surrounding conversation
//! is escalating. This module scans the trailing window of user turns for a
//! fixed risk lexicon, weighting each turn's hit count by recency: the most
//! recent expression of distress is the strongest predictor of
//! current-moment risk.
//!
//! Escalation requires at least two user turns — a single message cannot
//! "escalate" — and a weighted score above `ESCALATION_SCORE_FLOOR`.

use crate::types::ContextMessage;

/// Flat score bonus applied once escalation is detected. The simplified
/// fusion policy applies it to the context score it consumes
/// ([`ContextSignal::score_with_bonus`]); the enhanced policy adds the same
/// value inside its fusion sum. Both paths see identical totals.
pub const ESCALATION_BONUS: f64 = 3.0;

const ESCALATION_SCORE_FLOOR: f64 = 2.0;
const CONTEXT_WINDOW: usize = 5;
const MIN_ESCALATION_MESSAGES: usize = 2;

const RISK_WORDS: &[&str] = &[
    "die", "kill", "suicide", "end", "pain", "hopeless", "trapped", "burden",
];

/// Result of a context scan.
#[derive(Debug, Clone, Default)]
pub struct ContextSignal {
    /// Raw recency-weighted risk-word score, excluding the escalation bonus.
    pub score: f64,
    pub cues: Vec<String>,
    pub escalation_detected: bool,
}

impl ContextSignal {
    /// Score with the escalation bonus folded in, for policies that consume
    /// the bonus at the analyzer boundary.
    pub fn score_with_bonus(&self) -> f64 {
        if self.escalation_detected {
            self.score + ESCALATION_BONUS
        } else {
            self.score
        }
    }
}

/// Scan the trailing window of a conversation's user turns. Empty or absent
/// history yields the zero signal.
pub fn analyze_context(messages: &[ContextMessage]) -> ContextSignal {
    if messages.is_empty() {
        return ContextSignal::default();
    }

    let window_start = messages.len().saturating_sub(CONTEXT_WINDOW);
    let user_messages: Vec<&ContextMessage> = messages[window_start..]
        .iter()
        .filter(|m| m.role == "user")
        .collect();

    if user_messages.is_empty() {
        return ContextSignal::default();
    }

    let mut score = 0.0;
    let mut cues = Vec::new();

    for (i, msg) in user_messages.iter().enumerate() {
        let content = msg.content.to_lowercase();
        let word_count = RISK_WORDS.iter().filter(|w| content.contains(*w)).count();
        if word_count > 0 {
            // Linear recency weight: latest turn in the window weighs 1.0,
            // earliest weighs 1/n.
            let weight = (i + 1) as f64 / user_messages.len() as f64;
            score += word_count as f64 * weight;
            cues.push(format!("Risk words in message {}: {}", i + 1, word_count));
        }
    }

    let escalation_detected =
        score > ESCALATION_SCORE_FLOOR && user_messages.len() >= MIN_ESCALATION_MESSAGES;
    if escalation_detected {
        cues.push("Escalating pattern detected".into());
    }

    ContextSignal { score, cues, escalation_detected }
}
