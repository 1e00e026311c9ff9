//! # Vigil Risk — conversational crisis-risk fusion engine
//!
//! Estimates a short-text author's suicide risk level by fusing independent
//! partial signals into one ordinal decision:
//!
//!  1. **Pattern matcher** — curated phrase tables (direct threat, indirect
//!     ideation, method reference, temporal imminence), weighted substring scan
//!  2. **Context analyzer** — trailing conversation window, recency-weighted
//!     risk-word density, escalation trend
//!  3. **Classifier adapter** — pre-trained TF-IDF + logistic-regression
//!     oracle, fail-open on any fault
//!  4. **Knowledge retriever** — cosine top-K over an atomically swappable
//!     passage index of mental-health reference documents
//!  5. **Fusion engine** — combines everything into a risk level, a confidence
//!     score, and an explainable factor set
//!
//! The engine never originates risk from the statistical classifier alone
//! (simplified policy): lexical or contextual evidence must be present before
//! the classifier can amplify. High/critical outcomes are forwarded to the
//! case-log collaborator; a forwarding fault never blocks the assessment.

pub mod classifier;
pub mod context_analyzer;
pub mod knowledge;
pub mod pattern_matcher;
pub mod risk_engine;
pub mod risk_server;
pub mod types;


pub use classifier::{ClassifierHandle, ClassifierVerdict, LinearModel};
pub use context_analyzer::{analyze_context, ContextSignal};
pub use knowledge::{KnowledgeDocument, KnowledgePassage, KnowledgeStore};
pub use pattern_matcher::{match_patterns, PatternReport};
pub use risk_engine::{FusionPolicy, RiskEngine};
pub use types::{AnalysisRequest, ContextMessage, RiskAssessment, RiskLevel};
