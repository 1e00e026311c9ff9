//! # Config — typed TOML configuration for the Vigil suite
//!
//! Reads `vigil.toml` (or a custom path) into typed sections. Every field has
//! a default carrying the tuned fusion constants, so a missing file or a
//! partial file always yields a runnable configuration.

use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{info, warn};

/// Top-level Vigil configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VigilConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub classifier: ClassifierConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub fusion: FusionConfig,
    #[serde(default)]
    pub case_log: CaseLogConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub bind: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { bind: "127.0.0.1".into(), port: 8002 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifierConfig {
    /// Path to the JSON model artifact (vocabulary, idf, coefficients,
    /// intercept). Empty means no classifier — analysis degrades to the
    /// lexical and contextual signals alone.
    pub artifact_path: String,
    /// Decision boundary on the positive-class probability.
    pub decision_threshold: f64,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self { artifact_path: String::new(), decision_threshold: 0.5 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// Whether semantic knowledge retrieval participates in fusion.
    pub enabled: bool,
    /// Passages returned per query.
    pub top_k: usize,
    /// Passage window size in words.
    pub passage_words: usize,
    /// Minimum passage length in characters after splitting.
    pub min_passage_chars: usize,
    /// Embedding dimensionality for the hashed feature vectors.
    pub embedding_dim: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            top_k: 5,
            passage_words: 300,
            min_passage_chars: 50,
            embedding_dim: 256,
        }
    }
}

/// Fusion thresholds for both policies. Defaults are the tuned production
/// values; changing them shifts the risk-level boundaries, not the signal
/// computations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FusionConfig {
    /// Simplified policy: classifier amplification weight when lexical or
    /// contextual evidence is present.
    pub classifier_amplification: f64,
    /// Simplified policy: total-score floor for High.
    pub high_total: f64,
    /// Simplified policy: total-score floor for Medium.
    pub medium_total: f64,
    /// Simplified policy: total-score floor for Critical (combined with the
    /// classifier guard).
    pub critical_total: f64,
    /// Enhanced policy: classifier contribution weight (unconditional).
    pub enhanced_classifier_weight: f64,
    /// Enhanced policy: per-passage bonus for high-risk-category matches.
    pub knowledge_match_bonus: f64,
    /// Enhanced policy: relevance floor for a passage to count in fusion.
    pub knowledge_relevance_floor: f64,
    /// Enhanced policy: level thresholds.
    pub enhanced_critical: f64,
    pub enhanced_high: f64,
    pub enhanced_medium: f64,
}

impl Default for FusionConfig {
    fn default() -> Self {
        Self {
            classifier_amplification: 8.0,
            high_total: 15.0,
            medium_total: 8.0,
            critical_total: 20.0,
            enhanced_classifier_weight: 10.0,
            knowledge_match_bonus: 3.0,
            knowledge_relevance_floor: 0.7,
            enhanced_critical: 12.0,
            enhanced_high: 8.0,
            enhanced_medium: 4.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaseLogConfig {
    /// JSONL file high/critical cases are appended to. Empty disables the
    /// file sink; the bounded in-memory ring is always kept.
    pub path: String,
    /// Maximum cases held in memory.
    pub max_cases: usize,
}

impl Default for CaseLogConfig {
    fn default() -> Self {
        Self { path: String::new(), max_cases: 5_000 }
    }
}

impl VigilConfig {
    /// Load config from a TOML file path. A missing file is not an error:
    /// defaults are returned so the service can start with zero setup.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, String> {
        let path = path.as_ref();
        if !path.exists() {
            warn!(path = %path.display(), "Config file not found, using defaults");
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config: {}", e))?;
        let config: VigilConfig = toml::from_str(&content)
            .map_err(|e| format!("Failed to parse config: {}", e))?;
        info!(
            path = %path.display(),
            retrieval = config.retrieval.enabled,
            classifier = !config.classifier.artifact_path.is_empty(),
            "Configuration loaded"
        );
        Ok(config)
    }

    /// Save current config to a TOML file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), String> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| format!("Failed to serialize config: {}", e))?;
        std::fs::write(path, content)
            .map_err(|e| format!("Failed to write config: {}", e))?;
        Ok(())
    }
}
