//! Statistical Classifier Adapter — wraps the pre-trained text classifier.
//!
//! The oracle is a TF-IDF + logistic-regression linear model exported as a
//! single JSON artifact (`vocabulary`, `idf`, `coefficients`, `intercept`)
//! and loaded read-only at startup. The adapter fails open: a missing
//! artifact, a malformed artifact, or any inference fault yields
//! [`ClassifierVerdict::Unavailable`] instead of an error — a broken ML
//! oracle must never block or crash risk analysis, it only removes one
//! signal from the fusion.
//!
//! `Unavailable` is kept distinct from a negative classification so the
//! health and stats surfaces can report oracle state; fusion maps both to a
//! neutral (false, 0.0) signal.

use std::collections::HashMap;
use std::path::Path;
use tracing::{info, warn};
use vigil_core::{VigilError, VigilResult};

/// Outcome of a classification call.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum ClassifierVerdict {
    Scored { positive: bool, confidence: f64 },
    Unavailable,
}

impl ClassifierVerdict {
    /// The neutral (positive, confidence) pair fusion consumes.
    /// `Unavailable` degrades to (false, 0.0).
    pub fn signal(&self) -> (bool, f64) {
        match *self {
            ClassifierVerdict::Scored { positive, confidence } => (positive, confidence),
            ClassifierVerdict::Unavailable => (false, 0.0),
        }
    }
}

/// The exported linear model. Feature extraction mirrors the training-side
/// vectorizer: lowercase word tokens, term counts scaled by per-term idf,
/// L2-normalized, then a single logistic unit.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct LinearModel {
    pub vocabulary: HashMap<String, usize>,
    pub idf: Vec<f64>,
    pub coefficients: Vec<f64>,
    pub intercept: f64,
}

impl LinearModel {
    /// Load and validate an artifact from disk.
    pub fn load(path: impl AsRef<Path>) -> VigilResult<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let model: LinearModel = serde_json::from_str(&content)?;
        model.validate()?;
        Ok(model)
    }

    fn validate(&self) -> VigilResult<()> {
        let dims = self.vocabulary.len();
        if self.idf.len() != dims || self.coefficients.len() != dims {
            return Err(VigilError::ClassifierArtifact(format!(
                "dimension mismatch: vocabulary={}, idf={}, coefficients={}",
                dims,
                self.idf.len(),
                self.coefficients.len()
            )));
        }
        if let Some((token, &idx)) = self.vocabulary.iter().find(|(_, &idx)| idx >= dims) {
            return Err(VigilError::ClassifierArtifact(format!(
                "vocabulary index out of range: {:?} -> {}",
                token, idx
            )));
        }
        Ok(())
    }

    /// Positive-class probability for `text`.
    pub fn predict_proba(&self, text: &str) -> f64 {
        let mut counts: HashMap<usize, f64> = HashMap::new();
        for token in text.to_lowercase().split(|c: char| !c.is_alphanumeric()) {
            if token.is_empty() {
                continue;
            }
            if let Some(&idx) = self.vocabulary.get(token) {
                *counts.entry(idx).or_insert(0.0) += 1.0;
            }
        }

        // tf-idf with L2 normalization, matching the training vectorizer
        let mut norm_sq = 0.0;
        for (idx, count) in counts.iter_mut() {
            *count *= self.idf[*idx];
            norm_sq += *count * *count;
        }
        let norm = norm_sq.sqrt();

        let mut z = self.intercept;
        if norm > 0.0 {
            for (idx, value) in &counts {
                z += self.coefficients[*idx] * (value / norm);
            }
        }
        1.0 / (1.0 + (-z).exp())
    }
}

/// The adapter held by the fusion engine. Owns the optional model and the
/// decision threshold; classification never faults.
pub struct ClassifierHandle {
    model: Option<LinearModel>,
    decision_threshold: f64,
}

impl ClassifierHandle {
    /// An adapter with no oracle: every call returns `Unavailable`.
    pub fn unavailable() -> Self {
        Self { model: None, decision_threshold: 0.5 }
    }

    pub fn from_model(model: LinearModel, decision_threshold: f64) -> Self {
        Self { model: Some(model), decision_threshold }
    }

    /// Load from an artifact path, failing open. An empty path means no
    /// classifier was configured; a load failure is logged once here.
    pub fn load(path: &str, decision_threshold: f64) -> Self {
        if path.is_empty() {
            info!("No classifier artifact configured, running without the statistical signal");
            return Self::unavailable();
        }
        match LinearModel::load(path) {
            Ok(model) => {
                info!(path, vocabulary = model.vocabulary.len(), "Classifier model loaded");
                Self::from_model(model, decision_threshold)
            }
            Err(e) => {
                warn!(%e, path, "Could not load classifier model, failing open");
                Self::unavailable()
            }
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.model.is_some()
    }

    /// Classify `text`. Total: any missing or faulting oracle degrades to
    /// `Unavailable`.
    pub fn classify(&self, text: &str) -> ClassifierVerdict {
        let Some(ref model) = self.model else {
            return ClassifierVerdict::Unavailable;
        };
        let p = model.predict_proba(text);
        if !p.is_finite() {
            warn!("Classifier produced a non-finite probability, degrading to unavailable");
            return ClassifierVerdict::Unavailable;
        }
        ClassifierVerdict::Scored {
            positive: p >= self.decision_threshold,
            confidence: p.max(1.0 - p),
        }
    }
}
