//! Prediction service shared by the HTTP server and the CLI

use crate::artifact::ModelArtifact;
use crate::normalizer::Normalizer;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, warn};
use verinews_core::{Error, Label, Result};

/// Default number of content characters echoed back
pub const DEFAULT_PREVIEW_CHARS: usize = 200;

/// Outcome of a successful prediction
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Prediction {
    pub label: Label,
    /// Highest class probability as a percentage, two decimals
    pub confidence: f64,
    /// `[P(Fake), P(Real)]`
    pub probabilities: [f64; 2],
    pub headline: String,
    /// Content truncated for display
    pub content: String,
}

/// Classifies articles with a loaded artifact
#[derive(Debug, Clone)]
pub struct PredictionService {
    model: Option<LoadedModel>,
    preview_chars: usize,
}

#[derive(Debug, Clone)]
struct LoadedModel {
    artifact: Arc<ModelArtifact>,
    normalizer: Normalizer,
}

impl PredictionService {
    /// Create a service around an optional artifact
    pub fn new(artifact: Option<Arc<ModelArtifact>>) -> Result<Self> {
        let model = match artifact {
            Some(artifact) => Some(LoadedModel {
                normalizer: artifact.normalizer()?,
                artifact,
            }),
            None => None,
        };
        Ok(Self {
            model,
            preview_chars: DEFAULT_PREVIEW_CHARS,
        })
    }

    /// A service with no model; every prediction reports it as unavailable
    pub fn unavailable() -> Self {
        Self {
            model: None,
            preview_chars: DEFAULT_PREVIEW_CHARS,
        }
    }

    /// Load the artifact in `dir`, reporting why it could not be used
    pub fn try_from_dir(dir: impl AsRef<Path>) -> Result<Self> {
        let artifact = ModelArtifact::load(dir)?;
        Self::new(Some(Arc::new(artifact)))
    }

    /// Load the artifact in `dir`; a missing or unusable artifact leaves
    /// the service without a model
    pub fn from_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        match Self::try_from_dir(dir) {
            Ok(service) => service,
            Err(e) => {
                warn!("Model not loaded from {}: {}", dir.display(), e);
                Self::unavailable()
            }
        }
    }

    /// Set how many content characters are echoed back
    pub fn with_preview_chars(mut self, preview_chars: usize) -> Self {
        self.preview_chars = preview_chars;
        self
    }

    pub fn is_loaded(&self) -> bool {
        self.model.is_some()
    }

    pub fn artifact(&self) -> Option<&Arc<ModelArtifact>> {
        self.model.as_ref().map(|m| &m.artifact)
    }

    /// Classify an article from its headline and content
    pub fn predict(&self, headline: Option<&str>, content: Option<&str>) -> Result<Prediction> {
        let model = self.model.as_ref().ok_or(Error::ModelUnavailable)?;

        let headline = headline.unwrap_or("");
        let content = content.unwrap_or("");
        let full_text = format!("{headline} {content}");
        let full_text = full_text.trim();
        if full_text.is_empty() {
            return Err(Error::validation("please provide either a headline or content"));
        }

        let normalized = model.normalizer.normalize(Some(full_text));
        let proba = model
            .artifact
            .predict_proba(&normalized)
            .map_err(|e| Error::prediction(e.to_string()))?;
        if proba.iter().any(|p| !p.is_finite()) {
            return Err(Error::prediction("classifier returned non-finite probabilities"));
        }

        let label = if proba[1] > proba[0] {
            Label::Real
        } else {
            Label::Fake
        };
        let confidence = (proba[0].max(proba[1]) * 100.0 * 100.0).round() / 100.0;
        debug!(
            "Predicted {} ({:.2}%) from {} normalized chars",
            label,
            confidence,
            normalized.len()
        );

        Ok(Prediction {
            label,
            confidence,
            probabilities: proba,
            headline: headline.to_string(),
            content: preview(content, self.preview_chars),
        })
    }
}

/// First `max_chars` characters, with "..." appended when cut
fn preview(content: &str, max_chars: usize) -> String {
    match content.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}...", &content[..cut]),
        None => content.to_string(),
    }
}

/// Wire form of a prediction outcome
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub headline: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl PredictionResponse {
    pub fn from_result(result: &Result<Prediction>) -> Self {
        match result {
            Ok(prediction) => Self {
                success: true,
                result: Some(prediction.label.as_str().to_string()),
                confidence: Some(prediction.confidence),
                headline: Some(prediction.headline.clone()),
                content: Some(prediction.content.clone()),
                timestamp: Some(Utc::now().to_rfc3339()),
                error: None,
            },
            Err(e) => Self::error(e.to_string()),
        }
    }

    /// A failure response carrying only a message
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            result: None,
            confidence: None,
            headline: None,
            content: None,
            timestamp: None,
            error: Some(message.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unavailable_checked_before_validation() {
        let service = PredictionService::unavailable();
        assert!(!service.is_loaded());
        let err = service.predict(None, None).unwrap_err();
        assert!(matches!(err, Error::ModelUnavailable));
        assert!(err.to_string().contains("model not loaded"));
    }

    #[test]
    fn test_from_missing_dir_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let service = PredictionService::from_dir(dir.path().join("nope"));
        assert!(!service.is_loaded());
        assert!(service.artifact().is_none());

        let err = PredictionService::try_from_dir(dir.path().join("nope")).unwrap_err();
        assert!(matches!(err, Error::ArtifactNotFound(_)));
        assert!(err.is_artifact_failure());
    }

    fn service_with_weights(weight: f64) -> PredictionService {
        use crate::artifact::{ArtifactMetadata, FORMAT_VERSION};
        use crate::classifier::{AlgorithmKind, Classifier};
        use crate::logistic::LogisticRegression;
        use crate::normalizer::NormalizerConfig;
        use crate::vectorizer::TfidfVectorizer;

        let mut vectorizer = TfidfVectorizer::default();
        vectorizer
            .fit(&["win free monei", "win free prize", "senat pass bill", "senat pass budget"])
            .unwrap();
        let n = vectorizer.feature_count();
        let weights = LogisticRegression::from_weights(vec![weight; n], 0.0);
        let classifier = Classifier::LogisticRegression(weights);
        let metadata = ArtifactMetadata {
            format_version: FORMAT_VERSION,
            algorithm: AlgorithmKind::LogisticRegression,
            test_accuracy: 1.0,
            train_accuracy: 1.0,
            feature_count: n,
            n_train: 4,
            n_test: 0,
            models: Vec::new(),
            normalizer: NormalizerConfig::default(),
            trained_at: Utc::now(),
        };
        let artifact = ModelArtifact::new(vectorizer, classifier, metadata).unwrap();
        PredictionService::new(Some(Arc::new(artifact))).unwrap()
    }

    #[test]
    fn test_non_finite_probabilities_are_prediction_errors() {
        let service = service_with_weights(f64::NAN);
        let result = service.predict(Some("Senate passes"), Some("the budget bill"));
        match &result {
            Err(Error::Prediction(msg)) => assert!(msg.contains("non-finite"), "{msg}"),
            other => panic!("expected a prediction error, got {other:?}"),
        }
        let response = PredictionResponse::from_result(&result);
        assert!(!response.success);
        assert!(response.result.is_none());

        // A document with no known terms never touches the weights
        let unknown = service.predict(Some("completely unrelated words"), None).unwrap();
        assert_eq!(unknown.label, Label::Fake);
        assert_eq!(unknown.confidence, 50.0);
    }

    #[test]
    fn test_finite_weights_predict() {
        let prediction = service_with_weights(2.0)
            .predict(Some("Senate passes"), Some("the budget bill"))
            .unwrap();
        assert_eq!(prediction.label, Label::Real);
        assert!(prediction.probabilities.iter().all(|p| p.is_finite()));
    }

    #[test]
    fn test_preview() {
        assert_eq!(preview("short", 200), "short");
        let long = "é".repeat(250);
        let cut = preview(&long, 200);
        assert_eq!(cut.chars().count(), 203);
        assert!(cut.ends_with("..."));
        assert_eq!(preview(&"a".repeat(200), 200).len(), 200);
    }

    #[test]
    fn test_response_shapes() {
        let ok = PredictionResponse::from_result(&Ok(Prediction {
            label: Label::Fake,
            confidence: 97.5,
            probabilities: [0.975, 0.025],
            headline: "h".to_string(),
            content: "c".to_string(),
        }));
        assert!(ok.success);
        assert_eq!(ok.result.as_deref(), Some("Fake"));
        assert!(ok.timestamp.is_some());
        assert!(ok.error.is_none());

        let err = PredictionResponse::from_result(&Err(Error::validation(
            "please provide either a headline or content",
        )));
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["success"], false);
        assert!(json["error"].as_str().unwrap().contains("provide either a headline or content"));
        assert!(json.get("result").is_none());
    }
}
