//! Error types for Verinews

use std::path::PathBuf;

/// Result type alias using Verinews' Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for Verinews operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Effective input was empty
    #[error("{0}")]
    Validation(String),

    /// No model artifact is loaded
    #[error("model not loaded, please train the model first")]
    ModelUnavailable,

    /// Failure while normalizing, vectorizing or running inference
    #[error("prediction error: {0}")]
    Prediction(String),

    /// A vectorizer or classifier was used before it was fitted
    #[error("not fitted: {0}")]
    NotFitted(String),

    /// Vectorizer fitting kept no terms
    #[error("empty vocabulary: every term was pruned or the corpus was empty")]
    EmptyVocabulary,

    /// An expected artifact file is missing
    #[error("artifact not found: {}", .0.display())]
    ArtifactNotFound(PathBuf),

    /// An artifact file exists but cannot be used
    #[error("artifact corrupt: {0}")]
    ArtifactCorrupt(String),

    /// Training data with the wrong shape or labels
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Configuration errors
    #[error("configuration error: {0}")]
    Config(String),

    /// IO errors
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization errors
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Create a new validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create a new prediction error
    pub fn prediction(msg: impl Into<String>) -> Self {
        Self::Prediction(msg.into())
    }

    /// Create a new not-fitted error
    pub fn not_fitted(what: impl Into<String>) -> Self {
        Self::NotFitted(what.into())
    }

    /// Create a new corrupt-artifact error
    pub fn corrupt(msg: impl Into<String>) -> Self {
        Self::ArtifactCorrupt(msg.into())
    }

    /// Create a new invalid-input error
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Create a new configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Short stable name of the error kind, used as a metrics label
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::ModelUnavailable => "model_unavailable",
            Self::Prediction(_) => "prediction",
            Self::NotFitted(_) => "not_fitted",
            Self::EmptyVocabulary => "empty_vocabulary",
            Self::ArtifactNotFound(_) => "artifact_not_found",
            Self::ArtifactCorrupt(_) => "artifact_corrupt",
            Self::InvalidInput(_) => "invalid_input",
            Self::Config(_) => "config",
            Self::Io(_) => "io",
            Self::Serialization(_) => "serialization",
        }
    }

    /// Whether an artifact was missing or unusable, as opposed to a bug or I/O fault
    pub fn is_artifact_failure(&self) -> bool {
        matches!(self, Self::ArtifactNotFound(_) | Self::ArtifactCorrupt(_))
    }
}
