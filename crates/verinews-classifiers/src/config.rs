//! Training configuration

use crate::normalizer::NormalizerConfig;
use crate::trainer::TrainerConfig;
use crate::vectorizer::VectorizerConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;
use verinews_core::{Error, Result};

/// Configuration for a full training run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingConfig {
    #[serde(default)]
    pub normalizer: NormalizerConfig,

    #[serde(default)]
    pub vectorizer: VectorizerConfig,

    #[serde(default)]
    pub trainer: TrainerConfig,

    /// Documents whose normalized text has at most this many characters
    /// are dropped before vectorizing
    #[serde(default = "default_min_document_chars")]
    pub min_document_chars: usize,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            normalizer: NormalizerConfig::default(),
            vectorizer: VectorizerConfig::default(),
            trainer: TrainerConfig::default(),
            min_document_chars: default_min_document_chars(),
        }
    }
}

fn default_min_document_chars() -> usize {
    10
}

impl TrainingConfig {
    /// Load from YAML string
    pub fn from_yaml(yaml: &str) -> std::result::Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(yaml)
    }

    /// Load from file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content).map_err(|e| {
            Error::config(format!(
                "Failed to parse training config {}: {}",
                path.display(),
                e
            ))
        })
    }

    /// Load from a file if it exists, otherwise use defaults
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            Self::from_file(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Check every section
    pub fn validate(&self) -> Result<()> {
        self.vectorizer.validate()?;
        self.trainer.validate()
    }
}
