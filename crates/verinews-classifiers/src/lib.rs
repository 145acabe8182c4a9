//! Verinews Classifiers
//!
//! Everything between raw article text and a fake/real verdict:
//!
//! - Text normalization (stopwords, Porter stemming)
//! - TF-IDF vectorization over unigrams and bigrams
//! - Three classifier families behind one [`Estimator`] trait:
//!   logistic regression, random forest and multinomial naive Bayes
//! - Stratified training and model selection by test accuracy
//! - Versioned, checksummed model artifacts
//! - The [`PredictionService`] used by the server and the CLI
//!
//! Training and serving share one [`Normalizer`] configuration, stored in
//! the artifact, so both sides see the same feature space.

pub mod artifact;
pub mod classifier;
pub mod config;
pub mod corpus;
pub mod forest;
pub mod logistic;
pub mod metrics;
pub mod naive_bayes;
pub mod normalizer;
pub mod pipeline;
pub mod prediction;
pub mod sparse;
pub mod stemmer;
pub mod stopwords;
pub mod trainer;
pub mod vectorizer;

pub use artifact::{ArtifactMetadata, ModelArtifact, ModelScore};
pub use classifier::{AlgorithmKind, Classifier, ClassifierParams, Estimator};
pub use config::TrainingConfig;
pub use corpus::{load_corpus, load_labeled_csv};
pub use metrics::{ClassScores, ClassificationReport, ConfusionMatrix};
pub use normalizer::{Normalizer, NormalizerConfig};
pub use pipeline::{prepare, train, PreparedCorpus, TrainingRun};
pub use prediction::{Prediction, PredictionResponse, PredictionService};
pub use sparse::{CsrMatrix, SparseRow, SparseVector};
pub use trainer::{stratified_split, ModelEvaluation, Trainer, TrainerConfig, TrainingOutcome};
pub use vectorizer::{TfidfVectorizer, VectorizerConfig, Vocabulary};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::artifact::ModelArtifact;
    pub use crate::classifier::{AlgorithmKind, Classifier, Estimator};
    pub use crate::config::TrainingConfig;
    pub use crate::normalizer::Normalizer;
    pub use crate::prediction::{Prediction, PredictionResponse, PredictionService};
    pub use crate::vectorizer::TfidfVectorizer;
    pub use verinews_core::prelude::*;
}
