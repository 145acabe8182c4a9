//! Classifier ensemble trainer
//!
//! Splits the feature matrix into stratified train/test partitions, fits
//! every configured classifier family on the training rows, scores each on
//! both partitions and keeps the one with the best test accuracy.

use crate::classifier::{AlgorithmKind, Classifier, ClassifierParams, Estimator};
use crate::metrics::{ClassificationReport, ConfusionMatrix};
use crate::sparse::CsrMatrix;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{info, warn};
use verinews_core::{Error, Label, Result};

/// Trainer configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainerConfig {
    /// Fraction of each class held out for testing
    #[serde(default = "default_test_size")]
    pub test_size: f64,

    /// Seed for the split and for seeded classifiers
    #[serde(default = "default_seed")]
    pub seed: u64,

    /// Families to fit, in selection order
    #[serde(default = "default_algorithms")]
    pub algorithms: Vec<AlgorithmKind>,

    /// Per-family hyperparameters
    #[serde(default)]
    pub params: ClassifierParams,
}

impl Default for TrainerConfig {
    fn default() -> Self {
        Self {
            test_size: default_test_size(),
            seed: default_seed(),
            algorithms: default_algorithms(),
            params: ClassifierParams::default(),
        }
    }
}

fn default_test_size() -> f64 {
    0.2
}

fn default_seed() -> u64 {
    42
}

fn default_algorithms() -> Vec<AlgorithmKind> {
    AlgorithmKind::ALL.to_vec()
}

impl TrainerConfig {
    pub fn validate(&self) -> Result<()> {
        if !(self.test_size > 0.0 && self.test_size < 1.0) {
            return Err(Error::config(format!(
                "test_size must be in (0, 1), got {}",
                self.test_size
            )));
        }
        if self.algorithms.is_empty() {
            return Err(Error::config("at least one algorithm must be configured"));
        }
        Ok(())
    }
}

/// Row indices of the two partitions
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrainTestSplit {
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

/// Seeded split that keeps the class balance in both partitions.
///
/// Each class sends `round(n × test_size)` rows to the test partition,
/// clamped to `[1, n - 1]`.
pub fn stratified_split(labels: &[Label], test_size: f64, seed: u64) -> Result<TrainTestSplit> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut train = Vec::new();
    let mut test = Vec::new();

    for label in Label::ALL {
        let mut rows: Vec<usize> = labels
            .iter()
            .enumerate()
            .filter(|(_, l)| **l == label)
            .map(|(i, _)| i)
            .collect();
        if rows.len() < 2 {
            return Err(Error::invalid_input(format!(
                "need at least 2 {} documents to split, found {}",
                label,
                rows.len()
            )));
        }

        rows.shuffle(&mut rng);
        let n_test = ((rows.len() as f64 * test_size).round() as usize).clamp(1, rows.len() - 1);
        test.extend_from_slice(&rows[..n_test]);
        train.extend_from_slice(&rows[n_test..]);
    }

    train.shuffle(&mut rng);
    test.shuffle(&mut rng);
    Ok(TrainTestSplit { train, test })
}

/// Scores of one fitted family
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelEvaluation {
    pub algorithm: AlgorithmKind,
    pub train_accuracy: f64,
    pub test_accuracy: f64,
    /// Confusion counts on the test partition
    pub confusion: ConfusionMatrix,
    /// Classification report on the test partition
    pub report: ClassificationReport,
    pub fit_millis: u64,
}

/// Result of a training run
#[derive(Debug, Clone)]
pub struct TrainingOutcome {
    /// One entry per fitted family, in configured order
    pub evaluations: Vec<ModelEvaluation>,
    /// Position of the selected model in `evaluations`
    pub best_index: usize,
    /// The selected classifier
    pub best: Classifier,
    pub n_train: usize,
    pub n_test: usize,
}

impl TrainingOutcome {
    pub fn best_evaluation(&self) -> &ModelEvaluation {
        &self.evaluations[self.best_index]
    }
}

/// Fits and selects among the configured classifier families
#[derive(Debug, Clone, Default)]
pub struct Trainer {
    config: TrainerConfig,
}

impl Trainer {
    pub fn new(config: TrainerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &TrainerConfig {
        &self.config
    }

    /// Train every configured family and keep the best one
    pub fn train(&self, features: &CsrMatrix, labels: &[Label]) -> Result<TrainingOutcome> {
        self.config.validate()?;
        if features.n_rows() != labels.len() {
            return Err(Error::invalid_input(format!(
                "{} feature rows but {} labels",
                features.n_rows(),
                labels.len()
            )));
        }

        let split = stratified_split(labels, self.config.test_size, self.config.seed)?;
        let x_train = features.select_rows(&split.train);
        let x_test = features.select_rows(&split.test);
        let y_train: Vec<Label> = split.train.iter().map(|&i| labels[i]).collect();
        let y_test: Vec<Label> = split.test.iter().map(|&i| labels[i]).collect();
        info!(
            "Split {} documents into {} train / {} test",
            labels.len(),
            y_train.len(),
            y_test.len()
        );

        // An explicit forest seed wins over the trainer seed
        let mut params = self.config.params.clone();
        if params.random_forest.seed.is_none() {
            params.random_forest.seed = Some(self.config.seed);
        }

        let mut evaluations = Vec::new();
        let mut best: Option<(usize, f64, Classifier)> = None;
        for &kind in &self.config.algorithms {
            let mut classifier = Classifier::new(kind, &params);
            let start = Instant::now();
            if let Err(e) = classifier.fit(&x_train, &y_train) {
                warn!("Failed to fit {}: {}", kind, e);
                continue;
            }
            let fit_millis = start.elapsed().as_millis() as u64;

            let train_accuracy = accuracy(&classifier, &x_train, &y_train)?;
            let test_pred = predict_all(&classifier, &x_test)?;
            let confusion = ConfusionMatrix::from_predictions(&test_pred, &y_test)?;
            let test_accuracy = confusion.accuracy();
            info!(
                "{}: train accuracy {:.4}, test accuracy {:.4} ({} ms)",
                kind, train_accuracy, test_accuracy, fit_millis
            );

            let better = best
                .as_ref()
                .map_or(true, |(_, best_accuracy, _)| test_accuracy > *best_accuracy);
            if better {
                best = Some((evaluations.len(), test_accuracy, classifier));
            }
            evaluations.push(ModelEvaluation {
                algorithm: kind,
                train_accuracy,
                test_accuracy,
                confusion,
                report: ClassificationReport::from_confusion(&confusion),
                fit_millis,
            });
        }

        let (best_index, _, best) = best.ok_or_else(|| {
            Error::invalid_input("no classifier could be fitted on the training data")
        })?;
        info!(
            "Selected {} with test accuracy {:.4}",
            best.name(),
            evaluations[best_index].test_accuracy
        );

        Ok(TrainingOutcome {
            evaluations,
            best_index,
            best,
            n_train: y_train.len(),
            n_test: y_test.len(),
        })
    }
}

fn predict_all(classifier: &Classifier, x: &CsrMatrix) -> Result<Vec<Label>> {
    x.rows().map(|row| classifier.predict(row)).collect()
}

fn accuracy(classifier: &Classifier, x: &CsrMatrix, y: &[Label]) -> Result<f64> {
    let predictions = predict_all(classifier, x)?;
    Ok(ConfusionMatrix::from_predictions(&predictions, y)?.accuracy())
}
