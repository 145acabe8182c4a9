//! Classifier trait and the closed set of classifier families

use crate::forest::{ForestConfig, RandomForest};
use crate::logistic::{LogisticConfig, LogisticRegression};
use crate::naive_bayes::{MultinomialNb, NaiveBayesConfig};
use crate::sparse::{CsrMatrix, SparseRow};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use verinews_core::{Error, Label, Result};

/// Common interface of every classifier family
pub trait Estimator {
    /// Fit on a feature matrix with one label per row
    fn fit(&mut self, x: &CsrMatrix, y: &[Label]) -> Result<()>;

    /// Class probabilities `[P(Fake), P(Real)]` for one feature row
    fn predict_proba(&self, x: SparseRow<'_>) -> Result<[f64; 2]>;

    /// Most probable label; a tie goes to `Fake`
    fn predict(&self, x: SparseRow<'_>) -> Result<Label> {
        let proba = self.predict_proba(x)?;
        Ok(if proba[1] > proba[0] {
            Label::Real
        } else {
            Label::Fake
        })
    }

    /// Feature dimensionality seen at fit time, `None` before fitting
    fn n_features(&self) -> Option<usize>;
}

/// Classifier family identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlgorithmKind {
    LogisticRegression,
    RandomForest,
    NaiveBayes,
}

impl AlgorithmKind {
    /// Default training order
    pub const ALL: [AlgorithmKind; 3] = [
        AlgorithmKind::LogisticRegression,
        AlgorithmKind::RandomForest,
        AlgorithmKind::NaiveBayes,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::LogisticRegression => "logistic_regression",
            Self::RandomForest => "random_forest",
            Self::NaiveBayes => "naive_bayes",
        }
    }
}

impl fmt::Display for AlgorithmKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for AlgorithmKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.name() == s)
            .ok_or_else(|| Error::config(format!("unknown algorithm: {s}")))
    }
}

/// Hyperparameters for every family
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClassifierParams {
    #[serde(default)]
    pub logistic_regression: LogisticConfig,

    #[serde(default)]
    pub random_forest: ForestConfig,

    #[serde(default)]
    pub naive_bayes: NaiveBayesConfig,
}

/// A classifier of one of the supported families
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Classifier {
    LogisticRegression(LogisticRegression),
    RandomForest(RandomForest),
    NaiveBayes(MultinomialNb),
}

impl Classifier {
    /// Create an unfitted classifier of the given family
    pub fn new(kind: AlgorithmKind, params: &ClassifierParams) -> Self {
        match kind {
            AlgorithmKind::LogisticRegression => {
                let config = params.logistic_regression.clone();
                Self::LogisticRegression(LogisticRegression::new(config))
            }
            AlgorithmKind::RandomForest => {
                Self::RandomForest(RandomForest::new(params.random_forest.clone()))
            }
            AlgorithmKind::NaiveBayes => {
                Self::NaiveBayes(MultinomialNb::new(params.naive_bayes.clone()))
            }
        }
    }

    pub fn kind(&self) -> AlgorithmKind {
        match self {
            Self::LogisticRegression(_) => AlgorithmKind::LogisticRegression,
            Self::RandomForest(_) => AlgorithmKind::RandomForest,
            Self::NaiveBayes(_) => AlgorithmKind::NaiveBayes,
        }
    }

    pub fn name(&self) -> &'static str {
        self.kind().name()
    }

    fn estimator(&self) -> &dyn Estimator {
        match self {
            Self::LogisticRegression(model) => model,
            Self::RandomForest(model) => model,
            Self::NaiveBayes(model) => model,
        }
    }

    fn estimator_mut(&mut self) -> &mut dyn Estimator {
        match self {
            Self::LogisticRegression(model) => model,
            Self::RandomForest(model) => model,
            Self::NaiveBayes(model) => model,
        }
    }
}

impl Estimator for Classifier {
    fn fit(&mut self, x: &CsrMatrix, y: &[Label]) -> Result<()> {
        self.estimator_mut().fit(x, y)
    }

    fn predict_proba(&self, x: SparseRow<'_>) -> Result<[f64; 2]> {
        self.estimator().predict_proba(x)
    }

    fn n_features(&self) -> Option<usize> {
        self.estimator().n_features()
    }
}

/// Check a training set before fitting
pub(crate) fn check_training_set(x: &CsrMatrix, y: &[Label]) -> Result<()> {
    if x.n_rows() != y.len() {
        return Err(Error::invalid_input(format!(
            "{} feature rows but {} labels",
            x.n_rows(),
            y.len()
        )));
    }
    if y.is_empty() {
        return Err(Error::invalid_input("empty training set"));
    }
    if x.n_cols() == 0 {
        return Err(Error::invalid_input("training set has no features"));
    }
    for label in Label::ALL {
        if !y.contains(&label) {
            return Err(Error::invalid_input(format!(
                "training set has no {label} samples"
            )));
        }
    }
    if x.rows().any(|row| row.values.iter().any(|v| !v.is_finite())) {
        return Err(Error::invalid_input("training set contains non-finite values"));
    }
    Ok(())
}

/// Check a row against the fitted dimensionality
pub(crate) fn check_row(x: SparseRow<'_>, n_features: Option<usize>, model: &str) -> Result<usize> {
    let n_features = n_features.ok_or_else(|| Error::not_fitted(format!("{model} is not fitted")))?;
    if x.min_dim() > n_features {
        return Err(Error::prediction(format!(
            "feature index {} out of range for {model} with {n_features} features",
            x.min_dim() - 1
        )));
    }
    Ok(n_features)
}

/// Numerically stable logistic function
pub(crate) fn sigmoid(z: f64) -> f64 {
    if z >= 0.0 {
        1.0 / (1.0 + (-z).exp())
    } else {
        let e = z.exp();
        e / (1.0 + e)
    }
}
