//! Multinomial naive Bayes

use crate::classifier::{check_row, check_training_set, Estimator};
use crate::sparse::{CsrMatrix, SparseRow};
use serde::{Deserialize, Serialize};
use tracing::info;
use verinews_core::{Error, Label, Result};

/// Naive Bayes hyperparameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NaiveBayesConfig {
    /// Additive (Laplace/Lidstone) smoothing
    #[serde(default = "default_alpha")]
    pub alpha: f64,
}

impl Default for NaiveBayesConfig {
    fn default() -> Self {
        Self {
            alpha: default_alpha(),
        }
    }
}

fn default_alpha() -> f64 {
    1.0
}

/// Fitted log-probabilities, indexed by class
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct NbModel {
    class_log_prior: [f64; 2],
    feature_log_prob: [Vec<f64>; 2],
    class_count: [usize; 2],
}

/// Multinomial naive Bayes over non-negative features
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MultinomialNb {
    config: NaiveBayesConfig,
    model: Option<NbModel>,
}

impl MultinomialNb {
    pub fn new(config: NaiveBayesConfig) -> Self {
        Self {
            config,
            model: None,
        }
    }

    pub fn config(&self) -> &NaiveBayesConfig {
        &self.config
    }

    /// Training samples seen per class
    pub fn class_count(&self) -> Option<[usize; 2]> {
        self.model.as_ref().map(|m| m.class_count)
    }

    /// Joint log-likelihood `log P(c) + Σ x_j log P(j | c)` per class
    fn joint_log_likelihood(model: &NbModel, x: SparseRow<'_>) -> [f64; 2] {
        let mut jll = model.class_log_prior;
        for (c, log_prob) in model.feature_log_prob.iter().enumerate() {
            jll[c] += x.dot(log_prob);
        }
        jll
    }
}

impl Estimator for MultinomialNb {
    fn fit(&mut self, x: &CsrMatrix, y: &[Label]) -> Result<()> {
        check_training_set(x, y)?;
        if self.config.alpha.is_nan() || self.config.alpha <= 0.0 {
            return Err(Error::config(format!(
                "alpha must be positive, got {}",
                self.config.alpha
            )));
        }
        if x.rows().any(|row| row.values.iter().any(|v| *v < 0.0)) {
            return Err(Error::invalid_input(
                "multinomial naive Bayes requires non-negative features",
            ));
        }

        let n_features = x.n_cols();
        let mut class_count = [0usize; 2];
        let mut feature_count = [vec![0.0; n_features], vec![0.0; n_features]];
        for (row, label) in x.rows().zip(y) {
            let c = label.index();
            class_count[c] += 1;
            for (j, v) in row.iter() {
                feature_count[c][j] += v;
            }
        }

        let n = y.len() as f64;
        let alpha = self.config.alpha;
        let class_log_prior = class_count.map(|count| (count as f64 / n).ln());
        let feature_log_prob = feature_count.map(|counts| {
            let total: f64 = counts.iter().sum::<f64>() + alpha * n_features as f64;
            let log_total = total.ln();
            counts.iter().map(|c| (c + alpha).ln() - log_total).collect()
        });

        info!(
            "Fitted naive Bayes on {} samples x {} features ({} fake, {} real)",
            y.len(),
            n_features,
            class_count[0],
            class_count[1]
        );

        self.model = Some(NbModel {
            class_log_prior,
            feature_log_prob,
            class_count,
        });
        Ok(())
    }

    fn predict_proba(&self, x: SparseRow<'_>) -> Result<[f64; 2]> {
        check_row(x, self.n_features(), "naive Bayes")?;
        let model = self
            .model
            .as_ref()
            .ok_or_else(|| Error::not_fitted("naive Bayes is not fitted"))?;

        let jll = Self::joint_log_likelihood(model, x);
        let max = jll[0].max(jll[1]);
        let log_norm = max + ((jll[0] - max).exp() + (jll[1] - max).exp()).ln();
        Ok([(jll[0] - log_norm).exp(), (jll[1] - log_norm).exp()])
    }

    fn n_features(&self) -> Option<usize> {
        self.model.as_ref().map(|m| m.feature_log_prob[0].len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sparse::SparseVector;

    fn counts_set() -> (CsrMatrix, Vec<Label>) {
        let rows = vec![
            SparseVector::from_pairs(3, vec![(0, 2.0), (2, 1.0)]),
            SparseVector::from_pairs(3, vec![(0, 1.0)]),
            SparseVector::from_pairs(3, vec![(1, 3.0)]),
        ];
        let labels = vec![Label::Fake, Label::Fake, Label::Real];
        (CsrMatrix::from_rows(3, &rows), labels)
    }

    #[test]
    fn test_smoothed_log_probabilities() {
        let (x, y) = counts_set();
        let mut nb = MultinomialNb::new(NaiveBayesConfig::default());
        nb.fit(&x, &y).unwrap();
        assert_eq!(nb.class_count(), Some([2, 1]));

        let model = nb.model.as_ref().unwrap();
        // Fake counts [3, 0, 1] + 1 over 4 + 3
        let expected = [(4.0f64 / 7.0).ln(), (1.0f64 / 7.0).ln(), (2.0f64 / 7.0).ln()];
        for (got, want) in model.feature_log_prob[0].iter().zip(expected) {
            assert!((got - want).abs() < 1e-12);
        }
        assert!((model.class_log_prior[0] - (2.0f64 / 3.0).ln()).abs() < 1e-12);
    }

    #[test]
    fn test_probabilities_match_bayes_rule() {
        let (x, y) = counts_set();
        let mut nb = MultinomialNb::new(NaiveBayesConfig::default());
        nb.fit(&x, &y).unwrap();

        let row = SparseVector::from_pairs(3, vec![(0, 1.0)]);
        let proba = nb.predict_proba(row.as_row()).unwrap();
        // P(fake) ∝ 2/3 · 4/7, P(real) ∝ 1/3 · 1/6
        let fake = 2.0 / 3.0 * 4.0 / 7.0;
        let real = 1.0 / 3.0 * 1.0 / 6.0;
        assert!((proba[0] - fake / (fake + real)).abs() < 1e-12);
        assert_eq!(nb.predict(row.as_row()).unwrap(), Label::Fake);
    }

    #[test]
    fn test_empty_row_follows_prior() {
        let (x, y) = counts_set();
        let mut nb = MultinomialNb::new(NaiveBayesConfig::default());
        nb.fit(&x, &y).unwrap();
        let proba = nb.predict_proba(SparseVector::zeros(3).as_row()).unwrap();
        assert!((proba[0] - 2.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_rejects_negative_features() {
        let rows = vec![
            SparseVector::from_pairs(2, vec![(0, -1.0)]),
            SparseVector::from_pairs(2, vec![(1, 1.0)]),
        ];
        let x = CsrMatrix::from_rows(2, &rows);
        let mut nb = MultinomialNb::new(NaiveBayesConfig::default());
        assert!(matches!(
            nb.fit(&x, &[Label::Fake, Label::Real]),
            Err(Error::InvalidInput(_))
        ));
    }
}
