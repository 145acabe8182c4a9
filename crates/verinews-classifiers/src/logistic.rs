//! L2-regularized logistic regression
//!
//! Minimizes
//!
//! ```text
//! ||w||² / 2 + C · Σ log(1 + exp(-yᵢ (w·xᵢ + b)))
//! ```
//!
//! with the intercept `b` left unregularized. The objective is scaled by
//! `1 / (C·n)` and solved with Nesterov-accelerated full-batch gradient
//! descent using the fixed step `1/L`, where `L` bounds the Lipschitz
//! constant of the gradient.

use crate::classifier::{check_row, check_training_set, sigmoid, Estimator};
use crate::sparse::{CsrMatrix, SparseRow};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use verinews_core::{Error, Label, Result};

/// Logistic regression hyperparameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogisticConfig {
    /// Inverse regularization strength
    #[serde(default = "default_c")]
    pub c: f64,

    /// Maximum number of gradient iterations
    #[serde(default = "default_max_iter")]
    pub max_iter: usize,

    /// Stop once every gradient component is below this
    #[serde(default = "default_tol")]
    pub tol: f64,
}

impl Default for LogisticConfig {
    fn default() -> Self {
        Self {
            c: default_c(),
            max_iter: default_max_iter(),
            tol: default_tol(),
        }
    }
}

fn default_c() -> f64 {
    1.0
}

fn default_max_iter() -> usize {
    1000
}

fn default_tol() -> f64 {
    1e-4
}

/// Fitted weights
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct LinearModel {
    coef: Vec<f64>,
    intercept: f64,
    n_iter: usize,
}

/// Binary logistic regression over sparse features
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogisticRegression {
    config: LogisticConfig,
    model: Option<LinearModel>,
}

impl LogisticRegression {
    pub fn new(config: LogisticConfig) -> Self {
        Self {
            config,
            model: None,
        }
    }

    pub fn config(&self) -> &LogisticConfig {
        &self.config
    }

    /// Feature weights, empty before fitting
    pub fn coefficients(&self) -> &[f64] {
        self.model.as_ref().map_or(&[][..], |m| m.coef.as_slice())
    }

    pub fn intercept(&self) -> f64 {
        self.model.as_ref().map_or(0.0, |m| m.intercept)
    }

    /// Iterations used by the last fit
    pub fn n_iter(&self) -> usize {
        self.model.as_ref().map_or(0, |m| m.n_iter)
    }

    #[cfg(test)]
    pub(crate) fn from_weights(coef: Vec<f64>, intercept: f64) -> Self {
        Self {
            config: LogisticConfig::default(),
            model: Some(LinearModel {
                coef,
                intercept,
                n_iter: 0,
            }),
        }
    }

    /// Gradient of the scaled objective at `(w, b)`, written into `grad_w`
    fn gradient(
        &self,
        x: &CsrMatrix,
        targets: &[f64],
        w: &[f64],
        b: f64,
        grad_w: &mut [f64],
    ) -> f64 {
        let n = x.n_rows() as f64;
        let ridge = 1.0 / (self.config.c * n);

        for (g, wj) in grad_w.iter_mut().zip(w) {
            *g = ridge * wj;
        }

        let mut grad_b = 0.0;
        for (row, t) in x.rows().zip(targets) {
            let residual = (sigmoid(row.dot(w) + b) - t) / n;
            grad_b += residual;
            for (j, v) in row.iter() {
                grad_w[j] += residual * v;
            }
        }
        grad_b
    }
}

impl Estimator for LogisticRegression {
    fn fit(&mut self, x: &CsrMatrix, y: &[Label]) -> Result<()> {
        check_training_set(x, y)?;
        if self.config.c.is_nan() || self.config.c <= 0.0 {
            return Err(Error::config(format!("C must be positive, got {}", self.config.c)));
        }

        let n_features = x.n_cols();
        let n = x.n_rows() as f64;
        let targets: Vec<f64> = y.iter().map(|l| l.index() as f64).collect();

        // XᵀX/n with a bias column is bounded by max‖xᵢ‖² + 1
        let max_sq_norm = x
            .rows()
            .map(|row| row.values.iter().map(|v| v * v).sum::<f64>())
            .fold(0.0, f64::max);
        let lipschitz = 1.0 / (self.config.c * n) + 0.25 * (max_sq_norm + 1.0);
        let step = 1.0 / lipschitz;

        let mut w = vec![0.0; n_features];
        let mut b = 0.0;
        let mut w_prev = w.clone();
        let mut b_prev = b;
        let mut look_w = w.clone();
        let mut grad_w = vec![0.0; n_features];
        let mut n_iter = 0;

        for k in 0..self.config.max_iter {
            n_iter = k + 1;

            let momentum = k as f64 / (k as f64 + 3.0);
            for ((lw, wj), pj) in look_w.iter_mut().zip(&w).zip(&w_prev) {
                *lw = wj + momentum * (wj - pj);
            }
            let look_b = b + momentum * (b - b_prev);

            let grad_b = self.gradient(x, &targets, &look_w, look_b, &mut grad_w);
            let grad_norm = grad_w.iter().fold(grad_b.abs(), |acc, g| acc.max(g.abs()));
            if grad_norm < self.config.tol {
                w.copy_from_slice(&look_w);
                b = look_b;
                break;
            }

            std::mem::swap(&mut w_prev, &mut w);
            b_prev = b;
            for ((wj, lw), g) in w.iter_mut().zip(&look_w).zip(&grad_w) {
                *wj = lw - step * g;
            }
            b = look_b - step * grad_b;
        }

        if w.iter().any(|v| !v.is_finite()) || !b.is_finite() {
            return Err(Error::invalid_input("logistic regression diverged"));
        }

        if n_iter == self.config.max_iter {
            debug!("Logistic regression stopped at max_iter={}", n_iter);
        }
        info!(
            "Fitted logistic regression on {} samples x {} features in {} iterations",
            x.n_rows(),
            n_features,
            n_iter
        );

        self.model = Some(LinearModel {
            coef: w,
            intercept: b,
            n_iter,
        });
        Ok(())
    }

    fn predict_proba(&self, x: SparseRow<'_>) -> Result<[f64; 2]> {
        check_row(x, self.n_features(), "logistic regression")?;
        let model = self
            .model
            .as_ref()
            .ok_or_else(|| Error::not_fitted("logistic regression is not fitted"))?;
        let p = sigmoid(x.dot(&model.coef) + model.intercept);
        Ok([1.0 - p, p])
    }

    fn n_features(&self) -> Option<usize> {
        self.model.as_ref().map(|m| m.coef.len())
    }
}
