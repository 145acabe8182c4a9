//! Evaluation metrics for the binary fake/real task
//!
//! `Real` is the positive class.

use serde::{Deserialize, Serialize};
use std::fmt;
use verinews_core::{Error, Label, Result};

/// Confusion counts with `Real` as the positive class
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfusionMatrix {
    /// Real predicted as Real
    pub tp: usize,
    /// Fake predicted as Real
    pub fp: usize,
    /// Fake predicted as Fake
    pub tn: usize,
    /// Real predicted as Fake
    pub fn_: usize,
}

impl ConfusionMatrix {
    /// Count outcomes of paired predictions and ground truth labels
    pub fn from_predictions(predictions: &[Label], ground_truth: &[Label]) -> Result<Self> {
        if predictions.len() != ground_truth.len() {
            return Err(Error::invalid_input(format!(
                "{} predictions for {} labels",
                predictions.len(),
                ground_truth.len()
            )));
        }

        let mut matrix = Self::default();
        for (pred, truth) in predictions.iter().zip(ground_truth) {
            match (pred, truth) {
                (Label::Real, Label::Real) => matrix.tp += 1,
                (Label::Real, Label::Fake) => matrix.fp += 1,
                (Label::Fake, Label::Fake) => matrix.tn += 1,
                (Label::Fake, Label::Real) => matrix.fn_ += 1,
            }
        }
        Ok(matrix)
    }

    pub fn total(&self) -> usize {
        self.tp + self.fp + self.tn + self.fn_
    }

    /// Accuracy: (TP + TN) / Total
    pub fn accuracy(&self) -> f64 {
        ratio(self.tp + self.tn, self.total())
    }

    /// Per-class scores for one label
    pub fn class_scores(&self, label: Label) -> ClassScores {
        // Swap roles when Fake is the class of interest
        let (hit, false_alarm, miss) = match label {
            Label::Real => (self.tp, self.fp, self.fn_),
            Label::Fake => (self.tn, self.fn_, self.fp),
        };
        let precision = ratio(hit, hit + false_alarm);
        let recall = ratio(hit, hit + miss);
        let f1 = if precision + recall == 0.0 {
            0.0
        } else {
            2.0 * precision * recall / (precision + recall)
        };
        ClassScores {
            label,
            precision,
            recall,
            f1,
            support: hit + miss,
        }
    }
}

impl fmt::Display for ConfusionMatrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{:>12} {:>10} {:>10}", "", "pred Fake", "pred Real")?;
        writeln!(f, "{:>12} {:>10} {:>10}", "true Fake", self.tn, self.fp)?;
        write!(f, "{:>12} {:>10} {:>10}", "true Real", self.fn_, self.tp)
    }
}

fn ratio(num: usize, denom: usize) -> f64 {
    if denom == 0 {
        0.0
    } else {
        num as f64 / denom as f64
    }
}

/// Precision, recall and F1 for one class
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClassScores {
    pub label: Label,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub support: usize,
}

/// Per-class scores plus averages
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationReport {
    pub classes: Vec<ClassScores>,
    pub accuracy: f64,
    pub macro_f1: f64,
    pub weighted_f1: f64,
    pub support: usize,
}

impl ClassificationReport {
    pub fn from_confusion(matrix: &ConfusionMatrix) -> Self {
        let classes: Vec<ClassScores> = Label::ALL
            .iter()
            .map(|label| matrix.class_scores(*label))
            .collect();
        let support = matrix.total();
        let macro_f1 = classes.iter().map(|c| c.f1).sum::<f64>() / classes.len() as f64;
        let weighted_f1 = if support == 0 {
            0.0
        } else {
            classes
                .iter()
                .map(|c| c.f1 * c.support as f64)
                .sum::<f64>()
                / support as f64
        };

        Self {
            classes,
            accuracy: matrix.accuracy(),
            macro_f1,
            weighted_f1,
            support,
        }
    }
}

impl fmt::Display for ClassificationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{:>12} {:>10} {:>10} {:>10} {:>10}",
            "", "precision", "recall", "f1-score", "support"
        )?;
        for class in &self.classes {
            writeln!(
                f,
                "{:>12} {:>10.4} {:>10.4} {:>10.4} {:>10}",
                class.label.as_str(),
                class.precision,
                class.recall,
                class.f1,
                class.support
            )?;
        }
        writeln!(
            f,
            "{:>12} {:>10} {:>10} {:>10.4} {:>10}",
            "accuracy", "", "", self.accuracy, self.support
        )?;
        writeln!(
            f,
            "{:>12} {:>10} {:>10} {:>10.4} {:>10}",
            "macro avg", "", "", self.macro_f1, self.support
        )?;
        write!(
            f,
            "{:>12} {:>10} {:>10} {:>10.4} {:>10}",
            "weighted avg", "", "", self.weighted_f1, self.support
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use Label::{Fake, Real};

    #[test]
    fn test_confusion_counts() {
        let pred = [Real, Real, Fake, Fake, Real];
        let truth = [Real, Fake, Fake, Real, Real];
        let m = ConfusionMatrix::from_predictions(&pred, &truth).unwrap();
        assert_eq!(
            m,
            ConfusionMatrix {
                tp: 2,
                fp: 1,
                tn: 1,
                fn_: 1
            }
        );
        assert!((m.accuracy() - 0.6).abs() < 1e-12);
    }

    #[test]
    fn test_length_mismatch() {
        assert!(ConfusionMatrix::from_predictions(&[Real], &[]).is_err());
    }

    #[test]
    fn test_class_scores() {
        let m = ConfusionMatrix {
            tp: 8,
            fp: 2,
            tn: 6,
            fn_: 4,
        };
        let real = m.class_scores(Real);
        assert!((real.precision - 0.8).abs() < 1e-12);
        assert!((real.recall - 8.0 / 12.0).abs() < 1e-12);
        assert_eq!(real.support, 12);

        let fake = m.class_scores(Fake);
        assert!((fake.precision - 0.6).abs() < 1e-12);
        assert!((fake.recall - 0.75).abs() < 1e-12);
        assert_eq!(fake.support, 8);
    }

    #[test]
    fn test_report_and_empty_matrix() {
        let empty = ClassificationReport::from_confusion(&ConfusionMatrix::default());
        assert_eq!(empty.accuracy, 0.0);
        assert_eq!(empty.weighted_f1, 0.0);

        let perfect = ConfusionMatrix {
            tp: 5,
            fp: 0,
            tn: 5,
            fn_: 0,
        };
        let report = ClassificationReport::from_confusion(&perfect);
        assert_eq!(report.accuracy, 1.0);
        assert_eq!(report.macro_f1, 1.0);
        let text = report.to_string();
        assert!(text.contains("precision"));
        assert!(text.contains("Real"));
        assert!(perfect.to_string().contains("true Fake"));
    }
}
