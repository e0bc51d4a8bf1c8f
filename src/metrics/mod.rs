//! Binary classification metrics
//!
//! A [`ConfusionMatrix`] counts the four outcomes of a two-class prediction.
//! It can be built from predicted labels directly or from raw scores and a
//! decision threshold, which is how the threshold explorer sweeps a cut-off
//! across a score distribution.

use crate::core::{LearnError, Result};
use serde::Serialize;

/// Counts of the four prediction outcomes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ConfusionMatrix {
    pub true_positives: usize,
    pub true_negatives: usize,
    pub false_positives: usize,
    pub false_negatives: usize,
}

impl ConfusionMatrix {
    pub fn new(tp: usize, tn: usize, fp: usize, fn_: usize) -> Self {
        Self {
            true_positives: tp,
            true_negatives: tn,
            false_positives: fp,
            false_negatives: fn_,
        }
    }

    /// Tally predicted against actual labels (`true` is the positive class)
    pub fn from_predictions(predicted: &[bool], actual: &[bool]) -> Result<Self> {
        if predicted.len() != actual.len() {
            return Err(LearnError::DimensionMismatch {
                expected: actual.len(),
                actual: predicted.len(),
            });
        }
        let mut matrix = Self::default();
        for (&p, &a) in predicted.iter().zip(actual) {
            matrix.record(p, a);
        }
        Ok(matrix)
    }

    /// Classify every score `>= threshold` as positive and tally
    pub fn at_threshold(scores: &[f64], actual: &[bool], threshold: f64) -> Result<Self> {
        let predicted: Vec<bool> = scores.iter().map(|&s| s >= threshold).collect();
        Self::from_predictions(&predicted, actual)
    }

    /// Add one outcome
    pub fn record(&mut self, predicted: bool, actual: bool) {
        match (predicted, actual) {
            (true, true) => self.true_positives += 1,
            (false, false) => self.true_negatives += 1,
            (true, false) => self.false_positives += 1,
            (false, true) => self.false_negatives += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.true_positives + self.true_negatives + self.false_positives + self.false_negatives
    }

    /// (TP + TN) / total
    pub fn accuracy(&self) -> f64 {
        share(self.true_positives + self.true_negatives, self.total())
    }

    /// TP / (TP + FP)
    pub fn precision(&self) -> f64 {
        share(self.true_positives, self.true_positives + self.false_positives)
    }

    /// TP / (TP + FN), also called sensitivity or true positive rate
    pub fn recall(&self) -> f64 {
        share(self.true_positives, self.true_positives + self.false_negatives)
    }

    /// Harmonic mean of precision and recall
    pub fn f1_score(&self) -> f64 {
        let p = self.precision();
        let r = self.recall();
        if p + r == 0.0 {
            0.0
        } else {
            2.0 * (p * r) / (p + r)
        }
    }

    /// TN / (TN + FP)
    pub fn specificity(&self) -> f64 {
        share(self.true_negatives, self.true_negatives + self.false_positives)
    }

    /// FP / (FP + TN)
    pub fn false_positive_rate(&self) -> f64 {
        share(self.false_positives, self.false_positives + self.true_negatives)
    }
}

fn share(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64
    }
}

/// Confusion matrix at one threshold of a sweep
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ThresholdPoint {
    pub threshold: f64,
    pub matrix: ConfusionMatrix,
}

/// Evaluate the confusion matrix at each threshold in turn
pub fn threshold_sweep(
    scores: &[f64],
    actual: &[bool],
    thresholds: &[f64],
) -> Result<Vec<ThresholdPoint>> {
    thresholds
        .iter()
        .map(|&threshold| {
            Ok(ThresholdPoint {
                threshold,
                matrix: ConfusionMatrix::at_threshold(scores, actual, threshold)?,
            })
        })
        .collect()
}

/// `steps + 1` evenly spaced thresholds covering `[0, 1]`
pub fn unit_thresholds(steps: usize) -> Vec<f64> {
    let steps = steps.max(1);
    (0..=steps).map(|i| i as f64 / steps as f64).collect()
}
