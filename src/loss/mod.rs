//! Loss functions
//!
//! `value(prediction, target)` is the per-sample loss and `derivative` its
//! slope with respect to the prediction.

use crate::core::{LearnError, Result};
use crate::logistic::{binary_cross_entropy, PROBABILITY_CLAMP};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum LossFunction {
    /// Squared error `(p - t)²`
    Mse,
    /// Absolute error `|p - t|`
    Mae,
    /// Quadratic within `delta` of the target, linear beyond
    Huber { delta: f64 },
    /// Cross-entropy of a probability against a 0/1 target
    BinaryCrossEntropy,
    /// `max(0, 1 - t·p)` for a raw score against a ±1 target
    Hinge,
}

impl LossFunction {
    /// Every loss, with Huber at `delta = 1`
    pub fn standard() -> [LossFunction; 5] {
        [
            LossFunction::Mse,
            LossFunction::Mae,
            LossFunction::Huber { delta: 1.0 },
            LossFunction::BinaryCrossEntropy,
            LossFunction::Hinge,
        ]
    }

    pub fn value(&self, prediction: f64, target: f64) -> f64 {
        let r = prediction - target;
        match *self {
            LossFunction::Mse => r * r,
            LossFunction::Mae => r.abs(),
            LossFunction::Huber { delta } => {
                if r.abs() <= delta {
                    0.5 * r * r
                } else {
                    delta * (r.abs() - 0.5 * delta)
                }
            }
            LossFunction::BinaryCrossEntropy => binary_cross_entropy(prediction, target),
            LossFunction::Hinge => (1.0 - target * prediction).max(0.0),
        }
    }

    pub fn derivative(&self, prediction: f64, target: f64) -> f64 {
        let r = prediction - target;
        match *self {
            LossFunction::Mse => 2.0 * r,
            LossFunction::Mae => sign(r),
            LossFunction::Huber { delta } => {
                if r.abs() <= delta {
                    r
                } else {
                    delta * sign(r)
                }
            }
            LossFunction::BinaryCrossEntropy => {
                let p = prediction.clamp(PROBABILITY_CLAMP, 1.0 - PROBABILITY_CLAMP);
                (p - target) / (p * (1.0 - p))
            }
            LossFunction::Hinge => {
                if target * prediction < 1.0 {
                    -target
                } else {
                    0.0
                }
            }
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            LossFunction::Mse => "mse",
            LossFunction::Mae => "mae",
            LossFunction::Huber { .. } => "huber",
            LossFunction::BinaryCrossEntropy => "bce",
            LossFunction::Hinge => "hinge",
        }
    }

    /// Mean loss over paired predictions and targets
    pub fn mean(&self, predictions: &[f64], targets: &[f64]) -> Result<f64> {
        if predictions.len() != targets.len() {
            return Err(LearnError::DimensionMismatch {
                expected: targets.len(),
                actual: predictions.len(),
            });
        }
        if predictions.is_empty() {
            return Ok(0.0);
        }
        let total: f64 = predictions
            .iter()
            .zip(targets)
            .map(|(&p, &t)| self.value(p, t))
            .sum();
        Ok(total / predictions.len() as f64)
    }
}

/// Sign with `sign(0) = 0`
fn sign(x: f64) -> f64 {
    if x > 0.0 {
        1.0
    } else if x < 0.0 {
        -1.0
    } else {
        0.0
    }
}
