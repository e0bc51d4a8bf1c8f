//! Feature expansions and the logistic link
//!
//! Two distinct polynomial expansions are used:
//!
//! * [`polynomial_1d`]: `[1, x, x², ..., x^degree]` for single-input regression.
//! * [`polynomial_2d`]: every term `x^i·y^j` with `i + j <= degree`, ordered as
//!   the bias, then for each total degree `d = 1..=degree` the terms
//!   `x^(d-i)·y^i` for `i = 0..=d`.
//!
//! Weight vectors are indexed by these orderings, so they must not change.

use crate::core::Point2D;

/// Saturation bound for [`sigmoid`]
pub const SIGMOID_SATURATION: f64 = 500.0;

/// Number of terms produced by [`polynomial_1d`]
pub fn polynomial_1d_len(degree: usize) -> usize {
    degree + 1
}

/// Number of terms produced by [`polynomial_2d`]
pub fn polynomial_2d_len(degree: usize) -> usize {
    (degree + 1) * (degree + 2) / 2
}

/// Single-variable polynomial features `[x^0, x^1, ..., x^degree]`
pub fn polynomial_1d(x: f64, degree: usize) -> Vec<f64> {
    let mut features = Vec::with_capacity(polynomial_1d_len(degree));
    let mut power = 1.0;
    for _ in 0..=degree {
        features.push(power);
        power *= x;
    }
    features
}

/// Two-variable polynomial features in the canonical ordering
///
/// For `degree = 2` this is `[1, x, y, x², xy, y²]`.
pub fn polynomial_2d(point: &Point2D, degree: usize) -> Vec<f64> {
    let mut features = Vec::with_capacity(polynomial_2d_len(degree));
    features.push(1.0);
    for d in 1..=degree {
        for i in 0..=d {
            features.push(point.x.powi((d - i) as i32) * point.y.powi(i as i32));
        }
    }
    features
}

/// Logistic function, saturating to exactly 0.0 / 1.0 beyond ±500
pub fn sigmoid(z: f64) -> f64 {
    if z > SIGMOID_SATURATION {
        1.0
    } else if z < -SIGMOID_SATURATION {
        0.0
    } else {
        1.0 / (1.0 + (-z).exp())
    }
}

/// Dot product of a weight vector with a feature vector
pub(crate) fn dot(weights: &[f64], features: &[f64]) -> f64 {
    weights.iter().zip(features).map(|(w, f)| w * f).sum()
}
