//! Activation functions
//!
//! A closed set of scalar activations, each with its derivative and the
//! metadata a plotting host needs to label and scale the curve.

use crate::features::sigmoid;
use serde::Serialize;

/// Slope of [`Activation::LeakyRelu`] for negative inputs
pub const LEAKY_SLOPE: f64 = 0.01;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Activation {
    Sigmoid,
    Tanh,
    Relu,
    LeakyRelu,
    /// Exponential linear unit with `α = 1`
    Elu,
    Softplus,
    /// Heaviside step, 1 for `x >= 0`
    Step,
}

impl Activation {
    pub const ALL: [Activation; 7] = [
        Activation::Sigmoid,
        Activation::Tanh,
        Activation::Relu,
        Activation::LeakyRelu,
        Activation::Elu,
        Activation::Softplus,
        Activation::Step,
    ];

    pub fn apply(self, x: f64) -> f64 {
        match self {
            Activation::Sigmoid => sigmoid(x),
            Activation::Tanh => x.tanh(),
            Activation::Relu => x.max(0.0),
            Activation::LeakyRelu => {
                if x > 0.0 {
                    x
                } else {
                    LEAKY_SLOPE * x
                }
            }
            Activation::Elu => {
                if x > 0.0 {
                    x
                } else {
                    x.exp_m1()
                }
            }
            // ln(1 + e^x) without overflow for large x
            Activation::Softplus => x.max(0.0) + (-x.abs()).exp().ln_1p(),
            Activation::Step => {
                if x >= 0.0 {
                    1.0
                } else {
                    0.0
                }
            }
        }
    }

    /// Derivative at `x`; the ReLU variants use the left-hand slope at 0
    pub fn derivative(self, x: f64) -> f64 {
        match self {
            Activation::Sigmoid => {
                let s = sigmoid(x);
                s * (1.0 - s)
            }
            Activation::Tanh => 1.0 - x.tanh().powi(2),
            Activation::Relu => {
                if x > 0.0 {
                    1.0
                } else {
                    0.0
                }
            }
            Activation::LeakyRelu => {
                if x > 0.0 {
                    1.0
                } else {
                    LEAKY_SLOPE
                }
            }
            Activation::Elu => {
                if x > 0.0 {
                    1.0
                } else {
                    x.exp()
                }
            }
            Activation::Softplus => sigmoid(x),
            Activation::Step => 0.0,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Activation::Sigmoid => "sigmoid",
            Activation::Tanh => "tanh",
            Activation::Relu => "relu",
            Activation::LeakyRelu => "leaky_relu",
            Activation::Elu => "elu",
            Activation::Softplus => "softplus",
            Activation::Step => "step",
        }
    }

    /// Range of the activation as `(min, max)`; infinite ends are unbounded
    pub fn output_range(self) -> (f64, f64) {
        match self {
            Activation::Sigmoid | Activation::Step => (0.0, 1.0),
            Activation::Tanh => (-1.0, 1.0),
            Activation::Relu | Activation::Softplus => (0.0, f64::INFINITY),
            Activation::LeakyRelu => (f64::NEG_INFINITY, f64::INFINITY),
            Activation::Elu => (-1.0, f64::INFINITY),
        }
    }

    /// Look up an activation by its [`name`](Self::name)
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|a| a.name() == name)
    }

    /// `(x, f(x))` pairs at `samples` evenly spaced points over `[from, to]`
    pub fn curve(self, from: f64, to: f64, samples: usize) -> Vec<(f64, f64)> {
        let samples = samples.max(2);
        let step = (to - from) / (samples - 1) as f64;
        (0..samples)
            .map(|i| {
                let x = from + i as f64 * step;
                (x, self.apply(x))
            })
            .collect()
    }
}
