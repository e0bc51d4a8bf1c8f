//! High-level SVM interface
//!
//! [`Svm`] collects the kernel and solver settings, runs the simplified SMO
//! solver and wraps the result in a [`TrainedModel`] that can be queried
//! point by point.
//!
//! ```rust,no_run
//! use scratchml::api::Svm;
//! use scratchml::kernel::RbfKernel;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let model = Svm::with_kernel(RbfKernel::with_scale(600.0))
//!     .with_c(1.0)
//!     .with_seed(7)
//!     .train_from_csv("points.csv")?;
//! println!("{} support vectors", model.info().n_support_vectors);
//! # Ok(())
//! # }
//! ```

use crate::contour::{marching_squares, Bounds, SampledField, Segment};
use crate::core::{Classifier, LabeledPoint, Point2D, Result, Stepper};
use crate::data::PointTable;
use crate::kernel::{Kernel, LinearKernel};
use crate::metrics::ConfusionMatrix;
use crate::solver::{SmoConfig, SmoSolution, SmoTrainer};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;

/// SVM builder holding a kernel and solver settings
pub struct Svm<K: Kernel = LinearKernel> {
    kernel: K,
    config: SmoConfig,
    seed: Option<u64>,
}

impl Svm<LinearKernel> {
    /// Linear kernel on unscaled coordinates with default settings
    pub fn new() -> Self {
        Self::with_kernel(LinearKernel::default())
    }
}

impl Default for Svm<LinearKernel> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Kernel> Svm<K> {
    pub fn with_kernel(kernel: K) -> Self {
        Self {
            kernel,
            config: SmoConfig::default(),
            seed: None,
        }
    }

    /// Set regularization parameter C
    pub fn with_c(mut self, c: f64) -> Self {
        self.config.c = c;
        self
    }

    /// Set KKT tolerance
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.config.tolerance = tolerance;
        self
    }

    pub fn with_max_passes(mut self, max_passes: usize) -> Self {
        self.config.max_passes = max_passes;
        self
    }

    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.config.max_iterations = max_iterations;
        self
    }

    /// Kernel cache budget in bytes
    pub fn with_cache_size(mut self, cache_size: usize) -> Self {
        self.config.cache_size = cache_size;
        self
    }

    /// Seed the partner selection; unseeded builders draw from entropy
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn config(&self) -> &SmoConfig {
        &self.config
    }

    fn rng(&self) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        }
    }

    /// Stepped solver for hosts that interleave sweeps with rendering
    pub fn trainer(self, samples: &[LabeledPoint<f64>]) -> Result<SmoTrainer<K, StdRng>> {
        let rng = self.rng();
        SmoTrainer::new(samples, Arc::new(self.kernel), self.config, rng)
    }

    /// Train to completion on points labeled `-1.0` / `+1.0`
    pub fn train(self, samples: &[LabeledPoint<f64>]) -> Result<TrainedModel<K>> {
        let rng = self.rng();
        let kernel = Arc::new(self.kernel);
        let mut trainer = SmoTrainer::new(samples, Arc::clone(&kernel), self.config, rng)?;
        trainer.run();
        Ok(TrainedModel::from_solution(kernel, samples, trainer.finish()))
    }

    /// Train from a CSV file with an `x,y,label` layout
    pub fn train_from_csv<P: AsRef<Path>>(self, path: P) -> Result<TrainedModel<K>> {
        let table = PointTable::from_file(path)?;
        self.train(&table.signed_labeled()?)
    }
}

/// Trained SVM: the training points, their multipliers and the bias
pub struct TrainedModel<K: Kernel> {
    kernel: Arc<K>,
    points: Vec<Point2D>,
    labels: Vec<f64>,
    solution: SmoSolution,
}

impl<K: Kernel> TrainedModel<K> {
    /// Wrap a solver result together with the data it was trained on
    pub fn from_solution(
        kernel: Arc<K>,
        samples: &[LabeledPoint<f64>],
        solution: SmoSolution,
    ) -> Self {
        Self {
            kernel,
            points: samples.iter().map(|s| s.point).collect(),
            labels: samples.iter().map(|s| s.label).collect(),
            solution,
        }
    }

    /// `Σ αᵢyᵢK(xᵢ, p) + b` over every point with a positive multiplier
    pub fn decision_function(&self, point: &Point2D) -> f64 {
        self.solution
            .alpha
            .iter()
            .zip(self.points.iter().zip(&self.labels))
            .filter(|(alpha, _)| **alpha > 0.0)
            .map(|(&alpha, (x, &y))| alpha * y * self.kernel.compute(x, point))
            .sum::<f64>()
            + self.solution.b
    }

    /// Predict `+1.0` when the decision value is non-negative, else `-1.0`
    pub fn predict(&self, point: &Point2D) -> f64 {
        if self.decision_function(point) >= 0.0 {
            1.0
        } else {
            -1.0
        }
    }

    /// Fraction of samples classified correctly
    pub fn evaluate(&self, samples: &[LabeledPoint<f64>]) -> f64 {
        self.accuracy(samples)
    }

    /// Confusion matrix with `+1` as the positive class
    pub fn evaluate_detailed(&self, samples: &[LabeledPoint<f64>]) -> ConfusionMatrix {
        let mut matrix = ConfusionMatrix::default();
        for s in samples {
            matrix.record(self.predict(&s.point) > 0.0, s.label > 0.0);
        }
        matrix
    }

    /// Zero level set of the decision function over `bounds`
    pub fn decision_contour(&self, bounds: Bounds, resolution: usize) -> Result<Vec<Segment>> {
        let field = SampledField::sample(bounds, resolution, resolution, |p| {
            self.decision_function(p)
        })?;
        Ok(marching_squares(&field, 0.0))
    }

    /// Indices of training points whose multiplier exceeds the support threshold
    pub fn support_vectors(&self) -> &[usize] {
        &self.solution.support_vectors
    }

    pub fn alpha(&self) -> &[f64] {
        &self.solution.alpha
    }

    pub fn bias(&self) -> f64 {
        self.solution.b
    }

    pub fn info(&self) -> ModelInfo {
        ModelInfo {
            kernel: self.kernel.name(),
            n_support_vectors: self.solution.support_vectors.len(),
            bias: self.solution.b,
            support_vector_indices: self.solution.support_vectors.clone(),
            iterations: self.solution.iterations,
            objective_value: self.solution.objective_value,
        }
    }

    pub fn solution(&self) -> &SmoSolution {
        &self.solution
    }
}

impl<K: Kernel> Classifier for TrainedModel<K> {
    type Label = f64;

    fn classify(&self, point: &Point2D) -> f64 {
        self.predict(point)
    }
}

/// Summary of a trained model
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelInfo {
    pub kernel: &'static str,
    pub n_support_vectors: usize,
    pub bias: f64,
    pub support_vector_indices: Vec<usize>,
    pub iterations: usize,
    pub objective_value: f64,
}
