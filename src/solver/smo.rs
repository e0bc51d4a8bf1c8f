//! Simplified Sequential Minimal Optimization (SMO)
//!
//! Each sweep visits every training point in order. A point that violates
//! the KKT conditions by more than `tolerance` is paired with a uniformly
//! random partner and the two multipliers are optimized jointly in closed
//! form. Training stops after `max_passes` consecutive sweeps that change
//! nothing, or after `max_iterations` sweeps in total.
//!
//! There is no second-choice heuristic and no KKT-gap stopping test; the
//! pass counter is the only convergence criterion.

use crate::cache::{CacheStats, KernelCache, DEFAULT_CACHE_BYTES};
use crate::core::error::{require_points, require_positive};
use crate::core::{LabeledPoint, LearnError, Point2D, Result, Stepper};
use crate::kernel::Kernel;
use log::{debug, trace};
use rand::Rng;
use serde::Serialize;
use std::sync::Arc;

/// Smallest multiplier change that counts as progress
const MIN_ALPHA_CHANGE: f64 = 1e-5;

/// Solver configuration
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SmoConfig {
    /// Box constraint on every multiplier
    pub c: f64,
    /// Slack allowed on the KKT conditions
    pub tolerance: f64,
    /// Consecutive unchanged sweeps required to stop
    pub max_passes: usize,
    /// Hard cap on the number of sweeps
    pub max_iterations: usize,
    /// Multipliers above this mark support vectors
    pub support_threshold: f64,
    /// Kernel cache budget in bytes
    pub cache_size: usize,
}

impl Default for SmoConfig {
    fn default() -> Self {
        Self {
            c: 1.0,
            tolerance: 1e-3,
            max_passes: 10,
            max_iterations: 2000,
            support_threshold: 1e-4,
            cache_size: DEFAULT_CACHE_BYTES,
        }
    }
}

impl SmoConfig {
    pub fn with_c(mut self, c: f64) -> Self {
        self.c = c;
        self
    }

    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    pub fn with_max_passes(mut self, max_passes: usize) -> Self {
        self.max_passes = max_passes;
        self
    }

    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    pub fn with_cache_size(mut self, cache_size: usize) -> Self {
        self.cache_size = cache_size;
        self
    }

    pub fn validate(&self) -> Result<()> {
        require_positive(self.c, "C")?;
        if !(self.tolerance >= 0.0 && self.tolerance.is_finite()) {
            return Err(LearnError::InvalidParameter(format!(
                "tolerance must be non-negative, got {}",
                self.tolerance
            )));
        }
        if self.max_passes == 0 || self.max_iterations == 0 {
            return Err(LearnError::InvalidParameter(
                "max_passes and max_iterations must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Output of a finished SMO run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SmoSolution {
    /// One multiplier per training point, each in `[0, C]`
    pub alpha: Vec<f64>,
    pub b: f64,
    /// Indices whose multiplier exceeds the support threshold
    pub support_vectors: Vec<usize>,
    /// Sweeps performed
    pub iterations: usize,
    /// Dual objective `Σα - ½ΣΣ αᵢαⱼyᵢyⱼK(i,j)`
    pub objective_value: f64,
}

/// Stepped simplified-SMO trainer; one [`Stepper::step`] is one sweep
pub struct SmoTrainer<K: Kernel, R: Rng> {
    kernel: Arc<K>,
    points: Vec<Point2D>,
    labels: Vec<f64>,
    config: SmoConfig,
    alpha: Vec<f64>,
    b: f64,
    cache: KernelCache,
    rng: R,
    passes: usize,
    iterations: usize,
    last_changed: usize,
}

impl<K: Kernel, R: Rng> SmoTrainer<K, R> {
    /// Prepare a solver over at least two points labeled `-1.0` or `+1.0`
    pub fn new(
        samples: &[LabeledPoint<f64>],
        kernel: Arc<K>,
        config: SmoConfig,
        rng: R,
    ) -> Result<Self> {
        require_points(samples.iter().map(|s| &s.point), 2, "SMO")?;
        config.validate()?;
        if let Some(bad) = samples.iter().find(|s| s.label != 1.0 && s.label != -1.0) {
            return Err(LearnError::InvalidLabel(bad.label));
        }

        let n = samples.len();
        Ok(Self {
            kernel,
            points: samples.iter().map(|s| s.point).collect(),
            labels: samples.iter().map(|s| s.label).collect(),
            config,
            alpha: vec![0.0; n],
            b: 0.0,
            cache: KernelCache::for_points(n, config.cache_size),
            rng,
            passes: 0,
            iterations: 0,
            last_changed: 0,
        })
    }

    fn kernel_at(&mut self, i: usize, j: usize) -> f64 {
        let kernel = &self.kernel;
        let points = &self.points;
        self.cache
            .get_or_compute(i, j, || kernel.compute(&points[i], &points[j]))
    }

    /// Decision value at training point `i`
    fn output(&mut self, i: usize) -> f64 {
        let mut sum = self.b;
        for k in 0..self.alpha.len() {
            if self.alpha[k] > 0.0 {
                sum += self.alpha[k] * self.labels[k] * self.kernel_at(k, i);
            }
        }
        sum
    }

    fn violates_kkt(&self, i: usize, error: f64) -> bool {
        let r = self.labels[i] * error;
        (r < -self.config.tolerance && self.alpha[i] < self.config.c)
            || (r > self.config.tolerance && self.alpha[i] > 0.0)
    }

    /// Uniformly random index in `0..n` other than `i`
    fn random_partner(&mut self, i: usize) -> usize {
        let j = self.rng.gen_range(0..self.alpha.len() - 1);
        if j >= i {
            j + 1
        } else {
            j
        }
    }

    /// Box `[L, H]` for the updated `αⱼ`
    fn bounds(&self, i: usize, j: usize) -> (f64, f64) {
        let c = self.config.c;
        let (ai, aj) = (self.alpha[i], self.alpha[j]);
        if self.labels[i] != self.labels[j] {
            ((aj - ai).max(0.0), (c + aj - ai).min(c))
        } else {
            ((ai + aj - c).max(0.0), (ai + aj).min(c))
        }
    }

    /// Try to jointly optimize `αᵢ` and a random partner; true on progress
    fn optimize_pair(&mut self, i: usize, error_i: f64) -> bool {
        let j = self.random_partner(i);
        let error_j = self.output(j) - self.labels[j];
        let (yi, yj) = (self.labels[i], self.labels[j]);
        let (alpha_i_old, alpha_j_old) = (self.alpha[i], self.alpha[j]);

        let (low, high) = self.bounds(i, j);
        if low == high {
            return false;
        }

        let k_ij = self.kernel_at(i, j);
        let k_ii = self.kernel_at(i, i);
        let k_jj = self.kernel_at(j, j);
        let eta = 2.0 * k_ij - k_ii - k_jj;
        if eta >= 0.0 {
            return false;
        }

        let alpha_j = (alpha_j_old - yj * (error_i - error_j) / eta).clamp(low, high);
        if (alpha_j - alpha_j_old).abs() < MIN_ALPHA_CHANGE {
            return false;
        }
        let c = self.config.c;
        let alpha_i = (alpha_i_old + yi * yj * (alpha_j_old - alpha_j)).clamp(0.0, c);

        let delta_i = yi * (alpha_i - alpha_i_old);
        let delta_j = yj * (alpha_j - alpha_j_old);
        let b1 = self.b - error_i - delta_i * k_ii - delta_j * k_ij;
        let b2 = self.b - error_j - delta_i * k_ij - delta_j * k_jj;
        self.b = if alpha_i > 0.0 && alpha_i < c {
            b1
        } else if alpha_j > 0.0 && alpha_j < c {
            b2
        } else {
            (b1 + b2) / 2.0
        };

        self.alpha[i] = alpha_i;
        self.alpha[j] = alpha_j;
        true
    }

    /// One pass over every training point; returns the number of pairs changed
    pub fn sweep(&mut self) -> usize {
        let mut changed = 0;
        for i in 0..self.alpha.len() {
            let error_i = self.output(i) - self.labels[i];
            if self.violates_kkt(i, error_i) && self.optimize_pair(i, error_i) {
                changed += 1;
            }
        }

        if changed == 0 {
            self.passes += 1;
        } else {
            self.passes = 0;
        }
        self.iterations += 1;
        self.last_changed = changed;
        trace!(
            "smo sweep {}: {} pairs changed, {} quiet passes",
            self.iterations,
            changed,
            self.passes
        );
        changed
    }

    pub fn alpha(&self) -> &[f64] {
        &self.alpha
    }

    pub fn bias(&self) -> f64 {
        self.b
    }

    pub fn iterations(&self) -> usize {
        self.iterations
    }

    /// Consecutive sweeps without any change
    pub fn passes(&self) -> usize {
        self.passes
    }

    pub fn last_changed(&self) -> usize {
        self.last_changed
    }

    pub fn config(&self) -> &SmoConfig {
        &self.config
    }

    pub fn cache_hit_rate(&self) -> f64 {
        self.cache.hit_rate()
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Dual objective of the current multipliers
    pub fn objective(&mut self) -> f64 {
        let n = self.alpha.len();
        let mut quadratic = 0.0;
        for i in 0..n {
            if self.alpha[i] == 0.0 {
                continue;
            }
            for j in 0..n {
                if self.alpha[j] == 0.0 {
                    continue;
                }
                quadratic += self.alpha[i]
                    * self.alpha[j]
                    * self.labels[i]
                    * self.labels[j]
                    * self.kernel_at(i, j);
            }
        }
        self.alpha.iter().sum::<f64>() - 0.5 * quadratic
    }

    /// Stop stepping and package the multipliers
    pub fn finish(mut self) -> SmoSolution {
        let objective_value = self.objective();
        let threshold = self.config.support_threshold;
        let support_vectors = self
            .alpha
            .iter()
            .enumerate()
            .filter(|(_, a)| **a > threshold)
            .map(|(i, _)| i)
            .collect::<Vec<_>>();
        debug!(
            "smo finished after {} sweeps: {} support vectors, b = {:.4}, cache hit rate {:.2}",
            self.iterations,
            support_vectors.len(),
            self.b,
            self.cache.hit_rate()
        );
        SmoSolution {
            alpha: self.alpha,
            b: self.b,
            support_vectors,
            iterations: self.iterations,
            objective_value,
        }
    }
}

impl<K: Kernel, R: Rng> Stepper for SmoTrainer<K, R> {
    fn step(&mut self) {
        if !self.is_finished() {
            self.sweep();
        }
    }

    fn is_finished(&self) -> bool {
        self.passes >= self.config.max_passes || self.iterations >= self.config.max_iterations
    }
}
