//! Polynomial regression trained by full-batch gradient descent
//!
//! Points are `(x, y)` pairs where `y` is the target. Each epoch computes
//! the mean-squared-error gradient over every point and applies one update,
//! optionally regularized:
//!
//! * `L2`: weight decay `w -= lr·(g + 2λw)`
//! * `L1`: an ISTA step, i.e. the plain gradient step followed by
//!   soft-thresholding by `lr·λ`
//!
//! The bias weight (index 0) is never penalized, and the reported loss is the
//! plain MSE without the penalty term.

use crate::core::error::{require_points, require_positive};
use crate::core::{LearnError, Point2D, Result, Stepper};
use crate::features::{dot, polynomial_1d, polynomial_1d_len};
use log::{debug, trace};
use rand::Rng;
use serde::Serialize;

/// Largest polynomial degree accepted by the trainer
pub const MAX_DEGREE: usize = 12;

/// Regularization applied to the non-bias weights
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum Regularization {
    #[default]
    None,
    /// Lasso, applied as a proximal soft-threshold step
    L1,
    /// Ridge / weight decay
    L2,
}

/// Hyperparameters for one regression run
#[derive(Debug, Clone, Serialize)]
pub struct RegressionConfig {
    /// Polynomial degree of the single-input feature expansion
    pub degree: usize,
    pub learning_rate: f64,
    /// Number of epochs the trainer runs before reporting finished
    pub epochs: usize,
    pub regularization: Regularization,
    /// Regularization strength (ignored for `Regularization::None`)
    pub lambda: f64,
}

impl Default for RegressionConfig {
    fn default() -> Self {
        Self {
            degree: 1,
            learning_rate: 0.01,
            epochs: 1000,
            regularization: Regularization::None,
            lambda: 0.0,
        }
    }
}

impl RegressionConfig {
    pub fn with_degree(mut self, degree: usize) -> Self {
        self.degree = degree;
        self
    }

    pub fn with_learning_rate(mut self, learning_rate: f64) -> Self {
        self.learning_rate = learning_rate;
        self
    }

    pub fn with_epochs(mut self, epochs: usize) -> Self {
        self.epochs = epochs;
        self
    }

    pub fn with_regularization(mut self, regularization: Regularization, lambda: f64) -> Self {
        self.regularization = regularization;
        self.lambda = lambda;
        self
    }

    fn validate(&self) -> Result<()> {
        if self.degree > MAX_DEGREE {
            return Err(LearnError::InvalidParameter(format!(
                "degree must be at most {MAX_DEGREE}, got {}",
                self.degree
            )));
        }
        require_positive(self.learning_rate, "learning rate")?;
        if !(self.lambda.is_finite() && self.lambda >= 0.0) {
            return Err(LearnError::InvalidParameter(format!(
                "lambda must be non-negative and finite, got {}",
                self.lambda
            )));
        }
        Ok(())
    }
}

/// Soft-thresholding operator `sign(v)·max(0, |v| - threshold)`
pub fn soft_threshold(value: f64, threshold: f64) -> f64 {
    if value > threshold {
        value - threshold
    } else if value < -threshold {
        value + threshold
    } else {
        0.0
    }
}

/// A fitted polynomial `ŷ = Σ wᵢ·xⁱ`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegressionModel {
    weights: Vec<f64>,
}

impl RegressionModel {
    /// Build a model directly from weights (index `i` multiplies `x^i`)
    pub fn from_weights(weights: Vec<f64>) -> Self {
        Self { weights }
    }

    /// Predicted target for input `x`
    pub fn predict(&self, x: f64) -> f64 {
        dot(&self.weights, &polynomial_1d(x, self.degree()))
    }

    /// Mean squared error over the given points
    pub fn mse(&self, points: &[Point2D]) -> f64 {
        if points.is_empty() {
            return 0.0;
        }
        points
            .iter()
            .map(|p| {
                let r = self.predict(p.x) - p.y;
                r * r
            })
            .sum::<f64>()
            / points.len() as f64
    }

    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    pub fn degree(&self) -> usize {
        self.weights.len().saturating_sub(1)
    }
}

/// Result of running a trainer to completion
#[derive(Debug, Clone, Serialize)]
pub struct RegressionFit {
    pub model: RegressionModel,
    /// MSE measured at every epoch, before that epoch's update
    pub loss_history: Vec<f64>,
}

/// Gradient-descent trainer advanced one epoch per [`Stepper::step`]
#[derive(Debug, Clone)]
pub struct RegressionTrainer {
    config: RegressionConfig,
    points: Vec<Point2D>,
    features: Vec<Vec<f64>>,
    weights: Vec<f64>,
    loss_history: Vec<f64>,
    epoch: usize,
}

impl RegressionTrainer {
    /// Validate the data and configuration and initialize small random weights
    pub fn new<R: Rng + ?Sized>(
        points: &[Point2D],
        config: RegressionConfig,
        rng: &mut R,
    ) -> Result<Self> {
        require_points(points.iter(), 2, "regression")?;
        config.validate()?;

        let features = points
            .iter()
            .map(|p| polynomial_1d(p.x, config.degree))
            .collect();
        let weights = random_weights(polynomial_1d_len(config.degree), rng);

        Ok(Self {
            config,
            points: points.to_vec(),
            features,
            weights,
            loss_history: Vec::new(),
            epoch: 0,
        })
    }

    /// Change the polynomial degree, discarding the current weights
    ///
    /// The weight vector is reallocated with fresh random values and the
    /// epoch counter and loss history restart.
    pub fn set_degree<R: Rng + ?Sized>(&mut self, degree: usize, rng: &mut R) -> Result<()> {
        let config = self.config.clone().with_degree(degree);
        config.validate()?;
        self.features = self
            .points
            .iter()
            .map(|p| polynomial_1d(p.x, degree))
            .collect();
        self.weights = random_weights(polynomial_1d_len(degree), rng);
        self.config = config;
        self.loss_history.clear();
        self.epoch = 0;
        Ok(())
    }

    /// Run one epoch and return its MSE
    pub fn epoch_step(&mut self) -> f64 {
        let n = self.points.len() as f64;
        let mut gradient = vec![0.0; self.weights.len()];
        let mut squared_error = 0.0;

        for (p, phi) in self.points.iter().zip(&self.features) {
            let residual = dot(&self.weights, phi) - p.y;
            squared_error += residual * residual;
            for (g, f) in gradient.iter_mut().zip(phi) {
                *g += residual * f;
            }
        }

        let lr = self.config.learning_rate;
        let lambda = self.config.lambda;
        for (i, (w, g)) in self.weights.iter_mut().zip(&gradient).enumerate() {
            let g = 2.0 * g / n;
            match self.config.regularization {
                Regularization::None => *w -= lr * g,
                Regularization::L2 => {
                    let penalty = if i == 0 { 0.0 } else { 2.0 * lambda * *w };
                    *w -= lr * (g + penalty);
                }
                Regularization::L1 => {
                    let stepped = *w - lr * g;
                    *w = if i == 0 {
                        stepped
                    } else {
                        soft_threshold(stepped, lr * lambda)
                    };
                }
            }
        }

        let loss = squared_error / n;
        self.loss_history.push(loss);
        self.epoch += 1;
        trace!("regression epoch {}: mse={loss:.6}", self.epoch);
        loss
    }

    /// Run every remaining epoch and return the fitted model
    pub fn finish(mut self) -> RegressionFit {
        self.run();
        debug!(
            "regression finished after {} epochs, final mse={:.6}",
            self.epoch,
            self.loss_history.last().copied().unwrap_or(f64::NAN)
        );
        RegressionFit {
            model: RegressionModel::from_weights(self.weights),
            loss_history: self.loss_history,
        }
    }

    /// Snapshot of the current weights as a model
    pub fn model(&self) -> RegressionModel {
        RegressionModel::from_weights(self.weights.clone())
    }

    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    pub fn loss_history(&self) -> &[f64] {
        &self.loss_history
    }

    pub fn epoch(&self) -> usize {
        self.epoch
    }

    pub fn config(&self) -> &RegressionConfig {
        &self.config
    }
}

impl Stepper for RegressionTrainer {
    fn step(&mut self) {
        if !self.is_finished() {
            self.epoch_step();
        }
    }

    fn is_finished(&self) -> bool {
        self.epoch >= self.config.epochs
    }
}

/// Train a polynomial regression model for `config.epochs` epochs
pub fn fit<R: Rng + ?Sized>(
    points: &[Point2D],
    config: RegressionConfig,
    rng: &mut R,
) -> Result<RegressionFit> {
    Ok(RegressionTrainer::new(points, config, rng)?.finish())
}

/// Small random initial weights in `[-0.05, 0.05)`
pub(crate) fn random_weights<R: Rng + ?Sized>(len: usize, rng: &mut R) -> Vec<f64> {
    (0..len).map(|_| (rng.gen::<f64>() - 0.5) * 0.1).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn symmetric_line(slope: f64, intercept: f64) -> Vec<Point2D> {
        (-10..=10)
            .map(|i| {
                let x = i as f64 / 10.0;
                Point2D::new(x, slope * x + intercept)
            })
            .collect()
    }

    #[test]
    fn test_soft_threshold() {
        assert_eq!(soft_threshold(5.0, 2.0), 3.0);
        assert_eq!(soft_threshold(-5.0, 2.0), -3.0);
        assert_eq!(soft_threshold(1.0, 2.0), 0.0);
        assert_eq!(soft_threshold(-1.0, 2.0), 0.0);
    }

    #[test]
    fn test_empty_points_rejected() {
        let mut rng = StdRng::seed_from_u64(1);
        let err = fit(&[], RegressionConfig::default(), &mut rng).unwrap_err();
        assert!(matches!(err, LearnError::InvalidInput(_)));
    }

    #[test]
    fn test_invalid_parameters_rejected() {
        let mut rng = StdRng::seed_from_u64(1);
        let points = symmetric_line(1.0, 0.0);

        let bad_lr = RegressionConfig::default().with_learning_rate(0.0);
        assert!(matches!(
            fit(&points, bad_lr, &mut rng),
            Err(LearnError::InvalidParameter(_))
        ));

        let bad_lambda =
            RegressionConfig::default().with_regularization(Regularization::L2, -1.0);
        assert!(fit(&points, bad_lambda, &mut rng).is_err());
    }

    #[test]
    fn test_fits_a_line() {
        let mut rng = StdRng::seed_from_u64(7);
        let points = symmetric_line(2.0, 1.0);
        let config = RegressionConfig::default()
            .with_learning_rate(0.1)
            .with_epochs(2000);

        let fit = fit(&points, config, &mut rng).expect("valid input");

        assert_abs_diff_eq!(fit.model.weights()[0], 1.0, epsilon = 1e-4);
        assert_abs_diff_eq!(fit.model.weights()[1], 2.0, epsilon = 1e-4);
        assert_eq!(fit.loss_history.len(), 2000);
        assert!(fit.loss_history.last().unwrap() < &1e-8);
        assert_abs_diff_eq!(fit.model.predict(0.5), 2.0, epsilon = 1e-3);
    }

    #[test]
    fn test_loss_decreases() {
        let mut rng = StdRng::seed_from_u64(3);
        let points = symmetric_line(-1.5, 0.5);
        let mut trainer = RegressionTrainer::new(
            &points,
            RegressionConfig::default().with_learning_rate(0.05).with_epochs(100),
            &mut rng,
        )
        .expect("valid input");

        let first = trainer.epoch_step();
        trainer.run();
        assert!(trainer.is_finished());
        assert_eq!(trainer.epoch(), 100);
        assert!(trainer.loss_history().last().unwrap() < &first);
    }

    #[test]
    fn test_l1_drives_weights_to_exact_zero() {
        let mut rng = StdRng::seed_from_u64(11);
        let points = symmetric_line(2.0, 0.0);
        let config = RegressionConfig::default()
            .with_degree(4)
            .with_learning_rate(0.1)
            .with_epochs(500)
            .with_regularization(Regularization::L1, 0.5);

        let fit = fit(&points, config, &mut rng).expect("valid input");

        assert!(
            fit.model.weights()[1..].iter().any(|&w| w == 0.0),
            "expected an exactly-zero weight, got {:?}",
            fit.model.weights()
        );
    }

    #[test]
    fn test_l2_shrinks_weights() {
        let points = symmetric_line(3.0, 0.0);
        let base = RegressionConfig::default()
            .with_degree(3)
            .with_learning_rate(0.1)
            .with_epochs(1000);

        let plain = fit(&points, base.clone(), &mut StdRng::seed_from_u64(5)).unwrap();
        let ridge = fit(
            &points,
            base.with_regularization(Regularization::L2, 0.5),
            &mut StdRng::seed_from_u64(5),
        )
        .unwrap();

        let norm = |w: &[f64]| w[1..].iter().map(|v| v * v).sum::<f64>();
        assert!(norm(ridge.model.weights()) < norm(plain.model.weights()));
    }

    /// Trainer on (-1, 0) and (1, 0) starting from w = [1.0, 0.5]
    ///
    /// The first epoch's scaled gradient is exactly g = [2.0, 1.0].
    fn seeded_trainer(regularization: Regularization, lambda: f64) -> RegressionTrainer {
        let points = [Point2D::new(-1.0, 0.0), Point2D::new(1.0, 0.0)];
        let config = RegressionConfig::default()
            .with_learning_rate(0.1)
            .with_regularization(regularization, lambda);
        let mut trainer =
            RegressionTrainer::new(&points, config, &mut StdRng::seed_from_u64(0)).unwrap();
        trainer.weights = vec![1.0, 0.5];
        trainer
    }

    #[test]
    fn test_bias_is_never_penalized() {
        let mut plain = seeded_trainer(Regularization::None, 0.0);
        let mut lasso = seeded_trainer(Regularization::L1, 5.0);
        let mut ridge = seeded_trainer(Regularization::L2, 5.0);
        plain.epoch_step();
        lasso.epoch_step();
        ridge.epoch_step();

        // w0 - lr·g0 = 1.0 - 0.1·2.0 under every regularization
        assert_abs_diff_eq!(plain.weights()[0], 0.8, epsilon = 1e-12);
        assert_eq!(lasso.weights()[0], plain.weights()[0]);
        assert_eq!(ridge.weights()[0], plain.weights()[0]);

        // 0.5 - 0.1·1.0 = 0.4, inside the lr·λ = 0.5 threshold
        assert_abs_diff_eq!(plain.weights()[1], 0.4, epsilon = 1e-12);
        assert_eq!(lasso.weights()[1], 0.0);

        // 0.5 - 0.1·(1.0 + 2·5·0.5) = -0.1
        assert_abs_diff_eq!(ridge.weights()[1], -0.1, epsilon = 1e-12);
    }

    #[test]
    fn test_degree_change_reallocates() {
        let mut rng = StdRng::seed_from_u64(2);
        let points = symmetric_line(1.0, 0.0);
        let mut trainer =
            RegressionTrainer::new(&points, RegressionConfig::default(), &mut rng).unwrap();
        trainer.epoch_step();

        trainer.set_degree(3, &mut rng).expect("valid degree");
        assert_eq!(trainer.weights().len(), 4);
        assert_eq!(trainer.epoch(), 0);
        assert!(trainer.loss_history().is_empty());
        assert!(trainer.set_degree(MAX_DEGREE + 1, &mut rng).is_err());
        assert_eq!(trainer.weights().len(), 4);
    }

    #[test]
    fn test_model_degree_and_mse() {
        let model = RegressionModel::from_weights(vec![1.0, 0.0, 1.0]);
        assert_eq!(model.degree(), 2);
        assert_eq!(model.predict(2.0), 5.0);
        assert_eq!(model.mse(&[Point2D::new(2.0, 5.0), Point2D::new(0.0, 3.0)]), 2.0);
        assert_eq!(model.mse(&[]), 0.0);
    }
}
