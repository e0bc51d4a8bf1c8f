//! Logistic regression over 2D polynomial features
//!
//! Labels are `0` or `1`. Training is full-batch gradient descent on the
//! binary cross-entropy, one epoch per step. The `0.5` probability contour
//! is reported analytically for degree 1 and traced with marching squares
//! otherwise.

use crate::contour::{marching_squares, Bounds, SampledField, Segment};
use crate::core::error::{require_points, require_positive};
use crate::core::{Classifier, LabeledPoint, LearnError, Point2D, Result, Stepper};
use crate::features::{dot, polynomial_2d, polynomial_2d_len, sigmoid};
use crate::regression::random_weights;
use log::{debug, trace};
use rand::Rng;
use serde::Serialize;

/// Largest polynomial degree accepted by the trainer
pub const MAX_DEGREE: usize = 8;

/// Probabilities are clamped to `[CLAMP, 1 - CLAMP]` before taking logs
pub const PROBABILITY_CLAMP: f64 = 1e-4;

/// Probability level of the decision boundary
pub const DECISION_THRESHOLD: f64 = 0.5;

/// Weights smaller than this are treated as absent when solving the line
const LINE_EPSILON: f64 = 1e-12;

/// Hyperparameters for one logistic run
#[derive(Debug, Clone, Serialize)]
pub struct LogisticConfig {
    pub degree: usize,
    pub learning_rate: f64,
    pub epochs: usize,
}

impl Default for LogisticConfig {
    fn default() -> Self {
        Self {
            degree: 1,
            learning_rate: 0.5,
            epochs: 500,
        }
    }
}

impl LogisticConfig {
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

    fn validate(&self) -> Result<()> {
        if self.degree == 0 || self.degree > MAX_DEGREE {
            return Err(LearnError::InvalidParameter(format!(
                "degree must be between 1 and {MAX_DEGREE}, got {}",
                self.degree
            )));
        }
        require_positive(self.learning_rate, "learning rate")
    }
}

/// Binary cross-entropy of one prediction, with the probability clamped
pub fn binary_cross_entropy(probability: f64, label: f64) -> f64 {
    let p = probability.clamp(PROBABILITY_CLAMP, 1.0 - PROBABILITY_CLAMP);
    -(label * p.ln() + (1.0 - label) * (1.0 - p).ln())
}

/// The `0.5` probability level set of a model
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum DecisionBoundary {
    /// Degree-1 boundary: a straight line clipped to the requested bounds
    Line(Segment),
    /// Higher-degree boundary traced by marching squares
    Contour(Vec<Segment>),
    /// The boundary does not cross the requested bounds
    None,
}

/// A trained logistic classifier
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LogisticModel {
    degree: usize,
    weights: Vec<f64>,
}

impl LogisticModel {
    /// Build a model from weights in the canonical 2D feature ordering
    pub fn from_weights(degree: usize, weights: Vec<f64>) -> Result<Self> {
        let expected = polynomial_2d_len(degree);
        if weights.len() != expected {
            return Err(LearnError::DimensionMismatch {
                expected,
                actual: weights.len(),
            });
        }
        Ok(Self { degree, weights })
    }

    /// Probability that `point` belongs to class 1
    pub fn predict_proba(&self, point: &Point2D) -> f64 {
        sigmoid(dot(&self.weights, &polynomial_2d(point, self.degree)))
    }

    /// Mean binary cross-entropy over the given points
    pub fn loss(&self, points: &[LabeledPoint<u8>]) -> f64 {
        if points.is_empty() {
            return 0.0;
        }
        points
            .iter()
            .map(|lp| binary_cross_entropy(self.predict_proba(&lp.point), f64::from(lp.label)))
            .sum::<f64>()
            / points.len() as f64
    }

    /// Trace the `0.5` level set inside `bounds`
    ///
    /// `resolution` is the number of lattice points per side used by marching
    /// squares; it is ignored for degree 1.
    pub fn decision_boundary(&self, bounds: Bounds, resolution: usize) -> Result<DecisionBoundary> {
        if self.degree == 1 {
            return Ok(self.linear_boundary(&bounds));
        }
        let field = SampledField::sample(bounds, resolution, resolution, |p| {
            self.predict_proba(p)
        })?;
        let segments = marching_squares(&field, DECISION_THRESHOLD);
        Ok(if segments.is_empty() {
            DecisionBoundary::None
        } else {
            DecisionBoundary::Contour(segments)
        })
    }

    /// Solve `w0 + w1·x + w2·y = 0` against the edges of `bounds`
    fn linear_boundary(&self, bounds: &Bounds) -> DecisionBoundary {
        let (w0, w1, w2) = (self.weights[0], self.weights[1], self.weights[2]);
        let mut hits: Vec<Point2D> = Vec::with_capacity(4);

        if w2.abs() > LINE_EPSILON {
            for x in [bounds.min.x, bounds.max.x] {
                hits.push(Point2D::new(x, -(w0 + w1 * x) / w2));
            }
        }
        if w1.abs() > LINE_EPSILON {
            for y in [bounds.min.y, bounds.max.y] {
                hits.push(Point2D::new(-(w0 + w2 * y) / w1, y));
            }
        }
        hits.retain(|p| p.is_finite() && bounds.contains(p));

        let mut best: Option<(f64, Segment)> = None;
        for (i, a) in hits.iter().enumerate() {
            for b in &hits[i + 1..] {
                let length = a.distance(b);
                if length > 0.0 && best.map_or(true, |(l, _)| length > l) {
                    best = Some((length, Segment::new(*a, *b)));
                }
            }
        }
        best.map_or(DecisionBoundary::None, |(_, seg)| DecisionBoundary::Line(seg))
    }

    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    pub fn degree(&self) -> usize {
        self.degree
    }
}

impl Classifier for LogisticModel {
    type Label = u8;

    fn classify(&self, point: &Point2D) -> u8 {
        u8::from(self.predict_proba(point) >= DECISION_THRESHOLD)
    }
}

/// Gradient-descent trainer advanced one epoch per [`Stepper::step`]
#[derive(Debug, Clone)]
pub struct LogisticTrainer {
    config: LogisticConfig,
    points: Vec<LabeledPoint<u8>>,
    features: Vec<Vec<f64>>,
    model: LogisticModel,
    loss_history: Vec<f64>,
    epoch: usize,
}

impl LogisticTrainer {
    /// Validate labels and configuration and initialize small random weights
    pub fn new<R: Rng + ?Sized>(
        points: &[LabeledPoint<u8>],
        config: LogisticConfig,
        rng: &mut R,
    ) -> Result<Self> {
        require_points(points.iter().map(|lp| &lp.point), 2, "logistic regression")?;
        if let Some(bad) = points.iter().find(|lp| lp.label > 1) {
            return Err(LearnError::InvalidLabel(f64::from(bad.label)));
        }
        config.validate()?;

        let features = points
            .iter()
            .map(|lp| polynomial_2d(&lp.point, config.degree))
            .collect();
        let model = LogisticModel {
            degree: config.degree,
            weights: random_weights(polynomial_2d_len(config.degree), rng),
        };

        Ok(Self {
            config,
            points: points.to_vec(),
            features,
            model,
            loss_history: Vec::new(),
            epoch: 0,
        })
    }

    /// Run one epoch and return the mean BCE measured before the update
    pub fn epoch_step(&mut self) -> f64 {
        let n = self.points.len() as f64;
        let mut gradient = vec![0.0; self.model.weights.len()];
        let mut total_loss = 0.0;

        for (lp, phi) in self.points.iter().zip(&self.features) {
            let label = f64::from(lp.label);
            let p = sigmoid(dot(&self.model.weights, phi));
            total_loss += binary_cross_entropy(p, label);
            let error = p - label;
            for (g, f) in gradient.iter_mut().zip(phi) {
                *g += error * f;
            }
        }

        let lr = self.config.learning_rate;
        for (w, g) in self.model.weights.iter_mut().zip(&gradient) {
            *w -= lr * (g / n);
        }

        let loss = total_loss / n;
        self.loss_history.push(loss);
        self.epoch += 1;
        trace!("logistic epoch {}: bce={loss:.6}", self.epoch);
        loss
    }

    /// Training-set accuracy of the current weights
    pub fn accuracy(&self) -> f64 {
        self.model.accuracy(&self.points)
    }

    /// Run every remaining epoch and return the model
    pub fn finish(mut self) -> LogisticModel {
        self.run();
        debug!(
            "logistic finished after {} epochs, accuracy={:.3}",
            self.epoch,
            self.accuracy()
        );
        self.model
    }

    pub fn model(&self) -> &LogisticModel {
        &self.model
    }

    pub fn loss_history(&self) -> &[f64] {
        &self.loss_history
    }

    pub fn epoch(&self) -> usize {
        self.epoch
    }
}

impl Stepper for LogisticTrainer {
    fn step(&mut self) {
        if !self.is_finished() {
            self.epoch_step();
        }
    }

    fn is_finished(&self) -> bool {
        self.epoch >= self.config.epochs
    }
}

/// Train a logistic classifier for `config.epochs` epochs
pub fn fit<R: Rng + ?Sized>(
    points: &[LabeledPoint<u8>],
    config: LogisticConfig,
    rng: &mut R,
) -> Result<LogisticModel> {
    Ok(LogisticTrainer::new(points, config, rng)?.finish())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn square_corners() -> Vec<LabeledPoint<u8>> {
        vec![
            LabeledPoint::new(0.0, 0.0, 0),
            LabeledPoint::new(0.0, 1.0, 0),
            LabeledPoint::new(1.0, 0.0, 1),
            LabeledPoint::new(1.0, 1.0, 1),
        ]
    }

    fn xor_points() -> Vec<LabeledPoint<u8>> {
        let mut points = Vec::new();
        for &r in &[0.5, 1.0] {
            points.push(LabeledPoint::new(r, r, 1));
            points.push(LabeledPoint::new(-r, -r, 1));
            points.push(LabeledPoint::new(r, -r, 0));
            points.push(LabeledPoint::new(-r, r, 0));
        }
        points
    }

    #[test]
    fn test_square_corners_fully_separated() {
        let mut rng = StdRng::seed_from_u64(42);
        let config = LogisticConfig::default()
            .with_degree(1)
            .with_learning_rate(0.5)
            .with_epochs(500);

        let model = fit(&square_corners(), config, &mut rng).expect("valid input");

        assert_eq!(model.accuracy(&square_corners()), 1.0);
        assert!(model.predict_proba(&Point2D::new(0.0, 0.5)) < 0.5);
        assert!(model.predict_proba(&Point2D::new(1.0, 0.5)) > 0.5);

        let bounds = Bounds::new(-0.5, -0.5, 1.5, 1.5);
        match model.decision_boundary(bounds, 0).expect("valid bounds") {
            DecisionBoundary::Line(seg) => {
                let mid = (seg.start.x + seg.end.x) / 2.0;
                assert!(mid > 0.0 && mid < 1.0, "boundary midpoint at x={mid}");
            }
            other => panic!("expected a line, got {other:?}"),
        }
    }

    #[test]
    fn test_loss_decreases_over_training() {
        let mut rng = StdRng::seed_from_u64(9);
        let mut trainer =
            LogisticTrainer::new(&square_corners(), LogisticConfig::default(), &mut rng).unwrap();
        let first = trainer.epoch_step();
        trainer.run();
        assert_eq!(trainer.epoch(), 500);
        assert!(trainer.loss_history().last().unwrap() < &first);
    }

    #[test]
    fn test_xor_needs_degree_two() {
        let mut rng = StdRng::seed_from_u64(1);
        let config = LogisticConfig::default().with_degree(2).with_epochs(2000);
        let model = fit(&xor_points(), config, &mut rng).expect("valid input");

        assert_eq!(model.accuracy(&xor_points()), 1.0);
        match model
            .decision_boundary(Bounds::new(-1.5, -1.5, 1.5, 1.5), 31)
            .unwrap()
        {
            DecisionBoundary::Contour(segments) => assert!(!segments.is_empty()),
            other => panic!("expected a contour, got {other:?}"),
        }
    }

    #[test]
    fn test_rejects_bad_labels_and_sizes() {
        let mut rng = StdRng::seed_from_u64(0);
        let mut points = square_corners();
        points[0].label = 2;
        assert!(matches!(
            fit(&points, LogisticConfig::default(), &mut rng),
            Err(LearnError::InvalidLabel(l)) if l == 2.0
        ));

        let single = vec![LabeledPoint::new(0.0, 0.0, 1)];
        assert!(matches!(
            fit(&single, LogisticConfig::default(), &mut rng),
            Err(LearnError::InvalidInput(_))
        ));

        let zero_degree = LogisticConfig::default().with_degree(0);
        assert!(fit(&square_corners(), zero_degree, &mut rng).is_err());
    }

    #[test]
    fn test_binary_cross_entropy_clamps() {
        let worst = binary_cross_entropy(0.0, 1.0);
        assert!(worst.is_finite());
        assert_relative_eq!(worst, -(PROBABILITY_CLAMP.ln()), epsilon = 1e-12);
        assert_relative_eq!(binary_cross_entropy(0.5, 0.0), std::f64::consts::LN_2);
    }

    #[test]
    fn test_linear_boundary_shapes() {
        let bounds = Bounds::new(0.0, 0.0, 10.0, 10.0);

        // x = 5 (no y weight): vertical line
        let vertical = LogisticModel::from_weights(1, vec![-5.0, 1.0, 0.0]).unwrap();
        match vertical.linear_boundary(&bounds) {
            DecisionBoundary::Line(seg) => {
                assert_relative_eq!(seg.start.x, 5.0);
                assert_relative_eq!(seg.end.x, 5.0);
                assert_relative_eq!(seg.length(), 10.0);
            }
            other => panic!("expected a line, got {other:?}"),
        }

        // Diagonal x + y = 10 spans corner to corner
        let diagonal = LogisticModel::from_weights(1, vec![-10.0, 1.0, 1.0]).unwrap();
        match diagonal.linear_boundary(&bounds) {
            DecisionBoundary::Line(seg) => {
                assert_relative_eq!(seg.length(), 200.0_f64.sqrt(), epsilon = 1e-9)
            }
            other => panic!("expected a line, got {other:?}"),
        }

        // Constant model: no boundary at all
        let flat = LogisticModel::from_weights(1, vec![1.0, 0.0, 0.0]).unwrap();
        assert_eq!(flat.linear_boundary(&bounds), DecisionBoundary::None);

        // Line outside the bounds
        let outside = LogisticModel::from_weights(1, vec![-50.0, 1.0, 0.0]).unwrap();
        assert_eq!(outside.linear_boundary(&bounds), DecisionBoundary::None);
    }

    #[test]
    fn test_from_weights_checks_length() {
        assert!(matches!(
            LogisticModel::from_weights(2, vec![0.0; 3]),
            Err(LearnError::DimensionMismatch {
                expected: 6,
                actual: 3
            })
        ));
    }
}
