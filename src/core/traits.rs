//! Core traits shared by the models and trainers

use crate::core::{LabeledPoint, Point2D};

/// A trained two-class model that can be queried per point
///
/// Queries must be pure: they are evaluated for every pixel or grid cell of
/// a visualization.
pub trait Classifier {
    /// Label type produced by this model
    type Label: PartialEq + Copy;

    /// Predict the label of a single point
    fn classify(&self, point: &Point2D) -> Self::Label;

    /// Predict labels for many points
    fn classify_batch(&self, points: &[Point2D]) -> Vec<Self::Label> {
        points.iter().map(|p| self.classify(p)).collect()
    }

    /// Fraction of points whose predicted label matches the stored label
    ///
    /// Returns 0.0 for an empty slice.
    fn accuracy(&self, points: &[LabeledPoint<Self::Label>]) -> f64 {
        if points.is_empty() {
            return 0.0;
        }
        let correct = points
            .iter()
            .filter(|lp| self.classify(&lp.point) == lp.label)
            .count();
        correct as f64 / points.len() as f64
    }
}

/// An iterative procedure advanced by its host one bounded unit at a time
///
/// Hosts interleave `step` calls with rendering; stopping early is simply
/// not calling `step` again.
pub trait Stepper {
    /// Perform one unit of work (an epoch, a phase, a sweep)
    fn step(&mut self);

    /// No further progress will be made by calling `step`
    fn is_finished(&self) -> bool;

    /// Step until finished, returning the number of steps taken
    fn run(&mut self) -> usize {
        let mut steps = 0;
        while !self.is_finished() {
            self.step();
            steps += 1;
        }
        steps
    }
}
