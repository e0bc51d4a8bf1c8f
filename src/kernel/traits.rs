//! Kernel trait definition

use crate::core::Point2D;

/// Kernel function trait
///
/// A kernel K(x, y) must be symmetric and positive semi-definite for the
/// SMO solver to make progress.
pub trait Kernel: Send + Sync {
    /// Compute kernel value K(x, y)
    fn compute(&self, x: &Point2D, y: &Point2D) -> f64;

    /// Short identifier used in logs and reports
    fn name(&self) -> &'static str;
}
