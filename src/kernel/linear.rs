//! Linear kernel implementation

use crate::core::Point2D;
use crate::kernel::Kernel;

/// Linear kernel on scaled coordinates: K(x, y) = (x/s)·(y/s)
///
/// Points usually live in a drawing surface of a few hundred units, so both
/// inputs are divided by `scale` to keep kernel values near unit magnitude.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearKernel {
    scale: f64,
}

impl LinearKernel {
    /// Create a linear kernel for coordinates spanning roughly `scale` units
    pub fn new(scale: f64) -> Self {
        Self { scale }
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }
}

impl Default for LinearKernel {
    /// Unscaled dot product
    fn default() -> Self {
        Self::new(1.0)
    }
}

impl Kernel for LinearKernel {
    fn compute(&self, x: &Point2D, y: &Point2D) -> f64 {
        x.dot(y) / (self.scale * self.scale)
    }

    fn name(&self) -> &'static str {
        "linear"
    }
}
