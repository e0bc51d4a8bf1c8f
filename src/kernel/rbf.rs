//! RBF (Radial Basis Function) kernel implementation

use crate::core::Point2D;
use crate::kernel::Kernel;

/// Default width parameter for scaled coordinates
pub const DEFAULT_GAMMA: f64 = 10.0;

/// RBF kernel: K(x, y) = exp(-γ·‖(x - y)/s‖²)
///
/// With coordinates divided by `scale`, distances fall in `[0, √2]` for
/// points inside a square of side `scale`, and `γ = 10` gives a bump that
/// decays over roughly a third of that range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RbfKernel {
    gamma: f64,
    scale: f64,
}

impl RbfKernel {
    /// Create an RBF kernel with explicit gamma and coordinate scale
    pub fn new(gamma: f64, scale: f64) -> Self {
        Self { gamma, scale }
    }

    /// RBF kernel with the default gamma for the given coordinate scale
    pub fn with_scale(scale: f64) -> Self {
        Self::new(DEFAULT_GAMMA, scale)
    }

    pub fn gamma(&self) -> f64 {
        self.gamma
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }
}

impl Default for RbfKernel {
    fn default() -> Self {
        Self::with_scale(1.0)
    }
}

impl Kernel for RbfKernel {
    fn compute(&self, x: &Point2D, y: &Point2D) -> f64 {
        let squared_distance = x.distance_squared(y) / (self.scale * self.scale);
        (-self.gamma * squared_distance).exp()
    }

    fn name(&self) -> &'static str {
        "rbf"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_rbf_kernel_identical_points() {
        let kernel = RbfKernel::with_scale(600.0);
        let p = Point2D::new(123.0, 456.0);
        assert_eq!(kernel.compute(&p, &p), 1.0);
    }

    #[test]
    fn test_rbf_kernel_known_value() {
        let kernel = RbfKernel::new(1.0, 1.0);
        let x = Point2D::new(0.0, 0.0);
        let y = Point2D::new(1.0, 1.0);
        assert_relative_eq!(kernel.compute(&x, &y), (-2.0_f64).exp());
    }

    #[test]
    fn test_rbf_kernel_scale_invariance() {
        let small = RbfKernel::with_scale(1.0);
        let large = RbfKernel::with_scale(600.0);
        let (a, b) = (Point2D::new(0.1, 0.2), Point2D::new(0.3, 0.1));
        assert_relative_eq!(
            small.compute(&a, &b),
            large.compute(&(a * 600.0), &(b * 600.0)),
            max_relative = 1e-12
        );
    }

    #[test]
    fn test_rbf_kernel_decays_with_distance() {
        let kernel = RbfKernel::default();
        let origin = Point2D::default();
        let near = kernel.compute(&origin, &Point2D::new(0.1, 0.0));
        let far = kernel.compute(&origin, &Point2D::new(0.5, 0.0));
        assert!(near > far);
        assert!(far > 0.0);
    }
}
