//! Principal component analysis of 2D data
//!
//! The 2×2 sample covariance is diagonalized in closed form. Input to
//! [`Pca::fit`] must already be mean-centered; [`center`] does that and
//! returns the mean so callers can map back.

use crate::core::error::require_points;
use crate::core::{Point2D, Result};
use log::debug;
use serde::Serialize;

/// Off-diagonal covariance below which the data counts as axis-aligned
pub const AXIS_ALIGNED_EPSILON: f64 = 1e-6;

/// Sample covariance of centered 2D data
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Covariance {
    pub xx: f64,
    pub xy: f64,
    pub yy: f64,
}

impl Covariance {
    /// Covariance of centered points with the `n - 1` divisor
    pub fn of_centered(points: &[Point2D]) -> Result<Self> {
        require_points(points.iter(), 2, "covariance")?;
        let denom = (points.len() - 1) as f64;
        let (mut xx, mut xy, mut yy) = (0.0, 0.0, 0.0);
        for p in points {
            xx += p.x * p.x;
            xy += p.x * p.y;
            yy += p.y * p.y;
        }
        Ok(Self {
            xx: xx / denom,
            xy: xy / denom,
            yy: yy / denom,
        })
    }

    /// Eigenvalues `(larger, smaller)` of `[[xx, xy], [xy, yy]]`
    pub fn eigenvalues(&self) -> (f64, f64) {
        let trace = self.xx + self.yy;
        let det = self.xx * self.yy - self.xy * self.xy;
        let root = (trace * trace - 4.0 * det).max(0.0).sqrt();
        ((trace + root) / 2.0, (trace - root) / 2.0)
    }

    /// Unit eigenvector for eigenvalue `lambda`
    ///
    /// When the off-diagonal term vanishes the axis with the larger variance
    /// is returned.
    pub fn eigenvector(&self, lambda: f64) -> Point2D {
        if self.xy.abs() < AXIS_ALIGNED_EPSILON {
            return if self.xx >= self.yy {
                Point2D::new(1.0, 0.0)
            } else {
                Point2D::new(0.0, 1.0)
            };
        }
        let v = Point2D::new(1.0, (lambda - self.xx) / self.xy);
        v.normalized().unwrap_or(Point2D::new(1.0, 0.0))
    }
}

/// Principal axes of a centered data set
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Pca {
    /// Direction of greatest variance (unit length)
    pub pc1: Point2D,
    /// `pc1` rotated by +90 degrees
    pub pc2: Point2D,
    /// `(λ1, λ2)` with `λ1 >= λ2`
    pub eigenvalues: (f64, f64),
    pub covariance: Covariance,
}

impl Pca {
    /// Fit principal axes to at least two mean-centered points
    pub fn fit(points: &[Point2D]) -> Result<Self> {
        let covariance = Covariance::of_centered(points)?;
        let eigenvalues = covariance.eigenvalues();
        let pc1 = covariance.eigenvector(eigenvalues.0);
        let pc2 = pc1.perpendicular();
        debug!(
            "pca: eigenvalues ({:.4}, {:.4}), pc1 = ({:.4}, {:.4})",
            eigenvalues.0, eigenvalues.1, pc1.x, pc1.y
        );
        Ok(Self {
            pc1,
            pc2,
            eigenvalues,
            covariance,
        })
    }

    /// Total variance `λ1 + λ2`
    pub fn total_variance(&self) -> f64 {
        self.eigenvalues.0 + self.eigenvalues.1
    }

    /// Share of the total variance captured by `pc1`
    pub fn explained_variance_ratio(&self) -> f64 {
        ratio(self.eigenvalues.0, self.total_variance())
    }

    /// Coordinates of a centered point in the `(pc1, pc2)` basis
    pub fn project(&self, point: &Point2D) -> Point2D {
        Point2D::new(point.dot(&self.pc1), point.dot(&self.pc2))
    }
}

/// Mean of the points and the points with that mean subtracted
pub fn center(points: &[Point2D]) -> Result<(Point2D, Vec<Point2D>)> {
    require_points(points.iter(), 1, "centering")?;
    let sum = points.iter().fold(Point2D::default(), |acc, p| acc + *p);
    let mean = sum * (1.0 / points.len() as f64);
    Ok((mean, points.iter().map(|p| *p - mean).collect()))
}

/// Variance of centered points projected on the unit direction `u`
pub fn projected_variance(points: &[Point2D], u: &Point2D) -> Result<f64> {
    require_points(points.iter(), 2, "projected variance")?;
    let sum: f64 = points
        .iter()
        .map(|p| {
            let t = p.dot(u);
            t * t
        })
        .sum();
    Ok(sum / (points.len() - 1) as f64)
}

/// Variance captured by `u` as a share of the total variance
///
/// Lets a caller compare an arbitrary axis against `pc1`. Returns 0.0 for
/// data with no variance.
pub fn explained_ratio(points: &[Point2D], u: &Point2D) -> Result<f64> {
    let pca = Pca::fit(points)?;
    Ok(ratio(projected_variance(points, u)?, pca.total_variance()))
}

fn ratio(part: f64, total: f64) -> f64 {
    if total > 0.0 {
        part / total
    } else {
        0.0
    }
}
