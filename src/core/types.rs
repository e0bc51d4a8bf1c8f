//! Core type definitions shared by every model

use serde::Serialize;
use std::ops::{Add, Mul, Sub};

/// A point (or direction) in the plane
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Point2D {
    pub x: f64,
    pub y: f64,
}

impl Point2D {
    /// Create a new point
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Dot product with another point treated as a vector
    pub fn dot(&self, other: &Point2D) -> f64 {
        self.x * other.x + self.y * other.y
    }

    /// Squared Euclidean norm
    pub fn norm_squared(&self) -> f64 {
        self.dot(self)
    }

    /// Euclidean norm
    pub fn norm(&self) -> f64 {
        self.norm_squared().sqrt()
    }

    /// Squared Euclidean distance to another point
    pub fn distance_squared(&self, other: &Point2D) -> f64 {
        (*self - *other).norm_squared()
    }

    /// Euclidean distance to another point
    pub fn distance(&self, other: &Point2D) -> f64 {
        self.distance_squared(other).sqrt()
    }

    /// Unit vector in the same direction, or `None` for the zero vector
    pub fn normalized(&self) -> Option<Point2D> {
        let norm = self.norm();
        if norm > 0.0 && norm.is_finite() {
            Some(*self * (1.0 / norm))
        } else {
            None
        }
    }

    /// Vector rotated by +90 degrees
    pub fn perpendicular(&self) -> Point2D {
        Point2D::new(-self.y, self.x)
    }

    /// Coordinate along the given axis
    pub fn coordinate(&self, axis: Axis) -> f64 {
        match axis {
            Axis::X => self.x,
            Axis::Y => self.y,
        }
    }

    /// Both coordinates are finite
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl Add for Point2D {
    type Output = Point2D;

    fn add(self, rhs: Point2D) -> Point2D {
        Point2D::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Point2D {
    type Output = Point2D;

    fn sub(self, rhs: Point2D) -> Point2D {
        Point2D::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f64> for Point2D {
    type Output = Point2D;

    fn mul(self, rhs: f64) -> Point2D {
        Point2D::new(self.x * rhs, self.y * rhs)
    }
}

/// Feature axis used by axis-aligned splits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Axis {
    X,
    Y,
}

impl Axis {
    /// Both axes in search order
    pub const ALL: [Axis; 2] = [Axis::X, Axis::Y];
}

/// Categorical two-class label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Class {
    A,
    B,
}

impl Class {
    /// Index into per-class count arrays
    pub fn index(self) -> usize {
        match self {
            Class::A => 0,
            Class::B => 1,
        }
    }

    /// Majority class for the given counts; ties go to `A`
    pub fn majority(count_a: usize, count_b: usize) -> Class {
        if count_a >= count_b {
            Class::A
        } else {
            Class::B
        }
    }
}

/// A point with an attached label
///
/// The label type depends on the model: `u8` (0/1) for logistic regression,
/// [`Class`] for trees and k-NN, `f64` (±1) for the SVM.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LabeledPoint<L> {
    pub point: Point2D,
    pub label: L,
}

impl<L> LabeledPoint<L> {
    /// Create a new labeled point
    pub fn new(x: f64, y: f64, label: L) -> Self {
        Self {
            point: Point2D::new(x, y),
            label,
        }
    }
}

/// Row-major grid of scalar values
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Grid {
    rows: usize,
    cols: usize,
    values: Vec<f64>,
}

impl Grid {
    /// Create a grid filled with zeros
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            values: vec![0.0; rows * cols],
        }
    }

    /// Create a grid from row-major values
    ///
    /// Fails with `DimensionMismatch` if `values.len() != rows * cols`.
    pub fn from_vec(rows: usize, cols: usize, values: Vec<f64>) -> crate::core::Result<Self> {
        if values.len() != rows * cols {
            return Err(crate::core::LearnError::DimensionMismatch {
                expected: rows * cols,
                actual: values.len(),
            });
        }
        Ok(Self { rows, cols, values })
    }

    /// Create a grid from nested rows; all rows must share a length
    pub fn from_rows(rows: &[Vec<f64>]) -> crate::core::Result<Self> {
        let cols = rows.first().map_or(0, Vec::len);
        let mut values = Vec::with_capacity(rows.len() * cols);
        for row in rows {
            if row.len() != cols {
                return Err(crate::core::LearnError::DimensionMismatch {
                    expected: cols,
                    actual: row.len(),
                });
            }
            values.extend_from_slice(row);
        }
        Ok(Self {
            rows: rows.len(),
            cols,
            values,
        })
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Value at `(row, col)`
    ///
    /// # Panics
    /// Panics if the position is outside the grid
    pub fn get(&self, row: usize, col: usize) -> f64 {
        assert!(row < self.rows && col < self.cols, "grid index out of bounds");
        self.values[row * self.cols + col]
    }

    /// Set the value at `(row, col)`
    ///
    /// # Panics
    /// Panics if the position is outside the grid
    pub fn set(&mut self, row: usize, col: usize, value: f64) {
        assert!(row < self.rows && col < self.cols, "grid index out of bounds");
        self.values[row * self.cols + col] = value;
    }

    /// Row-major view of all values
    pub fn values(&self) -> &[f64] {
        &self.values
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_point_arithmetic() {
        let a = Point2D::new(3.0, 4.0);
        let b = Point2D::new(1.0, 1.0);

        assert_eq!(a + b, Point2D::new(4.0, 5.0));
        assert_eq!(a - b, Point2D::new(2.0, 3.0));
        assert_eq!(a * 2.0, Point2D::new(6.0, 8.0));
        assert_eq!(a.dot(&b), 7.0);
        assert_eq!(a.norm(), 5.0);
        assert_eq!(a.distance_squared(&b), 13.0);
    }

    #[test]
    fn test_point_normalized() {
        let unit = Point2D::new(3.0, 4.0).normalized().expect("non-zero");
        assert_relative_eq!(unit.norm(), 1.0);
        assert_relative_eq!(unit.x, 0.6);
        assert!(Point2D::default().normalized().is_none());
    }

    #[test]
    fn test_perpendicular_is_orthogonal() {
        let v = Point2D::new(0.3, -1.7);
        assert_eq!(v.dot(&v.perpendicular()), 0.0);
    }

    #[test]
    fn test_class_majority_tie_goes_to_a() {
        assert_eq!(Class::majority(2, 2), Class::A);
        assert_eq!(Class::majority(1, 2), Class::B);
        assert_eq!(Class::majority(0, 0), Class::A);
    }

    #[test]
    fn test_grid_construction() {
        let grid = Grid::from_rows(&[vec![1.0, 2.0], vec![3.0, 4.0]]).expect("valid");
        assert_eq!(grid.rows(), 2);
        assert_eq!(grid.cols(), 2);
        assert_eq!(grid.get(1, 0), 3.0);

        assert!(matches!(
            Grid::from_vec(2, 2, vec![1.0]),
            Err(crate::core::LearnError::DimensionMismatch {
                expected: 4,
                actual: 1
            })
        ));
        assert!(Grid::from_rows(&[vec![1.0], vec![1.0, 2.0]]).is_err());
    }

    #[test]
    #[should_panic(expected = "grid index out of bounds")]
    fn test_grid_out_of_bounds() {
        Grid::zeros(2, 2).get(2, 0);
    }
}
