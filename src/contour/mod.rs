//! Marching-squares contour extraction
//!
//! A scalar function is sampled on a regular lattice ([`SampledField`]).
//! Every cell of four neighbouring samples is classified by which corners
//! lie at or above the threshold, giving a 4-bit case index
//! (`TL=8, TR=4, BR=2, BL=1`). The case selects which cell edges the level
//! set crosses; each crossing is located by linear interpolation.
//!
//! The saddle cases 5 and 10 always emit two segments that cut off the two
//! isolated corners. No centre-value disambiguation is attempted.

use crate::core::{Grid, LearnError, Point2D, Result};
use serde::Serialize;

/// Below this corner-value difference the crossing is placed mid-edge
const FLAT_EDGE_EPSILON: f64 = 1e-6;

/// A straight line segment
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Segment {
    pub start: Point2D,
    pub end: Point2D,
}

impl Segment {
    pub fn new(start: Point2D, end: Point2D) -> Self {
        Self { start, end }
    }

    pub fn length(&self) -> f64 {
        self.start.distance(&self.end)
    }
}

/// Axis-aligned rectangle
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Bounds {
    pub min: Point2D,
    pub max: Point2D,
}

impl Bounds {
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self {
            min: Point2D::new(min_x, min_y),
            max: Point2D::new(max_x, max_y),
        }
    }

    /// Smallest bounds containing every point, or `None` for no points
    pub fn enclosing<'a, I: IntoIterator<Item = &'a Point2D>>(points: I) -> Option<Self> {
        points.into_iter().fold(None, |acc: Option<Bounds>, p| {
            Some(match acc {
                None => Bounds { min: *p, max: *p },
                Some(b) => Bounds::new(
                    b.min.x.min(p.x),
                    b.min.y.min(p.y),
                    b.max.x.max(p.x),
                    b.max.y.max(p.y),
                ),
            })
        })
    }

    pub fn width(&self) -> f64 {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> f64 {
        self.max.y - self.min.y
    }

    pub fn contains(&self, p: &Point2D) -> bool {
        p.x >= self.min.x && p.x <= self.max.x && p.y >= self.min.y && p.y <= self.max.y
    }

    fn validate(&self) -> Result<()> {
        if !(self.min.is_finite() && self.max.is_finite())
            || self.width() <= 0.0
            || self.height() <= 0.0
        {
            return Err(LearnError::InvalidParameter(format!(
                "bounds must have positive finite extent, got {:?}..{:?}",
                self.min, self.max
            )));
        }
        Ok(())
    }
}

/// Scalar samples on a regular lattice
///
/// Sample `(row, col)` sits at `origin + (col·cell_width, row·cell_height)`.
#[derive(Debug, Clone, PartialEq)]
pub struct SampledField {
    values: Grid,
    origin: Point2D,
    cell_width: f64,
    cell_height: f64,
}

impl SampledField {
    /// Wrap an existing grid of samples
    pub fn new(values: Grid, origin: Point2D, cell_width: f64, cell_height: f64) -> Self {
        Self {
            values,
            origin,
            cell_width,
            cell_height,
        }
    }

    /// Sample `f` on `cols × rows` lattice points spanning `bounds` inclusively
    pub fn sample<F>(bounds: Bounds, cols: usize, rows: usize, f: F) -> Result<Self>
    where
        F: Fn(&Point2D) -> f64,
    {
        bounds.validate()?;
        if cols < 2 || rows < 2 {
            return Err(LearnError::InvalidParameter(format!(
                "sampling needs at least 2x2 lattice points, got {cols}x{rows}"
            )));
        }
        let cell_width = bounds.width() / (cols - 1) as f64;
        let cell_height = bounds.height() / (rows - 1) as f64;
        let mut field = Self::new(Grid::zeros(rows, cols), bounds.min, cell_width, cell_height);
        for row in 0..rows {
            for col in 0..cols {
                let value = f(&field.position(row, col));
                field.values.set(row, col, value);
            }
        }
        Ok(field)
    }

    /// Location of sample `(row, col)`
    pub fn position(&self, row: usize, col: usize) -> Point2D {
        Point2D::new(
            self.origin.x + col as f64 * self.cell_width,
            self.origin.y + row as f64 * self.cell_height,
        )
    }

    pub fn values(&self) -> &Grid {
        &self.values
    }
}

/// Cell edges, named by the corners they join
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Edge {
    Top,
    Right,
    Bottom,
    Left,
}

/// Edges crossed by the level set for each case index
const CASE_TABLE: [&[(Edge, Edge)]; 16] = [
    &[],
    &[(Edge::Left, Edge::Bottom)],
    &[(Edge::Bottom, Edge::Right)],
    &[(Edge::Left, Edge::Right)],
    &[(Edge::Top, Edge::Right)],
    &[(Edge::Top, Edge::Right), (Edge::Left, Edge::Bottom)],
    &[(Edge::Top, Edge::Bottom)],
    &[(Edge::Left, Edge::Top)],
    &[(Edge::Left, Edge::Top)],
    &[(Edge::Top, Edge::Bottom)],
    &[(Edge::Left, Edge::Top), (Edge::Bottom, Edge::Right)],
    &[(Edge::Top, Edge::Right)],
    &[(Edge::Left, Edge::Right)],
    &[(Edge::Bottom, Edge::Right)],
    &[(Edge::Left, Edge::Bottom)],
    &[],
];

/// Corner samples of one cell, clockwise from top-left
#[derive(Debug, Clone, Copy)]
pub struct Cell {
    pub positions: [Point2D; 4],
    pub values: [f64; 4],
}

impl Cell {
    /// 4-bit case index for `threshold` (`TL=8, TR=4, BR=2, BL=1`)
    pub fn case_index(&self, threshold: f64) -> usize {
        self.values
            .iter()
            .fold(0, |acc, &v| (acc << 1) | usize::from(v >= threshold))
    }

    /// Level-set segments crossing this cell (0, 1 or 2)
    pub fn segments(&self, threshold: f64) -> Vec<Segment> {
        CASE_TABLE[self.case_index(threshold)]
            .iter()
            .map(|&(a, b)| Segment::new(self.crossing(a, threshold), self.crossing(b, threshold)))
            .collect()
    }

    fn crossing(&self, edge: Edge, threshold: f64) -> Point2D {
        let (i, j) = match edge {
            Edge::Top => (0, 1),
            Edge::Right => (1, 2),
            Edge::Bottom => (3, 2),
            Edge::Left => (0, 3),
        };
        let (v0, v1) = (self.values[i], self.values[j]);
        let t = if (v1 - v0).abs() < FLAT_EDGE_EPSILON {
            0.5
        } else {
            (threshold - v0) / (v1 - v0)
        };
        let (p0, p1) = (self.positions[i], self.positions[j]);
        p0 + (p1 - p0) * t
    }
}

/// Extract the `threshold` level set of a sampled field as line segments
pub fn marching_squares(field: &SampledField, threshold: f64) -> Vec<Segment> {
    let grid = field.values();
    let mut segments = Vec::new();
    for row in 0..grid.rows().saturating_sub(1) {
        for col in 0..grid.cols().saturating_sub(1) {
            let cell = Cell {
                positions: [
                    field.position(row, col),
                    field.position(row, col + 1),
                    field.position(row + 1, col + 1),
                    field.position(row + 1, col),
                ],
                values: [
                    grid.get(row, col),
                    grid.get(row, col + 1),
                    grid.get(row + 1, col + 1),
                    grid.get(row + 1, col),
                ],
            };
            segments.extend(cell.segments(threshold));
        }
    }
    segments
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    /// 2x2 field whose corners are high exactly where `case` has a bit set
    fn field_for_case(case: usize) -> SampledField {
        let bit = |b: usize| if case & b != 0 { 1.0 } else { 0.0 };
        let grid = Grid::from_rows(&[vec![bit(8), bit(4)], vec![bit(1), bit(2)]]).unwrap();
        SampledField::new(grid, Point2D::new(0.0, 0.0), 1.0, 1.0)
    }

    #[test]
    fn test_every_case_emits_documented_segment_count() {
        for case in 0..16 {
            let expected = match case {
                0 | 15 => 0,
                5 | 10 => 2,
                _ => 1,
            };
            let segments = marching_squares(&field_for_case(case), 0.5);
            assert_eq!(segments.len(), expected, "case {case}");
        }
    }

    #[test]
    fn test_case_index_bit_order() {
        let cell = Cell {
            positions: [Point2D::default(); 4],
            values: [1.0, 0.0, 0.0, 0.0],
        };
        assert_eq!(cell.case_index(0.5), 8);
        let cell = Cell {
            values: [0.0, 0.0, 0.0, 1.0],
            ..cell
        };
        assert_eq!(cell.case_index(0.5), 1);
    }

    #[test]
    fn test_linear_interpolation() {
        // Only BL is high: the segment joins the left and bottom edges.
        let grid = Grid::from_rows(&[vec![0.0, 0.0], vec![1.0, 0.0]]).unwrap();
        let field = SampledField::new(grid, Point2D::new(0.0, 0.0), 2.0, 2.0);
        let segments = marching_squares(&field, 0.25);

        assert_eq!(segments.len(), 1);
        let seg = segments[0];
        // Left edge TL(0,0)=0 -> BL(0,2)=1 crosses at t=0.25
        assert_relative_eq!(seg.start.x, 0.0);
        assert_relative_eq!(seg.start.y, 0.5);
        // Bottom edge BL(0,2)=1 -> BR(2,2)=0 crosses at t=0.75
        assert_relative_eq!(seg.end.x, 1.5);
        assert_relative_eq!(seg.end.y, 2.0);
    }

    #[test]
    fn test_flat_edge_uses_midpoint() {
        let cell = Cell {
            positions: [
                Point2D::new(0.0, 0.0),
                Point2D::new(1.0, 0.0),
                Point2D::new(1.0, 1.0),
                Point2D::new(0.0, 1.0),
            ],
            values: [0.5, 0.5 + 1e-9, 0.0, 0.0],
        };
        assert_eq!(cell.crossing(Edge::Top, 0.5), Point2D::new(0.5, 0.0));
    }

    #[test]
    fn test_sampled_circle_contour() {
        let bounds = Bounds::new(-2.0, -2.0, 2.0, 2.0);
        let field = SampledField::sample(bounds, 41, 41, |p| p.norm()).unwrap();
        let segments = marching_squares(&field, 1.0);

        assert!(!segments.is_empty());
        for seg in &segments {
            assert!((seg.start.norm() - 1.0).abs() < 0.05);
            assert!((seg.end.norm() - 1.0).abs() < 0.05);
        }
        let perimeter: f64 = segments.iter().map(Segment::length).sum();
        assert!((perimeter - 2.0 * std::f64::consts::PI).abs() < 0.1);
    }

    #[test]
    fn test_sample_rejects_bad_lattice() {
        let bounds = Bounds::new(0.0, 0.0, 1.0, 1.0);
        assert!(SampledField::sample(bounds, 1, 5, |_| 0.0).is_err());
        let empty = Bounds::new(0.0, 0.0, 0.0, 1.0);
        assert!(SampledField::sample(empty, 5, 5, |_| 0.0).is_err());
    }

    #[test]
    fn test_bounds_enclosing() {
        let points = [Point2D::new(1.0, -1.0), Point2D::new(-2.0, 3.0)];
        let b = Bounds::enclosing(&points).unwrap();
        assert_eq!(b, Bounds::new(-2.0, -1.0, 1.0, 3.0));
        assert!(b.contains(&Point2D::new(0.0, 0.0)));
        assert!(Bounds::enclosing(&[] as &[Point2D]).is_none());
    }
}
