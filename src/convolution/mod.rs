//! 3×3 image filters and pooling
//!
//! Convolution here is the image-processing kind: the kernel is laid over
//! each 3×3 window without flipping, and only windows that fit entirely
//! inside the grid are produced.

use crate::core::{Grid, LearnError, Result};
use serde::Serialize;

pub type Kernel3 = [[f64; 3]; 3];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Filter {
    Identity,
    BoxBlur,
    GaussianBlur,
    Sharpen,
    EdgeDetect,
    SobelX,
    SobelY,
    Emboss,
}

impl Filter {
    pub const ALL: [Filter; 8] = [
        Filter::Identity,
        Filter::BoxBlur,
        Filter::GaussianBlur,
        Filter::Sharpen,
        Filter::EdgeDetect,
        Filter::SobelX,
        Filter::SobelY,
        Filter::Emboss,
    ];

    pub fn kernel(self) -> Kernel3 {
        const NINTH: f64 = 1.0 / 9.0;
        match self {
            Filter::Identity => [[0.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 0.0]],
            Filter::BoxBlur => [[NINTH; 3]; 3],
            Filter::GaussianBlur => [
                [1.0 / 16.0, 2.0 / 16.0, 1.0 / 16.0],
                [2.0 / 16.0, 4.0 / 16.0, 2.0 / 16.0],
                [1.0 / 16.0, 2.0 / 16.0, 1.0 / 16.0],
            ],
            Filter::Sharpen => [[0.0, -1.0, 0.0], [-1.0, 5.0, -1.0], [0.0, -1.0, 0.0]],
            Filter::EdgeDetect => [[-1.0, -1.0, -1.0], [-1.0, 8.0, -1.0], [-1.0, -1.0, -1.0]],
            Filter::SobelX => [[-1.0, 0.0, 1.0], [-2.0, 0.0, 2.0], [-1.0, 0.0, 1.0]],
            Filter::SobelY => [[-1.0, -2.0, -1.0], [0.0, 0.0, 0.0], [1.0, 2.0, 1.0]],
            Filter::Emboss => [[-2.0, -1.0, 0.0], [-1.0, 1.0, 1.0], [0.0, 1.0, 2.0]],
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Filter::Identity => "identity",
            Filter::BoxBlur => "box_blur",
            Filter::GaussianBlur => "gaussian_blur",
            Filter::Sharpen => "sharpen",
            Filter::EdgeDetect => "edge_detect",
            Filter::SobelX => "sobel_x",
            Filter::SobelY => "sobel_y",
            Filter::Emboss => "emboss",
        }
    }
}

/// Valid 3×3 convolution producing a `(rows-2)×(cols-2)` grid
pub fn convolve(grid: &Grid, filter: Filter) -> Result<Grid> {
    convolve_with(grid, &filter.kernel())
}

/// [`convolve`] with an arbitrary 3×3 kernel
pub fn convolve_with(grid: &Grid, kernel: &Kernel3) -> Result<Grid> {
    if grid.rows() < 3 || grid.cols() < 3 {
        return Err(LearnError::InvalidInput(format!(
            "convolution needs at least a 3x3 grid, got {}x{}",
            grid.rows(),
            grid.cols()
        )));
    }
    let mut out = Grid::zeros(grid.rows() - 2, grid.cols() - 2);
    for r in 0..out.rows() {
        for c in 0..out.cols() {
            let mut acc = 0.0;
            for (i, row) in kernel.iter().enumerate() {
                for (j, weight) in row.iter().enumerate() {
                    acc += weight * grid.get(r + i, c + j);
                }
            }
            out.set(r, c, acc);
        }
    }
    Ok(out)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Pooling {
    Max,
    Average,
}

/// Pool `size×size` windows taken every `stride` cells
///
/// Windows that would run past the edge are dropped.
pub fn pool(grid: &Grid, size: usize, stride: usize, mode: Pooling) -> Result<Grid> {
    if size == 0 || stride == 0 {
        return Err(LearnError::InvalidParameter(
            "pool size and stride must be at least 1".to_string(),
        ));
    }
    if size > grid.rows() || size > grid.cols() {
        return Err(LearnError::InvalidInput(format!(
            "pool window {size} exceeds {}x{} grid",
            grid.rows(),
            grid.cols()
        )));
    }
    let out_rows = (grid.rows() - size) / stride + 1;
    let out_cols = (grid.cols() - size) / stride + 1;
    let mut out = Grid::zeros(out_rows, out_cols);
    for r in 0..out_rows {
        for c in 0..out_cols {
            let window = (0..size).flat_map(|i| {
                (0..size).map(move |j| grid.get(r * stride + i, c * stride + j))
            });
            let value = match mode {
                Pooling::Max => window.fold(f64::NEG_INFINITY, f64::max),
                Pooling::Average => window.sum::<f64>() / (size * size) as f64,
            };
            out.set(r, c, value);
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn ramp(rows: usize, cols: usize) -> Grid {
        let values = (0..rows * cols).map(|v| v as f64).collect();
        Grid::from_vec(rows, cols, values).unwrap()
    }

    #[test]
    fn test_identity_crops_border() {
        let grid = ramp(4, 5);
        let out = convolve(&grid, Filter::Identity).unwrap();
        assert_eq!((out.rows(), out.cols()), (2, 3));
        assert_eq!(out.get(0, 0), grid.get(1, 1));
        assert_eq!(out.get(1, 2), grid.get(2, 3));
    }

    #[test]
    fn test_smoothing_kernels_preserve_constants() {
        let grid = Grid::from_vec(4, 4, vec![3.0; 16]).unwrap();
        for filter in [Filter::BoxBlur, Filter::GaussianBlur, Filter::Sharpen] {
            let out = convolve(&grid, filter).unwrap();
            for &v in out.values() {
                assert_relative_eq!(v, 3.0, epsilon = 1e-12);
            }
        }
        let edges = convolve(&grid, Filter::EdgeDetect).unwrap();
        assert!(edges.values().iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_sobel_on_horizontal_ramp() {
        // Values increase by 1 per column and 5 per row
        let grid = ramp(5, 5);
        let gx = convolve(&grid, Filter::SobelX).unwrap();
        let gy = convolve(&grid, Filter::SobelY).unwrap();
        assert!(gx.values().iter().all(|&v| v == 8.0));
        assert!(gy.values().iter().all(|&v| v == 40.0));
    }

    #[test]
    fn test_convolve_rejects_small_grid() {
        assert!(convolve(&ramp(2, 5), Filter::BoxBlur).is_err());
    }

    #[test]
    fn test_max_and_average_pooling() {
        let grid = ramp(4, 4);
        let max = pool(&grid, 2, 2, Pooling::Max).unwrap();
        assert_eq!(max.values(), &[5.0, 7.0, 13.0, 15.0]);
        let avg = pool(&grid, 2, 2, Pooling::Average).unwrap();
        assert_eq!(avg.values(), &[2.5, 4.5, 10.5, 12.5]);
    }

    #[test]
    fn test_overlapping_pool_windows() {
        let out = pool(&ramp(3, 3), 2, 1, Pooling::Max).unwrap();
        assert_eq!((out.rows(), out.cols()), (2, 2));
        assert_eq!(out.values(), &[4.0, 5.0, 7.0, 8.0]);
    }

    #[test]
    fn test_pool_parameter_errors() {
        let grid = ramp(3, 3);
        assert!(pool(&grid, 0, 1, Pooling::Max).is_err());
        assert!(pool(&grid, 2, 0, Pooling::Max).is_err());
        assert!(pool(&grid, 4, 1, Pooling::Average).is_err());
    }

    #[test]
    fn test_filter_names_are_unique() {
        let mut names: Vec<_> = Filter::ALL.iter().map(|f| f.name()).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), Filter::ALL.len());
    }
}
