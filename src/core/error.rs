//! Error types for the learning toolkit

use thiserror::Error;

#[derive(Error, Debug)]
pub enum LearnError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Invalid label: {0}")]
    InvalidLabel(f64),

    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

pub type Result<T> = std::result::Result<T, LearnError>;

/// Reject datasets that are too small to train on or that contain
/// non-finite coordinates.
pub(crate) fn require_points<'a, I>(points: I, minimum: usize, what: &str) -> Result<()>
where
    I: ExactSizeIterator<Item = &'a crate::core::Point2D>,
{
    let n = points.len();
    if n < minimum {
        return Err(LearnError::InvalidInput(format!(
            "{what} requires at least {minimum} points, got {n}"
        )));
    }
    for (i, p) in points.enumerate() {
        if !p.is_finite() {
            return Err(LearnError::InvalidInput(format!(
                "point {i} has non-finite coordinates ({}, {})",
                p.x, p.y
            )));
        }
    }
    Ok(())
}

/// Reject non-positive or non-finite learning rates and similar step sizes.
pub(crate) fn require_positive(value: f64, name: &str) -> Result<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(LearnError::InvalidParameter(format!(
            "{name} must be positive and finite, got {value}"
        )))
    }
}
