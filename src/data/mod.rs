//! Point loading and synthetic datasets

pub mod csv;
pub mod synthetic;

pub use self::csv::*;
