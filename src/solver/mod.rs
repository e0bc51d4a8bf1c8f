//! SVM solver
//!
//! Only the simplified SMO variant is provided: random second-multiplier
//! choice and a quiet-pass stopping rule.

pub mod smo;

pub use self::smo::*;
