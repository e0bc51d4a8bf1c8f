//! Small from-scratch learning algorithms on 2D data
//!
//! Gradient-descent polynomial and logistic regression, a CART-style
//! decision tree, k-means, closed-form PCA, a simplified SMO support vector
//! machine and k-nearest neighbours, plus the numeric helpers that go with
//! them (marching squares, activation and loss functions, confusion
//! matrices, 3×3 convolution and pooling).
//!
//! Iterative trainers implement [`Stepper`] so a host can interleave single
//! epochs, phases or sweeps with rendering. Trained models implement
//! [`Classifier`] or expose a `predict` method; every query is pure.

pub mod activation;
pub mod api;
pub mod cache;
pub mod cluster;
pub mod contour;
pub mod convolution;
pub mod core;
pub mod data;
pub mod features;
pub mod kernel;
pub mod knn;
pub mod logistic;
pub mod loss;
pub mod metrics;
pub mod pca;
pub mod regression;
pub mod solver;
pub mod tree;

// Re-export main types for convenience
pub use crate::activation::Activation;
pub use crate::api::{ModelInfo, Svm, TrainedModel};
pub use crate::cache::{CacheStats, KernelCache};
pub use crate::cluster::{KMeans, KMeansConfig, KMeansPhase};
pub use crate::contour::{marching_squares, Bounds, SampledField, Segment};
pub use crate::convolution::{convolve, pool, Filter, Pooling};
pub use crate::core::error::{LearnError, Result};
pub use crate::core::traits::*;
pub use crate::core::types::*;
pub use crate::data::PointTable;
pub use crate::kernel::{Kernel, LinearKernel, RbfKernel};
pub use crate::knn::{KnnClassifier, KnnConfig};
pub use crate::logistic::{DecisionBoundary, LogisticConfig, LogisticModel, LogisticTrainer};
pub use crate::loss::LossFunction;
pub use crate::metrics::ConfusionMatrix;
pub use crate::pca::Pca;
pub use crate::regression::{RegressionConfig, RegressionModel, RegressionTrainer, Regularization};
pub use crate::solver::{SmoConfig, SmoSolution, SmoTrainer};
pub use crate::tree::{Criterion, DecisionTree, TreeConfig};

// Version info
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
