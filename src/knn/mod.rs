//! k-nearest-neighbour classification
//!
//! The model is the training set itself. A query ranks every training point
//! by Euclidean distance with a stable sort, so equally distant points keep
//! their input order, and takes a majority vote over the first `k`.

use crate::core::error::require_points;
use crate::core::{Class, Classifier, LabeledPoint, LearnError, Point2D, Result};
use log::debug;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct KnnConfig {
    pub k: usize,
}

impl Default for KnnConfig {
    fn default() -> Self {
        Self { k: 3 }
    }
}

impl KnnConfig {
    pub fn with_k(mut self, k: usize) -> Self {
        self.k = k;
        self
    }
}

/// One of the `k` nearest training points for a query
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Neighbor {
    pub index: usize,
    pub distance: f64,
    pub label: Class,
}

pub struct KnnClassifier {
    points: Vec<LabeledPoint<Class>>,
    k: usize,
}

impl KnnClassifier {
    /// Store the training set; `k` must lie in `1..=points.len()`
    pub fn fit(points: &[LabeledPoint<Class>], config: KnnConfig) -> Result<Self> {
        require_points(points.iter().map(|lp| &lp.point), 1, "k-NN")?;
        if config.k == 0 || config.k > points.len() {
            return Err(LearnError::InvalidParameter(format!(
                "k must be between 1 and {}, got {}",
                points.len(),
                config.k
            )));
        }
        debug!("k-NN: {} training points, k = {}", points.len(), config.k);
        Ok(Self {
            points: points.to_vec(),
            k: config.k,
        })
    }

    pub fn k(&self) -> usize {
        self.k
    }

    /// The `k` closest training points, nearest first
    pub fn neighbors(&self, query: &Point2D) -> Vec<Neighbor> {
        let mut ranked: Vec<Neighbor> = self
            .points
            .iter()
            .enumerate()
            .map(|(index, lp)| Neighbor {
                index,
                distance: lp.point.distance(query),
                label: lp.label,
            })
            .collect();
        ranked.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        ranked.truncate(self.k);
        ranked
    }

    /// Votes per class among the `k` nearest
    pub fn votes(&self, query: &Point2D) -> [usize; 2] {
        tally(&self.neighbors(query))
    }
}

fn tally(neighbors: &[Neighbor]) -> [usize; 2] {
    let mut votes = [0; 2];
    for n in neighbors {
        votes[n.label.index()] += 1;
    }
    votes
}

impl Classifier for KnnClassifier {
    type Label = Class;

    /// Majority class; on a tie the class of the single nearest neighbour
    fn classify(&self, point: &Point2D) -> Class {
        let neighbors = self.neighbors(point);
        let votes = tally(&neighbors);
        match votes[0].cmp(&votes[1]) {
            std::cmp::Ordering::Greater => Class::A,
            std::cmp::Ordering::Less => Class::B,
            std::cmp::Ordering::Equal => neighbors[0].label,
        }
    }
}
