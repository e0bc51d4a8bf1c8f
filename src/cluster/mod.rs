//! K-means clustering as an explicitly stepped state machine
//!
//! ```text
//! Idle --step--> Init --step--> Assign --step--> Update --step--> Assign ...
//!                                          \
//!                                           +--> Converged (every centroid moved < threshold)
//! ```
//!
//! Each [`Stepper::step`] performs exactly one phase so a host can redraw
//! between them. Initial centroids are `k` distinct data points chosen
//! uniformly at random.

use crate::core::error::{require_points, require_positive};
use crate::core::{LearnError, Point2D, Result, Stepper};
use log::{debug, trace};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use std::collections::HashSet;

/// Phase the machine is in after its most recent step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum KMeansPhase {
    Idle,
    Init,
    Assign,
    Update,
    Converged,
}

/// A cluster centre; `id` is stable across iterations, `position` is not
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Centroid {
    pub id: usize,
    pub position: Point2D,
}

/// Hyperparameters for k-means
#[derive(Debug, Clone, Serialize)]
pub struct KMeansConfig {
    pub k: usize,
    /// Convergence is declared when every centroid moved less than this
    pub convergence_threshold: f64,
    /// Seed for centroid selection; `None` draws from OS entropy
    pub seed: Option<u64>,
}

impl Default for KMeansConfig {
    fn default() -> Self {
        Self {
            k: 3,
            convergence_threshold: 1.0,
            seed: None,
        }
    }
}

impl KMeansConfig {
    pub fn with_k(mut self, k: usize) -> Self {
        self.k = k;
        self
    }

    pub fn with_convergence_threshold(mut self, threshold: f64) -> Self {
        self.convergence_threshold = threshold;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}

/// Lloyd's algorithm driven one phase at a time
#[derive(Debug, Clone)]
pub struct KMeans {
    config: KMeansConfig,
    points: Vec<Point2D>,
    centroids: Vec<Centroid>,
    /// `None` until the first assign phase
    assignments: Vec<Option<usize>>,
    phase: KMeansPhase,
    iteration: usize,
    last_movement: Vec<f64>,
    rng: StdRng,
}

impl KMeans {
    /// Create an idle machine over `points`
    pub fn new(points: &[Point2D], config: KMeansConfig) -> Result<Self> {
        validate(points, &config)?;
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Ok(Self {
            assignments: vec![None; points.len()],
            points: points.to_vec(),
            config,
            centroids: Vec::new(),
            phase: KMeansPhase::Idle,
            iteration: 0,
            last_movement: Vec::new(),
            rng,
        })
    }

    /// Discard centroids and assignments and return to `Idle`
    pub fn reset(&mut self) {
        self.centroids.clear();
        self.assignments = vec![None; self.points.len()];
        self.phase = KMeansPhase::Idle;
        self.iteration = 0;
        self.last_movement.clear();
    }

    /// Replace the data set (regenerate) and reset
    pub fn set_points(&mut self, points: &[Point2D]) -> Result<()> {
        validate(points, &self.config)?;
        self.points = points.to_vec();
        self.reset();
        Ok(())
    }

    /// Change `k` and reset
    pub fn set_k(&mut self, k: usize) -> Result<()> {
        let config = self.config.clone().with_k(k);
        validate(&self.points, &config)?;
        self.config = config;
        self.reset();
        Ok(())
    }

    fn initialize(&mut self) {
        let n = self.points.len();
        let mut chosen: HashSet<usize> = HashSet::with_capacity(self.config.k);
        let mut order = Vec::with_capacity(self.config.k);
        while order.len() < self.config.k {
            let index = self.rng.gen_range(0..n);
            if chosen.insert(index) {
                order.push(index);
            }
        }
        self.centroids = order
            .into_iter()
            .enumerate()
            .map(|(id, index)| Centroid {
                id,
                position: self.points[index],
            })
            .collect();
        trace!("k-means initialized {} centroids", self.centroids.len());
    }

    fn assign_points(&mut self) {
        for (point, slot) in self.points.iter().zip(self.assignments.iter_mut()) {
            *slot = nearest(&self.centroids, point);
        }
    }

    /// Move centroids to their cluster means; returns true when converged
    fn update_centroids(&mut self) -> bool {
        let k = self.centroids.len();
        let mut sums = vec![Point2D::default(); k];
        let mut counts = vec![0usize; k];
        for (point, assignment) in self.points.iter().zip(&self.assignments) {
            if let Some(c) = assignment {
                sums[*c] = sums[*c] + *point;
                counts[*c] += 1;
            }
        }

        self.last_movement.clear();
        for ((centroid, sum), count) in self.centroids.iter_mut().zip(sums).zip(counts) {
            let old = centroid.position;
            if count > 0 {
                centroid.position = sum * (1.0 / count as f64);
            }
            self.last_movement.push(old.distance(&centroid.position));
        }
        self.iteration += 1;
        trace!(
            "k-means iteration {}: movement {:?}",
            self.iteration,
            self.last_movement
        );

        let threshold = self.config.convergence_threshold;
        self.last_movement.iter().all(|&m| m < threshold)
    }

    /// Index of the centroid nearest to `point`, lowest index on ties
    ///
    /// `None` before initialization.
    pub fn assign(&self, point: &Point2D) -> Option<usize> {
        nearest(&self.centroids, point)
    }

    /// Within-cluster sum of squared distances for the current assignment
    pub fn inertia(&self) -> f64 {
        self.points
            .iter()
            .zip(&self.assignments)
            .filter_map(|(p, a)| a.map(|c| p.distance_squared(&self.centroids[c].position)))
            .sum()
    }

    pub fn phase(&self) -> KMeansPhase {
        self.phase
    }

    pub fn centroids(&self) -> &[Centroid] {
        &self.centroids
    }

    pub fn assignments(&self) -> &[Option<usize>] {
        &self.assignments
    }

    pub fn points(&self) -> &[Point2D] {
        &self.points
    }

    /// Number of completed update phases
    pub fn iteration(&self) -> usize {
        self.iteration
    }

    /// Distance each centroid moved in the last update phase
    pub fn last_movement(&self) -> &[f64] {
        &self.last_movement
    }

    pub fn config(&self) -> &KMeansConfig {
        &self.config
    }
}

impl Stepper for KMeans {
    fn step(&mut self) {
        self.phase = match self.phase {
            KMeansPhase::Idle => {
                self.initialize();
                KMeansPhase::Init
            }
            KMeansPhase::Init | KMeansPhase::Update => {
                self.assign_points();
                KMeansPhase::Assign
            }
            KMeansPhase::Assign => {
                if self.update_centroids() {
                    debug!("k-means converged after {} iterations", self.iteration);
                    KMeansPhase::Converged
                } else {
                    KMeansPhase::Update
                }
            }
            KMeansPhase::Converged => KMeansPhase::Converged,
        };
    }

    fn is_finished(&self) -> bool {
        self.phase == KMeansPhase::Converged
    }
}

fn nearest(centroids: &[Centroid], point: &Point2D) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (i, c) in centroids.iter().enumerate() {
        let d = point.distance_squared(&c.position);
        if best.map_or(true, |(_, bd)| d < bd) {
            best = Some((i, d));
        }
    }
    best.map(|(i, _)| i)
}

fn validate(points: &[Point2D], config: &KMeansConfig) -> Result<()> {
    require_points(points.iter(), 1, "k-means")?;
    require_positive(config.convergence_threshold, "convergence threshold")?;
    if config.k == 0 || config.k > points.len() {
        return Err(LearnError::InvalidParameter(format!(
            "k must be between 1 and the number of points ({}), got {}",
            points.len(),
            config.k
        )));
    }
    Ok(())
}
