//! CART-style decision tree over labeled 2D points
//!
//! The tree is built recursively with axis-aligned binary splits. Every
//! candidate threshold is the midpoint between two consecutive distinct
//! coordinates along an axis; the split minimizing the size-weighted child
//! impurity wins, with the x axis and smaller thresholds winning ties.
//! Trees are immutable and rebuilt wholesale when data or settings change.

use crate::core::error::require_points;
use crate::core::{Axis, Class, Classifier, LabeledPoint, Point2D, Result};
use log::debug;
use serde::Serialize;

/// Split quality measure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum Criterion {
    #[default]
    Gini,
    Entropy,
}

impl Criterion {
    /// Impurity of a group with the given class counts
    pub fn impurity(self, count_a: usize, count_b: usize) -> f64 {
        match self {
            Criterion::Gini => gini_impurity(count_a, count_b),
            Criterion::Entropy => entropy(count_a, count_b),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Criterion::Gini => "gini",
            Criterion::Entropy => "entropy",
        }
    }
}

/// Gini impurity `1 - (pA² + pB²)`; 0.0 for an empty group
pub fn gini_impurity(count_a: usize, count_b: usize) -> f64 {
    let total = (count_a + count_b) as f64;
    if total == 0.0 {
        return 0.0;
    }
    let pa = count_a as f64 / total;
    let pb = count_b as f64 / total;
    1.0 - (pa * pa + pb * pb)
}

/// Shannon entropy in bits with `0·log2(0) = 0`; 0.0 for an empty group
pub fn entropy(count_a: usize, count_b: usize) -> f64 {
    let total = (count_a + count_b) as f64;
    if total == 0.0 {
        return 0.0;
    }
    [count_a, count_b]
        .iter()
        .filter(|&&c| c > 0)
        .map(|&c| {
            let p = c as f64 / total;
            -p * p.log2()
        })
        .sum()
}

/// Hyperparameters for building a tree
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TreeConfig {
    pub max_depth: usize,
    pub criterion: Criterion,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            max_depth: 5,
            criterion: Criterion::Gini,
        }
    }
}

impl TreeConfig {
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn with_criterion(mut self, criterion: Criterion) -> Self {
        self.criterion = criterion;
        self
    }
}

/// Why the builder stopped splitting at a leaf
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum StopReason {
    MaxDepth,
    TooFewSamples,
    Pure,
    NoValidSplit,
    EmptyPartition,
}

impl StopReason {
    /// The leaf was cut off before becoming pure
    pub fn is_forced(self) -> bool {
        !matches!(self, StopReason::Pure)
    }
}

/// Sample diagnostics carried by every node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct NodeStats {
    pub samples: usize,
    /// Per-class counts indexed by [`Class::index`]
    pub class_counts: [usize; 2],
    pub depth: usize,
}

/// A node of a built tree
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum TreeNode {
    Internal {
        axis: Axis,
        threshold: f64,
        /// Points with `coordinate <= threshold`
        left: Box<TreeNode>,
        right: Box<TreeNode>,
        stats: NodeStats,
    },
    Leaf {
        class: Class,
        stop: StopReason,
        stats: NodeStats,
    },
}

impl TreeNode {
    pub fn stats(&self) -> &NodeStats {
        match self {
            TreeNode::Internal { stats, .. } | TreeNode::Leaf { stats, .. } => stats,
        }
    }

    /// Descend to the leaf containing `point` and return its class
    pub fn predict(&self, point: &Point2D) -> Class {
        let mut node = self;
        loop {
            match node {
                TreeNode::Leaf { class, .. } => return *class,
                TreeNode::Internal {
                    axis,
                    threshold,
                    left,
                    right,
                    ..
                } => {
                    node = if point.coordinate(*axis) <= *threshold {
                        left
                    } else {
                        right
                    };
                }
            }
        }
    }

    /// Visit every leaf in left-to-right order
    pub fn for_each_leaf<F: FnMut(&TreeNode)>(&self, f: &mut F) {
        match self {
            TreeNode::Leaf { .. } => f(self),
            TreeNode::Internal { left, right, .. } => {
                left.for_each_leaf(f);
                right.for_each_leaf(f);
            }
        }
    }
}

/// Structural statistics of a tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TreeStats {
    pub node_count: usize,
    pub leaf_count: usize,
    /// Depth of the deepest leaf (a lone root leaf has depth 0)
    pub depth: usize,
}

/// Best split found for one node
#[derive(Debug, Clone, Copy)]
struct Split {
    axis: Axis,
    threshold: f64,
    impurity: f64,
}

/// A built decision tree
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DecisionTree {
    root: TreeNode,
    config: TreeConfig,
}

impl DecisionTree {
    /// Build a tree from at least two labeled points
    pub fn build(points: &[LabeledPoint<Class>], config: TreeConfig) -> Result<Self> {
        require_points(points.iter().map(|lp| &lp.point), 2, "decision tree")?;
        let root = build_node(points.to_vec(), 0, &config);
        let tree = Self { root, config };
        let stats = tree.stats();
        debug!(
            "built {} tree: {} nodes, {} leaves, depth {}",
            tree.config.criterion.name(),
            stats.node_count,
            stats.leaf_count,
            stats.depth
        );
        Ok(tree)
    }

    pub fn root(&self) -> &TreeNode {
        &self.root
    }

    pub fn config(&self) -> &TreeConfig {
        &self.config
    }

    /// Node count, leaf count and depth derived from the tree alone
    pub fn stats(&self) -> TreeStats {
        fn walk(node: &TreeNode, stats: &mut TreeStats) {
            stats.node_count += 1;
            match node {
                TreeNode::Leaf { stats: s, .. } => {
                    stats.leaf_count += 1;
                    stats.depth = stats.depth.max(s.depth);
                }
                TreeNode::Internal { left, right, .. } => {
                    walk(left, stats);
                    walk(right, stats);
                }
            }
        }
        let mut stats = TreeStats {
            node_count: 0,
            leaf_count: 0,
            depth: 0,
        };
        walk(&self.root, &mut stats);
        stats
    }
}

impl Classifier for DecisionTree {
    type Label = Class;

    fn classify(&self, point: &Point2D) -> Class {
        self.root.predict(point)
    }
}

fn count_classes(points: &[LabeledPoint<Class>]) -> [usize; 2] {
    let mut counts = [0; 2];
    for lp in points {
        counts[lp.label.index()] += 1;
    }
    counts
}

fn build_node(points: Vec<LabeledPoint<Class>>, depth: usize, config: &TreeConfig) -> TreeNode {
    let class_counts = count_classes(&points);
    let stats = NodeStats {
        samples: points.len(),
        class_counts,
        depth,
    };
    let leaf = |stop| TreeNode::Leaf {
        class: Class::majority(class_counts[0], class_counts[1]),
        stop,
        stats,
    };

    if depth >= config.max_depth {
        return leaf(StopReason::MaxDepth);
    }
    if points.len() < 2 {
        return leaf(StopReason::TooFewSamples);
    }
    if class_counts.contains(&0) {
        return leaf(StopReason::Pure);
    }
    let Some(split) = find_best_split(&points, config.criterion) else {
        return leaf(StopReason::NoValidSplit);
    };

    let (left, right): (Vec<_>, Vec<_>) = points
        .into_iter()
        .partition(|lp| lp.point.coordinate(split.axis) <= split.threshold);
    if left.is_empty() || right.is_empty() {
        return leaf(StopReason::EmptyPartition);
    }

    TreeNode::Internal {
        axis: split.axis,
        threshold: split.threshold,
        left: Box::new(build_node(left, depth + 1, config)),
        right: Box::new(build_node(right, depth + 1, config)),
        stats,
    }
}

/// Exhaustive midpoint search over both axes
fn find_best_split(points: &[LabeledPoint<Class>], criterion: Criterion) -> Option<Split> {
    let n = points.len();
    let totals = count_classes(points);
    let mut best: Option<Split> = None;

    for axis in Axis::ALL {
        let mut sorted: Vec<&LabeledPoint<Class>> = points.iter().collect();
        sorted.sort_by(|a, b| a.point.coordinate(axis).total_cmp(&b.point.coordinate(axis)));

        let mut left_counts = [0usize; 2];
        for i in 0..n - 1 {
            left_counts[sorted[i].label.index()] += 1;
            let current = sorted[i].point.coordinate(axis);
            let next = sorted[i + 1].point.coordinate(axis);
            if current == next {
                continue;
            }

            let left_n = i + 1;
            let right_counts = [totals[0] - left_counts[0], totals[1] - left_counts[1]];
            let impurity = (left_n as f64 * criterion.impurity(left_counts[0], left_counts[1])
                + (n - left_n) as f64 * criterion.impurity(right_counts[0], right_counts[1]))
                / n as f64;

            if best.map_or(true, |b| impurity < b.impurity) {
                best = Some(Split {
                    axis,
                    threshold: (current + next) / 2.0,
                    impurity,
                });
            }
        }
    }
    best
}
