//! scratchml command line interface
//!
//! Each subcommand loads points from a CSV file (or generates a seeded
//! synthetic set), runs one algorithm and prints a short summary, or the
//! same summary as JSON with `--json`.

use clap::{Args, Parser, Subcommand, ValueEnum};
use env_logger::Env;
use log::{error, info};
use rand::rngs::StdRng;
use rand::SeedableRng;
use scratchml::api::{ModelInfo, Svm};
use scratchml::cluster::{Centroid, KMeans, KMeansConfig};
use scratchml::core::{Class, Classifier, LabeledPoint, LearnError, Point2D, Result, Stepper};
use scratchml::data::synthetic::{gaussian_blobs, noisy_polynomial, xor_quadrants};
use scratchml::data::PointTable;
use scratchml::kernel::{Kernel, LinearKernel, RbfKernel};
use scratchml::knn::{KnnClassifier, KnnConfig};
use scratchml::logistic::{self, DecisionBoundary, LogisticConfig};
use scratchml::metrics::ConfusionMatrix;
use scratchml::pca::{self, Pca};
use scratchml::regression::{self, RegressionConfig, Regularization};
use scratchml::tree::{Criterion, DecisionTree, TreeConfig, TreeStats};
use scratchml::Bounds;
use serde::Serialize;
use std::path::PathBuf;
use std::process;

#[derive(Parser)]
#[command(name = "scratchml")]
#[command(about = "Small from-scratch learning algorithms on 2D points")]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Enable debug output
    #[arg(short, long, global = true)]
    debug: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Fit a polynomial y = f(x) by gradient descent
    Regress(RegressArgs),
    /// Train a logistic classifier on 0/1 labels
    Logistic(LogisticArgs),
    /// Build a decision tree
    Tree(TreeArgs),
    /// Cluster unlabeled points with k-means
    Kmeans(KMeansArgs),
    /// Principal axes of the points
    Pca(PcaArgs),
    /// Train a support vector machine with simplified SMO
    Svm(SvmArgs),
    /// k-nearest-neighbour classification
    Knn(KnnArgs),
}

#[derive(Args)]
#[group(required = true, multiple = false)]
struct Source {
    /// CSV file with x,y[,label] rows
    #[arg(long)]
    data: Option<PathBuf>,

    /// Generate a synthetic dataset instead of reading a file
    #[arg(long)]
    generate: bool,
}

#[derive(Args)]
struct Common {
    #[command(flatten)]
    source: Source,

    /// Seed for data generation and training randomness
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Points per generated cluster or curve
    #[arg(long, default_value_t = 50)]
    samples: usize,

    /// Print the summary as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct RegressArgs {
    #[command(flatten)]
    common: Common,

    #[arg(long, default_value_t = 1)]
    degree: usize,

    #[arg(long, default_value_t = 0.01)]
    learning_rate: f64,

    #[arg(long, default_value_t = 1000)]
    epochs: usize,

    #[arg(long, value_enum, default_value = "none")]
    regularization: CliRegularization,

    /// Penalty strength
    #[arg(long, default_value_t = 0.0)]
    lambda: f64,
}

#[derive(Args)]
struct LogisticArgs {
    #[command(flatten)]
    common: Common,

    #[arg(long, default_value_t = 1)]
    degree: usize,

    #[arg(long, default_value_t = 0.5)]
    learning_rate: f64,

    #[arg(long, default_value_t = 500)]
    epochs: usize,
}

#[derive(Args)]
struct TreeArgs {
    #[command(flatten)]
    common: Common,

    #[arg(long, default_value_t = 5)]
    max_depth: usize,

    #[arg(long, value_enum, default_value = "gini")]
    criterion: CliCriterion,
}

#[derive(Args)]
struct KMeansArgs {
    #[command(flatten)]
    common: Common,

    #[arg(short, long, default_value_t = 3)]
    k: usize,

    /// Largest centroid movement still counted as converged
    #[arg(long, default_value_t = 1.0)]
    threshold: f64,
}

#[derive(Args)]
struct PcaArgs {
    #[command(flatten)]
    common: Common,
}

#[derive(Args)]
struct SvmArgs {
    #[command(flatten)]
    common: Common,

    /// Regularization parameter C
    #[arg(short = 'C', long, default_value_t = 1.0)]
    c: f64,

    #[arg(long, value_enum, default_value = "linear")]
    kernel: CliKernel,

    /// RBF width
    #[arg(long, default_value_t = scratchml::kernel::DEFAULT_GAMMA)]
    gamma: f64,

    /// Coordinate scale; defaults to the larger side of the data bounds
    #[arg(long)]
    scale: Option<f64>,

    /// KKT tolerance
    #[arg(long, default_value_t = 1e-3)]
    tolerance: f64,

    #[arg(long, default_value_t = 10)]
    max_passes: usize,

    #[arg(long, default_value_t = 2000)]
    max_iterations: usize,

    /// Kernel cache size in MB
    #[arg(long, default_value_t = 100)]
    cache_size: usize,
}

#[derive(Args)]
struct KnnArgs {
    #[command(flatten)]
    common: Common,

    #[arg(short, long, default_value_t = 3)]
    k: usize,

    /// Classify one extra point
    #[arg(long, num_args = 2, value_names = ["X", "Y"], allow_negative_numbers = true)]
    query: Option<Vec<f64>>,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum CliRegularization {
    None,
    L1,
    L2,
}

impl From<CliRegularization> for Regularization {
    fn from(cli: CliRegularization) -> Self {
        match cli {
            CliRegularization::None => Regularization::None,
            CliRegularization::L1 => Regularization::L1,
            CliRegularization::L2 => Regularization::L2,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum CliCriterion {
    Gini,
    Entropy,
}

impl From<CliCriterion> for Criterion {
    fn from(cli: CliCriterion) -> Self {
        match cli {
            CliCriterion::Gini => Criterion::Gini,
            CliCriterion::Entropy => Criterion::Entropy,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum CliKernel {
    Linear,
    Rbf,
}

fn main() {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.debug {
        "debug"
    } else if cli.verbose {
        "info"
    } else {
        "warn"
    };

    env_logger::Builder::from_env(Env::default().default_filter_or(log_level)).init();

    let result = match cli.command {
        Commands::Regress(args) => regress_command(args),
        Commands::Logistic(args) => logistic_command(args),
        Commands::Tree(args) => tree_command(args),
        Commands::Kmeans(args) => kmeans_command(args),
        Commands::Pca(args) => pca_command(args),
        Commands::Svm(args) => svm_command(args),
        Commands::Knn(args) => knn_command(args),
    };

    if let Err(e) = result {
        error!("Error: {e}");
        process::exit(1);
    }
}

/// Print `report` as pretty JSON, or hand it to `human` for plain text
fn emit<T: Serialize>(report: &T, json: bool, human: impl FnOnce(&T)) -> Result<()> {
    if json {
        let text = serde_json::to_string_pretty(report)
            .map_err(|e| LearnError::SerializationError(e.to_string()))?;
        println!("{text}");
    } else {
        human(report);
    }
    Ok(())
}

/// Read the CSV named by `--data`, or `None` when `--generate` was given
fn load_table(common: &Common) -> Result<Option<PointTable>> {
    match &common.source.data {
        Some(path) => {
            info!("Loading points from {path:?}");
            let table = PointTable::from_file(path)?;
            info!("Loaded {} points", table.len());
            Ok(Some(table))
        }
        None => Ok(None),
    }
}

/// Two seeded Gaussian clusters labeled 0 and 1
fn two_blobs(common: &Common, rng: &mut StdRng) -> Vec<LabeledPoint<usize>> {
    info!("Generating two blobs with {} points each", common.samples);
    gaussian_blobs(
        &[Point2D::new(150.0, 150.0), Point2D::new(450.0, 450.0)],
        common.samples,
        50.0,
        rng,
    )
}

fn accuracy_line(accuracy: f64) -> String {
    format!("Training accuracy: {:.2}%", accuracy * 100.0)
}

#[derive(Serialize)]
struct RegressReport {
    points: usize,
    degree: usize,
    regularization: Regularization,
    lambda: f64,
    epochs: usize,
    weights: Vec<f64>,
    final_loss: f64,
}

fn regress_command(args: RegressArgs) -> Result<()> {
    let mut rng = StdRng::seed_from_u64(args.common.seed);
    let points = match load_table(&args.common)? {
        Some(table) => table.points().to_vec(),
        None => noisy_polynomial(
            &[0.5, 1.0, -2.0],
            args.common.samples,
            (-1.0, 1.0),
            0.1,
            &mut rng,
        ),
    };

    let config = RegressionConfig::default()
        .with_degree(args.degree)
        .with_learning_rate(args.learning_rate)
        .with_epochs(args.epochs)
        .with_regularization(args.regularization.into(), args.lambda);
    info!("Training degree {} regression for {} epochs", args.degree, args.epochs);
    let fit = regression::fit(&points, config.clone(), &mut rng)?;

    let report = RegressReport {
        points: points.len(),
        degree: config.degree,
        regularization: config.regularization,
        lambda: config.lambda,
        epochs: config.epochs,
        weights: fit.model.weights().to_vec(),
        final_loss: fit.model.mse(&points),
    };
    emit(&report, args.common.json, |r| {
        println!("=== Polynomial Regression ===");
        println!("Points: {}", r.points);
        println!("Degree: {}", r.degree);
        for (i, w) in r.weights.iter().enumerate() {
            println!("  w{i}: {w:.6}");
        }
        println!("Final MSE: {:.6}", r.final_loss);
    })
}

#[derive(Serialize)]
struct LogisticReport {
    points: usize,
    degree: usize,
    epochs: usize,
    weights: Vec<f64>,
    loss: f64,
    accuracy: f64,
    boundary: String,
}

fn logistic_command(args: LogisticArgs) -> Result<()> {
    let mut rng = StdRng::seed_from_u64(args.common.seed);
    let points = match load_table(&args.common)? {
        Some(table) => table.binary_labeled()?,
        None if args.degree >= 2 => xor_quadrants(args.common.samples * 2, 1.0, 0.1, &mut rng),
        None => two_blobs(&args.common, &mut rng)
            .into_iter()
            .map(|lp| LabeledPoint {
                point: lp.point,
                label: lp.label as u8,
            })
            .collect(),
    };

    let config = LogisticConfig::default()
        .with_degree(args.degree)
        .with_learning_rate(args.learning_rate)
        .with_epochs(args.epochs);
    let model = logistic::fit(&points, config, &mut rng)?;

    let all: Vec<Point2D> = points.iter().map(|lp| lp.point).collect();
    let boundary = Bounds::enclosing(&all)
        .and_then(|bounds| model.decision_boundary(bounds, 50).ok())
        .map(|b| match b {
            DecisionBoundary::Line(_) => "line".to_string(),
            DecisionBoundary::Contour(segments) => format!("contour ({} segments)", segments.len()),
            DecisionBoundary::None => "none".to_string(),
        })
        .unwrap_or_else(|| "none".to_string());

    let report = LogisticReport {
        points: points.len(),
        degree: args.degree,
        epochs: args.epochs,
        weights: model.weights().to_vec(),
        loss: model.loss(&points),
        accuracy: model.accuracy(&points),
        boundary,
    };
    emit(&report, args.common.json, |r| {
        println!("=== Logistic Regression ===");
        println!("Points: {}", r.points);
        println!("Degree: {}", r.degree);
        println!("Loss: {:.6}", r.loss);
        println!("{}", accuracy_line(r.accuracy));
        println!("Decision boundary: {}", r.boundary);
    })
}

#[derive(Serialize)]
struct TreeReport {
    points: usize,
    criterion: &'static str,
    max_depth: usize,
    stats: TreeStats,
    accuracy: f64,
}

fn tree_command(args: TreeArgs) -> Result<()> {
    let mut rng = StdRng::seed_from_u64(args.common.seed);
    let points = match load_table(&args.common)? {
        Some(table) => table.class_labeled()?,
        None => xor_quadrants(args.common.samples * 2, 1.0, 0.05, &mut rng)
            .into_iter()
            .map(|lp| LabeledPoint {
                point: lp.point,
                label: if lp.label == 0 { Class::A } else { Class::B },
            })
            .collect(),
    };

    let criterion: Criterion = args.criterion.into();
    let config = TreeConfig::default()
        .with_max_depth(args.max_depth)
        .with_criterion(criterion);
    let tree = DecisionTree::build(&points, config)?;

    let report = TreeReport {
        points: points.len(),
        criterion: criterion.name(),
        max_depth: args.max_depth,
        stats: tree.stats(),
        accuracy: tree.accuracy(&points),
    };
    emit(&report, args.common.json, |r| {
        println!("=== Decision Tree ===");
        println!("Points: {}", r.points);
        println!("Criterion: {}", r.criterion);
        println!("Nodes: {}", r.stats.node_count);
        println!("Leaves: {}", r.stats.leaf_count);
        println!("Depth: {}", r.stats.depth);
        println!("{}", accuracy_line(r.accuracy));
    })
}

#[derive(Serialize)]
struct KMeansReport {
    points: usize,
    k: usize,
    steps: usize,
    iterations: usize,
    inertia: f64,
    centroids: Vec<Centroid>,
}

fn kmeans_command(args: KMeansArgs) -> Result<()> {
    let mut rng = StdRng::seed_from_u64(args.common.seed);
    let points: Vec<Point2D> = match load_table(&args.common)? {
        Some(table) => table.points().to_vec(),
        None => gaussian_blobs(
            &[
                Point2D::new(150.0, 150.0),
                Point2D::new(450.0, 180.0),
                Point2D::new(300.0, 450.0),
            ],
            args.common.samples,
            40.0,
            &mut rng,
        )
        .into_iter()
        .map(|lp| lp.point)
        .collect(),
    };

    let config = KMeansConfig::default()
        .with_k(args.k)
        .with_convergence_threshold(args.threshold)
        .with_seed(args.common.seed);
    let mut kmeans = KMeans::new(&points, config)?;
    let steps = kmeans.run();

    let report = KMeansReport {
        points: points.len(),
        k: args.k,
        steps,
        iterations: kmeans.iteration(),
        inertia: kmeans.inertia(),
        centroids: kmeans.centroids().to_vec(),
    };
    emit(&report, args.common.json, |r| {
        println!("=== K-Means ===");
        println!("Points: {}", r.points);
        println!("Converged after {} iterations", r.iterations);
        println!("Inertia: {:.4}", r.inertia);
        for c in &r.centroids {
            println!("  centroid {}: ({:.4}, {:.4})", c.id, c.position.x, c.position.y);
        }
    })
}

#[derive(Serialize)]
struct PcaReport {
    points: usize,
    mean: Point2D,
    pca: Pca,
    explained_variance_ratio: f64,
}

fn pca_command(args: PcaArgs) -> Result<()> {
    let mut rng = StdRng::seed_from_u64(args.common.seed);
    let points: Vec<Point2D> = match load_table(&args.common)? {
        Some(table) => table.points().to_vec(),
        None => gaussian_blobs(&[Point2D::default()], args.common.samples * 2, 1.0, &mut rng)
            .into_iter()
            .map(|lp| Point2D::new(3.0 * lp.point.x, 1.5 * lp.point.x + 0.5 * lp.point.y))
            .collect(),
    };

    let (mean, centered) = pca::center(&points)?;
    let fitted = Pca::fit(&centered)?;

    let report = PcaReport {
        points: points.len(),
        mean,
        explained_variance_ratio: fitted.explained_variance_ratio(),
        pca: fitted,
    };
    emit(&report, args.common.json, |r| {
        println!("=== PCA ===");
        println!("Points: {}", r.points);
        println!("Mean: ({:.4}, {:.4})", r.mean.x, r.mean.y);
        println!("Eigenvalues: {:.4}, {:.4}", r.pca.eigenvalues.0, r.pca.eigenvalues.1);
        println!("PC1: ({:.4}, {:.4})", r.pca.pc1.x, r.pca.pc1.y);
        println!("PC2: ({:.4}, {:.4})", r.pca.pc2.x, r.pca.pc2.y);
        println!("Explained by PC1: {:.2}%", r.explained_variance_ratio * 100.0);
    })
}

#[derive(Serialize)]
struct SvmReport {
    points: usize,
    scale: f64,
    info: ModelInfo,
    accuracy: f64,
    metrics: ConfusionMatrix,
}

fn svm_command(args: SvmArgs) -> Result<()> {
    let mut rng = StdRng::seed_from_u64(args.common.seed);
    let samples = match load_table(&args.common)? {
        Some(table) => table.signed_labeled()?,
        None => two_blobs(&args.common, &mut rng)
            .into_iter()
            .map(|lp| LabeledPoint {
                point: lp.point,
                label: if lp.label == 0 { -1.0 } else { 1.0 },
            })
            .collect(),
    };

    let scale = match args.scale {
        Some(scale) => scale,
        None => Bounds::enclosing(samples.iter().map(|s| &s.point))
            .map(|b| b.width().max(b.height()))
            .unwrap_or(1.0)
            .max(1.0),
    };
    info!("Training {:?} SVM with C={}, scale={scale}", args.kernel, args.c);

    match args.kernel {
        CliKernel::Linear => train_svm(&args, LinearKernel::new(scale), &samples, scale),
        CliKernel::Rbf => train_svm(&args, RbfKernel::new(args.gamma, scale), &samples, scale),
    }
}

fn train_svm<K: Kernel>(
    args: &SvmArgs,
    kernel: K,
    samples: &[LabeledPoint<f64>],
    scale: f64,
) -> Result<()> {
    let model = Svm::with_kernel(kernel)
        .with_c(args.c)
        .with_tolerance(args.tolerance)
        .with_max_passes(args.max_passes)
        .with_max_iterations(args.max_iterations)
        .with_cache_size(args.cache_size.saturating_mul(1024 * 1024))
        .with_seed(args.common.seed)
        .train(samples)?;

    let report = SvmReport {
        points: samples.len(),
        scale,
        info: model.info(),
        accuracy: model.evaluate(samples),
        metrics: model.evaluate_detailed(samples),
    };
    emit(&report, args.common.json, |r| {
        println!("=== Support Vector Machine ===");
        println!("Points: {}", r.points);
        println!("Kernel: {}", r.info.kernel);
        println!("Sweeps: {}", r.info.iterations);
        println!("Support vectors: {}", r.info.n_support_vectors);
        println!("Bias: {:.6}", r.info.bias);
        println!("{}", accuracy_line(r.accuracy));
        println!("  Precision:   {:.4}", r.metrics.precision());
        println!("  Recall:      {:.4}", r.metrics.recall());
        println!("  F1 Score:    {:.4}", r.metrics.f1_score());
        println!("  Specificity: {:.4}", r.metrics.specificity());
    })
}

#[derive(Serialize)]
struct KnnQuery {
    point: Point2D,
    class: Class,
    votes: [usize; 2],
}

#[derive(Serialize)]
struct KnnReport {
    points: usize,
    k: usize,
    accuracy: f64,
    query: Option<KnnQuery>,
}

fn knn_command(args: KnnArgs) -> Result<()> {
    let mut rng = StdRng::seed_from_u64(args.common.seed);
    let points = match load_table(&args.common)? {
        Some(table) => table.class_labeled()?,
        None => two_blobs(&args.common, &mut rng)
            .into_iter()
            .map(|lp| LabeledPoint {
                point: lp.point,
                label: if lp.label == 0 { Class::A } else { Class::B },
            })
            .collect(),
    };

    let knn = KnnClassifier::fit(&points, KnnConfig::default().with_k(args.k))?;
    let query = args.query.as_deref().map(|xy| {
        let point = Point2D::new(xy[0], xy[1]);
        KnnQuery {
            point,
            class: knn.classify(&point),
            votes: knn.votes(&point),
        }
    });

    let report = KnnReport {
        points: points.len(),
        k: knn.k(),
        accuracy: knn.accuracy(&points),
        query,
    };
    emit(&report, args.common.json, |r| {
        println!("=== k-Nearest Neighbours ===");
        println!("Points: {}", r.points);
        println!("k: {}", r.k);
        println!("{}", accuracy_line(r.accuracy));
        if let Some(q) = &r.query {
            println!(
                "Query ({}, {}): class {:?} (votes A={}, B={})",
                q.point.x, q.point.y, q.class, q.votes[0], q.votes[1]
            );
        }
    })
}
