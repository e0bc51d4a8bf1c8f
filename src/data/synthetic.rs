//! Seeded synthetic datasets
//!
//! Every generator draws from the caller's RNG so that a fixed seed
//! reproduces the same points.

use crate::core::{LabeledPoint, Point2D};
use rand::Rng;
use std::f64::consts::PI;

/// Sample a standard normal variate using the Box-Muller transform
pub fn standard_normal<R: Rng + ?Sized>(rng: &mut R) -> f64 {
    let u1: f64 = rng.gen::<f64>().max(1e-10);
    let u2: f64 = rng.gen();
    (-2.0 * u1.ln()).sqrt() * (2.0 * PI * u2).cos()
}

/// Isotropic Gaussian clusters, labeled by the index of their center
///
/// Points are emitted center by center, `per_center` for each.
pub fn gaussian_blobs<R: Rng + ?Sized>(
    centers: &[Point2D],
    per_center: usize,
    std_dev: f64,
    rng: &mut R,
) -> Vec<LabeledPoint<usize>> {
    let mut points = Vec::with_capacity(centers.len() * per_center);
    for (label, center) in centers.iter().enumerate() {
        for _ in 0..per_center {
            let dx = standard_normal(rng) * std_dev;
            let dy = standard_normal(rng) * std_dev;
            points.push(LabeledPoint::new(center.x + dx, center.y + dy, label));
        }
    }
    points
}

/// Points uniform in `[-extent, extent]²` labeled by the XOR of their signs
///
/// Label 1 goes to the quadrants where exactly one coordinate is positive.
/// Points within `margin` of either axis are redrawn so the classes stay
/// separable.
pub fn xor_quadrants<R: Rng + ?Sized>(
    n: usize,
    extent: f64,
    margin: f64,
    rng: &mut R,
) -> Vec<LabeledPoint<u8>> {
    let margin = margin.clamp(0.0, extent * 0.9);
    (0..n)
        .map(|_| loop {
            let x = rng.gen_range(-extent..extent);
            let y = rng.gen_range(-extent..extent);
            if x.abs() >= margin && y.abs() >= margin {
                let label = u8::from((x > 0.0) != (y > 0.0));
                break LabeledPoint::new(x, y, label);
            }
        })
        .collect()
}

/// Samples of a polynomial plus Gaussian noise
///
/// `coefficients[i]` multiplies `x^i`. The `x` values are evenly spaced
/// over `[x_min, x_max]`.
pub fn noisy_polynomial<R: Rng + ?Sized>(
    coefficients: &[f64],
    n: usize,
    (x_min, x_max): (f64, f64),
    noise_std: f64,
    rng: &mut R,
) -> Vec<Point2D> {
    let step = if n > 1 {
        (x_max - x_min) / (n - 1) as f64
    } else {
        0.0
    };
    (0..n)
        .map(|i| {
            let x = x_min + i as f64 * step;
            let y = evaluate_polynomial(coefficients, x) + standard_normal(rng) * noise_std;
            Point2D::new(x, y)
        })
        .collect()
}

/// Horner evaluation of `Σ coefficients[i]·x^i`
pub fn evaluate_polynomial(coefficients: &[f64], x: f64) -> f64 {
    coefficients.iter().rev().fold(0.0, |acc, c| acc * x + c)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_blobs_are_seeded_and_labeled() {
        let centers = [Point2D::new(0.0, 0.0), Point2D::new(100.0, 100.0)];
        let a = gaussian_blobs(&centers, 50, 5.0, &mut StdRng::seed_from_u64(1));
        let b = gaussian_blobs(&centers, 50, 5.0, &mut StdRng::seed_from_u64(1));
        assert_eq!(a, b);
        assert_eq!(a.len(), 100);
        assert!(a[..50].iter().all(|lp| lp.label == 0));
        assert!(a[50..].iter().all(|lp| lp.label == 1));

        let mean_x = a[50..].iter().map(|lp| lp.point.x).sum::<f64>() / 50.0;
        assert!((mean_x - 100.0).abs() < 3.0);
    }

    #[test]
    fn test_standard_normal_moments() {
        let mut rng = StdRng::seed_from_u64(9);
        let samples: Vec<f64> = (0..20_000).map(|_| standard_normal(&mut rng)).collect();
        let mean = samples.iter().sum::<f64>() / samples.len() as f64;
        let var = samples.iter().map(|z| (z - mean).powi(2)).sum::<f64>() / samples.len() as f64;
        assert!(mean.abs() < 0.05);
        assert!((var - 1.0).abs() < 0.05);
    }

    #[test]
    fn test_xor_labels() {
        let points = xor_quadrants(200, 1.0, 0.1, &mut StdRng::seed_from_u64(4));
        assert_eq!(points.len(), 200);
        for lp in &points {
            assert!(lp.point.x.abs() >= 0.1 && lp.point.y.abs() >= 0.1);
            let expected = u8::from(lp.point.x * lp.point.y < 0.0);
            assert_eq!(lp.label, expected);
        }
    }

    #[test]
    fn test_noiseless_polynomial() {
        let mut rng = StdRng::seed_from_u64(0);
        let points = noisy_polynomial(&[1.0, 0.0, 2.0], 5, (-1.0, 1.0), 0.0, &mut rng);
        let ys: Vec<f64> = points.iter().map(|p| p.y).collect();
        assert_eq!(ys, vec![3.0, 1.5, 1.0, 1.5, 3.0]);
        assert_eq!(points[0].x, -1.0);
        assert_eq!(points[4].x, 1.0);
    }
}
