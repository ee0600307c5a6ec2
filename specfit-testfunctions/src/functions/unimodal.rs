//! Unimodal test functions
//!
//! Single-optimum functions used to probe convergence speed and conditioning,
//! drawn from the function families customary in CMA-ES literature (Hansen & Ostermeier).

use ndarray::Array1;

/// Sphere function - isotropic quadratic bowl
/// Global minimum: f(x) = 0 at x = (0, 0, ..., 0)
pub fn sphere(x: &Array1<f64>) -> f64 {
    x.iter().map(|&xi| xi * xi).sum()
}

/// Axis-aligned ellipsoid with condition number 10^6 over the dimensions
/// Global minimum: f(x) = 0 at x = (0, 0, ..., 0)
pub fn ellipsoid(x: &Array1<f64>) -> f64 {
    let n = x.len();
    if n <= 1 {
        return sphere(x);
    }
    x.iter()
        .enumerate()
        .map(|(i, &xi)| {
            let exponent = i as f64 / (n as f64 - 1.0);
            let coeff = 1.0e6_f64.powf(exponent);
            coeff * xi * xi
        })
        .sum()
}

/// Cigar function - one long axis, all others tightly constrained
/// Global minimum: f(x) = 0 at x = (0, 0, ..., 0)
pub fn cigar(x: &Array1<f64>) -> f64 {
    if x.is_empty() {
        return 0.0;
    }
    let tail: f64 = x.iter().skip(1).map(|&xi| xi * xi).sum();
    x[0] * x[0] + 1.0e6 * tail
}

/// Tablet function - one short axis, all others loosely constrained
/// Global minimum: f(x) = 0 at x = (0, 0, ..., 0)
pub fn tablet(x: &Array1<f64>) -> f64 {
    if x.is_empty() {
        return 0.0;
    }
    let tail: f64 = x.iter().skip(1).map(|&xi| xi * xi).sum();
    1.0e6 * x[0] * x[0] + tail
}

/// Different-powers function - exponent grows linearly with axis index
/// Global minimum: f(x) = 0 at x = (0, 0, ..., 0)
pub fn different_powers(x: &Array1<f64>) -> f64 {
    let n = x.len();
    if n <= 1 {
        return x.iter().map(|&xi| xi.abs().powf(2.0)).sum();
    }
    x.iter()
        .enumerate()
        .map(|(i, &xi)| {
            let exponent = 2.0 + 8.0 * (i as f64) / (n as f64 - 1.0);
            xi.abs().powf(exponent)
        })
        .sum()
}

/// Rosenbrock's banana function
/// Global minimum: f(x) = 0 at x = (1, 1, ..., 1)
pub fn rosenbrock(x: &Array1<f64>) -> f64 {
    x.iter()
        .zip(x.iter().skip(1))
        .map(|(&xi, &xi1)| 100.0 * (xi1 - xi * xi).powi(2) + (1.0 - xi).powi(2))
        .sum()
}

/// Discus function - one axis vastly more sensitive than the rest
/// Global minimum: f(x) = 0 at x = (0, 0, ..., 0)
pub fn discus(x: &Array1<f64>) -> f64 {
    if x.is_empty() {
        return 0.0;
    }
    let tail: f64 = x.iter().skip(1).map(|&xi| xi * xi).sum();
    1.0e6 * x[0] * x[0] + tail
}

/// Ridge function - a steep linear ridge along the first axis
/// Global minimum: f(x) = 0 at x = (0, 0, ..., 0)
pub fn ridge(x: &Array1<f64>) -> f64 {
    if x.is_empty() {
        return 0.0;
    }
    let tail: f64 = x.iter().skip(1).map(|&xi| xi * xi).sum();
    x[0] + (tail).powf(0.25) * 10.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array1;

    #[test]
    fn test_zero_at_origin() {
        let x = Array1::from_vec(vec![0.0; 10]);
        assert_eq!(sphere(&x), 0.0);
        assert_eq!(ellipsoid(&x), 0.0);
        assert_eq!(cigar(&x), 0.0);
        assert_eq!(tablet(&x), 0.0);
        assert_eq!(different_powers(&x), 0.0);
        assert_eq!(discus(&x), 0.0);
        assert_eq!(ridge(&x), 0.0);
    }

    #[test]
    fn test_rosenbrock_minimum() {
        let x = Array1::from_vec(vec![1.0; 10]);
        assert!(rosenbrock(&x).abs() < 1e-12);
    }

    #[test]
    fn test_ellipsoid_conditioning() {
        let mut x = Array1::from_vec(vec![0.0; 10]);
        x[9] = 1.0;
        assert!((ellipsoid(&x) - 1.0e6).abs() < 1.0);
    }
}
