//! Benchmark objective functions for validating CMA-ES convergence
//!
//! Functions are organized by category:
//!
//! - **Unimodal**: single global optimum (sphere, ellipsoid, cigar, tablet, rosenbrock, ...)
//! - **Multimodal**: several local minima (salomon, cosine mixture, levy, ...)
//!
//! # Example
//!
//! ```rust
//! use ndarray::Array1;
//! use specfit_testfunctions::*;
//!
//! let x = Array1::from_vec(vec![0.0, 0.0]);
//! assert_eq!(sphere(&x), 0.0);
//!
//! let bounds = get_function_bounds("sphere");
//! assert!(bounds.is_some());
//! ```

use ndarray::Array2;
use std::collections::HashMap;

pub mod functions;
pub use functions::*;

/// Metadata for a test function: bounds, known minima, and a short description.
#[derive(Debug, Clone)]
pub struct FunctionMetadata {
    /// Function name
    pub name: String,
    /// Bounds per dimension; a single entry means the function is scalable
    pub bounds: Vec<(f64, f64)>,
    /// Known global minima as (location, value) pairs
    pub global_minima: Vec<(Vec<f64>, f64)>,
    /// Short description
    pub description: String,
    /// Whether the function has more than one local optimum
    pub multimodal: bool,
}

/// Create a bounds matrix for optimization (2 x n), row 0 lower, row 1 upper.
pub fn create_bounds(n: usize, lower: f64, upper: f64) -> Array2<f64> {
    Array2::from_shape_fn((2, n), |(i, _)| if i == 0 { lower } else { upper })
}

/// Metadata for every function in this crate, keyed by name.
pub fn get_function_metadata() -> HashMap<String, FunctionMetadata> {
    let mut m = HashMap::new();

    let mut insert = |name: &str,
                       bounds: Vec<(f64, f64)>,
                       global_minima: Vec<(Vec<f64>, f64)>,
                       desc: &str,
                       multimodal: bool| {
        m.insert(
            name.to_string(),
            FunctionMetadata {
                name: name.to_string(),
                bounds,
                global_minima,
                description: desc.to_string(),
                multimodal,
            },
        );
    };

    insert(
        "sphere",
        vec![(-5.0, 5.0)],
        vec![(vec![0.0; 10], 0.0)],
        "isotropic quadratic bowl",
        false,
    );
    insert(
        "ellipsoid",
        vec![(-5.0, 5.0)],
        vec![(vec![0.0; 10], 0.0)],
        "axis-aligned ellipsoid, condition 1e6",
        false,
    );
    insert(
        "cigar",
        vec![(-5.0, 5.0)],
        vec![(vec![0.0; 10], 0.0)],
        "one long axis, all others tight",
        false,
    );
    insert(
        "tablet",
        vec![(-5.0, 5.0)],
        vec![(vec![0.0; 10], 0.0)],
        "one short axis, all others loose",
        false,
    );
    insert(
        "different_powers",
        vec![(-5.0, 5.0)],
        vec![(vec![0.0; 10], 0.0)],
        "per-axis power scaling",
        false,
    );
    insert(
        "discus",
        vec![(-5.0, 5.0)],
        vec![(vec![0.0; 10], 0.0)],
        "one vastly more sensitive axis",
        false,
    );
    insert(
        "ridge",
        vec![(-5.0, 5.0)],
        vec![(vec![0.0; 10], 0.0)],
        "steep ridge along the first axis",
        false,
    );
    insert(
        "rosenbrock",
        vec![(-2.048, 2.048)],
        vec![(vec![1.0; 10], 0.0)],
        "narrow curved valley",
        false,
    );
    insert(
        "sharp_ridge",
        vec![(-5.0, 5.0)],
        vec![(vec![0.0; 10], 0.0)],
        "sharp ridge, even steeper than ridge",
        false,
    );
    insert(
        "schwefel",
        vec![(-500.0, 500.0); 2],
        vec![(vec![420.9687, 420.9687], 0.0)],
        "many widely spaced local minima",
        true,
    );
    insert(
        "goldstein_price",
        vec![(-2.0, 2.0); 2],
        vec![(vec![0.0, -1.0], 3.0)],
        "2D function with a single global minimum of value 3",
        true,
    );
    insert(
        "gramacy_lee_2012",
        vec![(0.5, 2.5)],
        vec![(vec![0.548563444114526], -0.869011134989500)],
        "1D function with a challenging local structure",
        true,
    );
    insert(
        "step",
        vec![(-100.0, 100.0); 2],
        vec![(vec![0.5, 0.5], 0.0)],
        "discontinuous step landscape",
        true,
    );
    insert(
        "salomon",
        vec![(-100.0, 100.0); 2],
        vec![(vec![0.0, 0.0], 0.0)],
        "radially symmetric multimodal function",
        true,
    );
    insert(
        "cosine_mixture",
        vec![(-1.0, 1.0); 2],
        vec![(vec![0.0, 0.0], 0.0)],
        "mixture of a cosine term and a quadratic bowl",
        true,
    );
    insert(
        "levy_n13",
        vec![(-10.0, 10.0); 2],
        vec![(vec![1.0, 1.0], 0.0)],
        "Levy N.13 multimodal function",
        true,
    );

    m
}

/// Bounds for a named function, or `None` if the function is not registered.
pub fn get_function_bounds(function_name: &str) -> Option<Vec<(f64, f64)>> {
    get_function_metadata().get(function_name).map(|meta| meta.bounds.clone())
}

/// Bounds as a fixed 2D pair, falling back to `default_bounds` when the function
/// is unregistered or only defines a single scalable bound.
pub fn get_function_bounds_2d(function_name: &str, default_bounds: (f64, f64)) -> [(f64, f64); 2] {
    match get_function_bounds(function_name) {
        Some(bounds) if bounds.len() >= 2 => [bounds[0], bounds[1]],
        Some(bounds) if bounds.len() == 1 => [bounds[0], bounds[0]],
        _ => [default_bounds; 2],
    }
}

/// Bounds as a `Vec`, falling back to two copies of `default_bounds` when the
/// function is unregistered.
pub fn get_function_bounds_vec(function_name: &str, default_bounds: (f64, f64)) -> Vec<(f64, f64)> {
    get_function_bounds(function_name).unwrap_or_else(|| vec![default_bounds; 2])
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array1;

    fn call(name: &str, x: &Array1<f64>) -> Option<f64> {
        match name {
            "sphere" => Some(sphere(x)),
            "ellipsoid" => Some(ellipsoid(x)),
            "cigar" => Some(cigar(x)),
            "tablet" => Some(tablet(x)),
            "different_powers" => Some(different_powers(x)),
            "discus" => Some(discus(x)),
            "ridge" => Some(ridge(x)),
            "rosenbrock" => Some(rosenbrock(x)),
            "sharp_ridge" => Some(sharp_ridge(x)),
            "schwefel" => Some(schwefel(x)),
            "goldstein_price" => Some(goldstein_price(x)),
            "gramacy_lee_2012" => Some(gramacy_lee_2012(x)),
            "step" => Some(step(x)),
            "salomon" => Some(salomon(x)),
            "cosine_mixture" => Some(cosine_mixture(x)),
            "levy_n13" => Some(levy_n13(x)),
            _ => None,
        }
    }

    #[test]
    fn test_all_function_minima() {
        for (name, meta) in get_function_metadata() {
            for (location, expected) in &meta.global_minima {
                let x = Array1::from_vec(location.clone());
                let actual = call(&name, &x).expect("every registered function must be callable");
                let tolerance = if expected.abs() > 1.0 { 1e-3 * expected.abs() } else { 1e-3 };
                assert!(
                    (actual - expected).abs() <= tolerance,
                    "{name}: expected {expected}, got {actual}"
                );
            }
        }
    }

    #[test]
    fn test_bounds_are_registered() {
        assert!(get_function_bounds("sphere").is_some());
        assert!(get_function_bounds("nonexistent").is_none());
    }

    #[test]
    fn test_metadata_well_formed() {
        for (name, meta) in get_function_metadata() {
            assert!(!meta.bounds.is_empty(), "{name} has no bounds");
            for (lower, upper) in &meta.bounds {
                assert!(lower < upper, "{name} has invalid bounds");
            }
        }
    }
}
