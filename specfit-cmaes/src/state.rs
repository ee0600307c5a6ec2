//! Mutable optimizer state carried between generations.
//!
//! Invariant: `c == b.dot(&Array2::from_diag(&d.mapv(|v| v * v))).dot(&b.t())`,
//! re-established whenever the covariance matrix is eigen-decomposed.

use ndarray::{Array1, Array2};

/// State evolved by the optimizer, one instance per run.
#[derive(Debug, Clone)]
pub struct OptimizationState {
    /// Current generation counter.
    pub generation: usize,
    /// Distribution mean (incumbent parameter vector).
    pub xw: Array1<f64>,
    /// Global step size.
    pub sigma: f64,
    /// Square roots of the covariance matrix's eigenvalues.
    pub d: Array1<f64>,
    /// Orthonormal eigenvectors of the covariance matrix, as columns.
    pub b: Array2<f64>,
    /// Covariance matrix, stored upper-triangular-symmetric.
    pub c: Array2<f64>,
    /// Evolution path for step-size control.
    pub p_sigma: Array1<f64>,
    /// Evolution path for covariance adaptation.
    pub p_c: Array1<f64>,
    /// Best objective value seen so far.
    pub best_cost: f64,
    /// Parameters achieving `best_cost`.
    pub best_parameters: Array1<f64>,
    /// Set once the search has produced a degenerate (non-distinguishable) ranking.
    pub underflow: bool,
    /// Set once the per-axis termination test has passed.
    pub optimized: bool,
}

impl OptimizationState {
    /// Initialize state at generation 0, with `B` the identity and `C`
    /// diagonal, set from the per-axis initial step sizes `d`.
    pub fn new(initial_mean: Array1<f64>, initial_step_size: f64, initial_local_step_sizes: Array1<f64>) -> Self {
        let n = initial_mean.len();
        let best_cost = f64::INFINITY;
        let best_parameters = initial_mean.clone();
        let c = Array2::from_diag(&initial_local_step_sizes.mapv(|di| di * di));
        OptimizationState {
            generation: 0,
            xw: initial_mean,
            sigma: initial_step_size,
            d: initial_local_step_sizes,
            b: Array2::eye(n),
            c,
            p_sigma: Array1::zeros(n),
            p_c: Array1::zeros(n),
            best_cost,
            best_parameters,
            underflow: false,
            optimized: false,
        }
    }

    /// Per-axis spread `sigma * d_i`, used both for sampling scale and the
    /// termination test.
    pub fn axis_spread(&self) -> Array1<f64> {
        self.d.mapv(|di| self.sigma * di)
    }
}
