//! Configuration for a CMA-ES run, with the standard (μ/μ_W, λ)-CMA-ES
//! default schedule (Hansen & Ostermeier) filled in when left unset.

use crate::error::CmaEsError;

/// Tuning parameters for one optimization run.
///
/// Every field except `dimension` has a population-size-derived default;
/// build one with [`CmaEsConfigBuilder`] and only override what you need.
#[derive(Debug, Clone)]
pub struct CmaEsConfig {
    /// Search-space dimension `n`. The only value with no default.
    pub dimension: usize,
    /// Parent number μ, i.e. how many of the λ candidates are recombined.
    pub parent_number: usize,
    /// Population size λ per generation.
    pub population_size: usize,
    /// Initial global step size σ.
    pub initial_step_size: f64,
    /// Initial per-axis step sizes `d`, scaling the global step size along
    /// each axis before the first covariance adaptation (default: all 1.0).
    pub initial_local_step_sizes: Vec<f64>,
    /// Learning rate for the step-size cumulation path.
    pub c_sigma: f64,
    /// Damping factor for step-size adaptation.
    pub d_sigma: f64,
    /// Learning rate for the covariance cumulation path.
    pub c_c: f64,
    /// Rank-one update learning rate for the covariance matrix.
    pub c_1: f64,
    /// Rank-μ update learning rate for the covariance matrix.
    pub c_mu: f64,
    /// How many generations between eigen-decompositions of `C`.
    pub update_modulus: usize,
    /// Condition-number clip applied to the covariance eigenvalues.
    pub max_condition_number: f64,
    /// Convergence threshold on the per-axis spread `sigma * d_i`.
    pub accuracy_goal: f64,
    /// Hard cap on the number of generations.
    pub stop_generation: usize,
    /// Seed for the deterministic sampling RNG.
    pub random_seed: u64,
    /// Per-axis lower bounds (box constraints).
    pub lower_bounds: Vec<f64>,
    /// Per-axis upper bounds (box constraints).
    pub upper_bounds: Vec<f64>,
}

impl CmaEsConfig {
    /// Start building a configuration for a problem of the given dimension.
    pub fn builder(dimension: usize) -> CmaEsConfigBuilder {
        CmaEsConfigBuilder::new(dimension)
    }

    fn validate(&self) -> Result<(), CmaEsError> {
        if self.dimension == 0 {
            return Err(CmaEsError::InvalidArgument("dimension must be positive".into()));
        }
        if self.parent_number == 0 || self.parent_number > self.population_size {
            return Err(CmaEsError::InvalidArgument(
                "parent_number must be in 1..=population_size".into(),
            ));
        }
        if self.initial_step_size <= 0.0 {
            return Err(CmaEsError::InvalidArgument("initial_step_size must be positive".into()));
        }
        if self.lower_bounds.len() != self.dimension || self.upper_bounds.len() != self.dimension {
            return Err(CmaEsError::InvalidArgument(
                "bounds length must equal dimension".into(),
            ));
        }
        if self.initial_local_step_sizes.len() != self.dimension {
            return Err(CmaEsError::InvalidArgument(
                "initial_local_step_sizes length must equal dimension".into(),
            ));
        }
        if self.initial_local_step_sizes.iter().any(|&d| d <= 0.0) {
            return Err(CmaEsError::InvalidArgument(
                "initial_local_step_sizes entries must be positive".into(),
            ));
        }
        for i in 0..self.dimension {
            if self.lower_bounds[i] >= self.upper_bounds[i] {
                return Err(CmaEsError::InvalidArgument(format!(
                    "lower bound must be < upper bound at axis {i}"
                )));
            }
        }
        Ok(())
    }
}

/// Weight vector and derived constants for the (μ/μ_W, λ) recombination.
#[derive(Debug, Clone)]
pub struct Weights {
    /// Normalized recombination weights, one per parent, descending.
    pub w: Vec<f64>,
    /// Variance effective selection mass μ_eff = (Σw)² / Σw².
    pub mu_eff: f64,
}

impl Weights {
    /// Build the superlinear `ln((μ+½)/i)` weight schedule for `mu` parents.
    pub fn new(mu: usize) -> Self {
        let raw: Vec<f64> = (1..=mu)
            .map(|i| ((mu as f64 + 0.5) / i as f64).ln())
            .collect();
        let sum: f64 = raw.iter().sum();
        let w: Vec<f64> = raw.iter().map(|wi| wi / sum).collect();
        let sum_sq: f64 = w.iter().map(|wi| wi * wi).sum();
        let mu_eff = 1.0 / sum_sq;
        Weights { w, mu_eff }
    }
}

/// Fluent builder for [`CmaEsConfig`], following the population size's
/// standard default schedule unless a field is explicitly overridden.
pub struct CmaEsConfigBuilder {
    dimension: usize,
    parent_number: Option<usize>,
    population_size: Option<usize>,
    initial_step_size: Option<f64>,
    initial_local_step_sizes: Option<Vec<f64>>,
    c_sigma: Option<f64>,
    d_sigma: Option<f64>,
    c_c: Option<f64>,
    c_1: Option<f64>,
    c_mu: Option<f64>,
    update_modulus: Option<usize>,
    max_condition_number: f64,
    accuracy_goal: f64,
    stop_generation: usize,
    random_seed: u64,
    lower_bounds: Option<Vec<f64>>,
    upper_bounds: Option<Vec<f64>>,
}

impl CmaEsConfigBuilder {
    fn new(dimension: usize) -> Self {
        CmaEsConfigBuilder {
            dimension,
            parent_number: None,
            population_size: None,
            initial_step_size: None,
            initial_local_step_sizes: None,
            c_sigma: None,
            d_sigma: None,
            c_c: None,
            c_1: None,
            c_mu: None,
            update_modulus: None,
            max_condition_number: 1.0e14,
            accuracy_goal: 1.0e-4,
            stop_generation: 1000,
            random_seed: 0,
            lower_bounds: None,
            upper_bounds: None,
        }
    }

    /// Override the parent number μ (default: 4).
    pub fn parent_number(mut self, mu: usize) -> Self {
        self.parent_number = Some(mu);
        self
    }

    /// Override the population size λ (default: 2μ).
    pub fn population_size(mut self, lambda: usize) -> Self {
        self.population_size = Some(lambda);
        self
    }

    /// Override the initial global step size σ (default: 1.0).
    pub fn initial_step_size(mut self, step: f64) -> Self {
        self.initial_step_size = Some(step);
        self
    }

    /// Override the initial per-axis step sizes (default: all 1.0). Length
    /// must equal `dimension`.
    pub fn initial_local_step_sizes(mut self, sizes: Vec<f64>) -> Self {
        self.initial_local_step_sizes = Some(sizes);
        self
    }

    /// Override the accuracy goal that terminates the search (default: 1e-4).
    pub fn accuracy_goal(mut self, goal: f64) -> Self {
        self.accuracy_goal = goal;
        self
    }

    /// Override the hard generation cap (default: 1000).
    pub fn stop_generation(mut self, generations: usize) -> Self {
        self.stop_generation = generations;
        self
    }

    /// Override the generations between eigen-decompositions (default: 1).
    pub fn update_modulus(mut self, modulus: usize) -> Self {
        self.update_modulus = Some(modulus);
        self
    }

    /// Seed the deterministic sampling RNG (default: 0).
    pub fn random_seed(mut self, seed: u64) -> Self {
        self.random_seed = seed;
        self
    }

    /// Set box constraints (both bounds vectors must have length `dimension`).
    pub fn bounds(mut self, lower: Vec<f64>, upper: Vec<f64>) -> Self {
        self.lower_bounds = Some(lower);
        self.upper_bounds = Some(upper);
        self
    }

    /// Finalize the configuration, filling in any unset field from the
    /// population-size-derived default schedule, and validate it.
    pub fn build(self) -> Result<CmaEsConfig, CmaEsError> {
        let n = self.dimension as f64;
        let parent_number = self.parent_number.unwrap_or(4);
        let population_size = self.population_size.unwrap_or(2 * parent_number);
        let weights = Weights::new(parent_number);
        let mu_eff = weights.mu_eff;

        let c_sigma = self.c_sigma.unwrap_or((mu_eff + 2.0) / (n + mu_eff + 5.0));
        let d_sigma = self.d_sigma.unwrap_or({
            let tail = (((mu_eff - 1.0) / (n + 1.0)).sqrt() - 1.0).max(0.0);
            1.0 + 2.0 * tail + c_sigma
        });
        let c_c = self.c_c.unwrap_or((4.0 + mu_eff / n) / (n + 4.0 + 2.0 * mu_eff / n));
        let c_1 = self.c_1.unwrap_or(2.0 / ((n + 1.3).powi(2) + mu_eff));
        let c_mu = self.c_mu.unwrap_or(
            (1.0 - c_1).min(2.0 * (mu_eff - 2.0 + 1.0 / mu_eff) / ((n + 2.0).powi(2) + mu_eff)),
        );

        let lower_bounds = self.lower_bounds.unwrap_or_else(|| vec![f64::NEG_INFINITY; self.dimension]);
        let upper_bounds = self.upper_bounds.unwrap_or_else(|| vec![f64::INFINITY; self.dimension]);
        let initial_local_step_sizes = self.initial_local_step_sizes.unwrap_or_else(|| vec![1.0; self.dimension]);

        let config = CmaEsConfig {
            dimension: self.dimension,
            parent_number,
            population_size,
            initial_step_size: self.initial_step_size.unwrap_or(1.0),
            initial_local_step_sizes,
            c_sigma,
            d_sigma,
            c_c,
            c_1,
            c_mu,
            update_modulus: self.update_modulus.unwrap_or(1),
            max_condition_number: self.max_condition_number,
            accuracy_goal: self.accuracy_goal,
            stop_generation: self.stop_generation,
            random_seed: self.random_seed,
            lower_bounds,
            upper_bounds,
        };
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_population_is_twice_parents() {
        let cfg = CmaEsConfig::builder(10)
            .bounds(vec![-5.0; 10], vec![5.0; 10])
            .build()
            .unwrap();
        assert_eq!(cfg.parent_number, 4);
        assert_eq!(cfg.population_size, 8);
    }

    #[test]
    fn weights_sum_to_one() {
        let w = Weights::new(4);
        let sum: f64 = w.w.iter().sum();
        assert!((sum - 1.0).abs() < 1e-12);
        assert!(w.mu_eff > 1.0 && w.mu_eff <= 4.0);
    }

    #[test]
    fn rejects_mismatched_bounds() {
        let err = CmaEsConfig::builder(3).bounds(vec![-1.0; 2], vec![1.0; 2]).build();
        assert!(err.is_err());
    }
}
