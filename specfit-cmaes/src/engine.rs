//! The per-generation (μ/μ_W, λ)-CMA-ES algorithm: sample, evaluate, rank,
//! recombine, adapt the covariance matrix and step size, and periodically
//! re-diagonalize.

use log::{debug, trace};
use ndarray::{Array1, Array2};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, StandardNormal};
use rayon::prelude::*;

use crate::config::{CmaEsConfig, Weights};
use crate::decompose::{clip_condition_number, decompose};
use crate::error::CmaEsError;
use crate::state::OptimizationState;

/// Action a tracing callback can request after observing a generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallbackAction {
    /// Keep running.
    Continue,
    /// Stop the search early, as if the generation budget had been reached.
    Stop,
}

/// Snapshot passed to a tracing callback after each generation, matching the
/// `(generation, best_cost, sigma*min(d), sigma*max(d))` quadruple used to
/// monitor convergence.
#[derive(Debug, Clone)]
pub struct CmaEsIntermediate {
    /// Generation index just completed.
    pub generation: usize,
    /// Best objective value seen so far.
    pub best_cost: f64,
    /// Smallest per-axis spread, `sigma * min(d)`.
    pub sigma_min_spread: f64,
    /// Largest per-axis spread, `sigma * max(d)`.
    pub sigma_max_spread: f64,
}

/// Final result of a run.
#[derive(Debug, Clone)]
pub struct CmaEsReport {
    /// Best parameters found.
    pub best_parameters: Array1<f64>,
    /// Objective value at `best_parameters`.
    pub best_cost: f64,
    /// Per-axis uncertainty estimate from the post-optimization bracket search.
    pub uncertainties: Array1<f64>,
    /// Number of generations actually run.
    pub generations: usize,
    /// Whether the fitness ranking degenerated (all candidates tied).
    pub underflow: bool,
    /// Whether the per-axis accuracy goal was reached before `stop_generation`.
    pub converged: bool,
}

struct Candidate {
    z: Array1<f64>,
    x: Array1<f64>,
    cost: f64,
}

/// A configured CMA-ES search over a fixed-dimension objective.
pub struct CmaEs {
    config: CmaEsConfig,
    weights: Weights,
}

impl CmaEs {
    /// Build a search from a validated configuration.
    pub fn new(config: CmaEsConfig) -> Self {
        let weights = Weights::new(config.parent_number);
        CmaEs { config, weights }
    }

    /// Run the search, calling `trace` after every generation.
    ///
    /// `objective` is evaluated once per candidate per generation, in
    /// parallel across the population.
    pub fn minimize<F>(
        &self,
        objective: F,
        initial_mean: Array1<f64>,
        mut trace: impl FnMut(&CmaEsIntermediate) -> CallbackAction,
    ) -> Result<CmaEsReport, CmaEsError>
    where
        F: Fn(&Array1<f64>) -> f64 + Sync,
    {
        let n = self.config.dimension;
        if initial_mean.len() != n {
            return Err(CmaEsError::InvalidArgument(
                "initial_mean length must equal configured dimension".into(),
            ));
        }

        let mut rng = StdRng::seed_from_u64(self.config.random_seed);
        let initial_d = Array1::from(self.config.initial_local_step_sizes.clone());
        let mut state = OptimizationState::new(initial_mean, self.config.initial_step_size, initial_d);
        let expected_norm = (n as f64).sqrt() * (1.0 - 1.0 / (4.0 * n as f64) + 1.0 / (21.0 * n as f64 * n as f64));

        loop {
            let candidates = self.sample_population(&state, &mut rng);
            let mut candidates = self.evaluate(candidates, &objective);
            candidates.sort_by(|a, b| a.cost.partial_cmp(&b.cost).unwrap());

            if candidates.iter().all(|c| c.cost == candidates[0].cost) {
                state.underflow = true;
            }

            if candidates[0].cost < state.best_cost {
                state.best_cost = candidates[0].cost;
                state.best_parameters = candidates[0].x.clone();
            }

            self.recombine_and_adapt(&mut state, &candidates, expected_norm);

            if state.generation % self.config.update_modulus == 0 {
                self.redecompose(&mut state)?;
            }

            state.generation += 1;

            let spread = state.axis_spread();
            let sigma_min_spread = spread.iter().cloned().fold(f64::INFINITY, f64::min);
            let sigma_max_spread = spread.iter().cloned().fold(f64::NEG_INFINITY, f64::max);

            trace!(
                "generation {} best={:.6e} spread=[{:.3e},{:.3e}]",
                state.generation, state.best_cost, sigma_min_spread, sigma_max_spread
            );

            let intermediate = CmaEsIntermediate {
                generation: state.generation,
                best_cost: state.best_cost,
                sigma_min_spread,
                sigma_max_spread,
            };
            let action = trace(&intermediate);

            let kappa_max = self.config.max_condition_number;
            state.optimized = (0..n).all(|i| {
                state.sigma.powi(2) * state.c[[i, i]]
                    < (self.config.accuracy_goal * state.xw[i]).powi(2) + 1.0 / kappa_max
            });

            if state.optimized || state.underflow || action == CallbackAction::Stop
                || state.generation >= self.config.stop_generation
            {
                break;
            }
        }

        debug!(
            "finished after {} generations, best_cost={:.6e}, converged={}, underflow={}",
            state.generation, state.best_cost, state.optimized, state.underflow
        );

        let uncertainties = self.estimate_uncertainties(&state, &objective);

        Ok(CmaEsReport {
            best_parameters: state.best_parameters,
            best_cost: state.best_cost,
            uncertainties,
            generations: state.generation,
            underflow: state.underflow,
            converged: state.optimized,
        })
    }

    fn sample_population(&self, state: &OptimizationState, rng: &mut StdRng) -> Vec<Candidate> {
        let n = self.config.dimension;
        (0..self.config.population_size)
            .map(|_| {
                let mut z = Array1::<f64>::zeros(n);
                for axis in 0..n {
                    let mut attempts = 0;
                    loop {
                        z[axis] = StandardNormal.sample(rng);
                        let y = state.b.dot(&(&state.d * &z));
                        let candidate_axis = state.xw[axis] + state.sigma * y[axis];
                        attempts += 1;
                        if (candidate_axis >= self.config.lower_bounds[axis]
                            && candidate_axis <= self.config.upper_bounds[axis])
                            || attempts >= 100
                        {
                            break;
                        }
                    }
                }
                let y = state.b.dot(&(&state.d * &z));
                let mut x = &state.xw + state.sigma * &y;
                for axis in 0..n {
                    x[axis] = x[axis].clamp(self.config.lower_bounds[axis], self.config.upper_bounds[axis]);
                }
                Candidate { z, x, cost: f64::INFINITY }
            })
            .collect()
    }

    fn evaluate<F>(&self, mut candidates: Vec<Candidate>, objective: &F) -> Vec<Candidate>
    where
        F: Fn(&Array1<f64>) -> f64 + Sync,
    {
        candidates.par_iter_mut().for_each(|c| {
            c.cost = objective(&c.x);
        });
        candidates
    }

    fn recombine_and_adapt(&self, state: &mut OptimizationState, ranked: &[Candidate], expected_norm: f64) {
        let n = self.config.dimension;
        let mu = self.config.parent_number;
        let cfg = &self.config;

        let mut xw_new = Array1::<f64>::zeros(n);
        let mut z_w = Array1::<f64>::zeros(n);
        for i in 0..mu {
            let wi = self.weights.w[i];
            xw_new = xw_new + wi * &ranked[i].x;
            z_w = z_w + wi * &ranked[i].z;
        }

        let mu_eff = self.weights.mu_eff;

        let p_sigma_new = (1.0 - cfg.c_sigma) * &state.p_sigma
            + (cfg.c_sigma * (2.0 - cfg.c_sigma) * mu_eff).sqrt() * state.b.dot(&z_w);
        let p_sigma_norm = p_sigma_new.dot(&p_sigma_new).sqrt();

        let h_sigma_threshold = (1.4 + 2.0 / (n as f64 + 1.0)) * expected_norm;
        let normalization = (1.0 - (1.0 - cfg.c_sigma).powi(2 * (state.generation as i32 + 1))).sqrt();
        let h_sigma = if normalization > 0.0 && p_sigma_norm / normalization < h_sigma_threshold { 1.0 } else { 0.0 };

        let y_w = (&xw_new - &state.xw) / state.sigma;
        let p_c_new = (1.0 - cfg.c_c) * &state.p_c
            + h_sigma * (cfg.c_c * (2.0 - cfg.c_c) * mu_eff).sqrt() * &y_w;

        let delta_h_sigma = (1.0 - h_sigma) * cfg.c_c * (2.0 - cfg.c_c);
        let mut c_new = (1.0 - cfg.c_1 - cfg.c_mu + cfg.c_1 * delta_h_sigma) * &state.c;
        c_new = c_new + cfg.c_1 * outer(&p_c_new, &p_c_new);
        for i in 0..mu {
            let wi = self.weights.w[i];
            let y_i = (&ranked[i].x - &state.xw) / state.sigma;
            c_new = c_new + cfg.c_mu * wi * outer(&y_i, &y_i);
        }

        state.sigma *= ((cfg.c_sigma / cfg.d_sigma) * (p_sigma_norm / expected_norm - 1.0)).exp();
        state.xw = xw_new;
        state.p_sigma = p_sigma_new;
        state.p_c = p_c_new;
        state.c = c_new;
    }

    fn redecompose(&self, state: &mut OptimizationState) -> Result<(), CmaEsError> {
        let symmetric = 0.5 * (&state.c + &state.c.t());
        let (b, mut w) = decompose(&symmetric)?;
        let t = clip_condition_number(&mut w, self.config.max_condition_number);
        if t > 0.0 {
            let n = self.config.dimension;
            for i in 0..n {
                state.c[[i, i]] += t;
            }
        }
        state.d = w.mapv(f64::sqrt);
        state.b = b;
        Ok(())
    }

    /// Post-optimization uncertainty estimate: probes each principal axis of
    /// the covariance ellipsoid with a parabola-fitting bracket search to
    /// find the rescaled step size `g_j` that reproduces a unit cost
    /// increase, takes the geometric mean `h` of the per-axis rescalings,
    /// and reports `h * sqrt(C_ii)` per original parameter.
    fn estimate_uncertainties<F>(&self, state: &OptimizationState, objective: &F) -> Array1<f64>
    where
        F: Fn(&Array1<f64>) -> f64 + Sync,
    {
        const MAX_ITERATIONS: usize = 200;
        let n = self.config.dimension;
        let x = &state.best_parameters;
        let zx = objective(x);

        let mut log_g_sum = 0.0;
        for j in 0..n {
            let direction: Array1<f64> = state.b.column(j).to_owned() * state.d[j];

            let mut a = 0.0_f64;
            let mut b = 0.0_f64;
            let mut c = state.sigma;
            let mut g_j = c;

            for _ in 0..MAX_ITERATIONS {
                let p = x + c * &direction;
                let q = x - c * &direction;
                let zp = objective(&p);
                let zq = objective(&q);

                g_j = c / ((zp + zq - 2.0 * zx).abs().sqrt()).max(f64::EPSILON);

                if (0.5 * (zp + zq) - zx).abs() < 0.5 {
                    a = c;
                    c *= 1.618;
                } else {
                    b = c;
                    c *= 0.618;
                }

                if a != 0.0 && b != 0.0 {
                    break;
                }
            }
            log_g_sum += g_j.ln();
        }

        let h = (log_g_sum / n as f64).exp();
        Array1::from_iter((0..n).map(|i| h * state.c[[i, i]].sqrt()))
    }
}

fn outer(a: &Array1<f64>, b: &Array1<f64>) -> Array2<f64> {
    let n = a.len();
    Array2::from_shape_fn((n, n), |(i, j)| a[i] * b[j])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CmaEsConfig;
    use specfit_testfunctions::{rosenbrock, sphere};

    #[test]
    fn converges_on_sphere() {
        let n = 10;
        let config = CmaEsConfig::builder(n)
            .bounds(vec![-5.0; n], vec![5.0; n])
            .random_seed(42)
            .build()
            .unwrap();
        let cma = CmaEs::new(config);
        let initial = Array1::from_elem(n, 3.0);
        let report = cma
            .minimize(|x| sphere(x), initial, |_| CallbackAction::Continue)
            .unwrap();
        assert!(report.best_cost < 1e-6, "best_cost={}", report.best_cost);
    }

    #[test]
    fn makes_progress_on_rosenbrock() {
        let n = 10;
        let config = CmaEsConfig::builder(n)
            .bounds(vec![-2.048; n], vec![2.048; n])
            .random_seed(7)
            .stop_generation(2000)
            .build()
            .unwrap();
        let cma = CmaEs::new(config);
        let initial = Array1::from_elem(n, -1.0);
        let report = cma
            .minimize(|x| rosenbrock(x), initial, |_| CallbackAction::Continue)
            .unwrap();
        assert!(report.best_cost < 1.0, "best_cost={}", report.best_cost);
    }

    #[test]
    fn sphere_converges_from_the_reference_seed() {
        let n = 10;
        let config = CmaEsConfig::builder(n)
            .bounds(vec![-5.0; n], vec![5.0; n])
            .initial_step_size(1.0)
            .accuracy_goal(1e-6)
            .stop_generation(800)
            .random_seed(31415)
            .build()
            .unwrap();
        let cma = CmaEs::new(config);
        let initial = Array1::from_elem(n, 1.0);
        let report = cma
            .minimize(|x| sphere(x), initial, |_| CallbackAction::Continue)
            .unwrap();
        assert!(report.converged, "expected convergence within the generation budget");
        assert!(report.best_cost < 1e-10, "best_cost={}", report.best_cost);
        assert!(report.best_parameters.iter().all(|v| v.abs() < 1e-6));
    }

    #[test]
    fn rosenbrock_reaches_the_optimum_from_the_reference_seed() {
        let n = 10;
        let config = CmaEsConfig::builder(n)
            .bounds(vec![-2.048; n], vec![2.048; n])
            .initial_step_size(0.1)
            .accuracy_goal(1e-6)
            .stop_generation(800)
            .random_seed(31415)
            .build()
            .unwrap();
        let cma = CmaEs::new(config);
        let initial = Array1::from_elem(n, 0.0);
        let report = cma
            .minimize(|x| rosenbrock(x), initial, |_| CallbackAction::Continue)
            .unwrap();
        let max_dev = report.best_parameters.iter().map(|v| (v - 1.0).abs()).fold(0.0_f64, f64::max);
        assert!(max_dev < 1e-6, "max deviation from the optimum: {max_dev}");
    }

    #[test]
    fn uncertainties_are_finite_and_positive() {
        let n = 5;
        let config = CmaEsConfig::builder(n)
            .bounds(vec![-5.0; n], vec![5.0; n])
            .random_seed(99)
            .stop_generation(200)
            .build()
            .unwrap();
        let cma = CmaEs::new(config);
        let initial = Array1::from_elem(n, 2.0);
        let report = cma
            .minimize(|x| sphere(x), initial, |_| CallbackAction::Continue)
            .unwrap();
        assert_eq!(report.uncertainties.len(), n);
        assert!(report.uncertainties.iter().all(|u| u.is_finite() && *u > 0.0));
    }

    #[test]
    fn same_seed_reproduces_the_same_run() {
        let n = 6;
        let build = || {
            let config = CmaEsConfig::builder(n)
                .bounds(vec![-5.0; n], vec![5.0; n])
                .random_seed(123)
                .stop_generation(50)
                .build()
                .unwrap();
            CmaEs::new(config)
        };
        let initial = Array1::from_elem(n, 2.0);

        let report_a = build().minimize(|x| sphere(x), initial.clone(), |_| CallbackAction::Continue).unwrap();
        let report_b = build().minimize(|x| sphere(x), initial, |_| CallbackAction::Continue).unwrap();

        assert_eq!(report_a.generations, report_b.generations);
        assert_eq!(report_a.best_cost, report_b.best_cost);
        assert_eq!(report_a.best_parameters, report_b.best_parameters);
    }
}
