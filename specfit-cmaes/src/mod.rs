//! Covariance matrix adaptation evolution strategy (CMA-ES).
//!
//! A derandomized, rank-based evolution strategy for continuous,
//! box-constrained parameter estimation. Each generation samples a
//! population around a mean, ranks candidates by an objective function,
//! recombines the best into a new mean, and adapts both a global step size
//! and the full covariance matrix of the search distribution so subsequent
//! generations sample along the directions that have paid off.
//!
//! # Example
//!
//! ```rust
//! use ndarray::Array1;
//! use specfit_cmaes::{CallbackAction, CmaEs, CmaEsConfig};
//!
//! let n = 5;
//! let config = CmaEsConfig::builder(n)
//!     .bounds(vec![-5.0; n], vec![5.0; n])
//!     .random_seed(1)
//!     .build()
//!     .unwrap();
//! let cma = CmaEs::new(config);
//! let initial = Array1::from_elem(n, 2.0);
//! let report = cma
//!     .minimize(|x| x.iter().map(|v| v * v).sum(), initial, |_| CallbackAction::Continue)
//!     .unwrap();
//! assert!(report.best_cost < 1e-3);
//! ```

mod config;
mod decompose;
mod engine;
mod error;
pub mod rng;
mod state;

pub use config::{CmaEsConfig, CmaEsConfigBuilder, Weights};
pub use decompose::{clip_condition_number, decompose as eigendecompose, DecomposeError};
pub use engine::{CallbackAction, CmaEs, CmaEsIntermediate, CmaEsReport};
pub use error::CmaEsError;
pub use rng::{Mt19937_32, Mt19937_64, Pcg32};
pub use state::OptimizationState;
