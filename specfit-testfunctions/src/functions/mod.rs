//! Test function implementations organized by category
//!
//! - `unimodal`: single-optimum functions used for conditioning and convergence checks.
//! - `multimodal`: functions with several local minima.
//! - individual files for functions that do not fit either family cleanly.

pub mod multimodal;
pub mod unimodal;

mod goldstein_price;
mod gramacy_lee_2012;
mod schwefel;
mod sharp_ridge;

pub use goldstein_price::goldstein_price;
pub use gramacy_lee_2012::gramacy_lee_2012;
pub use multimodal::*;
pub use schwefel::schwefel;
pub use sharp_ridge::sharp_ridge;
pub use unimodal::*;
