//! Error taxonomy for the optimizer crate.

use thiserror::Error;

use crate::decompose::DecomposeError;

/// Failure modes the optimizer can report.
///
/// Underflow and budget exhaustion are not modeled as hard errors: a caller
/// that wants a best-effort answer should inspect [`crate::CmaEsReport`]
/// instead of treating every non-convergence as exceptional.
#[derive(Debug, Error)]
pub enum CmaEsError {
    /// A configuration value was out of its valid domain.
    #[error("invalid configuration: {0}")]
    InvalidArgument(String),

    /// The eigen-decomposition of the covariance matrix failed.
    #[error("numerical failure during covariance eigen-decomposition: {0}")]
    NumericalFailure(#[from] DecomposeError),
}
