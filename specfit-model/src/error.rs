//! Error taxonomy for model parsing, evaluation, and optimisation, and the
//! exit-code mapping the CLI driver uses to report them.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("invalid model: {0}")]
    InvalidModel(String),

    #[error("I/O failure: {0}")]
    IoFailure(#[from] std::io::Error),

    #[error("numerical failure: {0}")]
    NumericalFailure(String),

    #[error("mutation variance underflow at generation {generation}")]
    OptimizationUnderflow { generation: usize },

    #[error("optimisation budget exhausted after {generations} generations without convergence")]
    OptimizationIncomplete { generations: usize },
}

pub type ModelResult<T> = Result<T, ModelError>;

impl From<specfit_cmaes::CmaEsError> for ModelError {
    fn from(err: specfit_cmaes::CmaEsError) -> Self {
        ModelError::NumericalFailure(err.to_string())
    }
}

/// Process exit codes, matching the convention shared by every CLI front-end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    Completed = 0,
    Underflow = 1,
    Stopped = 2,
    LogicError = 8,
    RuntimeError = 16,
    Unspecified = 64,
}

impl ExitCode {
    pub fn code(self) -> i32 {
        self as i32
    }
}

impl From<&ModelError> for ExitCode {
    fn from(err: &ModelError) -> Self {
        match err {
            ModelError::InvalidArgument(_) => ExitCode::LogicError,
            ModelError::InvalidModel(_) => ExitCode::LogicError,
            ModelError::IoFailure(_) => ExitCode::RuntimeError,
            ModelError::NumericalFailure(_) => ExitCode::RuntimeError,
            ModelError::OptimizationUnderflow { .. } => ExitCode::Underflow,
            ModelError::OptimizationIncomplete { .. } => ExitCode::Stopped,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_model_maps_to_logic_error() {
        let err = ModelError::InvalidModel("duplicate section id".into());
        assert_eq!(ExitCode::from(&err), ExitCode::LogicError);
        assert_eq!(ExitCode::from(&err).code(), 8);
    }

    #[test]
    fn underflow_maps_to_exit_code_one() {
        let err = ModelError::OptimizationUnderflow { generation: 12 };
        assert_eq!(ExitCode::from(&err).code(), 1);
    }

    #[test]
    fn incomplete_maps_to_exit_code_two() {
        let err = ModelError::OptimizationIncomplete { generations: 1000 };
        assert_eq!(ExitCode::from(&err).code(), 2);
    }
}
