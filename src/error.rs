//! Error taxonomy shared by the matrix primitives, the filter and the simulation harness.
use thiserror::Error;

use crate::filter::FilterPhase;

/// Errors produced while configuring or running a filter.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FilterError {
    /// Configuration is rejected before any step runs.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Shapes of operands are incompatible. Shapes are given as `(rows, cols)`.
    #[error("Dimension mismatch in {operation}: {lhs:?} and {rhs:?}")]
    DimensionMismatch {
        operation: &'static str,
        lhs: (usize, usize),
        rhs: (usize, usize),
    },

    #[error("Matrix is singular within tolerance")]
    SingularMatrix,

    /// Innovation covariance could not be inverted. The filter stays in `Predicted`.
    #[error("Innovation covariance is singular within tolerance")]
    SingularInnovationCovariance,

    /// Operation invoked out of the `predict`/`update` sequence, or with an invalid covariance.
    #[error("Operation `{operation}` rejected in phase {phase:?}: {reason}")]
    InvalidState {
        operation: &'static str,
        phase: FilterPhase,
        reason: &'static str,
    },
}

/// Result type used throughout the crate
pub type Result<T> = std::result::Result<T, FilterError>;
