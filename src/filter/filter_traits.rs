//! Traits representing the filtering algorithms

use cauchy::Scalar;
use ndarray::{ArrayBase, Data, Ix2};

use crate::error::Result;

/// Lifecycle of a recursive filter.
///
/// A filter starts `Uninitialized`, becomes `Updated` once it receives its initial estimate
/// (which is treated as the posterior at time zero) and then alternates between `Predicted` and
/// `Updated` for every discrete time step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterPhase {
    Uninitialized,
    Predicted,
    Updated,
}

/// Filtering algorithm trait
///
/// This trait indicates that implementor is a representation of a recursive filtering algorithm
/// working on numbers of type `T: Scalar`, split into a prediction and an update step. Inputs and
/// measurements are column vectors, represented as two-dimensional arrays with a single column.
pub trait Filter<T: Scalar> {
    /// Result of a successful update
    type Update;

    /// Propagates the current estimate one time step forward using the control `input`.
    ///
    /// Prediction never consults a measurement. It is only valid right after an update (or the
    /// initialization), otherwise `FilterError::InvalidState` is returned.
    fn predict<S: Data<Elem = T>>(&mut self, input: &ArrayBase<S, Ix2>) -> Result<()>;

    /// Corrects the predicted estimate with `measurement`.
    ///
    /// Only valid right after a prediction. On failure the filter stays in
    /// `FilterPhase::Predicted` with the predicted estimate intact.
    fn update<S: Data<Elem = T>>(&mut self, measurement: &ArrayBase<S, Ix2>)
        -> Result<Self::Update>;

    fn phase(&self) -> FilterPhase;
}
