use cauchy::Scalar;
use ndarray::{Array2, ArrayBase, Data, Ix2};

use super::ops::{adjoint, multiply};
use crate::error::Result;

/// Sandwich product `lhs · self · rhsᴴ` with shape checking.
///
/// This is the shape of every covariance propagation in a linear filter, for example
/// `A·P·Aᵗ` in prediction or `(I - K·C)·P·(I - K·C)ᵗ` in the Joseph update.
pub trait QuadraticForm<T: Scalar> {
    fn quadratic_form<S1, S2>(
        &self,
        lhs: &ArrayBase<S1, Ix2>,
        rhs: &ArrayBase<S2, Ix2>,
    ) -> Result<Array2<T>>
    where
        S1: Data<Elem = T>,
        S2: Data<Elem = T>;

    /// Congruence transform `outer · self · outerᴴ`
    fn congruence<S>(&self, outer: &ArrayBase<S, Ix2>) -> Result<Array2<T>>
    where
        S: Data<Elem = T>,
    {
        self.quadratic_form(outer, outer)
    }
}

impl<T, S> QuadraticForm<T> for ArrayBase<S, Ix2>
where
    T: Scalar,
    S: Data<Elem = T>,
{
    fn quadratic_form<S1, S2>(
        &self,
        lhs: &ArrayBase<S1, Ix2>,
        rhs: &ArrayBase<S2, Ix2>,
    ) -> Result<Array2<T>>
    where
        S1: Data<Elem = T>,
        S2: Data<Elem = T>,
    {
        let left = multiply(lhs, self)?;
        multiply(&left, &adjoint(rhs))
    }
}
