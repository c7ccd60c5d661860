use cauchy::Scalar;
use ndarray::{Array2, ArrayBase, Data, Ix2};
use ndarray_linalg::Lapack;

use crate::error::{FilterError, Result};
use crate::matrix::{
    add, adjoint, identity, invert, largest_magnitude, multiply, subtract, symmetrize,
    QuadraticForm,
};

/// Innovation `y - C·x`, the part of the measurement the prediction does not explain
pub(in crate) fn innovation<T, S1, S2, S3>(
    measurement: &ArrayBase<S1, Ix2>,
    observation_matrix: &ArrayBase<S2, Ix2>,
    predicted_state: &ArrayBase<S3, Ix2>,
) -> Result<Array2<T>>
where
    T: Scalar,
    S1: Data<Elem = T>,
    S2: Data<Elem = T>,
    S3: Data<Elem = T>,
{
    let expected_measurement = multiply(observation_matrix, predicted_state)?;
    subtract(measurement, &expected_measurement)
}

/// Cross covariance `L = P·Cᴴ` between state and measurement
pub(in crate) fn l_matrix<T, S1, S2>(
    covariance: &ArrayBase<S1, Ix2>,
    observation_matrix: &ArrayBase<S2, Ix2>,
) -> Result<Array2<T>>
where
    T: Scalar,
    S1: Data<Elem = T>,
    S2: Data<Elem = T>,
{
    multiply(covariance, &adjoint(observation_matrix))
}

/// Innovation covariance `S = C·L + R`
pub(in crate) fn innovation_covariance<T, S1, S2>(
    observation_matrix: &ArrayBase<S1, Ix2>,
    observation_covariance: &ArrayBase<S2, Ix2>,
    l_matrix: &Array2<T>,
) -> Result<Array2<T>>
where
    T: Scalar,
    S1: Data<Elem = T>,
    S2: Data<Elem = T>,
{
    let projected = multiply(observation_matrix, l_matrix)?;
    symmetrize(&add(&projected, observation_covariance)?)
}

/// Kalman gain `K = L·S⁻¹`.
///
/// `S` counts as singular when it vanishes relative to the terms `C·P·Cᴴ` and `R` it is made of,
/// or when it is ill-conditioned beyond `tolerance`. Small noise levels alone never make it
/// singular, only an exactly vanishing or degenerate innovation covariance does.
pub(in crate) fn kalman_gain<T, S>(
    l_matrix: &Array2<T>,
    innovation_covariance: &Array2<T>,
    observation_covariance: &ArrayBase<S, Ix2>,
    tolerance: T::Real,
) -> Result<Array2<T>>
where
    T: Scalar + Lapack,
    S: Data<Elem = T>,
{
    let projected = subtract(innovation_covariance, observation_covariance)?;
    let projected_magnitude = largest_magnitude(&projected);
    let noise_magnitude = largest_magnitude(observation_covariance);
    let reference = if projected_magnitude > noise_magnitude {
        projected_magnitude
    } else {
        noise_magnitude
    };
    if !(largest_magnitude(innovation_covariance) > tolerance * reference) {
        return Err(FilterError::SingularInnovationCovariance);
    }

    let inverse = invert(innovation_covariance, tolerance).map_err(|err| match err {
        FilterError::SingularMatrix => FilterError::SingularInnovationCovariance,
        other => other,
    })?;
    multiply(l_matrix, &inverse)
}

/// Posterior estimate `x + K·e`
pub(in crate) fn update_state<T, S>(
    predicted_state: &ArrayBase<S, Ix2>,
    kalman_gain: &Array2<T>,
    innovation: &Array2<T>,
) -> Result<Array2<T>>
where
    T: Scalar,
    S: Data<Elem = T>,
{
    add(predicted_state, &multiply(kalman_gain, innovation)?)
}

/// Posterior covariance in Joseph form, `(I - K·C)·P·(I - K·C)ᴴ + K·R·Kᴴ`.
///
/// The result is symmetric and positive semi-definite under rounding, unlike `(I - K·C)·P`.
/// The final symmetrization removes the last round-off asymmetry.
pub(in crate) fn update_covariance<T, S1, S2, S3>(
    predicted_covariance: &ArrayBase<S1, Ix2>,
    kalman_gain: &Array2<T>,
    observation_matrix: &ArrayBase<S2, Ix2>,
    observation_covariance: &ArrayBase<S3, Ix2>,
) -> Result<Array2<T>>
where
    T: Scalar,
    S1: Data<Elem = T>,
    S2: Data<Elem = T>,
    S3: Data<Elem = T>,
{
    let state_dim = predicted_covariance.dim().0;
    let correction = subtract(
        &identity::<T>(state_dim),
        &multiply(kalman_gain, observation_matrix)?,
    )?;
    let propagated = predicted_covariance.congruence(&correction)?;
    let measurement_part = observation_covariance.congruence(kalman_gain)?;
    symmetrize(&add(&propagated, &measurement_part)?)
}
