//! Constant-acceleration model of a one-dimensional kinematic object.
//!
//! The state is `[position, velocity]`, the single input is the commanded acceleration and the
//! single measurement is the position. This is the only part of the crate that knows about the
//! concrete physical model, everything downstream works with the generic matrices.
use ndarray::{arr2, Array2};

use crate::error::{FilterError, Result};

pub const STATE_DIM: usize = 2;
pub const INPUT_DIM: usize = 1;
pub const MEASUREMENT_DIM: usize = 1;

/// Time-invariant system matrices and noise covariances, derived once from physical parameters
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessModel {
    time_step: f64,
    position_noise: f64,
    accel_noise: f64,
    transition_matrix: Array2<f64>,
    input_matrix: Array2<f64>,
    observation_matrix: Array2<f64>,
    transition_covariance: Array2<f64>,
    observation_covariance: Array2<f64>,
}

impl ProcessModel {
    /// Builds the model for time step `time_step` (seconds), measurement noise standard
    /// deviation `position_noise` and acceleration noise standard deviation `accel_noise`.
    ///
    /// ```
    /// use rudolf_tracker::model::ProcessModel;
    /// let model = ProcessModel::new(1.0, 10.0, 0.2).unwrap();
    /// assert_eq!(model.observation_covariance()[[0, 0]], 100.0);
    /// assert_eq!(model.transition_matrix()[[0, 1]], 1.0);
    /// ```
    ///
    /// Fails with `InvalidConfig` if the time step is not strictly positive or either noise
    /// parameter is negative.
    pub fn new(time_step: f64, position_noise: f64, accel_noise: f64) -> Result<Self> {
        if !(time_step > 0.0) || !time_step.is_finite() {
            return Err(FilterError::InvalidConfig(format!(
                "time step must be positive and finite, got {}",
                time_step
            )));
        }
        if !(position_noise >= 0.0) || !position_noise.is_finite() {
            return Err(FilterError::InvalidConfig(format!(
                "position noise must be non-negative, got {}",
                position_noise
            )));
        }
        if !(accel_noise >= 0.0) || !accel_noise.is_finite() {
            return Err(FilterError::InvalidConfig(format!(
                "acceleration noise must be non-negative, got {}",
                accel_noise
            )));
        }

        let t = time_step;
        let accel_variance = accel_noise.powi(2);
        Ok(ProcessModel {
            time_step,
            position_noise,
            accel_noise,
            transition_matrix: arr2(&[[1.0, t], [0.0, 1.0]]),
            input_matrix: arr2(&[[t.powi(2) / 2.0], [t]]),
            observation_matrix: arr2(&[[1.0, 0.0]]),
            transition_covariance: arr2(&[
                [t.powi(4) / 4.0, t.powi(3) / 2.0],
                [t.powi(3) / 2.0, t.powi(2)],
            ])
            .mapv(|elem| elem * accel_variance),
            observation_covariance: arr2(&[[position_noise.powi(2)]]),
        })
    }

    pub fn time_step(&self) -> f64 {
        self.time_step
    }

    pub fn position_noise(&self) -> f64 {
        self.position_noise
    }

    pub fn accel_noise(&self) -> f64 {
        self.accel_noise
    }

    /// `A = [[1, T], [0, 1]]`
    pub fn transition_matrix(&self) -> &Array2<f64> {
        &self.transition_matrix
    }

    /// `B = [[T²/2], [T]]`
    pub fn input_matrix(&self) -> &Array2<f64> {
        &self.input_matrix
    }

    /// `C = [[1, 0]]`
    pub fn observation_matrix(&self) -> &Array2<f64> {
        &self.observation_matrix
    }

    /// Process noise covariance `Q`
    pub fn transition_covariance(&self) -> &Array2<f64> {
        &self.transition_covariance
    }

    /// Measurement noise covariance `R`, a `1 x 1` matrix
    pub fn observation_covariance(&self) -> &Array2<f64> {
        &self.observation_covariance
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrix::{is_positive_semidefinite, DEFAULT_TOLERANCE};
    use approx::assert_abs_diff_eq;

    #[test]
    fn matrices_follow_time_step() {
        let model = ProcessModel::new(0.5, 10.0, 0.2).unwrap();
        assert_eq!(model.transition_matrix(), &arr2(&[[1.0, 0.5], [0.0, 1.0]]));
        assert_eq!(model.input_matrix(), &arr2(&[[0.125], [0.5]]));
        assert_eq!(model.observation_matrix(), &arr2(&[[1.0, 0.0]]));
        assert_abs_diff_eq!(model.observation_covariance()[[0, 0]], 100.0);
    }

    #[test]
    fn process_noise_covariance_matches_acceleration_noise() {
        let model = ProcessModel::new(1.0, 10.0, 0.2).unwrap();
        let q = model.transition_covariance();
        assert_abs_diff_eq!(q[[0, 0]], 0.01, epsilon = 1e-15);
        assert_abs_diff_eq!(q[[0, 1]], 0.02, epsilon = 1e-15);
        assert_abs_diff_eq!(q[[1, 0]], 0.02, epsilon = 1e-15);
        assert_abs_diff_eq!(q[[1, 1]], 0.04, epsilon = 1e-15);
        assert!(is_positive_semidefinite(q, DEFAULT_TOLERANCE));
    }

    #[test]
    fn dimensions_of_matrices() {
        let model = ProcessModel::new(2.0, 1.0, 1.0).unwrap();
        assert_eq!(model.transition_matrix().dim(), (STATE_DIM, STATE_DIM));
        assert_eq!(model.input_matrix().dim(), (STATE_DIM, INPUT_DIM));
        assert_eq!(model.observation_matrix().dim(), (MEASUREMENT_DIM, STATE_DIM));
        assert_eq!(model.observation_covariance().dim(), (MEASUREMENT_DIM, MEASUREMENT_DIM));
    }

    #[test]
    fn invalid_parameters_are_rejected() {
        assert!(matches!(
            ProcessModel::new(0.0, 1.0, 1.0),
            Err(FilterError::InvalidConfig(_))
        ));
        assert!(matches!(
            ProcessModel::new(-1.0, 1.0, 1.0),
            Err(FilterError::InvalidConfig(_))
        ));
        assert!(matches!(
            ProcessModel::new(1.0, -0.1, 1.0),
            Err(FilterError::InvalidConfig(_))
        ));
        assert!(matches!(
            ProcessModel::new(1.0, 1.0, -0.1),
            Err(FilterError::InvalidConfig(_))
        ));
        assert!(ProcessModel::new(1.0, 0.0, 0.0).is_ok());
    }
}
