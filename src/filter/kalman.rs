//! This module contains the implementation of the linear Kalman filtering algorithm for a single
//! tracked object whose state is propagated in place.
use super::filter_traits::{Filter, FilterPhase};
use super::kalman_common::*;
use crate::error::{FilterError, Result};
use crate::matrix::{
    add, check_shape, check_square, is_positive_semidefinite, multiply, symmetrize,
    QuadraticForm, DEFAULT_TOLERANCE,
};
use crate::model::ProcessModel;
use cauchy::Scalar;
use ndarray_linalg::Lapack;
use log::{debug, warn};
use ndarray::{Array2, ArrayBase, ArrayView2, Data, Ix2};

/// Basic linear Kalman filtering algorithm
///
/// This type encapsulates the discrete-time linear Kalman filter for the system
///
/// * `x(k+1) = A·x(k) + B·u(k) + w(k)`, `w ~ N(0, Q)`
/// * `y(k) = C·x(k) + z(k)`, `z ~ N(0, R)`
///
/// with `n` states, `m` inputs and `r` measurements. The five operational matrices are fixed for
/// the lifetime of the filter. Estimate and covariance are owned by the filter and mutated in
/// place by `predict` and `update`, which have to be called alternately, starting after `init`.
///
/// Type parameter `T: Scalar` is used to indicate that Kalman filter can contain any matrices,
/// which are considered to contain numbers ( i.e real or complex numbers ).
#[derive(Debug, Clone)]
pub struct KalmanFilter<T: Scalar + Lapack> {
    transition_matrix: Array2<T>,
    control_matrix: Array2<T>,
    observation_matrix: Array2<T>,
    transition_covariance: Array2<T>,
    observation_covariance: Array2<T>,
    tolerance: T::Real,
    phase: FilterPhase,
    estimate: Array2<T>,
    covariance: Array2<T>,
}

/// Transient quantities of a single update. The gain is recomputed on every step and is not
/// retained by the filter.
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateSummary<T: Scalar> {
    /// `e = y - C·x⁻`
    pub innovation: Array2<T>,
    /// `S = C·P⁻·Cᴴ + R`
    pub innovation_covariance: Array2<T>,
    /// `K = P⁻·Cᴴ·S⁻¹`
    pub gain: Array2<T>,
}

impl<T: Scalar + Lapack> Filter<T> for KalmanFilter<T> {
    type Update = UpdateSummary<T>;

    /// Computes `x⁻ = A·x + B·u` and `P⁻ = A·P·Aᴴ + Q`
    fn predict<S: Data<Elem = T>>(&mut self, input: &ArrayBase<S, Ix2>) -> Result<()> {
        self.require_phase("predict", FilterPhase::Updated, "an updated estimate is required")?;
        check_shape("predict", input, (self.control_matrix.dim().1, 1))?;

        let propagated_state = multiply(&self.transition_matrix, &self.estimate)?;
        let predicted_state = add(&propagated_state, &multiply(&self.control_matrix, input)?)?;
        let propagated_covariance = self.covariance.congruence(&self.transition_matrix)?;
        let predicted_covariance =
            symmetrize(&add(&propagated_covariance, &self.transition_covariance)?)?;

        debug!(
            "predicted state {:?} with covariance {:?}",
            predicted_state.as_slice(),
            predicted_covariance.as_slice()
        );
        self.estimate = predicted_state;
        self.covariance = predicted_covariance;
        self.phase = FilterPhase::Predicted;
        Ok(())
    }

    /// Computes the innovation, gain and posterior in Joseph form. If the innovation covariance
    /// is singular the filter is left in `Predicted` and the measurement may be retried or
    /// skipped with `skip_update`.
    fn update<S: Data<Elem = T>>(
        &mut self,
        measurement: &ArrayBase<S, Ix2>,
    ) -> Result<UpdateSummary<T>> {
        self.require_phase("update", FilterPhase::Predicted, "a prediction is required")?;
        check_shape("update", measurement, (self.observation_matrix.dim().0, 1))?;

        let innovation = innovation(measurement, &self.observation_matrix, &self.estimate)?;
        let l_matrix = l_matrix(&self.covariance, &self.observation_matrix)?;
        let innovation_covariance = innovation_covariance(
            &self.observation_matrix,
            &self.observation_covariance,
            &l_matrix,
        )?;
        let gain = match kalman_gain(
            &l_matrix,
            &innovation_covariance,
            &self.observation_covariance,
            self.tolerance,
        ) {
            Ok(gain) => gain,
            Err(err) => {
                warn!(
                    "rejecting measurement {:?}: innovation covariance {:?} is singular",
                    measurement.as_slice(),
                    innovation_covariance.as_slice()
                );
                return Err(err);
            }
        };
        let updated_state = update_state(&self.estimate, &gain, &innovation)?;
        let updated_covariance = update_covariance(
            &self.covariance,
            &gain,
            &self.observation_matrix,
            &self.observation_covariance,
        )?;

        debug!(
            "innovation {:?}, gain {:?}, updated state {:?}",
            innovation.as_slice(),
            gain.as_slice(),
            updated_state.as_slice()
        );
        self.estimate = updated_state;
        self.covariance = updated_covariance;
        self.phase = FilterPhase::Updated;
        Ok(UpdateSummary {
            innovation,
            innovation_covariance,
            gain,
        })
    }

    fn phase(&self) -> FilterPhase {
        self.phase
    }
}

impl<T: Scalar + Lapack> KalmanFilter<T> {
    /// Creates new Kalman filter with given matrices
    ///
    /// This constructor expects following conditions to hold for `n` states, `m` inputs and
    /// `r` measurements:
    /// * transition matrix and transition covariance are `n x n`
    /// * control matrix has `n` rows
    /// * observation matrix is `r x n`
    /// * observation covariance is `r x r`
    ///
    /// If any of the conditions is not upheld, then `FilterError::DimensionMismatch` is returned,
    /// otherwise an uninitialized Kalman filter is returned.
    pub fn new<S1, S2, S3, S4, S5>(
        transition_matrix: &ArrayBase<S1, Ix2>,
        control_matrix: &ArrayBase<S2, Ix2>,
        observation_matrix: &ArrayBase<S3, Ix2>,
        transition_covariance: &ArrayBase<S4, Ix2>,
        observation_covariance: &ArrayBase<S5, Ix2>,
    ) -> Result<KalmanFilter<T>>
    where
        S1: Data<Elem = T>,
        S2: Data<Elem = T>,
        S3: Data<Elem = T>,
        S4: Data<Elem = T>,
        S5: Data<Elem = T>,
    {
        check_square("transition matrix", transition_matrix)?;
        let state_dim = transition_matrix.dim().0;
        let input_dim = control_matrix.dim().1;
        let measurement_dim = observation_matrix.dim().0;

        check_shape("control matrix", control_matrix, (state_dim, input_dim))?;
        check_shape(
            "observation matrix",
            observation_matrix,
            (measurement_dim, state_dim),
        )?;
        check_shape(
            "transition covariance",
            transition_covariance,
            (state_dim, state_dim),
        )?;
        check_shape(
            "observation covariance",
            observation_covariance,
            (measurement_dim, measurement_dim),
        )?;

        Ok(KalmanFilter {
            transition_matrix: transition_matrix.to_owned(),
            control_matrix: control_matrix.to_owned(),
            observation_matrix: observation_matrix.to_owned(),
            transition_covariance: transition_covariance.to_owned(),
            observation_covariance: observation_covariance.to_owned(),
            tolerance: T::real(DEFAULT_TOLERANCE),
            phase: FilterPhase::Uninitialized,
            estimate: Array2::zeros((state_dim, 1)),
            covariance: Array2::zeros((state_dim, state_dim)),
        })
    }

    /// Replaces the relative tolerance used for the covariance checks in `init` and for deciding
    /// whether the innovation covariance is singular. Raising it rejects more ill-conditioned
    /// measurement sets.
    pub fn with_tolerance(mut self, tolerance: T::Real) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Sets the initial estimate and its covariance, treated as the posterior at time zero.
    ///
    /// The covariance has to be symmetric positive semi-definite, otherwise
    /// `FilterError::InvalidState` is returned and the filter stays uninitialized.
    pub fn init<S1, S2>(
        &mut self,
        estimate: &ArrayBase<S1, Ix2>,
        covariance: &ArrayBase<S2, Ix2>,
    ) -> Result<()>
    where
        S1: Data<Elem = T>,
        S2: Data<Elem = T>,
    {
        self.require_phase("init", FilterPhase::Uninitialized, "filter is already initialized")?;
        let state_dim = self.state_dim();
        check_shape("init", estimate, (state_dim, 1))?;
        check_shape("init", covariance, (state_dim, state_dim))?;
        if !is_positive_semidefinite(covariance, self.tolerance) {
            return Err(FilterError::InvalidState {
                operation: "init",
                phase: self.phase,
                reason: "initial covariance must be symmetric positive semi-definite",
            });
        }

        self.estimate = estimate.to_owned();
        self.covariance = symmetrize(covariance)?;
        self.phase = FilterPhase::Updated;
        debug!("initialized with estimate {:?}", self.estimate.as_slice());
        Ok(())
    }

    /// Accepts the prediction as posterior without a measurement, so that the next time step can
    /// be predicted after a measurement was rejected or is missing.
    pub fn skip_update(&mut self) -> Result<()> {
        self.require_phase("skip_update", FilterPhase::Predicted, "a prediction is required")?;
        warn!("no measurement incorporated, keeping prediction as posterior");
        self.phase = FilterPhase::Updated;
        Ok(())
    }

    /// Current estimate as an `n x 1` column, valid after `init`
    pub fn estimate(&self) -> Result<ArrayView2<'_, T>> {
        self.require_initialized("estimate")?;
        Ok(self.estimate.view())
    }

    /// Covariance of the current estimate, valid after `init`
    pub fn covariance(&self) -> Result<ArrayView2<'_, T>> {
        self.require_initialized("covariance")?;
        Ok(self.covariance.view())
    }

    pub fn state_dim(&self) -> usize {
        self.transition_matrix.dim().0
    }

    fn require_phase(
        &self,
        operation: &'static str,
        expected: FilterPhase,
        reason: &'static str,
    ) -> Result<()> {
        if self.phase != expected {
            return Err(FilterError::InvalidState {
                operation,
                phase: self.phase,
                reason,
            });
        }
        Ok(())
    }

    fn require_initialized(&self, operation: &'static str) -> Result<()> {
        if self.phase == FilterPhase::Uninitialized {
            return Err(FilterError::InvalidState {
                operation,
                phase: self.phase,
                reason: "filter has not been initialized",
            });
        }
        Ok(())
    }
}

impl KalmanFilter<f64> {
    /// Creates an uninitialized filter from the matrices of a kinematic process model
    pub fn from_model(model: &ProcessModel) -> Result<Self> {
        KalmanFilter::new(
            model.transition_matrix(),
            model.input_matrix(),
            model.observation_matrix(),
            model.transition_covariance(),
            model.observation_covariance(),
        )
    }
}
