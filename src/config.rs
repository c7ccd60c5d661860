//! Parameters of a simulated tracking run, as supplied by a configuration loader or command line.
use ndarray::{arr2, Array2};
use serde::{Deserialize, Serialize};

use crate::error::{FilterError, Result};
use crate::matrix::{is_positive_semidefinite, DEFAULT_TOLERANCE};
use crate::model::ProcessModel;
use crate::simulation::ProcessNoiseSampling;

/// What a run does when a measurement cannot be incorporated because the innovation covariance
/// is singular
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SingularUpdatePolicy {
    /// Stop the run and return the error
    Abort,
    /// Keep the prediction as posterior and continue with the next step
    SkipMeasurement,
}

impl Default for SingularUpdatePolicy {
    fn default() -> Self {
        SingularUpdatePolicy::Abort
    }
}

/// Configuration of a simulated run.
///
/// Every key is optional in serialized form, missing keys take the values of the reference
/// scenario.
///
/// ```
/// use rudolf_tracker::config::SimulationConfig;
/// let config = SimulationConfig::from_json_str(r#"{"T": 0.5, "duration": 20, "randomSeed": 7}"#).unwrap();
/// assert_eq!(config.time_step, 0.5);
/// assert_eq!(config.duration, 20);
/// assert_eq!(config.position_noise, 10.0);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Seconds per discrete step
    #[serde(alias = "T")]
    pub time_step: f64,
    /// Number of predict/update cycles
    pub duration: usize,
    /// Standard deviation of the position measurement noise, in feet
    #[serde(alias = "positionNoise")]
    pub position_noise: f64,
    /// Standard deviation of the acceleration disturbance, in feet/sec²
    #[serde(alias = "accelNoise")]
    pub accel_noise: f64,
    /// Constant commanded acceleration `u`
    #[serde(alias = "commandedAcceleration")]
    pub commanded_acceleration: f64,
    /// True initial `[position, velocity]`
    #[serde(alias = "initialState")]
    pub initial_state: [f64; 2],
    /// Initial estimate, zero state when absent
    #[serde(alias = "initialEstimate")]
    pub initial_estimate: Option<[f64; 2]>,
    /// Initial estimate covariance, the process noise covariance when absent
    #[serde(alias = "initialCovariance")]
    pub initial_covariance: Option<[[f64; 2]; 2]>,
    #[serde(alias = "randomSeed")]
    pub random_seed: u64,
    #[serde(alias = "processNoise")]
    pub process_noise: ProcessNoiseSampling,
    #[serde(alias = "onSingularUpdate")]
    pub on_singular_update: SingularUpdatePolicy,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        SimulationConfig {
            time_step: 1.0,
            duration: 100,
            position_noise: 10.0,
            accel_noise: 0.2,
            commanded_acceleration: 1.0,
            initial_state: [0.0, 0.0],
            initial_estimate: None,
            initial_covariance: None,
            random_seed: 42,
            process_noise: ProcessNoiseSampling::default(),
            on_singular_update: SingularUpdatePolicy::default(),
        }
    }
}

impl SimulationConfig {
    /// Parses and validates a JSON configuration
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: SimulationConfig = serde_json::from_str(json)
            .map_err(|err| FilterError::InvalidConfig(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects configurations that can not produce a run, before any step is taken
    pub fn validate(&self) -> Result<()> {
        if self.duration == 0 {
            return Err(FilterError::InvalidConfig(
                "duration must be at least one step".to_string(),
            ));
        }
        if !self.commanded_acceleration.is_finite() {
            return Err(FilterError::InvalidConfig(
                "commanded acceleration must be finite".to_string(),
            ));
        }
        let mut values = self
            .initial_state
            .iter()
            .chain(self.initial_estimate.iter().flatten())
            .chain(self.initial_covariance.iter().flatten().flatten());
        if values.any(|value| !value.is_finite()) {
            return Err(FilterError::InvalidConfig(
                "initial state, estimate and covariance must be finite".to_string(),
            ));
        }
        if let Some(covariance) = self.initial_covariance {
            if !is_positive_semidefinite(&arr2(&covariance), DEFAULT_TOLERANCE) {
                return Err(FilterError::InvalidConfig(
                    "initial covariance must be symmetric positive semi-definite".to_string(),
                ));
            }
        }
        self.process_model().map(|_| ())
    }

    pub fn process_model(&self) -> Result<ProcessModel> {
        ProcessModel::new(self.time_step, self.position_noise, self.accel_noise)
    }

    pub fn input_matrix(&self) -> Array2<f64> {
        arr2(&[[self.commanded_acceleration]])
    }

    pub fn initial_state_matrix(&self) -> Array2<f64> {
        column(self.initial_state)
    }

    pub fn initial_estimate_matrix(&self) -> Array2<f64> {
        column(self.initial_estimate.unwrap_or([0.0, 0.0]))
    }

    pub fn initial_covariance_matrix(&self, model: &ProcessModel) -> Array2<f64> {
        match self.initial_covariance {
            Some(covariance) => arr2(&covariance),
            None => model.transition_covariance().clone(),
        }
    }
}

fn column(values: [f64; 2]) -> Array2<f64> {
    arr2(&[[values[0]], [values[1]]])
}
