use log::trace;
use ndarray::{Array2, ArrayView2};

use super::noise::{square_root_factor, GaussianNoise, ProcessNoiseSampling};
use crate::error::Result;
use crate::matrix::{add, check_shape, multiply};
use crate::model::{ProcessModel, INPUT_DIM, STATE_DIM};

/// Ground truth and the measurement taken of it at one discrete time step
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    /// Number of transitions applied so far, starting at one for the first sample
    pub step: usize,
    pub true_state: Array2<f64>,
    pub measurement: Array2<f64>,
}

/// Generates a synthetic true trajectory and noisy measurements of it.
///
/// The driver is a stand-in for the real object and its sensor. It shares nothing with the
/// filter apart from the measurements it emits, so a filter can be exercised against this
/// driver or any other measurement sequence.
#[derive(Debug, Clone)]
pub struct SimulationDriver {
    transition_matrix: Array2<f64>,
    input_matrix: Array2<f64>,
    observation_matrix: Array2<f64>,
    process_noise_factor: Array2<f64>,
    measurement_noise_factor: Array2<f64>,
    input: Array2<f64>,
    state: Array2<f64>,
    step: usize,
    noise: GaussianNoise,
}

impl SimulationDriver {
    /// Creates a driver starting at `initial_state` (`[position, velocity]` column) and driven by
    /// the constant `input` (commanded acceleration, `1 x 1`).
    pub fn new(
        model: &ProcessModel,
        initial_state: Array2<f64>,
        input: Array2<f64>,
        noise: GaussianNoise,
        sampling: ProcessNoiseSampling,
    ) -> Result<Self> {
        check_shape("initial state", &initial_state, (STATE_DIM, 1))?;
        check_shape("input", &input, (INPUT_DIM, 1))?;
        Ok(SimulationDriver {
            transition_matrix: model.transition_matrix().to_owned(),
            input_matrix: model.input_matrix().to_owned(),
            observation_matrix: model.observation_matrix().to_owned(),
            process_noise_factor: sampling.factor(model.transition_covariance())?,
            measurement_noise_factor: square_root_factor(model.observation_covariance())?,
            input,
            state: initial_state,
            step: 0,
            noise,
        })
    }

    /// Advances the truth by one time step, `x ← A·x + B·u + w`, and measures it,
    /// `y = C·x + z`.
    pub fn advance(&mut self) -> Result<Sample> {
        let process_noise = self.noise.shaped(&self.process_noise_factor);
        let propagated = multiply(&self.transition_matrix, &self.state)?;
        let driven = add(&propagated, &multiply(&self.input_matrix, &self.input)?)?;
        self.state = add(&driven, &process_noise)?;

        let measurement_noise = self.noise.shaped(&self.measurement_noise_factor);
        let measurement = add(
            &multiply(&self.observation_matrix, &self.state)?,
            &measurement_noise,
        )?;
        self.step += 1;

        trace!(
            "step {}: true state {:?}, measurement {:?}",
            self.step,
            self.state.as_slice(),
            measurement.as_slice()
        );
        Ok(Sample {
            step: self.step,
            true_state: self.state.clone(),
            measurement,
        })
    }

    pub fn state(&self) -> ArrayView2<'_, f64> {
        self.state.view()
    }

    pub fn step(&self) -> usize {
        self.step
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::arr2;

    fn driver(model: &ProcessModel, seed: u64, sampling: ProcessNoiseSampling) -> SimulationDriver {
        SimulationDriver::new(
            model,
            Array2::zeros((2, 1)),
            arr2(&[[1.0]]),
            GaussianNoise::from_seed(seed),
            sampling,
        )
        .unwrap()
    }

    #[test]
    fn noiseless_truth_follows_constant_acceleration() {
        let model = ProcessModel::new(0.5, 0.0, 0.0).unwrap();
        let mut simulation = driver(&model, 1, ProcessNoiseSampling::Correlated);
        for step in 1..=20 {
            let sample = simulation.advance().unwrap();
            let time = step as f64 * 0.5;
            assert_eq!(sample.step, step);
            assert_abs_diff_eq!(sample.true_state[[0, 0]], time * time / 2.0, epsilon = 1e-9);
            assert_abs_diff_eq!(sample.true_state[[1, 0]], time, epsilon = 1e-9);
            assert_eq!(sample.measurement[[0, 0]], sample.true_state[[0, 0]]);
        }
        assert_eq!(simulation.step(), 20);
    }

    #[test]
    fn same_seed_reproduces_trajectory() {
        let model = ProcessModel::new(1.0, 10.0, 0.2).unwrap();
        let mut first = driver(&model, 42, ProcessNoiseSampling::Correlated);
        let mut second = driver(&model, 42, ProcessNoiseSampling::Correlated);
        let mut third = driver(&model, 43, ProcessNoiseSampling::Correlated);
        let mut differs = false;
        for _ in 0..10 {
            let sample = first.advance().unwrap();
            assert_eq!(sample, second.advance().unwrap());
            differs |= sample.measurement != third.advance().unwrap().measurement;
        }
        assert!(differs);
    }

    #[test]
    fn measurement_noise_has_modeled_spread() {
        let model = ProcessModel::new(1.0, 3.0, 0.0).unwrap();
        let mut simulation = driver(&model, 5, ProcessNoiseSampling::Correlated);
        let samples = 20_000;
        let mut sum = 0.0;
        let mut sum_squares = 0.0;
        for _ in 0..samples {
            let sample = simulation.advance().unwrap();
            let error = sample.measurement[[0, 0]] - sample.true_state[[0, 0]];
            sum += error;
            sum_squares += error * error;
        }
        let mean = sum / samples as f64;
        let variance = sum_squares / samples as f64 - mean * mean;
        assert_abs_diff_eq!(mean, 0.0, epsilon = 0.1);
        assert_abs_diff_eq!(variance, 9.0, epsilon = 0.5);
    }

    #[test]
    fn correlated_process_noise_moves_along_acceleration_direction() {
        // With a single acceleration disturbance, w = σ·n·[T²/2, T], so the position part is
        // always half the velocity part for T = 1
        let model = ProcessModel::new(1.0, 0.0, 0.5).unwrap();
        let mut simulation = driver(&model, 9, ProcessNoiseSampling::Correlated);
        let a = model.transition_matrix().clone();
        let b = model.input_matrix().clone();
        let mut previous = simulation.state().to_owned();
        for _ in 0..10 {
            let sample = simulation.advance().unwrap();
            let noise = &sample.true_state - &(a.dot(&previous) + b.dot(&arr2(&[[1.0]])));
            assert_abs_diff_eq!(noise[[0, 0]], noise[[1, 0]] / 2.0, epsilon = 1e-9);
            previous = sample.true_state;
        }
    }

    #[test]
    fn wrongly_shaped_initial_state_is_rejected() {
        let model = ProcessModel::new(1.0, 1.0, 1.0).unwrap();
        let result = SimulationDriver::new(
            &model,
            Array2::zeros((3, 1)),
            arr2(&[[1.0]]),
            GaussianNoise::from_seed(0),
            ProcessNoiseSampling::Correlated,
        );
        assert!(result.is_err());
    }
}
