//! Runs the filter against a simulated object for a fixed number of steps.
//!
//! Each step advances the simulated truth, predicts with the commanded input, incorporates the
//! new measurement and appends one row to the result log.
use log::{info, warn};

use crate::config::{SimulationConfig, SingularUpdatePolicy};
use crate::error::{FilterError, Result};
use crate::filter::{Filter, KalmanFilter};
use crate::results::ResultLog;
use crate::simulation::{GaussianNoise, SimulationDriver};

/// Runs the configured scenario to completion
pub fn run(config: &SimulationConfig) -> Result<ResultLog> {
    run_with_cancel(config, |_| false)
}

/// Runs the configured scenario, polling `cancel` with the upcoming step number before every
/// step. Returning `true` stops the run and the rows recorded so far are returned.
pub fn run_with_cancel<F>(config: &SimulationConfig, mut cancel: F) -> Result<ResultLog>
where
    F: FnMut(usize) -> bool,
{
    config.validate()?;
    let model = config.process_model()?;
    let input = config.input_matrix();

    let mut filter = KalmanFilter::from_model(&model)?;
    filter.init(
        &config.initial_estimate_matrix(),
        &config.initial_covariance_matrix(&model),
    )?;
    let mut driver = SimulationDriver::new(
        &model,
        config.initial_state_matrix(),
        input.clone(),
        GaussianNoise::from_seed(config.random_seed),
        config.process_noise,
    )?;
    let mut log = ResultLog::with_capacity(config.time_step, config.duration);

    info!(
        "running {} steps with T = {}, position noise {}, acceleration noise {}, seed {}",
        config.duration,
        config.time_step,
        config.position_noise,
        config.accel_noise,
        config.random_seed
    );
    for step in 1..=config.duration {
        if cancel(step) {
            info!("run cancelled before step {}", step);
            break;
        }
        let sample = driver.advance()?;
        filter.predict(&input)?;
        match filter.update(&sample.measurement) {
            Ok(_) => {}
            Err(FilterError::SingularInnovationCovariance)
                if config.on_singular_update == SingularUpdatePolicy::SkipMeasurement =>
            {
                warn!("skipping measurement of step {}", step);
                filter.skip_update()?;
            }
            Err(err) => return Err(err),
        }
        log.record(
            sample.step,
            &sample.true_state,
            sample.measurement[[0, 0]],
            &filter.estimate()?,
            Some(filter.covariance()?),
        )?;
    }
    info!("run finished with {} recorded steps", log.len());
    Ok(log)
}
