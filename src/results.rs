//! Append-only record of a tracking run, consumed by reporting once the run ends.
use std::fmt;

use ndarray::{ArrayBase, ArrayView2, Data, Ix2};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::matrix::check_shape;
use crate::model::STATE_DIM;

/// Truth, measurement and estimate after one predict/update cycle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultRow {
    pub step: usize,
    /// Simulated time in seconds, `step · T`
    pub time: f64,
    pub true_position: f64,
    pub measured_position: f64,
    pub estimated_position: f64,
    pub true_velocity: f64,
    pub estimated_velocity: f64,
    /// Posterior variance of the position estimate, if recorded
    pub position_variance: Option<f64>,
    /// Posterior variance of the velocity estimate, if recorded
    pub velocity_variance: Option<f64>,
}

/// Ordered per-step results of a run. Rows can only be appended.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ResultLog {
    time_step: f64,
    rows: Vec<ResultRow>,
}

impl ResultLog {
    pub fn new(time_step: f64) -> Self {
        ResultLog {
            time_step,
            rows: Vec::new(),
        }
    }

    pub fn with_capacity(time_step: f64, capacity: usize) -> Self {
        ResultLog {
            time_step,
            rows: Vec::with_capacity(capacity),
        }
    }

    /// Appends the row for `step` from `[position, velocity]` columns of truth and estimate.
    /// When the estimate covariance is given its diagonal is kept as well.
    pub fn record<S1, S2>(
        &mut self,
        step: usize,
        true_state: &ArrayBase<S1, Ix2>,
        measurement: f64,
        estimate: &ArrayBase<S2, Ix2>,
        covariance: Option<ArrayView2<'_, f64>>,
    ) -> Result<()>
    where
        S1: Data<Elem = f64>,
        S2: Data<Elem = f64>,
    {
        check_shape("record true state", true_state, (STATE_DIM, 1))?;
        check_shape("record estimate", estimate, (STATE_DIM, 1))?;
        if let Some(covariance) = &covariance {
            check_shape("record covariance", covariance, (STATE_DIM, STATE_DIM))?;
        }
        self.rows.push(ResultRow {
            step,
            time: step as f64 * self.time_step,
            true_position: true_state[[0, 0]],
            measured_position: measurement,
            estimated_position: estimate[[0, 0]],
            true_velocity: true_state[[1, 0]],
            estimated_velocity: estimate[[1, 0]],
            position_variance: covariance.as_ref().map(|covariance| covariance[[0, 0]]),
            velocity_variance: covariance.as_ref().map(|covariance| covariance[[1, 1]]),
        });
        Ok(())
    }

    pub fn rows(&self) -> &[ResultRow] {
        &self.rows
    }

    pub fn into_rows(self) -> Vec<ResultRow> {
        self.rows
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ResultRow> {
        self.rows.iter()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn time_step(&self) -> f64 {
        self.time_step
    }
}

impl<'a> IntoIterator for &'a ResultLog {
    type Item = &'a ResultRow;
    type IntoIter = std::slice::Iter<'a, ResultRow>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}

impl fmt::Display for ResultLog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{:>6} {:>10} {:>14} {:>14} {:>14} {:>12} {:>12}",
            "step", "time", "pos", "posmeas", "poshat", "vel", "velhat"
        )?;
        for row in &self.rows {
            writeln!(
                f,
                "{:>6} {:>10.3} {:>14.4} {:>14.4} {:>14.4} {:>12.4} {:>12.4}",
                row.step,
                row.time,
                row.true_position,
                row.measured_position,
                row.estimated_position,
                row.true_velocity,
                row.estimated_velocity
            )?;
        }
        Ok(())
    }
}
