#![crate_name = "rudolf_tracker"]
//! The `rudolf-tracker` crate estimates position and velocity of an object moving along a line
//! from noisy position measurements, using a discrete-time linear Kalman filter.
//!
//! ## Structure
//! The filter itself is generic over the matrices of a linear system and over the scalar type,
//! so it is usable for more general linear problems than the kinematic one. The kinematic
//! specialization is built from a `ProcessModel`, which derives the system matrices from the
//! sampling period and the noise magnitudes.
//!
//! Besides the filter the crate contains a seeded simulation of the tracked object and its
//! sensor, a log of per-step results and a scenario runner tying these together:
//!
//! ```
//! use rudolf_tracker::{scenario, SimulationConfig};
//! let config = SimulationConfig { duration: 10, ..SimulationConfig::default() };
//! let log = scenario::run(&config).unwrap();
//! assert_eq!(log.len(), 10);
//! ```
pub mod config;
pub mod error;
pub mod filter;
pub mod matrix;
pub mod model;
pub mod results;
pub mod scenario;
pub mod simulation;

pub use config::{SimulationConfig, SingularUpdatePolicy};
pub use error::{FilterError, Result};
pub use filter::{Filter, FilterPhase, KalmanFilter, UpdateSummary};
pub use model::ProcessModel;
pub use results::{ResultLog, ResultRow};
