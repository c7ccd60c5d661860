//! Small dense linear algebra needed by linear state-space filters: checked products, sums,
//! transposes, inversion and covariance validity checks.
pub mod ops;
pub mod ops_traits;

pub use ops::*;
pub use ops_traits::QuadraticForm;
