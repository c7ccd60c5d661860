//! Seeded Gaussian noise for simulated disturbances and sensor errors.
//!
//! Noise is always drawn as zero-mean unit normals and shaped by a square-root factor of the
//! modeled covariance, so a draw `L·n` with `n ~ N(0, I)` has covariance `L·Lᵗ`.
use ndarray::{Array2, ArrayBase, Data, Ix2};
use ndarray_linalg::{Eigh, UPLO};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::StandardNormal;
use serde::{Deserialize, Serialize};

use crate::error::{FilterError, Result};
use crate::matrix::{check_square, is_positive_semidefinite, DEFAULT_TOLERANCE};

/// How process noise is mapped onto the state.
///
/// `Correlated` is the default because it is the only mode whose draws have exactly the
/// modeled covariance `Q`, whose off-diagonal terms couple position and velocity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessNoiseSampling {
    /// `w = L·n` with `L·Lᵗ = Q`, reproducing the full covariance including correlations
    Correlated,
    /// `wᵢ = sqrt(Qᵢᵢ)·nᵢ`, independent per state component
    Independent,
}

impl Default for ProcessNoiseSampling {
    fn default() -> Self {
        ProcessNoiseSampling::Correlated
    }
}

impl ProcessNoiseSampling {
    /// Square-root factor used to shape unit normal draws for covariance `covariance`
    pub fn factor<S: Data<Elem = f64>>(self, covariance: &ArrayBase<S, Ix2>) -> Result<Array2<f64>> {
        match self {
            ProcessNoiseSampling::Correlated => square_root_factor(covariance),
            ProcessNoiseSampling::Independent => {
                check_square("noise covariance", covariance)?;
                let n = covariance.dim().0;
                let mut factor = Array2::zeros((n, n));
                for i in 0..n {
                    if covariance[[i, i]] < 0.0 {
                        return Err(FilterError::InvalidConfig(format!(
                            "noise variance of component {} is negative",
                            i
                        )));
                    }
                    factor[[i, i]] = covariance[[i, i]].sqrt();
                }
                Ok(factor)
            }
        }
    }
}

/// Square-root factor `L` with `L·Lᵗ = covariance` for a positive semi-definite covariance.
///
/// Built from the eigendecomposition `V·Λ·Vᵗ` as `V·Λ^½`. Eigenvalues that are zero within
/// tolerance give zero columns, so rank deficient covariances are supported.
pub fn square_root_factor<S: Data<Elem = f64>>(covariance: &ArrayBase<S, Ix2>) -> Result<Array2<f64>> {
    check_square("noise covariance", covariance)?;
    if !is_positive_semidefinite(covariance, DEFAULT_TOLERANCE) {
        return Err(FilterError::InvalidConfig(
            "noise covariance must be symmetric positive semi-definite".to_string(),
        ));
    }
    let (eigenvalues, eigenvectors) = covariance.eigh(UPLO::Lower).map_err(|err| {
        FilterError::InvalidConfig(format!("noise covariance can not be decomposed: {}", err))
    })?;
    let largest = eigenvalues.iter().fold(0.0_f64, |acc, value| acc.max(value.abs()));
    let threshold = DEFAULT_TOLERANCE * largest;
    let roots = eigenvalues.mapv(|value| if value > threshold { value.sqrt() } else { 0.0 });
    Ok(eigenvectors * &roots)
}

/// Source of zero-mean Gaussian draws with an explicit seed
#[derive(Debug, Clone)]
pub struct GaussianNoise {
    rng: StdRng,
}

impl GaussianNoise {
    pub fn from_seed(seed: u64) -> Self {
        GaussianNoise {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn standard_normal(&mut self) -> f64 {
        self.rng.sample(StandardNormal)
    }

    /// Draws the column `factor · n`, with one independent unit normal per column of `factor`
    pub fn shaped<S: Data<Elem = f64>>(&mut self, factor: &ArrayBase<S, Ix2>) -> Array2<f64> {
        let draws = Array2::from_shape_fn((factor.dim().1, 1), |_| self.standard_normal());
        factor.dot(&draws)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::arr2;

    const SAMPLES: usize = 50_000;

    fn sample_covariance(noise: &mut GaussianNoise, factor: &Array2<f64>) -> Array2<f64> {
        let n = factor.dim().0;
        let mut accumulated = Array2::<f64>::zeros((n, n));
        for _ in 0..SAMPLES {
            let draw = noise.shaped(factor);
            accumulated = accumulated + draw.dot(&draw.t());
        }
        accumulated / SAMPLES as f64
    }

    #[test]
    fn factor_reproduces_rank_deficient_covariance() {
        let covariance = arr2(&[[0.01, 0.02], [0.02, 0.04]]);
        let factor = square_root_factor(&covariance).unwrap();
        let reproduced = factor.dot(&factor.t());
        for (lhs, rhs) in reproduced.iter().zip(covariance.iter()) {
            assert_abs_diff_eq!(*lhs, *rhs, epsilon = 1e-12);
        }
        // Eigenvalues come in ascending order, the null direction is dropped entirely
        assert!(factor.column(0).iter().all(|value| *value == 0.0));
    }

    #[test]
    fn indefinite_covariance_has_no_factor() {
        let covariance = arr2(&[[1.0, 2.0], [2.0, 1.0]]);
        assert!(matches!(
            square_root_factor(&covariance),
            Err(FilterError::InvalidConfig(_))
        ));
    }

    #[test]
    fn same_seed_gives_same_draws() {
        let mut first = GaussianNoise::from_seed(7);
        let mut second = GaussianNoise::from_seed(7);
        for _ in 0..100 {
            assert_eq!(first.standard_normal(), second.standard_normal());
        }
    }

    #[test]
    fn correlated_draws_have_modeled_covariance() {
        let covariance = arr2(&[[0.25, 0.5], [0.5, 1.0]]);
        let factor = ProcessNoiseSampling::Correlated.factor(&covariance).unwrap();
        let mut noise = GaussianNoise::from_seed(42);
        let estimated = sample_covariance(&mut noise, &factor);
        assert_abs_diff_eq!(estimated[[0, 0]], 0.25, epsilon = 0.0125);
        assert_abs_diff_eq!(estimated[[0, 1]], 0.5, epsilon = 0.025);
        assert_abs_diff_eq!(estimated[[1, 1]], 1.0, epsilon = 0.05);
    }

    #[test]
    fn independent_draws_are_uncorrelated() {
        let covariance = arr2(&[[0.25, 0.5], [0.5, 1.0]]);
        let factor = ProcessNoiseSampling::Independent.factor(&covariance).unwrap();
        assert_eq!(factor, arr2(&[[0.5, 0.0], [0.0, 1.0]]));
        let mut noise = GaussianNoise::from_seed(42);
        let estimated = sample_covariance(&mut noise, &factor);
        assert_abs_diff_eq!(estimated[[0, 0]], 0.25, epsilon = 0.0125);
        assert_abs_diff_eq!(estimated[[0, 1]], 0.0, epsilon = 0.02);
        assert_abs_diff_eq!(estimated[[1, 1]], 1.0, epsilon = 0.05);
    }
}
