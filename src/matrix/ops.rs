//! Checked linear algebra primitives for the small matrices used by linear state-space filters.
//!
//! Every function works on two-dimensional `ndarray` arrays, including column vectors, which are
//! represented as `n x 1` matrices. Shapes are validated up front and reported as
//! `FilterError::DimensionMismatch` instead of panicking inside `ndarray`.
use cauchy::Scalar;
use ndarray::{Array2, ArrayBase, Data, Ix2};
use ndarray_linalg::{EigValsh, Inverse, Lapack, SVD, UPLO};

use crate::error::{FilterError, Result};

/// Relative tolerance used to decide whether a matrix is numerically singular, asymmetric or
/// indefinite. It is always applied relative to the magnitude of the matrix under test.
pub const DEFAULT_TOLERANCE: f64 = 1e-12;

/// Matrix product of a `p x q` and a `q x r` matrix
pub fn multiply<T, S1, S2>(lhs: &ArrayBase<S1, Ix2>, rhs: &ArrayBase<S2, Ix2>) -> Result<Array2<T>>
where
    T: Scalar,
    S1: Data<Elem = T>,
    S2: Data<Elem = T>,
{
    let (_, lhs_cols) = lhs.dim();
    let (rhs_rows, _) = rhs.dim();
    if lhs_cols != rhs_rows {
        return Err(FilterError::DimensionMismatch {
            operation: "multiply",
            lhs: lhs.dim(),
            rhs: rhs.dim(),
        });
    }
    Ok(lhs.dot(rhs))
}

pub fn identity<T: Scalar>(size: usize) -> Array2<T> {
    Array2::eye(size)
}

pub fn transpose<T, S>(matrix: &ArrayBase<S, Ix2>) -> Array2<T>
where
    T: Scalar,
    S: Data<Elem = T>,
{
    matrix.t().to_owned()
}

/// Conjugate transpose. Equal to `transpose` for real scalars.
pub fn adjoint<T, S>(matrix: &ArrayBase<S, Ix2>) -> Array2<T>
where
    T: Scalar,
    S: Data<Elem = T>,
{
    matrix.t().mapv(|elem| elem.conj())
}

pub fn add<T, S1, S2>(lhs: &ArrayBase<S1, Ix2>, rhs: &ArrayBase<S2, Ix2>) -> Result<Array2<T>>
where
    T: Scalar,
    S1: Data<Elem = T>,
    S2: Data<Elem = T>,
{
    check_same_shape("add", lhs, rhs)?;
    Ok(lhs + rhs)
}

pub fn subtract<T, S1, S2>(lhs: &ArrayBase<S1, Ix2>, rhs: &ArrayBase<S2, Ix2>) -> Result<Array2<T>>
where
    T: Scalar,
    S1: Data<Elem = T>,
    S2: Data<Elem = T>,
{
    check_same_shape("subtract", lhs, rhs)?;
    Ok(lhs - rhs)
}

/// Inverts a `1 x 1` matrix.
///
/// Fails with `SingularMatrix` if the absolute value of the single entry does not exceed
/// `threshold`. The threshold is absolute, callers scale it to the magnitudes involved.
pub fn invert_scalar<T, S>(matrix: &ArrayBase<S, Ix2>, threshold: T::Real) -> Result<Array2<T>>
where
    T: Scalar,
    S: Data<Elem = T>,
{
    if matrix.dim() != (1, 1) {
        return Err(FilterError::DimensionMismatch {
            operation: "invert_scalar",
            lhs: matrix.dim(),
            rhs: (1, 1),
        });
    }
    let value = matrix[[0, 0]];
    // NaN never compares greater, so it is reported as singular as well
    if !(value.abs() > threshold) {
        return Err(FilterError::SingularMatrix);
    }
    Ok(Array2::from_elem((1, 1), T::one() / value))
}

/// Inverts a square matrix.
///
/// The matrix counts as singular when its smallest singular value does not exceed `tolerance`
/// times the largest one. The decision is independent of the units of the entries, only the zero
/// matrix and matrices ill-conditioned beyond `1 / tolerance` are rejected.
pub fn invert<T, S>(matrix: &ArrayBase<S, Ix2>, tolerance: T::Real) -> Result<Array2<T>>
where
    T: Scalar + Lapack,
    S: Data<Elem = T>,
{
    check_square("invert", matrix)?;
    if matrix.dim() == (1, 1) {
        return invert_scalar(matrix, tolerance * matrix[[0, 0]].abs());
    }

    let (_, singular_values, _) = matrix
        .svd(false, false)
        .map_err(|_| FilterError::SingularMatrix)?;
    let zero = T::real(0.0);
    if singular_values.iter().any(|value| !(*value >= zero)) {
        return Err(FilterError::SingularMatrix);
    }
    let largest = singular_values
        .iter()
        .fold(zero, |acc, &value| if value > acc { value } else { acc });
    let smallest = singular_values
        .iter()
        .fold(largest, |acc, &value| if value < acc { value } else { acc });
    if !(smallest > tolerance * largest) {
        return Err(FilterError::SingularMatrix);
    }
    matrix.inv().map_err(|_| FilterError::SingularMatrix)
}

/// Returns `(M + Mᴴ) / 2`, the nearest Hermitian matrix
pub fn symmetrize<T, S>(matrix: &ArrayBase<S, Ix2>) -> Result<Array2<T>>
where
    T: Scalar,
    S: Data<Elem = T>,
{
    check_square("symmetrize", matrix)?;
    let two = T::one() + T::one();
    let sum = add(matrix, &adjoint(matrix))?;
    Ok(sum.mapv(|elem| elem / two))
}

/// Checks `M = Mᴴ` entrywise, within `tolerance` relative to the largest entry
pub fn is_symmetric<T, S>(matrix: &ArrayBase<S, Ix2>, tolerance: T::Real) -> bool
where
    T: Scalar,
    S: Data<Elem = T>,
{
    let (rows, cols) = matrix.dim();
    if rows != cols {
        return false;
    }
    let threshold = tolerance * largest_magnitude(matrix);
    for i in 0..rows {
        for j in i..cols {
            let difference = matrix[[i, j]] - matrix[[j, i]].conj();
            if !(difference.abs() <= threshold) {
                return false;
            }
        }
    }
    true
}

/// Checks that a matrix is symmetric positive semi-definite.
///
/// Eigenvalues down to `-tolerance` times the largest entry are accepted as zero, so rank
/// deficient covariances such as a process noise driven by a single acceleration input pass.
pub fn is_positive_semidefinite<T, S>(matrix: &ArrayBase<S, Ix2>, tolerance: T::Real) -> bool
where
    T: Scalar + Lapack,
    S: Data<Elem = T>,
{
    if !is_symmetric(matrix, tolerance) {
        return false;
    }
    let threshold = tolerance * largest_magnitude(matrix);
    match matrix.eigvalsh(UPLO::Lower) {
        Ok(eigenvalues) => eigenvalues.iter().all(|value| *value >= -threshold),
        Err(_) => false,
    }
}

/// Largest absolute entry of a matrix, zero for an empty one. NaN entries are skipped.
pub(crate) fn largest_magnitude<T, S>(matrix: &ArrayBase<S, Ix2>) -> T::Real
where
    T: Scalar,
    S: Data<Elem = T>,
{
    matrix.iter().fold(T::real(0.0), |largest, elem| {
        let magnitude = elem.abs();
        if magnitude > largest {
            magnitude
        } else {
            largest
        }
    })
}

pub(crate) fn check_square<T, S>(operation: &'static str, matrix: &ArrayBase<S, Ix2>) -> Result<()>
where
    T: Scalar,
    S: Data<Elem = T>,
{
    let (rows, cols) = matrix.dim();
    if rows != cols {
        return Err(FilterError::DimensionMismatch {
            operation,
            lhs: (rows, cols),
            rhs: (cols, rows),
        });
    }
    Ok(())
}

pub(crate) fn check_shape<T, S>(
    operation: &'static str,
    matrix: &ArrayBase<S, Ix2>,
    expected: (usize, usize),
) -> Result<()>
where
    T: Scalar,
    S: Data<Elem = T>,
{
    if matrix.dim() != expected {
        return Err(FilterError::DimensionMismatch {
            operation,
            lhs: matrix.dim(),
            rhs: expected,
        });
    }
    Ok(())
}

fn check_same_shape<T, S1, S2>(
    operation: &'static str,
    lhs: &ArrayBase<S1, Ix2>,
    rhs: &ArrayBase<S2, Ix2>,
) -> Result<()>
where
    T: Scalar,
    S1: Data<Elem = T>,
    S2: Data<Elem = T>,
{
    if lhs.dim() != rhs.dim() {
        return Err(FilterError::DimensionMismatch {
            operation,
            lhs: lhs.dim(),
            rhs: rhs.dim(),
        });
    }
    Ok(())
}
