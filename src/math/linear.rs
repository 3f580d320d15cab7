//! Dense linear solves for the small contact systems.
//!
//! Contact counts are small (tens at most) so plain dense LU is enough.
//! Duplicate contacts make the influence matrix rank deficient; those fall
//! back to a least-squares solve through the SVD.

use nalgebra::{DMatrix, DVector};

use crate::error::SolverError;

/// Singular values below this fraction of the largest are treated as zero.
const SVD_RELATIVE_EPS: f64 = 1e-12;

/// Solves `a * x = b`.
pub fn solve_dense(a: &DMatrix<f64>, b: &DVector<f64>) -> Result<DVector<f64>, SolverError> {
    let n = b.len();
    if a.nrows() != n || a.ncols() != n {
        return Err(SolverError::Singular { size: n });
    }
    if n == 0 {
        return Ok(DVector::zeros(0));
    }
    if a.iter().chain(b.iter()).any(|v| !v.is_finite()) {
        return Err(SolverError::NonFinite);
    }

    let scale = a.iter().fold(0.0_f64, |m, v| m.max(v.abs()));
    let eps = (scale * SVD_RELATIVE_EPS).max(f64::MIN_POSITIVE);

    let lu = a.clone().lu();
    let min_pivot = lu.u().diagonal().iter().fold(f64::INFINITY, |m, v| m.min(v.abs()));
    if min_pivot > eps {
        if let Some(x) = lu.solve(b) {
            if x.iter().all(|v| v.is_finite()) {
                return Ok(x);
            }
        }
    }

    let x = a
        .clone()
        .svd(true, true)
        .solve(b, eps)
        .map_err(|_| SolverError::Singular { size: n })?;
    if x.iter().all(|v| v.is_finite()) {
        tracing::trace!(size = n, "contact system solved by least squares");
        Ok(x)
    } else {
        Err(SolverError::Singular { size: n })
    }
}
