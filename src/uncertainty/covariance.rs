//! # Covariance Matrix Calculations
//!
//! Functions for turning the optimizer's curvature information into
//! covariance, correlation and standard errors.

use ndarray::{Array1, Array2};

use crate::error::{Result, SecrError};

/// Invert a Hessian of the negative log-likelihood into a covariance matrix.
///
/// Returns `None` when the Hessian is singular or the inverse is not a
/// usable covariance (non-finite entries or a non-positive variance).
#[cfg(feature = "matrix")]
pub fn covariance_from_hessian(hessian: &Array2<f64>) -> Result<Option<Array2<f64>>> {
    use crate::utils::{nalgebra_to_ndarray, ndarray_to_nalgebra};

    if hessian.nrows() != hessian.ncols() {
        return Err(SecrError::DimensionMismatch(format!(
            "Hessian must be square, got {:?}",
            hessian.dim()
        )));
    }
    if hessian.is_empty() {
        return Ok(Some(Array2::zeros((0, 0))));
    }

    let inverse = match ndarray_to_nalgebra(hessian).try_inverse() {
        Some(inverse) => nalgebra_to_ndarray(&inverse),
        None => return Ok(None),
    };

    let usable = inverse.iter().all(|v| v.is_finite()) && inverse.diag().iter().all(|&v| v > 0.0);
    Ok(usable.then_some(inverse))
}

/// Without the `matrix` feature no inverse is available.
#[cfg(not(feature = "matrix"))]
pub fn covariance_from_hessian(hessian: &Array2<f64>) -> Result<Option<Array2<f64>>> {
    if hessian.nrows() != hessian.ncols() {
        return Err(SecrError::DimensionMismatch(format!(
            "Hessian must be square, got {:?}",
            hessian.dim()
        )));
    }
    log::debug!("Hessian inversion requires the `matrix` feature");
    Ok(None)
}

/// Rebuild a covariance matrix from standard deviations and correlations.
pub fn covariance_from_correlation(std_devs: &Array1<f64>, correl: &Array2<f64>) -> Result<Array2<f64>> {
    let n = std_devs.len();
    if correl.dim() != (n, n) {
        return Err(SecrError::DimensionMismatch(format!(
            "Correlation matrix has shape {:?} for {} standard deviations",
            correl.dim(),
            n
        )));
    }
    Ok(Array2::from_shape_fn((n, n), |(i, j)| correl[[i, j]] * std_devs[i] * std_devs[j]))
}

/// Calculate correlation matrix from covariance matrix.
///
/// The correlation matrix is calculated as:
///   correl[i,j] = covar[i,j] / sqrt(covar[i,i] * covar[j,j])
///
/// This normalizes the covariance matrix so that diagonal elements are 1.0,
/// and off-diagonal elements represent correlation coefficients between -1 and 1.
pub fn calculate_correlation(covar: &Array2<f64>) -> Array2<f64> {
    let n = covar.nrows();
    let mut correl = Array2::zeros((n, n));

    for i in 0..n {
        for j in 0..n {
            if i == j {
                correl[[i, j]] = 1.0;
            } else {
                let denom = (covar[[i, i]] * covar[[j, j]]).sqrt();
                correl[[i, j]] = if denom > 0.0 {
                    covar[[i, j]] / denom
                } else {
                    f64::NAN
                };
            }
        }
    }

    correl
}

/// Extract standard errors from the covariance matrix.
///
/// Standard errors are the square roots of the diagonal elements of the
/// covariance matrix; a negative variance yields NaN.
pub fn standard_errors_from_covariance(covar: &Array2<f64>) -> Array1<f64> {
    covar
        .diag()
        .mapv(|v| if v >= 0.0 { v.sqrt() } else { f64::NAN })
}

/// Whether a covariance matrix is usable: finite everywhere.
pub fn is_valid_covariance(covar: &Array2<f64>) -> bool {
    covar.nrows() == covar.ncols() && covar.iter().all(|v| v.is_finite())
}
