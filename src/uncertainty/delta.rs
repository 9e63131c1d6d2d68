//! Delta-method propagation of link-scale uncertainty.

use ndarray::{Array1, Array2};

use crate::error::{Result, SecrError};
use crate::parameters::LinkKind;

/// Variance of a scalar function `f(η)` with gradient `grad` at the estimate,
/// given the covariance of `η`: gradᵀ Σ grad.
pub fn delta_method_variance(grad: &Array1<f64>, covar: &Array2<f64>) -> Result<f64> {
    if covar.dim() != (grad.len(), grad.len()) {
        return Err(SecrError::DimensionMismatch(format!(
            "Covariance matrix has shape {:?} for a gradient of length {}",
            covar.dim(),
            grad.len()
        )));
    }
    Ok(grad.dot(&covar.dot(grad)))
}

/// Covariance of the natural-scale parameters `θ_i = link_i⁻¹(η_i)`.
///
/// The Jacobian of the inverse links is diagonal, so entry (i, j) is
/// `Σ_ij · dθ_i/dη_i · dθ_j/dη_j`.
pub fn natural_scale_covariance(
    links: &[LinkKind],
    etas: &Array1<f64>,
    covar: &Array2<f64>,
) -> Result<Array2<f64>> {
    let n = etas.len();
    if links.len() != n || covar.dim() != (n, n) {
        return Err(SecrError::DimensionMismatch(format!(
            "{} links and {} link-scale values for a {:?} covariance matrix",
            links.len(),
            n,
            covar.dim()
        )));
    }

    let jac: Vec<f64> = links
        .iter()
        .zip(etas.iter())
        .map(|(link, &eta)| link.inverse_derivative(eta))
        .collect();

    Ok(Array2::from_shape_fn((n, n), |(i, j)| covar[[i, j]] * jac[i] * jac[j]))
}
