//! Finite difference methods for numerical differentiation.

use crate::error::Result;
use ndarray::Array1;

/// Default relative step size for central differences.
const DEFAULT_EPSILON: f64 = 1e-6;

/// Compute the gradient of a scalar function using central finite differences.
///
/// The gradient is the vector of partial derivatives of the function with
/// respect to the parameters: grad[j] = ∂f/∂param[j].
///
/// # Arguments
///
/// * `f` - The function to differentiate
/// * `params` - The parameter values at which to evaluate the gradient
/// * `epsilon` - The step size for finite differences (optional)
///
/// # Returns
///
/// * `Result<Array1<f64>>` - The gradient vector
pub fn gradient<F>(f: F, params: &Array1<f64>, epsilon: Option<f64>) -> Result<Array1<f64>>
where
    F: Fn(&Array1<f64>) -> Result<f64>,
{
    let eps = epsilon.unwrap_or(DEFAULT_EPSILON);
    let mut grad = Array1::zeros(params.len());

    for j in 0..params.len() {
        // Adapt epsilon to parameter scale
        let eps_j = if params[j].abs() > 1.0 {
            params[j].abs() * eps
        } else {
            eps
        };

        let mut forward = params.clone();
        forward[j] += eps_j;
        let mut backward = params.clone();
        backward[j] -= eps_j;

        grad[j] = (f(&forward)? - f(&backward)?) / (2.0 * eps_j);
    }

    Ok(grad)
}
