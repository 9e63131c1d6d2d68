//! Gradient checks on the optimizer's solution.
//!
//! Two advisory thresholds apply: a loose one checked as soon as the solver
//! returns, and a strict one checked once uncertainty has been finalised.
//! Neither blocks construction of the result.

use crate::fit::diagnostics::{DiagnosticChannel, Diagnostics};

/// Maximum gradient component above which the solution is flagged.
pub const LOOSE_GRADIENT_THRESHOLD: f64 = 0.1;

/// Maximum gradient component above which estimates may not be reliable.
pub const STRICT_GRADIENT_THRESHOLD: f64 = 0.01;

fn exceeds(max_gradient: f64, threshold: f64) -> bool {
    !(max_gradient.abs() <= threshold)
}

/// Warn when the maximum gradient component exceeds the loose threshold.
///
/// Returns whether the gradient passed. A NaN gradient fails.
pub fn check_gradient(max_gradient: f64, diag: &mut Diagnostics) -> bool {
    if exceeds(max_gradient, LOOSE_GRADIENT_THRESHOLD) {
        diag.warn(DiagnosticChannel::Convergence, "Maximum gradient component is large.");
        false
    } else {
        true
    }
}

/// Warn when the maximum gradient component exceeds the strict threshold.
pub fn check_reliability(max_gradient: f64, diag: &mut Diagnostics) -> bool {
    if exceeds(max_gradient, STRICT_GRADIENT_THRESHOLD) {
        diag.warn(
            DiagnosticChannel::Convergence,
            format!(
                "Parameter estimates might not be reliable: maximum gradient component exceeds {}.",
                STRICT_GRADIENT_THRESHOLD
            ),
        );
        false
    } else {
        true
    }
}
