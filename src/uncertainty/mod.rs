//! # Uncertainty Calculation
//!
//! Standard errors, covariance and correlation of the fitted parameters:
//!
//! - covariance from the optimizer's Hessian, or from its reported standard
//!   deviations and correlations
//! - delta-method propagation from the link scale to natural-scale
//!   parameters and derived quantities
//! - [`Uncertainty`], which distinguishes quantities that were never computed
//!   from quantities that were computed but are invalid for the design

mod covariance;
mod delta;

pub use covariance::{
    calculate_correlation, covariance_from_correlation, covariance_from_hessian, is_valid_covariance,
    standard_errors_from_covariance,
};
pub use delta::{delta_method_variance, natural_scale_covariance};

use serde::Serialize;

/// An uncertainty quantity together with the reason it may be missing.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", content = "value", rename_all = "snake_case")]
pub enum Uncertainty<T> {
    Available(T),
    /// No valid Hessian was computed.
    NotComputed,
    /// Computed but invalid for this design; carries the reason.
    Unavailable(String),
}

impl<T> Uncertainty<T> {
    pub fn is_available(&self) -> bool {
        matches!(self, Uncertainty::Available(_))
    }

    pub fn as_available(&self) -> Option<&T> {
        match self {
            Uncertainty::Available(value) => Some(value),
            _ => None,
        }
    }
}
