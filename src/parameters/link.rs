//! Link functions
//!
//! Each model parameter is estimated on a link scale that maps its natural
//! range onto the real line. This module provides the three link kinds used by
//! the capture-recapture models and the registry that assigns one of them to
//! every parameter name.

use serde::{Deserialize, Serialize};

use crate::error::{Result, SecrError};
use crate::parameters::spec::PARAMETER_TABLE;

/// Magnitude at which link-scale values are clamped before they reach the optimizer.
///
/// `log(0)` and `logit(1)` are infinite; the optimizer needs finite numbers.
pub const LINK_SCALE_LIMIT: f64 = 1e8;

/// A monotonic transform between the natural and the link scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkKind {
    /// `η = x`
    Identity,
    /// `η = ln x`, natural domain (0, ∞)
    Log,
    /// `η = ln(x / (1 - x))`, natural domain (0, 1)
    Logit,
}

impl LinkKind {
    /// Integer id of the link as understood by the optimizer.
    pub fn id(&self) -> u8 {
        match self {
            LinkKind::Identity => 1,
            LinkKind::Log => 2,
            LinkKind::Logit => 3,
        }
    }

    /// Canonical lowercase name.
    pub fn name(&self) -> &'static str {
        match self {
            LinkKind::Identity => "identity",
            LinkKind::Log => "log",
            LinkKind::Logit => "logit",
        }
    }

    /// Transform a natural-scale value to the link scale.
    ///
    /// # Examples
    ///
    /// ```
    /// use secrfit_rs::parameters::link::LinkKind;
    ///
    /// assert_eq!(LinkKind::Identity.link(3.0), 3.0);
    /// assert!((LinkKind::Log.link(1.0)).abs() < 1e-12);
    /// assert!((LinkKind::Logit.link(0.5)).abs() < 1e-12);
    /// ```
    pub fn link(&self, x: f64) -> f64 {
        match self {
            LinkKind::Identity => x,
            LinkKind::Log => x.ln(),
            LinkKind::Logit => (x / (1.0 - x)).ln(),
        }
    }

    /// Transform a link-scale value back to the natural scale.
    pub fn inverse(&self, eta: f64) -> f64 {
        match self {
            LinkKind::Identity => eta,
            LinkKind::Log => eta.exp(),
            LinkKind::Logit => 1.0 / (1.0 + (-eta).exp()),
        }
    }

    /// Derivative of the inverse link, `dx/dη`, used by the delta method.
    pub fn inverse_derivative(&self, eta: f64) -> f64 {
        match self {
            LinkKind::Identity => 1.0,
            LinkKind::Log => eta.exp(),
            LinkKind::Logit => {
                let p = self.inverse(eta);
                p * (1.0 - p)
            }
        }
    }

    /// Link transform clamped to `±LINK_SCALE_LIMIT`.
    ///
    /// NaN inputs stay NaN so that invalid values are not masked.
    pub fn link_finite(&self, x: f64) -> f64 {
        let eta = self.link(x);
        if eta.is_nan() {
            eta
        } else {
            eta.clamp(-LINK_SCALE_LIMIT, LINK_SCALE_LIMIT)
        }
    }

    /// Whether `x` lies in the open natural domain of this link.
    pub fn in_domain(&self, x: f64) -> bool {
        match self {
            LinkKind::Identity => x.is_finite(),
            LinkKind::Log => x > 0.0 && x.is_finite(),
            LinkKind::Logit => x > 0.0 && x < 1.0,
        }
    }

    /// Whether `x` can bound a parameter on this link.
    ///
    /// Endpoints of the natural domain are allowed; their link images are
    /// clamped by [`LinkKind::link_finite`].
    pub fn admits_bound(&self, x: f64) -> bool {
        match self {
            LinkKind::Identity => !x.is_nan(),
            LinkKind::Log => x >= 0.0,
            LinkKind::Logit => (0.0..=1.0).contains(&x),
        }
    }
}

/// Lookup from parameter name to link kind.
///
/// The assignment is part of the model definition; it cannot be configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct LinkRegistry;

impl LinkRegistry {
    /// Create a registry over the built-in parameter table.
    pub fn new() -> Self {
        Self
    }

    /// Link kind for a parameter name, if the name is known.
    pub fn get(&self, name: &str) -> Option<LinkKind> {
        PARAMETER_TABLE
            .iter()
            .find(|record| record.name == name)
            .map(|record| record.link)
    }

    /// Apply the link of `name` to `x`.
    pub fn link(&self, name: &str, x: f64) -> Option<f64> {
        self.get(name).map(|kind| kind.link(x))
    }

    /// Apply the inverse link of `name` to `eta`.
    pub fn inverse(&self, name: &str, eta: f64) -> Option<f64> {
        self.get(name).map(|kind| kind.inverse(eta))
    }

    /// Link kind for a parameter the caller expects to be known.
    pub fn require(&self, name: &str) -> Result<LinkKind> {
        self.get(name)
            .ok_or_else(|| SecrError::Computation(format!("no link function registered for '{}'", name)))
    }
}
