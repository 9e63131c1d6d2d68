//! Parameter bounds implementation
//!
//! Bounds are held on the natural scale of a parameter and converted to the
//! link scale of that parameter when the optimizer input is assembled.

use serde::{Deserialize, Serialize};
use std::f64::{INFINITY, NEG_INFINITY};
use thiserror::Error;

use crate::parameters::link::LinkKind;

/// Errors that can occur when working with parameter bounds
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BoundsError {
    #[error("Invalid bounds: min ({min}) must not exceed max ({max})")]
    InvalidBounds { min: f64, max: f64 },

    #[error("Bounds need exactly two values, got {0}")]
    WrongLength(usize),
}

/// Natural-scale bounds of a parameter
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    /// Lower bound on the natural scale
    pub min: f64,

    /// Upper bound on the natural scale
    pub max: f64,
}

impl Serialize for Bounds {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeStruct;

        let mut state = serializer.serialize_struct("Bounds", 2)?;

        // JSON has no infinities
        if self.min.is_infinite() && self.min.is_sign_negative() {
            state.serialize_field("min", &serde_json::Value::Null)?;
        } else {
            state.serialize_field("min", &self.min)?;
        }

        if self.max.is_infinite() && self.max.is_sign_positive() {
            state.serialize_field("max", &serde_json::Value::Null)?;
        } else {
            state.serialize_field("max", &self.max)?;
        }

        state.end()
    }
}

impl<'de> Deserialize<'de> for Bounds {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct BoundsHelper {
            #[serde(default)]
            min: Option<f64>,

            #[serde(default)]
            max: Option<f64>,
        }

        let helper = BoundsHelper::deserialize(deserializer)?;

        Ok(Bounds {
            min: helper.min.unwrap_or(NEG_INFINITY),
            max: helper.max.unwrap_or(INFINITY),
        })
    }
}

impl Default for Bounds {
    fn default() -> Self {
        Self {
            min: NEG_INFINITY,
            max: INFINITY,
        }
    }
}

impl Bounds {
    /// Create bounds from a lower and an upper value
    ///
    /// # Examples
    ///
    /// ```
    /// use secrfit_rs::parameters::bounds::Bounds;
    ///
    /// let bounds = Bounds::new(0.0, 10.0).unwrap();
    /// assert_eq!(bounds.min, 0.0);
    /// assert_eq!(bounds.max, 10.0);
    /// assert!(Bounds::new(10.0, 0.0).is_err());
    /// ```
    pub fn new(min: f64, max: f64) -> Result<Self, BoundsError> {
        if !(min <= max) {
            return Err(BoundsError::InvalidBounds { min, max });
        }

        Ok(Self { min, max })
    }

    /// Create bounds from a user-supplied slice, which must hold exactly two values
    pub fn from_slice(values: &[f64]) -> Result<Self, BoundsError> {
        match values {
            [min, max] => Self::new(*min, *max),
            _ => Err(BoundsError::WrongLength(values.len())),
        }
    }

    /// Check if a value is within the bounds
    pub fn is_within_bounds(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }

    /// Clamp a value to be within the bounds
    pub fn clamp(&self, value: f64) -> f64 {
        value.clamp(self.min, self.max)
    }

    /// Convert the bounds to the link scale of `link`.
    ///
    /// Infinite images (e.g. `log(0)`) are clamped to the finite link-scale limit.
    ///
    /// # Examples
    ///
    /// ```
    /// use secrfit_rs::parameters::bounds::Bounds;
    /// use secrfit_rs::parameters::link::{LinkKind, LINK_SCALE_LIMIT};
    ///
    /// let (lower, upper) = Bounds::new(0.0, 1.0).unwrap().to_link(LinkKind::Logit);
    /// assert_eq!(lower, -LINK_SCALE_LIMIT);
    /// assert_eq!(upper, LINK_SCALE_LIMIT);
    /// ```
    pub fn to_link(&self, link: LinkKind) -> (f64, f64) {
        (link.link_finite(self.min), link.link_finite(self.max))
    }
}
