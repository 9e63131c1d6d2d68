//! # Detection Functions
//!
//! Detection functions give the probability that a detector at distance `d`
//! from an activity centre detects the animal. Each family declares a fixed,
//! ordered set of parameter names.
//!
//! | family | parameters |
//! |---|---|
//! | half-normal (`hn`) | `g0`, `sigma` |
//! | hazard-rate (`hr`) | `g0`, `sigma`, `z` |
//! | threshold (`th`) | `shape`, `scale` |
//! | log-threshold (`lth`) | `shape.1`, `shape.2`, `scale` |
//! | signal strength (`ss`) | `b0.ss`, `b1.ss`, `sigma.ss` |
//!
//! The signal strength family comes in two variants, depending on whether the
//! expected received strength is linear in distance (identity link) or
//! log-linear (log link).

mod esa;

pub use esa::{effective_area, p_dot};

use serde::{Deserialize, Serialize};
use statrs::function::erf::{erf, erfc};
use std::f64::consts::SQRT_2;
use std::fmt;
use std::str::FromStr;

use crate::error::{Result, SecrError};

/// Link between distance and expected signal strength.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SsLink {
    #[default]
    Identity,
    Log,
}

impl SsLink {
    pub fn name(&self) -> &'static str {
        match self {
            SsLink::Identity => "identity",
            SsLink::Log => "log",
        }
    }

    /// Map a signal strength onto the scale on which it is linear in distance.
    pub fn apply(&self, ss: f64) -> f64 {
        match self {
            SsLink::Identity => ss,
            SsLink::Log => ss.ln(),
        }
    }
}

impl FromStr for SsLink {
    type Err = SecrError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "identity" => Ok(SsLink::Identity),
            "log" => Ok(SsLink::Log),
            other => Err(SecrError::UnknownSsLink(other.to_string())),
        }
    }
}

/// Detection-function family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetFn {
    HalfNormal,
    HazardRate,
    Threshold,
    LogThreshold,
    SignalStrength,
    LogSignalStrength,
}

impl DetFn {
    /// Resolve a family from its short name and, for signal strength, a link name.
    ///
    /// # Examples
    ///
    /// ```
    /// use secrfit_rs::detfn::DetFn;
    ///
    /// assert_eq!(DetFn::from_name("hn", None).unwrap(), DetFn::HalfNormal);
    /// assert_eq!(DetFn::from_name("ss", Some("log")).unwrap(), DetFn::LogSignalStrength);
    /// assert!(DetFn::from_name("ss", Some("sqrt")).is_err());
    /// ```
    pub fn from_name(name: &str, ss_link: Option<&str>) -> Result<Self> {
        match name {
            "hn" => Ok(DetFn::HalfNormal),
            "hr" => Ok(DetFn::HazardRate),
            "th" => Ok(DetFn::Threshold),
            "lth" => Ok(DetFn::LogThreshold),
            "ss" => {
                let link = ss_link.map(str::parse::<SsLink>).transpose()?;
                Ok(DetFn::signal_strength(link.unwrap_or_default()))
            }
            other => Err(SecrError::UnknownDetectionFunction(other.to_string())),
        }
    }

    pub fn signal_strength(link: SsLink) -> Self {
        match link {
            SsLink::Identity => DetFn::SignalStrength,
            SsLink::Log => DetFn::LogSignalStrength,
        }
    }

    /// Integer id of the family as understood by the optimizer.
    pub fn id(&self) -> u8 {
        match self {
            DetFn::HalfNormal => 1,
            DetFn::HazardRate => 2,
            DetFn::Threshold => 3,
            DetFn::LogThreshold => 4,
            DetFn::SignalStrength => 5,
            DetFn::LogSignalStrength => 6,
        }
    }

    /// Short name of the family.
    pub fn name(&self) -> &'static str {
        match self {
            DetFn::HalfNormal => "hn",
            DetFn::HazardRate => "hr",
            DetFn::Threshold => "th",
            DetFn::LogThreshold => "lth",
            DetFn::SignalStrength | DetFn::LogSignalStrength => "ss",
        }
    }

    pub fn is_signal_strength(&self) -> bool {
        matches!(self, DetFn::SignalStrength | DetFn::LogSignalStrength)
    }

    /// Signal strength link, for the signal strength families.
    pub fn ss_link(&self) -> Option<SsLink> {
        match self {
            DetFn::SignalStrength => Some(SsLink::Identity),
            DetFn::LogSignalStrength => Some(SsLink::Log),
            _ => None,
        }
    }

    /// Ordered parameter names of the family.
    pub fn parameter_names(&self) -> &'static [&'static str] {
        match self {
            DetFn::HalfNormal => &["g0", "sigma"],
            DetFn::HazardRate => &["g0", "sigma", "z"],
            DetFn::Threshold => &["shape", "scale"],
            DetFn::LogThreshold => &["shape.1", "shape.2", "scale"],
            DetFn::SignalStrength | DetFn::LogSignalStrength => &["b0.ss", "b1.ss", "sigma.ss"],
        }
    }
}

impl fmt::Display for DetFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.ss_link() {
            Some(link) => write!(f, "ss ({} link)", link.name()),
            None => f.write_str(self.name()),
        }
    }
}

/// Standard normal cumulative distribution function.
fn std_normal_cdf(x: f64) -> f64 {
    0.5 * erfc(-x / SQRT_2)
}

/// A detection function with concrete natural-scale parameter values.
#[derive(Debug, Clone, PartialEq)]
pub struct DetectionModel {
    detfn: DetFn,
    /// Values in the order of `detfn.parameter_names()`.
    values: Vec<f64>,
    cutoff: Option<f64>,
}

impl DetectionModel {
    /// Build a model by looking up each parameter of `detfn` through `lookup`.
    pub fn new<F>(detfn: DetFn, lookup: F, cutoff: Option<f64>) -> Result<Self>
    where
        F: Fn(&str) -> Option<f64>,
    {
        if detfn.is_signal_strength() && cutoff.is_none() {
            return Err(SecrError::MissingCutoff);
        }
        let values = detfn
            .parameter_names()
            .iter()
            .map(|name| {
                lookup(name).ok_or_else(|| {
                    SecrError::Computation(format!(
                        "no value available for detection function parameter '{}'",
                        name
                    ))
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            detfn,
            values,
            cutoff,
        })
    }

    pub fn detfn(&self) -> DetFn {
        self.detfn
    }

    /// Probability of detection at distance `d`.
    pub fn prob(&self, d: f64) -> f64 {
        let v = &self.values;
        match self.detfn {
            DetFn::HalfNormal => v[0] * (-(d * d) / (2.0 * v[1] * v[1])).exp(),
            DetFn::HazardRate => v[0] * (1.0 - (-(d / v[1]).powf(-v[2])).exp()),
            DetFn::Threshold => 0.5 - 0.5 * erf(d / v[1] - v[0]),
            DetFn::LogThreshold => 0.5 - 0.5 * erf(v[0] - (v[1] - v[2] * d).exp()),
            DetFn::SignalStrength | DetFn::LogSignalStrength => {
                let cutoff = self.cutoff.unwrap_or(f64::NAN);
                let linear = v[0] - v[1] * d;
                let expected = match self.detfn {
                    DetFn::LogSignalStrength => linear.exp(),
                    _ => linear,
                };
                1.0 - std_normal_cdf((cutoff - expected) / v[2])
            }
        }
    }
}
