//! Parameter records and resolved parameter specifications
//!
//! [`PARAMETER_TABLE`] holds one record per model parameter: its link, default
//! natural-scale bounds and the condition under which it belongs to a model.
//! [`ParameterSpec`] is the resolved, per-fit form of a record.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::data::capture::Channel;
use crate::detfn::DetFn;
use crate::parameters::bounds::Bounds;
use crate::parameters::link::LinkKind;

/// Name of the density parameter, which is always present and always first.
pub const DENSITY: &str = "D";

/// Condition under which a parameter belongs to a model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applicability {
    /// Every model.
    Always,
    /// Models whose detection function declares the parameter.
    DetectionFunction,
    /// Models whose capture data carries the given auxiliary channel.
    Channel(Channel),
}

/// Static description of one model parameter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParameterRecord {
    pub name: &'static str,
    pub link: LinkKind,
    pub lower: f64,
    pub upper: f64,
    pub applies: Applicability,
}

impl ParameterRecord {
    /// Default natural-scale bounds.
    pub fn default_bounds(&self) -> Bounds {
        Bounds {
            min: self.lower,
            max: self.upper,
        }
    }

    /// Whether this parameter is part of a model with detection function
    /// `detfn` and auxiliary `channels`.
    pub fn applies_to(&self, detfn: DetFn, channels: &[Channel]) -> bool {
        match self.applies {
            Applicability::Always => true,
            Applicability::DetectionFunction => detfn.parameter_names().contains(&self.name),
            Applicability::Channel(channel) => channels.contains(&channel),
        }
    }
}

const fn record(
    name: &'static str,
    link: LinkKind,
    lower: f64,
    upper: f64,
    applies: Applicability,
) -> ParameterRecord {
    ParameterRecord {
        name,
        link,
        lower,
        upper,
        applies,
    }
}

/// Every parameter known to the capture-recapture models, in declaration order.
pub const PARAMETER_TABLE: [ParameterRecord; 14] = [
    record(DENSITY, LinkKind::Log, 0.0, 1e8, Applicability::Always),
    record("g0", LinkKind::Logit, 0.0, 1.0, Applicability::DetectionFunction),
    record("sigma", LinkKind::Log, 0.0, 1e8, Applicability::DetectionFunction),
    record("z", LinkKind::Log, 0.0, 1e8, Applicability::DetectionFunction),
    record("shape", LinkKind::Identity, -100.0, 100.0, Applicability::DetectionFunction),
    record("shape.1", LinkKind::Log, 0.0, 1e8, Applicability::DetectionFunction),
    record("shape.2", LinkKind::Identity, -100.0, 100.0, Applicability::DetectionFunction),
    record("scale", LinkKind::Log, 0.0, 1e8, Applicability::DetectionFunction),
    record("b0.ss", LinkKind::Log, 0.0, 1e8, Applicability::DetectionFunction),
    record("b1.ss", LinkKind::Log, 0.0, 10.0, Applicability::DetectionFunction),
    record("sigma.ss", LinkKind::Log, 0.0, 1e5, Applicability::DetectionFunction),
    record("kappa", LinkKind::Log, 0.0, 700.0, Applicability::Channel(Channel::Bearing)),
    record("alpha", LinkKind::Log, 0.0, 1e4, Applicability::Channel(Channel::Dist)),
    record("sigma.toa", LinkKind::Log, 0.0, 1e8, Applicability::Channel(Channel::Toa)),
];

/// Look up the record of a parameter by name.
pub fn record_for(name: &str) -> Option<&'static ParameterRecord> {
    PARAMETER_TABLE.iter().find(|record| record.name == name)
}

/// Estimation phase of a parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    /// Held at its start value.
    Fixed,
    /// Estimated by the optimizer.
    Estimated,
}

impl Phase {
    /// Integer phase understood by the optimizer (-1 fixed, 0 estimated).
    pub fn code(&self) -> i32 {
        match self {
            Phase::Fixed => -1,
            Phase::Estimated => 0,
        }
    }
}

/// Fully resolved specification of one parameter for a single fit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterSpec {
    pub name: String,
    pub link: LinkKind,
    pub bounds: Bounds,
    pub phase: Phase,
    pub scale_factor: f64,
    /// Natural-scale start value (or fixed value)
    pub start: f64,
}

impl ParameterSpec {
    /// Start value on the link scale, clamped to finite values.
    pub fn link_start(&self) -> f64 {
        self.link.link_finite(self.start)
    }

    /// Bounds on the link scale.
    pub fn link_bounds(&self) -> (f64, f64) {
        self.bounds.to_link(self.link)
    }

    pub fn is_fixed(&self) -> bool {
        self.phase == Phase::Fixed
    }

    /// Name of the link-scale counterpart, e.g. `D_link`.
    pub fn link_name(&self) -> String {
        format!("{}_link", self.name)
    }
}

impl fmt::Display for ParameterSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:<10} link={:<8} start={:<12.6} bounds=[{}, {}] phase={:>2} sf={:.4}",
            self.name,
            self.link.name(),
            self.start,
            self.bounds.min,
            self.bounds.max,
            self.phase.code(),
            self.scale_factor
        )
    }
}
