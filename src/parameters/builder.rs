//! Parameter specification builder
//!
//! Turns a detection-function family, the auxiliary channels present in the
//! data and the caller's overrides into the ordered list of
//! [`ParameterSpec`]s handed to the optimizer.
//!
//! Building happens in two steps because start values depend on one another:
//!
//! 1. [`ParameterSpecBuilder::new`] filters and validates the overrides and
//!    decides which parameters are fixed.
//! 2. Once every start value is known (see [`crate::autostart`]),
//!    [`ParameterSpecBuilder::build`] produces the specs, including the
//!    default scale factors, which depend on the start values.

use std::collections::BTreeMap;

use crate::data::capture::{CaptureData, Channel};
use crate::detfn::DetFn;
use crate::error::{Result, SecrError};
use crate::fit::config::FitConfig;
use crate::fit::diagnostics::{DiagnosticChannel, Diagnostics};
use crate::parameters::bounds::{Bounds, BoundsError};
use crate::parameters::link::LinkRegistry;
use crate::parameters::spec::{record_for, ParameterRecord, ParameterSpec, Phase, DENSITY};

/// The parameter records of one model, in declaration order.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelDefinition {
    detfn: DetFn,
    channels: Vec<Channel>,
    records: Vec<&'static ParameterRecord>,
}

impl ModelDefinition {
    /// Assemble the records for a family and a set of auxiliary channels.
    ///
    /// Density comes first, then the detection-function parameters, then one
    /// parameter per auxiliary channel that carries one.
    pub fn new(detfn: DetFn, channels: &[Channel]) -> Self {
        let names = std::iter::once(DENSITY)
            .chain(detfn.parameter_names().iter().copied())
            .chain(Channel::ALL.iter().filter(|c| channels.contains(c)).filter_map(|c| c.extra_parameter()));

        let records = names
            .filter_map(record_for)
            .filter(|record| record.applies_to(detfn, channels))
            .collect();

        Self {
            detfn,
            channels: channels.to_vec(),
            records,
        }
    }

    /// Resolve the model for a configuration and the capture data it will be fitted to.
    ///
    /// Signal strength data forces the signal strength family.
    pub fn resolve(config: &FitConfig, capt: &CaptureData, diag: &mut Diagnostics) -> Result<Self> {
        let has_ss = capt.has_channel(Channel::Ss);
        let requested = if has_ss && config.detfn != "ss" {
            diag.warn(
                DiagnosticChannel::ModelSelection,
                format!(
                    "Detection function '{}' is ignored as signal strength information is provided; a signal strength detection function is fitted instead",
                    config.detfn
                ),
            );
            "ss"
        } else {
            config.detfn.as_str()
        };

        let detfn = DetFn::from_name(requested, config.ss_link.as_deref())?;
        if detfn.is_signal_strength() {
            if !has_ss {
                return Err(SecrError::MissingSsChannel);
            }
            if config.cutoff.is_none() {
                return Err(SecrError::MissingCutoff);
            }
        }

        Ok(Self::new(detfn, &capt.channels()))
    }

    pub fn detfn(&self) -> DetFn {
        self.detfn
    }

    pub fn channels(&self) -> &[Channel] {
        &self.channels
    }

    pub fn records(&self) -> &[&'static ParameterRecord] {
        &self.records
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.records.iter().map(|r| r.name).collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.records.iter().any(|r| r.name == name)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Validated overrides for one model, ready to be turned into specs.
#[derive(Debug, Clone)]
pub struct ParameterSpecBuilder {
    model: ModelDefinition,
    links: LinkRegistry,
    sv: BTreeMap<String, f64>,
    bounds: BTreeMap<String, Bounds>,
    fix: BTreeMap<String, f64>,
    sf: BTreeMap<String, f64>,
}

/// Keep the entries of `map` whose key belongs to `model`, warning about the rest.
fn retain_known<T: Clone>(
    map: &BTreeMap<String, T>,
    model: &ModelDefinition,
    what: &str,
    diag: &mut Diagnostics,
) -> BTreeMap<String, T> {
    let mut kept = BTreeMap::new();
    for (name, value) in map {
        if model.contains(name) {
            kept.insert(name.clone(), value.clone());
        } else {
            diag.warn(
                DiagnosticChannel::ConfigurationDrop,
                format!(
                    "{} for '{}' is ignored as '{}' is not a parameter of this model",
                    what, name, name
                ),
            );
        }
    }
    kept
}

impl ParameterSpecBuilder {
    /// Validate the overrides of `config` against `model`.
    ///
    /// Overrides naming parameters outside the model are dropped with a
    /// warning. Bounds must hold exactly two ordered values inside the
    /// natural domain of the parameter's link.
    pub fn new(model: ModelDefinition, config: &FitConfig, diag: &mut Diagnostics) -> Result<Self> {
        let mut sv = retain_known(&config.sv, &model, "Start value", diag);
        let raw_bounds = retain_known(&config.bounds, &model, "Bounds", diag);
        let fix = retain_known(&config.fix, &model, "Fixed value", diag);
        let sf = retain_known(&config.sf, &model, "Scale factor", diag);

        let links = LinkRegistry::new();
        let mut bounds = BTreeMap::new();
        for (name, values) in raw_bounds {
            let parsed = Bounds::from_slice(&values).map_err(|err| match err {
                BoundsError::WrongLength(len) => SecrError::MalformedBounds {
                    name: name.clone(),
                    len,
                },
                BoundsError::InvalidBounds { min, max } => SecrError::InvalidBounds {
                    name: name.clone(),
                    lower: min,
                    upper: max,
                },
            })?;
            let link = links.require(&name)?;
            if !(link.admits_bound(parsed.min) && link.admits_bound(parsed.max)) {
                return Err(SecrError::InvalidBounds {
                    name,
                    lower: parsed.min,
                    upper: parsed.max,
                });
            }
            bounds.insert(name, parsed);
        }

        for name in fix.keys() {
            if sv.remove(name).is_some() {
                diag.warn(
                    DiagnosticChannel::ConfigurationDrop,
                    format!("Start value for '{}' is ignored as the parameter is fixed", name),
                );
            }
        }

        Ok(Self {
            model,
            links,
            sv,
            bounds,
            fix,
            sf,
        })
    }

    pub fn model(&self) -> &ModelDefinition {
        &self.model
    }

    pub fn is_fixed(&self, name: &str) -> bool {
        self.fix.contains_key(name)
    }

    /// Start values already determined by the caller (fixed values included).
    pub fn known_starts(&self) -> BTreeMap<String, f64> {
        let mut known = self.sv.clone();
        known.extend(self.fix.iter().map(|(k, v)| (k.clone(), *v)));
        known
    }

    /// Bounds in force for a parameter (override or default).
    pub fn bounds_for(&self, record: &ParameterRecord) -> Bounds {
        self.bounds
            .get(record.name)
            .copied()
            .unwrap_or_else(|| record.default_bounds())
    }

    /// Produce the ordered specs from a complete set of natural-scale start values.
    pub fn build(&self, starts: &BTreeMap<String, f64>, diag: &mut Diagnostics) -> Result<Vec<ParameterSpec>> {
        let mut specs = Vec::with_capacity(self.model.len());

        for record in self.model.records() {
            let start = *starts.get(record.name).ok_or_else(|| {
                SecrError::Computation(format!("no start value resolved for '{}'", record.name))
            })?;
            let link = self.links.require(record.name)?;
            let bounds = self.bounds_for(record);
            let phase = if self.is_fixed(record.name) {
                Phase::Fixed
            } else {
                Phase::Estimated
            };

            let start = if phase == Phase::Estimated && !bounds.is_within_bounds(start) {
                let clamped = bounds.clamp(start);
                diag.warn(
                    DiagnosticChannel::ConfigurationDrop,
                    format!(
                        "Start value {} for '{}' lies outside [{}, {}]; using {}",
                        start, record.name, bounds.min, bounds.max, clamped
                    ),
                );
                clamped
            } else {
                start
            };

            specs.push(ParameterSpec {
                name: record.name.to_string(),
                link,
                bounds,
                phase,
                scale_factor: 1.0,
                start,
            });
        }

        let largest = specs
            .iter()
            .filter(|s| !s.is_fixed())
            .map(|s| s.link_start().abs())
            .fold(0.0_f64, f64::max);

        for spec in specs.iter_mut() {
            spec.scale_factor = match self.sf.get(&spec.name) {
                Some(&user) => user,
                None if spec.is_fixed() => 1.0,
                None => {
                    let ratio = largest / spec.link_start().abs();
                    if ratio.is_finite() && ratio > 0.0 {
                        ratio
                    } else {
                        1.0
                    }
                }
            };
        }

        Ok(specs)
    }
}
