//! # Automatic Start Values
//!
//! Parameters without a caller-supplied start value get one from a strategy
//! looked up by parameter name in a [`StartRegistry`]. Strategies see the
//! whole [`StartContext`], including the values resolved before them.
//!
//! Density depends on the detection-function parameters (it divides the
//! number of detections by the effective survey area), and density is always
//! the first declared parameter, so parameters are resolved in reverse
//! declaration order.

mod strategies;

pub use strategies::mean_recapture_distance;

use ndarray::Array2;
use std::collections::{BTreeMap, HashMap};
use std::fmt;

use crate::data::{CaptureData, CompressedHistories, Mask, Traps};
use crate::detfn::{DetFn, SsLink};
use crate::error::{Result, SecrError};
use crate::parameters::{ModelDefinition, DENSITY};

/// A start-value strategy for one parameter.
pub type StartStrategy = fn(&StartContext<'_>) -> Result<f64>;

/// Shared inputs of the start-value strategies.
#[derive(Debug, Clone)]
pub struct StartContext<'a> {
    /// Detections as recorded, one row per individual
    pub capture: &'a CaptureData,
    pub compressed: &'a CompressedHistories,
    pub traps: &'a Traps,
    pub mask: &'a Mask,
    /// Trap-to-mask distances (`n_traps × n_mask`)
    pub dists: &'a Array2<f64>,
    /// Trap-to-trap distances
    pub trap_dists: &'a Array2<f64>,
    pub detfn: DetFn,
    pub cutoff: Option<f64>,
    /// Natural-scale values resolved so far
    pub values: BTreeMap<String, f64>,
}

impl StartContext<'_> {
    /// Resolved natural-scale value of a parameter.
    pub fn value(&self, name: &str) -> Option<f64> {
        self.values.get(name).copied()
    }

    fn ss_link(&self) -> Result<SsLink> {
        self.detfn.ss_link().ok_or_else(|| {
            SecrError::Computation(format!(
                "Signal strength start values requested for detection function '{}'",
                self.detfn
            ))
        })
    }
}

/// Mapping from parameter name to its start-value strategy.
#[derive(Clone)]
pub struct StartRegistry {
    strategies: HashMap<&'static str, StartStrategy>,
}

impl fmt::Debug for StartRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&str> = self.strategies.keys().copied().collect();
        names.sort_unstable();
        f.debug_struct("StartRegistry").field("strategies", &names).finish()
    }
}

impl Default for StartRegistry {
    fn default() -> Self {
        let mut registry = Self::empty();
        registry.register(DENSITY, strategies::density);
        registry.register("g0", strategies::g0);
        registry.register("sigma", strategies::sigma);
        registry.register("z", strategies::z);
        registry.register("shape", strategies::shape);
        registry.register("shape.1", strategies::shape_1);
        registry.register("shape.2", strategies::shape_2);
        registry.register("scale", strategies::scale);
        registry.register("b0.ss", strategies::b0_ss);
        registry.register("b1.ss", strategies::b1_ss);
        registry.register("sigma.ss", strategies::sigma_ss);
        registry.register("kappa", strategies::kappa);
        registry.register("alpha", strategies::alpha);
        registry.register("sigma.toa", strategies::sigma_toa);
        registry
    }
}

/// Start values together with the order in which missing ones were computed.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedStarts {
    pub values: BTreeMap<String, f64>,
    pub resolution_order: Vec<String>,
}

impl StartRegistry {
    /// Registry with the built-in strategy for every known parameter.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn empty() -> Self {
        Self {
            strategies: HashMap::new(),
        }
    }

    /// Register (or replace) the strategy for `name`.
    pub fn register(&mut self, name: &'static str, strategy: StartStrategy) {
        self.strategies.insert(name, strategy);
    }

    pub fn get(&self, name: &str) -> Option<StartStrategy> {
        self.strategies.get(name).copied()
    }

    /// Fill in the start values missing from `ctx.values` for every parameter of `model`.
    pub fn resolve(&self, model: &ModelDefinition, mut ctx: StartContext<'_>) -> Result<ResolvedStarts> {
        let mut resolution_order = Vec::new();

        for record in model.records().iter().rev() {
            if ctx.values.contains_key(record.name) {
                continue;
            }
            let strategy = self.get(record.name).ok_or_else(|| {
                SecrError::Computation(format!("No start-value strategy for parameter '{}'", record.name))
            })?;
            let value = strategy(&ctx)?;
            if !value.is_finite() {
                return Err(SecrError::Computation(format!(
                    "Start value for '{}' is not finite ({})",
                    record.name, value
                )));
            }
            log::debug!("start value for {}: {}", record.name, value);
            ctx.values.insert(record.name.to_string(), value);
            resolution_order.push(record.name.to_string());
        }

        Ok(ResolvedStarts {
            values: ctx.values,
            resolution_order,
        })
    }
}
