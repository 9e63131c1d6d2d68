//! Configuration of a single fit.
//!
//! A `FitConfig` is built at the call boundary and stored unchanged on the
//! resulting `FitResult`, so a fit can always report how it was requested.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

use crate::geometry::DEFAULT_SOUND_SPEED;

/// Caller-supplied settings and overrides for a fit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitConfig {
    /// Detection-function short name (`hn`, `hr`, `th`, `lth`, `ss`). Default: `hn`
    pub detfn: String,

    /// Signal strength link name (`identity` or `log`). Default: identity
    pub ss_link: Option<String>,

    /// Natural-scale start values by parameter name.
    pub sv: BTreeMap<String, f64>,

    /// Natural-scale bounds by parameter name; each entry must hold two values.
    pub bounds: BTreeMap<String, Vec<f64>>,

    /// Parameters held at a fixed natural-scale value.
    pub fix: BTreeMap<String, f64>,

    /// Scale factors by parameter name.
    pub sf: BTreeMap<String, f64>,

    /// Signal strength detection threshold.
    pub cutoff: Option<f64>,

    /// Speed of sound for time-of-arrival data. Default: 330
    pub sound_speed: f64,

    /// Restrict integration to each history's local mask points. Default: false
    pub local: bool,

    /// Number of detectable calls per detected individual.
    pub call_freqs: Option<Vec<f64>>,

    /// Whether the optimizer computes the Hessian. Default: on, unless call
    /// frequencies other than 1 are supplied
    pub hess: Option<bool>,

    /// Wall-clock limit for the optimizer run.
    pub timeout: Option<Duration>,
}

impl Default for FitConfig {
    fn default() -> Self {
        Self {
            detfn: "hn".to_string(),
            ss_link: None,
            sv: BTreeMap::new(),
            bounds: BTreeMap::new(),
            fix: BTreeMap::new(),
            sf: BTreeMap::new(),
            cutoff: None,
            sound_speed: DEFAULT_SOUND_SPEED,
            local: false,
            call_freqs: None,
            hess: None,
            timeout: None,
        }
    }
}

impl FitConfig {
    /// Create a configuration for the given detection function.
    pub fn new(detfn: &str) -> Self {
        Self {
            detfn: detfn.to_string(),
            ..Self::default()
        }
    }

    pub fn with_ss_link(mut self, link: &str) -> Self {
        self.ss_link = Some(link.to_string());
        self
    }

    pub fn with_sv(mut self, name: &str, value: f64) -> Self {
        self.sv.insert(name.to_string(), value);
        self
    }

    pub fn with_bounds(mut self, name: &str, bounds: Vec<f64>) -> Self {
        self.bounds.insert(name.to_string(), bounds);
        self
    }

    pub fn with_fix(mut self, name: &str, value: f64) -> Self {
        self.fix.insert(name.to_string(), value);
        self
    }

    pub fn with_sf(mut self, name: &str, value: f64) -> Self {
        self.sf.insert(name.to_string(), value);
        self
    }

    pub fn with_cutoff(mut self, cutoff: f64) -> Self {
        self.cutoff = Some(cutoff);
        self
    }

    pub fn with_sound_speed(mut self, speed: f64) -> Self {
        self.sound_speed = speed;
        self
    }

    pub fn with_local(mut self, local: bool) -> Self {
        self.local = local;
        self
    }

    pub fn with_call_freqs(mut self, freqs: Vec<f64>) -> Self {
        self.call_freqs = Some(freqs);
        self
    }

    pub fn with_hess(mut self, hess: bool) -> Self {
        self.hess = Some(hess);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Whether call frequencies other than 1 were supplied.
    pub fn has_call_heterogeneity(&self) -> bool {
        self.call_freqs
            .as_ref()
            .map_or(false, |freqs| freqs.iter().any(|&f| f != 1.0))
    }

    /// Mean call frequency, if call frequencies were supplied.
    pub fn mean_call_freq(&self) -> Option<f64> {
        self.call_freqs
            .as_ref()
            .filter(|freqs| !freqs.is_empty())
            .map(|freqs| freqs.iter().sum::<f64>() / freqs.len() as f64)
    }

    /// Whether the optimizer should compute the Hessian.
    pub fn compute_hessian(&self) -> bool {
        self.hess.unwrap_or(!self.has_call_heterogeneity())
    }
}
