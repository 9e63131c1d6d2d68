//! Warning collection with per-channel scoped suppression.
//!
//! Every warning raised while a fit is prepared, run and reconstructed goes
//! through [`Diagnostics`], which forwards it to the `log` facade and keeps a
//! copy for the caller. A single channel can be silenced for a scope with
//! [`Diagnostics::suppress`]; the returned guard restores the channel when it
//! is dropped, whichever way the scope is left.

use serde::Serialize;
use std::collections::HashSet;
use std::fmt;
use std::ops::{Deref, DerefMut};

/// Source of a warning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum DiagnosticChannel {
    /// User overrides that were dropped or adjusted.
    ConfigurationDrop,
    /// Detection-function selection forced by the data.
    ModelSelection,
    /// Local integration domains.
    Locality,
    /// Optimizer gradient checks.
    Convergence,
    /// Values in the optimizer output that could not be read.
    OutputParse,
    /// Repeated-detection (call frequency) adjustments.
    Heterogeneity,
}

/// A recorded warning.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Diagnostic {
    pub channel: DiagnosticChannel,
    pub message: String,
    /// Whether the warning was raised while its channel was suppressed.
    pub suppressed: bool,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:?}] {}", self.channel, self.message)
    }
}

/// Collector for the warnings of one fit.
#[derive(Debug, Clone, Default)]
pub struct Diagnostics {
    records: Vec<Diagnostic>,
    suppressed: HashSet<DiagnosticChannel>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raise a warning on `channel`.
    pub fn warn(&mut self, channel: DiagnosticChannel, message: impl Into<String>) {
        let message = message.into();
        let suppressed = self.suppressed.contains(&channel);
        if suppressed {
            log::debug!("suppressed warning ({:?}): {}", channel, message);
        } else {
            log::warn!("{}", message);
        }
        self.records.push(Diagnostic {
            channel,
            message,
            suppressed,
        });
    }

    pub fn is_suppressed(&self, channel: DiagnosticChannel) -> bool {
        self.suppressed.contains(&channel)
    }

    /// Silence `channel` until the returned guard is dropped.
    pub fn suppress(&mut self, channel: DiagnosticChannel) -> Suppression<'_> {
        let was_suppressed = !self.suppressed.insert(channel);
        Suppression {
            diagnostics: self,
            channel,
            was_suppressed,
        }
    }

    /// All recorded warnings, in the order they were raised.
    pub fn records(&self) -> &[Diagnostic] {
        &self.records
    }

    /// Messages of the warnings that were not suppressed.
    pub fn messages(&self) -> Vec<String> {
        self.records
            .iter()
            .filter(|d| !d.suppressed)
            .map(|d| d.message.clone())
            .collect()
    }

    pub fn count(&self, channel: DiagnosticChannel) -> usize {
        self.records.iter().filter(|d| d.channel == channel).count()
    }
}

/// Guard returned by [`Diagnostics::suppress`].
pub struct Suppression<'a> {
    diagnostics: &'a mut Diagnostics,
    channel: DiagnosticChannel,
    was_suppressed: bool,
}

impl Deref for Suppression<'_> {
    type Target = Diagnostics;

    fn deref(&self) -> &Diagnostics {
        self.diagnostics
    }
}

impl DerefMut for Suppression<'_> {
    fn deref_mut(&mut self) -> &mut Diagnostics {
        self.diagnostics
    }
}

impl Drop for Suppression<'_> {
    fn drop(&mut self) {
        if !self.was_suppressed {
            self.diagnostics.suppressed.remove(&self.channel);
        }
    }
}
