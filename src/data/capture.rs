//! Capture histories
//!
//! A capture history is a set of detection matrices, one per information
//! channel, each `n_detections × n_traps`. The binary channel is mandatory;
//! the auxiliary channels carry a measurement wherever the binary channel
//! records a detection and 0 elsewhere.

use ndarray::{Array2, ArrayD, Ix2};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::data::traps::Traps;
use crate::error::{Result, SecrError};

/// Name of the mandatory binary channel.
pub const BINARY_CHANNEL: &str = "bincapt";

/// Auxiliary information channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    /// Estimated bearing to the animal (radians).
    Bearing,
    /// Estimated distance to the animal.
    Dist,
    /// Received signal strength.
    Ss,
    /// Time of arrival (seconds).
    Toa,
    /// Exactly known animal location (mark-recapture distance sampling).
    Mrds,
}

impl Channel {
    pub const ALL: [Channel; 5] = [
        Channel::Bearing,
        Channel::Dist,
        Channel::Ss,
        Channel::Toa,
        Channel::Mrds,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Channel::Bearing => "bearing",
            Channel::Dist => "dist",
            Channel::Ss => "ss",
            Channel::Toa => "toa",
            Channel::Mrds => "mrds",
        }
    }

    /// The extra parameter this channel adds to the model, if any.
    pub fn extra_parameter(&self) -> Option<&'static str> {
        match self {
            Channel::Bearing => Some("kappa"),
            Channel::Dist => Some("alpha"),
            Channel::Toa => Some("sigma.toa"),
            // Signal strength parameters belong to the detection function;
            // known locations need no error model.
            Channel::Ss | Channel::Mrds => None,
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Channel {
    type Err = SecrError;

    fn from_str(s: &str) -> Result<Self> {
        Channel::ALL
            .iter()
            .copied()
            .find(|channel| channel.name() == s)
            .ok_or_else(|| SecrError::UnknownChannel(s.to_string()))
    }
}

/// The set of detection matrices for one survey.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CaptureData {
    bincapt: Array2<f64>,
    channels: BTreeMap<Channel, Array2<f64>>,
}

impl CaptureData {
    /// Create capture data from the binary channel alone.
    ///
    /// Any nonzero entry is recorded as a detection (1).
    ///
    /// # Examples
    ///
    /// ```
    /// use ndarray::arr2;
    /// use secrfit_rs::data::CaptureData;
    ///
    /// let capt = CaptureData::new(arr2(&[[1.0, 0.0], [2.0, 1.0]]));
    /// assert_eq!(capt.n_detections(), 2);
    /// assert_eq!(capt.bincapt()[[1, 0]], 1.0);
    /// ```
    pub fn new(bincapt: Array2<f64>) -> Self {
        Self {
            bincapt: bincapt.mapv(|v| if v != 0.0 { 1.0 } else { 0.0 }),
            channels: BTreeMap::new(),
        }
    }

    /// Attach an auxiliary channel, checking its shape against the binary channel.
    pub fn with_channel(mut self, channel: Channel, values: Array2<f64>) -> Result<Self> {
        let expected = self.bincapt.dim();
        if values.dim() != expected {
            return Err(SecrError::ChannelShapeMismatch {
                channel: channel.name().to_string(),
                expected,
                found: values.dim(),
            });
        }
        self.channels.insert(channel, values);
        Ok(self)
    }

    /// Build capture data from named arrays of arbitrary dimension.
    ///
    /// This is the validation boundary for loosely typed input: the binary
    /// channel must be present, every array must be two-dimensional and every
    /// channel must share the binary channel's shape.
    pub fn from_named<I, S>(arrays: I) -> Result<Self>
    where
        I: IntoIterator<Item = (S, ArrayD<f64>)>,
        S: AsRef<str>,
    {
        let mut bincapt = None;
        let mut auxiliary = Vec::new();

        for (name, array) in arrays {
            let name = name.as_ref();
            let ndim = array.ndim();
            let matrix = array
                .into_dimensionality::<Ix2>()
                .map_err(|_| SecrError::NonMatrixChannel {
                    channel: name.to_string(),
                    ndim,
                })?;

            if name == BINARY_CHANNEL {
                bincapt = Some(matrix);
            } else {
                auxiliary.push((name.parse::<Channel>()?, matrix));
            }
        }

        let mut capt = CaptureData::new(bincapt.ok_or(SecrError::MissingBinaryChannel)?);
        for (channel, matrix) in auxiliary {
            capt = capt.with_channel(channel, matrix)?;
        }
        Ok(capt)
    }

    /// Assemble from already validated parts.
    pub(crate) fn from_parts(bincapt: Array2<f64>, channels: BTreeMap<Channel, Array2<f64>>) -> Self {
        Self { bincapt, channels }
    }

    /// Check that the matrices have one column per trap.
    pub fn validate_traps(&self, traps: &Traps) -> Result<()> {
        if self.n_traps() != traps.len() {
            return Err(SecrError::TrapCountMismatch {
                columns: self.n_traps(),
                traps: traps.len(),
            });
        }
        Ok(())
    }

    pub fn n_detections(&self) -> usize {
        self.bincapt.nrows()
    }

    pub fn n_traps(&self) -> usize {
        self.bincapt.ncols()
    }

    pub fn bincapt(&self) -> &Array2<f64> {
        &self.bincapt
    }

    pub fn channel(&self, channel: Channel) -> Option<&Array2<f64>> {
        self.channels.get(&channel)
    }

    pub fn has_channel(&self, channel: Channel) -> bool {
        self.channels.contains_key(&channel)
    }

    /// Auxiliary channels present, in canonical order.
    pub fn channels(&self) -> Vec<Channel> {
        self.channels.keys().copied().collect()
    }

    pub(crate) fn channel_map(&self) -> &BTreeMap<Channel, Array2<f64>> {
        &self.channels
    }

    /// Largest strictly positive signal strength, if signal strengths are present.
    pub fn max_signal_strength(&self) -> Option<f64> {
        self.channel(Channel::Ss).and_then(|ss| {
            ss.iter()
                .copied()
                .filter(|v| *v > 0.0)
                .fold(None, |acc: Option<f64>, v| Some(acc.map_or(v, |a| a.max(v))))
        })
    }
}
