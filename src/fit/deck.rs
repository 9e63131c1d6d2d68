//! Input deck handed to the optimizer.

use ndarray::Array2;
use serde::Serialize;
use std::collections::BTreeMap;

use crate::data::{CompressedHistories, Mask};
use crate::detfn::DetFn;
use crate::geometry::{MaskIndices, SurveyGeometry};
use crate::parameters::ParameterSpec;

/// Floor used by the optimizer to keep probability products from underflowing.
pub const DBL_MIN: f64 = 1e-150;

/// One parameter as seen by the optimizer, on the link scale.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeckParameter {
    pub name: String,
    pub link_id: u8,
    pub start: f64,
    pub lower: f64,
    pub upper: f64,
    pub phase: i32,
    pub scale_factor: f64,
}

impl From<&ParameterSpec> for DeckParameter {
    fn from(spec: &ParameterSpec) -> Self {
        let (lower, upper) = spec.link_bounds();
        Self {
            name: spec.link_name(),
            link_id: spec.link.id(),
            start: spec.link_start(),
            lower,
            upper,
            phase: spec.phase.code(),
            scale_factor: spec.scale_factor,
        }
    }
}

/// Everything the optimizer needs to evaluate the likelihood.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InputDeck {
    pub detfn_id: u8,
    pub parameters: Vec<DeckParameter>,
    pub n_unique: usize,
    pub n_traps: usize,
    pub n_mask: usize,
    pub freqs: Vec<usize>,
    pub bincapt: Array2<f64>,
    /// Auxiliary channels by name, rows aligned with `bincapt`
    pub channels: BTreeMap<String, Array2<f64>>,
    pub mask_indices: MaskIndices,
    pub dists: Array2<f64>,
    pub bearings: Option<Array2<f64>>,
    pub toa_ssq: Option<Array2<f64>>,
    pub area: f64,
    pub buffer: f64,
    pub cutoff: Option<f64>,
    pub sound_speed: f64,
    pub dbl_min: f64,
}

impl InputDeck {
    #[allow(clippy::too_many_arguments)]
    pub fn assemble(
        detfn: DetFn,
        specs: &[ParameterSpec],
        histories: &CompressedHistories,
        mask: &Mask,
        geometry: &SurveyGeometry,
        mask_indices: MaskIndices,
        cutoff: Option<f64>,
        sound_speed: f64,
    ) -> Self {
        let data = &histories.data;
        let channels = data
            .channel_map()
            .iter()
            .map(|(channel, values)| (channel.name().to_string(), values.clone()))
            .collect();

        Self {
            detfn_id: detfn.id(),
            parameters: specs.iter().map(DeckParameter::from).collect(),
            n_unique: histories.n_unique(),
            n_traps: data.n_traps(),
            n_mask: mask.len(),
            freqs: histories.freqs.clone(),
            bincapt: data.bincapt().clone(),
            channels,
            mask_indices,
            dists: geometry.dists.clone(),
            bearings: geometry.bearings.clone(),
            toa_ssq: geometry.toa_ssq.clone(),
            area: mask.area(),
            buffer: mask.buffer(),
            cutoff,
            sound_speed,
            dbl_min: DBL_MIN,
        }
    }

    /// Link-scale start values in parameter order.
    pub fn start_values(&self) -> Vec<f64> {
        self.parameters.iter().map(|p| p.start).collect()
    }

    /// Indices of the estimated parameters.
    pub fn free_indices(&self) -> Vec<usize> {
        self.parameters
            .iter()
            .enumerate()
            .filter(|(_, p)| p.phase >= 0)
            .map(|(i, _)| i)
            .collect()
    }
}
