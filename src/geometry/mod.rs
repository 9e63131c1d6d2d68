//! # Spatial Geometry
//!
//! Detector-to-mask geometry consumed by the likelihood: distances, bearings
//! and, for time-of-arrival data, the per-history sum of squared arrival-time
//! residuals at every mask point. All matrices are detector-major
//! (`n_traps × n_mask`) except the time-of-arrival matrix, which is
//! `n_histories × n_mask`.
//!
//! Mask points are independent of one another, so every matrix is filled in
//! parallel with Rayon.

pub mod local;

pub use local::{local_mask_indices, MaskIndices};

use ndarray::{Array2, ArrayView1, Axis};
use rayon::prelude::*;
use serde::Serialize;
use std::f64::consts::PI;

use crate::data::{CaptureData, Channel, Mask, Traps};
use crate::error::{Result, SecrError};

/// Default speed of sound in air (m/s) for time-of-arrival models.
pub const DEFAULT_SOUND_SPEED: f64 = 330.0;

fn euclidean(a: ArrayView1<'_, f64>, b: ArrayView1<'_, f64>) -> f64 {
    let dx = a[0] - b[0];
    let dy = a[1] - b[1];
    (dx * dx + dy * dy).sqrt()
}

/// Bearing from `from` to `to`, measured clockwise from north in `[0, 2π)`.
fn bearing(from: ArrayView1<'_, f64>, to: ArrayView1<'_, f64>) -> f64 {
    let dx = to[0] - from[0];
    let dy = to[1] - from[1];
    let theta = dx.atan2(dy);
    if theta < 0.0 {
        theta + 2.0 * PI
    } else {
        theta
    }
}

fn pairwise<F>(a: &Array2<f64>, b: &Array2<f64>, f: F) -> Array2<f64>
where
    F: Fn(ArrayView1<'_, f64>, ArrayView1<'_, f64>) -> f64 + Sync,
{
    let mut out = Array2::zeros((a.nrows(), b.nrows()));
    out.axis_iter_mut(Axis(1))
        .into_par_iter()
        .enumerate()
        .for_each(|(j, mut column)| {
            let target = b.row(j);
            for (i, value) in column.iter_mut().enumerate() {
                *value = f(a.row(i), target);
            }
        });
    out
}

/// Distances between every trap and every mask point (`n_traps × n_mask`).
pub fn trap_mask_distances(traps: &Traps, mask: &Mask) -> Array2<f64> {
    pairwise(traps.coords(), mask.points(), euclidean)
}

/// Bearings from every trap to every mask point (`n_traps × n_mask`).
pub fn trap_mask_bearings(traps: &Traps, mask: &Mask) -> Array2<f64> {
    pairwise(traps.coords(), mask.points(), bearing)
}

/// Distances between every pair of traps (`n_traps × n_traps`).
pub fn trap_distances(traps: &Traps) -> Array2<f64> {
    pairwise(traps.coords(), traps.coords(), euclidean)
}

/// Sum of squared time-of-arrival residuals for each history at each mask point.
///
/// For history `i` and mask point `m`, the expected emission time implied by
/// detector `j` is `t_ij - d_jm / c`. The entry is the sum over detectors that
/// fired of the squared deviation of these implied times from their mean.
/// Histories detected by a single detector get 0.
pub fn toa_ssq(
    toa: &Array2<f64>,
    bincapt: &Array2<f64>,
    dists: &Array2<f64>,
    sound_speed: f64,
) -> Result<Array2<f64>> {
    if toa.dim() != bincapt.dim() {
        return Err(SecrError::DimensionMismatch(format!(
            "Time-of-arrival matrix has shape {:?}, expected {:?}",
            toa.dim(),
            bincapt.dim()
        )));
    }
    if dists.nrows() != bincapt.ncols() {
        return Err(SecrError::DimensionMismatch(format!(
            "Distance matrix has {} rows for {} traps",
            dists.nrows(),
            bincapt.ncols()
        )));
    }
    if !(sound_speed > 0.0) {
        return Err(SecrError::Computation(format!(
            "Sound speed must be positive, got {}",
            sound_speed
        )));
    }

    let n_mask = dists.ncols();
    let mut out = Array2::zeros((bincapt.nrows(), n_mask));

    out.axis_iter_mut(Axis(0))
        .into_par_iter()
        .enumerate()
        .for_each(|(i, mut row)| {
            let fired: Vec<usize> = bincapt
                .row(i)
                .iter()
                .enumerate()
                .filter(|(_, &b)| b > 0.0)
                .map(|(j, _)| j)
                .collect();
            if fired.len() < 2 {
                return;
            }
            for m in 0..n_mask {
                let implied: Vec<f64> = fired
                    .iter()
                    .map(|&j| toa[[i, j]] - dists[[j, m]] / sound_speed)
                    .collect();
                let mean = implied.iter().sum::<f64>() / implied.len() as f64;
                row[m] = implied.iter().map(|t| (t - mean).powi(2)).sum();
            }
        });

    Ok(out)
}

/// Geometry of one fit, computed once and shared by start values, the input
/// deck and result reconstruction.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SurveyGeometry {
    /// Trap-to-mask distances
    pub dists: Array2<f64>,
    /// Trap-to-trap distances
    pub trap_dists: Array2<f64>,
    /// Trap-to-mask bearings, when bearings were recorded
    pub bearings: Option<Array2<f64>>,
    /// Time-of-arrival sums of squares per unique history, when arrival times were recorded
    pub toa_ssq: Option<Array2<f64>>,
}

impl SurveyGeometry {
    /// Compute the geometry needed for `histories`.
    pub fn compute(traps: &Traps, mask: &Mask, histories: &CaptureData, sound_speed: f64) -> Result<Self> {
        let dists = trap_mask_distances(traps, mask);
        let bearings = histories
            .has_channel(Channel::Bearing)
            .then(|| trap_mask_bearings(traps, mask));
        let toa_ssq = histories
            .channel(Channel::Toa)
            .map(|toa| toa_ssq(toa, histories.bincapt(), &dists, sound_speed))
            .transpose()?;

        Ok(Self {
            trap_dists: trap_distances(traps),
            dists,
            bearings,
            toa_ssq,
        })
    }
}
