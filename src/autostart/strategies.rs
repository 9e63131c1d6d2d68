//! Start-value strategies for every parameter in the model tables.

use std::f64::consts::LN_2;

use super::StartContext;
use crate::detfn::{effective_area, DetFn, DetectionModel};
use crate::error::{Result, SecrError};

pub(super) fn g0(_ctx: &StartContext<'_>) -> Result<f64> {
    Ok(0.95)
}

pub(super) fn sigma(ctx: &StartContext<'_>) -> Result<f64> {
    mean_recapture_distance(ctx)
}

pub(super) fn z(_ctx: &StartContext<'_>) -> Result<f64> {
    Ok(1.0)
}

pub(super) fn shape(_ctx: &StartContext<'_>) -> Result<f64> {
    Ok(2.0)
}

pub(super) fn shape_1(_ctx: &StartContext<'_>) -> Result<f64> {
    Ok(2.0)
}

pub(super) fn shape_2(_ctx: &StartContext<'_>) -> Result<f64> {
    Ok(LN_2 + 2.0)
}

/// Threshold: g(2r̄) = ½. Log-threshold: the reciprocal, for the same crossing.
pub(super) fn scale(ctx: &StartContext<'_>) -> Result<f64> {
    let rbar = mean_recapture_distance(ctx)?;
    Ok(match ctx.detfn {
        DetFn::LogThreshold => 1.0 / rbar,
        _ => rbar,
    })
}

pub(super) fn b0_ss(ctx: &StartContext<'_>) -> Result<f64> {
    let link = ctx.ss_link()?;
    Ok(link.apply(max_signal_strength(ctx)?))
}

pub(super) fn b1_ss(ctx: &StartContext<'_>) -> Result<f64> {
    let link = ctx.ss_link()?;
    let cutoff = ctx.cutoff.ok_or(SecrError::MissingCutoff)?;
    let max_ss = max_signal_strength(ctx)?;
    if max_ss <= cutoff {
        return Err(SecrError::Computation(format!(
            "Largest signal strength {} does not exceed the cutoff {}",
            max_ss, cutoff
        )));
    }

    let slope = (link.apply(max_ss) - link.apply(cutoff)) / (ctx.mask.buffer() / 2.0);
    if !(slope > 0.0 && slope.is_finite()) {
        return Err(SecrError::Computation(format!(
            "Signal strength slope start value is undefined for a mask buffer of {}",
            ctx.mask.buffer()
        )));
    }
    Ok(slope)
}

pub(super) fn sigma_ss(_ctx: &StartContext<'_>) -> Result<f64> {
    Ok(10.0)
}

pub(super) fn kappa(_ctx: &StartContext<'_>) -> Result<f64> {
    Ok(10.0)
}

pub(super) fn alpha(_ctx: &StartContext<'_>) -> Result<f64> {
    Ok(2.0)
}

pub(super) fn sigma_toa(_ctx: &StartContext<'_>) -> Result<f64> {
    Ok(0.0025)
}

/// Detections divided by the effective survey area at the resolved detection
/// function parameters.
pub(super) fn density(ctx: &StartContext<'_>) -> Result<f64> {
    let model = DetectionModel::new(ctx.detfn, |name| ctx.value(name), ctx.cutoff)?;
    let esa = effective_area(&model, ctx.dists, ctx.mask.area());
    if !(esa > 0.0 && esa.is_finite()) {
        return Err(SecrError::Computation(format!(
            "Effective survey area at the start values is {}; cannot derive a density start value",
            esa
        )));
    }
    Ok(ctx.compressed.n_detections() as f64 / esa)
}

/// Largest recorded signal strength. Compression keeps one auxiliary row per
/// distinct history, so this reads the uncompressed detections.
fn max_signal_strength(ctx: &StartContext<'_>) -> Result<f64> {
    ctx.capture.max_signal_strength().ok_or(SecrError::MissingSsChannel)
}

/// Mean distance between detectors that detected the same individual,
/// weighted by how many individuals share each history.
pub fn mean_recapture_distance(ctx: &StartContext<'_>) -> Result<f64> {
    let bincapt = ctx.compressed.data.bincapt();
    let mut total = 0.0;
    let mut weight = 0.0;

    for (row, &freq) in bincapt.outer_iter().zip(&ctx.compressed.freqs) {
        let fired: Vec<usize> = row
            .iter()
            .enumerate()
            .filter(|(_, &b)| b > 0.0)
            .map(|(j, _)| j)
            .collect();
        for (k, &a) in fired.iter().enumerate() {
            for &b in &fired[k + 1..] {
                total += ctx.trap_dists[[a, b]] * freq as f64;
                weight += freq as f64;
            }
        }
    }

    if weight == 0.0 {
        return Err(SecrError::Computation(
            "No individual was detected by more than one detector; mean recapture distance is undefined"
                .to_string(),
        ));
    }
    Ok(total / weight)
}
