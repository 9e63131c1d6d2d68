//! Effective survey area.

use ndarray::{Array1, Array2, Axis};
use rayon::prelude::*;

use super::DetectionModel;

/// Probability that an animal at each mask point is detected by at least one trap.
///
/// `dists` is the `n_traps × n_mask` distance matrix.
pub fn p_dot(model: &DetectionModel, dists: &Array2<f64>) -> Array1<f64> {
    let columns: Vec<f64> = dists
        .axis_iter(Axis(1))
        .into_par_iter()
        .map(|column| {
            let missed: f64 = column.iter().map(|&d| 1.0 - model.prob(d)).product();
            1.0 - missed
        })
        .collect();
    Array1::from(columns)
}

/// Integral of the detection probability over the mask.
///
/// # Examples
///
/// ```
/// use ndarray::arr2;
/// use secrfit_rs::detfn::{effective_area, DetFn, DetectionModel};
///
/// let model = DetectionModel::new(DetFn::HalfNormal, |name| match name {
///     "g0" => Some(1.0),
///     _ => Some(1e6),
/// }, None).unwrap();
/// let dists = arr2(&[[0.0, 1.0, 2.0]]);
/// assert!((effective_area(&model, &dists, 4.0) - 12.0).abs() < 1e-6);
/// ```
pub fn effective_area(model: &DetectionModel, dists: &Array2<f64>, cell_area: f64) -> f64 {
    p_dot(model, dists).sum() * cell_area
}
