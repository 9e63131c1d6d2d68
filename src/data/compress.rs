//! Detection history compression
//!
//! Identical binary capture rows contribute identical terms to the likelihood,
//! so they are evaluated once and weighted by their frequency. Rows are sorted
//! lexicographically by their binary pattern, which makes identical rows
//! contiguous; each maximal run becomes one unique history. Auxiliary channels
//! are permuted the same way and keep only the first row of every run, whose
//! measurements stand in for the whole group.

use ndarray::{Array2, ArrayView1, Axis};
use std::cmp::Ordering;
use std::collections::BTreeMap;

use crate::data::capture::{CaptureData, Channel};

/// Capture data reduced to unique binary histories.
#[derive(Debug, Clone, PartialEq)]
pub struct CompressedHistories {
    /// One representative row per unique history, in every channel.
    pub data: CaptureData,
    /// Number of original rows sharing each unique binary pattern.
    pub freqs: Vec<usize>,
    /// Sorted position -> original row index.
    pub order: Vec<usize>,
    /// Original row index -> unique history index.
    pub group_of: Vec<usize>,
}

impl CompressedHistories {
    pub fn n_unique(&self) -> usize {
        self.freqs.len()
    }

    /// Total number of original detections.
    pub fn n_detections(&self) -> usize {
        self.freqs.iter().sum()
    }

    /// Re-expand the unique binary rows by their frequencies.
    ///
    /// The result equals the original binary matrix up to a row permutation.
    pub fn expand_binary(&self) -> Array2<f64> {
        let bincapt = self.data.bincapt();
        let rows: Vec<usize> = self
            .freqs
            .iter()
            .enumerate()
            .flat_map(|(u, &f)| std::iter::repeat(u).take(f))
            .collect();
        bincapt.select(Axis(0), &rows)
    }
}

fn compare_rows(a: ArrayView1<'_, f64>, b: ArrayView1<'_, f64>) -> Ordering {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| x.total_cmp(y))
        .find(|ord| *ord != Ordering::Equal)
        .unwrap_or(Ordering::Equal)
}

/// Collapse identical binary capture rows into frequency-weighted unique histories.
///
/// The sort is stable, so within a run the representative is the earliest
/// original row.
///
/// # Examples
///
/// ```
/// use ndarray::arr2;
/// use secrfit_rs::data::{compress_histories, CaptureData};
///
/// let capt = CaptureData::new(arr2(&[
///     [1.0, 1.0, 0.0],
///     [0.0, 1.0, 1.0],
///     [1.0, 1.0, 0.0],
/// ]));
/// let compressed = compress_histories(&capt);
/// assert_eq!(compressed.n_unique(), 2);
/// assert_eq!(compressed.n_detections(), 3);
/// ```
pub fn compress_histories(capt: &CaptureData) -> CompressedHistories {
    let bincapt = capt.bincapt();
    let n = bincapt.nrows();

    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&i, &j| compare_rows(bincapt.row(i), bincapt.row(j)));

    let mut representatives = Vec::new();
    let mut freqs: Vec<usize> = Vec::new();
    let mut group_of = vec![0; n];

    for (pos, &row) in order.iter().enumerate() {
        let starts_run = pos == 0
            || compare_rows(bincapt.row(order[pos - 1]), bincapt.row(row)) != Ordering::Equal;
        if starts_run {
            representatives.push(row);
            freqs.push(0);
        }
        let group = freqs.len() - 1;
        freqs[group] += 1;
        group_of[row] = group;
    }

    let unique_bincapt = bincapt.select(Axis(0), &representatives);
    let channels: BTreeMap<Channel, Array2<f64>> = capt
        .channel_map()
        .iter()
        .map(|(&channel, values)| (channel, values.select(Axis(0), &representatives)))
        .collect();

    log::debug!(
        "compressed {} capture histories into {} unique histories",
        n,
        freqs.len()
    );

    CompressedHistories {
        data: CaptureData::from_parts(unique_bincapt, channels),
        freqs,
        order,
        group_of,
    }
}
