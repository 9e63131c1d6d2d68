//! Local integration
//!
//! Restricts the likelihood's integration over the mask, per unique history,
//! to the points within `buffer` of every detector that fired. A history with
//! no firing detector keeps the whole mask (the intersection over an empty set
//! of constraints). Without locality every history uses the whole mask, which
//! is represented with the same index-list structure.

use ndarray::Array2;
use rayon::prelude::*;
use serde::Serialize;

/// Mask point indices to integrate over, one list per unique history.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MaskIndices {
    /// Whether the lists were restricted by local integration.
    pub local: bool,
    /// Ascending mask point indices for each history.
    pub per_history: Vec<Vec<usize>>,
}

impl MaskIndices {
    /// Every history integrates over every mask point.
    pub fn full(n_histories: usize, n_mask: usize) -> Self {
        let all: Vec<usize> = (0..n_mask).collect();
        Self {
            local: false,
            per_history: vec![all; n_histories],
        }
    }

    pub fn len(&self) -> usize {
        self.per_history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.per_history.is_empty()
    }

    pub fn get(&self, history: usize) -> Option<&[usize]> {
        self.per_history.get(history).map(Vec::as_slice)
    }

    /// Number of points in each history's domain.
    pub fn counts(&self) -> Vec<usize> {
        self.per_history.iter().map(Vec::len).collect()
    }

    /// Histories whose domain contains no mask point.
    pub fn empty_histories(&self) -> Vec<usize> {
        self.per_history
            .iter()
            .enumerate()
            .filter(|(_, idx)| idx.is_empty())
            .map(|(i, _)| i)
            .collect()
    }
}

/// Compute local integration domains.
///
/// `bincapt` holds the unique binary histories (`n_histories × n_traps`),
/// `dists` the trap-to-mask distances (`n_traps × n_mask`).
///
/// # Examples
///
/// ```
/// use ndarray::arr2;
/// use secrfit_rs::geometry::local_mask_indices;
///
/// let bincapt = arr2(&[[1.0, 1.0], [1.0, 0.0]]);
/// let dists = arr2(&[[1.0, 5.0, 20.0], [9.0, 5.0, 1.0]]);
/// let idx = local_mask_indices(&bincapt, &dists, 6.0);
/// assert_eq!(idx.get(0).unwrap(), &[1]);
/// assert_eq!(idx.get(1).unwrap(), &[0, 1]);
/// ```
pub fn local_mask_indices(bincapt: &Array2<f64>, dists: &Array2<f64>, buffer: f64) -> MaskIndices {
    let n_mask = dists.ncols();

    let per_history: Vec<Vec<usize>> = (0..bincapt.nrows())
        .into_par_iter()
        .map(|i| {
            let fired: Vec<usize> = bincapt
                .row(i)
                .iter()
                .enumerate()
                .filter(|(_, &b)| b > 0.0)
                .map(|(j, _)| j)
                .collect();
            (0..n_mask)
                .filter(|&m| fired.iter().all(|&j| dists[[j, m]] <= buffer))
                .collect()
        })
        .collect();

    MaskIndices {
        local: true,
        per_history,
    }
}
