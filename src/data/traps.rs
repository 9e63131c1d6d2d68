//! Detector locations.

use ndarray::Array2;
use serde::Serialize;

use crate::error::{Result, SecrError};

/// Ordered detector coordinates, one `(x, y)` row per trap.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Traps {
    coords: Array2<f64>,
}

impl Traps {
    /// Create a trap array from an `n × 2` coordinate matrix.
    pub fn new(coords: Array2<f64>) -> Result<Self> {
        if coords.ncols() != 2 {
            return Err(SecrError::DimensionMismatch(format!(
                "Trap coordinates must have 2 columns, got {}",
                coords.ncols()
            )));
        }
        Ok(Self { coords })
    }

    /// Create a trap array from `(x, y)` pairs.
    pub fn from_points(points: &[(f64, f64)]) -> Self {
        let mut coords = Array2::zeros((points.len(), 2));
        for (i, &(x, y)) in points.iter().enumerate() {
            coords[[i, 0]] = x;
            coords[[i, 1]] = y;
        }
        Self { coords }
    }

    pub fn len(&self) -> usize {
        self.coords.nrows()
    }

    pub fn is_empty(&self) -> bool {
        self.coords.nrows() == 0
    }

    pub fn coords(&self) -> &Array2<f64> {
        &self.coords
    }
}
