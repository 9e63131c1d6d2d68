//! Integration mask
//!
//! The mask discretizes the region in which an animal's activity centre may
//! lie. Every point represents a cell of equal area; the buffer is the
//! distance from the detectors used to build the mask and is reused as the
//! radius of local integration.

use ndarray::Array2;
use serde::Serialize;

use crate::data::traps::Traps;
use crate::error::{Result, SecrError};

/// Mask grid with its cell area and buffer radius.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Mask {
    points: Array2<f64>,
    area: f64,
    buffer: f64,
}

impl Mask {
    /// Create a mask from an `m × 2` matrix of point coordinates.
    pub fn new(points: Array2<f64>, area: f64, buffer: f64) -> Result<Self> {
        if points.ncols() != 2 {
            return Err(SecrError::DimensionMismatch(format!(
                "Mask points must have 2 columns, got {}",
                points.ncols()
            )));
        }
        if points.nrows() == 0 {
            return Err(SecrError::DimensionMismatch(
                "Mask must contain at least one point".to_string(),
            ));
        }
        if !(area > 0.0 && area.is_finite()) {
            return Err(SecrError::Computation(format!(
                "Mask cell area must be positive and finite, got {}",
                area
            )));
        }
        if !(buffer > 0.0) {
            return Err(SecrError::Computation(format!(
                "Mask buffer must be positive, got {}",
                buffer
            )));
        }
        Ok(Self {
            points,
            area,
            buffer,
        })
    }

    /// Build a regular grid mask around a trap array.
    ///
    /// The grid covers the bounding box of the traps expanded by `buffer`, with
    /// points `spacing` apart; points farther than `buffer` from every trap are
    /// dropped. Each point represents a `spacing × spacing` cell.
    ///
    /// # Examples
    ///
    /// ```
    /// use secrfit_rs::data::{Mask, Traps};
    ///
    /// let traps = Traps::from_points(&[(0.0, 0.0), (10.0, 0.0)]);
    /// let mask = Mask::around_traps(&traps, 20.0, 2.0).unwrap();
    /// assert_eq!(mask.area(), 4.0);
    /// assert_eq!(mask.buffer(), 20.0);
    /// assert!(mask.len() > 0);
    /// ```
    pub fn around_traps(traps: &Traps, buffer: f64, spacing: f64) -> Result<Self> {
        if traps.is_empty() {
            return Err(SecrError::DimensionMismatch(
                "Cannot build a mask around an empty trap array".to_string(),
            ));
        }
        if !(spacing > 0.0 && spacing.is_finite()) || !(buffer > 0.0 && buffer.is_finite()) {
            return Err(SecrError::Computation(format!(
                "Mask spacing ({}) and buffer ({}) must be positive and finite",
                spacing, buffer
            )));
        }

        let coords = traps.coords();
        let fold = |col: usize, init: f64, f: fn(f64, f64) -> f64| {
            coords.column(col).iter().fold(init, |acc, &v| f(acc, v))
        };
        let x_min = fold(0, f64::INFINITY, f64::min) - buffer;
        let x_max = fold(0, f64::NEG_INFINITY, f64::max) + buffer;
        let y_min = fold(1, f64::INFINITY, f64::min) - buffer;
        let y_max = fold(1, f64::NEG_INFINITY, f64::max) + buffer;

        let nx = ((x_max - x_min) / spacing).floor() as usize + 1;
        let ny = ((y_max - y_min) / spacing).floor() as usize + 1;

        let mut kept = Vec::new();
        for iy in 0..ny {
            let y = y_min + iy as f64 * spacing;
            for ix in 0..nx {
                let x = x_min + ix as f64 * spacing;
                let near = coords.rows().into_iter().any(|trap| {
                    let dx = trap[0] - x;
                    let dy = trap[1] - y;
                    (dx * dx + dy * dy).sqrt() <= buffer
                });
                if near {
                    kept.push(x);
                    kept.push(y);
                }
            }
        }

        let points = Array2::from_shape_vec((kept.len() / 2, 2), kept)
            .map_err(|e| SecrError::DimensionMismatch(e.to_string()))?;
        Self::new(points, spacing * spacing, buffer)
    }

    pub fn len(&self) -> usize {
        self.points.nrows()
    }

    pub fn is_empty(&self) -> bool {
        self.points.nrows() == 0
    }

    pub fn points(&self) -> &Array2<f64> {
        &self.points
    }

    /// Area represented by each mask point.
    pub fn area(&self) -> f64 {
        self.area
    }

    /// Buffer radius used to build the mask.
    pub fn buffer(&self) -> f64 {
        self.buffer
    }
}
