//! Utility functions and helpers for the secrfit-rs library.

pub mod finite_difference;

#[cfg(feature = "matrix")]
pub mod matrix_convert;

pub use finite_difference::gradient;

#[cfg(feature = "matrix")]
pub use matrix_convert::{nalgebra_to_ndarray, ndarray_to_nalgebra};
