//! # Survey Data
//!
//! Capture histories, detector locations and the integration mask, plus the
//! compression of capture histories into frequency-weighted unique histories.
//!
//! ## Core Components
//!
//! - [`CaptureData`]: the binary capture matrix and any auxiliary channels
//! - [`Traps`]: ordered detector coordinates
//! - [`Mask`]: integration grid with cell area and buffer
//! - [`compress_histories`]: collapses identical binary rows

pub mod capture;
pub mod compress;
pub mod mask;
pub mod traps;

pub use capture::{CaptureData, Channel, BINARY_CHANNEL};
pub use compress::{compress_histories, CompressedHistories};
pub use mask::Mask;
pub use traps::Traps;
