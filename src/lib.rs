//! # secrfit-rs
//!
//! `secrfit-rs` prepares survey data for, and interprets results from, a
//! maximum-likelihood fit of a spatial capture-recapture (SECR) model.
//!
//! The library provides:
//! - Compression of detection histories into frequency-weighted unique histories
//! - Detector/mask geometry and local integration domains
//! - A uniform parameter representation (link, bounds, phase, scale factor)
//!   across detection-function families, with automatic start values
//! - Reconstruction of natural-scale estimates, effective survey area and the
//!   call-frequency heterogeneity correction from the optimizer's output
//!
//! The optimizer itself is a black box behind the [`fit::Solver`] trait;
//! [`fit::ExternalSolver`] runs an executable in a temporary working area.
//!
//! ## Basic Usage
//!
//! ```
//! use ndarray::arr2;
//! use secrfit_rs::data::{CaptureData, Mask, Traps};
//! use secrfit_rs::fit::{prepare_fit, FitConfig};
//!
//! let capt = CaptureData::new(arr2(&[
//!     [1.0, 1.0, 0.0, 0.0],
//!     [0.0, 1.0, 1.0, 0.0],
//!     [0.0, 0.0, 1.0, 1.0],
//! ]));
//! let traps = Traps::from_points(&[(0.0, 0.0), (10.0, 0.0), (20.0, 0.0), (30.0, 0.0)]);
//! let mask = Mask::around_traps(&traps, 50.0, 5.0).unwrap();
//!
//! let prepared = prepare_fit(&capt, &traps, &mask, &FitConfig::new("hn")).unwrap();
//! assert_eq!(prepared.model.names(), vec!["D", "g0", "sigma"]);
//! assert_eq!(prepared.start_order.last().map(String::as_str), Some("D"));
//! ```

// Public modules
pub mod error;

pub mod autostart;
pub mod data;
pub mod detfn;
pub mod fit;
pub mod geometry;
pub mod parameters;
pub mod uncertainty;

mod utils;

// Re-exports for convenience
pub use error::{Result, SecrError};
pub use fit::{fit_secr, get_mask, prepare_fit, FitConfig, FitResult, PreparedFit, Solver};

/// Version of the library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
