//! Integration tests for the fitting pipeline
//!
//! These tests run `fit_secr` end to end against a mock optimizer and, on
//! unix, against shell scripts standing in for the optimizer executable.

// Pipeline from capture data to reconstructed result
mod pipeline_tests;

// Call-frequency heterogeneity
mod heterogeneity_tests;

// External optimizer process handling
#[cfg(unix)]
mod solver_tests;
