//! End-to-end tests of the fitting pipeline

use approx::assert_relative_eq;
use ndarray::arr2;

use secrfit_rs::data::{CaptureData, Mask, Traps};
use secrfit_rs::fit::{fit_secr, get_mask, prepare_fit, DiagnosticChannel, FitConfig, FitResult};
use secrfit_rs::uncertainty::Uncertainty;
use secrfit_rs::SecrError;

use crate::test_helpers::{line_mask, line_traps, three_by_four, MockSolver};

fn count(fit: &FitResult, channel: DiagnosticChannel) -> usize {
    fit.warnings.iter().filter(|w| w.channel == channel).count()
}

#[test]
fn test_half_normal_with_fixed_detection_probability() {
    let traps = line_traps();
    let mask = line_mask(&traps);
    let config = FitConfig::new("hn").with_fix("g0", 1.0).with_fix("kappa", 5.0);

    let prepared = prepare_fit(&three_by_four(), &traps, &mask, &config).unwrap();
    assert_eq!(prepared.model.names(), vec!["D", "g0", "sigma"]);
    assert_eq!(prepared.diagnostics.count(DiagnosticChannel::ConfigurationDrop), 1);
    assert_eq!(prepared.deck.free_indices(), vec![0, 2]);
    assert_eq!(prepared.deck.cutoff, None);

    let fit = fit_secr(&three_by_four(), &traps, &mask, &config, &MockSolver::new()).unwrap();
    assert_eq!(fit.coef("g0"), Some(1.0));
    assert!(fit.parameter("g0").unwrap().fixed);
    assert_eq!(fit.stderr("g0"), Some(&Uncertainty::NotComputed));
    assert_eq!(fit.link_coefficients.len(), 2);
    assert_eq!(fit.covariance_names, vec!["D".to_string(), "sigma".to_string()]);
    assert_eq!(fit.n_detections, 3);
    assert_eq!(fit.n_unique, 3);
    assert!(fit.reliable);
    assert_eq!(count(&fit, DiagnosticChannel::ConfigurationDrop), 1);
}

#[test]
fn test_estimates_are_returned_on_natural_scale() {
    let traps = line_traps();
    let mask = line_mask(&traps);
    let config = FitConfig::new("hn");

    let prepared = prepare_fit(&three_by_four(), &traps, &mask, &config).unwrap();
    let fit = fit_secr(&three_by_four(), &traps, &mask, &config, &MockSolver::new()).unwrap();

    // The mock solver returns the start values.
    for spec in &prepared.specs {
        assert_relative_eq!(fit.coef(&spec.name).unwrap(), spec.start, max_relative = 1e-9);
        assert_relative_eq!(
            fit.link_coef(&spec.link_name()).unwrap(),
            spec.link_start(),
            max_relative = 1e-12
        );
    }

    // Link variance 0.01 on the log scale gives a standard error of 0.1 * D.
    let density = fit.coef("D").unwrap();
    let se = *fit.stderr("D").and_then(Uncertainty::as_available).unwrap();
    assert_relative_eq!(se, 0.1 * density, max_relative = 1e-9);

    assert!(fit.esa > 0.0);
    assert!(fit.stderr("esa").unwrap().is_available());
    assert!(fit.covariance.is_available());
    assert!(fit.correlation.is_available());
}

#[test]
fn test_duplicate_histories_are_weighted() {
    let traps = line_traps();
    let mask = line_mask(&traps);
    let capt = CaptureData::new(arr2(&[
        [1.0, 1.0, 0.0, 0.0],
        [0.0, 0.0, 1.0, 1.0],
        [1.0, 1.0, 0.0, 0.0],
    ]));

    let prepared = prepare_fit(&capt, &traps, &mask, &FitConfig::new("hn")).unwrap();
    let mut freqs = prepared.deck.freqs.clone();
    freqs.sort_unstable();
    assert_eq!(freqs, vec![1, 2]);
    assert_eq!(prepared.deck.n_unique, 2);
    assert_eq!(prepared.deck.bincapt.nrows(), 2);

    let fit = fit_secr(&capt, &traps, &mask, &FitConfig::new("hn"), &MockSolver::new()).unwrap();
    assert_eq!(fit.n_detections, 3);
    assert_eq!(fit.n_unique, 2);
}

#[test]
fn test_gradient_thresholds() {
    let traps = line_traps();
    let mask = line_mask(&traps);
    let capt = three_by_four();
    let config = FitConfig::new("hn");

    let large = fit_secr(&capt, &traps, &mask, &config, &MockSolver::new().with_max_gradient(0.5)).unwrap();
    assert_eq!(count(&large, DiagnosticChannel::Convergence), 2);
    assert!(!large.reliable);

    let moderate = fit_secr(&capt, &traps, &mask, &config, &MockSolver::new().with_max_gradient(0.05)).unwrap();
    assert_eq!(count(&moderate, DiagnosticChannel::Convergence), 1);
    assert!(!moderate.reliable);
    assert!(moderate.warning_messages()[0].contains("might not be reliable"));

    let small = fit_secr(&capt, &traps, &mask, &config, &MockSolver::new()).unwrap();
    assert_eq!(count(&small, DiagnosticChannel::Convergence), 0);
    assert!(small.reliable);
}

#[test]
fn test_no_hessian_means_no_standard_errors() {
    let traps = line_traps();
    let mask = line_mask(&traps);
    let solver = MockSolver::new();
    let config = FitConfig::new("hn").with_hess(false);

    let fit = fit_secr(&three_by_four(), &traps, &mask, &config, &solver).unwrap();
    assert_eq!(solver.hessian_requested.get(), Some(false));
    for coef in &fit.coefficients {
        assert_eq!(coef.std_error, Uncertainty::NotComputed, "{}", coef.name);
    }
    assert_eq!(fit.covariance, Uncertainty::NotComputed);
    assert_eq!(fit.correlation, Uncertainty::NotComputed);
}

#[test]
fn test_missing_covariance_from_solver() {
    let traps = line_traps();
    let mask = line_mask(&traps);
    let solver = MockSolver::new().without_covariance();

    let fit = fit_secr(&three_by_four(), &traps, &mask, &FitConfig::new("hn"), &solver).unwrap();
    assert_eq!(solver.hessian_requested.get(), Some(true));
    assert_eq!(fit.stderr("D"), Some(&Uncertainty::NotComputed));
    assert_eq!(fit.stderr("esa"), Some(&Uncertainty::NotComputed));
}

#[test]
fn test_get_mask_returns_integration_mask() {
    let traps = line_traps();
    let mask = line_mask(&traps);

    let fit = fit_secr(&three_by_four(), &traps, &mask, &FitConfig::new("hr"), &MockSolver::new()).unwrap();
    assert_eq!(get_mask(&fit), &mask);
    assert_eq!(fit.traps(), &traps);
}

#[test]
fn test_local_integration_warns_for_empty_domains() {
    let traps = line_traps();
    let mask = Mask::around_traps(&traps, 8.0, 2.0).unwrap();
    // Traps 0 and 3 are 30 apart, so no point of an 8 m buffer is near both.
    let capt = CaptureData::new(arr2(&[[1.0, 0.0, 0.0, 1.0], [1.0, 1.0, 0.0, 0.0]]));
    let config = FitConfig::new("hn").with_local(true);

    let prepared = prepare_fit(&capt, &traps, &mask, &config).unwrap();
    assert!(prepared.deck.mask_indices.local);
    assert_eq!(prepared.diagnostics.count(DiagnosticChannel::Locality), 1);
    assert_eq!(prepared.deck.mask_indices.empty_histories().len(), 1);

    let global = prepare_fit(&capt, &traps, &mask, &FitConfig::new("hn")).unwrap();
    assert!(!global.deck.mask_indices.local);
    assert!(global.deck.mask_indices.empty_histories().is_empty());
}

#[test]
fn test_trap_count_mismatch() {
    let traps = Traps::from_points(&[(0.0, 0.0), (10.0, 0.0)]);
    let mask = line_mask(&traps);
    let result = prepare_fit(&three_by_four(), &traps, &mask, &FitConfig::new("hn"));
    assert!(matches!(
        result,
        Err(SecrError::TrapCountMismatch { columns: 4, traps: 2 })
    ));
}

#[test]
fn test_unknown_detection_function() {
    let traps = line_traps();
    let mask = line_mask(&traps);
    let result = prepare_fit(&three_by_four(), &traps, &mask, &FitConfig::new("exp"));
    assert!(matches!(result, Err(SecrError::UnknownDetectionFunction(_))));
}

#[test]
fn test_result_serializes_to_json() {
    let traps = line_traps();
    let mask = line_mask(&traps);
    let fit = fit_secr(&three_by_four(), &traps, &mask, &FitConfig::new("hn"), &MockSolver::new()).unwrap();

    let json = serde_json::to_value(&fit).unwrap();
    assert_eq!(json["coefficients"][0]["name"], "D");
    assert_eq!(json["covariance"]["status"], "available");
    assert!(fit.to_string().contains("Log-likelihood"));
}
