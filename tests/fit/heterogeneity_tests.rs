//! Tests for fits of detections on repeated calls

use approx::assert_relative_eq;

use secrfit_rs::fit::result::ANIMAL_DENSITY;
use secrfit_rs::fit::{fit_secr, prepare_fit, DiagnosticChannel, FitConfig};
use secrfit_rs::uncertainty::Uncertainty;
use secrfit_rs::SecrError;

use crate::test_helpers::{line_mask, line_traps, three_by_four, MockSolver};

#[test]
fn test_call_frequencies_adjust_density() {
    let traps = line_traps();
    let mask = line_mask(&traps);
    let solver = MockSolver::new();
    let config = FitConfig::new("hn").with_call_freqs(vec![2.0, 4.0, 3.0]);

    let fit = fit_secr(&three_by_four(), &traps, &mask, &config, &solver).unwrap();

    // No Hessian is requested unless asked for.
    assert_eq!(solver.hessian_requested.get(), Some(false));

    let density = fit.coef("D").unwrap();
    assert_relative_eq!(fit.coef(ANIMAL_DENSITY).unwrap(), density / 3.0, max_relative = 1e-12);
    assert!(fit.parameter(ANIMAL_DENSITY).unwrap().derived);

    for coef in fit.coefficients.iter().chain(&fit.link_coefficients) {
        assert!(
            matches!(coef.std_error, Uncertainty::Unavailable(_)),
            "{} has {:?}",
            coef.name,
            coef.std_error
        );
    }
    assert!(matches!(fit.covariance, Uncertainty::Unavailable(_)));
    assert!(matches!(fit.correlation, Uncertainty::Unavailable(_)));
    assert_eq!(
        fit.warnings
            .iter()
            .filter(|w| w.channel == DiagnosticChannel::Heterogeneity)
            .count(),
        1
    );
}

#[test]
fn test_requested_hessian_is_still_unavailable() {
    let traps = line_traps();
    let mask = line_mask(&traps);
    let solver = MockSolver::new();
    let config = FitConfig::new("hn")
        .with_call_freqs(vec![2.0, 4.0, 3.0])
        .with_hess(true);

    let prepared = prepare_fit(&three_by_four(), &traps, &mask, &config).unwrap();
    assert_eq!(prepared.diagnostics.count(DiagnosticChannel::Heterogeneity), 1);

    let fit = fit_secr(&three_by_four(), &traps, &mask, &config, &solver).unwrap();
    assert_eq!(solver.hessian_requested.get(), Some(true));
    assert!(matches!(fit.stderr("D"), Some(Uncertainty::Unavailable(_))));
    assert!(matches!(fit.stderr(ANIMAL_DENSITY), Some(Uncertainty::Unavailable(_))));
    assert!(matches!(fit.covariance, Uncertainty::Unavailable(_)));
    assert_eq!(
        fit.warnings
            .iter()
            .filter(|w| w.channel == DiagnosticChannel::Heterogeneity)
            .count(),
        2
    );
}

#[test]
fn test_unit_call_frequencies_change_nothing() {
    let traps = line_traps();
    let mask = line_mask(&traps);
    let solver = MockSolver::new();
    let config = FitConfig::new("hn").with_call_freqs(vec![1.0, 1.0]);

    let fit = fit_secr(&three_by_four(), &traps, &mask, &config, &solver).unwrap();
    assert_eq!(solver.hessian_requested.get(), Some(true));
    assert!(fit.coef(ANIMAL_DENSITY).is_none());
    assert!(fit.stderr("D").unwrap().is_available());
}

#[test]
fn test_invalid_call_frequencies_rejected() {
    let traps = line_traps();
    let mask = line_mask(&traps);

    for freqs in [vec![], vec![2.0, 0.0], vec![f64::NAN]] {
        let config = FitConfig::new("hn").with_call_freqs(freqs);
        assert!(matches!(
            prepare_fit(&three_by_four(), &traps, &mask, &config),
            Err(SecrError::Computation(_))
        ));
    }
}
