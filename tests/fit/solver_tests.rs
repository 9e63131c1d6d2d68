//! Tests for the external optimizer runner
//!
//! Each test writes a small shell script that plays the optimizer: it checks
//! for the input deck and writes the result files into its working directory.

use approx::assert_relative_eq;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use secrfit_rs::fit::{
    fit_secr, prepare_fit, DiagnosticChannel, Diagnostics, ExternalSolver, FitConfig, PreparedFit, SolveOptions,
    Solver,
};
use secrfit_rs::uncertainty::Uncertainty;
use secrfit_rs::SecrError;

use crate::test_helpers::{line_mask, line_traps, three_by_four};

const PAR: &str = "# Number of parameters = 3 Objective function value = 12.5  Maximum gradient component = 1e-07
# D_link:
-3.2
# g0_link:
100000000
# sigma_link:
2.3
";

// Rows deliberately in a different order from the deck.
const COR: &str = " The logarithm of the determinant of the hessian = 4.2
 index   name     value      std.dev       1       2
     1   sigma_link   2.3   0.2   1.0000
     2   D_link   -3.2   0.1   0.5000  1.0000
";

/// Write an optimizer script into `dir`. The script produces `secr.cor`
/// only when `with_cor` is set and `-nohess` was not passed.
fn optimizer_script(dir: &tempfile::TempDir, with_cor: bool) -> PathBuf {
    let mut body = String::from("test -f secr.json || exit 3\n");
    body.push_str(&format!("cat > secr.par <<'EOF'\n{}EOF\n", PAR));
    if with_cor {
        body.push_str(&format!(
            "if [ \"$1\" != \"-nohess\" ]; then\ncat > secr.cor <<'EOF'\n{}EOF\nfi\n",
            COR
        ));
    }
    let path = dir.path().join("optimizer.sh");
    fs::write(&path, body).unwrap();
    path
}

fn solver_for(script: &Path) -> ExternalSolver {
    ExternalSolver::new("/bin/sh").with_args([script.display().to_string()])
}

fn prepared() -> PreparedFit {
    let traps = line_traps();
    let mask = line_mask(&traps);
    prepare_fit(&three_by_four(), &traps, &mask, &FitConfig::new("hn").with_fix("g0", 1.0)).unwrap()
}

#[test]
fn test_fit_with_external_optimizer() {
    let scripts = tempfile::tempdir().unwrap();
    let script = optimizer_script(&scripts, true);
    let traps = line_traps();
    let mask = line_mask(&traps);
    let config = FitConfig::new("hn").with_fix("g0", 1.0);

    let fit = fit_secr(&three_by_four(), &traps, &mask, &config, &solver_for(&script)).unwrap();

    assert_relative_eq!(fit.coef("D").unwrap(), (-3.2f64).exp(), max_relative = 1e-12);
    assert_relative_eq!(fit.coef("sigma").unwrap(), 2.3f64.exp(), max_relative = 1e-12);
    assert_eq!(fit.coef("g0"), Some(1.0));
    assert_relative_eq!(fit.objective, 12.5);
    assert_relative_eq!(fit.max_gradient, 1e-7);
    assert!(fit.reliable);

    // The report lists sigma first; link standard errors follow the deck order.
    let se: Vec<f64> = fit
        .link_coefficients
        .iter()
        .map(|c| *c.std_error.as_available().unwrap())
        .collect();
    assert_relative_eq!(se[0], 0.1, epsilon = 1e-12);
    assert_relative_eq!(se[1], 0.2, epsilon = 1e-12);

    let correlation = fit.correlation.as_available().unwrap();
    assert_relative_eq!(correlation[[0, 1]], 0.5, epsilon = 1e-9);
}

#[test]
fn test_nohess_skips_correlation_report() {
    let scripts = tempfile::tempdir().unwrap();
    let script = optimizer_script(&scripts, true);
    let prepared = prepared();
    let mut diag = Diagnostics::new();

    let options = SolveOptions {
        hessian: false,
        timeout: None,
    };
    let output = solver_for(&script).solve(&prepared.deck, &options, &mut diag).unwrap();
    assert_eq!(output.estimates.len(), 3);
    assert_eq!(output.estimates[1], 1e8);
    assert!(output.covariance.is_none());
    assert!(diag.records().is_empty());
}

#[test]
fn test_missing_correlation_report_warns() {
    let scripts = tempfile::tempdir().unwrap();
    let script = optimizer_script(&scripts, false);
    let traps = line_traps();
    let mask = line_mask(&traps);
    let config = FitConfig::new("hn").with_fix("g0", 1.0);

    let fit = fit_secr(&three_by_four(), &traps, &mask, &config, &solver_for(&script)).unwrap();
    assert_eq!(fit.stderr("D"), Some(&Uncertainty::NotComputed));
    assert_eq!(
        fit.warnings
            .iter()
            .filter(|w| w.channel == DiagnosticChannel::Convergence)
            .count(),
        1
    );
}

#[test]
fn test_missing_parameter_file_is_failure() {
    let prepared = prepared();
    let solver = ExternalSolver::new("/bin/sh").with_args(["-c", "exit 0"]);
    let result = solver.solve(&prepared.deck, &SolveOptions::default(), &mut Diagnostics::new());
    assert!(matches!(result, Err(SecrError::SolverOutputMissing(_))));
}

#[test]
fn test_timeout_kills_optimizer() {
    let prepared = prepared();
    let solver = ExternalSolver::new("/bin/sh").with_args(["-c", "sleep 5"]);
    let options = SolveOptions {
        hessian: true,
        timeout: Some(Duration::from_millis(200)),
    };

    let started = Instant::now();
    let result = solver.solve(&prepared.deck, &options, &mut Diagnostics::new());
    assert!(matches!(result, Err(SecrError::SolverTimeout { .. })));
    assert!(started.elapsed() < Duration::from_secs(4));
}

#[test]
fn test_missing_executable() {
    let prepared = prepared();
    let solver = ExternalSolver::new("/nonexistent/secr-optimizer");
    let result = solver.solve(&prepared.deck, &SolveOptions::default(), &mut Diagnostics::new());
    assert!(matches!(result, Err(SecrError::SolverFailure(_))));
}
