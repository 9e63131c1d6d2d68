//! Result reconstruction
//!
//! Maps the optimizer's link-scale output back to named natural-scale
//! estimates, adds the effective survey area, and applies the call-frequency
//! correction. Steps run in a fixed order:
//!
//! 1. separate fixed from estimated parameters
//! 2. invert the links
//! 3. derive the effective survey area (with a delta-method standard error)
//! 4. under call-frequency heterogeneity, add animal density and mark every
//!    uncertainty quantity unavailable
//! 5. check the gradient against the strict threshold

use ndarray::{Array1, Array2};
use serde::Serialize;
use std::fmt;

use super::convergence::{check_gradient, check_reliability};
use super::diagnostics::{Diagnostic, DiagnosticChannel, Diagnostics};
use super::solver::SolverOutput;
use super::{FitConfig, PreparedFit};
use crate::data::{Mask, Traps};
use crate::detfn::{effective_area, DetFn, DetectionModel};
use crate::error::{Result, SecrError};
use crate::parameters::{LinkKind, ParameterSpec, DENSITY};
use crate::uncertainty::{
    calculate_correlation, covariance_from_hessian, delta_method_variance, is_valid_covariance,
    natural_scale_covariance, standard_errors_from_covariance, Uncertainty,
};
use crate::utils::gradient;

/// Name of the derived effective survey area coefficient.
pub const ESA: &str = "esa";
/// Name of the animal-level density coefficient added under call-frequency heterogeneity.
pub const ANIMAL_DENSITY: &str = "Da";

const HETEROGENEITY_REASON: &str =
    "Hessian-based uncertainty is not valid when individuals are detected on repeated calls";

/// One reported estimate.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Coefficient {
    pub name: String,
    pub estimate: f64,
    pub std_error: Uncertainty<f64>,
    /// Held at its start value
    pub fixed: bool,
    /// Computed from the model parameters rather than estimated
    pub derived: bool,
}

/// Outcome of a fit.
#[derive(Debug, Clone, Serialize)]
pub struct FitResult {
    /// Configuration the fit was requested with
    pub config: FitConfig,
    pub detfn: DetFn,
    pub specs: Vec<ParameterSpec>,
    /// Link-scale estimates of the estimated parameters (`D_link`, ...)
    pub link_coefficients: Vec<Coefficient>,
    /// Natural-scale parameters in model order, then derived quantities
    pub coefficients: Vec<Coefficient>,
    /// Parameter names keying the rows and columns of `covariance` and `correlation`
    pub covariance_names: Vec<String>,
    /// Natural-scale covariance of the estimated parameters
    pub covariance: Uncertainty<Array2<f64>>,
    pub correlation: Uncertainty<Array2<f64>>,
    pub max_gradient: f64,
    /// Negative log-likelihood at the estimates
    pub objective: f64,
    pub esa: f64,
    pub n_detections: usize,
    pub n_unique: usize,
    /// Whether the maximum gradient component passed the strict threshold
    pub reliable: bool,
    pub warnings: Vec<Diagnostic>,
    mask: Mask,
    traps: Traps,
}

impl FitResult {
    /// Natural-scale estimate of a parameter or derived quantity.
    pub fn coef(&self, name: &str) -> Option<f64> {
        self.parameter(name).map(|c| c.estimate)
    }

    pub fn stderr(&self, name: &str) -> Option<&Uncertainty<f64>> {
        self.parameter(name).map(|c| &c.std_error)
    }

    pub fn parameter(&self, name: &str) -> Option<&Coefficient> {
        self.coefficients.iter().find(|c| c.name == name)
    }

    pub fn link_coef(&self, name: &str) -> Option<f64> {
        self.link_coefficients
            .iter()
            .find(|c| c.name == name)
            .map(|c| c.estimate)
    }

    pub fn log_likelihood(&self) -> f64 {
        -self.objective
    }

    pub fn mask(&self) -> &Mask {
        &self.mask
    }

    pub fn traps(&self) -> &Traps {
        &self.traps
    }

    /// Messages of the warnings that were not suppressed.
    pub fn warning_messages(&self) -> Vec<&str> {
        self.warnings
            .iter()
            .filter(|d| !d.suppressed)
            .map(|d| d.message.as_str())
            .collect()
    }
}

impl fmt::Display for FitResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Spatial capture-recapture fit, detection function {}", self.detfn)?;
        writeln!(
            f,
            "Detections: {} ({} unique histories), mask points: {}",
            self.n_detections,
            self.n_unique,
            self.mask.len()
        )?;
        writeln!(
            f,
            "Log-likelihood: {:.4}, maximum gradient component: {:.3e}",
            self.log_likelihood(),
            self.max_gradient
        )?;
        writeln!(f)?;
        writeln!(f, "{:<10} {:>14} {:>14}", "", "Estimate", "Std. Error")?;
        for coef in &self.coefficients {
            let se = match &coef.std_error {
                Uncertainty::Available(se) => format!("{:.6e}", se),
                Uncertainty::NotComputed if coef.fixed => "fixed".to_string(),
                Uncertainty::NotComputed => "-".to_string(),
                Uncertainty::Unavailable(_) => "unavailable".to_string(),
            };
            writeln!(f, "{:<10} {:>14.6e} {:>14}", coef.name, coef.estimate, se)?;
        }
        let messages = self.warning_messages();
        if !messages.is_empty() {
            writeln!(f)?;
            writeln!(f, "Warnings:")?;
            for message in messages {
                writeln!(f, "  {}", message)?;
            }
        }
        Ok(())
    }
}

/// Effective survey area at natural-scale parameter `values` (in spec order).
fn esa_at(
    detfn: DetFn,
    specs: &[ParameterSpec],
    values: &[f64],
    cutoff: Option<f64>,
    dists: &Array2<f64>,
    area: f64,
) -> Result<f64> {
    let model = DetectionModel::new(
        detfn,
        |name| specs.iter().position(|s| s.name == name).map(|i| values[i]),
        cutoff,
    )?;
    Ok(effective_area(&model, dists, area))
}

/// Link-scale covariance over the estimated parameters, if a valid one is available.
fn link_covariance(output: &SolverOutput, n_free: usize, diag: &mut Diagnostics) -> Result<Option<Array2<f64>>> {
    let check_dim = |m: &Array2<f64>, what: &str| {
        if m.dim() == (n_free, n_free) {
            Ok(())
        } else {
            Err(SecrError::DimensionMismatch(format!(
                "{} has shape {:?} for {} estimated parameters",
                what,
                m.dim(),
                n_free
            )))
        }
    };

    if let Some(covariance) = &output.covariance {
        check_dim(covariance, "Covariance matrix")?;
        if is_valid_covariance(covariance) {
            return Ok(Some(covariance.clone()));
        }
        diag.warn(
            DiagnosticChannel::Convergence,
            "Covariance matrix contains non-finite values; standard errors are not available",
        );
        return Ok(None);
    }

    if let Some(hessian) = &output.hessian {
        check_dim(hessian, "Hessian")?;
        let covariance = covariance_from_hessian(hessian)?;
        if covariance.is_none() {
            diag.warn(
                DiagnosticChannel::Convergence,
                "Hessian could not be inverted; standard errors are not available",
            );
        }
        return Ok(covariance);
    }

    Ok(None)
}

fn available_or_not_computed(value: Option<f64>) -> Uncertainty<f64> {
    value.map_or(Uncertainty::NotComputed, Uncertainty::Available)
}

/// Build the [`FitResult`] from a prepared fit and the solver's output.
pub fn reconstruct(prepared: PreparedFit, output: SolverOutput) -> Result<FitResult> {
    let PreparedFit {
        config,
        model,
        specs,
        histories,
        traps,
        mask,
        geometry,
        diagnostics: mut diag,
        ..
    } = prepared;

    if output.estimates.len() != specs.len() {
        return Err(SecrError::DimensionMismatch(format!(
            "Solver returned {} estimates for {} parameters",
            output.estimates.len(),
            specs.len()
        )));
    }
    check_gradient(output.max_gradient, &mut diag);

    // 1. Estimated view
    let free: Vec<usize> = (0..specs.len()).filter(|&i| !specs[i].is_fixed()).collect();
    let free_links: Vec<LinkKind> = free.iter().map(|&i| specs[i].link).collect();
    let free_etas: Array1<f64> = free.iter().map(|&i| output.estimates[i]).collect();

    // 2. Natural scale; fixed parameters keep their exact value
    let natural: Vec<f64> = specs
        .iter()
        .zip(&output.estimates)
        .map(|(spec, &eta)| if spec.is_fixed() { spec.start } else { spec.link.inverse(eta) })
        .collect();

    let link_cov = link_covariance(&output, free.len(), &mut diag)?;
    let natural_cov = link_cov
        .as_ref()
        .map(|cov| natural_scale_covariance(&free_links, &free_etas, cov))
        .transpose()?;
    let link_se = link_cov.as_ref().map(standard_errors_from_covariance);
    let natural_se = natural_cov.as_ref().map(standard_errors_from_covariance);

    let mut link_coefficients: Vec<Coefficient> = free
        .iter()
        .enumerate()
        .map(|(k, &i)| Coefficient {
            name: specs[i].link_name(),
            estimate: output.estimates[i],
            std_error: available_or_not_computed(link_se.as_ref().map(|se| se[k])),
            fixed: false,
            derived: false,
        })
        .collect();

    let mut coefficients: Vec<Coefficient> = specs
        .iter()
        .enumerate()
        .map(|(i, spec)| {
            let se = free
                .iter()
                .position(|&f| f == i)
                .and_then(|k| natural_se.as_ref().map(|se| se[k]));
            Coefficient {
                name: spec.name.clone(),
                estimate: natural[i],
                std_error: available_or_not_computed(se),
                fixed: spec.is_fixed(),
                derived: false,
            }
        })
        .collect();

    // 3. Effective survey area
    let detfn = model.detfn();
    let area = mask.area();
    let esa = esa_at(detfn, &specs, &natural, config.cutoff, &geometry.dists, area)?;
    let esa_se = match &link_cov {
        Some(cov) => {
            let esa_of = |etas: &Array1<f64>| {
                let mut values = natural.clone();
                for (k, &i) in free.iter().enumerate() {
                    values[i] = specs[i].link.inverse(etas[k]);
                }
                esa_at(detfn, &specs, &values, config.cutoff, &geometry.dists, area)
            };
            let grad = gradient(esa_of, &free_etas, None)?;
            let variance = delta_method_variance(&grad, cov)?;
            Some(if variance >= 0.0 { variance.sqrt() } else { f64::NAN })
        }
        None => None,
    };
    coefficients.push(Coefficient {
        name: ESA.to_string(),
        estimate: esa,
        std_error: available_or_not_computed(esa_se),
        fixed: false,
        derived: true,
    });

    let covariance_names: Vec<String> = free.iter().map(|&i| specs[i].name.clone()).collect();
    let mut correlation = natural_cov
        .as_ref()
        .map_or(Uncertainty::NotComputed, |cov| Uncertainty::Available(calculate_correlation(cov)));
    let mut covariance = natural_cov.map_or(Uncertainty::NotComputed, Uncertainty::Available);

    // 4. Call-frequency heterogeneity
    if config.has_call_heterogeneity() {
        if let Some(mean_freq) = config.mean_call_freq() {
            let density = coefficients
                .iter()
                .find(|c| c.name == DENSITY)
                .map(|c| c.estimate)
                .ok_or_else(|| SecrError::Computation("density is missing from the fitted parameters".to_string()))?;
            coefficients.push(Coefficient {
                name: ANIMAL_DENSITY.to_string(),
                estimate: density / mean_freq,
                std_error: Uncertainty::NotComputed,
                fixed: false,
                derived: true,
            });

            let unavailable = Uncertainty::Unavailable(HETEROGENEITY_REASON.to_string());
            for coef in coefficients.iter_mut().chain(link_coefficients.iter_mut()) {
                coef.std_error = unavailable.clone();
            }
            covariance = Uncertainty::Unavailable(HETEROGENEITY_REASON.to_string());
            correlation = Uncertainty::Unavailable(HETEROGENEITY_REASON.to_string());
            diag.warn(
                DiagnosticChannel::Heterogeneity,
                format!(
                    "Density adjusted for a mean of {} calls per individual; standard errors are unavailable",
                    mean_freq
                ),
            );
        }
    }

    // 5. Strict gradient check
    let reliable = check_reliability(output.max_gradient, &mut diag);

    Ok(FitResult {
        config,
        detfn,
        specs,
        link_coefficients,
        coefficients,
        covariance_names,
        covariance,
        correlation,
        max_gradient: output.max_gradient,
        objective: output.objective,
        esa,
        n_detections: histories.n_detections(),
        n_unique: histories.n_unique(),
        reliable,
        warnings: diag.records().to_vec(),
        mask,
        traps,
    })
}
