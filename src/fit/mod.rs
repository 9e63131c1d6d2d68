//! # Fitting
//!
//! The pipeline from survey data to a [`FitResult`]:
//!
//! 1. validate the capture data against the traps
//! 2. resolve the model and validate the caller's overrides
//! 3. compress detection histories
//! 4. compute the survey geometry
//! 5. fill in missing start values, density last
//! 6. build the parameter specifications
//! 7. restrict integration domains (when local integration is on)
//! 8. assemble the input deck, run the [`Solver`] and reconstruct the result
//!
//! Steps 1 to 8 up to the deck are available on their own through
//! [`prepare_fit`].

pub mod config;
pub mod convergence;
pub mod deck;
pub mod diagnostics;
pub mod output;
pub mod result;
pub mod solver;

pub use config::FitConfig;
pub use deck::{DeckParameter, InputDeck, DBL_MIN};
pub use diagnostics::{Diagnostic, DiagnosticChannel, Diagnostics, Suppression};
pub use result::{Coefficient, FitResult};
pub use solver::{ExternalSolver, SolveOptions, Solver, SolverOutput};

use crate::autostart::{StartContext, StartRegistry};
use crate::data::{compress_histories, CaptureData, CompressedHistories, Mask, Traps};
use crate::error::{Result, SecrError};
use crate::geometry::{local_mask_indices, MaskIndices, SurveyGeometry};
use crate::parameters::{ModelDefinition, ParameterSpec, ParameterSpecBuilder};

/// Everything produced before the optimizer runs.
#[derive(Debug, Clone)]
pub struct PreparedFit {
    pub config: FitConfig,
    pub model: ModelDefinition,
    pub specs: Vec<ParameterSpec>,
    pub histories: CompressedHistories,
    pub traps: Traps,
    pub mask: Mask,
    pub geometry: SurveyGeometry,
    pub deck: InputDeck,
    /// Parameters whose start values were computed, in computation order
    pub start_order: Vec<String>,
    pub diagnostics: Diagnostics,
}

impl PreparedFit {
    /// Options for the solver run implied by the configuration.
    pub fn solve_options(&self) -> SolveOptions {
        SolveOptions {
            hessian: self.config.compute_hessian(),
            timeout: self.config.timeout,
        }
    }
}

fn validate_call_freqs(config: &FitConfig) -> Result<()> {
    if let Some(freqs) = &config.call_freqs {
        if freqs.is_empty() {
            return Err(SecrError::Computation("Call frequencies must not be empty".to_string()));
        }
        if let Some(bad) = freqs.iter().find(|f| !(f.is_finite() && **f > 0.0)) {
            return Err(SecrError::Computation(format!(
                "Call frequencies must be positive and finite, got {}",
                bad
            )));
        }
    }
    Ok(())
}

/// Run the pipeline up to the assembled input deck.
pub fn prepare_fit(capt: &CaptureData, traps: &Traps, mask: &Mask, config: &FitConfig) -> Result<PreparedFit> {
    capt.validate_traps(traps)?;
    validate_call_freqs(config)?;

    let mut diag = Diagnostics::new();
    let model = ModelDefinition::resolve(config, capt, &mut diag)?;
    let builder = ParameterSpecBuilder::new(model.clone(), config, &mut diag)?;

    let histories = compress_histories(capt);
    let geometry = SurveyGeometry::compute(traps, mask, &histories.data, config.sound_speed)?;

    let starts = StartRegistry::new().resolve(
        &model,
        StartContext {
            capture: capt,
            compressed: &histories,
            traps,
            mask,
            dists: &geometry.dists,
            trap_dists: &geometry.trap_dists,
            detfn: model.detfn(),
            cutoff: config.cutoff,
            values: builder.known_starts(),
        },
    )?;
    let specs = builder.build(&starts.values, &mut diag)?;
    for spec in &specs {
        log::debug!("{}", spec);
    }

    let mask_indices = if config.local {
        let indices = local_mask_indices(histories.data.bincapt(), &geometry.dists, mask.buffer());
        for history in indices.empty_histories() {
            diag.warn(
                DiagnosticChannel::Locality,
                format!(
                    "Unique history {} has no mask point within {} of every detector that fired; consider a larger buffer",
                    history,
                    mask.buffer()
                ),
            );
        }
        indices
    } else {
        MaskIndices::full(histories.n_unique(), mask.len())
    };

    if config.has_call_heterogeneity() && config.hess == Some(true) {
        diag.warn(
            DiagnosticChannel::Heterogeneity,
            "The Hessian is computed on request, but its standard errors are not valid with call frequencies other than 1",
        );
    }

    let deck = InputDeck::assemble(
        model.detfn(),
        &specs,
        &histories,
        mask,
        &geometry,
        mask_indices,
        config.cutoff,
        config.sound_speed,
    );

    Ok(PreparedFit {
        config: config.clone(),
        model,
        specs,
        histories,
        traps: traps.clone(),
        mask: mask.clone(),
        geometry,
        deck,
        start_order: starts.resolution_order,
        diagnostics: diag,
    })
}

/// Fit a spatial capture-recapture model.
///
/// # Examples
///
/// ```no_run
/// use ndarray::arr2;
/// use secrfit_rs::data::{CaptureData, Mask, Traps};
/// use secrfit_rs::fit::{fit_secr, ExternalSolver, FitConfig};
///
/// let capt = CaptureData::new(arr2(&[[1.0, 1.0, 0.0], [0.0, 1.0, 1.0]]));
/// let traps = Traps::from_points(&[(0.0, 0.0), (10.0, 0.0), (20.0, 0.0)]);
/// let mask = Mask::around_traps(&traps, 50.0, 5.0)?;
/// let config = FitConfig::new("hn").with_fix("g0", 1.0);
///
/// let fit = fit_secr(&capt, &traps, &mask, &config, &ExternalSolver::new("secr"))?;
/// println!("{}", fit);
/// # Ok::<(), secrfit_rs::SecrError>(())
/// ```
pub fn fit_secr(
    capt: &CaptureData,
    traps: &Traps,
    mask: &Mask,
    config: &FitConfig,
    solver: &dyn Solver,
) -> Result<FitResult> {
    let mut prepared = prepare_fit(capt, traps, mask, config)?;
    let options = prepared.solve_options();
    let output = solver.solve(&prepared.deck, &options, &mut prepared.diagnostics)?;
    result::reconstruct(prepared, output)
}

/// The mask a fit integrated over.
pub fn get_mask(fit: &FitResult) -> &Mask {
    fit.mask()
}
