//! The optimizer boundary.
//!
//! A [`Solver`] consumes an [`InputDeck`] and returns link-scale estimates for
//! every parameter in deck order, the maximum absolute gradient component and,
//! when the Hessian was computed, the covariance (or the Hessian itself) over
//! the estimated parameters.

use ndarray::Array2;
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use crate::error::{Result, SecrError};
use crate::fit::deck::InputDeck;
use crate::fit::diagnostics::{DiagnosticChannel, Diagnostics};
use crate::fit::output::{parse_cor, parse_par};
use crate::uncertainty::is_valid_covariance;

/// Per-run options passed to a solver.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SolveOptions {
    /// Compute the Hessian and report uncertainty
    pub hessian: bool,
    /// Wall-clock limit
    pub timeout: Option<Duration>,
}

/// Raw result of one optimizer run.
#[derive(Debug, Clone, PartialEq)]
pub struct SolverOutput {
    /// Link-scale estimates in deck order, fixed parameters included
    pub estimates: Vec<f64>,
    pub max_gradient: f64,
    /// Negative log-likelihood at the estimates
    pub objective: f64,
    /// Link-scale covariance over the estimated parameters
    pub covariance: Option<Array2<f64>>,
    /// Hessian over the estimated parameters, when no covariance is reported
    pub hessian: Option<Array2<f64>>,
}

/// A black-box maximum-likelihood optimizer.
pub trait Solver {
    fn solve(&self, deck: &InputDeck, options: &SolveOptions, diag: &mut Diagnostics) -> Result<SolverOutput>;
}

/// Name of the deck file written into the working area.
pub const DECK_FILE: &str = "secr.json";
/// Name of the parameter file the optimizer must produce.
pub const PAR_FILE: &str = "secr.par";
/// Name of the correlation report produced when the Hessian is computed.
pub const COR_FILE: &str = "secr.cor";

const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Runs an optimizer executable in a fresh temporary working area.
///
/// The executable is started with the working area as its current directory,
/// reads `secr.json` and writes `secr.par` (and `secr.cor` unless started
/// with `-nohess`). Every call gets its own uniquely named working area, so
/// concurrent fits never share files.
#[derive(Debug, Clone)]
pub struct ExternalSolver {
    executable: PathBuf,
    args: Vec<String>,
}

impl ExternalSolver {
    pub fn new(executable: impl Into<PathBuf>) -> Self {
        Self {
            executable: executable.into(),
            args: Vec::new(),
        }
    }

    /// Extra command line arguments passed on every run.
    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn executable(&self) -> &Path {
        &self.executable
    }

    fn run(&self, workdir: &Path, options: &SolveOptions) -> Result<ExitStatus> {
        let log = File::create(workdir.join("solver.log"))?;
        let mut command = Command::new(&self.executable);
        command
            .current_dir(workdir)
            .args(&self.args)
            .stdin(Stdio::null())
            .stdout(log.try_clone()?)
            .stderr(log);
        if !options.hessian {
            command.arg("-nohess");
        }

        let mut child = command.spawn().map_err(|err| {
            SecrError::SolverFailure(format!("could not start {}: {}", self.executable.display(), err))
        })?;

        match options.timeout {
            None => Ok(child.wait()?),
            Some(limit) => {
                let started = Instant::now();
                loop {
                    if let Some(status) = child.try_wait()? {
                        return Ok(status);
                    }
                    if started.elapsed() >= limit {
                        // The process may have exited between the two calls.
                        let _ = child.kill();
                        let _ = child.wait();
                        return Err(SecrError::SolverTimeout {
                            seconds: limit.as_secs_f64(),
                        });
                    }
                    thread::sleep(POLL_INTERVAL);
                }
            }
        }
    }
}

impl Solver for ExternalSolver {
    fn solve(&self, deck: &InputDeck, options: &SolveOptions, diag: &mut Diagnostics) -> Result<SolverOutput> {
        let workdir = tempfile::Builder::new().prefix("secr").tempdir()?;
        {
            let file = BufWriter::new(File::create(workdir.path().join(DECK_FILE))?);
            serde_json::to_writer(file, deck)?;
        }
        log::debug!("running {} in {}", self.executable.display(), workdir.path().display());

        let status = self.run(workdir.path(), options)?;
        if !status.success() {
            log::debug!("optimizer exited with {}", status);
        }

        let par_path = workdir.path().join(PAR_FILE);
        if !par_path.exists() {
            return Err(SecrError::SolverOutputMissing(format!(
                "{} was not produced (optimizer exit status: {})",
                PAR_FILE, status
            )));
        }
        let par = parse_par(&fs::read_to_string(&par_path)?, diag)?;

        let estimates = deck
            .parameters
            .iter()
            .map(|p| {
                par.value(&p.name)
                    .ok_or_else(|| SecrError::OutputParse(format!("{} has no value for '{}'", PAR_FILE, p.name)))
            })
            .collect::<Result<Vec<_>>>()?;

        let covariance = if options.hessian {
            read_covariance(&workdir.path().join(COR_FILE), deck, diag)?
        } else {
            None
        };

        Ok(SolverOutput {
            estimates,
            max_gradient: par.max_gradient,
            objective: par.objective,
            covariance,
            hessian: None,
        })
    }
}

/// Read the link-scale covariance from the correlation report, reordered to
/// the deck's estimated parameters.
fn read_covariance(path: &Path, deck: &InputDeck, diag: &mut Diagnostics) -> Result<Option<Array2<f64>>> {
    if !path.exists() {
        diag.warn(
            DiagnosticChannel::Convergence,
            format!("{} was not produced; the Hessian could not be computed", COR_FILE),
        );
        return Ok(None);
    }

    let cor = parse_cor(&fs::read_to_string(path)?, diag)?;
    let covariance = cor.covariance()?;

    let free: Vec<&str> = deck
        .free_indices()
        .into_iter()
        .map(|i| deck.parameters[i].name.as_str())
        .collect();
    let positions = free
        .iter()
        .map(|name| {
            cor.names
                .iter()
                .position(|n| n == name)
                .ok_or_else(|| SecrError::OutputParse(format!("{} has no row for '{}'", COR_FILE, name)))
        })
        .collect::<Result<Vec<_>>>()?;

    let n = positions.len();
    let reordered = Array2::from_shape_fn((n, n), |(i, j)| covariance[[positions[i], positions[j]]]);
    if !is_valid_covariance(&reordered) {
        diag.warn(
            DiagnosticChannel::Convergence,
            "Covariance matrix contains non-finite values; the Hessian is not valid",
        );
        return Ok(None);
    }
    Ok(Some(reordered))
}
