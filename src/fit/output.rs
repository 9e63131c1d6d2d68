//! Parsers for the optimizer's plain-text result files.
//!
//! The parameter file (`secr.par`) starts with a header line carrying the
//! objective value and the maximum gradient component, followed by one block
//! per parameter:
//!
//! ```text
//! # Number of parameters = 2 Objective function value = 41.3  Maximum gradient component = 2.1e-06
//! # D_link:
//! 5.02
//! # sigma_link:
//! 2.31
//! ```
//!
//! The correlation report (`secr.cor`) lists, for every estimated parameter,
//! its index, name, value, standard deviation and the lower triangle of the
//! correlation matrix:
//!
//! ```text
//!  The logarithm of the determinant of the hessian = 7.8
//!  index   name     value      std.dev       1       2
//!      1   D_link   5.02e+00   1.1e-01   1.0000
//!      2   sigma_link 2.31e+00 4.0e-02  -0.2100  1.0000
//! ```
//!
//! Numeric tokens the optimizer could not format (`nan`, `-1.#IND`, ...) are
//! read as NaN with a warning on the output-parse channel.

use ndarray::{Array1, Array2};
use nom::{
    bytes::complete::{tag, take_till1, take_until},
    character::complete::{char, multispace0, space0},
    combinator::all_consuming,
    number::complete::double,
    sequence::{delimited, preceded},
    IResult, Parser,
};

use crate::error::{Result, SecrError};
use crate::fit::diagnostics::{DiagnosticChannel, Diagnostics};
use crate::uncertainty::covariance_from_correlation;

/// Contents of the parameter file.
#[derive(Debug, Clone, PartialEq)]
pub struct ParFile {
    pub objective: f64,
    pub max_gradient: f64,
    /// Parameter blocks in file order
    pub blocks: Vec<(String, Vec<f64>)>,
}

impl ParFile {
    /// First value of the block named `name`.
    pub fn value(&self, name: &str) -> Option<f64> {
        self.blocks
            .iter()
            .find(|(block, _)| block == name)
            .and_then(|(_, values)| values.first().copied())
    }
}

/// Contents of the correlation report.
#[derive(Debug, Clone, PartialEq)]
pub struct CorFile {
    pub log_det_hessian: f64,
    pub names: Vec<String>,
    pub values: Array1<f64>,
    pub std_devs: Array1<f64>,
    pub correlation: Array2<f64>,
}

impl CorFile {
    /// Covariance rebuilt from the standard deviations and correlations.
    pub fn covariance(&self) -> Result<Array2<f64>> {
        covariance_from_correlation(&self.std_devs, &self.correlation)
    }
}

/// A whitespace-delimited token.
fn token(input: &str) -> IResult<&str, &str> {
    preceded(space0, take_till1(|c: char| c.is_whitespace())).parse(input)
}

fn number(input: &str) -> IResult<&str, f64> {
    double(input)
}

/// The value following `label =` anywhere in `input`.
fn labelled<'a>(input: &'a str, label: &'static str) -> IResult<&'a str, &'a str> {
    preceded((take_until(label), tag(label), space0, char('=')), token).parse(input)
}

/// `# name:` block header.
fn block_header(input: &str) -> IResult<&str, &str> {
    delimited(
        (char('#'), space0),
        take_till1(|c: char| c == ':' || c.is_whitespace()),
        (char(':'), multispace0),
    )
    .parse(input)
}

/// Read a numeric token, falling back to NaN with a warning.
fn numeric(tok: &str, what: &str, diag: &mut Diagnostics) -> f64 {
    match all_consuming(number).parse(tok) {
        Ok((_, value)) if !value.is_nan() => value,
        _ => {
            diag.warn(
                DiagnosticChannel::OutputParse,
                format!("Could not read {} '{}' in optimizer output; using NaN", what, tok),
            );
            f64::NAN
        }
    }
}

fn tokens(line: &str) -> Vec<&str> {
    let mut out = Vec::new();
    let mut rest = line;
    while let Ok((remaining, tok)) = token(rest) {
        out.push(tok);
        rest = remaining;
    }
    out
}

/// Parse the optimizer's parameter file.
pub fn parse_par(text: &str, diag: &mut Diagnostics) -> Result<ParFile> {
    let mut lines = text.lines().filter(|l| !l.trim().is_empty());
    let header = lines
        .next()
        .ok_or_else(|| SecrError::OutputParse("parameter file is empty".to_string()))?;

    let (_, objective) = labelled(header, "Objective function value")
        .map_err(|_| SecrError::OutputParse(format!("no objective function value in header '{}'", header)))?;
    let (_, max_gradient) = labelled(header, "Maximum gradient component")
        .map_err(|_| SecrError::OutputParse(format!("no maximum gradient component in header '{}'", header)))?;

    let objective = numeric(objective, "objective function value", diag);
    let max_gradient = numeric(max_gradient, "maximum gradient component", diag);

    let mut blocks: Vec<(String, Vec<f64>)> = Vec::new();
    for line in lines {
        let trimmed = line.trim();
        if let Ok((_, name)) = block_header(trimmed) {
            blocks.push((name.to_string(), Vec::new()));
            continue;
        }
        let (name, values) = blocks
            .last_mut()
            .ok_or_else(|| SecrError::OutputParse(format!("value line '{}' before any parameter name", trimmed)))?;
        for tok in tokens(trimmed) {
            let value = numeric(tok, &format!("value of {}", name), diag);
            values.push(value);
        }
    }

    if let Some((name, _)) = blocks.iter().find(|(_, values)| values.is_empty()) {
        return Err(SecrError::OutputParse(format!("no value for parameter '{}'", name)));
    }

    Ok(ParFile {
        objective,
        max_gradient,
        blocks,
    })
}

/// Parse the optimizer's correlation report.
///
/// Output-parse warnings are suppressed while the report is read.
pub fn parse_cor(text: &str, diag: &mut Diagnostics) -> Result<CorFile> {
    let mut diag = diag.suppress(DiagnosticChannel::OutputParse);
    let mut lines = text.lines().filter(|l| !l.trim().is_empty());

    let first = lines
        .next()
        .ok_or_else(|| SecrError::OutputParse("correlation report is empty".to_string()))?;
    let (_, log_det) = labelled(first, "hessian")
        .map_err(|_| SecrError::OutputParse(format!("no Hessian determinant in '{}'", first)))?;
    let log_det_hessian = numeric(log_det, "log determinant of the Hessian", &mut diag);

    // Column header
    lines
        .next()
        .ok_or_else(|| SecrError::OutputParse("correlation report has no column header".to_string()))?;

    let mut names = Vec::new();
    let mut values = Vec::new();
    let mut std_devs = Vec::new();
    let mut rows: Vec<Vec<f64>> = Vec::new();

    for line in lines {
        let toks = tokens(line);
        let row = rows.len() + 1;
        if toks.len() != 4 + row {
            return Err(SecrError::OutputParse(format!(
                "row {} of the correlation report has {} fields, expected {}",
                row,
                toks.len(),
                4 + row
            )));
        }
        names.push(toks[1].to_string());
        values.push(numeric(toks[2], "estimate", &mut diag));
        std_devs.push(numeric(toks[3], "standard deviation", &mut diag));
        rows.push(
            toks[4..]
                .iter()
                .map(|tok| numeric(tok, "correlation", &mut diag))
                .collect(),
        );
    }

    let n = rows.len();
    let mut correlation = Array2::zeros((n, n));
    for (i, row) in rows.iter().enumerate() {
        for (j, &value) in row.iter().enumerate() {
            correlation[[i, j]] = value;
            correlation[[j, i]] = value;
        }
    }

    Ok(CorFile {
        log_det_hessian,
        names,
        values: Array1::from(values),
        std_devs: Array1::from(std_devs),
        correlation,
    })
}
