//! Loading qubit operators from plain-text files.
//!
//! One term per line: a real coefficient, an optional imaginary part, then the
//! Pauli string (omitted for the identity term):
//!
//! ```text
//! # transverse-field Ising, 2 qubits
//! -1.0 Z0 Z1
//! -0.5 X0
//! -0.5 X1
//! 0.25 0.0
//! ```
//!
//! Blank lines and lines starting with `#` are ignored. Repeated terms are summed.

use crate::{
    error::DavidsonError,
    qubit_operator::{PauliString, QubitOperator},
};
use faer::c64;
use std::{
    fs::File,
    io::{self, BufRead, BufReader},
    path::Path,
};
use thiserror::Error;

/// Represents all possible errors that can occur while loading an operator file.
#[derive(Error, Debug)]
pub enum DataLoaderError {
    /// Wraps a standard I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    /// A line does not start with a valid coefficient.
    #[error("Parse error on line {line}: failed to parse coefficient from '{token}'")]
    ParseFloat { line: usize, token: String },
    /// The Pauli string of a line is malformed.
    #[error("Parse error on line {line}: {source}")]
    Term {
        line: usize,
        #[source]
        source: DavidsonError,
    },
}

/// Parses a single term line into a Pauli string and its coefficient.
///
/// Returns `Ok(None)` for blank and comment lines.
fn parse_line(
    line_number: usize,
    line: &str,
) -> Result<Option<(PauliString, c64)>, DataLoaderError> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }

    let mut tokens = line.split_whitespace().peekable();
    let parse_float = |token: &str| {
        token.parse::<f64>().map_err(|_| DataLoaderError::ParseFloat {
            line: line_number,
            token: token.to_string(),
        })
    };

    // The line is non-empty, so there is at least one token.
    let re = parse_float(tokens.next().unwrap_or_default())?;
    let im = match tokens.peek().map(|token| token.parse::<f64>()) {
        Some(Ok(im)) => {
            tokens.next();
            im
        }
        _ => 0.0,
    };

    let term = tokens
        .collect::<Vec<_>>()
        .join(" ")
        .parse::<PauliString>()
        .map_err(|source| DataLoaderError::Term {
            line: line_number,
            source,
        })?;
    Ok(Some((term, c64::new(re, im))))
}

/// Reads a [`QubitOperator`] from any buffered reader in the term-per-line format.
pub fn read_qubit_operator(reader: impl BufRead) -> Result<QubitOperator, DataLoaderError> {
    let mut operator = QubitOperator::new();
    for (index, line) in reader.lines().enumerate() {
        if let Some((term, coefficient)) = parse_line(index + 1, &line?)? {
            operator.add_term(term, coefficient);
        }
    }
    Ok(operator)
}

/// Loads a [`QubitOperator`] from the file at `path`.
pub fn load_qubit_operator(path: impl AsRef<Path>) -> Result<QubitOperator, DataLoaderError> {
    let file = File::open(path)?;
    read_qubit_operator(BufReader::new(file))
}
