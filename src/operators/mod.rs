//! Matrix-free operators built from a [`QubitOperator`].
//!
//! Two implementations share the [`LinearOperator`] contract: the serial
//! [`LinearQubitOperator`] and the multi-worker [`ParallelLinearQubitOperator`].
//! [`generate_linear_qubit_operator`] picks one of them once, at construction.

pub mod diagonal;
pub mod linear;
pub mod parallel;

pub use diagonal::get_linear_qubit_operator_diagonal;
pub use linear::{LinearQubitOperator, PauliTerm};
pub use parallel::{LinearQubitOperatorOptions, ParallelLinearQubitOperator};

use crate::{error::DavidsonError, matrix::LinearOperator, qubit_operator::QubitOperator};
use faer::{Mat, MatRef, c64};

/// A qubit operator compiled for either serial or parallel application.
#[derive(Debug)]
pub enum LinearQubitOperatorVariant {
    Serial(LinearQubitOperator),
    Parallel(ParallelLinearQubitOperator),
}

impl LinearQubitOperatorVariant {
    pub fn n_qubits(&self) -> usize {
        match self {
            Self::Serial(op) => op.n_qubits(),
            Self::Parallel(op) => op.n_qubits(),
        }
    }
}

impl LinearOperator for LinearQubitOperatorVariant {
    fn dimension(&self) -> usize {
        match self {
            Self::Serial(op) => op.dimension(),
            Self::Parallel(op) => op.dimension(),
        }
    }

    fn matvec(&self, x: &[c64]) -> Result<Vec<c64>, DavidsonError> {
        match self {
            Self::Serial(op) => op.matvec(x),
            Self::Parallel(op) => op.matvec(x),
        }
    }

    fn apply(&self, rhs: MatRef<'_, c64>) -> Result<Mat<c64>, DavidsonError> {
        match self {
            Self::Serial(op) => op.apply(rhs),
            Self::Parallel(op) => op.apply(rhs),
        }
    }
}

/// Compiles `operator` into a matrix-free linear operator.
///
/// Without `options` the serial operator is built; with options, the terms are
/// distributed over a worker pool sized by them.
pub fn generate_linear_qubit_operator(
    operator: &QubitOperator,
    n_qubits: Option<usize>,
    options: Option<LinearQubitOperatorOptions>,
) -> Result<LinearQubitOperatorVariant, DavidsonError> {
    Ok(match options {
        None => LinearQubitOperatorVariant::Serial(LinearQubitOperator::new(operator, n_qubits)?),
        Some(options) => LinearQubitOperatorVariant::Parallel(ParallelLinearQubitOperator::new(
            operator, n_qubits, options,
        )?),
    })
}
