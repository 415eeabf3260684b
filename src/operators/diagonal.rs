//! Diagonal of the operator implied by a [`QubitOperator`].
//!
//! Only identity and `Z`-only terms have diagonal entries. A `Z` factor on
//! qubit `s` contributes `-1` on basis states whose bit `q - 1 - s` is set, so
//! a term's sign at index `i` is the parity of `i & z_mask`.

use super::linear::resolve_n_qubits;
use crate::{error::DavidsonError, qubit_operator::QubitOperator};

/// Returns the diagonal of `operator` acting on `n_qubits` qubits, using the
/// same basis ordering as [`super::LinearQubitOperator`].
///
/// The operator is assumed Hermitian, so only the real parts of the diagonal
/// coefficients are kept.
pub fn get_linear_qubit_operator_diagonal(
    operator: &QubitOperator,
    n_qubits: Option<usize>,
) -> Result<Vec<f64>, DavidsonError> {
    let n_qubits = resolve_n_qubits(operator, n_qubits)?;
    let mut diagonal = vec![0.0; 1usize << n_qubits];

    for (term, coefficient) in operator.terms().filter(|(term, _)| term.is_diagonal()) {
        let z_mask = term
            .factors()
            .iter()
            .fold(0usize, |mask, &(index, _)| mask | (1 << (n_qubits - 1 - index)));
        for (i, value) in diagonal.iter_mut().enumerate() {
            if (i & z_mask).count_ones() & 1 != 0 {
                *value -= coefficient.re;
            } else {
                *value += coefficient.re;
            }
        }
    }
    Ok(diagonal)
}
