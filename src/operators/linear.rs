//! Serial matrix-free application of a [`QubitOperator`].
//!
//! A state vector of `q` qubits has length `2^q`, with qubit 0 as the most
//! significant bit of the basis index. A single-qubit factor on qubit `s` pairs
//! up entries whose indices differ only in that bit: viewing the vector as
//! consecutive blocks of length `2^(q-s)`, the first half of each block is the
//! `|0>` component and the second half the `|1>` component. Each factor is a
//! 2x2 action on every such pair:
//!
//! - `X`: swap the halves,
//! - `Y`: `(a, b) -> (-i b, i a)`,
//! - `Z`: `(a, b) -> (a, -b)`.
//!
//! Qubits without a factor are untouched. Terms are applied independently and
//! summed, weighted by their coefficients.

use crate::{
    error::{DavidsonError, DavidsonErrorKind},
    matrix::{LinearOperator, check_len},
    qubit_operator::{Pauli, PauliString, QubitOperator},
};
use faer::c64;

/// One compiled term of a qubit operator: its Pauli factors and coefficient.
#[derive(Clone, Debug, PartialEq)]
pub struct PauliTerm {
    factors: Vec<(usize, Pauli)>,
    coefficient: c64,
}

impl PauliTerm {
    pub fn new(string: &PauliString, coefficient: c64) -> Self {
        Self {
            factors: string.factors().to_vec(),
            coefficient,
        }
    }

    pub fn coefficient(&self) -> c64 {
        self.coefficient
    }

    /// Applies the bare Pauli string (coefficient excluded) to `state` in place.
    ///
    /// `state.len()` must be `2^n_qubits` and every factor index below `n_qubits`.
    pub fn apply_in_place(&self, n_qubits: usize, state: &mut [c64]) {
        for &(index, pauli) in &self.factors {
            let half = 1usize << (n_qubits - index - 1);
            for block in state.chunks_exact_mut(2 * half) {
                let (low, high) = block.split_at_mut(half);
                match pauli {
                    Pauli::X => low.swap_with_slice(high),
                    Pauli::Y => {
                        for (a, b) in low.iter_mut().zip(high.iter_mut()) {
                            let (zero, one) = (*a, *b);
                            // -i * one, i * zero
                            *a = c64::new(one.im, -one.re);
                            *b = c64::new(-zero.im, zero.re);
                        }
                    }
                    Pauli::Z => {
                        for b in high.iter_mut() {
                            *b = -*b;
                        }
                    }
                }
            }
        }
    }
}

/// Resolves the qubit count of an operator, validating an explicit request.
pub(crate) fn resolve_n_qubits(
    operator: &QubitOperator,
    n_qubits: Option<usize>,
) -> Result<usize, DavidsonError> {
    let required = operator.count_qubits();
    let n_qubits = match n_qubits {
        None => required,
        Some(requested) if requested < required => {
            return Err(DavidsonErrorKind::InvalidQubitCount {
                requested,
                required,
            }
            .into());
        }
        Some(requested) => requested,
    };

    if n_qubits >= usize::BITS as usize {
        return Err(DavidsonErrorKind::InputError(format!(
            "the value for n_qubits, {n_qubits}, is too large and would overflow"
        ))
        .into());
    }
    Ok(n_qubits)
}

/// A [`LinearOperator`] implied by a [`QubitOperator`], applied without ever
/// materializing its `2^q x 2^q` matrix.
#[derive(Clone, Debug)]
pub struct LinearQubitOperator {
    terms: Vec<PauliTerm>,
    n_qubits: usize,
}

impl LinearQubitOperator {
    /// Compiles `operator` for vectors of `n_qubits` qubits.
    ///
    /// When `n_qubits` is `None` the operator's own qubit count is used. An
    /// explicit count smaller than that fails with
    /// [`DavidsonErrorKind::InvalidQubitCount`].
    pub fn new(operator: &QubitOperator, n_qubits: Option<usize>) -> Result<Self, DavidsonError> {
        let n_qubits = resolve_n_qubits(operator, n_qubits)?;
        let terms = operator
            .terms()
            .map(|(string, &coefficient)| PauliTerm::new(string, coefficient))
            .collect();
        Ok(Self { terms, n_qubits })
    }

    pub fn n_qubits(&self) -> usize {
        self.n_qubits
    }

    pub fn num_terms(&self) -> usize {
        self.terms.len()
    }
}

impl LinearOperator for LinearQubitOperator {
    #[inline]
    fn dimension(&self) -> usize {
        1usize << self.n_qubits
    }

    fn matvec(&self, x: &[c64]) -> Result<Vec<c64>, DavidsonError> {
        check_len(self.dimension(), x)?;

        let mut out = vec![c64::new(0.0, 0.0); x.len()];
        // Scratch buffer reused across terms; each term starts from a fresh copy of `x`.
        let mut scratch = x.to_vec();
        for term in &self.terms {
            scratch.copy_from_slice(x);
            term.apply_in_place(self.n_qubits, &mut scratch);
            let coefficient = term.coefficient();
            for (acc, value) in out.iter_mut().zip(&scratch) {
                *acc += coefficient * value;
            }
        }
        Ok(out)
    }
}
