//! Weighted sums of Pauli strings.
//!
//! A [`QubitOperator`] maps each [`PauliString`] (a tensor product of single-qubit
//! `X`, `Y`, `Z` factors, identity on every qubit not listed) to a complex
//! coefficient. It is the term collection the matrix-free operators are built from:
//! it reports how many qubits it touches and can be split into balanced groups
//! for parallel application.

use crate::error::{DavidsonError, DavidsonErrorKind};
use faer::c64;
use std::{collections::BTreeMap, fmt, str::FromStr};

/// A single-qubit Pauli factor. Identity factors are never stored.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Pauli {
    X,
    Y,
    Z,
}

impl Pauli {
    fn from_char(c: char) -> Option<Self> {
        match c {
            'X' | 'x' => Some(Pauli::X),
            'Y' | 'y' => Some(Pauli::Y),
            'Z' | 'z' => Some(Pauli::Z),
            _ => None,
        }
    }

    fn as_char(self) -> char {
        match self {
            Pauli::X => 'X',
            Pauli::Y => 'Y',
            Pauli::Z => 'Z',
        }
    }
}

/// An ordered tensor product of Pauli factors, sorted by qubit index.
///
/// Qubit indices are unique within a string. The empty string is the identity.
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PauliString(Vec<(usize, Pauli)>);

impl PauliString {
    /// Builds a Pauli string from `(qubit, factor)` pairs in any order.
    ///
    /// Fails if the same qubit index appears twice.
    pub fn new(factors: impl IntoIterator<Item = (usize, Pauli)>) -> Result<Self, DavidsonError> {
        let mut factors: Vec<(usize, Pauli)> = factors.into_iter().collect();
        factors.sort_by_key(|&(index, _)| index);
        if let Some(pair) = factors.windows(2).find(|pair| pair[0].0 == pair[1].0) {
            return Err(DavidsonErrorKind::InputError(format!(
                "qubit {} appears more than once in a Pauli string",
                pair[0].0
            ))
            .into());
        }
        Ok(Self(factors))
    }

    /// The identity string (no factors).
    pub fn identity() -> Self {
        Self(Vec::new())
    }

    /// The factors, in increasing qubit order.
    pub fn factors(&self) -> &[(usize, Pauli)] {
        &self.0
    }

    /// The highest qubit index referenced, or `None` for the identity.
    pub fn max_index(&self) -> Option<usize> {
        self.0.last().map(|&(index, _)| index)
    }

    /// True when every factor is `Z`, i.e. the string is diagonal in the computational basis.
    pub fn is_diagonal(&self) -> bool {
        self.0.iter().all(|&(_, pauli)| pauli == Pauli::Z)
    }
}

impl FromStr for PauliString {
    type Err = DavidsonError;

    /// Parses the textual form `"X0 Y1 Z3"`. The empty string is the identity.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parse_factor = |token: &str| -> Result<(usize, Pauli), DavidsonError> {
            let mut chars = token.chars();
            let pauli = chars.next().and_then(Pauli::from_char).ok_or_else(|| {
                DavidsonErrorKind::InputError(format!("invalid Pauli factor '{token}'"))
            })?;
            let index = chars.as_str().parse::<usize>().map_err(|_| {
                DavidsonErrorKind::InputError(format!("invalid qubit index in '{token}'"))
            })?;
            Ok((index, pauli))
        };

        let factors = s
            .split_whitespace()
            .map(parse_factor)
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(factors)
    }
}

impl fmt::Display for PauliString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (pos, (index, pauli)) in self.0.iter().enumerate() {
            if pos > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{}{}", pauli.as_char(), index)?;
        }
        Ok(())
    }
}

/// A linear combination of Pauli strings with complex coefficients.
///
/// Terms are kept in a deterministic (sorted) order, so grouping and iteration
/// are reproducible.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct QubitOperator {
    terms: BTreeMap<PauliString, c64>,
}

impl QubitOperator {
    /// The empty (zero) operator.
    pub fn new() -> Self {
        Self::default()
    }

    /// An operator with a single term.
    pub fn from_term(term: PauliString, coefficient: c64) -> Self {
        let mut operator = Self::new();
        operator.add_term(term, coefficient);
        operator
    }

    /// Adds `coefficient * term`, accumulating onto an existing equal term.
    pub fn add_term(&mut self, term: PauliString, coefficient: c64) {
        *self.terms.entry(term).or_insert(c64::new(0.0, 0.0)) += coefficient;
    }

    /// Iterates over `(term, coefficient)` pairs in term order.
    pub fn terms(&self) -> impl ExactSizeIterator<Item = (&PauliString, &c64)> {
        self.terms.iter()
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Number of qubits the operator acts on: the highest referenced index plus one.
    ///
    /// An operator made only of identity terms (or no terms) acts on zero qubits.
    pub fn count_qubits(&self) -> usize {
        self.terms
            .keys()
            .filter_map(PauliString::max_index)
            .max()
            .map_or(0, |index| index + 1)
    }

    /// Splits the terms into at most `num_groups` operators of near-equal size.
    ///
    /// Groups are contiguous runs of the term order; the first `len % groups`
    /// groups hold one extra term. Every term lands in exactly one group.
    /// A request for zero groups is treated as a request for one.
    pub fn get_operator_groups(&self, num_groups: usize) -> Vec<QubitOperator> {
        let num_groups = num_groups.max(1).min(self.len());
        if num_groups == 0 {
            return Vec::new();
        }

        let base = self.len() / num_groups;
        let extra = self.len() % num_groups;
        let mut terms = self.terms.iter();
        (0..num_groups)
            .map(|group| {
                let size = base + usize::from(group < extra);
                terms
                    .by_ref()
                    .take(size)
                    .map(|(term, &coefficient)| (term.clone(), coefficient))
                    .collect()
            })
            .collect()
    }
}

impl FromIterator<(PauliString, c64)> for QubitOperator {
    fn from_iter<I: IntoIterator<Item = (PauliString, c64)>>(iter: I) -> Self {
        let mut operator = Self::new();
        for (term, coefficient) in iter {
            operator.add_term(term, coefficient);
        }
        operator
    }
}
