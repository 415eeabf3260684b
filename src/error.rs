//! This module defines the custom error types for the library.
//!
//! All failure modes of the operators and of the Davidson solver are collected
//! into a single enum, [`DavidsonErrorKind`], exposed through the transparent
//! [`DavidsonError`] wrapper.
//!
//! Non-convergence is *not* an error: a solver run that exhausts its iteration
//! budget returns normally with `converged == false`.
//!
//! Eigendecomposition failures from faer are carried as
//! [`DavidsonErrorKind::EvdError`] and formatted through their `Debug` output.
use thiserror::Error;

/// Represents all possible errors raised by the operators and the Davidson solver.
#[derive(Error, Debug)]
#[error(transparent)]
pub struct DavidsonError(#[from] DavidsonErrorKind);

impl DavidsonError {
    /// Returns the kind of failure, for callers that need to branch on it.
    pub fn kind(&self) -> &DavidsonErrorKind {
        &self.0
    }
}

/// The distinct kinds of errors.
#[derive(Error, Debug, PartialEq)]
pub enum DavidsonErrorKind {
    /// A vector, guess matrix or diagonal does not match the operator dimension.
    #[error("Dimension mismatch: expected length {expected}, got {actual}.")]
    DimensionMismatch { expected: usize, actual: usize },

    /// The requested qubit count cannot hold every site referenced by the operator.
    #[error("Invalid number of qubits specified: {requested} < {required}.")]
    InvalidQubitCount { requested: usize, required: usize },

    /// A worker pool was requested with no workers.
    #[error("Invalid number of processes specified: {0} <= 0.")]
    InvalidProcesses(usize),

    /// The number of requested eigenpairs is outside `[1, dimension]`.
    #[error("n_lowest is supposed to be in [1, {dimension}], got {n_lowest}.")]
    OutOfRange { n_lowest: usize, dimension: usize },

    /// The initial guess has no entry above the tolerance.
    #[error("Guess vectors are all zero.")]
    ZeroGuess,

    /// More orthonormal random vectors were requested than the space can hold.
    #[error("Asking for too many random vectors: {requested} > {dimension}.")]
    TooManyRandomVectors { requested: usize, dimension: usize },

    /// Random padding could not produce `n_lowest` orthonormal start vectors
    /// with norms above the tolerance.
    #[error("Only {found} orthonormal start vectors could be built, {n_lowest} are needed.")]
    InsufficientStartVectors { n_lowest: usize, found: usize },

    /// Orthonormalization was asked for on a matrix with no columns.
    #[error("Vectors are not supposed to be empty.")]
    EmptyVectors,

    /// Indicates that an invalid input parameter was provided to a function.
    #[error("Invalid input parameter: {0}")]
    InputError(String),

    /// Wraps an error originating from [`faer`]'s eigendecomposition module.
    #[error("A numerical error occurred during the projected eigendecomposition: {0:?}")]
    EvdError(faer::linalg::evd::EvdError),

    /// The thread pool backing a parallel operator could not be built.
    #[error("Failed to build worker pool: {0}")]
    WorkerPool(String),
}

// Two errors are equal when they carry the same kind.
impl PartialEq for DavidsonError {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}
