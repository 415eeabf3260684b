//! Block Davidson eigensolver for large, implicitly defined Hermitian operators.
//!
//! This crate finds the lowest few eigenvalues and eigenvectors of operators whose
//! dimension is far too large to store as a matrix. The solver only needs two
//! things from the operator: its action on a block of vectors and its diagonal.
//!
//! The main source of such operators here are qubit Hamiltonians: weighted sums of
//! Pauli strings on `q` qubits, acting on state vectors of length `2^q`. They are
//! applied matrix-free, term by term, either serially or split across a pool of
//! worker threads.
//!
//! ## Components
//!
//! - [`qubit_operator`]: the term collection ([`QubitOperator`], [`PauliString`]).
//! - [`operators`]: the matrix-free [`LinearQubitOperator`], its parallel
//!   counterpart [`ParallelLinearQubitOperator`], and the operator diagonal.
//! - [`matrix`]: the [`LinearOperator`] contract shared by every operator,
//!   including dense [`faer`] matrices.
//! - [`solvers`]: the reusable [`Davidson`] solver handle.
//! - [`algorithms`]: the low-level pieces of the Davidson iteration.
//!
//! ## Example Usage
//!
//! ```rust
//! use faer::c64;
//! use qubit_davidson::{QubitDavidson, QubitOperator};
//!
//! // H = Z0 + 0.5 X1 on two qubits.
//! let mut operator = QubitOperator::new();
//! operator.add_term("Z0".parse().unwrap(), c64::new(1.0, 0.0));
//! operator.add_term("X1".parse().unwrap(), c64::new(0.5, 0.0));
//!
//! let mut solver = QubitDavidson::from_qubit_operator(&operator, None, 1e-8, None).unwrap();
//! let output = solver.get_lowest_n(1, None, 100).unwrap();
//!
//! assert!(output.converged);
//! assert!((output.eigenvalues[0] + 1.5).abs() < 1e-8);
//! ```

pub mod algorithms;
pub mod error;
pub mod matrix;
pub mod operators;
pub mod qubit_operator;
pub mod solvers;
pub mod utils;

pub use error::{DavidsonError, DavidsonErrorKind};
pub use matrix::LinearOperator;
pub use operators::{
    LinearQubitOperator, LinearQubitOperatorOptions, LinearQubitOperatorVariant,
    ParallelLinearQubitOperator, generate_linear_qubit_operator,
    get_linear_qubit_operator_diagonal,
};
pub use qubit_operator::{Pauli, PauliString, QubitOperator};
pub use solvers::{Davidson, DavidsonOutput, QubitDavidson, solve};
