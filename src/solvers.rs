//! This module provides the high-level API for computing the lowest eigenpairs
//! of a large Hermitian operator with the block Davidson method.
//!
//! A [`Davidson`] handle owns a [`LinearOperator`], the operator's diagonal (used
//! as preconditioner), a tolerance and a random source. Each call to
//! [`Davidson::get_lowest_n`] runs an independent search:
//!
//! 1. Validate the request and orthonormalize the initial guess, padding it with
//!    random orthonormal vectors up to `n_lowest` columns.
//! 2. Iterate: apply the operator to the basis columns whose images are not yet
//!    cached, solve the projected problem, and stop once every residual entry is
//!    below `eps`. Otherwise append preconditioned corrections (or, if they add
//!    nothing new, random directions) to the basis.
//! 3. Report the last Ritz pairs, flagged as converged or not.

use crate::{
    algorithms::davidson::{
        append_random_vectors, generate_random_vectors, hstack, max_abs, new_directions,
        orthonormalize, rayleigh_ritz,
    },
    error::{DavidsonError, DavidsonErrorKind},
    matrix::LinearOperator,
    operators::{
        LinearQubitOperatorOptions, LinearQubitOperatorVariant, generate_linear_qubit_operator,
        get_linear_qubit_operator_diagonal,
    },
    qubit_operator::QubitOperator,
};
use faer::{Mat, MatRef, c64};
use rand::{Rng, SeedableRng, rngs::StdRng};

/// Default tolerance on residual entries.
pub const DEFAULT_EPS: f64 = 1e-6;

/// Default iteration budget of a single search.
pub const DEFAULT_MAX_ITERATIONS: usize = 300;

/// Random-direction rounds attempted when an iteration produced no new direction.
const MAX_RANDOM_ROUNDS: usize = 3;

/// Outcome of a Davidson search.
///
/// Running out of iterations is not an error: `converged` is then `false` and the
/// last Ritz estimates are returned.
#[derive(Debug, Clone)]
pub struct DavidsonOutput {
    pub converged: bool,
    /// The `n_lowest` Ritz values, ascending.
    pub eigenvalues: Vec<f64>,
    /// Matching Ritz vectors, one per column.
    pub eigenvectors: Mat<c64>,
    /// Number of Rayleigh-Ritz steps performed.
    pub iterations: usize,
    /// Largest absolute residual entry at the last step.
    pub max_residual: f64,
}

/// Block Davidson solver for the lowest eigenpairs of a Hermitian operator.
pub struct Davidson<O, R = StdRng> {
    linear_operator: O,
    diagonal: Vec<f64>,
    eps: f64,
    rng: R,
}

/// A Davidson solver over a compiled qubit operator.
pub type QubitDavidson = Davidson<LinearQubitOperatorVariant>;

/// Builds a solver for `linear_operator`, seeding its random source from the OS.
pub fn solve<O: LinearOperator>(
    linear_operator: O,
    diagonal: Vec<f64>,
    eps: f64,
) -> Result<Davidson<O>, DavidsonError> {
    Davidson::new(linear_operator, diagonal, eps)
}

impl<O: LinearOperator> Davidson<O, StdRng> {
    pub fn new(linear_operator: O, diagonal: Vec<f64>, eps: f64) -> Result<Self, DavidsonError> {
        Self::with_rng(linear_operator, diagonal, eps, StdRng::from_os_rng())
    }
}

impl Davidson<LinearQubitOperatorVariant, StdRng> {
    /// Compiles `operator` (serially, or over a worker pool when `options` is given)
    /// together with its diagonal, and wraps both in a solver.
    pub fn from_qubit_operator(
        operator: &QubitOperator,
        n_qubits: Option<usize>,
        eps: f64,
        options: Option<LinearQubitOperatorOptions>,
    ) -> Result<Self, DavidsonError> {
        let linear_operator = generate_linear_qubit_operator(operator, n_qubits, options)?;
        let diagonal =
            get_linear_qubit_operator_diagonal(operator, Some(linear_operator.n_qubits()))?;
        Self::new(linear_operator, diagonal, eps)
    }
}

impl<O: LinearOperator, R: Rng> Davidson<O, R> {
    /// Builds a solver drawing its random directions from `rng`.
    ///
    /// The diagonal must have one entry per operator dimension and `eps` must be
    /// a positive finite number.
    pub fn with_rng(
        linear_operator: O,
        diagonal: Vec<f64>,
        eps: f64,
        rng: R,
    ) -> Result<Self, DavidsonError> {
        if diagonal.len() != linear_operator.dimension() {
            return Err(DavidsonErrorKind::DimensionMismatch {
                expected: linear_operator.dimension(),
                actual: diagonal.len(),
            }
            .into());
        }
        if !(eps.is_finite() && eps > 0.0) {
            return Err(
                DavidsonErrorKind::InputError(format!("eps must be positive, got {eps}")).into(),
            );
        }
        Ok(Self {
            linear_operator,
            diagonal,
            eps,
            rng,
        })
    }

    pub fn linear_operator(&self) -> &O {
        &self.linear_operator
    }

    pub fn diagonal(&self) -> &[f64] {
        &self.diagonal
    }

    pub fn eps(&self) -> f64 {
        self.eps
    }

    /// Orthonormalizes `vectors`, whose first `num_orthonormals` columns are
    /// already orthonormal, with this solver's drop tolerance.
    pub fn orthonormalize(
        &self,
        vectors: MatRef<'_, c64>,
        num_orthonormals: usize,
    ) -> Result<Mat<c64>, DavidsonError> {
        orthonormalize(vectors, num_orthonormals, self.eps)
    }

    /// Appends `count` orthonormal random columns to the orthonormal `vectors`.
    pub fn append_random_vectors(
        &mut self,
        vectors: Mat<c64>,
        count: usize,
    ) -> Result<Mat<c64>, DavidsonError> {
        append_random_vectors(&mut self.rng, vectors, count, self.eps)
    }

    /// Short alias of [`Davidson::get_lowest_n`].
    pub fn lowest(
        &mut self,
        n_lowest: usize,
        initial_guess: Option<MatRef<'_, c64>>,
        max_iterations: usize,
    ) -> Result<DavidsonOutput, DavidsonError> {
        self.get_lowest_n(n_lowest, initial_guess, max_iterations)
    }

    /// Searches for the `n_lowest` smallest eigenvalues and their eigenvectors.
    ///
    /// `initial_guess` holds trial vectors as columns; with `None` the search
    /// starts from random vectors. Input errors are reported before any operator
    /// application. At most `max_iterations` projection steps are performed.
    pub fn get_lowest_n(
        &mut self,
        n_lowest: usize,
        initial_guess: Option<MatRef<'_, c64>>,
        max_iterations: usize,
    ) -> Result<DavidsonOutput, DavidsonError> {
        let dimension = self.diagonal.len();

        // 1. The number of states must be in [1, dimension].
        if n_lowest == 0 || n_lowest > dimension {
            return Err(DavidsonErrorKind::OutOfRange {
                n_lowest,
                dimension,
            }
            .into());
        }
        if max_iterations == 0 {
            return Err(DavidsonErrorKind::InputError(
                "max_iterations must be at least 1".to_string(),
            )
            .into());
        }

        // 2. A supplied guess must match the operator and carry some signal.
        let mut guess_v = match initial_guess {
            Some(guess) => {
                if guess.nrows() != dimension {
                    return Err(DavidsonErrorKind::DimensionMismatch {
                        expected: dimension,
                        actual: guess.nrows(),
                    }
                    .into());
                }
                if max_abs(guess) < self.eps {
                    return Err(DavidsonErrorKind::ZeroGuess.into());
                }
                self.orthonormalize(guess, 0)?
            }
            None => Mat::zeros(dimension, 0),
        };

        // 3. Pad the basis up to n_lowest columns.
        if guess_v.ncols() < n_lowest {
            let missing = n_lowest - guess_v.ncols();
            guess_v = self.append_random_vectors(guess_v, missing)?;
        }
        if guess_v.ncols() < n_lowest {
            return Err(DavidsonErrorKind::InsufficientStartVectors {
                n_lowest,
                found: guess_v.ncols(),
            }
            .into());
        }

        let mut guess_mv = Mat::<c64>::zeros(dimension, 0);
        let mut iterations = 0;
        loop {
            // Images of columns already seen are cached; only new columns are applied.
            let cached = guess_mv.ncols();
            if cached < guess_v.ncols() {
                let images = self
                    .linear_operator
                    .apply(guess_v.as_ref().get(.., cached..guess_v.ncols()))?;
                guess_mv = hstack(guess_mv.as_ref(), images.as_ref());
            }

            let step = rayleigh_ritz(guess_v.as_ref(), guess_mv.as_ref(), n_lowest)?;
            iterations += 1;
            log::debug!(
                "Davidson iteration {}: basis size {}, max residual {:.3e}",
                iterations,
                guess_v.ncols(),
                step.max_residual
            );

            if step.max_residual < self.eps {
                log::info!(
                    "Davidson converged after {} iterations (max residual {:.3e}).",
                    iterations,
                    step.max_residual
                );
                return Ok(DavidsonOutput {
                    converged: true,
                    eigenvalues: step.eigenvalues,
                    eigenvectors: step.eigenvectors,
                    iterations,
                    max_residual: step.max_residual,
                });
            }

            if iterations >= max_iterations {
                log::warn!(
                    "Davidson did not converge within {} iterations (max residual {:.3e}).",
                    max_iterations,
                    step.max_residual
                );
                return Ok(DavidsonOutput {
                    converged: false,
                    eigenvalues: step.eigenvalues,
                    eigenvectors: step.eigenvectors,
                    iterations,
                    max_residual: step.max_residual,
                });
            }

            // Only the appended directions need orthonormalizing; the prefix with
            // cached images is already orthonormal.
            let directions = new_directions(&step, &self.diagonal, self.eps);
            let count_mvs = guess_mv.ncols();
            guess_v = self.orthonormalize(
                hstack(guess_v.as_ref(), directions.as_ref()).as_ref(),
                count_mvs,
            )?;

            let mut num_trial = 0;
            while guess_v.ncols() <= count_mvs && num_trial < MAX_RANDOM_ROUNDS {
                log::trace!("No new directions found; injecting {n_lowest} random vectors.");
                let random = generate_random_vectors(&mut self.rng, dimension, n_lowest);
                guess_v = self.orthonormalize(
                    hstack(guess_v.as_ref(), random.as_ref()).as_ref(),
                    count_mvs,
                )?;
                num_trial += 1;
            }
        }
    }
}
