//! Integration test suite for the matrix-free operators and the Davidson solver.
//!
//! # Test Methodology
//!
//! Every operator used here is small enough (at most 5 qubits) to also be built
//! as an explicit dense matrix by tensoring the 2x2 Pauli matrices
//!
//!     X = [[0, 1], [1, 0]],  Y = [[0, -i], [i, 0]],  Z = [[1, 0], [0, -1]]
//!
//! with qubit 0 as the leftmost (most significant) factor. The dense matrix is the
//! ground truth for:
//! 1.  **Operator equivalence:** the matrix-free operator (serial and parallel)
//!     must reproduce every column of the dense matrix.
//! 2.  **Diagonal consistency:** the diagonal provider must agree with the dense
//!     diagonal.
//! 3.  **Eigenpairs:** converged Davidson eigenpairs must satisfy
//!     `||H v - lambda v||_inf < eps` and match the dense spectrum.

use anyhow::{Result, anyhow, ensure};
use faer::{Mat, MatRef, Side, c64};
use qubit_davidson::{
    Davidson, DavidsonErrorKind, LinearOperator, LinearQubitOperator, LinearQubitOperatorOptions,
    ParallelLinearQubitOperator, Pauli, PauliString, QubitDavidson, QubitOperator,
    get_linear_qubit_operator_diagonal, utils::data_loader::load_qubit_operator,
};
use rand::{Rng, SeedableRng, rngs::StdRng};

/// Tolerance for comparing matrix-free and dense products.
const APPLY_TOLERANCE: f64 = 1e-12;

/// Residual tolerance handed to the solver.
const EPS: f64 = 1e-8;

fn c(re: f64, im: f64) -> c64 {
    c64::new(re, im)
}

fn pauli_matrix(pauli: Option<Pauli>, row: usize, col: usize) -> c64 {
    match (pauli, row, col) {
        (None, r, k) => c(if r == k { 1.0 } else { 0.0 }, 0.0),
        (Some(Pauli::X), r, k) => c(if r != k { 1.0 } else { 0.0 }, 0.0),
        (Some(Pauli::Y), 0, 1) => c(0.0, -1.0),
        (Some(Pauli::Y), 1, 0) => c(0.0, 1.0),
        (Some(Pauli::Y), _, _) => c(0.0, 0.0),
        (Some(Pauli::Z), 0, 0) => c(1.0, 0.0),
        (Some(Pauli::Z), 1, 1) => c(-1.0, 0.0),
        (Some(Pauli::Z), _, _) => c(0.0, 0.0),
    }
}

/// Builds the dense `2^q x 2^q` matrix of `operator` from Kronecker products.
fn dense_matrix(operator: &QubitOperator, n_qubits: usize) -> Mat<c64> {
    let dim = 1usize << n_qubits;
    let mut dense = Mat::<c64>::zeros(dim, dim);
    for (term, &coefficient) in operator.terms() {
        let mut per_qubit = vec![None; n_qubits];
        for &(index, pauli) in term.factors() {
            per_qubit[index] = Some(pauli);
        }
        for row in 0..dim {
            for col in 0..dim {
                let value = per_qubit.iter().enumerate().fold(
                    coefficient,
                    |acc, (qubit, &pauli)| {
                        let shift = n_qubits - 1 - qubit;
                        acc * pauli_matrix(pauli, (row >> shift) & 1, (col >> shift) & 1)
                    },
                );
                dense[(row, col)] += value;
            }
        }
    }
    dense
}

fn parse_operator(terms: &[(&str, c64)]) -> QubitOperator {
    terms
        .iter()
        .map(|(s, coefficient)| (s.parse::<PauliString>().unwrap(), *coefficient))
        .collect()
}

/// A Hermitian operator with complex coefficients and every Pauli label.
fn mixed_operator() -> QubitOperator {
    parse_operator(&[
        ("", c(0.3, 0.0)),
        ("X0", c(0.7, 0.0)),
        ("Y1", c(-0.4, 0.0)),
        ("Z2", c(1.1, 0.0)),
        ("X0 Y1 Z2", c(0.25, 0.0)),
        ("Z0 Z1", c(-1.0, 0.0)),
        ("Y0 Y2", c(0.5, 0.0)),
        ("X1 X2", c(0.2, 0.0)),
    ])
}

/// Transverse-field Ising chain with open boundaries.
fn ising_chain(n_qubits: usize, coupling: f64, field: f64) -> QubitOperator {
    let mut operator = QubitOperator::new();
    for i in 0..n_qubits - 1 {
        operator.add_term(
            PauliString::new([(i, Pauli::Z), (i + 1, Pauli::Z)]).unwrap(),
            c(-coupling, 0.0),
        );
    }
    for i in 0..n_qubits {
        operator.add_term(PauliString::new([(i, Pauli::X)]).unwrap(), c(-field, 0.0));
    }
    operator
}

fn basis_vector(dim: usize, index: usize) -> Vec<c64> {
    (0..dim)
        .map(|i| c(if i == index { 1.0 } else { 0.0 }, 0.0))
        .collect()
}

/// Exact eigenvalues of a dense Hermitian matrix, ascending.
fn dense_eigenvalues(dense: MatRef<'_, c64>) -> Result<Vec<f64>> {
    let evd = dense
        .self_adjoint_eigen(Side::Lower)
        .map_err(|e| anyhow!("EVD failed: {:?}", e))?;
    let u = evd.U();
    let hu = dense * u;
    let mut values: Vec<f64> = (0..dense.ncols())
        .map(|col| {
            (0..dense.nrows())
                .fold(c(0.0, 0.0), |acc, r| acc + u[(r, col)].conj() * hu[(r, col)])
                .re
        })
        .collect();
    values.sort_by(f64::total_cmp);
    Ok(values)
}

fn max_residual(dense: &Mat<c64>, vectors: MatRef<'_, c64>, values: &[f64]) -> f64 {
    let images = dense.as_ref() * vectors;
    let mut max = 0.0f64;
    for (j, &value) in values.iter().enumerate() {
        for i in 0..vectors.nrows() {
            max = max.max((images[(i, j)] - vectors[(i, j)] * value).norm());
        }
    }
    max
}

#[test]
fn matrix_free_matches_dense_on_basis_vectors() -> Result<()> {
    let operator = mixed_operator();
    let linear = LinearQubitOperator::new(&operator, Some(3))?;
    let dense = dense_matrix(&operator, 3);

    for index in 0..8 {
        let column = linear.matvec(&basis_vector(8, index))?;
        for (row, value) in column.iter().enumerate() {
            ensure!(
                (value - dense[(row, index)]).norm() < APPLY_TOLERANCE,
                "entry ({row}, {index}) differs: {value} vs {}",
                dense[(row, index)]
            );
        }
    }
    Ok(())
}

#[test]
fn matrix_free_block_apply_matches_dense() -> Result<()> {
    let operator = mixed_operator();
    let linear = LinearQubitOperator::new(&operator, Some(4))?;
    let dense = dense_matrix(&operator, 4);

    let mut rng = StdRng::seed_from_u64(42);
    let block = Mat::from_fn(16, 3, |_, _| c(rng.random::<f64>() - 0.5, rng.random::<f64>()));
    let actual = linear.apply(block.as_ref())?;
    let expected = &dense * &block;

    ensure!((&actual - &expected).norm_l2() < APPLY_TOLERANCE);
    Ok(())
}

#[test]
fn parallel_matches_serial_for_every_worker_count() -> Result<()> {
    let operator = ising_chain(5, 1.0, 0.7);
    let serial = LinearQubitOperator::new(&operator, None)?;

    let mut rng = StdRng::seed_from_u64(7);
    let x: Vec<c64> = (0..32)
        .map(|_| c(rng.random::<f64>(), rng.random::<f64>()))
        .collect();
    let expected = serial.matvec(&x)?;

    for processes in 1..=4 {
        let options = LinearQubitOperatorOptions::new(processes)?;
        let parallel = ParallelLinearQubitOperator::new(&operator, None, options)?;
        let actual = parallel.matvec(&x)?;
        for (e, a) in expected.iter().zip(&actual) {
            ensure!(
                (e - a).norm() < APPLY_TOLERANCE,
                "mismatch with {processes} processes"
            );
        }
    }
    Ok(())
}

#[test]
fn diagonal_matches_dense_diagonal() -> Result<()> {
    let operator = mixed_operator();
    let diagonal = get_linear_qubit_operator_diagonal(&operator, Some(3))?;
    let dense = dense_matrix(&operator, 3);
    for (i, &value) in diagonal.iter().enumerate() {
        ensure!((c(value, 0.0) - dense[(i, i)]).norm() < APPLY_TOLERANCE);
    }
    Ok(())
}

#[test]
fn single_z_converges_to_lower_half() -> Result<()> {
    let operator = parse_operator(&[("Z0", c(1.0, 0.0))]);
    let linear = LinearQubitOperator::new(&operator, Some(2))?;
    let diagonal = get_linear_qubit_operator_diagonal(&operator, Some(2))?;
    assert_eq!(diagonal, vec![1.0, 1.0, -1.0, -1.0]);

    let mut solver = Davidson::with_rng(linear, diagonal, 1e-6, StdRng::seed_from_u64(5))?;
    let mut rng = StdRng::seed_from_u64(99);
    let guess = Mat::from_fn(4, 1, |_, _| c(rng.random::<f64>(), rng.random::<f64>()));

    let output = solver.get_lowest_n(1, Some(guess.as_ref()), 50)?;
    ensure!(output.converged);
    ensure!((output.eigenvalues[0] + 1.0).abs() < 1e-6);
    ensure!(output.eigenvectors[(0, 0)].norm() < 1e-6);
    ensure!(output.eigenvectors[(1, 0)].norm() < 1e-6);
    let weight = output.eigenvectors[(2, 0)].norm_sqr() + output.eigenvectors[(3, 0)].norm_sqr();
    ensure!((weight - 1.0).abs() < 1e-6);
    Ok(())
}

#[test]
fn too_many_states_is_a_range_error() -> Result<()> {
    let operator = parse_operator(&[("Z0", c(1.0, 0.0))]);
    let mut solver = QubitDavidson::from_qubit_operator(&operator, Some(2), 1e-6, None)?;
    let guess = Mat::from_fn(4, 1, |_, _| c(1.0, 0.0));

    let err = solver
        .get_lowest_n(5, Some(guess.as_ref()), 10)
        .err()
        .ok_or_else(|| anyhow!("expected a range error"))?;
    ensure!(matches!(
        err.kind(),
        DavidsonErrorKind::OutOfRange {
            n_lowest: 5,
            dimension: 4
        }
    ));
    Ok(())
}

#[test]
fn zero_guess_is_rejected() -> Result<()> {
    let operator = parse_operator(&[("Z0", c(1.0, 0.0))]);
    let mut solver = QubitDavidson::from_qubit_operator(&operator, Some(2), 1e-6, None)?;
    let guess = Mat::<c64>::zeros(4, 1);

    let err = solver
        .get_lowest_n(1, Some(guess.as_ref()), 10)
        .err()
        .ok_or_else(|| anyhow!("expected a degenerate-input error"))?;
    ensure!(matches!(err.kind(), DavidsonErrorKind::ZeroGuess));
    Ok(())
}

#[test]
fn ising_lowest_states_match_dense_spectrum() -> Result<()> {
    let n_qubits = 5;
    let operator = ising_chain(n_qubits, 1.0, 0.6);
    let dense = dense_matrix(&operator, n_qubits);
    let exact = dense_eigenvalues(dense.as_ref())?;

    let linear = LinearQubitOperator::new(&operator, None)?;
    let diagonal = get_linear_qubit_operator_diagonal(&operator, None)?;
    let mut solver = Davidson::with_rng(linear, diagonal, EPS, StdRng::seed_from_u64(2024))?;

    let output = solver.get_lowest_n(3, None, 300)?;
    ensure!(output.converged, "max residual {}", output.max_residual);
    for (value, expected) in output.eigenvalues.iter().zip(&exact) {
        ensure!(
            (value - expected).abs() < 1e-6,
            "eigenvalue {value} vs exact {expected}"
        );
    }

    let residual = max_residual(&dense, output.eigenvectors.as_ref(), &output.eigenvalues);
    ensure!(residual < EPS, "residual {residual}");

    // The returned eigenvectors are orthonormal.
    let gram = output.eigenvectors.as_ref().adjoint() * output.eigenvectors.as_ref();
    let identity = Mat::<c64>::identity(3, 3);
    ensure!((&gram - &identity).norm_l2() < 1e-6);
    Ok(())
}

#[test]
fn parallel_solver_agrees_with_serial_solver() -> Result<()> {
    let operator = mixed_operator();

    let mut serial = QubitDavidson::from_qubit_operator(&operator, Some(3), EPS, None)?;
    let options = LinearQubitOperatorOptions::new(3)?;
    let mut parallel = QubitDavidson::from_qubit_operator(&operator, Some(3), EPS, Some(options))?;

    let serial_output = serial.get_lowest_n(2, None, 200)?;
    let parallel_output = parallel.get_lowest_n(2, None, 200)?;
    ensure!(serial_output.converged && parallel_output.converged);
    for (s, p) in serial_output
        .eigenvalues
        .iter()
        .zip(&parallel_output.eigenvalues)
    {
        ensure!((s - p).abs() < 1e-6, "serial {s} vs parallel {p}");
    }
    Ok(())
}

#[test]
fn residual_shrinks_with_more_iterations() -> Result<()> {
    let operator = ising_chain(5, 1.0, 1.0);
    let run = |max_iterations: usize| -> Result<f64> {
        let linear = LinearQubitOperator::new(&operator, None)?;
        let diagonal = get_linear_qubit_operator_diagonal(&operator, None)?;
        let mut solver = Davidson::with_rng(linear, diagonal, 1e-10, StdRng::seed_from_u64(8))?;
        Ok(solver.get_lowest_n(1, None, max_iterations)?.max_residual)
    };

    let first = run(1)?;
    let later = run(30)?;
    ensure!(later < first, "residual grew from {first} to {later}");
    Ok(())
}

#[test]
fn operator_file_round_trip_through_solver() -> Result<()> {
    let path = concat!(env!("CARGO_MANIFEST_DIR"), "/data/tfim_4.txt");
    let operator = load_qubit_operator(path)?;
    ensure!(operator.count_qubits() == 4);

    let dense = dense_matrix(&operator, 4);
    let exact = dense_eigenvalues(dense.as_ref())?;

    let mut solver = QubitDavidson::from_qubit_operator(&operator, None, EPS, None)?;
    let output = solver.get_lowest_n(1, None, 200)?;
    ensure!(output.converged);
    ensure!((output.eigenvalues[0] - exact[0]).abs() < 1e-6);
    Ok(())
}
