//! Building blocks of the block Davidson iteration.
//!
//! ** NOTE: We recommend using the high-level [`crate::solvers::Davidson`] instead. This
//! module is intended for use cases where fine-grained control over the iteration is required.
//!
//! The pieces here are stateless functions over dense `faer` matrices:
//!
//! - [`orthonormalize`]: modified Gram-Schmidt over the trailing columns of a basis.
//! - [`generate_random_vectors`] / [`append_random_vectors`]: random search directions.
//! - [`rayleigh_ritz`]: projects the operator onto the basis `V` (given its cached
//!   images `MV`), diagonalizes the projected problem, and returns the lowest Ritz
//!   pairs with their residuals.
//! - [`new_directions`]: diagonally preconditioned correction vectors for the
//!   unconverged Ritz pairs.

use crate::error::{DavidsonError, DavidsonErrorKind};
use faer::{Col, Mat, MatRef, Scale, Side, c64};
use rand::Rng;

/// Orthonormalizes the columns `[num_orthonormals, ncols)` of `vectors` against
/// the (already orthonormal) leading columns and against each other.
///
/// Columns are processed in increasing order; each is stripped of its projection
/// onto every column finalized so far, then normalized. A column whose remaining
/// norm is below `eps` brings no new direction and is dropped. The returned matrix
/// holds exactly the finalized columns, in order.
pub fn orthonormalize(
    vectors: MatRef<'_, c64>,
    num_orthonormals: usize,
    eps: f64,
) -> Result<Mat<c64>, DavidsonError> {
    let (rows, total) = (vectors.nrows(), vectors.ncols());
    if total == 0 {
        return Err(DavidsonErrorKind::EmptyVectors.into());
    }

    let num_orthonormals = num_orthonormals.min(total);
    let mut ortho_normals = Mat::<c64>::zeros(rows, total);
    ortho_normals
        .get_mut(.., 0..num_orthonormals)
        .copy_from(vectors.get(.., 0..num_orthonormals));

    let mut count = num_orthonormals;
    for i in num_orthonormals..total {
        let mut column = vectors.col(i).to_owned();

        // Modified Gram-Schmidt: project against the updated vector each time.
        for j in 0..count {
            let basis = ortho_normals.col(j);
            let overlap = basis.adjoint() * &column;
            column -= basis * Scale(overlap);
        }

        let norm = column.norm_l2();
        if norm < eps {
            continue;
        }
        ortho_normals
            .col_mut(count)
            .copy_from(&column * Scale(c64::new(norm.recip(), 0.0)));
        count += 1;
    }

    if count == total {
        return Ok(ortho_normals);
    }
    Ok(ortho_normals.as_ref().get(.., 0..count).to_owned())
}

/// Draws a `rows x cols` matrix whose real and imaginary parts are independent
/// uniform samples from `[0, 1)`. The columns are not orthonormalized.
pub fn generate_random_vectors<R: Rng>(rng: &mut R, rows: usize, cols: usize) -> Mat<c64> {
    Mat::from_fn(rows, cols, |_, _| {
        let re: f64 = rng.random();
        let im: f64 = rng.random();
        c64::new(re, im)
    })
}

/// Appends `count` orthonormal random columns to the orthonormal `vectors`.
///
/// Fails if the result would have more columns than rows. Gives up (returning
/// fewer columns) after more than 3 consecutive draws that add no new direction.
pub fn append_random_vectors<R: Rng>(
    rng: &mut R,
    vectors: Mat<c64>,
    count: usize,
    eps: f64,
) -> Result<Mat<c64>, DavidsonError> {
    let rows = vectors.nrows();
    let mut vector_columns = vectors.ncols();
    let total_columns = vector_columns + count;
    if total_columns > rows {
        return Err(DavidsonErrorKind::TooManyRandomVectors {
            requested: total_columns,
            dimension: rows,
        }
        .into());
    }

    let mut vectors = vectors;
    let mut num_trial = 0;
    while vector_columns < total_columns {
        num_trial += 1;

        let random = generate_random_vectors(rng, rows, total_columns - vector_columns);
        vectors = orthonormalize(
            hstack(vectors.as_ref(), random.as_ref()).as_ref(),
            vector_columns,
            eps,
        )?;

        if vectors.ncols() == vector_columns {
            if num_trial > 3 {
                log::warn!("Unable to generate new random directions after {num_trial} attempts.");
                break;
            }
        } else {
            num_trial = 1;
            vector_columns = vectors.ncols();
        }
    }
    Ok(vectors)
}

/// Concatenates the columns of `left` and `right`.
pub(crate) fn hstack(left: MatRef<'_, c64>, right: MatRef<'_, c64>) -> Mat<c64> {
    debug_assert_eq!(left.nrows(), right.nrows());
    let (split, total) = (left.ncols(), left.ncols() + right.ncols());
    let mut stacked = Mat::<c64>::zeros(left.nrows(), total);
    stacked.get_mut(.., 0..split).copy_from(left);
    stacked.get_mut(.., split..total).copy_from(right);
    stacked
}

/// Largest modulus among the entries of `m` (0 for an empty matrix).
///
/// `MatRef::norm_max` is not used: for complex entries it bounds the real and
/// imaginary parts separately rather than the modulus.
pub fn max_abs(m: MatRef<'_, c64>) -> f64 {
    m.col_iter()
        .flat_map(|column| column.iter())
        .fold(0.0f64, |max, value| max.max(value.norm()))
}

/// The lowest Ritz pairs of one projection step.
#[derive(Debug, Clone)]
pub struct RitzStep {
    /// Ritz values, ascending.
    pub eigenvalues: Vec<f64>,
    /// Ritz vectors in the full space, `V * y_i`, one per column.
    pub eigenvectors: Mat<c64>,
    /// Residuals `MV * y_i - lambda_i * V * y_i`, one per column.
    pub residuals: Mat<c64>,
    /// Largest absolute residual entry over all returned pairs.
    pub max_residual: f64,
}

/// Performs the Rayleigh-Ritz projection of the operator onto the basis `v`.
///
/// `mv` must hold the operator's image of every column of `v`. The projected
/// matrix `V^H MV` is Hermitized before its eigendecomposition; at most
/// `n_lowest` pairs are kept.
pub fn rayleigh_ritz(
    v: MatRef<'_, c64>,
    mv: MatRef<'_, c64>,
    n_lowest: usize,
) -> Result<RitzStep, DavidsonError> {
    if mv.ncols() != v.ncols() {
        return Err(DavidsonErrorKind::DimensionMismatch {
            expected: v.ncols(),
            actual: mv.ncols(),
        }
        .into());
    }

    let projected = v.adjoint() * mv;
    let hermitian = (&projected + projected.adjoint()) * Scale(c64::new(0.5, 0.0));

    let evd = hermitian
        .as_ref()
        .self_adjoint_eigen(Side::Lower)
        .map_err(DavidsonErrorKind::EvdError)?;
    let u = evd.U();

    // Ritz values as Rayleigh quotients of the (unit) eigenvectors.
    let hu = hermitian.as_ref() * u;
    let values: Vec<f64> = u
        .col_iter()
        .zip(hu.col_iter())
        .map(|(y, hy)| (y.adjoint() * hy).re)
        .collect();

    let mut order: Vec<usize> = (0..values.len()).collect();
    order.sort_by(|&a, &b| values[a].total_cmp(&values[b]));
    order.truncate(n_lowest);

    let eigenvalues: Vec<f64> = order.iter().map(|&col| values[col]).collect();
    let mut transformation = Mat::<c64>::zeros(u.nrows(), order.len());
    for (j, &col) in order.iter().enumerate() {
        transformation.col_mut(j).copy_from(u.col(col));
    }

    let eigenvectors = v * transformation.as_ref();
    let images = mv * transformation.as_ref();
    let lambdas = Col::from_fn(eigenvalues.len(), |j| c64::new(eigenvalues[j], 0.0));
    let residuals = &images - &eigenvectors * lambdas.as_diagonal();
    let max_residual = max_abs(residuals.as_ref());

    Ok(RitzStep {
        eigenvalues,
        eigenvectors,
        residuals,
        max_residual,
    })
}

/// Builds correction vectors for every Ritz pair whose residual is not yet below `eps`.
///
/// With `d_j = 1 / (diagonal[j] - lambda_i)` (the denominator floored at `eps`
/// in magnitude), the direction for pair `i` with Ritz vector `t` and residual `r` is
/// `-r + t * <t, d∘r> / <t, d∘t>`. Returns one column per unconverged pair.
pub fn new_directions(step: &RitzStep, diagonal: &[f64], eps: f64) -> Mat<c64> {
    let unconverged: Vec<usize> = (0..step.eigenvalues.len())
        .filter(|&i| max_abs(step.residuals.as_ref().get(.., i..i + 1)) >= eps)
        .collect();

    let mut directions = Mat::<c64>::zeros(step.residuals.nrows(), unconverged.len());
    for (slot, &i) in unconverged.iter().enumerate() {
        let lambda = step.eigenvalues[i];
        let (trial_v, residual) = (step.eigenvectors.col(i), step.residuals.col(i));

        let preconditioner = Col::from_fn(diagonal.len(), |j| {
            let diff = diagonal[j] - lambda;
            c64::new(if diff.abs() > eps { diff.recip() } else { eps.recip() }, 0.0)
        });
        let d = preconditioner.as_diagonal();

        let numerator = trial_v.adjoint() * (d * residual);
        let denominator = trial_v.adjoint() * (d * trial_v);
        let shift = if denominator.norm() > 0.0 {
            numerator / denominator
        } else {
            c64::new(0.0, 0.0)
        };

        directions
            .col_mut(slot)
            .copy_from(trial_v * Scale(shift) - residual);
    }
    directions
}
