//! This module defines the core abstraction for linear operators.
//!
//! The Davidson solver never needs the individual entries of the operator it
//! diagonalizes, apart from the diagonal which is supplied separately. Its only
//! interaction with the operator is the matrix-vector product, so the solver is
//! written against the [`LinearOperator`] trait and can run unchanged on a small
//! dense test matrix or on a matrix-free Pauli-sum operator of dimension `2^q`.
//!
//! Unlike a plain matrix product, applying an operator is fallible: a vector of
//! the wrong length is reported as a [`DavidsonErrorKind::DimensionMismatch`]
//! instead of a panic, and parallel operators may fail in a worker.

use crate::error::{DavidsonError, DavidsonErrorKind};
use faer::{ColRef, Mat, MatMut, MatRef, c64, prelude::Reborrow};

/// A square linear operator acting on complex vectors.
///
/// Implementors provide the single-vector product [`LinearOperator::matvec`];
/// the block product [`LinearOperator::apply`] defaults to applying it column
/// by column.
pub trait LinearOperator {
    /// Returns the dimension `n` of the operator, which maps length-`n` vectors
    /// to length-`n` vectors.
    fn dimension(&self) -> usize;

    /// Applies the operator to a single vector `x`.
    fn matvec(&self, x: &[c64]) -> Result<Vec<c64>, DavidsonError>;

    /// Applies the operator to every column of `rhs`, returning `A * rhs`.
    fn apply(&self, rhs: MatRef<'_, c64>) -> Result<Mat<c64>, DavidsonError> {
        check_rows(self.dimension(), rhs)?;

        let mut out = Mat::<c64>::zeros(rhs.nrows(), rhs.ncols());
        for (j, column) in rhs.col_iter().enumerate() {
            let x: Vec<c64> = column.iter().copied().collect();
            let image = self.matvec(&x)?;
            out.col_mut(j).copy_from(ColRef::from_slice(&image));
        }
        Ok(out)
    }
}

/// Fails with a dimension error unless `rhs` has exactly `dimension` rows.
pub(crate) fn check_rows(dimension: usize, rhs: MatRef<'_, c64>) -> Result<(), DavidsonError> {
    if rhs.nrows() != dimension {
        return Err(DavidsonErrorKind::DimensionMismatch {
            expected: dimension,
            actual: rhs.nrows(),
        }
        .into());
    }
    Ok(())
}

/// Fails with a dimension error unless `x` has exactly `dimension` entries.
pub(crate) fn check_len(dimension: usize, x: &[c64]) -> Result<(), DavidsonError> {
    if x.len() != dimension {
        return Err(DavidsonErrorKind::DimensionMismatch {
            expected: dimension,
            actual: x.len(),
        }
        .into());
    }
    Ok(())
}

/// Dense square matrices are operators too; they are the reference against which
/// the matrix-free operators are tested.
impl<'a> LinearOperator for MatRef<'a, c64> {
    #[inline]
    fn dimension(&self) -> usize {
        self.nrows()
    }

    fn matvec(&self, x: &[c64]) -> Result<Vec<c64>, DavidsonError> {
        check_len(self.ncols(), x)?;
        let image = *self * ColRef::from_slice(x);
        Ok(image.as_ref().iter().copied().collect())
    }

    #[inline]
    fn apply(&self, rhs: MatRef<'_, c64>) -> Result<Mat<c64>, DavidsonError> {
        check_rows(self.ncols(), rhs)?;
        // Defer to faer's optimized matrix multiplication routine.
        Ok(*self * rhs)
    }
}

impl<'a> LinearOperator for MatMut<'a, c64> {
    #[inline]
    fn dimension(&self) -> usize {
        self.rb().nrows()
    }

    #[inline]
    fn matvec(&self, x: &[c64]) -> Result<Vec<c64>, DavidsonError> {
        // Reborrow as an immutable view and reuse the `MatRef` implementation.
        self.rb().matvec(x)
    }

    #[inline]
    fn apply(&self, rhs: MatRef<'_, c64>) -> Result<Mat<c64>, DavidsonError> {
        self.rb().apply(rhs)
    }
}

impl LinearOperator for Mat<c64> {
    #[inline]
    fn dimension(&self) -> usize {
        self.nrows()
    }

    #[inline]
    fn matvec(&self, x: &[c64]) -> Result<Vec<c64>, DavidsonError> {
        self.as_ref().matvec(x)
    }

    #[inline]
    fn apply(&self, rhs: MatRef<'_, c64>) -> Result<Mat<c64>, DavidsonError> {
        self.as_ref().apply(rhs)
    }
}

impl<O: LinearOperator + ?Sized> LinearOperator for &O {
    #[inline]
    fn dimension(&self) -> usize {
        (**self).dimension()
    }

    #[inline]
    fn matvec(&self, x: &[c64]) -> Result<Vec<c64>, DavidsonError> {
        (**self).matvec(x)
    }

    #[inline]
    fn apply(&self, rhs: MatRef<'_, c64>) -> Result<Mat<c64>, DavidsonError> {
        (**self).apply(rhs)
    }
}
