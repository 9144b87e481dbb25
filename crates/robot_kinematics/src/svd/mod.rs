//! Singular value decompositions sized for Jacobians.
//!
//! Every kernel owns its output buffers and is sized once for a matrix
//! shape; decomposing a matrix of another shape is an error, never a silent
//! reallocation.
//!
//! - [`SvdHouseholder`]: bidiagonalization followed by implicit QR sweeps
//! - [`SvdGivens`]: Householder QR followed by one-sided Jacobi rotations
//!   on the small triangular factor
//! - [`SvdJacobi`]: warm-started one-sided Jacobi sweep that reuses the
//!   previous `U` or `V`; its singular values are not sorted, so it has
//!   its own interface instead of [`SvdKernel`]

mod givens;
mod householder;
mod jacobi;

pub use givens::SvdGivens;
pub use householder::SvdHouseholder;
pub use jacobi::SvdJacobi;

use nalgebra::{DMatrix, DVector};

/// Errors from a decomposition
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SvdError {
    #[error("SVD did not converge within {max_iterations} iterations")]
    NoConvergence { max_iterations: usize },

    #[error("SVD numerical breakdown: {message}")]
    Breakdown { message: &'static str },

    #[error("SVD sized for {expected_rows}x{expected_cols}, got {rows}x{cols}")]
    ShapeMismatch {
        expected_rows: usize,
        expected_cols: usize,
        rows: usize,
        cols: usize,
    },
}

/// A thin SVD `A = U diag(S) Vᵀ` of an `m x n` matrix
///
/// After a successful [`SvdKernel::decompose`], `U` is `m x n`, `S` holds
/// `n` values sorted in descending order and `V` is `n x n`. When `n > m`
/// the trailing `n - m` singular values are zero.
pub trait SvdKernel {
    /// A kernel with buffers for `rows x cols` matrices
    fn with_size(rows: usize, cols: usize) -> Self
    where
        Self: Sized;

    /// Reallocate the buffers for a new shape
    fn resize(&mut self, rows: usize, cols: usize);

    /// Decompose `a`, iterating at most `max_iterations` times
    fn decompose(&mut self, a: &DMatrix<f64>, max_iterations: usize) -> Result<(), SvdError>;

    fn u(&self) -> &DMatrix<f64>;

    fn singular_values(&self) -> &DVector<f64>;

    fn v(&self) -> &DMatrix<f64>;
}

pub(crate) fn check_shape(
    a: &DMatrix<f64>,
    expected_rows: usize,
    expected_cols: usize,
) -> Result<(), SvdError> {
    if a.nrows() == expected_rows && a.ncols() == expected_cols {
        Ok(())
    } else {
        Err(SvdError::ShapeMismatch {
            expected_rows,
            expected_cols,
            rows: a.nrows(),
            cols: a.ncols(),
        })
    }
}

/// Sort `s` in descending order, permuting the columns of `u` and `v` along
pub(crate) fn sort_descending(s: &mut DVector<f64>, u: &mut DMatrix<f64>, v: &mut DMatrix<f64>) {
    let n = s.len();
    for i in 0..n {
        let mut i_max = i;
        for j in i + 1..n {
            if s[j] > s[i_max] {
                i_max = j;
            }
        }
        if i_max != i {
            s.swap_rows(i, i_max);
            u.swap_columns(i, i_max);
            v.swap_columns(i, i_max);
        }
    }
}
