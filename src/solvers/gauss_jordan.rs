//! Gauss-Jordan elimination with full pivoting.

use smallvec::SmallVec;
use tracing::{debug, instrument};

use crate::{
    error::{LinAlgError, Result},
    solvers::{check_square, check_values, LinearSolver},
    tensors::matrix::Matrix,
};

/// Solve `coefficients * X = values` and compute the inverse of `coefficients`.
/// Returns `(X, inverse)`.
///
/// The pivot is the entry of largest magnitude in the whole sub-block of rows
/// and columns that have not been pivoted yet. This is slower than the partial
/// pivoting of [LuDecomposition](super::LuDecomposition) but slightly more stable.
pub fn solve(coefficients: &Matrix, values: &Matrix) -> Result<(Matrix, Matrix)> {
    let mut a = coefficients.clone();
    let mut b = values.clone();
    solve_in_place(&mut a, &mut b)?;
    Ok((b, a))
}

/// Compute the inverse of a square matrix.
pub fn invert(coefficients: &Matrix) -> Result<Matrix> {
    let mut a = coefficients.clone();
    let mut b = Matrix::new(a.nrows(), 0);
    solve_in_place(&mut a, &mut b)?;
    Ok(a)
}

/// Solve `coefficients * X = values` in-place: afterwards `coefficients` holds its
/// inverse and `values` holds `X`.
/// On error both matrices are left in an unspecified state.
#[instrument(level = "debug", skip_all, fields(n = coefficients.nrows()))]
pub fn solve_in_place(coefficients: &mut Matrix, values: &mut Matrix) -> Result<()> {
    check_square(coefficients)?;
    check_values(coefficients.nrows(), values)?;

    let a = coefficients;
    let b = values;
    let n = a.nrows();
    let m = b.ncols();

    let mut pivoted: SmallVec<[bool; 16]> = SmallVec::from_elem(false, n);
    let mut pivot_rows: SmallVec<[usize; 16]> = SmallVec::from_elem(0, n);
    let mut pivot_cols: SmallVec<[usize; 16]> = SmallVec::from_elem(0, n);

    for i in 0..n {
        // full pivoting: search all rows and columns that have not been used yet
        let mut big = 0.;
        let mut pivot = None;
        for j in (0..n).filter(|&j| !pivoted[j]) {
            for k in (0..n).filter(|&k| !pivoted[k]) {
                let x = a[(j, k)].abs();
                if x >= big {
                    big = x;
                    pivot = Some((j, k));
                }
            }
        }

        let Some((irow, icol)) = pivot else {
            return Err(LinAlgError::SingularMatrix);
        };
        pivoted[icol] = true;

        // the column swap is deferred: the pivot moves to the diagonal by a row swap
        // and the columns of the inverse are permuted back at the end
        if irow != icol {
            a.swap_rows_unchecked(irow, icol);
            b.swap_rows_unchecked(irow, icol);
        }
        pivot_rows[i] = irow;
        pivot_cols[i] = icol;

        if a[(icol, icol)] == 0. {
            debug!("Zero pivot in step {}", i);
            return Err(LinAlgError::SingularMatrix);
        }

        let inv_pivot = 1. / a[(icol, icol)];
        a[(icol, icol)] = 1.;
        for x in &mut a[icol] {
            *x *= inv_pivot;
        }
        for x in &mut b[icol] {
            *x *= inv_pivot;
        }

        for row in (0..n).filter(|&r| r != icol) {
            let factor = a[(row, icol)];
            if factor == 0. {
                continue;
            }

            a[(row, icol)] = 0.;
            for l in 0..n {
                let p = a[(icol, l)];
                a[(row, l)] -= p * factor;
            }
            for l in 0..m {
                let p = b[(icol, l)];
                b[(row, l)] -= p * factor;
            }
        }
    }

    for l in (0..n).rev() {
        if pivot_rows[l] != pivot_cols[l] {
            a.swap_columns_unchecked(pivot_rows[l], pivot_cols[l]);
        }
    }

    Ok(())
}

/// A Gauss-Jordan solver for a fixed coefficient matrix.
///
/// Every call to [solve](LinearSolver::solve) performs a full elimination, so
/// prefer [LuDecomposition](super::LuDecomposition) for many right-hand sides.
/// The inverse is computed by the first elimination and cached.
#[derive(Clone, Debug, Default)]
pub struct GaussJordan {
    coefficients: Option<Matrix>,
    inverse: Option<Matrix>,
}

impl GaussJordan {
    /// Create a solver without a coefficient matrix.
    pub fn new() -> GaussJordan {
        GaussJordan::default()
    }

    /// Create a solver for the square matrix `coefficients`.
    pub fn with_matrix(coefficients: &Matrix) -> Result<GaussJordan> {
        let mut s = GaussJordan::new();
        s.initialize(coefficients)?;
        Ok(s)
    }

    /// Replace the coefficient matrix, discarding the cached inverse.
    pub fn initialize(&mut self, coefficients: &Matrix) -> Result<()> {
        check_square(coefficients)?;
        self.coefficients = Some(coefficients.clone());
        self.inverse = None;
        Ok(())
    }

    fn coefficients(&self) -> Result<&Matrix> {
        self.coefficients
            .as_ref()
            .ok_or(LinAlgError::OperationInvalid("no coefficient matrix was supplied"))
    }
}

impl LinearSolver for GaussJordan {
    /// Solve `A * X = values`, overwriting `values` with `X`.
    /// On error `values` is left untouched.
    fn solve_in_place(&mut self, values: &mut Matrix) -> Result<()> {
        let mut a = self.coefficients()?.clone();
        let mut x = values.clone();
        solve_in_place(&mut a, &mut x)?;
        *values = x;
        self.inverse = Some(a);
        Ok(())
    }

    fn inverse(&mut self) -> Result<Matrix> {
        if let Some(inv) = &self.inverse {
            return Ok(inv.clone());
        }

        let inv = invert(self.coefficients()?)?;
        self.inverse = Some(inv.clone());
        Ok(inv)
    }
}
