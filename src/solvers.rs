//! Solvers for dense systems of linear equations `A * X = B`.
//!
//! Four interchangeable strategies are provided, each behind the [LinearSolver] trait:
//! - [GaussJordan]: full pivoting elimination that produces the inverse as a by-product.
//! - [LuDecomposition]: Crout's algorithm with scaled partial pivoting, for repeated solves
//!   and determinants.
//! - [QrDecomposition]: Householder reflections, with cheap rank-one updates.
//! - [SvDecomposition]: the singular value decomposition, for rank-deficient and
//!   rectangular systems.
//!
//! For example:
//!
//! ```
//! use densolve::{solvers::{LinearSolver, LuDecomposition}, tensors::matrix::Matrix};
//!
//! let a = Matrix::from_nested_vec(vec![
//!     vec![2., 3., 4.],
//!     vec![3., 4., 5.],
//!     vec![1., -2., 2.],
//! ])
//! .unwrap();
//! let b = Matrix::new_column(vec![20., 26., 3.]);
//!
//! let mut lu = LuDecomposition::with_matrix(&a).unwrap();
//! let x = lu.solve(&b).unwrap();
//! assert!(x.approx_eq(&Matrix::new_column(vec![1., 2., 3.]), 1e-12));
//! ```

pub mod gauss_jordan;
pub mod lu;
pub mod qr;
pub mod svd;

pub use gauss_jordan::GaussJordan;
pub use lu::{LuDecomposition, LuOptions, ZeroPivot};
pub use qr::QrDecomposition;
pub use svd::SvDecomposition;

use crate::{
    error::{LinAlgError, Result},
    tensors::{matrix::Matrix, vector::Vector},
};

/// A decomposition of a coefficient matrix `A` that can solve `A * X = B`.
pub trait LinearSolver {
    /// Solve `A * X = values`, leaving `values` untouched.
    /// Every column of `values` is a separate right-hand side.
    fn solve(&mut self, values: &Matrix) -> Result<Matrix> {
        let mut x = values.clone();
        self.solve_in_place(&mut x)?;
        Ok(x)
    }

    /// Solve `A * X = values`, overwriting `values` with `X`.
    fn solve_in_place(&mut self, values: &mut Matrix) -> Result<()>;

    /// Solve `A * x = values` for a single right-hand side.
    fn solve_vector(&mut self, values: &Vector) -> Result<Vector> {
        let mut x = values.clone().into_matrix();
        self.solve_in_place(&mut x)?;
        x.into_vector()
    }

    /// Compute the inverse of `A`. For the singular value decomposition this is
    /// the Moore-Penrose pseudoinverse.
    fn inverse(&mut self) -> Result<Matrix>;
}

pub(crate) fn check_square(coefficients: &Matrix) -> Result<()> {
    if coefficients.is_square() {
        Ok(())
    } else {
        Err(LinAlgError::invalid_argument(format!(
            "The coefficient matrix is not square: ({},{})",
            coefficients.nrows(),
            coefficients.ncols()
        )))
    }
}

pub(crate) fn check_values(nrows: usize, values: &Matrix) -> Result<()> {
    if values.nrows() == nrows {
        Ok(())
    } else {
        Err(LinAlgError::invalid_argument(format!(
            "The values have {} rows, but the coefficient matrix has {}",
            values.nrows(),
            nrows
        )))
    }
}
