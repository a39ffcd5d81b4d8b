//! Densolve solves dense systems of linear equations.
//!
//! It offers Gauss-Jordan elimination, the LU decomposition, the QR decomposition
//! and the singular value decomposition over row-major `f64` matrices.
//! All solvers share the [LinearSolver](solvers::LinearSolver) interface.
//!
//! For example:
//!
//! ```
//! use densolve::{
//!     solvers::{LinearSolver, SvDecomposition},
//!     tensors::{matrix::Matrix, vector::Vector},
//! };
//!
//! fn main() {
//!     // an overdetermined system: fit a line through three points
//!     let a = Matrix::from_nested_vec(vec![vec![1., 0.], vec![1., 1.], vec![1., 2.]]).unwrap();
//!     let mut svd = SvDecomposition::with_matrix(&a).unwrap();
//!     let x = svd.solve_vector(&Vector::from(vec![1., 3., 5.])).unwrap();
//!     println!("y = {} + {} t", x[0], x[1]);
//! }
//! ```

pub mod error;
pub mod printer;
pub mod solvers;
pub mod tensors;
pub mod utils;
