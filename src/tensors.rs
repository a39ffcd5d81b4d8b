//! Dense storage for the solvers: row-major matrices and vectors of `f64`.

pub mod matrix;
pub mod vector;
