use std::{
    fmt::Display,
    ops::{Add, AddAssign, Index, IndexMut, Mul, MulAssign, Neg, Sub, SubAssign},
    slice::Chunks,
};

use rand::Rng;

use crate::{
    error::{LinAlgError, Result},
    printer::MatrixPrinter,
    tensors::vector::Vector,
};

/// A dense, row-major matrix of `f64` entries.
/// A vector can be represented as a matrix with one row or one column.
#[derive(Clone, PartialEq, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Matrix {
    pub(crate) data: Vec<f64>,
    pub(crate) nrows: usize,
    pub(crate) ncols: usize,
}

impl Matrix {
    /// Create a new zeroed matrix with `nrows` rows and `ncols` columns.
    pub fn new(nrows: usize, ncols: usize) -> Matrix {
        Matrix {
            data: vec![0.; nrows * ncols],
            nrows,
            ncols,
        }
    }

    /// Create a new square matrix with `nrows` rows and ones on the main diagonal and zeroes elsewhere.
    pub fn identity(nrows: usize) -> Matrix {
        let mut m = Matrix::new(nrows, nrows);
        for i in 0..nrows {
            m.data[i * nrows + i] = 1.;
        }
        m
    }

    /// Create a new matrix with the scalars `diag` on the main diagonal and zeroes elsewhere.
    pub fn eye(diag: &[f64]) -> Matrix {
        let mut m = Matrix::new(diag.len(), diag.len());
        for (i, e) in diag.iter().enumerate() {
            m[(i, i)] = *e;
        }
        m
    }

    /// Create a new column vector from a list of scalars.
    pub fn new_column(data: Vec<f64>) -> Matrix {
        Matrix {
            nrows: data.len(),
            ncols: 1,
            data,
        }
    }

    /// Convert a linear representation of a matrix to a `Matrix`.
    pub fn from_linear(data: Vec<f64>, nrows: usize, ncols: usize) -> Result<Matrix> {
        if data.len() == nrows * ncols {
            Ok(Matrix { data, nrows, ncols })
        } else {
            Err(LinAlgError::invalid_argument(format!(
                "Data length does not match matrix dimensions: {} vs ({},{})",
                data.len(),
                nrows,
                ncols
            )))
        }
    }

    /// Create a new matrix from a 2-dimensional vector of scalars.
    pub fn from_nested_vec(matrix: Vec<Vec<f64>>) -> Result<Matrix> {
        let nrows = matrix.len();
        let ncols = matrix.first().map(|r| r.len()).unwrap_or(0);

        let mut data = Vec::with_capacity(nrows * ncols);
        for d in matrix {
            if d.len() != ncols {
                return Err(LinAlgError::invalid_argument("Matrix is not rectangular"));
            }

            data.extend(d);
        }

        Ok(Matrix { data, nrows, ncols })
    }

    /// Create a matrix with entries sampled uniformly from `range`.
    pub fn sample(nrows: usize, ncols: usize, rng: &mut impl Rng, range: (f64, f64)) -> Matrix {
        Matrix {
            data: (0..nrows * ncols)
                .map(|_| rng.gen_range(range.0..range.1))
                .collect(),
            nrows,
            ncols,
        }
    }

    /// Return the number of rows (the height).
    #[inline]
    pub fn nrows(&self) -> usize {
        self.nrows
    }

    /// Return the number of columns (the width).
    #[inline]
    pub fn ncols(&self) -> usize {
        self.ncols
    }

    /// Return true iff the matrix has as many rows as columns.
    pub fn is_square(&self) -> bool {
        self.nrows == self.ncols
    }

    /// Get the row-major entries of the matrix.
    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    /// Get the row-major entries of the matrix mutably.
    pub fn as_mut_slice(&mut self) -> &mut [f64] {
        &mut self.data
    }

    /// Convert the matrix into its row-major entries.
    pub fn into_linear(self) -> Vec<f64> {
        self.data
    }

    /// Reallocate the matrix with the new dimensions. All entries are reset to zero.
    pub fn resize(&mut self, nrows: usize, ncols: usize) {
        self.data.clear();
        self.data.resize(nrows * ncols, 0.);
        self.nrows = nrows;
        self.ncols = ncols;
    }

    #[inline]
    fn check_bounds(&self, row: usize, col: usize) -> Result<()> {
        if row < self.nrows && col < self.ncols {
            Ok(())
        } else {
            Err(LinAlgError::OutOfRange {
                index: (row, col),
                bounds: (self.nrows, self.ncols),
            })
        }
    }

    #[inline]
    fn check_row(&self, row: usize) -> Result<()> {
        if row < self.nrows {
            Ok(())
        } else {
            Err(LinAlgError::OutOfRange {
                index: (row, 0),
                bounds: (self.nrows, self.ncols),
            })
        }
    }

    #[inline]
    fn check_column(&self, col: usize) -> Result<()> {
        if col < self.ncols {
            Ok(())
        } else {
            Err(LinAlgError::OutOfRange {
                index: (0, col),
                bounds: (self.nrows, self.ncols),
            })
        }
    }

    /// Get the entry at `row` and `col`, checking the bounds.
    pub fn get(&self, row: usize, col: usize) -> Result<f64> {
        self.check_bounds(row, col)?;
        Ok(self.data[row * self.ncols + col])
    }

    /// Set the entry at `row` and `col`, checking the bounds.
    pub fn set(&mut self, row: usize, col: usize, value: f64) -> Result<()> {
        self.check_bounds(row, col)?;
        self.data[row * self.ncols + col] = value;
        Ok(())
    }

    /// Swap two rows in-place.
    pub fn swap_rows(&mut self, a: usize, b: usize) -> Result<()> {
        self.check_row(a)?;
        self.check_row(b)?;
        if a != b {
            self.swap_rows_unchecked(a, b);
        }
        Ok(())
    }

    #[inline]
    pub(crate) fn swap_rows_unchecked(&mut self, a: usize, b: usize) {
        let (lo, hi) = if a < b { (a, b) } else { (b, a) };
        let (top, bottom) = self.data.split_at_mut(hi * self.ncols);
        top[lo * self.ncols..(lo + 1) * self.ncols].swap_with_slice(&mut bottom[..self.ncols]);
    }

    /// Swap two columns in-place.
    pub fn swap_columns(&mut self, a: usize, b: usize) -> Result<()> {
        self.check_column(a)?;
        self.check_column(b)?;
        if a != b {
            self.swap_columns_unchecked(a, b);
        }
        Ok(())
    }

    #[inline]
    pub(crate) fn swap_columns_unchecked(&mut self, a: usize, b: usize) {
        for r in 0..self.nrows {
            self.data.swap(r * self.ncols + a, r * self.ncols + b);
        }
    }

    /// Swap the entries at positions `a` and `b`, both given as `(row, col)`.
    pub fn swap(&mut self, a: (usize, usize), b: (usize, usize)) -> Result<()> {
        self.check_bounds(a.0, a.1)?;
        self.check_bounds(b.0, b.1)?;
        self.data
            .swap(a.0 * self.ncols + a.1, b.0 * self.ncols + b.1);
        Ok(())
    }

    /// Multiply every entry of a row by `factor`.
    pub fn scale_row(&mut self, row: usize, factor: f64) -> Result<()> {
        self.check_row(row)?;
        for e in &mut self.data[row * self.ncols..(row + 1) * self.ncols] {
            *e *= factor;
        }
        Ok(())
    }

    /// Copy a row into `buffer`, which must have length `ncols`.
    pub fn get_row(&self, row: usize, buffer: &mut [f64]) -> Result<()> {
        self.check_row(row)?;
        if buffer.len() != self.ncols {
            return Err(LinAlgError::invalid_argument(format!(
                "Row buffer has length {} instead of {}",
                buffer.len(),
                self.ncols
            )));
        }
        buffer.copy_from_slice(&self[row]);
        Ok(())
    }

    /// Copy a column into `buffer`, which must have length `nrows`.
    pub fn get_column(&self, col: usize, buffer: &mut [f64]) -> Result<()> {
        self.check_column(col)?;
        if buffer.len() != self.nrows {
            return Err(LinAlgError::invalid_argument(format!(
                "Column buffer has length {} instead of {}",
                buffer.len(),
                self.nrows
            )));
        }
        for (r, b) in buffer.iter_mut().enumerate() {
            *b = self.data[r * self.ncols + col];
        }
        Ok(())
    }

    /// Overwrite a row with the entries of `buffer`.
    pub fn set_row(&mut self, row: usize, buffer: &[f64]) -> Result<()> {
        self.check_row(row)?;
        if buffer.len() != self.ncols {
            return Err(LinAlgError::invalid_argument(format!(
                "Row buffer has length {} instead of {}",
                buffer.len(),
                self.ncols
            )));
        }
        self.data[row * self.ncols..(row + 1) * self.ncols].copy_from_slice(buffer);
        Ok(())
    }

    /// Overwrite a column with the entries of `buffer`.
    pub fn set_column(&mut self, col: usize, buffer: &[f64]) -> Result<()> {
        self.check_column(col)?;
        if buffer.len() != self.nrows {
            return Err(LinAlgError::invalid_argument(format!(
                "Column buffer has length {} instead of {}",
                buffer.len(),
                self.nrows
            )));
        }
        for (r, b) in buffer.iter().enumerate() {
            self.data[r * self.ncols + col] = *b;
        }
        Ok(())
    }

    /// Copy `src` into the row-major storage, starting at the linear position `offset`.
    pub fn copy_from_slice(&mut self, offset: usize, src: &[f64]) -> Result<()> {
        let cols = self.ncols.max(1);
        let end = match offset.checked_add(src.len()) {
            Some(end) if end <= self.data.len() => end,
            _ => {
                return Err(LinAlgError::OutOfRange {
                    index: (offset / cols, offset % cols),
                    bounds: (self.nrows, self.ncols),
                })
            }
        };
        self.data[offset..end].copy_from_slice(src);
        Ok(())
    }

    /// Get a copy of column `col` as a vector.
    pub fn column(&self, col: usize) -> Result<Vector> {
        let mut v = Vector::new_zero(self.nrows);
        self.get_column(col, v.as_mut_slice())?;
        Ok(v)
    }

    /// Return an iterator over the rows of the matrix.
    pub fn row_iter(&self) -> Chunks<'_, f64> {
        self.data.chunks(self.ncols.max(1))
    }

    /// Return true iff every entry in the matrix is zero.
    pub fn is_zero(&self) -> bool {
        self.data.iter().all(|e| *e == 0.)
    }

    /// Return true iff every non- main diagonal entry in the matrix is zero.
    pub fn is_diagonal(&self) -> bool {
        self.data
            .iter()
            .enumerate()
            .all(|(i, e)| i % self.ncols == i / self.ncols || *e == 0.)
    }

    /// Return true iff both matrices have the same shape and all entries
    /// differ by at most `tolerance`.
    pub fn approx_eq(&self, other: &Matrix, tolerance: f64) -> bool {
        self.nrows == other.nrows
            && self.ncols == other.ncols
            && self
                .data
                .iter()
                .zip(&other.data)
                .all(|(a, b)| (a - b).abs() <= tolerance)
    }

    /// Transpose the matrix.
    pub fn transpose(&self) -> Matrix {
        let mut m = Matrix::new(self.ncols, self.nrows);
        for i in 0..self.nrows {
            for j in 0..self.ncols {
                m[(j, i)] = self[(i, j)];
            }
        }
        m
    }

    /// Transpose the matrix in-place.
    pub fn into_transposed(mut self) -> Matrix {
        if self.nrows == self.ncols {
            for i in 0..self.nrows {
                for j in 0..i {
                    self.data.swap(i * self.ncols + j, j * self.ncols + i);
                }
            }
            self
        } else {
            self.transpose()
        }
    }

    /// Multiply the scalar `e` to each entry of the matrix.
    pub fn mul_scalar(&self, e: f64) -> Matrix {
        self.map(|x| x * e)
    }

    /// Apply a function `f` to each entry of the matrix.
    pub fn map(&self, f: impl Fn(f64) -> f64) -> Matrix {
        Matrix {
            data: self.data.iter().map(|x| f(*x)).collect(),
            nrows: self.nrows,
            ncols: self.ncols,
        }
    }

    /// Get the squared Frobenius norm of the matrix.
    pub fn norm_squared(&self) -> f64 {
        self.data.iter().map(|x| x * x).sum()
    }

    /// Get the largest absolute value of all entries.
    pub fn max_abs(&self) -> f64 {
        self.data.iter().fold(0., |m, x| x.abs().max(m))
    }

    /// Multiply the matrix with the column vector `v`.
    pub fn mul_vector(&self, v: &Vector) -> Result<Vector> {
        if self.ncols != v.size() {
            return Err(LinAlgError::invalid_argument(format!(
                "Cannot multiply ({},{}) matrix with vector of size {}",
                self.nrows,
                self.ncols,
                v.size()
            )));
        }

        let mut res = Vector::new_zero(self.nrows);
        for (i, r) in res.as_mut_slice().iter_mut().enumerate() {
            *r = self[i].iter().zip(v.as_slice()).map(|(a, b)| a * b).sum();
        }
        Ok(res)
    }

    /// Compute the outer product `u ⊗ v`.
    pub fn outer(u: &Vector, v: &Vector) -> Matrix {
        let mut m = Matrix::new(u.size(), v.size());
        for (i, a) in u.as_slice().iter().enumerate() {
            for (j, b) in v.as_slice().iter().enumerate() {
                m.data[i * m.ncols + j] = a * b;
            }
        }
        m
    }

    /// Convert a matrix that is a row or column vector into a [Vector].
    pub fn into_vector(self) -> Result<Vector> {
        if self.nrows != 1 && self.ncols != 1 {
            return Err(LinAlgError::invalid_argument("The matrix is not a vector"));
        }

        Ok(Vector::from(self.data))
    }
}

impl Index<usize> for Matrix {
    type Output = [f64];

    /// Get the `index`th row of the matrix.
    #[inline]
    fn index(&self, index: usize) -> &Self::Output {
        &self.data[index * self.ncols..(index + 1) * self.ncols]
    }
}

impl IndexMut<usize> for Matrix {
    /// Get the `index`th row of the matrix.
    #[inline]
    fn index_mut(&mut self, index: usize) -> &mut Self::Output {
        &mut self.data[index * self.ncols..(index + 1) * self.ncols]
    }
}

impl Index<(usize, usize)> for Matrix {
    type Output = f64;

    /// Get the `i`th row and `j`th column of the matrix, where `index=(i,j)`.
    #[inline]
    fn index(&self, index: (usize, usize)) -> &Self::Output {
        debug_assert!(index.0 < self.nrows && index.1 < self.ncols);
        &self.data[index.0 * self.ncols + index.1]
    }
}

impl IndexMut<(usize, usize)> for Matrix {
    /// Get the `i`th row and `j`th column of the matrix, where `index=(i,j)`.
    #[inline]
    fn index_mut(&mut self, index: (usize, usize)) -> &mut f64 {
        debug_assert!(index.0 < self.nrows && index.1 < self.ncols);
        &mut self.data[index.0 * self.ncols + index.1]
    }
}

impl Display for Matrix {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        MatrixPrinter::new(self).fmt(f)
    }
}

impl Add<&Matrix> for &Matrix {
    type Output = Matrix;

    /// Add two matrices.
    fn add(self, rhs: &Matrix) -> Self::Output {
        let mut m = self.clone();
        m += rhs;
        m
    }
}

impl AddAssign<&Matrix> for Matrix {
    /// Add two matrices in place.
    fn add_assign(&mut self, rhs: &Matrix) {
        if self.nrows != rhs.nrows || self.ncols != rhs.ncols {
            panic!(
                "Cannot add matrices of different dimensions: ({},{}) vs ({},{})",
                self.nrows, self.ncols, rhs.nrows, rhs.ncols
            );
        }

        for (a, b) in self.data.iter_mut().zip(&rhs.data) {
            *a += b;
        }
    }
}

impl Sub<&Matrix> for &Matrix {
    type Output = Matrix;

    /// Subtract two matrices.
    fn sub(self, rhs: &Matrix) -> Self::Output {
        let mut m = self.clone();
        m -= rhs;
        m
    }
}

impl SubAssign<&Matrix> for Matrix {
    /// Subtract two matrices in place.
    fn sub_assign(&mut self, rhs: &Matrix) {
        if self.nrows != rhs.nrows || self.ncols != rhs.ncols {
            panic!(
                "Cannot subtract matrices of different dimensions: ({},{}) vs ({},{})",
                self.nrows, self.ncols, rhs.nrows, rhs.ncols
            );
        }

        for (a, b) in self.data.iter_mut().zip(&rhs.data) {
            *a -= b;
        }
    }
}

impl Mul<&Matrix> for &Matrix {
    type Output = Matrix;

    /// Multiply two matrices.
    fn mul(self, rhs: &Matrix) -> Self::Output {
        if self.ncols != rhs.nrows {
            panic!(
                "Cannot multiply matrices because of a dimension mismatch: ({},{}) vs ({},{})",
                self.nrows, self.ncols, rhs.nrows, rhs.ncols
            );
        }

        let mut m = Matrix::new(self.nrows, rhs.ncols);
        for i in 0..self.nrows {
            for k in 0..self.ncols {
                let a = self.data[i * self.ncols + k];
                if a == 0. {
                    continue;
                }
                for j in 0..rhs.ncols {
                    m.data[i * rhs.ncols + j] += a * rhs.data[k * rhs.ncols + j];
                }
            }
        }

        m
    }
}

impl MulAssign<&Matrix> for Matrix {
    /// Multiply two matrices in place.
    fn mul_assign(&mut self, rhs: &Matrix) {
        *self = &*self * rhs;
    }
}

impl Mul<f64> for Matrix {
    type Output = Matrix;

    fn mul(mut self, rhs: f64) -> Self::Output {
        for x in &mut self.data {
            *x *= rhs;
        }
        self
    }
}

impl Neg for Matrix {
    type Output = Matrix;

    /// Negate each entry of the matrix.
    fn neg(mut self) -> Self::Output {
        for e in &mut self.data {
            *e = -*e;
        }

        self
    }
}

impl From<Vector> for Matrix {
    /// Create a column matrix from a vector.
    fn from(v: Vector) -> Matrix {
        Matrix::new_column(v.into_vec())
    }
}
