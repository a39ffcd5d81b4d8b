use std::{
    fmt::Display,
    ops::{Add, AddAssign, Index, IndexMut, Mul, Neg, Sub, SubAssign},
};

use crate::{
    error::{LinAlgError, Result},
    printer::VectorPrinter,
    tensors::matrix::Matrix,
};

/// An n-dimensional vector of `f64` entries.
#[derive(Clone, PartialEq, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Vector {
    pub(crate) data: Vec<f64>,
}

impl Vector {
    /// Create a new vector from a list of scalars.
    pub fn new(data: Vec<f64>) -> Vector {
        Vector { data }
    }

    /// Create a zero vector of dimension `size`.
    pub fn new_zero(size: usize) -> Vector {
        Vector {
            data: vec![0.; size],
        }
    }

    /// Get the dimension of the vector.
    #[inline]
    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// Reallocate the vector with `size` zeroed entries.
    pub fn resize(&mut self, size: usize) {
        self.data.clear();
        self.data.resize(size, 0.);
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    pub fn as_mut_slice(&mut self) -> &mut [f64] {
        &mut self.data
    }

    pub fn into_vec(self) -> Vec<f64> {
        self.data
    }

    /// Get the `i`th entry, checking the bounds.
    pub fn get(&self, i: usize) -> Result<f64> {
        self.data.get(i).copied().ok_or(LinAlgError::OutOfRange {
            index: (i, 0),
            bounds: (self.data.len(), 1),
        })
    }

    /// Set the `i`th entry, checking the bounds.
    pub fn set(&mut self, i: usize, value: f64) -> Result<()> {
        let size = self.data.len();
        let e = self.data.get_mut(i).ok_or(LinAlgError::OutOfRange {
            index: (i, 0),
            bounds: (size, 1),
        })?;
        *e = value;
        Ok(())
    }

    /// Swap the entries at `a` and `b`.
    pub fn swap(&mut self, a: usize, b: usize) -> Result<()> {
        for i in [a, b] {
            if i >= self.data.len() {
                return Err(LinAlgError::OutOfRange {
                    index: (i, 0),
                    bounds: (self.data.len(), 1),
                });
            }
        }
        self.data.swap(a, b);
        Ok(())
    }

    /// Create a column matrix. This operation is very cheap.
    pub fn into_matrix(self) -> Matrix {
        Matrix::new_column(self.data)
    }

    pub fn norm_squared(&self) -> f64 {
        self.data.iter().map(|e| e * e).sum()
    }

    /// Get the Euclidean norm.
    pub fn norm(&self) -> f64 {
        self.norm_squared().sqrt()
    }

    /// Take the Euclidean scalar product of two vectors.
    pub fn dot(&self, rhs: &Self) -> f64 {
        if self.data.len() != rhs.data.len() {
            panic!(
                "Vectors do not have equal dimension: {} vs {}",
                self.data.len(),
                rhs.data.len()
            );
        }

        self.data.iter().zip(&rhs.data).map(|(a, b)| a * b).sum()
    }

    /// Return true iff both vectors have the same size and all entries
    /// differ by at most `tolerance`.
    pub fn approx_eq(&self, other: &Vector, tolerance: f64) -> bool {
        self.data.len() == other.data.len()
            && self
                .data
                .iter()
                .zip(&other.data)
                .all(|(a, b)| (a - b).abs() <= tolerance)
    }
}

impl From<Vec<f64>> for Vector {
    fn from(data: Vec<f64>) -> Self {
        Vector { data }
    }
}

impl Index<usize> for Vector {
    type Output = f64;

    /// Get the `i`th entry of the vector.
    #[inline]
    fn index(&self, index: usize) -> &Self::Output {
        &self.data[index]
    }
}

impl IndexMut<usize> for Vector {
    /// Get the `i`th entry of the vector.
    #[inline]
    fn index_mut(&mut self, index: usize) -> &mut f64 {
        &mut self.data[index]
    }
}

impl Display for Vector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        VectorPrinter::new(self).fmt(f)
    }
}

impl Mul<f64> for Vector {
    type Output = Vector;

    fn mul(mut self, rhs: f64) -> Self::Output {
        for x in &mut self.data {
            *x *= rhs;
        }
        self
    }
}

impl Add<&Vector> for &Vector {
    type Output = Vector;

    /// Add two vectors.
    fn add(self, rhs: &Vector) -> Self::Output {
        let mut v = self.clone();
        v += rhs;
        v
    }
}

impl AddAssign<&Vector> for Vector {
    /// Add two vectors in place.
    fn add_assign(&mut self, rhs: &Vector) {
        if self.data.len() != rhs.data.len() {
            panic!(
                "Cannot add vectors of different dimensions: {}  vs {}",
                self.data.len(),
                rhs.data.len()
            );
        }

        for (a, b) in self.data.iter_mut().zip(&rhs.data) {
            *a += b;
        }
    }
}

impl Sub<&Vector> for &Vector {
    type Output = Vector;

    /// Subtract two vectors.
    fn sub(self, rhs: &Vector) -> Self::Output {
        let mut v = self.clone();
        v -= rhs;
        v
    }
}

impl SubAssign<&Vector> for Vector {
    fn sub_assign(&mut self, rhs: &Vector) {
        if self.data.len() != rhs.data.len() {
            panic!(
                "Cannot subtract vectors of different dimensions: {}  vs {}",
                self.data.len(),
                rhs.data.len()
            );
        }

        for (a, b) in self.data.iter_mut().zip(&rhs.data) {
            *a -= b;
        }
    }
}

impl Neg for Vector {
    type Output = Vector;

    /// Negate each entry of the vector.
    fn neg(mut self) -> Self::Output {
        for e in &mut self.data {
            *e = -*e;
        }

        self
    }
}

#[cfg(test)]
mod test {
    use crate::tensors::vector::Vector;

    #[test]
    fn arithmetic() {
        let a = Vector::from(vec![1., 2., 2.]);
        let b = Vector::new(vec![3., 0., -1.]);

        assert_eq!(a.dot(&b), 1.);
        assert_eq!(a.norm(), 3.);
        assert_eq!((&a + &b).into_vec(), vec![4., 2., 1.]);
        assert_eq!((&a - &b).into_vec(), vec![-2., 2., 3.]);
        assert_eq!((-a.clone() * 2.).into_vec(), vec![-2., -4., -4.]);

        let m = a.into_matrix();
        assert_eq!((m.nrows(), m.ncols()), (3, 1));
    }

    #[test]
    fn bounds() {
        let mut a = Vector::new_zero(2);
        a.set(1, 5.).unwrap();
        assert_eq!(a.get(1).unwrap(), 5.);
        assert!(a.get(2).is_err());
        assert!(a.set(2, 1.).is_err());

        a.swap(0, 1).unwrap();
        assert_eq!(a[0], 5.);
        assert!(a.swap(0, 2).is_err());

        a.resize(4);
        assert_eq!(a.size(), 4);
        assert_eq!(a.norm_squared(), 0.);
    }
}
