//! QR decomposition using Householder reflections.

use tracing::{debug, instrument};

use crate::{
    error::{LinAlgError, Result},
    solvers::{check_square, check_values, LinearSolver},
    tensors::{matrix::Matrix, vector::Vector},
    utils::{pythag, sign},
};

#[derive(Clone, Debug)]
struct Factors {
    qt: Matrix,
    r: Matrix,
    /// The determinant of `Qᵗ`, either `1.` or `-1.`.
    qt_det: f64,
    inverse: Option<Matrix>,
}

#[derive(Clone, Debug)]
enum State {
    Uninitialized,
    Decomposed(Factors),
    Singular,
}

/// The QR decomposition `A = Q * R` of a square matrix, with `Q` orthogonal and
/// `R` upper triangular.
///
/// The decomposition is performed eagerly by [initialize](QrDecomposition::initialize)
/// and can be updated for a rank-one change of the matrix with
/// [update](QrDecomposition::update), which is much cheaper than decomposing again.
#[derive(Clone, Debug)]
pub struct QrDecomposition {
    state: State,
}

impl Default for QrDecomposition {
    fn default() -> Self {
        QrDecomposition::new()
    }
}

impl QrDecomposition {
    /// Create a decomposition without a matrix.
    pub fn new() -> QrDecomposition {
        QrDecomposition {
            state: State::Uninitialized,
        }
    }

    /// Decompose the square matrix `matrix`.
    pub fn with_matrix(matrix: &Matrix) -> Result<QrDecomposition> {
        let mut qr = QrDecomposition::new();
        qr.initialize(matrix)?;
        Ok(qr)
    }

    /// Decompose a copy of `matrix`, replacing the previous decomposition.
    /// If the matrix is singular, every later operation fails with
    /// [LinAlgError::SingularMatrix] until a new matrix is decomposed.
    pub fn initialize(&mut self, matrix: &Matrix) -> Result<()> {
        self.initialize_owned(matrix.clone())
    }

    /// Decompose `matrix`, using its storage as workspace.
    pub fn initialize_owned(&mut self, mut matrix: Matrix) -> Result<()> {
        check_square(&matrix)?;
        match decompose(&mut matrix) {
            Ok(factors) => {
                self.state = State::Decomposed(factors);
                Ok(())
            }
            Err(e) => {
                self.state = State::Singular;
                Err(e)
            }
        }
    }

    fn factors(&self) -> Result<&Factors> {
        match &self.state {
            State::Decomposed(f) => Ok(f),
            State::Uninitialized => Err(LinAlgError::OperationInvalid(
                "no matrix was supplied",
            )),
            State::Singular => Err(LinAlgError::SingularMatrix),
        }
    }

    fn factors_mut(&mut self) -> Result<&mut Factors> {
        match &mut self.state {
            State::Decomposed(f) => Ok(f),
            State::Uninitialized => Err(LinAlgError::OperationInvalid(
                "no matrix was supplied",
            )),
            State::Singular => Err(LinAlgError::SingularMatrix),
        }
    }

    /// Get the transpose of the orthogonal factor `Q`.
    pub fn q_transposed(&self) -> Result<Matrix> {
        Ok(self.factors()?.qt.clone())
    }

    /// Get the upper triangular factor `R`.
    pub fn r(&self) -> Result<Matrix> {
        Ok(self.factors()?.r.clone())
    }

    /// Compute the determinant of the matrix.
    pub fn determinant(&self) -> Result<f64> {
        let f = self.factors()?;
        Ok((0..f.r.nrows()).fold(f.qt_det, |d, i| d * f.r[(i, i)]))
    }

    /// Update the decomposition of `A = Q * R` to that of `Q * (R + u ⊗ v)`,
    /// which equals `A + (Q * u) ⊗ v`.
    ///
    /// If the updated matrix is singular, [LinAlgError::SingularMatrix] is returned
    /// and the decomposition is not modified.
    #[instrument(level = "debug", skip_all)]
    pub fn update(&mut self, u: &Vector, v: &Vector) -> Result<()> {
        let f = self.factors_mut()?;
        let n = f.r.nrows();
        if u.size() != n || v.size() != n {
            return Err(LinAlgError::invalid_argument(format!(
                "The update vectors have sizes {} and {} instead of {}",
                u.size(),
                v.size(),
                n
            )));
        }
        if n == 0 {
            return Ok(());
        }

        let mut r = f.r.clone();
        let mut qt = f.qt.clone();
        let mut w = u.clone().into_vec();

        // find the last non-zero entry of u
        let k = (0..n).rev().find(|&k| w[k] != 0.).unwrap_or(0);

        // rotate u into a multiple of the first unit vector, making R upper Hessenberg
        for i in (0..k).rev() {
            rotate(&mut r, &mut qt, i, w[i], -w[i + 1]);
            w[i] = pythag(w[i], w[i + 1]);
        }

        for (i, vi) in v.as_slice().iter().enumerate() {
            r[(0, i)] += w[0] * vi;
        }

        // restore the upper triangular form
        for i in 0..k {
            let (a, b) = (r[(i, i)], -r[(i + 1, i)]);
            rotate(&mut r, &mut qt, i, a, b);
        }

        if let Some(i) = (0..n).find(|&i| r[(i, i)] == 0.) {
            debug!("Zero diagonal entry {} after the update", i);
            return Err(LinAlgError::SingularMatrix);
        }

        f.r = r;
        f.qt = qt;
        f.inverse = None;
        debug!("Committed rank-one update with {} rotations", 2 * k);
        Ok(())
    }

    /// Update the decomposition of `A` to that of `A + s ⊗ t`.
    pub fn update_matrix(&mut self, s: &Vector, t: &Vector) -> Result<()> {
        let u = self.factors()?.qt.mul_vector(s)?;
        self.update(&u, t)
    }
}

/// Apply a Jacobi rotation to rows `i` and `i + 1` of `r` and `qt`, with
/// `cos = a / sqrt(a^2 + b^2)` and `sin = b / sqrt(a^2 + b^2)`.
fn rotate(r: &mut Matrix, qt: &mut Matrix, i: usize, a: f64, b: f64) {
    let n = r.nrows();
    let (c, s) = if a == 0. {
        (0., if b >= 0. { 1. } else { -1. })
    } else if a.abs() > b.abs() {
        let fact = b / a;
        let c = sign(1. / (1. + fact * fact).sqrt(), a);
        (c, fact * c)
    } else {
        let fact = a / b;
        let s = sign(1. / (1. + fact * fact).sqrt(), b);
        (fact * s, s)
    };

    for j in i..n {
        let (y, w) = (r[(i, j)], r[(i + 1, j)]);
        r[(i, j)] = c * y - s * w;
        r[(i + 1, j)] = s * y + c * w;
    }
    for j in 0..n {
        let (y, w) = (qt[(i, j)], qt[(i + 1, j)]);
        qt[(i, j)] = c * y - s * w;
        qt[(i + 1, j)] = s * y + c * w;
    }
}

/// Householder decomposition of `a`. The Householder vectors are stored below and on
/// the diagonal of `a` and the off-diagonal part of `R` above it, before `Qᵗ` and `R`
/// are formed explicitly.
#[instrument(level = "debug", skip_all, fields(n = a.nrows()))]
fn decompose(a: &mut Matrix) -> Result<Factors> {
    let n = a.nrows();
    let mut c = vec![0.; n];
    let mut d = vec![0.; n];

    for k in 0..n.saturating_sub(1) {
        let scale = (k..n).fold(0., |s: f64, i| s.max(a[(i, k)].abs()));
        if scale == 0. {
            debug!("Column {} vanishes below the diagonal", k);
            return Err(LinAlgError::SingularMatrix);
        }

        for i in k..n {
            a[(i, k)] /= scale;
        }
        let sum: f64 = (k..n).map(|i| a[(i, k)] * a[(i, k)]).sum();
        let sigma = sign(sum.sqrt(), a[(k, k)]);
        a[(k, k)] += sigma;
        c[k] = sigma * a[(k, k)];
        d[k] = -scale * sigma;

        for j in k + 1..n {
            let sum: f64 = (k..n).map(|i| a[(i, k)] * a[(i, j)]).sum();
            let tau = sum / c[k];
            for i in k..n {
                let h = a[(i, k)];
                a[(i, j)] -= tau * h;
            }
        }
    }

    if n > 0 {
        d[n - 1] = a[(n - 1, n - 1)];
        if d[n - 1] == 0. {
            debug!("Last diagonal entry is zero");
            return Err(LinAlgError::SingularMatrix);
        }
    }

    let mut qt = Matrix::identity(n);
    for k in 0..n.saturating_sub(1) {
        for j in 0..n {
            let sum: f64 = (k..n).map(|i| a[(i, k)] * qt[(i, j)]).sum::<f64>() / c[k];
            for i in k..n {
                qt[(i, j)] -= sum * a[(i, k)];
            }
        }
    }

    let mut r = Matrix::new(n, n);
    for i in 0..n {
        r[(i, i)] = d[i];
        for j in i + 1..n {
            r[(i, j)] = a[(i, j)];
        }
    }

    // every reflection has determinant -1
    let qt_det = if n.saturating_sub(1) % 2 == 0 { 1. } else { -1. };

    Ok(Factors {
        qt,
        r,
        qt_det,
        inverse: None,
    })
}

impl Factors {
    fn solve_in_place(&self, values: &mut Matrix) {
        let n = self.r.nrows();
        let mut x = vec![0.; n];

        for col in 0..values.ncols() {
            // x = Qᵗ * b
            for (i, xi) in x.iter_mut().enumerate() {
                *xi = (0..n).map(|j| self.qt[(i, j)] * values[(j, col)]).sum();
            }

            // back substitution with R
            for i in (0..n).rev() {
                let mut sum = x[i];
                for j in i + 1..n {
                    sum -= self.r[(i, j)] * x[j];
                }
                x[i] = sum / self.r[(i, i)];
            }

            for (i, xi) in x.iter().enumerate() {
                values[(i, col)] = *xi;
            }
        }
    }
}

impl LinearSolver for QrDecomposition {
    fn solve_in_place(&mut self, values: &mut Matrix) -> Result<()> {
        let f = self.factors()?;
        check_values(f.r.nrows(), values)?;
        f.solve_in_place(values);
        Ok(())
    }

    fn inverse(&mut self) -> Result<Matrix> {
        let f = self.factors_mut()?;
        if let Some(inv) = &f.inverse {
            return Ok(inv.clone());
        }

        let mut inv = Matrix::identity(f.r.nrows());
        f.solve_in_place(&mut inv);
        f.inverse = Some(inv.clone());
        Ok(inv)
    }
}

#[cfg(test)]
mod test {
    use crate::{
        error::LinAlgError,
        solvers::{LinearSolver, QrDecomposition},
        tensors::{matrix::Matrix, vector::Vector},
    };

    fn example() -> Matrix {
        Matrix::from_nested_vec(vec![vec![2., 3., 4.], vec![3., 4., 5.], vec![1., -2., 2.]])
            .unwrap()
    }

    /// Compare two decompositions, allowing the rows of `R` and `Qᵗ` to differ by a sign.
    fn assert_same_up_to_sign(a: &QrDecomposition, b: &QrDecomposition, tol: f64) {
        let (ra, rb) = (a.r().unwrap(), b.r().unwrap());
        let (qa, qb) = (a.q_transposed().unwrap(), b.q_transposed().unwrap());

        for i in 0..ra.nrows() {
            let s = ra[(i, i)].signum() * rb[(i, i)].signum();
            for j in 0..ra.ncols() {
                assert!((ra[(i, j)] - s * rb[(i, j)]).abs() < tol, "R differs at ({i},{j})");
                assert!((qa[(i, j)] - s * qb[(i, j)]).abs() < tol, "Qᵗ differs at ({i},{j})");
            }
        }
    }

    #[test]
    fn decompose() {
        let qr = QrDecomposition::with_matrix(&example()).unwrap();
        let qt = qr.q_transposed().unwrap();
        let r = qr.r().unwrap();

        assert!((&qt * &qt.transpose()).approx_eq(&Matrix::identity(3), 1e-13));
        assert!((&qt.transpose() * &r).approx_eq(&example(), 1e-12));
        for i in 0..3 {
            for j in 0..i {
                assert_eq!(r[(i, j)], 0.);
            }
        }

        assert!((qr.determinant().unwrap() + 7.).abs() < 1e-12);
    }

    #[test]
    fn solve() {
        let mut qr = QrDecomposition::with_matrix(&example()).unwrap();
        let x = qr.solve_vector(&Vector::from(vec![20., 26., 3.])).unwrap();
        assert!(x.approx_eq(&Vector::from(vec![1., 2., 3.]), 1e-12));

        let inv = qr.inverse().unwrap();
        assert!((&example() * &inv).approx_eq(&Matrix::identity(3), 1e-12));
    }

    #[test]
    fn update() {
        let a = example();
        let s = Vector::from(vec![1., -0.5, 2.]);
        let t = Vector::from(vec![0.25, 1., -1.]);

        let mut updated = QrDecomposition::with_matrix(&a).unwrap();
        updated.update_matrix(&s, &t).unwrap();

        let direct = QrDecomposition::with_matrix(&(&a + &Matrix::outer(&s, &t))).unwrap();
        assert_same_up_to_sign(&updated, &direct, 1e-12);

        let qt = updated.q_transposed().unwrap();
        let r = updated.r().unwrap();
        assert!((&qt.transpose() * &r).approx_eq(&(&a + &Matrix::outer(&s, &t)), 1e-12));
        assert!((updated.determinant().unwrap() - direct.determinant().unwrap()).abs() < 1e-10);
    }

    #[test]
    fn update_to_singular() {
        // A + s ⊗ t has a zero column
        let a = Matrix::identity(2);
        let s = Vector::from(vec![0., 1.]);
        let t = Vector::from(vec![1., -1.]);

        let mut qr = QrDecomposition::with_matrix(&a).unwrap();
        let before = qr.r().unwrap();
        assert_eq!(
            qr.update_matrix(&s, &t).unwrap_err(),
            LinAlgError::SingularMatrix
        );
        assert_eq!(qr.r().unwrap(), before);

        assert!(qr
            .update(&Vector::new_zero(3), &t)
            .unwrap_err()
            .is_invalid_argument());
    }

    #[test]
    fn singular() {
        let a = Matrix::from_nested_vec(vec![vec![0., 1.], vec![0., 2.]]).unwrap();
        assert_eq!(
            QrDecomposition::with_matrix(&a).unwrap_err(),
            LinAlgError::SingularMatrix
        );

        // a failed initialization discards the previous decomposition
        let mut qr = QrDecomposition::with_matrix(&Matrix::eye(&[2., 4.])).unwrap();
        assert_eq!(qr.initialize(&a).unwrap_err(), LinAlgError::SingularMatrix);
        assert_eq!(
            qr.solve_vector(&Vector::from(vec![2., 4.])).unwrap_err(),
            LinAlgError::SingularMatrix
        );
        assert_eq!(qr.determinant().unwrap_err(), LinAlgError::SingularMatrix);
        assert!(qr.inverse().unwrap_err().is_singular());
        assert!(qr.r().is_err());

        // a rejected argument does not touch the state
        assert!(qr.initialize(&Matrix::new(2, 3)).unwrap_err().is_invalid_argument());
        assert!(qr.determinant().unwrap_err().is_singular());

        qr.initialize(&Matrix::eye(&[2., 4.])).unwrap();
        assert!((qr.determinant().unwrap() - 8.).abs() < 1e-12);
    }

    #[test]
    fn uninitialized() {
        let mut qr = QrDecomposition::new();
        assert_eq!(
            qr.solve(&Matrix::new(1, 1)).unwrap_err(),
            LinAlgError::OperationInvalid("no matrix was supplied")
        );
        assert!(QrDecomposition::with_matrix(&Matrix::new(2, 1))
            .unwrap_err()
            .is_invalid_argument());
    }
}
