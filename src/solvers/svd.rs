//! Singular value decomposition using the Golub-Reinsch algorithm.

use tracing::{debug, instrument};

use crate::{
    error::{LinAlgError, Result},
    solvers::{check_values, LinearSolver},
    tensors::matrix::Matrix,
    utils::{pythag, sign},
};

/// The maximum number of implicit QR sweeps spent on a single singular value.
pub const MAX_ITERATIONS: usize = 30;

#[derive(Clone, Debug)]
struct Factors {
    /// `m × n` with orthonormal columns for the non-zero singular values.
    u: Matrix,
    /// The singular values, non-negative and sorted descending.
    w: Vec<f64>,
    /// `n × n` orthogonal.
    v: Matrix,
    threshold: f64,
    inverse: Option<Matrix>,
}

#[derive(Clone, Debug)]
enum State {
    Uninitialized,
    Decomposed(Factors),
    Failed,
}

/// The singular value decomposition `A = U * diag(w) * Vᵗ` of an `m × n` matrix.
///
/// Singular values at or below a threshold are treated as zero. This defines the
/// numerical rank of the matrix and makes [solve](LinearSolver::solve) return the
/// least-squares solution for overdetermined systems and the minimum-norm
/// solution for underdetermined or singular ones.
/// The default threshold is `0.5 * sqrt(m + n + 1) * w_max * ε`.
#[derive(Clone, Debug)]
pub struct SvDecomposition {
    state: State,
}

impl Default for SvDecomposition {
    fn default() -> Self {
        SvDecomposition::new()
    }
}

impl SvDecomposition {
    /// Create a decomposition without a matrix.
    pub fn new() -> SvDecomposition {
        SvDecomposition {
            state: State::Uninitialized,
        }
    }

    /// Decompose the matrix `matrix`.
    pub fn with_matrix(matrix: &Matrix) -> Result<SvDecomposition> {
        let mut svd = SvDecomposition::new();
        svd.initialize(matrix)?;
        Ok(svd)
    }

    /// Decompose a copy of `matrix`, replacing the previous decomposition.
    ///
    /// If the iteration does not converge, [LinAlgError::ConvergenceFailure] is
    /// returned and every later operation fails with the same error until the
    /// decomposition is initialized again.
    pub fn initialize(&mut self, matrix: &Matrix) -> Result<()> {
        self.initialize_owned(matrix.clone())
    }

    /// Decompose `matrix`, using its storage as workspace.
    pub fn initialize_owned(&mut self, matrix: Matrix) -> Result<()> {
        match decompose(matrix) {
            Ok(f) => {
                self.state = State::Decomposed(f);
                Ok(())
            }
            Err(e) => {
                self.state = State::Failed;
                Err(e)
            }
        }
    }

    fn factors(&self) -> Result<&Factors> {
        match &self.state {
            State::Decomposed(f) => Ok(f),
            State::Uninitialized => Err(LinAlgError::OperationInvalid("no matrix was supplied")),
            State::Failed => Err(LinAlgError::ConvergenceFailure {
                iterations: MAX_ITERATIONS,
            }),
        }
    }

    fn factors_mut(&mut self) -> Result<&mut Factors> {
        match &mut self.state {
            State::Decomposed(f) => Ok(f),
            State::Uninitialized => Err(LinAlgError::OperationInvalid("no matrix was supplied")),
            State::Failed => Err(LinAlgError::ConvergenceFailure {
                iterations: MAX_ITERATIONS,
            }),
        }
    }

    /// Get the default threshold below which singular values are considered zero.
    pub fn threshold(&self) -> Result<f64> {
        Ok(self.factors()?.threshold)
    }

    /// Get the singular values, sorted descending.
    pub fn singular_values(&self) -> Result<&[f64]> {
        Ok(&self.factors()?.w)
    }

    /// Get the `m × n` matrix of left singular vectors.
    pub fn u(&self) -> Result<Matrix> {
        Ok(self.factors()?.u.clone())
    }

    /// Get the `n × n` matrix of right singular vectors.
    pub fn v(&self) -> Result<Matrix> {
        Ok(self.factors()?.v.clone())
    }

    /// Get the numerical rank: the number of singular values above the default threshold.
    pub fn rank(&self) -> Result<usize> {
        let f = self.factors()?;
        Ok(f.rank(f.threshold))
    }

    /// Get the number of singular values above `threshold`.
    pub fn rank_with_threshold(&self, threshold: f64) -> Result<usize> {
        let f = self.factors()?;
        Ok(f.rank(check_threshold(threshold, f.threshold)?))
    }

    /// Get the dimension of the null space: the number of singular values at or
    /// below the default threshold.
    pub fn nullity(&self) -> Result<usize> {
        let f = self.factors()?;
        Ok(f.w.len() - f.rank(f.threshold))
    }

    /// Get the number of singular values at or below `threshold`.
    pub fn nullity_with_threshold(&self, threshold: f64) -> Result<usize> {
        let f = self.factors()?;
        Ok(f.w.len() - f.rank(check_threshold(threshold, f.threshold)?))
    }

    /// Get an orthonormal basis of the range of the matrix, as the columns of an
    /// `m × rank` matrix.
    pub fn range(&self) -> Result<Matrix> {
        let f = self.factors()?;
        Ok(f.range(f.threshold))
    }

    pub fn range_with_threshold(&self, threshold: f64) -> Result<Matrix> {
        let f = self.factors()?;
        Ok(f.range(check_threshold(threshold, f.threshold)?))
    }

    /// Get an orthonormal basis of the null space of the matrix, as the columns of an
    /// `n × nullity` matrix.
    pub fn null_space(&self) -> Result<Matrix> {
        let f = self.factors()?;
        Ok(f.null_space(f.threshold))
    }

    pub fn null_space_with_threshold(&self, threshold: f64) -> Result<Matrix> {
        let f = self.factors()?;
        Ok(f.null_space(check_threshold(threshold, f.threshold)?))
    }

    /// Get the reciprocal of the condition number, `w_min / w_max`.
    /// Returns zero if either singular value is zero.
    pub fn inverse_condition(&self) -> Result<f64> {
        let w = &self.factors()?.w;
        match (w.first(), w.last()) {
            (Some(&max), Some(&min)) if max > 0. && min > 0. => Ok(min / max),
            _ => Ok(0.),
        }
    }

    /// Solve `A * X = values`, treating singular values at or below `threshold` as zero.
    /// A negative `threshold` selects the default threshold.
    pub fn solve_with_threshold(&self, values: &Matrix, threshold: f64) -> Result<Matrix> {
        let f = self.factors()?;
        check_values(f.u.nrows(), values)?;
        Ok(f.solve(values, check_threshold(threshold, f.threshold)?))
    }

    /// Solve `A * X = values` in-place, treating singular values at or below `threshold` as zero.
    /// If `A` is not square, `values` is resized to hold the solution.
    pub fn solve_in_place_with_threshold(&self, values: &mut Matrix, threshold: f64) -> Result<()> {
        *values = self.solve_with_threshold(values, threshold)?;
        Ok(())
    }

    /// Compute the Moore-Penrose pseudoinverse, treating singular values at or below
    /// `threshold` as zero.
    pub fn inverse_with_threshold(&self, threshold: f64) -> Result<Matrix> {
        let f = self.factors()?;
        Ok(f.pseudoinverse(check_threshold(threshold, f.threshold)?))
    }
}

/// Resolve a user threshold: a negative value selects the default threshold.
fn check_threshold(threshold: f64, default: f64) -> Result<f64> {
    if threshold.is_nan() {
        Err(LinAlgError::invalid_argument("The threshold is NaN"))
    } else if threshold < 0. {
        Ok(default)
    } else {
        Ok(threshold)
    }
}

impl Factors {
    fn rank(&self, threshold: f64) -> usize {
        self.w.iter().filter(|&&w| w > threshold).count()
    }

    fn select_columns(m: &Matrix, columns: &[usize]) -> Matrix {
        let mut res = Matrix::new(m.nrows(), columns.len());
        for (jj, &j) in columns.iter().enumerate() {
            for i in 0..m.nrows() {
                res[(i, jj)] = m[(i, j)];
            }
        }
        res
    }

    fn range(&self, threshold: f64) -> Matrix {
        let cols: Vec<_> = (0..self.w.len()).filter(|&j| self.w[j] > threshold).collect();
        Self::select_columns(&self.u, &cols)
    }

    fn null_space(&self, threshold: f64) -> Matrix {
        let cols: Vec<_> = (0..self.w.len()).filter(|&j| self.w[j] <= threshold).collect();
        Self::select_columns(&self.v, &cols)
    }

    fn solve(&self, values: &Matrix, threshold: f64) -> Matrix {
        let (m, n) = (self.u.nrows(), self.v.nrows());
        let mut x = Matrix::new(n, values.ncols());
        let mut tmp = vec![0.; n];

        for c in 0..values.ncols() {
            for (j, t) in tmp.iter_mut().enumerate() {
                *t = if self.w[j] > threshold {
                    (0..m).map(|i| self.u[(i, j)] * values[(i, c)]).sum::<f64>() / self.w[j]
                } else {
                    0.
                };
            }

            for j in 0..n {
                x[(j, c)] = (0..n).map(|jj| self.v[(j, jj)] * tmp[jj]).sum();
            }
        }

        x
    }

    fn pseudoinverse(&self, threshold: f64) -> Matrix {
        let (m, n) = (self.u.nrows(), self.v.nrows());
        let mut inv = Matrix::new(n, m);
        for k in (0..n).filter(|&k| self.w[k] > threshold) {
            let wi = 1. / self.w[k];
            for i in 0..n {
                let vik = self.v[(i, k)] * wi;
                for j in 0..m {
                    inv[(i, j)] += vik * self.u[(j, k)];
                }
            }
        }
        inv
    }
}

impl LinearSolver for SvDecomposition {
    fn solve(&mut self, values: &Matrix) -> Result<Matrix> {
        let f = self.factors()?;
        check_values(f.u.nrows(), values)?;
        Ok(f.solve(values, f.threshold))
    }

    /// Solve `A * X = values` in-place. If `A` is not square, `values` is resized to hold
    /// the solution.
    fn solve_in_place(&mut self, values: &mut Matrix) -> Result<()> {
        *values = LinearSolver::solve(self, values)?;
        Ok(())
    }

    fn inverse(&mut self) -> Result<Matrix> {
        let f = self.factors_mut()?;
        if let Some(inv) = &f.inverse {
            return Ok(inv.clone());
        }

        let inv = f.pseudoinverse(f.threshold);
        f.inverse = Some(inv.clone());
        Ok(inv)
    }
}

/// Decompose `a`. Wide matrices are padded with rows of zeroes, which only adds
/// zero singular values.
#[instrument(level = "debug", skip_all, fields(m = a.nrows(), n = a.ncols()))]
fn decompose(mut a: Matrix) -> Result<Factors> {
    let (m, n) = (a.nrows(), a.ncols());
    if m < n {
        a.data.resize(n * n, 0.);
        a.nrows = n;
    }

    let mut w = vec![0.; n];
    let mut v = Matrix::new(n, n);
    bidiagonalize_and_diagonalize(&mut a, &mut w, &mut v)?;

    a.data.truncate(m * n);
    a.nrows = m;

    let mut f = Factors {
        u: a,
        w,
        v,
        threshold: 0.,
        inverse: None,
    };
    reorder(&mut f);

    // a wide matrix has at least n - m zero singular values; drop the round-off
    if m < n {
        f.w[m..].fill(0.);
    }

    let w_max = f.w.first().copied().unwrap_or(0.);
    f.threshold = 0.5 * ((m + n + 1) as f64).sqrt() * w_max * f64::EPSILON;
    Ok(f)
}

/// Overwrite the `m × n` matrix `u` (with `m >= n`) by the left singular vectors, and
/// fill `w` and `v`. The singular values are neither sorted nor signed consistently.
fn bidiagonalize_and_diagonalize(u: &mut Matrix, w: &mut [f64], v: &mut Matrix) -> Result<()> {
    let (m, n) = (u.nrows(), u.ncols());
    let eps = f64::EPSILON;
    let mut rv1 = vec![0.; n];

    // Householder reduction to bidiagonal form
    let (mut g, mut scale, mut anorm) = (0f64, 0f64, 0f64);
    for i in 0..n {
        let l = i + 1;
        rv1[i] = scale * g;
        g = 0.;
        scale = 0.;
        let mut s = 0.;

        if i < m {
            scale = (i..m).map(|k| u[(k, i)].abs()).sum();
            if scale != 0. {
                for k in i..m {
                    u[(k, i)] /= scale;
                    s += u[(k, i)] * u[(k, i)];
                }
                let f = u[(i, i)];
                g = -sign(s.sqrt(), f);
                let h = f * g - s;
                u[(i, i)] = f - g;
                for j in l..n {
                    let s: f64 = (i..m).map(|k| u[(k, i)] * u[(k, j)]).sum();
                    let f = s / h;
                    for k in i..m {
                        let uki = u[(k, i)];
                        u[(k, j)] += f * uki;
                    }
                }
                for k in i..m {
                    u[(k, i)] *= scale;
                }
            }
        }

        w[i] = scale * g;
        g = 0.;
        scale = 0.;
        s = 0.;

        if i < m && i + 1 != n {
            scale = (l..n).map(|k| u[(i, k)].abs()).sum();
            if scale != 0. {
                for k in l..n {
                    u[(i, k)] /= scale;
                    s += u[(i, k)] * u[(i, k)];
                }
                let f = u[(i, l)];
                g = -sign(s.sqrt(), f);
                let h = f * g - s;
                u[(i, l)] = f - g;
                for k in l..n {
                    rv1[k] = u[(i, k)] / h;
                }
                for j in l..m {
                    let s: f64 = (l..n).map(|k| u[(j, k)] * u[(i, k)]).sum();
                    for k in l..n {
                        u[(j, k)] += s * rv1[k];
                    }
                }
                for k in l..n {
                    u[(i, k)] *= scale;
                }
            }
        }

        anorm = anorm.max(w[i].abs() + rv1[i].abs());
    }

    // accumulation of the right-hand transformations
    for i in (0..n).rev() {
        let l = i + 1;
        if i + 1 < n {
            if g != 0. {
                // double division to avoid possible underflow
                for j in l..n {
                    v[(j, i)] = (u[(i, j)] / u[(i, l)]) / g;
                }
                for j in l..n {
                    let s: f64 = (l..n).map(|k| u[(i, k)] * v[(k, j)]).sum();
                    for k in l..n {
                        let vki = v[(k, i)];
                        v[(k, j)] += s * vki;
                    }
                }
            }
            for j in l..n {
                v[(i, j)] = 0.;
                v[(j, i)] = 0.;
            }
        }
        v[(i, i)] = 1.;
        g = rv1[i];
    }

    // accumulation of the left-hand transformations
    for i in (0..m.min(n)).rev() {
        let l = i + 1;
        let mut g = w[i];
        for j in l..n {
            u[(i, j)] = 0.;
        }
        if g != 0. {
            g = 1. / g;
            for j in l..n {
                let s: f64 = (l..m).map(|k| u[(k, i)] * u[(k, j)]).sum();
                let f = (s / u[(i, i)]) * g;
                for k in i..m {
                    let uki = u[(k, i)];
                    u[(k, j)] += f * uki;
                }
            }
            for j in i..m {
                u[(j, i)] *= g;
            }
        } else {
            for j in i..m {
                u[(j, i)] = 0.;
            }
        }
        u[(i, i)] += 1.;
    }

    // diagonalization of the bidiagonal form
    for k in (0..n).rev() {
        let mut its = 0;
        loop {
            // test for splitting
            let mut l = k;
            let mut flag = true;
            loop {
                if l == 0 || rv1[l].abs() <= eps * anorm {
                    flag = false;
                    break;
                }
                if w[l - 1].abs() <= eps * anorm {
                    break;
                }
                l -= 1;
            }

            if flag {
                // cancellation of rv1[l], for l > 0
                let nm = l - 1;
                let (mut c, mut s) = (0., 1.);
                for i in l..=k {
                    let f = s * rv1[i];
                    rv1[i] *= c;
                    if f.abs() <= eps * anorm {
                        break;
                    }
                    let g = w[i];
                    let h = pythag(f, g);
                    w[i] = h;
                    let h = 1. / h;
                    c = g * h;
                    s = -f * h;
                    for j in 0..m {
                        let (y, z) = (u[(j, nm)], u[(j, i)]);
                        u[(j, nm)] = y * c + z * s;
                        u[(j, i)] = z * c - y * s;
                    }
                }
            }

            let z = w[k];
            if l == k {
                // convergence: make the singular value non-negative
                if z < 0. {
                    w[k] = -z;
                    for j in 0..n {
                        v[(j, k)] = -v[(j, k)];
                    }
                }
                debug!("Singular value {} converged after {} sweeps", k, its);
                break;
            }

            if its + 1 == MAX_ITERATIONS {
                debug!("No convergence for singular value {}", k);
                return Err(LinAlgError::ConvergenceFailure {
                    iterations: MAX_ITERATIONS,
                });
            }
            its += 1;

            // shift from the bottom 2 × 2 minor
            let mut x = w[l];
            let nm = k - 1;
            let mut y = w[nm];
            let mut g = rv1[nm];
            let mut h = rv1[k];
            let mut f = ((y - z) * (y + z) + (g - h) * (g + h)) / (2. * h * y);
            g = pythag(f, 1.);
            f = ((x - z) * (x + z) + h * ((y / (f + sign(g, f))) - h)) / x;

            // next QR transformation
            let (mut c, mut s) = (1., 1.);
            for j in l..=nm {
                let i = j + 1;
                g = rv1[i];
                y = w[i];
                h = s * g;
                g *= c;
                let mut z = pythag(f, h);
                rv1[j] = z;
                c = f / z;
                s = h / z;
                f = x * c + g * s;
                g = g * c - x * s;
                h = y * s;
                y *= c;
                for jj in 0..n {
                    let (x, z) = (v[(jj, j)], v[(jj, i)]);
                    v[(jj, j)] = x * c + z * s;
                    v[(jj, i)] = z * c - x * s;
                }
                z = pythag(f, h);
                w[j] = z;
                // the rotation can be arbitrary if z is zero
                if z != 0. {
                    z = 1. / z;
                    c = f * z;
                    s = h * z;
                }
                f = c * g + s * y;
                x = c * y - s * g;
                for jj in 0..m {
                    let (y, z) = (u[(jj, j)], u[(jj, i)]);
                    u[(jj, j)] = y * c + z * s;
                    u[(jj, i)] = z * c - y * s;
                }
            }
            rv1[l] = 0.;
            rv1[k] = f;
            w[k] = x;
        }
    }

    Ok(())
}

/// Sort the singular values descending, together with the columns of `U` and `V`,
/// and flip the signs of column pairs so that most entries are non-negative.
fn reorder(f: &mut Factors) {
    let (m, n) = (f.u.nrows(), f.v.nrows());
    let mut su = vec![0.; m];
    let mut sv = vec![0.; n];

    // Shell sort with increments 1, 4, 13, ...
    let mut inc = 1;
    while inc <= n {
        inc = inc * 3 + 1;
    }
    loop {
        inc /= 3;
        for i in inc..n {
            let sw = f.w[i];
            for (k, x) in su.iter_mut().enumerate() {
                *x = f.u[(k, i)];
            }
            for (k, x) in sv.iter_mut().enumerate() {
                *x = f.v[(k, i)];
            }

            let mut j = i;
            while f.w[j - inc] < sw {
                f.w[j] = f.w[j - inc];
                for k in 0..m {
                    f.u[(k, j)] = f.u[(k, j - inc)];
                }
                for k in 0..n {
                    f.v[(k, j)] = f.v[(k, j - inc)];
                }
                j -= inc;
                if j < inc {
                    break;
                }
            }

            f.w[j] = sw;
            for k in 0..m {
                f.u[(k, j)] = su[k];
            }
            for k in 0..n {
                f.v[(k, j)] = sv[k];
            }
        }

        if inc <= 1 {
            break;
        }
    }

    for k in 0..n {
        let negative = (0..m).filter(|&i| f.u[(i, k)] < 0.).count()
            + (0..n).filter(|&j| f.v[(j, k)] < 0.).count();
        if negative > (m + n) / 2 {
            for i in 0..m {
                f.u[(i, k)] = -f.u[(i, k)];
            }
            for j in 0..n {
                f.v[(j, k)] = -f.v[(j, k)];
            }
        }
    }
}

#[cfg(test)]
mod test {
    use rand::{rngs::StdRng, SeedableRng};

    use crate::{
        error::LinAlgError,
        solvers::{LinearSolver, SvDecomposition},
        tensors::{matrix::Matrix, vector::Vector},
    };

    fn reconstruct(svd: &SvDecomposition) -> Matrix {
        let w = Matrix::eye(svd.singular_values().unwrap());
        &(&svd.u().unwrap() * &w) * &svd.v().unwrap().transpose()
    }

    fn check_decomposition(a: &Matrix) {
        let svd = SvDecomposition::with_matrix(a).unwrap();
        assert!(reconstruct(&svd).approx_eq(a, 1e-12));

        let w = svd.singular_values().unwrap();
        assert!(w.iter().all(|x| *x >= 0.));
        assert!(w.windows(2).all(|p| p[0] >= p[1]));

        let v = svd.v().unwrap();
        assert!((&v.transpose() * &v).approx_eq(&Matrix::identity(a.ncols()), 1e-12));
    }

    #[test]
    fn decompose() {
        let mut rng = StdRng::seed_from_u64(7);
        check_decomposition(&Matrix::sample(5, 3, &mut rng, (-1., 1.)));
        check_decomposition(&Matrix::sample(4, 4, &mut rng, (-10., 10.)));
        check_decomposition(&Matrix::sample(2, 5, &mut rng, (-1., 1.)));

        let a = Matrix::sample(6, 4, &mut rng, (-1., 1.));
        let u = SvDecomposition::with_matrix(&a).unwrap().u().unwrap();
        assert!((&u.transpose() * &u).approx_eq(&Matrix::identity(4), 1e-12));
    }

    #[test]
    fn solve() {
        let a = Matrix::from_nested_vec(vec![vec![2., 3., 4.], vec![3., 4., 5.], vec![1., -2., 2.]])
            .unwrap();
        let mut svd = SvDecomposition::with_matrix(&a).unwrap();
        let x = svd.solve_vector(&Vector::from(vec![20., 26., 3.])).unwrap();
        assert!(x.approx_eq(&Vector::from(vec![1., 2., 3.]), 1e-12));
        assert_eq!(svd.rank().unwrap(), 3);
        assert_eq!(svd.nullity().unwrap(), 0);
        assert_eq!(svd.null_space().unwrap().ncols(), 0);
    }

    #[test]
    fn least_squares() {
        // fit y = c0 + c1 * t through points on the line y = 1 + 2t
        let a = Matrix::from_nested_vec(vec![vec![1., 0.], vec![1., 1.], vec![1., 2.], vec![1., 3.]])
            .unwrap();
        let b = Matrix::new_column(vec![1., 3., 5., 7.]);

        let mut svd = SvDecomposition::with_matrix(&a).unwrap();
        let x = svd.solve(&b).unwrap();
        assert!(x.approx_eq(&Matrix::new_column(vec![1., 2.]), 1e-12));

        let mut y = b.clone();
        svd.solve_in_place(&mut y).unwrap();
        assert_eq!((y.nrows(), y.ncols()), (2, 1));
    }

    #[test]
    fn minimum_norm() {
        let a = Matrix::from_nested_vec(vec![vec![1., 1.]]).unwrap();
        let mut svd = SvDecomposition::with_matrix(&a).unwrap();
        let x = svd.solve_vector(&Vector::from(vec![2.])).unwrap();
        assert!(x.approx_eq(&Vector::from(vec![1., 1.]), 1e-12));
        assert_eq!(svd.rank().unwrap(), 1);
        assert_eq!(svd.nullity().unwrap(), 1);

        let inv = svd.inverse().unwrap();
        assert!(inv.approx_eq(&Matrix::new_column(vec![0.5, 0.5]), 1e-12));
    }

    #[test]
    fn rank_deficient() {
        let a = Matrix::from_nested_vec(vec![vec![1., 2., 4.], vec![1., 2., 4.], vec![4., 2., 8.]])
            .unwrap();
        let mut svd = SvDecomposition::with_matrix(&a).unwrap();

        assert_eq!(svd.rank().unwrap(), 2);
        assert_eq!(svd.nullity().unwrap(), 1);
        assert_eq!(svd.range().unwrap().ncols(), 2);

        let null = svd.null_space().unwrap();
        assert_eq!((null.nrows(), null.ncols()), (3, 1));
        assert!((&a * &null).max_abs() < 1e-12);
        assert!((null.norm_squared() - 1.).abs() < 1e-12);

        // A * A⁺ * A = A
        let inv = svd.inverse().unwrap();
        assert!((&(&a * &inv) * &a).approx_eq(&a, 1e-12));

        assert!(svd.inverse_condition().unwrap() < 1e-15);
        assert_eq!(
            SvDecomposition::with_matrix(&Matrix::new(2, 2))
                .unwrap()
                .inverse_condition()
                .unwrap(),
            0.
        );
    }

    #[test]
    fn threshold_boundary() {
        // with a largest singular value of one, the default threshold for a 2 × 2 matrix
        let t = 0.5 * 5f64.sqrt() * 1. * f64::EPSILON;

        let svd = SvDecomposition::with_matrix(&Matrix::eye(&[1., t])).unwrap();
        assert_eq!(svd.threshold().unwrap(), t);
        assert_eq!(svd.singular_values().unwrap(), &[1., t]);
        assert_eq!(svd.rank().unwrap(), 1);
        assert_eq!(svd.nullity().unwrap(), 1);

        let above = f64::from_bits(t.to_bits() + 1);
        let svd = SvDecomposition::with_matrix(&Matrix::eye(&[1., above])).unwrap();
        assert_eq!(svd.rank().unwrap(), 2);

        assert_eq!(svd.rank_with_threshold(0.5).unwrap(), 1);
        assert_eq!(svd.nullity_with_threshold(0.5).unwrap(), 1);
        assert_eq!(svd.range_with_threshold(0.5).unwrap().ncols(), 1);
        assert_eq!(svd.null_space_with_threshold(0.5).unwrap().ncols(), 1);
        assert!(svd.rank_with_threshold(f64::NAN).unwrap_err().is_invalid_argument());
    }

    #[test]
    fn explicit_threshold() {
        let svd = SvDecomposition::with_matrix(&Matrix::eye(&[4., 1e-3])).unwrap();
        let b = Matrix::new_column(vec![4., 1.]);

        let x = svd.solve_with_threshold(&b, 0.).unwrap();
        assert!(x.approx_eq(&Matrix::new_column(vec![1., 1000.]), 1e-9));

        let x = svd.solve_with_threshold(&b, 1e-2).unwrap();
        assert!(x.approx_eq(&Matrix::new_column(vec![1., 0.]), 1e-12));

        let mut y = b.clone();
        svd.solve_in_place_with_threshold(&mut y, 1e-2).unwrap();
        assert_eq!(x, y);

        let inv = svd.inverse_with_threshold(1e-2).unwrap();
        assert!(inv.approx_eq(&Matrix::eye(&[0.25, 0.]), 1e-12));

        assert!((svd.inverse_condition().unwrap() - 2.5e-4).abs() < 1e-15);
    }

    #[test]
    fn negative_threshold_selects_default() {
        let t = 0.5 * 5f64.sqrt() * 1. * f64::EPSILON;
        let svd = SvDecomposition::with_matrix(&Matrix::eye(&[1., t])).unwrap();
        let b = Matrix::new_column(vec![1., 1.]);

        assert_eq!(
            svd.solve_with_threshold(&b, -1.).unwrap(),
            svd.solve_with_threshold(&b, t).unwrap()
        );
        assert_eq!(svd.rank_with_threshold(-1.).unwrap(), 1);
        assert_eq!(svd.nullity_with_threshold(-0.5).unwrap(), 1);
        assert_eq!(svd.null_space_with_threshold(-1.).unwrap().ncols(), 1);
        assert_eq!(
            svd.inverse_with_threshold(-1.).unwrap(),
            svd.inverse_with_threshold(t).unwrap()
        );

        assert!(svd
            .solve_with_threshold(&b, f64::NAN)
            .unwrap_err()
            .is_invalid_argument());
    }

    #[test]
    fn convergence_failure() {
        let a = Matrix::from_nested_vec(vec![vec![f64::NAN, 1.], vec![1., 1.]]).unwrap();
        let mut svd = SvDecomposition::new();
        assert_eq!(
            svd.initialize(&a).unwrap_err(),
            LinAlgError::ConvergenceFailure { iterations: 30 }
        );
        assert!(matches!(
            svd.rank(),
            Err(LinAlgError::ConvergenceFailure { .. })
        ));
        assert!(svd.inverse().is_err());

        svd.initialize(&Matrix::identity(2)).unwrap();
        assert_eq!(svd.rank().unwrap(), 2);
    }

    #[test]
    fn invalid() {
        let mut svd = SvDecomposition::new();
        assert_eq!(
            svd.rank().unwrap_err(),
            LinAlgError::OperationInvalid("no matrix was supplied")
        );

        svd.initialize(&Matrix::identity(2)).unwrap();
        assert!(svd
            .solve(&Matrix::new(3, 1))
            .unwrap_err()
            .is_invalid_argument());
    }
}
