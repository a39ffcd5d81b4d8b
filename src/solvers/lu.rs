//! LU decomposition using Crout's algorithm with scaled partial pivoting.

use smallvec::SmallVec;
use tracing::{debug, instrument, warn};

use crate::{
    error::{LinAlgError, Result},
    solvers::{check_square, check_values, LinearSolver},
    tensors::matrix::Matrix,
};

/// The value that replaces a zero pivot under [ZeroPivot::Substitute] by default.
pub const TINY: f64 = 1.0e-40;

/// What to do when the pivot of a column is exactly zero, even after pivoting.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ZeroPivot {
    /// Replace the pivot by the given tiny value and continue. Round-off that produced
    /// an exact zero no longer aborts the decomposition, at the price of an inaccurate
    /// (but finite) answer when the matrix is truly singular.
    /// The value must be positive and finite.
    Substitute(f64),
    /// Fail with [LinAlgError::SingularMatrix].
    Fail,
}

impl Default for ZeroPivot {
    fn default() -> Self {
        ZeroPivot::Substitute(TINY)
    }
}

/// Options for the [LuDecomposition].
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct LuOptions {
    pub zero_pivot: ZeroPivot,
}

impl LuOptions {
    fn check(&self) -> Result<()> {
        match self.zero_pivot {
            ZeroPivot::Substitute(tiny) if !(tiny > 0. && tiny.is_finite()) => {
                Err(LinAlgError::invalid_argument(format!(
                    "The zero pivot substitute must be positive and finite instead of {}",
                    tiny
                )))
            }
            _ => Ok(()),
        }
    }
}

#[derive(Clone, Debug)]
struct Factors {
    /// `L` below the diagonal with an implicit unit diagonal, `U` on and above it.
    lu: Matrix,
    /// Row `k` was swapped with row `permutation[k]` in step `k`.
    permutation: SmallVec<[usize; 16]>,
    /// `1.` for an even number of row swaps, `-1.` for an odd number.
    parity: f64,
    inverse: Option<Matrix>,
}

#[derive(Clone, Debug)]
enum State {
    Uninitialized,
    Initialized(Matrix),
    Decomposed(Factors),
    Singular,
}

/// The LU decomposition of a square matrix, `P * A = L * U`.
///
/// The decomposition is computed on first use and reused for all subsequent
/// solves, determinants and inverses.
///
/// A row of zeroes makes the decomposition fail with [LinAlgError::SingularMatrix].
/// A pivot that is exactly zero after pivoting is handled according to
/// [LuOptions::zero_pivot]; by default it is replaced by [TINY].
#[derive(Clone, Debug)]
pub struct LuDecomposition {
    state: State,
    options: LuOptions,
}

impl Default for LuDecomposition {
    fn default() -> Self {
        LuDecomposition::new()
    }
}

impl LuDecomposition {
    /// Create a decomposition without a matrix.
    pub fn new() -> LuDecomposition {
        LuDecomposition::with_options(LuOptions::default())
    }

    /// Create a decomposition without a matrix using the options `options`.
    pub fn with_options(options: LuOptions) -> LuDecomposition {
        LuDecomposition {
            state: State::Uninitialized,
            options,
        }
    }

    /// Create a decomposition of the square matrix `coefficients`.
    pub fn with_matrix(coefficients: &Matrix) -> Result<LuDecomposition> {
        let mut lu = LuDecomposition::new();
        lu.initialize(coefficients)?;
        Ok(lu)
    }

    pub fn options(&self) -> &LuOptions {
        &self.options
    }

    /// Store a copy of `coefficients` to be decomposed on first use.
    /// All previously cached results are discarded.
    pub fn initialize(&mut self, coefficients: &Matrix) -> Result<()> {
        check_square(coefficients)?;
        self.options.check()?;
        self.state = State::Initialized(coefficients.clone());
        Ok(())
    }

    /// Take ownership of `coefficients` and decompose it in-place on first use.
    pub fn initialize_owned(&mut self, coefficients: Matrix) -> Result<()> {
        check_square(&coefficients)?;
        self.options.check()?;
        self.state = State::Initialized(coefficients);
        Ok(())
    }

    /// Return true iff the matrix has already been decomposed.
    pub fn is_decomposed(&self) -> bool {
        matches!(self.state, State::Decomposed(_))
    }

    /// Decompose the matrix if that has not happened yet.
    pub fn ensure_decomposition(&mut self) -> Result<()> {
        self.factors().map(|_| ())
    }

    fn factors(&mut self) -> Result<&mut Factors> {
        if let State::Initialized(_) = self.state {
            let State::Initialized(mut m) = std::mem::replace(&mut self.state, State::Singular)
            else {
                unreachable!()
            };

            let factors = decompose(&mut m, self.options.zero_pivot)?;
            self.state = State::Decomposed(factors);
        }

        match &mut self.state {
            State::Decomposed(f) => Ok(f),
            State::Uninitialized => Err(LinAlgError::OperationInvalid(
                "no coefficient matrix was supplied",
            )),
            State::Singular => Err(LinAlgError::SingularMatrix),
            State::Initialized(_) => unreachable!(),
        }
    }

    /// Get the packed `L` and `U` factors of the row-permuted matrix.
    /// The unit diagonal of `L` is not stored.
    pub fn lu(&mut self) -> Result<Matrix> {
        Ok(self.factors()?.lu.clone())
    }

    /// Compute the determinant of the matrix.
    pub fn determinant(&mut self) -> Result<f64> {
        let f = self.factors()?;
        let n = f.lu.nrows();
        Ok((0..n).fold(f.parity, |d, i| d * f.lu[(i, i)]))
    }

    /// Compute the natural logarithm of the absolute value of the determinant,
    /// together with a flag that is true iff the determinant is negative.
    /// This does not overflow for large matrices.
    pub fn log_determinant(&mut self) -> Result<(f64, bool)> {
        let f = self.factors()?;
        let mut negative = f.parity < 0.;
        let mut log = 0.;
        for i in 0..f.lu.nrows() {
            let d = f.lu[(i, i)];
            if d < 0. {
                negative = !negative;
            }
            log += d.abs().ln();
        }
        Ok((log, negative))
    }

    /// Improve `solution` of `A * X = values` by one step of iterative refinement.
    ///
    /// `original` must be the matrix this decomposition was created from, unchanged.
    /// Only its shape is checked.
    pub fn refine_solution(
        &mut self,
        original: &Matrix,
        values: &Matrix,
        solution: &mut Matrix,
    ) -> Result<()> {
        let f = self.factors()?;
        let n = f.lu.nrows();

        if original.nrows() != n || original.ncols() != n {
            return Err(LinAlgError::invalid_argument(
                "The original matrix does not match the decomposition",
            ));
        }
        check_values(n, values)?;
        if solution.nrows() != n || solution.ncols() != values.ncols() {
            return Err(LinAlgError::invalid_argument(
                "The solution does not match the shape of the values",
            ));
        }

        // the residual A * x - b
        let mut residual = Matrix::new(n, values.ncols());
        for i in 0..n {
            for c in 0..values.ncols() {
                let mut sdp = -values[(i, c)];
                for j in 0..n {
                    sdp += original[(i, j)] * solution[(j, c)];
                }
                residual[(i, c)] = sdp;
            }
        }

        f.solve_in_place(&mut residual);
        *solution -= &residual;
        Ok(())
    }
}

impl Factors {
    fn solve_in_place(&self, values: &mut Matrix) {
        let n = self.lu.nrows();
        let mut b: SmallVec<[f64; 16]> = SmallVec::from_elem(0., n);

        for c in 0..values.ncols() {
            for (i, x) in b.iter_mut().enumerate() {
                *x = values[(i, c)];
            }

            // forward substitution, skipping the leading zeroes of the permuted right-hand side
            let mut first_non_zero = None;
            for i in 0..n {
                let ip = self.permutation[i];
                let mut sum = b[ip];
                b[ip] = b[i];
                if let Some(ii) = first_non_zero {
                    for j in ii..i {
                        sum -= self.lu[(i, j)] * b[j];
                    }
                } else if sum != 0. {
                    first_non_zero = Some(i);
                }
                b[i] = sum;
            }

            for i in (0..n).rev() {
                let mut sum = b[i];
                for j in i + 1..n {
                    sum -= self.lu[(i, j)] * b[j];
                }
                b[i] = sum / self.lu[(i, i)];
            }

            for (i, x) in b.iter().enumerate() {
                values[(i, c)] = *x;
            }
        }
    }
}

#[instrument(level = "debug", skip_all, fields(n = m.nrows()))]
fn decompose(m: &mut Matrix, zero_pivot: ZeroPivot) -> Result<Factors> {
    let n = m.nrows();

    // implicit scaling of every row
    let mut scale: SmallVec<[f64; 16]> = SmallVec::with_capacity(n);
    for row in m.row_iter().take(n) {
        let big = row.iter().fold(0., |b: f64, x| b.max(x.abs()));
        if big == 0. {
            debug!("Row {} is zero", scale.len());
            return Err(LinAlgError::SingularMatrix);
        }
        scale.push(1. / big);
    }

    let mut permutation: SmallVec<[usize; 16]> = SmallVec::from_elem(0, n);
    let mut parity = 1.;

    for k in 0..n {
        let mut big = 0.;
        let mut imax = k;
        for i in k..n {
            let t = scale[i] * m[(i, k)].abs();
            if t > big {
                big = t;
                imax = i;
            }
        }

        if imax != k {
            m.swap_rows_unchecked(imax, k);
            parity = -parity;
            scale[imax] = scale[k];
        }
        permutation[k] = imax;

        if m[(k, k)] == 0. {
            match zero_pivot {
                ZeroPivot::Substitute(tiny) => {
                    warn!("Zero pivot in column {}: substituting {:e}", k, tiny);
                    m[(k, k)] = tiny;
                }
                ZeroPivot::Fail => {
                    debug!("Zero pivot in column {}", k);
                    return Err(LinAlgError::SingularMatrix);
                }
            }
        }

        let pivot = m[(k, k)];
        for i in k + 1..n {
            let factor = m[(i, k)] / pivot;
            m[(i, k)] = factor;
            if factor == 0. {
                continue;
            }
            for j in k + 1..n {
                let u = m[(k, j)];
                m[(i, j)] -= factor * u;
            }
        }
    }

    Ok(Factors {
        lu: std::mem::take(m),
        permutation,
        parity,
        inverse: None,
    })
}

impl LinearSolver for LuDecomposition {
    fn solve_in_place(&mut self, values: &mut Matrix) -> Result<()> {
        let f = self.factors()?;
        check_values(f.lu.nrows(), values)?;
        f.solve_in_place(values);
        Ok(())
    }

    fn inverse(&mut self) -> Result<Matrix> {
        let f = self.factors()?;
        if let Some(inv) = &f.inverse {
            return Ok(inv.clone());
        }

        let mut inv = Matrix::identity(f.lu.nrows());
        f.solve_in_place(&mut inv);
        f.inverse = Some(inv.clone());
        Ok(inv)
    }
}
