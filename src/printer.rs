use std::fmt::{self, Write};

use crate::tensors::{matrix::Matrix, vector::Vector};

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum PrintMode {
    /// One row per line, entries separated by spaces.
    Rows,
    /// Nested braces, e.g. `{{1,2},{3,4}}`.
    Mathematica,
}

/// Options that control how matrices and vectors are printed.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct PrintOptions {
    pub mode: PrintMode,
    /// The number of digits after the decimal point, or `None` for the
    /// shortest representation that round-trips.
    pub precision: Option<usize>,
}

impl Default for PrintOptions {
    fn default() -> Self {
        PrintOptions {
            mode: PrintMode::Mathematica,
            precision: None,
        }
    }
}

impl PrintOptions {
    pub fn rows() -> PrintOptions {
        PrintOptions {
            mode: PrintMode::Rows,
            ..Default::default()
        }
    }

    pub fn with_precision(self, precision: usize) -> PrintOptions {
        PrintOptions {
            precision: Some(precision),
            ..self
        }
    }
}

fn fmt_entry(x: f64, opts: &PrintOptions, f: &mut fmt::Formatter) -> fmt::Result {
    match opts.precision {
        Some(p) => write!(f, "{:.*}", p, x),
        None => write!(f, "{}", x),
    }
}

fn fmt_row(row: &[f64], opts: &PrintOptions, f: &mut fmt::Formatter) -> fmt::Result {
    let sep = match opts.mode {
        PrintMode::Rows => ' ',
        PrintMode::Mathematica => ',',
    };

    if opts.mode == PrintMode::Mathematica {
        f.write_char('{')?;
    }
    for (ci, c) in row.iter().enumerate() {
        if ci > 0 {
            f.write_char(sep)?;
        }
        fmt_entry(*c, opts, f)?;
    }
    if opts.mode == PrintMode::Mathematica {
        f.write_char('}')?;
    }
    Ok(())
}

pub struct MatrixPrinter<'a> {
    pub matrix: &'a Matrix,
    pub opts: PrintOptions,
}

impl<'a> MatrixPrinter<'a> {
    pub fn new(matrix: &'a Matrix) -> MatrixPrinter<'a> {
        MatrixPrinter {
            matrix,
            opts: PrintOptions::default(),
        }
    }

    pub fn new_with_options(matrix: &'a Matrix, opts: PrintOptions) -> MatrixPrinter<'a> {
        MatrixPrinter { matrix, opts }
    }
}

impl fmt::Display for MatrixPrinter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let nrows = self.matrix.nrows();
        match self.opts.mode {
            PrintMode::Mathematica => {
                f.write_char('{')?;
                for r in 0..nrows {
                    fmt_row(&self.matrix[r], &self.opts, f)?;
                    if r + 1 < nrows {
                        f.write_char(',')?;
                    }
                }
                f.write_char('}')
            }
            PrintMode::Rows => {
                for r in 0..nrows {
                    fmt_row(&self.matrix[r], &self.opts, f)?;
                    if r + 1 < nrows {
                        f.write_char('\n')?;
                    }
                }
                Ok(())
            }
        }
    }
}

pub struct VectorPrinter<'a> {
    pub vector: &'a Vector,
    pub opts: PrintOptions,
}

impl<'a> VectorPrinter<'a> {
    pub fn new(vector: &'a Vector) -> VectorPrinter<'a> {
        VectorPrinter {
            vector,
            opts: PrintOptions::default(),
        }
    }

    pub fn new_with_options(vector: &'a Vector, opts: PrintOptions) -> VectorPrinter<'a> {
        VectorPrinter { vector, opts }
    }
}

impl fmt::Display for VectorPrinter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt_row(self.vector.as_slice(), &self.opts, f)
    }
}
