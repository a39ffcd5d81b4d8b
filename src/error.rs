//! Errors raised by the matrix storage and the linear solvers.

use thiserror::Error;

/// Result type alias using [`LinAlgError`].
pub type Result<T> = std::result::Result<T, LinAlgError>;

/// Errors that can occur when constructing, indexing or decomposing matrices.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LinAlgError {
    /// An argument has the wrong shape or is otherwise unusable.
    #[error("Invalid argument: {reason}")]
    InvalidArgument { reason: String },

    /// An index lies outside of the matrix or vector.
    #[error("Index {index:?} out of range for bounds {bounds:?}")]
    OutOfRange {
        index: (usize, usize),
        bounds: (usize, usize),
    },

    /// A pivot or diagonal entry is exactly zero, so the matrix cannot be
    /// eliminated or decomposed.
    #[error("The matrix is singular")]
    SingularMatrix,

    /// The singular value decomposition did not converge.
    #[error("No convergence in {iterations} singular value decomposition iterations")]
    ConvergenceFailure { iterations: usize },

    /// The operation is not valid in the current state of the solver.
    #[error("Invalid operation: {0}")]
    OperationInvalid(&'static str),
}

impl LinAlgError {
    pub(crate) fn invalid_argument(reason: impl Into<String>) -> LinAlgError {
        LinAlgError::InvalidArgument {
            reason: reason.into(),
        }
    }

    /// Return true iff the error was caused by a bad argument. A singular matrix
    /// counts as a bad argument as well.
    pub fn is_invalid_argument(&self) -> bool {
        matches!(
            self,
            LinAlgError::InvalidArgument { .. } | LinAlgError::SingularMatrix
        )
    }

    /// Return true iff the error signals a singular matrix.
    pub fn is_singular(&self) -> bool {
        matches!(self, LinAlgError::SingularMatrix)
    }
}

#[cfg(test)]
mod test {
    use super::LinAlgError;

    #[test]
    fn classification() {
        assert!(LinAlgError::SingularMatrix.is_invalid_argument());
        assert!(LinAlgError::SingularMatrix.is_singular());
        assert!(LinAlgError::invalid_argument("not square").is_invalid_argument());
        assert!(!LinAlgError::ConvergenceFailure { iterations: 30 }.is_invalid_argument());
        assert!(!LinAlgError::OperationInvalid("no matrix").is_singular());

        assert_eq!(
            LinAlgError::invalid_argument("not square").to_string(),
            "Invalid argument: not square"
        );
    }
}
