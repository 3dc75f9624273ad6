use thiserror::Error;

/// Error types for the numopt-rs library.
///
/// Solver outcomes (non-convergence, singular Jacobians, bad brackets) are
/// reported in the result records, not here. An `Err` leaving a solver
/// means the caller's own function failed, or it changed the length of its
/// output between calls.
#[derive(Error, Debug)]
pub enum NumOptError {
    /// Error indicating a mismatch in vector or matrix dimensions.
    #[error("Dimension mismatch: {0}")]
    DimensionMismatch(String),

    /// Error indicating a singular matrix was encountered.
    #[error("Singular matrix encountered")]
    SingularMatrix,

    /// Error raised by a caller-supplied function.
    #[error("Function evaluation error: {0}")]
    FunctionEvaluation(String),

    /// Invalid input data.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Generic error for cases that don't fit the other categories.
    #[error("Error: {0}")]
    Other(String),
}

/// Result type alias for numopt-rs operations.
pub type Result<T> = std::result::Result<T, NumOptError>;

/// Extensions for converting from other error types.
impl From<String> for NumOptError {
    fn from(s: String) -> Self {
        NumOptError::Other(s)
    }
}

impl From<&str> for NumOptError {
    fn from(s: &str) -> Self {
        NumOptError::Other(s.to_string())
    }
}
