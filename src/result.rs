//! Vocabulary shared by every result record.
//!
//! Each algorithm family returns its own record type; this trait exposes
//! the fields they have in common so callers (and a host binding) can treat
//! them uniformly.

use ndarray::{Array1, Array2};
use serde::{Serialize, Serializer};

use crate::error::Result;

/// Message reported when a solver terminates normally.
pub const MSG_SUCCESS: &str = "Optimization terminated successfully.";

/// Message reported when the iteration budget runs out.
pub const MSG_MAX_ITERATIONS: &str = "Maximum iterations reached";

/// Row-major nested vectors of a matrix.
pub(crate) fn rows(matrix: &Array2<f64>) -> Vec<Vec<f64>> {
    matrix.outer_iter().map(|row| row.to_vec()).collect()
}

/// Writes a vector as a plain sequence of numbers.
pub(crate) fn serialize_vector<S: Serializer>(
    vector: &Array1<f64>,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    serializer.collect_seq(vector.iter())
}

/// Writes a matrix as a sequence of rows.
pub(crate) fn serialize_matrix<S: Serializer>(
    matrix: &Array2<f64>,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    rows(matrix).serialize(serializer)
}

/// Writes an optional matrix as a sequence of rows, or `null`.
pub(crate) fn serialize_optional_matrix<S: Serializer>(
    matrix: &Option<Array2<f64>>,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    matrix.as_ref().map(rows).serialize(serializer)
}

/// Common accessors of an optimization result record.
pub trait OptimizeResult: Serialize {
    /// Number of evaluations of the caller's function.
    fn nfev(&self) -> usize;

    /// Number of iterations performed.
    fn nit(&self) -> usize;

    /// Whether the solver met its convergence criteria.
    fn success(&self) -> bool;

    /// Human-readable termination message.
    fn message(&self) -> String;

    /// Serialize the record to a JSON string.
    fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}
