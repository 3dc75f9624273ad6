//! Utility functions and helpers for the numopt-rs library.

pub mod finite_difference;
pub mod linalg;

// Re-export commonly used utilities
pub use finite_difference::{derivative, jacobian, SQRT_EPSILON};
pub use linalg::{invert, solve, PIVOT_TOLERANCE};

/// Euclidean norm of a vector.
pub(crate) fn norm(v: &ndarray::Array1<f64>) -> f64 {
    v.dot(v).sqrt()
}
