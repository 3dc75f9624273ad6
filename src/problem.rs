//! Residual function trait.
//!
//! This module defines the `Problem` trait, which represents a vector-valued
//! function ℝⁿ → ℝᵏ. It is the input of the multivariate root finder
//! (where k = n) and of the Levenberg-Marquardt least-squares solver.
//! Any closure `Fn(&Array1<f64>) -> Result<Array1<f64>>` is a `Problem`.

use crate::error::{NumOptError, Result};
use ndarray::Array1;

/// A vector-valued function of a parameter vector.
///
/// Implementations are expected to be deterministic for a given input. The
/// solvers call `eval` synchronously and never keep the problem past the
/// end of a call.
pub trait Problem {
    /// Evaluate the residuals at the given parameters.
    ///
    /// # Arguments
    ///
    /// * `params` - The parameter values at which to evaluate the residuals
    ///
    /// # Returns
    ///
    /// * A vector of residuals, or an error if the evaluation fails. Errors
    ///   are propagated unchanged out of the solver.
    fn eval(&self, params: &Array1<f64>) -> Result<Array1<f64>>;

    /// Evaluate the least-squares cost `½‖r(x)‖²` at the given parameters.
    fn eval_cost(&self, params: &Array1<f64>) -> Result<f64> {
        let residuals = self.eval(params)?;
        Ok(half_squared_norm(&residuals))
    }
}

impl<F> Problem for F
where
    F: Fn(&Array1<f64>) -> Result<Array1<f64>>,
{
    fn eval(&self, params: &Array1<f64>) -> Result<Array1<f64>> {
        self(params)
    }
}

/// `½‖r‖²`
pub(crate) fn half_squared_norm(residuals: &Array1<f64>) -> f64 {
    0.5 * residuals.dot(residuals)
}

/// Evaluate `problem` and check that it returned `expected` values.
///
/// Solvers fix the residual length from the first evaluation; a function
/// whose output length changes afterwards is a caller bug.
pub(crate) fn eval_checked<P: Problem + ?Sized>(
    problem: &P,
    params: &Array1<f64>,
    expected: usize,
) -> Result<Array1<f64>> {
    let values = problem.eval(params)?;
    if values.len() != expected {
        return Err(NumOptError::DimensionMismatch(format!(
            "Expected {} residuals, got {}",
            expected,
            values.len()
        )));
    }
    Ok(values)
}
