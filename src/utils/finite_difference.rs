//! Finite difference methods for numerical differentiation.
//!
//! This module provides the derivative approximations shared by the Newton
//! solvers and the Levenberg-Marquardt algorithm.

use crate::error::Result;
use crate::problem::{eval_checked, Problem};
use ndarray::{Array1, Array2};

/// Square root of the machine epsilon for `f64`.
pub const SQRT_EPSILON: f64 = 1.490_116_119_384_765_6e-8;

/// Step used by [`derivative`] at `x`: `sqrt(eps) * max(|x|, 1)`.
pub fn symmetric_step(x: f64) -> f64 {
    SQRT_EPSILON * x.abs().max(1.0)
}

/// Compute the derivative of a scalar function using a symmetric difference.
///
/// Evaluates `f` exactly twice, at `x ± h` with `h = sqrt(eps) * max(|x|, 1)`.
///
/// # Arguments
///
/// * `f` - The function to differentiate
/// * `x` - The point at which to evaluate the derivative
///
/// # Returns
///
/// * `Result<f64>` - The derivative estimate, or the error raised by `f`
pub fn derivative<F>(f: &F, x: f64) -> Result<f64>
where
    F: Fn(f64) -> Result<f64> + ?Sized,
{
    let h = symmetric_step(x);
    let forward = f(x + h)?;
    let backward = f(x - h)?;
    Ok((forward - backward) / (2.0 * h))
}

/// Compute the Jacobian matrix using forward finite differences.
///
/// The Jacobian is the matrix of partial derivatives of the residuals with
/// respect to the parameters: J[i,j] = ∂residual[i]/∂param[j]. Every column
/// uses the same absolute `step`, and `residuals` must be the value of
/// `problem` at `params`, so exactly `params.len()` evaluations are made.
///
/// # Arguments
///
/// * `problem` - The problem to evaluate
/// * `params` - The parameter values at which to evaluate the Jacobian
/// * `residuals` - The residuals already evaluated at `params`
/// * `step` - The forward-difference step
///
/// # Returns
///
/// * `Result<Array2<f64>>` - The `k × n` Jacobian matrix
pub fn jacobian<P>(
    problem: &P,
    params: &Array1<f64>,
    residuals: &Array1<f64>,
    step: f64,
) -> Result<Array2<f64>>
where
    P: Problem + ?Sized,
{
    let n_params = params.len();
    let n_residuals = residuals.len();
    let mut jac = Array2::zeros((n_residuals, n_params));

    for j in 0..n_params {
        let mut params_perturbed = params.clone();
        params_perturbed[j] += step;

        let residuals_perturbed = eval_checked(problem, &params_perturbed, n_residuals)?;

        let mut column = jac.column_mut(j);
        for i in 0..n_residuals {
            column[i] = (residuals_perturbed[i] - residuals[i]) / step;
        }
    }

    Ok(jac)
}
