//! Implementation of the Levenberg-Marquardt algorithm.
//!
//! This module contains the core implementation of the Levenberg-Marquardt
//! algorithm for nonlinear least-squares problems, minimizing
//! `cost = ½‖r(x)‖²` for a residual function `r: ℝⁿ → ℝᵏ`.

use ndarray::{Array1, Array2};
use serde::Serialize;
use std::fmt;
use tracing::{debug, trace, warn};

use crate::error::{NumOptError, Result};
use crate::problem::{eval_checked, half_squared_norm, Problem};
use crate::result::{serialize_optional_matrix, serialize_vector, OptimizeResult};
use crate::utils::{finite_difference, norm, SQRT_EPSILON};

use super::config::LmConfig;
use super::convergence::{ConvergenceCriteria, ConvergenceStatus};
use super::step::{LmStep, StepResult};

/// Result of the Levenberg-Marquardt optimization.
#[derive(Debug, Clone, Serialize)]
pub struct LeastSquaresResult {
    /// Optimized parameter values
    #[serde(serialize_with = "serialize_vector")]
    pub x: Array1<f64>,

    /// Residuals at the solution
    #[serde(serialize_with = "serialize_vector")]
    pub fun: Array1<f64>,

    /// Half the sum of squared residuals
    pub cost: f64,

    /// The Jacobian matrix at the solution (if requested), as rows
    #[serde(serialize_with = "serialize_optional_matrix")]
    pub jac: Option<Array2<f64>>,

    /// Damping parameter at termination
    pub lambda: f64,

    /// Number of function evaluations, Jacobian columns included
    pub nfev: usize,

    /// Number of iterations performed, rejected steps included
    pub nit: usize,

    /// Whether the optimization succeeded
    pub success: bool,

    /// A message describing the result
    pub message: String,
}

impl fmt::Display for LeastSquaresResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Optimization Result:")?;
        writeln!(f, "  Success: {}", self.success)?;
        writeln!(f, "  Message: {}", self.message)?;
        writeln!(f, "  Cost: {:.6e}", self.cost)?;
        writeln!(f, "  Iterations: {}", self.nit)?;
        writeln!(f, "  Function evaluations: {}", self.nfev)?;
        writeln!(f, "  Parameters: {:?}", self.x)?;
        Ok(())
    }
}

impl OptimizeResult for LeastSquaresResult {
    fn nfev(&self) -> usize {
        self.nfev
    }

    fn nit(&self) -> usize {
        self.nit
    }

    fn success(&self) -> bool {
        self.success
    }

    fn message(&self) -> String {
        self.message.clone()
    }
}

/// The Levenberg-Marquardt optimizer.
#[derive(Debug, Clone, Default)]
pub struct LevenbergMarquardt {
    /// Configuration options
    config: LmConfig,
}

impl LevenbergMarquardt {
    /// Create a new Levenberg-Marquardt optimizer with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new Levenberg-Marquardt optimizer with the given configuration.
    pub fn with_config(config: LmConfig) -> Self {
        Self { config }
    }

    /// Set the maximum number of iterations.
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.config.max_iterations = max_iterations;
        self
    }

    /// Set the tolerance for the relative reduction in cost.
    pub fn with_ftol(mut self, ftol: f64) -> Self {
        self.config.ftol = ftol;
        self
    }

    /// Set the tolerance for the relative step size.
    pub fn with_xtol(mut self, xtol: f64) -> Self {
        self.config.xtol = xtol;
        self
    }

    /// Set the initial value for the damping parameter.
    pub fn with_lambda(mut self, lambda: f64) -> Self {
        self.config.initial_lambda = lambda;
        self
    }

    /// Set the factor by which to increase lambda.
    pub fn with_lambda_up_factor(mut self, factor: f64) -> Self {
        self.config.lambda_up_factor = factor;
        self
    }

    /// Set the factor by which to decrease lambda.
    pub fn with_lambda_down_factor(mut self, factor: f64) -> Self {
        self.config.lambda_down_factor = factor;
        self
    }

    /// Set the maximum value for lambda.
    pub fn with_max_lambda(mut self, max_lambda: f64) -> Self {
        self.config.max_lambda = max_lambda;
        self
    }

    /// Set whether to calculate and return the Jacobian at the solution.
    pub fn with_calc_jacobian(mut self, calc_jacobian: bool) -> Self {
        self.config.calc_jacobian = calc_jacobian;
        self
    }

    /// The configuration in use.
    pub fn config(&self) -> &LmConfig {
        &self.config
    }

    /// Forward-difference Jacobian with step `max(1, ‖x‖∞)·sqrt(eps)`.
    fn jacobian<P>(problem: &P, x: &Array1<f64>, residuals: &Array1<f64>) -> Result<Array2<f64>>
    where
        P: Problem + ?Sized,
    {
        let scale = x.iter().fold(1.0_f64, |m, v| m.max(v.abs()));
        finite_difference::jacobian(problem, x, residuals, scale * SQRT_EPSILON)
    }

    /// Minimize `½‖r(x)‖²` for the given problem, starting from `x0`.
    ///
    /// Every iteration solves the damped normal equations at the current
    /// point and evaluates the trial point once. An improving step is
    /// accepted and divides the damping by ten; otherwise the damping is
    /// multiplied by ten and the next iteration retries from the same point,
    /// reusing its Jacobian.
    ///
    /// Convergence is declared after an accepted step when the relative cost
    /// reduction is below `ftol`, or after any step whose norm is below
    /// `xtol·(1 + ‖x‖)`.
    ///
    /// # Errors
    ///
    /// * Errors raised by `problem`
    /// * `DimensionMismatch` if `problem` changes the number of residuals
    pub fn minimize<P>(&self, problem: &P, x0: &Array1<f64>) -> Result<LeastSquaresResult>
    where
        P: Problem + ?Sized,
    {
        let n = x0.len();
        if n == 0 {
            return Ok(LeastSquaresResult {
                x: x0.clone(),
                fun: Array1::zeros(0),
                cost: f64::NAN,
                jac: None,
                lambda: self.config.initial_lambda,
                nfev: 0,
                nit: 0,
                success: false,
                message: "Initial guess must not be empty".to_string(),
            });
        }

        let criteria = ConvergenceCriteria::new(self.config.ftol, self.config.xtol);

        let mut x = x0.clone();
        let mut residuals = problem.eval(&x)?;
        let n_residuals = residuals.len();
        let mut cost = half_squared_norm(&residuals);
        let mut nfev = 1;
        let mut lambda = self.config.initial_lambda;

        // Jacobian at the current x, kept while steps are being rejected
        let mut jacobian: Option<Array2<f64>> = None;
        let mut nit = 0;

        let status = loop {
            if cost == 0.0 {
                break ConvergenceStatus::ZeroCost;
            }
            if nit >= self.config.max_iterations {
                break ConvergenceStatus::MaxIterationsReached;
            }
            nit += 1;

            let jac = match jacobian.take() {
                Some(jac) => jac,
                None => {
                    nfev += n;
                    Self::jacobian(problem, &x, &residuals)?
                }
            };

            let StepResult {
                step,
                predicted_reduction,
            } = match LmStep::calculate_step(&jac, &residuals, lambda) {
                Ok(result) => result,
                Err(NumOptError::SingularMatrix) => {
                    warn!(nit, lambda, "singular damped normal equations");
                    jacobian = Some(jac);
                    break ConvergenceStatus::SingularMatrix;
                }
                Err(e) => return Err(e),
            };

            let new_params = &x + &step;
            let new_residuals = eval_checked(problem, &new_params, n_residuals)?;
            nfev += 1;
            let new_cost = half_squared_norm(&new_residuals);

            let step_norm = norm(&step);
            let x_norm = norm(&x);
            let gain_ratio = (cost - new_cost) / predicted_reduction;
            trace!(nit, cost, new_cost, lambda, step_norm, gain_ratio, "levenberg-marquardt step");

            if new_cost < cost {
                let status = criteria.check(cost, new_cost, step_norm, x_norm);

                x = new_params;
                residuals = new_residuals;
                cost = new_cost;
                lambda *= self.config.lambda_down_factor;

                if status.is_terminated() {
                    break status;
                }
            } else {
                jacobian = Some(jac);
                if step_norm < self.config.xtol * (1.0 + x_norm) {
                    break ConvergenceStatus::StepConvergence;
                }
                lambda *= self.config.lambda_up_factor;
                if lambda > self.config.max_lambda {
                    break ConvergenceStatus::DampingOverflow;
                }
            }
        };

        let jac = if self.config.calc_jacobian {
            match jacobian {
                Some(jac) => Some(jac),
                None => {
                    nfev += n;
                    Some(Self::jacobian(problem, &x, &residuals)?)
                }
            }
        } else {
            None
        };

        debug!(nit, nfev, cost, status = ?status, "levenberg-marquardt finished");
        Ok(LeastSquaresResult {
            x,
            fun: residuals,
            cost,
            jac,
            lambda,
            nfev,
            nit,
            success: status.is_converged(),
            message: status.message().to_string(),
        })
    }
}
