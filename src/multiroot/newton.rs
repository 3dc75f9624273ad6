//! Newton iteration for square systems of nonlinear equations.

use std::fmt;

use ndarray::Array1;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

use crate::error::{NumOptError, Result};
use crate::problem::{eval_checked, Problem};
use crate::result::{serialize_vector, OptimizeResult, MSG_MAX_ITERATIONS, MSG_SUCCESS};
use crate::utils::{finite_difference, linalg, norm, SQRT_EPSILON};

/// Message reported when the Jacobian cannot be factored.
pub const MSG_SINGULAR_JACOBIAN: &str = "Singular Jacobian";

/// Message reported when the system is not square.
pub const MSG_NOT_SQUARE: &str = "System must have as many equations as unknowns";

/// Configuration options for [`NewtonSolver`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NewtonConfig {
    /// Tolerance on the residual norm and on the step norm. Default: 1e-10
    pub tol: f64,

    /// Maximum number of iterations. Default: 100
    pub max_iterations: usize,
}

impl Default for NewtonConfig {
    fn default() -> Self {
        Self {
            tol: 1e-10,
            max_iterations: 100,
        }
    }
}

impl NewtonConfig {
    /// Parse a (possibly partial) JSON object; missing fields keep their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Result of a multivariate root search.
#[derive(Debug, Clone, Serialize)]
pub struct MultiRootResult {
    /// Final iterate
    #[serde(serialize_with = "serialize_vector")]
    pub x: Array1<f64>,

    /// Residual vector at `x`
    #[serde(serialize_with = "serialize_vector")]
    pub fun: Array1<f64>,

    /// Number of function evaluations, Jacobian columns included
    pub nfev: usize,

    /// Number of iterations performed
    pub nit: usize,

    /// Whether the tolerance was met
    pub success: bool,

    /// A message describing the result
    pub message: String,
}

impl fmt::Display for MultiRootResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Newton System Result:")?;
        writeln!(f, "  Success: {}", self.success)?;
        writeln!(f, "  Message: {}", self.message)?;
        writeln!(f, "  ||f(x)||: {:.6e}", norm(&self.fun))?;
        writeln!(f, "  Iterations: {}", self.nit)?;
        writeln!(f, "  Function evaluations: {}", self.nfev)?;
        writeln!(f, "  x: {:?}", self.x)?;
        Ok(())
    }
}

impl OptimizeResult for MultiRootResult {
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

/// Newton's method for `f(x) = 0` with `f: ℝⁿ → ℝⁿ`.
///
/// The Jacobian is rebuilt every iteration from forward differences with
/// step `sqrt(eps)` and the Newton step is found by Gaussian elimination
/// with partial pivoting.
#[derive(Debug, Clone, Default)]
pub struct NewtonSolver {
    /// Configuration options
    config: NewtonConfig,
}

impl NewtonSolver {
    /// Create a new solver with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new solver with the given configuration.
    pub fn with_config(config: NewtonConfig) -> Self {
        Self { config }
    }

    /// Set the tolerance.
    pub fn with_tol(mut self, tol: f64) -> Self {
        self.config.tol = tol;
        self
    }

    /// Set the maximum number of iterations.
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.config.max_iterations = max_iterations;
        self
    }

    /// The configuration in use.
    pub fn config(&self) -> &NewtonConfig {
        &self.config
    }

    /// Solve `problem(x) = 0` starting from `x0`.
    ///
    /// Converges when `‖f(x)‖ < tol` or when a step satisfies
    /// `‖dx‖ < tol`. A singular Jacobian ends the search with the current
    /// iterate and `success = false`, as does a first evaluation that does
    /// not return `x0.len()` equations.
    ///
    /// # Errors
    ///
    /// * Errors raised by `problem`
    /// * `DimensionMismatch` if `problem` changes its number of equations
    ///   between calls
    pub fn solve<P>(&self, problem: &P, x0: &Array1<f64>) -> Result<MultiRootResult>
    where
        P: Problem + ?Sized,
    {
        let n = x0.len();
        if n == 0 {
            return Ok(MultiRootResult {
                x: x0.clone(),
                fun: Array1::zeros(0),
                nfev: 0,
                nit: 0,
                success: false,
                message: "Initial guess must not be empty".to_string(),
            });
        }

        let tol = self.config.tol;
        let mut x = x0.clone();
        let mut fx = problem.eval(&x)?;
        if fx.len() != n {
            warn!(unknowns = n, equations = fx.len(), "non-square system");
            return Ok(MultiRootResult {
                x,
                fun: fx,
                nfev: 1,
                nit: 0,
                success: false,
                message: MSG_NOT_SQUARE.to_string(),
            });
        }
        let mut nfev = 1;
        let mut nit = 0;

        let (success, message) = loop {
            let residual_norm = norm(&fx);
            if residual_norm < tol {
                break (true, MSG_SUCCESS);
            }
            if nit >= self.config.max_iterations {
                break (false, MSG_MAX_ITERATIONS);
            }
            nit += 1;

            let jac = finite_difference::jacobian(problem, &x, &fx, SQRT_EPSILON)?;
            nfev += n;

            let dx = match linalg::solve(&jac, &(-&fx)) {
                Ok(dx) => dx,
                Err(NumOptError::SingularMatrix) => {
                    warn!(nit, residual_norm, "singular Jacobian in Newton iteration");
                    break (false, MSG_SINGULAR_JACOBIAN);
                }
                Err(e) => return Err(e),
            };

            x += &dx;
            fx = eval_checked(problem, &x, n)?;
            nfev += 1;

            let step_norm = norm(&dx);
            trace!(nit, step_norm, residual = norm(&fx), "newton system step");
            if step_norm < tol {
                break (true, MSG_SUCCESS);
            }
        };

        debug!(nit, nfev, success, message, "newton system solve finished");
        Ok(MultiRootResult {
            x,
            fun: fx,
            nfev,
            nit,
            success,
            message: message.to_string(),
        })
    }
}
