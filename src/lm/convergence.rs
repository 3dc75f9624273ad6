//! Convergence criteria for the Levenberg-Marquardt algorithm.
//!
//! This module defines the termination states of the algorithm and the test
//! applied after every accepted step.

use serde::{Deserialize, Serialize};

use crate::result::MSG_MAX_ITERATIONS;

/// Possible termination states of the Levenberg-Marquardt iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConvergenceStatus {
    /// The algorithm is still running.
    Running,

    /// The relative reduction in cost fell below `ftol`.
    CostConvergence,

    /// The step fell below `xtol · (1 + ‖x‖)`.
    StepConvergence,

    /// The residuals vanished exactly.
    ZeroCost,

    /// The iteration budget ran out.
    MaxIterationsReached,

    /// The damped normal equations could not be solved.
    SingularMatrix,

    /// Steps kept failing until the damping parameter passed its maximum.
    DampingOverflow,
}

impl ConvergenceStatus {
    /// Returns true if the optimization has terminated (either converged or failed).
    pub fn is_terminated(&self) -> bool {
        !matches!(self, ConvergenceStatus::Running)
    }

    /// Returns true if the optimization has converged.
    pub fn is_converged(&self) -> bool {
        matches!(
            self,
            ConvergenceStatus::CostConvergence
                | ConvergenceStatus::StepConvergence
                | ConvergenceStatus::ZeroCost
        )
    }

    /// Returns the termination message reported in the result.
    pub fn message(&self) -> &'static str {
        match self {
            ConvergenceStatus::Running => "Optimization is still running",
            ConvergenceStatus::CostConvergence => {
                "Converged: relative reduction in cost is below ftol"
            }
            ConvergenceStatus::StepConvergence => "Converged: relative step size is below xtol",
            ConvergenceStatus::ZeroCost => "Converged: cost is zero",
            ConvergenceStatus::MaxIterationsReached => MSG_MAX_ITERATIONS,
            ConvergenceStatus::SingularMatrix => "Singular matrix in normal equations",
            ConvergenceStatus::DampingOverflow => "Damping parameter exceeded maximum",
        }
    }
}

/// Tolerances checked after every accepted step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConvergenceCriteria {
    /// Tolerance for the relative change in cost.
    pub ftol: f64,

    /// Tolerance for the relative step size.
    pub xtol: f64,
}

impl ConvergenceCriteria {
    /// Creates a new set of convergence criteria with the given tolerances.
    pub fn new(ftol: f64, xtol: f64) -> Self {
        Self { ftol, xtol }
    }

    /// Checks an accepted step.
    ///
    /// # Arguments
    ///
    /// * `cost` - The cost before the step (strictly greater than `new_cost`)
    /// * `new_cost` - The cost after the step
    /// * `step_norm` - The Euclidean norm of the step
    /// * `x_norm` - The Euclidean norm of the parameters before the step
    pub fn check(&self, cost: f64, new_cost: f64, step_norm: f64, x_norm: f64) -> ConvergenceStatus {
        if new_cost == 0.0 {
            ConvergenceStatus::ZeroCost
        } else if (cost - new_cost) / cost < self.ftol {
            ConvergenceStatus::CostConvergence
        } else if step_norm < self.xtol * (1.0 + x_norm) {
            ConvergenceStatus::StepConvergence
        } else {
            ConvergenceStatus::Running
        }
    }
}
