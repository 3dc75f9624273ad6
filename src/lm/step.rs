//! Step calculation for the Levenberg-Marquardt algorithm.
//!
//! This module computes the damped Gauss-Newton step, which interpolates
//! between the Gauss-Newton step (small λ) and a scaled gradient-descent
//! step (large λ).

use crate::error::Result;
use crate::utils::linalg;
use ndarray::{Array1, Array2};

/// Result of a Levenberg-Marquardt step calculation.
#[derive(Debug, Clone)]
pub struct StepResult {
    /// The calculated step vector
    pub step: Array1<f64>,

    /// The predicted reduction in cost from the linearized model
    pub predicted_reduction: f64,
}

/// Handles step calculation for the Levenberg-Marquardt algorithm.
pub struct LmStep;

impl LmStep {
    /// Calculates the Levenberg-Marquardt step.
    ///
    /// Solves the damped normal equations
    /// `(JᵀJ + λ·diag(JᵀJ)) dx = −Jᵀr` by Gaussian elimination with partial
    /// pivoting.
    ///
    /// # Arguments
    ///
    /// * `jacobian` - The `k × n` Jacobian matrix at the current position
    /// * `residuals` - The residuals at the current position
    /// * `lambda` - The damping parameter
    ///
    /// # Errors
    ///
    /// * `SingularMatrix` if the damped matrix has a vanishing pivot
    pub fn calculate_step(
        jacobian: &Array2<f64>,
        residuals: &Array1<f64>,
        lambda: f64,
    ) -> Result<StepResult> {
        let j_t_j = jacobian.t().dot(jacobian);
        let j_t_r = jacobian.t().dot(residuals);

        // Marquardt scaling: damp each direction by its own curvature
        let mut augmented = j_t_j.clone();
        for i in 0..augmented.nrows() {
            augmented[[i, i]] += lambda * j_t_j[[i, i]];
        }

        let step = linalg::solve(&augmented, &(-&j_t_r))?;
        let predicted_reduction = LmStep::predicted_reduction(&j_t_j, &j_t_r, &step);

        Ok(StepResult {
            step,
            predicted_reduction,
        })
    }

    /// Reduction in `½‖r + J·dx‖²` relative to `½‖r‖²` for the given step.
    ///
    /// # Arguments
    ///
    /// * `j_t_j` - The J^T * J matrix
    /// * `j_t_r` - The J^T * r vector
    /// * `step` - The calculated step vector
    fn predicted_reduction(j_t_j: &Array2<f64>, j_t_r: &Array1<f64>, step: &Array1<f64>) -> f64 {
        -step.dot(j_t_r) - 0.5 * step.dot(&j_t_j.dot(step))
    }
}
