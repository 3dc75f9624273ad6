//! # Covariance Matrix Calculations
//!
//! This module provides functions for calculating and manipulating covariance
//! matrices from Jacobian matrices in nonlinear least-squares optimization.

use ndarray::{Array1, Array2};

use crate::error::{NumOptError, Result};
use crate::utils::linalg;

/// Calculate the covariance matrix from the Jacobian at the solution.
///
/// For nonlinear least-squares problems, the covariance matrix is estimated as:
///   pcov = s² · inv(Jᵀ J)
/// where:
///   - J is the `m × n` Jacobian matrix of the residuals
///   - s² = 2·cost / (m − n) is the residual variance
///
/// The inverse is computed by Gauss-Jordan elimination with partial pivoting.
///
/// # Errors
///
/// * `InvalidInput` if there are no degrees of freedom (`m ≤ n`)
/// * `SingularMatrix` if `Jᵀ J` cannot be inverted
pub fn calculate_covariance(jacobian: &Array2<f64>, cost: f64) -> Result<Array2<f64>> {
    let (m, n) = jacobian.dim();
    if m <= n {
        return Err(NumOptError::InvalidInput(format!(
            "{} observations leave no degrees of freedom for {} parameters",
            m, n
        )));
    }

    let jtj = jacobian.t().dot(jacobian);
    let inverse = linalg::invert(&jtj)?;
    let variance = 2.0 * cost / (m - n) as f64;

    Ok(inverse * variance)
}

/// Calculate correlation matrix from covariance matrix.
///
/// The correlation matrix is calculated as:
///   correl[i,j] = covar[i,j] / sqrt(covar[i,i] * covar[j,j])
///
/// Diagonal elements are 1.0. Pairs involving a zero variance get 0.0, and
/// infinite variances give NaN.
pub fn calculate_correlation(covar: &Array2<f64>) -> Array2<f64> {
    let n = covar.nrows();
    Array2::from_shape_fn((n, n), |(i, j)| {
        if i == j {
            1.0
        } else {
            let denom = (covar[[i, i]] * covar[[j, j]]).sqrt();
            if denom > 0.0 {
                covar[[i, j]] / denom
            } else {
                0.0
            }
        }
    })
}

/// Extract standard errors from the covariance matrix.
///
/// Standard errors are the square roots of the diagonal elements
/// of the covariance matrix; non-positive variances map to 0.
pub fn standard_errors_from_covariance(covar: &Array2<f64>) -> Array1<f64> {
    covar
        .diag()
        .mapv(|variance| if variance > 0.0 { variance.sqrt() } else { 0.0 })
}
