//! Curve fitting on top of the Levenberg-Marquardt solver.
//!
//! A model is any function `f(p, x)` of a parameter vector and one
//! independent-variable value. Fitting it to data `(x_i, y_i)` minimizes
//! `½ Σ (y_i − f(p, x_i))²` and estimates the parameter covariance from the
//! Jacobian at the solution.

use std::fmt;

use ndarray::{Array1, Array2};
use serde::Serialize;
use tracing::{debug, warn};

use crate::error::Result;
use crate::lm::{LeastSquaresResult, LevenbergMarquardt, LmConfig};
use crate::problem::Problem;
use crate::result::{rows, serialize_matrix, serialize_vector, OptimizeResult};
use crate::uncertainty::{
    calculate_correlation, calculate_covariance, standard_errors_from_covariance,
};

/// Adapts a model function and a data set to the [`Problem`] trait.
///
/// The residuals are `r_i(p) = y_i − f(p, x_i)`.
pub struct ModelProblem<'a, M: ?Sized> {
    /// The model being fit
    model: &'a M,
    /// The independent variable values
    x_data: &'a Array1<f64>,
    /// The observed dependent variable values
    y_data: &'a Array1<f64>,
}

impl<'a, M> ModelProblem<'a, M>
where
    M: Fn(&Array1<f64>, f64) -> Result<f64> + ?Sized,
{
    /// Create a new adapter. Data of unequal length is truncated to the
    /// shorter of the two; [`curve_fit`] rejects it before getting here.
    pub fn new(model: &'a M, x_data: &'a Array1<f64>, y_data: &'a Array1<f64>) -> Self {
        Self {
            model,
            x_data,
            y_data,
        }
    }

    /// Get the number of data points
    pub fn ndata(&self) -> usize {
        self.x_data.len().min(self.y_data.len())
    }
}

impl<'a, M> Problem for ModelProblem<'a, M>
where
    M: Fn(&Array1<f64>, f64) -> Result<f64> + ?Sized,
{
    fn eval(&self, params: &Array1<f64>) -> Result<Array1<f64>> {
        let residuals = self
            .x_data
            .iter()
            .zip(self.y_data.iter())
            .map(|(&x, &y)| (self.model)(params, x).map(|fx| y - fx))
            .collect::<Result<Vec<f64>>>()?;

        Ok(Array1::from_vec(residuals))
    }
}

/// Result of fitting a model to data.
#[derive(Debug, Clone, Serialize)]
pub struct CurveFitResult {
    /// Optimal parameter values
    #[serde(serialize_with = "serialize_vector")]
    pub popt: Array1<f64>,

    /// Estimated covariance of `popt`; every entry is `+∞` when it cannot
    /// be estimated
    #[serde(serialize_with = "serialize_matrix")]
    pub pcov: Array2<f64>,

    /// Diagnostics of the underlying least-squares solve
    pub result: LeastSquaresResult,
}

impl CurveFitResult {
    /// The covariance matrix as row-major nested vectors.
    pub fn pcov_rows(&self) -> Vec<Vec<f64>> {
        rows(&self.pcov)
    }

    /// One-sigma standard errors, `sqrt(diag(pcov))`.
    pub fn perr(&self) -> Array1<f64> {
        standard_errors_from_covariance(&self.pcov)
    }

    /// The correlation matrix of the fitted parameters.
    pub fn correlation(&self) -> Array2<f64> {
        calculate_correlation(&self.pcov)
    }
}

impl fmt::Display for CurveFitResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Curve Fit Result:")?;
        writeln!(f, "  Success: {}", self.result.success)?;
        writeln!(f, "  Message: {}", self.result.message)?;
        writeln!(f, "  Cost: {:.6e}", self.result.cost)?;
        writeln!(f, "  Function evaluations: {}", self.result.nfev)?;
        let perr = self.perr();
        for (i, (value, err)) in self.popt.iter().zip(perr.iter()).enumerate() {
            writeln!(f, "  p[{}] = {:.6e} +/- {:.3e}", i, value, err)?;
        }
        Ok(())
    }
}

impl OptimizeResult for CurveFitResult {
    fn nfev(&self) -> usize {
        self.result.nfev
    }

    fn nit(&self) -> usize {
        self.result.nit
    }

    fn success(&self) -> bool {
        self.result.success
    }

    fn message(&self) -> String {
        self.result.message.clone()
    }
}

/// Fit `model` to the data `(x_data, y_data)` starting from `p0`.
///
/// Runs the Levenberg-Marquardt solver with `config` (the final Jacobian is
/// always computed), then estimates `pcov = s² · inv(Jᵀ J)` with
/// `s² = 2·cost / (m − n)`.
///
/// Data of unequal or zero length yields a failed record without calling
/// the model. When the covariance cannot be estimated (`m ≤ n` or a
/// singular `Jᵀ J`) `pcov` is filled with `+∞`.
///
/// # Errors
///
/// * Errors raised by `model`
///
/// # Example
///
/// ```
/// use ndarray::{array, Array1};
/// use numopt_rs::{curve_fit, LmConfig, Result};
///
/// let model = |p: &Array1<f64>, x: f64| -> Result<f64> { Ok(p[0] * x + p[1]) };
/// let x = array![0.0, 1.0, 2.0, 3.0];
/// let y = array![1.1, 2.9, 4.9, 7.1];
///
/// let fit = curve_fit(&model, &x, &y, &array![1.0, 0.0], &LmConfig::default()).unwrap();
/// assert!(fit.result.success);
/// assert!((fit.popt[0] - 2.0).abs() < 1e-6);
/// ```
pub fn curve_fit<M>(
    model: &M,
    x_data: &Array1<f64>,
    y_data: &Array1<f64>,
    p0: &Array1<f64>,
    config: &LmConfig,
) -> Result<CurveFitResult>
where
    M: Fn(&Array1<f64>, f64) -> Result<f64> + ?Sized,
{
    let n = p0.len();
    let unknown = || Array2::from_elem((n, n), f64::INFINITY);

    if x_data.len() != y_data.len() || x_data.is_empty() {
        return Ok(CurveFitResult {
            popt: p0.clone(),
            pcov: unknown(),
            result: LeastSquaresResult {
                x: p0.clone(),
                fun: Array1::zeros(0),
                cost: f64::NAN,
                jac: None,
                lambda: config.initial_lambda,
                nfev: 0,
                nit: 0,
                success: false,
                message: format!(
                    "xdata and ydata must have the same non-zero length, got {} and {}",
                    x_data.len(),
                    y_data.len()
                ),
            },
        });
    }

    let problem = ModelProblem::new(model, x_data, y_data);
    let lm = LevenbergMarquardt::with_config(config.clone()).with_calc_jacobian(true);
    let result = lm.minimize(&problem, p0)?;

    let pcov = match result.jac.as_ref() {
        Some(jac) => match calculate_covariance(jac, result.cost) {
            Ok(pcov) => pcov,
            Err(e) => {
                warn!(error = %e, "covariance of the parameters could not be estimated");
                unknown()
            }
        },
        None => unknown(),
    };

    debug!(ndata = problem.ndata(), nfev = result.nfev, "curve fit finished");
    Ok(CurveFitResult {
        popt: result.x.clone(),
        pcov,
        result,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::NumOptError;
    use approx::assert_relative_eq;
    use ndarray::array;

    fn line(p: &Array1<f64>, x: f64) -> Result<f64> {
        Ok(p[0] * x + p[1])
    }

    #[test]
    fn test_model_problem_residuals() {
        let x = array![0.0, 1.0, 2.0];
        let y = array![1.0, 2.0, 4.0];
        let problem = ModelProblem::new(&line, &x, &y);

        let residuals = problem.eval(&array![1.0, 1.0]).unwrap();
        assert_eq!(residuals, array![0.0, 0.0, 1.0]);
        assert_eq!(problem.ndata(), 3);
    }

    #[test]
    fn test_linear_covariance() {
        // Noise orthogonal to both columns of J: the fit is exactly a = 2, b = 1
        let x = array![0.0, 1.0, 2.0, 3.0];
        let y = array![1.1, 2.9, 4.9, 7.1];

        let fit = curve_fit(&line, &x, &y, &array![1.0, 0.0], &LmConfig::default()).unwrap();

        assert!(fit.result.success, "{}", fit.result.message);
        assert_relative_eq!(fit.popt[0], 2.0, epsilon = 1e-6);
        assert_relative_eq!(fit.popt[1], 1.0, epsilon = 1e-6);
        assert_relative_eq!(fit.result.cost, 0.02, epsilon = 1e-8);

        // s² = 0.04 / 2, inv(JᵀJ) = [[0.2, -0.3], [-0.3, 0.7]]
        assert_relative_eq!(fit.pcov[[0, 0]], 0.004, max_relative = 1e-5);
        assert_relative_eq!(fit.pcov[[0, 1]], -0.006, max_relative = 1e-5);
        assert_relative_eq!(fit.pcov[[1, 0]], -0.006, max_relative = 1e-5);
        assert_relative_eq!(fit.pcov[[1, 1]], 0.014, max_relative = 1e-5);

        let perr = fit.perr();
        assert_relative_eq!(perr[0], 0.004f64.sqrt(), max_relative = 1e-5);

        let correlation = fit.correlation();
        assert_eq!(correlation[[0, 0]], 1.0);
        assert_relative_eq!(
            correlation[[0, 1]],
            -0.006 / (0.004f64 * 0.014).sqrt(),
            max_relative = 1e-5
        );

        let rows = fit.pcov_rows();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0], vec![fit.pcov[[0, 0]], fit.pcov[[0, 1]]]);
    }

    #[test]
    fn test_mismatched_data() {
        let calls = std::cell::Cell::new(0);
        let model = |p: &Array1<f64>, x: f64| -> Result<f64> {
            calls.set(calls.get() + 1);
            Ok(p[0] * x)
        };
        let fit = curve_fit(
            &model,
            &array![1.0, 2.0, 3.0],
            &array![1.0, 2.0],
            &array![1.0],
            &LmConfig::default(),
        )
        .unwrap();

        assert!(!fit.result.success);
        assert_eq!(fit.result.nfev, 0);
        assert_eq!(calls.get(), 0);
        assert_eq!(fit.popt, array![1.0]);
        assert!(fit.pcov[[0, 0]].is_infinite());
    }

    #[test]
    fn test_no_degrees_of_freedom() {
        // Two points, two parameters: the line interpolates exactly
        let fit = curve_fit(
            &line,
            &array![0.0, 1.0],
            &array![1.0, 3.0],
            &array![0.0, 0.0],
            &LmConfig::default(),
        )
        .unwrap();

        assert!(fit.result.success);
        assert_relative_eq!(fit.popt[0], 2.0, epsilon = 1e-6);
        assert!(fit.pcov.iter().all(|v| *v == f64::INFINITY));
    }

    #[test]
    fn test_model_error_propagates() {
        let model = |_: &Array1<f64>, x: f64| -> Result<f64> {
            if x > 1.0 {
                Err("model undefined".into())
            } else {
                Ok(x)
            }
        };
        let result = curve_fit(
            &model,
            &array![0.0, 2.0],
            &array![0.0, 2.0],
            &array![1.0],
            &LmConfig::default(),
        );
        assert!(matches!(result, Err(NumOptError::Other(_))));
    }

    #[test]
    fn test_json_has_nested_pcov() {
        let x = array![0.0, 1.0, 2.0, 3.0];
        let y = array![1.1, 2.9, 4.9, 7.1];
        let fit = curve_fit(&line, &x, &y, &array![1.0, 0.0], &LmConfig::default()).unwrap();

        let value: serde_json::Value = serde_json::from_str(&fit.to_json().unwrap()).unwrap();
        assert_eq!(value["pcov"].as_array().unwrap().len(), 2);
        assert_eq!(value["pcov"][0].as_array().unwrap().len(), 2);
        assert_eq!(value["result"]["success"], serde_json::Value::Bool(true));
        assert_eq!(value["popt"].as_array().unwrap().len(), 2);
        assert_eq!(value["result"]["x"].as_array().unwrap().len(), 2);
        assert_eq!(value["result"]["fun"].as_array().unwrap().len(), 4);
        assert_eq!(value["result"]["jac"].as_array().unwrap().len(), 4);
    }
}
