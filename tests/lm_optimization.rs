//! Integration tests for the Levenberg-Marquardt least-squares solver.

use approx::assert_relative_eq;
use ndarray::{array, Array1};
use numopt_rs::lm::{ConvergenceStatus, LevenbergMarquardt, LmConfig};
use numopt_rs::{NumOptError, OptimizeResult, Problem, Result};

/// A simple linear model for testing: f(x) = a * x + b
struct LinearModel {
    x_data: Array1<f64>,
    y_data: Array1<f64>,
}

impl LinearModel {
    fn new(x_data: Array1<f64>, y_data: Array1<f64>) -> Self {
        assert_eq!(
            x_data.len(),
            y_data.len(),
            "x and y data must have the same length"
        );
        Self { x_data, y_data }
    }
}

impl Problem for LinearModel {
    fn eval(&self, params: &Array1<f64>) -> Result<Array1<f64>> {
        if params.len() != 2 {
            return Err(NumOptError::DimensionMismatch(format!(
                "Expected 2 parameters, got {}",
                params.len()
            )));
        }

        let a = params[0];
        let b = params[1];

        let residuals = self
            .x_data
            .iter()
            .zip(self.y_data.iter())
            .map(|(x, y)| a * x + b - y)
            .collect::<Vec<f64>>();

        Ok(Array1::from_vec(residuals))
    }
}

/// Quadratic model: f(x) = a * x^2 + b * x + c
struct QuadraticModel {
    x_data: Array1<f64>,
    y_data: Array1<f64>,
}

impl Problem for QuadraticModel {
    fn eval(&self, params: &Array1<f64>) -> Result<Array1<f64>> {
        let (a, b, c) = (params[0], params[1], params[2]);

        Ok(self
            .x_data
            .iter()
            .zip(self.y_data.iter())
            .map(|(x, y)| a * x.powi(2) + b * x + c - y)
            .collect())
    }
}

/// Exponential model: f(x) = a * exp(-b * x)
struct ExponentialModel {
    x_data: Array1<f64>,
    y_data: Array1<f64>,
}

impl Problem for ExponentialModel {
    fn eval(&self, params: &Array1<f64>) -> Result<Array1<f64>> {
        let a = params[0];
        let b = params[1];

        Ok(self
            .x_data
            .iter()
            .zip(self.y_data.iter())
            .map(|(x, y)| a * (-b * x).exp() - y)
            .collect())
    }
}

/// The Rosenbrock function in a least squares form.
/// f(x,y) = (1-x)² + 100(y-x²)²
struct RosenbrockProblem;

impl Problem for RosenbrockProblem {
    fn eval(&self, params: &Array1<f64>) -> Result<Array1<f64>> {
        let x = params[0];
        let y = params[1];

        //   r₁ = 1 - x
        //   r₂ = 10(y - x²)
        Ok(array![1.0 - x, 10.0 * (y - x.powi(2))])
    }
}

#[test]
fn test_linear_fit() {
    // Create test data: y = 2x + 3 + noise
    let x = array![0.0, 1.0, 2.0, 3.0, 4.0, 5.0];
    let y = array![3.1, 4.9, 7.1, 8.9, 11.1, 12.9];

    let model = LinearModel::new(x, y);
    let result = LevenbergMarquardt::new()
        .minimize(&model, &array![1.0, 1.0])
        .unwrap();

    assert!(result.success);
    assert_relative_eq!(result.x[0], 2.0, epsilon = 0.1);
    assert_relative_eq!(result.x[1], 3.0, epsilon = 0.1);
    assert!(result.cost < 0.2);
    assert_eq!(result.fun.len(), 6);
}

#[test]
fn test_quadratic_fit() {
    // Create test data: y = 2x² - 3x + 1 + noise
    let model = QuadraticModel {
        x_data: array![-2.0, -1.0, 0.0, 1.0, 2.0, 3.0],
        y_data: array![11.8, 5.9, 1.1, 0.1, 3.0, 9.9],
    };

    let result = LevenbergMarquardt::new()
        .minimize(&model, &array![1.0, 1.0, 1.0])
        .unwrap();

    assert!(result.success);
    assert!(result.cost < 2.0);
    assert_relative_eq!(result.cost, model.eval_cost(&result.x).unwrap(), epsilon = 1e-12);
}

#[test]
fn test_exponential_fit() {
    // Create test data: y = 2 * exp(-0.5 * x) + noise
    let model = ExponentialModel {
        x_data: array![0.0, 0.5, 1.0, 1.5, 2.0, 2.5, 3.0, 3.5, 4.0],
        y_data: array![2.02, 1.67, 1.21, 0.98, 0.81, 0.62, 0.45, 0.39, 0.29],
    };

    let config = LmConfig {
        ftol: 1e-6,
        xtol: 1e-6,
        ..LmConfig::default()
    };
    let result = LevenbergMarquardt::with_config(config)
        .minimize(&model, &array![1.0, 0.1])
        .unwrap();

    assert!(result.success);
    assert_relative_eq!(result.x[0], 2.0, epsilon = 0.1);
    assert_relative_eq!(result.x[1], 0.5, epsilon = 0.1);
    assert!(result.cost < 0.01);
}

#[test]
fn test_rosenbrock_optimization() {
    let result = LevenbergMarquardt::new()
        .with_max_iterations(200)
        .with_ftol(1e-10)
        .with_xtol(1e-10)
        .minimize(&RosenbrockProblem, &array![-1.2, 1.0])
        .unwrap();

    assert!(result.success, "{}", result);
    assert_relative_eq!(result.x[0], 1.0, epsilon = 1e-4);
    assert_relative_eq!(result.x[1], 1.0, epsilon = 1e-4);
    assert!(result.cost < 1e-8);
}

#[test]
fn test_multiple_starting_points() {
    // Exact data: y = 2x + 3
    let x = array![0.0, 1.0, 2.0, 3.0, 4.0, 5.0];
    let y = x.mapv(|v| 2.0 * v + 3.0);
    let model = LinearModel::new(x, y);
    let lm = LevenbergMarquardt::new();

    let starting_points = [
        array![1.0, 1.0],
        array![0.0, 0.0],
        array![10.0, 10.0],
        array![-5.0, -5.0],
    ];

    for x0 in starting_points.iter() {
        let result = lm.minimize(&model, x0).unwrap();
        assert!(result.success, "start {:?}: {}", x0, result.message);
        assert_relative_eq!(result.x[0], 2.0, epsilon = 1e-8);
        assert_relative_eq!(result.x[1], 3.0, epsilon = 1e-8);
    }
}

#[test]
fn test_damping_overflow() {
    // A cost with a kink at its minimum: no step ever lowers it once the
    // iterate sits on the kink
    let problem = |p: &Array1<f64>| -> Result<Array1<f64>> { Ok(array![p[0].abs() + 1.0]) };

    let result = LevenbergMarquardt::new()
        .with_xtol(0.0)
        .with_max_lambda(1e6)
        .with_max_iterations(1000)
        .minimize(&problem, &array![0.0])
        .unwrap();

    assert!(!result.success);
    assert_eq!(result.message, ConvergenceStatus::DampingOverflow.message());
    assert!(result.lambda > 1e6);
    assert_eq!(result.x, array![0.0]);
}

#[test]
fn test_empty_initial_guess() {
    let result = LevenbergMarquardt::new()
        .minimize(&RosenbrockProblem, &Array1::zeros(0))
        .unwrap();
    assert!(!result.success);
    assert_eq!(result.nfev, 0);
}

#[test]
fn test_changing_residual_count() {
    let problem = |p: &Array1<f64>| -> Result<Array1<f64>> {
        if p[0] == 0.0 {
            Ok(array![1.0, 1.0])
        } else {
            Ok(array![p[0]])
        }
    };
    assert!(matches!(
        LevenbergMarquardt::new().minimize(&problem, &array![0.0]),
        Err(NumOptError::DimensionMismatch(_))
    ));
}

#[test]
fn test_config_and_result_json() {
    let config = LmConfig::from_json(r#"{"max_iterations": 3, "initial_lambda": 0.01}"#).unwrap();
    let lm = LevenbergMarquardt::with_config(config);
    assert_eq!(lm.config().max_iterations, 3);
    assert_eq!(lm.config().initial_lambda, 0.01);

    let result = lm.minimize(&RosenbrockProblem, &array![-1.2, 1.0]).unwrap();
    let json: serde_json::Value = serde_json::from_str(&result.to_json().unwrap()).unwrap();

    assert_eq!(json["nit"], 3);
    assert_eq!(json["success"], false);
    assert_eq!(json["message"], "Maximum iterations reached");
    assert!(json["jac"].is_null());
    assert_eq!(json["x"].as_array().unwrap().len(), 2);
    assert_relative_eq!(json["x"][0].as_f64().unwrap(), result.x[0], epsilon = 1e-12);
    assert_eq!(json["fun"].as_array().unwrap().len(), 2);
}

#[test]
fn test_result_json_jacobian_rows() {
    let model = LinearModel::new(array![0.0, 1.0, 2.0], array![1.0, 3.0, 5.0]);
    let result = LevenbergMarquardt::new()
        .with_calc_jacobian(true)
        .minimize(&model, &array![1.0, 1.0])
        .unwrap();

    let jac = result.jac.as_ref().unwrap();
    let json: serde_json::Value = serde_json::from_str(&result.to_json().unwrap()).unwrap();
    let rows = json["jac"].as_array().unwrap();
    assert_eq!(rows.len(), 3);
    for (i, row) in rows.iter().enumerate() {
        let row = row.as_array().unwrap();
        assert_eq!(row.len(), 2);
        assert_relative_eq!(row[0].as_f64().unwrap(), jac[[i, 0]], epsilon = 1e-12);
        assert_relative_eq!(row[1].as_f64().unwrap(), jac[[i, 1]], epsilon = 1e-12);
    }
}
