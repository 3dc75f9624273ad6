//! # numopt-rs
//!
//! `numopt-rs` is a toolkit of classical numerical optimization and
//! equation-solving algorithms over dense `f64` vectors.
//!
//! The library provides:
//! - Scalar minimization on a bracket (golden-section search, Brent's method)
//! - Scalar root finding (bisection, Newton, secant)
//! - Derivative-free minimization over ℝⁿ (Nelder-Mead)
//! - Newton's method for square systems of nonlinear equations
//! - Levenberg-Marquardt nonlinear least squares and curve fitting with
//!   parameter covariance estimates
//!
//! Every solver calls the caller's function synchronously and reports
//! its outcome in a result record. An `Err` returned by the caller's
//! function is propagated unchanged.
//!
//! ## Basic Usage
//!
//! ```
//! use ndarray::{array, Array1};
//! use numopt_rs::{LevenbergMarquardt, Result, ScalarMinimizer};
//!
//! let min = ScalarMinimizer::new()
//!     .minimize(|x: f64| -> Result<f64> { Ok((x - 2.0).powi(2)) }, 0.0, 5.0)
//!     .unwrap();
//! assert!((min.x - 2.0).abs() < 1e-4);
//!
//! let residuals = |p: &Array1<f64>| -> Result<Array1<f64>> {
//!     Ok(array![p[0] - 1.0, 10.0 * (p[1] - p[0] * p[0])])
//! };
//! let fit = LevenbergMarquardt::new()
//!     .minimize(&residuals, &array![-1.2, 1.0])
//!     .unwrap();
//! assert!(fit.success);
//! ```

// Public modules
pub mod error;
pub mod problem;
pub mod result;
pub mod utils;

// Algorithm families
pub mod lm;
pub mod model;
pub mod multiroot;
pub mod scalar;
pub mod simplex;
pub mod uncertainty;

// Re-exports for convenience
pub use error::{NumOptError, Result};
pub use lm::{LeastSquaresResult, LevenbergMarquardt, LmConfig};
pub use model::{curve_fit, CurveFitResult};
pub use multiroot::{MultiRootResult, NewtonConfig, NewtonSolver};
pub use problem::Problem;
pub use result::OptimizeResult;
pub use scalar::{
    MinimizeMethod, RootConfig, RootFlag, RootMethod, RootResult, RootStart,
    ScalarMinimizeConfig, ScalarMinimizeResult, ScalarMinimizer, ScalarRootFinder,
};
pub use simplex::{NelderMead, NelderMeadConfig, SimplexResult};

/// Version of the library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
