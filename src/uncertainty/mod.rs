//! # Uncertainty Calculation
//!
//! This module provides functionality for calculating uncertainties in parameter
//! estimates from nonlinear least-squares optimization results:
//!
//! - Covariance matrix estimation from Jacobian matrices
//! - Correlation matrices
//! - Standard errors of parameter estimates

mod covariance;

pub use covariance::{
    calculate_correlation, calculate_covariance, standard_errors_from_covariance,
};
