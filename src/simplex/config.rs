//! Configuration options for the Nelder-Mead simplex method.

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Configuration options for [`NelderMead`](super::NelderMead).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NelderMeadConfig {
    /// Tolerance on the largest coordinate distance from the best vertex. Default: 1e-4
    pub xtol: f64,

    /// Tolerance on the spread of function values over the simplex. Default: 1e-4
    pub ftol: f64,

    /// Maximum number of iterations. Default: None (200 × dimension)
    pub max_iterations: Option<usize>,

    /// Maximum number of function evaluations. Default: None (unlimited)
    pub max_fev: Option<usize>,

    /// Reflection coefficient α. Default: 1.0
    pub reflection: f64,

    /// Expansion coefficient γ. Default: 2.0
    pub expansion: f64,

    /// Contraction coefficient ρ. Default: 0.5
    pub contraction: f64,

    /// Shrink coefficient σ. Default: 0.5
    pub shrink: f64,
}

impl Default for NelderMeadConfig {
    fn default() -> Self {
        Self {
            xtol: 1e-4,
            ftol: 1e-4,
            max_iterations: None,
            max_fev: None,
            reflection: 1.0,
            expansion: 2.0,
            contraction: 0.5,
            shrink: 0.5,
        }
    }
}

impl NelderMeadConfig {
    /// Parse a (possibly partial) JSON object; missing fields keep their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Iteration budget for a problem of dimension `n`.
    pub fn iteration_limit(&self, n: usize) -> usize {
        self.max_iterations.unwrap_or(200 * n)
    }
}
