//! Configuration options for the scalar minimizer and root finder.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{NumOptError, Result};

/// Bracketing method used by [`ScalarMinimizer`](super::ScalarMinimizer).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MinimizeMethod {
    /// Golden-section search
    Golden,

    /// Brent's method: parabolic interpolation with a golden-section fallback
    #[default]
    Brent,
}

impl FromStr for MinimizeMethod {
    type Err = NumOptError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "golden" => Ok(MinimizeMethod::Golden),
            "brent" => Ok(MinimizeMethod::Brent),
            other => Err(NumOptError::InvalidInput(format!(
                "Unknown minimization method '{}'",
                other
            ))),
        }
    }
}

impl fmt::Display for MinimizeMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MinimizeMethod::Golden => write!(f, "golden"),
            MinimizeMethod::Brent => write!(f, "brent"),
        }
    }
}

/// Configuration options for scalar minimization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScalarMinimizeConfig {
    /// Absolute tolerance on the bracket width. Default: 1e-5
    pub xtol: f64,

    /// Maximum number of iterations. Default: 500
    pub max_iterations: usize,

    /// Search method. Default: Brent
    pub method: MinimizeMethod,
}

impl Default for ScalarMinimizeConfig {
    fn default() -> Self {
        Self {
            xtol: 1e-5,
            max_iterations: 500,
            method: MinimizeMethod::default(),
        }
    }
}

impl ScalarMinimizeConfig {
    /// Parse a (possibly partial) JSON object; missing fields keep their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Root-finding method used by [`ScalarRootFinder`](super::ScalarRootFinder).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RootMethod {
    /// Bisection on a sign-changing bracket
    #[serde(alias = "bisection")]
    Bisect,

    /// Newton's method with an analytic or finite-difference derivative
    Newton,

    /// Secant method
    Secant,
}

impl FromStr for RootMethod {
    type Err = NumOptError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "bisect" | "bisection" => Ok(RootMethod::Bisect),
            "newton" => Ok(RootMethod::Newton),
            "secant" => Ok(RootMethod::Secant),
            other => Err(NumOptError::InvalidInput(format!(
                "Unknown root-finding method '{}'",
                other
            ))),
        }
    }
}

/// Configuration options for scalar root finding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RootConfig {
    /// Tolerance on the step size (and on |f(x)| for the open methods). Default: 1e-12
    pub xtol: f64,

    /// Maximum number of iterations. Default: 100
    pub max_iterations: usize,
}

impl Default for RootConfig {
    fn default() -> Self {
        Self {
            xtol: 1e-12,
            max_iterations: 100,
        }
    }
}

impl RootConfig {
    /// Parse a (possibly partial) JSON object; missing fields keep their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}
