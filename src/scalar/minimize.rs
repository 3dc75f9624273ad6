//! Bracketed minimization of a function of one variable.
//!
//! Golden-section search and Brent's method both work on an interval
//! `[a, b]` assumed to contain a single minimum. Neither fails: running out
//! of iterations yields the best point found with `success = false`.

use std::fmt;

use serde::Serialize;
use tracing::{debug, trace};

use crate::error::Result;
use crate::result::{OptimizeResult, MSG_MAX_ITERATIONS, MSG_SUCCESS};
use crate::utils::SQRT_EPSILON;

use super::config::{MinimizeMethod, ScalarMinimizeConfig};

/// `2 - φ`, the fraction of the bracket at which interior points are placed.
pub const RESPHI: f64 = 0.381_966_011_250_105_1;

/// Result of a scalar minimization.
#[derive(Debug, Clone, Serialize)]
pub struct ScalarMinimizeResult {
    /// Best point found
    pub x: f64,

    /// Function value at `x`
    pub fun: f64,

    /// Number of function evaluations
    pub nfev: usize,

    /// Number of iterations performed
    pub nit: usize,

    /// Whether the tolerance was met
    pub success: bool,

    /// A message describing the result
    pub message: String,
}

impl fmt::Display for ScalarMinimizeResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Scalar Minimization Result:")?;
        writeln!(f, "  Success: {}", self.success)?;
        writeln!(f, "  Message: {}", self.message)?;
        writeln!(f, "  x: {:.10}", self.x)?;
        writeln!(f, "  f(x): {:.6e}", self.fun)?;
        writeln!(f, "  Iterations: {}", self.nit)?;
        writeln!(f, "  Function evaluations: {}", self.nfev)?;
        Ok(())
    }
}

impl OptimizeResult for ScalarMinimizeResult {
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

/// Minimizer for functions of one variable on a bracket.
#[derive(Debug, Clone, Default)]
pub struct ScalarMinimizer {
    /// Configuration options
    config: ScalarMinimizeConfig,
}

impl ScalarMinimizer {
    /// Create a new minimizer with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new minimizer with the given configuration.
    pub fn with_config(config: ScalarMinimizeConfig) -> Self {
        Self { config }
    }

    /// Set the tolerance on the bracket width.
    pub fn with_xtol(mut self, xtol: f64) -> Self {
        self.config.xtol = xtol;
        self
    }

    /// Set the maximum number of iterations.
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.config.max_iterations = max_iterations;
        self
    }

    /// Set the search method.
    pub fn with_method(mut self, method: MinimizeMethod) -> Self {
        self.config.method = method;
        self
    }

    /// The configuration in use.
    pub fn config(&self) -> &ScalarMinimizeConfig {
        &self.config
    }

    /// Minimize `f` on `[a, b]` with the configured method.
    ///
    /// The endpoints may be given in either order. Errors raised by `f` are
    /// returned unchanged; every other outcome is reported in the result.
    pub fn minimize<F>(&self, f: F, a: f64, b: f64) -> Result<ScalarMinimizeResult>
    where
        F: Fn(f64) -> Result<f64>,
    {
        match self.config.method {
            MinimizeMethod::Golden => self.golden(f, a, b),
            MinimizeMethod::Brent => self.brent(f, a, b),
        }
    }

    /// Golden-section search on `[a, b]`.
    ///
    /// Each iteration evaluates exactly one new interior point. The search
    /// stops once `|b - a| <= xtol` and reports the bracket midpoint, which
    /// costs one final evaluation.
    pub fn golden<F>(&self, f: F, a: f64, b: f64) -> Result<ScalarMinimizeResult>
    where
        F: Fn(f64) -> Result<f64>,
    {
        let (mut a, mut b) = if a <= b { (a, b) } else { (b, a) };
        let xtol = self.config.xtol;

        let mut x1 = a + RESPHI * (b - a);
        let mut x2 = b - RESPHI * (b - a);
        let mut f1 = f(x1)?;
        let mut f2 = f(x2)?;
        let mut nfev = 2;
        let mut nit = 0;

        while (b - a).abs() > xtol && nit < self.config.max_iterations {
            if f1 < f2 {
                b = x2;
                x2 = x1;
                f2 = f1;
                x1 = a + RESPHI * (b - a);
                f1 = f(x1)?;
            } else {
                a = x1;
                x1 = x2;
                f1 = f2;
                x2 = b - RESPHI * (b - a);
                f2 = f(x2)?;
            }
            nfev += 1;
            nit += 1;
            trace!(nit, a, b, "golden section step");
        }

        let success = (b - a).abs() <= xtol;
        let x = 0.5 * (a + b);
        let fun = f(x)?;
        nfev += 1;

        let result = ScalarMinimizeResult {
            x,
            fun,
            nfev,
            nit,
            success,
            message: termination_message(success),
        };
        debug!(nit, nfev, success, x, "golden section search finished");
        Ok(result)
    }

    /// Brent's method on `[a, b]`.
    ///
    /// Parabolic steps through the three best points are taken when they
    /// land strictly inside the bracket and move less than half the step
    /// before last; otherwise a golden-section step is made. No point closer
    /// than `sqrt(eps)·|x| + xtol/3` to the current best is evaluated.
    pub fn brent<F>(&self, f: F, a: f64, b: f64) -> Result<ScalarMinimizeResult>
    where
        F: Fn(f64) -> Result<f64>,
    {
        let (mut a, mut b) = if a <= b { (a, b) } else { (b, a) };
        let xtol = self.config.xtol;

        // x: best point, w: second best, v: previous value of w
        let mut x = a + RESPHI * (b - a);
        let mut w = x;
        let mut v = x;
        let mut fx = f(x)?;
        let mut fw = fx;
        let mut fv = fx;
        let mut nfev = 1;

        // d: current step, e: step before last
        let mut d: f64 = 0.0;
        let mut e: f64 = 0.0;

        let mut nit = 0;
        let success = loop {
            let xm = 0.5 * (a + b);
            let tol1 = SQRT_EPSILON * x.abs() + xtol / 3.0;
            let tol2 = 2.0 * tol1;

            if (x - xm).abs() <= tol2 - 0.5 * (b - a) {
                break true;
            }
            if nit >= self.config.max_iterations {
                break false;
            }
            nit += 1;

            let mut take_golden = true;
            if e.abs() > tol1 {
                let r = (x - w) * (fx - fv);
                let mut q = (x - v) * (fx - fw);
                let mut p = (x - v) * q - (x - w) * r;
                q = 2.0 * (q - r);
                if q > 0.0 {
                    p = -p;
                }
                q = q.abs();
                let etemp = e;
                e = d;

                let acceptable =
                    p.abs() < (0.5 * q * etemp).abs() && p > q * (a - x) && p < q * (b - x);
                if acceptable {
                    d = p / q;
                    let u = x + d;
                    // Keep away from the bracket ends
                    if u - a < tol2 || b - u < tol2 {
                        d = copysign(tol1, xm - x);
                    }
                    take_golden = false;
                }
            }

            if take_golden {
                e = if x >= xm { a - x } else { b - x };
                d = RESPHI * e;
            }

            let u = if d.abs() >= tol1 {
                x + d
            } else {
                x + copysign(tol1, d)
            };
            let fu = f(u)?;
            nfev += 1;

            if fu <= fx {
                if u >= x {
                    a = x;
                } else {
                    b = x;
                }
                v = w;
                fv = fw;
                w = x;
                fw = fx;
                x = u;
                fx = fu;
            } else {
                if u < x {
                    a = u;
                } else {
                    b = u;
                }
                if fu <= fw || w == x {
                    v = w;
                    fv = fw;
                    w = u;
                    fw = fu;
                } else if fu <= fv || v == x || v == w {
                    v = u;
                    fv = fu;
                }
            }
            trace!(nit, x, fx, a, b, parabolic = !take_golden, "brent step");
        };

        let result = ScalarMinimizeResult {
            x,
            fun: fx,
            nfev,
            nit,
            success,
            message: termination_message(success),
        };
        debug!(nit, nfev, success, x, "brent minimization finished");
        Ok(result)
    }
}

/// `|magnitude|` carrying the sign of `sign` (zero counts as positive).
fn copysign(magnitude: f64, sign: f64) -> f64 {
    if sign >= 0.0 {
        magnitude.abs()
    } else {
        -magnitude.abs()
    }
}

fn termination_message(success: bool) -> String {
    if success {
        MSG_SUCCESS.to_string()
    } else {
        MSG_MAX_ITERATIONS.to_string()
    }
}
