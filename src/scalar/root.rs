//! Root finding for functions of one variable.
//!
//! Bisection works on a sign-changing bracket; Newton and secant iterate
//! from one or two starting points. All three report through [`RootResult`],
//! whose [`RootFlag`] tells convergence apart from the individual failure
//! modes.

use std::fmt;

use serde::{Serialize, Serializer};
use tracing::{debug, trace, warn};

use crate::error::Result;
use crate::result::{OptimizeResult, MSG_MAX_ITERATIONS};
use crate::utils::finite_difference;

use super::config::{RootConfig, RootMethod};

/// Smallest derivative (or secant slope) magnitude Newton and secant divide by.
pub const DERIVATIVE_TOLERANCE: f64 = 1e-14;

/// Diagnostic attached to a [`RootResult`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RootFlag {
    /// The tolerance was met
    Converged,

    /// Bisection was given a bracket without a sign change
    SignError,

    /// The derivative (or secant slope) vanished
    DerivativeZero,

    /// The iteration budget ran out
    MaxIterations,

    /// Bisection was not given a bracket `[a, b]` with `a < b`
    InvalidBracket,
}

impl fmt::Display for RootFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RootFlag::Converged => "converged",
            RootFlag::SignError => "f(a) and f(b) must have different signs",
            RootFlag::DerivativeZero => "derivative is zero",
            RootFlag::MaxIterations => MSG_MAX_ITERATIONS,
            RootFlag::InvalidBracket => "invalid bracket",
        };
        f.write_str(s)
    }
}

impl Serialize for RootFlag {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Result of a scalar root search.
#[derive(Debug, Clone, Serialize)]
pub struct RootResult {
    /// Estimated root (best point found on failure)
    pub root: f64,

    /// Function value at `root`
    pub fun: f64,

    /// Number of iterations performed
    pub iterations: usize,

    /// Number of evaluations of `f`, seeds included
    pub function_calls: usize,

    /// Whether the root was found to tolerance
    pub converged: bool,

    /// Why the search stopped
    pub flag: RootFlag,
}

impl fmt::Display for RootResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Root Result:")?;
        writeln!(f, "  Converged: {}", self.converged)?;
        writeln!(f, "  Flag: {}", self.flag)?;
        writeln!(f, "  Root: {:.12}", self.root)?;
        writeln!(f, "  f(root): {:.6e}", self.fun)?;
        writeln!(f, "  Iterations: {}", self.iterations)?;
        writeln!(f, "  Function calls: {}", self.function_calls)?;
        Ok(())
    }
}

impl OptimizeResult for RootResult {
    fn nfev(&self) -> usize {
        self.function_calls
    }

    fn nit(&self) -> usize {
        self.iterations
    }

    fn success(&self) -> bool {
        self.converged
    }

    fn message(&self) -> String {
        self.flag.to_string()
    }
}

impl RootResult {
    fn new(root: f64, fun: f64, iterations: usize, function_calls: usize, flag: RootFlag) -> Self {
        Self {
            root,
            fun,
            iterations,
            function_calls,
            converged: flag == RootFlag::Converged,
            flag,
        }
    }
}

/// Where a root search starts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RootStart {
    /// A bracket `[a, b]`
    Bracket(f64, f64),

    /// A single starting point
    Point(f64),

    /// Two starting points (secant seeds)
    Points(f64, f64),
}

/// Root finder for functions of one variable.
#[derive(Debug, Clone, Default)]
pub struct ScalarRootFinder {
    /// Configuration options
    config: RootConfig,
}

impl ScalarRootFinder {
    /// Create a new root finder with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new root finder with the given configuration.
    pub fn with_config(config: RootConfig) -> Self {
        Self { config }
    }

    /// Set the tolerance.
    pub fn with_xtol(mut self, xtol: f64) -> Self {
        self.config.xtol = xtol;
        self
    }

    /// Set the maximum number of iterations.
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.config.max_iterations = max_iterations;
        self
    }

    /// The configuration in use.
    pub fn config(&self) -> &RootConfig {
        &self.config
    }

    /// Find a root of `f` with the given method.
    ///
    /// Newton uses a finite-difference derivative here; call
    /// [`newton`](Self::newton) directly to supply an analytic one.
    ///
    /// * Bisection requires a [`RootStart::Bracket`]; anything else is
    ///   reported as [`RootFlag::InvalidBracket`] without evaluating `f`.
    /// * Newton starts from the point, the first of two points, or the
    ///   bracket midpoint.
    /// * Secant uses the given seeds, or the bracket ends, or synthesizes a
    ///   second seed next to a single point.
    pub fn root<F>(&self, f: F, method: RootMethod, start: RootStart) -> Result<RootResult>
    where
        F: Fn(f64) -> Result<f64>,
    {
        match (method, start) {
            (RootMethod::Bisect, RootStart::Bracket(a, b)) => self.bisect(f, a, b),
            (RootMethod::Bisect, _) => Ok(RootResult::new(
                f64::NAN,
                f64::NAN,
                0,
                0,
                RootFlag::InvalidBracket,
            )),
            (RootMethod::Newton, RootStart::Point(x0))
            | (RootMethod::Newton, RootStart::Points(x0, _)) => self.newton(f, x0, None),
            (RootMethod::Newton, RootStart::Bracket(a, b)) => self.newton(f, 0.5 * (a + b), None),
            (RootMethod::Secant, RootStart::Point(x0)) => self.secant(f, x0, None),
            (RootMethod::Secant, RootStart::Points(x0, x1))
            | (RootMethod::Secant, RootStart::Bracket(x0, x1)) => self.secant(f, x0, Some(x1)),
        }
    }

    /// Bisection on `[a, b]`.
    ///
    /// Requires `f(a)·f(b) <= 0`. When the signs agree the search stops
    /// after the two endpoint evaluations with [`RootFlag::SignError`] and
    /// reports `a`. An exact zero at an endpoint or midpoint ends the
    /// search immediately.
    pub fn bisect<F>(&self, f: F, a: f64, b: f64) -> Result<RootResult>
    where
        F: Fn(f64) -> Result<f64>,
    {
        if !(a < b) {
            return Ok(RootResult::new(a, f64::NAN, 0, 0, RootFlag::InvalidBracket));
        }

        let (mut a, mut b) = (a, b);
        let mut fa = f(a)?;
        let fb = f(b)?;
        let mut calls = 2;

        if fa == 0.0 {
            return Ok(RootResult::new(a, fa, 0, calls, RootFlag::Converged));
        }
        if fb == 0.0 {
            return Ok(RootResult::new(b, fb, 0, calls, RootFlag::Converged));
        }
        // Compare signs, not the product, which underflows for tiny values
        if fa.signum() == fb.signum() {
            warn!(a, b, fa, fb, "bisection bracket has no sign change");
            return Ok(RootResult::new(a, fa, 0, calls, RootFlag::SignError));
        }

        let mut mid = 0.5 * (a + b);
        let mut fmid = f64::NAN;
        for iteration in 1..=self.config.max_iterations {
            mid = 0.5 * (a + b);
            fmid = f(mid)?;
            calls += 1;
            trace!(iteration, a, b, mid, fmid, "bisection step");

            if fmid == 0.0 || 0.5 * (b - a) < self.config.xtol {
                debug!(iteration, calls, root = mid, "bisection converged");
                return Ok(RootResult::new(mid, fmid, iteration, calls, RootFlag::Converged));
            }

            if fmid.signum() == fa.signum() {
                a = mid;
                fa = fmid;
            } else {
                b = mid;
            }
        }

        debug!(calls, "bisection hit the iteration limit");
        Ok(RootResult::new(
            mid,
            fmid,
            self.config.max_iterations,
            calls,
            RootFlag::MaxIterations,
        ))
    }

    /// Newton's method from `x0`.
    ///
    /// Uses `fprime` when given, otherwise a symmetric finite difference
    /// with step `sqrt(eps)·max(|x|, 1)` (two extra evaluations of `f` per
    /// iteration, counted in `function_calls`). Evaluations of `fprime` are
    /// not counted. Converges when `|f(x)|` or the step falls below `xtol`.
    pub fn newton<F>(
        &self,
        f: F,
        x0: f64,
        fprime: Option<&dyn Fn(f64) -> Result<f64>>,
    ) -> Result<RootResult>
    where
        F: Fn(f64) -> Result<f64>,
    {
        let xtol = self.config.xtol;
        let mut x = x0;
        let mut fx = f(x)?;
        let mut calls = 1;

        if fx.abs() < xtol {
            return Ok(RootResult::new(x, fx, 0, calls, RootFlag::Converged));
        }

        for iteration in 1..=self.config.max_iterations {
            let dfx = match fprime {
                Some(df) => df(x)?,
                None => {
                    calls += 2;
                    finite_difference::derivative(&f, x)?
                }
            };

            if dfx.abs() < DERIVATIVE_TOLERANCE {
                warn!(iteration, x, dfx, "newton derivative vanished");
                return Ok(RootResult::new(
                    x,
                    fx,
                    iteration,
                    calls,
                    RootFlag::DerivativeZero,
                ));
            }

            let step = fx / dfx;
            x -= step;
            fx = f(x)?;
            calls += 1;
            trace!(iteration, x, fx, step, "newton step");

            if step.abs() < xtol || fx.abs() < xtol {
                debug!(iteration, calls, root = x, "newton converged");
                return Ok(RootResult::new(x, fx, iteration, calls, RootFlag::Converged));
            }
        }

        debug!(calls, "newton hit the iteration limit");
        Ok(RootResult::new(
            x,
            fx,
            self.config.max_iterations,
            calls,
            RootFlag::MaxIterations,
        ))
    }

    /// Secant method from the seeds `x0` and `x1`.
    ///
    /// When `x1` is not given it is placed at `x0 + 0.001·max(|x0|, 1)`.
    /// Both seed evaluations are counted. A vanishing secant slope is
    /// reported as [`RootFlag::DerivativeZero`].
    pub fn secant<F>(&self, f: F, x0: f64, x1: Option<f64>) -> Result<RootResult>
    where
        F: Fn(f64) -> Result<f64>,
    {
        let xtol = self.config.xtol;
        let mut x_prev = x0;
        let mut x = x1.unwrap_or(x0 + 0.001 * x0.abs().max(1.0));
        let mut f_prev = f(x_prev)?;
        let mut fx = f(x)?;
        let mut calls = 2;

        if fx.abs() < xtol {
            return Ok(RootResult::new(x, fx, 0, calls, RootFlag::Converged));
        }
        if f_prev.abs() < xtol {
            return Ok(RootResult::new(x_prev, f_prev, 0, calls, RootFlag::Converged));
        }

        for iteration in 1..=self.config.max_iterations {
            let slope = fx - f_prev;
            if slope.abs() < DERIVATIVE_TOLERANCE {
                warn!(iteration, x, "secant slope vanished");
                return Ok(RootResult::new(
                    x,
                    fx,
                    iteration,
                    calls,
                    RootFlag::DerivativeZero,
                ));
            }

            let step = fx * (x - x_prev) / slope;
            x_prev = x;
            f_prev = fx;
            x -= step;
            fx = f(x)?;
            calls += 1;
            trace!(iteration, x, fx, step, "secant step");

            if step.abs() < xtol || fx.abs() < xtol {
                debug!(iteration, calls, root = x, "secant converged");
                return Ok(RootResult::new(x, fx, iteration, calls, RootFlag::Converged));
            }
        }

        debug!(calls, "secant hit the iteration limit");
        Ok(RootResult::new(
            x,
            fx,
            self.config.max_iterations,
            calls,
            RootFlag::MaxIterations,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::cell::Cell;

    fn quadratic(x: f64) -> Result<f64> {
        Ok(x * x - 4.0)
    }

    #[test]
    fn test_flag_strings() {
        assert_eq!(RootFlag::Converged.to_string(), "converged");
        assert_eq!(
            RootFlag::SignError.to_string(),
            "f(a) and f(b) must have different signs"
        );
        assert_eq!(RootFlag::DerivativeZero.to_string(), "derivative is zero");
        assert_eq!(
            serde_json::to_string(&RootFlag::MaxIterations).unwrap(),
            "\"Maximum iterations reached\""
        );
    }

    #[test]
    fn test_bisect() {
        let result = ScalarRootFinder::new().bisect(quadratic, 0.0, 5.0).unwrap();
        assert!(result.converged);
        assert_eq!(result.flag, RootFlag::Converged);
        assert_relative_eq!(result.root, 2.0, epsilon = 1e-11);
        assert_eq!(result.function_calls, result.iterations + 2);
    }

    #[test]
    fn test_bisect_exact_hit() {
        // midpoint of [0, 4] is the root
        let result = ScalarRootFinder::new().bisect(quadratic, 0.0, 4.0).unwrap();
        assert!(result.converged);
        assert_eq!(result.root, 2.0);
        assert_eq!(result.iterations, 1);
        assert_eq!(result.function_calls, 3);

        // root at an endpoint
        let result = ScalarRootFinder::new().bisect(quadratic, 2.0, 3.0).unwrap();
        assert!(result.converged);
        assert_eq!(result.root, 2.0);
        assert_eq!(result.function_calls, 2);
    }

    #[test]
    fn test_bisect_same_sign() {
        let calls = Cell::new(0);
        let f = |x: f64| -> Result<f64> {
            calls.set(calls.get() + 1);
            Ok(x * x + 1.0)
        };

        let result = ScalarRootFinder::new().bisect(&f, -1.0, 1.0).unwrap();
        assert!(!result.converged);
        assert_eq!(result.flag, RootFlag::SignError);
        assert_eq!(result.function_calls, 2);
        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn test_bisect_tiny_values() {
        // f(a)·f(b) underflows to zero for these magnitudes
        let positive = |_: f64| -> Result<f64> { Ok(1e-200) };
        let result = ScalarRootFinder::new().bisect(positive, 0.0, 1.0).unwrap();
        assert!(!result.converged);
        assert_eq!(result.flag, RootFlag::SignError);
        assert_eq!(result.function_calls, 2);

        let scaled_line = |x: f64| -> Result<f64> { Ok(1e-200 * (x - 0.3)) };
        let result = ScalarRootFinder::new().bisect(scaled_line, 0.0, 1.0).unwrap();
        assert!(result.converged);
        assert_relative_eq!(result.root, 0.3, epsilon = 1e-11);
    }

    #[test]
    fn test_bisect_invalid_bracket() {
        let result = ScalarRootFinder::new().bisect(quadratic, 5.0, 0.0).unwrap();
        assert_eq!(result.flag, RootFlag::InvalidBracket);
        assert_eq!(result.function_calls, 0);
    }

    #[test]
    fn test_newton_numeric_derivative() {
        let result = ScalarRootFinder::new().newton(quadratic, 5.0, None).unwrap();
        assert!(result.converged);
        assert_relative_eq!(result.root, 2.0, epsilon = 1e-10);
        // one initial call, then three per iteration
        assert_eq!(result.function_calls, 1 + 3 * result.iterations);
    }

    #[test]
    fn test_newton_analytic_derivative() {
        let fprime = |x: f64| -> Result<f64> { Ok(2.0 * x) };
        let result = ScalarRootFinder::new()
            .newton(quadratic, 5.0, Some(&fprime))
            .unwrap();
        assert!(result.converged);
        assert_relative_eq!(result.root, 2.0, epsilon = 1e-10);
        assert_eq!(result.function_calls, 1 + result.iterations);
    }

    #[test]
    fn test_newton_zero_derivative() {
        // f'(0) = 0 for x^2 + 1
        let f = |x: f64| -> Result<f64> { Ok(x * x + 1.0) };
        let fprime = |x: f64| -> Result<f64> { Ok(2.0 * x) };
        let result = ScalarRootFinder::new().newton(f, 0.0, Some(&fprime)).unwrap();
        assert!(!result.converged);
        assert_eq!(result.flag, RootFlag::DerivativeZero);
        assert_eq!(result.root, 0.0);
    }

    #[test]
    fn test_secant() {
        let result = ScalarRootFinder::new().secant(quadratic, 5.0, None).unwrap();
        assert!(result.converged);
        assert_relative_eq!(result.root, 2.0, epsilon = 1e-10);
        assert_eq!(result.function_calls, 2 + result.iterations);

        let result = ScalarRootFinder::new()
            .secant(|x: f64| Ok(x.cos() - x), 0.0, Some(1.0))
            .unwrap();
        assert!(result.converged);
        assert_relative_eq!(result.root, 0.739_085_133_215_160_6, epsilon = 1e-10);
    }

    #[test]
    fn test_secant_flat() {
        let result = ScalarRootFinder::new()
            .secant(|_: f64| Ok(3.0), 1.0, Some(2.0))
            .unwrap();
        assert_eq!(result.flag, RootFlag::DerivativeZero);
        assert_eq!(result.function_calls, 2);
    }

    #[test]
    fn test_dispatch() {
        let finder = ScalarRootFinder::new();
        for (method, start) in [
            (RootMethod::Bisect, RootStart::Bracket(0.0, 5.0)),
            (RootMethod::Newton, RootStart::Point(5.0)),
            (RootMethod::Newton, RootStart::Bracket(1.0, 5.0)),
            (RootMethod::Secant, RootStart::Point(5.0)),
            (RootMethod::Secant, RootStart::Points(1.0, 5.0)),
        ] {
            let result = finder.root(quadratic, method, start).unwrap();
            assert!(result.converged, "{:?} from {:?}", method, start);
            assert_relative_eq!(result.root, 2.0, epsilon = 1e-9);
        }

        let result = finder
            .root(quadratic, RootMethod::Bisect, RootStart::Point(1.0))
            .unwrap();
        assert_eq!(result.flag, RootFlag::InvalidBracket);
    }

    #[test]
    fn test_max_iterations() {
        let result = ScalarRootFinder::new()
            .with_max_iterations(3)
            .bisect(quadratic, 0.0, 5.0)
            .unwrap();
        assert!(!result.converged);
        assert_eq!(result.flag, RootFlag::MaxIterations);
        assert_eq!(result.iterations, 3);
        assert_eq!(result.function_calls, 5);
    }
}
