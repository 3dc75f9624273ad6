//! Nelder-Mead simplex algorithm for derivative-free minimization.

use std::fmt;

use ndarray::Array1;
use serde::Serialize;
use tracing::{debug, trace};

use crate::error::Result;
use crate::result::{serialize_vector, OptimizeResult, MSG_MAX_ITERATIONS, MSG_SUCCESS};

use super::config::NelderMeadConfig;

/// Relative perturbation used to build the initial simplex.
const NONZERO_DELTA: f64 = 0.05;

/// Absolute perturbation used for coordinates that are (nearly) zero.
const ZERO_DELTA: f64 = 0.00025;

/// Coordinates with a smaller magnitude count as zero.
const ZERO_THRESHOLD: f64 = 1e-10;

/// Message reported when the evaluation budget runs out.
pub const MSG_MAX_FEV: &str = "Maximum number of function evaluations has been exceeded.";

/// Result of a Nelder-Mead minimization.
#[derive(Debug, Clone, Serialize)]
pub struct SimplexResult {
    /// Best vertex found
    #[serde(serialize_with = "serialize_vector")]
    pub x: Array1<f64>,

    /// Function value at `x`
    pub fun: f64,

    /// Number of function evaluations
    pub nfev: usize,

    /// Number of iterations performed
    pub nit: usize,

    /// Whether both tolerances were met
    pub success: bool,

    /// A message describing the result
    pub message: String,
}

impl fmt::Display for SimplexResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Nelder-Mead Result:")?;
        writeln!(f, "  Success: {}", self.success)?;
        writeln!(f, "  Message: {}", self.message)?;
        writeln!(f, "  f(x): {:.6e}", self.fun)?;
        writeln!(f, "  Iterations: {}", self.nit)?;
        writeln!(f, "  Function evaluations: {}", self.nfev)?;
        writeln!(f, "  x: {:?}", self.x)?;
        Ok(())
    }
}

impl OptimizeResult for SimplexResult {
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

/// Working simplex: `n + 1` vertices and their function values.
///
/// After [`sort`](Simplex::sort) the best vertex is first and the worst last.
struct Simplex {
    vertices: Vec<Array1<f64>>,
    values: Vec<f64>,
}

impl Simplex {
    fn sort(&mut self) {
        let mut order: Vec<usize> = (0..self.values.len()).collect();
        order.sort_by(|&i, &j| self.values[i].total_cmp(&self.values[j]));
        self.vertices = order.iter().map(|&i| self.vertices[i].clone()).collect();
        self.values = order.iter().map(|&i| self.values[i]).collect();
    }

    fn worst(&self) -> usize {
        self.values.len() - 1
    }

    fn replace_worst(&mut self, x: Array1<f64>, fx: f64) {
        let w = self.worst();
        self.vertices[w] = x;
        self.values[w] = fx;
    }

    /// Spread of function values over the vertices (sorted simplex).
    fn value_range(&self) -> f64 {
        (self.values[self.worst()] - self.values[0]).abs()
    }

    /// Largest coordinate-wise distance of any vertex from the best one.
    fn max_spread(&self) -> f64 {
        let best = &self.vertices[0];
        self.vertices[1..]
            .iter()
            .flat_map(|v| v.iter().zip(best.iter()).map(|(a, b)| (a - b).abs()))
            .fold(0.0, f64::max)
    }

    /// Centroid of every vertex but the worst.
    fn centroid(&self) -> Array1<f64> {
        let n = self.worst();
        let mut c = Array1::<f64>::zeros(self.vertices[0].len());
        for v in &self.vertices[..n] {
            c += v;
        }
        c / n as f64
    }
}

/// Step taken by one iteration, for tracing.
#[derive(Debug, Clone, Copy)]
enum Move {
    Reflect,
    Expand,
    ContractOutside,
    ContractInside,
    Shrink,
}

/// The Nelder-Mead simplex minimizer.
#[derive(Debug, Clone, Default)]
pub struct NelderMead {
    /// Configuration options
    config: NelderMeadConfig,
}

impl NelderMead {
    /// Create a new minimizer with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new minimizer with the given configuration.
    pub fn with_config(config: NelderMeadConfig) -> Self {
        Self { config }
    }

    /// Set the tolerance on vertex spread.
    pub fn with_xtol(mut self, xtol: f64) -> Self {
        self.config.xtol = xtol;
        self
    }

    /// Set the tolerance on the spread of function values.
    pub fn with_ftol(mut self, ftol: f64) -> Self {
        self.config.ftol = ftol;
        self
    }

    /// Set the maximum number of iterations.
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.config.max_iterations = Some(max_iterations);
        self
    }

    /// Set the maximum number of function evaluations.
    pub fn with_max_fev(mut self, max_fev: usize) -> Self {
        self.config.max_fev = Some(max_fev);
        self
    }

    /// The configuration in use.
    pub fn config(&self) -> &NelderMeadConfig {
        &self.config
    }

    /// Minimize `f` starting from `x0`.
    ///
    /// The initial simplex is `x0` plus one vertex per axis, moved by 5% of
    /// the coordinate (or by 0.00025 when the coordinate is zero). An empty
    /// `x0` is reported as a failed result without evaluating `f`.
    pub fn minimize<F>(&self, f: F, x0: &Array1<f64>) -> Result<SimplexResult>
    where
        F: Fn(&Array1<f64>) -> Result<f64>,
    {
        let n = x0.len();
        if n == 0 {
            return Ok(SimplexResult {
                x: x0.clone(),
                fun: f64::NAN,
                nfev: 0,
                nit: 0,
                success: false,
                message: "Initial guess must not be empty".to_string(),
            });
        }

        let cfg = &self.config;
        let max_iterations = cfg.iteration_limit(n);
        let max_fev = cfg.max_fev.unwrap_or(usize::MAX);

        let mut vertices = Vec::with_capacity(n + 1);
        vertices.push(x0.clone());
        for i in 0..n {
            let mut v = x0.clone();
            if v[i].abs() > ZERO_THRESHOLD {
                v[i] *= 1.0 + NONZERO_DELTA;
            } else {
                v[i] = ZERO_DELTA;
            }
            vertices.push(v);
        }
        let values = vertices.iter().map(&f).collect::<Result<Vec<f64>>>()?;
        let mut nfev = n + 1;
        let mut simplex = Simplex { vertices, values };

        let mut nit = 0;
        let (success, message) = loop {
            simplex.sort();

            if simplex.value_range() < cfg.ftol && simplex.max_spread() < cfg.xtol {
                break (true, MSG_SUCCESS);
            }
            if nit >= max_iterations {
                break (false, MSG_MAX_ITERATIONS);
            }
            if nfev >= max_fev {
                break (false, MSG_MAX_FEV);
            }
            nit += 1;

            let worst = simplex.worst();
            let centroid = simplex.centroid();

            let xr = &centroid + &((&centroid - &simplex.vertices[worst]) * cfg.reflection);
            let fr = f(&xr)?;
            nfev += 1;

            let step = if fr < simplex.values[0] {
                let xe = &centroid + &((&xr - &centroid) * cfg.expansion);
                let fe = f(&xe)?;
                nfev += 1;
                if fe < fr {
                    simplex.replace_worst(xe, fe);
                    Move::Expand
                } else {
                    simplex.replace_worst(xr, fr);
                    Move::Reflect
                }
            } else if fr < simplex.values[worst - 1] {
                simplex.replace_worst(xr, fr);
                Move::Reflect
            } else {
                let contracted = if fr < simplex.values[worst] {
                    let xc = &centroid + &((&xr - &centroid) * cfg.contraction);
                    let fc = f(&xc)?;
                    nfev += 1;
                    (fc <= fr).then_some((xc, fc, Move::ContractOutside))
                } else {
                    let xcc = &centroid + &((&simplex.vertices[worst] - &centroid) * cfg.contraction);
                    let fcc = f(&xcc)?;
                    nfev += 1;
                    (fcc < simplex.values[worst]).then_some((xcc, fcc, Move::ContractInside))
                };

                match contracted {
                    Some((xc, fc, step)) => {
                        simplex.replace_worst(xc, fc);
                        step
                    }
                    None => {
                        let best = simplex.vertices[0].clone();
                        for i in 1..=worst {
                            let v = &best + &((&simplex.vertices[i] - &best) * cfg.shrink);
                            simplex.values[i] = f(&v)?;
                            simplex.vertices[i] = v;
                        }
                        nfev += worst;
                        Move::Shrink
                    }
                }
            };
            trace!(nit, nfev, ?step, best = simplex.values[0], "nelder-mead step");
        };

        debug!(nit, nfev, success, fun = simplex.values[0], "nelder-mead finished");
        Ok(SimplexResult {
            x: simplex.vertices[0].clone(),
            fun: simplex.values[0],
            nfev,
            nit,
            success,
            message: message.to_string(),
        })
    }
}
