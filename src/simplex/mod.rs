//! Derivative-free minimization over ℝⁿ with the Nelder-Mead simplex method.

pub mod config;
pub mod nelder_mead;

// Re-export key types
pub use config::NelderMeadConfig;
pub use nelder_mead::{NelderMead, SimplexResult, MSG_MAX_FEV};
