//! Scalar minimization and root finding.
//!
//! [`ScalarMinimizer`] provides golden-section search and Brent's method on a
//! bracket; [`ScalarRootFinder`] provides bisection, Newton, and secant.

pub mod config;
pub mod minimize;
pub mod root;

// Re-export key types
pub use config::{MinimizeMethod, RootConfig, RootMethod, ScalarMinimizeConfig};
pub use minimize::{ScalarMinimizeResult, ScalarMinimizer, RESPHI};
pub use root::{RootFlag, RootResult, RootStart, ScalarRootFinder};
