//! Root finding for square systems of nonlinear equations.

pub mod newton;

// Re-export key types
pub use newton::{
    MultiRootResult, NewtonConfig, NewtonSolver, MSG_NOT_SQUARE, MSG_SINGULAR_JACOBIAN,
};
