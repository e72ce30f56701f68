use thiserror::Error;

/// Failures at the eigen-solver seam. The factor analyzer absorbs all of them
/// into its identity fallback, so none reach the caller of the engine.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnalyticsError {
    #[error("Matrix must be square, got {rows}x{cols}")]
    NotSquare { rows: usize, cols: usize },

    #[error("Eigen-decomposition failed: {0}")]
    Decomposition(String),

    #[error("Eigen-decomposition returned degenerate output: {0}")]
    Degenerate(String),
}
