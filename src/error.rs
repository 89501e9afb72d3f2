//! Error hierarchy for the QAP engine.
//!
//! Structural errors (bad files, bad dimensions, unknown methods, invalid
//! configuration) are returned before a run starts. `ProjectionDivergence`
//! and `NumericalInstability` are raised by the numerical kernels and are
//! recovered inside the orchestrator; they never escape a `solve` call.

use thiserror::Error;

/// Root error type for all engine failures.
#[derive(Error, Debug)]
pub enum QapError {
    /// Instance or solution text could not be parsed.
    #[error("format error at line {line}: {message}")]
    Format { line: usize, message: String },

    /// Reading an instance file failed.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Matrices are non-square, mismatched, too small, or contain
    /// negative or non-finite entries.
    #[error("invalid problem: {0}")]
    InvalidProblem(String),

    /// No method is registered under the requested name.
    #[error("method not found: {0}")]
    MethodNotFound(String),

    /// Solve configuration or method parameters are invalid.
    #[error("invalid config: {0}")]
    InvalidConfig(String),

    /// Sinkhorn normalisation did not reach the tolerance.
    #[error("projection diverged after {iterations} iterations (residual {residual:e})")]
    ProjectionDivergence { iterations: usize, residual: f64 },

    /// An iterate contains NaN or infinite entries.
    #[error("numerical instability: {0}")]
    NumericalInstability(String),

    /// A matrix or warm start does not match the problem size.
    #[error("dimension mismatch: expected {expected}, found {found}")]
    DimensionMismatch { expected: usize, found: usize },
}

impl QapError {
    pub(crate) fn format(line: usize, message: impl Into<String>) -> Self {
        QapError::Format {
            line,
            message: message.into(),
        }
    }
}

pub type QapResult<T> = Result<T, QapError>;
