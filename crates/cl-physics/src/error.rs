//! Physics model errors.

use cl_core::ClError;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for physics operations.
pub type PhysicsResult<T> = Result<T, PhysicsError>;

/// Errors raised while building or evaluating the physics models.
#[derive(Error, Debug)]
pub enum PhysicsError {
    /// Non-physical values (negative density, temperature, etc.).
    #[error("Non-physical value for {what}: {value}")]
    NonPhysical { what: &'static str, value: f64 },

    /// Invalid argument.
    #[error("Invalid argument: {what}")]
    InvalidArg { what: String },

    /// Malformed radiative loss table.
    #[error("Parse error in {path} line {line}: {message}")]
    Parse {
        path: PathBuf,
        line: usize,
        message: String,
    },

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl From<ClError> for PhysicsError {
    fn from(err: ClError) -> Self {
        match err {
            ClError::NonFinite { what, value } | ClError::NonPositive { what, value } => {
                PhysicsError::NonPhysical { what, value }
            }
        }
    }
}
