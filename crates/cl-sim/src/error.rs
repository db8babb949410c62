//! Error types for simulation operations.

use thiserror::Error;

/// Errors encountered during a loop run.
#[derive(Error, Debug)]
pub enum SimError {
    #[error("Invalid argument: {what}")]
    InvalidArg { what: String },

    #[error("Non-physical condition at t = {time} s: {what}")]
    NonPhysical { what: String, time: f64 },

    #[error("Engine is {found}, expected {expected}")]
    InvalidPhase {
        expected: &'static str,
        found: &'static str,
    },

    #[error("Backend error: {message}")]
    Backend { message: String },
}

pub type SimResult<T> = Result<T, SimError>;

impl From<cl_physics::PhysicsError> for SimError {
    fn from(e: cl_physics::PhysicsError) -> Self {
        SimError::Backend {
            message: e.to_string(),
        }
    }
}

impl From<cl_core::ClError> for SimError {
    fn from(e: cl_core::ClError) -> Self {
        SimError::Backend {
            message: e.to_string(),
        }
    }
}
