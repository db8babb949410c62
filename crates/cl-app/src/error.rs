//! Error types for the cl-app service layer.

use std::path::PathBuf;

/// Wraps the backend crate errors behind one interface for the CLI.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Project(String),

    #[error("Failed to read configuration file: {path}")]
    ConfigFileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Physics setup failed: {0}")]
    Physics(String),

    #[error("Simulation error: {0}")]
    Simulation(String),

    #[error("Results error: {0}")]
    Results(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for cl-app operations.
pub type AppResult<T> = Result<T, AppError>;

impl From<cl_project::ProjectError> for AppError {
    fn from(err: cl_project::ProjectError) -> Self {
        AppError::Project(err.to_string())
    }
}

impl From<cl_physics::PhysicsError> for AppError {
    fn from(err: cl_physics::PhysicsError) -> Self {
        AppError::Physics(err.to_string())
    }
}

impl From<cl_sim::SimError> for AppError {
    fn from(err: cl_sim::SimError) -> Self {
        AppError::Simulation(err.to_string())
    }
}

impl From<cl_results::ResultsError> for AppError {
    fn from(err: cl_results::ResultsError) -> Self {
        AppError::Results(err.to_string())
    }
}
