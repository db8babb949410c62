//! Application service layer for coronal loop runs.
//!
//! Turns configuration files into physics collaborators, drives the loop
//! engine, and writes results. Shared by the CLI and batch drivers.

pub mod assemble;
pub mod error;
pub mod progress;
pub mod project_service;
pub mod run_service;

pub use assemble::{LoopSetup, assemble};
pub use error::{AppError, AppResult};
pub use progress::{RunProgressEvent, RunStage, TransientProgress};
pub use project_service::{LoopDescription, config_dir, describe, load_config};
pub use run_service::{
    RunOptions, RunRequest, RunResponse, RunTimingSummary, run_batch, run_config,
    run_config_with_progress, run_loop, run_loop_with_progress,
};
