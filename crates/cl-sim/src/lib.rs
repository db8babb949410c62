//! Time integration of the two-fluid zero-dimensional coronal loop.
//!
//! Provides:
//! - The loop right-hand side (electron pressure, ion pressure, density)
//! - Fixed-point initial conditions from the t=0 heating rate
//! - Forward Euler, classical RK4 and step-doubling adaptive RK4 integrators
//! - The loop engine that drives a run and fills the results buffer

pub mod engine;
pub mod error;
pub mod initial;
pub mod integrator;
pub mod loop_model;
pub mod model;
pub mod results;
pub mod state;

pub use engine::{EnginePhase, LoopEngine, RunSummary, SimOptions, SimProgress, Solver};
pub use error::{SimError, SimResult};
pub use initial::{InitialConditionSolver, InitialConditions};
pub use integrator::{AdaptiveRk4, AdaptiveStep, ForwardEuler, Integrator, RK4, StepController};
pub use loop_model::LoopModel;
pub use model::TransientModel;
pub use results::{LoopResults, LoopRow};
pub use state::LoopState;
