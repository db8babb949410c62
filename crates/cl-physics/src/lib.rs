//! cl-physics: closure physics for the two-fluid coronal loop.
//!
//! Provides:
//! - Helium abundance corrections to the ion equation of state
//! - Species-dependent thermal conduction (Spitzer, optionally flux limited)
//! - Closure coefficients C1, C2, C3 plus collision frequency and scale height
//! - Radiative loss models (piecewise power law, tabulated)
//! - Time-dependent heating profiles
//! - Differential emission measure accumulation
//!
//! # Architecture
//!
//! Radiation and heating are consulted through the `RadiativeLoss` and `Heating`
//! traits so the derivative function never knows which backing model is in use.
//! Everything else here is a deterministic function of temperature, density and
//! the immutable `LoopParameters`.

pub mod abundance;
pub mod closure;
pub mod conduction;
pub mod dem;
pub mod error;
pub mod heating;
pub mod params;
pub mod radiation;

pub use abundance::AbundanceCorrection;
pub use closure::{C1_EQUILIBRIUM, ClosureCoefficients};
pub use conduction::{Species, SpeciesConstants, ThermalConduction};
pub use dem::{BinnedDem, DemAccumulator, DemBins};
pub use error::{PhysicsError, PhysicsResult};
pub use heating::{EventHeating, HeatedSpecies, Heating, HeatingEvent, PulseShape};
pub use params::LoopParameters;
pub use radiation::{PowerLawRadiation, RadiativeLoss, TabulatedRadiation};
