//! Loop state vector.

use cl_core::constants::BOLTZMANN_CONSTANT;
use nalgebra::Vector3;

/// Electron pressure, ion pressure (dyn cm^-2) and density (cm^-3).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LoopState(pub Vector3<f64>);

impl LoopState {
    pub fn new(pressure_e: f64, pressure_i: f64, density: f64) -> Self {
        Self(Vector3::new(pressure_e, pressure_i, density))
    }

    pub fn pressure_e(&self) -> f64 {
        self.0[0]
    }

    pub fn pressure_i(&self) -> f64 {
        self.0[1]
    }

    pub fn density(&self) -> f64 {
        self.0[2]
    }

    pub fn temperature_e(&self) -> f64 {
        self.pressure_e() / (BOLTZMANN_CONSTANT * self.density())
    }

    /// Ion temperature; `boltzmann_correction` accounts for helium.
    pub fn temperature_i(&self, boltzmann_correction: f64) -> f64 {
        self.pressure_i() / (boltzmann_correction * BOLTZMANN_CONSTANT * self.density())
    }

    /// Every component finite and strictly positive.
    pub fn is_physical(&self) -> bool {
        self.0.iter().all(|v| v.is_finite() && *v > 0.0)
    }
}
