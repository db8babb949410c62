//! Immutable loop parameters shared by every physics calculation.

use crate::abundance::AbundanceCorrection;
use crate::error::{PhysicsError, PhysicsResult};
use cl_core::ensure_positive;

/// Physical parameters of a single loop, fixed for the whole run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LoopParameters {
    /// Loop half-length (cm)
    pub loop_length: f64,
    /// Flux limiter coefficient used when conduction saturates
    pub saturation_limit: f64,
    /// C1 asymptote for conduction-dominated (under-dense) loops
    pub c1_cond0: f64,
    /// C1 asymptote for radiation-dominated (over-dense) loops
    pub c1_rad0: f64,
    pub use_c1_loss_correction: bool,
    pub use_c1_grav_correction: bool,
    /// Pure Spitzer conduction, no saturation bound
    pub use_spitzer_conductivity: bool,
    pub abundance: AbundanceCorrection,
}

impl LoopParameters {
    /// Check that every parameter is usable by the closure calculations.
    pub fn validate(&self) -> PhysicsResult<()> {
        ensure_positive(self.loop_length, "loop_length")?;
        if !self.use_spitzer_conductivity {
            ensure_positive(self.saturation_limit, "saturation_limit")?;
        }
        for (what, value) in [("c1_cond0", self.c1_cond0), ("c1_rad0", self.c1_rad0)] {
            if !(value.is_finite() && value >= 0.0) {
                return Err(PhysicsError::NonPhysical { what, value });
            }
        }
        Ok(())
    }
}
