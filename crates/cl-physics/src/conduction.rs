//! Species-dependent thermal conduction.

use crate::abundance::AbundanceCorrection;
use crate::closure::ClosureCoefficients;
use crate::params::LoopParameters;
use cl_core::constants::{
    BOLTZMANN_CONSTANT, ELECTRON_MASS, PROTON_MASS, SPITZER_ELECTRON_CONDUCTIVITY,
    SPITZER_ION_CONDUCTIVITY,
};

/// Particle species carrying a conductive heat flux.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Species {
    Electron,
    Ion,
}

/// Constants entering the flux of one species.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpeciesConstants {
    /// Spitzer conductivity coefficient
    pub kappa: f64,
    /// Particle mass (g)
    pub mass: f64,
    /// Effective Boltzmann constant (erg/K)
    pub k_b: f64,
}

impl Species {
    pub fn constants(self, abundance: &AbundanceCorrection) -> SpeciesConstants {
        match self {
            Species::Electron => SpeciesConstants {
                kappa: SPITZER_ELECTRON_CONDUCTIVITY,
                mass: ELECTRON_MASS,
                k_b: BOLTZMANN_CONSTANT,
            },
            Species::Ion => SpeciesConstants {
                kappa: SPITZER_ION_CONDUCTIVITY,
                mass: abundance.ion_mass_correction * PROTON_MASS,
                k_b: abundance.boltzmann_correction * BOLTZMANN_CONSTANT,
            },
        }
    }
}

/// Conductive heat flux out of the corona.
///
/// The classical Spitzer flux is `-(2/7) κ (T/C2)^{7/2} / L`. Unless pure
/// Spitzer conduction is requested, it is blended with the free-streaming
/// bound `f_s`. The blend never exceeds `min(|f_c|, |f_s|)` in magnitude and the
/// transition between the two regimes stays smooth.
#[derive(Debug, Clone, Copy)]
pub struct ThermalConduction {
    loop_length: f64,
    saturation_limit: f64,
    spitzer_only: bool,
    electron: SpeciesConstants,
    ion: SpeciesConstants,
}

impl ThermalConduction {
    pub fn new(params: &LoopParameters) -> Self {
        Self {
            loop_length: params.loop_length,
            saturation_limit: params.saturation_limit,
            spitzer_only: params.use_spitzer_conductivity,
            electron: Species::Electron.constants(&params.abundance),
            ion: Species::Ion.constants(&params.abundance),
        }
    }

    pub fn species(&self, species: Species) -> &SpeciesConstants {
        match species {
            Species::Electron => &self.electron,
            Species::Ion => &self.ion,
        }
    }

    /// Classical (unlimited) Spitzer flux.
    pub fn classical_flux(&self, temperature: f64, species: Species) -> f64 {
        let kappa = self.species(species).kappa;
        -2.0 / 7.0 * kappa * (temperature / ClosureCoefficients::c2()).powf(3.5) / self.loop_length
    }

    /// Free-streaming (saturated) flux bound.
    pub fn saturated_flux(&self, temperature: f64, density: f64, species: Species) -> f64 {
        let c = self.species(species);
        -self.saturation_limit * 1.5 / c.mass.sqrt() * density * (c.k_b * temperature).powf(1.5)
    }

    /// Heat flux (erg cm^-2 s^-1); negative means directed out of the corona.
    pub fn flux(&self, temperature: f64, density: f64, species: Species) -> f64 {
        let f_c = self.classical_flux(temperature, species);
        if self.spitzer_only {
            return f_c;
        }
        let f_s = self.saturated_flux(temperature, density, species);
        -f_c * f_s / (f_c * f_c + f_s * f_s).sqrt()
    }
}
