//! Closure coefficients of the zero-dimensional loop model.

use crate::conduction::Species;
use crate::params::LoopParameters;
use crate::radiation::RadiativeLoss;
use cl_core::constants::{
    BOLTZMANN_CONSTANT, ELECTRON_CHARGE_POWER_4, ELECTRON_MASS, PROTON_MASS,
    SOLAR_SURFACE_GRAVITY,
};
use std::f64::consts::PI;

/// C1 of a loop in static equilibrium.
pub const C1_EQUILIBRIUM: f64 = 2.0;

/// Ratio of transition-region to coronal radiative losses (C1), the fixed
/// average-to-apex temperature ratio (C2) and base-to-apex ratio (C3), plus
/// the collision frequency and scale height the closure depends on.
#[derive(Debug, Clone, Copy)]
pub struct ClosureCoefficients {
    params: LoopParameters,
}

impl ClosureCoefficients {
    pub fn new(params: &LoopParameters) -> Self {
        Self { params: *params }
    }

    pub fn c2() -> f64 {
        0.9
    }

    pub fn c3() -> f64 {
        0.6
    }

    /// C1 as a function of the current electron/ion temperature and density.
    ///
    /// The equilibrium density at `temperature_e` sets the scale: under-dense
    /// loops relax toward `c1_cond0`, over-dense loops toward `c1_rad0`, and
    /// both branches meet at `C1_EQUILIBRIUM` when the density is exactly the
    /// equilibrium one.
    pub fn c1(
        &self,
        radiation: &dyn RadiativeLoss,
        temperature_e: f64,
        temperature_i: f64,
        density: f64,
    ) -> f64 {
        let p = &self.params;
        let radiative_loss = radiation.loss_rate(temperature_e.log10());

        let grav_correction = if p.use_c1_grav_correction {
            let scale_height = self.scale_height(temperature_e, temperature_i);
            (4.0 * (PI / 5.0).sin() * p.loop_length / (PI * scale_height)).exp()
        } else {
            1.0
        };
        let loss_correction = if p.use_c1_loss_correction {
            1.95e-18 * temperature_e.powf(-2.0 / 3.0) / radiative_loss
        } else {
            1.0
        };

        let density_eqm_2 = self.total_conductivity()
            * (temperature_e / Self::c2()).powf(3.5)
            / (3.5
                * p.loop_length
                * p.loop_length
                * C1_EQUILIBRIUM
                * loss_correction
                * grav_correction
                * radiative_loss);
        let density_ratio = density * density / density_eqm_2;

        let c1 = if density_ratio < 1.0 {
            (2.0 * C1_EQUILIBRIUM + p.c1_cond0 * (1.0 / density_ratio - 1.0))
                / (1.0 + 1.0 / density_ratio)
        } else {
            (2.0 * C1_EQUILIBRIUM + p.c1_rad0 * (density_ratio - 1.0)) / (1.0 + density_ratio)
        };

        c1 * loss_correction * grav_correction
    }

    /// Electron-ion collision frequency (s^-1).
    ///
    /// The Coulomb logarithm below has no known literature source. It is kept
    /// exactly as calibrated so runs stay comparable, but treat it as
    /// physically unverified.
    pub fn collision_frequency(&self, temperature_e: f64, density: f64) -> f64 {
        let coulomb_logarithm = 23.0
            - ((density / 1.0e13).sqrt()
                * (BOLTZMANN_CONSTANT * temperature_e / 1.602e-9).powf(-1.5))
            .ln();
        16.0 * PI.sqrt() / 3.0 * ELECTRON_CHARGE_POWER_4
            / (self.params.abundance.ion_mass_correction * PROTON_MASS * ELECTRON_MASS)
            * (2.0 * BOLTZMANN_CONSTANT * temperature_e / ELECTRON_MASS).powf(-1.5)
            * density
            * coulomb_logarithm
    }

    /// Gravitational pressure scale height (cm).
    pub fn scale_height(&self, temperature_e: f64, temperature_i: f64) -> f64 {
        let abundance = &self.params.abundance;
        BOLTZMANN_CONSTANT * (temperature_e + abundance.boltzmann_correction * temperature_i)
            / (abundance.ion_mass_correction * PROTON_MASS)
            / SOLAR_SURFACE_GRAVITY
    }

    /// Conduction coefficient summed over both species.
    pub fn total_conductivity(&self) -> f64 {
        let a = &self.params.abundance;
        Species::Electron.constants(a).kappa + Species::Ion.constants(a).kappa
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::fixtures::spitzer_loop;
    use crate::radiation::PowerLawRadiation;
    use cl_core::constants::{SPITZER_ELECTRON_CONDUCTIVITY, SPITZER_ION_CONDUCTIVITY};
    use proptest::prelude::*;

    fn equilibrium_density(closure: &ClosureCoefficients, t: f64) -> f64 {
        // With corrections disabled the branch boundary sits at this density
        let rad = PowerLawRadiation::new().loss_rate(t.log10());
        let l = closure.params.loop_length;
        ((SPITZER_ELECTRON_CONDUCTIVITY + SPITZER_ION_CONDUCTIVITY) * (t / 0.9_f64).powf(3.5)
            / (3.5 * l * l * C1_EQUILIBRIUM * rad))
            .sqrt()
    }

    #[test]
    fn c2_and_c3_are_fixed() {
        assert_eq!(ClosureCoefficients::c2(), 0.9);
        assert_eq!(ClosureCoefficients::c3(), 0.6);
    }

    #[test]
    fn c1_is_equilibrium_value_at_equilibrium_density() {
        let closure = ClosureCoefficients::new(&spitzer_loop());
        let rad = PowerLawRadiation::new();
        let t = 3.0e6;
        let n = equilibrium_density(&closure, t);
        let c1 = closure.c1(&rad, t, t, n);
        assert!((c1 - C1_EQUILIBRIUM).abs() < 1e-6);
    }

    #[test]
    fn c1_tends_to_asymptotes() {
        let params = spitzer_loop();
        let closure = ClosureCoefficients::new(&params);
        let rad = PowerLawRadiation::new();
        let t = 3.0e6;
        let n = equilibrium_density(&closure, t);
        let under = closure.c1(&rad, t, t, n * 1e-4);
        let over = closure.c1(&rad, t, t, n * 1e4);
        assert!((under - params.c1_cond0).abs() < 1e-3);
        assert!((over - params.c1_rad0).abs() < 1e-3);
    }

    #[test]
    fn corrections_scale_c1() {
        let base = spitzer_loop();
        let grav = LoopParameters {
            use_c1_grav_correction: true,
            ..base
        };
        let rad = PowerLawRadiation::new();
        let t = 1.0e6;
        let n = 1.0e9;
        let c1_plain = ClosureCoefficients::new(&base).c1(&rad, t, t, n);
        let c1_grav = ClosureCoefficients::new(&grav).c1(&rad, t, t, n);
        assert!(c1_plain > 0.0);
        assert!(c1_grav > 0.0);
        assert!((c1_plain - c1_grav).abs() > 1e-6);
    }

    #[test]
    fn scale_height_of_hydrogen_plasma() {
        let closure = ClosureCoefficients::new(&spitzer_loop());
        let t = 1.0e6;
        let expected = 2.0 * BOLTZMANN_CONSTANT * t / (PROTON_MASS * SOLAR_SURFACE_GRAVITY);
        let h = closure.scale_height(t, t);
        assert!((h - expected).abs() < 1e-9 * expected);
        // About 60 Mm at 1 MK
        assert!(h > 5.0e9 && h < 7.0e9);
    }

    #[test]
    fn collision_frequency_positive_and_scales_with_density() {
        let closure = ClosureCoefficients::new(&spitzer_loop());
        let nu1 = closure.collision_frequency(5.0e6, 1.0e9);
        let nu2 = closure.collision_frequency(5.0e6, 1.0e10);
        assert!(nu1 > 0.0);
        assert!(nu2 > nu1);
        assert!(nu2 < 10.0 * nu1);
    }

    proptest! {
        #[test]
        fn c1_continuous_across_branch_boundary(log_t in 5.0f64..7.0) {
            let closure = ClosureCoefficients::new(&spitzer_loop());
            let rad = PowerLawRadiation::new();
            let t = 10f64.powf(log_t);
            let n = equilibrium_density(&closure, t);
            let below = closure.c1(&rad, t, t, n * (1.0 - 1e-7));
            let above = closure.c1(&rad, t, t, n * (1.0 + 1e-7));
            prop_assert!((below - above).abs() < 1e-5);
        }
    }
}
