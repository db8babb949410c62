//! Self-consistent loop temperature and density at t = 0.

use crate::error::{SimError, SimResult};
use crate::loop_model::LoopModel;
use crate::state::LoopState;
use cl_core::constants::BOLTZMANN_CONSTANT;
use cl_physics::{C1_EQUILIBRIUM, ClosureCoefficients};

/// Result of the fixed-point iteration.
#[derive(Debug, Clone, Copy)]
pub struct InitialConditions {
    pub state: LoopState,
    /// Coronal average temperature (K), shared by both fluids
    pub temperature: f64,
    /// Coronal average density (cm^-3)
    pub density: f64,
    pub iterations: usize,
    pub converged: bool,
    /// Larger of the last temperature and density relative changes
    pub relative_error: f64,
}

/// Fixed-point iteration on the static equilibrium scaling laws.
///
/// Each pass takes T from the conduction/heating balance for the current C1,
/// then n from the radiation/heating balance at that T, then refreshes C1.
#[derive(Debug, Clone)]
pub struct InitialConditionSolver {
    pub max_iterations: usize,
    pub tolerance: f64,
}

impl Default for InitialConditionSolver {
    fn default() -> Self {
        Self {
            max_iterations: 100,
            tolerance: 1.0e-2,
        }
    }
}

impl InitialConditionSolver {
    pub fn solve(&self, model: &LoopModel<'_>) -> SimResult<InitialConditions> {
        let heat = model.heating().rate(0.0);
        if !(heat.is_finite() && heat > 0.0) {
            return Err(SimError::InvalidArg {
                what: format!(
                    "initial conditions need a positive heating rate at t = 0, got {heat}"
                ),
            });
        }

        let params = model.params();
        let length = params.loop_length;
        let c2 = ClosureCoefficients::c2();
        let kappa = model.closure().total_conductivity();

        let mut c1 = C1_EQUILIBRIUM;
        let mut temperature_old = f64::MAX;
        let mut density_old = f64::MAX;
        let mut temperature = f64::NAN;
        let mut density = f64::NAN;
        let mut relative_error = f64::INFINITY;
        let mut iterations = 0;
        let mut converged = false;

        while iterations < self.max_iterations {
            if iterations > 0 {
                c1 = model.closure().c1(
                    model.radiation(),
                    temperature_old,
                    temperature_old,
                    density_old,
                );
            }
            temperature =
                c2 * (3.5 * c1 / (1.0 + c1) * length * length * heat / kappa).powf(2.0 / 7.0);
            let radiative_loss = model.radiation().loss_rate(temperature.log10());
            density = (heat / (radiative_loss * (1.0 + c1))).sqrt();

            let error_temperature = (temperature - temperature_old).abs() / temperature;
            let error_density = (density - density_old).abs() / density;
            relative_error = error_temperature.max(error_density);
            tracing::trace!(iterations, c1, temperature, density, relative_error);
            if relative_error < self.tolerance {
                converged = true;
                break;
            }
            iterations += 1;
            temperature_old = temperature;
            density_old = density;
        }

        if !converged {
            tracing::warn!(
                iterations,
                relative_error,
                temperature,
                density,
                "initial conditions did not converge; using last estimate"
            );
        }

        let state = LoopState::new(
            BOLTZMANN_CONSTANT * density * temperature,
            params.abundance.boltzmann_correction * BOLTZMANN_CONSTANT * density * temperature,
            density,
        );
        if !state.is_physical() {
            return Err(SimError::NonPhysical {
                what: format!("initial state (T={temperature}, n={density})"),
                time: 0.0,
            });
        }

        Ok(InitialConditions {
            state,
            temperature,
            density,
            iterations,
            converged,
            relative_error,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cl_physics::{
        AbundanceCorrection, EventHeating, HeatedSpecies, LoopParameters, PowerLawRadiation,
    };

    fn params() -> LoopParameters {
        LoopParameters {
            loop_length: 4.0e9,
            saturation_limit: 1.0 / 6.0,
            c1_cond0: 6.0,
            c1_rad0: 0.6,
            use_c1_loss_correction: false,
            use_c1_grav_correction: false,
            use_spitzer_conductivity: true,
            abundance: AbundanceCorrection::hydrogen_only(),
        }
    }

    #[test]
    fn converges_for_quiescent_loop() {
        let rad = PowerLawRadiation::new();
        let heating = EventHeating::constant(0.01, HeatedSpecies::Electron).unwrap();
        let model = LoopModel::new(params(), &rad, &heating).unwrap();
        let ic = InitialConditionSolver::default().solve(&model).unwrap();

        assert!(ic.converged);
        assert!(ic.iterations < 100);
        assert!(ic.relative_error < 1e-2);
        assert!(ic.temperature > 1e6 && ic.temperature < 1e7);
        assert!(ic.density > 1e8 && ic.density < 1e11);
        assert!((ic.state.temperature_e() - ic.temperature).abs() < 1e-6 * ic.temperature);
    }

    #[test]
    fn ion_pressure_carries_boltzmann_correction() {
        let rad = PowerLawRadiation::new();
        let heating = EventHeating::constant(0.01, HeatedSpecies::Electron).unwrap();
        let p = LoopParameters {
            abundance: AbundanceCorrection::from_helium_ratio(0.075).unwrap(),
            ..params()
        };
        let model = LoopModel::new(p, &rad, &heating).unwrap();
        let ic = InitialConditionSolver::default().solve(&model).unwrap();
        let ratio = ic.state.pressure_i() / ic.state.pressure_e();
        assert!((ratio - p.abundance.boltzmann_correction).abs() < 1e-12);
        assert!((ic.state.temperature_i(p.abundance.boltzmann_correction) - ic.temperature).abs()
            < 1e-6 * ic.temperature);
    }

    #[test]
    fn budget_exhaustion_keeps_last_estimate() {
        let rad = PowerLawRadiation::new();
        let heating = EventHeating::constant(0.01, HeatedSpecies::Electron).unwrap();
        let model = LoopModel::new(params(), &rad, &heating).unwrap();
        let solver = InitialConditionSolver {
            max_iterations: 1,
            ..Default::default()
        };
        let ic = solver.solve(&model).unwrap();
        assert!(!ic.converged);
        assert_eq!(ic.iterations, 1);
        assert!(ic.state.is_physical());
    }

    #[test]
    fn zero_heating_is_rejected() {
        let rad = PowerLawRadiation::new();
        let heating = EventHeating::constant(0.0, HeatedSpecies::Electron).unwrap();
        let model = LoopModel::new(params(), &rad, &heating).unwrap();
        assert!(matches!(
            InitialConditionSolver::default().solve(&model),
            Err(SimError::InvalidArg { .. })
        ));
    }
}
