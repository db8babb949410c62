//! Right-hand side of the two-fluid loop equations.

use crate::error::{SimError, SimResult};
use crate::model::TransientModel;
use crate::state::LoopState;
use cl_core::constants::{BOLTZMANN_CONSTANT, GAMMA, GAMMA_MINUS_ONE};
use cl_physics::{
    ClosureCoefficients, Heating, LoopParameters, RadiativeLoss, Species, ThermalConduction,
};
use nalgebra::Vector3;

/// Zero-dimensional loop: conduction, radiation, heating and electron-ion coupling.
///
/// Holds the immutable loop parameters and borrows the radiative-loss and
/// heating collaborators for the lifetime of a run.
pub struct LoopModel<'a> {
    params: LoopParameters,
    conduction: ThermalConduction,
    closure: ClosureCoefficients,
    radiation: &'a dyn RadiativeLoss,
    heating: &'a dyn Heating,
}

impl<'a> LoopModel<'a> {
    pub fn new(
        params: LoopParameters,
        radiation: &'a dyn RadiativeLoss,
        heating: &'a dyn Heating,
    ) -> SimResult<Self> {
        params.validate()?;
        let partition = heating.partition();
        if !(0.0..=1.0).contains(&partition) {
            return Err(SimError::InvalidArg {
                what: format!("heating partition must lie in [0, 1], got {partition}"),
            });
        }
        Ok(Self {
            conduction: ThermalConduction::new(&params),
            closure: ClosureCoefficients::new(&params),
            params,
            radiation,
            heating,
        })
    }

    pub fn params(&self) -> &LoopParameters {
        &self.params
    }

    pub fn radiation(&self) -> &dyn RadiativeLoss {
        self.radiation
    }

    pub fn heating(&self) -> &dyn Heating {
        self.heating
    }

    pub fn closure(&self) -> &ClosureCoefficients {
        &self.closure
    }

    /// (Te, Ti) in K.
    pub fn temperatures(&self, state: &LoopState) -> (f64, f64) {
        (
            state.temperature_e(),
            state.temperature_i(self.params.abundance.boltzmann_correction),
        )
    }

    pub fn electron_flux(&self, state: &LoopState) -> f64 {
        self.conduction
            .flux(state.temperature_e(), state.density(), Species::Electron)
    }

    pub fn c1(&self, state: &LoopState) -> f64 {
        let (te, ti) = self.temperatures(state);
        self.closure.c1(self.radiation, te, ti, state.density())
    }

    /// (dPe/dt, dPi/dt, dn/dt). The state must be physical.
    pub fn derivatives(&self, state: &LoopState, time: f64) -> LoopState {
        let length = self.params.loop_length;
        let (pe, pi, n) = (state.pressure_e(), state.pressure_i(), state.density());
        let (te, ti) = self.temperatures(state);

        let f_e = self.conduction.flux(te, n, Species::Electron);
        let f_i = self.conduction.flux(ti, n, Species::Ion);
        let radiative_loss = self.radiation.loss_rate(te.log10());
        let heat = self.heating.rate(time);
        let partition = self.heating.partition();
        let c1 = self.closure.c1(self.radiation, te, ti, n);
        let c2 = ClosureCoefficients::c2();
        let c3 = ClosureCoefficients::c3();
        let collision_frequency = self.closure.collision_frequency(te, n);

        let xi = pe / pi;
        let psi_c = length / GAMMA_MINUS_ONE * collision_frequency * (pi - pe);
        let r_c = n * n * radiative_loss * length;
        let psi_tr = (f_e + c1 * r_c - xi * f_i) / (1.0 + xi);

        let dpe_dt = GAMMA_MINUS_ONE / length * (psi_tr + psi_c - r_c * (1.0 + c1))
            + GAMMA_MINUS_ONE * heat * partition;
        let dpi_dt =
            -GAMMA_MINUS_ONE / length * (psi_tr + psi_c) + GAMMA_MINUS_ONE * heat * (1.0 - partition);
        let dn_dt = c2 * GAMMA_MINUS_ONE / (c3 * length * GAMMA * BOLTZMANN_CONSTANT * te)
            * (-f_e - c1 * r_c + psi_tr);

        LoopState::new(dpe_dt, dpi_dt, dn_dt)
    }
}

impl TransientModel for LoopModel<'_> {
    type State = LoopState;

    fn rhs(&self, t: f64, x: &LoopState) -> SimResult<LoopState> {
        if !x.is_physical() {
            return Err(SimError::NonPhysical {
                what: format!(
                    "derivative requested for state (Pe={}, Pi={}, n={})",
                    x.pressure_e(),
                    x.pressure_i(),
                    x.density()
                ),
                time: t,
            });
        }
        Ok(self.derivatives(x, t))
    }

    fn add(&self, a: &LoopState, b: &LoopState) -> LoopState {
        LoopState(a.0 + b.0)
    }

    fn scale(&self, a: &LoopState, scale: f64) -> LoopState {
        LoopState(a.0 * scale)
    }

    fn error_ratio(&self, a: &LoopState, b: &LoopState, rel_tol: f64, floor: f64) -> f64 {
        let diff: Vector3<f64> = (a.0 - b.0).abs();
        let scale: Vector3<f64> = (a.0.abs() + b.0.abs()) * (0.5 * rel_tol);
        diff.iter()
            .zip(scale.iter())
            .map(|(d, s)| d / (s + floor))
            .fold(0.0, f64::max)
    }
}
