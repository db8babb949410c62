//! Loop engine: owns the state and results buffer and drives the time loop.

use crate::error::{SimError, SimResult};
use crate::initial::{InitialConditionSolver, InitialConditions};
use crate::integrator::{AdaptiveRk4, ForwardEuler, Integrator, RK4};
use crate::loop_model::LoopModel;
use crate::results::{LoopResults, LoopRow};
use crate::state::LoopState;
use cl_physics::DemAccumulator;

/// Integrator selection.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Solver {
    /// Forward Euler (1st-order, 1 rhs call per step).
    Euler,
    /// Fixed-step 4th-order Runge-Kutta.
    Rk4,
    /// Step-doubling adaptive RK4 (default).
    #[default]
    Rka4,
}

impl Solver {
    pub fn name(self) -> &'static str {
        match self {
            Solver::Euler => "euler",
            Solver::Rk4 => "rk4",
            Solver::Rka4 => "rka4",
        }
    }
}

/// Options for a loop run.
#[derive(Clone, Debug)]
pub struct SimOptions {
    /// Final simulation time (seconds)
    pub total_time: f64,
    /// Nominal (initial, for rka4) time step (seconds)
    pub tau: f64,
    /// Relative tolerance of the adaptive solver
    pub rka_error: f64,
    pub solver: Solver,
    /// Safety cap on the number of steps
    pub max_steps: Option<usize>,
}

impl Default for SimOptions {
    fn default() -> Self {
        Self {
            total_time: 5000.0,
            tau: 1.0,
            rka_error: 1.0e-6,
            solver: Solver::default(),
            max_steps: None,
        }
    }
}

impl SimOptions {
    pub fn validate(&self) -> SimResult<()> {
        if !(self.tau.is_finite() && self.tau > 0.0) {
            return Err(SimError::InvalidArg {
                what: format!("tau must be positive and finite, got {}", self.tau),
            });
        }
        if !(self.total_time.is_finite() && self.total_time > 0.0) {
            return Err(SimError::InvalidArg {
                what: format!(
                    "total_time must be positive and finite, got {}",
                    self.total_time
                ),
            });
        }
        if self.solver == Solver::Rka4 && !(self.rka_error.is_finite() && self.rka_error > 0.0) {
            return Err(SimError::InvalidArg {
                what: format!("rka_error must be positive, got {}", self.rka_error),
            });
        }
        if self.max_steps == Some(0) {
            return Err(SimError::InvalidArg {
                what: "max_steps must be positive".to_string(),
            });
        }
        Ok(())
    }

    /// ceil(total_time / tau): rows the results buffer is sized for.
    pub fn estimated_steps(&self) -> usize {
        (self.total_time / self.tau).ceil() as usize
    }
}

/// Lifecycle of an engine.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EnginePhase {
    Uninitialized,
    InitialConditionsSet,
    Running,
    Finalized,
}

impl EnginePhase {
    pub fn as_str(self) -> &'static str {
        match self {
            EnginePhase::Uninitialized => "uninitialized",
            EnginePhase::InitialConditionsSet => "initial conditions set",
            EnginePhase::Running => "running",
            EnginePhase::Finalized => "finalized",
        }
    }
}

/// Progress report emitted after every step.
#[derive(Clone, Debug)]
pub struct SimProgress {
    pub sim_time: f64,
    pub total_time: f64,
    pub fraction_complete: f64,
    pub step: usize,
    /// Step size for the next step
    pub tau: f64,
    pub adaptive_failures: usize,
}

/// Outcome of a completed run.
#[derive(Clone, Debug)]
pub struct RunSummary {
    pub solver: Solver,
    /// Recorded rows, including the t = 0 row
    pub rows: usize,
    pub final_time: f64,
    /// Adaptive steps that exhausted their attempt budget
    pub adaptive_failures: usize,
    /// Estimated rows that went unused; DEM export drops the same count
    pub trim_count: usize,
    pub initial: InitialConditions,
}

/// Drives one loop from its initial conditions to `total_time`.
pub struct LoopEngine<'a> {
    model: LoopModel<'a>,
    options: SimOptions,
    initial_solver: InitialConditionSolver,
    dem: Option<&'a mut dyn DemAccumulator>,
    phase: EnginePhase,
    state: Option<LoopState>,
    initial: Option<InitialConditions>,
    results: LoopResults,
    time: f64,
    tau: f64,
    step: usize,
    adaptive_failures: usize,
}

impl<'a> LoopEngine<'a> {
    pub fn new(model: LoopModel<'a>, options: SimOptions) -> SimResult<Self> {
        options.validate()?;
        Ok(Self {
            model,
            initial_solver: InitialConditionSolver::default(),
            dem: None,
            phase: EnginePhase::Uninitialized,
            state: None,
            initial: None,
            results: LoopResults::with_estimate(options.estimated_steps()),
            time: 0.0,
            tau: options.tau,
            step: 0,
            adaptive_failures: 0,
            options,
        })
    }

    /// Accumulate a DEM alongside the integration.
    pub fn with_dem(mut self, dem: &'a mut dyn DemAccumulator) -> Self {
        self.dem = Some(dem);
        self
    }

    pub fn with_initial_solver(mut self, solver: InitialConditionSolver) -> Self {
        self.initial_solver = solver;
        self
    }

    pub fn phase(&self) -> EnginePhase {
        self.phase
    }

    pub fn state(&self) -> Option<&LoopState> {
        self.state.as_ref()
    }

    pub fn options(&self) -> &SimOptions {
        &self.options
    }

    pub fn results(&self) -> &LoopResults {
        &self.results
    }

    pub fn into_results(self) -> LoopResults {
        self.results
    }

    fn expect_phase(&self, expected: EnginePhase) -> SimResult<()> {
        if self.phase != expected {
            return Err(SimError::InvalidPhase {
                expected: expected.as_str(),
                found: self.phase.as_str(),
            });
        }
        Ok(())
    }

    /// Solve for the t = 0 state and record it as row 0.
    pub fn initialize(&mut self) -> SimResult<InitialConditions> {
        self.expect_phase(EnginePhase::Uninitialized)?;
        let ic = self.initial_solver.solve(&self.model)?;
        tracing::info!(
            temperature = ic.temperature,
            density = ic.density,
            iterations = ic.iterations,
            converged = ic.converged,
            "initial conditions"
        );

        self.time = 0.0;
        self.tau = self.options.tau;
        self.step = 0;
        self.record(&ic.state);
        self.state = Some(ic.state);
        self.initial = Some(ic);
        self.phase = EnginePhase::InitialConditionsSet;
        Ok(ic)
    }

    pub fn evolve(&mut self) -> SimResult<()> {
        self.evolve_with_progress(&mut |_| {})
    }

    /// Step from the initial conditions until the next record time would reach
    /// `total_time`.
    ///
    /// Each step is taken from its own record time `t + tau`, so the first
    /// step starts at `tau` rather than zero; the adaptive solver's proposal
    /// only moves the record time of the following step.
    pub fn evolve_with_progress(
        &mut self,
        progress: &mut dyn FnMut(SimProgress),
    ) -> SimResult<()> {
        self.expect_phase(EnginePhase::InitialConditionsSet)?;
        let Some(mut state) = self.state else {
            return Err(SimError::InvalidPhase {
                expected: EnginePhase::InitialConditionsSet.as_str(),
                found: self.phase.as_str(),
            });
        };
        self.phase = EnginePhase::Running;

        let total_time = self.options.total_time;
        let max_steps = self.options.max_steps.unwrap_or(usize::MAX);
        let adaptive = AdaptiveRk4::new(self.options.rka_error);

        tracing::info!(
            solver = self.options.solver.name(),
            total_time,
            tau = self.tau,
            "evolving loop"
        );

        loop {
            let time = self.time + self.tau;
            if time >= total_time {
                break;
            }
            if self.step >= max_steps {
                tracing::warn!(
                    steps = self.step,
                    time = self.time,
                    "step limit reached before total_time"
                );
                break;
            }

            let (next, tau_next) = match self.options.solver {
                Solver::Euler => (
                    ForwardEuler.step(&self.model, time, &state, self.tau)?,
                    self.tau,
                ),
                Solver::Rk4 => (RK4.step(&self.model, time, &state, self.tau)?, self.tau),
                Solver::Rka4 => {
                    let s = adaptive.adaptive_step(&self.model, time, &state, self.tau)?;
                    if !s.converged {
                        self.adaptive_failures += 1;
                    }
                    (s.state, s.tau_next)
                }
            };

            if !next.is_physical() {
                self.state = Some(state);
                return Err(SimError::NonPhysical {
                    what: format!(
                        "state left the physical domain (Pe={}, Pi={}, n={})",
                        next.pressure_e(),
                        next.pressure_i(),
                        next.density()
                    ),
                    time,
                });
            }

            state = next;
            self.time = time;
            self.tau = tau_next;
            self.step += 1;
            self.record(&state);
            tracing::trace!(step = self.step, time, tau = self.tau, "step");

            progress(SimProgress {
                sim_time: self.time,
                total_time,
                fraction_complete: (self.time / total_time).clamp(0.0, 1.0),
                step: self.step,
                tau: self.tau,
                adaptive_failures: self.adaptive_failures,
            });
        }

        self.state = Some(state);
        Ok(())
    }

    /// Trim the results buffer and report the run.
    pub fn finalize(&mut self) -> SimResult<RunSummary> {
        self.expect_phase(EnginePhase::Running)?;
        let Some(initial) = self.initial else {
            return Err(SimError::InvalidPhase {
                expected: EnginePhase::InitialConditionsSet.as_str(),
                found: self.phase.as_str(),
            });
        };
        let trim_count = self.results.finalize();
        self.phase = EnginePhase::Finalized;

        if self.adaptive_failures > 0 {
            tracing::warn!(
                count = self.adaptive_failures,
                "adaptive steps exceeded the error tolerance"
            );
        }
        tracing::info!(
            rows = self.results.len(),
            final_time = self.time,
            trim_count,
            "run finished"
        );

        Ok(RunSummary {
            solver: self.options.solver,
            rows: self.results.len(),
            final_time: self.time,
            adaptive_failures: self.adaptive_failures,
            trim_count,
            initial,
        })
    }

    /// initialize, evolve and finalize in one call.
    pub fn run(&mut self) -> SimResult<RunSummary> {
        self.run_with_progress(&mut |_| {})
    }

    pub fn run_with_progress(
        &mut self,
        progress: &mut dyn FnMut(SimProgress),
    ) -> SimResult<RunSummary> {
        self.initialize()?;
        self.evolve_with_progress(progress)?;
        self.finalize()
    }

    fn record(&mut self, state: &LoopState) {
        let (temperature_e, temperature_i) = self.model.temperatures(state);
        self.results.push(LoopRow {
            time: self.time,
            heat: self.model.heating().rate(self.time),
            temperature_e,
            temperature_i,
            pressure_e: state.pressure_e(),
            pressure_i: state.pressure_i(),
            density: state.density(),
        });

        // Row 0 is the equilibrium; only completed steps feed the DEM.
        if self.step == 0 {
            return;
        }
        if let Some(dem) = self.dem.as_deref_mut() {
            dem.accumulate(
                self.step,
                state.pressure_e(),
                state.density(),
                self.model.electron_flux(state),
                self.model.c1(state),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cl_physics::{
        AbundanceCorrection, EventHeating, HeatedSpecies, HeatingEvent, LoopParameters,
        PhysicsResult, PowerLawRadiation, PulseShape,
    };
    use std::path::Path;

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

    #[derive(Default)]
    struct CountingDem {
        steps: Vec<usize>,
    }

    impl DemAccumulator for CountingDem {
        fn accumulate(&mut self, step: usize, pe: f64, n: f64, fe: f64, c1: f64) {
            assert!(pe > 0.0 && n > 0.0 && fe < 0.0 && c1 > 0.0);
            self.steps.push(step);
        }

        fn export(&self, _output: &Path, _trim: usize) -> PhysicsResult<()> {
            Ok(())
        }
    }

    #[test]
    fn options_validation() {
        assert!(SimOptions::default().validate().is_ok());
        let bad_tau = SimOptions {
            tau: 0.0,
            ..Default::default()
        };
        assert!(bad_tau.validate().is_err());
        let bad_time = SimOptions {
            total_time: f64::INFINITY,
            ..Default::default()
        };
        assert!(bad_time.validate().is_err());
        let bad_tol = SimOptions {
            rka_error: 0.0,
            ..Default::default()
        };
        assert!(bad_tol.validate().is_err());
        assert_eq!(
            SimOptions {
                total_time: 10.5,
                tau: 1.0,
                ..Default::default()
            }
            .estimated_steps(),
            11
        );
    }

    #[test]
    fn phases_are_enforced() {
        let rad = PowerLawRadiation::new();
        let heating = EventHeating::constant(0.01, HeatedSpecies::Electron).unwrap();
        let model = LoopModel::new(params(), &rad, &heating).unwrap();
        let options = SimOptions {
            total_time: 10.0,
            solver: Solver::Rk4,
            ..Default::default()
        };
        let mut engine = LoopEngine::new(model, options).unwrap();
        assert_eq!(engine.phase(), EnginePhase::Uninitialized);
        assert!(matches!(engine.evolve(), Err(SimError::InvalidPhase { .. })));

        engine.initialize().unwrap();
        assert_eq!(engine.phase(), EnginePhase::InitialConditionsSet);
        assert!(engine.initialize().is_err());
        assert!(engine.finalize().is_err());

        engine.evolve().unwrap();
        assert_eq!(engine.phase(), EnginePhase::Running);
        let summary = engine.finalize().unwrap();
        assert_eq!(engine.phase(), EnginePhase::Finalized);
        assert_eq!(summary.rows, 10);
        assert_eq!(summary.trim_count, 0);
    }

    #[test]
    fn dem_sees_every_recorded_step() {
        let rad = PowerLawRadiation::new();
        let heating = EventHeating::constant(0.01, HeatedSpecies::Electron).unwrap();
        let model = LoopModel::new(params(), &rad, &heating).unwrap();
        let options = SimOptions {
            total_time: 20.0,
            tau: 2.0,
            solver: Solver::Euler,
            ..Default::default()
        };
        let mut dem = CountingDem::default();
        let rows = {
            let mut engine = LoopEngine::new(model, options).unwrap().with_dem(&mut dem);
            engine.run().unwrap().rows
        };
        assert_eq!(rows, 10);
        assert_eq!(dem.steps, (1..10).collect::<Vec<_>>());
    }

    #[test]
    fn steps_start_at_the_record_time() {
        let rad = PowerLawRadiation::new();
        let event = HeatingEvent::new(PulseShape::Square, 0.0, 0.9, 1.0).unwrap();
        let heating = EventHeating::new(0.01, 1.0, vec![event]).unwrap();
        let reference = LoopModel::new(params(), &rad, &heating).unwrap();
        let model = LoopModel::new(params(), &rad, &heating).unwrap();
        let options = SimOptions {
            total_time: 10.0,
            tau: 1.0,
            solver: Solver::Rk4,
            max_steps: Some(1),
            ..Default::default()
        };
        let mut engine = LoopEngine::new(model, options).unwrap();
        let ic = engine.initialize().unwrap();
        engine.evolve().unwrap();
        let results = engine.results();
        assert_eq!(results.len(), 2);
        assert_eq!(results.time[1], 1.0);
        assert_eq!(results.heat[1], 0.01);

        // The event has ended by t = 1, so row 1 never sees it.
        let from_record_time = RK4.step(&reference, 1.0, &ic.state, 1.0).unwrap();
        let from_zero = RK4.step(&reference, 0.0, &ic.state, 1.0).unwrap();
        assert_eq!(results.pressure_e[1], from_record_time.pressure_e());
        assert!(results.pressure_e[1] < from_zero.pressure_e());
    }

    #[test]
    fn adaptive_steps_start_at_the_record_time() {
        let rad = PowerLawRadiation::new();
        let event = HeatingEvent::new(PulseShape::Square, 0.0, 0.9, 1.0).unwrap();
        let heating = EventHeating::new(0.01, 1.0, vec![event]).unwrap();
        let reference = LoopModel::new(params(), &rad, &heating).unwrap();
        let model = LoopModel::new(params(), &rad, &heating).unwrap();
        let options = SimOptions {
            total_time: 10.0,
            tau: 1.0,
            solver: Solver::Rka4,
            max_steps: Some(2),
            ..Default::default()
        };
        let mut engine = LoopEngine::new(model, options).unwrap();
        let ic = engine.initialize().unwrap();
        engine.evolve().unwrap();

        let adaptive = AdaptiveRk4::new(1.0e-6);
        let first = adaptive
            .adaptive_step(&reference, 1.0, &ic.state, 1.0)
            .unwrap();
        let results = engine.results();
        assert_eq!(results.time[1], 1.0);
        assert_eq!(results.pressure_e[1], first.state.pressure_e());
        assert_eq!(results.time[2], 1.0 + first.tau_next);
    }

    #[test]
    fn max_steps_caps_the_run() {
        let rad = PowerLawRadiation::new();
        let heating = EventHeating::constant(0.01, HeatedSpecies::Electron).unwrap();
        let model = LoopModel::new(params(), &rad, &heating).unwrap();
        let options = SimOptions {
            total_time: 100.0,
            solver: Solver::Rk4,
            max_steps: Some(5),
            ..Default::default()
        };
        let mut engine = LoopEngine::new(model, options).unwrap();
        let summary = engine.run().unwrap();
        assert_eq!(summary.rows, 6);
        assert_eq!(summary.trim_count, 94);
        assert!((summary.final_time - 5.0).abs() < 1e-12);
    }

    #[test]
    fn progress_reports_each_step() {
        let rad = PowerLawRadiation::new();
        let heating = EventHeating::constant(0.01, HeatedSpecies::Electron).unwrap();
        let model = LoopModel::new(params(), &rad, &heating).unwrap();
        let options = SimOptions {
            total_time: 50.0,
            tau: 5.0,
            solver: Solver::Rk4,
            ..Default::default()
        };
        let mut engine = LoopEngine::new(model, options).unwrap();
        let mut seen = Vec::new();
        engine
            .run_with_progress(&mut |p| seen.push((p.step, p.fraction_complete)))
            .unwrap();
        assert_eq!(seen.len(), 9);
        assert_eq!(seen.last().map(|s| s.0), Some(9));
        assert!(seen.windows(2).all(|w| w[1].1 > w[0].1));
    }
}
