//! Fixed-step and adaptive time integrators.

use crate::error::SimResult;
use crate::model::TransientModel;

/// Trait for time integrators.
pub trait Integrator {
    /// Advance state by one time step using the transient model.
    fn step<M: TransientModel>(
        &self,
        model: &M,
        t: f64,
        x: &M::State,
        dt: f64,
    ) -> SimResult<M::State>;
}

/// Classical RK4 (Runge-Kutta 4th order) integrator.
#[derive(Clone, Debug)]
pub struct RK4;

impl Integrator for RK4 {
    fn step<M: TransientModel>(
        &self,
        model: &M,
        t: f64,
        x: &M::State,
        dt: f64,
    ) -> SimResult<M::State> {
        let k1 = model.rhs(t, x)?;

        let x2 = model.add(x, &model.scale(&k1, 0.5 * dt));
        let k2 = model.rhs(t + 0.5 * dt, &x2)?;

        let x3 = model.add(x, &model.scale(&k2, 0.5 * dt));
        let k3 = model.rhs(t + 0.5 * dt, &x3)?;

        let x4 = model.add(x, &model.scale(&k3, dt));
        let k4 = model.rhs(t + dt, &x4)?;

        // Combine: x_new = x + (dt/6) * (k1 + 2*k2 + 2*k3 + k4)
        let k_sum = model.add(
            &model.add(&k1, &model.scale(&k2, 2.0)),
            &model.add(&model.scale(&k3, 2.0), &k4),
        );

        Ok(model.add(x, &model.scale(&k_sum, dt / 6.0)))
    }
}

/// Forward Euler (explicit, 1st order).
/// Calls rhs() once per step instead of 4 times (RK4).
#[derive(Clone, Debug)]
pub struct ForwardEuler;

impl Integrator for ForwardEuler {
    fn step<M: TransientModel>(
        &self,
        model: &M,
        t: f64,
        x: &M::State,
        dt: f64,
    ) -> SimResult<M::State> {
        let xdot = model.rhs(t, x)?;
        Ok(model.add(x, &model.scale(&xdot, dt)))
    }
}

/// Step-size update rule for step doubling.
///
/// tau_new = safety * tau * ratio^(-exponent), never below tau / shrink_limit,
/// and on return never above grow_limit * tau.
#[derive(Clone, Debug)]
pub struct StepController {
    pub safety: f64,
    pub shrink_limit: f64,
    pub grow_limit: f64,
    pub exponent: f64,
    /// Keeps the error scale finite for components that are exactly zero
    pub error_floor: f64,
}

impl Default for StepController {
    fn default() -> Self {
        Self {
            safety: 0.9,
            shrink_limit: 1.1,
            grow_limit: 4.0,
            exponent: 1.0 / 5.0,
            error_floor: 1.0e-16,
        }
    }
}

impl StepController {
    /// Candidate step after an attempt of size `tau` with the given error ratio.
    pub fn propose(&self, tau: f64, error_ratio: f64) -> f64 {
        (self.safety * tau * error_ratio.powf(-self.exponent)).max(tau / self.shrink_limit)
    }

    /// Apply the growth cap relative to the last attempted step.
    pub fn cap(&self, proposed: f64, tau: f64) -> f64 {
        proposed.min(self.grow_limit * tau)
    }
}

/// Outcome of one adaptive step.
#[derive(Clone, Debug)]
pub struct AdaptiveStep<S> {
    /// State after two half steps of size `tau_used / 2`
    pub state: S,
    /// Step size the returned state was integrated over
    pub tau_used: f64,
    /// Suggested size for the next step
    pub tau_next: f64,
    /// Error ratio of the returned state; below one when converged
    pub error_ratio: f64,
    pub attempts: usize,
    pub converged: bool,
}

/// Step-doubling adaptive RK4.
///
/// Each attempt compares one RK4 step of size tau against two of size tau/2.
/// The attempt is accepted once the worst per-component error ratio drops
/// below one. After `max_attempts` the last two-half-step result is returned
/// anyway with `converged = false`.
#[derive(Clone, Debug)]
pub struct AdaptiveRk4 {
    pub rel_tol: f64,
    pub max_attempts: usize,
    pub controller: StepController,
}

impl AdaptiveRk4 {
    pub fn new(rel_tol: f64) -> Self {
        Self {
            rel_tol,
            max_attempts: 100,
            controller: StepController::default(),
        }
    }

    pub fn adaptive_step<M: TransientModel>(
        &self,
        model: &M,
        t: f64,
        x: &M::State,
        dt: f64,
    ) -> SimResult<AdaptiveStep<M::State>> {
        let rk4 = RK4;
        let max_attempts = self.max_attempts.max(1);
        let mut tau = dt;
        let mut attempts = 0;

        loop {
            attempts += 1;
            let half = 0.5 * tau;
            let mid = rk4.step(model, t, x, half)?;
            let small = rk4.step(model, t + half, &mid, half)?;
            let big = rk4.step(model, t, x, tau)?;

            let error_ratio =
                model.error_ratio(&small, &big, self.rel_tol, self.controller.error_floor);
            let tau_used = tau;
            tau = self.controller.propose(tau_used, error_ratio);

            let converged = error_ratio < 1.0;
            if converged || attempts >= max_attempts {
                let tau_next = self.controller.cap(tau, tau_used);
                if !converged {
                    tracing::warn!(
                        time = t,
                        tau_next,
                        error_ratio,
                        "adaptive solver did not converge to best step size"
                    );
                }
                return Ok(AdaptiveStep {
                    state: small,
                    tau_used,
                    tau_next,
                    error_ratio,
                    attempts,
                    converged,
                });
            }
        }
    }
}

impl Integrator for AdaptiveRk4 {
    fn step<M: TransientModel>(
        &self,
        model: &M,
        t: f64,
        x: &M::State,
        dt: f64,
    ) -> SimResult<M::State> {
        Ok(self.adaptive_step(model, t, x, dt)?.state)
    }
}
