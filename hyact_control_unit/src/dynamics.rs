//! Manipulator model interfaces.
//!
//! The control unit never owns the physics. It consumes a model through
//! three capabilities:
//!
//! - [`RatioProvider`] — how many actuation modes exist and what ratio each
//!   one applies;
//! - [`FeasibilityGate`] — whether a trial `(torque, mode)` command respects
//!   actuator limits in the current state;
//! - [`ManipulatorModel`] — state splitting, inverse dynamics and the
//!   mode-dependent inertia used by the sliding-mode gain.
//!
//! [`Plant`] is only needed by closed-loop harnesses that integrate the model
//! forward in time. Two reference models ship with the crate:
//! [`pendulum::GearedPendulum`] (1-DOF, scalar ratios) and
//! [`two_link::GearedTwoLink`] (2-DOF, diagonal ratio matrices).

pub mod pendulum;
pub mod two_link;

use hyact_common::control::mode::{ActuationMode, RatioKind};
use nalgebra::{DMatrix, DVector};

/// Candidate command handed to the feasibility gate.
#[derive(Debug, Clone, Copy)]
pub struct TrialInput<'a> {
    /// Actuator torque the mode would need.
    pub torque: &'a DVector<f64>,
    /// Mode under evaluation.
    pub mode: ActuationMode,
    /// Published selector for the mode (ratio or index).
    pub selector: f64,
}

/// Ratio lookup capability.
pub trait RatioProvider {
    /// Number of ratio entries the model can resolve.
    fn mode_count(&self) -> usize;

    /// Ratio applied by `mode` as a DOF × DOF matrix (1 × 1 for single-DOF).
    fn ratio(&self, mode: ActuationMode) -> DMatrix<f64>;

    /// Selector convention; resolved once when a controller is built.
    fn ratio_kind(&self) -> RatioKind;
}

/// Actuator limit predicate.
pub trait FeasibilityGate {
    /// Returns true if `trial` may be applied in `state`.
    fn is_feasible(&self, state: &DVector<f64>, trial: &TrialInput<'_>) -> bool;
}

/// Dynamics model consumed by the torque laws.
pub trait ManipulatorModel: RatioProvider + FeasibilityGate {
    /// Degrees of freedom.
    fn dof(&self) -> usize;

    /// Split a state vector `[q..., dq...]` into positions and velocities.
    fn state_to_joint(&self, state: &DVector<f64>) -> (DVector<f64>, DVector<f64>) {
        let n = self.dof();
        (
            state.rows(0, n).into_owned(),
            state.rows(n, n).into_owned(),
        )
    }

    /// Actuator torque realizing `ddq` at `(q, dq)` under `mode`.
    ///
    /// Includes the currently installed external force estimate.
    fn inverse_dynamics(
        &self,
        q: &DVector<f64>,
        dq: &DVector<f64>,
        ddq: &DVector<f64>,
        mode: ActuationMode,
    ) -> DVector<f64>;

    /// Joint-space inertia under `mode`, reflected rotor inertia included.
    fn inertia(&self, q: &DVector<f64>, mode: ActuationMode) -> DMatrix<f64>;

    /// Joint-space external force currently assumed by `inverse_dynamics`.
    fn external_force(&self) -> DVector<f64> {
        DVector::zeros(self.dof())
    }

    /// Install a new external force estimate (e.g. from a disturbance observer).
    fn set_external_force(&mut self, _force: DVector<f64>) {}
}

/// Forward dynamics, for harnesses that close the loop on a model.
pub trait Plant: ManipulatorModel {
    /// State derivative `[dq..., ddq...]` when `torque` is applied under `mode`.
    fn state_derivative(
        &self,
        state: &DVector<f64>,
        torque: &DVector<f64>,
        mode: ActuationMode,
    ) -> DVector<f64>;

    /// One explicit Euler step of length `dt`.
    fn euler_step(
        &self,
        state: &DVector<f64>,
        torque: &DVector<f64>,
        mode: ActuationMode,
        dt: f64,
    ) -> DVector<f64> {
        state + self.state_derivative(state, torque, mode) * dt
    }
}

/// Validate a ratio entry: strictly positive and finite.
pub(crate) fn check_ratio(mode: usize, value: f64) -> Result<(), crate::error::ControllerError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(crate::error::ControllerError::InvalidRatio { mode, value })
    }
}
