//! Single-link pendulum driven through a selectable gearbox.
//!
//! ```text
//! H(r)  = m·l² + r²·Jm
//! r·T   = H(r)·ddq + b·dq + m·g·l·sin(q) + f_ext
//! ```
//!
//! `T` is the motor torque, `r` the selected ratio. A mode is feasible when
//! the motor torque is within `torque_limit` and the motor speed `r·dq` is
//! within `motor_speed_limit` (low gears at high joint speed are rejected).

use hyact_common::control::mode::{ActuationMode, RatioKind};
use nalgebra::{DMatrix, DVector};

use super::{FeasibilityGate, ManipulatorModel, Plant, RatioProvider, TrialInput, check_ratio};
use crate::error::ControllerError;

/// Geared single-link pendulum.
#[derive(Debug, Clone)]
pub struct GearedPendulum {
    /// Link mass [kg].
    pub mass: f64,
    /// Distance joint → center of mass [m].
    pub length: f64,
    /// Gravity [m/s²].
    pub gravity: f64,
    /// Viscous joint damping [N·m·s/rad].
    pub damping: f64,
    /// Rotor inertia on the motor side [kg·m²].
    pub rotor_inertia: f64,
    /// Motor torque limit [N·m].
    pub torque_limit: f64,
    /// Motor speed limit [rad/s].
    pub motor_speed_limit: f64,
    /// Unmodeled load applied by the plant only [N·m].
    pub plant_load: f64,
    pub(crate) ratios: Vec<f64>,
    pub(crate) external_force: f64,
}

impl Default for GearedPendulum {
    fn default() -> Self {
        Self {
            mass: 1.0,
            length: 1.0,
            gravity: 9.81,
            damping: 0.0,
            rotor_inertia: 0.001,
            torque_limit: 20.0,
            motor_speed_limit: 300.0,
            plant_load: 0.0,
            ratios: vec![1.0, 10.0, 50.0, 100.0],
            external_force: 0.0,
        }
    }
}

impl GearedPendulum {
    /// Default pendulum with a custom ratio table.
    pub fn with_ratios(ratios: Vec<f64>) -> Result<Self, ControllerError> {
        if ratios.is_empty() {
            return Err(ControllerError::NoModes);
        }
        for (i, &r) in ratios.iter().enumerate() {
            check_ratio(i, r)?;
        }
        Ok(Self {
            ratios,
            ..Self::default()
        })
    }

    /// Same pendulum with an unmodeled plant load [N·m].
    pub fn with_plant_load(mut self, load: f64) -> Self {
        self.plant_load = load;
        self
    }

    /// Scalar ratio table.
    pub fn ratios(&self) -> &[f64] {
        &self.ratios
    }

    #[inline]
    fn ratio_of(&self, mode: ActuationMode) -> f64 {
        self.ratios.get(mode.index()).copied().unwrap_or(f64::NAN)
    }

    #[inline]
    fn total_inertia(&self, r: f64) -> f64 {
        self.mass * self.length * self.length + r * r * self.rotor_inertia
    }

    #[inline]
    fn bias_force(&self, q: f64, dq: f64) -> f64 {
        self.damping * dq + self.mass * self.gravity * self.length * q.sin()
    }
}

impl RatioProvider for GearedPendulum {
    fn mode_count(&self) -> usize {
        self.ratios.len()
    }

    fn ratio(&self, mode: ActuationMode) -> DMatrix<f64> {
        DMatrix::from_element(1, 1, self.ratio_of(mode))
    }

    fn ratio_kind(&self) -> RatioKind {
        RatioKind::Scalar(self.ratios.clone())
    }
}

impl FeasibilityGate for GearedPendulum {
    fn is_feasible(&self, state: &DVector<f64>, trial: &TrialInput<'_>) -> bool {
        let torque = trial.torque[0];
        let motor_speed = self.ratio_of(trial.mode) * state[1];
        torque.abs() <= self.torque_limit && motor_speed.abs() <= self.motor_speed_limit
    }
}

impl ManipulatorModel for GearedPendulum {
    fn dof(&self) -> usize {
        1
    }

    fn inverse_dynamics(
        &self,
        q: &DVector<f64>,
        dq: &DVector<f64>,
        ddq: &DVector<f64>,
        mode: ActuationMode,
    ) -> DVector<f64> {
        let r = self.ratio_of(mode);
        let force = self.total_inertia(r) * ddq[0] + self.bias_force(q[0], dq[0]) + self.external_force;
        DVector::from_element(1, force / r)
    }

    fn inertia(&self, _q: &DVector<f64>, mode: ActuationMode) -> DMatrix<f64> {
        DMatrix::from_element(1, 1, self.total_inertia(self.ratio_of(mode)))
    }

    fn external_force(&self) -> DVector<f64> {
        DVector::from_element(1, self.external_force)
    }

    fn set_external_force(&mut self, force: DVector<f64>) {
        self.external_force = force[0];
    }
}

impl Plant for GearedPendulum {
    fn state_derivative(
        &self,
        state: &DVector<f64>,
        torque: &DVector<f64>,
        mode: ActuationMode,
    ) -> DVector<f64> {
        let (q, dq) = (state[0], state[1]);
        let r = self.ratio_of(mode);
        let ddq = (r * torque[0] - self.bias_force(q, dq) - self.plant_load) / self.total_inertia(r);
        DVector::from_row_slice(&[dq, ddq])
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
