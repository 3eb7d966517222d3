//! Planar two-link arm with one gearbox per joint.
//!
//! Each actuation mode selects a diagonal ratio matrix `R`:
//!
//! ```text
//! H_all(q) = H(q) + R·Jm·R
//! R·T      = H_all(q)·ddq + c(q, dq) + g(q) + B·dq + f_ext
//! ```
//!
//! Modes are published by index; the ratio matrices stay inside the model.

use hyact_common::control::mode::{ActuationMode, RatioKind};
use nalgebra::{DMatrix, DVector};

use super::{FeasibilityGate, ManipulatorModel, Plant, RatioProvider, TrialInput, check_ratio};
use crate::error::ControllerError;

/// Geared two-link planar arm (joint 1 at the base, gravity along −y).
#[derive(Debug, Clone)]
pub struct GearedTwoLink {
    /// Link masses [kg].
    pub masses: [f64; 2],
    /// Link lengths [m].
    pub lengths: [f64; 2],
    /// Joint → center of mass distances [m].
    pub com: [f64; 2],
    /// Link inertias about their center of mass [kg·m²].
    pub link_inertia: [f64; 2],
    /// Gravity [m/s²].
    pub gravity: f64,
    /// Viscous joint damping [N·m·s/rad].
    pub damping: f64,
    /// Rotor inertia on the motor side [kg·m²].
    pub rotor_inertia: f64,
    /// Per-motor torque limit [N·m].
    pub torque_limit: f64,
    /// Per-motor speed limit [rad/s].
    pub motor_speed_limit: f64,
    /// Unmodeled joint load applied by the plant only [N·m].
    pub plant_load: [f64; 2],
    ratio_table: Vec<[f64; 2]>,
    external_force: DVector<f64>,
}

impl Default for GearedTwoLink {
    fn default() -> Self {
        Self {
            masses: [1.0, 1.0],
            lengths: [1.0, 1.0],
            com: [0.5, 0.5],
            link_inertia: [1.0 / 12.0, 1.0 / 12.0],
            gravity: 9.81,
            damping: 0.0,
            rotor_inertia: 0.001,
            torque_limit: 20.0,
            motor_speed_limit: 300.0,
            plant_load: [0.0, 0.0],
            ratio_table: vec![[1.0, 1.0], [10.0, 1.0], [1.0, 10.0], [10.0, 10.0]],
            external_force: DVector::zeros(2),
        }
    }
}

impl GearedTwoLink {
    /// Default arm with a custom table of per-joint ratios.
    pub fn with_ratio_table(table: Vec<[f64; 2]>) -> Result<Self, ControllerError> {
        if table.is_empty() {
            return Err(ControllerError::NoModes);
        }
        for (i, entry) in table.iter().enumerate() {
            check_ratio(i, entry[0])?;
            check_ratio(i, entry[1])?;
        }
        Ok(Self {
            ratio_table: table,
            ..Self::default()
        })
    }

    /// Same arm with an unmodeled per-joint plant load [N·m].
    pub fn with_plant_load(mut self, load: [f64; 2]) -> Self {
        self.plant_load = load;
        self
    }

    #[inline]
    fn ratios_of(&self, mode: ActuationMode) -> [f64; 2] {
        self.ratio_table
            .get(mode.index())
            .copied()
            .unwrap_or([f64::NAN, f64::NAN])
    }

    /// Link inertia matrix without rotor contribution.
    fn link_mass_matrix(&self, q: &DVector<f64>) -> DMatrix<f64> {
        let [m1, m2] = self.masses;
        let [l1, _] = self.lengths;
        let [c1, c2] = self.com;
        let [i1, i2] = self.link_inertia;
        let cos2 = q[1].cos();

        let h11 = m1 * c1 * c1 + i1 + m2 * (l1 * l1 + c2 * c2 + 2.0 * l1 * c2 * cos2) + i2;
        let h12 = m2 * (c2 * c2 + l1 * c2 * cos2) + i2;
        let h22 = m2 * c2 * c2 + i2;
        DMatrix::from_row_slice(2, 2, &[h11, h12, h12, h22])
    }

    /// Coriolis/centrifugal + gravity + damping.
    fn bias_force(&self, q: &DVector<f64>, dq: &DVector<f64>) -> DVector<f64> {
        let [m1, m2] = self.masses;
        let [l1, _] = self.lengths;
        let [c1, c2] = self.com;
        let g = self.gravity;
        let h = m2 * l1 * c2 * q[1].sin();

        let coriolis = [-h * (2.0 * dq[0] * dq[1] + dq[1] * dq[1]), h * dq[0] * dq[0]];
        let cos1 = q[0].cos();
        let cos12 = (q[0] + q[1]).cos();
        let gravity = [
            (m1 * c1 + m2 * l1) * g * cos1 + m2 * c2 * g * cos12,
            m2 * c2 * g * cos12,
        ];
        DVector::from_fn(2, |i, _| coriolis[i] + gravity[i] + self.damping * dq[i])
    }
}

impl RatioProvider for GearedTwoLink {
    fn mode_count(&self) -> usize {
        self.ratio_table.len()
    }

    fn ratio(&self, mode: ActuationMode) -> DMatrix<f64> {
        let r = self.ratios_of(mode);
        DMatrix::from_diagonal(&DVector::from_row_slice(&r))
    }

    fn ratio_kind(&self) -> RatioKind {
        RatioKind::Matrix
    }
}

impl FeasibilityGate for GearedTwoLink {
    fn is_feasible(&self, state: &DVector<f64>, trial: &TrialInput<'_>) -> bool {
        let r = self.ratios_of(trial.mode);
        (0..2).all(|i| {
            trial.torque[i].abs() <= self.torque_limit
                && (r[i] * state[2 + i]).abs() <= self.motor_speed_limit
        })
    }
}

impl ManipulatorModel for GearedTwoLink {
    fn dof(&self) -> usize {
        2
    }

    fn inverse_dynamics(
        &self,
        q: &DVector<f64>,
        dq: &DVector<f64>,
        ddq: &DVector<f64>,
        mode: ActuationMode,
    ) -> DVector<f64> {
        let r = self.ratios_of(mode);
        let joint_force =
            self.inertia(q, mode) * ddq + self.bias_force(q, dq) + &self.external_force;
        DVector::from_fn(2, |i, _| joint_force[i] / r[i])
    }

    fn inertia(&self, q: &DVector<f64>, mode: ActuationMode) -> DMatrix<f64> {
        let r = self.ratios_of(mode);
        let mut h = self.link_mass_matrix(q);
        for i in 0..2 {
            h[(i, i)] += r[i] * r[i] * self.rotor_inertia;
        }
        h
    }

    fn external_force(&self) -> DVector<f64> {
        self.external_force.clone()
    }

    fn set_external_force(&mut self, force: DVector<f64>) {
        self.external_force = force;
    }
}

impl Plant for GearedTwoLink {
    fn state_derivative(
        &self,
        state: &DVector<f64>,
        torque: &DVector<f64>,
        mode: ActuationMode,
    ) -> DVector<f64> {
        let (q, dq) = self.state_to_joint(state);
        let r = self.ratios_of(mode);
        let rhs = DVector::from_fn(2, |i, _| {
            r[i] * torque[i] - self.plant_load[i]
        }) - self.bias_force(&q, &dq);
        let ddq = self
            .inertia(&q, mode)
            .lu()
            .solve(&rhs)
            .unwrap_or_else(|| DVector::from_element(2, f64::NAN));
        DVector::from_fn(4, |i, _| if i < 2 { dq[i] } else { ddq[i - 2] })
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
