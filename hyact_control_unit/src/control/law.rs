//! Continuous torque laws.
//!
//! A torque law answers one question for the allocator: *which actuator
//! torque realizes the requested motion if mode `k` is engaged?* Two laws
//! share the [`TorqueLaw`] contract:
//!
//! - [`ComputedTorqueLaw`] — pure model inversion.
//! - [`SlidingModeLaw`] — model inversion minus a discontinuous term:
//!
//! ```text
//! T = T_model(ddq_r, q, dq, k) − K(q, k)·sign(s)
//! K = R⁻¹ · H · diag(diag(H⁻¹·D·I + η·I))
//! ```
//!
//! Only the diagonal of the bracketed product is kept, giving a decoupled
//! per-joint worst-case gain. Singular `H` or `R` yields NaN entries, which
//! propagate to the caller.

use hyact_common::control::config::{
    ComputedTorqueParameters, LawConfig, LawKind, SlidingModeParameters,
};
use hyact_common::control::mode::{ActuationMode, RatioKind};
use nalgebra::{DMatrix, DVector};

use super::tracking::{JointReference, computed_torque_acceleration, sliding_variables};
use crate::dynamics::ManipulatorModel;

/// What the laws are asked to realize this step.
#[derive(Debug, Clone, PartialEq)]
pub struct TorqueRequest {
    /// Desired (reference) joint acceleration.
    pub acceleration: DVector<f64>,
    /// Sliding surface value; ignored by computed torque, zero when absent.
    pub surface: Option<DVector<f64>>,
}

impl TorqueRequest {
    /// Plain acceleration request, no surface.
    pub fn acceleration(acceleration: DVector<f64>) -> Self {
        Self {
            acceleration,
            surface: None,
        }
    }
}

/// Measured joint positions and velocities, split once per step.
#[derive(Debug, Clone, PartialEq)]
pub struct JointState {
    pub q: DVector<f64>,
    pub dq: DVector<f64>,
}

impl JointState {
    /// Split `state` with the model's convention.
    pub fn from_state<M: ManipulatorModel + ?Sized>(model: &M, state: &DVector<f64>) -> Self {
        let (q, dq) = model.state_to_joint(state);
        Self { q, dq }
    }
}

/// Torque law contract shared by the allocators.
pub trait TorqueLaw {
    /// Request derived from tracking `reference` at the measured joint state.
    fn track(&self, reference: &JointReference, joints: &JointState) -> TorqueRequest;

    /// Request built from a manual setpoint.
    fn manual(&self, setpoint: &DVector<f64>) -> TorqueRequest;

    /// Actuator torque realizing `request` under `mode`.
    fn torque<M: ManipulatorModel + ?Sized>(
        &self,
        model: &M,
        ratio_kind: &RatioKind,
        request: &TorqueRequest,
        joints: &JointState,
        mode: ActuationMode,
    ) -> DVector<f64>;
}

// ─── Computed Torque ────────────────────────────────────────────────

/// Model inversion with second-order tracking error dynamics.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ComputedTorqueLaw {
    pub params: ComputedTorqueParameters,
}

impl ComputedTorqueLaw {
    pub fn new(params: ComputedTorqueParameters) -> Self {
        Self { params }
    }
}

impl TorqueLaw for ComputedTorqueLaw {
    fn track(&self, reference: &JointReference, joints: &JointState) -> TorqueRequest {
        TorqueRequest::acceleration(computed_torque_acceleration(
            reference,
            &joints.q,
            &joints.dq,
            &self.params,
        ))
    }

    fn manual(&self, setpoint: &DVector<f64>) -> TorqueRequest {
        TorqueRequest::acceleration(setpoint.clone())
    }

    #[inline]
    fn torque<M: ManipulatorModel + ?Sized>(
        &self,
        model: &M,
        _ratio_kind: &RatioKind,
        request: &TorqueRequest,
        joints: &JointState,
        mode: ActuationMode,
    ) -> DVector<f64> {
        model.inverse_dynamics(&joints.q, &joints.dq, &request.acceleration, mode)
    }
}

// ─── Sliding Mode ───────────────────────────────────────────────────

/// Model inversion plus a discontinuous robustness term.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SlidingModeLaw {
    pub params: SlidingModeParameters,
}

impl SlidingModeLaw {
    pub fn new(params: SlidingModeParameters) -> Self {
        Self { params }
    }

    /// Discontinuous gain matrix `K(q, mode)`.
    pub fn discontinuous_gain<M: ManipulatorModel + ?Sized>(
        &self,
        model: &M,
        ratio_kind: &RatioKind,
        q: &DVector<f64>,
        mode: ActuationMode,
    ) -> DMatrix<f64> {
        let n = model.dof();
        let h = model.inertia(q, mode);

        let (h_inv, r_inv) = match ratio_kind {
            RatioKind::Scalar(_) => (
                h.map(|v| 1.0 / v),
                DMatrix::from_element(1, 1, 1.0 / ratio_kind.selector(mode)),
            ),
            RatioKind::Matrix => (
                invert_or_nan(h.clone()),
                invert_or_nan(model.ratio(mode)),
            ),
        };

        let dist_max = DMatrix::<f64>::identity(n, n) * self.params.disturbance_bound;
        let conv_min = DMatrix::<f64>::identity(n, n) * self.params.convergence_rate;

        // Keep only the diagonal of H⁻¹·D + η.
        let bracket = h_inv * dist_max + conv_min;
        let diag_gain = DMatrix::from_diagonal(&bracket.diagonal());

        r_inv * (h * diag_gain)
    }
}

impl TorqueLaw for SlidingModeLaw {
    fn track(&self, reference: &JointReference, joints: &JointState) -> TorqueRequest {
        let sv = sliding_variables(reference, &joints.q, &joints.dq, self.params.surface_slope);
        TorqueRequest {
            acceleration: sv.acceleration,
            surface: Some(sv.surface),
        }
    }

    /// The setpoint drives the discontinuous term directly; ddq_r = 0.
    fn manual(&self, setpoint: &DVector<f64>) -> TorqueRequest {
        TorqueRequest {
            acceleration: DVector::zeros(setpoint.len()),
            surface: Some(setpoint.clone()),
        }
    }

    fn torque<M: ManipulatorModel + ?Sized>(
        &self,
        model: &M,
        ratio_kind: &RatioKind,
        request: &TorqueRequest,
        joints: &JointState,
        mode: ActuationMode,
    ) -> DVector<f64> {
        let computed = model.inverse_dynamics(&joints.q, &joints.dq, &request.acceleration, mode);
        match &request.surface {
            Some(s) => {
                let k = self.discontinuous_gain(model, ratio_kind, &joints.q, mode);
                computed - k * sign(s)
            }
            None => computed,
        }
    }
}

// ─── Law Selection ──────────────────────────────────────────────────

/// Config-selected law.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ControlLaw {
    ComputedTorque(ComputedTorqueLaw),
    SlidingMode(SlidingModeLaw),
}

impl ControlLaw {
    /// Build the law named by `config.kind`.
    pub fn from_config(config: &LawConfig) -> Self {
        match config.kind {
            LawKind::ComputedTorque => {
                Self::ComputedTorque(ComputedTorqueLaw::new(config.computed_torque))
            }
            LawKind::SlidingMode => Self::SlidingMode(SlidingModeLaw::new(config.sliding_mode)),
        }
    }

    pub fn kind(&self) -> LawKind {
        match self {
            Self::ComputedTorque(_) => LawKind::ComputedTorque,
            Self::SlidingMode(_) => LawKind::SlidingMode,
        }
    }
}

impl TorqueLaw for ControlLaw {
    fn track(&self, reference: &JointReference, joints: &JointState) -> TorqueRequest {
        match self {
            Self::ComputedTorque(law) => law.track(reference, joints),
            Self::SlidingMode(law) => law.track(reference, joints),
        }
    }

    fn manual(&self, setpoint: &DVector<f64>) -> TorqueRequest {
        match self {
            Self::ComputedTorque(law) => law.manual(setpoint),
            Self::SlidingMode(law) => law.manual(setpoint),
        }
    }

    fn torque<M: ManipulatorModel + ?Sized>(
        &self,
        model: &M,
        ratio_kind: &RatioKind,
        request: &TorqueRequest,
        joints: &JointState,
        mode: ActuationMode,
    ) -> DVector<f64> {
        match self {
            Self::ComputedTorque(law) => law.torque(model, ratio_kind, request, joints, mode),
            Self::SlidingMode(law) => law.torque(model, ratio_kind, request, joints, mode),
        }
    }
}

/// Element-wise sign with `sign(0) = 0` and NaN preserved.
pub fn sign(v: &DVector<f64>) -> DVector<f64> {
    v.map(|x| {
        if x > 0.0 {
            1.0
        } else if x < 0.0 {
            -1.0
        } else {
            // 0.0, -0.0 and NaN map to themselves
            x
        }
    })
}

fn invert_or_nan(m: DMatrix<f64>) -> DMatrix<f64> {
    let (rows, cols) = m.shape();
    m.try_inverse()
        .unwrap_or_else(|| DMatrix::from_element(rows, cols, f64::NAN))
}

// ─── Tests ──────────────────────────────────────────────────────────
