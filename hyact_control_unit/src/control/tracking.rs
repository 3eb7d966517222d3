//! Tracking error dynamics.
//!
//! Turns a joint reference and the measured joint state into the desired
//! acceleration fed to the torque laws.
//!
//! Computed torque (critically damped second-order error):
//! ```text
//! ddq_r = ddq_d + 2·ζ·ω₀·(dq_d − dq) + ω₀²·(q_d − q)
//! ```
//!
//! Sliding mode (first-order surface):
//! ```text
//! q̃ = q − q_d,  dq̃ = dq − dq_d
//! s     = dq̃ + λ·q̃
//! dq_r  = dq_d − λ·q̃
//! ddq_r = ddq_d − λ·dq̃
//! ```

use hyact_common::control::config::ComputedTorqueParameters;
use nalgebra::DVector;

/// Desired joint position, velocity and acceleration at one instant.
#[derive(Debug, Clone, PartialEq)]
pub struct JointReference {
    pub position: DVector<f64>,
    pub velocity: DVector<f64>,
    pub acceleration: DVector<f64>,
}

impl JointReference {
    /// Constant reference: hold `position` at `velocity`, zero acceleration.
    pub fn hold(position: DVector<f64>, velocity: DVector<f64>) -> Self {
        let n = position.len();
        Self {
            position,
            velocity,
            acceleration: DVector::zeros(n),
        }
    }

    /// Degrees of freedom.
    #[inline]
    pub fn dof(&self) -> usize {
        self.position.len()
    }
}

/// Sliding surface plus the reference velocity/acceleration it implies.
#[derive(Debug, Clone, PartialEq)]
pub struct SlidingVariables {
    /// Surface value `s`.
    pub surface: DVector<f64>,
    /// Reference velocity `dq_r`.
    pub velocity: DVector<f64>,
    /// Reference acceleration `ddq_r`.
    pub acceleration: DVector<f64>,
}

/// Desired acceleration for the computed-torque law.
pub fn computed_torque_acceleration(
    reference: &JointReference,
    q: &DVector<f64>,
    dq: &DVector<f64>,
    params: &ComputedTorqueParameters,
) -> DVector<f64> {
    let w0 = params.natural_frequency;
    let kd = 2.0 * params.damping_ratio * w0;
    let kp = w0 * w0;

    let position_error = &reference.position - q;
    let velocity_error = &reference.velocity - dq;

    &reference.acceleration + velocity_error * kd + position_error * kp
}

/// Sliding surface and reference signals for the sliding-mode law.
pub fn sliding_variables(
    reference: &JointReference,
    q: &DVector<f64>,
    dq: &DVector<f64>,
    surface_slope: f64,
) -> SlidingVariables {
    let position_error = q - &reference.position;
    let velocity_error = dq - &reference.velocity;

    SlidingVariables {
        surface: &velocity_error + &position_error * surface_slope,
        velocity: &reference.velocity - &position_error * surface_slope,
        acceleration: &reference.acceleration - velocity_error * surface_slope,
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
