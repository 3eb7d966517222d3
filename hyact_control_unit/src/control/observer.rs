//! Disturbance observer.
//!
//! Estimates the joint-space external force by comparing what was applied
//! with what the model says the realized motion should have needed. The
//! estimate is filtered with a first-order low-pass of bandwidth `g`; zero
//! bandwidth disables the observer entirely.
//!
//! Algorithm (discrete, per update at time `t_k`):
//! ```text
//! dt        = t_k − t_{k−1}
//! ddq_est   = (dq_k − dq_{k−1}) / dt
//! T_nominal = inverse_dynamics(q_{k−1}, dq_{k−1}, ddq_est, mode_{k−1})
//! d_raw     = R(mode_{k−1})·(T_{k−1} − T_nominal) + f_ext_installed
//! alpha     = g·dt / (1 + g·dt)
//! d_hat    += alpha·(d_raw − d_hat)
//! ```
//!
//! The controller installs `d_hat` in the model so the next inverse dynamics
//! call compensates for it.

use hyact_common::control::mode::ActuationMode;
use hyact_common::control::output::ControlOutput;
use nalgebra::DVector;

use crate::dynamics::ManipulatorModel;

/// Estimator of joint-space external forces.
pub trait DisturbanceObserver<M: ManipulatorModel + ?Sized> {
    /// Feed the measured `state` at `time` and the output emitted there.
    fn update_estimate(
        &mut self,
        model: &M,
        state: &DVector<f64>,
        output: &ControlOutput,
        time: f64,
    );

    /// Current joint-space force estimate.
    fn estimate(&self) -> DVector<f64>;

    /// Clear the estimate and all history.
    fn reset(&mut self);
}

/// One past measurement plus the command applied from it.
#[derive(Debug, Clone)]
struct Sample {
    q: DVector<f64>,
    dq: DVector<f64>,
    torque: DVector<f64>,
    mode: ActuationMode,
    time: f64,
}

/// First-order low-pass disturbance observer.
#[derive(Debug, Clone)]
pub struct FirstOrderObserver {
    /// Observer bandwidth [rad/s] (0 = disabled).
    pub bandwidth: f64,
    estimate: DVector<f64>,
    previous: Option<Sample>,
}

impl FirstOrderObserver {
    pub fn new(bandwidth: f64, dof: usize) -> Self {
        Self {
            bandwidth,
            estimate: DVector::zeros(dof),
            previous: None,
        }
    }

    /// Returns true when the bandwidth is positive.
    #[inline]
    pub fn is_enabled(&self) -> bool {
        self.bandwidth > 0.0
    }
}

impl<M: ManipulatorModel + ?Sized> DisturbanceObserver<M> for FirstOrderObserver {
    fn update_estimate(
        &mut self,
        model: &M,
        state: &DVector<f64>,
        output: &ControlOutput,
        time: f64,
    ) {
        let (q, dq) = model.state_to_joint(state);

        if self.is_enabled() {
            if let Some(prev) = &self.previous {
                let dt = time - prev.time;
                if dt > 0.0 {
                    let ddq = (&dq - &prev.dq) / dt;
                    let nominal = model.inverse_dynamics(&prev.q, &prev.dq, &ddq, prev.mode);
                    let raw = model.ratio(prev.mode) * (&prev.torque - nominal)
                        + model.external_force();

                    let alpha = self.bandwidth * dt / (1.0 + self.bandwidth * dt);
                    let correction = (raw - &self.estimate) * alpha;
                    self.estimate += correction;
                }
            }
        }

        self.previous = Some(Sample {
            q,
            dq,
            torque: output.torque.clone(),
            mode: output.mode,
            time,
        });
    }

    fn estimate(&self) -> DVector<f64> {
        self.estimate.clone()
    }

    fn reset(&mut self) {
        self.estimate.fill(0.0);
        self.previous = None;
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
