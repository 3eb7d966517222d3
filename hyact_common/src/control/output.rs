//! Control output produced once per control step.
//!
//! The externally visible command is the concatenation of the torque vector
//! and the mode selector value (see [`ControlOutput::to_vector`]). The
//! remaining fields are diagnostics for the caller and for logging.

use nalgebra::DVector;

use super::error::AllocationFlags;
use super::mode::ActuationMode;

/// One control step's command plus allocation diagnostics.
#[derive(Debug, Clone, PartialEq)]
pub struct ControlOutput {
    /// Actuator torque for the selected mode (length = DOF).
    pub torque: DVector<f64>,
    /// Selected actuation mode.
    pub mode: ActuationMode,
    /// Published mode selector: scalar ratio (1-DOF) or mode index.
    pub selector: f64,
    /// Raw minimum-cost mode before hysteresis.
    pub optimum: ActuationMode,
    /// What the allocator did this step.
    pub flags: AllocationFlags,
}

impl ControlOutput {
    /// Number of torque components.
    #[inline]
    pub fn dof(&self) -> usize {
        self.torque.len()
    }

    /// Concatenate `[torque..., selector]` into the command vector.
    pub fn to_vector(&self) -> DVector<f64> {
        let n = self.torque.len();
        DVector::from_fn(n + 1, |i, _| if i < n { self.torque[i] } else { self.selector })
    }

    /// Returns true if torque and selector are finite (not NaN, not Inf).
    #[inline]
    pub fn is_finite(&self) -> bool {
        self.selector.is_finite() && self.torque.iter().all(|v| v.is_finite())
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
