//! Fixed-mode allocator.
//!
//! Same output shape as [`ModeAllocator`](super::ModeAllocator) but pinned to
//! one configured mode: only that mode's torque is computed, the feasibility
//! gate is not consulted and there is no hysteresis state.

use hyact_common::control::error::AllocationFlags;
use hyact_common::control::mode::{ActuationMode, RatioKind};
use hyact_common::control::output::ControlOutput;
use tracing::warn;

use super::law::{JointState, TorqueLaw, TorqueRequest};
use crate::dynamics::ManipulatorModel;
use crate::error::ControllerError;

/// Allocator that always emits one mode.
#[derive(Debug, Clone)]
pub struct FixedModeAllocator {
    mode: ActuationMode,
    ratio_kind: RatioKind,
}

impl FixedModeAllocator {
    /// Pin to `mode`, which must lie in `0..mode_count`.
    pub fn new(
        mode: ActuationMode,
        mode_count: usize,
        ratio_kind: RatioKind,
    ) -> Result<Self, ControllerError> {
        if mode_count == 0 {
            return Err(ControllerError::NoModes);
        }
        if mode.index() >= mode_count {
            return Err(ControllerError::ModeOutOfRange {
                role: "fixed",
                mode: mode.index(),
                mode_count,
            });
        }
        Ok(Self { mode, ratio_kind })
    }

    #[inline]
    pub fn mode(&self) -> ActuationMode {
        self.mode
    }

    #[inline]
    pub fn ratio_kind(&self) -> &RatioKind {
        &self.ratio_kind
    }

    /// Torque of the fixed mode.
    pub fn allocate<M, L>(
        &self,
        model: &M,
        law: &L,
        request: &TorqueRequest,
        joints: &JointState,
        time: f64,
    ) -> ControlOutput
    where
        M: ManipulatorModel + ?Sized,
        L: TorqueLaw + ?Sized,
    {
        let torque = law.torque(model, &self.ratio_kind, request, joints, self.mode);
        let mut flags = AllocationFlags::FIXED_MODE;
        if torque.iter().any(|v| !v.is_finite()) {
            flags |= AllocationFlags::NON_FINITE_TORQUE;
            warn!(mode = %self.mode, time, "non-finite torque");
        }
        ControlOutput {
            torque,
            mode: self.mode,
            selector: self.ratio_kind.selector(self.mode),
            optimum: self.mode,
            flags,
        }
    }

    /// Nothing to reset.
    #[inline]
    pub fn reset_hysteresis(&mut self) {}
}

// ─── Tests ──────────────────────────────────────────────────────────
