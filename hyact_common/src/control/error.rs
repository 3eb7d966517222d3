//! Allocation diagnostic flags.
//!
//! Every control step reports what the mode allocator did through a compact
//! bitflag set. Flags marked CRITICAL mean the emitted command may violate
//! actuator limits or is not a number; the caller decides how to react.

use bitflags::bitflags;
use static_assertions::const_assert_eq;

bitflags! {
    /// Per-step allocation diagnostics.
    ///
    /// CRITICAL flags: NO_FEASIBLE_MODE, NON_FINITE_TORQUE.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct AllocationFlags: u8 {
        /// A new mode was accepted this step.
        const MODE_SWITCHED         = 0x01;
        /// Raw optimum rejected: torque-norm gain below threshold.
        const SWITCH_REJECTED_GAIN  = 0x02;
        /// Raw optimum rejected: minimum dwell time not elapsed.
        const SWITCH_REJECTED_DWELL = 0x04;
        /// Every mode failed the feasibility gate. **CRITICAL**.
        const NO_FEASIBLE_MODE      = 0x08;
        /// Emitted torque contains NaN or Inf. **CRITICAL**.
        const NON_FINITE_TORQUE     = 0x10;
        /// Output produced by a fixed-mode allocator.
        const FIXED_MODE            = 0x20;
    }
}

const_assert_eq!(core::mem::size_of::<AllocationFlags>(), 1);

impl AllocationFlags {
    /// Mask of all CRITICAL flags.
    pub const CRITICAL_MASK: Self = Self::from_bits_truncate(
        Self::NO_FEASIBLE_MODE.bits() | Self::NON_FINITE_TORQUE.bits(),
    );

    /// Returns true if any CRITICAL flag is set.
    #[inline]
    pub const fn has_critical(&self) -> bool {
        self.intersects(Self::CRITICAL_MASK)
    }

    /// Returns true if hysteresis overrode the raw optimum.
    #[inline]
    pub const fn switch_rejected(&self) -> bool {
        self.intersects(Self::from_bits_truncate(
            Self::SWITCH_REJECTED_GAIN.bits() | Self::SWITCH_REJECTED_DWELL.bits(),
        ))
    }
}

impl Default for AllocationFlags {
    fn default() -> Self {
        Self::empty()
    }
}
