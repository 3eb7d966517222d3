//! Cost-minimizing actuation mode allocator.
//!
//! Each control step:
//!
//! 1. every mode `i` in `0..mode_count` gets a torque `T[i]` from the law;
//! 2. the feasibility gate tags each mode `Feasible(‖T[i]‖²)` or `Infeasible`;
//! 3. the raw optimum is the first feasible mode of minimal cost;
//! 4. the hysteresis gate may keep the incumbent instead;
//! 5. the selected torque is emitted with its mode selector.
//!
//! If no mode is feasible the incumbent is kept, hysteresis state is left
//! untouched and the output carries `NO_FEASIBLE_MODE`.

use hyact_common::control::error::AllocationFlags;
use hyact_common::control::mode::{ActuationMode, RatioKind};
use hyact_common::control::output::ControlOutput;
use nalgebra::DVector;
use tracing::{debug, trace, warn};

use super::hysteresis::{HysteresisDecision, HysteresisState};
use super::law::{JointState, TorqueLaw, TorqueRequest};
use crate::dynamics::{ManipulatorModel, TrialInput};
use crate::error::ControllerError;

/// Cost of one candidate mode.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ModeCost {
    /// Passed the feasibility gate; squared torque norm.
    Feasible(f64),
    /// Rejected by the feasibility gate.
    Infeasible,
}

impl ModeCost {
    /// Cost value, `None` for infeasible modes.
    #[inline]
    pub fn value(&self) -> Option<f64> {
        match self {
            Self::Feasible(c) => Some(*c),
            Self::Infeasible => None,
        }
    }

    #[inline]
    pub fn is_feasible(&self) -> bool {
        matches!(self, Self::Feasible(_))
    }
}

/// Per-mode torques and costs for one step. Both vectors have one entry per
/// configured mode.
#[derive(Debug, Clone, PartialEq)]
pub struct ModeSelection {
    pub torques: Vec<DVector<f64>>,
    pub costs: Vec<ModeCost>,
}

impl ModeSelection {
    /// Lowest-cost feasible mode; ties go to the lowest index.
    ///
    /// NaN costs rank after every number.
    pub fn optimum(&self) -> Option<ActuationMode> {
        let mut best: Option<(usize, f64)> = None;
        for (i, cost) in self.costs.iter().enumerate() {
            let Some(c) = cost.value() else { continue };
            let better = match best {
                None => true,
                Some((_, b)) => c < b || (b.is_nan() && !c.is_nan()),
            };
            if better {
                best = Some((i, c));
            }
        }
        best.map(|(i, _)| ActuationMode(i))
    }

    /// Torque-norm gain of switching from `from` to `to`.
    #[inline]
    pub fn switch_gain(&self, to: ActuationMode, from: ActuationMode) -> f64 {
        (&self.torques[to.index()] - &self.torques[from.index()]).norm()
    }

    /// Number of feasible modes.
    pub fn feasible_count(&self) -> usize {
        self.costs.iter().filter(|c| c.is_feasible()).count()
    }
}

/// Mode allocator with hysteresis.
#[derive(Debug, Clone)]
pub struct ModeAllocator {
    mode_count: usize,
    ratio_kind: RatioKind,
    hysteresis: HysteresisState,
    switch_count: u64,
}

impl ModeAllocator {
    /// Allocator over `0..mode_count`.
    ///
    /// `hysteresis.default_mode()` must lie inside the mode range and the
    /// gate parameters must be non-negative.
    pub fn new(
        mode_count: usize,
        ratio_kind: RatioKind,
        hysteresis: HysteresisState,
    ) -> Result<Self, ControllerError> {
        if mode_count == 0 {
            return Err(ControllerError::NoModes);
        }
        let default_mode = hysteresis.default_mode().index();
        if default_mode >= mode_count {
            return Err(ControllerError::ModeOutOfRange {
                role: "default",
                mode: default_mode,
                mode_count,
            });
        }
        if !(hysteresis.switch_gain_threshold >= 0.0) {
            return Err(ControllerError::InvalidHysteresis(format!(
                "switch_gain_threshold {} must be >= 0",
                hysteresis.switch_gain_threshold
            )));
        }
        if !(hysteresis.min_dwell_time >= 0.0) {
            return Err(ControllerError::InvalidHysteresis(format!(
                "min_dwell_time {} must be >= 0",
                hysteresis.min_dwell_time
            )));
        }
        Ok(Self {
            mode_count,
            ratio_kind,
            hysteresis,
            switch_count: 0,
        })
    }

    #[inline]
    pub fn mode_count(&self) -> usize {
        self.mode_count
    }

    #[inline]
    pub fn ratio_kind(&self) -> &RatioKind {
        &self.ratio_kind
    }

    #[inline]
    pub fn hysteresis(&self) -> &HysteresisState {
        &self.hysteresis
    }

    /// Accepted switches since construction or the last reset.
    #[inline]
    pub fn switch_count(&self) -> u64 {
        self.switch_count
    }

    /// Evaluate torque and cost for every mode.
    pub fn evaluate<M, L>(
        &self,
        model: &M,
        law: &L,
        request: &TorqueRequest,
        joints: &JointState,
        state: &DVector<f64>,
    ) -> ModeSelection
    where
        M: ManipulatorModel + ?Sized,
        L: TorqueLaw + ?Sized,
    {
        let mut torques = Vec::with_capacity(self.mode_count);
        let mut costs = Vec::with_capacity(self.mode_count);

        for i in 0..self.mode_count {
            let mode = ActuationMode(i);
            let torque = law.torque(model, &self.ratio_kind, request, joints, mode);
            let trial = TrialInput {
                torque: &torque,
                mode,
                selector: self.ratio_kind.selector(mode),
            };
            let cost = if model.is_feasible(state, &trial) {
                ModeCost::Feasible(torque.norm_squared())
            } else {
                ModeCost::Infeasible
            };
            trace!(mode = i, ?cost, "mode evaluated");
            torques.push(torque);
            costs.push(cost);
        }

        ModeSelection { torques, costs }
    }

    /// Select a mode for this step and emit its torque.
    pub fn allocate<M, L>(
        &mut self,
        model: &M,
        law: &L,
        request: &TorqueRequest,
        joints: &JointState,
        state: &DVector<f64>,
        time: f64,
    ) -> ControlOutput
    where
        M: ManipulatorModel + ?Sized,
        L: TorqueLaw + ?Sized,
    {
        let selection = self.evaluate(model, law, request, joints, state);
        let mut flags = AllocationFlags::empty();

        let (mode, optimum) = match selection.optimum() {
            Some(optimum) => {
                let (mode, decision) = self
                    .hysteresis
                    .gate(optimum, time, |incumbent| {
                        selection.switch_gain(optimum, incumbent)
                    });
                match decision {
                    HysteresisDecision::Accepted => {
                        self.switch_count += 1;
                        flags |= AllocationFlags::MODE_SWITCHED;
                        debug!(%mode, time, "mode switch accepted");
                    }
                    HysteresisDecision::RejectedGain { gain } => {
                        flags |= AllocationFlags::SWITCH_REJECTED_GAIN;
                        debug!(%optimum, kept = %mode, gain, "mode switch rejected: gain");
                    }
                    HysteresisDecision::RejectedDwell { earliest, .. } => {
                        flags |= AllocationFlags::SWITCH_REJECTED_DWELL;
                        debug!(%optimum, kept = %mode, time, earliest, "mode switch rejected: dwell");
                    }
                    HysteresisDecision::Bypassed | HysteresisDecision::Unchanged => {}
                }
                (mode, optimum)
            }
            None => {
                let incumbent = self.hysteresis.last_mode();
                flags |= AllocationFlags::NO_FEASIBLE_MODE;
                warn!(
                    modes = self.mode_count,
                    kept = %incumbent,
                    time,
                    "no feasible mode, keeping incumbent"
                );
                (incumbent, incumbent)
            }
        };

        let mut torques = selection.torques;
        let torque = torques.swap_remove(mode.index());
        if torque.iter().any(|v| !v.is_finite()) {
            flags |= AllocationFlags::NON_FINITE_TORQUE;
            warn!(%mode, time, "non-finite torque");
        }

        ControlOutput {
            torque,
            mode,
            selector: self.ratio_kind.selector(mode),
            optimum,
            flags,
        }
    }

    /// Return to the default mode with no prior switch. Idempotent.
    pub fn reset_hysteresis(&mut self) {
        self.hysteresis.reset();
        self.switch_count = 0;
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
