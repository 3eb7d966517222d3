//! Anti-chatter hysteresis on mode switches.
//!
//! A switch away from the incumbent mode is accepted only when both hold:
//! - the torque-norm gain `‖T[candidate] − T[incumbent]‖` reaches
//!   `switch_gain_threshold`;
//! - at least `min_dwell_time` has elapsed since the last accepted switch.
//!
//! The gain check runs first. The state persists across control steps within
//! one run and must be reset between independent runs.

use hyact_common::control::config::HysteresisConfig;
use hyact_common::control::mode::ActuationMode;

/// Outcome of one gate evaluation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HysteresisDecision {
    /// Gate disabled: the raw optimum is used, state untouched.
    Bypassed,
    /// Raw optimum equals the incumbent.
    Unchanged,
    /// Switch accepted; incumbent and switch time updated.
    Accepted,
    /// Gain below threshold; incumbent kept.
    RejectedGain { gain: f64 },
    /// Dwell time not elapsed; incumbent kept.
    RejectedDwell { gain: f64, earliest: f64 },
}

/// Incumbent mode and switching memory owned by one allocator.
#[derive(Debug, Clone, PartialEq)]
pub struct HysteresisState {
    last_mode: ActuationMode,
    /// `None` until the first accepted switch of a run.
    last_switch_time: Option<f64>,
    default_mode: ActuationMode,
    /// Minimum time between accepted switches [s].
    pub min_dwell_time: f64,
    /// Minimum torque-norm gain to switch [Nm].
    pub switch_gain_threshold: f64,
    /// Gate on/off.
    pub enabled: bool,
}

impl HysteresisState {
    /// Fresh state: incumbent = `default_mode`, no prior switch.
    pub fn new(config: &HysteresisConfig, default_mode: ActuationMode) -> Self {
        Self {
            last_mode: default_mode,
            last_switch_time: None,
            default_mode,
            min_dwell_time: config.min_dwell_time,
            switch_gain_threshold: config.switch_gain_threshold,
            enabled: config.enabled,
        }
    }

    /// Incumbent mode.
    #[inline]
    pub fn last_mode(&self) -> ActuationMode {
        self.last_mode
    }

    /// Time of the last accepted switch, `None` before the first one.
    #[inline]
    pub fn last_switch_time(&self) -> Option<f64> {
        self.last_switch_time
    }

    /// Mode restored by [`reset`](Self::reset).
    #[inline]
    pub fn default_mode(&self) -> ActuationMode {
        self.default_mode
    }

    /// Forget the incumbent and the last switch time. Idempotent.
    ///
    /// Call between independent runs, never mid-run.
    pub fn reset(&mut self) {
        self.last_mode = self.default_mode;
        self.last_switch_time = None;
    }

    /// Filter the raw optimum `candidate` at `time`.
    ///
    /// `gain` is evaluated only when a switch is actually contemplated.
    /// Returns the mode to apply this step and why.
    pub fn gate(
        &mut self,
        candidate: ActuationMode,
        time: f64,
        gain: impl FnOnce(ActuationMode) -> f64,
    ) -> (ActuationMode, HysteresisDecision) {
        if !self.enabled {
            return (candidate, HysteresisDecision::Bypassed);
        }
        if candidate == self.last_mode {
            return (candidate, HysteresisDecision::Unchanged);
        }

        let gain = gain(self.last_mode);
        if gain < self.switch_gain_threshold {
            return (self.last_mode, HysteresisDecision::RejectedGain { gain });
        }

        if let Some(last) = self.last_switch_time {
            let earliest = last + self.min_dwell_time;
            if time < earliest {
                return (
                    self.last_mode,
                    HysteresisDecision::RejectedDwell { gain, earliest },
                );
            }
        }

        self.last_mode = candidate;
        self.last_switch_time = Some(time);
        (candidate, HysteresisDecision::Accepted)
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
