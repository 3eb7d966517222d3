//! Controller configuration structures.
//!
//! All config types use `serde::Deserialize` for TOML loading.
//! Numeric parameters are bounds-checked by `validate()`.
//! Every section is optional and falls back to `Default`.
//!
//! # TOML Example
//!
//! ```toml
//! [shared]
//! service_name = "pendulum-rmin"
//!
//! [allocator]
//! mode_count = 4
//! default_mode = 0
//! request = "fixed_goal"
//!
//! [hysteresis]
//! enabled = true
//! switch_gain_threshold = 0.5
//! min_dwell_time = 0.2
//!
//! [law]
//! kind = "sliding_mode"
//!
//! [law.sliding_mode]
//! surface_slope = 2.0
//! disturbance_bound = 1.0
//! convergence_rate = 0.1
//! ```

use serde::{Deserialize, Serialize};

use crate::config::{ConfigError, SharedConfig};
use crate::consts::{
    CONVERGENCE_RATE_DEFAULT, DAMPING_RATIO_DEFAULT, DEFAULT_MODE_COUNT,
    DISTURBANCE_BOUND_DEFAULT, GAIN_MAX, MAX_DOF, MAX_MODES, MIN_DWELL_TIME_DEFAULT,
    MIN_DWELL_TIME_MAX, NATURAL_FREQUENCY_DEFAULT, OBSERVER_BANDWIDTH_DEFAULT,
    SURFACE_SLOPE_DEFAULT, SWITCH_GAIN_THRESHOLD_DEFAULT, SWITCH_GAIN_THRESHOLD_MAX,
};

// ─── Top-Level Config ───────────────────────────────────────────────

/// Complete controller configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ControllerConfig {
    /// Service identity and log level.
    #[serde(default)]
    pub shared: SharedConfig,

    /// Mode count, default/fixed mode, request shape.
    #[serde(default)]
    pub allocator: AllocatorConfig,

    /// Anti-chatter hysteresis.
    #[serde(default)]
    pub hysteresis: HysteresisConfig,

    /// Continuous control law selection and gains.
    #[serde(default)]
    pub law: LawConfig,

    /// Disturbance observer.
    #[serde(default)]
    pub observer: ObserverConfig,

    /// Goal state `[q..., dq...]` for fixed-goal regulation (empty = origin).
    #[serde(default)]
    pub goal: Vec<f64>,

    /// Setpoint for manual acceleration requests (empty = zero).
    #[serde(default)]
    pub manual_setpoint: Vec<f64>,
}

impl ControllerConfig {
    /// Validate all sections.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.shared.validate()?;
        self.allocator
            .validate()
            .and_then(|()| self.hysteresis.validate())
            .and_then(|()| self.law.validate())
            .and_then(|()| self.observer.validate())
            .map_err(ConfigError::ValidationError)?;

        if self.goal.len() > 2 * MAX_DOF {
            return Err(ConfigError::ValidationError(format!(
                "goal has {} entries, max {}",
                self.goal.len(),
                2 * MAX_DOF
            )));
        }
        if self.goal.len() % 2 != 0 {
            return Err(ConfigError::ValidationError(format!(
                "goal must hold positions and velocities, got {} entries",
                self.goal.len()
            )));
        }
        if self.manual_setpoint.len() > MAX_DOF {
            return Err(ConfigError::ValidationError(format!(
                "manual_setpoint has {} entries, max {}",
                self.manual_setpoint.len(),
                MAX_DOF
            )));
        }
        if self.goal.iter().chain(&self.manual_setpoint).any(|v| !v.is_finite()) {
            return Err(ConfigError::ValidationError(
                "goal and manual_setpoint must be finite".to_string(),
            ));
        }
        Ok(())
    }
}

// ─── Allocator ──────────────────────────────────────────────────────

/// Which control request the controller's `control()` entry point serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestShape {
    /// Track a loaded reference trajectory.
    Trajectory,
    /// Regulate to the configured goal state.
    #[default]
    FixedGoal,
    /// Apply the manual setpoint directly.
    ManualAcceleration,
}

/// Mode domain and selection strategy.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AllocatorConfig {
    /// Number of actuation modes evaluated per step.
    #[serde(default = "default_mode_count")]
    pub mode_count: usize,

    /// Mode assumed before the first switch and after a reset.
    #[serde(default)]
    pub default_mode: usize,

    /// Pin the controller to this mode (no optimization).
    #[serde(default)]
    pub fixed_mode: Option<usize>,

    /// Request shape served by `control()`.
    #[serde(default)]
    pub request: RequestShape,
}

fn default_mode_count() -> usize {
    DEFAULT_MODE_COUNT
}

impl Default for AllocatorConfig {
    fn default() -> Self {
        Self {
            mode_count: DEFAULT_MODE_COUNT,
            default_mode: 0,
            fixed_mode: None,
            request: RequestShape::default(),
        }
    }
}

impl AllocatorConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.mode_count == 0 || self.mode_count > MAX_MODES {
            return Err(format!(
                "mode_count {} out of range [1, {}]",
                self.mode_count, MAX_MODES
            ));
        }
        if self.default_mode >= self.mode_count {
            return Err(format!(
                "default_mode {} out of range [0, {})",
                self.default_mode, self.mode_count
            ));
        }
        if let Some(fixed) = self.fixed_mode {
            if fixed >= self.mode_count {
                return Err(format!(
                    "fixed_mode {} out of range [0, {})",
                    fixed, self.mode_count
                ));
            }
        }
        Ok(())
    }
}

// ─── Hysteresis ─────────────────────────────────────────────────────

/// Anti-chatter parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HysteresisConfig {
    /// Enable the hysteresis gate (default: false).
    #[serde(default)]
    pub enabled: bool,

    /// Minimum torque-norm change required to switch [Nm].
    #[serde(default = "default_switch_gain_threshold")]
    pub switch_gain_threshold: f64,

    /// Minimum time between two accepted switches [s].
    #[serde(default = "default_min_dwell_time")]
    pub min_dwell_time: f64,
}

fn default_switch_gain_threshold() -> f64 {
    SWITCH_GAIN_THRESHOLD_DEFAULT
}
fn default_min_dwell_time() -> f64 {
    MIN_DWELL_TIME_DEFAULT
}

impl Default for HysteresisConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            switch_gain_threshold: SWITCH_GAIN_THRESHOLD_DEFAULT,
            min_dwell_time: MIN_DWELL_TIME_DEFAULT,
        }
    }
}

impl HysteresisConfig {
    pub fn validate(&self) -> Result<(), String> {
        check_range(
            "switch_gain_threshold",
            self.switch_gain_threshold,
            0.0,
            SWITCH_GAIN_THRESHOLD_MAX,
        )?;
        check_range("min_dwell_time", self.min_dwell_time, 0.0, MIN_DWELL_TIME_MAX)
    }
}

// ─── Control Law ────────────────────────────────────────────────────

/// Continuous control law.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LawKind {
    /// Pure model inversion.
    #[default]
    ComputedTorque,
    /// Model inversion minus a discontinuous robust term.
    SlidingMode,
}

/// Law selection plus gains for both laws.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LawConfig {
    #[serde(default)]
    pub kind: LawKind,
    #[serde(default)]
    pub computed_torque: ComputedTorqueParameters,
    #[serde(default)]
    pub sliding_mode: SlidingModeParameters,
}

impl LawConfig {
    pub fn validate(&self) -> Result<(), String> {
        self.computed_torque.validate()?;
        self.sliding_mode.validate()
    }
}

/// Second-order tracking error dynamics for the computed-torque law.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ComputedTorqueParameters {
    /// Closed-loop natural frequency ω₀ [rad/s].
    #[serde(default = "default_natural_frequency")]
    pub natural_frequency: f64,
    /// Closed-loop damping ratio ζ.
    #[serde(default = "default_damping_ratio")]
    pub damping_ratio: f64,
}

fn default_natural_frequency() -> f64 {
    NATURAL_FREQUENCY_DEFAULT
}
fn default_damping_ratio() -> f64 {
    DAMPING_RATIO_DEFAULT
}

impl Default for ComputedTorqueParameters {
    fn default() -> Self {
        Self {
            natural_frequency: NATURAL_FREQUENCY_DEFAULT,
            damping_ratio: DAMPING_RATIO_DEFAULT,
        }
    }
}

impl ComputedTorqueParameters {
    pub fn validate(&self) -> Result<(), String> {
        check_range("natural_frequency", self.natural_frequency, 0.0, GAIN_MAX)?;
        check_range("damping_ratio", self.damping_ratio, 0.0, GAIN_MAX)
    }
}

/// Sliding-mode law parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SlidingModeParameters {
    /// Sliding surface slope λ.
    #[serde(default = "default_surface_slope")]
    pub surface_slope: f64,
    /// Maximum expected disturbance magnitude D.
    #[serde(default = "default_disturbance_bound")]
    pub disturbance_bound: f64,
    /// Minimum required convergence rate η.
    #[serde(default = "default_convergence_rate")]
    pub convergence_rate: f64,
}

fn default_surface_slope() -> f64 {
    SURFACE_SLOPE_DEFAULT
}
fn default_disturbance_bound() -> f64 {
    DISTURBANCE_BOUND_DEFAULT
}
fn default_convergence_rate() -> f64 {
    CONVERGENCE_RATE_DEFAULT
}

impl Default for SlidingModeParameters {
    fn default() -> Self {
        Self {
            surface_slope: SURFACE_SLOPE_DEFAULT,
            disturbance_bound: DISTURBANCE_BOUND_DEFAULT,
            convergence_rate: CONVERGENCE_RATE_DEFAULT,
        }
    }
}

impl SlidingModeParameters {
    pub fn validate(&self) -> Result<(), String> {
        check_range("surface_slope", self.surface_slope, 0.0, GAIN_MAX)?;
        check_range("disturbance_bound", self.disturbance_bound, 0.0, GAIN_MAX)?;
        check_range("convergence_rate", self.convergence_rate, 0.0, GAIN_MAX)
    }
}

// ─── Observer ───────────────────────────────────────────────────────

/// Disturbance observer settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ObserverConfig {
    /// Feed the observer estimate back into the model (default: false).
    #[serde(default)]
    pub active: bool,
    /// Low-pass bandwidth [rad/s] (0 = observer output stays zero).
    #[serde(default = "default_observer_bandwidth")]
    pub bandwidth: f64,
}

fn default_observer_bandwidth() -> f64 {
    OBSERVER_BANDWIDTH_DEFAULT
}

impl Default for ObserverConfig {
    fn default() -> Self {
        Self {
            active: false,
            bandwidth: OBSERVER_BANDWIDTH_DEFAULT,
        }
    }
}

impl ObserverConfig {
    pub fn validate(&self) -> Result<(), String> {
        check_range("observer bandwidth", self.bandwidth, 0.0, GAIN_MAX)
    }
}

fn check_range(name: &str, value: f64, min: f64, max: f64) -> Result<(), String> {
    if !(min..=max).contains(&value) {
        return Err(format!("{name} {value} out of range [{min}, {max}]"));
    }
    Ok(())
}
