//! Workspace-wide constants.
//!
//! Single source of truth for numeric limits and defaults used by the
//! configuration layer and the control unit.

/// Maximum number of discrete actuation modes a controller may evaluate.
pub const MAX_MODES: usize = 32;

/// Default number of actuation modes (four gear ratios).
pub const DEFAULT_MODE_COUNT: usize = 4;

/// Maximum supported degrees of freedom.
pub const MAX_DOF: usize = 16;

/// Default switch-gain threshold [Nm].
pub const SWITCH_GAIN_THRESHOLD_DEFAULT: f64 = 1.0;
/// Upper bound for the switch-gain threshold [Nm].
pub const SWITCH_GAIN_THRESHOLD_MAX: f64 = 1.0e6;

/// Default minimum dwell time between mode switches [s].
pub const MIN_DWELL_TIME_DEFAULT: f64 = 0.0;
/// Upper bound for the minimum dwell time [s].
pub const MIN_DWELL_TIME_MAX: f64 = 3600.0;

/// Default computed-torque natural frequency ω₀ [rad/s].
pub const NATURAL_FREQUENCY_DEFAULT: f64 = 10.0;
/// Default computed-torque damping ratio ζ.
pub const DAMPING_RATIO_DEFAULT: f64 = 0.7;

/// Default sliding surface slope λ.
pub const SURFACE_SLOPE_DEFAULT: f64 = 1.0;
/// Default discontinuous gain bound D (maximum expected disturbance).
pub const DISTURBANCE_BOUND_DEFAULT: f64 = 1.0;
/// Default minimum convergence rate η.
pub const CONVERGENCE_RATE_DEFAULT: f64 = 0.1;

/// Upper bound for any controller gain.
pub const GAIN_MAX: f64 = 1.0e6;

/// Default disturbance observer bandwidth [rad/s].
pub const OBSERVER_BANDWIDTH_DEFAULT: f64 = 50.0;

/// Default control step period [s].
pub const CONTROL_PERIOD_DEFAULT: f64 = 0.001;
