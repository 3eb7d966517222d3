//! Construction-time errors.
//!
//! Control steps never fail: infeasibility is reported through
//! `AllocationFlags`. Everything here is raised while wiring a controller
//! or a reference model together, before the first step runs.

use hyact_common::config::ConfigError;
use thiserror::Error;

/// Error raised while building a controller or a reference model.
#[derive(Debug, Clone, Error)]
pub enum ControllerError {
    /// Zero modes configured.
    #[error("at least one actuation mode is required")]
    NoModes,

    /// Configured mode count exceeds what the model provides.
    #[error("mode_count {configured} exceeds the model's {available} ratio entries")]
    ModeCountExceedsModel { configured: usize, available: usize },

    /// Default or fixed mode outside `0..mode_count`.
    #[error("{role} mode {mode} out of range [0, {mode_count})")]
    ModeOutOfRange {
        role: &'static str,
        mode: usize,
        mode_count: usize,
    },

    /// A vector does not match the model's degrees of freedom.
    #[error("{what} has length {actual}, expected {expected}")]
    DimensionMismatch {
        what: &'static str,
        expected: usize,
        actual: usize,
    },

    /// The model's ratio convention does not fit its degrees of freedom.
    #[error("{kind} ratio convention does not fit a {dof}-DOF model")]
    RatioKindMismatch { kind: &'static str, dof: usize },

    /// A ratio entry is zero, negative or non-finite.
    #[error("invalid ratio {value} for mode {mode}")]
    InvalidRatio { mode: usize, value: f64 },

    /// Hysteresis threshold or dwell time negative or NaN.
    #[error("invalid hysteresis parameter: {0}")]
    InvalidHysteresis(String),

    /// The request shape needs a trajectory that was never loaded.
    #[error("trajectory-following requested but no trajectory is loaded")]
    NoTrajectory,

    /// A reference trajectory is empty or its samples are inconsistent.
    #[error("invalid trajectory: {0}")]
    InvalidTrajectory(String),

    /// Configuration rejected.
    #[error(transparent)]
    Config(#[from] ConfigError),
}
