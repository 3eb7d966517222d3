//! Prelude module for common re-exports.
//!
//! ```rust
//! use hyact_common::prelude::*;
//! ```

// ─── Logging ────────────────────────────────────────────────────────
pub use crate::config::LogLevel;

// ─── Configuration ──────────────────────────────────────────────────
pub use crate::config::{ConfigError, ConfigLoader, SharedConfig};
pub use crate::control::config::{
    AllocatorConfig, ComputedTorqueParameters, ControllerConfig, HysteresisConfig, LawConfig,
    LawKind, ObserverConfig, RequestShape, SlidingModeParameters,
};

// ─── Control Types ──────────────────────────────────────────────────
pub use crate::control::error::AllocationFlags;
pub use crate::control::mode::{ActuationMode, RatioKind};
pub use crate::control::output::ControlOutput;

// ─── System Constants ───────────────────────────────────────────────
pub use crate::consts::{DEFAULT_MODE_COUNT, MAX_DOF, MAX_MODES};
