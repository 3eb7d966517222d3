//! TOML configuration loader with validation.
//!
//! Loads a `ControllerConfig` (and optionally a sampled trajectory) from
//! disk. Every numeric parameter is bounds-checked before a controller is
//! built; wiring checks that need the model (mode count, goal length) happen
//! in `HybridController::new`.

use std::path::Path;

use hyact_common::config::{ConfigError, ConfigLoader};
use hyact_common::control::config::ControllerConfig;
use tracing::debug;

use crate::error::ControllerError;
use crate::reference::{SampledTrajectory, TrajectoryTable};

// ─── Loading Functions ──────────────────────────────────────────────

/// Load and validate the controller configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<ControllerConfig, ConfigError> {
    let config = ControllerConfig::load(path)?;
    config.validate()?;
    debug!(
        service = %config.shared.service_name,
        modes = config.allocator.mode_count,
        law = ?config.law.kind,
        "configuration loaded"
    );
    Ok(config)
}

/// Load config from a TOML string (for testing).
pub fn load_config_from_str(content: &str) -> Result<ControllerConfig, ConfigError> {
    let config = ControllerConfig::from_toml_str(content)?;
    config.validate()?;
    Ok(config)
}

/// Load a sampled trajectory from a TOML file.
///
/// Missing or malformed files surface as `ControllerError::Config`;
/// inconsistent samples as `InvalidTrajectory`.
pub fn load_trajectory(path: &Path) -> Result<SampledTrajectory, ControllerError> {
    let table = TrajectoryTable::load(path)?;
    let trajectory = SampledTrajectory::from_table(table)?;
    debug!(
        samples = trajectory.len(),
        path = %path.display(),
        "trajectory loaded"
    );
    Ok(trajectory)
}

// ─── Tests ──────────────────────────────────────────────────────────
