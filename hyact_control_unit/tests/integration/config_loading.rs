//! Integration test: configuration files → validated controller.
//!
//! Writes TOML documents to temporary files, loads them through the public
//! loaders, and checks that construction-time validation against the model
//! catches what the file alone cannot.

use std::io::Write;

use hyact_common::config::ConfigError;
use hyact_common::control::config::{LawKind, RequestShape};
use hyact_common::control::error::AllocationFlags;
use hyact_common::control::mode::ActuationMode;
use nalgebra::DVector;
use tempfile::NamedTempFile;

use hyact_control_unit::config::{load_config, load_trajectory};
use hyact_control_unit::dynamics::pendulum::GearedPendulum;
use hyact_control_unit::dynamics::two_link::GearedTwoLink;
use hyact_control_unit::{ControllerError, HybridController};

const TWO_LINK_TOML: &str = r#"
goal = [0.3, -0.2, 0.0, 0.0]

[shared]
service_name = "two-link-bench"
log_level = "debug"

[allocator]
mode_count = 4
default_mode = 3
request = "fixed_goal"

[hysteresis]
enabled = true
switch_gain_threshold = 0.5
min_dwell_time = 0.1

[law]
kind = "sliding_mode"

[law.sliding_mode]
surface_slope = 4.0
disturbance_bound = 2.0
convergence_rate = 0.2

[observer]
active = true
bandwidth = 30.0
"#;

fn write_temp(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

#[test]
fn file_to_running_controller() {
    let file = write_temp(TWO_LINK_TOML);
    let cfg = load_config(file.path()).unwrap();
    assert_eq!(cfg.law.kind, LawKind::SlidingMode);
    assert_eq!(cfg.allocator.request, RequestShape::FixedGoal);

    let mut ctrl = HybridController::from_config(GearedTwoLink::default(), &cfg).unwrap();
    assert_eq!(ctrl.hysteresis().unwrap().last_mode(), ActuationMode(3));
    assert!(ctrl.disturbance_estimate().is_some());

    let out = ctrl.control(&DVector::zeros(4), 0.0).unwrap();
    assert_eq!(out.dof(), 2);
    assert!(out.is_finite());
    assert!(!out.flags.contains(AllocationFlags::FIXED_MODE));
    // Multi-DOF selector is the mode index.
    assert_eq!(out.selector, out.mode.index() as f64);
}

#[test]
fn model_rejects_what_the_file_allows() {
    // Valid on its own, but the pendulum has 1 DOF.
    let file = write_temp(TWO_LINK_TOML);
    let cfg = load_config(file.path()).unwrap();
    assert!(matches!(
        HybridController::from_config(GearedPendulum::default(), &cfg),
        Err(ControllerError::DimensionMismatch { what: "goal", .. })
    ));

    // More modes than the model's ratio table.
    let file = write_temp("[allocator]\nmode_count = 6\n");
    let cfg = load_config(file.path()).unwrap();
    assert!(matches!(
        HybridController::from_config(GearedTwoLink::default(), &cfg),
        Err(ControllerError::ModeCountExceedsModel { configured: 6, available: 4 })
    ));
}

#[test]
fn invalid_files_rejected() {
    let file = write_temp("[allocator]\nmode_count = 4\ndefault_mode = 4\n");
    assert!(matches!(
        load_config(file.path()),
        Err(ConfigError::ValidationError(_))
    ));

    let file = write_temp("[allocator]\nmodes = 4\n");
    assert!(matches!(
        load_config(file.path()),
        Err(ConfigError::ParseError(_))
    ));

    let file = write_temp("[law]\nkind = \"bang_bang\"\n");
    assert!(matches!(
        load_config(file.path()),
        Err(ConfigError::ParseError(_))
    ));
}

#[test]
fn trajectory_file_drives_trajectory_request() {
    let cfg_file = write_temp("[allocator]\nrequest = \"trajectory\"\n");
    let traj_file = write_temp(
        r#"
lookup = "closest"
times = [0.0, 0.5, 1.0]
positions = [[0.0], [0.2], [0.4]]
velocities = [[0.4], [0.4], [0.4]]
accelerations = [[0.0], [0.0], [0.0]]
"#,
    );

    let cfg = load_config(cfg_file.path()).unwrap();
    let trajectory = load_trajectory(traj_file.path()).unwrap();
    let mut ctrl = HybridController::from_config(GearedPendulum::default(), &cfg).unwrap();
    ctrl.set_trajectory(Box::new(trajectory)).unwrap();

    let out = ctrl.control(&DVector::from_row_slice(&[0.0, 0.4]), 0.0).unwrap();
    assert!(out.is_finite());

    let bad = write_temp("times = [1.0, 0.0]\npositions = [[0.0], [0.0]]\nvelocities = [[0.0], [0.0]]\naccelerations = [[0.0], [0.0]]\n");
    assert!(matches!(
        load_trajectory(bad.path()),
        Err(ControllerError::InvalidTrajectory(_))
    ));
}
