//! Integration test: trajectory following from a sampled reference.
//!
//! A sinusoidal joint trajectory is sampled at 100 Hz, served through the
//! `Trajectory` request shape with linear interpolation, and tracked by the
//! pendulum in closed loop.

use hyact_common::control::config::{ControllerConfig, LawKind, RequestShape};
use nalgebra::DVector;

use hyact_control_unit::HybridController;
use hyact_control_unit::dynamics::Plant;
use hyact_control_unit::dynamics::pendulum::GearedPendulum;
use hyact_control_unit::reference::{Lookup, ReferenceSource, SampledTrajectory, TrajectoryTable};

const DT: f64 = 0.001;
const AMPLITUDE: f64 = 0.5;

fn sine_table(duration: f64) -> TrajectoryTable {
    let n = (duration / 0.01).round() as usize + 1;
    let times: Vec<f64> = (0..n).map(|i| i as f64 * 0.01).collect();
    TrajectoryTable {
        lookup: Lookup::Interpolate,
        positions: times.iter().map(|t| vec![AMPLITUDE * t.sin()]).collect(),
        velocities: times.iter().map(|t| vec![AMPLITUDE * t.cos()]).collect(),
        accelerations: times.iter().map(|t| vec![-AMPLITUDE * t.sin()]).collect(),
        times,
    }
}

fn track(kind: LawKind) -> f64 {
    let mut cfg = ControllerConfig::default();
    cfg.allocator.request = RequestShape::Trajectory;
    cfg.law.kind = kind;
    cfg.law.sliding_mode.surface_slope = 5.0;
    cfg.law.sliding_mode.disturbance_bound = 5.0;

    let trajectory = SampledTrajectory::from_table(sine_table(5.0)).unwrap();
    let reference = trajectory.clone();
    let mut ctrl = HybridController::from_config(GearedPendulum::default(), &cfg).unwrap();
    ctrl.set_trajectory(Box::new(trajectory)).unwrap();

    let plant = GearedPendulum::default();
    let mut state = DVector::from_row_slice(&[0.0, AMPLITUDE]);
    let mut worst = 0.0f64;
    for k in 0..5000 {
        let t = k as f64 * DT;
        let out = ctrl.control(&state, t).unwrap();
        if t >= 2.0 {
            let error = (state[0] - reference.reference_at(t).position[0]).abs();
            worst = worst.max(error);
        }
        state = plant.euler_step(&state, &out.torque, out.mode, DT);
    }
    worst
}

#[test]
fn computed_torque_tracks_sine() {
    let worst = track(LawKind::ComputedTorque);
    assert!(worst < 1e-3, "worst tracking error {worst}");
}

#[test]
fn sliding_mode_tracks_sine() {
    let worst = track(LawKind::SlidingMode);
    assert!(worst < 1e-2, "worst tracking error {worst}");
}

#[test]
fn trajectory_request_without_reference_fails() {
    let mut cfg = ControllerConfig::default();
    cfg.allocator.request = RequestShape::Trajectory;
    let mut ctrl = HybridController::from_config(GearedPendulum::default(), &cfg).unwrap();
    assert!(ctrl.control(&DVector::zeros(2), 0.0).is_err());
}
