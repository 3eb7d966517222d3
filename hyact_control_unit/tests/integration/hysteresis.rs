//! Integration test: mode selection and anti-chatter hysteresis.
//!
//! Runs closed loops on the geared pendulum and checks optimality of the
//! raw selection, spacing of accepted switches, the gain threshold,
//! reset behaviour and fixed-mode equivalence.

use hyact_common::control::config::{ControllerConfig, LawKind};
use hyact_common::control::error::AllocationFlags;
use hyact_common::control::mode::ActuationMode;
use hyact_common::control::output::ControlOutput;
use nalgebra::DVector;

use hyact_control_unit::HybridController;
use hyact_control_unit::control::law::{ComputedTorqueLaw, JointState, TorqueLaw};
use hyact_control_unit::control::tracking::JointReference;
use hyact_control_unit::control::{HysteresisState, ModeAllocator, ModeCost};
use hyact_control_unit::dynamics::pendulum::GearedPendulum;
use hyact_control_unit::dynamics::{ManipulatorModel, Plant, RatioProvider};

const DT: f64 = 0.001;

fn config(goal: f64) -> ControllerConfig {
    ControllerConfig {
        goal: vec![goal, 0.0],
        ..Default::default()
    }
}

/// Regulate the pendulum from rest at the origin, returning every output.
fn run(ctrl: &mut HybridController<GearedPendulum>, steps: usize) -> Vec<(f64, ControlOutput)> {
    run_on(ctrl, &GearedPendulum::default(), steps)
}

fn run_on(
    ctrl: &mut HybridController<GearedPendulum>,
    plant: &GearedPendulum,
    steps: usize,
) -> Vec<(f64, ControlOutput)> {
    let mut state = DVector::from_row_slice(&[0.0, 0.0]);
    let mut outputs = Vec::with_capacity(steps);
    for k in 0..steps {
        let t = k as f64 * DT;
        let out = ctrl.fixed_goal(&state, t);
        state = plant.euler_step(&state, &out.torque, out.mode, DT);
        outputs.push((t, out));
    }
    outputs
}

#[test]
fn selected_mode_has_minimal_feasible_norm() {
    let model = GearedPendulum::default();
    let law = ComputedTorqueLaw::default();
    let mut alloc = ModeAllocator::new(
        model.mode_count(),
        model.ratio_kind(),
        HysteresisState::new(&Default::default(), ActuationMode(0)),
    )
    .unwrap();

    for k in 0..200 {
        let x = k as f64 * 0.1;
        let state = DVector::from_row_slice(&[x.sin() * 2.0, (1.7 * x).cos() * 4.0]);
        let joints = JointState::from_state(&model, &state);
        let reference = JointReference::hold(
            DVector::from_element(1, (0.3 * x).cos()),
            DVector::zeros(1),
        );
        let request = law.track(&reference, &joints);

        let selection = alloc.evaluate(&model, &law, &request, &joints, &state);
        let out = alloc.allocate(&model, &law, &request, &joints, &state, x);

        if out.flags.contains(AllocationFlags::NO_FEASIBLE_MODE) {
            assert_eq!(selection.feasible_count(), 0);
            continue;
        }
        let chosen = out.torque.norm_squared();
        for cost in &selection.costs {
            if let ModeCost::Feasible(c) = cost {
                assert!(chosen <= *c, "step {k}: {chosen} > {c}");
            }
        }
        assert!(selection.costs[out.mode.index()].is_feasible());
    }
}

#[test]
fn accepted_switches_respect_dwell_time() {
    let mut cfg = config(1.0);
    cfg.hysteresis.enabled = true;
    cfg.hysteresis.switch_gain_threshold = 0.0;
    cfg.hysteresis.min_dwell_time = 0.05;
    let mut ctrl = HybridController::from_config(GearedPendulum::default(), &cfg).unwrap();

    let outputs = run(&mut ctrl, 3000);
    let switch_times: Vec<f64> = outputs
        .iter()
        .filter(|(_, o)| o.flags.contains(AllocationFlags::MODE_SWITCHED))
        .map(|(t, _)| *t)
        .collect();

    assert!(!switch_times.is_empty());
    assert_eq!(switch_times.len() as u64, ctrl.switch_count());
    for pair in switch_times.windows(2) {
        assert!(pair[1] - pair[0] >= 0.05 - 1e-9, "{pair:?}");
    }
    // Between switches the emitted mode never changes.
    for pair in outputs.windows(2) {
        if pair[1].1.mode != pair[0].1.mode {
            assert!(pair[1].1.flags.contains(AllocationFlags::MODE_SWITCHED));
        }
    }
}

#[test]
fn hysteresis_limits_mode_changes() {
    let mut cfg = config(1.0);
    cfg.law.kind = LawKind::SlidingMode;
    cfg.hysteresis.enabled = true;
    cfg.hysteresis.min_dwell_time = 0.1;
    let mut ctrl = HybridController::from_config(GearedPendulum::default(), &cfg).unwrap();

    let outputs = run(&mut ctrl, 3000);
    let changes = outputs
        .windows(2)
        .filter(|w| w[0].1.mode != w[1].1.mode)
        .count();
    // 3 s with 0.1 s dwell.
    assert!(changes <= 31, "{changes} mode changes");
}

#[test]
fn large_threshold_pins_default_mode() {
    let mut cfg = config(1.0);
    cfg.hysteresis.enabled = true;
    cfg.hysteresis.switch_gain_threshold = 1.0e3;
    let mut ctrl = HybridController::from_config(GearedPendulum::default(), &cfg).unwrap();

    for (_, out) in run(&mut ctrl, 500) {
        assert_eq!(out.mode, ActuationMode(0));
        if out.optimum != out.mode {
            assert!(out.flags.contains(AllocationFlags::SWITCH_REJECTED_GAIN));
        }
    }
    assert_eq!(ctrl.switch_count(), 0);
}

#[test]
fn reset_matches_fresh_controller() {
    let mut cfg = config(1.0);
    cfg.hysteresis.enabled = true;
    cfg.hysteresis.min_dwell_time = 0.2;
    let mut used = HybridController::from_config(GearedPendulum::default(), &cfg).unwrap();
    let fresh = HybridController::from_config(GearedPendulum::default(), &cfg).unwrap();

    run(&mut used, 1000);
    assert!(used.hysteresis().unwrap().last_switch_time().is_some());

    used.reset_hysteresis();
    let once = used.hysteresis().cloned();
    used.reset_hysteresis();
    assert_eq!(used.hysteresis().cloned(), once);
    assert_eq!(used.hysteresis(), fresh.hysteresis());

    // A reset run replays the fresh run exactly.
    let mut fresh = fresh;
    let a = run(&mut used, 200);
    let b = run(&mut fresh, 200);
    for ((_, x), (_, y)) in a.iter().zip(&b) {
        assert_eq!(x.to_vector(), y.to_vector());
    }
}

#[test]
fn fixed_mode_equals_single_ratio_table() {
    for kind in [LawKind::ComputedTorque, LawKind::SlidingMode] {
        let mut fixed_cfg = config(0.8);
        fixed_cfg.law.kind = kind;
        fixed_cfg.allocator.fixed_mode = Some(2);
        let mut fixed =
            HybridController::from_config(GearedPendulum::default(), &fixed_cfg).unwrap();

        let mut single_cfg = config(0.8);
        single_cfg.law.kind = kind;
        single_cfg.allocator.mode_count = 1;
        let single_model = GearedPendulum::with_ratios(vec![50.0]).unwrap();
        let mut single =
            HybridController::from_config(single_model.clone(), &single_cfg).unwrap();

        let a = run(&mut fixed, 1000);
        let b = run_on(&mut single, &single_model, 1000);
        for ((_, x), (_, y)) in a.iter().zip(&b) {
            assert_eq!(x.to_vector(), y.to_vector());
            assert_eq!(x.selector, 50.0);
        }
    }
}

#[test]
fn selector_tracks_model_ratio() {
    let model = GearedPendulum::default();
    let mut ctrl = HybridController::from_config(model.clone(), &config(1.0)).unwrap();
    for (_, out) in run(&mut ctrl, 500) {
        assert_eq!(out.selector, model.ratios()[out.mode.index()]);
        let vector = out.to_vector();
        assert_eq!(vector.len(), model.dof() + 1);
        assert_eq!(vector[1], out.selector);
    }
}
