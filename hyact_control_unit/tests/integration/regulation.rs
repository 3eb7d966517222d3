//! Integration test: fixed-goal regulation in closed loop.
//!
//! Both reference models are driven to a goal state by both torque laws,
//! with the plant integrated by explicit Euler steps at 1 kHz. An
//! unmodeled plant load is rejected once the disturbance observer is on.

use hyact_common::control::config::{ControllerConfig, LawKind};
use nalgebra::DVector;

use hyact_control_unit::HybridController;
use hyact_control_unit::dynamics::pendulum::GearedPendulum;
use hyact_control_unit::dynamics::two_link::GearedTwoLink;
use hyact_control_unit::dynamics::{ManipulatorModel, Plant};

const DT: f64 = 0.001;

/// Run `steps` fixed-goal steps from `initial`, return the final state.
fn regulate<M: ManipulatorModel, P: Plant>(
    ctrl: &mut HybridController<M>,
    plant: &P,
    initial: &[f64],
    steps: usize,
) -> DVector<f64> {
    let mut state = DVector::from_row_slice(initial);
    for k in 0..steps {
        let out = ctrl.fixed_goal(&state, k as f64 * DT);
        assert!(out.is_finite(), "step {k}: {out:?}");
        state = plant.euler_step(&state, &out.torque, out.mode, DT);
    }
    state
}

fn pendulum_config(kind: LawKind) -> ControllerConfig {
    let mut cfg = ControllerConfig {
        goal: vec![1.0, 0.0],
        ..Default::default()
    };
    cfg.law.kind = kind;
    cfg.law.sliding_mode.surface_slope = 5.0;
    cfg.law.sliding_mode.disturbance_bound = 20.0;
    cfg
}

#[test]
fn pendulum_computed_torque_converges() {
    let mut ctrl = HybridController::from_config(
        GearedPendulum::default(),
        &pendulum_config(LawKind::ComputedTorque),
    )
    .unwrap();
    let state = regulate(&mut ctrl, &GearedPendulum::default(), &[0.0, 0.0], 5000);
    assert!((state[0] - 1.0).abs() < 1e-3, "q = {}", state[0]);
    assert!(state[1].abs() < 1e-2, "dq = {}", state[1]);
}

#[test]
fn pendulum_sliding_mode_converges() {
    let mut ctrl = HybridController::from_config(
        GearedPendulum::default(),
        &pendulum_config(LawKind::SlidingMode),
    )
    .unwrap();
    let state = regulate(&mut ctrl, &GearedPendulum::default(), &[0.0, 0.0], 6000);
    assert!((state[0] - 1.0).abs() < 2e-2, "q = {}", state[0]);
}

#[test]
fn pendulum_hysteresis_still_converges() {
    let mut cfg = pendulum_config(LawKind::ComputedTorque);
    cfg.hysteresis.enabled = true;
    cfg.hysteresis.switch_gain_threshold = 0.5;
    cfg.hysteresis.min_dwell_time = 0.1;
    let mut ctrl = HybridController::from_config(GearedPendulum::default(), &cfg).unwrap();
    let state = regulate(&mut ctrl, &GearedPendulum::default(), &[0.0, 0.0], 5000);
    assert!((state[0] - 1.0).abs() < 1e-3, "q = {}", state[0]);
}

#[test]
fn two_link_converges_for_both_laws() {
    for kind in [LawKind::ComputedTorque, LawKind::SlidingMode] {
        let mut cfg = ControllerConfig {
            goal: vec![0.5, -0.5, 0.0, 0.0],
            ..Default::default()
        };
        cfg.law.kind = kind;
        cfg.law.sliding_mode.surface_slope = 5.0;
        cfg.law.sliding_mode.disturbance_bound = 5.0;
        let mut ctrl = HybridController::from_config(GearedTwoLink::default(), &cfg).unwrap();
        let state = regulate(
            &mut ctrl,
            &GearedTwoLink::default(),
            &[0.0, 0.0, 0.0, 0.0],
            6000,
        );
        assert!((state[0] - 0.5).abs() < 2e-2, "{kind:?}: q1 = {}", state[0]);
        assert!((state[1] + 0.5).abs() < 2e-2, "{kind:?}: q2 = {}", state[1]);
    }
}

#[test]
fn observer_removes_load_offset() {
    let plant = GearedPendulum::default().with_plant_load(2.0);

    let cfg = pendulum_config(LawKind::ComputedTorque);
    let mut plain = HybridController::from_config(GearedPendulum::default(), &cfg).unwrap();
    let offset = regulate(&mut plain, &plant, &[0.0, 0.0], 5000)[0] - 1.0;
    assert!(offset.abs() > 1e-3, "offset = {offset}");

    let mut cfg = cfg;
    cfg.observer.active = true;
    cfg.observer.bandwidth = 50.0;
    let mut observed = HybridController::from_config(GearedPendulum::default(), &cfg).unwrap();
    let state = regulate(&mut observed, &plant, &[0.0, 0.0], 5000);
    assert!((state[0] - 1.0).abs() < 1e-4, "q = {}", state[0]);

    let estimate = observed.disturbance_estimate().unwrap();
    assert!((estimate[0] - 2.0).abs() < 1e-3, "estimate = {estimate}");
}

#[test]
fn plant_load_only_enters_forward_dynamics() {
    let nominal = GearedTwoLink::default();
    let loaded = GearedTwoLink::default().with_plant_load([1.0, -0.5]);
    let mode = hyact_common::control::mode::ActuationMode(3);

    let state = DVector::from_row_slice(&[0.3, -0.2, 0.0, 0.0]);
    let (q, dq) = nominal.state_to_joint(&state);
    let zero = DVector::zeros(2);

    let hold = nominal.inverse_dynamics(&q, &dq, &zero, mode);
    assert_eq!(hold, loaded.inverse_dynamics(&q, &dq, &zero, mode));

    let at_rest = nominal.state_derivative(&state, &hold, mode);
    assert!(at_rest.rows(2, 2).amax() < 1e-9, "{at_rest}");

    // H·ddq = −load when the nominal holding torque is applied.
    let drift = loaded.state_derivative(&state, &hold, mode);
    let residual = loaded.inertia(&q, mode) * drift.rows(2, 2) + DVector::from_row_slice(&[1.0, -0.5]);
    assert!(residual.amax() < 1e-9, "{residual}");
}
