//! Mode allocation micro-benchmark.
//!
//! Measures one full control step (tracking error, per-mode torque,
//! feasibility, argmin, hysteresis) for:
//! - computed torque on the 1-DOF pendulum (4 scalar ratios)
//! - sliding mode on the 1-DOF pendulum
//! - computed torque on the 2-DOF arm (4 ratio matrices)
//! - sliding mode on the 2-DOF arm
//! - the fixed-mode controller as a floor

use criterion::{Criterion, criterion_group, criterion_main};
use nalgebra::DVector;
use std::hint::black_box;

use hyact_common::control::config::{ControllerConfig, LawKind};
use hyact_control_unit::HybridController;
use hyact_control_unit::dynamics::ManipulatorModel;
use hyact_control_unit::dynamics::pendulum::GearedPendulum;
use hyact_control_unit::dynamics::two_link::GearedTwoLink;

const DT: f64 = 0.001; // 1 kHz

fn config(kind: LawKind) -> ControllerConfig {
    let mut cfg = ControllerConfig::default();
    cfg.law.kind = kind;
    cfg.hysteresis.enabled = true;
    cfg.hysteresis.switch_gain_threshold = 0.1;
    cfg.hysteresis.min_dwell_time = 0.05;
    cfg
}

fn bench_model<M: ManipulatorModel>(
    c: &mut Criterion,
    name: &str,
    model: M,
    cfg: &ControllerConfig,
) {
    let dof = model.dof();
    let mut ctrl = match HybridController::from_config(model, cfg) {
        Ok(ctrl) => ctrl,
        Err(e) => panic!("{name}: {e}"),
    };
    let mut cycle = 0u64;

    c.bench_function(name, |b| {
        b.iter(|| {
            cycle += 1;
            let t = cycle as f64 * DT;
            let state = DVector::from_fn(2 * dof, |i, _| 0.5 * (t + i as f64).sin());
            black_box(ctrl.fixed_goal(&state, t))
        });
    });
}

fn bench_pendulum(c: &mut Criterion) {
    bench_model(
        c,
        "pendulum_computed_torque",
        GearedPendulum::default(),
        &config(LawKind::ComputedTorque),
    );
    bench_model(
        c,
        "pendulum_sliding_mode",
        GearedPendulum::default(),
        &config(LawKind::SlidingMode),
    );
}

fn bench_two_link(c: &mut Criterion) {
    bench_model(
        c,
        "two_link_computed_torque",
        GearedTwoLink::default(),
        &config(LawKind::ComputedTorque),
    );
    bench_model(
        c,
        "two_link_sliding_mode",
        GearedTwoLink::default(),
        &config(LawKind::SlidingMode),
    );
}

fn bench_fixed_mode(c: &mut Criterion) {
    let mut cfg = config(LawKind::SlidingMode);
    cfg.allocator.fixed_mode = Some(2);
    bench_model(c, "two_link_fixed_mode", GearedTwoLink::default(), &cfg);
}

criterion_group!(benches, bench_pendulum, bench_two_link, bench_fixed_mode);
criterion_main!(benches);
