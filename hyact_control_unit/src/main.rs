//! # Hybrid Actuation Control Unit
//!
//! Closed-loop harness: loads a controller configuration, builds the
//! controller on one of the reference models, and integrates the model
//! forward with explicit Euler steps while the controller serves its
//! configured request shape. Mode switches and a final summary are logged.

use clap::{Parser, ValueEnum};
use hyact_common::config::LogLevel;
use hyact_common::consts::CONTROL_PERIOD_DEFAULT;
use hyact_common::control::config::{ControllerConfig, RequestShape};
use hyact_control_unit::HybridController;
use hyact_control_unit::config::{load_config, load_trajectory};
use hyact_control_unit::dynamics::Plant;
use hyact_control_unit::dynamics::pendulum::GearedPendulum;
use hyact_control_unit::dynamics::two_link::GearedTwoLink;
use nalgebra::DVector;
use std::path::PathBuf;
use std::process;
use tracing::{Level, error, info, warn};
use tracing_subscriber::EnvFilter;

/// Reference model to close the loop on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ModelKind {
    /// 1-DOF geared pendulum, scalar ratio table.
    Pendulum,
    /// 2-DOF planar arm, diagonal ratio matrices.
    TwoLink,
}

/// Hybrid actuation control unit — closed-loop simulation harness
#[derive(Parser, Debug)]
#[command(name = "hyact_control_unit")]
#[command(author = "RTS007")]
#[command(version)]
#[command(about = "Gear-ratio and torque allocation with hysteresis")]
struct Args {
    /// Controller configuration TOML (defaults apply when omitted).
    config: Option<PathBuf>,

    /// Reference model.
    #[arg(long, value_enum, default_value_t = ModelKind::Pendulum)]
    model: ModelKind,

    /// Sampled trajectory TOML, required for `request = "trajectory"`.
    #[arg(long, value_name = "FILE")]
    trajectory: Option<PathBuf>,

    /// Number of control steps.
    #[arg(long, default_value_t = 5000)]
    steps: usize,

    /// Control period [s].
    #[arg(long, default_value_t = CONTROL_PERIOD_DEFAULT)]
    dt: f64,

    /// Initial state `q..., dq...` (comma separated, default: rest at origin).
    #[arg(long, value_delimiter = ',', allow_hyphen_values = true)]
    initial: Vec<f64>,

    /// Unmodeled load applied by the simulated plant on every joint [N·m].
    #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
    load: f64,

    /// Enable verbose logging (DEBUG level).
    #[arg(short, long)]
    verbose: bool,

    /// Output logs in JSON format.
    #[arg(long)]
    json: bool,
}

fn main() {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => load_config(path),
        None => Ok(ControllerConfig::default()),
    };
    let log_level = config
        .as_ref()
        .map(|c| c.shared.log_level)
        .unwrap_or_default();
    setup_tracing(&args, log_level);

    info!("hyact control unit v{} starting...", env!("CARGO_PKG_VERSION"));

    let result = config
        .map_err(|e| Box::new(e) as Box<dyn std::error::Error>)
        .and_then(|config| run(&args, &config));
    if let Err(e) = result {
        error!("FATAL: {e}");
        process::exit(1);
    }

    info!("hyact control unit finished");
}

fn run(args: &Args, config: &ControllerConfig) -> Result<(), Box<dyn std::error::Error>> {
    if !(args.dt > 0.0) {
        return Err(format!("--dt must be positive, got {}", args.dt).into());
    }
    info!(
        "Config OK: service={}, modes={}, law={:?}, request={:?}",
        config.shared.service_name,
        config.allocator.mode_count,
        config.law.kind,
        config.allocator.request,
    );

    match args.model {
        ModelKind::Pendulum => {
            let plant = GearedPendulum::default().with_plant_load(args.load);
            let controller = HybridController::from_config(GearedPendulum::default(), config)?;
            simulate(args, config, controller, plant)
        }
        ModelKind::TwoLink => {
            let plant = GearedTwoLink::default().with_plant_load([args.load; 2]);
            let controller = HybridController::from_config(GearedTwoLink::default(), config)?;
            simulate(args, config, controller, plant)
        }
    }
}

/// Run the closed loop on `plant` and log a summary.
fn simulate<M: Plant, P: Plant>(
    args: &Args,
    config: &ControllerConfig,
    mut controller: HybridController<M>,
    plant: P,
) -> Result<(), Box<dyn std::error::Error>> {
    let dof = plant.dof();
    if config.allocator.request == RequestShape::Trajectory {
        let path = args
            .trajectory
            .as_ref()
            .ok_or("request = \"trajectory\" needs --trajectory FILE")?;
        controller.set_trajectory(Box::new(load_trajectory(path)?))?;
    }

    let mut state = match args.initial.len() {
        0 => DVector::zeros(2 * dof),
        n if n == 2 * dof => DVector::from_column_slice(&args.initial),
        n => return Err(format!("--initial has {n} values, expected {}", 2 * dof).into()),
    };

    let mut mode = None;
    let mut critical_steps = 0usize;
    let mut peak_torque = 0.0f64;

    for k in 0..args.steps {
        let t = k as f64 * args.dt;
        let output = controller.control(&state, t)?;

        if mode != Some(output.mode) {
            info!(
                t,
                mode = %output.mode,
                selector = output.selector,
                "actuation mode engaged"
            );
            mode = Some(output.mode);
        }
        if output.flags.has_critical() {
            critical_steps += 1;
        }
        peak_torque = peak_torque.max(output.torque.amax());

        state = plant.euler_step(&state, &output.torque, output.mode, args.dt);
        if state.iter().any(|v| !v.is_finite()) {
            return Err(format!("state diverged at t = {t}").into());
        }
    }

    if critical_steps > 0 {
        warn!("{critical_steps} steps emitted a critical allocation flag");
    }
    info!(
        "Summary: steps={}, final_state={:?}, switches={}, peak_torque={:.4}",
        args.steps,
        state.as_slice(),
        controller.switch_count(),
        peak_torque,
    );
    if let Some(estimate) = controller.disturbance_estimate() {
        info!("Disturbance estimate: {:?}", estimate.as_slice());
    }
    Ok(())
}

/// Setup tracing subscriber based on CLI arguments and the configured level.
fn setup_tracing(args: &Args, log_level: LogLevel) {
    let level = if args.verbose {
        Level::DEBUG
    } else {
        Level::from(log_level)
    };

    let filter = EnvFilter::from_default_env().add_directive(level.into());

    if args.json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .compact()
            .init();
    }
}
