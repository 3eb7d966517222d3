//! Hybrid controller: entry points over one model, one law and one allocator.
//!
//! Three request shapes feed the same allocation step:
//!
//! - **trajectory following** — tracking error against a reference
//!   `(q_d, dq_d, ddq_d)` at `t`;
//! - **fixed-goal regulation** — tracking error against a constant goal
//!   state with zero reference acceleration, optionally followed by a
//!   disturbance observer update whose estimate is installed in the model;
//! - **manual acceleration** — the setpoint is used directly (as the
//!   desired acceleration for computed torque, as the surface value for
//!   sliding mode).
//!
//! The allocation strategy is picked once: cost-minimizing with hysteresis,
//! or pinned to a fixed mode.

use hyact_common::control::config::{ControllerConfig, RequestShape};
use hyact_common::control::mode::{ActuationMode, RatioKind};
use hyact_common::control::output::ControlOutput;
use nalgebra::DVector;
use tracing::info;

use crate::control::allocator::ModeAllocator;
use crate::control::fixed::FixedModeAllocator;
use crate::control::hysteresis::HysteresisState;
use crate::control::law::{ControlLaw, JointState, TorqueLaw, TorqueRequest};
use crate::control::observer::{DisturbanceObserver, FirstOrderObserver};
use crate::control::tracking::JointReference;
use crate::dynamics::ManipulatorModel;
use crate::error::ControllerError;
use crate::reference::ReferenceSource;

/// Allocation strategy resolved at construction.
#[derive(Debug, Clone)]
enum Strategy {
    Optimal(ModeAllocator),
    Fixed(FixedModeAllocator),
}

/// Controller owning its model, law, allocator and optional observer.
pub struct HybridController<M: ManipulatorModel, L: TorqueLaw = ControlLaw> {
    model: M,
    law: L,
    strategy: Strategy,
    ratio_kind: RatioKind,
    mode_count: usize,
    request: RequestShape,
    goal: DVector<f64>,
    manual_setpoint: DVector<f64>,
    observer: Option<Box<dyn DisturbanceObserver<M>>>,
    trajectory: Option<Box<dyn ReferenceSource>>,
}

impl<M: ManipulatorModel> HybridController<M, ControlLaw> {
    /// Build with the law named in `config.law`.
    pub fn from_config(model: M, config: &ControllerConfig) -> Result<Self, ControllerError> {
        let law = ControlLaw::from_config(&config.law);
        Self::new(model, law, config)
    }
}

impl<M: ManipulatorModel, L: TorqueLaw> HybridController<M, L> {
    /// Wire `model` and `law` together according to `config`.
    ///
    /// Fails on zero modes, more modes than the model provides, a ratio
    /// convention that does not fit the model, default or fixed mode out of
    /// range, negative hysteresis parameters, goal or setpoint of the wrong
    /// length, or any other invalid config value.
    pub fn new(model: M, law: L, config: &ControllerConfig) -> Result<Self, ControllerError> {
        let alloc = &config.allocator;
        let mode_count = alloc.mode_count;
        if mode_count == 0 {
            return Err(ControllerError::NoModes);
        }
        if mode_count > model.mode_count() {
            return Err(ControllerError::ModeCountExceedsModel {
                configured: mode_count,
                available: model.mode_count(),
            });
        }

        let ratio_kind = model.ratio_kind();
        check_ratio_kind(&ratio_kind, model.dof(), mode_count)?;
        let default_mode = ActuationMode(alloc.default_mode);
        let optimal = ModeAllocator::new(
            mode_count,
            ratio_kind.clone(),
            HysteresisState::new(&config.hysteresis, default_mode),
        )?;
        let strategy = match alloc.fixed_mode {
            Some(fixed) => Strategy::Fixed(FixedModeAllocator::new(
                ActuationMode(fixed),
                mode_count,
                ratio_kind.clone(),
            )?),
            None => Strategy::Optimal(optimal),
        };

        config.validate()?;

        let dof = model.dof();
        let goal = sized_or_zeros("goal", &config.goal, 2 * dof)?;
        let manual_setpoint = sized_or_zeros("manual_setpoint", &config.manual_setpoint, dof)?;

        let observer: Option<Box<dyn DisturbanceObserver<M>>> = if config.observer.active {
            Some(Box::new(FirstOrderObserver::new(config.observer.bandwidth, dof)))
        } else {
            None
        };

        info!(
            dof,
            modes = mode_count,
            fixed_mode = ?alloc.fixed_mode,
            request = ?config.allocator.request,
            hysteresis = config.hysteresis.enabled,
            observer = config.observer.active,
            "controller ready"
        );

        Ok(Self {
            model,
            law,
            strategy,
            ratio_kind,
            mode_count,
            request: alloc.request,
            goal,
            manual_setpoint,
            observer,
            trajectory: None,
        })
    }

    // ─── Wiring ─────────────────────────────────────────────────────

    /// Replace the observer (activates it).
    pub fn with_observer(mut self, observer: Box<dyn DisturbanceObserver<M>>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Install the reference served by the `Trajectory` request shape.
    pub fn set_trajectory(
        &mut self,
        trajectory: Box<dyn ReferenceSource>,
    ) -> Result<(), ControllerError> {
        if trajectory.dof() != self.model.dof() {
            return Err(ControllerError::DimensionMismatch {
                what: "trajectory",
                expected: self.model.dof(),
                actual: trajectory.dof(),
            });
        }
        self.trajectory = Some(trajectory);
        Ok(())
    }

    /// Change the regulation goal `[q..., dq...]`.
    pub fn set_goal(&mut self, goal: DVector<f64>) -> Result<(), ControllerError> {
        let expected = 2 * self.model.dof();
        if goal.len() != expected {
            return Err(ControllerError::DimensionMismatch {
                what: "goal",
                expected,
                actual: goal.len(),
            });
        }
        self.goal = goal;
        Ok(())
    }

    // ─── Entry Points ───────────────────────────────────────────────
    //
    // `state` is `[q..., dq...]` with `2·dof` entries. The direct entry
    // points panic on any other length; `control()` checks it.

    /// Track `reference` from `state` at `time`.
    pub fn trajectory_following(
        &mut self,
        reference: &JointReference,
        state: &DVector<f64>,
        time: f64,
    ) -> ControlOutput {
        let joints = JointState::from_state(&self.model, state);
        let request = self.law.track(reference, &joints);
        self.allocate(&request, &joints, state, time)
    }

    /// Regulate towards the configured goal.
    pub fn fixed_goal(&mut self, state: &DVector<f64>, time: f64) -> ControlOutput {
        let dof = self.model.dof();
        let reference = JointReference::hold(
            self.goal.rows(0, dof).into_owned(),
            self.goal.rows(dof, dof).into_owned(),
        );
        let output = self.trajectory_following(&reference, state, time);

        if let Some(observer) = self.observer.as_mut() {
            observer.update_estimate(&self.model, state, &output, time);
            self.model.set_external_force(observer.estimate());
        }
        output
    }

    /// Apply `setpoint` directly.
    pub fn manual_acceleration(
        &mut self,
        setpoint: &DVector<f64>,
        state: &DVector<f64>,
        time: f64,
    ) -> ControlOutput {
        let joints = JointState::from_state(&self.model, state);
        let request = self.law.manual(setpoint);
        self.allocate(&request, &joints, state, time)
    }

    /// Serve the configured request shape.
    ///
    /// Fails on a state of the wrong length or a `Trajectory` request with
    /// no trajectory installed.
    pub fn control(
        &mut self,
        state: &DVector<f64>,
        time: f64,
    ) -> Result<ControlOutput, ControllerError> {
        let expected = 2 * self.model.dof();
        if state.len() != expected {
            return Err(ControllerError::DimensionMismatch {
                what: "state",
                expected,
                actual: state.len(),
            });
        }
        match self.request {
            RequestShape::Trajectory => {
                let reference = self
                    .trajectory
                    .as_ref()
                    .ok_or(ControllerError::NoTrajectory)?
                    .reference_at(time);
                Ok(self.trajectory_following(&reference, state, time))
            }
            RequestShape::FixedGoal => Ok(self.fixed_goal(state, time)),
            RequestShape::ManualAcceleration => {
                let setpoint = self.manual_setpoint.clone();
                Ok(self.manual_acceleration(&setpoint, state, time))
            }
        }
    }

    fn allocate(
        &mut self,
        request: &TorqueRequest,
        joints: &JointState,
        state: &DVector<f64>,
        time: f64,
    ) -> ControlOutput {
        debug_assert_eq!(state.len(), 2 * self.model.dof());
        match &mut self.strategy {
            Strategy::Optimal(allocator) => {
                allocator.allocate(&self.model, &self.law, request, joints, state, time)
            }
            Strategy::Fixed(allocator) => {
                allocator.allocate(&self.model, &self.law, request, joints, time)
            }
        }
    }

    // ─── Reset ──────────────────────────────────────────────────────

    /// Forget the incumbent mode and last switch time (no-op when fixed).
    pub fn reset_hysteresis(&mut self) {
        match &mut self.strategy {
            Strategy::Optimal(allocator) => allocator.reset_hysteresis(),
            Strategy::Fixed(allocator) => allocator.reset_hysteresis(),
        }
    }

    /// Clear the observer history and remove its estimate from the model.
    pub fn reset_observer(&mut self) {
        if let Some(observer) = self.observer.as_mut() {
            observer.reset();
            self.model.set_external_force(DVector::zeros(self.model.dof()));
        }
    }

    // ─── Accessors ──────────────────────────────────────────────────

    #[inline]
    pub fn model(&self) -> &M {
        &self.model
    }

    #[inline]
    pub fn model_mut(&mut self) -> &mut M {
        &mut self.model
    }

    #[inline]
    pub fn law(&self) -> &L {
        &self.law
    }

    #[inline]
    pub fn mode_count(&self) -> usize {
        self.mode_count
    }

    #[inline]
    pub fn ratio_kind(&self) -> &RatioKind {
        &self.ratio_kind
    }

    #[inline]
    pub fn request(&self) -> RequestShape {
        self.request
    }

    #[inline]
    pub fn goal(&self) -> &DVector<f64> {
        &self.goal
    }

    /// Fixed mode, if the controller is pinned to one.
    pub fn fixed_mode(&self) -> Option<ActuationMode> {
        match &self.strategy {
            Strategy::Fixed(allocator) => Some(allocator.mode()),
            Strategy::Optimal(_) => None,
        }
    }

    /// Hysteresis state of the optimizing allocator.
    pub fn hysteresis(&self) -> Option<&HysteresisState> {
        match &self.strategy {
            Strategy::Optimal(allocator) => Some(allocator.hysteresis()),
            Strategy::Fixed(_) => None,
        }
    }

    /// Accepted mode switches since construction or the last reset.
    pub fn switch_count(&self) -> u64 {
        match &self.strategy {
            Strategy::Optimal(allocator) => allocator.switch_count(),
            Strategy::Fixed(_) => 0,
        }
    }

    /// Current observer estimate, `None` when no observer is active.
    pub fn disturbance_estimate(&self) -> Option<DVector<f64>> {
        self.observer.as_ref().map(|o| o.estimate())
    }
}

/// Scalar ratios belong to single-DOF models and must cover every mode;
/// multi-DOF models publish matrix ratios by index.
fn check_ratio_kind(
    ratio_kind: &RatioKind,
    dof: usize,
    mode_count: usize,
) -> Result<(), ControllerError> {
    match ratio_kind {
        RatioKind::Scalar(_) if dof != 1 => Err(ControllerError::RatioKindMismatch {
            kind: "scalar",
            dof,
        }),
        RatioKind::Scalar(ratios) if ratios.len() < mode_count => {
            Err(ControllerError::DimensionMismatch {
                what: "ratio table",
                expected: mode_count,
                actual: ratios.len(),
            })
        }
        RatioKind::Matrix if dof == 1 => Err(ControllerError::RatioKindMismatch {
            kind: "matrix",
            dof,
        }),
        _ => Ok(()),
    }
}

fn sized_or_zeros(
    what: &'static str,
    values: &[f64],
    expected: usize,
) -> Result<DVector<f64>, ControllerError> {
    match values.len() {
        0 => Ok(DVector::zeros(expected)),
        n if n == expected => Ok(DVector::from_column_slice(values)),
        actual => Err(ControllerError::DimensionMismatch {
            what,
            expected,
            actual,
        }),
    }
}

// ─── Tests ──────────────────────────────────────────────────────────
