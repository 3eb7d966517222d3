//! # Hybrid Actuation Control Unit Library
//!
//! Per-step selection of a discrete actuation mode (typically a gear ratio)
//! together with the continuous torque for a manipulator. Each step the
//! controller evaluates a torque law for every mode, discards modes that
//! violate actuator limits, picks the one with the smallest squared torque
//! norm and filters the choice through a hysteresis gate to avoid chatter.
//!
//! ## Layers
//!
//! 1. **dynamics** — model capabilities (`RatioProvider`, `FeasibilityGate`,
//!    `ManipulatorModel`, `Plant`) plus two reference models
//! 2. **control** — tracking error dynamics, torque laws, hysteresis,
//!    optimizing and fixed-mode allocators, disturbance observer
//! 3. **controller** — `HybridController` entry points: trajectory
//!    following, fixed-goal regulation, manual acceleration
//!
//! Single-threaded and synchronous: one evaluation per timestep, no I/O in
//! the control path.

pub mod config;
pub mod control;
pub mod controller;
pub mod dynamics;
pub mod error;
pub mod reference;

pub use controller::HybridController;
pub use error::ControllerError;
