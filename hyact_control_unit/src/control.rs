//! Control engine root.
//!
//! Torque laws evaluated per actuation mode, the cost-minimizing mode
//! allocator with hysteresis, its fixed-mode specialization, tracking error
//! dynamics, and the disturbance observer.

pub mod allocator;
pub mod fixed;
pub mod hysteresis;
pub mod law;
pub mod observer;
pub mod tracking;

pub use allocator::{ModeAllocator, ModeCost, ModeSelection};
pub use fixed::FixedModeAllocator;
pub use hysteresis::{HysteresisDecision, HysteresisState};
pub use law::{ComputedTorqueLaw, ControlLaw, SlidingModeLaw, TorqueLaw, TorqueRequest};
