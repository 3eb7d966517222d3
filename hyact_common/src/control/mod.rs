//! Control types shared between the control unit and its consumers.
//!
//! Organized by domain: actuation modes, allocation diagnostics, control
//! output, and controller configuration.

pub mod config;
pub mod error;
pub mod mode;
pub mod output;
