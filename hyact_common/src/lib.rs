//! HyAct Common Library
//!
//! Shared constants, configuration loading and control-output types for the
//! hybrid actuation workspace.
//!
//! # Module Structure
//!
//! - [`consts`] - Numeric limits and defaults
//! - [`config`] - Configuration loading traits and types
//! - [`control`] - Actuation modes, controller configuration, control output
//! - [`prelude`] - Common re-exports for convenience
//!
//! # Usage
//!
//! ```rust
//! use hyact_common::prelude::*;
//! use hyact_common::config::ConfigLoader;
//! ```

pub mod config;
pub mod consts;
pub mod control;
pub mod prelude;
