//! Integration tests for the hybrid actuation control unit.
//!
//! These tests exercise multiple modules together: configuration loading,
//! controller wiring, mode allocation with hysteresis, and closed-loop
//! regulation and tracking on the reference models.

mod integration;
