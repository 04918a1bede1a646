//! Resource-pressure control loop for dbrig.
//!
//! Samples a metrics source on a fixed interval, applies hysteresis
//! thresholds, and drives enable/disable transitions on a protected policy
//! through an actuator. Runs as one cancellable background task per
//! monitored instance.

#![cfg_attr(test, allow(clippy::expect_used, clippy::unwrap_used))]

pub mod actuator;
pub mod monitor;
pub mod policy;
pub mod sample;
pub mod source;
pub mod state;
