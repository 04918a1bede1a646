//! Container lifecycle management for dbrig.
//!
//! Dual-mode creation (ephemeral vs. standalone), volume-mount parsing and
//! verification, runtime-fault translation, and post-creation persistence
//! checks against an external cleanup agent.

#![cfg_attr(test, allow(clippy::expect_used, clippy::unwrap_used))]

pub mod clock;
pub mod descriptor;
pub mod diagnose;
pub mod lifecycle;
pub mod plane;
pub mod tagging;
pub mod verify;
pub mod volume;
