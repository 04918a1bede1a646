//! # dbrig-common
//!
//! Shared error types, domain primitives, and constants used across the
//! dbrig workspace.
//!
//! This crate is the leaf of the dependency graph — it depends on no other
//! internal crate and provides the foundational pieces the container and
//! monitor crates build upon.

#![cfg_attr(test, allow(clippy::expect_used, clippy::unwrap_used))]

pub mod constants;
pub mod error;
pub mod types;
