//! Integration tests for container lifecycle and persistence verification.
//!
//! These tests are implemented in:
//! `crates/dbrig-container/tests/lifecycle_test.rs`
//!
//! Covered scenarios:
//! - `create_rejects_missing_host_path_before_any_runtime_call`: Fail-fast volume gate
//! - `ephemeral_create_attaches_session_label`: Session tagging for the cleanup agent
//! - `standalone_create_omits_session_label`: Untagged standalone containers
//! - `ephemeral_vanishing_is_attributed_to_cleanup_agent`: Vanish attribution
//! - `exited_container_fails_without_exhausting_the_poll_budget`: Terminal short-circuit
//! - `mount_table_mismatch_fails_verification`: Mount-table comparison
//! - `remove_twice_is_idempotent`: Removing an absent container succeeds
