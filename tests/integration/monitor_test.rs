//! Integration tests for the resource-pressure control loop.
//!
//! These tests are implemented in:
//! `crates/dbrig-monitor/tests/monitor_test.rs`
//!
//! Covered scenarios:
//! - `band_samples_produce_zero_transitions`: Hysteresis band holds state
//! - `cpu_ceiling_alone_disables`: Disable is an OR over resources
//! - `enable_waits_for_both_resources_to_recover`: Re-enable is an AND
//! - `failed_disable_keeps_state_and_retries_next_cycle`: State flips on actuator success
//! - `sampling_failures_are_skipped_without_crashing`: Bad samples never transition
//! - `stop_is_observed_at_the_sleep_boundary`: Cooperative cancellation
//! - `stop_times_out_when_the_loop_is_stuck_mid_sample`: Timeout without killing
