//! Validated hysteresis thresholds for the resource monitor.

use std::time::Duration;

use dbrig_common::constants::MIN_MONITOR_POLL_INTERVAL;
use dbrig_common::error::{DbrigError, Result};

/// Resource-pressure thresholds with a guaranteed hysteresis band.
///
/// Construction fails unless each enable threshold sits strictly below its
/// disable threshold; a non-empty band is what prevents the monitor from
/// thrashing. Immutable after construction.
#[derive(Debug, Clone, PartialEq)]
pub struct ThresholdPolicy {
    disable_cpu_pct: f64,
    disable_mem_pct: f64,
    enable_cpu_pct: f64,
    enable_mem_pct: f64,
    poll_interval: Duration,
}

impl ThresholdPolicy {
    /// Builds a policy, enforcing the hysteresis and poll-interval
    /// invariants.
    ///
    /// # Errors
    ///
    /// Returns a configuration error when a percentage is outside 0..=100,
    /// an enable threshold is not strictly below its disable threshold, or
    /// the poll interval is under the floor.
    pub fn new(
        disable_cpu_pct: f64,
        enable_cpu_pct: f64,
        disable_mem_pct: f64,
        enable_mem_pct: f64,
        poll_interval: Duration,
    ) -> Result<Self> {
        for (label, value) in [
            ("disable_cpu_pct", disable_cpu_pct),
            ("enable_cpu_pct", enable_cpu_pct),
            ("disable_mem_pct", disable_mem_pct),
            ("enable_mem_pct", enable_mem_pct),
        ] {
            if !(0.0..=100.0).contains(&value) || !value.is_finite() {
                return Err(DbrigError::config(format!(
                    "{label} must be a percentage between 0 and 100, got {value}"
                )));
            }
        }
        if enable_cpu_pct >= disable_cpu_pct {
            return Err(DbrigError::config(format!(
                "enable_cpu_pct ({enable_cpu_pct}) must be strictly below \
                 disable_cpu_pct ({disable_cpu_pct}) to form a hysteresis band"
            )));
        }
        if enable_mem_pct >= disable_mem_pct {
            return Err(DbrigError::config(format!(
                "enable_mem_pct ({enable_mem_pct}) must be strictly below \
                 disable_mem_pct ({disable_mem_pct}) to form a hysteresis band"
            )));
        }
        if poll_interval < MIN_MONITOR_POLL_INTERVAL {
            return Err(DbrigError::config(format!(
                "poll interval {}s is below the {}s floor",
                poll_interval.as_secs(),
                MIN_MONITOR_POLL_INTERVAL.as_secs()
            )));
        }
        Ok(Self {
            disable_cpu_pct,
            disable_mem_pct,
            enable_cpu_pct,
            enable_mem_pct,
            poll_interval,
        })
    }

    /// CPU ceiling above which the policy is disabled.
    #[must_use]
    pub const fn disable_cpu_pct(&self) -> f64 {
        self.disable_cpu_pct
    }

    /// Memory ceiling above which the policy is disabled.
    #[must_use]
    pub const fn disable_mem_pct(&self) -> f64 {
        self.disable_mem_pct
    }

    /// CPU floor below which re-enabling becomes possible.
    #[must_use]
    pub const fn enable_cpu_pct(&self) -> f64 {
        self.enable_cpu_pct
    }

    /// Memory floor below which re-enabling becomes possible.
    #[must_use]
    pub const fn enable_mem_pct(&self) -> f64 {
        self.enable_mem_pct
    }

    /// Interval between samples.
    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        self.poll_interval
    }
}
