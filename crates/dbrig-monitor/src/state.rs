//! Monitor state machine and the pure per-sample evaluation step.
//!
//! Disable is an OR over resources (any ceiling crossed is enough), while
//! re-enable is an AND (every resource must have recovered below its
//! floor). Samples inside the band trigger no transition; together with the
//! enable < disable gap this is what prevents thrashing.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::policy::ThresholdPolicy;
use crate::sample::ResourceSample;

/// Whether the protected policy is currently actuated on or off.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MonitorState {
    /// The protected policy is enabled. Initial state.
    Active,
    /// The protected policy was disabled under pressure.
    Disabled,
}

/// Snapshot of the control loop, published for external status queries.
#[derive(Debug, Clone, Serialize)]
pub struct MonitoringStatus {
    /// Current control-loop state.
    pub state: MonitorState,
    /// Which resource(s) triggered the last transition, with values.
    pub last_transition_reason: Option<String>,
    /// When the last transition happened.
    pub last_transition_time: Option<DateTime<Utc>>,
}

impl Default for MonitoringStatus {
    fn default() -> Self {
        Self {
            state: MonitorState::Active,
            last_transition_reason: None,
            last_transition_time: None,
        }
    }
}

/// Outcome of evaluating one sample against the policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// Pressure crossed a ceiling; disable the protected policy.
    Disable {
        /// The triggering resource(s) with their numeric values.
        reason: String,
    },
    /// All resources recovered below their floors; re-enable the policy.
    Enable {
        /// The recovered values against their floors.
        reason: String,
    },
    /// Sample sits in the hysteresis band; hold the current state.
    Maintain,
}

/// Pure per-sample evaluation step.
#[must_use]
pub fn evaluate(
    state: MonitorState,
    policy: &ThresholdPolicy,
    sample: &ResourceSample,
) -> Verdict {
    match state {
        MonitorState::Active => {
            let cpu_over = sample.cpu_pct > policy.disable_cpu_pct();
            let mem_over = sample.mem_pct > policy.disable_mem_pct();
            if cpu_over || mem_over {
                let mut parts = Vec::new();
                if cpu_over {
                    parts.push(format!(
                        "cpu {:.1}% above {:.1}% ceiling",
                        sample.cpu_pct,
                        policy.disable_cpu_pct()
                    ));
                }
                if mem_over {
                    parts.push(format!(
                        "mem {:.1}% above {:.1}% ceiling",
                        sample.mem_pct,
                        policy.disable_mem_pct()
                    ));
                }
                Verdict::Disable {
                    reason: parts.join(", "),
                }
            } else {
                Verdict::Maintain
            }
        }
        MonitorState::Disabled => {
            if sample.cpu_pct < policy.enable_cpu_pct()
                && sample.mem_pct < policy.enable_mem_pct()
            {
                Verdict::Enable {
                    reason: format!(
                        "cpu {:.1}% below {:.1}% floor and mem {:.1}% below {:.1}% floor",
                        sample.cpu_pct,
                        policy.enable_cpu_pct(),
                        sample.mem_pct,
                        policy.enable_mem_pct()
                    ),
                }
            } else {
                Verdict::Maintain
            }
        }
    }
}
