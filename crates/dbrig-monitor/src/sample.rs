//! One metrics observation, produced by the source on each poll.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

/// A single resource-pressure observation.
///
/// Transient: consumed by threshold evaluation and dropped. Callers that
/// want history log or export samples themselves.
#[derive(Debug, Clone, Serialize)]
pub struct ResourceSample {
    /// When the sample was taken.
    pub timestamp: DateTime<Utc>,
    /// CPU usage as a percentage.
    pub cpu_pct: f64,
    /// Memory usage as a percentage.
    pub mem_pct: f64,
    /// Auxiliary named counters the source chooses to attach.
    pub aux: BTreeMap<String, f64>,
}

impl ResourceSample {
    /// Creates a sample stamped with the current time.
    #[must_use]
    pub fn new(cpu_pct: f64, mem_pct: f64) -> Self {
        Self {
            timestamp: Utc::now(),
            cpu_pct,
            mem_pct,
            aux: BTreeMap::new(),
        }
    }

    /// Attaches an auxiliary counter.
    #[must_use]
    pub fn with_counter(mut self, name: impl Into<String>, value: f64) -> Self {
        let _ = self.aux.insert(name.into(), value);
        self
    }
}
