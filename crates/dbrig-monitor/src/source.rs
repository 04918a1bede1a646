//! Metrics-source trait and the shipped Docker stats implementation.

use std::path::PathBuf;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;

use dbrig_common::constants::RUNTIME_BIN;

use crate::sample::ResourceSample;

/// Produces one resource observation per poll for the monitored entity.
///
/// Implementations may block briefly on network or IPC; the monitor never
/// runs two samples concurrently.
#[async_trait]
pub trait MetricsSource: Send + Sync {
    /// Takes one sample.
    async fn sample(&self) -> Result<ResourceSample>;
}

/// Samples a container's cpu/mem percentages through a one-shot runtime
/// stats query.
pub struct DockerStatsSource {
    binary: PathBuf,
    container: String,
}

impl DockerStatsSource {
    /// Creates a source for the named container, locating the runtime
    /// binary on `PATH`.
    ///
    /// # Errors
    ///
    /// Fails when the runtime binary is not installed.
    pub fn discover(container: impl Into<String>) -> Result<Self> {
        let binary = which::which(RUNTIME_BIN)
            .with_context(|| format!("'{RUNTIME_BIN}' binary not found on PATH"))?;
        Ok(Self {
            binary,
            container: container.into(),
        })
    }

    /// Creates a source with an explicit binary path.
    #[must_use]
    pub fn with_binary(binary: PathBuf, container: impl Into<String>) -> Self {
        Self {
            binary,
            container: container.into(),
        }
    }
}

#[async_trait]
impl MetricsSource for DockerStatsSource {
    async fn sample(&self) -> Result<ResourceSample> {
        let output = tokio::process::Command::new(&self.binary)
            .args([
                "stats",
                "--no-stream",
                "--format",
                "json",
                &self.container,
            ])
            .output()
            .await
            .with_context(|| format!("failed to invoke '{}'", self.binary.display()))?;
        if !output.status.success() {
            anyhow::bail!(
                "stats query for '{}' failed: {}",
                self.container,
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }
        let stdout = String::from_utf8_lossy(&output.stdout);
        parse_stats_line(stdout.trim())
    }
}

#[derive(Debug, Deserialize)]
struct StatsLine {
    #[serde(rename = "CPUPerc")]
    cpu_perc: String,
    #[serde(rename = "MemPerc")]
    mem_perc: String,
    #[serde(rename = "PIDs", default)]
    pids: Option<String>,
}

/// Parses one line of `docker stats --format json` output.
fn parse_stats_line(line: &str) -> Result<ResourceSample> {
    let stats: StatsLine =
        serde_json::from_str(line).context("unparseable stats output")?;
    let cpu_pct = parse_percent(&stats.cpu_perc)
        .with_context(|| format!("bad CPU percentage '{}'", stats.cpu_perc))?;
    let mem_pct = parse_percent(&stats.mem_perc)
        .with_context(|| format!("bad memory percentage '{}'", stats.mem_perc))?;
    let mut sample = ResourceSample::new(cpu_pct, mem_pct);
    if let Some(pids) = stats.pids.as_deref().and_then(|p| p.parse::<f64>().ok()) {
        sample = sample.with_counter("pids", pids);
    }
    Ok(sample)
}

/// Parses values like `12.34%` into `12.34`.
fn parse_percent(raw: &str) -> Result<f64> {
    raw.trim()
        .trim_end_matches('%')
        .parse::<f64>()
        .map_err(Into::into)
}
