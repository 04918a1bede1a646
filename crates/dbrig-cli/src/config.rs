//! YAML configuration file loading.
//!
//! The file mirrors the descriptor and policy fields one to one; CLI flags
//! override file values. Library crates never read configuration sources,
//! so everything here stays inside the binary.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

/// Top-level config file shape.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    /// Container descriptor fields for `up` and `verify`.
    #[serde(default)]
    pub container: ContainerSection,
    /// Threshold-policy fields for `watch`.
    #[serde(default)]
    pub watch: WatchSection,
}

/// `container:` section, mapping onto descriptor fields.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ContainerSection {
    /// Container name.
    pub name: Option<String>,
    /// Image reference.
    pub image: Option<String>,
    /// Port mappings in `host:container` form.
    #[serde(default)]
    pub ports: Vec<String>,
    /// Environment variables.
    #[serde(default)]
    pub env: BTreeMap<String, String>,
    /// Volume mounts in `host:container[:mode]` form.
    #[serde(default)]
    pub volumes: Vec<String>,
    /// Lifecycle mode: `ephemeral` or `standalone`.
    pub mode: Option<String>,
}

/// `watch:` section, mapping onto threshold-policy fields.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WatchSection {
    /// CPU ceiling that disables the protected policy.
    pub disable_cpu_pct: Option<f64>,
    /// CPU floor that allows re-enabling.
    pub enable_cpu_pct: Option<f64>,
    /// Memory ceiling that disables the protected policy.
    pub disable_mem_pct: Option<f64>,
    /// Memory floor that allows re-enabling.
    pub enable_mem_pct: Option<f64>,
    /// Seconds between samples.
    pub poll_interval_secs: Option<u64>,
}

/// Loads and parses a config file.
///
/// # Errors
///
/// Fails when the file cannot be read or does not parse as the expected
/// YAML shape.
pub fn load(path: &Path) -> Result<FileConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config file {}", path.display()))?;
    serde_yaml::from_str(&content)
        .with_context(|| format!("failed to parse config file {}", path.display()))
}

/// Loads the config file when one was given, otherwise returns defaults.
///
/// # Errors
///
/// Fails only when a given file cannot be loaded.
pub fn load_optional(path: Option<&Path>) -> Result<FileConfig> {
    path.map_or_else(|| Ok(FileConfig::default()), load)
}
