//! Domain primitive types used across the dbrig workspace.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::DbrigError;

/// How a container's lifetime is managed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LifecycleMode {
    /// Tagged with a session identifier so an external reaper removes the
    /// container when the owning process exits. For short-lived,
    /// test-harness-owned containers.
    Ephemeral,
    /// Created untagged; persists until explicitly removed. For long-lived,
    /// operator-owned containers.
    Standalone,
}

impl LifecycleMode {
    /// Parses the value stored in the lifecycle label, if recognized.
    #[must_use]
    pub fn from_label(value: &str) -> Option<Self> {
        match value {
            "ephemeral" => Some(Self::Ephemeral),
            "standalone" => Some(Self::Standalone),
            _ => None,
        }
    }
}

impl fmt::Display for LifecycleMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ephemeral => write!(f, "ephemeral"),
            Self::Standalone => write!(f, "standalone"),
        }
    }
}

/// Status of a container as reported by the runtime, plus [`Missing`] for
/// containers the runtime has no record of.
///
/// [`Missing`]: ContainerStatus::Missing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContainerStatus {
    /// Created but not yet started.
    Created,
    /// Actively running.
    Running,
    /// Processes frozen by the runtime.
    Paused,
    /// Being restarted by a restart policy.
    Restarting,
    /// Removal in progress.
    Removing,
    /// Exited; processes are gone.
    Exited,
    /// Defunct and only partially removable.
    Dead,
    /// The runtime has no record of the container.
    Missing,
}

impl ContainerStatus {
    /// Maps a runtime-reported status string. Unknown strings map to
    /// [`Dead`](Self::Dead) since the runtime considers them unusable.
    #[must_use]
    pub fn from_runtime(status: &str) -> Self {
        match status {
            "created" => Self::Created,
            "running" => Self::Running,
            "paused" => Self::Paused,
            "restarting" => Self::Restarting,
            "removing" => Self::Removing,
            "exited" => Self::Exited,
            _ => Self::Dead,
        }
    }

    /// Whether the status counts as usable after creation.
    #[must_use]
    pub const fn is_usable(self) -> bool {
        matches!(self, Self::Running | Self::Created)
    }

    /// Whether the status is a definitive post-creation failure that no
    /// amount of further polling will change.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Exited | Self::Dead | Self::Removing)
    }
}

impl fmt::Display for ContainerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Created => "created",
            Self::Running => "running",
            Self::Paused => "paused",
            Self::Restarting => "restarting",
            Self::Removing => "removing",
            Self::Exited => "exited",
            Self::Dead => "dead",
            Self::Missing => "missing",
        };
        write!(f, "{s}")
    }
}

/// One host-to-container port mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PortMapping {
    /// Port bound on the host.
    pub host: u16,
    /// Port exposed inside the container.
    pub container: u16,
}

impl PortMapping {
    /// Creates a mapping from host port to container port.
    #[must_use]
    pub const fn new(host: u16, container: u16) -> Self {
        Self { host, container }
    }
}

impl fmt::Display for PortMapping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.container)
    }
}

impl FromStr for PortMapping {
    type Err = DbrigError;

    /// Parses `host:container`, e.g. `5433:5432`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (host, container) = s.split_once(':').ok_or_else(|| {
            DbrigError::config(format!("port mapping '{s}' must be host:container"))
        })?;
        let host = host
            .parse()
            .map_err(|_| DbrigError::config(format!("invalid host port in '{s}'")))?;
        let container = container
            .parse()
            .map_err(|_| DbrigError::config(format!("invalid container port in '{s}'")))?;
        Ok(Self { host, container })
    }
}
