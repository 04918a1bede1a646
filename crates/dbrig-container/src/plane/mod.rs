//! Control-plane abstraction over the container runtime.
//!
//! The lifecycle manager and persistence verifier talk to the runtime only
//! through the [`ControlPlane`] trait, so tests can drive them against a
//! scripted in-memory plane and the Docker CLI client stays swappable.

pub mod docker;

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use chrono::{DateTime, Utc};
use thiserror::Error;

use dbrig_common::types::{ContainerStatus, PortMapping};

use crate::volume::VolumeMount;

/// Category of a runtime failure.
///
/// Classification from raw runtime output happens exactly once, inside the
/// control-plane implementation; everything downstream matches this enum
/// structurally instead of re-inspecting message strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultKind {
    /// The requested image does not exist locally or in the registry.
    ImageNotFound,
    /// A requested host port is already bound.
    PortAlreadyBound,
    /// The runtime denied the operation for permission reasons.
    PermissionDenied,
    /// The runtime daemon could not be reached at all.
    DaemonUnreachable,
    /// A volume could not be mounted into the container.
    VolumeMountFailure,
    /// The container disappeared right after a reportedly successful create.
    VanishedAfterCreate,
    /// The named container is unknown to the runtime.
    NoSuchContainer,
    /// Anything the classifier does not recognize.
    Other,
}

impl fmt::Display for FaultKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::ImageNotFound => "image not found",
            Self::PortAlreadyBound => "port already bound",
            Self::PermissionDenied => "permission denied",
            Self::DaemonUnreachable => "runtime daemon unreachable",
            Self::VolumeMountFailure => "volume mount failure",
            Self::VanishedAfterCreate => "container vanished after create",
            Self::NoSuchContainer => "no such container",
            Self::Other => "unclassified runtime error",
        };
        write!(f, "{s}")
    }
}

/// A classified runtime failure with the original message preserved.
#[derive(Debug, Clone, Error)]
#[error("{kind}: {message}")]
pub struct RuntimeFault {
    /// Classified failure category.
    pub kind: FaultKind,
    /// Raw message from the runtime, verbatim.
    pub message: String,
}

impl RuntimeFault {
    /// Creates a fault of the given kind.
    #[must_use]
    pub fn new(kind: FaultKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Everything the control plane needs to create and start one container.
#[derive(Debug, Clone)]
pub struct LaunchRequest {
    /// Container name; the unique key.
    pub name: String,
    /// Image reference.
    pub image: String,
    /// Host-to-container port mappings.
    pub ports: Vec<PortMapping>,
    /// Environment variables.
    pub env: Vec<(String, String)>,
    /// Parsed and validated volume mounts.
    pub mounts: Vec<VolumeMount>,
    /// Labels attached by the tagging strategy.
    pub labels: BTreeMap<String, String>,
}

/// One mount as reported back by the runtime's inspect output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MountRecord {
    /// Host-side source path.
    pub source: PathBuf,
    /// Container-side destination path.
    pub destination: String,
    /// Whether the mount is writable.
    pub read_write: bool,
}

/// Projection of the runtime's inspect output for one container.
#[derive(Debug, Clone)]
pub struct ContainerReport {
    /// Container name.
    pub name: String,
    /// Image reference the container was created from.
    pub image: String,
    /// Current runtime status.
    pub status: ContainerStatus,
    /// Labels attached at creation.
    pub labels: BTreeMap<String, String>,
    /// Mount table as the runtime sees it.
    pub mounts: Vec<MountRecord>,
    /// Creation timestamp reported by the runtime.
    pub created_at: Option<DateTime<Utc>>,
}

/// Output of a command executed inside a container.
#[derive(Debug, Clone)]
pub struct ExecOutput {
    /// Standard output from the command.
    pub stdout: String,
    /// Standard error from the command.
    pub stderr: String,
    /// Exit code returned by the command.
    pub exit_code: i32,
}

/// Primitive container-runtime operations.
///
/// Implementors surface failures as classified [`RuntimeFault`]s; they never
/// translate into user-facing diagnostics themselves.
pub trait ControlPlane: Send + Sync {
    /// Creates and starts a container in one call.
    ///
    /// # Errors
    ///
    /// Returns a fault if the runtime refuses to create or start it.
    fn create_and_start(&self, request: &LaunchRequest) -> Result<(), RuntimeFault>;

    /// Starts a previously created container.
    ///
    /// # Errors
    ///
    /// Returns a fault if the container cannot be started.
    fn start(&self, name: &str) -> Result<(), RuntimeFault>;

    /// Stops a running container, granting it a grace period.
    ///
    /// # Errors
    ///
    /// Returns a fault if the container cannot be stopped.
    fn stop(&self, name: &str, timeout: Duration) -> Result<(), RuntimeFault>;

    /// Restarts a container, granting it a grace period on the way down.
    ///
    /// # Errors
    ///
    /// Returns a fault if the container cannot be restarted.
    fn restart(&self, name: &str, timeout: Duration) -> Result<(), RuntimeFault>;

    /// Removes a container. Not idempotent at this layer: removing an
    /// absent container yields [`FaultKind::NoSuchContainer`], which the
    /// lifecycle manager maps to success.
    ///
    /// # Errors
    ///
    /// Returns a fault if removal fails.
    fn remove(&self, name: &str, remove_volumes: bool) -> Result<(), RuntimeFault>;

    /// Inspects a container by name.
    ///
    /// Returns `Ok(None)` when the runtime has no record of the name, so
    /// callers can tell "not found" apart from "runtime unreachable".
    ///
    /// # Errors
    ///
    /// Returns a fault if the runtime cannot be queried.
    fn inspect(&self, name: &str) -> Result<Option<ContainerReport>, RuntimeFault>;

    /// Executes a command inside a running container.
    ///
    /// # Errors
    ///
    /// Returns a fault if the command cannot be dispatched.
    fn exec(&self, name: &str, command: &[String]) -> Result<ExecOutput, RuntimeFault>;
}
