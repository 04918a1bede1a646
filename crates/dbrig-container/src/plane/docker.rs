//! Docker CLI implementation of the control plane.
//!
//! Drives the `docker` binary through `std::process::Command` and parses
//! its inspect JSON. Classification of raw stderr into [`FaultKind`]
//! happens here and nowhere else.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::process::{Command, Output};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Deserialize;

use dbrig_common::constants::RUNTIME_BIN;
use dbrig_common::types::ContainerStatus;

use super::{
    ContainerReport, ControlPlane, ExecOutput, FaultKind, LaunchRequest, MountRecord, RuntimeFault,
};

/// Control plane backed by the Docker CLI.
pub struct DockerCli {
    binary: PathBuf,
}

impl DockerCli {
    /// Locates the runtime binary on `PATH`.
    ///
    /// # Errors
    ///
    /// Returns a daemon-unreachable fault when the binary is not installed.
    pub fn discover() -> Result<Self, RuntimeFault> {
        let binary = which::which(RUNTIME_BIN).map_err(|_| {
            RuntimeFault::new(
                FaultKind::DaemonUnreachable,
                format!("'{RUNTIME_BIN}' binary not found on PATH"),
            )
        })?;
        tracing::debug!(binary = %binary.display(), "container runtime located");
        Ok(Self { binary })
    }

    /// Uses an explicit binary path instead of `PATH` discovery.
    #[must_use]
    pub const fn with_binary(binary: PathBuf) -> Self {
        Self { binary }
    }

    fn run(&self, args: &[String]) -> Result<Output, RuntimeFault> {
        tracing::trace!(?args, "invoking runtime CLI");
        Command::new(&self.binary)
            .args(args)
            .output()
            .map_err(|e| {
                RuntimeFault::new(
                    FaultKind::DaemonUnreachable,
                    format!("failed to invoke '{}': {e}", self.binary.display()),
                )
            })
    }

    /// Runs a command and classifies stderr on a non-zero exit.
    fn run_checked(&self, args: &[String]) -> Result<String, RuntimeFault> {
        let output = self.run(args)?;
        if output.status.success() {
            Ok(String::from_utf8_lossy(&output.stdout).to_string())
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr).to_string();
            Err(RuntimeFault::new(classify(&stderr), stderr.trim().to_string()))
        }
    }
}

impl ControlPlane for DockerCli {
    fn create_and_start(&self, request: &LaunchRequest) -> Result<(), RuntimeFault> {
        let _id = self.run_checked(&build_run_args(request))?;
        Ok(())
    }

    fn start(&self, name: &str) -> Result<(), RuntimeFault> {
        let _ = self.run_checked(&["start".into(), name.into()])?;
        Ok(())
    }

    fn stop(&self, name: &str, timeout: Duration) -> Result<(), RuntimeFault> {
        let _ = self.run_checked(&[
            "stop".into(),
            "--time".into(),
            timeout.as_secs().to_string(),
            name.into(),
        ])?;
        Ok(())
    }

    fn restart(&self, name: &str, timeout: Duration) -> Result<(), RuntimeFault> {
        let _ = self.run_checked(&[
            "restart".into(),
            "--time".into(),
            timeout.as_secs().to_string(),
            name.into(),
        ])?;
        Ok(())
    }

    fn remove(&self, name: &str, remove_volumes: bool) -> Result<(), RuntimeFault> {
        let mut args = vec!["rm".into(), "--force".into()];
        if remove_volumes {
            args.push("--volumes".into());
        }
        args.push(name.into());
        let _ = self.run_checked(&args)?;
        Ok(())
    }

    fn inspect(&self, name: &str) -> Result<Option<ContainerReport>, RuntimeFault> {
        let args = vec![
            "inspect".into(),
            "--type".into(),
            "container".into(),
            name.into(),
        ];
        match self.run_checked(&args) {
            Ok(stdout) => parse_inspect(&stdout).map(Some),
            Err(fault) if fault.kind == FaultKind::NoSuchContainer => Ok(None),
            Err(fault) => Err(fault),
        }
    }

    fn exec(&self, name: &str, command: &[String]) -> Result<ExecOutput, RuntimeFault> {
        let mut args = vec!["exec".to_string(), name.to_string()];
        args.extend_from_slice(command);
        let output = self.run(&args)?;
        let stderr = String::from_utf8_lossy(&output.stderr).to_string();
        if !output.status.success() {
            // Dispatch failures are faults; command failures inside the
            // container come back through the exit code.
            let kind = classify(&stderr);
            if matches!(kind, FaultKind::NoSuchContainer | FaultKind::DaemonUnreachable) {
                return Err(RuntimeFault::new(kind, stderr.trim().to_string()));
            }
        }
        Ok(ExecOutput {
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr,
            exit_code: output.status.code().unwrap_or(-1),
        })
    }
}

/// Builds the `docker run` argument vector for a launch request.
fn build_run_args(request: &LaunchRequest) -> Vec<String> {
    let mut args = vec![
        "run".to_string(),
        "--detach".to_string(),
        "--name".to_string(),
        request.name.clone(),
    ];
    for (key, value) in &request.labels {
        args.push("--label".into());
        args.push(format!("{key}={value}"));
    }
    for port in &request.ports {
        args.push("--publish".into());
        args.push(port.to_string());
    }
    for (key, value) in &request.env {
        args.push("--env".into());
        args.push(format!("{key}={value}"));
    }
    for mount in &request.mounts {
        args.push("--volume".into());
        args.push(mount.to_string());
    }
    args.push(request.image.clone());
    args
}

/// Classifies raw runtime stderr into a fault kind. This is the only place
/// in the workspace that inspects runtime message strings.
fn classify(stderr: &str) -> FaultKind {
    let s = stderr.to_lowercase();
    if s.contains("no such image")
        || s.contains("unable to find image")
        || s.contains("pull access denied")
        || s.contains("repository does not exist")
        || s.contains("manifest unknown")
    {
        FaultKind::ImageNotFound
    } else if s.contains("port is already allocated") || s.contains("address already in use") {
        FaultKind::PortAlreadyBound
    } else if s.contains("cannot connect to the docker daemon")
        || s.contains("is the docker daemon running")
        || s.contains("error during connect")
    {
        FaultKind::DaemonUnreachable
    } else if s.contains("permission denied") {
        FaultKind::PermissionDenied
    } else if s.contains("invalid mount config")
        || s.contains("bind source path does not exist")
        || s.contains("error while mounting")
        || s.contains("failed to mount")
    {
        FaultKind::VolumeMountFailure
    } else if s.contains("no such container") {
        FaultKind::NoSuchContainer
    } else {
        FaultKind::Other
    }
}

#[derive(Debug, Deserialize)]
struct InspectEntry {
    #[serde(rename = "Name")]
    name: String,
    #[serde(rename = "Created")]
    created: Option<String>,
    #[serde(rename = "State")]
    state: InspectState,
    #[serde(rename = "Config", default)]
    config: InspectConfig,
    #[serde(rename = "Mounts", default)]
    mounts: Vec<InspectMount>,
}

#[derive(Debug, Deserialize)]
struct InspectState {
    #[serde(rename = "Status")]
    status: String,
}

#[derive(Debug, Default, Deserialize)]
struct InspectConfig {
    #[serde(rename = "Image", default)]
    image: String,
    #[serde(rename = "Labels", default)]
    labels: Option<BTreeMap<String, String>>,
}

#[derive(Debug, Deserialize)]
struct InspectMount {
    #[serde(rename = "Source")]
    source: String,
    #[serde(rename = "Destination")]
    destination: String,
    #[serde(rename = "RW", default)]
    read_write: bool,
}

/// Parses `docker inspect` output (a JSON array) into a report.
fn parse_inspect(stdout: &str) -> Result<ContainerReport, RuntimeFault> {
    let mut entries: Vec<InspectEntry> = serde_json::from_str(stdout).map_err(|e| {
        RuntimeFault::new(FaultKind::Other, format!("unparseable inspect output: {e}"))
    })?;
    let entry = if entries.is_empty() {
        return Err(RuntimeFault::new(
            FaultKind::NoSuchContainer,
            "inspect returned an empty array",
        ));
    } else {
        entries.swap_remove(0)
    };

    let created_at = entry
        .created
        .as_deref()
        .and_then(|raw| DateTime::parse_from_rfc3339(raw).ok())
        .map(|dt| dt.with_timezone(&Utc));

    Ok(ContainerReport {
        name: entry.name.trim_start_matches('/').to_string(),
        image: entry.config.image,
        status: ContainerStatus::from_runtime(&entry.state.status),
        labels: entry.config.labels.unwrap_or_default(),
        mounts: entry
            .mounts
            .into_iter()
            .map(|m| MountRecord {
                source: PathBuf::from(m.source),
                destination: m.destination,
                read_write: m.read_write,
            })
            .collect(),
        created_at,
    })
}
