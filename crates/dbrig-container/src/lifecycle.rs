//! Container lifecycle orchestration over the control plane.
//!
//! Owns the create/start/stop/restart/remove/inspect surface. The tagging
//! strategy injected at construction decides the lifecycle mode; the method
//! bodies never branch on it.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};

use dbrig_common::constants::LABEL_LIFECYCLE;
use dbrig_common::error::{DbrigError, Result};
use dbrig_common::types::LifecycleMode;

use crate::descriptor::ContainerDescriptor;
use crate::diagnose;
use crate::plane::{ContainerReport, ControlPlane, FaultKind, LaunchRequest, RuntimeFault};
use crate::tagging::{self, TaggingStrategy};
use crate::volume;

/// Runtime identity returned after creation.
///
/// Owned by the caller for the container's life; `remove` releases it
/// without destroying the value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerHandle {
    /// Container name; the unique key.
    pub name: String,
    /// Lifecycle mode the container was created under.
    pub mode: LifecycleMode,
    /// When the create call returned.
    pub created_at: DateTime<Utc>,
}

/// Creates, starts, stops, removes, and inspects containers.
///
/// One manager owns one tagging strategy; the external invariant is that
/// only one control-plane entity manages a given container name at a time.
pub struct LifecycleManager {
    plane: Arc<dyn ControlPlane>,
    tagging: Box<dyn TaggingStrategy>,
}

impl LifecycleManager {
    /// Creates a manager with an explicit tagging strategy.
    #[must_use]
    pub fn new(plane: Arc<dyn ControlPlane>, tagging: Box<dyn TaggingStrategy>) -> Self {
        Self { plane, tagging }
    }

    /// Creates a manager for the given lifecycle mode.
    #[must_use]
    pub fn for_mode(plane: Arc<dyn ControlPlane>, mode: LifecycleMode) -> Self {
        Self::new(plane, tagging::for_mode(mode))
    }

    /// The control plane this manager drives, shared with the verifier.
    #[must_use]
    pub fn plane(&self) -> Arc<dyn ControlPlane> {
        Arc::clone(&self.plane)
    }

    /// Creates and starts a container from the descriptor.
    ///
    /// Volume mounts are parsed and validated before any runtime call.
    /// Persistence verification is deliberately not part of this call; run
    /// [`PersistenceVerifier::verify`](crate::verify::PersistenceVerifier::verify)
    /// before reporting success.
    ///
    /// # Errors
    ///
    /// Returns a configuration error for invalid mounts or a mode mismatch,
    /// and a creation error with a translated diagnostic when the runtime
    /// refuses.
    pub fn create(&self, descriptor: &ContainerDescriptor) -> Result<ContainerHandle> {
        if descriptor.mode != self.tagging.mode() {
            return Err(DbrigError::config(format!(
                "descriptor '{}' requests {} mode but this manager tags {}",
                descriptor.name,
                descriptor.mode,
                self.tagging.mode()
            )));
        }

        let mounts = volume::parse_all(&descriptor.volumes)?;
        let problems = volume::validate_all(&mounts);
        if !problems.is_empty() {
            return Err(DbrigError::config(format!(
                "invalid volume mounts: {}",
                problems.join("; ")
            )));
        }

        let request = LaunchRequest {
            name: descriptor.name.clone(),
            image: descriptor.image.clone(),
            ports: descriptor.ports.clone(),
            env: descriptor.env.clone(),
            mounts,
            labels: self.tagging.labels(),
        };

        tracing::info!(
            name = %descriptor.name,
            image = %descriptor.image,
            mode = %descriptor.mode,
            "creating container"
        );
        self.plane
            .create_and_start(&request)
            .map_err(|fault| DbrigError::Creation {
                diagnostic: Box::new(diagnose::translate(&fault, Some(descriptor))),
            })?;
        tracing::info!(name = %descriptor.name, "container created and started");

        Ok(ContainerHandle {
            name: descriptor.name.clone(),
            mode: descriptor.mode,
            created_at: Utc::now(),
        })
    }

    /// Starts a stopped container.
    ///
    /// # Errors
    ///
    /// Returns a runtime error with a translated diagnostic on failure.
    pub fn start(&self, handle: &ContainerHandle) -> Result<()> {
        self.plane
            .start(&handle.name)
            .map_err(|fault| runtime_error("start", &fault))
    }

    /// Stops a running container, granting it a grace period.
    ///
    /// # Errors
    ///
    /// Returns a runtime error with a translated diagnostic on failure.
    pub fn stop(&self, handle: &ContainerHandle, timeout: Duration) -> Result<()> {
        self.plane
            .stop(&handle.name, timeout)
            .map_err(|fault| runtime_error("stop", &fault))
    }

    /// Restarts a container.
    ///
    /// # Errors
    ///
    /// Returns a runtime error with a translated diagnostic on failure.
    pub fn restart(&self, handle: &ContainerHandle, timeout: Duration) -> Result<()> {
        self.plane
            .restart(&handle.name, timeout)
            .map_err(|fault| runtime_error("restart", &fault))
    }

    /// Removes a container. Idempotent: removing an already-absent
    /// container is success.
    ///
    /// # Errors
    ///
    /// Returns a runtime error for any failure other than the container
    /// being absent.
    pub fn remove(&self, handle: &ContainerHandle, remove_volumes: bool) -> Result<()> {
        match self.plane.remove(&handle.name, remove_volumes) {
            Ok(()) => Ok(()),
            Err(fault) if fault.kind == FaultKind::NoSuchContainer => {
                tracing::debug!(name = %handle.name, "remove: container already absent");
                Ok(())
            }
            Err(fault) => Err(runtime_error("remove", &fault)),
        }
    }

    /// Looks a container up by name.
    ///
    /// Returns `Ok(None)` when the runtime has no record of the name, so
    /// callers can distinguish "not found" from "runtime unreachable".
    ///
    /// # Errors
    ///
    /// Returns a runtime error when the runtime cannot be queried.
    pub fn inspect(&self, name: &str) -> Result<Option<ContainerHandle>> {
        Ok(self.report(name)?.map(|report| handle_from_report(&report)))
    }

    /// Full inspect projection for one container, consumed by the
    /// persistence verifier and status queries.
    ///
    /// # Errors
    ///
    /// Returns a runtime error when the runtime cannot be queried.
    pub fn report(&self, name: &str) -> Result<Option<ContainerReport>> {
        self.plane
            .inspect(name)
            .map_err(|fault| runtime_error("inspect", &fault))
    }
}

/// Rebuilds a handle from inspect output, recovering the lifecycle mode
/// from the label the tagging strategy attached.
fn handle_from_report(report: &ContainerReport) -> ContainerHandle {
    let mode = report
        .labels
        .get(LABEL_LIFECYCLE)
        .and_then(|value| LifecycleMode::from_label(value))
        .unwrap_or(LifecycleMode::Standalone);
    ContainerHandle {
        name: report.name.clone(),
        mode,
        created_at: report.created_at.unwrap_or_else(Utc::now),
    }
}

fn runtime_error(operation: &'static str, fault: &RuntimeFault) -> DbrigError {
    DbrigError::Runtime {
        operation,
        diagnostic: Box::new(diagnose::translate(fault, None)),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use dbrig_common::types::ContainerStatus;

    use super::*;

    #[test]
    fn handle_from_report_recovers_ephemeral_mode() {
        let mut labels = BTreeMap::new();
        let _ = labels.insert(LABEL_LIFECYCLE.to_string(), "ephemeral".to_string());
        let report = ContainerReport {
            name: "pg-test".into(),
            image: "postgres:16".into(),
            status: ContainerStatus::Running,
            labels,
            mounts: vec![],
            created_at: Some(Utc::now()),
        };
        let handle = handle_from_report(&report);
        assert_eq!(handle.mode, LifecycleMode::Ephemeral);
        assert_eq!(handle.name, "pg-test");
    }

    #[test]
    fn handle_from_report_defaults_to_standalone() {
        let report = ContainerReport {
            name: "foreign".into(),
            image: "mysql:8".into(),
            status: ContainerStatus::Running,
            labels: BTreeMap::new(),
            mounts: vec![],
            created_at: None,
        };
        assert_eq!(handle_from_report(&report).mode, LifecycleMode::Standalone);
    }
}
