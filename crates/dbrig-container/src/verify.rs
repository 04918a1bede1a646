//! Post-creation persistence verification.
//!
//! Closes the gap between "the create call returned success" and "the
//! container is actually usable": a cleanup agent or a misconfigured
//! lifecycle mode can remove a container within seconds of creation while
//! the creation call itself reports success.

use std::sync::Arc;
use std::time::Duration;

use dbrig_common::constants::{
    DEFAULT_SETTLE_WINDOW, DEFAULT_VERIFY_ATTEMPTS, DEFAULT_VERIFY_POLL_INTERVAL,
};
use dbrig_common::error::{DbrigError, Diagnostic};
use dbrig_common::types::{ContainerStatus, LifecycleMode};

use crate::clock::{Clock, SystemClock};
use crate::descriptor::ContainerDescriptor;
use crate::lifecycle::ContainerHandle;
use crate::plane::{ContainerReport, ControlPlane};
use crate::volume::{self, VolumeMount};

/// Tuning knobs for one verification run.
#[derive(Debug, Clone)]
pub struct VerifyOptions {
    /// Delay before the first poll, letting runtime bookkeeping settle.
    pub settle_window: Duration,
    /// Interval between polls.
    pub poll_interval: Duration,
    /// Bounded number of polls.
    pub max_attempts: u32,
    /// Whether to attempt a best-effort read probe on verified mounts.
    /// The mount-table comparison stays authoritative either way.
    pub read_probe: bool,
}

impl Default for VerifyOptions {
    fn default() -> Self {
        Self {
            settle_window: DEFAULT_SETTLE_WINDOW,
            poll_interval: DEFAULT_VERIFY_POLL_INTERVAL,
            max_attempts: DEFAULT_VERIFY_ATTEMPTS,
            read_probe: true,
        }
    }
}

/// Outcome of one persistence verification.
///
/// Created once per creation call and immediately consumed by the caller;
/// never stored long-term.
#[derive(Debug, Clone)]
pub struct PersistenceCheck {
    /// Whether the runtime has any record of the container.
    pub exists: bool,
    /// Last status observed, or [`ContainerStatus::Missing`].
    pub status: ContainerStatus,
    /// Whether every declared mount appeared in the runtime's mount table.
    pub volumes_verified: bool,
    /// Time between creation and the verdict.
    pub elapsed_since_creation: Duration,
    /// Explanation when verification failed.
    pub error_detail: Option<String>,
}

impl PersistenceCheck {
    /// Whether the container is actually usable. Only after this returns
    /// `true` should a caller report creation success.
    #[must_use]
    pub fn success(&self) -> bool {
        self.exists
            && self.status.is_usable()
            && self.volumes_verified
            && self.error_detail.is_none()
    }

    /// Converts a failed check into the verification error surfaced to
    /// callers. Returns `None` when the check passed.
    #[must_use]
    pub fn to_error(&self, name: &str) -> Option<DbrigError> {
        if self.success() {
            return None;
        }
        let what = format!("container '{name}' failed persistence verification");
        let why = "the creation call reported success, but the container is not in a \
                   usable state; anything depending on it would fail later with a \
                   harder-to-trace error"
            .to_string();
        let mut fix = vec![format!(
            "inspect the container with the runtime CLI (last seen status: '{}')",
            self.status
        )];
        if !self.volumes_verified {
            fix.push("compare the declared volume mounts against the runtime's mount table".into());
        }
        if !self.exists {
            fix.push("check the lifecycle mode; session-tagged containers are removed by the cleanup agent".into());
        }
        fix.push("re-run the verification once the cause is addressed".into());
        Some(DbrigError::Verification {
            diagnostic: Box::new(Diagnostic {
                what,
                why,
                fix,
                reference: None,
                cause: self.error_detail.clone(),
            }),
        })
    }
}

/// Runs the settle-window + bounded-poll verification against the control
/// plane. Synchronous and blocking: verification is a precondition for
/// reporting success, not a background concern.
pub struct PersistenceVerifier {
    plane: Arc<dyn ControlPlane>,
    clock: Box<dyn Clock>,
}

impl PersistenceVerifier {
    /// Creates a verifier backed by the system clock.
    #[must_use]
    pub fn new(plane: Arc<dyn ControlPlane>) -> Self {
        Self::with_clock(plane, Box::new(SystemClock))
    }

    /// Creates a verifier with an injected clock, so tests can replay many
    /// poll cycles without wall-clock delay.
    #[must_use]
    pub fn with_clock(plane: Arc<dyn ControlPlane>, clock: Box<dyn Clock>) -> Self {
        Self { plane, clock }
    }

    /// Verifies that the container survived creation and its declared
    /// mounts are present.
    ///
    /// Waits `settle_window`, then polls inspect up to `max_attempts` at
    /// `poll_interval`. The first usable sighting runs mount verification;
    /// a definitive failure status returns immediately without exhausting
    /// the budget.
    #[must_use]
    pub fn verify(
        &self,
        handle: &ContainerHandle,
        descriptor: &ContainerDescriptor,
        options: &VerifyOptions,
    ) -> PersistenceCheck {
        let specs = match volume::parse_all(&descriptor.volumes) {
            Ok(specs) => specs,
            Err(err) => {
                return self.checked(handle, false, ContainerStatus::Missing, false, Some(
                    format!("volume specification did not parse: {err}"),
                ));
            }
        };

        tracing::debug!(
            name = %handle.name,
            settle_secs = options.settle_window.as_secs_f64(),
            attempts = options.max_attempts,
            "verifying container persistence"
        );
        self.clock.sleep(options.settle_window);

        let mut last_seen: Option<ContainerStatus> = None;
        let mut unreachable: Option<String> = None;

        for attempt in 1..=options.max_attempts {
            match self.plane.inspect(&handle.name) {
                Ok(Some(report)) if report.status.is_usable() => {
                    return self.usable_verdict(handle, &report, &specs, options);
                }
                Ok(Some(report)) if report.status.is_terminal() => {
                    // No amount of further polling will change this.
                    return self.checked(
                        handle,
                        true,
                        report.status,
                        false,
                        Some(format!(
                            "container reported status '{}' after creation; inspect its \
                             logs for the startup failure",
                            report.status
                        )),
                    );
                }
                Ok(Some(report)) => {
                    tracing::debug!(
                        name = %handle.name,
                        attempt,
                        status = %report.status,
                        "container not yet usable"
                    );
                    last_seen = Some(report.status);
                }
                Ok(None) => {
                    tracing::debug!(name = %handle.name, attempt, "container not found");
                }
                Err(fault) => {
                    tracing::warn!(name = %handle.name, attempt, error = %fault, "inspect failed");
                    unreachable = Some(fault.to_string());
                }
            }
            if attempt < options.max_attempts {
                self.clock.sleep(options.poll_interval);
            }
        }

        if let Some(status) = last_seen {
            return self.checked(
                handle,
                true,
                status,
                false,
                Some(format!(
                    "container was last seen in status '{status}' and never became usable \
                     within the verification budget"
                )),
            );
        }
        if let Some(fault) = unreachable {
            return self.checked(
                handle,
                false,
                ContainerStatus::Missing,
                false,
                Some(format!(
                    "the runtime was unreachable during verification ({fault}); container \
                     state is unknown, investigate runtime health"
                )),
            );
        }
        self.checked(
            handle,
            false,
            ContainerStatus::Missing,
            false,
            Some(vanished_detail(handle)),
        )
    }

    /// Verdict for a container sighted in a usable status: run the mount
    /// verification and the optional read probe.
    fn usable_verdict(
        &self,
        handle: &ContainerHandle,
        report: &ContainerReport,
        specs: &[VolumeMount],
        options: &VerifyOptions,
    ) -> PersistenceCheck {
        let volumes_verified = specs.is_empty() || volume::verify_mounted(report, specs);
        if volumes_verified && options.read_probe && report.status == ContainerStatus::Running {
            self.read_probe(handle, specs);
        }
        let detail = if volumes_verified {
            None
        } else {
            Some(
                "one or more declared volume mounts were missing from the runtime's \
                 mount table; check the mount specifications against the running container"
                    .to_string(),
            )
        };
        self.checked(handle, true, report.status, volumes_verified, detail)
    }

    /// Best-effort read probe: list each declared container path through
    /// exec. Failures are logged and do not override a passing mount-table
    /// check (many database images lack the tooling to answer).
    fn read_probe(&self, handle: &ContainerHandle, specs: &[VolumeMount]) {
        for spec in specs {
            let command = vec!["ls".to_string(), spec.container_path.clone()];
            match self.plane.exec(&handle.name, &command) {
                Ok(output) if output.exit_code == 0 => {
                    tracing::debug!(
                        name = %handle.name,
                        path = %spec.container_path,
                        "read probe passed"
                    );
                }
                Ok(output) => {
                    tracing::warn!(
                        name = %handle.name,
                        path = %spec.container_path,
                        exit_code = output.exit_code,
                        "read probe failed; mount-table check remains authoritative"
                    );
                }
                Err(fault) => {
                    tracing::warn!(
                        name = %handle.name,
                        path = %spec.container_path,
                        error = %fault,
                        "read probe could not run; mount-table check remains authoritative"
                    );
                }
            }
        }
    }

    fn checked(
        &self,
        handle: &ContainerHandle,
        exists: bool,
        status: ContainerStatus,
        volumes_verified: bool,
        error_detail: Option<String>,
    ) -> PersistenceCheck {
        let elapsed_since_creation = (self.clock.now() - handle.created_at)
            .to_std()
            .unwrap_or_default();
        PersistenceCheck {
            exists,
            status,
            volumes_verified,
            elapsed_since_creation,
            error_detail,
        }
    }
}

/// Attributes a never-found container. Remediation differs between the two
/// causes, so the wording is explicit about which one applies.
fn vanished_detail(handle: &ContainerHandle) -> String {
    match handle.mode {
        LifecycleMode::Ephemeral => format!(
            "container '{}' vanished after a successful create; it was tagged for \
             session cleanup, so it was most likely removed by the cleanup agent. \
             Create it in standalone mode if it must outlive the owning process",
            handle.name
        ),
        LifecycleMode::Standalone => format!(
            "container '{}' vanished after a successful create with no trace in the \
             runtime; it was not tagged for cleanup, so investigate runtime health \
             and any external jobs that prune containers",
            handle.name
        ),
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    fn handle(mode: LifecycleMode) -> ContainerHandle {
        ContainerHandle {
            name: "pg-test".into(),
            mode,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn success_requires_all_four_conditions() {
        let check = PersistenceCheck {
            exists: true,
            status: ContainerStatus::Running,
            volumes_verified: true,
            elapsed_since_creation: Duration::from_secs(3),
            error_detail: None,
        };
        assert!(check.success());

        let missing = PersistenceCheck {
            exists: false,
            status: ContainerStatus::Missing,
            ..check.clone()
        };
        assert!(!missing.success());

        let exited = PersistenceCheck {
            status: ContainerStatus::Exited,
            ..check.clone()
        };
        assert!(!exited.success());

        let bad_volumes = PersistenceCheck {
            volumes_verified: false,
            ..check.clone()
        };
        assert!(!bad_volumes.success());

        let with_detail = PersistenceCheck {
            error_detail: Some("something".into()),
            ..check
        };
        assert!(!with_detail.success());
    }

    #[test]
    fn created_status_counts_as_usable_success() {
        let check = PersistenceCheck {
            exists: true,
            status: ContainerStatus::Created,
            volumes_verified: true,
            elapsed_since_creation: Duration::from_secs(2),
            error_detail: None,
        };
        assert!(check.success());
    }

    #[test]
    fn vanished_detail_blames_cleanup_agent_for_ephemeral() {
        let detail = vanished_detail(&handle(LifecycleMode::Ephemeral));
        assert!(detail.contains("cleanup agent"));
        assert!(detail.contains("standalone"));
    }

    #[test]
    fn vanished_detail_points_at_runtime_for_standalone() {
        let detail = vanished_detail(&handle(LifecycleMode::Standalone));
        assert!(detail.contains("runtime health"));
        assert!(!detail.contains("cleanup agent"));
    }

    #[test]
    fn failed_check_converts_to_a_structured_verification_error() {
        let check = PersistenceCheck {
            exists: false,
            status: ContainerStatus::Missing,
            volumes_verified: false,
            elapsed_since_creation: Duration::from_secs(5),
            error_detail: Some("vanished".into()),
        };
        let err = check.to_error("pg-test").expect("failed check yields error");
        match err {
            DbrigError::Verification { diagnostic } => {
                assert!(diagnostic.what.contains("pg-test"));
                assert!(!diagnostic.fix.is_empty());
                assert_eq!(diagnostic.cause.as_deref(), Some("vanished"));
            }
            other => panic!("expected Verification, got {other}"),
        }
    }

    #[test]
    fn passing_check_converts_to_no_error() {
        let check = PersistenceCheck {
            exists: true,
            status: ContainerStatus::Running,
            volumes_verified: true,
            elapsed_since_creation: Duration::from_secs(3),
            error_detail: None,
        };
        assert!(check.to_error("pg-test").is_none());
    }

    #[test]
    fn default_options_are_conservative() {
        let options = VerifyOptions::default();
        assert_eq!(options.settle_window, Duration::from_secs(2));
        assert_eq!(options.poll_interval, Duration::from_secs(1));
        assert_eq!(options.max_attempts, 3);
        assert!(options.read_probe);
    }
}
