//! Translation of classified runtime faults into actionable diagnostics.
//!
//! Pure function of the fault and optional descriptor context; the caller
//! decides where the resulting [`Diagnostic`] is displayed.

use dbrig_common::error::Diagnostic;

use crate::descriptor::ContainerDescriptor;
use crate::plane::{FaultKind, RuntimeFault};

const DOCKER_PULL_REF: &str = "https://docs.docker.com/reference/cli/docker/image/pull/";
const DOCKER_DAEMON_REF: &str = "https://docs.docker.com/engine/daemon/troubleshoot/";
const DOCKER_BIND_REF: &str = "https://docs.docker.com/engine/storage/bind-mounts/";

/// Maps a classified runtime fault to a four-section diagnostic.
///
/// Unrecognized faults pass through with the original message preserved as
/// cause, never swallowed.
#[must_use]
pub fn translate(fault: &RuntimeFault, context: Option<&ContainerDescriptor>) -> Diagnostic {
    let name = context.map_or("the container", |d| d.name.as_str());
    let cause = Some(fault.message.clone());
    match fault.kind {
        FaultKind::ImageNotFound => {
            let image = context.map_or_else(|| "the requested image".to_string(), |d| {
                format!("image '{}'", d.image)
            });
            Diagnostic {
                what: format!("{image} was not found"),
                why: format!("'{name}' cannot be created without its image"),
                fix: vec![
                    "check the image name and tag for typos".into(),
                    "pull the image manually to confirm registry access".into(),
                    "log in to the registry if the image is private".into(),
                ],
                reference: Some(DOCKER_PULL_REF.into()),
                cause,
            }
        }
        FaultKind::PortAlreadyBound => {
            let ports = context
                .filter(|d| !d.ports.is_empty())
                .map_or_else(String::new, |d| {
                    let list: Vec<String> =
                        d.ports.iter().map(|p| p.host.to_string()).collect();
                    format!(" (requested host ports: {})", list.join(", "))
                });
            Diagnostic {
                what: format!("a host port needed by '{name}' is already bound{ports}"),
                why: "two processes cannot listen on the same host port; the \
                      container cannot start until the conflict is resolved"
                    .into(),
                fix: vec![
                    "find the process holding the port (ss -ltnp or lsof -i)".into(),
                    "stop the conflicting process or container".into(),
                    "or pick a different host port in the port mapping".into(),
                ],
                reference: None,
                cause,
            }
        }
        FaultKind::PermissionDenied => Diagnostic {
            what: format!("the runtime denied permission while handling '{name}'"),
            why: "the current user lacks the rights to drive the container runtime".into(),
            fix: vec![
                "check that your user is in the runtime's access group (e.g. docker)".into(),
                "re-log or restart the session after a group change".into(),
                "check file permissions on any mounted host paths".into(),
            ],
            reference: None,
            cause,
        },
        FaultKind::DaemonUnreachable => Diagnostic {
            what: "the container runtime daemon is unreachable".into(),
            why: "no container operation can proceed until the daemon responds".into(),
            fix: vec![
                "check that the runtime daemon is running (systemctl status docker)".into(),
                "start it if stopped (systemctl start docker)".into(),
                "check DOCKER_HOST if you point at a remote daemon".into(),
            ],
            reference: Some(DOCKER_DAEMON_REF.into()),
            cause,
        },
        FaultKind::VolumeMountFailure => Diagnostic {
            what: format!("a volume could not be mounted into '{name}'"),
            why: "the database would start without its data directory, losing \
                  or hiding data"
                .into(),
            fix: vec![
                "check that every host path in the volume list exists".into(),
                "check mount syntax: host:container or host:container:mode".into(),
                "check filesystem permissions on the host path".into(),
            ],
            reference: Some(DOCKER_BIND_REF.into()),
            cause,
        },
        FaultKind::VanishedAfterCreate => Diagnostic {
            what: format!("'{name}' vanished right after a successful create"),
            why: "a cleanup agent most likely removed it; the creation call \
                  reporting success does not mean the container survived"
                .into(),
            fix: vec![
                "use standalone mode for containers that must outlive the session".into(),
                "check for reaper or cleanup sidecars watching session labels".into(),
                "re-run verification after addressing the lifecycle mode".into(),
            ],
            reference: None,
            cause,
        },
        FaultKind::NoSuchContainer => Diagnostic {
            what: format!("the runtime has no container named '{name}'"),
            why: "the operation targets a container that does not exist".into(),
            fix: vec![
                "check the container name for typos".into(),
                "list containers to see what actually exists".into(),
            ],
            reference: None,
            cause,
        },
        FaultKind::Other => Diagnostic {
            what: format!("the runtime reported an unrecognized error for '{name}'"),
            why: "dbrig could not classify this failure; the raw message below \
                  is authoritative"
                .into(),
            fix: vec!["read the cause line and the runtime's own logs".into()],
            reference: None,
            cause,
        },
    }
}
