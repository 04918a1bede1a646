//! `dbrig status`: report a container's current runtime state.

use std::sync::Arc;

use anyhow::{bail, Result};
use clap::Args;
use serde::Serialize;

use dbrig_common::constants::{LABEL_LIFECYCLE, LABEL_SESSION};
use dbrig_container::lifecycle::LifecycleManager;
use dbrig_container::plane::docker::DockerCli;
use dbrig_container::plane::{ContainerReport, ControlPlane};

use crate::output::{self, OutputFormat};

/// Arguments for `dbrig status`.
#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Container name.
    pub name: String,

    /// Output format.
    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    pub format: OutputFormat,
}

#[derive(Serialize)]
struct StatusView {
    name: String,
    image: String,
    status: String,
    lifecycle: Option<String>,
    session: Option<String>,
    created_at: Option<String>,
    mounts: Vec<String>,
}

impl StatusView {
    fn from_report(report: &ContainerReport) -> Self {
        Self {
            name: report.name.clone(),
            image: report.image.clone(),
            status: report.status.to_string(),
            lifecycle: report.labels.get(LABEL_LIFECYCLE).cloned(),
            session: report.labels.get(LABEL_SESSION).cloned(),
            created_at: report.created_at.map(|t| t.to_rfc3339()),
            mounts: report
                .mounts
                .iter()
                .map(|mount| {
                    format!(
                        "{}:{} ({})",
                        mount.source.display(),
                        mount.destination,
                        if mount.read_write { "rw" } else { "ro" }
                    )
                })
                .collect(),
        }
    }
}

/// Looks the container up and prints what the runtime reports.
pub fn execute(args: &StatusArgs) -> Result<()> {
    tracing::debug!(name = %args.name, "querying container status");
    let plane: Arc<dyn ControlPlane> = Arc::new(DockerCli::discover()?);
    let manager = LifecycleManager::for_mode(
        plane,
        dbrig_common::types::LifecycleMode::Standalone,
    );

    let Some(report) = manager.report(&args.name)? else {
        bail!("container '{}' not found", args.name);
    };
    let view = StatusView::from_report(&report);

    match args.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&view)?),
        OutputFormat::Table => {
            let mut rows = vec![
                ("Name", view.name.clone()),
                ("Image", view.image.clone()),
                ("Status", view.status.clone()),
            ];
            if let Some(lifecycle) = &view.lifecycle {
                rows.push(("Lifecycle", lifecycle.clone()));
            }
            if let Some(session) = &view.session {
                rows.push(("Session", session.clone()));
            }
            if let Some(created) = &view.created_at {
                rows.push(("Created", created.clone()));
            }
            if !view.mounts.is_empty() {
                rows.push(("Mounts", view.mounts.join(", ")));
            }
            output::print_rows(&rows);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::path::PathBuf;

    use chrono::Utc;
    use dbrig_common::types::ContainerStatus;
    use dbrig_container::plane::MountRecord;

    use super::*;

    #[test]
    fn view_projects_labels_and_mounts() {
        let mut labels = BTreeMap::new();
        let _ = labels.insert(LABEL_LIFECYCLE.to_string(), "ephemeral".to_string());
        let _ = labels.insert(LABEL_SESSION.to_string(), "abc-123".to_string());
        let report = ContainerReport {
            name: "pg-test".into(),
            image: "postgres:16".into(),
            status: ContainerStatus::Running,
            labels,
            mounts: vec![MountRecord {
                source: PathBuf::from("/data/pg"),
                destination: "/var/lib/postgresql/data".into(),
                read_write: true,
            }],
            created_at: Some(Utc::now()),
        };
        let view = StatusView::from_report(&report);
        assert_eq!(view.lifecycle.as_deref(), Some("ephemeral"));
        assert_eq!(view.session.as_deref(), Some("abc-123"));
        assert_eq!(view.status, "running");
        assert_eq!(
            view.mounts,
            vec!["/data/pg:/var/lib/postgresql/data (rw)".to_string()]
        );
    }

    #[test]
    fn view_handles_unlabeled_containers() {
        let report = ContainerReport {
            name: "foreign".into(),
            image: "mysql:8".into(),
            status: ContainerStatus::Exited,
            labels: BTreeMap::new(),
            mounts: vec![],
            created_at: None,
        };
        let view = StatusView::from_report(&report);
        assert!(view.lifecycle.is_none());
        assert!(view.session.is_none());
        assert!(view.created_at.is_none());
        assert!(view.mounts.is_empty());
    }
}
