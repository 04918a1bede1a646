//! `dbrig verify`: re-run the persistence check on an existing container.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Result};
use clap::Args;
use serde::Serialize;

use dbrig_container::descriptor::ContainerDescriptor;
use dbrig_container::lifecycle::LifecycleManager;
use dbrig_container::plane::docker::DockerCli;
use dbrig_container::plane::ControlPlane;
use dbrig_container::verify::{PersistenceVerifier, VerifyOptions};

use crate::config::FileConfig;
use crate::output::{self, OutputFormat};

/// Arguments for `dbrig verify`.
#[derive(Args, Debug)]
pub struct VerifyArgs {
    /// Container name.
    pub name: String,

    /// Volume mount the container is expected to carry, in
    /// `host:container[:mode]` form; repeatable. Overrides the config file
    /// when given.
    #[arg(long = "volume", value_name = "HOST:CONTAINER[:MODE]")]
    pub volumes: Vec<String>,

    /// Number of polls before giving up.
    #[arg(long)]
    pub attempts: Option<u32>,

    /// Skip the best-effort read probe on verified mounts.
    #[arg(long)]
    pub no_read_probe: bool,

    /// Output format.
    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    pub format: OutputFormat,
}

#[derive(Serialize)]
struct VerifyReport {
    name: String,
    status: String,
    volumes_verified: bool,
    verified: bool,
    detail: Option<String>,
}

/// Runs the persistence check against a container that already exists.
///
/// The settle window is skipped: the container is not freshly created, so
/// there is no runtime bookkeeping to wait out.
pub fn execute(args: VerifyArgs, config: &FileConfig) -> Result<()> {
    tracing::info!(name = %args.name, "re-running persistence verification");
    let plane: Arc<dyn ControlPlane> = Arc::new(DockerCli::discover()?);
    let manager = LifecycleManager::for_mode(
        plane,
        dbrig_common::types::LifecycleMode::Standalone,
    );

    let Some(handle) = manager.inspect(&args.name)? else {
        bail!("container '{}' not found", args.name);
    };
    let Some(report) = manager.report(&args.name)? else {
        bail!("container '{}' vanished during lookup", args.name);
    };

    let volumes = if args.volumes.is_empty() {
        config.container.volumes.clone()
    } else {
        args.volumes.clone()
    };
    let mut builder = ContainerDescriptor::builder(handle.name.clone())
        .image(report.image)
        .mode(handle.mode);
    for raw in volumes {
        builder = builder.volume(raw);
    }
    let descriptor = builder.build()?;

    let mut options = VerifyOptions {
        settle_window: Duration::ZERO,
        ..VerifyOptions::default()
    };
    if let Some(attempts) = args.attempts {
        options.max_attempts = attempts.max(1);
    }
    options.read_probe = !args.no_read_probe;

    let verifier = PersistenceVerifier::new(manager.plane());
    let check = verifier.verify(&handle, &descriptor, &options);

    let view = VerifyReport {
        name: handle.name.clone(),
        status: check.status.to_string(),
        volumes_verified: check.volumes_verified,
        verified: check.success(),
        detail: check.error_detail.clone(),
    };
    match args.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&view)?),
        OutputFormat::Table => {
            output::print_rows(&[
                ("Name", view.name.clone()),
                ("Status", view.status.clone()),
                (
                    "Volumes",
                    if view.volumes_verified {
                        "verified".to_string()
                    } else {
                        "MISSING".to_string()
                    },
                ),
                (
                    "Verdict",
                    if view.verified {
                        "verified".to_string()
                    } else {
                        "FAILED".to_string()
                    },
                ),
            ]);
        }
    }

    if let Some(err) = check.to_error(&handle.name) {
        return Err(err.into());
    }
    Ok(())
}
