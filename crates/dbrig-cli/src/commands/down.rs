//! `dbrig down`: remove a container. Removing an absent container succeeds.

use std::sync::Arc;

use anyhow::Result;
use clap::Args;

use dbrig_container::lifecycle::LifecycleManager;
use dbrig_container::plane::docker::DockerCli;
use dbrig_container::plane::ControlPlane;

/// Arguments for `dbrig down`.
#[derive(Args, Debug)]
pub struct DownArgs {
    /// Container name.
    pub name: String,

    /// Also remove anonymous volumes attached to the container.
    #[arg(long)]
    pub volumes: bool,
}

/// Removes the named container, treating "already absent" as success.
pub fn execute(args: &DownArgs) -> Result<()> {
    tracing::info!(name = %args.name, volumes = args.volumes, "taking container down");
    let plane: Arc<dyn ControlPlane> = Arc::new(DockerCli::discover()?);
    let manager = LifecycleManager::for_mode(
        plane,
        dbrig_common::types::LifecycleMode::Standalone,
    );

    match manager.inspect(&args.name)? {
        Some(handle) => {
            manager.remove(&handle, args.volumes)?;
            println!("Container '{}' removed", args.name);
        }
        None => {
            println!("Container '{}' is already absent", args.name);
        }
    }
    Ok(())
}
