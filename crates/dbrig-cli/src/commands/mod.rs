//! CLI command definitions and dispatch.

pub mod down;
pub mod status;
pub mod up;
pub mod verify;
pub mod watch;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// dbrig — ephemeral database containers that are verified to exist.
#[derive(Parser, Debug)]
#[command(name = dbrig_common::constants::BIN_NAME, version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Command,

    /// Path to a YAML config file; flags override file values.
    #[arg(long, global = true, env = "DBRIG_CONFIG")]
    pub config: Option<PathBuf>,
}

/// Available CLI subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create a database container and verify it actually persists.
    Up(up::UpArgs),
    /// Remove a container; removing an absent container is not an error.
    Down(down::DownArgs),
    /// Show a container's current runtime state.
    Status(status::StatusArgs),
    /// Re-run the persistence check on an existing container.
    Verify(verify::VerifyArgs),
    /// Watch a container's resource pressure and actuate a policy.
    Watch(watch::WatchArgs),
}

/// Dispatches the parsed CLI command to its handler.
///
/// # Errors
///
/// Returns an error if the command execution fails.
pub async fn execute(cli: Cli) -> anyhow::Result<()> {
    let config = crate::config::load_optional(cli.config.as_deref())?;
    match cli.command {
        Command::Up(args) => up::execute(args, &config),
        Command::Down(args) => down::execute(&args),
        Command::Status(args) => status::execute(&args),
        Command::Verify(args) => verify::execute(args, &config),
        Command::Watch(args) => watch::execute(args, &config).await,
    }
}
