//! `dbrig up`: create a container and verify it persists before reporting
//! success.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;

use dbrig_common::types::{LifecycleMode, PortMapping};
use dbrig_container::descriptor::ContainerDescriptor;
use dbrig_container::lifecycle::LifecycleManager;
use dbrig_container::plane::docker::DockerCli;
use dbrig_container::plane::ControlPlane;
use dbrig_container::verify::{PersistenceVerifier, VerifyOptions};

use crate::config::FileConfig;
use crate::output::{self, OutputFormat};

/// Arguments for `dbrig up`.
#[derive(Args, Debug)]
pub struct UpArgs {
    /// Container name; falls back to the config file.
    pub name: Option<String>,

    /// Image reference, e.g. `postgres:16`.
    #[arg(long)]
    pub image: Option<String>,

    /// Port mapping in `host:container` form; repeatable. Overrides the
    /// config file when given.
    #[arg(long = "port", value_name = "HOST:CONTAINER")]
    pub ports: Vec<String>,

    /// Environment variable in `KEY=VALUE` form; repeatable. Merged over
    /// the config file.
    #[arg(long = "env", value_name = "KEY=VALUE")]
    pub env: Vec<String>,

    /// Volume mount in `host:container[:mode]` form; repeatable. Overrides
    /// the config file when given.
    #[arg(long = "volume", value_name = "HOST:CONTAINER[:MODE]")]
    pub volumes: Vec<String>,

    /// Lifecycle mode: `ephemeral` or `standalone`.
    #[arg(long)]
    pub mode: Option<String>,

    /// Seconds to wait before the first persistence poll.
    #[arg(long)]
    pub settle_secs: Option<u64>,

    /// Number of persistence polls before giving up.
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
struct UpReport {
    name: String,
    image: String,
    mode: String,
    status: String,
    volumes_verified: bool,
    elapsed_secs: f64,
    verified: bool,
}

/// Creates the container and runs the persistence check; success is only
/// reported once the check passes.
pub fn execute(args: UpArgs, config: &FileConfig) -> Result<()> {
    let descriptor = build_descriptor(&args, config)?;
    let mode = descriptor.mode;
    tracing::info!(name = %descriptor.name, image = %descriptor.image, %mode, "bringing container up");

    let plane: Arc<dyn ControlPlane> = Arc::new(DockerCli::discover()?);
    let manager = LifecycleManager::for_mode(plane, mode);
    let handle = manager.create(&descriptor)?;

    let verifier = PersistenceVerifier::new(manager.plane());
    let options = verify_options(&args);
    let check = verifier.verify(&handle, &descriptor, &options);

    let report = UpReport {
        name: handle.name.clone(),
        image: descriptor.image.clone(),
        mode: mode.to_string(),
        status: check.status.to_string(),
        volumes_verified: check.volumes_verified,
        elapsed_secs: check.elapsed_since_creation.as_secs_f64(),
        verified: check.success(),
    };

    match args.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputFormat::Table => {
            if check.success() {
                println!("Container '{}' is up and verified", handle.name);
            }
            output::print_rows(&[
                ("Name", report.name.clone()),
                ("Image", report.image.clone()),
                ("Mode", report.mode.clone()),
                ("Status", report.status.clone()),
                ("Volumes", verdict_word(report.volumes_verified)),
                (
                    "Verified in",
                    output::format_duration(check.elapsed_since_creation),
                ),
            ]);
        }
    }

    if let Some(err) = check.to_error(&handle.name) {
        return Err(err.into());
    }
    Ok(())
}

/// Merges flags over the config file into a descriptor. Flags win; list
/// flags replace the file's list wholesale.
fn build_descriptor(args: &UpArgs, config: &FileConfig) -> Result<ContainerDescriptor> {
    let name = args
        .name
        .clone()
        .or_else(|| config.container.name.clone())
        .context("a container name is required (argument or config file)")?;
    let image = args
        .image
        .clone()
        .or_else(|| config.container.image.clone())
        .context("an image is required (--image or config file)")?;

    let mode = match args.mode.as_deref().or(config.container.mode.as_deref()) {
        None => LifecycleMode::Standalone,
        Some(raw) => LifecycleMode::from_label(raw)
            .with_context(|| format!("unknown mode '{raw}'; use 'ephemeral' or 'standalone'"))?,
    };

    let ports = if args.ports.is_empty() {
        &config.container.ports
    } else {
        &args.ports
    };
    let volumes = if args.volumes.is_empty() {
        config.container.volumes.clone()
    } else {
        args.volumes.clone()
    };

    let mut builder = ContainerDescriptor::builder(name).image(image).mode(mode);
    for raw in ports {
        let mapping: PortMapping = raw.parse()?;
        builder = builder.port(mapping.host, mapping.container);
    }
    for (key, value) in &config.container.env {
        builder = builder.env(key.clone(), value.clone());
    }
    for raw in &args.env {
        let (key, value) = parse_env(raw)?;
        builder = builder.env(key, value);
    }
    for raw in volumes {
        builder = builder.volume(raw);
    }
    Ok(builder.build()?)
}

fn verify_options(args: &UpArgs) -> VerifyOptions {
    let mut options = VerifyOptions::default();
    if let Some(secs) = args.settle_secs {
        options.settle_window = std::time::Duration::from_secs(secs);
    }
    if let Some(attempts) = args.attempts {
        options.max_attempts = attempts.max(1);
    }
    options.read_probe = !args.no_read_probe;
    options
}

fn parse_env(raw: &str) -> Result<(&str, &str)> {
    raw.split_once('=')
        .filter(|(key, _)| !key.is_empty())
        .with_context(|| format!("environment variable '{raw}' must be KEY=VALUE"))
}

fn verdict_word(ok: bool) -> String {
    if ok { "verified" } else { "MISSING" }.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ContainerSection;

    fn args() -> UpArgs {
        UpArgs {
            name: None,
            image: None,
            ports: vec![],
            env: vec![],
            volumes: vec![],
            mode: None,
            settle_secs: None,
            attempts: None,
            no_read_probe: false,
            format: OutputFormat::Table,
        }
    }

    #[test]
    fn flags_override_config_values() {
        let config = FileConfig {
            container: ContainerSection {
                name: Some("from-file".into()),
                image: Some("postgres:15".into()),
                ports: vec!["5000:5432".into()],
                volumes: vec!["/a:/b".into()],
                mode: Some("standalone".into()),
                ..ContainerSection::default()
            },
            ..FileConfig::default()
        };
        let mut args = args();
        args.name = Some("from-flag".into());
        args.image = Some("postgres:16".into());
        args.ports = vec!["5433:5432".into()];
        args.mode = Some("ephemeral".into());

        let descriptor = build_descriptor(&args, &config).expect("builds");
        assert_eq!(descriptor.name, "from-flag");
        assert_eq!(descriptor.image, "postgres:16");
        assert_eq!(descriptor.ports, vec![PortMapping::new(5433, 5432)]);
        assert_eq!(descriptor.volumes, vec!["/a:/b"]);
        assert_eq!(descriptor.mode, LifecycleMode::Ephemeral);
    }

    #[test]
    fn missing_name_and_image_fail() {
        let result = build_descriptor(&args(), &FileConfig::default());
        assert!(result.is_err());
    }

    #[test]
    fn unknown_mode_is_rejected() {
        let config = FileConfig::default();
        let mut args = args();
        args.name = Some("db".into());
        args.image = Some("postgres:16".into());
        args.mode = Some("reaped".into());
        let err = build_descriptor(&args, &config).expect_err("bad mode");
        assert!(err.to_string().contains("reaped"));
    }

    #[test]
    fn env_flags_merge_over_config() {
        let config = FileConfig {
            container: ContainerSection {
                name: Some("db".into()),
                image: Some("postgres:16".into()),
                env: [("A".to_string(), "file".to_string())].into(),
                ..ContainerSection::default()
            },
            ..FileConfig::default()
        };
        let mut args = args();
        args.env = vec!["B=flag".into()];
        let descriptor = build_descriptor(&args, &config).expect("builds");
        assert_eq!(descriptor.env.len(), 2);
    }

    #[test]
    fn parse_env_requires_key_value() {
        assert_eq!(parse_env("A=1").expect("parses"), ("A", "1"));
        assert!(parse_env("A").is_err());
        assert!(parse_env("=1").is_err());
    }

    #[test]
    fn verify_options_apply_overrides() {
        let mut args = args();
        args.settle_secs = Some(0);
        args.attempts = Some(5);
        args.no_read_probe = true;
        let options = verify_options(&args);
        assert_eq!(options.settle_window, std::time::Duration::ZERO);
        assert_eq!(options.max_attempts, 5);
        assert!(!options.read_probe);
    }
}
