//! `dbrig watch`: run the resource monitor against a container until
//! interrupted.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::Args;

use dbrig_common::constants::DEFAULT_MONITOR_STOP_TIMEOUT;
use dbrig_monitor::actuator::{CommandActuator, LogActuator, PolicyActuator};
use dbrig_monitor::monitor::ResourceMonitor;
use dbrig_monitor::policy::ThresholdPolicy;
use dbrig_monitor::source::DockerStatsSource;
use dbrig_monitor::state::MonitorState;

use crate::config::FileConfig;

/// Arguments for `dbrig watch`.
#[derive(Args, Debug)]
pub struct WatchArgs {
    /// Container name to sample.
    pub name: String,

    /// CPU ceiling that disables the protected policy.
    #[arg(long)]
    pub disable_cpu: Option<f64>,

    /// CPU floor below which re-enabling becomes possible.
    #[arg(long)]
    pub enable_cpu: Option<f64>,

    /// Memory ceiling that disables the protected policy.
    #[arg(long)]
    pub disable_mem: Option<f64>,

    /// Memory floor below which re-enabling becomes possible.
    #[arg(long)]
    pub enable_mem: Option<f64>,

    /// Seconds between samples.
    #[arg(long)]
    pub poll_secs: Option<u64>,

    /// Command to run when the policy is re-enabled; whitespace-split.
    #[arg(long, value_name = "COMMAND")]
    pub on_enable: Option<String>,

    /// Command to run when the policy is disabled; whitespace-split.
    #[arg(long, value_name = "COMMAND")]
    pub on_disable: Option<String>,
}

/// Starts the monitor loop, prints each transition, and stops on ctrl-c.
pub async fn execute(args: WatchArgs, config: &FileConfig) -> Result<()> {
    let policy = build_policy(&args, config)?;
    tracing::info!(name = %args.name, poll_secs = policy.poll_interval().as_secs(), "starting watch");
    let source = Arc::new(DockerStatsSource::discover(args.name.clone())?);
    let actuator = build_actuator(&args)?;

    println!(
        "Watching '{}' (cpu {:.0}%/{:.0}%, mem {:.0}%/{:.0}%, every {}s); ctrl-c to stop",
        args.name,
        policy.disable_cpu_pct(),
        policy.enable_cpu_pct(),
        policy.disable_mem_pct(),
        policy.enable_mem_pct(),
        policy.poll_interval().as_secs()
    );

    let handle = ResourceMonitor::start(source, actuator, policy);
    let mut status_rx = handle.watch();
    loop {
        tokio::select! {
            result = tokio::signal::ctrl_c() => {
                result.context("failed to listen for ctrl-c")?;
                break;
            }
            changed = status_rx.changed() => {
                if changed.is_err() {
                    break;
                }
                let status = status_rx.borrow().clone();
                let word = match status.state {
                    MonitorState::Active => "enabled",
                    MonitorState::Disabled => "disabled",
                };
                println!(
                    "Policy {word}: {}",
                    status.last_transition_reason.as_deref().unwrap_or("startup")
                );
            }
        }
    }

    println!("Stopping monitor");
    handle.stop(DEFAULT_MONITOR_STOP_TIMEOUT).await?;
    Ok(())
}

/// Merges flags over the config file; unset knobs use the shipped defaults.
fn build_policy(args: &WatchArgs, config: &FileConfig) -> Result<ThresholdPolicy> {
    let disable_cpu = args.disable_cpu.or(config.watch.disable_cpu_pct).unwrap_or(90.0);
    let enable_cpu = args.enable_cpu.or(config.watch.enable_cpu_pct).unwrap_or(85.0);
    let disable_mem = args.disable_mem.or(config.watch.disable_mem_pct).unwrap_or(95.0);
    let enable_mem = args.enable_mem.or(config.watch.enable_mem_pct).unwrap_or(90.0);
    let poll = args
        .poll_secs
        .or(config.watch.poll_interval_secs)
        .unwrap_or(30);
    Ok(ThresholdPolicy::new(
        disable_cpu,
        enable_cpu,
        disable_mem,
        enable_mem,
        Duration::from_secs(poll),
    )?)
}

/// Pairs the enable and disable hook commands, defaulting to the log-only
/// actuator when neither is given.
fn build_actuator(args: &WatchArgs) -> Result<Arc<dyn PolicyActuator>> {
    match (args.on_enable.as_deref(), args.on_disable.as_deref()) {
        (None, None) => Ok(Arc::new(LogActuator)),
        (Some(enable), Some(disable)) => {
            let actuator = CommandActuator::new(split_argv(enable), split_argv(disable))?;
            Ok(Arc::new(actuator))
        }
        _ => bail!("--on-enable and --on-disable must be given together"),
    }
}

fn split_argv(command: &str) -> Vec<String> {
    command.split_whitespace().map(str::to_string).collect()
}

#[cfg(test)]
mod tests {
    use crate::config::WatchSection;

    use super::*;

    fn args() -> WatchArgs {
        WatchArgs {
            name: "pg-test".into(),
            disable_cpu: None,
            enable_cpu: None,
            disable_mem: None,
            enable_mem: None,
            poll_secs: None,
            on_enable: None,
            on_disable: None,
        }
    }

    #[test]
    fn policy_defaults_when_nothing_configured() {
        let policy = build_policy(&args(), &FileConfig::default()).expect("defaults");
        assert!((policy.disable_cpu_pct() - 90.0).abs() < f64::EPSILON);
        assert!((policy.enable_mem_pct() - 90.0).abs() < f64::EPSILON);
        assert_eq!(policy.poll_interval(), Duration::from_secs(30));
    }

    #[test]
    fn flags_override_config_thresholds() {
        let config = FileConfig {
            watch: WatchSection {
                disable_cpu_pct: Some(70.0),
                enable_cpu_pct: Some(60.0),
                poll_interval_secs: Some(60),
                ..WatchSection::default()
            },
            ..FileConfig::default()
        };
        let mut args = args();
        args.disable_cpu = Some(80.0);
        let policy = build_policy(&args, &config).expect("builds");
        assert!((policy.disable_cpu_pct() - 80.0).abs() < f64::EPSILON);
        assert!((policy.enable_cpu_pct() - 60.0).abs() < f64::EPSILON);
        assert_eq!(policy.poll_interval(), Duration::from_secs(60));
    }

    #[test]
    fn inverted_thresholds_surface_the_policy_error() {
        let mut args = args();
        args.disable_cpu = Some(50.0);
        let err = build_policy(&args, &FileConfig::default()).expect_err("inverted");
        assert!(err.to_string().contains("hysteresis"));
    }

    #[test]
    fn actuator_requires_both_hooks_or_neither() {
        let mut half = args();
        half.on_enable = Some("systemctl start thing".into());
        assert!(build_actuator(&half).is_err());

        let mut both = half;
        both.on_disable = Some("systemctl stop thing".into());
        assert!(build_actuator(&both).is_ok());
        assert!(build_actuator(&args()).is_ok());
    }

    #[test]
    fn split_argv_whitespace_splits() {
        assert_eq!(
            split_argv("systemctl  stop thing"),
            vec!["systemctl", "stop", "thing"]
        );
    }
}
