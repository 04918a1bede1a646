//! Policy-actuator trait and the shipped implementations.

use anyhow::Result;
use async_trait::async_trait;

/// The enable/disable switch on whatever the monitor protects.
///
/// Both operations must be idempotent: enabling an already-enabled policy
/// (or disabling a disabled one) is a no-op, not an error.
#[async_trait]
pub trait PolicyActuator: Send + Sync {
    /// Enables the protected policy.
    async fn enable(&self) -> Result<()>;

    /// Disables the protected policy.
    async fn disable(&self) -> Result<()>;
}

/// Runs a caller-supplied command for each transition.
pub struct CommandActuator {
    enable_argv: Vec<String>,
    disable_argv: Vec<String>,
}

impl CommandActuator {
    /// Creates an actuator from enable and disable argument vectors.
    ///
    /// # Errors
    ///
    /// Fails when either argv is empty.
    pub fn new(enable_argv: Vec<String>, disable_argv: Vec<String>) -> Result<Self> {
        if enable_argv.is_empty() || disable_argv.is_empty() {
            anyhow::bail!("actuator commands must not be empty");
        }
        Ok(Self {
            enable_argv,
            disable_argv,
        })
    }

    async fn run(argv: &[String]) -> Result<()> {
        let output = tokio::process::Command::new(&argv[0])
            .args(&argv[1..])
            .output()
            .await
            .map_err(|e| anyhow::anyhow!("failed to invoke '{}': {e}", argv[0]))?;
        if output.status.success() {
            Ok(())
        } else {
            anyhow::bail!(
                "'{}' exited with {}: {}",
                argv[0],
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )
        }
    }
}

#[async_trait]
impl PolicyActuator for CommandActuator {
    async fn enable(&self) -> Result<()> {
        Self::run(&self.enable_argv).await
    }

    async fn disable(&self) -> Result<()> {
        Self::run(&self.disable_argv).await
    }
}

/// Actuator that only logs transitions. Useful for dry runs and as the CLI
/// default when no hook commands are configured.
#[derive(Debug, Default)]
pub struct LogActuator;

#[async_trait]
impl PolicyActuator for LogActuator {
    async fn enable(&self) -> Result<()> {
        tracing::info!("policy enable requested (log-only actuator)");
        Ok(())
    }

    async fn disable(&self) -> Result<()> {
        tracing::info!("policy disable requested (log-only actuator)");
        Ok(())
    }
}
