//! System-wide constants and defaults.

use std::time::Duration;

/// Application name used in labels and CLI output.
pub const APP_NAME: &str = "dbrig";

/// Binary name for the CLI.
pub const BIN_NAME: &str = "dbrig";

/// Container runtime binary driven by the control plane.
pub const RUNTIME_BIN: &str = "docker";

/// Label marking a container as managed by dbrig.
pub const LABEL_MANAGED: &str = "io.dbrig.managed";

/// Label carrying the lifecycle mode (`ephemeral` or `standalone`).
pub const LABEL_LIFECYCLE: &str = "io.dbrig.lifecycle";

/// Label carrying the session identifier watched by the external reaper.
/// Only ephemeral containers carry it.
pub const LABEL_SESSION: &str = "io.dbrig.session-id";

/// Delay after creation before the first persistence check, letting the
/// runtime's bookkeeping settle.
pub const DEFAULT_SETTLE_WINDOW: Duration = Duration::from_secs(2);

/// Interval between persistence-check polls.
pub const DEFAULT_VERIFY_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Bounded number of persistence-check polls.
pub const DEFAULT_VERIFY_ATTEMPTS: u32 = 3;

/// Grace period granted to a container when stopping or restarting.
pub const DEFAULT_STOP_TIMEOUT: Duration = Duration::from_secs(10);

/// Floor for the resource monitor's poll interval; shorter intervals are
/// rejected at policy construction to bound sampling overhead.
pub const MIN_MONITOR_POLL_INTERVAL: Duration = Duration::from_secs(10);

/// Default wait for the monitor loop to exit after a stop request.
pub const DEFAULT_MONITOR_STOP_TIMEOUT: Duration = Duration::from_secs(30);
