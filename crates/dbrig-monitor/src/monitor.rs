//! The background control loop and its handle.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::{mpsc, watch};

use dbrig_common::error::{DbrigError, Result};

use crate::actuator::PolicyActuator;
use crate::policy::ThresholdPolicy;
use crate::source::MetricsSource;
use crate::state::{evaluate, MonitorState, MonitoringStatus, Verdict};

/// Starts and identifies resource-monitor loops.
pub struct ResourceMonitor;

impl ResourceMonitor {
    /// Spawns one monitoring task and returns its handle immediately.
    ///
    /// The loop starts in [`MonitorState::Active`], runs one
    /// sample-evaluate-act cycle per tick, sleeps `poll_interval` between
    /// cycles, and runs until stopped through the handle. There is no
    /// process-wide registry: the handle is the only way to reach the
    /// loop.
    #[must_use]
    pub fn start(
        source: Arc<dyn MetricsSource>,
        actuator: Arc<dyn PolicyActuator>,
        policy: ThresholdPolicy,
    ) -> MonitorHandle {
        let (status_tx, status_rx) = watch::channel(MonitoringStatus::default());
        let (stop_tx, stop_rx) = mpsc::channel(1);
        tracing::info!(
            poll_secs = policy.poll_interval().as_secs(),
            "starting resource monitor"
        );
        let task = tokio::spawn(run_loop(source, actuator, policy, status_tx, stop_rx));
        MonitorHandle {
            status_rx,
            stop_tx,
            task,
        }
    }
}

/// Caller-held handle to one running monitor loop.
pub struct MonitorHandle {
    status_rx: watch::Receiver<MonitoringStatus>,
    stop_tx: mpsc::Sender<()>,
    task: tokio::task::JoinHandle<()>,
}

impl MonitorHandle {
    /// Snapshot of the loop's current state.
    #[must_use]
    pub fn status(&self) -> MonitoringStatus {
        self.status_rx.borrow().clone()
    }

    /// Receiver that observes every published status change.
    #[must_use]
    pub fn watch(&self) -> watch::Receiver<MonitoringStatus> {
        self.status_rx.clone()
    }

    /// Requests cooperative cancellation and waits for the loop to exit.
    ///
    /// The stop request is observed at the loop's next sleep boundary. If
    /// the loop does not exit within `timeout` (it may be mid-actuation),
    /// this reports failure instead of killing the task; the loop keeps
    /// running detached until its current cycle finishes.
    ///
    /// # Errors
    ///
    /// Returns [`DbrigError::StopTimeout`] when the wait elapses.
    pub async fn stop(self, timeout: Duration) -> Result<()> {
        let _ = self.stop_tx.try_send(());
        match tokio::time::timeout(timeout, self.task).await {
            Ok(_) => Ok(()),
            Err(_) => Err(DbrigError::StopTimeout { waited: timeout }),
        }
    }
}

async fn run_loop(
    source: Arc<dyn MetricsSource>,
    actuator: Arc<dyn PolicyActuator>,
    policy: ThresholdPolicy,
    status_tx: watch::Sender<MonitoringStatus>,
    mut stop_rx: mpsc::Receiver<()>,
) {
    let mut status = MonitoringStatus::default();
    loop {
        match source.sample().await {
            Ok(sample) => {
                tracing::debug!(
                    cpu_pct = sample.cpu_pct,
                    mem_pct = sample.mem_pct,
                    state = ?status.state,
                    "sample evaluated"
                );
                match evaluate(status.state, &policy, &sample) {
                    Verdict::Disable { reason } => {
                        apply_transition(
                            &actuator,
                            &mut status,
                            MonitorState::Disabled,
                            reason,
                            &status_tx,
                        )
                        .await;
                    }
                    Verdict::Enable { reason } => {
                        apply_transition(
                            &actuator,
                            &mut status,
                            MonitorState::Active,
                            reason,
                            &status_tx,
                        )
                        .await;
                    }
                    Verdict::Maintain => {}
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "metrics sample failed; skipping cycle");
            }
        }

        tokio::select! {
            () = tokio::time::sleep(policy.poll_interval()) => {}
            _ = stop_rx.recv() => {
                tracing::info!("resource monitor stopping");
                break;
            }
        }
    }
}

/// Invokes the actuator for a transition. The in-memory state only flips
/// once the actuator call succeeds; on failure the loop stays in its last
/// known-good actuated state and retries naturally on the next sample if
/// the condition persists.
async fn apply_transition(
    actuator: &Arc<dyn PolicyActuator>,
    status: &mut MonitoringStatus,
    target: MonitorState,
    reason: String,
    status_tx: &watch::Sender<MonitoringStatus>,
) {
    let (action, result) = match target {
        MonitorState::Disabled => ("disable", actuator.disable().await),
        MonitorState::Active => ("enable", actuator.enable().await),
    };
    match result {
        Ok(()) => {
            tracing::info!(action, %reason, "policy transition applied");
            status.state = target;
            status.last_transition_reason = Some(reason);
            status.last_transition_time = Some(Utc::now());
            let _ = status_tx.send(status.clone());
        }
        Err(e) => {
            let err = DbrigError::actuator(action, e.to_string());
            tracing::warn!(
                %reason,
                error = %err,
                "actuator call failed; keeping last known-good state"
            );
        }
    }
}
