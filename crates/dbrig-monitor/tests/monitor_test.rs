//! Integration tests for the running monitor loop.
//!
//! Drive the loop with mock sources and actuators under paused tokio time,
//! so many poll cycles replay without wall-clock delay:
//! 1. Hysteresis band produces zero transitions
//! 2. Disable is an OR over resources, enable is an AND
//! 3. Actuator failures leave the state unflipped
//! 4. Cooperative stop and stop timeout

#![allow(clippy::expect_used, clippy::unwrap_used)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;

use dbrig_common::error::DbrigError;
use dbrig_monitor::actuator::PolicyActuator;
use dbrig_monitor::monitor::ResourceMonitor;
use dbrig_monitor::policy::ThresholdPolicy;
use dbrig_monitor::sample::ResourceSample;
use dbrig_monitor::source::MetricsSource;
use dbrig_monitor::state::MonitorState;

const POLL: Duration = Duration::from_secs(10);
const STOP_WAIT: Duration = Duration::from_secs(5);

/// cpu: disable above 90, enable below 85; mem: disable above 95, enable
/// below 90.
fn policy() -> ThresholdPolicy {
    ThresholdPolicy::new(90.0, 85.0, 95.0, 90.0, POLL).expect("valid policy")
}

/// Replays a scripted sequence of (cpu, mem) pairs, repeating the last one
/// once the script runs out.
struct SequenceSource {
    script: Mutex<VecDeque<(f64, f64)>>,
    last: Mutex<(f64, f64)>,
}

impl SequenceSource {
    fn new(script: &[(f64, f64)]) -> Self {
        let mut queue: VecDeque<(f64, f64)> = script.iter().copied().collect();
        let first = queue.pop_front().expect("script must not be empty");
        let mut restored = VecDeque::with_capacity(queue.len() + 1);
        restored.push_back(first);
        restored.extend(queue);
        Self {
            script: Mutex::new(restored),
            last: Mutex::new(first),
        }
    }
}

#[async_trait]
impl MetricsSource for SequenceSource {
    async fn sample(&self) -> Result<ResourceSample> {
        let next = self.script.lock().unwrap().pop_front();
        let (cpu, mem) = match next {
            Some(pair) => {
                *self.last.lock().unwrap() = pair;
                pair
            }
            None => *self.last.lock().unwrap(),
        };
        Ok(ResourceSample::new(cpu, mem))
    }
}

/// Source whose samples never resolve, pinning the loop mid-cycle.
struct HangingSource;

#[async_trait]
impl MetricsSource for HangingSource {
    async fn sample(&self) -> Result<ResourceSample> {
        std::future::pending().await
    }
}

/// Source that always errors, exercising the skip path.
struct FailingSource;

#[async_trait]
impl MetricsSource for FailingSource {
    async fn sample(&self) -> Result<ResourceSample> {
        anyhow::bail!("stats endpoint went away")
    }
}

/// Records actuation calls; can be scripted to fail disables.
#[derive(Default)]
struct RecordingActuator {
    enables: AtomicUsize,
    disables: AtomicUsize,
    fail_disable: AtomicBool,
}

#[async_trait]
impl PolicyActuator for RecordingActuator {
    async fn enable(&self) -> Result<()> {
        let _ = self.enables.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn disable(&self) -> Result<()> {
        let _ = self.disables.fetch_add(1, Ordering::SeqCst);
        if self.fail_disable.load(Ordering::SeqCst) {
            anyhow::bail!("policy endpoint rejected the call");
        }
        Ok(())
    }
}

// ── Hysteresis ───────────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn band_samples_produce_zero_transitions() {
    let source = Arc::new(SequenceSource::new(&[
        (80.0, 10.0),
        (87.0, 10.0),
        (88.0, 10.0),
        (86.0, 10.0),
        (89.0, 10.0),
    ]));
    let actuator = Arc::new(RecordingActuator::default());
    let handle = ResourceMonitor::start(source, actuator.clone(), policy());

    tokio::time::sleep(POLL * 6).await;

    let status = handle.status();
    assert_eq!(status.state, MonitorState::Active);
    assert!(status.last_transition_reason.is_none());
    assert_eq!(actuator.disables.load(Ordering::SeqCst), 0);
    assert_eq!(actuator.enables.load(Ordering::SeqCst), 0);
    handle.stop(STOP_WAIT).await.expect("stop succeeds");
}

#[tokio::test(start_paused = true)]
async fn cpu_ceiling_alone_disables() {
    let source = Arc::new(SequenceSource::new(&[(95.0, 10.0)]));
    let actuator = Arc::new(RecordingActuator::default());
    let handle = ResourceMonitor::start(source, actuator.clone(), policy());

    tokio::time::sleep(POLL).await;

    let status = handle.status();
    assert_eq!(status.state, MonitorState::Disabled);
    let reason = status.last_transition_reason.expect("reason recorded");
    assert!(reason.contains("cpu 95.0%"), "got: {reason}");
    assert!(status.last_transition_time.is_some());
    assert_eq!(actuator.disables.load(Ordering::SeqCst), 1);
    handle.stop(STOP_WAIT).await.expect("stop succeeds");
}

#[tokio::test(start_paused = true)]
async fn enable_waits_for_both_resources_to_recover() {
    // Disable on cpu, then cpu recovers while mem sits above its enable
    // floor: the loop must stay disabled.
    let source = Arc::new(SequenceSource::new(&[(95.0, 10.0), (80.0, 92.0)]));
    let actuator = Arc::new(RecordingActuator::default());
    let handle = ResourceMonitor::start(source, actuator.clone(), policy());

    tokio::time::sleep(POLL * 5).await;

    assert_eq!(handle.status().state, MonitorState::Disabled);
    assert_eq!(actuator.disables.load(Ordering::SeqCst), 1);
    assert_eq!(actuator.enables.load(Ordering::SeqCst), 0);
    handle.stop(STOP_WAIT).await.expect("stop succeeds");
}

#[tokio::test(start_paused = true)]
async fn full_recovery_re_enables_once() {
    let source = Arc::new(SequenceSource::new(&[(95.0, 10.0), (80.0, 70.0)]));
    let actuator = Arc::new(RecordingActuator::default());
    let handle = ResourceMonitor::start(source, actuator.clone(), policy());

    tokio::time::sleep(POLL * 5).await;

    let status = handle.status();
    assert_eq!(status.state, MonitorState::Active);
    let reason = status.last_transition_reason.expect("reason recorded");
    assert!(reason.contains("below"), "got: {reason}");
    assert_eq!(actuator.disables.load(Ordering::SeqCst), 1);
    assert_eq!(actuator.enables.load(Ordering::SeqCst), 1);
    handle.stop(STOP_WAIT).await.expect("stop succeeds");
}

// ── Actuator failure ─────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn failed_disable_keeps_state_and_retries_next_cycle() {
    let source = Arc::new(SequenceSource::new(&[(95.0, 10.0)]));
    let actuator = Arc::new(RecordingActuator::default());
    actuator.fail_disable.store(true, Ordering::SeqCst);
    let handle = ResourceMonitor::start(source, actuator.clone(), policy());

    tokio::time::sleep(POLL * 3).await;

    // Attempts were made every cycle, but the state never flipped.
    assert_eq!(handle.status().state, MonitorState::Active);
    assert!(handle.status().last_transition_reason.is_none());
    assert!(actuator.disables.load(Ordering::SeqCst) >= 2);

    // Once the actuator recovers, the persisting condition flips the state.
    actuator.fail_disable.store(false, Ordering::SeqCst);
    tokio::time::sleep(POLL * 2).await;
    assert_eq!(handle.status().state, MonitorState::Disabled);
    handle.stop(STOP_WAIT).await.expect("stop succeeds");
}

// ── Sampling failure ─────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn sampling_failures_are_skipped_without_crashing() {
    let actuator = Arc::new(RecordingActuator::default());
    let handle = ResourceMonitor::start(Arc::new(FailingSource), actuator.clone(), policy());

    tokio::time::sleep(POLL * 4).await;

    assert_eq!(handle.status().state, MonitorState::Active);
    assert_eq!(actuator.disables.load(Ordering::SeqCst), 0);
    handle.stop(STOP_WAIT).await.expect("loop survived sample failures");
}

// ── Cancellation ─────────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn stop_is_observed_at_the_sleep_boundary() {
    let source = Arc::new(SequenceSource::new(&[(50.0, 50.0)]));
    let actuator = Arc::new(RecordingActuator::default());
    let handle = ResourceMonitor::start(source, actuator, policy());

    tokio::time::sleep(POLL * 2).await;
    handle.stop(STOP_WAIT).await.expect("cooperative stop succeeds");
}

#[tokio::test(start_paused = true)]
async fn stop_times_out_when_the_loop_is_stuck_mid_sample() {
    let actuator = Arc::new(RecordingActuator::default());
    let handle = ResourceMonitor::start(Arc::new(HangingSource), actuator, policy());

    tokio::time::sleep(Duration::from_millis(10)).await;

    let err = handle.stop(STOP_WAIT).await.expect_err("loop cannot exit");
    match err {
        DbrigError::StopTimeout { waited } => assert_eq!(waited, STOP_WAIT),
        other => panic!("expected StopTimeout, got {other:?}"),
    }
}
