//! Observation-only collaborator contract. The core calls every hook on its
//! hot paths; implementations must be cheap (a counter increment, a gauge
//! set) and must never block or panic.

use std::time::Duration;

/// Direction an item was leaked in: "rear" (the incoming item was rejected)
/// or "front" (an already-queued item was evicted to make room, or a
/// retry-exhausted item was spilled).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeakDirection {
    Rear,
    Front,
}

impl LeakDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            LeakDirection::Rear => "rear",
            LeakDirection::Front => "front",
        }
    }
}

/// Sink for counters/gauges/histograms describing queue and worker behavior.
/// All methods have a default no-op body so implementers only need to
/// override the hooks they care about, mirroring how `DummyMetrics` in the
/// original source satisfies the same interface with empty bodies.
pub trait MetricsWriter: Send + Sync {
    fn worker_setup(&self, _active: u32, _sleep: u32, _idle: u32) {}
    fn worker_init(&self, _idx: u32) {}
    fn worker_sleep(&self, _idx: u32) {}
    fn worker_wakeup(&self, _idx: u32) {}
    fn worker_wait(&self, _idx: u32, _duration: Duration) {}
    fn worker_stop(&self, _idx: u32, _force: bool, _prior_status: &str) {}

    fn queue_put(&self) {}
    fn queue_pull(&self) {}
    fn queue_retry(&self, _delay: Duration) {}
    fn queue_leak(&self, _direction: LeakDirection) {}
    fn queue_deadline(&self) {}
    fn queue_lost(&self) {}

    fn subq_put(&self, _name: &str) {}
    fn subq_pull(&self, _name: &str) {}
    fn subq_leak(&self, _name: &str) {}
}

/// A `MetricsWriter` that discards every observation. The default
/// collaborator when a caller doesn't care to wire one up.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopMetrics;

impl MetricsWriter for NoopMetrics {}

/// A `MetricsWriter` that forwards every observation to `tracing` at
/// `debug` level, useful when a caller wants visibility without wiring a
/// real metrics backend (Prometheus/VictoriaMetrics sinks are out of scope
/// for this core, see SPEC_FULL.md §1).
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingMetrics;

impl MetricsWriter for TracingMetrics {
    fn worker_init(&self, idx: u32) {
        tracing::debug!(worker = idx, "worker init");
    }
    fn worker_sleep(&self, idx: u32) {
        tracing::debug!(worker = idx, "worker sleep");
    }
    fn worker_wakeup(&self, idx: u32) {
        tracing::debug!(worker = idx, "worker wakeup");
    }
    fn worker_stop(&self, idx: u32, force: bool, prior_status: &str) {
        tracing::debug!(worker = idx, force, prior_status, "worker stop");
    }
    fn queue_retry(&self, delay: Duration) {
        tracing::debug!(?delay, "item retry scheduled");
    }
    fn queue_leak(&self, direction: LeakDirection) {
        tracing::warn!(direction = direction.as_str(), "item leaked to DLQ");
    }
    fn queue_deadline(&self) {
        tracing::warn!("item missed its deadline");
    }
    fn queue_lost(&self) {
        tracing::error!("item lost: DLQ unavailable or absent");
    }
}
