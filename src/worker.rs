//! Per-item processing contract and the worker task lifecycle: Idle → Active
//! ↔ Sleep, driven by signals the [`crate::queue::Queue`] sends during
//! calibration.

use async_trait::async_trait;

/// Processes a single payload. Returning an error triggers the queue's
/// retry/DLQ policy; it never escapes the queue.
#[async_trait]
pub trait Worker<T>: Send + Sync {
    async fn do_work(&self, payload: &T) -> Result<(), anyhow::Error>;
}

/// Observable lifecycle state of a worker slot, reported via
/// [`crate::metrics::MetricsWriter`] and used by calibration to decide which
/// slots are eligible to wake/sleep/stop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerStatus {
    /// Slot exists but has no task running.
    Idle,
    /// Task is running and reading from the engine.
    Active,
    /// Task is running but parked on its control channel.
    Sleep,
}

impl WorkerStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkerStatus::Idle => "idle",
            WorkerStatus::Active => "active",
            WorkerStatus::Sleep => "sleep",
        }
    }
}

/// Signals the Queue sends to a worker task via its 1-capacity control
/// channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    Init,
    Sleep,
    Wakeup,
    Stop,
    ForceStop,
}
