//! Public payload wrapper. Plain `queue.enqueue(payload)` uses the queue's
//! configured defaults for delay/deadline; wrapping the payload in a [`Job`]
//! lets a producer override those per item.

use std::time::Duration;

/// Per-item override of delay/deadline (and an opaque `weight`, reserved for
/// QoS ingress weighting extensions) on top of the queue's configured
/// defaults.
#[derive(Debug, Clone)]
pub struct Job<T> {
    pub payload: T,
    pub weight: u64,
    pub delay_interval: Option<Duration>,
    pub deadline_interval: Option<Duration>,
}

impl<T> Job<T> {
    pub fn new(payload: T) -> Self {
        Self {
            payload,
            weight: 0,
            delay_interval: None,
            deadline_interval: None,
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay_interval = Some(delay);
        self
    }

    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline_interval = Some(deadline);
        self
    }

    pub fn with_weight(mut self, weight: u64) -> Self {
        self.weight = weight;
        self
    }
}
