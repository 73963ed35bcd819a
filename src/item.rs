//! Internal item wrapper carrying a payload plus the metadata the engine and
//! workers need: retry count, absolute delay/deadline timestamps, and (under
//! QoS) the sub-queue it was routed to.

/// An enqueued payload plus its runtime metadata. Owned by exactly one
/// location at a time: an engine channel, a worker's local variable, or the
/// DLQ.
#[derive(Debug)]
pub struct Item<T> {
    pub payload: T,
    pub retries: u32,
    /// Absolute monotonic nanoseconds after which the item may be processed.
    /// `0` means unset (no delay).
    pub delay_at_ns: i64,
    /// Absolute monotonic nanoseconds after which the item is considered
    /// missed. `0` means unset (no deadline).
    pub deadline_at_ns: i64,
    /// Sub-queue index under QoS; meaningless otherwise.
    pub subq_index: u32,
}

impl<T> Item<T> {
    pub fn new(payload: T) -> Self {
        Self {
            payload,
            retries: 0,
            delay_at_ns: 0,
            deadline_at_ns: 0,
            subq_index: 0,
        }
    }

    pub fn has_delay(&self) -> bool {
        self.delay_at_ns > 0
    }

    pub fn has_deadline(&self) -> bool {
        self.deadline_at_ns > 0
    }

    pub fn is_past_deadline(&self, now_ns: i64) -> bool {
        self.has_deadline() && now_ns >= self.deadline_at_ns
    }
}
