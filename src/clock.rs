//! Monotonic "now" source, injectable so tests can control elapsed time
//! without sleeping for real.

use std::sync::atomic::{AtomicI64, Ordering};
use std::time::Instant;

/// A source of monotonic nanosecond timestamps.
///
/// The default implementation ([`SystemClock`]) is backed by [`std::time::Instant`].
/// Tests inject [`ManualClock`] to assert delay/deadline/backoff behavior deterministically.
pub trait Clock: Send + Sync {
    /// Current time, in nanoseconds, relative to an arbitrary but fixed epoch.
    fn now(&self) -> i64;
}

/// Production clock: monotonic, backed by [`Instant`].
#[derive(Debug)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> i64 {
        self.origin.elapsed().as_nanos() as i64
    }
}

/// Test clock whose value is advanced explicitly.
#[derive(Debug, Default)]
pub struct ManualClock {
    ns: AtomicI64,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            ns: AtomicI64::new(0),
        }
    }

    pub fn set(&self, ns: i64) {
        self.ns.store(ns, Ordering::SeqCst);
    }

    pub fn advance(&self, delta_ns: i64) {
        self.ns.fetch_add(delta_ns, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> i64 {
        self.ns.load(Ordering::SeqCst)
    }
}
