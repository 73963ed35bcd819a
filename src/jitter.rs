//! Randomizes a backoff delay. Mirrors the `jitter.*` package of the
//! original source; every variant funnels its randomness through a shared
//! [`RngPool`].

use crate::error::ConfigError;
use crate::rng::RngPool;
use parking_lot::Mutex;
use std::time::Duration;

/// Randomizes a computed backoff delay.
pub trait Jitter: Send + Sync {
    fn apply(&self, interval: Duration) -> Duration;
}

/// Uniform random value in `[0, d)`.
#[derive(Clone)]
pub struct Full {
    rng: RngPool,
}

impl Full {
    pub fn new() -> Self {
        Self { rng: RngPool::new() }
    }

    pub fn with_rng(rng: RngPool) -> Self {
        Self { rng }
    }
}

impl Default for Full {
    fn default() -> Self {
        Self::new()
    }
}

impl Jitter for Full {
    fn apply(&self, interval: Duration) -> Duration {
        if interval.is_zero() {
            return interval;
        }
        let ns = self.rng.int63n(interval.as_nanos() as i64);
        Duration::from_nanos(ns as u64)
    }
}

/// `d/2 + uniform[0, d/2)`.
#[derive(Clone)]
pub struct Half {
    rng: RngPool,
}

impl Half {
    pub fn new() -> Self {
        Self { rng: RngPool::new() }
    }

    pub fn with_rng(rng: RngPool) -> Self {
        Self { rng }
    }
}

impl Default for Half {
    fn default() -> Self {
        Self::new()
    }
}

impl Jitter for Half {
    fn apply(&self, interval: Duration) -> Duration {
        let half = interval / 2;
        if half.is_zero() {
            return half;
        }
        let extra = self.rng.int63n(half.as_nanos() as i64);
        half + Duration::from_nanos(extra as u64)
    }
}

/// Decorrelated jitter: keeps per-instance state `c` (initialized to the
/// first requested interval); each call draws `uniform[0, 3c)` and clamps
/// into `[min, max]`, then remembers the clamped value as the new `c`.
///
/// Requires non-zero `min` and `max` ([`ConfigError::BadJitterBounds`]
/// otherwise) since an unbounded decorrelated walk can both collapse to
/// zero and diverge without them.
pub struct Decorrelated {
    min: Duration,
    max: Duration,
    rng: RngPool,
    state: Mutex<Option<Duration>>,
}

impl Decorrelated {
    pub fn new(min: Duration, max: Duration) -> Result<Self, ConfigError> {
        if min.is_zero() || max.is_zero() {
            return Err(ConfigError::BadJitterBounds);
        }
        Ok(Self {
            min,
            max,
            rng: RngPool::new(),
            state: Mutex::new(None),
        })
    }
}

impl Jitter for Decorrelated {
    fn apply(&self, interval: Duration) -> Duration {
        let mut state = self.state.lock();
        let c = state.unwrap_or(interval).max(Duration::from_nanos(1));
        let bound = (c.as_nanos() as i64).saturating_mul(3);
        let drawn = Duration::from_nanos(self.rng.int63n(bound) as u64);
        let clamped = drawn.clamp(self.min, self.max);
        *state = Some(clamped);
        clamped
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_is_bounded_above() {
        let j = Full::new();
        let d = Duration::from_millis(100);
        for _ in 0..100 {
            let r = j.apply(d);
            assert!(r < d);
        }
    }

    #[test]
    fn half_is_bounded_between_half_and_full() {
        let j = Half::new();
        let d = Duration::from_millis(100);
        for _ in 0..100 {
            let r = j.apply(d);
            assert!(r >= d / 2 && r < d);
        }
    }

    #[test]
    fn decorrelated_stays_within_min_max() {
        let min = Duration::from_millis(5);
        let max = Duration::from_millis(500);
        let j = Decorrelated::new(min, max).unwrap();
        let mut d = Duration::from_millis(10);
        for _ in 0..200 {
            d = j.apply(d);
            assert!(d >= min && d <= max);
        }
    }

    #[test]
    fn decorrelated_rejects_zero_bounds() {
        assert!(Decorrelated::new(Duration::ZERO, Duration::from_secs(1)).is_err());
        assert!(Decorrelated::new(Duration::from_secs(1), Duration::ZERO).is_err());
    }
}
