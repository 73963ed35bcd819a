//! Retry backoff strategies. Each computes the next retry interval from a
//! base interval and the zero-based attempt number, mirroring the
//! `backoff.*` package of the original source (one file per strategy).

use std::time::Duration;

/// Computes the next retry interval given a base interval and attempt count.
pub trait Backoff: Send + Sync {
    fn next(&self, base: Duration, attempt: u32) -> Duration;
}

/// `base * attempt`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Linear;

impl Backoff for Linear {
    fn next(&self, base: Duration, attempt: u32) -> Duration {
        base * attempt
    }
}

/// `base * 2^attempt`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Exponential;

impl Backoff for Exponential {
    fn next(&self, base: Duration, attempt: u32) -> Duration {
        base.saturating_mul(1u32.checked_shl(attempt).unwrap_or(u32::MAX))
    }
}

/// `base * attempt^2`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Quadratic;

impl Backoff for Quadratic {
    fn next(&self, base: Duration, attempt: u32) -> Duration {
        base.saturating_mul(attempt.saturating_mul(attempt))
    }
}

/// `base * attempt^k` for a configurable exponent `k`.
#[derive(Debug, Clone, Copy)]
pub struct Polynomial {
    pub k: u32,
}

impl Polynomial {
    pub fn new(k: u32) -> Self {
        Self { k }
    }
}

impl Backoff for Polynomial {
    fn next(&self, base: Duration, attempt: u32) -> Duration {
        let factor = (attempt as f64).powi(self.k as i32);
        Duration::from_secs_f64(base.as_secs_f64() * factor)
    }
}

/// `base * ln(attempt + 1)`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Logarithmic;

impl Backoff for Logarithmic {
    fn next(&self, base: Duration, attempt: u32) -> Duration {
        let factor = ((attempt as f64) + 1.0).ln();
        Duration::from_secs_f64(base.as_secs_f64() * factor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn linear_scales_by_attempt() {
        let b = Linear;
        assert_eq!(b.next(Duration::from_millis(10), 0), Duration::ZERO);
        assert_eq!(b.next(Duration::from_millis(10), 1), Duration::from_millis(10));
        assert_eq!(b.next(Duration::from_millis(10), 3), Duration::from_millis(30));
    }

    #[test]
    fn first_attempt_is_zero_wait_for_non_exponential_strategies() {
        let base = Duration::from_millis(10);
        assert_eq!(Linear.next(base, 0), Duration::ZERO);
        assert_eq!(Quadratic.next(base, 0), Duration::ZERO);
        assert_eq!(Polynomial::new(3).next(base, 0), Duration::ZERO);
    }

    #[test]
    fn exponential_doubles() {
        let b = Exponential;
        assert_eq!(b.next(Duration::from_millis(10), 0), Duration::from_millis(10));
        assert_eq!(b.next(Duration::from_millis(10), 1), Duration::from_millis(20));
        assert_eq!(b.next(Duration::from_millis(10), 2), Duration::from_millis(40));
    }

    #[test]
    fn monotonicity_holds_for_all_but_logarithmic_edge() {
        let base = Duration::from_millis(10);
        for b in [
            &Linear as &dyn Backoff,
            &Exponential as &dyn Backoff,
            &Quadratic as &dyn Backoff,
        ] {
            for k in 0..5 {
                assert!(b.next(base, k + 1) >= b.next(base, k));
            }
        }
        let poly = Polynomial::new(3);
        for k in 0..5 {
            assert!(poly.next(base, k + 1) >= poly.next(base, k));
        }
    }

    #[test]
    fn logarithmic_grows_slowly_but_monotonically() {
        let b = Logarithmic;
        let base = Duration::from_millis(1000);
        let mut prev = b.next(base, 0);
        for attempt in 1..10 {
            let next = b.next(base, attempt);
            assert!(next >= prev);
            prev = next;
        }
    }
}
