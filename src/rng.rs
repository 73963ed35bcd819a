//! Thread-safe random source for [`crate::jitter`]. Every jitter variant funnels
//! its randomness through a single [`RngPool`] rather than reaching for
//! `rand::thread_rng()` directly, matching the source's `rng.Pool` (a
//! `sync.Pool` of seeded generators shared across jitter instances).

use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::time::{SystemTime, UNIX_EPOCH};

/// A mutex-guarded PRNG, seeded once with the current time.
///
/// Cloning an [`RngPool`] shares the same underlying generator (it is
/// reference-counted internally via `Arc`), so cheaply clone it into each
/// `Backoff`/`Jitter` instance that needs randomness.
#[derive(Clone)]
pub struct RngPool {
    inner: std::sync::Arc<Mutex<StdRng>>,
}

impl RngPool {
    pub fn new() -> Self {
        let seed = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or(0);
        Self {
            inner: std::sync::Arc::new(Mutex::new(StdRng::seed_from_u64(seed))),
        }
    }

    /// Uniform random integer in `[0, bound)`. Returns 0 if `bound <= 0`.
    pub fn int63n(&self, bound: i64) -> i64 {
        if bound <= 0 {
            return 0;
        }
        self.inner.lock().random_range(0..bound)
    }
}

impl Default for RngPool {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for RngPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("RngPool")
    }
}
