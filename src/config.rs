//! Layered configuration: a plain, `serde`-deserializable [`RawConfig`] for
//! the numeric/duration knobs, combined with injected collaborators
//! (worker, clock, metrics, DLQ, backoff, jitter, schedule, QoS) that a
//! trait-object field can't derive `Deserialize` for. Mirrors the split
//! `ferrex-server::infra::config::Config` draws between what comes from the
//! environment and what the embedder wires up in code.

use crate::backoff::{Backoff, Exponential};
use crate::clock::{Clock, SystemClock};
use crate::dlq::{Dlq, DummyDlq};
use crate::error::ConfigError;
use crate::jitter::{Full, Jitter};
use crate::metrics::{MetricsWriter, NoopMetrics};
use crate::qos::QosConfig;
use crate::schedule::Schedule;
use crate::worker::Worker;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;

pub const DEFAULT_WAKEUP_FACTOR: f32 = 0.75;
pub const DEFAULT_SLEEP_FACTOR: f32 = 0.5;
pub const DEFAULT_HEARTBEAT_INTERVAL: Duration = Duration::from_secs(1);
pub const DEFAULT_SLEEP_INTERVAL: Duration = Duration::from_secs(5);
pub const DEFAULT_FORCE_CALIBRATION_LIMIT: u64 = 1000;
pub const DEFAULT_SLEEP_THRESHOLD: u32 = 1;
pub const DEFAULT_FRONT_LEAK_ATTEMPTS: u32 = 8;
pub const DEFAULT_RETRY_INTERVAL: Duration = Duration::from_millis(100);
/// Factors must stay in `(0, FACTOR_LIMIT]`; `1.0` would make `rate == 1`
/// (Throttle) indistinguishable from "always wake/sleep".
pub const FACTOR_LIMIT: f32 = 0.999_999;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LeakDirectionCfg {
    Rear,
    Front,
}

/// Plain-data portion of [`Config`]: every field that can round-trip through
/// JSON/TOML in an embedding application. Collaborators live on `Config`
/// itself, attached via its builder methods.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RawConfig {
    pub capacity: u64,
    /// PFIFO sub-channel count. `1` (the default) means plain FIFO unless
    /// `qos` is set, in which case QoS wins regardless of this field.
    pub streams: u32,
    pub workers_min: u32,
    pub workers_max: u32,
    pub wakeup_factor: f32,
    pub sleep_factor: f32,
    pub sleep_threshold: u32,
    pub sleep_interval: Duration,
    pub heartbeat_interval: Duration,
    pub force_calibration_limit: u64,
    pub max_retries: u32,
    pub retry_interval: Duration,
    pub delay_interval: Duration,
    pub deadline_interval: Duration,
    pub fail_to_dlq: bool,
    pub deadline_to_dlq: bool,
    pub leak_direction: LeakDirectionCfg,
    pub front_leak_attempts: u32,
    /// `true` makes `enqueue` wait for space instead of leaking on a full
    /// engine. The crate's default is leaky (`false`), matching its name.
    pub blocking: bool,
}

impl Default for RawConfig {
    fn default() -> Self {
        Self {
            capacity: 0,
            streams: 1,
            workers_min: 0,
            workers_max: 0,
            wakeup_factor: DEFAULT_WAKEUP_FACTOR,
            sleep_factor: DEFAULT_SLEEP_FACTOR,
            sleep_threshold: DEFAULT_SLEEP_THRESHOLD,
            sleep_interval: DEFAULT_SLEEP_INTERVAL,
            heartbeat_interval: DEFAULT_HEARTBEAT_INTERVAL,
            force_calibration_limit: DEFAULT_FORCE_CALIBRATION_LIMIT,
            max_retries: 0,
            retry_interval: DEFAULT_RETRY_INTERVAL,
            delay_interval: Duration::ZERO,
            deadline_interval: Duration::ZERO,
            fail_to_dlq: false,
            deadline_to_dlq: false,
            leak_direction: LeakDirectionCfg::Rear,
            front_leak_attempts: DEFAULT_FRONT_LEAK_ATTEMPTS,
            blocking: false,
        }
    }
}

/// Full queue configuration: [`RawConfig`] plus the collaborators a caller
/// wires in. Build with [`Config::new`] and its `with_*` methods, then pass
/// to [`crate::queue::Queue::new`].
pub struct Config<T> {
    pub raw: RawConfig,
    pub worker: Option<Arc<dyn Worker<T>>>,
    pub clock: Arc<dyn Clock>,
    pub metrics: Arc<dyn MetricsWriter>,
    pub dlq: Arc<dyn Dlq<T>>,
    pub backoff: Arc<dyn Backoff>,
    pub jitter: Arc<dyn Jitter>,
    pub schedule: Option<Schedule>,
    pub qos: Option<QosConfig<T>>,
}

impl<T: Send + 'static> Config<T> {
    pub fn new() -> Self {
        Self {
            raw: RawConfig::default(),
            worker: None,
            clock: Arc::new(SystemClock::new()),
            metrics: Arc::new(NoopMetrics),
            dlq: Arc::new(DummyDlq),
            backoff: Arc::new(Exponential),
            jitter: Arc::new(Full::new()),
            schedule: None,
            qos: None,
        }
    }

    pub fn with_capacity(mut self, capacity: u64) -> Self {
        self.raw.capacity = capacity;
        self
    }

    pub fn with_streams(mut self, streams: u32) -> Self {
        self.raw.streams = streams;
        self
    }

    /// Shorthand for `with_workers_range(n, n)`.
    pub fn with_workers(self, n: u32) -> Self {
        self.with_workers_range(n, n)
    }

    pub fn with_workers_range(mut self, min: u32, max: u32) -> Self {
        self.raw.workers_min = min;
        self.raw.workers_max = max;
        self
    }

    pub fn with_factors(mut self, wakeup: f32, sleep: f32) -> Self {
        self.raw.wakeup_factor = wakeup;
        self.raw.sleep_factor = sleep;
        self
    }

    pub fn with_sleep_threshold(mut self, n: u32) -> Self {
        self.raw.sleep_threshold = n;
        self
    }

    pub fn with_sleep_interval(mut self, d: Duration) -> Self {
        self.raw.sleep_interval = d;
        self
    }

    pub fn with_heartbeat_interval(mut self, d: Duration) -> Self {
        self.raw.heartbeat_interval = d;
        self
    }

    pub fn with_force_calibration_limit(mut self, n: u64) -> Self {
        self.raw.force_calibration_limit = n;
        self
    }

    pub fn with_max_retries(mut self, n: u32) -> Self {
        self.raw.max_retries = n;
        self
    }

    pub fn with_retry_interval(mut self, d: Duration) -> Self {
        self.raw.retry_interval = d;
        self
    }

    pub fn with_delay_interval(mut self, d: Duration) -> Self {
        self.raw.delay_interval = d;
        self
    }

    pub fn with_deadline_interval(mut self, d: Duration) -> Self {
        self.raw.deadline_interval = d;
        self
    }

    pub fn with_fail_to_dlq(mut self, v: bool) -> Self {
        self.raw.fail_to_dlq = v;
        self
    }

    pub fn with_deadline_to_dlq(mut self, v: bool) -> Self {
        self.raw.deadline_to_dlq = v;
        self
    }

    pub fn with_leak_direction(mut self, d: LeakDirectionCfg) -> Self {
        self.raw.leak_direction = d;
        self
    }

    pub fn with_front_leak_attempts(mut self, n: u32) -> Self {
        self.raw.front_leak_attempts = n;
        self
    }

    pub fn with_blocking(mut self, v: bool) -> Self {
        self.raw.blocking = v;
        self
    }

    pub fn with_worker(mut self, worker: Arc<dyn Worker<T>>) -> Self {
        self.worker = Some(worker);
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_metrics(mut self, metrics: Arc<dyn MetricsWriter>) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn with_dlq(mut self, dlq: Arc<dyn Dlq<T>>) -> Self {
        self.dlq = dlq;
        self
    }

    pub fn with_backoff(mut self, backoff: Arc<dyn Backoff>) -> Self {
        self.backoff = backoff;
        self
    }

    pub fn with_jitter(mut self, jitter: Arc<dyn Jitter>) -> Self {
        self.jitter = jitter;
        self
    }

    pub fn with_schedule(mut self, schedule: Schedule) -> Self {
        self.schedule = Some(schedule);
        self
    }

    pub fn with_qos(mut self, qos: QosConfig<T>) -> Self {
        self.qos = Some(qos);
        self
    }

    /// Total capacity this config declares: the QoS config's summed
    /// capacity when QoS is configured, otherwise `raw.capacity`.
    pub fn effective_capacity(&self) -> u64 {
        self.qos.as_ref().map(|q| q.summing_capacity()).unwrap_or(self.raw.capacity)
    }

    /// Validates the configuration, filling in defaults for zeroed optional
    /// fields and returning the first fatal [`ConfigError`] found, matching
    /// the original source's "validate once at init, store the error"
    /// pattern (see [`crate::error::ConfigError`]).
    pub fn validate(&mut self) -> Result<(), ConfigError> {
        if self.worker.is_none() {
            return Err(ConfigError::NoWorker);
        }
        if let Some(qos) = self.qos.as_mut() {
            qos.validate()?;
        } else if self.raw.capacity == 0 {
            return Err(ConfigError::NoCapacity);
        }
        if self.raw.workers_min == 0 && self.raw.workers_max == 0 {
            return Err(ConfigError::NoWorkers);
        }
        if self.raw.workers_min > self.raw.workers_max {
            return Err(ConfigError::MinGreaterThanMax {
                min: self.raw.workers_min,
                max: self.raw.workers_max,
            });
        }
        self.raw.wakeup_factor = self.raw.wakeup_factor.clamp(f32::EPSILON, FACTOR_LIMIT);
        self.raw.sleep_factor = self.raw.sleep_factor.clamp(f32::EPSILON, FACTOR_LIMIT);
        if self.raw.force_calibration_limit == 0 {
            self.raw.force_calibration_limit = DEFAULT_FORCE_CALIBRATION_LIMIT;
        }
        if self.raw.heartbeat_interval.is_zero() {
            self.raw.heartbeat_interval = DEFAULT_HEARTBEAT_INTERVAL;
        }
        if self.raw.sleep_interval.is_zero() {
            self.raw.sleep_interval = DEFAULT_SLEEP_INTERVAL;
        }
        if self.raw.front_leak_attempts == 0 {
            self.raw.front_leak_attempts = DEFAULT_FRONT_LEAK_ATTEMPTS;
        }
        Ok(())
    }

    /// Overlays a handful of environment variables onto [`Config::new`]'s
    /// defaults: `LEVEE_CAPACITY`, `LEVEE_WORKERS_MIN`, `LEVEE_WORKERS_MAX`,
    /// `LEVEE_HEARTBEAT_MS`. Collaborators (worker, clock, ...) must still be
    /// attached by the caller; this only covers the plain-data knobs,
    /// matching `ferrex-server`'s `Config::from_env()` convention of
    /// layering env vars atop a programmatic default.
    pub fn from_env() -> Self {
        let mut cfg = Self::new();
        if let Some(v) = parse_env("LEVEE_CAPACITY") {
            cfg.raw.capacity = v;
        }
        if let Some(v) = parse_env("LEVEE_WORKERS_MIN") {
            cfg.raw.workers_min = v;
        }
        if let Some(v) = parse_env("LEVEE_WORKERS_MAX") {
            cfg.raw.workers_max = v;
        }
        if let Some(v) = parse_env::<u64>("LEVEE_HEARTBEAT_MS") {
            cfg.raw.heartbeat_interval = Duration::from_millis(v);
        }
        cfg
    }
}

impl<T: Send + 'static> Default for Config<T> {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_env<F: std::str::FromStr>(key: &str) -> Option<F> {
    std::env::var(key).ok().and_then(|v| v.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::worker::Worker;
    use async_trait::async_trait;

    struct NoopWorker;
    #[async_trait]
    impl Worker<u32> for NoopWorker {
        async fn do_work(&self, _payload: &u32) -> Result<(), anyhow::Error> {
            Ok(())
        }
    }

    #[test]
    fn rejects_missing_worker() {
        let mut cfg: Config<u32> = Config::new().with_capacity(8).with_workers(1);
        assert_eq!(cfg.validate(), Err(ConfigError::NoWorker));
    }

    #[test]
    fn rejects_missing_capacity_without_qos() {
        let mut cfg: Config<u32> = Config::new().with_worker(Arc::new(NoopWorker)).with_workers(1);
        assert_eq!(cfg.validate(), Err(ConfigError::NoCapacity));
    }

    #[test]
    fn rejects_min_greater_than_max() {
        let mut cfg: Config<u32> = Config::new()
            .with_worker(Arc::new(NoopWorker))
            .with_capacity(8)
            .with_workers_range(4, 2);
        assert_eq!(
            cfg.validate(),
            Err(ConfigError::MinGreaterThanMax { min: 4, max: 2 })
        );
    }

    #[test]
    fn valid_config_passes() {
        let mut cfg: Config<u32> = Config::new()
            .with_worker(Arc::new(NoopWorker))
            .with_capacity(8)
            .with_workers(2);
        assert!(cfg.validate().is_ok());
    }
}
