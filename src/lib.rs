//! `levee`: an in-process, adaptive, leaky worker-pool queue with
//! Quality-of-Service scheduling, delayed execution, deadlines, retries
//! with backoff + jitter, and time-of-day capacity scheduling.
//!
//! The entry point is [`Queue`]: build a [`Config`] (attaching a [`Worker`]
//! implementation at minimum), call [`Queue::new`], then `enqueue` payloads.
//! The queue owns a background heartbeat that scales its worker pool
//! between `workers_min` and `workers_max` based on observed fullness.

pub mod backoff;
pub mod clock;
pub mod config;
pub mod dlq;
pub mod engine;
pub mod error;
pub mod item;
pub mod jitter;
pub mod job;
pub mod metrics;
pub mod qos;
pub mod queue;
pub mod rng;
pub mod schedule;
pub mod worker;

pub use backoff::{Backoff, Exponential, Linear, Logarithmic, Polynomial, Quadratic};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{Config, LeakDirectionCfg, RawConfig};
pub use dlq::{Dlq, DummyDlq, VecDlq};
pub use engine::{Engine, EnqueueOutcome, FifoEngine, PfifoEngine, PqEngine};
pub use error::{ConfigError, ConfigResult, QueueError, QueueResult};
pub use item::Item;
pub use jitter::{Decorrelated, Full, Half, Jitter};
pub use job::Job;
pub use metrics::{LeakDirection, MetricsWriter, NoopMetrics, TracingMetrics};
pub use qos::{PriorityEvaluator, QosAlgo, QosConfig, QosQueue};
pub use queue::{Queue, Status};
pub use rng::RngPool;
pub use schedule::{Schedule, ScheduleParams};
pub use worker::{Signal, Worker, WorkerStatus};
