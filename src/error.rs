//! Error taxonomy: fatal configuration errors surfaced once from [`crate::Queue::new`],
//! and the single runtime error [`enqueue`](crate::Queue::enqueue) can return.

use thiserror::Error;

/// Fatal errors detected while validating a [`Config`](crate::config::Config) or
/// [`QosConfig`](crate::qos::QosConfig). A queue that fails to init transitions to
/// `Status::Fail` and stores the error for later retrieval via `Queue::error()`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("queue config: no capacity specified")]
    NoCapacity,

    #[error("queue config: no worker implementation provided")]
    NoWorker,

    #[error("queue config: workersMin/workersMax not set")]
    NoWorkers,

    #[error("queue config: workersMin ({min}) is greater than workersMax ({max})")]
    MinGreaterThanMax { min: u32, max: u32 },

    #[error("schedule: unknown time range `{0}`")]
    BadScheduleRange(String),

    #[error("schedule: invalid time component `{0}`")]
    BadTime(String),

    #[error("schedule: zero workersMax in range")]
    SchedZeroMax,

    #[error("schedule: workersMin greater than workersMax in range")]
    SchedMinGtMax,

    #[error("qos: unknown algorithm")]
    UnknownQosAlgo,

    #[error("qos: no priority evaluator provided")]
    NoEvaluator,

    #[error("qos: no sub-queues configured")]
    NoSubQueues,

    #[error("qos: a single sub-queue is senseless, use a plain FIFO instead")]
    SenselessQos,

    #[error("qos: sub-queue name `{0}` is reserved")]
    ReservedName(String),

    #[error("qos: sub-queue `{0}` has no capacity")]
    NoSubQueueCapacity(String),

    #[error("qos: sub-queue `{0}` has no ingress weight")]
    NoSubQueueWeight(String),

    #[error("jitter: decorrelated jitter requires non-zero min and max")]
    BadJitterBounds,
}

/// Errors returned from the public, runtime-facing API.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QueueError {
    #[error("queue is closed")]
    Closed,

    #[error("queue failed to initialize: {0}")]
    Config(#[from] ConfigError),
}

pub type ConfigResult<T> = Result<T, ConfigError>;
pub type QueueResult<T> = Result<T, QueueError>;
