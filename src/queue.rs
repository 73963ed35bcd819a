//! The conductor: owns the engine and the worker slab, runs the heartbeat
//! calibration loop, and exposes the public `enqueue`/`size`/`close` API.
//! Grounded on `ferrex-server::transcoding::queue::JobQueue` (channel-backed
//! queue with a background dispatch loop) generalized with the worker-pool
//! scaling of `ferrex-server::stream::transcoding::worker::WorkerPool`.

use crate::backoff::Backoff;
use crate::clock::Clock;
use crate::config::{Config, LeakDirectionCfg};
use crate::dlq::Dlq;
use crate::engine::{Engine, EnqueueOutcome, FifoEngine, PfifoEngine, PqEngine};
use crate::error::{ConfigError, QueueError, QueueResult};
use crate::item::Item;
use crate::jitter::Jitter;
use crate::job::Job;
use crate::metrics::{LeakDirection, MetricsWriter};
use crate::schedule::Schedule;
use crate::worker::{Signal, Worker, WorkerStatus};
use parking_lot::Mutex as SyncMutex;
use std::sync::atomic::{AtomicBool, AtomicI32, AtomicI64, AtomicU64, AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Mutex as AsyncMutex};
use tokio::task::JoinHandle;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Status {
    Nil = 0,
    Fail = 1,
    Active = 2,
    Throttle = 3,
    Close = 4,
}

impl Status {
    fn from_u8(v: u8) -> Self {
        match v {
            0 => Status::Nil,
            1 => Status::Fail,
            2 => Status::Active,
            3 => Status::Throttle,
            _ => Status::Close,
        }
    }
}

fn worker_status_to_u8(s: WorkerStatus) -> u8 {
    match s {
        WorkerStatus::Idle => 0,
        WorkerStatus::Active => 1,
        WorkerStatus::Sleep => 2,
    }
}

fn worker_status_from_u8(v: u8) -> WorkerStatus {
    match v {
        1 => WorkerStatus::Active,
        2 => WorkerStatus::Sleep,
        _ => WorkerStatus::Idle,
    }
}

struct WorkerSlot {
    status: AtomicU8,
    ctl_tx: SyncMutex<Option<watch::Sender<Signal>>>,
    last_signal_ts: AtomicI64,
    handle: AsyncMutex<Option<JoinHandle<()>>>,
}

impl WorkerSlot {
    fn new() -> Self {
        Self {
            status: AtomicU8::new(worker_status_to_u8(WorkerStatus::Idle)),
            ctl_tx: SyncMutex::new(None),
            last_signal_ts: AtomicI64::new(0),
            handle: AsyncMutex::new(None),
        }
    }

    fn status(&self) -> WorkerStatus {
        worker_status_from_u8(self.status.load(Ordering::SeqCst))
    }

    fn set_status(&self, s: WorkerStatus) {
        self.status.store(worker_status_to_u8(s), Ordering::SeqCst);
    }
}

struct Inner<T: Send + 'static> {
    engine: Arc<dyn Engine<T>>,
    worker_impl: Arc<dyn Worker<T>>,
    clock: Arc<dyn Clock>,
    metrics: Arc<dyn MetricsWriter>,
    dlq: Arc<dyn Dlq<T>>,
    backoff: Arc<dyn Backoff>,
    jitter: Arc<dyn Jitter>,
    schedule: SyncMutex<Option<Schedule>>,

    workers: Vec<WorkerSlot>,
    status: AtomicU8,
    workers_up: AtomicU64,
    workers_min: AtomicU64,
    workers_max: AtomicU64,
    thresholds: SyncMutex<(f32, f32)>,
    sched_id: AtomicI32,
    spinlock: AtomicU64,
    enqlock: AtomicI64,
    calibration_lock: AtomicBool,
    error: SyncMutex<Option<ConfigError>>,

    leak_direction: LeakDirectionCfg,
    front_leak_attempts: u32,
    max_retries: u32,
    retry_interval: Duration,
    delay_interval: Duration,
    deadline_interval: Duration,
    fail_to_dlq: bool,
    deadline_to_dlq: bool,
    force_calibration_limit: u64,
    sleep_threshold: u32,
    sleep_interval: Duration,
    heartbeat_interval: Duration,
    blocking: bool,
}

/// An adaptive, leaky worker-pool queue generic over payload `T`. See
/// SPEC_FULL.md §4.1 for the calibration algorithm this drives every
/// `heartbeat_interval`.
pub struct Queue<T: Send + 'static> {
    inner: Arc<Inner<T>>,
    heartbeat: AsyncMutex<Option<JoinHandle<()>>>,
}

fn build_engine<T: Send + 'static>(cfg: &Config<T>) -> Arc<dyn Engine<T>> {
    if let Some(qos) = &cfg.qos {
        Arc::new(PqEngine::new(qos, cfg.metrics.clone()))
    } else if cfg.raw.streams > 1 {
        Arc::new(PfifoEngine::new(cfg.effective_capacity(), cfg.raw.streams))
    } else {
        Arc::new(FifoEngine::new(cfg.effective_capacity()))
    }
}

impl<T: Send + 'static> Queue<T> {
    /// Validates `cfg`, builds the engine and worker slab, starts the
    /// initial `workers_min` workers, and spawns the heartbeat task. Returns
    /// `Err` once, synchronously, on a fatal config error — the queue is
    /// never partially constructed.
    pub async fn new(mut cfg: Config<T>) -> Result<Arc<Self>, ConfigError> {
        cfg.validate()?;

        let wmax_daily = cfg
            .schedule
            .as_ref()
            .map(|s| s.workers_max_daily().max(cfg.raw.workers_max))
            .unwrap_or(cfg.raw.workers_max);
        let slab_size = wmax_daily.max(cfg.raw.workers_max).max(1) as usize;

        let engine = build_engine(&cfg);
        let workers: Vec<WorkerSlot> = (0..slab_size).map(|_| WorkerSlot::new()).collect();

        let inner = Arc::new(Inner {
            engine,
            worker_impl: cfg.worker.clone().expect("validated: worker present"),
            clock: cfg.clock.clone(),
            metrics: cfg.metrics.clone(),
            dlq: cfg.dlq.clone(),
            backoff: cfg.backoff.clone(),
            jitter: cfg.jitter.clone(),
            schedule: SyncMutex::new(cfg.schedule.as_ref().map(Schedule::freeze)),
            workers,
            status: AtomicU8::new(Status::Nil as u8),
            workers_up: AtomicU64::new(0),
            workers_min: AtomicU64::new(cfg.raw.workers_min as u64),
            workers_max: AtomicU64::new(cfg.raw.workers_max as u64),
            thresholds: SyncMutex::new((cfg.raw.wakeup_factor, cfg.raw.sleep_factor)),
            sched_id: AtomicI32::new(-1),
            spinlock: AtomicU64::new(0),
            enqlock: AtomicI64::new(0),
            calibration_lock: AtomicBool::new(false),
            error: SyncMutex::new(None),
            leak_direction: cfg.raw.leak_direction,
            front_leak_attempts: cfg.raw.front_leak_attempts,
            max_retries: cfg.raw.max_retries,
            retry_interval: cfg.raw.retry_interval,
            delay_interval: cfg.raw.delay_interval,
            deadline_interval: cfg.raw.deadline_interval,
            fail_to_dlq: cfg.raw.fail_to_dlq,
            deadline_to_dlq: cfg.raw.deadline_to_dlq,
            force_calibration_limit: cfg.raw.force_calibration_limit,
            sleep_threshold: cfg.raw.sleep_threshold,
            sleep_interval: cfg.raw.sleep_interval,
            heartbeat_interval: cfg.raw.heartbeat_interval,
            blocking: cfg.raw.blocking,
        });

        for idx in 0..cfg.raw.workers_min as usize {
            start_worker(&inner, idx);
        }
        inner.metrics.worker_setup(cfg.raw.workers_min, 0, slab_size as u32 - cfg.raw.workers_min);
        inner.status.store(Status::Active as u8, Ordering::SeqCst);

        let heartbeat = {
            let inner = inner.clone();
            tokio::spawn(async move {
                loop {
                    tokio::time::sleep(inner.heartbeat_interval).await;
                    if inner.status() == Status::Close && inner.size() == 0 {
                        calibrate(&inner).await;
                        return;
                    }
                    calibrate(&inner).await;
                }
            })
        };

        Ok(Arc::new(Self {
            inner,
            heartbeat: AsyncMutex::new(Some(heartbeat)),
        }))
    }

    pub async fn enqueue(&self, payload: T) -> QueueResult<()> {
        self.enqueue_job(Job::new(payload)).await
    }

    pub async fn enqueue_job(&self, job: Job<T>) -> QueueResult<()> {
        let status = self.inner.status();
        if status == Status::Close || status == Status::Fail {
            return Err(QueueError::Closed);
        }

        self.inner.enqlock.fetch_add(1, Ordering::SeqCst);
        let spins = self.inner.spinlock.fetch_add(1, Ordering::SeqCst) + 1;
        if spins >= self.inner.force_calibration_limit {
            calibrate(&self.inner).await;
        }

        let now = self.inner.clock.now();
        let delay_interval = job.delay_interval.filter(|d| !d.is_zero()).or({
            if self.inner.delay_interval.is_zero() {
                None
            } else {
                Some(self.inner.delay_interval)
            }
        });
        let deadline_interval = job.deadline_interval.filter(|d| !d.is_zero()).or({
            if self.inner.deadline_interval.is_zero() {
                None
            } else {
                Some(self.inner.deadline_interval)
            }
        });

        let mut item = Item::new(job.payload);
        if let Some(d) = delay_interval {
            item.delay_at_ns = now + d.as_nanos() as i64;
        }
        if let Some(d) = deadline_interval {
            item.deadline_at_ns = now + d.as_nanos() as i64;
        }

        let outcome = self.inner.engine.enqueue(item, self.inner.blocking).await;
        self.inner.enqlock.fetch_sub(1, Ordering::SeqCst);

        match outcome {
            EnqueueOutcome::Accepted => {
                self.inner.metrics.queue_put();
                Ok(())
            }
            EnqueueOutcome::Rejected(item) => {
                leak(&self.inner, item).await;
                Ok(())
            }
        }
    }

    pub fn size(&self) -> u64 {
        self.inner.engine.size()
    }

    pub fn capacity(&self) -> u64 {
        self.inner.engine.cap()
    }

    pub fn rate(&self) -> f64 {
        let cap = self.capacity();
        if cap == 0 {
            0.0
        } else {
            self.size() as f64 / cap as f64
        }
    }

    pub fn error(&self) -> Option<ConfigError> {
        self.inner.error.lock().clone()
    }

    pub fn status(&self) -> Status {
        self.inner.status()
    }

    /// Cooperative shutdown: stops accepting enqueues, waits for in-flight
    /// enqueues to land, then lets the engine and workers drain naturally.
    pub async fn close(&self) -> QueueResult<()> {
        let prev = self.inner.status.swap(Status::Close as u8, Ordering::SeqCst);
        if Status::from_u8(prev) == Status::Close {
            return Err(QueueError::Closed);
        }
        while self.inner.enqlock.load(Ordering::SeqCst) > 0 {
            tokio::task::yield_now().await;
        }
        self.inner.engine.close(false).await;
        self.join_workers().await;
        self.join_heartbeat().await;
        Ok(())
    }

    /// Immediate shutdown: signals every non-idle worker to force-stop
    /// (interrupting any delay/backoff wait so its in-flight item is
    /// re-enqueued and drained to the DLQ), then force-closes the engine.
    pub async fn force_close(&self) -> QueueResult<()> {
        let prev = self.inner.status.swap(Status::Close as u8, Ordering::SeqCst);
        if Status::from_u8(prev) == Status::Close {
            return Err(QueueError::Closed);
        }
        for (idx, slot) in self.inner.workers.iter().enumerate() {
            if slot.status() != WorkerStatus::Idle {
                send_signal(&self.inner, idx, Signal::ForceStop);
            }
        }
        self.inner.engine.close(true).await;
        self.join_workers().await;
        self.join_heartbeat().await;
        Ok(())
    }

    async fn join_workers(&self) {
        for slot in &self.inner.workers {
            if let Some(handle) = slot.handle.lock().await.take() {
                let _ = handle.await;
            }
        }
    }

    async fn join_heartbeat(&self) {
        if let Some(handle) = self.heartbeat.lock().await.take() {
            handle.abort();
        }
    }
}

impl<T: Send + 'static> Inner<T> {
    fn status(&self) -> Status {
        Status::from_u8(self.status.load(Ordering::SeqCst))
    }

    fn size(&self) -> u64 {
        self.engine.size()
    }
}

fn send_signal<T: Send + 'static>(inner: &Inner<T>, idx: usize, sig: Signal) {
    let slot = &inner.workers[idx];
    slot.last_signal_ts.store(inner.clock.now(), Ordering::SeqCst);
    let guard = slot.ctl_tx.lock();
    if let Some(tx) = guard.as_ref() {
        // `watch::Sender::send` always overwrites the current value, which
        // is exactly the "drain the stale signal before sending" discipline
        // a capacity-1 mpsc channel would need to implement by hand.
        let _ = tx.send(sig);
    }
}

fn start_worker<T: Send + 'static>(inner: &Arc<Inner<T>>, idx: usize) {
    let (tx, rx) = watch::channel(Signal::Init);
    *inner.workers[idx].ctl_tx.lock() = Some(tx);
    inner.workers[idx].set_status(WorkerStatus::Active);
    inner.workers_up.fetch_add(1, Ordering::SeqCst);

    let inner_task = inner.clone();
    let handle = tokio::spawn(async move { run_worker(inner_task, idx as u32, rx).await });

    // handle.lock() would deadlock if called from within an async context
    // already holding it; this path only runs from `new`/`calibrate`, never
    // from inside the worker task itself.
    if let Ok(mut guard) = inner.workers[idx].handle.try_lock() {
        *guard = Some(handle);
    }
}

async fn run_worker<T: Send + 'static>(inner: Arc<Inner<T>>, idx: u32, mut ctl_rx: watch::Receiver<Signal>) {
    inner.metrics.worker_init(idx);
    tracing::debug!(worker = idx, "worker started");

    loop {
        tokio::select! {
            biased;
            changed = ctl_rx.changed() => {
                if changed.is_err() {
                    return;
                }
                let sig = *ctl_rx.borrow();
                match sig {
                    Signal::Sleep => {
                        inner.workers[idx as usize].set_status(WorkerStatus::Sleep);
                        inner.metrics.worker_sleep(idx);
                        if !wait_for_wakeup(&inner, idx, &mut ctl_rx).await {
                            return;
                        }
                    }
                    Signal::Stop => {
                        inner.metrics.worker_stop(idx, false, "active");
                        inner.workers_up.fetch_sub(1, Ordering::SeqCst);
                        inner.workers[idx as usize].set_status(WorkerStatus::Idle);
                        return;
                    }
                    Signal::ForceStop => {
                        inner.metrics.worker_stop(idx, true, "active");
                        inner.workers_up.fetch_sub(1, Ordering::SeqCst);
                        inner.workers[idx as usize].set_status(WorkerStatus::Idle);
                        return;
                    }
                    Signal::Init | Signal::Wakeup => {}
                }
            }
            maybe_item = inner.engine.dequeue() => {
                match maybe_item {
                    None => {
                        inner.metrics.worker_stop(idx, true, "active");
                        inner.workers[idx as usize].set_status(WorkerStatus::Idle);
                        return;
                    }
                    Some(item) => process_item(&inner, idx, item, &mut ctl_rx).await,
                }
            }
        }
    }
}

/// Returns `false` if the worker should exit (stopped while asleep).
async fn wait_for_wakeup<T: Send + 'static>(
    inner: &Arc<Inner<T>>,
    idx: u32,
    ctl_rx: &mut watch::Receiver<Signal>,
) -> bool {
    loop {
        if ctl_rx.changed().await.is_err() {
            return false;
        }
        match *ctl_rx.borrow() {
            Signal::Wakeup => {
                inner.workers[idx as usize].set_status(WorkerStatus::Active);
                inner.metrics.worker_wakeup(idx);
                return true;
            }
            Signal::Stop | Signal::ForceStop => {
                inner.metrics.worker_stop(idx, true, "sleep");
                inner.workers_up.fetch_sub(1, Ordering::SeqCst);
                inner.workers[idx as usize].set_status(WorkerStatus::Idle);
                return false;
            }
            Signal::Init | Signal::Sleep => continue,
        }
    }
}

async fn process_item<T: Send + 'static>(
    inner: &Arc<Inner<T>>,
    idx: u32,
    mut item: Item<T>,
    ctl_rx: &mut watch::Receiver<Signal>,
) {
    let now = inner.clock.now();
    if item.is_past_deadline(now) {
        inner.metrics.queue_deadline();
        tracing::warn!(worker = idx, "item missed its deadline");
        if inner.deadline_to_dlq {
            spill(inner, item.payload).await;
        }
        return;
    }

    inner.metrics.queue_pull();

    if item.has_delay() {
        let now = inner.clock.now();
        if item.delay_at_ns > now {
            let wait = Duration::from_nanos((item.delay_at_ns - now) as u64);
            inner.metrics.worker_wait(idx, wait);
            tokio::select! {
                _ = tokio::time::sleep(wait) => {}
                changed = ctl_rx.changed() => {
                    if changed.is_ok() && matches!(*ctl_rx.borrow(), Signal::ForceStop) {
                        if let EnqueueOutcome::Rejected(_) = inner.engine.enqueue(item, true).await {
                            inner.metrics.queue_lost();
                        }
                        return;
                    }
                }
            }
        }
    }

    match inner.worker_impl.do_work(&item.payload).await {
        Ok(()) => {}
        Err(e) if item.retries < inner.max_retries => {
            let delay = inner.jitter.apply(inner.backoff.next(inner.retry_interval, item.retries));
            tracing::debug!(worker = idx, retries = item.retries, ?delay, error = %e, "retrying item");
            inner.metrics.worker_wait(idx, delay);
            let forced = tokio::select! {
                _ = tokio::time::sleep(delay) => false,
                changed = ctl_rx.changed() => changed.is_ok() && matches!(*ctl_rx.borrow(), Signal::ForceStop),
            };
            if forced {
                if let EnqueueOutcome::Rejected(_) = inner.engine.enqueue(item, true).await {
                    inner.metrics.queue_lost();
                }
                return;
            }
            item.retries += 1;
            item.delay_at_ns = 0;
            inner.metrics.queue_retry(delay);
            if let EnqueueOutcome::Rejected(_) = inner.engine.enqueue(item, true).await {
                inner.metrics.queue_lost();
            }
        }
        Err(e) => {
            tracing::warn!(worker = idx, error = %e, "item failed, retries exhausted");
            if inner.fail_to_dlq {
                inner.metrics.queue_leak(LeakDirection::Front);
                spill(inner, item.payload).await;
            } else {
                inner.metrics.queue_lost();
            }
        }
    }
}

async fn spill<T: Send + 'static>(inner: &Arc<Inner<T>>, payload: T) {
    if inner.dlq.enqueue(payload).await.is_err() {
        inner.metrics.queue_lost();
    }
}

/// Rear: the just-rejected incoming item is the one that leaks. Front:
/// best-effort eviction of an already-queued item to make room, bounded by
/// `front_leak_attempts`, falling back to leaking the incoming item if no
/// room opens up.
async fn leak<T: Send + 'static>(inner: &Arc<Inner<T>>, item: Item<T>) {
    match inner.leak_direction {
        LeakDirectionCfg::Rear => {
            inner.metrics.queue_leak(LeakDirection::Rear);
            spill(inner, item.payload).await;
        }
        LeakDirectionCfg::Front => {
            inner.metrics.queue_leak(LeakDirection::Front);
            let mut pending = item;
            for _ in 0..inner.front_leak_attempts {
                let evicted = tokio::select! {
                    biased;
                    evicted = inner.engine.dequeue() => evicted,
                    _ = tokio::task::yield_now() => None,
                };
                let Some(evicted) = evicted else { break };
                spill(inner, evicted.payload).await;
                match inner.engine.enqueue(pending, false).await {
                    EnqueueOutcome::Accepted => return,
                    EnqueueOutcome::Rejected(item) => pending = item,
                }
            }
            spill(inner, pending.payload).await;
        }
    }
}

/// Runs one calibration pass (SPEC_FULL.md §4.1): reap expired sleepers,
/// re-evaluate the time-of-day schedule, then scale workers up or down
/// based on `rate = size/capacity`.
async fn calibrate<T: Send + 'static>(inner: &Arc<Inner<T>>) {
    if inner.calibration_lock.swap(true, Ordering::AcqRel) {
        return;
    }
    inner.spinlock.store(0, Ordering::SeqCst);

    let now = inner.clock.now();
    for (idx, slot) in inner.workers.iter().enumerate() {
        if slot.status() == WorkerStatus::Sleep {
            let since = now - slot.last_signal_ts.load(Ordering::SeqCst);
            if since >= inner.sleep_interval.as_nanos() as i64 {
                send_signal(inner, idx, Signal::Stop);
            }
        }
    }

    let (params, new_id) = {
        let mut sched = inner.schedule.lock();
        match sched.as_mut() {
            Some(s) => s.get(),
            None => (None, -1),
        }
    };
    let prev_id = inner.sched_id.swap(new_id, Ordering::SeqCst);
    if prev_id != new_id {
        if let Some(p) = params {
            inner.workers_min.store(p.workers_min as u64, Ordering::SeqCst);
            inner.workers_max.store(p.workers_max as u64, Ordering::SeqCst);
            *inner.thresholds.lock() = (p.wakeup_factor, p.sleep_factor);
        }
        let new_max = inner.workers_max.load(Ordering::SeqCst) as usize;
        for (idx, slot) in inner.workers.iter().enumerate().skip(new_max) {
            if slot.status() != WorkerStatus::Idle {
                send_signal(inner, idx, Signal::Stop);
            }
        }
        let new_min = inner.workers_min.load(Ordering::SeqCst);
        while inner.workers_up.load(Ordering::SeqCst) < new_min {
            let Some(idx) = inner.workers.iter().position(|s| s.status() == WorkerStatus::Idle) else {
                break;
            };
            start_worker(inner, idx);
        }
        tracing::debug!(sched_id = new_id, "schedule rule changed");
    }

    let rate = inner.engine.cap().max(1);
    let rate = inner.engine.size() as f64 / rate as f64;
    let status = inner.status();

    if rate == 0.0 && status == Status::Close {
        for (idx, slot) in inner.workers.iter().enumerate() {
            if slot.status() != WorkerStatus::Idle {
                send_signal(inner, idx, Signal::ForceStop);
            }
        }
    } else {
        let (wakeup_factor, sleep_factor) = *inner.thresholds.lock();
        if rate as f32 >= wakeup_factor {
            wake_one(inner);
        } else if rate as f32 <= sleep_factor {
            sleep_some(inner);
        }

        if rate >= 1.0 {
            inner.status.store(Status::Throttle as u8, Ordering::SeqCst);
        } else if status == Status::Throttle {
            inner.status.store(Status::Active as u8, Ordering::SeqCst);
        }
    }

    tracing::debug!(rate, "calibration tick");
    inner.calibration_lock.store(false, Ordering::Release);
}

/// Wakes exactly one worker: a sleeping one if any exist, otherwise starts
/// an idle slot, never exceeding `workers_max`. One-at-a-time by design —
/// see SPEC_FULL.md §4.1's "why one-at-a-time wake".
fn wake_one<T: Send + 'static>(inner: &Arc<Inner<T>>) {
    let max = inner.workers_max.load(Ordering::SeqCst) as usize;
    if inner.workers_up.load(Ordering::SeqCst) as usize >= max {
        return;
    }
    if let Some(idx) = inner.workers[..max.min(inner.workers.len())]
        .iter()
        .position(|s| s.status() == WorkerStatus::Sleep)
    {
        send_signal(inner, idx, Signal::Wakeup);
        return;
    }
    if let Some(idx) = inner.workers[..max.min(inner.workers.len())]
        .iter()
        .position(|s| s.status() == WorkerStatus::Idle)
    {
        start_worker(inner, idx);
    }
}

/// Sends `min(workers_up / 2, sleep_threshold)` active workers to sleep,
/// picking from the high-index end, never dropping below `workers_min`.
fn sleep_some<T: Send + 'static>(inner: &Arc<Inner<T>>) {
    let min = inner.workers_min.load(Ordering::SeqCst);
    let up = inner.workers_up.load(Ordering::SeqCst);
    if up <= min {
        return;
    }
    let budget = ((up / 2).min(inner.sleep_threshold as u64)).min(up - min);
    let mut sent = 0u64;
    for (idx, slot) in inner.workers.iter().enumerate().rev() {
        if sent >= budget {
            break;
        }
        if slot.status() == WorkerStatus::Active {
            send_signal(inner, idx, Signal::Sleep);
            sent += 1;
        }
    }
}
