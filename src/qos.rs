//! Quality-of-Service sub-queue configuration: named priority sub-queues
//! with per-queue capacity and ingress/egress weights, and the discipline
//! (`PQ`/`RR`/`WRR`) egress workers use to drain them. Mirrors the
//! `qos.Config` builder of the original source.

use crate::error::ConfigError;

const RESERVED_INGRESS: &str = "ingress";
const RESERVED_EGRESS: &str = "egress";

const DEFAULT_EGRESS_CAPACITY: u64 = 64;
const DEFAULT_EGRESS_WORKERS: u32 = 1;

/// Egress dispatch discipline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QosAlgo {
    /// Strict priority: always try sub-queue 0 first, falling through in order.
    Pq,
    /// Plain round-robin across sub-queues, ignoring weight.
    Rr,
    /// Weighted round-robin: sub-queues with a larger egress weight are
    /// visited proportionally more often.
    Wrr,
}

/// Evaluates the priority percent (1..100) of a payload, used to route it to
/// an ingress sub-queue. The core clamps out-of-range results.
pub trait PriorityEvaluator<T>: Send + Sync {
    fn eval(&self, payload: &T) -> u32;
}

/// A single named sub-queue: its bounded capacity, and its ingress/egress
/// weights (how much traffic it should receive, and how often egress
/// workers should favor it under WRR).
#[derive(Debug, Clone)]
pub struct QosQueue {
    pub name: String,
    pub capacity: u64,
    pub ingress_weight: u64,
    pub egress_weight: u64,
}

impl QosQueue {
    pub fn new(name: impl Into<String>, capacity: u64, weight: u64) -> Self {
        Self {
            name: name.into(),
            capacity,
            ingress_weight: weight,
            egress_weight: weight,
        }
    }

    pub fn with_egress_weight(mut self, weight: u64) -> Self {
        self.egress_weight = weight;
        self
    }
}

/// Builder for a validated QoS configuration. Mirrors
/// `qos::Config::new(algo, eval).add_queue(...).validate()` in the source.
pub struct QosConfig<T> {
    pub algo: QosAlgo,
    pub egress_capacity: u64,
    pub egress_workers: u32,
    pub evaluator: std::sync::Arc<dyn PriorityEvaluator<T>>,
    pub queues: Vec<QosQueue>,
}

impl<T> QosConfig<T> {
    pub fn new(algo: QosAlgo, evaluator: std::sync::Arc<dyn PriorityEvaluator<T>>) -> Self {
        Self {
            algo,
            egress_capacity: DEFAULT_EGRESS_CAPACITY,
            egress_workers: DEFAULT_EGRESS_WORKERS,
            evaluator,
            queues: Vec::new(),
        }
    }

    pub fn set_egress_capacity(mut self, capacity: u64) -> Self {
        self.egress_capacity = capacity;
        self
    }

    pub fn set_egress_workers(mut self, workers: u32) -> Self {
        self.egress_workers = workers;
        self
    }

    pub fn add_queue(mut self, queue: QosQueue) -> Self {
        self.queues.push(queue);
        self
    }

    /// Validates the configuration, filling in defaults for zeroed optional
    /// fields. Returns the sub-queue index -> percent-slot mapping the PQ
    /// engine needs (see [`build_priority_tables`]).
    pub fn validate(&mut self) -> Result<(), ConfigError> {
        if self.egress_capacity == 0 {
            self.egress_capacity = DEFAULT_EGRESS_CAPACITY;
        }
        if self.egress_workers == 0 {
            self.egress_workers = DEFAULT_EGRESS_WORKERS;
        }
        if self.queues.is_empty() {
            return Err(ConfigError::NoSubQueues);
        }
        if self.queues.len() == 1 {
            return Err(ConfigError::SenselessQos);
        }
        for q in &self.queues {
            if q.name == RESERVED_INGRESS {
                return Err(ConfigError::ReservedName(q.name.clone()));
            }
            if q.name == RESERVED_EGRESS {
                return Err(ConfigError::ReservedName(q.name.clone()));
            }
            if q.capacity == 0 {
                return Err(ConfigError::NoSubQueueCapacity(q.name.clone()));
            }
            if q.ingress_weight == 0 {
                return Err(ConfigError::NoSubQueueWeight(q.name.clone()));
            }
        }
        Ok(())
    }

    /// Total capacity: egress plus every sub-queue's capacity. Under QoS
    /// this is what `Queue::capacity()` reports.
    pub fn summing_capacity(&self) -> u64 {
        self.egress_capacity + self.queues.iter().map(|q| q.capacity).sum::<u64>()
    }
}

/// `ingress_prior[p]` maps a clamped priority percent (0-indexed, so slot
/// `p` corresponds to percent `p+1`) to a sub-queue index.
/// `egress_prior[i]` is the WRR schedule: a 100-slot wrap-filled table of
/// sub-queue indices visited proportionally to `egress_weight`.
#[derive(Debug, Clone)]
pub struct PriorityTables {
    pub ingress: [u32; 100],
    pub egress: [u32; 100],
}

/// Builds the ingress and (WRR) egress priority tables for a validated QoS
/// config, per SPEC_FULL.md §4.2:
///
/// - `ingress_prior`: proportional to each sub-queue's ingress weight; queue
///   `i` gets `ceil(w_i / W * 100)` consecutive slots.
/// - `egress_prior` (WRR): let `m` be the minimum egress weight; queue `i`
///   contributes `round(w_i / m)` copies, wrap-filled to exactly 100 slots.
pub fn build_priority_tables<T>(cfg: &QosConfig<T>) -> PriorityTables {
    let mut ingress = [0u32; 100];
    let total_weight: u64 = cfg.queues.iter().map(|q| q.ingress_weight).sum();
    let mut slot = 0usize;
    for (i, q) in cfg.queues.iter().enumerate() {
        if slot >= 100 {
            break;
        }
        let share = if total_weight == 0 {
            0.0
        } else {
            q.ingress_weight as f64 / total_weight as f64 * 100.0
        };
        let mut count = share.ceil() as usize;
        if i == cfg.queues.len() - 1 {
            count = 100 - slot;
        }
        let end = (slot + count).min(100);
        for s in ingress.iter_mut().take(end).skip(slot) {
            *s = i as u32;
        }
        slot = end;
    }
    // Any unfilled trailing slots (rounding slack) fall back to the last queue.
    if slot < 100 {
        let last = (cfg.queues.len() - 1) as u32;
        for s in ingress.iter_mut().skip(slot) {
            *s = last;
        }
    }

    let mut egress = [0u32; 100];
    let min_weight = cfg.queues.iter().map(|q| q.egress_weight).min().unwrap_or(1).max(1);
    let mut entries: Vec<u32> = Vec::with_capacity(100);
    for (i, q) in cfg.queues.iter().enumerate() {
        let copies = ((q.egress_weight as f64 / min_weight as f64).round() as usize).max(1);
        entries.extend(std::iter::repeat(i as u32).take(copies));
    }
    if entries.is_empty() {
        entries.push(0);
    }
    for (i, slot) in egress.iter_mut().enumerate() {
        *slot = entries[i % entries.len()];
    }

    PriorityTables { ingress, egress }
}

/// Clamps a raw priority percent into `[1, 100]`, then converts to the
/// 0-indexed table slot.
pub fn clamp_priority_slot(raw: u32) -> usize {
    raw.clamp(1, 100) as usize - 1
}

#[cfg(test)]
mod tests {
    use super::*;

    struct AlwaysFifty;
    impl PriorityEvaluator<u32> for AlwaysFifty {
        fn eval(&self, _payload: &u32) -> u32 {
            50
        }
    }

    fn cfg() -> QosConfig<u32> {
        let mut c = QosConfig::new(QosAlgo::Wrr, std::sync::Arc::new(AlwaysFifty));
        c = c.add_queue(QosQueue::new("high", 10, 120));
        c = c.add_queue(QosQueue::new("med", 10, 400));
        c = c.add_queue(QosQueue::new("low", 10, 1200));
        c
    }

    #[test]
    fn rejects_single_queue_as_senseless() {
        let mut c = QosConfig::new(QosAlgo::Pq, std::sync::Arc::new(AlwaysFifty));
        c = c.add_queue(QosQueue::new("only", 10, 1));
        assert_eq!(c.validate(), Err(ConfigError::SenselessQos));
    }

    #[test]
    fn rejects_reserved_names() {
        let mut c = QosConfig::new(QosAlgo::Pq, std::sync::Arc::new(AlwaysFifty));
        c = c.add_queue(QosQueue::new("ingress", 10, 1));
        c = c.add_queue(QosQueue::new("b", 10, 1));
        assert!(matches!(c.validate(), Err(ConfigError::ReservedName(_))));
    }

    #[test]
    fn priority_tables_cover_every_slot_within_bounds() {
        let mut c = cfg();
        c.validate().unwrap();
        let tables = build_priority_tables(&c);
        for &idx in tables.ingress.iter() {
            assert!((idx as usize) < c.queues.len());
        }
        for &idx in tables.egress.iter() {
            assert!((idx as usize) < c.queues.len());
        }
    }

    #[test]
    fn ingress_table_is_proportional_to_weight() {
        // weights 120 : 400 : 1200, total 1720 -> shares ~7%, 23.3%, 69.8%
        let mut c = cfg();
        c.validate().unwrap();
        let tables = build_priority_tables(&c);
        let count = |idx: u32| tables.ingress.iter().filter(|&&x| x == idx).count();
        assert!(count(0) <= count(1));
        assert!(count(1) <= count(2));
    }

    #[test]
    fn clamp_priority_slot_handles_boundaries() {
        assert_eq!(clamp_priority_slot(0), 0);
        assert_eq!(clamp_priority_slot(1), 0);
        assert_eq!(clamp_priority_slot(100), 99);
        assert_eq!(clamp_priority_slot(255), 99);
    }
}
