use super::{Engine, EnqueueOutcome};
use crate::item::Item;
use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::{mpsc, Mutex};

/// `N` sub-channels of equal capacity, reducing contention versus a single
/// shared channel. Two independent round-robin counters pick the
/// sub-channel for enqueue and dequeue respectively; neither selects across
/// all of them, matching the original design's single-shard-per-call shape.
pub struct PfifoEngine<T> {
    streams: Vec<(mpsc::Sender<Item<T>>, Mutex<mpsc::Receiver<Item<T>>>)>,
    stream_capacity: u64,
    enqueue_rr: AtomicU64,
    dequeue_rr: AtomicU64,
}

impl<T: Send + 'static> PfifoEngine<T> {
    pub fn new(capacity: u64, streams: u32) -> Self {
        let n = streams.max(1) as u64;
        let per_stream = (capacity.max(1) / n).max(1);
        let streams = (0..n)
            .map(|_| {
                let (tx, rx) = mpsc::channel(per_stream as usize);
                (tx, Mutex::new(rx))
            })
            .collect();
        Self {
            streams,
            stream_capacity: per_stream,
            enqueue_rr: AtomicU64::new(0),
            dequeue_rr: AtomicU64::new(0),
        }
    }

    fn next_enqueue_index(&self) -> usize {
        (self.enqueue_rr.fetch_add(1, Ordering::Relaxed) % self.streams.len() as u64) as usize
    }

    fn next_dequeue_index(&self) -> usize {
        (self.dequeue_rr.fetch_add(1, Ordering::Relaxed) % self.streams.len() as u64) as usize
    }
}

#[async_trait]
impl<T: Send + 'static> Engine<T> for PfifoEngine<T> {
    async fn enqueue(&self, item: Item<T>, blocking: bool) -> EnqueueOutcome<T> {
        let idx = self.next_enqueue_index();
        let tx = &self.streams[idx].0;
        if blocking {
            match tx.send(item).await {
                Ok(()) => EnqueueOutcome::Accepted,
                Err(e) => EnqueueOutcome::Rejected(e.0),
            }
        } else {
            match tx.try_send(item) {
                Ok(()) => EnqueueOutcome::Accepted,
                Err(mpsc::error::TrySendError::Full(item)) => EnqueueOutcome::Rejected(item),
                Err(mpsc::error::TrySendError::Closed(item)) => EnqueueOutcome::Rejected(item),
            }
        }
    }

    async fn dequeue(&self) -> Option<Item<T>> {
        let idx = self.next_dequeue_index();
        self.streams[idx].1.lock().await.recv().await
    }

    async fn dequeue_sub(&self, index: usize) -> Option<Item<T>> {
        self.streams.get(index)?.1.lock().await.try_recv().ok()
    }

    fn size(&self) -> u64 {
        self.streams
            .iter()
            .map(|(tx, _)| tx.max_capacity() as u64 - tx.capacity() as u64)
            .sum()
    }

    fn cap(&self) -> u64 {
        self.stream_capacity * self.streams.len() as u64
    }

    async fn close(&self, _force: bool) {
        for (_, rx) in &self.streams {
            rx.lock().await.close();
        }
    }
}
