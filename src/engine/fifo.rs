use super::{Engine, EnqueueOutcome};
use crate::item::Item;
use async_trait::async_trait;
use tokio::sync::{mpsc, Mutex};

/// Single bounded channel. The simplest engine: one producer-facing sender,
/// one consumer-facing receiver shared (via a mutex) across worker tasks.
pub struct FifoEngine<T> {
    tx: mpsc::Sender<Item<T>>,
    rx: Mutex<mpsc::Receiver<Item<T>>>,
    capacity: u64,
}

impl<T: Send + 'static> FifoEngine<T> {
    pub fn new(capacity: u64) -> Self {
        let (tx, rx) = mpsc::channel(capacity.max(1) as usize);
        Self {
            tx,
            rx: Mutex::new(rx),
            capacity,
        }
    }
}

#[async_trait]
impl<T: Send + 'static> Engine<T> for FifoEngine<T> {
    async fn enqueue(&self, item: Item<T>, blocking: bool) -> EnqueueOutcome<T> {
        if blocking {
            match self.tx.send(item).await {
                Ok(()) => EnqueueOutcome::Accepted,
                Err(e) => EnqueueOutcome::Rejected(e.0),
            }
        } else {
            match self.tx.try_send(item) {
                Ok(()) => EnqueueOutcome::Accepted,
                Err(mpsc::error::TrySendError::Full(item)) => EnqueueOutcome::Rejected(item),
                Err(mpsc::error::TrySendError::Closed(item)) => EnqueueOutcome::Rejected(item),
            }
        }
    }

    async fn dequeue(&self) -> Option<Item<T>> {
        self.rx.lock().await.recv().await
    }

    fn size(&self) -> u64 {
        self.tx.max_capacity() as u64 - self.tx.capacity() as u64
    }

    fn cap(&self) -> u64 {
        self.capacity
    }

    async fn close(&self, _force: bool) {
        self.rx.lock().await.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn enqueue_then_dequeue_preserves_order() {
        let e = FifoEngine::new(4);
        for i in 0..4 {
            matches!(e.enqueue(Item::new(i), false).await, EnqueueOutcome::Accepted);
        }
        for i in 0..4 {
            let item = e.dequeue().await.unwrap();
            assert_eq!(item.payload, i);
        }
    }

    #[tokio::test]
    async fn non_blocking_enqueue_rejects_when_full() {
        let e = FifoEngine::new(1);
        assert!(matches!(e.enqueue(Item::new(1), false).await, EnqueueOutcome::Accepted));
        assert!(matches!(e.enqueue(Item::new(2), false).await, EnqueueOutcome::Rejected(_)));
    }
}
