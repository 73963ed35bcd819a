//! Dead-letter queue collaborator contract. The core never loses the whole
//! queue over a DLQ failure: a failed `enqueue` is counted as `queue_lost`
//! and otherwise ignored.

use async_trait::async_trait;
use parking_lot::Mutex;

/// Accepts items the main queue could not (leaked or retry-exhausted).
#[async_trait]
pub trait Dlq<T>: Send + Sync {
    async fn enqueue(&self, payload: T) -> Result<(), anyhow::Error>;
    fn size(&self) -> u64;
    fn capacity(&self) -> u64;
    fn rate(&self) -> f32 {
        let cap = self.capacity();
        if cap == 0 {
            0.0
        } else {
            self.size() as f32 / cap as f32
        }
    }
    async fn close(&self) -> Result<(), anyhow::Error> {
        Ok(())
    }
}

/// A DLQ that discards everything. Useful for queues that want leak
/// tolerance without caring where the leaked items go.
#[derive(Debug, Default, Clone, Copy)]
pub struct DummyDlq;

#[async_trait]
impl<T: Send + 'static> Dlq<T> for DummyDlq {
    async fn enqueue(&self, _payload: T) -> Result<(), anyhow::Error> {
        Ok(())
    }
    fn size(&self) -> u64 {
        0
    }
    fn capacity(&self) -> u64 {
        0
    }
    fn rate(&self) -> f32 {
        0.0
    }
}

/// An in-memory, unbounded DLQ backed by a `Vec`, handy for tests that want
/// to assert on exactly which items leaked.
#[derive(Debug, Default)]
pub struct VecDlq<T> {
    items: Mutex<Vec<T>>,
}

impl<T> VecDlq<T> {
    pub fn new() -> Self {
        Self {
            items: Mutex::new(Vec::new()),
        }
    }

    pub fn drain(&self) -> Vec<T> {
        std::mem::take(&mut self.items.lock())
    }

    pub fn len(&self) -> usize {
        self.items.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl<T: Send + 'static> Dlq<T> for VecDlq<T> {
    async fn enqueue(&self, payload: T) -> Result<(), anyhow::Error> {
        self.items.lock().push(payload);
        Ok(())
    }
    fn size(&self) -> u64 {
        self.items.lock().len() as u64
    }
    fn capacity(&self) -> u64 {
        u64::MAX
    }
}
