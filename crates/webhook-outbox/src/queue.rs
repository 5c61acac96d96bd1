//! FIFO queue of chunks awaiting delivery.

use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Shared delivery queue.
///
/// Chunks are appended at the tail; the head is removed only after it has
/// been delivered.
#[derive(Debug, Clone, Default)]
pub struct DeliveryQueue {
    inner: Arc<Mutex<VecDeque<String>>>,
}

impl DeliveryQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn push(&self, chunk: String) {
        self.inner.lock().await.push_back(chunk);
    }

    /// Copy of the head chunk.
    pub async fn front(&self) -> Option<String> {
        self.inner.lock().await.front().cloned()
    }

    pub async fn pop_front(&self) -> Option<String> {
        self.inner.lock().await.pop_front()
    }

    pub async fn len(&self) -> usize {
        self.inner.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.lock().await.is_empty()
    }

    /// All queued chunks, head first.
    pub async fn snapshot(&self) -> Vec<String> {
        self.inner.lock().await.iter().cloned().collect()
    }
}
