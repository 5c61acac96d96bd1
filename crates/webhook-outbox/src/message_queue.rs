//! Coalescing message queue.

use crate::sender::Sender;
use crate::OutboxResult;
use fence_splitter::{normalize_seams, BalancedSplitter, Splitter};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

/// Turns pending text into deliverable chunks.
#[derive(Debug, Clone, Copy)]
pub struct BatchFormatter {
    splitter: Splitter,
    balanced: BalancedSplitter,
}

impl BatchFormatter {
    pub fn new(max_chunk_len: usize) -> OutboxResult<Self> {
        Ok(Self {
            splitter: Splitter::new(max_chunk_len)?,
            balanced: BalancedSplitter::new(max_chunk_len)?,
        })
    }

    pub fn max_chunk_len(&self) -> usize {
        self.splitter.max_len()
    }

    /// Pieces an incoming text is stored as.
    pub fn pieces(&self, text: &str) -> Vec<String> {
        if self.splitter.fits(text) {
            vec![text.to_string()]
        } else {
            self.splitter.split(text)
        }
    }

    /// Join a batch, merge adjacent fenced payloads and split the result
    /// into chunks that each fit and keep their fences balanced.
    pub fn format(&self, pending: &[String]) -> Vec<String> {
        let joined = pending.join("\n");
        let normalized = normalize_seams(&joined);

        if normalized.is_empty() {
            Vec::new()
        } else if self.splitter.fits(&normalized) {
            vec![normalized.into_owned()]
        } else {
            self.balanced.split(&normalized)
        }
    }
}

/// Collects text between flushes and hands formatted chunks to the
/// [`Sender`].
pub struct MessageQueue {
    pending: Mutex<Vec<String>>,
    formatter: BatchFormatter,
    sender: Arc<Sender>,
}

impl MessageQueue {
    pub fn new(sender: Arc<Sender>, max_chunk_len: usize) -> OutboxResult<Self> {
        Ok(Self {
            pending: Mutex::new(Vec::new()),
            formatter: BatchFormatter::new(max_chunk_len)?,
            sender,
        })
    }

    /// Buffer `text` for the next flush. Empty text is ignored.
    pub async fn add(&self, text: &str) {
        if text.is_empty() {
            return;
        }
        let pieces = self.formatter.pieces(text);
        self.pending.lock().await.extend(pieces);
    }

    pub async fn pending_len(&self) -> usize {
        self.pending.lock().await.len()
    }

    /// Drain the buffer and enqueue its chunks for delivery.
    ///
    /// Returns the number of chunks enqueued.
    pub async fn flush(&self) -> usize {
        let batch = std::mem::take(&mut *self.pending.lock().await);
        if batch.is_empty() {
            return 0;
        }

        let chunks = self.formatter.format(&batch);
        let count = chunks.len();
        for chunk in chunks {
            self.sender.add(chunk).await;
        }

        if count > 0 {
            debug!(entries = batch.len(), chunks = count, "Flushed message queue");
        }
        count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::{WebhookResponse, WebhookTransport};
    use crate::SenderConfig;
    use async_trait::async_trait;
    use fence_splitter::ends_inside_fence;

    struct NoopTransport;

    #[async_trait]
    impl WebhookTransport for NoopTransport {
        async fn post(&self, _content: &str) -> OutboxResult<WebhookResponse> {
            Ok(WebhookResponse {
                status: 204,
                body: String::new(),
            })
        }
    }

    fn queue(max_len: usize) -> (MessageQueue, Arc<Sender>) {
        let sender = Arc::new(Sender::new(Arc::new(NoopTransport), SenderConfig::default()));
        (MessageQueue::new(sender.clone(), max_len).unwrap(), sender)
    }

    #[test]
    fn formatter_rejects_tiny_limit() {
        assert!(BatchFormatter::new(10).is_err());
    }

    #[test]
    fn format_single_short_entry_unchanged() {
        let formatter = BatchFormatter::new(1900).unwrap();
        assert_eq!(formatter.format(&["hello".to_string()]), vec!["hello".to_string()]);
    }

    #[test]
    fn format_merges_fenced_entries() {
        let formatter = BatchFormatter::new(1900).unwrap();
        let chunks = formatter.format(&["```js\na\n```".to_string(), "```js\nb\n```".to_string()]);
        assert_eq!(chunks, vec!["```js\na\nb\n```".to_string()]);
    }

    #[test]
    fn format_long_batch_is_bounded_and_balanced() {
        let formatter = BatchFormatter::new(200).unwrap();
        let entries: Vec<String> = (0..50)
            .map(|i| format!("```js\nconsole.log({i})\n```"))
            .collect();
        let chunks = formatter.format(&entries);

        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert!(chunk.chars().count() <= 200);
            assert!(!ends_inside_fence(chunk));
        }
    }

    #[test]
    fn format_plain_batch_cuts_at_full_length() {
        let formatter = BatchFormatter::new(1900).unwrap();
        let chunks = formatter.format(&formatter.pieces(&"y".repeat(3000)));
        let lengths: Vec<usize> = chunks.iter().map(|c| c.chars().count()).collect();
        assert_eq!(lengths, vec![1900, 1101]);
    }

    #[tokio::test]
    async fn add_then_flush_yields_one_chunk() {
        let (queue, sender) = queue(1900);
        queue.add("a log line").await;

        assert_eq!(queue.flush().await, 1);
        assert_eq!(
            sender.queue().snapshot().await,
            vec!["a log line".to_string()]
        );
        assert_eq!(queue.pending_len().await, 0);
    }

    #[tokio::test]
    async fn entries_joined_with_newline() {
        let (queue, sender) = queue(1900);
        queue.add("one").await;
        queue.add("two").await;
        queue.flush().await;
        assert_eq!(sender.queue().snapshot().await, vec!["one\ntwo".to_string()]);
    }

    #[tokio::test]
    async fn empty_text_ignored() {
        let (queue, sender) = queue(1900);
        queue.add("").await;
        assert_eq!(queue.pending_len().await, 0);
        assert_eq!(queue.flush().await, 0);
        assert!(sender.queue().is_empty().await);
    }

    #[tokio::test]
    async fn oversized_text_pre_split() {
        let (queue, sender) = queue(100);
        queue.add(&"x".repeat(250)).await;
        assert_eq!(queue.pending_len().await, 3);

        queue.flush().await;
        let chunks = sender.queue().snapshot().await;
        assert!(chunks.iter().all(|c| c.chars().count() <= 100));
        let rejoined: String = chunks.concat().replace('\n', "");
        assert_eq!(rejoined, "x".repeat(250));
    }

    #[tokio::test]
    async fn flush_of_empty_buffer_is_noop() {
        let (queue, sender) = queue(1900);
        assert_eq!(queue.flush().await, 0);
        assert_eq!(sender.pending().await, 0);
    }
}
