//! Background tasks driving the relay pipeline.

use crate::limiter::Limiter;
use crate::message_queue::MessageQueue;
use crate::sender::{DeliveryOutcome, Sender, SenderConfig};
use crate::transport::WebhookTransport;
use crate::{OutboxError, OutboxResult};
use std::future::Future;
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tokio::time::{interval, Duration, MissedTickBehavior};
use tracing::{debug, info, trace};

/// Pipeline configuration.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// How often buffered text is flushed into the delivery queue.
    pub flush_interval: Duration,
    /// How often one delivery is attempted.
    pub delivery_interval: Duration,
    /// How often expired limiter entries are pruned.
    pub prune_interval: Duration,
    /// Inbound channel capacity.
    pub queue_capacity: usize,
    /// Maximum characters per delivered message.
    pub max_chunk_len: usize,
    /// Upper bound on a single webhook request.
    pub request_timeout: Duration,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            flush_interval: Duration::from_secs(1),
            delivery_interval: Duration::from_millis(1000),
            prune_interval: Duration::from_millis(100),
            queue_capacity: 100,
            max_chunk_len: fence_splitter::DEFAULT_MAX_CHUNK_LEN,
            request_timeout: Duration::from_secs(10),
        }
    }
}

/// Producer side of the pipeline. Cheap to clone.
#[derive(Debug, Clone)]
pub struct RelayInbox {
    tx: mpsc::Sender<String>,
}

impl RelayInbox {
    /// Queue text for relaying without waiting.
    ///
    /// Text is dropped when the inbound channel is full.
    pub fn enqueue(&self, text: impl Into<String>) -> OutboxResult<()> {
        match self.tx.try_send(text.into()) {
            Ok(()) => Ok(()),
            Err(mpsc::error::TrySendError::Full(dropped)) => {
                debug!(
                    chars = dropped.chars().count(),
                    "Inbound queue full, dropping message"
                );
                Ok(())
            }
            Err(mpsc::error::TrySendError::Closed(_)) => Err(OutboxError::Closed),
        }
    }

    /// Messages waiting in the inbound channel.
    pub fn backlog(&self) -> usize {
        self.tx.max_capacity() - self.tx.capacity()
    }
}

/// Relay pipeline state before its tasks are started.
pub struct RelayPipeline {
    config: PipelineConfig,
    sender: Arc<Sender>,
    message_queue: Arc<MessageQueue>,
}

impl RelayPipeline {
    pub fn new(transport: Arc<dyn WebhookTransport>, config: PipelineConfig) -> OutboxResult<Self> {
        Self::with_limiter(transport, Limiter::default(), config)
    }

    pub fn with_limiter(
        transport: Arc<dyn WebhookTransport>,
        limiter: Limiter,
        config: PipelineConfig,
    ) -> OutboxResult<Self> {
        let sender = Arc::new(Sender::with_limiter(
            transport,
            limiter,
            SenderConfig {
                request_timeout: config.request_timeout,
            },
        ));
        let message_queue = Arc::new(MessageQueue::new(sender.clone(), config.max_chunk_len)?);

        Ok(Self {
            config,
            sender,
            message_queue,
        })
    }

    /// Spawn the ingest, flush, delivery and prune tasks.
    pub fn start(self) -> PipelineHandle {
        let (tx, rx) = mpsc::channel(self.config.queue_capacity.max(1));
        let (shutdown_tx, _) = broadcast::channel(1);

        let mut tasks = Vec::with_capacity(4);
        tasks.push(spawn_ingest(
            rx,
            self.message_queue.clone(),
            shutdown_tx.subscribe(),
        ));

        let message_queue = self.message_queue.clone();
        tasks.push(spawn_periodic(
            "flush",
            self.config.flush_interval,
            shutdown_tx.subscribe(),
            move || {
                let message_queue = message_queue.clone();
                async move {
                    message_queue.flush().await;
                }
            },
        ));

        let sender = self.sender.clone();
        tasks.push(spawn_periodic(
            "delivery",
            self.config.delivery_interval,
            shutdown_tx.subscribe(),
            move || {
                let sender = sender.clone();
                async move {
                    if let DeliveryOutcome::Skipped(reason) = sender.deliver_next().await {
                        trace!(?reason, "Delivery tick skipped");
                    }
                }
            },
        ));

        let sender = self.sender.clone();
        tasks.push(spawn_periodic(
            "prune",
            self.config.prune_interval,
            shutdown_tx.subscribe(),
            move || {
                let sender = sender.clone();
                async move {
                    sender.prune_limiter().await;
                }
            },
        ));

        info!(
            flush_ms = self.config.flush_interval.as_millis() as u64,
            delivery_ms = self.config.delivery_interval.as_millis() as u64,
            max_chunk_len = self.config.max_chunk_len,
            "Relay pipeline started"
        );

        PipelineHandle {
            inbox: RelayInbox { tx },
            shutdown_tx,
            tasks,
            sender: self.sender,
            message_queue: self.message_queue,
        }
    }
}

/// Running pipeline.
pub struct PipelineHandle {
    inbox: RelayInbox,
    shutdown_tx: broadcast::Sender<()>,
    tasks: Vec<JoinHandle<()>>,
    sender: Arc<Sender>,
    message_queue: Arc<MessageQueue>,
}

impl PipelineHandle {
    pub fn inbox(&self) -> RelayInbox {
        self.inbox.clone()
    }

    /// Chunks waiting for delivery.
    pub async fn pending_deliveries(&self) -> usize {
        self.sender.pending().await
    }

    /// Whether every accepted message has been delivered.
    pub async fn is_drained(&self) -> bool {
        self.inbox.backlog() == 0
            && self.message_queue.pending_len().await == 0
            && self.sender.pending().await == 0
    }

    /// Stop all tasks and wait for them to finish.
    ///
    /// A request already in flight runs to completion; no new one starts.
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(());
        for task in self.tasks {
            if let Err(e) = task.await {
                debug!(error = %e, "Pipeline task ended abnormally");
            }
        }
        info!(
            undelivered = self.sender.pending().await,
            "Relay pipeline stopped"
        );
    }
}

fn spawn_ingest(
    mut rx: mpsc::Receiver<String>,
    message_queue: Arc<MessageQueue>,
    mut shutdown: broadcast::Receiver<()>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            tokio::select! {
                biased;
                _ = shutdown.recv() => break,
                received = rx.recv() => match received {
                    Some(text) => message_queue.add(&text).await,
                    None => break,
                },
            }
        }
        trace!("Ingest task stopped");
    })
}

/// Runs `tick` every `period` until shutdown. A tick always completes
/// before the next one starts.
fn spawn_periodic<F, Fut>(
    name: &'static str,
    period: Duration,
    mut shutdown: broadcast::Receiver<()>,
    mut tick: F,
) -> JoinHandle<()>
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    tokio::spawn(async move {
        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = shutdown.recv() => break,
                _ = ticker.tick() => tick().await,
            }
        }
        trace!(task = name, "Periodic task stopped");
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pipeline_config_default() {
        let config = PipelineConfig::default();
        assert_eq!(config.flush_interval, Duration::from_secs(1));
        assert_eq!(config.delivery_interval, Duration::from_millis(1000));
        assert_eq!(config.prune_interval, Duration::from_millis(100));
        assert_eq!(config.queue_capacity, 100);
        assert_eq!(config.max_chunk_len, 1900);
    }
}
