//! Rate-limited webhook sender.

use crate::error::ErrorDetail;
use crate::limiter::Limiter;
use crate::queue::DeliveryQueue;
use crate::transport::WebhookTransport;
use crate::{OutboxError, OutboxResult};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, error, trace, warn};

/// Sender configuration.
#[derive(Debug, Clone)]
pub struct SenderConfig {
    /// Upper bound on a single webhook request.
    pub request_timeout: Duration,
}

impl Default for SenderConfig {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(10),
        }
    }
}

/// Why a delivery tick did nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The limiter window is full.
    RateLimited,
    /// Nothing is queued.
    Empty,
}

/// Result of one delivery tick.
#[derive(Debug)]
pub enum DeliveryOutcome {
    /// The head chunk was accepted and removed.
    Delivered,
    /// No request was made.
    Skipped(SkipReason),
    /// The request failed; the head chunk stays queued.
    Failed(OutboxError),
}

impl DeliveryOutcome {
    pub fn is_delivered(&self) -> bool {
        matches!(self, Self::Delivered)
    }
}

/// Delivers queued chunks one at a time, in order.
///
/// Each call to [`Sender::deliver_next`] makes at most one request, for the
/// head of the queue. Successes and non-429 rejections are charged to the
/// limiter; 429s and transport failures are not.
pub struct Sender {
    queue: DeliveryQueue,
    limiter: Arc<Mutex<Limiter>>,
    transport: Arc<dyn WebhookTransport>,
    config: SenderConfig,
}

impl Sender {
    pub fn new(transport: Arc<dyn WebhookTransport>, config: SenderConfig) -> Self {
        Self::with_limiter(transport, Limiter::default(), config)
    }

    pub fn with_limiter(
        transport: Arc<dyn WebhookTransport>,
        limiter: Limiter,
        config: SenderConfig,
    ) -> Self {
        Self {
            queue: DeliveryQueue::new(),
            limiter: Arc::new(Mutex::new(limiter)),
            transport,
            config,
        }
    }

    /// Append a chunk to the delivery queue.
    pub async fn add(&self, chunk: String) {
        self.queue.push(chunk).await;
    }

    pub fn queue(&self) -> &DeliveryQueue {
        &self.queue
    }

    pub async fn pending(&self) -> usize {
        self.queue.len().await
    }

    /// Charges currently counted by the limiter.
    pub async fn charged(&self) -> usize {
        self.limiter.lock().await.len()
    }

    pub async fn prune_limiter(&self) -> usize {
        self.limiter.lock().await.prune()
    }

    /// Run one delivery tick.
    pub async fn deliver_next(&self) -> DeliveryOutcome {
        if !self.limiter.lock().await.remaining_capacity() {
            trace!("Limiter full, skipping delivery tick");
            return DeliveryOutcome::Skipped(SkipReason::RateLimited);
        }

        let Some(chunk) = self.queue.front().await else {
            return DeliveryOutcome::Skipped(SkipReason::Empty);
        };

        match self.post(&chunk).await {
            Ok(()) => {
                self.queue.pop_front().await;
                self.limiter.lock().await.charge();
                let pending = self.queue.len().await;
                debug!(chars = chunk.chars().count(), pending, "Message delivered");
                DeliveryOutcome::Delivered
            }
            Err(err) => {
                if err.charges_limiter() {
                    self.limiter.lock().await.charge();
                }
                report_failure(&err);
                DeliveryOutcome::Failed(err)
            }
        }
    }

    async fn post(&self, content: &str) -> OutboxResult<()> {
        let response =
            match tokio::time::timeout(self.config.request_timeout, self.transport.post(content))
                .await
            {
                Ok(result) => result?,
                Err(_) => {
                    return Err(OutboxError::Timeout(
                        self.config.request_timeout.as_millis() as u64,
                    ))
                }
            };

        if response.is_success() {
            return Ok(());
        }

        let detail = ErrorDetail::from_body(&response.body);
        if response.status == 429 {
            Err(OutboxError::RateLimited { detail })
        } else {
            Err(OutboxError::Rejected {
                status: response.status,
                detail,
            })
        }
    }
}

fn report_failure(err: &OutboxError) {
    match err {
        OutboxError::RateLimited { detail } => {
            warn!(
                status = 429,
                retry_after = ?detail.retry_after,
                detail = %detail,
                "Webhook rate limited us; local limiter is out of sync with the server"
            );
        }
        OutboxError::Rejected { status, detail } if matches!(status, 401 | 403 | 404) => {
            error!(
                status,
                detail = %detail,
                "Webhook rejected message; the webhook may be invalid or deleted, configure another one"
            );
        }
        OutboxError::Rejected { status, detail } => {
            warn!(status, detail = %detail, "Webhook rejected message");
        }
        other if other.is_transport() => {
            warn!(error = %other, "Webhook unreachable, will retry");
        }
        other => {
            warn!(error = %other, "Webhook delivery failed");
        }
    }
}
