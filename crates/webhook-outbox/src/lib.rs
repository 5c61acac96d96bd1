//! # Webhook Outbox
//!
//! Batching, rate-limited delivery of text to a chat webhook.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐ try_send ┌──────────────┐  flush tick  ┌───────────────┐
//! │  RelayInbox  │─────────▶│ MessageQueue │─────────────▶│ DeliveryQueue │
//! │  (producers) │  mpsc    │ (pending     │ join, merge, │ (FIFO chunks) │
//! └──────────────┘          │  text)       │ split        └───────┬───────┘
//!                           └──────────────┘                      │ delivery tick
//!                                                                 ▼
//!                           ┌──────────────┐  capacity?   ┌───────────────┐
//!                           │   Limiter    │◀────────────▶│    Sender     │──▶ POST {"content"}
//!                           │ (30 / 60 s)  │   charge     └───────────────┘
//!                           └──────────────┘
//!                                  ▲ prune tick
//! ```
//!
//! - The flush task joins buffered text with newlines, merges adjacent
//!   `js`-fenced payloads and cuts the result into chunks that fit the
//!   message limit with balanced code fences.
//! - The delivery task sends at most one chunk per tick, always the head of
//!   the queue. A chunk leaves the queue only once the webhook accepts it.
//! - Accepted messages and non-429 rejections are charged to the limiter.
//!   A 429 is not charged and is logged as a sign that the local limiter
//!   has drifted from the server's.
//!
//! ## Usage
//!
//! ```rust,ignore
//! let transport = Arc::new(ReqwestTransport::new(url, Duration::from_secs(10))?);
//! let handle = RelayPipeline::new(transport, PipelineConfig::default())?.start();
//! handle.inbox().enqueue("server started")?;
//! // ...
//! handle.shutdown().await;
//! ```

mod error;
mod limiter;
mod message_queue;
mod pipeline;
mod queue;
mod sender;
mod transport;

#[cfg(test)]
mod tests;

pub use error::{ErrorDetail, OutboxError, OutboxResult};
pub use limiter::{Limiter, DEFAULT_LIMIT, DEFAULT_WINDOW};
pub use message_queue::{BatchFormatter, MessageQueue};
pub use pipeline::{PipelineConfig, PipelineHandle, RelayInbox, RelayPipeline};
pub use queue::DeliveryQueue;
pub use sender::{DeliveryOutcome, Sender, SenderConfig, SkipReason};
pub use transport::{ReqwestTransport, WebhookResponse, WebhookTransport};
