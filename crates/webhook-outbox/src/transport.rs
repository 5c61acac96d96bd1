//! Webhook transport.

use crate::OutboxResult;
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;
use tracing::trace;
use url::Url;

/// Response to a webhook post.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebhookResponse {
    pub status: u16,
    pub body: String,
}

impl WebhookResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Posts one message to the webhook.
///
/// Implementations return `Ok` for any HTTP response, whatever its status,
/// and `Err` only when no response was received.
#[async_trait]
pub trait WebhookTransport: Send + Sync {
    async fn post(&self, content: &str) -> OutboxResult<WebhookResponse>;
}

#[derive(Serialize)]
struct WebhookPayload<'a> {
    content: &'a str,
}

/// reqwest-backed transport posting `{"content": ...}` as JSON.
pub struct ReqwestTransport {
    client: Client,
    url: Url,
}

impl ReqwestTransport {
    pub fn new(url: Url, timeout: Duration) -> OutboxResult<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client, url })
    }
}

#[async_trait]
impl WebhookTransport for ReqwestTransport {
    async fn post(&self, content: &str) -> OutboxResult<WebhookResponse> {
        trace!(chars = content.chars().count(), "Posting webhook message");

        let response = self
            .client
            .post(self.url.clone())
            .json(&WebhookPayload { content })
            .send()
            .await?;

        let status = response.status().as_u16();
        let body = if response.status().is_success() {
            String::new()
        } else {
            response.text().await.unwrap_or_default()
        };

        Ok(WebhookResponse { status, body })
    }
}
