//! Pipeline tasks end to end, on a paused clock.

use super::harness::{MockReply, MockTransport};
use crate::{OutboxError, PipelineConfig, RelayPipeline};
use std::time::Duration;
use tokio::time::sleep;

fn fast_config() -> PipelineConfig {
    PipelineConfig {
        flush_interval: Duration::from_secs(1),
        delivery_interval: Duration::from_millis(100),
        prune_interval: Duration::from_millis(100),
        queue_capacity: 100,
        max_chunk_len: 1900,
        request_timeout: Duration::from_secs(10),
    }
}

#[tokio::test(start_paused = true)]
async fn enqueued_text_is_delivered() {
    let transport = MockTransport::new();
    let handle = RelayPipeline::new(transport.clone(), fast_config())
        .unwrap()
        .start();

    handle.inbox().enqueue("server started").unwrap();
    sleep(Duration::from_secs(2)).await;

    assert_eq!(transport.posts(), vec!["server started"]);
    assert!(handle.is_drained().await);
    handle.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn one_flush_coalesces_into_one_message() {
    let transport = MockTransport::new();
    let handle = RelayPipeline::new(transport.clone(), fast_config())
        .unwrap()
        .start();
    let inbox = handle.inbox();

    sleep(Duration::from_millis(10)).await;
    inbox.enqueue("```js\nline 1\n```").unwrap();
    inbox.enqueue("```js\nline 2\n```").unwrap();
    inbox.enqueue("```js\nline 3\n```").unwrap();
    sleep(Duration::from_secs(2)).await;

    assert_eq!(transport.posts(), vec!["```js\nline 1\nline 2\nline 3\n```"]);
    handle.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn large_burst_is_split_into_bounded_chunks() {
    let transport = MockTransport::new();
    let handle = RelayPipeline::new(transport.clone(), fast_config())
        .unwrap()
        .start();
    let inbox = handle.inbox();

    sleep(Duration::from_millis(10)).await;
    for i in 0..60 {
        inbox
            .enqueue(format!("```js\n{}\n```", format!("entry {i} ").repeat(10)))
            .unwrap();
    }
    sleep(Duration::from_secs(5)).await;

    let posts = transport.posts();
    assert!(posts.len() > 1);
    for post in &posts {
        assert!(post.chars().count() <= 1900);
        assert!(post.starts_with("```js"));
        assert!(post.ends_with("```"));
    }
    assert!(handle.is_drained().await);
    handle.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn limiter_caps_deliveries_per_minute() {
    let transport = MockTransport::new();
    let handle = RelayPipeline::new(transport.clone(), fast_config())
        .unwrap()
        .start();
    let inbox = handle.inbox();

    for i in 0..35 {
        inbox.enqueue(format!("message {i}")).unwrap();
        sleep(Duration::from_millis(1100)).await;
    }

    assert_eq!(transport.post_count(), 30);
    assert_eq!(handle.pending_deliveries().await, 5);

    sleep(Duration::from_secs(30)).await;
    assert_eq!(transport.post_count(), 35);
    let expected: Vec<String> = (0..35).map(|i| format!("message {i}")).collect();
    assert_eq!(transport.posts(), expected);
    handle.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn rate_limited_chunk_is_retried_until_accepted() {
    let transport = MockTransport::new();
    transport.queue_reply(MockReply::status(429, r#"{"retry_after": 0.2}"#));
    transport.queue_reply(MockReply::status(429, ""));
    let handle = RelayPipeline::new(transport.clone(), fast_config())
        .unwrap()
        .start();

    handle.inbox().enqueue("persistent").unwrap();
    sleep(Duration::from_secs(3)).await;

    assert_eq!(transport.posts(), vec!["persistent"; 3]);
    assert_eq!(handle.pending_deliveries().await, 0);
    handle.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn shutdown_stops_delivery() {
    let transport = MockTransport::new();
    let handle = RelayPipeline::new(transport.clone(), fast_config())
        .unwrap()
        .start();
    let inbox = handle.inbox();

    handle.shutdown().await;
    assert!(matches!(inbox.enqueue("late"), Err(OutboxError::Closed)));

    sleep(Duration::from_secs(5)).await;
    assert_eq!(transport.post_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn shutdown_waits_for_in_flight_request() {
    let transport = MockTransport::new();
    transport.queue_reply(MockReply::Hang);
    let mut config = fast_config();
    config.request_timeout = Duration::from_secs(5);
    let handle = RelayPipeline::new(transport.clone(), config).unwrap().start();

    handle.inbox().enqueue("slow").unwrap();
    sleep(Duration::from_millis(1150)).await;
    assert_eq!(transport.post_count(), 1);

    let started = tokio::time::Instant::now();
    handle.shutdown().await;
    assert!(started.elapsed() >= Duration::from_secs(3));
    assert_eq!(transport.post_count(), 1);
}

#[tokio::test]
async fn invalid_chunk_length_rejected() {
    let transport = MockTransport::new();
    let mut config = fast_config();
    config.max_chunk_len = 8;
    assert!(matches!(
        RelayPipeline::new(transport, config),
        Err(OutboxError::Split(_))
    ));
}
