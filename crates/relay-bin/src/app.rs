//! Subcommand implementations.

use anyhow::Context;
use process_event_bridge::{EventFilter, EventReader};
use relay_config_and_utils::{Config, RelaySettings};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::BufReader;
use tracing::{info, warn};
use webhook_outbox::{BatchFormatter, PipelineConfig, PipelineHandle, RelayPipeline, ReqwestTransport};

const LIMITER_PRUNE_INTERVAL: Duration = Duration::from_millis(100);
const DRAIN_POLL_INTERVAL: Duration = Duration::from_millis(200);

fn pipeline_config(settings: &RelaySettings) -> PipelineConfig {
    PipelineConfig {
        flush_interval: settings.flush_interval,
        delivery_interval: settings.delivery_interval,
        prune_interval: LIMITER_PRUNE_INTERVAL,
        queue_capacity: settings.queue_max,
        max_chunk_len: settings.max_chunk_len,
        request_timeout: settings.request_timeout,
    }
}

/// Relay stdin to the webhook until Ctrl-C, or until stdin ends and the
/// queue drains when `exit_on_eof` is set.
pub async fn run(config: &Config, exit_on_eof: bool, drain_timeout: Duration) -> anyhow::Result<()> {
    let settings = config.validate()?;
    let transport = Arc::new(ReqwestTransport::new(
        settings.webhook_url.clone(),
        settings.request_timeout,
    )?);
    let handle = RelayPipeline::new(transport, pipeline_config(&settings))?.start();

    info!(
        webhook = %settings.redacted_webhook(),
        process_name = %settings.process_name,
        "hookrelay running"
    );

    let reader = EventReader::new(
        BufReader::new(tokio::io::stdin()),
        EventFilter::from(&settings.events),
        settings.process_name.clone(),
    );
    let inbox = handle.inbox();
    let reader_task = tokio::spawn(async move { reader.run(&inbox).await });

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("Received shutdown signal, exiting...");
        }
        result = reader_task => {
            match result {
                Ok(Ok(stats)) => info!(
                    forwarded = stats.forwarded,
                    skipped = stats.skipped,
                    "Input closed"
                ),
                Ok(Err(e)) => warn!(error = %e, "Event reader stopped"),
                Err(e) => warn!(error = %e, "Event reader task failed"),
            }
            if exit_on_eof {
                wait_for_drain(&handle, drain_timeout).await;
            } else {
                tokio::signal::ctrl_c().await.context("failed to listen for Ctrl-C")?;
                info!("Received shutdown signal, exiting...");
            }
        }
    }

    handle.shutdown().await;
    Ok(())
}

async fn wait_for_drain(handle: &PipelineHandle, limit: Duration) {
    let drained = async {
        while !handle.is_drained().await {
            tokio::time::sleep(DRAIN_POLL_INTERVAL).await;
        }
    };

    tokio::select! {
        result = tokio::time::timeout(limit, drained) => {
            if result.is_err() {
                warn!(
                    undelivered = handle.pending_deliveries().await,
                    "Gave up waiting for delivery"
                );
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received shutdown signal while draining");
        }
    }
}

/// Validate configuration and print the effective settings.
pub fn check(config: &Config) -> anyhow::Result<()> {
    let settings = config.validate()?;
    print!("{}", describe(&settings));
    Ok(())
}

fn describe(settings: &RelaySettings) -> String {
    let lifecycle = if settings.events.lifecycle.is_empty() {
        "none".to_string()
    } else {
        settings.events.lifecycle.join(", ")
    };
    format!(
        "webhook:           {}\n\
         flush interval:    {}s\n\
         delivery interval: {}ms\n\
         request timeout:   {}s\n\
         max chunk length:  {}\n\
         queue capacity:    {}\n\
         process name:      {}\n\
         events:            log={} error={} exception={} kill={} lifecycle={}\n",
        settings.redacted_webhook(),
        settings.flush_interval.as_secs(),
        settings.delivery_interval.as_millis(),
        settings.request_timeout.as_secs(),
        settings.max_chunk_len,
        settings.queue_max,
        settings.process_name,
        settings.events.log,
        settings.events.error,
        settings.events.exception,
        settings.events.kill,
        lifecycle,
    )
}

/// Print the messages a single flush of `file` would produce.
pub fn preview(config: &Config, file: &Path) -> anyhow::Result<()> {
    let text = std::fs::read_to_string(file)
        .with_context(|| format!("failed to read {}", file.display()))?;
    print!("{}", render_preview(&text, config.max_chunk_len)?);
    Ok(())
}

fn render_preview(text: &str, max_chunk_len: usize) -> anyhow::Result<String> {
    let formatter = BatchFormatter::new(max_chunk_len)?;
    let chunks = formatter.format(&formatter.pieces(text));

    let mut out = String::new();
    for (i, chunk) in chunks.iter().enumerate() {
        out.push_str(&format!(
            "──── message {}/{} ({} chars) ────\n{}\n",
            i + 1,
            chunks.len(),
            chunk.chars().count(),
            chunk
        ));
    }
    Ok(out)
}
