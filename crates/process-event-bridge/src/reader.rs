//! Line-oriented event reader.

use crate::{format_event, BridgeError, BridgeResult, EventFilter, ProcessEvent};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::{debug, trace};
use webhook_outbox::RelayInbox;

/// Destination for formatted event text.
pub trait TextSink: Send + Sync {
    fn send_text(&self, text: String) -> BridgeResult<()>;
}

impl TextSink for RelayInbox {
    fn send_text(&self, text: String) -> BridgeResult<()> {
        self.enqueue(text).map_err(|_| BridgeError::Closed)
    }
}

/// Counters for one reader run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReaderStats {
    pub forwarded: u64,
    pub skipped: u64,
}

/// Parse one input line. Anything that is not a JSON event becomes a plain
/// stdout line.
pub fn parse_line(line: &str) -> ProcessEvent {
    let trimmed = line.trim_start();
    if trimmed.starts_with('{') {
        if let Ok(event) = serde_json::from_str::<ProcessEvent>(trimmed) {
            return event;
        }
    }
    ProcessEvent::plain(line)
}

/// Reads events line by line and forwards their text to a sink.
pub struct EventReader<R> {
    input: R,
    filter: EventFilter,
    self_name: String,
}

impl<R: AsyncBufRead + Unpin> EventReader<R> {
    pub fn new(input: R, filter: EventFilter, self_name: impl Into<String>) -> Self {
        Self {
            input,
            filter,
            self_name: self_name.into(),
        }
    }

    /// Run until end of input or until the sink closes.
    pub async fn run<S: TextSink>(self, sink: &S) -> BridgeResult<ReaderStats> {
        let mut stats = ReaderStats::default();
        let mut lines = self.input.lines();

        while let Some(line) = lines.next_line().await? {
            if line.trim().is_empty() {
                continue;
            }
            let event = parse_line(&line);
            match format_event(&event, &self.filter, &self.self_name) {
                Some(text) => {
                    sink.send_text(text)?;
                    stats.forwarded += 1;
                }
                None => {
                    trace!(?event, "Event skipped");
                    stats.skipped += 1;
                }
            }
        }

        debug!(
            forwarded = stats.forwarded,
            skipped = stats.skipped,
            "Event input ended"
        );
        Ok(stats)
    }
}
