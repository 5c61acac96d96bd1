//! Process event bridge.
//!
//! Reads process-manager events (one JSON object per line), drops the ones
//! that are disabled or come from the relay itself, and turns the rest into
//! chat-ready text for the relay pipeline.
//!
//! Lines that are not JSON events are forwarded as plain log lines.

mod error;
mod event;
mod filter;
mod format;
mod reader;

pub use error::{BridgeError, BridgeResult};
pub use event::{ProcessEvent, ProcessId, ProcessInfo};
pub use filter::EventFilter;
pub use format::{format_event, FENCE_OPEN};
pub use reader::{parse_line, EventReader, ReaderStats, TextSink};
