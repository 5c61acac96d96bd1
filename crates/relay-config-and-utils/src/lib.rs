//! Shared configuration and utilities for hookrelay.
//!
//! This crate provides:
//! - Configuration loading and validation
//! - File system paths
//! - Logging initialization
//! - The core error type

mod config;
mod error;
mod logging;
mod paths;

pub use config::{
    Config, EventToggles, RelaySettings, DEFAULT_DELIVERY_INTERVAL_MS, DEFAULT_LOG_LEVEL,
    DEFAULT_MAX_CHUNK_LEN, DEFAULT_PROCESS_NAME, DEFAULT_QUEUE_MAX, DEFAULT_RATE_SECS,
    DEFAULT_REQUEST_TIMEOUT_SECS, LIFECYCLE_EVENTS, MIN_CHUNK_LEN, MIN_DELIVERY_INTERVAL_MS,
    MIN_QUEUE_MAX,
};
pub use error::{CoreError, CoreResult};
pub use logging::{init_logging, parse_level, LogOptions};
pub use paths::Paths;
