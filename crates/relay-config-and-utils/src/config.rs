//! Configuration management for the relay.
//!
//! Values are layered: defaults, then the JSON config file, then
//! environment variables, then command-line overrides applied by the
//! binary. [`Config::validate`] turns the raw values into [`RelaySettings`].

use crate::{CoreError, CoreResult, Paths};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

/// Default log level.
pub const DEFAULT_LOG_LEVEL: &str = "info";
/// Default flush interval in seconds.
pub const DEFAULT_RATE_SECS: u64 = 1;
/// Default maximum chunk length, in characters.
pub const DEFAULT_MAX_CHUNK_LEN: usize = 1900;
/// Smallest accepted maximum chunk length.
pub const MIN_CHUNK_LEN: usize = 64;
/// Default delivery tick interval in milliseconds.
pub const DEFAULT_DELIVERY_INTERVAL_MS: u64 = 1000;
/// Smallest accepted delivery tick interval in milliseconds.
pub const MIN_DELIVERY_INTERVAL_MS: u64 = 100;
/// Default webhook request timeout in seconds.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;
/// Default inbound queue capacity.
pub const DEFAULT_QUEUE_MAX: usize = 100;
/// Capacities below this fall back to [`DEFAULT_QUEUE_MAX`].
pub const MIN_QUEUE_MAX: usize = 10;
/// Process name the relay runs under; its own events are ignored.
pub const DEFAULT_PROCESS_NAME: &str = "hookrelay";

/// Lifecycle event names that can be enabled in [`EventToggles::lifecycle`].
pub const LIFECYCLE_EVENTS: &[&str] = &[
    "restart",
    "delete",
    "stop",
    "restart overlimit",
    "exit",
    "start",
    "online",
];

const ENV_WEBHOOK_URL: &str = "HOOKRELAY_WEBHOOK_URL";
const ENV_LOG_LEVEL: &str = "HOOKRELAY_LOG_LEVEL";

/// Which process events are forwarded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EventToggles {
    /// Forward stdout log lines.
    pub log: bool,
    /// Forward stderr log lines.
    pub error: bool,
    /// Forward uncaught exceptions.
    pub exception: bool,
    /// Forward process-manager kill notices.
    pub kill: bool,
    /// Lifecycle events to forward (see [`LIFECYCLE_EVENTS`]).
    pub lifecycle: Vec<String>,
}

impl Default for EventToggles {
    fn default() -> Self {
        Self {
            log: true,
            error: true,
            exception: false,
            kill: false,
            lifecycle: Vec::new(),
        }
    }
}

/// Raw relay configuration, as read from disk and the environment.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Destination webhook. Required to run.
    pub webhook_url: Option<String>,
    /// Flush interval in seconds.
    pub rate_secs: u64,
    /// Maximum characters per delivered message.
    pub max_chunk_len: usize,
    /// Delivery tick interval in milliseconds.
    pub delivery_interval_ms: u64,
    /// Per-request timeout in seconds.
    pub request_timeout_secs: u64,
    /// Inbound queue capacity.
    pub queue_max: usize,
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
    /// Optional JSONL log file.
    pub log_file: Option<PathBuf>,
    /// Name the relay itself runs under.
    pub process_name: String,
    /// Event forwarding toggles.
    pub events: EventToggles,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            webhook_url: None,
            rate_secs: DEFAULT_RATE_SECS,
            max_chunk_len: DEFAULT_MAX_CHUNK_LEN,
            delivery_interval_ms: DEFAULT_DELIVERY_INTERVAL_MS,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            queue_max: DEFAULT_QUEUE_MAX,
            log_level: DEFAULT_LOG_LEVEL.to_string(),
            log_file: None,
            process_name: DEFAULT_PROCESS_NAME.to_string(),
            events: EventToggles::default(),
        }
    }
}

/// Validated settings the pipeline runs with.
#[derive(Debug, Clone)]
pub struct RelaySettings {
    pub webhook_url: Url,
    pub flush_interval: Duration,
    pub delivery_interval: Duration,
    pub request_timeout: Duration,
    pub max_chunk_len: usize,
    pub queue_max: usize,
    pub process_name: String,
    pub events: EventToggles,
}

impl RelaySettings {
    /// Webhook URL with its path stripped, safe to print.
    ///
    /// Webhook paths usually embed the secret token.
    pub fn redacted_webhook(&self) -> String {
        match self.webhook_url.host_str() {
            Some(host) => format!("{}://{}/…", self.webhook_url.scheme(), host),
            None => format!("{}://…", self.webhook_url.scheme()),
        }
    }
}

impl Config {
    /// Load configuration from the default config file (if present),
    /// then apply environment overrides.
    pub fn load(paths: &Paths) -> CoreResult<Self> {
        let config_path = paths.config_file();

        let mut config = if config_path.exists() {
            Self::load_from_file(&config_path)?
        } else {
            Self::default()
        };

        config.load_from_env();
        Ok(config)
    }

    /// Load configuration from a specific file.
    pub fn load_from_file(path: &Path) -> CoreResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to the default config file.
    pub fn save(&self, paths: &Paths) -> CoreResult<()> {
        paths.ensure_dirs()?;
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(paths.config_file(), content)?;
        Ok(())
    }

    /// Override configuration from environment variables.
    pub fn load_from_env(&mut self) {
        self.apply_env(|key| std::env::var(key).ok());
    }

    fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup(ENV_WEBHOOK_URL).and_then(non_empty) {
            self.webhook_url = Some(url);
        }
        if let Some(level) = lookup(ENV_LOG_LEVEL).and_then(non_empty) {
            self.log_level = level;
        }
    }

    /// Validate the configuration and produce typed settings.
    ///
    /// A missing webhook is fatal. Out-of-range intervals are clamped to
    /// their minimums and a too-small queue capacity falls back to the
    /// default.
    pub fn validate(&self) -> CoreResult<RelaySettings> {
        let raw_url = self
            .webhook_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
            .ok_or(CoreError::MissingWebhook)?;

        let webhook_url = Url::parse(raw_url)?;
        if !matches!(webhook_url.scheme(), "http" | "https") {
            return Err(CoreError::Config(format!(
                "webhook URL must be http or https, got {}",
                webhook_url.scheme()
            )));
        }

        if self.max_chunk_len < MIN_CHUNK_LEN {
            return Err(CoreError::Config(format!(
                "max_chunk_len must be at least {}, got {}",
                MIN_CHUNK_LEN, self.max_chunk_len
            )));
        }

        for name in &self.events.lifecycle {
            if !LIFECYCLE_EVENTS.contains(&name.as_str()) {
                return Err(CoreError::Config(format!(
                    "unknown lifecycle event: {}",
                    name
                )));
            }
        }

        let queue_max = if self.queue_max < MIN_QUEUE_MAX {
            DEFAULT_QUEUE_MAX
        } else {
            self.queue_max
        };

        Ok(RelaySettings {
            webhook_url,
            flush_interval: Duration::from_secs(self.rate_secs.max(1)),
            delivery_interval: Duration::from_millis(
                self.delivery_interval_ms.max(MIN_DELIVERY_INTERVAL_MS),
            ),
            request_timeout: Duration::from_secs(self.request_timeout_secs.max(1)),
            max_chunk_len: self.max_chunk_len,
            queue_max,
            process_name: self.process_name.clone(),
            events: self.events.clone(),
        })
    }
}

fn non_empty(raw: String) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
