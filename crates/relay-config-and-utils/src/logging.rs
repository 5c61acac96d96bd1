//! Logging initialization for the relay.
//!
//! Sets up `tracing` with a compact stderr layer and, when a log file is
//! configured, a JSONL file layer. The level comes from `RUST_LOG` or the
//! configured default.

use crate::{CoreError, CoreResult};
use parking_lot::Mutex;
use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// Logging options.
#[derive(Debug, Clone)]
pub struct LogOptions {
    /// Default level filter, overridden by `RUST_LOG`.
    pub default_level: String,
    /// Optional JSONL log file.
    pub log_file: Option<PathBuf>,
    /// Emit compact logs on stderr.
    pub also_stderr: bool,
}

impl Default for LogOptions {
    fn default() -> Self {
        Self {
            default_level: crate::DEFAULT_LOG_LEVEL.to_string(),
            log_file: None,
            also_stderr: true,
        }
    }
}

/// Append-only file writer, flushed after every write so each line lands
/// whole.
#[derive(Clone)]
struct FileLogWriter {
    inner: Arc<Mutex<BufWriter<File>>>,
}

impl FileLogWriter {
    fn open(path: &Path) -> io::Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new().create(true).append(true).open(path)?;

        Ok(Self {
            inner: Arc::new(Mutex::new(BufWriter::with_capacity(8192, file))),
        })
    }
}

impl Write for FileLogWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut guard = self.inner.lock();
        let written = guard.write(buf)?;
        guard.flush()?;
        Ok(written)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.lock().flush()
    }
}

impl<'a> MakeWriter<'a> for FileLogWriter {
    type Writer = FileLogWriter;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

fn env_filter(default_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level))
}

/// Initialize the global tracing subscriber.
///
/// Returns an error if the log file cannot be opened or a subscriber is
/// already installed.
pub fn init_logging(options: &LogOptions) -> CoreResult<()> {
    let file_layer = match &options.log_file {
        Some(path) => {
            let writer = FileLogWriter::open(path)?;
            Some(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_current_span(false)
                    .with_writer(writer)
                    .with_filter(env_filter(&options.default_level)),
            )
        }
        None => None,
    };

    let stderr_layer = options.also_stderr.then(|| {
        tracing_subscriber::fmt::layer()
            .with_target(true)
            .with_file(false)
            .with_line_number(false)
            .compact()
            .with_writer(io::stderr)
            .with_filter(env_filter(&options.default_level))
    });

    tracing_subscriber::registry()
        .with(file_layer)
        .with(stderr_layer)
        .try_init()
        .map_err(|e| CoreError::Config(format!("failed to install logger: {}", e)))?;

    if let Some(path) = &options.log_file {
        tracing::debug!(log_path = %path.display(), "file logging enabled");
    }
    Ok(())
}

/// Parse a log level string into a tracing Level.
pub fn parse_level(level: &str) -> tracing::Level {
    match level.to_lowercase().as_str() {
        "trace" => tracing::Level::TRACE,
        "debug" => tracing::Level::DEBUG,
        "info" => tracing::Level::INFO,
        "warn" | "warning" => tracing::Level::WARN,
        "error" => tracing::Level::ERROR,
        _ => tracing::Level::INFO,
    }
}
