//! hookrelay binary entry point.
//!
//! Usage: some-process | hookrelay [run] [--webhook <url>]
//!
//! Reads process events (JSON lines or plain text) from stdin and relays
//! them to a chat webhook.

mod app;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use relay_config_and_utils::{init_logging, Config, LogOptions, Paths};
use std::path::PathBuf;
use std::time::Duration;
use tracing::error;

/// hookrelay: forward process logs to a chat webhook.
#[derive(Parser, Debug)]
#[command(name = "hookrelay")]
#[command(about = "Batch process logs and events and relay them to a chat webhook")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Config file. Defaults to ~/.hookrelay/config.json
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Base directory for runtime files. Defaults to ~/.hookrelay
    #[arg(long, global = true)]
    base_dir: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, global = true)]
    log_level: Option<String>,

    /// Also write JSONL logs to this file
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    #[command(flatten)]
    overrides: Overrides,
}

/// Command-line overrides, applied over the config file and environment.
#[derive(Args, Debug, Default)]
struct Overrides {
    /// Webhook URL
    #[arg(long, global = true, env = "HOOKRELAY_WEBHOOK_URL", hide_env_values = true)]
    webhook: Option<String>,

    /// Flush interval in seconds
    #[arg(long, global = true)]
    rate: Option<u64>,

    /// Maximum characters per message
    #[arg(long, global = true)]
    max_chunk_len: Option<usize>,

    /// Delivery tick interval in milliseconds
    #[arg(long, global = true)]
    delivery_interval_ms: Option<u64>,

    /// Inbound queue capacity
    #[arg(long, global = true)]
    queue_max: Option<usize>,
}

impl Overrides {
    fn apply(&self, config: &mut Config) {
        if let Some(webhook) = &self.webhook {
            config.webhook_url = Some(webhook.clone());
        }
        if let Some(rate) = self.rate {
            config.rate_secs = rate;
        }
        if let Some(max_chunk_len) = self.max_chunk_len {
            config.max_chunk_len = max_chunk_len;
        }
        if let Some(delivery_interval_ms) = self.delivery_interval_ms {
            config.delivery_interval_ms = delivery_interval_ms;
        }
        if let Some(queue_max) = self.queue_max {
            config.queue_max = queue_max;
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Relay events from stdin (default)
    Run {
        /// Stop once stdin closes and queued messages are delivered
        #[arg(long)]
        exit_on_eof: bool,

        /// Longest wait for delivery after stdin closes, in seconds
        #[arg(long, default_value = "30")]
        drain_timeout: u64,
    },
    /// Validate configuration and print the effective settings
    Check,
    /// Print the messages a file's contents would be sent as
    Preview {
        /// File to preview
        file: PathBuf,
    },
}

fn load_config(cli: &Cli) -> anyhow::Result<Config> {
    let mut config = match &cli.config {
        Some(path) => {
            let mut config = Config::load_from_file(path)
                .with_context(|| format!("failed to read config file {}", path.display()))?;
            config.load_from_env();
            config
        }
        None => {
            let paths = match &cli.base_dir {
                Some(base) => Paths::with_base_dir(base.clone()),
                None => Paths::new()?,
            };
            Config::load(&paths)?
        }
    };

    cli.overrides.apply(&mut config);
    if let Some(level) = &cli.log_level {
        config.log_level = level.clone();
    }
    if let Some(log_file) = &cli.log_file {
        config.log_file = Some(log_file.clone());
    }
    Ok(config)
}

async fn dispatch(cli: Cli) -> anyhow::Result<()> {
    let config = load_config(&cli)?;

    init_logging(&LogOptions {
        default_level: config.log_level.clone(),
        log_file: config.log_file.clone(),
        also_stderr: true,
    })?;

    match cli.command {
        None => app::run(&config, false, Duration::from_secs(30)).await,
        Some(Commands::Run {
            exit_on_eof,
            drain_timeout,
        }) => app::run(&config, exit_on_eof, Duration::from_secs(drain_timeout)).await,
        Some(Commands::Check) => app::check(&config),
        Some(Commands::Preview { file }) => app::preview(&config, &file),
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let runtime = tokio::runtime::Runtime::new()?;

    let result = runtime.block_on(dispatch(cli));
    if let Err(e) = &result {
        error!(error = %e, "hookrelay exited with error");
    }

    // A pending stdin read occupies a blocking thread; don't wait on it.
    runtime.shutdown_timeout(Duration::from_millis(500));
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_to_run_without_subcommand() {
        let cli = Cli::try_parse_from(["hookrelay"]).unwrap();
        assert!(cli.command.is_none());
    }

    #[test]
    fn run_flags_parse() {
        let cli = Cli::try_parse_from([
            "hookrelay",
            "run",
            "--exit-on-eof",
            "--drain-timeout",
            "5",
            "--rate",
            "3",
        ])
        .unwrap();
        match cli.command {
            Some(Commands::Run {
                exit_on_eof,
                drain_timeout,
            }) => {
                assert!(exit_on_eof);
                assert_eq!(drain_timeout, 5);
            }
            other => panic!("unexpected command {other:?}"),
        }
        assert_eq!(cli.overrides.rate, Some(3));
    }

    #[test]
    fn overrides_apply_over_config() {
        let mut config = Config::default();
        let overrides = Overrides {
            webhook: Some("https://example.com/hook".to_string()),
            rate: Some(4),
            max_chunk_len: Some(500),
            delivery_interval_ms: Some(250),
            queue_max: Some(20),
        };
        overrides.apply(&mut config);

        assert_eq!(config.webhook_url.as_deref(), Some("https://example.com/hook"));
        assert_eq!(config.rate_secs, 4);
        assert_eq!(config.max_chunk_len, 500);
        assert_eq!(config.delivery_interval_ms, 250);
        assert_eq!(config.queue_max, 20);
    }

    #[test]
    fn empty_overrides_keep_config() {
        let mut config = Config::default();
        config.rate_secs = 7;
        Overrides::default().apply(&mut config);
        assert_eq!(config.rate_secs, 7);
        assert!(config.webhook_url.is_none());
    }

    #[test]
    fn explicit_config_file_and_cli_precedence() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"rate_secs": 9, "max_chunk_len": 800}}"#).unwrap();
        let path = file.path().to_str().unwrap().to_string();

        let cli = Cli::try_parse_from([
            "hookrelay",
            "--config",
            &path,
            "--max-chunk-len",
            "600",
            "-l",
            "debug",
            "check",
        ])
        .unwrap();
        let config = load_config(&cli).unwrap();

        assert_eq!(config.rate_secs, 9);
        assert_eq!(config.max_chunk_len, 600);
        assert_eq!(config.log_level, "debug");
    }
}
