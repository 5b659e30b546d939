//! Logging setup shared by the tracker crates and binaries.
//!
//! Every binary calls [`init`] (or [`init_with_config`]) once at startup.
//! Library crates only emit `tracing` events and never install a subscriber.
//!
//! Output goes to two places:
//! - stderr, in the compact human-readable format
//! - optionally, a JSONL file (one [`LogEntry`] per line) for tailing or
//!   shipping elsewhere
//!
//! The level comes from `RUST_LOG` when set, falling back to
//! [`LogConfig::default_level`].

mod json_layer;
mod writer;

pub use json_layer::{JsonLayer, LogEntry};
pub use writer::{FileLogWriter, WriterFactory};

use std::io;
use std::path::PathBuf;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// Logging configuration for one process.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Written into every JSONL entry as `service`.
    pub service_name: String,
    /// Filter directive used when `RUST_LOG` is unset.
    pub default_level: String,
    /// JSONL output file. No file output when `None`.
    pub log_path: Option<PathBuf>,
    /// Also log to stderr.
    pub also_stderr: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            service_name: "tracker".to_string(),
            default_level: "info".to_string(),
            log_path: None,
            also_stderr: true,
        }
    }
}

impl LogConfig {
    pub fn new(service_name: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
            ..Default::default()
        }
    }

    pub fn default_level(mut self, level: impl Into<String>) -> Self {
        self.default_level = level.into();
        self
    }

    pub fn log_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.log_path = Some(path.into());
        self
    }

    pub fn also_stderr(mut self, also_stderr: bool) -> Self {
        self.also_stderr = also_stderr;
        self
    }

    fn env_filter(&self) -> EnvFilter {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&self.default_level))
    }
}

/// Per-user log file location: `<data dir>/tracker/logs/<service>.jsonl`.
pub fn default_log_path(service_name: &str) -> Option<PathBuf> {
    dirs::data_local_dir().map(|dir| {
        dir.join("tracker")
            .join("logs")
            .join(format!("{service_name}.jsonl"))
    })
}

/// Initialize stderr logging at `info` for the named service.
pub fn init(service_name: &str) -> io::Result<()> {
    init_with_config(LogConfig::new(service_name))
}

/// Install the global subscriber described by `config`.
///
/// Fails if the log file cannot be opened or a global subscriber is
/// already installed.
pub fn init_with_config(config: LogConfig) -> io::Result<()> {
    let json_layer = match &config.log_path {
        Some(path) => {
            let writer = FileLogWriter::new(path)?;
            let layer = JsonLayer::new(config.service_name.clone(), WriterFactory::new(writer));
            Some(layer.with_filter(config.env_filter()))
        }
        None => None,
    };

    let stderr_layer = config.also_stderr.then(|| {
        tracing_subscriber::fmt::layer()
            .with_target(true)
            .with_file(false)
            .with_line_number(false)
            .compact()
            .with_writer(io::stderr)
            .with_filter(config.env_filter())
    });

    tracing_subscriber::registry()
        .with(json_layer)
        .with(stderr_layer)
        .try_init()
        .map_err(io::Error::other)?;

    tracing::debug!(
        service = %config.service_name,
        log_path = ?config.log_path,
        "Logging initialized"
    );
    Ok(())
}

// Re-export tracing macros for convenience
pub use tracing::{debug, error, info, trace, warn};
