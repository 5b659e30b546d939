//! Emitter configuration.

use crate::retry::Backoff;
use crate::{EmitterError, EmitterResult};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use url::Url;

/// Default maximum payloads per batch.
pub const DEFAULT_BATCH_SIZE: usize = 50;

/// Default wait for a partial batch to fill.
pub const DEFAULT_BUFFER_TIMEOUT_MS: u64 = 1_000;

/// Default number of retries after the first failed send.
pub const DEFAULT_MAX_RETRY_ATTEMPTS: u32 = 5;

pub const DEFAULT_BACKOFF_BASE_MS: u64 = 500;
pub const DEFAULT_BACKOFF_CAP_MS: u64 = 30_000;
pub const DEFAULT_BACKOFF_JITTER: f64 = 0.1;
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 10_000;

/// Deadline used when an emitter is dropped without an explicit shutdown.
pub const DEFAULT_SHUTDOWN_TIMEOUT_MS: u64 = 5_000;

/// HTTP method used to reach the collector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HttpMethod {
    /// Batched JSON envelope
    #[default]
    Post,
    /// One event per request, fields in the query string
    Get,
}

/// What `enqueue` does when a bounded queue is full.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FullQueuePolicy {
    /// Wait until the worker makes room.
    #[default]
    Block,
    /// Evict the oldest pending payload and report it as dropped.
    DropOldest,
    /// Fail with [`EmitterError::QueueFull`].
    Reject,
}

/// Configuration for the emitter's queue, batching and retry behavior.
///
/// # Backoff Calculation
///
/// Retry delay is `backoff_base * 2^(attempt - 1)` capped at `backoff_cap`,
/// plus up to `backoff_jitter * delay` of random jitter. For defaults:
/// - 1st retry: ~500ms
/// - 2nd retry: ~1s
/// - 3rd retry: ~2s
/// - ... up to 30s
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmitterConfig {
    /// Collector base URL; `https://` is assumed when no scheme is given.
    pub collector_url: String,
    pub method: HttpMethod,
    /// Maximum payloads per batch. Forced to 1 in GET mode.
    pub batch_size: usize,
    /// How long to wait for a partial batch to fill.
    pub buffer_timeout_ms: u64,
    /// Pending payload limit; `None` means unbounded.
    pub queue_capacity: Option<usize>,
    pub full_queue_policy: FullQueuePolicy,
    /// Retries allowed after the first failed send of a batch.
    pub max_retry_attempts: u32,
    pub backoff_base_ms: u64,
    pub backoff_cap_ms: u64,
    /// Jitter ratio in `[0, 1]`.
    pub backoff_jitter: f64,
    pub request_timeout_ms: u64,
    /// Deadline for the best-effort shutdown on drop.
    pub shutdown_timeout_ms: u64,
}

impl Default for EmitterConfig {
    fn default() -> Self {
        Self {
            collector_url: String::new(),
            method: HttpMethod::Post,
            batch_size: DEFAULT_BATCH_SIZE,
            buffer_timeout_ms: DEFAULT_BUFFER_TIMEOUT_MS,
            queue_capacity: None,
            full_queue_policy: FullQueuePolicy::Block,
            max_retry_attempts: DEFAULT_MAX_RETRY_ATTEMPTS,
            backoff_base_ms: DEFAULT_BACKOFF_BASE_MS,
            backoff_cap_ms: DEFAULT_BACKOFF_CAP_MS,
            backoff_jitter: DEFAULT_BACKOFF_JITTER,
            request_timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
            shutdown_timeout_ms: DEFAULT_SHUTDOWN_TIMEOUT_MS,
        }
    }
}

impl EmitterConfig {
    /// Defaults pointed at a collector.
    pub fn new(collector_url: impl Into<String>) -> Self {
        Self {
            collector_url: collector_url.into(),
            ..Self::default()
        }
    }

    /// Load configuration from a JSON file. Missing fields take defaults.
    pub fn load_from_file(path: &Path) -> EmitterResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: EmitterConfig = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Override fields from `TRACKER_*` environment variables.
    pub fn apply_env(&mut self) -> EmitterResult<()> {
        self.apply_overrides(|name| std::env::var(name).ok())
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> EmitterResult<()> {
        let get = |name: &str| lookup(name).and_then(non_empty);

        if let Some(url) = get("TRACKER_COLLECTOR_URL") {
            self.collector_url = url;
        }
        if let Some(raw) = get("TRACKER_BATCH_SIZE") {
            self.batch_size = parse_env("TRACKER_BATCH_SIZE", &raw)?;
        }
        if let Some(raw) = get("TRACKER_BUFFER_TIMEOUT_MS") {
            self.buffer_timeout_ms = parse_env("TRACKER_BUFFER_TIMEOUT_MS", &raw)?;
        }
        if let Some(raw) = get("TRACKER_MAX_RETRY_ATTEMPTS") {
            self.max_retry_attempts = parse_env("TRACKER_MAX_RETRY_ATTEMPTS", &raw)?;
        }
        if let Some(raw) = get("TRACKER_QUEUE_CAPACITY") {
            self.queue_capacity = Some(parse_env("TRACKER_QUEUE_CAPACITY", &raw)?);
        }
        Ok(())
    }

    /// Check the configuration for values the emitter cannot run with.
    pub fn validate(&self) -> EmitterResult<()> {
        self.collector_url()?;
        if self.batch_size == 0 {
            return Err(EmitterError::Config("batch_size must be at least 1".to_string()));
        }
        if self.queue_capacity == Some(0) {
            return Err(EmitterError::Config(
                "queue_capacity must be at least 1".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.backoff_jitter) {
            return Err(EmitterError::Config(format!(
                "backoff_jitter must be within [0, 1], got {}",
                self.backoff_jitter
            )));
        }
        if self.backoff_cap_ms < self.backoff_base_ms {
            return Err(EmitterError::Config(
                "backoff_cap_ms must not be below backoff_base_ms".to_string(),
            ));
        }
        Ok(())
    }

    /// The collector URL, with `https://` prepended when no scheme is given.
    pub fn collector_url(&self) -> EmitterResult<Url> {
        let raw = self.collector_url.trim();
        if raw.is_empty() {
            return Err(EmitterError::Config("collector_url is required".to_string()));
        }
        if raw.contains("://") {
            Ok(Url::parse(raw)?)
        } else {
            Ok(Url::parse(&format!("https://{raw}"))?)
        }
    }

    /// Batch size actually used by the batcher.
    pub fn effective_batch_size(&self) -> usize {
        match self.method {
            HttpMethod::Get => 1,
            HttpMethod::Post => self.batch_size.max(1),
        }
    }

    pub fn buffer_timeout(&self) -> Duration {
        Duration::from_millis(self.buffer_timeout_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_millis(self.shutdown_timeout_ms)
    }

    pub fn backoff(&self) -> Backoff {
        Backoff {
            base: Duration::from_millis(self.backoff_base_ms),
            cap: Duration::from_millis(self.backoff_cap_ms),
            jitter: self.backoff_jitter,
        }
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

fn parse_env<T: std::str::FromStr>(name: &str, raw: &str) -> EmitterResult<T> {
    raw.parse()
        .map_err(|_| EmitterError::Config(format!("{name} has an invalid value: {raw:?}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn defaults_match_documented_values() {
        let config = EmitterConfig::default();
        assert_eq!(config.batch_size, 50);
        assert_eq!(config.buffer_timeout(), Duration::from_secs(1));
        assert_eq!(config.queue_capacity, None);
        assert_eq!(config.full_queue_policy, FullQueuePolicy::Block);
        assert_eq!(config.max_retry_attempts, 5);
        assert_eq!(config.request_timeout(), Duration::from_secs(10));
        assert_eq!(config.shutdown_timeout(), Duration::from_secs(5));
    }

    #[test]
    fn url_without_scheme_gets_https() {
        let config = EmitterConfig::new("collector.example.com");
        assert_eq!(
            config.collector_url().unwrap().as_str(),
            "https://collector.example.com/"
        );

        let config = EmitterConfig::new("http://localhost:9090");
        assert_eq!(config.collector_url().unwrap().scheme(), "http");
    }

    #[test]
    fn validate_rejects_bad_values() {
        assert!(EmitterConfig::default().validate().is_err());

        let mut config = EmitterConfig::new("collector.example.com");
        assert!(config.validate().is_ok());

        config.batch_size = 0;
        assert!(matches!(config.validate(), Err(EmitterError::Config(_))));

        config.batch_size = 10;
        config.backoff_jitter = 1.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn get_mode_forces_single_event_batches() {
        let mut config = EmitterConfig::new("collector.example.com");
        config.batch_size = 25;
        assert_eq!(config.effective_batch_size(), 25);
        config.method = HttpMethod::Get;
        assert_eq!(config.effective_batch_size(), 1);
    }

    #[test]
    fn overrides_apply_and_reject_garbage() {
        let vars: HashMap<&str, &str> = HashMap::from([
            ("TRACKER_COLLECTOR_URL", "env.example.com"),
            ("TRACKER_BATCH_SIZE", "7"),
            ("TRACKER_QUEUE_CAPACITY", " 100 "),
        ]);
        let mut config = EmitterConfig::default();
        config
            .apply_overrides(|name| vars.get(name).map(|v| v.to_string()))
            .unwrap();
        assert_eq!(config.collector_url, "env.example.com");
        assert_eq!(config.batch_size, 7);
        assert_eq!(config.queue_capacity, Some(100));

        let mut config = EmitterConfig::default();
        let result = config.apply_overrides(|name| {
            (name == "TRACKER_MAX_RETRY_ATTEMPTS").then(|| "many".to_string())
        });
        assert!(matches!(result, Err(EmitterError::Config(_))));
    }

    #[test]
    fn load_from_file_fills_missing_fields() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"collector_url": "c.example.com", "method": "get", "full_queue_policy": "drop-oldest"}}"#
        )
        .unwrap();

        let config = EmitterConfig::load_from_file(file.path()).unwrap();
        assert_eq!(config.method, HttpMethod::Get);
        assert_eq!(config.full_queue_policy, FullQueuePolicy::DropOldest);
        assert_eq!(config.batch_size, DEFAULT_BATCH_SIZE);
    }
}
