//! # Batch Emitter
//!
//! Event emission pipeline: a thread-safe queue, a batching policy, a
//! single delivery worker with a retry/backoff state machine, and a
//! shutdown protocol that drains outstanding work within a deadline.
//!
//! ```text
//! ┌───────────┐  enqueue  ┌────────────┐  batch  ┌──────────┐  send  ┌───────────┐
//! │ Producers │──────────▶│ EventQueue │────────▶│  Worker  │───────▶│ Transport │
//! └───────────┘           └─────▲──────┘         └────┬─────┘        └───────────┘
//!                               │   reinsert_front    │
//!                               └─────────────────────┘
//! ```
//!
//! - **Success**: batch removed, `on_success` called.
//! - **Transient failure** (no response, 5xx): batch put back at the head,
//!   retried after `min(base * 2^(attempt-1), cap)` plus jitter, until
//!   `max_retry_attempts` retries have been spent.
//! - **Permanent failure** (4xx): batch dropped and reported once.
//!
//! ## Example
//!
//! ```ignore
//! use batch_emitter::{Emitter, EmitterConfig};
//!
//! let emitter = Emitter::new(EmitterConfig::new("collector.example.com"))?;
//! emitter.enqueue(payload)?;
//! emitter.shutdown(Duration::from_secs(5))?;
//! ```

mod batcher;
mod config;
mod emitter;
mod error;
mod http;
mod lifecycle;
mod observer;
mod queue;
mod retry;
mod transport;
mod worker;

pub use batcher::Batcher;
pub use config::{
    EmitterConfig, FullQueuePolicy, HttpMethod, DEFAULT_BATCH_SIZE, DEFAULT_BUFFER_TIMEOUT_MS,
    DEFAULT_MAX_RETRY_ATTEMPTS, DEFAULT_SHUTDOWN_TIMEOUT_MS,
};
pub use emitter::{Emitter, EmitterBuilder};
pub use error::{EmitterError, EmitterResult};
pub use http::{classify_status, HttpTransport};
pub use lifecycle::EmitterState;
pub use observer::{DeliveryObserver, DropReason, FailureNotice, NoopObserver};
pub use queue::EventQueue;
pub use retry::Backoff;
pub use transport::{Batch, DeliveryOutcome, QueuedItem, Transport};
