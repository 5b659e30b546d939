//! Emitter handle: enqueue, flush and shutdown.

use crate::batcher::Batcher;
use crate::config::EmitterConfig;
use crate::http::HttpTransport;
use crate::lifecycle::{EmitterState, Lifecycle};
use crate::observer::{DeliveryObserver, DropReason, FailureNotice, NoopObserver};
use crate::queue::EventQueue;
use crate::transport::{QueuedItem, Transport};
use crate::worker::Worker;
use crate::{EmitterError, EmitterResult};
use parking_lot::Mutex;
use std::sync::Arc;
use std::thread::{self, JoinHandle, ThreadId};
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};
use tracker_payload::Payload;

/// Builder for an [`Emitter`] with a custom transport or observer.
pub struct EmitterBuilder {
    config: EmitterConfig,
    transport: Option<Arc<dyn Transport>>,
    observer: Arc<dyn DeliveryObserver>,
}

impl EmitterBuilder {
    /// Replace the HTTP transport.
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn observer(mut self, observer: Arc<dyn DeliveryObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Validate the configuration and start the delivery worker.
    pub fn build(self) -> EmitterResult<Emitter> {
        self.config.validate()?;
        let transport = match self.transport {
            Some(transport) => transport,
            None => Arc::new(HttpTransport::new(&self.config)?),
        };
        Emitter::start(self.config, transport, self.observer)
    }
}

/// Asynchronous, batching event emitter.
///
/// Producers call [`Emitter::enqueue`] from any thread; a single background
/// worker batches payloads and delivers them through the transport, retrying
/// transient failures with backoff. [`Emitter::shutdown`] drains what remains
/// within a deadline. Dropping the emitter performs the same shutdown with
/// the configured default deadline.
pub struct Emitter {
    config: EmitterConfig,
    queue: Arc<EventQueue>,
    lifecycle: Arc<Lifecycle>,
    observer: Arc<dyn DeliveryObserver>,
    worker: Mutex<Option<JoinHandle<()>>>,
    worker_thread: ThreadId,
}

impl Emitter {
    /// Emitter delivering over HTTP with no observer.
    pub fn new(config: EmitterConfig) -> EmitterResult<Self> {
        Self::builder(config).build()
    }

    pub fn builder(config: EmitterConfig) -> EmitterBuilder {
        EmitterBuilder {
            config,
            transport: None,
            observer: Arc::new(NoopObserver),
        }
    }

    fn start(
        config: EmitterConfig,
        transport: Arc<dyn Transport>,
        observer: Arc<dyn DeliveryObserver>,
    ) -> EmitterResult<Self> {
        let queue = Arc::new(EventQueue::new(config.queue_capacity, config.full_queue_policy));
        let lifecycle = Arc::new(Lifecycle::new());

        let worker = Worker {
            batcher: Batcher::new(
                Arc::clone(&queue),
                config.effective_batch_size(),
                config.buffer_timeout(),
            ),
            queue: Arc::clone(&queue),
            transport,
            observer: Arc::clone(&observer),
            lifecycle: Arc::clone(&lifecycle),
            max_retry_attempts: config.max_retry_attempts,
            backoff: config.backoff(),
        };
        let handle = worker.spawn()?;
        let worker_thread = handle.thread().id();

        info!(
            collector = %config.collector_url,
            batch_size = config.effective_batch_size(),
            queue_capacity = ?config.queue_capacity,
            "Emitter started"
        );

        Ok(Self {
            config,
            queue,
            lifecycle,
            observer,
            worker: Mutex::new(Some(handle)),
            worker_thread,
        })
    }

    /// Queue a payload for delivery. Never waits on the network.
    ///
    /// Fails with [`EmitterError::QueueClosed`] once shutdown has begun, and
    /// with [`EmitterError::QueueFull`] under the reject policy.
    pub fn enqueue(&self, payload: Payload) -> EmitterResult<()> {
        if self.lifecycle.state() != EmitterState::Running {
            return Err(EmitterError::QueueClosed);
        }

        let event_id = payload.event_id();
        if let Some(evicted) = self.queue.enqueue(QueuedItem::new(payload))? {
            let evicted_id = evicted.event_id();
            warn!(event_id = %evicted_id, "Queue full, dropped oldest event");
            self.observer.on_failure(&FailureNotice::Dropped {
                reason: DropReason::QueueOverflow,
                count: 1,
                first_event_id: evicted_id,
                last_event_id: evicted_id,
                detail: "evicted from full queue".to_string(),
            });
        }

        debug!(event_id = %event_id, "Event enqueued");
        Ok(())
    }

    /// Release partial batches now and wait until nothing is pending or in
    /// flight. Returns false if the timeout elapsed first.
    ///
    /// Called from a [`DeliveryObserver`] callback, this cannot wait for the
    /// batch being reported and returns false at once unless already idle.
    pub fn flush(&self, timeout: Duration) -> bool {
        if self.on_worker_thread() {
            return self.queue.wait_idle(Duration::ZERO);
        }
        self.queue.wait_idle(timeout)
    }

    /// Stop accepting events and drain within `timeout`.
    ///
    /// Returns once the worker has stopped. Payloads still undelivered at the
    /// deadline are dropped, reported to the observer, and listed in
    /// [`EmitterError::ShutdownIncomplete`]. A send already in progress at the
    /// deadline is allowed to finish, so the call can overrun by at most one
    /// request timeout. Later or concurrent calls return the same result.
    /// A timeout too large to represent as a deadline drains without one.
    ///
    /// Called from a [`DeliveryObserver`] callback, this only begins the
    /// drain and returns `Ok(())` without waiting for the worker to stop.
    pub fn shutdown(&self, timeout: Duration) -> EmitterResult<()> {
        if self
            .lifecycle
            .begin_drain(Instant::now().checked_add(timeout))
        {
            info!(
                timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
                pending = self.pending(),
                "Emitter draining"
            );
            self.queue.close();
        }

        if self.on_worker_thread() {
            debug!("Shutdown requested from the delivery worker, not waiting");
            return Ok(());
        }

        let dropped = self.lifecycle.wait_stopped();
        if let Some(handle) = self.worker.lock().take() {
            if handle.join().is_err() {
                error!("Delivery worker panicked");
            }
            if dropped.is_empty() {
                info!("Emitter stopped");
            } else {
                warn!(dropped = dropped.len(), "Emitter stopped with undelivered events");
            }
        }

        if dropped.is_empty() {
            Ok(())
        } else {
            Err(EmitterError::ShutdownIncomplete {
                dropped: dropped.len(),
                event_ids: dropped,
            })
        }
    }

    pub fn state(&self) -> EmitterState {
        self.lifecycle.state()
    }

    /// Payloads queued or in flight.
    pub fn pending(&self) -> usize {
        self.queue.len() + self.queue.in_flight()
    }

    pub fn config(&self) -> &EmitterConfig {
        &self.config
    }

    fn on_worker_thread(&self) -> bool {
        thread::current().id() == self.worker_thread
    }
}

impl Drop for Emitter {
    fn drop(&mut self) {
        if self.lifecycle.state() == EmitterState::Stopped && self.worker.get_mut().is_none() {
            return;
        }
        if let Err(e) = self.shutdown(self.config.shutdown_timeout()) {
            warn!(error = %e, "Emitter dropped before delivering all events");
        }
    }
}
