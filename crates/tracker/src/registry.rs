//! Named tracker instances.

use crate::tracker::Tracker;
use crate::{TrackerError, TrackerResult};
use batch_emitter::EmitterError;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, warn};

#[derive(Default)]
struct RegistryState {
    trackers: HashMap<String, Arc<Tracker>>,
    default_namespace: Option<String>,
}

/// Registry of trackers keyed by namespace.
///
/// Created by the application and passed where needed. The first tracker
/// registered becomes the default until another is chosen or it is removed.
#[derive(Default)]
pub struct TrackerRegistry {
    state: RwLock<RegistryState>,
}

impl TrackerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a tracker under its namespace.
    pub fn register(&self, tracker: Tracker) -> TrackerResult<Arc<Tracker>> {
        let namespace = tracker.namespace().to_string();
        let mut state = self.state.write();
        if state.trackers.contains_key(&namespace) {
            return Err(TrackerError::DuplicateNamespace(namespace));
        }

        let tracker = Arc::new(tracker);
        state.trackers.insert(namespace.clone(), Arc::clone(&tracker));
        if state.default_namespace.is_none() {
            state.default_namespace = Some(namespace.clone());
        }
        info!(namespace = %namespace, "Tracker registered");
        Ok(tracker)
    }

    pub fn get(&self, namespace: &str) -> Option<Arc<Tracker>> {
        self.state.read().trackers.get(namespace).cloned()
    }

    pub fn default_tracker(&self) -> Option<Arc<Tracker>> {
        let state = self.state.read();
        state
            .default_namespace
            .as_ref()
            .and_then(|namespace| state.trackers.get(namespace))
            .cloned()
    }

    pub fn set_default(&self, namespace: &str) -> TrackerResult<()> {
        let mut state = self.state.write();
        if !state.trackers.contains_key(namespace) {
            return Err(TrackerError::UnknownNamespace(namespace.to_string()));
        }
        state.default_namespace = Some(namespace.to_string());
        Ok(())
    }

    /// Remove a tracker, clearing the default if it was the default.
    pub fn remove(&self, namespace: &str) -> Option<Arc<Tracker>> {
        let mut state = self.state.write();
        let removed = state.trackers.remove(namespace);
        if state.default_namespace.as_deref() == Some(namespace) {
            state.default_namespace = None;
        }
        removed
    }

    /// Registered namespaces, sorted.
    pub fn namespaces(&self) -> Vec<String> {
        let mut namespaces: Vec<String> = self.state.read().trackers.keys().cloned().collect();
        namespaces.sort();
        namespaces
    }

    pub fn len(&self) -> usize {
        self.state.read().trackers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.read().trackers.is_empty()
    }

    /// Remove every tracker and the default. Returns the removed trackers.
    pub fn reset(&self) -> Vec<Arc<Tracker>> {
        let mut state = self.state.write();
        state.default_namespace = None;
        state.trackers.drain().map(|(_, tracker)| tracker).collect()
    }

    /// Shut down every registered tracker, sharing one deadline.
    ///
    /// A timeout too large to represent as a deadline is passed to each
    /// tracker unchanged.
    pub fn shutdown_all(&self, timeout: Duration) -> TrackerResult<()> {
        let deadline = Instant::now().checked_add(timeout);
        let mut trackers: Vec<Arc<Tracker>> = self.state.read().trackers.values().cloned().collect();
        trackers.sort_by(|a, b| a.namespace().cmp(b.namespace()));

        let mut incomplete = Vec::new();
        let mut dropped = 0;
        for tracker in trackers {
            let remaining = deadline
                .map_or(timeout, |deadline| deadline.saturating_duration_since(Instant::now()));
            match tracker.shutdown(remaining) {
                Ok(()) => {}
                Err(EmitterError::ShutdownIncomplete { dropped: count, .. }) => {
                    warn!(namespace = %tracker.namespace(), dropped = count, "Tracker stopped with undelivered events");
                    incomplete.push(tracker.namespace().to_string());
                    dropped += count;
                }
                Err(e) => return Err(e.into()),
            }
        }

        if incomplete.is_empty() {
            Ok(())
        } else {
            Err(TrackerError::ShutdownIncomplete {
                namespaces: incomplete,
                dropped,
            })
        }
    }
}
