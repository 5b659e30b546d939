mod common;

use common::capturing_tracker;
use std::time::Duration;
use tracker::{TrackerConfig, TrackerError, TrackerRegistry};

fn tracker(namespace: &str) -> tracker::Tracker {
    capturing_tracker(TrackerConfig::new(namespace, "app")).0
}

#[test]
fn first_registered_tracker_is_default() {
    let registry = TrackerRegistry::new();
    registry.register(tracker("web")).unwrap();
    registry.register(tracker("server")).unwrap();

    assert_eq!(registry.default_tracker().unwrap().namespace(), "web");
    assert_eq!(registry.namespaces(), vec!["server", "web"]);
}

#[test]
fn duplicate_namespace_is_rejected() {
    let registry = TrackerRegistry::new();
    registry.register(tracker("web")).unwrap();

    assert!(matches!(
        registry.register(tracker("web")),
        Err(TrackerError::DuplicateNamespace(ns)) if ns == "web"
    ));
    assert_eq!(registry.len(), 1);
}

#[test]
fn removing_default_clears_it() {
    let registry = TrackerRegistry::new();
    registry.register(tracker("web")).unwrap();
    registry.register(tracker("server")).unwrap();

    assert!(registry.remove("web").is_some());
    assert!(registry.default_tracker().is_none());
    assert!(registry.get("server").is_some());
    assert!(registry.remove("web").is_none());
}

#[test]
fn set_default_requires_registered_namespace() {
    let registry = TrackerRegistry::new();
    registry.register(tracker("web")).unwrap();
    registry.register(tracker("server")).unwrap();

    registry.set_default("server").unwrap();
    assert_eq!(registry.default_tracker().unwrap().namespace(), "server");
    assert!(matches!(
        registry.set_default("mobile"),
        Err(TrackerError::UnknownNamespace(_))
    ));
}

#[test]
fn reset_empties_the_registry() {
    let registry = TrackerRegistry::new();
    registry.register(tracker("web")).unwrap();

    let removed = registry.reset();
    assert_eq!(removed.len(), 1);
    assert!(registry.is_empty());
    assert!(registry.default_tracker().is_none());
}

#[test]
fn shutdown_all_stops_every_tracker() {
    let registry = TrackerRegistry::new();
    let web = registry.register(tracker("web")).unwrap();
    let server = registry.register(tracker("server")).unwrap();

    registry.shutdown_all(Duration::from_secs(5)).unwrap();
    assert_eq!(web.emitter().state(), batch_emitter::EmitterState::Stopped);
    assert_eq!(server.emitter().state(), batch_emitter::EmitterState::Stopped);
}

#[test]
fn shutdown_all_accepts_an_unbounded_timeout() {
    let registry = TrackerRegistry::new();
    let web = registry.register(tracker("web")).unwrap();

    registry.shutdown_all(Duration::MAX).unwrap();
    assert_eq!(web.emitter().state(), batch_emitter::EmitterState::Stopped);
}
