//! Console demo: sends one of every event type to a collector.
//!
//! Usage: tracker-demo <collector-url> [--batch-size 4] [--config settings.json]
//!
//! Seven payloads are queued (the ecommerce transaction expands into a
//! transaction plus one item) and the process exits once the emitter has
//! drained or the shutdown deadline passes.

use anyhow::{bail, Context, Result};
use batch_emitter::{EmitterConfig, HttpMethod};
use clap::{Parser, ValueEnum};
use serde_json::json;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, warn};
use tracker::{Tracker, TrackerConfig, TrackerError, TrackerRegistry, TrackerSettings};
use tracker_events::{
    EcommerceTransaction, EcommerceTransactionItem, Event, PageView, ScreenView, Structured,
    Subject, Timing,
};
use tracker_payload::SelfDescribingJson;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Method {
    Post,
    Get,
}

impl From<Method> for HttpMethod {
    fn from(method: Method) -> Self {
        match method {
            Method::Post => HttpMethod::Post,
            Method::Get => HttpMethod::Get,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "tracker-demo")]
#[command(about = "Send one of every event type to a Snowplow collector")]
struct Args {
    /// Collector URL, e.g. http://localhost:9090. Scheme defaults to https.
    #[arg(env = "TRACKER_COLLECTOR_URL")]
    collector_url: Option<String>,

    /// JSON settings file with `tracker` and `emitter` sections.
    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long, default_value = "demo")]
    namespace: String,

    #[arg(long, default_value = "rust-tracker-sample-console-app")]
    app_id: String,

    /// Events per request. Production setups use larger batches.
    #[arg(long, env = "TRACKER_BATCH_SIZE", default_value = "4")]
    batch_size: usize,

    #[arg(long, value_enum, default_value = "post")]
    method: Method,

    /// Seconds to wait for delivery before giving up on queued events.
    #[arg(long, default_value = "5")]
    shutdown_timeout_secs: u64,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Also write JSONL logs to this file.
    #[arg(long)]
    log_file: Option<PathBuf>,
}

impl Args {
    fn settings(&self) -> Result<TrackerSettings> {
        let mut settings = match &self.config {
            Some(path) => TrackerSettings::load_from_file(path)
                .with_context(|| format!("failed to load settings from {}", path.display()))?,
            None => {
                let Some(url) = &self.collector_url else {
                    bail!("a collector URL is required (argument or TRACKER_COLLECTOR_URL)");
                };
                let mut emitter = EmitterConfig::new(url.clone());
                emitter.batch_size = self.batch_size;
                emitter.method = self.method.into();
                TrackerSettings {
                    tracker: TrackerConfig::new(&self.namespace, &self.app_id),
                    emitter,
                }
            }
        };

        if let (Some(_), Some(url)) = (&self.config, &self.collector_url) {
            settings.emitter.collector_url = url.clone();
        }
        settings.emitter.validate()?;
        Ok(settings)
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    observability::init_with_config(observability::LogConfig {
        service_name: "tracker-demo".into(),
        default_level: args.log_level.clone(),
        log_path: args.log_file.clone(),
        also_stderr: true,
    })?;

    let settings = args.settings()?;
    info!(
        collector_url = %settings.emitter.collector_url,
        batch_size = settings.emitter.batch_size,
        namespace = %settings.tracker.namespace,
        "Configuration loaded"
    );

    let registry = TrackerRegistry::new();
    let tracker = registry.register(Tracker::create(settings.tracker, settings.emitter)?)?;
    println!("Using tracker version {}", tracker.tracker_version());

    let tracked = track_all(&tracker)?;
    println!("Tracked {tracked} events");

    match registry.shutdown_all(Duration::from_secs(args.shutdown_timeout_secs)) {
        Ok(()) => {
            info!("All events delivered or settled");
            Ok(())
        }
        Err(TrackerError::ShutdownIncomplete { namespaces, dropped }) => {
            warn!(?namespaces, dropped, "Shutdown deadline passed");
            bail!("{dropped} events were not delivered before the deadline")
        }
        Err(e) => Err(e.into()),
    }
}

/// Track one of every event type. Returns the number of payloads queued.
fn track_all(tracker: &Tracker) -> Result<usize> {
    let context = vec![SelfDescribingJson::new(
        "iglu:com.snowplowanalytics.iglu/anything-c/jsonschema/1-0-0",
        json!({"foo": "bar"}),
    )];

    let event_subject = Subject::new()
        .user_id("example@snowplowanalytics.com")
        .language("EN");

    let page_view = Event::page_view(
        PageView::new("https://www.snowplowanalytics.com")
            .title("Snowplow Analytics")
            .referrer("https://www.google.com"),
    )?
    .with_contexts(context.clone())?
    .with_subject(event_subject);

    let item = EcommerceTransactionItem::new("sku", 1.0, 2)
        .name("name")
        .category("category")
        .currency("currency")
        .contexts(context.clone());
    let transaction = Event::ecommerce_transaction(
        EcommerceTransaction::new("order_id", 1.0)
            .affiliation("affiliation")
            .tax_value(2.0)
            .shipping(3.0)
            .city("city")
            .state("state")
            .country("country")
            .currency("currency")
            .item(item),
    )?
    .with_contexts(context.clone())?;

    let self_describing = Event::self_describing(SelfDescribingJson::new(
        "iglu:com.snowplowanalytics.iglu/anything-a/jsonschema/1-0-0",
        json!({"foo": "bar"}),
    ))?
    .with_contexts(context.clone())?;

    let screen_view = Event::screen_view(ScreenView::new().name("name").id("id"))?
        .with_contexts(context.clone())?;

    let timing = Event::timing(Timing::new("category", "variable", 10).label("label"))?
        .with_contexts(context.clone())?;

    let structured = Event::structured(
        Structured::new("category", "action")
            .label("label")
            .property("property")
            .value(12.34),
    )?
    .with_contexts(context)?;

    let mut queued = 0;
    for event in [
        &page_view,
        &transaction,
        &self_describing,
        &screen_view,
        &timing,
        &structured,
    ] {
        queued += tracker.track(event)?.len();
    }
    Ok(queued)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn args_build_emitter_settings() {
        let args = Args::parse_from([
            "tracker-demo",
            "collector.example.com",
            "--batch-size",
            "2",
            "--method",
            "get",
        ]);
        let settings = args.settings().unwrap();
        assert_eq!(settings.tracker.namespace, "demo");
        assert_eq!(settings.emitter.batch_size, 2);
        assert_eq!(settings.emitter.method, HttpMethod::Get);
    }

    #[test]
    fn args_require_a_collector_url() {
        let args = Args {
            collector_url: None,
            config: None,
            namespace: "demo".into(),
            app_id: "app".into(),
            batch_size: 4,
            method: Method::Post,
            shutdown_timeout_secs: 1,
            log_level: "info".into(),
            log_file: None,
        };
        assert!(args.settings().is_err());
    }
}
