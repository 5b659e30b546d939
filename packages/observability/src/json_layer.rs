//! JSONL layer: one [`LogEntry`] object per tracing event.

use chrono::Utc;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::io::Write;
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::layer::Context;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::Layer;

/// A single structured log line.
#[derive(Debug, Clone, Serialize)]
pub struct LogEntry {
    /// RFC 3339, microsecond precision, UTC.
    pub timestamp: String,
    pub level: &'static str,
    pub service: String,
    pub pid: u32,
    /// Module path of the call site.
    pub target: String,
    pub message: String,
    /// Structured fields, e.g. `batch_size`, `event_id`.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub fields: BTreeMap<String, Value>,
    /// Innermost span name, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub span: Option<String>,
}

#[derive(Default)]
struct FieldVisitor {
    fields: BTreeMap<String, Value>,
    message: Option<String>,
}

impl FieldVisitor {
    fn insert(&mut self, field: &Field, value: Value) {
        self.fields.insert(field.name().to_string(), value);
    }
}

impl Visit for FieldVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        let text = format!("{value:?}");
        if field.name() == "message" {
            self.message = Some(text);
        } else {
            self.insert(field, Value::String(text));
        }
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message = Some(value.to_string());
        } else {
            self.insert(field, Value::String(value.to_string()));
        }
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.insert(field, Value::from(value));
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.insert(field, Value::from(value));
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.insert(field, Value::Bool(value));
    }

    fn record_f64(&mut self, field: &Field, value: f64) {
        let value = serde_json::Number::from_f64(value)
            .map(Value::Number)
            .unwrap_or_else(|| Value::String(value.to_string()));
        self.insert(field, value);
    }

    fn record_error(&mut self, field: &Field, value: &(dyn std::error::Error + 'static)) {
        self.insert(field, Value::String(value.to_string()));
    }
}

/// Layer writing [`LogEntry`] lines through a [`MakeWriter`].
pub struct JsonLayer<W> {
    service_name: String,
    pid: u32,
    make_writer: W,
}

impl<W> JsonLayer<W> {
    pub fn new(service_name: String, make_writer: W) -> Self {
        Self {
            service_name,
            pid: std::process::id(),
            make_writer,
        }
    }
}

impl<S, W> Layer<S> for JsonLayer<W>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    W: for<'writer> MakeWriter<'writer> + 'static,
{
    fn on_event(&self, event: &Event<'_>, ctx: Context<'_, S>) {
        let mut visitor = FieldVisitor::default();
        event.record(&mut visitor);
        let metadata = event.metadata();

        let entry = LogEntry {
            timestamp: Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Micros, true),
            level: level_name(*metadata.level()),
            service: self.service_name.clone(),
            pid: self.pid,
            target: metadata.target().to_string(),
            message: visitor.message.unwrap_or_default(),
            fields: visitor.fields,
            span: ctx.event_span(event).map(|span| span.name().to_string()),
        };

        if let Ok(json) = serde_json::to_string(&entry) {
            let mut writer = self.make_writer.make_writer();
            let _ = writeln!(writer, "{json}");
        }
    }
}

fn level_name(level: Level) -> &'static str {
    match level {
        Level::TRACE => "TRACE",
        Level::DEBUG => "DEBUG",
        Level::INFO => "INFO",
        Level::WARN => "WARN",
        Level::ERROR => "ERROR",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{FileLogWriter, WriterFactory};
    use tracing_subscriber::layer::SubscriberExt;

    #[test]
    fn events_are_written_as_json_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("demo.jsonl");
        let factory = WriterFactory::new(FileLogWriter::new(&path).unwrap());
        let subscriber =
            tracing_subscriber::registry().with(JsonLayer::new("demo".to_string(), factory));

        tracing::subscriber::with_default(subscriber, || {
            let span = tracing::info_span!("delivery");
            let _guard = span.enter();
            tracing::warn!(batch_size = 4, retry = true, "Batch delivery failed");
        });

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 1);

        let entry: Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(entry["level"], "WARN");
        assert_eq!(entry["service"], "demo");
        assert_eq!(entry["message"], "Batch delivery failed");
        assert_eq!(entry["fields"]["batch_size"], 4);
        assert_eq!(entry["fields"]["retry"], true);
        assert_eq!(entry["span"], "delivery");
        assert_eq!(entry["pid"], std::process::id());
    }

    #[test]
    fn empty_fields_and_span_are_omitted() {
        let entry = LogEntry {
            timestamp: "2026-01-15T10:30:00.000000Z".to_string(),
            level: "INFO",
            service: "tracker-demo".to_string(),
            pid: 42,
            target: "batch_emitter::worker".to_string(),
            message: "Emitter stopped".to_string(),
            fields: BTreeMap::new(),
            span: None,
        };

        let json = serde_json::to_string(&entry).unwrap();
        assert!(json.contains("\"service\":\"tracker-demo\""));
        assert!(!json.contains("fields"));
        assert!(!json.contains("span"));
    }
}
