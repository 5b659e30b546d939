//! Immutable, ordered key/value encoding of a single event.

use crate::constants::{keys, RESERVED_KEYS};
use crate::{PayloadError, PayloadResult};
use base64::Engine;
use chrono::Utc;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use std::fmt;
use uuid::Uuid;

/// Base64 engine for encoded contexts and self-describing bodies.
const BASE64_URL: base64::engine::GeneralPurpose = base64::engine::general_purpose::URL_SAFE_NO_PAD;

/// A single payload value.
///
/// The collector only understands strings, so numbers are rendered with
/// [`PayloadValue::to_wire_string`] when a payload goes on the wire.
#[derive(Debug, Clone, PartialEq)]
pub enum PayloadValue {
    Text(String),
    Integer(i64),
    Float(f64),
}

impl PayloadValue {
    /// Render the value as the collector expects it.
    pub fn to_wire_string(&self) -> String {
        match self {
            Self::Text(value) => value.clone(),
            Self::Integer(value) => value.to_string(),
            Self::Float(value) => value.to_string(),
        }
    }

    /// Borrow the text, if this is a text value.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(value) => Some(value),
            _ => None,
        }
    }
}

impl fmt::Display for PayloadValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_wire_string())
    }
}

impl From<String> for PayloadValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<&str> for PayloadValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<&String> for PayloadValue {
    fn from(value: &String) -> Self {
        Self::Text(value.clone())
    }
}

impl From<i64> for PayloadValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<i32> for PayloadValue {
    fn from(value: i32) -> Self {
        Self::Integer(value.into())
    }
}

impl From<u32> for PayloadValue {
    fn from(value: u32) -> Self {
        Self::Integer(value.into())
    }
}

impl From<f64> for PayloadValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

/// The flattened encoding of one tracked event.
///
/// Built once through [`PayloadBuilder`] and never mutated afterwards.
/// Entries keep insertion order; `eid`, `dtm` and the optional `ttm` are
/// stamped by the builder and always present in [`Payload::entries`].
#[derive(Debug, Clone, PartialEq)]
pub struct Payload {
    event_id: Uuid,
    created_at: i64,
    true_timestamp: Option<i64>,
    entries: Vec<(String, PayloadValue)>,
}

impl Payload {
    /// Unique event identifier (`eid`).
    pub fn event_id(&self) -> Uuid {
        self.event_id
    }

    /// Device-created timestamp in epoch milliseconds (`dtm`).
    pub fn created_at(&self) -> i64 {
        self.created_at
    }

    /// Caller-supplied true timestamp in epoch milliseconds (`ttm`).
    pub fn true_timestamp(&self) -> Option<i64> {
        self.true_timestamp
    }

    /// All entries in insertion order.
    pub fn entries(&self) -> &[(String, PayloadValue)] {
        &self.entries
    }

    /// Look up a value by key.
    pub fn get(&self, key: &str) -> Option<&PayloadValue> {
        self.entries
            .iter()
            .find(|(existing, _)| existing == key)
            .map(|(_, value)| value)
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the payload has no entries (never true for built payloads).
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Wire view of this payload with the device-sent timestamp attached.
    pub fn with_sent_timestamp(&self, sent_at: i64) -> WirePayload<'_> {
        WirePayload {
            payload: self,
            sent_at,
        }
    }
}

impl Serialize for Payload {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, value) in &self.entries {
            map.serialize_entry(key, &value.to_wire_string())?;
        }
        map.end()
    }
}

/// A payload as sent to the collector, including `stm`.
#[derive(Debug, Clone, Copy)]
pub struct WirePayload<'a> {
    payload: &'a Payload,
    sent_at: i64,
}

impl WirePayload<'_> {
    /// Key/value pairs for query-string encoding, in payload order.
    pub fn query_pairs(&self) -> Vec<(&str, String)> {
        let mut pairs: Vec<(&str, String)> = self
            .payload
            .entries
            .iter()
            .map(|(key, value)| (key.as_str(), value.to_wire_string()))
            .collect();
        pairs.push((keys::DEVICE_SENT_TIMESTAMP, self.sent_at.to_string()));
        pairs
    }
}

impl Serialize for WirePayload<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.payload.entries.len() + 1))?;
        for (key, value) in &self.payload.entries {
            map.serialize_entry(key, &value.to_wire_string())?;
        }
        map.serialize_entry(keys::DEVICE_SENT_TIMESTAMP, &self.sent_at.to_string())?;
        map.end()
    }
}

/// Builder for [`Payload`].
///
/// Generates a fresh event id and device-created timestamp unless
/// overridden. Absent optional values are skipped, duplicate keys rejected.
#[derive(Debug)]
pub struct PayloadBuilder {
    event_id: Uuid,
    created_at: i64,
    true_timestamp: Option<i64>,
    entries: Vec<(String, PayloadValue)>,
}

impl Default for PayloadBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl PayloadBuilder {
    /// Create a builder with a new event id and the current time as `dtm`.
    pub fn new() -> Self {
        Self {
            event_id: Uuid::new_v4(),
            created_at: Utc::now().timestamp_millis(),
            true_timestamp: None,
            entries: Vec::new(),
        }
    }

    /// Override the generated event id.
    pub fn event_id(mut self, event_id: Uuid) -> Self {
        self.event_id = event_id;
        self
    }

    /// Override the device-created timestamp.
    pub fn created_at(mut self, created_at: i64) -> Self {
        self.created_at = created_at;
        self
    }

    /// Set the caller-supplied true timestamp.
    pub fn true_timestamp(mut self, true_timestamp: Option<i64>) -> Self {
        self.true_timestamp = true_timestamp;
        self
    }

    /// Builder for a related event sharing this one's timestamps but with
    /// its own event id.
    pub fn sibling(&self) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            created_at: self.created_at,
            true_timestamp: self.true_timestamp,
            entries: Vec::new(),
        }
    }

    /// Add a key/value pair.
    pub fn add(&mut self, key: &str, value: impl Into<PayloadValue>) -> PayloadResult<()> {
        if key.is_empty() {
            return Err(PayloadError::EmptyKey);
        }
        if RESERVED_KEYS.contains(&key) {
            return Err(PayloadError::ReservedKey(key.to_string()));
        }
        if self.entries.iter().any(|(existing, _)| existing == key) {
            return Err(PayloadError::DuplicateKey(key.to_string()));
        }
        self.entries.push((key.to_string(), value.into()));
        Ok(())
    }

    /// Add a key/value pair when the value is present. Empty strings count as absent.
    pub fn add_opt<V: Into<PayloadValue>>(&mut self, key: &str, value: Option<V>) -> PayloadResult<()> {
        match value.map(Into::into) {
            Some(PayloadValue::Text(text)) if text.is_empty() => Ok(()),
            Some(value) => self.add(key, value),
            None => Ok(()),
        }
    }

    /// Add a JSON document, either base64url-encoded under `encoded_key` or
    /// verbatim under `plain_key`.
    pub fn add_json<T: Serialize + ?Sized>(
        &mut self,
        value: &T,
        base64_encode: bool,
        encoded_key: &str,
        plain_key: &str,
    ) -> PayloadResult<()> {
        let json = serde_json::to_string(value)?;
        if base64_encode {
            self.add(encoded_key, BASE64_URL.encode(json.as_bytes()))
        } else {
            self.add(plain_key, json)
        }
    }

    /// Add every entry of another set of pairs, e.g. subject properties.
    pub fn extend<I, K, V>(&mut self, pairs: I) -> PayloadResult<()>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<PayloadValue>,
    {
        for (key, value) in pairs {
            self.add(key.as_ref(), value)?;
        }
        Ok(())
    }

    /// Whether a key has been added.
    pub fn contains(&self, key: &str) -> bool {
        self.entries.iter().any(|(existing, _)| existing == key)
    }

    /// Finish the payload, stamping `eid`, `dtm` and `ttm`.
    pub fn build(mut self) -> Payload {
        self.entries
            .push((keys::EVENT_ID.to_string(), self.event_id.to_string().into()));
        self.entries.push((
            keys::DEVICE_CREATED_TIMESTAMP.to_string(),
            PayloadValue::Integer(self.created_at),
        ));
        if let Some(ttm) = self.true_timestamp {
            self.entries
                .push((keys::TRUE_TIMESTAMP.to_string(), PayloadValue::Integer(ttm)));
        }

        Payload {
            event_id: self.event_id,
            created_at: self.created_at,
            true_timestamp: self.true_timestamp,
            entries: self.entries,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_stamps_identity_fields() {
        let mut builder = PayloadBuilder::new().created_at(1_700_000_000_000);
        builder.add(keys::EVENT, "pv").unwrap();
        let payload = builder.build();

        assert_eq!(payload.get("e").unwrap().as_str(), Some("pv"));
        assert_eq!(
            payload.get("eid").unwrap().to_wire_string(),
            payload.event_id().to_string()
        );
        assert_eq!(payload.get("dtm"), Some(&PayloadValue::Integer(1_700_000_000_000)));
        assert!(payload.get("ttm").is_none());
    }

    #[test]
    fn true_timestamp_is_written_when_present() {
        let payload = PayloadBuilder::new().true_timestamp(Some(42)).build();
        assert_eq!(payload.true_timestamp(), Some(42));
        assert_eq!(payload.get("ttm"), Some(&PayloadValue::Integer(42)));
    }

    #[test]
    fn event_ids_are_unique() {
        let a = PayloadBuilder::new().build();
        let b = PayloadBuilder::new().build();
        assert_ne!(a.event_id(), b.event_id());
    }

    #[test]
    fn sibling_shares_timestamps_not_identity() {
        let parent = PayloadBuilder::new().created_at(5).true_timestamp(Some(3));
        let child = parent.sibling().build();
        let parent = parent.build();

        assert_eq!(child.created_at(), 5);
        assert_eq!(child.true_timestamp(), Some(3));
        assert_ne!(child.event_id(), parent.event_id());
    }

    #[test]
    fn duplicate_and_reserved_keys_are_rejected() {
        let mut builder = PayloadBuilder::new();
        builder.add("url", "https://a").unwrap();

        assert!(matches!(
            builder.add("url", "https://b"),
            Err(PayloadError::DuplicateKey(key)) if key == "url"
        ));
        assert!(matches!(builder.add("eid", "x"), Err(PayloadError::ReservedKey(_))));
        assert!(matches!(builder.add("", "x"), Err(PayloadError::EmptyKey)));
    }

    #[test]
    fn absent_and_empty_optionals_are_skipped() {
        let mut builder = PayloadBuilder::new();
        builder.add_opt::<String>("page", None).unwrap();
        builder.add_opt("refr", Some("")).unwrap();
        builder.add_opt("se_va", Some(1.5)).unwrap();

        assert!(!builder.contains("page"));
        assert!(!builder.contains("refr"));
        assert!(builder.contains("se_va"));
    }

    #[test]
    fn add_json_encodes_or_embeds() {
        let body = serde_json::json!({"schema": "iglu:x", "data": {"a": 1}});

        let mut encoded = PayloadBuilder::new();
        encoded.add_json(&body, true, "cx", "co").unwrap();
        let encoded = encoded.build();
        let cx = encoded.get("cx").unwrap().as_str().unwrap().to_string();
        let decoded = BASE64_URL.decode(cx).unwrap();
        assert_eq!(serde_json::from_slice::<serde_json::Value>(&decoded).unwrap(), body);
        assert!(encoded.get("co").is_none());

        let mut plain = PayloadBuilder::new();
        plain.add_json(&body, false, "cx", "co").unwrap();
        let plain = plain.build();
        assert!(plain.get("co").unwrap().as_str().unwrap().contains("iglu:x"));
    }

    #[test]
    fn serialization_preserves_insertion_order_and_stringifies() {
        let mut builder = PayloadBuilder::new().created_at(10);
        builder.add("e", "se").unwrap();
        builder.add("se_va", 2.5).unwrap();
        let payload = builder.build();

        let json = serde_json::to_string(&payload.with_sent_timestamp(20)).unwrap();
        let e_pos = json.find("\"e\"").unwrap();
        let va_pos = json.find("\"se_va\":\"2.5\"").unwrap();
        let stm_pos = json.find("\"stm\":\"20\"").unwrap();
        assert!(e_pos < va_pos && va_pos < stm_pos);
        assert!(json.contains("\"dtm\":\"10\""));
    }

    #[test]
    fn query_pairs_end_with_sent_timestamp() {
        let mut builder = PayloadBuilder::new();
        builder.add("e", "pv").unwrap();
        let payload = builder.build();

        let stamped = payload.with_sent_timestamp(99);
        let pairs = stamped.query_pairs();
        assert_eq!(pairs.first().unwrap(), &("e", "pv".to_string()));
        assert_eq!(pairs.last().unwrap(), &("stm", "99".to_string()));
    }
}
