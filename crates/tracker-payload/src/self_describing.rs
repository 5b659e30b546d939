//! Self-describing JSON: a schema URI paired with a data document.

use crate::constants::schema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A JSON document tagged with the Iglu schema it conforms to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelfDescribingJson {
    pub schema: String,
    pub data: Value,
}

impl SelfDescribingJson {
    pub fn new(schema: impl Into<String>, data: impl Into<Value>) -> Self {
        Self {
            schema: schema.into(),
            data: data.into(),
        }
    }

    /// Wrap an event body in the `unstruct_event` envelope.
    pub fn unstruct_event(event: &SelfDescribingJson) -> serde_json::Result<Self> {
        Ok(Self::new(schema::SELF_DESCRIBING_EVENT, serde_json::to_value(event)?))
    }

    /// Wrap a list of custom contexts in the `contexts` envelope.
    pub fn contexts(contexts: &[SelfDescribingJson]) -> serde_json::Result<Self> {
        Ok(Self::new(schema::CONTEXTS, serde_json::to_value(contexts)?))
    }
}
