//! Event variants and their encoding into payloads.

use crate::ecommerce::EcommerceTransaction;
use crate::{EventError, EventResult, Subject};
use serde_json::{Map, Value};
use tracker_payload::constants::{event_type, keys, schema};
use tracker_payload::{PayloadBuilder, SelfDescribingJson};

/// A page view.
#[derive(Debug, Clone, PartialEq)]
pub struct PageView {
    pub page_url: String,
    pub page_title: Option<String>,
    pub referrer: Option<String>,
}

impl PageView {
    pub fn new(page_url: impl Into<String>) -> Self {
        Self {
            page_url: page_url.into(),
            page_title: None,
            referrer: None,
        }
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.page_title = Some(title.into());
        self
    }

    pub fn referrer(mut self, referrer: impl Into<String>) -> Self {
        self.referrer = Some(referrer.into());
        self
    }
}

/// A category/action event with optional label, property and value.
#[derive(Debug, Clone, PartialEq)]
pub struct Structured {
    pub category: String,
    pub action: String,
    pub label: Option<String>,
    pub property: Option<String>,
    pub value: Option<f64>,
}

impl Structured {
    pub fn new(category: impl Into<String>, action: impl Into<String>) -> Self {
        Self {
            category: category.into(),
            action: action.into(),
            label: None,
            property: None,
            value: None,
        }
    }

    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn property(mut self, property: impl Into<String>) -> Self {
        self.property = Some(property.into());
        self
    }

    pub fn value(mut self, value: f64) -> Self {
        self.value = Some(value);
        self
    }
}

/// A screen view, sent as a self-describing event.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScreenView {
    pub name: Option<String>,
    pub id: Option<String>,
}

impl ScreenView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    fn to_json(&self) -> SelfDescribingJson {
        let mut data = Map::new();
        insert_opt(&mut data, keys::SV_NAME, self.name.as_deref());
        insert_opt(&mut data, keys::SV_ID, self.id.as_deref());
        SelfDescribingJson::new(schema::SCREEN_VIEW, Value::Object(data))
    }
}

/// A user timing, sent as a self-describing event.
#[derive(Debug, Clone, PartialEq)]
pub struct Timing {
    pub category: String,
    pub variable: String,
    /// Duration in milliseconds.
    pub timing: i64,
    pub label: Option<String>,
}

impl Timing {
    pub fn new(category: impl Into<String>, variable: impl Into<String>, timing: i64) -> Self {
        Self {
            category: category.into(),
            variable: variable.into(),
            timing,
            label: None,
        }
    }

    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    fn to_json(&self) -> SelfDescribingJson {
        let mut data = Map::new();
        data.insert(keys::UT_CATEGORY.to_string(), self.category.clone().into());
        data.insert(keys::UT_VARIABLE.to_string(), self.variable.clone().into());
        data.insert(keys::UT_TIMING.to_string(), self.timing.into());
        insert_opt(&mut data, keys::UT_LABEL, self.label.as_deref());
        SelfDescribingJson::new(schema::USER_TIMINGS, Value::Object(data))
    }
}

/// The closed set of event kinds.
#[derive(Debug, Clone, PartialEq)]
pub enum EventKind {
    PageView(PageView),
    Structured(Structured),
    SelfDescribing(SelfDescribingJson),
    ScreenView(ScreenView),
    Timing(Timing),
    EcommerceTransaction(EcommerceTransaction),
}

/// A validated event plus the properties every kind shares.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    kind: EventKind,
    contexts: Vec<SelfDescribingJson>,
    true_timestamp: Option<i64>,
    subject: Option<Subject>,
}

impl Event {
    fn from_kind(kind: EventKind) -> Self {
        Self {
            kind,
            contexts: Vec::new(),
            true_timestamp: None,
            subject: None,
        }
    }

    pub fn page_view(page_view: PageView) -> EventResult<Self> {
        require("page_url", &page_view.page_url)?;
        Ok(Self::from_kind(EventKind::PageView(page_view)))
    }

    pub fn structured(structured: Structured) -> EventResult<Self> {
        require("category", &structured.category)?;
        require("action", &structured.action)?;
        if let Some(value) = structured.value {
            require_finite("value", value)?;
        }
        Ok(Self::from_kind(EventKind::Structured(structured)))
    }

    pub fn self_describing(event_data: SelfDescribingJson) -> EventResult<Self> {
        require_schema(&event_data)?;
        Ok(Self::from_kind(EventKind::SelfDescribing(event_data)))
    }

    pub fn screen_view(screen_view: ScreenView) -> EventResult<Self> {
        let has_name = screen_view.name.as_deref().is_some_and(|n| !n.is_empty());
        let has_id = screen_view.id.as_deref().is_some_and(|i| !i.is_empty());
        if !has_name && !has_id {
            return Err(EventError::InvalidValue {
                field: "name",
                reason: "a screen view needs a name or an id".to_string(),
            });
        }
        Ok(Self::from_kind(EventKind::ScreenView(screen_view)))
    }

    pub fn timing(timing: Timing) -> EventResult<Self> {
        require("category", &timing.category)?;
        require("variable", &timing.variable)?;
        Ok(Self::from_kind(EventKind::Timing(timing)))
    }

    pub fn ecommerce_transaction(transaction: EcommerceTransaction) -> EventResult<Self> {
        transaction.validate()?;
        Ok(Self::from_kind(EventKind::EcommerceTransaction(transaction)))
    }

    /// Attach custom context entities.
    pub fn with_contexts(mut self, contexts: Vec<SelfDescribingJson>) -> EventResult<Self> {
        for context in &contexts {
            require_schema(context)?;
        }
        self.contexts = contexts;
        Ok(self)
    }

    /// Set the caller-supplied true timestamp (epoch milliseconds).
    pub fn with_true_timestamp(mut self, true_timestamp: i64) -> Self {
        self.true_timestamp = Some(true_timestamp);
        self
    }

    /// Attach an event-level subject.
    pub fn with_subject(mut self, subject: Subject) -> Self {
        self.subject = Some(subject);
        self
    }

    pub fn kind(&self) -> &EventKind {
        &self.kind
    }

    pub fn contexts(&self) -> &[SelfDescribingJson] {
        &self.contexts
    }

    pub fn true_timestamp(&self) -> Option<i64> {
        self.true_timestamp
    }

    pub fn subject(&self) -> Option<&Subject> {
        self.subject.as_ref()
    }

    /// The `e` code of the primary payload.
    pub fn event_type(&self) -> &'static str {
        match self.kind {
            EventKind::PageView(_) => event_type::PAGE_VIEW,
            EventKind::Structured(_) => event_type::STRUCTURED,
            EventKind::SelfDescribing(_) | EventKind::ScreenView(_) | EventKind::Timing(_) => {
                event_type::SELF_DESCRIBING
            }
            EventKind::EcommerceTransaction(_) => event_type::ECOMMERCE_TRANSACTION,
        }
    }

    /// Encode this event into payload builders.
    ///
    /// Most kinds produce exactly one builder. An ecommerce transaction
    /// produces the `tr` builder followed by one `ti` builder per item, all
    /// sharing the transaction's timestamps. Builders carry the event fields,
    /// contexts and true timestamp; tracker-level fields are left to the caller.
    pub fn to_payload_builders(&self, base64_encode: bool) -> EventResult<Vec<PayloadBuilder>> {
        let mut builder = PayloadBuilder::new().true_timestamp(self.true_timestamp);
        builder.add(keys::EVENT, self.event_type())?;

        let mut extra = Vec::new();
        match &self.kind {
            EventKind::PageView(page_view) => {
                builder.add(keys::PAGE_URL, page_view.page_url.as_str())?;
                builder.add_opt(keys::PAGE_TITLE, page_view.page_title.as_deref())?;
                builder.add_opt(keys::PAGE_REFR, page_view.referrer.as_deref())?;
            }
            EventKind::Structured(structured) => {
                builder.add(keys::SE_CATEGORY, structured.category.as_str())?;
                builder.add(keys::SE_ACTION, structured.action.as_str())?;
                builder.add_opt(keys::SE_LABEL, structured.label.as_deref())?;
                builder.add_opt(keys::SE_PROPERTY, structured.property.as_deref())?;
                builder.add_opt(keys::SE_VALUE, structured.value)?;
            }
            EventKind::SelfDescribing(data) => {
                add_unstruct(&mut builder, data, base64_encode)?;
            }
            EventKind::ScreenView(screen_view) => {
                add_unstruct(&mut builder, &screen_view.to_json(), base64_encode)?;
            }
            EventKind::Timing(timing) => {
                add_unstruct(&mut builder, &timing.to_json(), base64_encode)?;
            }
            EventKind::EcommerceTransaction(transaction) => {
                transaction.add_fields(&mut builder)?;
                for item in &transaction.items {
                    let mut item_builder = builder.sibling();
                    item_builder.add(keys::EVENT, event_type::ECOMMERCE_ITEM)?;
                    item.add_fields(&mut item_builder, &transaction.order_id)?;
                    add_contexts(&mut item_builder, &item.contexts, base64_encode)?;
                    extra.push(item_builder);
                }
            }
        }
        add_contexts(&mut builder, &self.contexts, base64_encode)?;

        let mut builders = Vec::with_capacity(1 + extra.len());
        builders.push(builder);
        builders.extend(extra);
        Ok(builders)
    }
}

fn add_unstruct(
    builder: &mut PayloadBuilder,
    data: &SelfDescribingJson,
    base64_encode: bool,
) -> EventResult<()> {
    let envelope = SelfDescribingJson::unstruct_event(data).map_err(tracker_payload::PayloadError::from)?;
    builder.add_json(
        &envelope,
        base64_encode,
        keys::SELF_DESCRIBING_ENCODED,
        keys::SELF_DESCRIBING,
    )?;
    Ok(())
}

fn add_contexts(
    builder: &mut PayloadBuilder,
    contexts: &[SelfDescribingJson],
    base64_encode: bool,
) -> EventResult<()> {
    if contexts.is_empty() {
        return Ok(());
    }
    let envelope = SelfDescribingJson::contexts(contexts).map_err(tracker_payload::PayloadError::from)?;
    builder.add_json(&envelope, base64_encode, keys::CONTEXT_ENCODED, keys::CONTEXT)?;
    Ok(())
}

fn insert_opt(data: &mut Map<String, Value>, key: &str, value: Option<&str>) {
    if let Some(value) = value.filter(|v| !v.is_empty()) {
        data.insert(key.to_string(), value.into());
    }
}

pub(crate) fn require(field: &'static str, value: &str) -> EventResult<()> {
    if value.is_empty() {
        return Err(EventError::EmptyField(field));
    }
    Ok(())
}

pub(crate) fn require_finite(field: &'static str, value: f64) -> EventResult<()> {
    if !value.is_finite() {
        return Err(EventError::InvalidValue {
            field,
            reason: "must be a finite number".to_string(),
        });
    }
    Ok(())
}

fn require_schema(json: &SelfDescribingJson) -> EventResult<()> {
    if !json.schema.starts_with("iglu:") {
        return Err(EventError::InvalidValue {
            field: "schema",
            reason: format!("expected an iglu: URI, got {:?}", json.schema),
        });
    }
    Ok(())
}
