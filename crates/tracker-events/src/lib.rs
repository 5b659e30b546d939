//! Tracker Events
//!
//! The closed set of events the tracker can record. Every variant is built
//! through a validating constructor on [`Event`], so an `Event` value that
//! exists is always encodable.

mod ecommerce;
mod error;
mod event;
mod subject;

pub use ecommerce::{EcommerceTransaction, EcommerceTransactionItem};
pub use error::{EventError, EventResult};
pub use event::{Event, EventKind, PageView, ScreenView, Structured, Timing};
pub use subject::Subject;
