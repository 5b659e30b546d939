//! Tracker Payload
//!
//! Encoding of a single tracked event as an ordered, immutable set of short
//! keys, plus the protocol constants shared by the tracker and the emitter.

pub mod constants;
mod error;
mod payload;
mod self_describing;

pub use error::{PayloadError, PayloadResult};
pub use payload::{Payload, PayloadBuilder, PayloadValue, WirePayload};
pub use self_describing::SelfDescribingJson;
