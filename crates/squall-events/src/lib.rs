//! Event taxonomy and in-daemon event bus for the Squall platform.
//!
//! The daemon reports notable occurrences (torrent lifecycle transitions,
//! session changes, config updates) as typed [`Event`] values. Each kind has
//! a stable wire name and a fixed argument schema so detached consoles and
//! GUIs can decode notifications without sharing this crate's version
//! exactly. The [`EventBus`] fans published events out to every connected
//! client session without letting a slow session stall the publisher.

pub mod error;
pub mod payloads;
pub mod routing;

pub use error::SchemaViolation;
pub use payloads::{Event, EventEnvelope, EventId};
pub use routing::{EventBus, Subscription, SubscriptionToken};
