//! RPC message shapes carried between the daemon and its clients.
//!
//! The transport below this crate is an external collaborator: it provides a
//! reliable, ordered channel and owns framing, compression, and
//! authentication. This crate only defines what travels over it: calls,
//! replies, and unsolicited event notifications.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use squall_events::Event;
use thiserror::Error;

/// Identifier correlating a call with its reply on one connection.
pub type CallId = u64;

/// One message on the daemon/client channel.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Message {
    /// Client-to-daemon method invocation.
    Call {
        /// Connection-local call identifier, echoed in the reply.
        id: CallId,
        /// Target method, e.g. `core.add_torrent_file`.
        method: String,
        /// Positional arguments.
        args: Vec<Value>,
        /// Keyword arguments.
        #[serde(default, skip_serializing_if = "Map::is_empty")]
        kwargs: Map<String, Value>,
    },
    /// Daemon-to-client settlement of a call.
    Reply {
        /// Identifier of the call being settled.
        call_id: CallId,
        /// Success or error outcome.
        outcome: Outcome,
    },
    /// Unsolicited daemon event notification.
    Event {
        /// Wire name of the event kind.
        name: String,
        /// Ordered event arguments per the kind's schema.
        args: Vec<Value>,
    },
}

impl Message {
    /// Build the notification message for an event.
    #[must_use]
    pub fn notification(event: &Event) -> Self {
        Self::Event {
            name: event.name().to_string(),
            args: event.args(),
        }
    }

    /// Encode to a single line of JSON.
    ///
    /// # Errors
    ///
    /// Returns [`WireError::Encode`] if serialization fails.
    pub fn to_json(&self) -> Result<String, WireError> {
        serde_json::to_string(self).map_err(WireError::Encode)
    }

    /// Decode from a line of JSON.
    ///
    /// # Errors
    ///
    /// Returns [`WireError::Decode`] if the line is not a valid message.
    pub fn from_json(line: &str) -> Result<Self, WireError> {
        serde_json::from_str(line).map_err(WireError::Decode)
    }
}

/// Settled outcome of a call: exactly one of success or error.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Outcome {
    /// The daemon accepted the call and produced a result value.
    Success {
        /// Result value, `null` for void methods.
        value: Value,
    },
    /// The daemon explicitly rejected the call.
    Error {
        /// Daemon-supplied error payload, surfaced verbatim to callers.
        payload: Value,
    },
}

/// Serialization failures at the wire boundary.
#[derive(Debug, Error)]
pub enum WireError {
    /// A message could not be encoded to JSON.
    #[error("failed to encode wire message")]
    Encode(#[source] serde_json::Error),
    /// An inbound line could not be decoded as a message.
    #[error("failed to decode wire message")]
    Decode(#[source] serde_json::Error),
}
