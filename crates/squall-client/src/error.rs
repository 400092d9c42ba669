//! Call settlement error primitives.

use serde_json::Value;
use thiserror::Error;

/// Result a call settles with: one success value or one error, exactly once.
pub type CallOutcome = Result<Value, CallError>;

/// Ways a remote call can fail.
///
/// `Remote` and `Transport` are surfaced identically to failure callbacks so
/// callers can treat them uniformly unless they inspect the variant.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CallError {
    /// The daemon explicitly rejected the call.
    #[error("remote error")]
    Remote {
        /// Daemon-supplied error payload, passed through verbatim.
        payload: Value,
    },
    /// The channel dropped before a reply arrived, or the call timed out.
    #[error("transport error: {reason}")]
    Transport {
        /// Human-readable description of the channel failure.
        reason: String,
    },
    /// The caller cancelled the call before it settled.
    #[error("call cancelled")]
    Cancelled,
}

impl CallError {
    pub(crate) fn transport(reason: impl Into<String>) -> Self {
        Self::Transport {
            reason: reason.into(),
        }
    }
}
