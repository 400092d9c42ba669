//! Event schema error primitives.

use thiserror::Error;

/// Error raised when an event cannot be constructed from wire data.
///
/// The event taxonomy is closed: both ends of the RPC channel compile the
/// same set of kinds and argument schemas, so any mismatch here means the
/// peer sent something this build does not recognise.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaViolation {
    /// The wire name does not match any known event kind.
    #[error("unknown event kind '{name}'")]
    UnknownKind {
        /// Name received off the wire.
        name: String,
    },
    /// The argument list length does not match the kind's schema.
    #[error("event '{kind}' expects {expected} argument(s), got {got}")]
    ArityMismatch {
        /// Event kind being decoded.
        kind: &'static str,
        /// Arity fixed by the schema.
        expected: usize,
        /// Arity actually received.
        got: usize,
    },
    /// An argument has the wrong type for its position.
    #[error("event '{kind}' argument {index} must be {expected}")]
    ArgumentType {
        /// Event kind being decoded.
        kind: &'static str,
        /// Zero-based argument position.
        index: usize,
        /// Expected JSON type for that position.
        expected: &'static str,
    },
}
