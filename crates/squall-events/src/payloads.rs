//! Event payload types and their wire name/args contract.

use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::error::SchemaViolation;

/// Identifier assigned to each event emitted by the daemon.
pub type EventId = u64;

/// Typed daemon events surfaced to connected clients.
///
/// Each variant is one entry in the closed taxonomy. The wire name equals
/// the variant name and the argument order is fixed per kind; both are part
/// of the protocol contract and adding a kind is a taxonomy change, not a
/// runtime registration.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// A torrent was successfully added to the session.
    TorrentAdded {
        /// Identifier of the torrent that was added.
        torrent_id: String,
    },
    /// A torrent has been removed from the session.
    TorrentRemoved {
        /// Identifier of the removed torrent.
        torrent_id: String,
    },
    /// A torrent is about to be removed from the session.
    PreTorrentRemoved {
        /// Identifier of the torrent being removed.
        torrent_id: String,
    },
    /// A torrent changed state.
    TorrentStateChanged {
        /// Identifier of the torrent whose state changed.
        torrent_id: String,
        /// Name of the new state.
        new_state: String,
    },
    /// The queue order has changed.
    TorrentQueueChanged,
    /// A folder within a torrent has been renamed.
    TorrentFolderRenamed {
        /// Identifier of the affected torrent.
        torrent_id: String,
        /// Previous folder name.
        old_name: String,
        /// New folder name.
        new_name: String,
    },
    /// A file within a torrent has been renamed.
    TorrentFileRenamed {
        /// Identifier of the affected torrent.
        torrent_id: String,
        /// Index of the file within the torrent.
        file_index: u32,
        /// New file name.
        new_name: String,
    },
    /// A torrent finished downloading.
    TorrentFinished {
        /// Identifier of the finished torrent.
        torrent_id: String,
    },
    /// A torrent resumed from a paused state.
    TorrentResumed {
        /// Identifier of the resumed torrent.
        torrent_id: String,
    },
    /// A more recent release of the client is available.
    NewVersionAvailable {
        /// Version string of the new release.
        new_release: String,
    },
    /// The session has started. Emitted once when the daemon comes up.
    SessionStarted,
    /// The session has been paused.
    SessionPaused,
    /// The session has been resumed.
    SessionResumed,
    /// A config value changed in the core.
    ConfigValueChanged {
        /// Key that changed.
        key: String,
        /// New value for the key.
        value: Value,
    },
}

impl Event {
    /// Stable wire identifier, determined solely by the kind.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::TorrentAdded { .. } => "TorrentAdded",
            Self::TorrentRemoved { .. } => "TorrentRemoved",
            Self::PreTorrentRemoved { .. } => "PreTorrentRemoved",
            Self::TorrentStateChanged { .. } => "TorrentStateChanged",
            Self::TorrentQueueChanged => "TorrentQueueChanged",
            Self::TorrentFolderRenamed { .. } => "TorrentFolderRenamed",
            Self::TorrentFileRenamed { .. } => "TorrentFileRenamed",
            Self::TorrentFinished { .. } => "TorrentFinished",
            Self::TorrentResumed { .. } => "TorrentResumed",
            Self::NewVersionAvailable { .. } => "NewVersionAvailable",
            Self::SessionStarted => "SessionStarted",
            Self::SessionPaused => "SessionPaused",
            Self::SessionResumed => "SessionResumed",
            Self::ConfigValueChanged { .. } => "ConfigValueChanged",
        }
    }

    /// Ordered argument list per the kind's schema.
    #[must_use]
    pub fn args(&self) -> Vec<Value> {
        match self {
            Self::TorrentAdded { torrent_id }
            | Self::TorrentRemoved { torrent_id }
            | Self::PreTorrentRemoved { torrent_id }
            | Self::TorrentFinished { torrent_id }
            | Self::TorrentResumed { torrent_id } => vec![Value::from(torrent_id.as_str())],
            Self::TorrentStateChanged {
                torrent_id,
                new_state,
            } => vec![
                Value::from(torrent_id.as_str()),
                Value::from(new_state.as_str()),
            ],
            Self::TorrentQueueChanged
            | Self::SessionStarted
            | Self::SessionPaused
            | Self::SessionResumed => Vec::new(),
            Self::TorrentFolderRenamed {
                torrent_id,
                old_name,
                new_name,
            } => vec![
                Value::from(torrent_id.as_str()),
                Value::from(old_name.as_str()),
                Value::from(new_name.as_str()),
            ],
            Self::TorrentFileRenamed {
                torrent_id,
                file_index,
                new_name,
            } => vec![
                Value::from(torrent_id.as_str()),
                Value::from(*file_index),
                Value::from(new_name.as_str()),
            ],
            Self::NewVersionAvailable { new_release } => vec![Value::from(new_release.as_str())],
            Self::ConfigValueChanged { key, value } => {
                vec![Value::from(key.as_str()), value.clone()]
            }
        }
    }

    /// Decode an event received off the wire as `(name, args)`.
    ///
    /// # Errors
    ///
    /// Returns a [`SchemaViolation`] when the name is not a known kind or
    /// the argument list does not match that kind's arity and types.
    pub fn from_wire(name: &str, args: Vec<Value>) -> Result<Self, SchemaViolation> {
        match name {
            "TorrentAdded" => {
                let mut args = ArgCursor::new("TorrentAdded", args, 1)?;
                Ok(Self::TorrentAdded {
                    torrent_id: args.string()?,
                })
            }
            "TorrentRemoved" => {
                let mut args = ArgCursor::new("TorrentRemoved", args, 1)?;
                Ok(Self::TorrentRemoved {
                    torrent_id: args.string()?,
                })
            }
            "PreTorrentRemoved" => {
                let mut args = ArgCursor::new("PreTorrentRemoved", args, 1)?;
                Ok(Self::PreTorrentRemoved {
                    torrent_id: args.string()?,
                })
            }
            "TorrentStateChanged" => {
                let mut args = ArgCursor::new("TorrentStateChanged", args, 2)?;
                Ok(Self::TorrentStateChanged {
                    torrent_id: args.string()?,
                    new_state: args.string()?,
                })
            }
            "TorrentQueueChanged" => {
                ArgCursor::new("TorrentQueueChanged", args, 0)?;
                Ok(Self::TorrentQueueChanged)
            }
            "TorrentFolderRenamed" => {
                let mut args = ArgCursor::new("TorrentFolderRenamed", args, 3)?;
                Ok(Self::TorrentFolderRenamed {
                    torrent_id: args.string()?,
                    old_name: args.string()?,
                    new_name: args.string()?,
                })
            }
            "TorrentFileRenamed" => {
                let mut args = ArgCursor::new("TorrentFileRenamed", args, 3)?;
                Ok(Self::TorrentFileRenamed {
                    torrent_id: args.string()?,
                    file_index: args.index()?,
                    new_name: args.string()?,
                })
            }
            "TorrentFinished" => {
                let mut args = ArgCursor::new("TorrentFinished", args, 1)?;
                Ok(Self::TorrentFinished {
                    torrent_id: args.string()?,
                })
            }
            "TorrentResumed" => {
                let mut args = ArgCursor::new("TorrentResumed", args, 1)?;
                Ok(Self::TorrentResumed {
                    torrent_id: args.string()?,
                })
            }
            "NewVersionAvailable" => {
                let mut args = ArgCursor::new("NewVersionAvailable", args, 1)?;
                Ok(Self::NewVersionAvailable {
                    new_release: args.string()?,
                })
            }
            "SessionStarted" => {
                ArgCursor::new("SessionStarted", args, 0)?;
                Ok(Self::SessionStarted)
            }
            "SessionPaused" => {
                ArgCursor::new("SessionPaused", args, 0)?;
                Ok(Self::SessionPaused)
            }
            "SessionResumed" => {
                ArgCursor::new("SessionResumed", args, 0)?;
                Ok(Self::SessionResumed)
            }
            "ConfigValueChanged" => {
                let mut args = ArgCursor::new("ConfigValueChanged", args, 2)?;
                Ok(Self::ConfigValueChanged {
                    key: args.string()?,
                    value: args.value(),
                })
            }
            other => Err(SchemaViolation::UnknownKind {
                name: other.to_string(),
            }),
        }
    }
}

/// Positional reader over a wire argument list.
struct ArgCursor {
    kind: &'static str,
    args: std::vec::IntoIter<Value>,
    position: usize,
}

impl ArgCursor {
    fn new(kind: &'static str, args: Vec<Value>, expected: usize) -> Result<Self, SchemaViolation> {
        if args.len() != expected {
            return Err(SchemaViolation::ArityMismatch {
                kind,
                expected,
                got: args.len(),
            });
        }
        Ok(Self {
            kind,
            args: args.into_iter(),
            position: 0,
        })
    }

    fn next(&mut self) -> Value {
        self.position += 1;
        // ArgCursor::new checked the arity, so the cursor never runs dry.
        self.args.next().unwrap_or(Value::Null)
    }

    fn string(&mut self) -> Result<String, SchemaViolation> {
        let index = self.position;
        match self.next() {
            Value::String(text) => Ok(text),
            _ => Err(SchemaViolation::ArgumentType {
                kind: self.kind,
                index,
                expected: "a string",
            }),
        }
    }

    fn index(&mut self) -> Result<u32, SchemaViolation> {
        let index = self.position;
        self.next()
            .as_u64()
            .and_then(|raw| u32::try_from(raw).ok())
            .ok_or(SchemaViolation::ArgumentType {
                kind: self.kind,
                index,
                expected: "an unsigned integer",
            })
    }

    fn value(&mut self) -> Value {
        self.next()
    }
}

/// Metadata wrapper around events. Each envelope tracks the event id and
/// emission timestamp.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, PartialEq)]
pub struct EventEnvelope {
    /// Sequential identifier assigned by the publishing bus.
    pub id: EventId,
    /// Timestamp recording when the envelope was produced.
    pub timestamp: DateTime<Utc>,
    /// Wrapped event payload.
    pub event: Event,
}
