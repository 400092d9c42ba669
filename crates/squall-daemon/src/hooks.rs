//! Engine lifecycle hooks mapped onto published events.

use serde_json::Value;

use squall_events::{Event, EventBus, EventId};

/// Adapter the engine calls at each notable occurrence.
///
/// Each hook constructs the event kind fixed for that occurrence and
/// publishes it; the engine never builds events directly, so the
/// occurrence-to-kind mapping lives in exactly one place.
#[derive(Clone)]
pub struct EngineHooks {
    bus: EventBus,
}

impl EngineHooks {
    /// Bind hooks to the session's event bus.
    #[must_use]
    pub const fn new(bus: EventBus) -> Self {
        Self { bus }
    }

    /// The bus these hooks publish to.
    #[must_use]
    pub const fn bus(&self) -> &EventBus {
        &self.bus
    }

    /// A torrent was successfully added to the session.
    pub fn torrent_added(&self, torrent_id: impl Into<String>) -> EventId {
        self.bus.publish(Event::TorrentAdded {
            torrent_id: torrent_id.into(),
        })
    }

    /// A torrent has been removed from the session.
    pub fn torrent_removed(&self, torrent_id: impl Into<String>) -> EventId {
        self.bus.publish(Event::TorrentRemoved {
            torrent_id: torrent_id.into(),
        })
    }

    /// A torrent is about to be removed from the session.
    pub fn pre_torrent_removed(&self, torrent_id: impl Into<String>) -> EventId {
        self.bus.publish(Event::PreTorrentRemoved {
            torrent_id: torrent_id.into(),
        })
    }

    /// A torrent changed state.
    pub fn state_changed(
        &self,
        torrent_id: impl Into<String>,
        new_state: impl Into<String>,
    ) -> EventId {
        self.bus.publish(Event::TorrentStateChanged {
            torrent_id: torrent_id.into(),
            new_state: new_state.into(),
        })
    }

    /// The queue order has changed.
    pub fn queue_changed(&self) -> EventId {
        self.bus.publish(Event::TorrentQueueChanged)
    }

    /// A folder within a torrent has been renamed.
    pub fn folder_renamed(
        &self,
        torrent_id: impl Into<String>,
        old_name: impl Into<String>,
        new_name: impl Into<String>,
    ) -> EventId {
        self.bus.publish(Event::TorrentFolderRenamed {
            torrent_id: torrent_id.into(),
            old_name: old_name.into(),
            new_name: new_name.into(),
        })
    }

    /// A file within a torrent has been renamed.
    pub fn file_renamed(
        &self,
        torrent_id: impl Into<String>,
        file_index: u32,
        new_name: impl Into<String>,
    ) -> EventId {
        self.bus.publish(Event::TorrentFileRenamed {
            torrent_id: torrent_id.into(),
            file_index,
            new_name: new_name.into(),
        })
    }

    /// A torrent finished downloading.
    pub fn torrent_finished(&self, torrent_id: impl Into<String>) -> EventId {
        self.bus.publish(Event::TorrentFinished {
            torrent_id: torrent_id.into(),
        })
    }

    /// A torrent resumed from a paused state.
    pub fn torrent_resumed(&self, torrent_id: impl Into<String>) -> EventId {
        self.bus.publish(Event::TorrentResumed {
            torrent_id: torrent_id.into(),
        })
    }

    /// A newer release of the client is available.
    pub fn new_version_available(&self, new_release: impl Into<String>) -> EventId {
        self.bus.publish(Event::NewVersionAvailable {
            new_release: new_release.into(),
        })
    }

    /// The session has started.
    pub fn session_started(&self) -> EventId {
        self.bus.publish(Event::SessionStarted)
    }

    /// The session has been paused.
    pub fn session_paused(&self) -> EventId {
        self.bus.publish(Event::SessionPaused)
    }

    /// The session has been resumed.
    pub fn session_resumed(&self) -> EventId {
        self.bus.publish(Event::SessionResumed)
    }

    /// A config value changed in the core.
    pub fn config_value_changed(&self, key: impl Into<String>, value: Value) -> EventId {
        self.bus.publish(Event::ConfigValueChanged {
            key: key.into(),
            value,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn hooks_publish_the_fixed_kind_per_occurrence() {
        let bus = EventBus::new();
        let hooks = EngineHooks::new(bus.clone());
        let mut subscription = bus.subscribe();

        hooks.session_started();
        hooks.torrent_added("abc123");
        hooks.state_changed("abc123", "Downloading");
        hooks.file_renamed("abc123", 2, "episode.mkv");
        hooks.config_value_changed("max_active", json!(8));

        let expected = [
            Event::SessionStarted,
            Event::TorrentAdded {
                torrent_id: "abc123".into(),
            },
            Event::TorrentStateChanged {
                torrent_id: "abc123".into(),
                new_state: "Downloading".into(),
            },
            Event::TorrentFileRenamed {
                torrent_id: "abc123".into(),
                file_index: 2,
                new_name: "episode.mkv".into(),
            },
            Event::ConfigValueChanged {
                key: "max_active".into(),
                value: json!(8),
            },
        ];
        for event in expected {
            let envelope = subscription.next().await.expect("published event");
            assert_eq!(envelope.event, event);
        }
    }

    #[tokio::test]
    async fn removal_is_announced_before_it_happens() {
        let bus = EventBus::new();
        let hooks = EngineHooks::new(bus.clone());
        let mut subscription = bus.subscribe();

        hooks.pre_torrent_removed("abc123");
        hooks.torrent_removed("abc123");

        let first = subscription.next().await.expect("pre-removal");
        let second = subscription.next().await.expect("removal");
        assert_eq!(
            first.event,
            Event::PreTorrentRemoved {
                torrent_id: "abc123".into()
            }
        );
        assert_eq!(
            second.event,
            Event::TorrentRemoved {
                torrent_id: "abc123".into()
            }
        );
    }
}
