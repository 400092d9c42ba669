//! Per-client session pump: bus fan-out and call dispatch.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Map, Value};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use squall_client::Transport;
use squall_events::EventBus;
use squall_wire::{Message, Outcome};

/// Engine-facing dispatch seam for inbound calls.
///
/// `Err` payloads become [`Outcome::Error`] on the wire and surface as
/// remote errors at the client's failure callbacks.
#[async_trait]
pub trait CallHandler: Send + Sync + 'static {
    /// Execute one method call and produce its outcome.
    async fn handle(
        &self,
        method: &str,
        args: Vec<Value>,
        kwargs: Map<String, Value>,
    ) -> Result<Value, Value>;
}

/// One connected client, pumped by its own task.
///
/// The session subscribes to the bus and forwards every envelope as a
/// notification; inbound calls are answered through the handler. Event
/// delivery and call handling are serialized within the session, so a
/// client observes replies and notifications in a consistent order. A
/// session that the bus disconnects for lagging is torn down rather than
/// left on a feed with silent gaps.
pub struct ClientSession;

impl ClientSession {
    /// Spawn the session task for a connected transport.
    ///
    /// The task ends when the client disconnects, the transport rejects a
    /// send, or the bus drops the session's subscription; the subscription
    /// is always removed on the way out.
    pub fn spawn(
        bus: EventBus,
        handler: Arc<dyn CallHandler>,
        transport: impl Transport,
        inbound: mpsc::UnboundedReceiver<Message>,
    ) -> JoinHandle<()> {
        tokio::spawn(Self::run(bus, handler, transport, inbound))
    }

    async fn run(
        bus: EventBus,
        handler: Arc<dyn CallHandler>,
        transport: impl Transport,
        mut inbound: mpsc::UnboundedReceiver<Message>,
    ) {
        let mut subscription = bus.subscribe();
        let token = subscription.token();

        loop {
            tokio::select! {
                envelope = subscription.next() => {
                    let Some(envelope) = envelope else {
                        tracing::warn!(token, "session dropped by bus, closing connection");
                        break;
                    };
                    if transport.send(Message::notification(&envelope.event)).is_err() {
                        break;
                    }
                }
                message = inbound.recv() => {
                    let Some(message) = message else {
                        break;
                    };
                    match message {
                        Message::Call { id, method, args, kwargs } => {
                            let outcome = match handler.handle(&method, args, kwargs).await {
                                Ok(value) => Outcome::Success { value },
                                Err(payload) => {
                                    tracing::debug!(call_id = id, method = %method, "call rejected");
                                    Outcome::Error { payload }
                                }
                            };
                            if transport.send(Message::Reply { call_id: id, outcome }).is_err() {
                                break;
                            }
                        }
                        other => {
                            tracing::warn!(?other, "unexpected message on daemon connection");
                        }
                    }
                }
            }
        }

        bus.unsubscribe(token);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use squall_client::{CallError, Gateway, pair};
    use squall_events::Event;
    use std::time::Duration;
    use tokio::time::timeout;

    /// Accepts `core.add_torrent_file` unless the filename was seen before.
    struct StubCore {
        seen: std::sync::Mutex<Vec<String>>,
    }

    impl StubCore {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                seen: std::sync::Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl CallHandler for StubCore {
        async fn handle(
            &self,
            method: &str,
            args: Vec<Value>,
            kwargs: Map<String, Value>,
        ) -> Result<Value, Value> {
            match method {
                "core.add_torrent_file" => {
                    let filename = args
                        .first()
                        .and_then(Value::as_str)
                        .ok_or_else(|| json!("missing filename"))?
                        .to_string();
                    let mut seen = self.seen.lock().expect("seen lock");
                    if seen.contains(&filename) {
                        return Err(json!("file already added"));
                    }
                    seen.push(filename.clone());
                    assert!(kwargs.is_empty() || kwargs.contains_key("download_location"));
                    Ok(json!(format!("id-{filename}")))
                }
                other => Err(json!(format!("unknown method '{other}'"))),
            }
        }
    }

    fn session_with_client(bus: &EventBus) -> Gateway {
        let (client_end, server_end) = pair();
        ClientSession::spawn(
            bus.clone(),
            StubCore::new(),
            server_end.transport,
            server_end.inbound,
        );
        Gateway::connect(client_end.transport, client_end.inbound)
    }

    #[tokio::test]
    async fn calls_are_answered_with_handler_outcomes() {
        let bus = EventBus::new();
        let gateway = session_with_client(&bus);

        let ok = gateway.invoke("core.add_torrent_file", vec![json!("demo.torrent")]);
        assert_eq!(ok.wait().await, Ok(json!("id-demo.torrent")));

        let duplicate = gateway.invoke("core.add_torrent_file", vec![json!("demo.torrent")]);
        assert_eq!(
            duplicate.wait().await,
            Err(CallError::Remote {
                payload: json!("file already added")
            })
        );

        let unknown = gateway.invoke("core.self_destruct", Vec::new());
        assert_eq!(
            unknown.wait().await,
            Err(CallError::Remote {
                payload: json!("unknown method 'core.self_destruct'")
            })
        );
    }

    #[tokio::test]
    async fn bus_events_reach_every_session_as_notifications() {
        let bus = EventBus::new();
        let first = session_with_client(&bus);
        let second = session_with_client(&bus);
        let mut first_events = first.events().expect("first stream");
        let mut second_events = second.events().expect("second stream");

        // Exercise a call first so both sessions are known to be pumping.
        let ready = first.invoke("core.add_torrent_file", vec![json!("warmup.torrent")]);
        assert!(ready.wait().await.is_ok());

        bus.publish(Event::TorrentFinished {
            torrent_id: "abc123".into(),
        });

        for events in [&mut first_events, &mut second_events] {
            let event = timeout(Duration::from_secs(1), events.recv())
                .await
                .expect("notification within deadline")
                .expect("stream open");
            assert_eq!(
                event,
                Event::TorrentFinished {
                    torrent_id: "abc123".into(),
                }
            );
        }
    }

    #[tokio::test]
    async fn disconnecting_client_unsubscribes_the_session() {
        let bus = EventBus::new();
        let (client_end, server_end) = pair();
        let handle = ClientSession::spawn(
            bus.clone(),
            StubCore::new(),
            server_end.transport,
            server_end.inbound,
        );
        // Let the session task register its subscription.
        tokio::task::yield_now().await;
        assert_eq!(bus.subscriber_count(), 1);

        drop(client_end);
        timeout(Duration::from_secs(1), handle)
            .await
            .expect("session exits")
            .expect("session task");
        assert_eq!(bus.subscriber_count(), 0);
    }
}
