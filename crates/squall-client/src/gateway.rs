//! Remote call gateway: invocation, demux, and settlement.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use serde_json::{Map, Value};
use tokio::sync::mpsc;

use squall_events::Event;
use squall_wire::{CallId, Message, Outcome};

use crate::error::CallError;
use crate::pending::PendingCall;
use crate::transport::Transport;

/// Queue depth for decoded notifications awaiting the consumer.
const EVENT_QUEUE_CAPACITY: usize = 256;

/// Client-side proxy for one daemon connection.
///
/// Calls issued through the gateway never block the caller; the reply (or
/// the channel dying) settles the returned [`PendingCall`] exactly once.
#[derive(Clone)]
pub struct Gateway {
    inner: Arc<GatewayInner>,
}

struct GatewayInner {
    transport: Box<dyn Transport>,
    pending: Mutex<HashMap<CallId, PendingCall>>,
    next_call_id: AtomicU64,
    events_tx: mpsc::Sender<Event>,
    events_rx: Mutex<Option<mpsc::Receiver<Event>>>,
}

impl Gateway {
    /// Wire a gateway onto a connected transport.
    ///
    /// `inbound` is the stream of messages the transport receives from the
    /// daemon; a background task drains it until the channel closes, at
    /// which point every outstanding call settles as a transport error.
    #[must_use]
    pub fn connect(
        transport: impl Transport,
        inbound: mpsc::UnboundedReceiver<Message>,
    ) -> Self {
        let (events_tx, events_rx) = mpsc::channel(EVENT_QUEUE_CAPACITY);
        let gateway = Self {
            inner: Arc::new(GatewayInner {
                transport: Box::new(transport),
                pending: Mutex::new(HashMap::new()),
                next_call_id: AtomicU64::new(1),
                events_tx,
                events_rx: Mutex::new(Some(events_rx)),
            }),
        };
        tokio::spawn(demux(gateway.inner.clone(), inbound));
        gateway
    }

    /// Invoke a daemon method with positional arguments.
    #[must_use]
    pub fn invoke(&self, method: &str, args: Vec<Value>) -> PendingCall {
        self.invoke_with_kwargs(method, args, Map::new())
    }

    /// Invoke a daemon method with positional and keyword arguments.
    #[must_use]
    pub fn invoke_with_kwargs(
        &self,
        method: &str,
        args: Vec<Value>,
        kwargs: Map<String, Value>,
    ) -> PendingCall {
        let id = self.inner.next_call_id.fetch_add(1, Ordering::Relaxed);
        let call = PendingCall::new(method);
        self.lock_pending().insert(id, call.clone());

        // Every settlement path releases the map entry, including
        // cancellation and timeouts that never see a reply.
        let gateway = Arc::downgrade(&self.inner);
        call.set_release_hook(move || {
            if let Some(inner) = gateway.upgrade() {
                inner
                    .pending
                    .lock()
                    .unwrap_or_else(std::sync::PoisonError::into_inner)
                    .remove(&id);
            }
        });

        let message = Message::Call {
            id,
            method: method.to_string(),
            args,
            kwargs,
        };
        if self.inner.transport.send(message).is_err() {
            call.settle(Err(CallError::transport("channel closed before send")));
        }
        call
    }

    /// Take the stream of decoded daemon notifications.
    ///
    /// Returns `None` after the first take; one consumer owns the stream.
    #[must_use]
    pub fn events(&self) -> Option<mpsc::Receiver<Event>> {
        self.inner
            .events_rx
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .take()
    }

    /// Number of calls still awaiting settlement.
    #[must_use]
    pub fn pending_calls(&self) -> usize {
        self.lock_pending().len()
    }

    fn lock_pending(&self) -> MutexGuard<'_, HashMap<CallId, PendingCall>> {
        self.inner
            .pending
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

async fn demux(inner: Arc<GatewayInner>, mut inbound: mpsc::UnboundedReceiver<Message>) {
    while let Some(message) = inbound.recv().await {
        match message {
            Message::Reply { call_id, outcome } => {
                let call = inner
                    .pending
                    .lock()
                    .unwrap_or_else(std::sync::PoisonError::into_inner)
                    .remove(&call_id);
                match call {
                    Some(call) => {
                        let outcome = match outcome {
                            Outcome::Success { value } => Ok(value),
                            Outcome::Error { payload } => Err(CallError::Remote { payload }),
                        };
                        call.settle(outcome);
                    }
                    None => tracing::debug!(call_id, "reply for unknown call"),
                }
            }
            Message::Event { name, args } => match Event::from_wire(&name, args) {
                Ok(event) => {
                    if inner.events_tx.try_send(event).is_err() {
                        tracing::warn!(event = %name, "event consumer lagging, notification dropped");
                    }
                }
                // Decode failures stay local to this subscriber.
                Err(violation) => {
                    tracing::warn!(event = %name, error = %violation, "discarding malformed notification");
                }
            },
            Message::Call { id, method, .. } => {
                tracing::warn!(call_id = id, method = %method, "unexpected call message on client connection");
            }
        }
    }

    // Channel severed: settle everything still outstanding, exactly once.
    let orphaned: Vec<PendingCall> = {
        let mut pending = inner
            .pending
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        pending.drain().map(|(_, call)| call).collect()
    };
    for call in orphaned {
        call.settle(Err(CallError::transport("connection closed before reply")));
    }
}
