//! Event bus fan-out to connected client sessions.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::Utc;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

use crate::payloads::{Event, EventEnvelope, EventId};

/// Token identifying one bus subscription.
pub type SubscriptionToken = u64;

/// Default per-subscriber queue depth.
const DEFAULT_QUEUE_CAPACITY: usize = 256;

/// Shared publish/subscribe bus between engine code and client sessions.
///
/// `publish` is fire-and-forget: it enqueues the event for every live
/// subscriber and returns without waiting on delivery. Each subscriber owns
/// a bounded queue; a subscriber whose queue is full at publish time is
/// disconnected so it can never stall the publisher or its peers. Events
/// published with no subscribers are dropped silently.
#[derive(Clone)]
pub struct EventBus {
    inner: Arc<BusInner>,
}

struct BusInner {
    subscribers: Mutex<HashMap<SubscriptionToken, mpsc::Sender<EventEnvelope>>>,
    next_token: AtomicU64,
    next_event_id: AtomicU64,
}

impl EventBus {
    /// Construct an empty bus.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Arc::new(BusInner {
                subscribers: Mutex::new(HashMap::new()),
                next_token: AtomicU64::new(1),
                next_event_id: AtomicU64::new(1),
            }),
        }
    }

    /// Publish an event to every live subscriber and return its id.
    ///
    /// Subscribers observe events published from one thread in publication
    /// order; delivery to each subscriber proceeds independently.
    pub fn publish(&self, event: Event) -> EventId {
        let id = self.inner.next_event_id.fetch_add(1, Ordering::Relaxed);
        let envelope = EventEnvelope {
            id,
            timestamp: Utc::now(),
            event,
        };

        let mut subscribers = self.lock_subscribers();
        subscribers.retain(|token, queue| match queue.try_send(envelope.clone()) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(_)) => {
                tracing::warn!(
                    token = *token,
                    event = envelope.event.name(),
                    "subscriber queue full, disconnecting"
                );
                false
            }
            Err(mpsc::error::TrySendError::Closed(_)) => false,
        });
        id
    }

    /// Subscribe with the default queue capacity.
    #[must_use]
    pub fn subscribe(&self) -> Subscription {
        self.subscribe_with_capacity(DEFAULT_QUEUE_CAPACITY)
    }

    /// Subscribe with an explicit per-subscriber queue capacity.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    #[must_use]
    pub fn subscribe_with_capacity(&self, capacity: usize) -> Subscription {
        assert!(capacity > 0, "subscriber queue capacity must be positive");
        let (sender, receiver) = mpsc::channel(capacity);
        let token = self.inner.next_token.fetch_add(1, Ordering::Relaxed);
        self.lock_subscribers().insert(token, sender);
        Subscription { token, receiver }
    }

    /// Remove a subscription; its stream ends once drained.
    pub fn unsubscribe(&self, token: SubscriptionToken) {
        self.lock_subscribers().remove(&token);
    }

    /// Number of live subscriptions.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.lock_subscribers().len()
    }

    fn lock_subscribers(
        &self,
    ) -> MutexGuard<'_, HashMap<SubscriptionToken, mpsc::Sender<EventEnvelope>>> {
        self.inner
            .subscribers
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

/// One subscriber's view of the bus.
pub struct Subscription {
    token: SubscriptionToken,
    receiver: mpsc::Receiver<EventEnvelope>,
}

impl Subscription {
    /// Token used to unsubscribe this subscription.
    #[must_use]
    pub const fn token(&self) -> SubscriptionToken {
        self.token
    }

    /// Receive the next envelope; `None` once unsubscribed or disconnected.
    pub async fn next(&mut self) -> Option<EventEnvelope> {
        self.receiver.recv().await
    }

    /// Convert into a stream for select-style consumers.
    #[must_use]
    pub fn into_stream(self) -> ReceiverStream<EventEnvelope> {
        ReceiverStream::new(self.receiver)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::task;
    use tokio::time::timeout;

    fn state_event(state: &str) -> Event {
        Event::TorrentStateChanged {
            torrent_id: "abc123".into(),
            new_state: state.into(),
        }
    }

    #[tokio::test]
    async fn subscribers_observe_publication_order() {
        let bus = EventBus::new();
        let mut first = bus.subscribe();
        let mut second = bus.subscribe();

        bus.publish(state_event("Downloading"));
        bus.publish(state_event("Seeding"));

        for subscription in [&mut first, &mut second] {
            let one = subscription.next().await.expect("first event");
            let two = subscription.next().await.expect("second event");
            assert!(one.id < two.id);
            assert_eq!(one.event, state_event("Downloading"));
            assert_eq!(two.event, state_event("Seeding"));
        }
    }

    #[tokio::test]
    async fn full_subscriber_is_disconnected_without_stalling_others() {
        let bus = EventBus::new();
        let mut slow = bus.subscribe_with_capacity(1);
        let mut healthy = bus.subscribe();

        // The slow subscriber never drains; the second publish overflows it.
        for i in 0..3 {
            let published = timeout(Duration::from_secs(1), async {
                bus.publish(state_event(&format!("state-{i}")))
            })
            .await;
            published.expect("publish must not block on a full subscriber");
        }

        assert_eq!(bus.subscriber_count(), 1);
        for i in 0..3 {
            let envelope = healthy.next().await.expect("healthy subscriber event");
            assert_eq!(envelope.event, state_event(&format!("state-{i}")));
        }

        // The lagging queue drains its single buffered event, then ends.
        assert!(slow.next().await.is_some());
        assert!(slow.next().await.is_none());
    }

    #[tokio::test]
    async fn unsubscribe_terminates_the_stream() {
        let bus = EventBus::new();
        let mut subscription = bus.subscribe();
        let token = subscription.token();

        bus.publish(Event::SessionPaused);
        bus.unsubscribe(token);
        bus.publish(Event::SessionResumed);

        assert_eq!(
            subscription.next().await.map(|env| env.event),
            Some(Event::SessionPaused)
        );
        assert!(subscription.next().await.is_none());
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn zero_subscriber_publish_is_a_silent_drop() {
        let bus = EventBus::new();
        let id = bus.publish(Event::SessionStarted);
        assert_eq!(id, 1);

        // A later subscriber sees nothing from before it joined.
        let mut late = bus.subscribe();
        bus.publish(Event::SessionPaused);
        let envelope = late.next().await.expect("live event");
        assert_eq!(envelope.event, Event::SessionPaused);
    }

    #[tokio::test]
    async fn concurrent_publishers_deliver_everything() {
        let bus = EventBus::new();
        let mut subscription = bus.subscribe_with_capacity(1024);

        let mut handles = Vec::new();
        for publisher in 0..4 {
            let bus = bus.clone();
            handles.push(task::spawn(async move {
                for i in 0..50 {
                    bus.publish(state_event(&format!("{publisher}-{i}")));
                }
            }));
        }
        for handle in handles {
            handle.await.expect("publisher task");
        }

        let mut seen = 0;
        while seen < 200 {
            subscription.next().await.expect("event");
            seen += 1;
        }
    }
}
