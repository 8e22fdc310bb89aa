//! Page-scoped publish/subscribe channel
//!
//! Decouples the search bar from any number of results panels. Delivery is
//! synchronous and follows registration order. Subscriptions are RAII guards:
//! dropping one deregisters its handler.

mod events;

pub use events::{BusMessage, QueryUpdateEvent, Topic};

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use tracing::debug;

type Handler = Arc<dyn Fn(&BusMessage) + Send + Sync>;

/// Opaque id of a registered handler
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionToken(u64);

struct Registration {
    token: SubscriptionToken,
    topic: Topic,
    handler: Handler,
}

#[derive(Default)]
struct BusInner {
    next_token: AtomicU64,
    registrations: Mutex<Vec<Registration>>,
}

impl BusInner {
    fn registrations(&self) -> MutexGuard<'_, Vec<Registration>> {
        self.registrations
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn remove(&self, token: SubscriptionToken) -> bool {
        let mut registrations = self.registrations();
        let before = registrations.len();
        registrations.retain(|r| r.token != token);
        registrations.len() != before
    }
}

/// Handle to a page's event bus. Clones share the same registry.
#[derive(Clone, Default)]
pub struct EventBus {
    inner: Arc<BusInner>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` for messages on `topic`
    pub fn subscribe<F>(&self, topic: Topic, handler: F) -> Subscription
    where
        F: Fn(&BusMessage) + Send + Sync + 'static,
    {
        let token = SubscriptionToken(self.inner.next_token.fetch_add(1, Ordering::Relaxed));
        self.inner.registrations().push(Registration {
            token,
            topic,
            handler: Arc::new(handler),
        });
        debug!("Subscribed {:?} to {:?}", token, topic);

        Subscription {
            token,
            bus: Arc::downgrade(&self.inner),
        }
    }

    /// Register a handler for query updates
    pub fn subscribe_query_updates<F>(&self, handler: F) -> Subscription
    where
        F: Fn(&QueryUpdateEvent) + Send + Sync + 'static,
    {
        self.subscribe(Topic::QueryUpdate, move |message| match message {
            BusMessage::QueryUpdate(event) => handler(event),
        })
    }

    /// Remove a handler. Returns false if it was not registered.
    pub fn unsubscribe(&self, token: SubscriptionToken) -> bool {
        self.inner.remove(token)
    }

    /// Deliver `message` to every handler on its topic, in registration order.
    ///
    /// Returns the number of handlers invoked.
    pub fn publish(&self, message: impl Into<BusMessage>) -> usize {
        let message = message.into();
        let topic = message.topic();

        // Handlers run without the lock held so they may (un)subscribe.
        let handlers: Vec<Handler> = self
            .inner
            .registrations()
            .iter()
            .filter(|r| r.topic == topic)
            .map(|r| r.handler.clone())
            .collect();

        for handler in &handlers {
            handler(&message);
        }

        debug!("Published {:?} to {} subscribers", topic, handlers.len());
        handlers.len()
    }

    /// Number of handlers listening on `topic`
    pub fn subscriber_count(&self, topic: Topic) -> usize {
        self.inner
            .registrations()
            .iter()
            .filter(|r| r.topic == topic)
            .count()
    }
}

/// Registration guard; the handler is removed when this is dropped
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    token: SubscriptionToken,
    bus: Weak<BusInner>,
}

impl Subscription {
    pub fn token(&self) -> SubscriptionToken {
        self.token
    }

    /// Unsubscribe now
    pub fn cancel(self) {}
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(bus) = self.bus.upgrade() {
            if bus.remove(self.token) {
                debug!("Unsubscribed {:?}", self.token);
            }
        }
    }
}
