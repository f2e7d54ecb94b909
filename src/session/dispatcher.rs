//! Inbound event fan-out
//!
//! Listeners register per event kind and receive every event of that kind, in
//! registration order, until they unsubscribe. Delivery iterates a snapshot of
//! the registry, so subscribing or unsubscribing from inside a listener never
//! invalidates an in-progress delivery pass.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, Mutex};

use crate::protocol::{ChatMessage, DriverLocationUpdate, InboundEvent};

/// Fallback text for server error events that carry no message
const GENERIC_ERROR_MESSAGE: &str = "realtime channel error";

type Listener<T> = Arc<dyn Fn(&T) + Send + Sync>;

struct Registry<T> {
    next_id: u64,
    listeners: Vec<(u64, Listener<T>)>,
}

/// Listeners for one event kind
pub struct ListenerSet<T> {
    registry: Arc<Mutex<Registry<T>>>,
}

impl<T> Clone for ListenerSet<T> {
    fn clone(&self) -> Self {
        Self {
            registry: Arc::clone(&self.registry),
        }
    }
}

impl<T: 'static> Default for ListenerSet<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: 'static> ListenerSet<T> {
    pub fn new() -> Self {
        Self {
            registry: Arc::new(Mutex::new(Registry {
                next_id: 0,
                listeners: Vec::new(),
            })),
        }
    }

    /// Register a listener; the returned handle removes exactly this listener
    pub fn subscribe(&self, listener: impl Fn(&T) + Send + Sync + 'static) -> Subscription {
        let id = {
            let mut registry = lock_registry(&self.registry);
            let id = registry.next_id;
            registry.next_id += 1;
            registry.listeners.push((id, Arc::new(listener)));
            id
        };

        let registry = Arc::clone(&self.registry);
        Subscription {
            cancel: Box::new(move || {
                lock_registry(&registry)
                    .listeners
                    .retain(|(listener_id, _)| *listener_id != id);
            }),
        }
    }

    /// Deliver one payload to every currently-registered listener
    ///
    /// A listener that panics is logged and skipped; the rest of the set is
    /// still notified.
    pub fn notify(&self, payload: &T) {
        let snapshot: Vec<Listener<T>> = lock_registry(&self.registry)
            .listeners
            .iter()
            .map(|(_, listener)| Arc::clone(listener))
            .collect();

        for listener in snapshot {
            if catch_unwind(AssertUnwindSafe(|| listener(payload))).is_err() {
                tracing::warn!("Event listener panicked during delivery");
            }
        }
    }

    /// Number of registered listeners
    pub fn len(&self) -> usize {
        lock_registry(&self.registry).listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// A listener panic leaves the registry untouched (mutation happens outside
// delivery), so a poisoned lock still guards consistent data.
fn lock_registry<T>(registry: &Mutex<Registry<T>>) -> std::sync::MutexGuard<'_, Registry<T>> {
    match registry.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

/// Handle returned by subscribe calls
///
/// Dropping the handle does not unsubscribe; removal is explicit. Calling
/// [`Subscription::unsubscribe`] more than once is a no-op.
pub struct Subscription {
    cancel: Box<dyn Fn() + Send + Sync>,
}

impl Subscription {
    /// Remove the listener this subscription was created for
    pub fn unsubscribe(&self) {
        (self.cancel)();
    }
}

/// Routes decoded inbound events to the per-kind listener sets
///
/// One dispatcher per session; both namespaces carry the same dispatcher
/// shape, they just populate different registries. Cloning shares the
/// underlying registries.
#[derive(Clone, Default)]
pub struct Dispatcher {
    messages: ListenerSet<ChatMessage>,
    locations: ListenerSet<DriverLocationUpdate>,
    errors: ListenerSet<String>,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Listen for new chat messages
    pub fn subscribe_messages(
        &self,
        listener: impl Fn(&ChatMessage) + Send + Sync + 'static,
    ) -> Subscription {
        self.messages.subscribe(listener)
    }

    /// Listen for driver position updates
    pub fn subscribe_locations(
        &self,
        listener: impl Fn(&DriverLocationUpdate) + Send + Sync + 'static,
    ) -> Subscription {
        self.locations.subscribe(listener)
    }

    /// Listen for server-pushed error notifications
    pub fn subscribe_errors(
        &self,
        listener: impl Fn(&String) + Send + Sync + 'static,
    ) -> Subscription {
        self.errors.subscribe(listener)
    }

    /// Deliver one inbound event in transport order
    pub fn dispatch(&self, event: InboundEvent) {
        match event {
            InboundEvent::NewMessage(message) => self.messages.notify(&message),
            InboundEvent::DriverLocation(update) => self.locations.notify(&update),
            InboundEvent::Error { message } => {
                let message = message.unwrap_or_else(|| GENERIC_ERROR_MESSAGE.to_string());
                tracing::warn!("Server error event: {}", message);
                self.errors.notify(&message);
            }
        }
    }
}
