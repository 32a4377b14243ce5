//! Per-topic handler registry
//!
//! Maps each topic to the callbacks interested in it. Dispatch snapshots the
//! callbacks before running them, so a handler may register or remove
//! handlers without deadlocking, and runs every callback under
//! `catch_unwind` so one panicking handler cannot starve its siblings.

use std::any::Any;
use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use fund_core::{InboundMessage, Topic};
use parking_lot::RwLock;
use tracing::{debug, error};

/// Callback invoked for every message on a topic
pub type Handler = Arc<dyn Fn(&InboundMessage) + Send + Sync>;

/// Identifies one registered handler
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HandlerId(u64);

#[derive(Default)]
struct Inner {
    next_id: AtomicU64,
    handlers: RwLock<HashMap<Topic, Vec<(HandlerId, Handler)>>>,
}

/// Topic -> callbacks, shared between the client and its connection task
#[derive(Clone, Default)]
pub struct HandlerRegistry {
    inner: Arc<Inner>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` for `topic`
    ///
    /// The returned handle removes exactly this handler. Dropping the handle
    /// leaves the handler registered.
    pub fn add<F>(&self, topic: Topic, handler: F) -> HandlerHandle
    where
        F: Fn(&InboundMessage) + Send + Sync + 'static,
    {
        let id = HandlerId(self.inner.next_id.fetch_add(1, Ordering::Relaxed));
        self.inner
            .handlers
            .write()
            .entry(topic)
            .or_default()
            .push((id, Arc::new(handler)));

        debug!("[Realtime] Handler {:?} registered for {}", id, topic);

        HandlerHandle {
            topic,
            id,
            registry: Arc::downgrade(&self.inner),
        }
    }

    /// Remove a handler; returns whether it was still registered
    pub fn remove(&self, topic: Topic, id: HandlerId) -> bool {
        remove_from(&self.inner, topic, id)
    }

    /// Number of handlers registered for `topic`
    pub fn handler_count(&self, topic: Topic) -> usize {
        self.inner
            .handlers
            .read()
            .get(&topic)
            .map(|handlers| handlers.len())
            .unwrap_or(0)
    }

    /// Run every handler registered for the message's topic
    ///
    /// Returns the number of handlers that completed without panicking.
    /// Messages whose `type` is not a topic are ignored.
    pub fn dispatch(&self, message: &InboundMessage) -> usize {
        let Some(topic) = message.topic() else {
            debug!("[Realtime] Ignoring non-topic message: {}", message.kind);
            return 0;
        };

        let handlers: Vec<(HandlerId, Handler)> = self
            .inner
            .handlers
            .read()
            .get(&topic)
            .cloned()
            .unwrap_or_default();

        let mut completed = 0;
        for (id, handler) in handlers {
            match catch_unwind(AssertUnwindSafe(|| handler(message))) {
                Ok(()) => completed += 1,
                Err(panic) => {
                    error!(
                        "[Realtime] Handler {:?} for {} panicked: {}",
                        id,
                        topic,
                        panic_message(panic.as_ref())
                    );
                }
            }
        }
        completed
    }
}

impl std::fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let counts: HashMap<Topic, usize> = self
            .inner
            .handlers
            .read()
            .iter()
            .map(|(topic, handlers)| (*topic, handlers.len()))
            .collect();
        f.debug_struct("HandlerRegistry")
            .field("handlers", &counts)
            .finish()
    }
}

fn remove_from(inner: &Inner, topic: Topic, id: HandlerId) -> bool {
    let mut handlers = inner.handlers.write();
    let Some(list) = handlers.get_mut(&topic) else {
        return false;
    };
    let before = list.len();
    list.retain(|(existing, _)| *existing != id);
    let removed = list.len() != before;
    if list.is_empty() {
        handlers.remove(&topic);
    }
    removed
}

pub(crate) fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

/// Removes one handler when [`remove`](HandlerHandle::remove) is called
#[derive(Debug)]
pub struct HandlerHandle {
    topic: Topic,
    id: HandlerId,
    registry: Weak<Inner>,
}

impl HandlerHandle {
    pub fn topic(&self) -> Topic {
        self.topic
    }

    pub fn id(&self) -> HandlerId {
        self.id
    }

    /// Unregister the handler; returns whether it was still registered
    pub fn remove(self) -> bool {
        match self.registry.upgrade() {
            Some(inner) => remove_from(&inner, self.topic, self.id),
            None => false,
        }
    }
}
