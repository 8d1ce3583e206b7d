//! Publish/subscribe bus for lifecycle events

use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, OnceLock, PoisonError, RwLock};
use tracing::error;

use super::{EventKind, RunEvent};
use crate::utils::panic_message;

/// Subscriber callback
pub type Listener = Arc<dyn Fn(&RunEvent) + Send + Sync>;

/// Synchronous event bus
///
/// `emit` calls every listener registered for the event's kind, in
/// subscription order, before returning. A listener that panics is logged
/// and skipped; the others still receive the event. Cloning yields another
/// handle to the same subscriber set.
#[derive(Clone, Default)]
pub struct EventBus {
    listeners: Arc<RwLock<HashMap<EventKind, Vec<Listener>>>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Process-wide bus
    pub fn global() -> &'static EventBus {
        static GLOBAL: OnceLock<EventBus> = OnceLock::new();
        GLOBAL.get_or_init(EventBus::new)
    }

    pub fn subscribe<F>(&self, kind: EventKind, listener: F)
    where
        F: Fn(&RunEvent) + Send + Sync + 'static,
    {
        self.subscribe_listener(kind, Arc::new(listener));
    }

    pub fn subscribe_listener(&self, kind: EventKind, listener: Listener) {
        self.listeners
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(kind)
            .or_default()
            .push(listener);
    }

    /// Register one listener for every event kind
    pub fn subscribe_all<F>(&self, listener: F)
    where
        F: Fn(&RunEvent) + Send + Sync + 'static,
    {
        let listener: Listener = Arc::new(listener);
        for kind in EventKind::all() {
            self.subscribe_listener(kind, listener.clone());
        }
    }

    /// Deliver `event` to its subscribers; returns how many ran cleanly
    pub fn emit(&self, event: &RunEvent) -> usize {
        // Listeners may subscribe from inside a callback, so the lock is
        // released before any of them runs.
        let listeners: Vec<Listener> = self
            .listeners
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&event.kind())
            .cloned()
            .unwrap_or_default();

        let mut delivered = 0;
        for listener in &listeners {
            match catch_unwind(AssertUnwindSafe(|| listener(event))) {
                Ok(()) => delivered += 1,
                Err(payload) => {
                    error!(
                        event = event.kind().name(),
                        "event listener panicked: {}",
                        panic_message(payload.as_ref())
                    );
                }
            }
        }
        delivered
    }

    pub fn listener_count(&self, kind: EventKind) -> usize {
        self.listeners
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&kind)
            .map_or(0, Vec::len)
    }
}
