//! Input observers and dispatch

use crate::DeviceSnapshot;
use parking_lot::RwLock;
use raildriver_protocol::InputFields;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::trace;

/// One change notification: the new snapshot and the fields that moved.
#[derive(Debug, Clone)]
pub struct InputEvent {
    pub snapshot: Arc<DeviceSnapshot>,
    pub changed: InputFields,
}

/// What an observer did with an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Dispatch {
    /// Not interested; keep going.
    #[default]
    Continue,
    /// Acted on it. Later observers still run, the default handler does not.
    Handled,
    /// Stop here. No later observer or default handler runs.
    Cancel,
}

/// Receives input events on the read thread. A slow observer stalls the
/// read loop.
pub trait InputObserver: Send + Sync {
    fn on_input(&self, event: &InputEvent) -> Dispatch;
}

impl<F> InputObserver for F
where
    F: Fn(&InputEvent) -> Dispatch + Send + Sync,
{
    fn on_input(&self, event: &InputEvent) -> Dispatch {
        self(event)
    }
}

/// Runs when no observer handled or cancelled the event.
pub type DefaultHandler = Arc<dyn Fn(&InputEvent) + Send + Sync>;

/// Returned by [`ObserverRegistry::add`] for later removal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverId(u64);

/// Ordered observer list plus an optional fallback.
#[derive(Default)]
pub struct ObserverRegistry {
    observers: RwLock<Vec<(ObserverId, Arc<dyn InputObserver>)>>,
    default_handler: RwLock<Option<DefaultHandler>>,
    next_id: AtomicU64,
}

impl ObserverRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, observer: Arc<dyn InputObserver>) -> ObserverId {
        let id = ObserverId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.observers.write().push((id, observer));
        id
    }

    pub fn remove(&self, id: ObserverId) -> bool {
        let mut observers = self.observers.write();
        let before = observers.len();
        observers.retain(|(existing, _)| *existing != id);
        observers.len() != before
    }

    pub fn len(&self) -> usize {
        self.observers.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.observers.read().is_empty()
    }

    /// Replaces the default handler. `None` removes it.
    pub fn set_default_handler(&self, handler: Option<DefaultHandler>) {
        *self.default_handler.write() = handler;
    }

    /// Walks the observers in registration order.
    ///
    /// Returns [`Dispatch::Cancel`] if one cancelled, [`Dispatch::Handled`]
    /// if one handled it, else [`Dispatch::Continue`] after running the
    /// default handler. Observers may register or remove observers from
    /// inside the callback; the change applies from the next event.
    pub fn dispatch(&self, event: &InputEvent) -> Dispatch {
        let observers: Vec<Arc<dyn InputObserver>> = self
            .observers
            .read()
            .iter()
            .map(|(_, observer)| Arc::clone(observer))
            .collect();

        let mut outcome = Dispatch::Continue;
        for observer in observers {
            match observer.on_input(event) {
                Dispatch::Cancel => {
                    trace!(changed = ?event.changed, "Input event cancelled");
                    return Dispatch::Cancel;
                }
                Dispatch::Handled => outcome = Dispatch::Handled,
                Dispatch::Continue => {}
            }
        }

        if outcome == Dispatch::Continue {
            let handler = self.default_handler.read().clone();
            if let Some(handler) = handler {
                handler(event);
            }
        }
        outcome
    }
}
