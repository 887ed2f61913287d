//! In-process change fan-out.
//!
//! Every successful mutation publishes one [`Notification`] to every current
//! subscriber, in subscription order. A subscriber that reports it is closed,
//! or panics, is pruned after the pass without affecting delivery to the
//! others.

use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;
use serde::Serialize;
use tracing::{debug, warn};

use crate::document::{AudioSettings, Document, Layout, StreamSource, TextOverlay, WindowRect};

/// What a mutation changed. Carries only the affected slice of state.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Change {
    Added { source: StreamSource },
    Removed { id: String },
    Layout { layout: Layout },
    Audio { id: String, settings: AudioSettings },
    Window { id: String, rect: WindowRect },
    Reordered { order: Vec<String> },
    TextOverlay { overlay: TextOverlay },
    ShowIds { value: bool },
    YoutubeNoCookie { value: bool },
    HideCursor { value: bool },
    /// The document file was edited outside this process
    Reloaded,
}

impl Change {
    /// Changes that clients cannot apply incrementally.
    ///
    /// Switching the YouTube host changes the embed origin of every player.
    pub fn requires_reload(&self) -> bool {
        matches!(self, Change::YoutubeNoCookie { .. })
    }
}

/// A change together with the full post-mutation document.
#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    pub change: Change,
    pub snapshot: Document,
}

/// Returned by a listener whose consumer has gone away.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListenerClosed;

impl std::fmt::Display for ListenerClosed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("listener closed")
    }
}

impl std::error::Error for ListenerClosed {}

/// Token identifying one subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

type Listener = Box<dyn Fn(&Notification) -> Result<(), ListenerClosed> + Send + Sync>;

/// Typed publish/subscribe registry.
///
/// Listeners run synchronously on the publishing thread and must not block or
/// call back into the store that owns the bus.
pub struct ChangeBus {
    listeners: RwLock<Vec<(SubscriptionId, Listener)>>,
    next_id: AtomicU64,
}

impl ChangeBus {
    pub fn new() -> Self {
        Self {
            listeners: RwLock::new(Vec::new()),
            next_id: AtomicU64::new(0),
        }
    }

    /// Register a listener; it receives every notification published after
    /// this call returns.
    pub fn subscribe<F>(&self, listener: F) -> SubscriptionId
    where
        F: Fn(&Notification) -> Result<(), ListenerClosed> + Send + Sync + 'static,
    {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.listeners.write().push((id, Box::new(listener)));
        id
    }

    /// Remove a listener. Returns `false` if it was already gone.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut listeners = self.listeners.write();
        let before = listeners.len();
        listeners.retain(|(existing, _)| *existing != id);
        listeners.len() != before
    }

    /// Deliver a change to every listener; returns how many accepted it.
    pub fn publish(&self, change: &Change, snapshot: &Document) -> usize {
        let mut closed = Vec::new();
        let mut delivered = 0;

        {
            let listeners = self.listeners.read();
            for (id, listener) in listeners.iter() {
                let notification = Notification {
                    change: change.clone(),
                    snapshot: snapshot.clone(),
                };
                // A panicking listener is dropped like a closed one
                match panic::catch_unwind(AssertUnwindSafe(|| listener(&notification))) {
                    Ok(Ok(())) => delivered += 1,
                    Ok(Err(ListenerClosed)) => closed.push(*id),
                    Err(_) => {
                        warn!(subscription = id.0, "listener panicked, unsubscribing it");
                        closed.push(*id);
                    }
                }
            }
        }

        if !closed.is_empty() {
            debug!(count = closed.len(), "pruning closed listeners");
            self.listeners.write().retain(|(id, _)| !closed.contains(id));
        }

        delivered
    }

    pub fn len(&self) -> usize {
        self.listeners.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.read().is_empty()
    }
}

impl Default for ChangeBus {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ChangeBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChangeBus")
            .field("listeners", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::Arc;

    fn recorder(bus: &ChangeBus) -> (SubscriptionId, Arc<Mutex<Vec<Notification>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let id = bus.subscribe(move |n: &Notification| {
            sink.lock().push(n.clone());
            Ok(())
        });
        (id, seen)
    }

    #[test]
    fn test_publish_reaches_every_listener() {
        let bus = ChangeBus::new();
        let recorders: Vec<_> = (0..3).map(|_| recorder(&bus)).collect();

        let doc = Document::default();
        let delivered = bus.publish(&Change::ShowIds { value: true }, &doc);

        assert_eq!(delivered, 3);
        for (_, seen) in &recorders {
            let seen = seen.lock();
            assert_eq!(seen.len(), 1);
            assert_eq!(seen[0].snapshot, doc);
            assert_eq!(seen[0].change, Change::ShowIds { value: true });
        }
    }

    #[test]
    fn test_subscription_order() {
        let bus = ChangeBus::new();
        let order = Arc::new(Mutex::new(Vec::new()));
        for n in 0..4 {
            let order = Arc::clone(&order);
            bus.subscribe(move |_: &Notification| {
                order.lock().push(n);
                Ok(())
            });
        }
        bus.publish(&Change::Reloaded, &Document::default());
        assert_eq!(*order.lock(), vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_closed_listener_is_pruned_without_blocking_others() {
        let bus = ChangeBus::new();
        let (_, before) = recorder(&bus);
        bus.subscribe(|_: &Notification| Err(ListenerClosed));
        let (_, after) = recorder(&bus);

        let delivered = bus.publish(&Change::Reloaded, &Document::default());
        assert_eq!(delivered, 2);
        assert_eq!(bus.len(), 2);
        assert_eq!(before.lock().len(), 1);
        assert_eq!(after.lock().len(), 1);
    }

    #[test]
    fn test_panicking_listener_is_pruned_without_blocking_others() {
        let bus = ChangeBus::new();
        bus.subscribe(|_: &Notification| panic!("listener bug"));
        let (_, after) = recorder(&bus);

        let delivered = bus.publish(&Change::ShowIds { value: true }, &Document::default());
        assert_eq!(delivered, 1);
        assert_eq!(after.lock().len(), 1);
        assert_eq!(bus.len(), 1);

        // The remaining listener keeps receiving
        bus.publish(&Change::Reloaded, &Document::default());
        assert_eq!(after.lock().len(), 2);
    }

    #[test]
    fn test_unsubscribe() {
        let bus = ChangeBus::new();
        let (id, seen) = recorder(&bus);
        assert!(bus.unsubscribe(id));
        assert!(!bus.unsubscribe(id));
        assert!(bus.is_empty());

        bus.publish(&Change::Reloaded, &Document::default());
        assert!(seen.lock().is_empty());
    }

    #[test]
    fn test_requires_reload() {
        assert!(Change::YoutubeNoCookie { value: false }.requires_reload());
        assert!(!Change::HideCursor { value: true }.requires_reload());
        assert!(!Change::Reloaded.requires_reload());
    }
}
