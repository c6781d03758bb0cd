//! Delivery of applied op batches to whoever is bound to a document.
//!
//! A shared document owns an `Arc<OpBus>` and emits every applied batch on
//! it. Listeners are called in the order they subscribed. `subscribe` hands
//! back a [`Subscription`]; dropping it removes the listener before `drop`
//! returns, so no batch emitted afterwards reaches it.

use crate::batch::OpBatch;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard, Weak};
use tracing::trace;

type Listener = Arc<dyn Fn(&OpBatch) + Send + Sync>;

/// Registration of one listener on an [`OpBus`]. Dropping it unsubscribes.
pub struct Subscription {
    bus: Weak<OpBus>,
    id: u64,
}

impl Subscription {
    /// Whether the bus this subscription belongs to is still alive.
    pub fn is_active(&self) -> bool {
        self.bus.strong_count() > 0
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(bus) = self.bus.upgrade() {
            bus.remove(self.id);
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).finish()
    }
}

/// Listener registry keyed by subscription id.
///
/// Wrap in `Arc` to subscribe.
#[derive(Default)]
pub struct OpBus {
    listeners: RwLock<BTreeMap<u64, Listener>>,
    next_id: AtomicU64,
}

impl OpBus {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, BTreeMap<u64, Listener>> {
        self.listeners.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, BTreeMap<u64, Listener>> {
        self.listeners.write().unwrap_or_else(|e| e.into_inner())
    }

    /// Register `listener` for every batch emitted from now on.
    pub fn subscribe(
        self: &Arc<Self>,
        listener: impl Fn(&OpBatch) + Send + Sync + 'static,
    ) -> Subscription {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.write().insert(id, Arc::new(listener));
        trace!("Listener {} subscribed", id);
        Subscription {
            bus: Arc::downgrade(self),
            id,
        }
    }

    // Waits for concurrent readers. No guard is held while a listener runs,
    // so a listener may drop subscriptions, its own included.
    fn remove(&self, id: u64) {
        if self.write().remove(&id).is_some() {
            trace!("Listener {} unsubscribed", id);
        }
    }

    /// Call every listener registered at the time of the call with `batch`.
    ///
    /// Returns how many listeners were called.
    pub fn emit(&self, batch: &OpBatch) -> usize {
        let listeners: Vec<Listener> = self.read().values().cloned().collect();
        for listener in &listeners {
            listener(batch);
        }
        listeners.len()
    }

    pub fn listener_count(&self) -> usize {
        self.read().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batch::FieldOp;
    use crate::source::SourceMarker;
    use std::sync::atomic::AtomicUsize;
    use std::sync::{Mutex, mpsc};
    use std::thread;
    use std::time::Duration;

    fn batch(source: &str) -> OpBatch {
        OpBatch::new(vec![FieldOp::replace("valueA")], SourceMarker::from(source))
    }

    fn counter(bus: &Arc<OpBus>) -> (Subscription, Arc<AtomicUsize>) {
        let count = Arc::new(AtomicUsize::new(0));
        let count_clone = Arc::clone(&count);
        let sub = bus.subscribe(move |_| {
            count_clone.fetch_add(1, Ordering::Relaxed);
        });
        (sub, count)
    }

    #[test]
    fn test_listeners_called_in_subscription_order() {
        let bus = Arc::new(OpBus::new());
        let seen = Arc::new(Mutex::new(Vec::new()));

        let subs: Vec<Subscription> = ["first", "second", "third"]
            .into_iter()
            .map(|name| {
                let seen = Arc::clone(&seen);
                bus.subscribe(move |batch| {
                    seen.lock().unwrap().push(format!("{}:{}", name, batch.source));
                })
            })
            .collect();

        assert_eq!(bus.emit(&batch("remote")), 3);
        assert_eq!(
            *seen.lock().unwrap(),
            vec!["first:remote", "second:remote", "third:remote"]
        );
        drop(subs);
    }

    #[test]
    fn test_dropped_subscription_stops_delivery() {
        let bus = Arc::new(OpBus::new());
        let (sub_a, count_a) = counter(&bus);
        let (_sub_b, count_b) = counter(&bus);

        bus.emit(&batch("remote"));
        drop(sub_a);
        assert_eq!(bus.emit(&batch("remote")), 1);

        assert_eq!(count_a.load(Ordering::Relaxed), 1);
        assert_eq!(count_b.load(Ordering::Relaxed), 2);
        assert_eq!(bus.listener_count(), 1);
    }

    #[test]
    fn test_drop_waits_for_concurrent_reader() {
        let bus = Arc::new(OpBus::new());
        let (sub, _count) = counter(&bus);
        let (held_tx, held_rx) = mpsc::channel();

        let reader = {
            let bus = Arc::clone(&bus);
            thread::spawn(move || {
                let guard = bus.read();
                held_tx.send(()).unwrap();
                thread::sleep(Duration::from_millis(50));
                drop(guard);
            })
        };

        held_rx.recv().unwrap();
        drop(sub);

        assert_eq!(bus.listener_count(), 0);
        reader.join().unwrap();
    }

    #[test]
    fn test_listener_can_drop_its_own_subscription() {
        let bus = Arc::new(OpBus::new());
        let slot: Arc<Mutex<Option<Subscription>>> = Arc::new(Mutex::new(None));
        let calls = Arc::new(AtomicUsize::new(0));

        let sub = {
            let slot = Arc::clone(&slot);
            let calls = Arc::clone(&calls);
            bus.subscribe(move |_| {
                calls.fetch_add(1, Ordering::Relaxed);
                slot.lock().unwrap().take();
            })
        };
        *slot.lock().unwrap() = Some(sub);

        bus.emit(&batch("remote"));
        bus.emit(&batch("remote"));

        assert_eq!(calls.load(Ordering::Relaxed), 1);
        assert_eq!(bus.listener_count(), 0);
    }

    #[test]
    fn test_subscription_outlives_bus() {
        let bus = Arc::new(OpBus::new());
        let sub = bus.subscribe(|_| {});
        assert!(sub.is_active());

        drop(bus);

        assert!(!sub.is_active());
        drop(sub);
    }
}
