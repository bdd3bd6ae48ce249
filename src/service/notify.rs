use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Weak};

/// Cache slot a notification refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resource {
    Properties,
    News,
    Projects,
    Users,
    CurrentUser,
    Global,
}

/// State-changed notification. Every store mutation ends in exactly one
/// of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreEvent {
    Initialized,
    LoadingChanged(Resource),
    DataArrived(Resource),
    ErrorChanged(Resource),
    CurrentUserChanged,
}

type Callback = Box<dyn Fn(&StoreEvent) + Send + Sync>;

/// Callback registry behind the store's subscribe surface.
///
/// Listeners are invoked outside the registry lock, so a callback may read
/// store state or drop its own subscription without deadlocking.
pub struct Notifier {
    inner: Arc<NotifierInner>,
}

struct NotifierInner {
    next_id: AtomicU64,
    listeners: Mutex<HashMap<u64, Arc<Callback>>>,
}

impl Notifier {
    pub fn new() -> Self {
        Notifier {
            inner: Arc::new(NotifierInner {
                next_id: AtomicU64::new(1),
                listeners: Mutex::new(HashMap::new()),
            }),
        }
    }

    pub fn subscribe(&self, callback: impl Fn(&StoreEvent) + Send + Sync + 'static) -> Subscription {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        self.inner
            .listeners
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .insert(id, Arc::new(Box::new(callback)));
        Subscription {
            id,
            inner: Arc::downgrade(&self.inner),
        }
    }

    pub fn emit(&self, event: StoreEvent) {
        let snapshot: Vec<Arc<Callback>> = self
            .inner
            .listeners
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .values()
            .cloned()
            .collect();
        for callback in snapshot {
            callback(&event);
        }
    }
}

impl Default for Notifier {
    fn default() -> Self {
        Notifier::new()
    }
}

/// Listener registration; dropping it unsubscribes.
pub struct Subscription {
    id: u64,
    inner: Weak<NotifierInner>,
}

impl Subscription {
    pub fn unsubscribe(self) {}
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(inner) = self.inner.upgrade() {
            inner
                .listeners
                .lock()
                .unwrap_or_else(|p| p.into_inner())
                .remove(&self.id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn test_emit_reaches_subscribers() {
        let notifier = Notifier::new();
        let seen = Arc::new(AtomicUsize::new(0));

        let seen_a = seen.clone();
        let _sub_a = notifier.subscribe(move |_| {
            seen_a.fetch_add(1, Ordering::SeqCst);
        });
        let seen_b = seen.clone();
        let _sub_b = notifier.subscribe(move |_| {
            seen_b.fetch_add(1, Ordering::SeqCst);
        });

        notifier.emit(StoreEvent::DataArrived(Resource::Properties));
        assert_eq!(seen.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_dropped_subscription_receives_nothing() {
        let notifier = Notifier::new();
        let seen = Arc::new(AtomicUsize::new(0));

        let seen_clone = seen.clone();
        let sub = notifier.subscribe(move |_| {
            seen_clone.fetch_add(1, Ordering::SeqCst);
        });

        notifier.emit(StoreEvent::CurrentUserChanged);
        drop(sub);
        notifier.emit(StoreEvent::CurrentUserChanged);

        assert_eq!(seen.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_unsubscribe_inside_callback_does_not_deadlock() {
        let notifier = Notifier::new();
        let slot: Arc<Mutex<Option<Subscription>>> = Arc::new(Mutex::new(None));

        let slot_clone = slot.clone();
        let sub = notifier.subscribe(move |_| {
            // Dropping the held subscription re-enters the registry
            *slot_clone.lock().unwrap() = None;
        });
        *slot.lock().unwrap() = Some(sub);

        notifier.emit(StoreEvent::Initialized);
        assert!(slot.lock().unwrap().is_none());
    }

    #[test]
    fn test_event_carries_resource() {
        let notifier = Notifier::new();
        let last: Arc<Mutex<Option<StoreEvent>>> = Arc::new(Mutex::new(None));

        let last_clone = last.clone();
        let _sub = notifier.subscribe(move |event| {
            *last_clone.lock().unwrap() = Some(*event);
        });

        notifier.emit(StoreEvent::ErrorChanged(Resource::News));
        assert_eq!(
            *last.lock().unwrap(),
            Some(StoreEvent::ErrorChanged(Resource::News))
        );
    }
}
