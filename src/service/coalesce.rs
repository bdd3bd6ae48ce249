use std::collections::HashMap;
use std::future::Future;
use std::hash::Hash;
use std::sync::{Mutex, MutexGuard};

use tokio::sync::watch;

/// Keyed request coalescing: at most one producer runs per key, and every
/// caller that arrives while it runs receives the same result.
///
/// The in-flight entry is removed when the producer settles, success or
/// failure, via a drop guard, so an error or cancellation can never leave
/// a permanently stuck entry. After settlement the next call for the same
/// key starts a fresh producer.
pub struct RequestCoalescer<K, T> {
    inflight: Mutex<HashMap<K, watch::Receiver<Option<T>>>>,
}

impl<K, T> RequestCoalescer<K, T>
where
    K: Eq + Hash + Clone,
    T: Clone,
{
    pub fn new() -> Self {
        RequestCoalescer {
            inflight: Mutex::new(HashMap::new()),
        }
    }

    /// Join the in-flight producer for `key`, or become the leader and run
    /// `producer` to completion.
    pub async fn run<F, Fut>(&self, key: K, producer: F) -> T
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        loop {
            let existing = self.lock().get(&key).cloned();

            if let Some(mut rx) = existing {
                match rx.wait_for(|slot| slot.is_some()).await {
                    Ok(slot) => {
                        if let Some(value) = (*slot).clone() {
                            return value;
                        }
                    }
                    // Leader dropped without publishing; take over
                    Err(_) => {}
                }
                continue;
            }

            let (tx, rx) = watch::channel(None);
            {
                let mut map = self.lock();
                if map.contains_key(&key) {
                    // Raced with another leader between lock scopes
                    continue;
                }
                map.insert(key.clone(), rx);
            }

            let guard = EntryGuard {
                inflight: &self.inflight,
                key: key.clone(),
            };
            let value = producer().await;

            // Remove the entry before publishing so a caller arriving after
            // settlement starts a fresh producer instead of replaying this one.
            drop(guard);
            let _ = tx.send(Some(value.clone()));
            return value;
        }
    }

    /// Forget all in-flight entries. Producers already running still
    /// complete and resolve their waiters; they just stop being joinable.
    pub fn clear(&self) {
        self.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<K, watch::Receiver<Option<T>>>> {
        self.inflight.lock().unwrap_or_else(|p| p.into_inner())
    }
}

impl<K, T> Default for RequestCoalescer<K, T>
where
    K: Eq + Hash + Clone,
    T: Clone,
{
    fn default() -> Self {
        RequestCoalescer::new()
    }
}

struct EntryGuard<'a, K, T>
where
    K: Eq + Hash,
{
    inflight: &'a Mutex<HashMap<K, watch::Receiver<Option<T>>>>,
    key: K,
}

impl<K, T> Drop for EntryGuard<'_, K, T>
where
    K: Eq + Hash,
{
    fn drop(&mut self) {
        self.inflight
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .remove(&self.key);
    }
}
