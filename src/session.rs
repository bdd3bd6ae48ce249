use std::sync::{Mutex, MutexGuard};

use serde_json::Value;

/// Warm-start snapshot of the signed-in user's raw row.
///
/// Advisory storage only: the gateway stays the source of truth and the
/// snapshot is replaced on the next successful user load. Hosts can back
/// this with whatever their platform offers for session-scoped storage.
pub trait SessionCache: Send + Sync {
    fn load(&self) -> Option<(String, Value)>;

    fn store(&self, user_id: &str, row: &Value);

    fn clear(&self);
}

/// Process-local session cache.
pub struct InMemorySession {
    slot: Mutex<Option<(String, Value)>>,
}

impl InMemorySession {
    pub fn new() -> Self {
        InMemorySession {
            slot: Mutex::new(None),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Option<(String, Value)>> {
        self.slot.lock().unwrap_or_else(|p| p.into_inner())
    }
}

impl Default for InMemorySession {
    fn default() -> Self {
        InMemorySession::new()
    }
}

impl SessionCache for InMemorySession {
    fn load(&self) -> Option<(String, Value)> {
        self.lock().clone()
    }

    fn store(&self, user_id: &str, row: &Value) {
        *self.lock() = Some((user_id.to_string(), row.clone()));
    }

    fn clear(&self) {
        *self.lock() = None;
    }
}
