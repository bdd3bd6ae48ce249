use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

/// Per-key call statistics kept by the [`CallMonitor`].
#[derive(Debug, Clone, Default)]
pub struct CallStats {
    pub count: u64,
    pub times: Vec<DateTime<Utc>>,
}

/// Advisory duplicate-call tracker.
///
/// Records a counter and timestamp list per logical endpoint key and warns
/// when a key repeats. Purely observational: it never blocks a call and
/// has no effect on control flow.
pub struct CallMonitor {
    calls: Mutex<HashMap<String, CallStats>>,
}

impl CallMonitor {
    pub fn new() -> Self {
        CallMonitor {
            calls: Mutex::new(HashMap::new()),
        }
    }

    pub fn record(&self, key: &str) {
        let mut calls = self.lock();
        let stats = calls.entry(key.to_string()).or_default();
        stats.count += 1;
        stats.times.push(Utc::now());

        if stats.count > 1 {
            warn!("API call duplicate: {} called {} times", key, stats.count);
        } else {
            debug!("API call: {}", key);
        }
    }

    /// Snapshot of every key and its stats.
    pub fn report(&self) -> HashMap<String, CallStats> {
        self.lock().clone()
    }

    pub fn count(&self, key: &str) -> u64 {
        self.lock().get(key).map(|s| s.count).unwrap_or(0)
    }

    pub fn has_duplicates(&self) -> bool {
        self.lock().values().any(|s| s.count > 1)
    }

    /// Keys called more than once, with their counts.
    pub fn duplicates(&self) -> Vec<(String, u64)> {
        self.lock()
            .iter()
            .filter(|(_, s)| s.count > 1)
            .map(|(k, s)| (k.clone(), s.count))
            .collect()
    }

    pub fn reset(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, CallStats>> {
        self.calls.lock().unwrap_or_else(|p| p.into_inner())
    }
}

impl Default for CallMonitor {
    fn default() -> Self {
        CallMonitor::new()
    }
}
