//! Keyed mutual exclusion
//!
//! Record operations edit a zone by reading the whole object, changing its
//! record list and writing it back. Two such sequences against the same
//! zone must not interleave or one of them loses its change. [`MutexKV`]
//! hands out one async lock per key (the zone id); different keys never
//! block each other.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::OwnedMutexGuard;
use tracing::trace;

type Slot = Arc<tokio::sync::Mutex<()>>;

/// Map of named async locks
#[derive(Debug, Clone, Default)]
pub struct MutexKV {
    slots: Arc<Mutex<HashMap<String, Slot>>>,
}

impl MutexKV {
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquire the lock for `key`, waiting while another holder has it
    pub async fn lock(&self, key: &str) -> KeyGuard {
        let slot = {
            let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
            Arc::clone(slots.entry(key.to_string()).or_default())
        };

        trace!(key, "waiting for lock");
        let guard = slot.lock_owned().await;
        trace!(key, "lock acquired");

        KeyGuard {
            key: key.to_string(),
            guard: Some(guard),
            slots: Arc::clone(&self.slots),
        }
    }

    /// Number of keys currently held or waited on
    pub fn len(&self) -> usize {
        self.slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Held lock for one key; released on drop
#[derive(Debug)]
pub struct KeyGuard {
    key: String,
    guard: Option<OwnedMutexGuard<()>>,
    slots: Arc<Mutex<HashMap<String, Slot>>>,
}

impl KeyGuard {
    pub fn key(&self) -> &str {
        &self.key
    }
}

impl Drop for KeyGuard {
    fn drop(&mut self) {
        // Release first so the strong count below only sees the map and waiters.
        drop(self.guard.take());

        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        if slots
            .get(&self.key)
            .is_some_and(|slot| Arc::strong_count(slot) == 1)
        {
            slots.remove(&self.key);
        }
        trace!(key = %self.key, "lock released");
    }
}
