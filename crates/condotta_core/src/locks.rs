//! Per-entity mutual exclusion.
//!
//! Two concurrent operations on the same faction (a kick racing a disband)
//! must not interleave their read-modify-write steps. Operations across
//! different factions proceed in parallel.

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Key identifying the serialization scope of a mutation.
///
/// Guild-keyed operations protect cross-faction invariants (unique name,
/// one membership per user, one active war); faction-keyed operations
/// protect a single roster. Lock order is guild before faction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LockKey {
    /// Guild-wide scope.
    Guild(i64),
    /// Single-faction scope.
    Faction(i32),
}

/// Async mutex map keyed by [`LockKey`].
///
/// Guards are owned so they can be held across provisioner awaits without
/// borrowing the map; unrelated entities are never blocked.
#[derive(Debug, Default)]
pub struct EntityLocks {
    inner: Mutex<HashMap<LockKey, Arc<Mutex<()>>>>,
}

impl EntityLocks {
    /// Create an empty lock map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquire the lock for the given key, creating it on first use.
    pub async fn acquire(&self, key: LockKey) -> OwnedMutexGuard<()> {
        let entry = {
            let mut map = self.inner.lock().await;
            Arc::clone(map.entry(key).or_default())
        };
        entry.lock_owned().await
    }
}
