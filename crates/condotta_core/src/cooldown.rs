//! Per-user cooldown tracking for currency awards.
//!
//! Process-scoped and non-durable: the map resets on restart and is not
//! part of the consistency model. War scoring never consults it.

use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Time-evicting cooldown cache keyed by user id.
#[derive(Debug)]
pub struct CooldownCache {
    ttl: Duration,
    entries: HashMap<i64, Instant>,
}

impl CooldownCache {
    /// Create a cache with the given cooldown window.
    pub fn new(ttl: Duration) -> Self {
        tracing::debug!(ttl_secs = ttl.as_secs(), "Creating cooldown cache");
        Self {
            ttl,
            entries: HashMap::new(),
        }
    }

    /// Attempt to pass the cooldown gate for a user.
    ///
    /// Returns `true` and records the attempt when the user is off cooldown;
    /// returns `false` without updating the window otherwise.
    pub fn try_acquire(&mut self, user_id: i64) -> bool {
        let now = Instant::now();
        match self.entries.get(&user_id) {
            Some(last) if now.duration_since(*last) < self.ttl => false,
            _ => {
                self.entries.insert(user_id, now);
                true
            }
        }
    }

    /// Drop entries whose window has elapsed. Returns how many were removed.
    pub fn cleanup_expired(&mut self) -> usize {
        let before = self.entries.len();
        let ttl = self.ttl;
        let now = Instant::now();
        self.entries
            .retain(|_, last| now.duration_since(*last) < ttl);

        let removed = before - self.entries.len();
        if removed > 0 {
            tracing::debug!(
                removed,
                remaining = self.entries.len(),
                "Evicted expired cooldown entries"
            );
        }
        removed
    }

    /// Number of users currently tracked.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no users are tracked.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_acquire_passes_and_second_is_blocked() {
        let mut cache = CooldownCache::new(Duration::from_secs(10));
        assert!(cache.try_acquire(1));
        assert!(!cache.try_acquire(1));
        // Distinct users do not share a window.
        assert!(cache.try_acquire(2));
    }

    #[test]
    fn zero_ttl_never_blocks() {
        let mut cache = CooldownCache::new(Duration::ZERO);
        assert!(cache.try_acquire(1));
        assert!(cache.try_acquire(1));
    }

    #[test]
    fn cleanup_drops_elapsed_entries() {
        let mut cache = CooldownCache::new(Duration::ZERO);
        cache.try_acquire(1);
        cache.try_acquire(2);
        assert_eq!(cache.cleanup_expired(), 2);
        assert!(cache.is_empty());
    }
}
