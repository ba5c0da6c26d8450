//! Currency ledger: passive message awards and balance queries.

use crate::cooldown::CooldownCache;
use crate::store::FactionStore;
use condotta_error::CondottaResult;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::instrument;

/// Coins awarded per qualifying message.
pub const AWARD_PER_MESSAGE: i64 = 1;

/// Awards currency for chat activity and answers balance queries.
///
/// The award path is throttled by a process-scoped [`CooldownCache`]; the
/// throttle state is intentionally non-durable and resets on restart.
pub struct CurrencyLedger<S> {
    store: Arc<S>,
    cooldown: Mutex<CooldownCache>,
}

impl<S: FactionStore> CurrencyLedger<S> {
    /// Create a ledger with the given per-user award cooldown.
    pub fn new(store: Arc<S>, cooldown: Duration) -> Self {
        Self {
            store,
            cooldown: Mutex::new(CooldownCache::new(cooldown)),
        }
    }

    /// Award for one chat message.
    ///
    /// Returns the new balance, or `None` when the user is on cooldown.
    #[instrument(skip(self))]
    pub async fn award_for_message(&self, user_id: i64) -> CondottaResult<Option<i64>> {
        let passed = {
            let mut cooldown = self.cooldown.lock().await;
            cooldown.try_acquire(user_id)
        };
        if !passed {
            return Ok(None);
        }
        let balance = self.store.adjust_balance(user_id, AWARD_PER_MESSAGE).await?;
        Ok(Some(balance))
    }

    /// A user's balance, creating the account lazily.
    pub async fn balance(&self, user_id: i64) -> CondottaResult<i64> {
        self.store.get_or_create_account(user_id).await
    }

    /// Adjust a user's balance by an arbitrary amount (administrator grant).
    ///
    /// Negative amounts are subject to the insufficient-funds check.
    #[instrument(skip(self))]
    pub async fn grant(&self, user_id: i64, amount: i64) -> CondottaResult<i64> {
        self.store.adjust_balance(user_id, amount).await
    }

    /// Evict elapsed cooldown entries. Intended for a periodic maintenance
    /// task; correctness does not depend on it running.
    pub async fn evict_cooldowns(&self) -> usize {
        self.cooldown.lock().await.cleanup_expired()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    #[tokio::test]
    async fn award_applies_once_per_window() {
        let store = Arc::new(MemoryStore::new());
        let ledger = CurrencyLedger::new(Arc::clone(&store), Duration::from_secs(10));

        assert_eq!(ledger.award_for_message(1).await.unwrap(), Some(1));
        // Second message inside the window earns nothing.
        assert_eq!(ledger.award_for_message(1).await.unwrap(), None);
        assert_eq!(ledger.balance(1).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn grant_adjusts_and_checks_funds() {
        let store = Arc::new(MemoryStore::new());
        let ledger = CurrencyLedger::new(store, Duration::from_secs(10));

        assert_eq!(ledger.grant(1, 500).await.unwrap(), 500);
        assert!(ledger.grant(1, -600).await.is_err());
        assert_eq!(ledger.balance(1).await.unwrap(), 500);
    }
}
