//! Engine wiring for the Discord transport.

use crate::DiscordProvisioner;
use condotta_core::{
    CurrencyLedger, EntityLocks, FactionLifecycle, FactionStore, MembershipSync, WarTracker,
};
use std::sync::Arc;
use std::time::Duration;

/// The assembled engine: one of each manager over a shared store,
/// provisioner, and lock registry.
pub struct Services<S> {
    /// Persistent store.
    pub store: Arc<S>,
    /// Discord resource provisioner.
    pub provisioner: Arc<DiscordProvisioner>,
    /// Faction creation and destruction.
    pub lifecycle: Arc<FactionLifecycle<S, DiscordProvisioner>>,
    /// Membership and rank synchronization.
    pub membership: MembershipSync<S, DiscordProvisioner>,
    /// War declaration, scoring, and resolution.
    pub wars: WarTracker<S, DiscordProvisioner>,
    /// Currency awards and balances.
    pub currency: CurrencyLedger<S>,
}

impl<S: FactionStore> Services<S> {
    /// Wire the engine over a store and provisioner.
    pub fn new(
        store: Arc<S>,
        provisioner: Arc<DiscordProvisioner>,
        create_cost: i64,
        award_cooldown: Duration,
    ) -> Self {
        let locks = Arc::new(EntityLocks::new());
        let lifecycle = Arc::new(
            FactionLifecycle::new(
                Arc::clone(&store),
                Arc::clone(&provisioner),
                Arc::clone(&locks),
            )
            .with_create_cost(create_cost),
        );
        let membership = MembershipSync::new(
            Arc::clone(&store),
            Arc::clone(&provisioner),
            Arc::clone(&locks),
        );
        let wars = WarTracker::new(
            Arc::clone(&store),
            Arc::clone(&provisioner),
            Arc::clone(&locks),
            Arc::clone(&lifecycle),
        );
        let currency = CurrencyLedger::new(Arc::clone(&store), award_cooldown);
        Self {
            store,
            provisioner,
            lifecycle,
            membership,
            wars,
            currency,
        }
    }
}
