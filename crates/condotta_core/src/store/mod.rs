//! Persistent state store seam.
//!
//! The store exclusively owns all durable records. Every method is atomic
//! with respect to concurrent callers on the same key; cross-record
//! consistency is the managers' job, enforced under [`crate::EntityLocks`].

mod memory;

pub use memory::MemoryStore;

use crate::faction::{Faction, Membership, NewFaction, Rank};
use crate::war::{NewWar, War, WarSide};
use async_trait::async_trait;
use condotta_error::CondottaResult;

/// Durable key/value and relational access for balances, factions,
/// memberships, wars, and per-guild settings.
#[async_trait]
pub trait FactionStore: Send + Sync {
    /// Fetch a user's balance, creating the account with balance 0 on first
    /// read.
    async fn get_or_create_account(&self, user_id: i64) -> CondottaResult<i64>;

    /// Apply a balance delta as a single atomic check-and-apply step,
    /// returning the new balance.
    ///
    /// Fails with [`condotta_error::CommandErrorKind::InsufficientFunds`]
    /// when a negative delta would overdraw. Two concurrent spends can never
    /// both pass a stale balance check.
    async fn adjust_balance(&self, user_id: i64, delta: i64) -> CondottaResult<i64>;

    /// Insert a faction row, returning it with its assigned id.
    async fn insert_faction(&self, faction: NewFaction) -> CondottaResult<Faction>;

    /// Fetch a faction by row id, destroyed or not.
    async fn faction_by_id(&self, id: i32) -> CondottaResult<Option<Faction>>;

    /// Fetch a non-destroyed faction by guild and name.
    async fn faction_by_name(&self, guild_id: i64, name: &str) -> CondottaResult<Option<Faction>>;

    /// Fetch the non-destroyed faction whose control panel lives in the
    /// given channel.
    async fn faction_by_panel_channel(&self, channel_id: i64) -> CondottaResult<Option<Faction>>;

    /// Flip the terminal `destroyed` flag. A second call is a no-op success.
    async fn mark_faction_destroyed(&self, id: i32) -> CondottaResult<()>;

    /// Set the faction's open/closed join mode.
    async fn set_faction_open(&self, id: i32, open: bool) -> CondottaResult<()>;

    /// Insert or replace a membership row.
    async fn upsert_membership(
        &self,
        user_id: i64,
        faction_id: i32,
        rank: Rank,
    ) -> CondottaResult<()>;

    /// Delete one membership row.
    async fn delete_membership(&self, user_id: i64, faction_id: i32) -> CondottaResult<()>;

    /// Delete every membership of a faction (destruction cascade).
    async fn delete_faction_memberships(&self, faction_id: i32) -> CondottaResult<()>;

    /// The user's membership in a non-destroyed faction of the guild, if
    /// any.
    async fn membership(&self, user_id: i64, guild_id: i64) -> CondottaResult<Option<Membership>>;

    /// Number of members in a faction.
    async fn member_count(&self, faction_id: i32) -> CondottaResult<i64>;

    /// Insert a war row (active, counters at zero), returning it with its
    /// assigned id.
    async fn insert_war(&self, war: NewWar) -> CondottaResult<War>;

    /// The guild's active war, if any.
    async fn active_war(&self, guild_id: i64) -> CondottaResult<Option<War>>;

    /// Atomically add one qualifying message to the given side, only while
    /// the war is active.
    async fn record_war_message(&self, war_id: i32, side: WarSide) -> CondottaResult<()>;

    /// Deactivate a war. The row is retained.
    async fn deactivate_war(&self, war_id: i32) -> CondottaResult<()>;

    /// The guild's configured war-status channel, if any.
    async fn war_status_channel(&self, guild_id: i64) -> CondottaResult<Option<i64>>;

    /// Set (upsert) the guild's war-status channel.
    async fn set_war_status_channel(&self, guild_id: i64, channel_id: i64) -> CondottaResult<()>;
}
