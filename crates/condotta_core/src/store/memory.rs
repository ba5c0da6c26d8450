//! In-memory store backend.
//!
//! Backs local development and the engine test suite. Data lives for the
//! process only; the diesel-backed repository in `condotta_store` is the
//! durable implementation.

use super::FactionStore;
use crate::faction::{Faction, Membership, NewFaction, Rank};
use crate::war::{NewWar, War, WarSide};
use async_trait::async_trait;
use condotta_error::{CommandError, CommandErrorKind, CondottaResult};
use std::collections::{BTreeMap, HashMap};
use tokio::sync::Mutex;

#[derive(Debug, Default)]
struct MemoryInner {
    accounts: HashMap<i64, i64>,
    factions: BTreeMap<i32, Faction>,
    // (user_id, faction_id) -> rank
    members: HashMap<(i64, i32), Rank>,
    wars: BTreeMap<i32, War>,
    // guild_id -> war status channel
    settings: HashMap<i64, Option<i64>>,
    next_faction_id: i32,
    next_war_id: i32,
}

/// Process-local [`FactionStore`] over tokio-mutexed maps.
///
/// Each trait method takes the single inner lock for its whole duration,
/// which gives the per-key atomicity the store contract requires.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<MemoryInner>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl FactionStore for MemoryStore {
    async fn get_or_create_account(&self, user_id: i64) -> CondottaResult<i64> {
        let mut inner = self.inner.lock().await;
        Ok(*inner.accounts.entry(user_id).or_insert(0))
    }

    async fn adjust_balance(&self, user_id: i64, delta: i64) -> CondottaResult<i64> {
        let mut inner = self.inner.lock().await;
        let balance = inner.accounts.entry(user_id).or_insert(0);
        let updated = *balance + delta;
        if updated < 0 {
            return Err(CommandError::new(CommandErrorKind::InsufficientFunds {
                needed: -delta,
                balance: *balance,
            })
            .into());
        }
        *balance = updated;
        Ok(updated)
    }

    async fn insert_faction(&self, faction: NewFaction) -> CondottaResult<Faction> {
        let mut inner = self.inner.lock().await;
        inner.next_faction_id += 1;
        let id = inner.next_faction_id;
        let row = Faction {
            id,
            guild_id: faction.guild_id,
            name: faction.name,
            leader_id: faction.leader_id,
            roles: faction.roles,
            container_id: faction.container_id,
            channels: faction.channels,
            destroyed: false,
            is_open: false,
        };
        inner.factions.insert(id, row.clone());
        Ok(row)
    }

    async fn faction_by_id(&self, id: i32) -> CondottaResult<Option<Faction>> {
        let inner = self.inner.lock().await;
        Ok(inner.factions.get(&id).cloned())
    }

    async fn faction_by_name(&self, guild_id: i64, name: &str) -> CondottaResult<Option<Faction>> {
        let inner = self.inner.lock().await;
        Ok(inner
            .factions
            .values()
            .find(|f| f.guild_id == guild_id && f.name == name && !f.destroyed)
            .cloned())
    }

    async fn faction_by_panel_channel(&self, channel_id: i64) -> CondottaResult<Option<Faction>> {
        let inner = self.inner.lock().await;
        Ok(inner
            .factions
            .values()
            .find(|f| f.channels.control_panel == channel_id && !f.destroyed)
            .cloned())
    }

    async fn mark_faction_destroyed(&self, id: i32) -> CondottaResult<()> {
        let mut inner = self.inner.lock().await;
        if let Some(faction) = inner.factions.get_mut(&id) {
            faction.destroyed = true;
        }
        Ok(())
    }

    async fn set_faction_open(&self, id: i32, open: bool) -> CondottaResult<()> {
        let mut inner = self.inner.lock().await;
        if let Some(faction) = inner.factions.get_mut(&id) {
            faction.is_open = open;
        }
        Ok(())
    }

    async fn upsert_membership(
        &self,
        user_id: i64,
        faction_id: i32,
        rank: Rank,
    ) -> CondottaResult<()> {
        let mut inner = self.inner.lock().await;
        inner.members.insert((user_id, faction_id), rank);
        Ok(())
    }

    async fn delete_membership(&self, user_id: i64, faction_id: i32) -> CondottaResult<()> {
        let mut inner = self.inner.lock().await;
        inner.members.remove(&(user_id, faction_id));
        Ok(())
    }

    async fn delete_faction_memberships(&self, faction_id: i32) -> CondottaResult<()> {
        let mut inner = self.inner.lock().await;
        inner.members.retain(|(_, fid), _| *fid != faction_id);
        Ok(())
    }

    async fn membership(&self, user_id: i64, guild_id: i64) -> CondottaResult<Option<Membership>> {
        let inner = self.inner.lock().await;
        for ((uid, fid), rank) in &inner.members {
            if *uid != user_id {
                continue;
            }
            if let Some(faction) = inner.factions.get(fid)
                && faction.guild_id == guild_id
                && !faction.destroyed
            {
                return Ok(Some(Membership {
                    user_id,
                    faction_id: *fid,
                    rank: *rank,
                }));
            }
        }
        Ok(None)
    }

    async fn member_count(&self, faction_id: i32) -> CondottaResult<i64> {
        let inner = self.inner.lock().await;
        Ok(inner
            .members
            .keys()
            .filter(|(_, fid)| *fid == faction_id)
            .count() as i64)
    }

    async fn insert_war(&self, war: NewWar) -> CondottaResult<War> {
        let mut inner = self.inner.lock().await;
        inner.next_war_id += 1;
        let id = inner.next_war_id;
        let row = War {
            id,
            guild_id: war.guild_id,
            attacker_faction_id: war.attacker_faction_id,
            defender_faction_id: war.defender_faction_id,
            active: true,
            attacker_messages: 0,
            defender_messages: 0,
        };
        inner.wars.insert(id, row);
        Ok(row)
    }

    async fn active_war(&self, guild_id: i64) -> CondottaResult<Option<War>> {
        let inner = self.inner.lock().await;
        Ok(inner
            .wars
            .values()
            .find(|w| w.guild_id == guild_id && w.active)
            .copied())
    }

    async fn record_war_message(&self, war_id: i32, side: WarSide) -> CondottaResult<()> {
        let mut inner = self.inner.lock().await;
        if let Some(war) = inner.wars.get_mut(&war_id)
            && war.active
        {
            match side {
                WarSide::Attacker => war.attacker_messages += 1,
                WarSide::Defender => war.defender_messages += 1,
            }
        }
        Ok(())
    }

    async fn deactivate_war(&self, war_id: i32) -> CondottaResult<()> {
        let mut inner = self.inner.lock().await;
        if let Some(war) = inner.wars.get_mut(&war_id) {
            war.active = false;
        }
        Ok(())
    }

    async fn war_status_channel(&self, guild_id: i64) -> CondottaResult<Option<i64>> {
        let inner = self.inner.lock().await;
        Ok(inner.settings.get(&guild_id).copied().flatten())
    }

    async fn set_war_status_channel(&self, guild_id: i64, channel_id: i64) -> CondottaResult<()> {
        let mut inner = self.inner.lock().await;
        inner.settings.insert(guild_id, Some(channel_id));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::faction::{ChannelSet, RoleSet};
    use condotta_error::CondottaErrorKind;

    fn new_faction(guild_id: i64, name: &str, leader_id: i64) -> NewFaction {
        NewFaction {
            guild_id,
            name: name.to_string(),
            leader_id,
            roles: RoleSet {
                base: 1,
                leader: 2,
                officer: 3,
            },
            container_id: 4,
            channels: ChannelSet {
                forum: 5,
                chat: 6,
                voice: 7,
                voice_text: 8,
                control_panel: 9,
            },
        }
    }

    #[tokio::test]
    async fn account_is_created_lazily_with_zero_balance() {
        let store = MemoryStore::new();
        assert_eq!(store.get_or_create_account(7).await.unwrap(), 0);
        assert_eq!(store.adjust_balance(7, 5).await.unwrap(), 5);
        assert_eq!(store.get_or_create_account(7).await.unwrap(), 5);
    }

    #[tokio::test]
    async fn overdraw_fails_with_insufficient_funds() {
        let store = MemoryStore::new();
        store.adjust_balance(1, 3).await.unwrap();
        let err = store.adjust_balance(1, -4).await.unwrap_err();
        match err.kind() {
            CondottaErrorKind::Command(cmd) => {
                assert!(matches!(
                    cmd.kind,
                    CommandErrorKind::InsufficientFunds {
                        needed: 4,
                        balance: 3
                    }
                ));
            }
            other => panic!("unexpected error kind: {other:?}"),
        }
        // Balance untouched by the failed spend.
        assert_eq!(store.get_or_create_account(1).await.unwrap(), 3);
    }

    #[tokio::test]
    async fn faction_lookup_ignores_destroyed_rows() {
        let store = MemoryStore::new();
        let faction = store.insert_faction(new_faction(10, "Red", 100)).await.unwrap();
        assert!(store.faction_by_name(10, "Red").await.unwrap().is_some());
        assert!(store.faction_by_panel_channel(9).await.unwrap().is_some());

        store.mark_faction_destroyed(faction.id).await.unwrap();
        assert!(store.faction_by_name(10, "Red").await.unwrap().is_none());
        assert!(store.faction_by_panel_channel(9).await.unwrap().is_none());
        // The row itself is retained.
        let row = store.faction_by_id(faction.id).await.unwrap().unwrap();
        assert!(row.destroyed);

        // Second destroy is a no-op success.
        store.mark_faction_destroyed(faction.id).await.unwrap();
    }

    #[tokio::test]
    async fn membership_ignores_destroyed_factions() {
        let store = MemoryStore::new();
        let faction = store.insert_faction(new_faction(10, "Red", 100)).await.unwrap();
        store
            .upsert_membership(100, faction.id, Rank::Leader)
            .await
            .unwrap();
        assert!(store.membership(100, 10).await.unwrap().is_some());
        // Wrong guild sees nothing.
        assert!(store.membership(100, 11).await.unwrap().is_none());

        store.mark_faction_destroyed(faction.id).await.unwrap();
        assert!(store.membership(100, 10).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn war_scoring_only_counts_while_active() {
        let store = MemoryStore::new();
        let war = store
            .insert_war(NewWar {
                guild_id: 10,
                attacker_faction_id: 1,
                defender_faction_id: 2,
            })
            .await
            .unwrap();
        store.record_war_message(war.id, WarSide::Attacker).await.unwrap();
        store.deactivate_war(war.id).await.unwrap();
        store.record_war_message(war.id, WarSide::Attacker).await.unwrap();

        assert!(store.active_war(10).await.unwrap().is_none());
        // The increment after deactivation was dropped.
        let inner = store.inner.lock().await;
        assert_eq!(inner.wars[&war.id].attacker_messages, 1);
    }
}
