//! Membership and rank synchronizer.
//!
//! Every mutation applies the external rank grant/revoke first and commits
//! the durable row only afterwards: a failed external call leaves the
//! membership table untouched, so a row never exists without matching
//! external visibility.

use crate::faction::{Faction, FactionInfo, Rank};
use crate::locks::{EntityLocks, LockKey};
use crate::policy::{Action, Actor, authorize};
use crate::provision::Provisioner;
use crate::store::FactionStore;
use condotta_error::{CommandError, CommandErrorKind, CondottaError, CondottaResult};
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// Keeps membership records and externally visible rank in lockstep.
pub struct MembershipSync<S, P> {
    store: Arc<S>,
    provisioner: Arc<P>,
    locks: Arc<EntityLocks>,
}

impl<S: FactionStore, P: Provisioner> MembershipSync<S, P> {
    /// Create a membership synchronizer.
    pub fn new(store: Arc<S>, provisioner: Arc<P>, locks: Arc<EntityLocks>) -> Self {
        Self {
            store,
            provisioner,
            locks,
        }
    }

    /// The actor's faction and rank, or `NotInFaction`.
    async fn actor_faction(&self, guild_id: i64, actor: Actor) -> CondottaResult<(Faction, Rank)> {
        let membership = self
            .store
            .membership(actor.user_id, guild_id)
            .await?
            .ok_or_else(|| CondottaError::from(CommandError::new(CommandErrorKind::NotInFaction)))?;
        let faction = self
            .store
            .faction_by_id(membership.faction_id)
            .await?
            .filter(|f| !f.destroyed)
            .ok_or_else(|| {
                CondottaError::from(CommandError::new(CommandErrorKind::ConsistencyViolation(
                    format!("membership points at missing faction {}", membership.faction_id),
                )))
            })?;
        Ok((faction, membership.rank))
    }

    /// Invite `target` into the actor's faction.
    ///
    /// Guild-keyed: protects the one-membership-per-user invariant, which
    /// spans factions.
    #[instrument(skip(self))]
    pub async fn invite(&self, guild_id: i64, actor: Actor, target: i64) -> CondottaResult<Faction> {
        let _guard = self.locks.acquire(LockKey::Guild(guild_id)).await;

        let (faction, rank) = self.actor_faction(guild_id, actor).await?;
        if !authorize(Some(rank), actor.admin, Action::Invite) {
            return Err(CommandError::new(CommandErrorKind::NotAuthorized).into());
        }
        if self.store.membership(target, guild_id).await?.is_some() {
            return Err(CommandError::new(CommandErrorKind::TargetAlreadyInFaction).into());
        }

        self.provisioner
            .grant_role(guild_id, target, faction.roles.base)
            .await?;
        self.store
            .upsert_membership(target, faction.id, Rank::Member)
            .await?;

        info!(guild_id, target, faction_id = faction.id, "Invited member");
        Ok(faction)
    }

    /// Self-serve join of an open faction by name.
    #[instrument(skip(self))]
    pub async fn join(&self, guild_id: i64, user_id: i64, name: &str) -> CondottaResult<Faction> {
        let _guard = self.locks.acquire(LockKey::Guild(guild_id)).await;

        if self.store.membership(user_id, guild_id).await?.is_some() {
            return Err(CommandError::new(CommandErrorKind::AlreadyInFaction).into());
        }
        let faction = self
            .store
            .faction_by_name(guild_id, name)
            .await?
            .ok_or_else(|| {
                CondottaError::from(CommandError::new(CommandErrorKind::NotFound(name.to_string())))
            })?;
        if !faction.is_open {
            return Err(CommandError::new(CommandErrorKind::FactionClosed).into());
        }

        self.provisioner
            .grant_role(guild_id, user_id, faction.roles.base)
            .await?;
        self.store
            .upsert_membership(user_id, faction.id, Rank::Member)
            .await?;

        info!(guild_id, user_id, faction_id = faction.id, "Member joined");
        Ok(faction)
    }

    /// Kick `target` from the actor's faction. The leader cannot be kicked.
    #[instrument(skip(self))]
    pub async fn kick(&self, guild_id: i64, actor: Actor, target: i64) -> CondottaResult<Faction> {
        let (faction, rank) = self.actor_faction(guild_id, actor).await?;
        if !authorize(Some(rank), actor.admin, Action::Kick) {
            return Err(CommandError::new(CommandErrorKind::NotAuthorized).into());
        }

        let _guard = self.locks.acquire(LockKey::Faction(faction.id)).await;

        let target_membership = self
            .store
            .membership(target, guild_id)
            .await?
            .filter(|m| m.faction_id == faction.id)
            .ok_or_else(|| {
                CondottaError::from(CommandError::new(CommandErrorKind::TargetNotInFaction))
            })?;
        if target == faction.leader_id {
            return Err(CommandError::new(CommandErrorKind::CannotKickLeader).into());
        }

        self.remove_external_ranks(&faction, target, target_membership.rank)
            .await?;
        self.store.delete_membership(target, faction.id).await?;

        info!(guild_id, target, faction_id = faction.id, "Kicked member");
        Ok(faction)
    }

    /// Promote a member of the actor's faction to officer.
    #[instrument(skip(self))]
    pub async fn promote(&self, guild_id: i64, actor: Actor, target: i64) -> CondottaResult<Faction> {
        let (faction, rank) = self.actor_faction(guild_id, actor).await?;
        if !authorize(Some(rank), actor.admin, Action::Promote) {
            return Err(CommandError::new(CommandErrorKind::NotAuthorized).into());
        }

        let _guard = self.locks.acquire(LockKey::Faction(faction.id)).await;

        let target_membership = self
            .store
            .membership(target, guild_id)
            .await?
            .filter(|m| m.faction_id == faction.id)
            .ok_or_else(|| {
                CondottaError::from(CommandError::new(CommandErrorKind::TargetNotInFaction))
            })?;
        // The leader's rank is fixed for the faction's lifetime.
        if target_membership.rank == Rank::Leader {
            return Err(CommandError::new(CommandErrorKind::NotAuthorized).into());
        }

        self.provisioner
            .grant_role(guild_id, target, faction.roles.officer)
            .await?;
        self.store
            .upsert_membership(target, faction.id, Rank::Officer)
            .await?;

        info!(guild_id, target, faction_id = faction.id, "Promoted to officer");
        Ok(faction)
    }

    /// Demote an officer of the actor's faction back to member.
    #[instrument(skip(self))]
    pub async fn demote(&self, guild_id: i64, actor: Actor, target: i64) -> CondottaResult<Faction> {
        let (faction, rank) = self.actor_faction(guild_id, actor).await?;
        if !authorize(Some(rank), actor.admin, Action::Demote) {
            return Err(CommandError::new(CommandErrorKind::NotAuthorized).into());
        }

        let _guard = self.locks.acquire(LockKey::Faction(faction.id)).await;

        let target_membership = self
            .store
            .membership(target, guild_id)
            .await?
            .filter(|m| m.faction_id == faction.id)
            .ok_or_else(|| {
                CondottaError::from(CommandError::new(CommandErrorKind::TargetNotInFaction))
            })?;
        if target_membership.rank == Rank::Leader {
            return Err(CommandError::new(CommandErrorKind::NotAuthorized).into());
        }

        self.provisioner
            .revoke_role(guild_id, target, faction.roles.officer)
            .await?;
        self.store
            .upsert_membership(target, faction.id, Rank::Member)
            .await?;

        info!(guild_id, target, faction_id = faction.id, "Demoted to member");
        Ok(faction)
    }

    /// Leave one's faction. The leader must disband instead.
    #[instrument(skip(self))]
    pub async fn leave(&self, guild_id: i64, user_id: i64) -> CondottaResult<Faction> {
        let (faction, rank) = self
            .actor_faction(guild_id, Actor::user(user_id))
            .await?;

        let _guard = self.locks.acquire(LockKey::Faction(faction.id)).await;

        if user_id == faction.leader_id {
            return Err(CommandError::new(CommandErrorKind::LeaderCannotLeave).into());
        }

        self.remove_external_ranks(&faction, user_id, rank).await?;
        self.store.delete_membership(user_id, faction.id).await?;

        info!(guild_id, user_id, faction_id = faction.id, "Member left");
        Ok(faction)
    }

    /// Toggle the faction's open/closed join mode, returning the faction and
    /// the new mode.
    #[instrument(skip(self))]
    pub async fn toggle_open(&self, guild_id: i64, actor: Actor) -> CondottaResult<(Faction, bool)> {
        let (faction, rank) = self.actor_faction(guild_id, actor).await?;
        if !authorize(Some(rank), actor.admin, Action::ToggleOpen) {
            return Err(CommandError::new(CommandErrorKind::NotAuthorized).into());
        }

        let _guard = self.locks.acquire(LockKey::Faction(faction.id)).await;

        // Re-read under the lock; a concurrent toggle may have flipped it.
        let current = self
            .store
            .faction_by_id(faction.id)
            .await?
            .filter(|f| !f.destroyed)
            .ok_or_else(|| {
                CondottaError::from(CommandError::new(CommandErrorKind::NotFound(faction.name)))
            })?;
        let open = !current.is_open;
        self.store.set_faction_open(current.id, open).await?;

        info!(guild_id, faction_id = current.id, open, "Toggled join mode");
        Ok((current, open))
    }

    /// Summary of the user's faction for info displays.
    pub async fn info(&self, guild_id: i64, user_id: i64) -> CondottaResult<FactionInfo> {
        let (faction, rank) = self.actor_faction(guild_id, Actor::user(user_id)).await?;
        let member_count = self.store.member_count(faction.id).await?;
        Ok(FactionInfo {
            name: faction.name,
            leader_id: faction.leader_id,
            member_count,
            rank: Some(rank),
            is_open: faction.is_open,
        })
    }

    /// Revoke the external roles matching a member's rank. The base role
    /// always goes; the officer role goes with it for officers.
    async fn remove_external_ranks(
        &self,
        faction: &Faction,
        user_id: i64,
        rank: Rank,
    ) -> CondottaResult<()> {
        self.provisioner
            .revoke_role(faction.guild_id, user_id, faction.roles.base)
            .await?;
        if rank == Rank::Officer
            && let Err(err) = self
                .provisioner
                .revoke_role(faction.guild_id, user_id, faction.roles.officer)
                .await
        {
            // Base visibility is already gone; losing the officer badge
            // alone does not justify resurrecting the row.
            warn!(user_id, faction_id = faction.id, error = %err, "Officer role revoke failed");
        }
        Ok(())
    }
}
