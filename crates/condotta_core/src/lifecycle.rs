//! Faction lifecycle manager.
//!
//! Creation runs as a saga: debit funds, provision external resources,
//! commit the durable rows. Any provisioning failure runs compensations in
//! reverse (delete what was created, refund the debit), so the net state of
//! a failed creation is always balance-neutral with no orphaned resources.
//! Destruction is the mirror image: external deletions are best effort,
//! and the durable `destroyed` flag flips regardless.

use crate::faction::{ChannelSet, Faction, NewFaction, Rank, RoleSet};
use crate::locks::{EntityLocks, LockKey};
use crate::policy::{Action, Actor, authorize};
use crate::provision::{
    ChannelKind, ChannelSpec, Provisioner, ResourceId, member_overwrites, panel_overwrites,
};
use crate::store::FactionStore;
use condotta_error::{CommandError, CommandErrorKind, CondottaError, CondottaResult};
use std::sync::Arc;
use tracing::{error, info, instrument, warn};

/// Default faction creation cost in coins.
pub const DEFAULT_CREATE_COST: i64 = 1000;

const MAX_NAME_LEN: usize = 80;

/// Text posted into a fresh control-panel channel.
const PANEL_GREETING: &str = "Manage your faction from here:\n\
    - Faction info\n\
    - Toggle join mode (open/closed)\n\
    - Disband the faction";

/// Creates and destroys factions, orchestrating store and provisioner as
/// one logical operation.
pub struct FactionLifecycle<S, P> {
    store: Arc<S>,
    provisioner: Arc<P>,
    locks: Arc<EntityLocks>,
    create_cost: i64,
}

impl<S: FactionStore, P: Provisioner> FactionLifecycle<S, P> {
    /// Create a lifecycle manager with the default creation cost.
    pub fn new(store: Arc<S>, provisioner: Arc<P>, locks: Arc<EntityLocks>) -> Self {
        Self {
            store,
            provisioner,
            locks,
            create_cost: DEFAULT_CREATE_COST,
        }
    }

    /// Override the creation cost.
    pub fn with_create_cost(mut self, cost: i64) -> Self {
        self.create_cost = cost;
        self
    }

    /// The configured creation cost.
    pub fn create_cost(&self) -> i64 {
        self.create_cost
    }

    /// Create a faction for `requester` in `guild_id`.
    ///
    /// Serialized on the guild key: the duplicate-name and single-membership
    /// checks stay valid until the rows commit.
    #[instrument(skip(self), fields(cost = self.create_cost))]
    pub async fn create(
        &self,
        guild_id: i64,
        requester: i64,
        name: &str,
    ) -> CondottaResult<Faction> {
        let name = name.trim();
        if name.is_empty() || name.len() > MAX_NAME_LEN {
            return Err(CommandError::new(CommandErrorKind::InvalidName(name.to_string())).into());
        }

        let _guard = self.locks.acquire(LockKey::Guild(guild_id)).await;

        if self.store.membership(requester, guild_id).await?.is_some() {
            return Err(CommandError::new(CommandErrorKind::AlreadyInFaction).into());
        }
        if self.store.faction_by_name(guild_id, name).await?.is_some() {
            return Err(CommandError::new(CommandErrorKind::DuplicateName(name.to_string())).into());
        }

        // Debit before any external resource exists; refunded on failure.
        self.store.adjust_balance(requester, -self.create_cost).await?;

        let mut created: Vec<ResourceId> = Vec::new();
        let provisioned = self.provision(guild_id, requester, name, &mut created).await;
        let (roles, container_id, channels) = match provisioned {
            Ok(bundle) => bundle,
            Err(err) => {
                self.compensate(guild_id, requester, &created).await;
                return Err(err);
            }
        };

        let faction = self
            .store
            .insert_faction(NewFaction {
                guild_id,
                name: name.to_string(),
                leader_id: requester,
                roles,
                container_id,
                channels,
            })
            .await?;
        self.store
            .upsert_membership(requester, faction.id, Rank::Leader)
            .await?;

        // The panel message is cosmetic; its failure does not unwind the
        // committed faction.
        if let Err(err) = self
            .provisioner
            .post_message(channels.control_panel, PANEL_GREETING)
            .await
        {
            warn!(faction_id = faction.id, error = %err, "Failed to post control panel message");
        }

        info!(
            faction_id = faction.id,
            guild_id,
            name,
            leader_id = requester,
            "Created faction"
        );
        Ok(faction)
    }

    /// Provision roles, container, and channels in order, recording every
    /// created resource in `created` so the caller can compensate.
    async fn provision(
        &self,
        guild_id: i64,
        requester: i64,
        name: &str,
        created: &mut Vec<ResourceId>,
    ) -> CondottaResult<(RoleSet, i64, ChannelSet)> {
        let base = self
            .provisioner
            .create_role(guild_id, &format!("[Faction] {name}"))
            .await?;
        created.push(ResourceId::Role(base));
        let leader = self
            .provisioner
            .create_role(guild_id, &format!("[Faction] {name} Leader"))
            .await?;
        created.push(ResourceId::Role(leader));
        let officer = self
            .provisioner
            .create_role(guild_id, &format!("[Faction] {name} Officer"))
            .await?;
        created.push(ResourceId::Role(officer));
        let roles = RoleSet {
            base,
            leader,
            officer,
        };

        let container_id = self
            .provisioner
            .create_container(guild_id, &format!("Faction: {name}"))
            .await?;
        created.push(ResourceId::Container(container_id));

        let common = member_overwrites();
        let panel = panel_overwrites();

        let forum = self
            .channel(guild_id, created, ChannelSpec {
                kind: ChannelKind::Forum,
                name: "forum",
                topic: Some(format!("{name} forum")),
                container_id,
                roles: &roles,
                overwrites: &common,
            })
            .await?;
        let chat = self
            .channel(guild_id, created, ChannelSpec {
                kind: ChannelKind::Text,
                name: "chat",
                topic: Some(format!("{name} chat")),
                container_id,
                roles: &roles,
                overwrites: &common,
            })
            .await?;
        let voice = self
            .channel(guild_id, created, ChannelSpec {
                kind: ChannelKind::Voice,
                name: "voice",
                topic: None,
                container_id,
                roles: &roles,
                overwrites: &common,
            })
            .await?;
        let voice_text = self
            .channel(guild_id, created, ChannelSpec {
                kind: ChannelKind::Text,
                name: "voice-text",
                topic: Some(format!("{name} listen-along")),
                container_id,
                roles: &roles,
                overwrites: &common,
            })
            .await?;
        let control_panel = self
            .channel(guild_id, created, ChannelSpec {
                kind: ChannelKind::Text,
                name: "control-panel",
                topic: Some(format!("{name} management")),
                container_id,
                roles: &roles,
                overwrites: &panel,
            })
            .await?;

        // External rank visibility for the founder, before the rows commit.
        self.provisioner.grant_role(guild_id, requester, base).await?;
        self.provisioner.grant_role(guild_id, requester, leader).await?;

        Ok((
            roles,
            container_id,
            ChannelSet {
                forum,
                chat,
                voice,
                voice_text,
                control_panel,
            },
        ))
    }

    async fn channel(
        &self,
        guild_id: i64,
        created: &mut Vec<ResourceId>,
        spec: ChannelSpec<'_>,
    ) -> CondottaResult<i64> {
        let id = self.provisioner.create_channel(guild_id, &spec).await?;
        created.push(ResourceId::Channel(id));
        Ok(id)
    }

    /// Undo a partially provisioned creation: delete in reverse creation
    /// order, then refund the debit. Both halves are best effort.
    async fn compensate(&self, guild_id: i64, requester: i64, created: &[ResourceId]) {
        warn!(
            guild_id,
            partial = created.len(),
            "Provisioning failed; compensating"
        );
        for resource in created.iter().rev() {
            if let Err(err) = self.provisioner.delete_resource(guild_id, *resource).await {
                warn!(?resource, error = %err, "Compensation delete failed");
            }
        }
        if let Err(err) = self.store.adjust_balance(requester, self.create_cost).await {
            error!(requester, error = %err, "Failed to refund creation cost");
        }
    }

    /// Destroy a faction: best-effort external deletion, then flip the
    /// durable flag and cascade memberships.
    ///
    /// Idempotent: an already-destroyed faction is a success no-op. Callers
    /// are told the faction is destroyed once the flag flips, regardless of
    /// whether every external deletion succeeded.
    #[instrument(skip(self))]
    pub async fn destroy(&self, faction_id: i32) -> CondottaResult<Faction> {
        let _guard = self.locks.acquire(LockKey::Faction(faction_id)).await;

        let faction = self
            .store
            .faction_by_id(faction_id)
            .await?
            .ok_or_else(|| {
                CondottaError::from(CommandError::new(CommandErrorKind::NotFound(format!(
                    "faction {faction_id}"
                ))))
            })?;
        if faction.destroyed {
            return Ok(faction);
        }

        for resource in faction.resource_ids() {
            if let Err(err) = self
                .provisioner
                .delete_resource(faction.guild_id, resource)
                .await
            {
                // A missing or already-deleted resource is not an error.
                warn!(faction_id, ?resource, error = %err, "External delete failed; continuing");
            }
        }

        self.store.mark_faction_destroyed(faction_id).await?;
        self.store.delete_faction_memberships(faction_id).await?;

        info!(faction_id, guild_id = faction.guild_id, name = %faction.name, "Destroyed faction");
        Ok(faction)
    }

    /// Authorization gate in front of [`destroy`](Self::destroy).
    ///
    /// Without an explicit faction the actor's own membership resolves the
    /// target. An explicit faction (the control panel is bound to one)
    /// additionally requires the actor to be one of its members or an
    /// administrator.
    #[instrument(skip(self))]
    pub async fn disband(
        &self,
        guild_id: i64,
        actor: Actor,
        explicit_faction: Option<i32>,
    ) -> CondottaResult<Faction> {
        let membership = self.store.membership(actor.user_id, guild_id).await?;

        let faction_id = match explicit_faction {
            None => {
                membership
                    .as_ref()
                    .ok_or_else(|| {
                        CondottaError::from(CommandError::new(CommandErrorKind::NotInFaction))
                    })?
                    .faction_id
            }
            Some(faction_id) => {
                let is_member = membership
                    .as_ref()
                    .is_some_and(|m| m.faction_id == faction_id);
                if !is_member && !actor.admin {
                    return Err(CommandError::new(CommandErrorKind::NotAuthorized).into());
                }
                faction_id
            }
        };

        let faction = self
            .store
            .faction_by_id(faction_id)
            .await?
            .ok_or_else(|| {
                CondottaError::from(CommandError::new(CommandErrorKind::NotFound(format!(
                    "faction {faction_id}"
                ))))
            })?;
        if faction.guild_id != guild_id {
            return Err(CommandError::new(CommandErrorKind::NotFound(faction.name)).into());
        }

        let rank = membership
            .filter(|m| m.faction_id == faction_id)
            .map(|m| m.rank);
        if !authorize(rank, actor.admin, Action::Disband) {
            return Err(CommandError::new(CommandErrorKind::LeaderOnly).into());
        }

        self.destroy(faction_id).await
    }
}
