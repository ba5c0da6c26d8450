//! War tracker and resolver.
//!
//! Per-guild state machine: NONE → ACTIVE → RESOLVED. A resolved war row is
//! terminal; resolving re-enters NONE for the guild, permitting a new
//! declaration. Resolution destroys the losing faction through the
//! lifecycle manager.

use crate::faction::Faction;
use crate::lifecycle::FactionLifecycle;
use crate::locks::{EntityLocks, LockKey};
use crate::policy::{Action, Actor, authorize};
use crate::provision::Provisioner;
use crate::store::FactionStore;
use crate::war::{NewWar, War, WarOutcome, WarReport, WarSide};
use condotta_error::{CommandError, CommandErrorKind, CondottaError, CondottaResult};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Starts, scores, and resolves inter-faction wars.
pub struct WarTracker<S, P> {
    store: Arc<S>,
    provisioner: Arc<P>,
    locks: Arc<EntityLocks>,
    lifecycle: Arc<FactionLifecycle<S, P>>,
}

impl<S: FactionStore, P: Provisioner> WarTracker<S, P> {
    /// Create a war tracker that destroys losers through `lifecycle`.
    pub fn new(
        store: Arc<S>,
        provisioner: Arc<P>,
        locks: Arc<EntityLocks>,
        lifecycle: Arc<FactionLifecycle<S, P>>,
    ) -> Self {
        Self {
            store,
            provisioner,
            locks,
            lifecycle,
        }
    }

    /// Declare war on `defender_name` on behalf of the actor's faction.
    #[instrument(skip(self))]
    pub async fn start(
        &self,
        guild_id: i64,
        actor: Actor,
        defender_name: &str,
    ) -> CondottaResult<(War, Faction, Faction)> {
        let _guard = self.locks.acquire(LockKey::Guild(guild_id)).await;

        if self.store.active_war(guild_id).await?.is_some() {
            return Err(CommandError::new(CommandErrorKind::WarAlreadyActive).into());
        }

        let membership = self
            .store
            .membership(actor.user_id, guild_id)
            .await?
            .ok_or_else(|| CondottaError::from(CommandError::new(CommandErrorKind::NotInFaction)))?;
        if !authorize(Some(membership.rank), actor.admin, Action::StartWar) {
            return Err(CommandError::new(CommandErrorKind::NotAuthorized).into());
        }

        let attacker = self
            .store
            .faction_by_id(membership.faction_id)
            .await?
            .filter(|f| !f.destroyed)
            .ok_or_else(|| {
                CondottaError::from(CommandError::new(CommandErrorKind::ConsistencyViolation(
                    format!("membership points at missing faction {}", membership.faction_id),
                )))
            })?;
        let defender = self
            .store
            .faction_by_name(guild_id, defender_name)
            .await?
            .ok_or_else(|| {
                CondottaError::from(CommandError::new(CommandErrorKind::NotFound(
                    defender_name.to_string(),
                )))
            })?;
        if defender.id == attacker.id {
            return Err(CommandError::new(CommandErrorKind::SelfWar).into());
        }

        let war = self
            .store
            .insert_war(NewWar {
                guild_id,
                attacker_faction_id: attacker.id,
                defender_faction_id: defender.id,
            })
            .await?;

        info!(
            war_id = war.id,
            guild_id,
            attacker = %attacker.name,
            defender = %defender.name,
            "War declared"
        );
        self.publish(
            guild_id,
            &format!(
                "War declared!\nAttacker: **{}**\nDefender: **{}**\nUpdates will be posted here.",
                attacker.name, defender.name
            ),
        )
        .await;

        Ok((war, attacker, defender))
    }

    /// Count one qualifying message toward the sender's side.
    ///
    /// Silent no-op when the sender has no faction, no war is active, or the
    /// sender's faction fights on neither side. Unlike currency awards,
    /// scoring has no cooldown: every qualifying message counts.
    pub async fn score(&self, guild_id: i64, sender: i64) -> CondottaResult<()> {
        let Some(membership) = self.store.membership(sender, guild_id).await? else {
            return Ok(());
        };
        let Some(war) = self.store.active_war(guild_id).await? else {
            return Ok(());
        };
        let Some(side) = war.side_of(membership.faction_id) else {
            return Ok(());
        };

        self.store.record_war_message(war.id, side).await?;
        debug!(war_id = war.id, sender, %side, "Scored war message");
        Ok(())
    }

    /// Read-only report of the active war.
    pub async fn status(&self, guild_id: i64) -> CondottaResult<WarReport> {
        let war = self
            .store
            .active_war(guild_id)
            .await?
            .ok_or_else(|| CondottaError::from(CommandError::new(CommandErrorKind::NoActiveWar)))?;
        let (attacker, defender) = self.participants(&war).await?;
        Ok(WarReport {
            attacker,
            defender,
            attacker_messages: war.attacker_messages,
            defender_messages: war.defender_messages,
        })
    }

    /// Resolve the active war (administrator only).
    ///
    /// A tie deactivates the war and destroys nothing; otherwise the side
    /// with the strictly greater count wins and the loser is destroyed.
    #[instrument(skip(self))]
    pub async fn end(&self, guild_id: i64, actor: Actor) -> CondottaResult<WarOutcome> {
        if !authorize(None, actor.admin, Action::EndWar) {
            return Err(CommandError::new(CommandErrorKind::NotAuthorized).into());
        }

        let _guard = self.locks.acquire(LockKey::Guild(guild_id)).await;

        let war = self
            .store
            .active_war(guild_id)
            .await?
            .ok_or_else(|| CondottaError::from(CommandError::new(CommandErrorKind::NoActiveWar)))?;
        let (attacker, defender) = self.participants(&war).await?;

        if war.attacker_messages == war.defender_messages {
            self.store.deactivate_war(war.id).await?;
            info!(war_id = war.id, guild_id, messages = war.attacker_messages, "War drawn");
            self.publish(
                guild_id,
                &format!(
                    "The war ends in a draw.\nAttacker **{}**: {} messages\nDefender **{}**: {} messages",
                    attacker.name, war.attacker_messages, defender.name, war.defender_messages
                ),
            )
            .await;
            return Ok(WarOutcome::Draw {
                attacker,
                defender,
                messages: war.attacker_messages,
            });
        }

        let (winner, loser, winner_messages, loser_messages) =
            if war.attacker_messages > war.defender_messages {
                (attacker, defender, war.attacker_messages, war.defender_messages)
            } else {
                (defender, attacker, war.defender_messages, war.attacker_messages)
            };

        let loser = self.lifecycle.destroy(loser.id).await?;
        self.store.deactivate_war(war.id).await?;

        info!(
            war_id = war.id,
            guild_id,
            winner = %winner.name,
            loser = %loser.name,
            "War resolved"
        );
        self.publish(
            guild_id,
            &format!(
                "The war is over!\nWinner: **{}** ({} messages)\nLoser: **{}** ({} messages)\nThe losing faction **{}** has been disbanded.",
                winner.name, winner_messages, loser.name, loser_messages, loser.name
            ),
        )
        .await;

        Ok(WarOutcome::Victory {
            winner,
            loser,
            winner_messages,
            loser_messages,
        })
    }

    async fn participants(&self, war: &War) -> CondottaResult<(Faction, Faction)> {
        let attacker = self
            .store
            .faction_by_id(war.attacker_faction_id)
            .await?
            .ok_or_else(|| {
                CondottaError::from(CommandError::new(CommandErrorKind::ConsistencyViolation(
                    format!("war {} references missing attacker", war.id),
                )))
            })?;
        let defender = self
            .store
            .faction_by_id(war.defender_faction_id)
            .await?
            .ok_or_else(|| {
                CondottaError::from(CommandError::new(CommandErrorKind::ConsistencyViolation(
                    format!("war {} references missing defender", war.id),
                )))
            })?;
        Ok((attacker, defender))
    }

    /// Post to the guild's war-status channel, if one is configured. Notice
    /// delivery never fails the underlying operation.
    async fn publish(&self, guild_id: i64, content: &str) {
        match self.store.war_status_channel(guild_id).await {
            Ok(Some(channel_id)) => {
                if let Err(err) = self.provisioner.post_message(channel_id, content).await {
                    warn!(guild_id, channel_id, error = %err, "War notice delivery failed");
                }
            }
            Ok(None) => {}
            Err(err) => warn!(guild_id, error = %err, "Failed to load war-status channel"),
        }
    }
}
