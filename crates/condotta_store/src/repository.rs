//! PostgreSQL repository implementing the store contract.

use crate::models::{FactionRow, GuildSettingsRow, MemberRow, NewFactionRow, NewMemberRow, NewWarRow, WarRow};
use crate::schema::{accounts, faction_members, factions, guild_settings, wars};
use async_trait::async_trait;
use condotta_core::{Faction, FactionStore, Membership, NewFaction, NewWar, Rank, War, WarSide};
use condotta_error::{CommandError, CommandErrorKind, CondottaResult, StoreError};
use diesel::pg::PgConnection;
use diesel::prelude::*;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::instrument;

/// PostgreSQL [`FactionStore`].
///
/// The connection is wrapped in `Arc<Mutex>` for async access; every trait
/// method holds the lock for its whole duration, which gives the per-call
/// atomicity the store contract requires.
pub struct FactionRepository {
    conn: Arc<Mutex<PgConnection>>,
}

impl FactionRepository {
    /// Create a repository owning the connection.
    pub fn new(conn: PgConnection) -> Self {
        Self {
            conn: Arc::new(Mutex::new(conn)),
        }
    }

    /// Create a repository over a shared connection.
    pub fn from_arc(conn: Arc<Mutex<PgConnection>>) -> Self {
        Self { conn }
    }
}

#[async_trait]
impl FactionStore for FactionRepository {
    #[instrument(skip(self))]
    async fn get_or_create_account(&self, user_id: i64) -> CondottaResult<i64> {
        let mut conn = self.conn.lock().await;

        diesel::insert_into(accounts::table)
            .values((accounts::user_id.eq(user_id), accounts::balance.eq(0)))
            .on_conflict(accounts::user_id)
            .do_nothing()
            .execute(&mut *conn)
            .map_err(StoreError::from)?;

        accounts::table
            .find(user_id)
            .select(accounts::balance)
            .first(&mut *conn)
            .map_err(StoreError::from)
            .map_err(Into::into)
    }

    /// Single guarded UPDATE: the balance never goes negative, even with
    /// concurrent spends against the same account.
    #[instrument(skip(self))]
    async fn adjust_balance(&self, user_id: i64, delta: i64) -> CondottaResult<i64> {
        let mut conn = self.conn.lock().await;

        diesel::insert_into(accounts::table)
            .values((accounts::user_id.eq(user_id), accounts::balance.eq(0)))
            .on_conflict(accounts::user_id)
            .do_nothing()
            .execute(&mut *conn)
            .map_err(StoreError::from)?;

        let updated = diesel::update(
            accounts::table
                .find(user_id)
                .filter(accounts::balance.ge(-delta)),
        )
        .set(accounts::balance.eq(accounts::balance + delta))
        .returning(accounts::balance)
        .get_result::<i64>(&mut *conn)
        .optional()
        .map_err(StoreError::from)?;

        match updated {
            Some(balance) => Ok(balance),
            None => {
                let balance = accounts::table
                    .find(user_id)
                    .select(accounts::balance)
                    .first(&mut *conn)
                    .map_err(StoreError::from)?;
                Err(CommandError::new(CommandErrorKind::InsufficientFunds {
                    needed: -delta,
                    balance,
                })
                .into())
            }
        }
    }

    #[instrument(skip(self, faction), fields(guild_id = faction.guild_id, name = %faction.name))]
    async fn insert_faction(&self, faction: NewFaction) -> CondottaResult<Faction> {
        let mut conn = self.conn.lock().await;

        diesel::insert_into(factions::table)
            .values(NewFactionRow::from(faction))
            .returning(FactionRow::as_returning())
            .get_result(&mut *conn)
            .map(Faction::from)
            .map_err(StoreError::from)
            .map_err(Into::into)
    }

    async fn faction_by_id(&self, id: i32) -> CondottaResult<Option<Faction>> {
        let mut conn = self.conn.lock().await;

        factions::table
            .find(id)
            .select(FactionRow::as_select())
            .first(&mut *conn)
            .optional()
            .map(|row| row.map(Faction::from))
            .map_err(StoreError::from)
            .map_err(Into::into)
    }

    async fn faction_by_name(&self, guild_id: i64, name: &str) -> CondottaResult<Option<Faction>> {
        let mut conn = self.conn.lock().await;

        factions::table
            .filter(factions::guild_id.eq(guild_id))
            .filter(factions::name.eq(name))
            .filter(factions::destroyed.eq(false))
            .select(FactionRow::as_select())
            .first(&mut *conn)
            .optional()
            .map(|row| row.map(Faction::from))
            .map_err(StoreError::from)
            .map_err(Into::into)
    }

    async fn faction_by_panel_channel(&self, channel_id: i64) -> CondottaResult<Option<Faction>> {
        let mut conn = self.conn.lock().await;

        factions::table
            .filter(factions::control_panel_channel_id.eq(channel_id))
            .filter(factions::destroyed.eq(false))
            .select(FactionRow::as_select())
            .first(&mut *conn)
            .optional()
            .map(|row| row.map(Faction::from))
            .map_err(StoreError::from)
            .map_err(Into::into)
    }

    #[instrument(skip(self))]
    async fn mark_faction_destroyed(&self, id: i32) -> CondottaResult<()> {
        let mut conn = self.conn.lock().await;

        diesel::update(factions::table.find(id))
            .set(factions::destroyed.eq(true))
            .execute(&mut *conn)
            .map_err(StoreError::from)?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn set_faction_open(&self, id: i32, open: bool) -> CondottaResult<()> {
        let mut conn = self.conn.lock().await;

        diesel::update(factions::table.find(id))
            .set(factions::is_open.eq(open))
            .execute(&mut *conn)
            .map_err(StoreError::from)?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn upsert_membership(
        &self,
        user_id: i64,
        faction_id: i32,
        rank: Rank,
    ) -> CondottaResult<()> {
        let mut conn = self.conn.lock().await;

        let row = NewMemberRow {
            user_id,
            faction_id,
            rank: rank.to_string(),
        };
        diesel::insert_into(faction_members::table)
            .values(&row)
            .on_conflict((faction_members::user_id, faction_members::faction_id))
            .do_update()
            .set(faction_members::rank.eq(&row.rank))
            .execute(&mut *conn)
            .map_err(StoreError::from)?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn delete_membership(&self, user_id: i64, faction_id: i32) -> CondottaResult<()> {
        let mut conn = self.conn.lock().await;

        diesel::delete(
            faction_members::table
                .filter(faction_members::user_id.eq(user_id))
                .filter(faction_members::faction_id.eq(faction_id)),
        )
        .execute(&mut *conn)
        .map_err(StoreError::from)?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn delete_faction_memberships(&self, faction_id: i32) -> CondottaResult<()> {
        let mut conn = self.conn.lock().await;

        diesel::delete(faction_members::table.filter(faction_members::faction_id.eq(faction_id)))
            .execute(&mut *conn)
            .map_err(StoreError::from)?;
        Ok(())
    }

    async fn membership(&self, user_id: i64, guild_id: i64) -> CondottaResult<Option<Membership>> {
        let mut conn = self.conn.lock().await;

        let row = faction_members::table
            .inner_join(factions::table)
            .filter(faction_members::user_id.eq(user_id))
            .filter(factions::guild_id.eq(guild_id))
            .filter(factions::destroyed.eq(false))
            .select(MemberRow::as_select())
            .first::<MemberRow>(&mut *conn)
            .optional()
            .map_err(StoreError::from)?;
        row.map(Membership::try_from).transpose()
    }

    async fn member_count(&self, faction_id: i32) -> CondottaResult<i64> {
        let mut conn = self.conn.lock().await;

        faction_members::table
            .filter(faction_members::faction_id.eq(faction_id))
            .count()
            .get_result(&mut *conn)
            .map_err(StoreError::from)
            .map_err(Into::into)
    }

    #[instrument(skip(self))]
    async fn insert_war(&self, war: NewWar) -> CondottaResult<War> {
        let mut conn = self.conn.lock().await;

        diesel::insert_into(wars::table)
            .values(NewWarRow {
                guild_id: war.guild_id,
                attacker_faction_id: war.attacker_faction_id,
                defender_faction_id: war.defender_faction_id,
            })
            .returning(WarRow::as_returning())
            .get_result(&mut *conn)
            .map(War::from)
            .map_err(StoreError::from)
            .map_err(Into::into)
    }

    async fn active_war(&self, guild_id: i64) -> CondottaResult<Option<War>> {
        let mut conn = self.conn.lock().await;

        wars::table
            .filter(wars::guild_id.eq(guild_id))
            .filter(wars::active.eq(true))
            .select(WarRow::as_select())
            .first(&mut *conn)
            .optional()
            .map(|row| row.map(War::from))
            .map_err(StoreError::from)
            .map_err(Into::into)
    }

    /// Atomic active-gated increment; a message that races resolution is
    /// silently dropped.
    async fn record_war_message(&self, war_id: i32, side: WarSide) -> CondottaResult<()> {
        let mut conn = self.conn.lock().await;

        let target = wars::table.find(war_id).filter(wars::active.eq(true));
        match side {
            WarSide::Attacker => {
                diesel::update(target)
                    .set(wars::attacker_messages.eq(wars::attacker_messages + 1))
                    .execute(&mut *conn)
                    .map_err(StoreError::from)?;
            }
            WarSide::Defender => {
                diesel::update(target)
                    .set(wars::defender_messages.eq(wars::defender_messages + 1))
                    .execute(&mut *conn)
                    .map_err(StoreError::from)?;
            }
        }
        Ok(())
    }

    #[instrument(skip(self))]
    async fn deactivate_war(&self, war_id: i32) -> CondottaResult<()> {
        let mut conn = self.conn.lock().await;

        diesel::update(wars::table.find(war_id))
            .set(wars::active.eq(false))
            .execute(&mut *conn)
            .map_err(StoreError::from)?;
        Ok(())
    }

    async fn war_status_channel(&self, guild_id: i64) -> CondottaResult<Option<i64>> {
        let mut conn = self.conn.lock().await;

        let channel = guild_settings::table
            .find(guild_id)
            .select(guild_settings::war_status_channel_id)
            .first::<Option<i64>>(&mut *conn)
            .optional()
            .map_err(StoreError::from)?;
        Ok(channel.flatten())
    }

    #[instrument(skip(self))]
    async fn set_war_status_channel(&self, guild_id: i64, channel_id: i64) -> CondottaResult<()> {
        let mut conn = self.conn.lock().await;

        let row = GuildSettingsRow {
            guild_id,
            war_status_channel_id: Some(channel_id),
        };
        diesel::insert_into(guild_settings::table)
            .values(&row)
            .on_conflict(guild_settings::guild_id)
            .do_update()
            .set(guild_settings::war_status_channel_id.eq(row.war_status_channel_id))
            .execute(&mut *conn)
            .map_err(StoreError::from)?;
        Ok(())
    }
}
