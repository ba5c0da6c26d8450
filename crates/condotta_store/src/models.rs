//! Diesel row types and conversions to the entity types in `condotta_core`.

use crate::schema::{faction_members, factions, guild_settings, wars};
use condotta_core::{ChannelSet, Faction, Membership, NewFaction, Rank, RoleSet, War};
use condotta_error::{CondottaError, StoreError, StoreErrorKind};
use diesel::prelude::*;

/// A faction row as stored.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = factions)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct FactionRow {
    pub id: i32,
    pub guild_id: i64,
    pub name: String,
    pub leader_id: i64,
    pub base_role_id: i64,
    pub leader_role_id: i64,
    pub officer_role_id: i64,
    pub category_id: i64,
    pub forum_channel_id: i64,
    pub chat_channel_id: i64,
    pub voice_channel_id: i64,
    pub listen_channel_id: i64,
    pub control_panel_channel_id: i64,
    pub destroyed: bool,
    pub is_open: bool,
}

impl From<FactionRow> for Faction {
    fn from(row: FactionRow) -> Self {
        Faction {
            id: row.id,
            guild_id: row.guild_id,
            name: row.name,
            leader_id: row.leader_id,
            roles: RoleSet {
                base: row.base_role_id,
                leader: row.leader_role_id,
                officer: row.officer_role_id,
            },
            container_id: row.category_id,
            channels: ChannelSet {
                forum: row.forum_channel_id,
                chat: row.chat_channel_id,
                voice: row.voice_channel_id,
                voice_text: row.listen_channel_id,
                control_panel: row.control_panel_channel_id,
            },
            destroyed: row.destroyed,
            is_open: row.is_open,
        }
    }
}

/// Insertable faction row. New factions start non-destroyed and closed via
/// column defaults.
#[derive(Debug, Insertable)]
#[diesel(table_name = factions)]
pub struct NewFactionRow {
    pub guild_id: i64,
    pub name: String,
    pub leader_id: i64,
    pub base_role_id: i64,
    pub leader_role_id: i64,
    pub officer_role_id: i64,
    pub category_id: i64,
    pub forum_channel_id: i64,
    pub chat_channel_id: i64,
    pub voice_channel_id: i64,
    pub listen_channel_id: i64,
    pub control_panel_channel_id: i64,
}

impl From<NewFaction> for NewFactionRow {
    fn from(faction: NewFaction) -> Self {
        NewFactionRow {
            guild_id: faction.guild_id,
            name: faction.name,
            leader_id: faction.leader_id,
            base_role_id: faction.roles.base,
            leader_role_id: faction.roles.leader,
            officer_role_id: faction.roles.officer,
            category_id: faction.container_id,
            forum_channel_id: faction.channels.forum,
            chat_channel_id: faction.channels.chat,
            voice_channel_id: faction.channels.voice,
            listen_channel_id: faction.channels.voice_text,
            control_panel_channel_id: faction.channels.control_panel,
        }
    }
}

/// A membership row as stored. Rank is kept as text and parsed on read.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = faction_members)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct MemberRow {
    pub user_id: i64,
    pub faction_id: i32,
    pub rank: String,
}

impl TryFrom<MemberRow> for Membership {
    type Error = CondottaError;

    fn try_from(row: MemberRow) -> Result<Self, Self::Error> {
        let rank: Rank = row.rank.parse().map_err(|_| {
            StoreError::new(StoreErrorKind::Query(format!(
                "unknown rank '{}' for user {} in faction {}",
                row.rank, row.user_id, row.faction_id
            )))
        })?;
        Ok(Membership {
            user_id: row.user_id,
            faction_id: row.faction_id,
            rank,
        })
    }
}

/// Insertable membership row.
#[derive(Debug, Insertable)]
#[diesel(table_name = faction_members)]
pub struct NewMemberRow {
    pub user_id: i64,
    pub faction_id: i32,
    pub rank: String,
}

/// A war row as stored.
#[derive(Debug, Clone, Copy, Queryable, Selectable)]
#[diesel(table_name = wars)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct WarRow {
    pub id: i32,
    pub guild_id: i64,
    pub attacker_faction_id: i32,
    pub defender_faction_id: i32,
    pub active: bool,
    pub attacker_messages: i64,
    pub defender_messages: i64,
}

impl From<WarRow> for War {
    fn from(row: WarRow) -> Self {
        War {
            id: row.id,
            guild_id: row.guild_id,
            attacker_faction_id: row.attacker_faction_id,
            defender_faction_id: row.defender_faction_id,
            active: row.active,
            attacker_messages: row.attacker_messages,
            defender_messages: row.defender_messages,
        }
    }
}

/// Insertable war row. New wars start active with zeroed counters via
/// column defaults.
#[derive(Debug, Insertable)]
#[diesel(table_name = wars)]
pub struct NewWarRow {
    pub guild_id: i64,
    pub attacker_faction_id: i32,
    pub defender_faction_id: i32,
}

/// A guild settings row as stored.
#[derive(Debug, Clone, Copy, Queryable, Selectable, Insertable)]
#[diesel(table_name = guild_settings)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct GuildSettingsRow {
    pub guild_id: i64,
    pub war_status_channel_id: Option<i64>,
}
