//! Faction and membership entities.
//!
//! Every entity is a named struct; wide positional rows never cross a module
//! boundary.

use crate::provision::ResourceId;

/// Rank of a member within a faction.
///
/// Exactly one member per non-destroyed faction holds [`Rank::Leader`], and
/// that member's id equals the faction's `leader_id`.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    strum::Display,
    strum::EnumString,
    strum::IntoStaticStr,
)]
#[strum(serialize_all = "lowercase")]
pub enum Rank {
    /// Faction founder; fixed for the faction's lifetime.
    Leader,
    /// Elevated member, assignable by leader or officers.
    Officer,
    /// Default rank.
    Member,
}

impl Rank {
    /// Whether this rank may manage other members (invite, kick, promote).
    pub fn is_officer_or_above(self) -> bool {
        matches!(self, Rank::Leader | Rank::Officer)
    }
}

/// External role ids provisioned for a faction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoleSet {
    /// Role held by every member.
    pub base: i64,
    /// Role held by the leader.
    pub leader: i64,
    /// Role held by officers.
    pub officer: i64,
}

/// External channel ids provisioned for a faction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelSet {
    /// Forum channel (or its text fallback).
    pub forum: i64,
    /// General chat text channel.
    pub chat: i64,
    /// Voice channel.
    pub voice: i64,
    /// Listen-along text channel for the voice channel.
    pub voice_text: i64,
    /// Control-panel channel, visible to leader and officers only.
    pub control_panel: i64,
}

/// A faction row.
///
/// The row holds only references (ids) to externally provisioned resources,
/// never ownership; the lifecycle manager bridges the two transactionally.
/// `destroyed` is a one-way flag: once set the row is retained historically
/// and never reactivated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Faction {
    /// Serial row id.
    pub id: i32,
    /// Guild this faction belongs to.
    pub guild_id: i64,
    /// Display name, unique per guild among non-destroyed factions.
    pub name: String,
    /// User id of the founding leader.
    pub leader_id: i64,
    /// Provisioned role ids.
    pub roles: RoleSet,
    /// Provisioned container (category) id.
    pub container_id: i64,
    /// Provisioned channel ids.
    pub channels: ChannelSet,
    /// Terminal destruction flag.
    pub destroyed: bool,
    /// Whether self-serve joins are accepted.
    pub is_open: bool,
}

impl Faction {
    /// Every externally provisioned resource referenced by this row, in
    /// deletion order: channels first, then the container, then roles.
    pub fn resource_ids(&self) -> Vec<ResourceId> {
        vec![
            ResourceId::Channel(self.channels.forum),
            ResourceId::Channel(self.channels.chat),
            ResourceId::Channel(self.channels.voice),
            ResourceId::Channel(self.channels.voice_text),
            ResourceId::Channel(self.channels.control_panel),
            ResourceId::Container(self.container_id),
            ResourceId::Role(self.roles.base),
            ResourceId::Role(self.roles.leader),
            ResourceId::Role(self.roles.officer),
        ]
    }
}

/// Fields for inserting a new faction row.
///
/// New factions always start non-destroyed and closed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewFaction {
    /// Guild the faction is created in.
    pub guild_id: i64,
    /// Display name.
    pub name: String,
    /// Founding leader's user id.
    pub leader_id: i64,
    /// Provisioned role ids.
    pub roles: RoleSet,
    /// Provisioned container id.
    pub container_id: i64,
    /// Provisioned channel ids.
    pub channels: ChannelSet,
}

/// A membership row, keyed by `(user_id, faction_id)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Membership {
    /// Member's user id.
    pub user_id: i64,
    /// Faction the membership belongs to.
    pub faction_id: i32,
    /// Rank within the faction.
    pub rank: Rank,
}

/// Read-only faction summary for info displays.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FactionInfo {
    /// Faction name.
    pub name: String,
    /// Leader's user id.
    pub leader_id: i64,
    /// Current member count.
    pub member_count: i64,
    /// The querying user's rank, when they are a member.
    pub rank: Option<Rank>,
    /// Whether self-serve joins are accepted.
    pub is_open: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rank_round_trips_through_strings() {
        for rank in [Rank::Leader, Rank::Officer, Rank::Member] {
            let text = rank.to_string();
            assert_eq!(text.parse::<Rank>().unwrap(), rank);
        }
        assert_eq!(Rank::Leader.to_string(), "leader");
    }

    #[test]
    fn resource_ids_cover_every_provisioned_resource() {
        let faction = Faction {
            id: 1,
            guild_id: 10,
            name: "Red".to_string(),
            leader_id: 100,
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
            destroyed: false,
            is_open: false,
        };
        let ids = faction.resource_ids();
        assert_eq!(ids.len(), 9);
        // Channels precede the container, which precedes the roles.
        assert!(matches!(ids[0], ResourceId::Channel(5)));
        assert!(matches!(ids[5], ResourceId::Container(4)));
        assert!(matches!(ids[8], ResourceId::Role(3)));
    }
}
