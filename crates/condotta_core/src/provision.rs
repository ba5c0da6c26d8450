//! Resource provisioner seam.
//!
//! The provisioner owns the externally hosted group constructs (roles, a
//! category container, channels) that faction rows reference by id. Calls are
//! remote, latency-bearing, and individually fallible; the managers decide
//! whether a failure compensates (creation) or is suppressed (destruction).

use crate::faction::RoleSet;
use async_trait::async_trait;
use condotta_error::CondottaResult;

/// Kind of channel to provision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum ChannelKind {
    /// Plain text channel.
    Text,
    /// Voice channel.
    Voice,
    /// Forum channel; implementations fall back to text where the platform
    /// has no forum support.
    Forum,
}

/// A capability grantable on a channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum Capability {
    /// See the channel.
    View,
    /// Send messages.
    Send,
    /// Connect to voice.
    Connect,
    /// Speak in voice.
    Speak,
    /// Manage the channel.
    ManageChannels,
    /// Manage role assignments on the channel.
    ManageRoles,
}

/// The party a permission overwrite applies to.
///
/// Parties are symbolic; the provisioner resolves role parties against the
/// [`RoleSet`] carried by the channel spec.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OverwriteParty {
    /// The guild-wide everyone role.
    Everyone,
    /// The faction's base member role.
    BaseRole,
    /// The faction's leader role.
    LeaderRole,
    /// The faction's officer role.
    OfficerRole,
}

/// A permission overwrite: the listed capabilities are allowed for the
/// party; an empty list denies visibility outright.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Overwrite {
    /// Who the overwrite applies to.
    pub party: OverwriteParty,
    /// Capabilities allowed for the party.
    pub allow: Vec<Capability>,
}

/// An externally provisioned resource, by id.
///
/// Deleting any of these must be idempotent: an already-deleted id is
/// success, not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceId {
    /// A role.
    Role(i64),
    /// A category container.
    Container(i64),
    /// A channel of any kind.
    Channel(i64),
}

/// Everything needed to provision one channel.
#[derive(Debug, Clone)]
pub struct ChannelSpec<'a> {
    /// Channel kind.
    pub kind: ChannelKind,
    /// Channel name.
    pub name: &'a str,
    /// Optional topic.
    pub topic: Option<String>,
    /// Parent container id.
    pub container_id: i64,
    /// Role ids the overwrite parties resolve against.
    pub roles: &'a RoleSet,
    /// Permission overwrites to apply.
    pub overwrites: &'a [Overwrite],
}

/// Seam to the external resource host.
#[async_trait]
pub trait Provisioner: Send + Sync {
    /// Create a role, returning its id.
    async fn create_role(&self, guild_id: i64, name: &str) -> CondottaResult<i64>;

    /// Create a category container, returning its id.
    async fn create_container(&self, guild_id: i64, name: &str) -> CondottaResult<i64>;

    /// Create a channel inside a container, returning its id.
    async fn create_channel(&self, guild_id: i64, spec: &ChannelSpec<'_>) -> CondottaResult<i64>;

    /// Delete a resource. Deleting a non-existent id is success.
    async fn delete_resource(&self, guild_id: i64, resource: ResourceId) -> CondottaResult<()>;

    /// Grant a role to a user (external rank visibility).
    async fn grant_role(&self, guild_id: i64, user_id: i64, role_id: i64) -> CondottaResult<()>;

    /// Revoke a role from a user.
    async fn revoke_role(&self, guild_id: i64, user_id: i64, role_id: i64) -> CondottaResult<()>;

    /// Post a plain message to a channel (war notices, control panel).
    async fn post_message(&self, channel_id: i64, content: &str) -> CondottaResult<()>;
}

/// Overwrites for ordinary faction channels: hidden from everyone, full
/// member access, management rights for leader and officers.
pub fn member_overwrites() -> Vec<Overwrite> {
    use Capability::*;
    vec![
        Overwrite {
            party: OverwriteParty::Everyone,
            allow: vec![],
        },
        Overwrite {
            party: OverwriteParty::BaseRole,
            allow: vec![View, Send, Connect, Speak],
        },
        Overwrite {
            party: OverwriteParty::LeaderRole,
            allow: vec![View, Send, Connect, Speak, ManageChannels, ManageRoles],
        },
        Overwrite {
            party: OverwriteParty::OfficerRole,
            allow: vec![View, Send, Connect, Speak, ManageChannels],
        },
    ]
}

/// Strictly narrower overwrites for the control-panel channel: leader and
/// officers only, no voice capabilities, base members see nothing.
pub fn panel_overwrites() -> Vec<Overwrite> {
    use Capability::*;
    vec![
        Overwrite {
            party: OverwriteParty::Everyone,
            allow: vec![],
        },
        Overwrite {
            party: OverwriteParty::LeaderRole,
            allow: vec![View, Send, ManageChannels, ManageRoles],
        },
        Overwrite {
            party: OverwriteParty::OfficerRole,
            allow: vec![View, Send, ManageChannels],
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn panel_overwrites_are_strictly_narrower() {
        let member = member_overwrites();
        let panel = panel_overwrites();

        // No base-role party at all on the panel.
        assert!(
            panel
                .iter()
                .all(|o| o.party != OverwriteParty::BaseRole)
        );
        // No voice capabilities anywhere on the panel.
        assert!(panel.iter().all(|o| {
            !o.allow.contains(&Capability::Connect) && !o.allow.contains(&Capability::Speak)
        }));
        // Member channels do give base members voice access.
        let base = member
            .iter()
            .find(|o| o.party == OverwriteParty::BaseRole)
            .unwrap();
        assert!(base.allow.contains(&Capability::Connect));
    }
}
