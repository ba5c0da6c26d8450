//! Discord implementation of the resource provisioner seam.

use async_trait::async_trait;
use condotta_core::{
    Capability, ChannelKind, ChannelSpec, Overwrite, OverwriteParty, Provisioner, ResourceId,
    RoleSet,
};
use condotta_error::{CondottaResult, ProvisionError, ProvisionErrorKind};
use serenity::all::{
    ChannelId, ChannelType, CreateChannel, CreateMessage, EditRole, GuildId, PermissionOverwrite,
    PermissionOverwriteType, Permissions, RoleId, UserId,
};
use serenity::http::{Http, HttpError};
use std::sync::Arc;
use tracing::{debug, instrument, warn};

/// Provisions faction roles, categories, and channels through the Discord
/// REST API.
pub struct DiscordProvisioner {
    http: Arc<Http>,
}

impl DiscordProvisioner {
    /// Create a provisioner over a shared HTTP client.
    pub fn new(http: Arc<Http>) -> Self {
        Self { http }
    }

    /// The underlying HTTP client, for callers that need raw API access.
    pub fn http(&self) -> &Arc<Http> {
        &self.http
    }

    fn capability_bits(capabilities: &[Capability]) -> Permissions {
        let mut bits = Permissions::empty();
        for capability in capabilities {
            bits |= match capability {
                Capability::View => Permissions::VIEW_CHANNEL,
                Capability::Send => Permissions::SEND_MESSAGES,
                Capability::Connect => Permissions::CONNECT,
                Capability::Speak => Permissions::SPEAK,
                Capability::ManageChannels => Permissions::MANAGE_CHANNELS,
                Capability::ManageRoles => Permissions::MANAGE_ROLES,
            };
        }
        bits
    }

    /// Resolve a symbolic overwrite to a Discord permission overwrite. An
    /// empty allow list denies channel visibility outright.
    fn overwrite(guild_id: i64, roles: &RoleSet, overwrite: &Overwrite) -> PermissionOverwrite {
        // The everyone role shares the guild's id.
        let role_id = match overwrite.party {
            OverwriteParty::Everyone => RoleId::new(guild_id as u64),
            OverwriteParty::BaseRole => RoleId::new(roles.base as u64),
            OverwriteParty::LeaderRole => RoleId::new(roles.leader as u64),
            OverwriteParty::OfficerRole => RoleId::new(roles.officer as u64),
        };
        let allow = Self::capability_bits(&overwrite.allow);
        let deny = if overwrite.allow.is_empty() {
            Permissions::VIEW_CHANNEL
        } else {
            Permissions::empty()
        };
        PermissionOverwrite {
            allow,
            deny,
            kind: PermissionOverwriteType::Role(role_id),
        }
    }

    fn is_not_found(err: &serenity::Error) -> bool {
        matches!(
            err,
            serenity::Error::Http(HttpError::UnsuccessfulRequest(resp))
                if resp.status_code.as_u16() == 404
        )
    }

    fn channel_builder<'a>(
        spec: &'a ChannelSpec<'a>,
        kind: ChannelType,
        overwrites: Vec<PermissionOverwrite>,
    ) -> CreateChannel<'a> {
        let mut builder = CreateChannel::new(spec.name)
            .kind(kind)
            .category(ChannelId::new(spec.container_id as u64))
            .permissions(overwrites);
        if let Some(topic) = &spec.topic {
            builder = builder.topic(topic.clone());
        }
        builder
    }
}

#[async_trait]
impl Provisioner for DiscordProvisioner {
    #[instrument(skip(self))]
    async fn create_role(&self, guild_id: i64, name: &str) -> CondottaResult<i64> {
        let role = GuildId::new(guild_id as u64)
            .create_role(
                self.http.as_ref(),
                EditRole::new().name(name).mentionable(true).hoist(false),
            )
            .await
            .map_err(|e| ProvisionError::new(ProvisionErrorKind::Role(e.to_string())))?;
        debug!(guild_id, name, role_id = role.id.get(), "Created role");
        Ok(role.id.get() as i64)
    }

    #[instrument(skip(self))]
    async fn create_container(&self, guild_id: i64, name: &str) -> CondottaResult<i64> {
        let category = GuildId::new(guild_id as u64)
            .create_channel(
                self.http.as_ref(),
                CreateChannel::new(name).kind(ChannelType::Category),
            )
            .await
            .map_err(|e| ProvisionError::new(ProvisionErrorKind::Container(e.to_string())))?;
        debug!(guild_id, name, category_id = category.id.get(), "Created category");
        Ok(category.id.get() as i64)
    }

    #[instrument(skip(self, spec), fields(name = spec.name, kind = %spec.kind))]
    async fn create_channel(&self, guild_id: i64, spec: &ChannelSpec<'_>) -> CondottaResult<i64> {
        let overwrites: Vec<PermissionOverwrite> = spec
            .overwrites
            .iter()
            .map(|o| Self::overwrite(guild_id, spec.roles, o))
            .collect();
        let guild = GuildId::new(guild_id as u64);

        let kind = match spec.kind {
            ChannelKind::Text => ChannelType::Text,
            ChannelKind::Voice => ChannelType::Voice,
            ChannelKind::Forum => ChannelType::Forum,
        };

        let result = guild
            .create_channel(
                self.http.as_ref(),
                Self::channel_builder(spec, kind, overwrites.clone()),
            )
            .await;

        let channel = match result {
            Ok(channel) => channel,
            // Forums need a community-enabled guild; fall back to text.
            Err(err) if spec.kind == ChannelKind::Forum => {
                warn!(guild_id, name = spec.name, error = %err, "Forum creation failed; falling back to text");
                guild
                    .create_channel(
                        self.http.as_ref(),
                        Self::channel_builder(spec, ChannelType::Text, overwrites),
                    )
                    .await
                    .map_err(|e| ProvisionError::new(ProvisionErrorKind::Channel(e.to_string())))?
            }
            Err(err) => {
                return Err(
                    ProvisionError::new(ProvisionErrorKind::Channel(err.to_string())).into(),
                );
            }
        };

        debug!(guild_id, name = spec.name, channel_id = channel.id.get(), "Created channel");
        Ok(channel.id.get() as i64)
    }

    /// Idempotent: a 404 on any delete is success.
    #[instrument(skip(self))]
    async fn delete_resource(&self, guild_id: i64, resource: ResourceId) -> CondottaResult<()> {
        let result = match resource {
            ResourceId::Role(id) => {
                self.http
                    .delete_role(GuildId::new(guild_id as u64), RoleId::new(id as u64), None)
                    .await
            }
            ResourceId::Container(id) | ResourceId::Channel(id) => self
                .http
                .delete_channel(ChannelId::new(id as u64), None)
                .await
                .map(|_| ()),
        };
        match result {
            Ok(()) => Ok(()),
            Err(err) if Self::is_not_found(&err) => {
                debug!(?resource, "Resource already gone");
                Ok(())
            }
            Err(err) => {
                Err(ProvisionError::new(ProvisionErrorKind::Delete(err.to_string())).into())
            }
        }
    }

    #[instrument(skip(self))]
    async fn grant_role(&self, guild_id: i64, user_id: i64, role_id: i64) -> CondottaResult<()> {
        self.http
            .add_member_role(
                GuildId::new(guild_id as u64),
                UserId::new(user_id as u64),
                RoleId::new(role_id as u64),
                None,
            )
            .await
            .map_err(|e| ProvisionError::new(ProvisionErrorKind::Grant(e.to_string())))?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn revoke_role(&self, guild_id: i64, user_id: i64, role_id: i64) -> CondottaResult<()> {
        let result = self
            .http
            .remove_member_role(
                GuildId::new(guild_id as u64),
                UserId::new(user_id as u64),
                RoleId::new(role_id as u64),
                None,
            )
            .await;
        match result {
            Ok(()) => Ok(()),
            // Revoking a role the user no longer holds is success.
            Err(err) if Self::is_not_found(&err) => Ok(()),
            Err(err) => {
                Err(ProvisionError::new(ProvisionErrorKind::Grant(err.to_string())).into())
            }
        }
    }

    async fn post_message(&self, channel_id: i64, content: &str) -> CondottaResult<()> {
        ChannelId::new(channel_id as u64)
            .send_message(self.http.as_ref(), CreateMessage::new().content(content))
            .await
            .map_err(|e| ProvisionError::new(ProvisionErrorKind::Notify(e.to_string())))?;
        Ok(())
    }
}
