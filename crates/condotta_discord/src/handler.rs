//! Serenity event handler.
//!
//! Routes gateway traffic into the engine: messages feed the currency
//! ledger and the war tracker, slash commands dispatch through
//! [`crate::commands`], and control-panel buttons resolve their faction
//! from the channel they live in.

use crate::services::Services;
use crate::{commands, messages};
use condotta_core::{Actor, FactionInfo, FactionStore};
use serenity::all::{
    Command, ComponentInteraction, CreateInteractionResponse, CreateInteractionResponseMessage,
    Interaction, Ready,
};
use serenity::async_trait;
use serenity::client::{Context, EventHandler};
use serenity::model::channel::Message;
use serenity::model::gateway::GatewayIntents;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Event handler for the Condotta bot.
pub struct CondottaHandler<S> {
    services: Arc<Services<S>>,
}

impl<S: FactionStore> CondottaHandler<S> {
    /// Create a handler over the assembled engine.
    pub fn new(services: Arc<Services<S>>) -> Self {
        Self { services }
    }

    /// Required gateway intents.
    pub fn intents() -> GatewayIntents {
        GatewayIntents::GUILDS
            | GatewayIntents::GUILD_MEMBERS
            | GatewayIntents::GUILD_MESSAGES
            | GatewayIntents::MESSAGE_CONTENT
    }

    /// Ephemeral reply to a component press.
    async fn component_reply(ctx: &Context, component: &ComponentInteraction, content: String) {
        let response = CreateInteractionResponse::Message(
            CreateInteractionResponseMessage::new()
                .content(content)
                .ephemeral(true),
        );
        if let Err(err) = component.create_response(&ctx.http, response).await {
            warn!(custom_id = %component.data.custom_id, error = %err, "Failed to answer component");
        }
    }

    /// Handle a control-panel button press.
    ///
    /// The panel carries no per-faction state; the faction is resolved from
    /// the channel the button lives in, so panels keep working across
    /// restarts and survive nothing but the channel id.
    async fn handle_component(&self, ctx: &Context, component: &ComponentInteraction) {
        let Some(guild) = component.guild_id else {
            return;
        };
        let guild_id = guild.get() as i64;
        let channel_id = component.channel_id.get() as i64;
        let actor = Actor {
            user_id: component.user.id.get() as i64,
            admin: component
                .member
                .as_ref()
                .and_then(|m| m.permissions)
                .is_some_and(|p| p.administrator()),
        };

        let faction = match self.services.store.faction_by_panel_channel(channel_id).await {
            Ok(Some(faction)) => faction,
            Ok(None) => {
                Self::component_reply(
                    ctx,
                    component,
                    "This control panel is no longer attached to a faction.".to_string(),
                )
                .await;
                return;
            }
            Err(err) => {
                error!(channel_id, error = %err, "Panel faction lookup failed");
                Self::component_reply(
                    ctx,
                    component,
                    "Something went wrong on our end. Please try again later.".to_string(),
                )
                .await;
                return;
            }
        };

        match component.data.custom_id.as_str() {
            messages::PANEL_INFO => {
                let text = match self.panel_info(&faction, actor, guild_id).await {
                    Ok(info) => messages::faction_info(&info),
                    Err(err) => messages::error_reply(&err),
                };
                Self::component_reply(ctx, component, text).await;
            }
            messages::PANEL_TOGGLE_OPEN => {
                let member_here = self
                    .services
                    .store
                    .membership(actor.user_id, guild_id)
                    .await
                    .ok()
                    .flatten()
                    .is_some_and(|m| m.faction_id == faction.id);
                if !member_here {
                    Self::component_reply(
                        ctx,
                        component,
                        "Only this faction's leader or officers can change its join mode."
                            .to_string(),
                    )
                    .await;
                    return;
                }
                let text = match self.services.membership.toggle_open(guild_id, actor).await {
                    Ok((faction, true)) => format!("**{}** is now open.", faction.name),
                    Ok((faction, false)) => format!("**{}** is now invite-only.", faction.name),
                    Err(err) => messages::error_reply(&err),
                };
                Self::component_reply(ctx, component, text).await;
            }
            messages::PANEL_DISBAND => {
                let text = match self
                    .services
                    .lifecycle
                    .disband(guild_id, actor, Some(faction.id))
                    .await
                {
                    Ok(faction) => format!("**{}** has been disbanded.", faction.name),
                    Err(err) => messages::error_reply(&err),
                };
                Self::component_reply(ctx, component, text).await;
            }
            other => {
                debug!(custom_id = other, "Ignoring unknown component");
            }
        }
    }

    /// The panel faction's summary, with the pressing user's rank when they
    /// are a member.
    async fn panel_info(
        &self,
        faction: &condotta_core::Faction,
        actor: Actor,
        guild_id: i64,
    ) -> condotta_error::CondottaResult<FactionInfo> {
        let member_count = self.services.store.member_count(faction.id).await?;
        let rank = self
            .services
            .store
            .membership(actor.user_id, guild_id)
            .await?
            .filter(|m| m.faction_id == faction.id)
            .map(|m| m.rank);
        Ok(FactionInfo {
            name: faction.name.clone(),
            leader_id: faction.leader_id,
            member_count,
            rank,
            is_open: faction.is_open,
        })
    }
}

#[async_trait]
impl<S: FactionStore + 'static> EventHandler for CondottaHandler<S> {
    async fn ready(&self, ctx: Context, ready: Ready) {
        info!(
            bot_user = %ready.user.name,
            guilds = ready.guilds.len(),
            "Bot connected to Discord"
        );

        match Command::set_global_commands(&ctx.http, commands::registrations()).await {
            Ok(registered) => info!(count = registered.len(), "Registered slash commands"),
            Err(err) => error!(error = %err, "Failed to register slash commands"),
        }
    }

    /// Every guild message feeds the currency ledger and, during a war, the
    /// sender's side of the scoreboard.
    async fn message(&self, _ctx: Context, msg: Message) {
        if msg.author.bot {
            return;
        }
        let Some(guild) = msg.guild_id else {
            return;
        };
        let guild_id = guild.get() as i64;
        let user_id = msg.author.id.get() as i64;

        match self.services.currency.award_for_message(user_id).await {
            Ok(Some(balance)) => debug!(user_id, balance, "Awarded message coin"),
            Ok(None) => {}
            Err(err) => warn!(user_id, error = %err, "Currency award failed"),
        }

        if let Err(err) = self.services.wars.score(guild_id, user_id).await {
            warn!(guild_id, user_id, error = %err, "War scoring failed");
        }
    }

    async fn interaction_create(&self, ctx: Context, interaction: Interaction) {
        match interaction {
            Interaction::Command(command) => {
                commands::dispatch(self.services.as_ref(), &ctx, &command).await;
            }
            Interaction::Component(component) => {
                self.handle_component(&ctx, &component).await;
            }
            _ => {}
        }
    }
}
