//! Slash command registration and dispatch.
//!
//! Every command replies ephemerally to its invoker; public output (war
//! notices, control panels) goes through the provisioner instead. Long
//! operations (faction creation, guild setup) defer first and follow up.

use crate::messages;
use crate::services::Services;
use condotta_core::{Actor, ChannelKind, ChannelSpec, FactionStore, Provisioner, RoleSet};
use serenity::all::{
    ButtonStyle, ChannelId, CommandInteraction, CommandOptionType, CreateActionRow, CreateButton,
    CreateCommand, CreateCommandOption, CreateInteractionResponse,
    CreateInteractionResponseFollowup, CreateInteractionResponseMessage, CreateMessage,
    ResolvedValue,
};
use serenity::client::Context;
use tracing::{error, info, instrument, warn};

/// Build the full slash command set for registration.
pub fn registrations() -> Vec<CreateCommand> {
    vec![
        CreateCommand::new("money")
            .description("Show a coin balance")
            .add_option(
                CreateCommandOption::new(CommandOptionType::User, "user", "User to look up")
                    .required(false),
            ),
        CreateCommand::new("give")
            .description("Administrator: grant coins to a user")
            .add_option(
                CreateCommandOption::new(CommandOptionType::User, "user", "Recipient")
                    .required(true),
            )
            .add_option(
                CreateCommandOption::new(CommandOptionType::Integer, "amount", "Coins to grant")
                    .required(true),
            ),
        CreateCommand::new("create_faction")
            .description("Found a new faction")
            .add_option(
                CreateCommandOption::new(CommandOptionType::String, "name", "Faction name")
                    .required(true),
            ),
        CreateCommand::new("f_invite")
            .description("Invite a user into your faction")
            .add_option(
                CreateCommandOption::new(CommandOptionType::User, "user", "User to invite")
                    .required(true),
            ),
        CreateCommand::new("f_kick")
            .description("Kick a member from your faction")
            .add_option(
                CreateCommandOption::new(CommandOptionType::User, "user", "Member to kick")
                    .required(true),
            ),
        CreateCommand::new("f_promote")
            .description("Promote a member to officer")
            .add_option(
                CreateCommandOption::new(CommandOptionType::User, "user", "Member to promote")
                    .required(true),
            ),
        CreateCommand::new("f_demote")
            .description("Demote an officer to member")
            .add_option(
                CreateCommandOption::new(CommandOptionType::User, "user", "Officer to demote")
                    .required(true),
            ),
        CreateCommand::new("f_info").description("Show your faction's summary"),
        CreateCommand::new("f_leave").description("Leave your faction"),
        CreateCommand::new("f_disband").description("Disband your faction (leader only)"),
        CreateCommand::new("f_set_open").description("Toggle open/invite-only joining"),
        CreateCommand::new("f_join")
            .description("Join an open faction")
            .add_option(
                CreateCommandOption::new(CommandOptionType::String, "name", "Faction to join")
                    .required(true),
            ),
        CreateCommand::new("f_war_start")
            .description("Declare war on another faction")
            .add_option(
                CreateCommandOption::new(CommandOptionType::String, "faction", "Defending faction")
                    .required(true),
            ),
        CreateCommand::new("f_war_status").description("Show the active war standings"),
        CreateCommand::new("f_war_end").description("Administrator: resolve the active war"),
        CreateCommand::new("setup_global")
            .description("Administrator: create the shared guild channels"),
    ]
}

/// The acting user, with administrator capability resolved from the
/// interaction's member permissions.
fn actor_of(command: &CommandInteraction) -> Actor {
    let admin = command
        .member
        .as_ref()
        .and_then(|m| m.permissions)
        .is_some_and(|p| p.administrator());
    Actor {
        user_id: command.user.id.get() as i64,
        admin,
    }
}

fn user_option(command: &CommandInteraction, name: &str) -> Option<i64> {
    for opt in command.data.options() {
        if opt.name == name
            && let ResolvedValue::User(user, _) = opt.value
        {
            return Some(user.id.get() as i64);
        }
    }
    None
}

fn string_option(command: &CommandInteraction, name: &str) -> Option<String> {
    for opt in command.data.options() {
        if opt.name == name
            && let ResolvedValue::String(value) = opt.value
        {
            return Some(value.to_string());
        }
    }
    None
}

fn integer_option(command: &CommandInteraction, name: &str) -> Option<i64> {
    for opt in command.data.options() {
        if opt.name == name
            && let ResolvedValue::Integer(value) = opt.value
        {
            return Some(value);
        }
    }
    None
}

/// Ephemeral reply to the invoker.
async fn reply(ctx: &Context, command: &CommandInteraction, content: String) {
    let response = CreateInteractionResponse::Message(
        CreateInteractionResponseMessage::new()
            .content(content)
            .ephemeral(true),
    );
    if let Err(err) = command.create_response(&ctx.http, response).await {
        warn!(command = %command.data.name, error = %err, "Failed to send reply");
    }
}

/// Ephemeral follow-up after a deferral.
async fn follow_up(ctx: &Context, command: &CommandInteraction, content: String) {
    let response = CreateInteractionResponseFollowup::new()
        .content(content)
        .ephemeral(true);
    if let Err(err) = command.create_followup(&ctx.http, response).await {
        warn!(command = %command.data.name, error = %err, "Failed to send follow-up");
    }
}

/// Route one slash command into the engine.
#[instrument(skip(services, ctx, command), fields(command = %command.data.name, user_id = command.user.id.get()))]
pub async fn dispatch<S: FactionStore>(
    services: &Services<S>,
    ctx: &Context,
    command: &CommandInteraction,
) {
    let Some(guild) = command.guild_id else {
        reply(ctx, command, "This command only works inside a server.".to_string()).await;
        return;
    };
    let guild_id = guild.get() as i64;
    let actor = actor_of(command);

    match command.data.name.as_str() {
        "money" => {
            let target = user_option(command, "user").unwrap_or(actor.user_id);
            let text = match services.currency.balance(target).await {
                Ok(balance) => format!("{} has `{}` coins.", messages::mention(target), balance),
                Err(err) => messages::error_reply(&err),
            };
            reply(ctx, command, text).await;
        }
        "give" => {
            if !actor.admin {
                reply(ctx, command, "Only administrators can grant coins.".to_string()).await;
                return;
            }
            let (Some(target), Some(amount)) = (
                user_option(command, "user"),
                integer_option(command, "amount"),
            ) else {
                reply(ctx, command, "Both a user and an amount are required.".to_string()).await;
                return;
            };
            let text = match services.currency.grant(target, amount).await {
                Ok(balance) => format!(
                    "Granted `{}` coins to {} (new balance: `{}`).",
                    amount,
                    messages::mention(target),
                    balance
                ),
                Err(err) => messages::error_reply(&err),
            };
            reply(ctx, command, text).await;
        }
        "create_faction" => {
            let Some(name) = string_option(command, "name") else {
                reply(ctx, command, "A faction name is required.".to_string()).await;
                return;
            };
            // Provisioning is slow; acknowledge before working.
            if let Err(err) = command.defer_ephemeral(&ctx.http).await {
                warn!(error = %err, "Failed to defer create_faction");
                return;
            }
            match services.lifecycle.create(guild_id, actor.user_id, &name).await {
                Ok(faction) => {
                    post_control_panel(ctx, faction.channels.control_panel).await;
                    follow_up(
                        ctx,
                        command,
                        format!(
                            "Faction **{}** founded. Your channels are ready under `Faction: {}`.",
                            faction.name, faction.name
                        ),
                    )
                    .await;
                }
                Err(err) => follow_up(ctx, command, messages::error_reply(&err)).await,
            }
        }
        "f_invite" => {
            let Some(target) = user_option(command, "user") else {
                reply(ctx, command, "A user is required.".to_string()).await;
                return;
            };
            let text = match services.membership.invite(guild_id, actor, target).await {
                Ok(faction) => format!(
                    "{} joined **{}**.",
                    messages::mention(target),
                    faction.name
                ),
                Err(err) => messages::error_reply(&err),
            };
            reply(ctx, command, text).await;
        }
        "f_kick" => {
            let Some(target) = user_option(command, "user") else {
                reply(ctx, command, "A user is required.".to_string()).await;
                return;
            };
            let text = match services.membership.kick(guild_id, actor, target).await {
                Ok(faction) => format!(
                    "{} was removed from **{}**.",
                    messages::mention(target),
                    faction.name
                ),
                Err(err) => messages::error_reply(&err),
            };
            reply(ctx, command, text).await;
        }
        "f_promote" => {
            let Some(target) = user_option(command, "user") else {
                reply(ctx, command, "A user is required.".to_string()).await;
                return;
            };
            let text = match services.membership.promote(guild_id, actor, target).await {
                Ok(_) => format!("{} is now an officer.", messages::mention(target)),
                Err(err) => messages::error_reply(&err),
            };
            reply(ctx, command, text).await;
        }
        "f_demote" => {
            let Some(target) = user_option(command, "user") else {
                reply(ctx, command, "A user is required.".to_string()).await;
                return;
            };
            let text = match services.membership.demote(guild_id, actor, target).await {
                Ok(_) => format!("{} is back to member.", messages::mention(target)),
                Err(err) => messages::error_reply(&err),
            };
            reply(ctx, command, text).await;
        }
        "f_info" => {
            let text = match services.membership.info(guild_id, actor.user_id).await {
                Ok(info) => messages::faction_info(&info),
                Err(err) => messages::error_reply(&err),
            };
            reply(ctx, command, text).await;
        }
        "f_leave" => {
            let text = match services.membership.leave(guild_id, actor.user_id).await {
                Ok(faction) => format!("You left **{}**.", faction.name),
                Err(err) => messages::error_reply(&err),
            };
            reply(ctx, command, text).await;
        }
        "f_disband" => {
            let text = match services.lifecycle.disband(guild_id, actor, None).await {
                Ok(faction) => format!("**{}** has been disbanded.", faction.name),
                Err(err) => messages::error_reply(&err),
            };
            reply(ctx, command, text).await;
        }
        "f_set_open" => {
            let text = match services.membership.toggle_open(guild_id, actor).await {
                Ok((faction, true)) => {
                    format!("**{}** is now open; anyone can `/f_join` it.", faction.name)
                }
                Ok((faction, false)) => format!("**{}** is now invite-only.", faction.name),
                Err(err) => messages::error_reply(&err),
            };
            reply(ctx, command, text).await;
        }
        "f_join" => {
            let Some(name) = string_option(command, "name") else {
                reply(ctx, command, "A faction name is required.".to_string()).await;
                return;
            };
            let text = match services.membership.join(guild_id, actor.user_id, &name).await {
                Ok(faction) => format!("Welcome to **{}**.", faction.name),
                Err(err) => messages::error_reply(&err),
            };
            reply(ctx, command, text).await;
        }
        "f_war_start" => {
            let Some(defender) = string_option(command, "faction") else {
                reply(ctx, command, "A defending faction is required.".to_string()).await;
                return;
            };
            let text = match services.wars.start(guild_id, actor, &defender).await {
                Ok((_, attacker, defender)) => format!(
                    "**{}** has declared war on **{}**. Every member message now counts.",
                    attacker.name, defender.name
                ),
                Err(err) => messages::error_reply(&err),
            };
            reply(ctx, command, text).await;
        }
        "f_war_status" => {
            let text = match services.wars.status(guild_id).await {
                Ok(report) => {
                    let standings = messages::war_report(&report);
                    mirror_to_war_channel(services, guild_id, &standings).await;
                    standings
                }
                Err(err) => messages::error_reply(&err),
            };
            reply(ctx, command, text).await;
        }
        "f_war_end" => {
            let text = match services.wars.end(guild_id, actor).await {
                Ok(outcome) => messages::war_outcome(&outcome),
                Err(err) => messages::error_reply(&err),
            };
            reply(ctx, command, text).await;
        }
        "setup_global" => {
            if !actor.admin {
                reply(
                    ctx,
                    command,
                    "Only administrators can run guild setup.".to_string(),
                )
                .await;
                return;
            }
            if let Err(err) = command.defer_ephemeral(&ctx.http).await {
                warn!(error = %err, "Failed to defer setup_global");
                return;
            }
            let text = match setup_global(services, guild_id).await {
                Ok(()) => {
                    "Shared channels and the war-status channel are ready.".to_string()
                }
                Err(err) => {
                    error!(guild_id, error = %err, "Guild setup failed");
                    messages::error_reply(&err)
                }
            };
            follow_up(ctx, command, text).await;
        }
        other => {
            warn!(command = other, "Unknown command");
            reply(ctx, command, "Unknown command.".to_string()).await;
        }
    }
}

/// Echo the standings to the guild's war-status channel, when one is
/// configured. Best effort; the invoker already has their reply.
async fn mirror_to_war_channel<S: FactionStore>(
    services: &Services<S>,
    guild_id: i64,
    content: &str,
) {
    match services.store.war_status_channel(guild_id).await {
        Ok(Some(channel_id)) => {
            if let Err(err) = services.provisioner.post_message(channel_id, content).await {
                warn!(guild_id, channel_id, error = %err, "Failed to mirror war standings");
            }
        }
        Ok(None) => {}
        Err(err) => warn!(guild_id, error = %err, "Failed to load war-status channel"),
    }
}

/// Post the interactive control panel into a fresh faction's panel channel.
/// Cosmetic; failure is logged and swallowed.
async fn post_control_panel(ctx: &Context, channel_id: i64) {
    let buttons = CreateActionRow::Buttons(vec![
        CreateButton::new(messages::PANEL_INFO)
            .label("Faction info")
            .style(ButtonStyle::Primary),
        CreateButton::new(messages::PANEL_TOGGLE_OPEN)
            .label("Toggle join mode")
            .style(ButtonStyle::Secondary),
        CreateButton::new(messages::PANEL_DISBAND)
            .label("Disband")
            .style(ButtonStyle::Danger),
    ]);
    let message = CreateMessage::new()
        .content("Faction controls:")
        .components(vec![buttons]);
    if let Err(err) = ChannelId::new(channel_id as u64)
        .send_message(&ctx.http, message)
        .await
    {
        warn!(channel_id, error = %err, "Failed to post control panel buttons");
    }
}

/// Create the guild-wide shared channels and register the war-status
/// channel: a commons category with chat, forum, suggestions, two voice
/// rooms with listen-along texts, and the war room.
async fn setup_global<S: FactionStore>(
    services: &Services<S>,
    guild_id: i64,
) -> condotta_error::CondottaResult<()> {
    let provisioner = &services.provisioner;
    let category = provisioner.create_container(guild_id, "Commons").await?;

    // Shared channels carry no faction overwrites.
    let no_roles = RoleSet {
        base: 0,
        leader: 0,
        officer: 0,
    };
    let shared = |kind: ChannelKind, name: &'static str| ChannelSpec {
        kind,
        name,
        topic: None,
        container_id: category,
        roles: &no_roles,
        overwrites: &[],
    };

    provisioner
        .create_channel(guild_id, &shared(ChannelKind::Text, "general"))
        .await?;
    provisioner
        .create_channel(guild_id, &shared(ChannelKind::Forum, "forum"))
        .await?;
    provisioner
        .create_channel(guild_id, &shared(ChannelKind::Text, "suggestions"))
        .await?;
    provisioner
        .create_channel(guild_id, &shared(ChannelKind::Voice, "voice-1"))
        .await?;
    provisioner
        .create_channel(guild_id, &shared(ChannelKind::Voice, "voice-2"))
        .await?;
    provisioner
        .create_channel(guild_id, &shared(ChannelKind::Text, "voice-1-text"))
        .await?;
    provisioner
        .create_channel(guild_id, &shared(ChannelKind::Text, "voice-2-text"))
        .await?;

    let war_room = provisioner
        .create_channel(guild_id, &shared(ChannelKind::Text, "war-room"))
        .await?;
    services.store.set_war_status_channel(guild_id, war_room).await?;

    info!(guild_id, war_room, "Guild setup complete");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_command_is_registered_once() {
        let commands = registrations();
        assert_eq!(commands.len(), 16);
    }
}
