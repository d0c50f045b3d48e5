// slash.rs - Slash Commands Module
// Registers the command registry as Discord application commands and routes
// incoming interactions to the same handlers the text commands use.

use serenity::{
    builder::CreateApplicationCommand,
    client::Context,
    model::{
        application::{
            command::{Command, CommandOptionType},
            interaction::application_command::ApplicationCommandInteraction,
        },
        channel::ChannelType,
        permissions::Permissions,
    },
};
use log::{error, info, warn};
use std::sync::Arc;

use crate::commands::help::help_reply;
use crate::commands::like::{execute_like, prepare_like};
use crate::commands::reply::{defer, finish_deferred, respond, Reply};
use crate::commands::setlikechannel::toggle_in_state;
use crate::commands::{find_command, CommandSpec, Invocation, OptionKind, COMMANDS};
use crate::state::{bot_state, BotState};

type SlashResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;

// ============================================================================
// SLASH COMMAND HANDLER
// ============================================================================

/// Handle slash command interactions
pub async fn handle_slash_command(ctx: &Context, interaction: &ApplicationCommandInteraction) -> SlashResult {
    let state = bot_state(ctx).await.ok_or("bot state is not initialized")?;
    let invocation = Invocation::from_interaction(interaction);

    match find_command(&interaction.data.name).map(|spec| spec.name) {
        Some("like") => handle_like_slash(ctx, interaction, &invocation, state).await?,
        Some("setlikechannel") => handle_setlikechannel_slash(ctx, interaction, &invocation, state).await?,
        Some("help") => respond(ctx, interaction, &help_reply(&invocation)).await?,
        _ => {
            warn!("Unknown slash command: {}", interaction.data.name);
            let reply = Reply::text(format!("Unknown slash command: {}", interaction.data.name)).ephemeral(true);
            respond(ctx, interaction, &reply).await?;
        }
    }

    Ok(())
}

fn option_str<'a>(interaction: &'a ApplicationCommandInteraction, name: &str) -> Option<&'a str> {
    interaction
        .data
        .options
        .iter()
        .find(|option| option.name == name)
        .and_then(|option| option.value.as_ref())
        .and_then(|value| value.as_str())
}

// ============================================================================
// INDIVIDUAL SLASH COMMAND HANDLERS
// ============================================================================

/// Handle /like slash command
async fn handle_like_slash(
    ctx: &Context,
    interaction: &ApplicationCommandInteraction,
    invocation: &Invocation,
    state: Arc<BotState>,
) -> SlashResult {
    let region = option_str(interaction, "region");
    let uid = option_str(interaction, "uid");

    let prepared = {
        let store = state.store.read().await;
        prepare_like(invocation, region, uid, &store)
    };

    match prepared {
        Err(reply) => respond(ctx, interaction, &reply).await?,
        Ok(request) => {
            defer(ctx, interaction).await?;
            let reply = execute_like(invocation, &request, state.api.as_ref()).await;
            finish_deferred(ctx, interaction, &reply).await?;
        }
    }

    Ok(())
}

/// Handle /setlikechannel slash command
async fn handle_setlikechannel_slash(
    ctx: &Context,
    interaction: &ApplicationCommandInteraction,
    invocation: &Invocation,
    state: Arc<BotState>,
) -> SlashResult {
    let is_admin = interaction
        .member
        .as_ref()
        .and_then(|member| member.permissions)
        .map(|permissions| permissions.administrator())
        .unwrap_or(false);

    // Direct messages carry no member; the handler answers those itself
    if invocation.guild_id.is_some() && !is_admin {
        let reply = Reply::text("❌ **Access Denied**\nYou need the Administrator permission to use this command.")
            .ephemeral(true);
        respond(ctx, interaction, &reply).await?;
        return Ok(());
    }

    let channel_id = match option_str(interaction, "channel").and_then(|id| id.parse::<u64>().ok()) {
        Some(id) => id,
        None => {
            respond(ctx, interaction, &Reply::text("Please specify a channel.").ephemeral(true)).await?;
            return Ok(());
        }
    };

    let result = toggle_in_state(&state, invocation, channel_id).await;

    match result {
        Ok(reply) => respond(ctx, interaction, &reply).await?,
        Err(e) => {
            error!("❌ Failed to save like channel config: {}", e);
            let reply = Reply::text("❌ Failed to save the channel settings.").ephemeral(true);
            respond(ctx, interaction, &reply).await?;
            return Err(e.into());
        }
    }

    Ok(())
}

// ============================================================================
// SLASH COMMAND REGISTRATION
// ============================================================================

fn build_command<'a>(
    command: &'a mut CreateApplicationCommand,
    spec: &CommandSpec,
) -> &'a mut CreateApplicationCommand {
    command.name(spec.name).description(spec.description);

    if spec.admin_only {
        command
            .default_member_permissions(Permissions::ADMINISTRATOR)
            .dm_permission(false);
    }

    for opt in spec.options {
        command.create_option(|option| {
            option
                .name(opt.name)
                .description(opt.description)
                .required(opt.required);
            match opt.kind {
                OptionKind::String => option.kind(CommandOptionType::String),
                OptionKind::TextChannel => option
                    .kind(CommandOptionType::Channel)
                    .channel_types(&[ChannelType::Text]),
            }
        });
    }

    command
}

/// Register all slash commands with Discord, replacing any stale ones
pub async fn register_slash_commands(http: &serenity::http::Http) -> SlashResult {
    let commands = Command::set_global_application_commands(http, |commands| {
        for spec in COMMANDS {
            commands.create_application_command(|command| build_command(command, spec));
        }
        commands
    })
    .await?;

    info!("✅ Registered {} slash commands with Discord", commands.len());
    for cmd in &commands {
        info!("   /{} - {}", cmd.name, cmd.description);
    }

    Ok(())
}
