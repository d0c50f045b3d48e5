// help.rs - Help Command Module
// Lists every registered command with its usage, generated from the registry

use serenity::{
    client::Context,
    framework::standard::{macros::command, Args, CommandResult},
    model::channel::Message,
};

use crate::commands::reply::{send_to_channel, Reply, ReplyEmbed, COLOR_INFO};
use crate::commands::{Invocation, COMMANDS};
use crate::state::bot_state;

pub fn help_reply(invocation: &Invocation) -> Reply {
    let mut embed = ReplyEmbed::new(COLOR_INFO).title("📖 Like Bot Commands");

    for spec in COMMANDS {
        let usage = if spec.usage.is_empty() {
            format!("`{}{}`", invocation.prefix, spec.name)
        } else {
            format!("`{}{} {}`", invocation.prefix, spec.name, spec.usage)
        };
        let description = if spec.admin_only {
            format!("{}\n*Administrator only*", spec.description)
        } else {
            spec.description.to_string()
        };
        embed = embed.field(usage, description, false);
    }

    Reply::embed(embed.footer("Region and UID may be given in either order.")).ephemeral(invocation.is_slash)
}

#[command]
#[aliases("h", "commands")]
/// Display help information for all available commands
pub async fn help(ctx: &Context, msg: &Message, _args: Args) -> CommandResult {
    let state = bot_state(ctx).await.ok_or("bot state is not initialized")?;
    let invocation = Invocation::from_message(msg, &state.prefix);

    send_to_channel(ctx, msg, &help_reply(&invocation)).await?;
    Ok(())
}
