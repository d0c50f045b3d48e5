// setlikechannel.rs - Like Channel Toggle Command
// Administrators add or remove a channel from the server's like allow-list.
// A server without any listed channel allows the like command everywhere.
//
// Used by: main.rs (command registration), commands/slash.rs

use serenity::{
    client::Context,
    framework::standard::{macros::command, Args, CommandResult},
    model::{channel::Channel, channel::Message, id::ChannelId},
};
use log::{error, info};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::commands::reply::{send_to_channel, Reply};
use crate::commands::Invocation;
use crate::config_store::{ConfigStore, StoreError};
use crate::state::{bot_state, BotState};

// Matches a channel mention like <#123456789>
static CHANNEL_MENTION_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^<#(\d+)>$").unwrap()
});

/// Accept `<#id>` or a bare numeric id
pub fn parse_channel_arg(arg: &str) -> Option<u64> {
    let arg = arg.trim();
    let digits = match CHANNEL_MENTION_REGEX.captures(arg) {
        Some(caps) => caps.get(1).map(|m| m.as_str())?,
        None => arg,
    };
    digits.parse::<u64>().ok().filter(|id| *id != 0)
}

pub fn usage_message(prefix: &str) -> String {
    format!("Please specify a channel.\nExample: `{}setlikechannel #general`", prefix)
}

/// Toggle `channel_id` for the invoking server and persist the change.
/// The reply is always private. If the save fails the toggle is undone so the
/// in-memory document keeps matching the file.
pub fn toggle_like_channel(
    invocation: &Invocation,
    channel_id: u64,
    store: &mut ConfigStore,
) -> Result<Reply, StoreError> {
    let guild_id = match invocation.guild_id {
        Some(id) => id,
        None => return Ok(Reply::text("This command must be used in a server.").ephemeral(true)),
    };

    let added = store.toggle_channel(guild_id, channel_id);
    if let Err(e) = store.save() {
        store.toggle_channel(guild_id, channel_id);
        return Err(e);
    }

    info!(
        "🔧 {} ({}) {} channel {} {} the like allow-list of guild {}",
        invocation.author_name,
        invocation.author_id,
        if added { "added" } else { "removed" },
        channel_id,
        if added { "to" } else { "from" },
        guild_id
    );

    let message = if added {
        format!("✅ <#{}> is now allowed for `/like`.", channel_id)
    } else {
        format!("🚫 <#{}> removed from allowed channels.", channel_id)
    };
    Ok(Reply::text(message).ephemeral(true))
}

/// Toggle under the store's write lock. The save does blocking file I/O, so it
/// runs via `block_in_place` to keep the other tasks on this worker moving.
pub async fn toggle_in_state(
    state: &BotState,
    invocation: &Invocation,
    channel_id: u64,
) -> Result<Reply, StoreError> {
    let mut store = state.store.write().await;
    tokio::task::block_in_place(|| toggle_like_channel(invocation, channel_id, &mut store))
}

#[command]
#[required_permissions("ADMINISTRATOR")]
/// Toggle a channel in the like allow-list (administrators only)
/// Supports:
///   - <prefix>setlikechannel #channel
///   - <prefix>setlikechannel <channel id>
pub async fn setlikechannel(ctx: &Context, msg: &Message, args: Args) -> CommandResult {
    let state = bot_state(ctx).await.ok_or("bot state is not initialized")?;
    let invocation = Invocation::from_message(msg, &state.prefix);

    let guild_id = match msg.guild_id {
        Some(id) => id,
        None => {
            send_to_channel(ctx, msg, &Reply::text("This command must be used in a server.")).await?;
            return Ok(());
        }
    };

    let channel_id = match parse_channel_arg(args.message()) {
        Some(id) => id,
        None => {
            send_to_channel(ctx, msg, &Reply::text(usage_message(&state.prefix))).await?;
            return Ok(());
        }
    };

    // Only channels of this server can be listed
    let belongs_here = match ChannelId(channel_id).to_channel(ctx).await {
        Ok(Channel::Guild(channel)) => channel.guild_id == guild_id,
        _ => false,
    };
    if !belongs_here {
        send_to_channel(ctx, msg, &Reply::text("❌ That channel was not found in this server.")).await?;
        return Ok(());
    }

    let result = toggle_in_state(&state, &invocation, channel_id).await;

    match result {
        Ok(reply) => {
            send_to_channel(ctx, msg, &reply).await?;
        }
        Err(e) => {
            error!("❌ Failed to save like channel config: {}", e);
            send_to_channel(ctx, msg, &Reply::text("❌ Failed to save the channel settings.")).await?;
            return Err(e.into());
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::like_api::HttpLikeApi;
    use std::fs;
    use std::sync::Arc;
    use std::time::Duration;
    use tempfile::TempDir;

    fn admin_invocation(guild_id: Option<u64>) -> Invocation {
        Invocation {
            guild_id,
            channel_id: 10,
            author_id: 7,
            author_name: "admin".to_string(),
            is_slash: true,
            prefix: "/".to_string(),
        }
    }

    #[test]
    fn test_parse_channel_arg() {
        assert_eq!(parse_channel_arg("<#123456789>"), Some(123456789));
        assert_eq!(parse_channel_arg(" 123456789 "), Some(123456789));
        assert_eq!(parse_channel_arg("<@123456789>"), None);
        assert_eq!(parse_channel_arg("general"), None);
        assert_eq!(parse_channel_arg(""), None);
        assert_eq!(parse_channel_arg("0"), None);
    }

    #[test]
    fn test_toggle_reports_and_persists() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("like_channels.json");
        let mut store = ConfigStore::load(&path).unwrap();
        let invocation = admin_invocation(Some(1));

        let reply = toggle_like_channel(&invocation, 55, &mut store).unwrap();
        assert_eq!(reply.content.as_deref(), Some("✅ <#55> is now allowed for `/like`."));
        assert!(reply.ephemeral);
        assert!(ConfigStore::load(&path).unwrap().is_channel_allowed(Some(1), 55));
        assert!(!ConfigStore::load(&path).unwrap().is_channel_allowed(Some(1), 56));

        let reply = toggle_like_channel(&invocation, 55, &mut store).unwrap();
        assert_eq!(reply.content.as_deref(), Some("🚫 <#55> removed from allowed channels."));
        assert!(ConfigStore::load(&path).unwrap().is_channel_allowed(Some(1), 56));
    }

    #[test]
    fn test_outside_server_rejected_without_change() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("like_channels.json");
        let mut store = ConfigStore::load(&path).unwrap();
        let before = fs::read_to_string(&path).unwrap();

        let reply = toggle_like_channel(&admin_invocation(None), 55, &mut store).unwrap();
        assert_eq!(reply.content.as_deref(), Some("This command must be used in a server."));
        assert!(reply.ephemeral);
        assert!(store.document().servers.is_empty());
        assert_eq!(fs::read_to_string(&path).unwrap(), before);
    }

    #[test]
    fn test_failed_save_rolls_back() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("like_channels.json");
        let mut store = ConfigStore::load(&path).unwrap();

        // A directory squatting on the temp file name makes the write fail
        fs::create_dir(dir.path().join("like_channels.json.tmp")).unwrap();

        let result = toggle_like_channel(&admin_invocation(Some(1)), 55, &mut store);
        assert!(result.is_err());
        assert!(store.is_channel_allowed(Some(1), 99));
        assert!(store
            .document()
            .servers
            .get("1")
            .map(|s| s.like_channels.is_empty())
            .unwrap_or(true));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_concurrent_toggles_all_persist() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("like_channels.json");
        let store = ConfigStore::load(&path).unwrap();
        let api = HttpLikeApi::new("http://127.0.0.1:9", "secret", Duration::from_secs(1)).unwrap();
        let state = Arc::new(BotState::new(store, Arc::new(api), "!".to_string()));

        let tasks: Vec<_> = (100..110)
            .map(|channel_id| {
                let state = Arc::clone(&state);
                tokio::spawn(async move {
                    let invocation = admin_invocation(Some(1));
                    let reply = toggle_in_state(&state, &invocation, channel_id).await.unwrap();
                    reply.ephemeral
                })
            })
            .collect();
        for task in tasks {
            assert!(task.await.unwrap());
        }

        let reloaded = ConfigStore::load(&path).unwrap();
        let mut channels = reloaded.document().servers["1"].like_channels.clone();
        channels.sort();
        let expected: Vec<String> = (100..110).map(|id: u64| id.to_string()).collect();
        assert_eq!(channels, expected);
    }
}
