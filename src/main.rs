mod commands;
mod config_store;
mod like_api;
mod settings;
mod state;

use serenity::{
    async_trait,
    client::{Client, Context, EventHandler},
    framework::standard::{macros::group, DispatchError, StandardFramework},
    model::{application::interaction::Interaction, gateway::Ready},
    prelude::GatewayIntents,
};
use std::sync::Arc;
use tokio::signal;

use crate::commands::reply::report_failure;
use crate::config_store::ConfigStore;
use crate::like_api::{HttpLikeApi, LikeApi};
use crate::settings::Settings;
use crate::state::{BotState, BotStateKey};

// Import all command constants generated by the #[command] macro
use crate::commands::help::HELP_COMMAND;
use crate::commands::like::LIKE_COMMAND;
use crate::commands::setlikechannel::SETLIKECHANNEL_COMMAND;

// Command group declaration - includes all available text commands
#[group]
#[commands(like, setlikechannel, help)]
struct General;

// Event handler implementation
struct Handler;

#[async_trait]
impl EventHandler for Handler {
    async fn ready(&self, ctx: Context, ready: Ready) {
        log::info!("✅ Bot connected as {}! ({} guilds)", ready.user.name, ready.guilds.len());

        if let Err(e) = commands::slash::register_slash_commands(&ctx.http).await {
            log::error!("❌ Failed to register slash commands: {}", e);
        }
    }

    async fn interaction_create(&self, ctx: Context, interaction: Interaction) {
        if let Interaction::ApplicationCommand(command) = interaction {
            log::debug!(
                "Slash command '{}' from {} ({})",
                command.data.name,
                command.user.name,
                command.user.id
            );

            if let Err(e) = commands::slash::handle_slash_command(&ctx, &command).await {
                log::error!("❌ Slash command '{}' failed: {}", command.data.name, e);
                if let Err(e) = report_failure(&ctx, &command).await {
                    log::warn!("⚠️ Could not report the failure of '{}': {}", command.data.name, e);
                }
            }
        }
    }
}

#[tokio::main]
async fn main() {
    // Initialize logger - must be done before any logging calls
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_secs()
        .init();

    log::info!("🚀 Like bot starting up...");

    let settings = match Settings::load() {
        Ok(settings) => settings,
        Err(e) => {
            log::error!("❌ Invalid configuration: {}", e);
            log::error!("Set DISCORD_TOKEN, KEY and API_HOST in the environment or a .env file");
            return;
        }
    };
    log::info!("✅ Configuration loaded: {:?}", settings);

    let store = match ConfigStore::load(&settings.config_path) {
        Ok(store) => store,
        Err(e) => {
            log::error!("❌ Failed to initialize like channel config: {}", e);
            return;
        }
    };
    log::info!(
        "📂 Like channel allow-lists for {} server(s) loaded from {}",
        store.document().servers.len(),
        store.path().display()
    );

    // One client (and connection pool) for every like request
    let api: Arc<dyn LikeApi> = match HttpLikeApi::new(
        &settings.api_host,
        &settings.api_key,
        settings.request_timeout,
    ) {
        Ok(api) => Arc::new(api),
        Err(e) => {
            log::error!("❌ Failed to build like API client: {}", e);
            return;
        }
    };

    let state = Arc::new(BotState::new(store, api, settings.prefix.clone()));

    log::info!("🤖 Starting bot with prefix: '{}'", settings.prefix);
    let prefix = settings.prefix.clone();
    let framework = StandardFramework::new()
        .configure(|c| {
            c.prefix(&prefix)
            .case_insensitivity(true)
            .with_whitespace(true)
        })
        .after(|_ctx, msg, command_name, result| Box::pin(async move {
            if let Err(e) = result {
                log::error!("❌ Command '{}' failed for user {} ({}): {:?}",
                           command_name, msg.author.name, msg.author.id, e);
            }
        }))
        .on_dispatch_error(|ctx, msg, error, command_name| Box::pin(async move {
            match error {
                DispatchError::LackingPermissions(_) => {
                    log::info!("🔒 {} ({}) lacks permissions for '{}'", msg.author.name, msg.author.id, command_name);
                    let _ = msg
                        .reply(ctx, "❌ **Access Denied**\nYou need the Administrator permission to use this command.")
                        .await;
                }
                other => {
                    log::debug!("Dispatch error for '{}': {:?}", command_name, other);
                }
            }
        }))
        .group(&GENERAL_GROUP);

    // Configure bot intents
    let intents = GatewayIntents::non_privileged()
        | GatewayIntents::MESSAGE_CONTENT;

    let mut client = match Client::builder(&settings.discord_token, intents)
        .event_handler(Handler)
        .framework(framework)
        .await
    {
        Ok(client) => client,
        Err(e) => {
            log::error!("❌ Error creating Discord client: {:?}", e);
            return;
        }
    };

    {
        let mut data = client.data.write().await;
        data.insert::<BotStateKey>(state);
    }

    let shard_manager = client.shard_manager.clone();

    log::info!("💡 Press Ctrl+C to stop");
    tokio::select! {
        _ = signal::ctrl_c() => {
            log::info!("⏹️ Stopping bot gracefully...");
            shard_manager.lock().await.shutdown_all().await;
        }
        result = client.start() => {
            if let Err(why) = result {
                log::error!("❌ Client error: {:?}", why);
            }
        }
    }

    // Dropping the client drops the shared state and with it the HTTP client
    drop(client);
    log::info!("🔌 Like API client released");
    log::info!("✅ Bot stopped");
}
