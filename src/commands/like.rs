// like.rs - Like Command Module
// This module implements the like command: it forwards a player UID and region
// to the external like API and renders the outcome as an embed.
//
// Key Features:
// - Channel allow-list check before anything else
// - Order-tolerant region/UID arguments
// - Exactly one outbound request per invocation, no retries
// - Distinct replies for not found (404), rate limited (429), other upstream
//   errors, timeouts and unexpected failures
//
// Used by: main.rs (command registration), commands/slash.rs

use serenity::{
    client::Context,
    framework::standard::{macros::command, Args, CommandResult},
    model::channel::Message,
};
use log::{debug, error, info};
use uuid::Uuid;

use crate::commands::reply::{
    send_to_channel, Reply, ReplyEmbed, COLOR_FAILURE, COLOR_LIMIT, COLOR_SUCCESS, COLOR_WARNING,
};
use crate::commands::Invocation;
use crate::config_store::ConfigStore;
use crate::like_api::{display_value, parse_like_response, region_code, LikeApi, LikeApiError, LikeResponse};
use crate::state::bot_state;

// ============================================================================
// ARGUMENT HANDLING
// ============================================================================

/// A validated like request, ready to be sent
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LikeRequest {
    pub uid: String,
    pub region: String,
    pub region_code: &'static str,
}

fn is_numeric(value: &str) -> bool {
    !value.is_empty() && value.chars().all(|c| c.is_ascii_digit())
}

/// Sort the two positional arguments into `(region, uid)`.
/// A lone numeric argument is the UID. When both are given and only the first
/// is numeric, they were supplied as `<uid> <region>` and get swapped.
pub fn normalize_args(first: Option<&str>, second: Option<&str>) -> (Option<String>, Option<String>) {
    let clean = |value: Option<&str>| {
        value
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    };

    match (clean(first), clean(second)) {
        (Some(only), None) if is_numeric(&only) => (None, Some(only)),
        (Some(a), Some(b)) if is_numeric(&a) && !is_numeric(&b) => (Some(b), Some(a)),
        (region, uid) => (region, uid),
    }
}

pub fn usage_message(prefix: &str) -> String {
    format!(
        "Please specify the region and UID.\nExample: `{}like me 12345678`",
        prefix
    )
}

/// Steps that need no network: channel permission and argument validation.
/// `Err` carries the reply that ends the invocation.
pub fn prepare_like(
    invocation: &Invocation,
    first: Option<&str>,
    second: Option<&str>,
    store: &ConfigStore,
) -> Result<LikeRequest, Reply> {
    if !store.is_channel_allowed(invocation.guild_id, invocation.channel_id) {
        return Err(
            Reply::text("🚫 This command is not available in this channel.").ephemeral(invocation.is_slash),
        );
    }

    match normalize_args(first, second) {
        (Some(region), Some(uid)) => {
            let code = region_code(&region);
            Ok(LikeRequest {
                uid,
                region,
                region_code: code,
            })
        }
        _ => Err(Reply::text(usage_message(&invocation.prefix)).ephemeral(invocation.is_slash)),
    }
}

// ============================================================================
// REQUEST AND RESPONSE CLASSIFICATION
// ============================================================================

/// Send the request and turn whatever comes back into a reply.
/// Every failure is handled here; nothing is retried.
pub async fn execute_like(invocation: &Invocation, request: &LikeRequest, api: &dyn LikeApi) -> Reply {
    let request_id = Uuid::new_v4();
    info!(
        "👍 Like request {}: user {} ({}) guild {:?} channel {} uid {} region {} -> {}",
        request_id,
        invocation.author_name,
        invocation.author_id,
        invocation.guild_id,
        invocation.channel_id,
        request.uid,
        request.region,
        request.region_code
    );

    let ephemeral = invocation.is_slash;

    let response = match api.fetch_likes(&request.uid, request.region_code).await {
        Ok(response) => response,
        Err(LikeApiError::Timeout) => {
            error!("⏱️ Like request {} timed out", request_id);
            return error_notice("Timeout", "The server did not respond in time.").ephemeral(ephemeral);
        }
        Err(e) => {
            error!("❌ Like request {} failed: {}", request_id, e);
            return error_notice("Error", "An unexpected error occurred.").ephemeral(ephemeral);
        }
    };

    debug!("Like request {} answered with HTTP {}", request_id, response.status);

    match response.status {
        404 => player_not_found(&request.uid).ephemeral(ephemeral),
        429 => api_limit_reached(),
        200 => match parse_like_response(&response.body) {
            Ok(data) => render_result(&data, request, invocation),
            Err(e) => {
                error!("❌ Like request {} returned an unreadable body: {}", request_id, e);
                error_notice("Error", "An unexpected error occurred.").ephemeral(ephemeral)
            }
        },
        status => {
            error!("[LIKE] API {} - {}", status, response.body);
            api_error(invocation).ephemeral(ephemeral)
        }
    }
}

// ============================================================================
// REPLIES
// ============================================================================

fn render_result(data: &LikeResponse, request: &LikeRequest, invocation: &Invocation) -> Reply {
    let embed = if data.is_success() {
        let player = data.player.clone().unwrap_or_default();
        let likes = data.likes.clone().unwrap_or_default();
        let default_region = request.region.to_uppercase();

        let description = format!(
            "┌─ ACCOUNT\n\
             │   ├─ NICKNAME : {}\n\
             │   ├─ UID      : {}\n\
             │   ├─ REGION   : {}\n\
             │   └─ RESULT\n\
             │       ├─ ADDED  : +{}\n\
             │       ├─ BEFORE : {}\n\
             │       └─ AFTER  : {}",
            display_value(player.nickname.as_ref(), "Unknown"),
            display_value(player.uid.as_ref(), "Unknown"),
            display_value(player.region.as_ref(), &default_region),
            display_value(likes.added_by_api.as_ref(), "0"),
            display_value(likes.before.as_ref(), "N/A"),
            display_value(likes.after.as_ref(), "N/A"),
        );

        ReplyEmbed::new(COLOR_SUCCESS).description(description)
    } else {
        ReplyEmbed::new(COLOR_FAILURE)
            .description("MAX LIKES\nThis UID has already received the maximum likes today.")
    };

    Reply::embed(
        embed
            .title("FREE FIRE LIKE")
            .footer(format!("Requested by {}", invocation.author_name))
            .with_timestamp(),
    )
    .ephemeral(invocation.is_slash)
}

fn player_not_found(uid: &str) -> Reply {
    Reply::embed(
        ReplyEmbed::new(COLOR_FAILURE)
            .title("Player Not Found")
            .description(format!("UID `{}` not found or inaccessible.", uid))
            .field("Tips", "• Check the UID\n• Try a different region", false),
    )
}

// The 429 body is never shown
fn api_limit_reached() -> Reply {
    Reply::embed(
        ReplyEmbed::new(COLOR_LIMIT)
            .title("Api Limit Reached")
            .description("Likes are temporarily disabled.")
            .field("Solution", "Please contact the developer.", false)
            .footer("Api key recharge required."),
    )
    .ephemeral(true)
}

fn api_error(invocation: &Invocation) -> Reply {
    Reply::embed(ReplyEmbed::new(COLOR_WARNING).description(format!(
        "{} Failed to process request, try again later.",
        invocation.author_mention()
    )))
}

fn error_notice(title: &str, description: &str) -> Reply {
    Reply::embed(ReplyEmbed::new(COLOR_FAILURE).title(title).description(description))
}

// ============================================================================
// TEXT COMMAND
// ============================================================================

#[command]
/// Main like command handler
/// Supports:
///   - <prefix>like <region> <uid>
///   - <prefix>like <uid> <region>
pub async fn like(ctx: &Context, msg: &Message, mut args: Args) -> CommandResult {
    let state = bot_state(ctx).await.ok_or("bot state is not initialized")?;
    let invocation = Invocation::from_message(msg, &state.prefix);

    let first = args.single::<String>().ok();
    let second = args.single::<String>().ok();

    let prepared = {
        let store = state.store.read().await;
        prepare_like(&invocation, first.as_deref(), second.as_deref(), &store)
    };

    let request = match prepared {
        Ok(request) => request,
        Err(reply) => {
            send_to_channel(ctx, msg, &reply).await?;
            return Ok(());
        }
    };

    let typing = ctx.http.start_typing(msg.channel_id.0)?;
    let reply = execute_like(&invocation, &request, state.api.as_ref()).await;
    typing.stop();

    send_to_channel(ctx, msg, &reply).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::like_api::UpstreamResponse;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use tempfile::TempDir;

    enum Canned {
        Response(u16, &'static str),
        Timeout,
        Transport,
    }

    /// In-memory like API: returns one canned answer and records every call
    struct StubApi {
        answer: Canned,
        calls: Mutex<Vec<(String, String)>>,
    }

    impl StubApi {
        fn new(answer: Canned) -> Self {
            StubApi {
                answer,
                calls: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> Vec<(String, String)> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl LikeApi for StubApi {
        async fn fetch_likes(&self, uid: &str, region_code: &str) -> Result<UpstreamResponse, LikeApiError> {
            self.calls
                .lock()
                .unwrap()
                .push((uid.to_string(), region_code.to_string()));
            match &self.answer {
                Canned::Response(status, body) => Ok(UpstreamResponse {
                    status: *status,
                    body: body.to_string(),
                }),
                Canned::Timeout => Err(LikeApiError::Timeout),
                Canned::Transport => Err(LikeApiError::Transport("connection refused".to_string())),
            }
        }
    }

    fn invocation(is_slash: bool) -> Invocation {
        Invocation {
            guild_id: Some(1),
            channel_id: 10,
            author_id: 42,
            author_name: "tester".to_string(),
            is_slash,
            prefix: if is_slash { "/".to_string() } else { "!".to_string() },
        }
    }

    fn empty_store(dir: &TempDir) -> ConfigStore {
        ConfigStore::load(dir.path().join("like_channels.json")).unwrap()
    }

    fn request(uid: &str, region: &str) -> LikeRequest {
        LikeRequest {
            uid: uid.to_string(),
            region: region.to_string(),
            region_code: region_code(region),
        }
    }

    async fn run(answer: Canned, is_slash: bool) -> (Reply, StubApi) {
        let api = StubApi::new(answer);
        let reply = execute_like(&invocation(is_slash), &request("12345678", "ind"), &api).await;
        (reply, api)
    }

    #[test]
    fn test_normalize_args() {
        assert_eq!(
            normalize_args(Some("12345678"), None),
            (None, Some("12345678".to_string()))
        );
        assert_eq!(
            normalize_args(Some("ind"), Some("12345678")),
            (Some("ind".to_string()), Some("12345678".to_string()))
        );
        assert_eq!(
            normalize_args(Some("12345678"), Some("br")),
            (Some("br".to_string()), Some("12345678".to_string()))
        );
        assert_eq!(normalize_args(Some("ind"), None), (Some("ind".to_string()), None));
        assert_eq!(normalize_args(Some("  "), None), (None, None));
        assert_eq!(normalize_args(None, None), (None, None));
    }

    #[test]
    fn test_single_numeric_argument_shows_usage() {
        let dir = TempDir::new().unwrap();
        let store = empty_store(&dir);

        let reply = prepare_like(&invocation(false), Some("12345678"), None, &store).unwrap_err();
        assert_eq!(reply.plain_text(), usage_message("!"));
        assert!(reply.plain_text().contains("Example: `!like me 12345678`"));
        assert!(!reply.ephemeral);

        let reply = prepare_like(&invocation(true), None, None, &store).unwrap_err();
        assert!(reply.plain_text().contains("`/like me 12345678`"));
        assert!(reply.ephemeral);
    }

    #[test]
    fn test_restricted_channel_rejected() {
        let dir = TempDir::new().unwrap();
        let mut store = empty_store(&dir);
        store.toggle_channel(1, 99);

        let reply = prepare_like(&invocation(true), Some("ind"), Some("12345678"), &store).unwrap_err();
        assert!(reply.plain_text().contains("not available in this channel"));
        assert!(reply.ephemeral);

        store.toggle_channel(1, 10);
        let request = prepare_like(&invocation(true), Some("ind"), Some("12345678"), &store).unwrap();
        assert_eq!(request.region_code, "ind");
    }

    #[test]
    fn test_direct_messages_always_allowed() {
        let dir = TempDir::new().unwrap();
        let mut store = empty_store(&dir);
        store.toggle_channel(1, 99);

        let mut dm = invocation(false);
        dm.guild_id = None;
        let request = prepare_like(&dm, Some("BR"), Some("555555"), &store).unwrap();
        assert_eq!(request, self::request("555555", "BR"));
    }

    #[test]
    fn test_region_resolved_case_insensitive() {
        let dir = TempDir::new().unwrap();
        let store = empty_store(&dir);

        let code = |region: &str| {
            prepare_like(&invocation(false), Some(region), Some("12345678"), &store)
                .unwrap()
                .region_code
        };
        assert_eq!(code("IND"), "ind");
        assert_eq!(code("br"), "nx");
        assert_eq!(code("unknownregion"), "ag");
    }

    #[tokio::test]
    async fn test_not_found_mentions_uid() {
        let (reply, api) = run(Canned::Response(404, "not here"), true).await;
        let text = reply.plain_text();
        assert!(text.contains("Player Not Found"));
        assert!(text.contains("12345678"));
        assert!(!text.contains("not here"));
        assert!(reply.ephemeral);
        assert_eq!(api.calls(), vec![("12345678".to_string(), "ind".to_string())]);
    }

    #[tokio::test]
    async fn test_rate_limited_is_static_and_private() {
        let (reply, _) = run(Canned::Response(429, "quota exceeded for key abc"), false).await;
        assert_eq!(reply, api_limit_reached());
        assert!(reply.ephemeral);
        assert!(!reply.plain_text().contains("quota"));
    }

    #[tokio::test]
    async fn test_server_error_hides_body() {
        let (reply, api) = run(Canned::Response(500, "stack trace here"), false).await;
        let text = reply.plain_text();
        assert!(text.contains("Failed to process request"));
        assert!(text.contains("<@42>"));
        assert!(!text.contains("stack trace"));
        assert!(!reply.ephemeral);
        assert_eq!(api.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_success_rendering() {
        let body = r#"{"status":1,"player":{"nickname":"Shadow","uid":"12345678","region":"IND"},"likes":{"added_by_api":100,"before":250,"after":350}}"#;
        let (reply, _) = run(Canned::Response(200, body), false).await;

        let embed = reply.embed.clone().unwrap();
        assert_eq!(embed.title.as_deref(), Some("FREE FIRE LIKE"));
        assert_eq!(embed.color, COLOR_SUCCESS);
        assert!(embed.timestamp);

        let description = embed.description.unwrap();
        assert!(description.contains("NICKNAME : Shadow"));
        assert!(description.contains("ADDED  : +100"));
        assert!(description.contains("BEFORE : 250"));
        assert!(description.contains("AFTER  : 350"));
    }

    #[tokio::test]
    async fn test_success_with_missing_fields_uses_fallbacks() {
        let (reply, _) = run(Canned::Response(200, r#"{"status":1}"#), false).await;
        let description = reply.embed.unwrap().description.unwrap();
        assert!(description.contains("NICKNAME : Unknown"));
        assert!(description.contains("REGION   : IND"));
        assert!(description.contains("ADDED  : +0"));
        assert!(description.contains("AFTER  : N/A"));
    }

    #[tokio::test]
    async fn test_max_likes_reached() {
        let (reply, _) = run(Canned::Response(200, r#"{"status":0}"#), true).await;
        let embed = reply.embed.clone().unwrap();
        assert_eq!(embed.color, COLOR_FAILURE);
        assert!(reply.plain_text().contains("MAX LIKES"));
        assert!(reply.ephemeral);
    }

    #[tokio::test]
    async fn test_unreadable_success_body() {
        let (reply, _) = run(Canned::Response(200, "<html>oops</html>"), false).await;
        assert!(reply.plain_text().contains("An unexpected error occurred."));
    }

    #[tokio::test]
    async fn test_timeout_distinguished_from_other_failures() {
        let (timeout, _) = run(Canned::Timeout, false).await;
        assert!(timeout.plain_text().contains("Timeout"));
        assert!(timeout.plain_text().contains("did not respond in time"));

        let (failure, _) = run(Canned::Transport, false).await;
        assert!(failure.plain_text().contains("An unexpected error occurred."));
        assert!(!failure.plain_text().contains("connection refused"));
    }
}
