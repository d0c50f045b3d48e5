// like_api.rs - External Like API Client
// Thin client over the third-party like endpoint: one GET per request,
// status and raw body handed back to the caller for classification.
//
// Key Features:
// - `LikeApi` trait so the like command can run against a stub in tests
// - One shared reqwest client (connection pool) for the life of the bot
// - Timeouts reported separately from other transport failures
// - Lenient decoding of the success body (all fields optional)
//
// Used by: main.rs (construction), commands/like.rs

use async_trait::async_trait;
use log::debug;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

// ============================================================================
// TYPES
// ============================================================================

#[derive(Debug, Error)]
pub enum LikeApiError {
    #[error("the like API did not respond in time")]
    Timeout,
    #[error("like API request failed: {0}")]
    Transport(String),
    #[error("like API returned an unreadable body: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for LikeApiError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            LikeApiError::Timeout
        } else {
            // Strip the URL so the API key never ends up in a log line
            LikeApiError::Transport(e.without_url().to_string())
        }
    }
}

/// Raw upstream answer: HTTP status plus the unparsed body
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamResponse {
    pub status: u16,
    pub body: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PlayerInfo {
    #[serde(default)]
    pub nickname: Option<Value>,
    #[serde(default)]
    pub uid: Option<Value>,
    #[serde(default)]
    pub region: Option<Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LikeCounts {
    #[serde(default)]
    pub added_by_api: Option<Value>,
    #[serde(default)]
    pub before: Option<Value>,
    #[serde(default)]
    pub after: Option<Value>,
}

/// Body of a 200 response. `status` of 1 (or `true`) means the likes were sent.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LikeResponse {
    #[serde(default)]
    pub status: Option<Value>,
    #[serde(default)]
    pub player: Option<PlayerInfo>,
    #[serde(default)]
    pub likes: Option<LikeCounts>,
}

impl LikeResponse {
    pub fn is_success(&self) -> bool {
        match &self.status {
            Some(Value::Number(n)) => n.as_f64() == Some(1.0),
            Some(Value::Bool(sent)) => *sent,
            _ => false,
        }
    }
}

/// Decode a success body; anything that is not a JSON object is an error
pub fn parse_like_response(body: &str) -> Result<LikeResponse, LikeApiError> {
    let value: Value = serde_json::from_str(body).map_err(|e| LikeApiError::Decode(e.to_string()))?;
    if !value.is_object() {
        return Err(LikeApiError::Decode("expected a JSON object".to_string()));
    }
    serde_json::from_value(value).map_err(|e| LikeApiError::Decode(e.to_string()))
}

/// Render a loosely typed JSON value for display: strings without quotes,
/// everything else in its JSON form
pub fn display_value(value: Option<&Value>, fallback: &str) -> String {
    match value {
        None | Some(Value::Null) => fallback.to_string(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

/// Map a user-supplied region to the server code the API expects
pub fn region_code(region: &str) -> &'static str {
    match region.to_lowercase().as_str() {
        "ind" => "ind",
        "br" | "us" | "sac" | "na" => "nx",
        _ => "ag",
    }
}

// ============================================================================
// CLIENT
// ============================================================================

#[async_trait]
pub trait LikeApi: Send + Sync {
    /// Issue exactly one request for `uid` on the given region code
    async fn fetch_likes(&self, uid: &str, region_code: &str) -> Result<UpstreamResponse, LikeApiError>;
}

pub struct HttpLikeApi {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl HttpLikeApi {
    pub fn new(base_url: &str, api_key: &str, timeout: Duration) -> Result<Self, LikeApiError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(HttpLikeApi {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/like", self.base_url)
    }
}

#[async_trait]
impl LikeApi for HttpLikeApi {
    async fn fetch_likes(&self, uid: &str, region_code: &str) -> Result<UpstreamResponse, LikeApiError> {
        debug!("GET {}?uid={}&region={}&key=<redacted>", self.endpoint(), uid, region_code);

        let response = self
            .client
            .get(self.endpoint())
            .query(&[("uid", uid), ("region", region_code), ("key", self.api_key.as_str())])
            .send()
            .await?;

        let status = response.status().as_u16();
        let body = response.text().await?;

        Ok(UpstreamResponse { status, body })
    }
}
