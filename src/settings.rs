// settings.rs - Startup Configuration Module
// Reads the bot token, like API credentials and tunables from the environment,
// after loading a dotenv-style file from the first location that exists.
//
// Used by: main.rs (startup), commands/like.rs (API host and key via HttpLikeApi)

use std::env;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use log::{debug, info};
use thiserror::Error;

const TOKEN_PLACEHOLDER: &str = "YOUR_BOT_TOKEN_HERE";
const DEFAULT_PREFIX: &str = "!";
const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_CONFIG_FILE: &str = "like_channels.json";

// Searched in order, first hit wins
const ENV_FILE_PATHS: [&str; 5] = [
    ".env",
    "../.env",
    "botconfig.txt",
    "../botconfig.txt",
    "src/botconfig.txt",
];

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("{0} is not set")]
    Missing(&'static str),
    #[error("{0} is still set to the placeholder value")]
    Placeholder(&'static str),
    #[error("{key} must be a positive whole number of seconds, got '{value}'")]
    InvalidNumber { key: &'static str, value: String },
}

#[derive(Clone)]
pub struct Settings {
    pub discord_token: String,
    pub prefix: String,
    pub api_key: String,
    pub api_host: String,
    pub request_timeout: Duration,
    pub config_path: PathBuf,
}

// Secrets stay out of logs
impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("discord_token", &"<redacted>")
            .field("prefix", &self.prefix)
            .field("api_key", &"<redacted>")
            .field("api_host", &self.api_host)
            .field("request_timeout", &self.request_timeout)
            .field("config_path", &self.config_path)
            .finish()
    }
}

impl Settings {
    /// Load the first env file found, then read settings from the process environment
    pub fn load() -> Result<Self, SettingsError> {
        match load_env_file() {
            Some(path) => info!("📂 Environment file loaded from {}", path),
            None => debug!("No environment file found, using process environment only"),
        }
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build settings from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, SettingsError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let discord_token = required(&lookup, "DISCORD_TOKEN")?;
        if discord_token == TOKEN_PLACEHOLDER {
            return Err(SettingsError::Placeholder("DISCORD_TOKEN"));
        }

        let api_key = required(&lookup, "KEY")?;
        let api_host = required(&lookup, "API_HOST")?
            .trim_end_matches('/')
            .to_string();

        let prefix = optional(&lookup, "PREFIX").unwrap_or_else(|| DEFAULT_PREFIX.to_string());

        let request_timeout = match optional(&lookup, "LIKE_API_TIMEOUT") {
            Some(value) => {
                let secs = value
                    .parse::<u64>()
                    .ok()
                    .filter(|secs| *secs > 0)
                    .ok_or_else(|| SettingsError::InvalidNumber {
                        key: "LIKE_API_TIMEOUT",
                        value: value.clone(),
                    })?;
                Duration::from_secs(secs)
            }
            None => Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        };

        let config_path = optional(&lookup, "LIKE_CHANNELS_FILE")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));

        Ok(Settings {
            discord_token,
            prefix,
            api_key,
            api_host,
            request_timeout,
            config_path,
        })
    }
}

fn load_env_file() -> Option<&'static str> {
    ENV_FILE_PATHS
        .iter()
        .copied()
        .find(|path| dotenvy::from_filename(path).is_ok())
}

fn optional<F>(lookup: &F, key: &'static str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn required<F>(lookup: &F, key: &'static str) -> Result<String, SettingsError>
where
    F: Fn(&str) -> Option<String>,
{
    optional(lookup, key).ok_or(SettingsError::Missing(key))
}
