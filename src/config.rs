use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

/// Router settings. Read at setup, never mutated while events are flowing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    pub auto_register_global: bool,
    pub auto_register_guild: bool,
    pub clear_existing: bool,
    pub suggestion_timeout: Duration,
    /// Acknowledge every command with an ephemeral defer before it runs.
    pub force_defer_ephemeral: bool,
    /// Acknowledge every command with a public defer before it runs. Wins
    /// over `force_defer_ephemeral` when both are set.
    pub force_defer_non_ephemeral: bool,
    /// Error replies are only visible to the invoking user.
    pub ephemeral_error_messages: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            auto_register_global: true,
            auto_register_guild: true,
            clear_existing: true,
            suggestion_timeout: Duration::from_millis(2500),
            force_defer_ephemeral: false,
            force_defer_non_ephemeral: false,
            ephemeral_error_messages: true,
        }
    }
}

impl Settings {
    pub fn from_env() -> Result<Self> {
        let defaults = Settings::default();
        Ok(Settings {
            auto_register_global: env_flag("SLASH_AUTO_REGISTER_GLOBAL", defaults.auto_register_global)?,
            auto_register_guild: env_flag("SLASH_AUTO_REGISTER_GUILD", defaults.auto_register_guild)?,
            clear_existing: env_flag("SLASH_CLEAR_EXISTING", defaults.clear_existing)?,
            suggestion_timeout: match env::var("SLASH_SUGGESTION_TIMEOUT_MS") {
                Ok(raw) => Duration::from_millis(raw.trim().parse().map_err(|_| {
                    anyhow::anyhow!("SLASH_SUGGESTION_TIMEOUT_MS must be a number of milliseconds, got `{}`", raw)
                })?),
                Err(_) => defaults.suggestion_timeout,
            },
            force_defer_ephemeral: env_flag("SLASH_FORCE_DEFER_EPHEMERAL", defaults.force_defer_ephemeral)?,
            force_defer_non_ephemeral: env_flag(
                "SLASH_FORCE_DEFER_NON_EPHEMERAL",
                defaults.force_defer_non_ephemeral,
            )?,
            ephemeral_error_messages: env_flag(
                "SLASH_EPHEMERAL_ERROR_MESSAGES",
                defaults.ephemeral_error_messages,
            )?,
        })
    }

    /// Visibility of the forced defer, or `None` when commands reply directly.
    pub fn forced_defer(&self) -> Option<bool> {
        if self.force_defer_non_ephemeral {
            Some(false)
        } else if self.force_defer_ephemeral {
            Some(true)
        } else {
            None
        }
    }
}

fn env_flag(key: &str, default: bool) -> Result<bool> {
    match env::var(key) {
        Ok(raw) => match raw.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            _ => Err(anyhow::anyhow!("{} must be a boolean, got `{}`", key, raw)),
        },
        Err(_) => Ok(default),
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub discord_token: String,
    pub log_level: String,
    /// Guild that always gets a guild-scoped publish on startup, for fast iteration.
    pub dev_guild_id: Option<u64>,
    pub settings: Settings,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Ok(Config {
            discord_token: env::var("DISCORD_TOKEN")
                .map_err(|_| anyhow::anyhow!("DISCORD_TOKEN environment variable not set"))?,
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            dev_guild_id: match env::var("DEV_GUILD_ID") {
                Ok(raw) => Some(raw.trim().parse().map_err(|_| {
                    anyhow::anyhow!("DEV_GUILD_ID must be a guild id, got `{}`", raw)
                })?),
                Err(_) => None,
            },
            settings: Settings::from_env()?,
        })
    }
}
