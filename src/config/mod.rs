//! Configuration loaded from environment variables.

use std::env;
use std::str::FromStr;

use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{name} has an invalid value: {value:?}")]
    Invalid { name: &'static str, value: String },
}

/// Bot running mode
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BotMode {
    #[default]
    Polling,
    Webhook,
}

/// Storage backend
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StorageKind {
    #[default]
    Mongo,
    Memory,
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    // Telegram
    pub bot_token: String,
    pub bot_mode: BotMode,
    pub webhook_url: Option<String>,
    pub webhook_port: u16,
    pub webhook_secret: Option<String>,

    /// Bot username (without @). Fetched via getMe if not set.
    pub bot_username: Option<String>,

    /// Telegram ids with full access.
    pub owner_ids: Vec<i64>,

    // Storage
    pub storage: StorageKind,
    pub mongodb_uri: Option<String>,
    pub mongodb_database: String,

    // Game
    /// Telegram id of the game bot whose forwards carry profiles.
    pub game_bot_id: Option<i64>,
    /// Server-local time minus raid-grid time, in hours.
    pub raid_grid_offset_hours: i32,
    /// Server-local time minus UTC, in hours.
    pub server_utc_offset_hours: i32,
    /// Distances whose players get the dark-zone reminder.
    pub dark_zone_distances: Vec<i32>,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build the configuration from any variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |name: &str| lookup(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let bot_mode = match var("BOT_MODE").map(|m| m.to_lowercase()).as_deref() {
            None | Some("polling") => BotMode::Polling,
            Some("webhook") => BotMode::Webhook,
            Some(other) => return Err(invalid("BOT_MODE", other)),
        };

        let webhook_url = var("WEBHOOK_URL");
        if bot_mode == BotMode::Webhook && webhook_url.is_none() {
            return Err(ConfigError::Missing("WEBHOOK_URL"));
        }

        let storage = match var("STORAGE").map(|s| s.to_lowercase()).as_deref() {
            None | Some("mongo") => StorageKind::Mongo,
            Some("memory") => StorageKind::Memory,
            Some(other) => return Err(invalid("STORAGE", other)),
        };

        let mongodb_uri = var("MONGODB_URI");
        if storage == StorageKind::Mongo && mongodb_uri.is_none() {
            return Err(ConfigError::Missing("MONGODB_URI"));
        }

        Ok(Self {
            bot_token: var("BOT_TOKEN").ok_or(ConfigError::Missing("BOT_TOKEN"))?,
            bot_mode,
            webhook_url,
            webhook_port: parse_or("WEBHOOK_PORT", var("WEBHOOK_PORT"), 8080)?,
            webhook_secret: var("WEBHOOK_SECRET"),
            bot_username: var("BOT_USERNAME").map(|s| s.trim_start_matches('@').to_string()),
            owner_ids: parse_list("OWNER_IDS", var("OWNER_IDS"))?,
            storage,
            mongodb_uri,
            mongodb_database: var("MONGODB_DATABASE").unwrap_or_else(|| "wasteland".to_string()),
            game_bot_id: var("GAME_BOT_ID")
                .map(|v| parse("GAME_BOT_ID", &v))
                .transpose()?,
            raid_grid_offset_hours: parse_or("RAID_GRID_OFFSET_HOURS", var("RAID_GRID_OFFSET_HOURS"), 0)?,
            server_utc_offset_hours: parse_or(
                "SERVER_UTC_OFFSET_HOURS",
                var("SERVER_UTC_OFFSET_HOURS"),
                0,
            )?,
            dark_zone_distances: parse_list("DARK_ZONE_DISTANCES", var("DARK_ZONE_DISTANCES"))?,
        })
    }
}

fn invalid(name: &'static str, value: &str) -> ConfigError {
    ConfigError::Invalid {
        name,
        value: value.to_string(),
    }
}

fn parse<T: FromStr>(name: &'static str, value: &str) -> Result<T, ConfigError> {
    value.parse().map_err(|_| invalid(name, value))
}

fn parse_or<T: FromStr>(name: &'static str, value: Option<String>, default: T) -> Result<T, ConfigError> {
    value.map_or(Ok(default), |v| parse(name, &v))
}

/// Comma-separated list; empty items are ignored.
fn parse_list<T: FromStr>(name: &'static str, value: Option<String>) -> Result<Vec<T>, ConfigError> {
    value
        .as_deref()
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| parse(name, s))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> =
            vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        Config::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn minimal_memory_config() {
        let config = load(&[("BOT_TOKEN", "t"), ("STORAGE", "memory")]).unwrap();
        assert_eq!(config.bot_mode, BotMode::Polling);
        assert_eq!(config.storage, StorageKind::Memory);
        assert_eq!(config.webhook_port, 8080);
        assert!(config.owner_ids.is_empty());
        assert_eq!(config.game_bot_id, None);
        assert_eq!(config.mongodb_database, "wasteland");
    }

    #[test]
    fn parses_lists_and_offsets() {
        let config = load(&[
            ("BOT_TOKEN", "t"),
            ("MONGODB_URI", "mongodb://localhost"),
            ("OWNER_IDS", "1, 2,,3"),
            ("DARK_ZONE_DISTANCES", "24,32"),
            ("RAID_GRID_OFFSET_HOURS", "-1"),
            ("BOT_USERNAME", "@warden_bot"),
            ("GAME_BOT_ID", "430930191"),
        ])
        .unwrap();
        assert_eq!(config.owner_ids, vec![1, 2, 3]);
        assert_eq!(config.dark_zone_distances, vec![24, 32]);
        assert_eq!(config.raid_grid_offset_hours, -1);
        assert_eq!(config.bot_username.as_deref(), Some("warden_bot"));
        assert_eq!(config.game_bot_id, Some(430_930_191));
    }

    #[test]
    fn reports_missing_and_invalid() {
        assert_eq!(load(&[]).unwrap_err(), ConfigError::Missing("MONGODB_URI"));
        assert_eq!(
            load(&[("STORAGE", "memory")]).unwrap_err(),
            ConfigError::Missing("BOT_TOKEN")
        );
        assert_eq!(
            load(&[("BOT_TOKEN", "t"), ("STORAGE", "memory"), ("BOT_MODE", "webhook")]).unwrap_err(),
            ConfigError::Missing("WEBHOOK_URL")
        );
        assert!(matches!(
            load(&[("BOT_TOKEN", "t"), ("STORAGE", "memory"), ("OWNER_IDS", "1,x")]),
            Err(ConfigError::Invalid { name: "OWNER_IDS", .. })
        ));
    }
}
