//! Bot configuration.

use condotta_error::{ConfigError, CondottaResult};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Configuration for the bot process.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BotConfig {
    /// Economy tuning.
    #[serde(default)]
    pub economy: EconomyConfig,
    /// Liveness endpoint settings.
    #[serde(default)]
    pub api: ApiConfig,
}

impl BotConfig {
    /// Load configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> CondottaResult<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::new(format!("Failed to read config file: {e}")))?;
        toml::from_str(&content)
            .map_err(|e| ConfigError::new(format!("Failed to parse config: {e}")).into())
    }
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            economy: EconomyConfig::default(),
            api: ApiConfig::default(),
        }
    }
}

/// Economy tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EconomyConfig {
    /// Coins required to found a faction.
    #[serde(default = "default_create_cost")]
    pub create_cost: i64,
    /// Per-user cooldown between message awards, in seconds.
    #[serde(default = "default_award_cooldown_secs")]
    pub award_cooldown_secs: u64,
}

impl Default for EconomyConfig {
    fn default() -> Self {
        Self {
            create_cost: default_create_cost(),
            award_cooldown_secs: default_award_cooldown_secs(),
        }
    }
}

/// Liveness endpoint settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Port the liveness endpoint listens on.
    #[serde(default = "default_api_port")]
    pub port: u16,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            port: default_api_port(),
        }
    }
}

fn default_create_cost() -> i64 {
    condotta_core::DEFAULT_CREATE_COST
}

fn default_award_cooldown_secs() -> u64 {
    10
}

fn default_api_port() -> u16 {
    8080
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_fill_missing_sections() {
        let config: BotConfig = toml::from_str("").unwrap();
        assert_eq!(config.economy.create_cost, 1000);
        assert_eq!(config.economy.award_cooldown_secs, 10);
        assert_eq!(config.api.port, 8080);
    }

    #[test]
    fn partial_config_overrides_only_named_fields() {
        let config: BotConfig = toml::from_str("[economy]\ncreate_cost = 500\n").unwrap();
        assert_eq!(config.economy.create_cost, 500);
        assert_eq!(config.economy.award_cooldown_secs, 10);
    }
}
