//! Engine configuration
//!
//! TOML config file with environment-variable overrides for the secrets
//! (indexer API key, Telegram bot token). A missing config file is
//! replaced with a default one so a fresh checkout starts with something
//! editable.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    pub database: DatabaseConfig,
    pub chain: ChainConfig,
    pub scheduler: SchedulerConfig,
    #[serde(default)]
    pub telegram: TelegramConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainConfig {
    pub base_url: String,
    #[serde(default)]
    pub api_key: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    pub order_interval_secs: u64,
    pub confirm_interval_secs: u64,
    pub price_sample_interval_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct TelegramConfig {
    #[serde(default)]
    pub bot_token: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            database: DatabaseConfig {
                path: "swapbot.db".to_string(),
            },
            chain: ChainConfig {
                base_url: "https://cardano-mainnet.blockfrost.io/api/v0".to_string(),
                api_key: String::new(),
            },
            scheduler: SchedulerConfig {
                order_interval_secs: 30,
                confirm_interval_secs: 60,
                price_sample_interval_secs: 300,
            },
            telegram: TelegramConfig::default(),
        }
    }
}

impl EngineConfig {
    pub fn load(path: &str) -> Result<Self> {
        let mut config = if Path::new(path).exists() {
            let content = fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {}", path))?;
            toml::from_str(&content)
                .with_context(|| format!("Failed to parse config file: {}", path))?
        } else {
            let default_config = Self::default();
            default_config.save(path)?;
            default_config
        };

        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    pub fn save(&self, path: &str) -> Result<()> {
        let content =
            toml::to_string_pretty(self).with_context(|| "Failed to serialize config")?;
        fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path))?;
        Ok(())
    }

    /// Secrets and deployment-specific settings come from the environment
    /// when present, so the config file can stay committable.
    fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var("SWAPBOT_DATABASE_PATH") {
            self.database.path = v;
        }
        if let Ok(v) = std::env::var("SWAPBOT_CHAIN_BASE_URL") {
            self.chain.base_url = v;
        }
        if let Ok(v) = std::env::var("SWAPBOT_CHAIN_API_KEY") {
            self.chain.api_key = v;
        }
        if let Ok(v) = std::env::var("SWAPBOT_TELEGRAM_BOT_TOKEN") {
            self.telegram.bot_token = v;
        }
    }

    fn validate(&self) -> Result<()> {
        if self.chain.base_url.is_empty() {
            return Err(anyhow::anyhow!("chain.base_url is required in config"));
        }
        if self.scheduler.order_interval_secs == 0 {
            return Err(anyhow::anyhow!(
                "scheduler.order_interval_secs must be greater than zero"
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_creates_default() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let path_str = path.to_str().unwrap();

        let config = EngineConfig::load(path_str).unwrap();
        assert_eq!(config.database.path, "swapbot.db");
        assert!(path.exists());

        // Second load reads the file it just wrote
        let reloaded = EngineConfig::load(path_str).unwrap();
        assert_eq!(reloaded.scheduler.order_interval_secs, 30);
    }

    #[test]
    fn parses_partial_telegram_section() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            r#"
[database]
path = "orders.db"

[chain]
base_url = "https://indexer.example.com"
api_key = "k1"

[scheduler]
order_interval_secs = 10
confirm_interval_secs = 20
price_sample_interval_secs = 60
"#,
        )
        .unwrap();

        let config = EngineConfig::load(path.to_str().unwrap()).unwrap();
        assert_eq!(config.database.path, "orders.db");
        assert_eq!(config.chain.api_key, "k1");
        assert!(config.telegram.bot_token.is_empty());
    }

    #[test]
    fn zero_order_interval_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            r#"
[database]
path = "orders.db"

[chain]
base_url = "https://indexer.example.com"

[scheduler]
order_interval_secs = 0
confirm_interval_secs = 20
price_sample_interval_secs = 60
"#,
        )
        .unwrap();

        assert!(EngineConfig::load(path.to_str().unwrap()).is_err());
    }
}
