//! Configuration file support for Gymlog.
//!
//! Configuration is loaded from `$XDG_CONFIG_HOME/gymlog/config.toml`.
//! Every section is optional; missing values fall back to defaults.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application configuration
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub data: DataConfig,

    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub store: StoreConfig,

    #[serde(default)]
    pub auth: AuthConfig,

    #[serde(default)]
    pub profile: ProfileConfig,
}

/// Data storage configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DataConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

/// HTTP listener configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Which record store backs the log service
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StoreBackend {
    Jsonl,
    Memory,
}

/// Record store configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default = "default_backend")]
    pub backend: StoreBackend,

    #[serde(default = "default_store_file")]
    pub file_name: String,

    /// Seconds between reconnect attempts while the store is unreachable
    #[serde(default = "default_connect_retry_secs")]
    pub connect_retry_secs: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            file_name: default_store_file(),
            connect_retry_secs: default_connect_retry_secs(),
        }
    }
}

/// Bearer credential configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AuthConfig {
    #[serde(default = "default_token_secret")]
    pub token_secret: String,

    #[serde(default = "default_token_ttl_hours")]
    pub token_ttl_hours: i64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            token_secret: default_token_secret(),
            token_ttl_hours: default_token_ttl_hours(),
        }
    }
}

/// Local account used by the CLI
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ProfileConfig {
    #[serde(default = "default_account")]
    pub account: String,
}

impl Default for ProfileConfig {
    fn default() -> Self {
        Self {
            account: default_account(),
        }
    }
}

// Default value functions
fn default_data_dir() -> PathBuf {
    let base = dirs::data_local_dir()
        .or_else(|| dirs::home_dir().map(|home| home.join(".local/share")))
        .unwrap_or_else(|| PathBuf::from("."));
    base.join("gymlog")
}

fn default_host() -> String {
    "127.0.0.1".into()
}

fn default_port() -> u16 {
    5000
}

fn default_backend() -> StoreBackend {
    StoreBackend::Jsonl
}

fn default_store_file() -> String {
    "workout_logs.jsonl".into()
}

fn default_connect_retry_secs() -> u64 {
    5
}

fn default_token_secret() -> String {
    "change-me-before-deploying".into()
}

fn default_token_ttl_hours() -> i64 {
    24 * 7
}

fn default_account() -> String {
    "local".into()
}

impl Config {
    /// Load configuration from the standard config path
    pub fn load() -> Result<Self> {
        let config_path = Self::default_config_path();
        let mut config = if config_path.exists() {
            Self::load_from(&config_path)?
        } else {
            tracing::info!(
                "No config file found at {:?}, using defaults",
                config_path
            );
            Self::default()
        };
        config.apply_env()?;
        Ok(config)
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        tracing::info!("Loaded config from {:?}", path);
        Ok(config)
    }

    /// Apply `GYMLOG_*` environment overrides on top of file values
    pub fn apply_env(&mut self) -> Result<()> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(dir) = lookup("GYMLOG_DATA_DIR") {
            self.data.data_dir = PathBuf::from(dir);
        }
        if let Some(port) = lookup("GYMLOG_PORT") {
            self.server.port = port
                .parse()
                .map_err(|e| Error::Config(format!("GYMLOG_PORT={}: {}", port, e)))?;
        }
        if let Some(secret) = lookup("GYMLOG_TOKEN_SECRET") {
            self.auth.token_secret = secret;
        }
        Ok(())
    }

    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        let base = dirs::config_dir()
            .or_else(|| dirs::home_dir().map(|home| home.join(".config")))
            .unwrap_or_else(|| PathBuf::from("."));
        base.join("gymlog").join("config.toml")
    }

    /// Path of the JSONL log store inside the data directory
    pub fn store_path(&self) -> PathBuf {
        self.data.data_dir.join(&self.store.file_name)
    }

    /// Save the current configuration to the default path
    pub fn save(&self) -> Result<()> {
        let config_path = Self::default_config_path();
        self.save_to(&config_path)
    }

    /// Save the current configuration to a specific path
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, contents)?;
        tracing::info!("Saved config to {:?}", path);
        Ok(())
    }
}
