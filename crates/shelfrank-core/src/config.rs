//! Configuration for the Shelfrank ranking engine.
//!
//! Settings are layered from hardcoded defaults, optional config files, and
//! `SHELFRANK_*` environment variable overrides, then validated before use.

use std::path::Path;

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};

/// Root configuration structure.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct ShelfrankConfig {
    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub cache: CacheConfig,
}

impl ShelfrankConfig {
    /// Load configuration from multiple sources with precedence:
    /// 1. Environment variables (highest priority)
    /// 2. Config file specified by SHELFRANK_CONFIG env var
    /// 3. ./config/shelfrank.yaml
    /// 4. /etc/shelfrank/shelfrank.yaml
    /// 5. Hardcoded defaults (lowest priority)
    pub fn load() -> Result<Self, ConfigError> {
        let mut builder = Self::set_defaults(Config::builder())?;

        if let Ok(config_path) = std::env::var("SHELFRANK_CONFIG") {
            builder = builder.add_source(File::with_name(&config_path).required(false));
        }

        builder = builder
            .add_source(File::with_name("./config/shelfrank").required(false))
            .add_source(File::with_name("/etc/shelfrank/shelfrank").required(false));

        // Example override: SHELFRANK_STORAGE__MAX_CONNECTIONS=16
        builder = builder.add_source(
            Environment::with_prefix("SHELFRANK")
                .separator("__")
                .try_parsing(true),
        );

        let config: ShelfrankConfig = builder.build()?.try_deserialize()?;
        config.validate()?;

        Ok(config)
    }

    fn set_defaults(
        builder: config::ConfigBuilder<config::builder::DefaultState>,
    ) -> Result<config::ConfigBuilder<config::builder::DefaultState>, ConfigError> {
        builder
            .set_default("storage.database_url", "sqlite://shelfrank.db")?
            .set_default("storage.max_connections", 8)?
            .set_default("cache.max_entries", 10_000)
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.storage.database_url.is_empty() {
            return Err(ConfigError::Message(
                "storage.database_url must not be empty".to_string(),
            ));
        }

        if self.storage.max_connections == 0 {
            return Err(ConfigError::Message(
                "storage.max_connections must be > 0".to_string(),
            ));
        }

        if self.cache.max_entries == 0 {
            return Err(ConfigError::Message(
                "cache.max_entries must be > 0".to_string(),
            ));
        }

        Ok(())
    }

    /// Load configuration from a specific file path.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let config = Config::builder()
            .add_source(File::from(path.as_ref()))
            .build()?
            .try_deserialize()?;

        Ok(config)
    }
}

/// SQLite storage configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    /// Connection URL, e.g. `sqlite://shelfrank.db`.
    pub database_url: String,

    /// Maximum pooled connections.
    pub max_connections: u32,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_url: "sqlite://shelfrank.db".to_string(),
            max_connections: 8,
        }
    }
}

/// Aggregate snapshot cache configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CacheConfig {
    /// Maximum number of per-book snapshots held at once. Entries never
    /// expire by age; they leave only through eviction or capacity pressure.
    pub max_entries: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_entries: 10_000,
        }
    }
}
