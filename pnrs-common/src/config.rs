//! Configuration loading
//!
//! Every setting is resolved in priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. TOML config file
//! 4. Compiled default (fallback)
//!
//! A missing config file is not fatal; the service starts on defaults and
//! `RelayConfig::config_file` stays `None`.

use crate::db::collection::validate_name;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const ENV_CONFIG: &str = "PNRS_CONFIG";
pub const ENV_SOURCE_DB: &str = "PNRS_SOURCE_DB";
pub const ENV_SOURCE_COLLECTION: &str = "PNRS_SOURCE_COLLECTION";
pub const ENV_DESTINATION_DB: &str = "PNRS_DESTINATION_DB";
pub const ENV_DESTINATION_COLLECTION: &str = "PNRS_DESTINATION_COLLECTION";
pub const ENV_BIND: &str = "PNRS_BIND";

/// On-disk TOML configuration. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TomlConfig {
    pub source: StoreSection,
    pub destination: StoreSection,
    pub server: ServerSection,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreSection {
    /// Path of the SQLite database file
    pub database: Option<PathBuf>,
    /// Collection (table) name within that database
    pub collection: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSection {
    pub bind: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// tracing filter directive, e.g. "info" or "pnrs_relay=debug"
    pub level: Option<String>,
}

/// Values used when nothing else supplies a setting
#[derive(Debug, Clone)]
pub struct CompiledDefaults {
    pub source_db: PathBuf,
    pub source_collection: String,
    pub destination_db: PathBuf,
    pub destination_collection: String,
    pub bind: String,
    pub log_level: String,
}

impl CompiledDefaults {
    pub fn for_current_platform() -> Self {
        let data_dir = dirs::data_local_dir()
            .map(|d| d.join("pnrs"))
            .unwrap_or_else(|| PathBuf::from("./pnrs_data"));

        Self {
            source_db: data_dir.join("phone.db"),
            source_collection: "phones".to_string(),
            destination_db: data_dir.join("inserted-phones.db"),
            destination_collection: "numbers".to_string(),
            bind: "127.0.0.1:5790".to_string(),
            log_level: "info".to_string(),
        }
    }
}

/// Settings given on the command line
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub config: Option<PathBuf>,
    pub source_db: Option<PathBuf>,
    pub source_collection: Option<String>,
    pub destination_db: Option<PathBuf>,
    pub destination_collection: Option<String>,
    pub bind: Option<String>,
}

/// Location of one collection
#[derive(Debug, Clone, PartialEq)]
pub struct StoreConfig {
    pub database: PathBuf,
    pub collection: String,
}

/// Fully resolved service configuration
#[derive(Debug, Clone, PartialEq)]
pub struct RelayConfig {
    /// Config file that was actually read, if any
    pub config_file: Option<PathBuf>,
    pub source: StoreConfig,
    pub destination: StoreConfig,
    pub bind: String,
    pub log_level: String,
}

impl RelayConfig {
    /// Resolve every setting from CLI, environment, TOML file and defaults
    pub fn resolve(cli: &CliOverrides) -> Result<Self> {
        let config_path = cli
            .config
            .clone()
            .or_else(|| env_var(ENV_CONFIG).map(PathBuf::from))
            .or_else(default_config_path);

        let (toml_config, config_file) = match config_path {
            Some(path) if path.exists() => (load_toml_config(&path)?, Some(path)),
            _ => (TomlConfig::default(), None),
        };

        let mut config =
            Self::from_layers(cli, &toml_config, &CompiledDefaults::for_current_platform())?;
        config.config_file = config_file;
        Ok(config)
    }

    /// Merge the configuration layers, highest priority first
    pub fn from_layers(
        cli: &CliOverrides,
        file: &TomlConfig,
        defaults: &CompiledDefaults,
    ) -> Result<Self> {
        let source = StoreConfig {
            database: cli
                .source_db
                .clone()
                .or_else(|| env_var(ENV_SOURCE_DB).map(PathBuf::from))
                .or_else(|| file.source.database.clone())
                .unwrap_or_else(|| defaults.source_db.clone()),
            collection: cli
                .source_collection
                .clone()
                .or_else(|| env_var(ENV_SOURCE_COLLECTION))
                .or_else(|| file.source.collection.clone())
                .unwrap_or_else(|| defaults.source_collection.clone()),
        };

        let destination = StoreConfig {
            database: cli
                .destination_db
                .clone()
                .or_else(|| env_var(ENV_DESTINATION_DB).map(PathBuf::from))
                .or_else(|| file.destination.database.clone())
                .unwrap_or_else(|| defaults.destination_db.clone()),
            collection: cli
                .destination_collection
                .clone()
                .or_else(|| env_var(ENV_DESTINATION_COLLECTION))
                .or_else(|| file.destination.collection.clone())
                .unwrap_or_else(|| defaults.destination_collection.clone()),
        };

        let bind = cli
            .bind
            .clone()
            .or_else(|| env_var(ENV_BIND))
            .or_else(|| file.server.bind.clone())
            .unwrap_or_else(|| defaults.bind.clone());

        let log_level = file
            .logging
            .level
            .clone()
            .unwrap_or_else(|| defaults.log_level.clone());

        let config = Self {
            config_file: None,
            source,
            destination,
            bind,
            log_level,
        };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        validate_name(&self.source.collection)?;
        validate_name(&self.destination.collection)?;

        if self.source == self.destination {
            return Err(Error::Config(
                "Source and destination must not be the same collection".to_string(),
            ));
        }
        Ok(())
    }
}

/// Default config file location: `<config_dir>/pnrs/config.toml`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("pnrs").join("config.toml"))
}

/// Parse a TOML config file
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    let content = std::fs::read_to_string(path)?;
    toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Failed to parse {}: {}", path.display(), e)))
}

/// Non-empty environment variable value
fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}
