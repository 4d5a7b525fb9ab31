//! Configuration management
//!
//! Settings come from an optional TOML file. Command-line flags and
//! environment variables are applied on top by the binary.

mod defaults;

pub use defaults::*;

use crate::error::{Error, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub database: DatabaseConfig,

    #[serde(default)]
    pub explorer: ExplorerConfig,

    #[serde(default)]
    pub feeds: FeedConfig,
}

/// Connection options for the backing store
#[derive(Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Directory a relative `database` path is resolved against
    #[serde(default)]
    pub host: Option<String>,

    /// Database file
    #[serde(default = "default_database")]
    pub database: String,

    /// Accepted for compatibility; SQLite has no authentication
    #[serde(default)]
    pub user: Option<String>,

    /// Accepted for compatibility; SQLite has no authentication
    #[serde(default)]
    pub password: Option<String>,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            host: None,
            database: default_database(),
            user: None,
            password: None,
        }
    }
}

impl std::fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("host", &self.host)
            .field("database", &self.database)
            .field("user", &self.user)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .finish()
    }
}

impl DatabaseConfig {
    /// Resolve the database file path
    pub fn path(&self) -> PathBuf {
        let database = PathBuf::from(&self.database);
        match &self.host {
            Some(host) if database.is_relative() && !host.is_empty() => {
                Path::new(host).join(database)
            }
            _ => database,
        }
    }

    /// Log credentials that have no effect on an embedded database
    pub fn warn_unused_credentials(&self) {
        if self.user.is_some() || self.password.is_some() {
            warn!("Database user/password are ignored by the SQLite backend");
        }
    }
}

/// Explorer behaviour
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExplorerConfig {
    #[serde(default = "default_top_category_threshold")]
    pub top_category_threshold: u32,
}

impl Default for ExplorerConfig {
    fn default() -> Self {
        Self {
            top_category_threshold: default_top_category_threshold(),
        }
    }
}

/// Source feed file names, relative to the loader's input directory
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedConfig {
    #[serde(default = "default_business_feed")]
    pub business: String,

    #[serde(default = "default_review_feed")]
    pub review: String,

    #[serde(default = "default_user_feed")]
    pub user: String,

    #[serde(default = "default_checkin_feed")]
    pub checkin: String,

    #[serde(default = "default_zipcode_stats_feed")]
    pub zipcode_stats: String,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            business: default_business_feed(),
            review: default_review_feed(),
            user: default_user_feed(),
            checkin: default_checkin_feed(),
            zipcode_stats: default_zipcode_stats_feed(),
        }
    }
}

impl Config {
    /// Load configuration.
    ///
    /// An explicit path must exist. Without one, the per-user config file is
    /// used when present, otherwise built-in defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let path = match explicit {
            Some(path) => {
                if !path.exists() {
                    return Err(Error::Config(format!(
                        "Config file not found: {}",
                        path.display()
                    )));
                }
                path.to_path_buf()
            }
            None => match default_config_path() {
                Some(path) if path.exists() => path,
                _ => {
                    debug!("No config file found, using defaults");
                    return Ok(Self::default());
                }
            },
        };

        info!("Loading config from {}", path.display());
        let content = std::fs::read_to_string(&path)?;
        Self::from_toml(&content)
    }

    /// Parse configuration from TOML text
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.database.database.trim().is_empty() {
            return Err(Error::Config("database must not be empty".to_string()));
        }
        if self.explorer.top_category_threshold == 0 {
            return Err(Error::Config(
                "explorer.top_category_threshold must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Per-user config file location
pub fn default_config_path() -> Option<PathBuf> {
    ProjectDirs::from("", "", "yelp-explorer").map(|dirs| dirs.config_dir().join("config.toml"))
}
