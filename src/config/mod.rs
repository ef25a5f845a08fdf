//! Configuration management
//!
//! This module handles loading and parsing configuration for Quill.
//! Configuration can be loaded from:
//! - config.yml file
//! - Environment variables (override file settings)
//!
//! Missing optional values are filled with sensible defaults.

use serde::{Deserialize, Serialize};

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Database configuration
    #[serde(default)]
    pub database: DatabaseConfig,
    /// List pagination configuration
    #[serde(default)]
    pub pagination: PaginationConfig,
    /// Administrator account to seed on startup (optional)
    #[serde(default)]
    pub admin: Option<AdminSeedConfig>,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Database driver (sqlite or mysql)
    #[serde(default)]
    pub driver: DatabaseDriver,
    /// Database connection URL
    #[serde(default = "default_database_url")]
    pub url: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            driver: DatabaseDriver::default(),
            url: default_database_url(),
        }
    }
}

fn default_database_url() -> String {
    "data/quill.db".to_string()
}

/// Database driver type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseDriver {
    /// SQLite (default)
    #[default]
    Sqlite,
    /// MySQL
    Mysql,
}

/// Pagination configuration for list queries
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaginationConfig {
    /// Page size used when the caller gives none (or an unusable one)
    #[serde(default = "default_limit")]
    pub default_limit: u32,
    /// Optional cap on the page size. Unset means unbounded.
    #[serde(default)]
    pub max_limit: Option<u32>,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            default_limit: default_limit(),
            max_limit: None,
        }
    }
}

fn default_limit() -> u32 {
    10
}

/// Administrator account created by the maintenance binary
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminSeedConfig {
    /// Display name
    #[serde(default = "default_admin_name")]
    pub name: String,
    /// Login email (unique)
    pub email: String,
}

fn default_admin_name() -> String {
    "admin".to_string()
}

/// Error type for configuration parsing
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    FileRead {
        path: String,
        source: std::io::Error,
    },
    #[error("Failed to parse config file '{path}': {message}")]
    ParseError {
        path: String,
        message: String,
    },
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

impl Config {
    /// Load configuration from file
    ///
    /// If the file doesn't exist, returns default configuration.
    /// If the file exists but is invalid YAML, returns an error with details.
    pub fn load(path: &std::path::Path) -> anyhow::Result<Self> {
        let config = Self::read_file(path)?;
        config.validate()?;
        Ok(config)
    }

    fn read_file(path: &std::path::Path) -> anyhow::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
            path: path.display().to_string(),
            source: e,
        })?;

        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        let config: Config = serde_yaml::from_str(&content).map_err(|e| {
            ConfigError::ParseError {
                path: path.display().to_string(),
                message: format_yaml_error(&e),
            }
        })?;

        Ok(config)
    }

    /// Load configuration from file with environment variable overrides
    ///
    /// Environment variables follow the pattern:
    /// - QUILL_DATABASE_DRIVER
    /// - QUILL_DATABASE_URL
    /// - QUILL_PAGINATION_DEFAULT_LIMIT
    /// - QUILL_PAGINATION_MAX_LIMIT
    /// - QUILL_ADMIN_NAME
    /// - QUILL_ADMIN_EMAIL
    ///
    /// Validation runs once, after the overrides are applied.
    pub fn load_with_env(path: &std::path::Path) -> anyhow::Result<Self> {
        let mut config = Self::read_file(path)?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Reject values no caller could work with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.database.url.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "database.url must not be empty".to_string(),
            ));
        }
        if self.pagination.default_limit == 0 {
            return Err(ConfigError::ValidationError(
                "pagination.default_limit must be positive".to_string(),
            ));
        }
        if let Some(max) = self.pagination.max_limit {
            if max < self.pagination.default_limit {
                return Err(ConfigError::ValidationError(format!(
                    "pagination.max_limit ({}) is below default_limit ({})",
                    max, self.pagination.default_limit
                )));
            }
        }
        if let Some(admin) = &self.admin {
            if !admin.email.contains('@') {
                return Err(ConfigError::ValidationError(format!(
                    "admin.email is not an email address: {}",
                    admin.email
                )));
            }
        }
        Ok(())
    }

    /// Apply environment variable overrides to the configuration
    fn apply_env_overrides(&mut self) {
        if let Ok(driver) = std::env::var("QUILL_DATABASE_DRIVER") {
            match driver.to_lowercase().as_str() {
                "sqlite" => self.database.driver = DatabaseDriver::Sqlite,
                "mysql" => self.database.driver = DatabaseDriver::Mysql,
                _ => {} // Ignore invalid values
            }
        }
        if let Ok(url) = std::env::var("QUILL_DATABASE_URL") {
            self.database.url = url;
        }

        if let Ok(limit) = std::env::var("QUILL_PAGINATION_DEFAULT_LIMIT") {
            if let Ok(limit) = limit.parse::<u32>() {
                self.pagination.default_limit = limit;
            }
        }
        if let Ok(max) = std::env::var("QUILL_PAGINATION_MAX_LIMIT") {
            if let Ok(max) = max.parse::<u32>() {
                self.pagination.max_limit = Some(max);
            }
        }

        let admin_email = std::env::var("QUILL_ADMIN_EMAIL").ok();
        let admin_name = std::env::var("QUILL_ADMIN_NAME").ok();
        match (&mut self.admin, admin_email) {
            (Some(admin), email) => {
                if let Some(email) = email {
                    admin.email = email;
                }
                if let Some(name) = admin_name {
                    admin.name = name;
                }
            }
            (None, Some(email)) => {
                self.admin = Some(AdminSeedConfig {
                    name: admin_name.unwrap_or_else(default_admin_name),
                    email,
                });
            }
            (None, None) => {}
        }
    }
}

/// Format YAML parsing error with location and context
fn format_yaml_error(e: &serde_yaml::Error) -> String {
    if let Some(location) = e.location() {
        format!(
            "at line {}, column {}: {}",
            location.line(),
            location.column(),
            e
        )
    } else {
        e.to_string()
    }
}

// Shared mutex for config tests that modify environment variables.
#[cfg(test)]
static CONFIG_ENV_MUTEX: std::sync::Mutex<()> = std::sync::Mutex::new(());
