//! Configuration management for cashbook
//!
//! This module provides a layered configuration system that loads settings from:
//! 1. Default values (embedded in structs)
//! 2. TOML configuration file
//! 3. Environment variables (highest priority)
//!
//! # Usage
//!
//! ```no_run
//! use cashbook::config::Config;
//!
//! let config = Config::load().expect("Failed to load configuration");
//! println!("Remote endpoint: {}", config.remote.url);
//! ```
//!
//! # Environment Variables
//!
//! Configuration can be overridden using environment variables with the pattern:
//! `CASHBOOK__<section>__<key>`
//!
//! Examples:
//! - `CASHBOOK__REMOTE__URL=https://project.supabase.co`
//! - `CASHBOOK__REMOTE__REQUEST_TIMEOUT=10s`
//! - `CASHBOOK__TABLES__INCOME=income_transaction`
//!
//! Secrets are only read from the environment: `CASHBOOK_API_KEY` (or
//! `SUPABASE_ANON_KEY`) and `CASHBOOK_ACCESS_TOKEN` (or `SUPABASE_ACCESS_TOKEN`).
//!
//! # Configuration File
//!
//! By default, the configuration is loaded from `config/cashbook.toml`.
//! This can be overridden using the `CASHBOOK_CONFIG` environment variable.

mod models;
mod sources;
mod validation;

pub use crate::humanize::HumanDuration;
pub use models::{Config, LoggingConfig, RemoteConfig, TableConfig};
pub use validation::ValidationError;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Configuration validation failed: {0}")]
    ValidationError(#[from] ValidationError),

    #[error("Failed to render configuration: {0}")]
    RenderError(#[from] toml::ser::Error),
}

impl Config {
    /// Load configuration from all sources (file + environment)
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration file is malformed or validation
    /// fails.
    pub fn load() -> Result<Self, ConfigError> {
        let config = sources::load()?;
        validation::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a specific path
    ///
    /// Useful for testing with custom configuration files. Secrets are not
    /// read from the environment.
    pub fn load_from_path(path: std::path::PathBuf) -> Result<Self, ConfigError> {
        let config = sources::load_from_sources(path)?;
        validation::validate(&config)?;
        Ok(config)
    }

    /// Effective configuration as TOML, secrets omitted
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }
}
