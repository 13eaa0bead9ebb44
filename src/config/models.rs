use crate::humanize::HumanDuration;
use serde::{Deserialize, Serialize};

/// Top-level configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub remote: RemoteConfig,
    #[serde(default)]
    pub tables: TableConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Remote (PostgREST) endpoint configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RemoteConfig {
    /// Project base URL; `/rest/v1` and `/auth/v1` are appended
    #[serde(default = "default_url")]
    pub url: String,
    #[serde(default = "default_request_timeout")]
    pub request_timeout: HumanDuration,
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout: HumanDuration,
    /// Attempts for idempotent reads; writes are sent once
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// Project API key (loaded from environment, not from config file)
    #[serde(skip)]
    pub api_key: Option<String>,
    /// Session access token (loaded from environment, not from config file)
    #[serde(skip)]
    pub access_token: Option<String>,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            url: default_url(),
            request_timeout: default_request_timeout(),
            connect_timeout: default_connect_timeout(),
            max_retries: default_max_retries(),
            user_agent: default_user_agent(),
            api_key: None,
            access_token: None,
        }
    }
}

fn default_url() -> String {
    "http://localhost:54321".to_string()
}

fn default_request_timeout() -> HumanDuration {
    HumanDuration::from_secs(30)
}

fn default_connect_timeout() -> HumanDuration {
    HumanDuration::from_secs(10)
}

fn default_max_retries() -> u32 {
    3
}

fn default_user_agent() -> String {
    format!("cashbook/{}", env!("CARGO_PKG_VERSION"))
}

/// Names of the backing tables
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TableConfig {
    #[serde(default = "default_income_table")]
    pub income: String,
    #[serde(default = "default_expense_table")]
    pub expense: String,
    #[serde(default = "default_profiles_table")]
    pub profiles: String,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            income: default_income_table(),
            expense: default_expense_table(),
            profiles: default_profiles_table(),
        }
    }
}

fn default_income_table() -> String {
    "income_transaction".to_string()
}

fn default_expense_table() -> String {
    "expense_transaction".to_string()
}

fn default_profiles_table() -> String {
    "profiles".to_string()
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// `tracing_subscriber::EnvFilter` directive; `RUST_LOG` wins when set
    #[serde(default = "default_log_filter")]
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: default_log_filter(),
        }
    }
}

fn default_log_filter() -> String {
    "info".to_string()
}
