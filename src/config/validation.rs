use super::models::Config;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Invalid remote URL scheme in '{url}', expected 'http://' or 'https://'")]
    InvalidRemoteScheme { url: String },

    #[error("Table name must not be empty: tables.{field}")]
    EmptyTableName { field: String },

    #[error("Income and expense sources must be different tables, both are '{table}'")]
    DuplicateSourceTable { table: String },

    #[error("Timeout must be positive: remote.{field}")]
    ZeroTimeout { field: String },

    #[error("remote.max_retries must be at least 1")]
    ZeroRetries,
}

/// Validate the entire configuration
pub fn validate(config: &Config) -> Result<(), ValidationError> {
    validate_remote(config)?;
    validate_tables(config)?;
    Ok(())
}

fn validate_remote(config: &Config) -> Result<(), ValidationError> {
    let url = config.remote.url.trim();
    if !(url.starts_with("http://") || url.starts_with("https://")) {
        return Err(ValidationError::InvalidRemoteScheme {
            url: config.remote.url.clone(),
        });
    }

    if config.remote.request_timeout.is_zero() {
        return Err(ValidationError::ZeroTimeout {
            field: "request_timeout".to_string(),
        });
    }

    if config.remote.connect_timeout.is_zero() {
        return Err(ValidationError::ZeroTimeout {
            field: "connect_timeout".to_string(),
        });
    }

    if config.remote.max_retries == 0 {
        return Err(ValidationError::ZeroRetries);
    }

    Ok(())
}

fn validate_tables(config: &Config) -> Result<(), ValidationError> {
    let tables = &config.tables;

    for (field, name) in [
        ("income", &tables.income),
        ("expense", &tables.expense),
        ("profiles", &tables.profiles),
    ] {
        if name.trim().is_empty() {
            return Err(ValidationError::EmptyTableName {
                field: field.to_string(),
            });
        }
    }

    if tables.income == tables.expense {
        return Err(ValidationError::DuplicateSourceTable {
            table: tables.income.clone(),
        });
    }

    Ok(())
}
