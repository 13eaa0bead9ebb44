use thiserror::Error;

use crate::remote::RemoteError;

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("authentication required: {0}")]
    Authentication(String),

    #[error("profile {user_id} is missing a branch assignment")]
    Authorization { user_id: String },

    #[error("ledger entry not found: {0}")]
    NotFound(String),

    #[error(transparent)]
    Remote(#[from] RemoteError),
}

pub type Result<T> = std::result::Result<T, LedgerError>;
