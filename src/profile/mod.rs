//! Principal and branch resolution
//!
//! Every ledger operation resolves the acting principal's branch afresh
//! through a [`ProfileResolver`]; nothing is cached between calls, so a branch
//! reassignment applies to the very next operation.
//!
//! The resolver composes two collaborators:
//!
//! - [`SessionProvider`] - who is signed in (if anyone)
//! - [`ProfileDirectory`] - that user's profile row
//!
//! [`fixed`] has in-memory implementations of both.

pub mod fixed;

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::ledger::{LedgerError, Result};
use crate::remote::{ProfileRow, RemoteError};

/// Resolved scope of the acting principal
///
/// Passed explicitly into payload builders instead of being read from
/// ambient session state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub user_id: String,
    pub branch_id: i64,
}

/// Source of the currently signed-in user
#[async_trait]
pub trait SessionProvider: Send + Sync {
    /// `Ok(None)` when nobody is signed in
    async fn current_user(&self) -> std::result::Result<Option<String>, RemoteError>;
}

/// Read-only profile lookup
#[async_trait]
pub trait ProfileDirectory: Send + Sync {
    async fn profile(&self, user_id: &str) -> std::result::Result<ProfileRow, RemoteError>;
}

#[derive(Clone)]
pub struct ProfileResolver {
    session: Arc<dyn SessionProvider>,
    directory: Arc<dyn ProfileDirectory>,
}

impl ProfileResolver {
    pub fn new(session: Arc<dyn SessionProvider>, directory: Arc<dyn ProfileDirectory>) -> Self {
        Self { session, directory }
    }

    /// Resolve the signed-in user's branch scope
    ///
    /// # Errors
    ///
    /// - [`LedgerError::Authentication`] if nobody is signed in or the session
    ///   lookup fails
    /// - [`LedgerError::Remote`] if the profile lookup fails
    /// - [`LedgerError::Authorization`] if the profile has no branch
    pub async fn resolve(&self) -> Result<Profile> {
        let user_id = self
            .session
            .current_user()
            .await
            .map_err(|e| LedgerError::Authentication(e.to_string()))?
            .ok_or_else(|| {
                LedgerError::Authentication("you must be logged in to access cashflows".to_string())
            })?;

        let row = self.directory.profile(&user_id).await?;

        match row.branch_id {
            Some(branch_id) if branch_id != 0 => {
                debug!(user_id = %user_id, branch_id, "Resolved profile");
                Ok(Profile { user_id, branch_id })
            }
            _ => Err(LedgerError::Authorization { user_id }),
        }
    }
}
