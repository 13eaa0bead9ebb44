//! In-memory session and profile providers for tests and local runs

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{ProfileDirectory, SessionProvider};
use crate::remote::{ProfileRow, RemoteError};

/// Session with a settable signed-in user
#[derive(Debug, Default)]
pub struct FixedSession {
    user: RwLock<Option<String>>,
    failure: RwLock<Option<String>>,
}

impl FixedSession {
    pub fn signed_in(user_id: impl Into<String>) -> Self {
        Self {
            user: RwLock::new(Some(user_id.into())),
            failure: RwLock::new(None),
        }
    }

    pub fn signed_out() -> Self {
        Self::default()
    }

    pub async fn sign_in(&self, user_id: impl Into<String>) {
        *self.user.write().await = Some(user_id.into());
    }

    pub async fn sign_out(&self) {
        *self.user.write().await = None;
    }

    /// Make the session lookup itself fail
    pub async fn fail_with(&self, message: impl Into<String>) {
        *self.failure.write().await = Some(message.into());
    }
}

#[async_trait]
impl SessionProvider for FixedSession {
    async fn current_user(&self) -> Result<Option<String>, RemoteError> {
        if let Some(message) = self.failure.read().await.clone() {
            return Err(RemoteError::Injected(message));
        }
        Ok(self.user.read().await.clone())
    }
}

/// Profile table keyed by user id
#[derive(Debug, Default)]
pub struct FixedProfiles {
    branches: RwLock<HashMap<String, Option<i64>>>,
}

impl FixedProfiles {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create or reassign a profile; `None` leaves it without a branch
    pub async fn assign(&self, user_id: impl Into<String>, branch_id: Option<i64>) {
        self.branches.write().await.insert(user_id.into(), branch_id);
    }

    pub async fn remove(&self, user_id: &str) {
        self.branches.write().await.remove(user_id);
    }
}

#[async_trait]
impl ProfileDirectory for FixedProfiles {
    async fn profile(&self, user_id: &str) -> Result<ProfileRow, RemoteError> {
        match self.branches.read().await.get(user_id) {
            Some(branch_id) => Ok(ProfileRow {
                id: user_id.to_string(),
                branch_id: *branch_id,
            }),
            None => Err(RemoteError::Status {
                status: 406,
                message: "JSON object requested, multiple (or no) rows returned".to_string(),
            }),
        }
    }
}
