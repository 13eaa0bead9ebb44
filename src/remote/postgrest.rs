//! PostgREST/Supabase-style HTTP backend
//!
//! One [`PostgrestClient`] serves as session provider, profile directory and
//! (through [`PostgrestTable`]) both source tables. Reads are retried on
//! transport failures with exponential backoff; writes are sent exactly once.

use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::ACCEPT;
use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use super::rows::ProfileRow;
use super::{RemoteError, Result, SourceTable};
use crate::config::RemoteConfig;
use crate::profile::{ProfileDirectory, SessionProvider};

/// Makes PostgREST answer with one object and fail unless exactly one row matched
const SINGLE_OBJECT: &str = "application/vnd.pgrst.object+json";

const RETRY_BASE_DELAY: Duration = Duration::from_millis(200);

pub struct PostgrestClient {
    http: Client,
    base_url: String,
    api_key: String,
    access_token: Option<String>,
    profiles_table: String,
    max_retries: u32,
}

impl PostgrestClient {
    /// Build a client from the remote config
    ///
    /// Fails if no API key is configured.
    pub fn new(config: &RemoteConfig, profiles_table: &str) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .filter(|key| !key.is_empty())
            .ok_or_else(|| {
                RemoteError::Config("missing API key, set CASHBOOK_API_KEY".to_string())
            })?;

        let http = Client::builder()
            .connect_timeout(config.connect_timeout.as_duration())
            .timeout(config.request_timeout.as_duration())
            .user_agent(&config.user_agent)
            .build()
            .map_err(|e| RemoteError::Config(e.to_string()))?;

        Ok(Self {
            http,
            base_url: config.url.trim().trim_end_matches('/').to_string(),
            api_key,
            access_token: config.access_token.clone().filter(|token| !token.is_empty()),
            profiles_table: profiles_table.to_string(),
            max_retries: config.max_retries.max(1),
        })
    }

    /// Bind the client to one source table
    pub fn table<R>(self: &Arc<Self>, name: impl Into<String>) -> PostgrestTable<R> {
        PostgrestTable {
            client: Arc::clone(self),
            name: name.into(),
            _row: PhantomData,
        }
    }

    fn rest_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }

    fn auth_url(&self) -> String {
        format!("{}/auth/v1/user", self.base_url)
    }

    /// Row-level security sees the user's token when there is one
    fn bearer(&self) -> &str {
        self.access_token.as_deref().unwrap_or(&self.api_key)
    }

    fn request(&self, method: Method, url: &str) -> RequestBuilder {
        self.http
            .request(method, url)
            .header("apikey", &self.api_key)
            .bearer_auth(self.bearer())
    }

    async fn send(&self, request: RequestBuilder) -> Result<reqwest::Response> {
        let response = request
            .send()
            .await
            .map_err(|e| RemoteError::Transport(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        Err(status_error(status, &body))
    }

    async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        self.send(request)
            .await?
            .json::<T>()
            .await
            .map_err(|e| RemoteError::Decode(e.to_string()))
    }

    /// GET with retry on transport failures
    async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, String)],
        single: bool,
    ) -> Result<T> {
        let mut attempts = 0;

        loop {
            attempts += 1;

            let mut request = self.request(Method::GET, url).query(query);
            if single {
                request = request.header(ACCEPT, SINGLE_OBJECT);
            }

            match self.send_json(request).await {
                Ok(value) => {
                    if attempts > 1 {
                        debug!(url, attempts, "Request succeeded after retry");
                    }
                    return Ok(value);
                }
                Err(RemoteError::Transport(message)) if attempts < self.max_retries => {
                    warn!(url, attempts, error = %message, "Request failed, retrying");
                    tokio::time::sleep(retry_delay(attempts)).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

#[async_trait]
impl SessionProvider for PostgrestClient {
    async fn current_user(&self) -> Result<Option<String>> {
        #[derive(Deserialize)]
        struct AuthUser {
            id: String,
        }

        let Some(token) = self.access_token.as_deref() else {
            return Ok(None);
        };

        let request = self
            .http
            .get(self.auth_url())
            .header("apikey", &self.api_key)
            .bearer_auth(token);
        match self.send_json::<AuthUser>(request).await {
            Ok(user) => Ok(Some(user.id)),
            // Expired or revoked token
            Err(RemoteError::Status { status: 401, .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }
}

#[async_trait]
impl ProfileDirectory for PostgrestClient {
    async fn profile(&self, user_id: &str) -> Result<ProfileRow> {
        let url = self.rest_url(&self.profiles_table);
        self.get_json(&url, &profile_query(user_id), true).await
    }
}

/// One PostgREST table exposed as a ledger source
pub struct PostgrestTable<R> {
    client: Arc<PostgrestClient>,
    name: String,
    _row: PhantomData<fn() -> R>,
}

#[async_trait]
impl<R> SourceTable<R> for PostgrestTable<R>
where
    R: DeserializeOwned + Send + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    async fn select_by_branch(&self, branch_id: i64) -> Result<Vec<R>> {
        let url = self.client.rest_url(&self.name);
        let rows: Vec<R> = self
            .client
            .get_json(&url, &branch_query(branch_id), false)
            .await?;

        debug!(table = %self.name, branch_id, rows = rows.len(), "Selected rows");
        Ok(rows)
    }

    async fn insert(&self, row: &Map<String, Value>) -> Result<R> {
        let request = self
            .client
            .request(Method::POST, &self.client.rest_url(&self.name))
            .header("Prefer", "return=representation")
            .header(ACCEPT, SINGLE_OBJECT)
            .json(row);

        self.client.send_json(request).await
    }

    async fn update_by_id(&self, id: i64, diff: &Map<String, Value>) -> Result<R> {
        let request = self
            .client
            .request(Method::PATCH, &self.client.rest_url(&self.name))
            .query(&id_query(id))
            .header("Prefer", "return=representation")
            .header(ACCEPT, SINGLE_OBJECT)
            .json(diff);

        self.client.send_json(request).await
    }

    async fn delete_by_id(&self, id: i64) -> Result<()> {
        let request = self
            .client
            .request(Method::DELETE, &self.client.rest_url(&self.name))
            .query(&id_query(id));

        self.client.send(request).await?;
        Ok(())
    }
}

fn branch_query(branch_id: i64) -> Vec<(&'static str, String)> {
    vec![
        ("select", "*".to_string()),
        ("branch_id", format!("eq.{branch_id}")),
        ("order", "created_at.desc".to_string()),
    ]
}

fn id_query(id: i64) -> Vec<(&'static str, String)> {
    vec![("id", format!("eq.{id}"))]
}

fn profile_query(user_id: &str) -> Vec<(&'static str, String)> {
    vec![
        ("select", "id,branch_id".to_string()),
        ("id", format!("eq.{user_id}")),
    ]
}

/// Exponential backoff: 200ms, 400ms, 800ms, ...
fn retry_delay(attempt: u32) -> Duration {
    RETRY_BASE_DELAY * 2u32.saturating_pow(attempt.saturating_sub(1))
}

/// Pull the human message out of a PostgREST or auth error body
fn status_error(status: StatusCode, body: &str) -> RemoteError {
    #[derive(Deserialize)]
    struct ErrorBody {
        message: Option<String>,
        msg: Option<String>,
        error_description: Option<String>,
    }

    let message = serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.message.or(b.msg).or(b.error_description))
        .unwrap_or_else(|| match body.trim() {
            "" => status.canonical_reason().unwrap_or("request failed").to_string(),
            text => text.to_string(),
        });

    RemoteError::Status {
        status: status.as_u16(),
        message,
    }
}
