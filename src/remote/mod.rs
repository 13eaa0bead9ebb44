//! Remote record sources
//!
//! The ledger is backed by two physically separate tables (income and
//! expense) that share one access contract, [`SourceTable`]. Two backends are
//! provided:
//!
//! - [`MemoryTable`] - in-process table for tests and local experiments
//! - [`PostgrestTable`] - HTTP client for a PostgREST/Supabase-style API
//!
//! Timeouts and retries belong to the backend. The ledger treats any
//! [`RemoteError`] as terminal for the operation that hit it.

pub mod memory;
pub mod postgrest;
pub mod rows;

pub use memory::MemoryTable;
pub use postgrest::{PostgrestClient, PostgrestTable};
pub use rows::{ExpenseRow, IncomeRow, ProfileRow};

use async_trait::async_trait;
use serde_json::{Map, Value};
use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum RemoteError {
    #[error("request failed: {0}")]
    Transport(String),

    #[error("{message} (HTTP {status})")]
    Status { status: u16, message: String },

    #[error("malformed response: {0}")]
    Decode(String),

    #[error("row {id} not found in {table}")]
    RowNotFound { table: String, id: i64 },

    #[error("remote misconfigured: {0}")]
    Config(String),

    #[error("{0}")]
    Injected(String),
}

pub type Result<T> = std::result::Result<T, RemoteError>;

/// Branch-scoped read/write access to one source table
///
/// Payloads are JSON objects keyed by column name; rows come back typed.
#[async_trait]
pub trait SourceTable<R>: Send + Sync
where
    R: Send + 'static,
{
    /// Table name, used for logging
    fn name(&self) -> &str;

    /// All rows of a branch, newest `created_at` first
    async fn select_by_branch(&self, branch_id: i64) -> Result<Vec<R>>;

    /// Insert a single row and return it with its generated id
    async fn insert(&self, row: &Map<String, Value>) -> Result<R>;

    /// Apply a sparse diff to one row and return the updated row
    async fn update_by_id(&self, id: i64, diff: &Map<String, Value>) -> Result<R>;

    async fn delete_by_id(&self, id: i64) -> Result<()>;
}
