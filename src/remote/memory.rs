//! In-memory source table
//!
//! Behaves like a PostgREST table closely enough for the ledger: ids are
//! generated on insert, selects are filtered by branch and ordered by
//! `created_at` descending, diffs are merged column by column, and writes to
//! columns the table does not have are rejected.

use std::marker::PhantomData;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tokio::sync::Mutex;

use super::rows::{ExpenseRow, IncomeRow};
use super::{RemoteError, Result, SourceTable};
use crate::ledger::mapping::parse_timestamp;

const INCOME_COLUMNS: &[&str] = &[
    "id",
    "branch_id",
    "created_at",
    "amount",
    "income_type",
    "cashflow_id",
];

const EXPENSE_COLUMNS: &[&str] = &[
    "id",
    "branch_id",
    "created_at",
    "amount",
    "expense_category",
    "description",
    "cashflow_id",
];

#[derive(Debug)]
struct TableState {
    rows: Vec<Map<String, Value>>,
    next_id: i64,
    failure: Option<String>,
    last_write: Option<Map<String, Value>>,
}

pub struct MemoryTable<R> {
    name: String,
    columns: &'static [&'static str],
    state: Mutex<TableState>,
    calls: AtomicUsize,
    _row: PhantomData<fn() -> R>,
}

impl MemoryTable<IncomeRow> {
    /// Income table with the income column set enforced
    pub fn income() -> Self {
        Self::with_columns("income_transaction", INCOME_COLUMNS)
    }
}

impl MemoryTable<ExpenseRow> {
    /// Expense table with the expense column set enforced
    pub fn expense() -> Self {
        Self::with_columns("expense_transaction", EXPENSE_COLUMNS)
    }
}

impl<R> MemoryTable<R>
where
    R: Serialize + DeserializeOwned + Send + 'static,
{
    fn with_columns(name: &str, columns: &'static [&'static str]) -> Self {
        Self {
            name: name.to_string(),
            columns,
            state: Mutex::new(TableState {
                rows: Vec::new(),
                next_id: 1,
                failure: None,
                last_write: None,
            }),
            calls: AtomicUsize::new(0),
            _row: PhantomData,
        }
    }

    /// Store a row as-is, keeping its id. Does not count as a call.
    pub async fn seed(&self, row: &R) -> Result<()> {
        let map = match serde_json::to_value(row) {
            Ok(Value::Object(map)) => map,
            Ok(other) => {
                return Err(RemoteError::Decode(format!("row is not an object: {other}")));
            }
            Err(e) => return Err(RemoteError::Decode(e.to_string())),
        };

        let id = row_id(&map)
            .ok_or_else(|| RemoteError::Decode("seeded row has no integer id".to_string()))?;

        let mut state = self.state.lock().await;
        state.next_id = state.next_id.max(id + 1);
        state.rows.push(map);
        Ok(())
    }

    /// Make every following call fail with `message` until cleared
    pub async fn fail_with(&self, message: impl Into<String>) {
        self.state.lock().await.failure = Some(message.into());
    }

    pub async fn clear_failure(&self) {
        self.state.lock().await.failure = None;
    }

    /// Number of trait calls issued against this table, failed ones included
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Payload of the most recent insert or update
    pub async fn last_write(&self) -> Option<Map<String, Value>> {
        self.state.lock().await.last_write.clone()
    }

    /// All stored rows in insertion order
    pub async fn rows(&self) -> Result<Vec<R>> {
        let state = self.state.lock().await;
        state.rows.iter().map(decode).collect()
    }

    /// Count the call and surface an injected failure, if any
    async fn begin(&self) -> Result<tokio::sync::MutexGuard<'_, TableState>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let state = self.state.lock().await;
        if let Some(message) = state.failure.clone() {
            return Err(RemoteError::Injected(message));
        }
        Ok(state)
    }

    fn check_columns(&self, payload: &Map<String, Value>) -> Result<()> {
        match payload.keys().find(|key| !self.columns.contains(&key.as_str())) {
            Some(unknown) => Err(RemoteError::Status {
                status: 400,
                message: format!(
                    "Could not find the '{unknown}' column of '{}' in the schema cache",
                    self.name
                ),
            }),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl<R> SourceTable<R> for MemoryTable<R>
where
    R: Serialize + DeserializeOwned + Send + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    async fn select_by_branch(&self, branch_id: i64) -> Result<Vec<R>> {
        let state = self.begin().await?;

        let mut rows: Vec<&Map<String, Value>> = state
            .rows
            .iter()
            .filter(|row| row.get("branch_id").and_then(Value::as_i64) == Some(branch_id))
            .collect();

        // Rows with a missing or unparsable created_at sort last
        rows.sort_by(|a, b| created_at(b).cmp(&created_at(a)));

        tracing::debug!(table = %self.name, branch_id, rows = rows.len(), "Memory select");
        rows.into_iter().map(decode).collect()
    }

    async fn insert(&self, row: &Map<String, Value>) -> Result<R> {
        let mut state = self.begin().await?;
        self.check_columns(row)?;

        let id = state.next_id;
        state.next_id += 1;

        let mut stored = row.clone();
        stored.insert("id".to_string(), Value::from(id));
        state.last_write = Some(row.clone());
        state.rows.push(stored.clone());

        tracing::debug!(table = %self.name, id, "Memory insert");
        decode(&stored)
    }

    async fn update_by_id(&self, id: i64, diff: &Map<String, Value>) -> Result<R> {
        let mut state = self.begin().await?;
        self.check_columns(diff)?;
        state.last_write = Some(diff.clone());

        let row = state
            .rows
            .iter_mut()
            .find(|row| row_id(row) == Some(id))
            .ok_or_else(|| RemoteError::RowNotFound {
                table: self.name.clone(),
                id,
            })?;

        for (column, value) in diff {
            if column != "id" {
                row.insert(column.clone(), value.clone());
            }
        }

        tracing::debug!(table = %self.name, id, columns = diff.len(), "Memory update");
        decode(row)
    }

    async fn delete_by_id(&self, id: i64) -> Result<()> {
        let mut state = self.begin().await?;
        let before = state.rows.len();
        state.rows.retain(|row| row_id(row) != Some(id));

        tracing::debug!(
            table = %self.name,
            id,
            removed = before - state.rows.len(),
            "Memory delete"
        );
        Ok(())
    }
}

fn row_id(row: &Map<String, Value>) -> Option<i64> {
    row.get("id").and_then(Value::as_i64)
}

fn created_at(row: &Map<String, Value>) -> Option<chrono::DateTime<chrono::Utc>> {
    row.get("created_at")
        .and_then(Value::as_str)
        .and_then(parse_timestamp)
}

fn decode<R: DeserializeOwned>(row: &Map<String, Value>) -> Result<R> {
    serde_json::from_value(Value::Object(row.clone()))
        .map_err(|e| RemoteError::Decode(e.to_string()))
}
