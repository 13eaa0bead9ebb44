use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use super::entry::{CreateInput, LedgerEntry, SourceKind, UpdateInput};
use super::error::{LedgerError, Result};
use super::mapping::{map_expense, map_income};
use super::payload::{insert_payload, update_payload};
use super::summary::LedgerSummary;
use crate::observability::{LedgerMetrics, MetricsSnapshot};
use crate::profile::ProfileResolver;
use crate::remote::{ExpenseRow, IncomeRow, SourceTable};

/// Cached view of the unified ledger
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LedgerState {
    /// Newest first as of the last fetch; later creates are prepended
    pub entries: Vec<LedgerEntry>,
    pub is_loading: bool,
    pub last_error: Option<String>,
}

/// Unified income/expense ledger over two remote sources
///
/// The store owns the only copy of the cache. The state lock is never held
/// across a remote call, so operations may interleave; each one applies its
/// cache change when its own remote call completes.
pub struct LedgerStore {
    resolver: ProfileResolver,
    income: Arc<dyn SourceTable<IncomeRow>>,
    expense: Arc<dyn SourceTable<ExpenseRow>>,
    state: RwLock<LedgerState>,
    metrics: LedgerMetrics,
}

impl LedgerStore {
    pub fn new(
        resolver: ProfileResolver,
        income: Arc<dyn SourceTable<IncomeRow>>,
        expense: Arc<dyn SourceTable<ExpenseRow>>,
    ) -> Self {
        Self {
            resolver,
            income,
            expense,
            state: RwLock::new(LedgerState::default()),
            metrics: LedgerMetrics::new(),
        }
    }

    pub async fn entries(&self) -> Vec<LedgerEntry> {
        self.state.read().await.entries.clone()
    }

    pub async fn is_loading(&self) -> bool {
        self.state.read().await.is_loading
    }

    pub async fn last_error(&self) -> Option<String> {
        self.state.read().await.last_error.clone()
    }

    pub async fn snapshot(&self) -> LedgerState {
        self.state.read().await.clone()
    }

    pub async fn get(&self, id: &str) -> Option<LedgerEntry> {
        self.state
            .read()
            .await
            .entries
            .iter()
            .find(|entry| entry.id == id)
            .cloned()
    }

    pub async fn summary(&self) -> LedgerSummary {
        LedgerSummary::from_entries(&self.state.read().await.entries)
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    /// Replace the cache with the branch's current rows from both sources
    ///
    /// On any failure the cache is emptied and the error message recorded
    /// before the error is returned.
    pub async fn fetch(&self) -> Result<()> {
        {
            let mut state = self.state.write().await;
            state.is_loading = true;
            state.last_error = None;
        }
        info!("Fetching ledger");

        match self.load().await {
            Ok(entries) => {
                let count = entries.len();
                let mut state = self.state.write().await;
                state.entries = entries;
                state.is_loading = false;
                state.last_error = None;
                drop(state);

                self.metrics.fetch_succeeded();
                info!(entries = count, "Ledger fetched");
                Ok(())
            }
            Err(e) => {
                let mut state = self.state.write().await;
                state.entries.clear();
                state.is_loading = false;
                state.last_error = Some(e.to_string());
                drop(state);

                self.metrics.fetch_failed();
                warn!(error = %e, "Ledger fetch failed");
                Err(e)
            }
        }
    }

    async fn load(&self) -> Result<Vec<LedgerEntry>> {
        let profile = self.resolver.resolve().await?;

        let (income, expense) = tokio::join!(
            self.income.select_by_branch(profile.branch_id),
            self.expense.select_by_branch(profile.branch_id),
        );
        let income = income?;
        let expense = expense?;

        debug!(
            branch_id = profile.branch_id,
            income_table = self.income.name(),
            income = income.len(),
            expense_table = self.expense.name(),
            expense = expense.len(),
            "Loaded source rows"
        );

        let mut entries: Vec<LedgerEntry> = income
            .iter()
            .map(map_income)
            .chain(expense.iter().map(map_expense))
            .collect();

        // Stable: on equal dates income stays ahead of expense
        entries.sort_by(|a, b| b.date.cmp(&a.date));
        Ok(entries)
    }

    /// Insert a new entry and put it at the head of the cache
    ///
    /// The cache is not re-sorted, so a back-dated entry stays first until
    /// the next fetch.
    pub async fn create(&self, input: CreateInput) -> Result<LedgerEntry> {
        info!(category = %input.category, name = %input.name, "Creating ledger entry");

        let entry = self
            .insert(&input)
            .await
            .inspect_err(|e| self.mutation_failed("create", e))?;

        self.state.write().await.entries.insert(0, entry.clone());
        self.metrics.entry_created();
        info!(id = %entry.id, "Ledger entry created");

        Ok(entry)
    }

    async fn insert(&self, input: &CreateInput) -> Result<LedgerEntry> {
        let profile = self.resolver.resolve().await?;
        let payload = insert_payload(input, &profile);
        debug!(
            table = self.table_name(input.category),
            branch_id = profile.branch_id,
            "Inserting source row"
        );

        let entry = match input.category {
            SourceKind::Income => map_income(&self.income.insert(payload.as_map()).await?),
            SourceKind::Expense => map_expense(&self.expense.insert(payload.as_map()).await?),
        };
        Ok(entry)
    }

    /// Apply a sparse edit to a cached entry, in its own source
    ///
    /// Only ids present in the cache can be updated. The updated entry keeps
    /// its position.
    pub async fn update(&self, id: &str, input: UpdateInput) -> Result<LedgerEntry> {
        info!(id, "Updating ledger entry");

        let entry = self
            .apply_update(id, &input)
            .await
            .inspect_err(|e| self.mutation_failed("update", e))?;

        let mut state = self.state.write().await;
        match state.entries.iter_mut().find(|cached| cached.id == id) {
            Some(cached) => *cached = entry.clone(),
            None => debug!(id, "Entry left the cache while its update was in flight"),
        }
        drop(state);

        self.metrics.entry_updated();
        info!(id, "Ledger entry updated");
        Ok(entry)
    }

    async fn apply_update(&self, id: &str, input: &UpdateInput) -> Result<LedgerEntry> {
        let existing = self.cached(id).await?;
        let profile = self.resolver.resolve().await?;

        let diff = update_payload(input, existing.source_kind());
        debug!(
            id,
            table = self.table_name(existing.source_kind()),
            branch_id = profile.branch_id,
            columns = ?diff.keys().collect::<Vec<_>>(),
            "Built update diff"
        );

        let entry = match existing.source_kind() {
            SourceKind::Income => map_income(
                &self
                    .income
                    .update_by_id(existing.source_id, diff.as_map())
                    .await?,
            ),
            SourceKind::Expense => map_expense(
                &self
                    .expense
                    .update_by_id(existing.source_id, diff.as_map())
                    .await?,
            ),
        };
        Ok(entry)
    }

    /// Delete a cached entry from its source and drop it from the cache
    pub async fn delete(&self, id: &str) -> Result<()> {
        info!(id, "Deleting ledger entry");

        self.remove(id)
            .await
            .inspect_err(|e| self.mutation_failed("delete", e))?;

        self.state.write().await.entries.retain(|cached| cached.id != id);
        self.metrics.entry_deleted();
        info!(id, "Ledger entry deleted");
        Ok(())
    }

    async fn remove(&self, id: &str) -> Result<()> {
        let existing = self.cached(id).await?;
        let profile = self.resolver.resolve().await?;
        debug!(
            id,
            table = self.table_name(existing.source_kind()),
            branch_id = profile.branch_id,
            "Deleting source row"
        );

        match existing.source_kind() {
            SourceKind::Income => self.income.delete_by_id(existing.source_id).await?,
            SourceKind::Expense => self.expense.delete_by_id(existing.source_id).await?,
        }
        Ok(())
    }

    fn table_name(&self, kind: SourceKind) -> &str {
        match kind {
            SourceKind::Income => self.income.name(),
            SourceKind::Expense => self.expense.name(),
        }
    }

    async fn cached(&self, id: &str) -> Result<LedgerEntry> {
        self.get(id)
            .await
            .ok_or_else(|| LedgerError::NotFound(id.to_string()))
    }

    fn mutation_failed(&self, operation: &str, error: &LedgerError) {
        self.metrics.mutation_failed();
        warn!(operation, error = %error, "Ledger mutation failed");
    }
}
