use std::sync::Arc;

use cashbook::ledger::{CreateInput, LedgerError, LedgerStore, SourceKind, UpdateInput};
use cashbook::profile::ProfileResolver;
use cashbook::profile::fixed::{FixedProfiles, FixedSession};
use cashbook::remote::{ExpenseRow, IncomeRow, MemoryTable, RemoteError};
use serde_json::Value;

const USER: &str = "user-1";
const BRANCH: i64 = 2;

struct Harness {
    store: LedgerStore,
    income: Arc<MemoryTable<IncomeRow>>,
    expense: Arc<MemoryTable<ExpenseRow>>,
    session: Arc<FixedSession>,
    profiles: Arc<FixedProfiles>,
}

impl Harness {
    async fn new() -> Self {
        let income = Arc::new(MemoryTable::income());
        let expense = Arc::new(MemoryTable::expense());
        let session = Arc::new(FixedSession::signed_in(USER));
        let profiles = Arc::new(FixedProfiles::new());
        profiles.assign(USER, Some(BRANCH)).await;

        let resolver = ProfileResolver::new(session.clone(), profiles.clone());
        let store = LedgerStore::new(resolver, income.clone(), expense.clone());

        Self {
            store,
            income,
            expense,
            session,
            profiles,
        }
    }

    /// income-1 @ 01-01, income-3 @ 01-02, expense-7 @ 01-02, plus rows of another branch
    async fn seeded() -> Self {
        let harness = Self::new().await;

        harness
            .income
            .seed(&income_row(1, BRANCH, "2024-01-01T00:00:00Z", 100.0, "Sales"))
            .await
            .unwrap();
        harness
            .income
            .seed(&income_row(3, BRANCH, "2024-01-02T00:00:00Z", 250.0, "Interest"))
            .await
            .unwrap();
        harness
            .expense
            .seed(&expense_row(7, BRANCH, "2024-01-02T00:00:00Z", 80.0, "Utilities"))
            .await
            .unwrap();
        harness
            .income
            .seed(&income_row(9, 5, "2024-01-03T00:00:00Z", 999.0, "Elsewhere"))
            .await
            .unwrap();
        harness
            .expense
            .seed(&expense_row(11, 5, "2024-01-03T00:00:00Z", 999.0, "Elsewhere"))
            .await
            .unwrap();

        harness
    }

    async fn ids(&self) -> Vec<String> {
        self.store
            .entries()
            .await
            .into_iter()
            .map(|entry| entry.id)
            .collect()
    }
}

fn income_row(id: i64, branch_id: i64, created_at: &str, amount: f64, name: &str) -> IncomeRow {
    IncomeRow {
        id,
        branch_id: Some(branch_id),
        created_at: Some(created_at.to_string()),
        amount: Some(amount),
        income_type: Some(name.to_string()),
        cashflow_id: None,
    }
}

fn expense_row(id: i64, branch_id: i64, created_at: &str, amount: f64, name: &str) -> ExpenseRow {
    ExpenseRow {
        id,
        branch_id: Some(branch_id),
        created_at: Some(created_at.to_string()),
        amount: Some(amount),
        expense_category: Some(name.to_string()),
        description: Some("monthly".to_string()),
        cashflow_id: None,
    }
}

#[tokio::test]
async fn test_fetch_merges_sources_newest_first() {
    let harness = Harness::seeded().await;

    harness.store.fetch().await.unwrap();

    assert_eq!(harness.ids().await, vec!["income-3", "expense-7", "income-1"]);
    assert!(!harness.store.is_loading().await);
    assert_eq!(harness.store.last_error().await, None);

    let expense = harness.store.get("expense-7").await.unwrap();
    assert_eq!(expense.category(), SourceKind::Expense);
    assert_eq!(expense.name, "Utilities");
    assert_eq!(expense.description.as_deref(), Some("monthly"));

    let income = harness.store.get("income-3").await.unwrap();
    assert_eq!(income.description, None);
}

#[tokio::test]
async fn test_fetch_is_idempotent() {
    let harness = Harness::seeded().await;

    harness.store.fetch().await.unwrap();
    let first = harness.store.entries().await;
    harness.store.fetch().await.unwrap();

    assert_eq!(harness.store.entries().await, first);
    assert_eq!(harness.store.metrics().fetches, 2);
}

#[tokio::test]
async fn test_fetch_failure_empties_cache() {
    let harness = Harness::seeded().await;
    harness.store.fetch().await.unwrap();
    assert_eq!(harness.store.entries().await.len(), 3);

    harness.expense.fail_with("connection reset").await;
    let result = harness.store.fetch().await;

    assert!(matches!(
        result,
        Err(LedgerError::Remote(RemoteError::Injected(_)))
    ));
    assert!(harness.store.entries().await.is_empty());
    assert!(!harness.store.is_loading().await);
    assert_eq!(
        harness.store.last_error().await.as_deref(),
        Some("connection reset")
    );
    assert_eq!(harness.store.metrics().fetch_failures, 1);

    harness.expense.clear_failure().await;
    harness.store.fetch().await.unwrap();
    assert_eq!(harness.store.entries().await.len(), 3);
    assert_eq!(harness.store.last_error().await, None);
}

#[tokio::test]
async fn test_fetch_without_session_is_authentication_error() {
    let harness = Harness::seeded().await;
    harness.session.sign_out().await;

    let result = harness.store.fetch().await;

    assert!(matches!(result, Err(LedgerError::Authentication(_))));
    assert!(harness.store.last_error().await.is_some());
    assert_eq!(harness.income.call_count(), 0);
    assert_eq!(harness.expense.call_count(), 0);
}

#[tokio::test]
async fn test_fetch_without_branch_is_authorization_error() {
    let harness = Harness::seeded().await;
    harness.profiles.assign(USER, None).await;

    let result = harness.store.fetch().await;

    assert!(matches!(result, Err(LedgerError::Authorization { .. })));
    assert!(harness.store.entries().await.is_empty());
    assert_eq!(harness.income.call_count(), 0);
}

#[tokio::test]
async fn test_branch_reassignment_applies_to_next_fetch() {
    let harness = Harness::seeded().await;
    harness.store.fetch().await.unwrap();

    harness.profiles.assign(USER, Some(5)).await;
    harness.store.fetch().await.unwrap();

    assert_eq!(harness.ids().await, vec!["income-9", "expense-11"]);
}

#[tokio::test]
async fn test_create_income_prepends_entry() {
    let harness = Harness::seeded().await;
    harness.store.fetch().await.unwrap();

    let entry = harness
        .store
        .create(CreateInput {
            category: SourceKind::Income,
            name: "Salary".to_string(),
            amount: 5000.0,
            date: Some("2024-03-01".to_string()),
            description: Some("ignored".to_string()),
        })
        .await
        .unwrap();

    assert_eq!(entry.category(), SourceKind::Income);
    assert_eq!(entry.name, "Salary");
    assert_eq!(entry.description, None);
    assert_eq!(entry.branch_id, Some(BRANCH));
    assert_eq!(entry.date.to_rfc3339(), "2024-03-01T00:00:00+00:00");

    let entries = harness.store.entries().await;
    assert_eq!(entries.len(), 4);
    assert_eq!(entries[0], entry);

    let written = harness.income.last_write().await.unwrap();
    assert_eq!(written.get("income_type"), Some(&Value::from("Salary")));
    assert_eq!(written.get("branch_id"), Some(&Value::from(BRANCH)));
    assert_eq!(written.get("cashflow_id"), Some(&Value::Null));
    assert!(!written.contains_key("description"));
    assert_eq!(harness.expense.call_count(), 1);
}

#[tokio::test]
async fn test_create_backdated_expense_is_not_resorted() {
    let harness = Harness::seeded().await;
    harness.store.fetch().await.unwrap();

    let entry = harness
        .store
        .create(CreateInput {
            category: SourceKind::Expense,
            name: "Stationery".to_string(),
            amount: 12.5,
            date: Some("2023-06-01".to_string()),
            description: Some("pens".to_string()),
        })
        .await
        .unwrap();

    assert_eq!(harness.store.entries().await[0], entry);
    assert_eq!(entry.description.as_deref(), Some("pens"));

    let written = harness.expense.last_write().await.unwrap();
    assert_eq!(written.get("expense_category"), Some(&Value::from("Stationery")));
    assert!(!written.contains_key("income_type"));
}

#[tokio::test]
async fn test_create_failure_leaves_cache_untouched() {
    let harness = Harness::seeded().await;
    harness.store.fetch().await.unwrap();
    let before = harness.store.snapshot().await;

    harness.income.fail_with("insert rejected").await;
    let result = harness
        .store
        .create(CreateInput {
            category: SourceKind::Income,
            name: "Salary".to_string(),
            amount: 5000.0,
            date: None,
            description: None,
        })
        .await;

    assert!(result.is_err());
    assert_eq!(harness.store.snapshot().await, before);
    assert_eq!(harness.store.metrics().mutation_failures, 1);
}

#[tokio::test]
async fn test_update_expense_routes_to_expense_source() {
    let harness = Harness::seeded().await;
    harness.store.fetch().await.unwrap();

    let entry = harness
        .store
        .update(
            "expense-7",
            UpdateInput {
                name: Some("Rent".to_string()),
                ..UpdateInput::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(entry.id, "expense-7");
    assert_eq!(entry.category(), SourceKind::Expense);
    assert_eq!(entry.name, "Rent");
    assert_eq!(entry.amount, 80.0);

    let written = harness.expense.last_write().await.unwrap();
    assert_eq!(written.get("expense_category"), Some(&Value::from("Rent")));
    assert!(!written.contains_key("income_type"));
    assert_eq!(written.len(), 1);
    assert!(harness.income.last_write().await.is_none());

    // Same position, new content
    assert_eq!(harness.ids().await, vec!["income-3", "expense-7", "income-1"]);
    assert_eq!(harness.store.get("expense-7").await.unwrap().name, "Rent");
    assert_eq!(harness.store.metrics().entries_updated, 1);
}

#[tokio::test]
async fn test_update_income_strips_description() {
    let harness = Harness::seeded().await;
    harness.store.fetch().await.unwrap();

    let entry = harness
        .store
        .update(
            "income-3",
            UpdateInput {
                amount: Some(300.0),
                description: Some(Some("should not be sent".to_string())),
                ..UpdateInput::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(entry.amount, 300.0);
    assert_eq!(entry.description, None);

    let written = harness.income.last_write().await.unwrap();
    assert!(!written.contains_key("description"));
    assert_eq!(written.get("amount"), Some(&Value::from(300.0)));
}

#[tokio::test]
async fn test_update_can_clear_expense_description() {
    let harness = Harness::seeded().await;
    harness.store.fetch().await.unwrap();

    let entry = harness
        .store
        .update(
            "expense-7",
            UpdateInput {
                description: Some(None),
                ..UpdateInput::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(entry.description, None);
    let written = harness.expense.last_write().await.unwrap();
    assert_eq!(written.get("description"), Some(&Value::Null));
}

#[tokio::test]
async fn test_update_drops_unparsable_date() {
    let harness = Harness::seeded().await;
    harness.store.fetch().await.unwrap();

    let entry = harness
        .store
        .update(
            "income-1",
            UpdateInput {
                name: Some("Consulting".to_string()),
                date: Some("not a date".to_string()),
                ..UpdateInput::default()
            },
        )
        .await
        .unwrap();

    let written = harness.income.last_write().await.unwrap();
    assert!(!written.contains_key("created_at"));
    assert_eq!(entry.date.to_rfc3339(), "2024-01-01T00:00:00+00:00");
}

#[tokio::test]
async fn test_update_unknown_id_is_not_found() {
    let harness = Harness::seeded().await;
    harness.store.fetch().await.unwrap();
    let calls = harness.income.call_count();

    let result = harness
        .store
        .update("income-42", UpdateInput::default())
        .await;

    assert!(matches!(result, Err(LedgerError::NotFound(ref id)) if id == "income-42"));
    assert_eq!(harness.income.call_count(), calls);
}

#[tokio::test]
async fn test_update_failure_leaves_cache_untouched() {
    let harness = Harness::seeded().await;
    harness.store.fetch().await.unwrap();
    let before = harness.store.snapshot().await;

    harness.expense.fail_with("timeout").await;
    let result = harness
        .store
        .update(
            "expense-7",
            UpdateInput {
                name: Some("Rent".to_string()),
                ..UpdateInput::default()
            },
        )
        .await;

    assert!(matches!(result, Err(LedgerError::Remote(_))));
    assert_eq!(harness.store.snapshot().await, before);
}

#[tokio::test]
async fn test_delete_removes_entry() {
    let harness = Harness::seeded().await;
    harness.store.fetch().await.unwrap();

    harness.store.delete("income-3").await.unwrap();

    assert_eq!(harness.ids().await, vec!["expense-7", "income-1"]);
    let remaining: Vec<i64> = harness
        .income
        .rows()
        .await
        .unwrap()
        .into_iter()
        .map(|row| row.id)
        .collect();
    assert_eq!(remaining, vec![1, 9]);
    assert_eq!(harness.store.metrics().entries_deleted, 1);
}

#[tokio::test]
async fn test_delete_uncached_id_is_not_found() {
    let harness = Harness::seeded().await;
    let calls = harness.income.call_count();

    // Never fetched, so nothing is cached
    let result = harness.store.delete("income-3").await;

    assert!(matches!(result, Err(LedgerError::NotFound(_))));
    assert_eq!(harness.income.call_count(), calls);
    assert_eq!(harness.income.rows().await.unwrap().len(), 3);
}

#[tokio::test]
async fn test_delete_failure_keeps_entry() {
    let harness = Harness::seeded().await;
    harness.store.fetch().await.unwrap();

    harness.expense.fail_with("permission denied").await;
    let result = harness.store.delete("expense-7").await;

    assert!(result.is_err());
    assert!(harness.store.get("expense-7").await.is_some());
}

#[tokio::test]
async fn test_update_after_delete_does_not_resurrect_entry() {
    let harness = Harness::seeded().await;
    harness.store.fetch().await.unwrap();

    let update = harness.store.update(
        "expense-7",
        UpdateInput {
            name: Some("Rent".to_string()),
            ..UpdateInput::default()
        },
    );
    let delete = harness.store.delete("expense-7");
    let (updated, deleted) = tokio::join!(update, delete);

    deleted.unwrap();
    // The update either landed before the delete or found the row gone
    assert!(
        updated.is_ok()
            || matches!(
                updated,
                Err(LedgerError::NotFound(_))
                    | Err(LedgerError::Remote(RemoteError::RowNotFound { .. }))
            ),
        "{updated:?}"
    );
    assert!(harness.store.get("expense-7").await.is_none());
}

#[tokio::test]
async fn test_summary_totals() {
    let harness = Harness::seeded().await;
    harness.store.fetch().await.unwrap();

    let summary = harness.store.summary().await;

    assert_eq!(summary.total_income, 350.0);
    assert_eq!(summary.total_expense, 80.0);
    assert_eq!(summary.balance, 270.0);
    assert_eq!(summary.income_count, 2);
    assert_eq!(summary.expense_count, 1);
}

#[tokio::test]
async fn test_same_millisecond_ties_keep_income_first() {
    let harness = Harness::new().await;
    harness
        .expense
        .seed(&expense_row(2, BRANCH, "2024-01-02 10:00:00.000200+00", 10.0, "Fees"))
        .await
        .unwrap();
    harness
        .income
        .seed(&income_row(1, BRANCH, "2024-01-02 10:00:00.000100+00", 10.0, "Sales"))
        .await
        .unwrap();

    harness.store.fetch().await.unwrap();

    assert_eq!(harness.ids().await, vec!["income-1", "expense-2"]);
}

fn salary() -> CreateInput {
    CreateInput {
        category: SourceKind::Income,
        name: "Salary".to_string(),
        amount: 5000.0,
        date: None,
        description: None,
    }
}

fn rename() -> UpdateInput {
    UpdateInput {
        name: Some("Rent".to_string()),
        ..UpdateInput::default()
    }
}

#[tokio::test]
async fn test_mutations_after_sign_out_are_authentication_errors() {
    let harness = Harness::seeded().await;
    harness.store.fetch().await.unwrap();
    let before = harness.store.snapshot().await;
    let income_calls = harness.income.call_count();
    let expense_calls = harness.expense.call_count();

    harness.session.sign_out().await;

    let created = harness.store.create(salary()).await;
    assert!(matches!(created, Err(LedgerError::Authentication(_))));

    let updated = harness.store.update("expense-7", rename()).await;
    assert!(matches!(updated, Err(LedgerError::Authentication(_))));

    let deleted = harness.store.delete("income-3").await;
    assert!(matches!(deleted, Err(LedgerError::Authentication(_))));

    assert_eq!(harness.income.call_count(), income_calls);
    assert_eq!(harness.expense.call_count(), expense_calls);
    assert!(harness.income.last_write().await.is_none());
    assert!(harness.expense.last_write().await.is_none());
    assert_eq!(harness.store.snapshot().await, before);
    assert_eq!(harness.store.metrics().mutation_failures, 3);
}

#[tokio::test]
async fn test_mutations_after_branch_removal_are_authorization_errors() {
    let harness = Harness::seeded().await;
    harness.store.fetch().await.unwrap();
    let before = harness.store.snapshot().await;
    let income_calls = harness.income.call_count();
    let expense_calls = harness.expense.call_count();

    harness.profiles.assign(USER, None).await;

    let created = harness.store.create(salary()).await;
    assert!(matches!(created, Err(LedgerError::Authorization { .. })));

    let updated = harness.store.update("expense-7", rename()).await;
    assert!(matches!(updated, Err(LedgerError::Authorization { .. })));

    let deleted = harness.store.delete("income-3").await;
    assert!(matches!(deleted, Err(LedgerError::Authorization { .. })));

    assert_eq!(harness.income.call_count(), income_calls);
    assert_eq!(harness.expense.call_count(), expense_calls);
    assert_eq!(harness.income.rows().await.unwrap().len(), 3);
    assert_eq!(harness.expense.rows().await.unwrap().len(), 2);
    assert_eq!(harness.store.snapshot().await, before);
}

#[tokio::test]
async fn test_create_uses_branch_resolved_at_call_time() {
    let harness = Harness::seeded().await;
    harness.store.fetch().await.unwrap();

    harness.profiles.assign(USER, Some(5)).await;
    let entry = harness.store.create(salary()).await.unwrap();

    assert_eq!(entry.branch_id, Some(5));
    let written = harness.income.last_write().await.unwrap();
    assert_eq!(written.get("branch_id"), Some(&Value::from(5)));
}
