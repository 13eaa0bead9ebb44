use serde::Serialize;

use super::entry::{LedgerEntry, SourceKind};

/// Totals over a set of cached entries
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LedgerSummary {
    pub total_income: f64,
    pub total_expense: f64,
    /// `total_income - total_expense`
    pub balance: f64,
    pub income_count: usize,
    pub expense_count: usize,
}

impl LedgerSummary {
    pub fn from_entries<'a>(entries: impl IntoIterator<Item = &'a LedgerEntry>) -> Self {
        let mut summary = Self::default();

        for entry in entries {
            match entry.kind {
                SourceKind::Income => {
                    summary.total_income += entry.amount;
                    summary.income_count += 1;
                }
                SourceKind::Expense => {
                    summary.total_expense += entry.amount;
                    summary.expense_count += 1;
                }
            }
        }

        summary.balance = summary.total_income - summary.total_expense;
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::entry::entry_id;
    use chrono::Utc;

    fn entry(kind: SourceKind, source_id: i64, amount: f64) -> LedgerEntry {
        LedgerEntry {
            id: entry_id(kind, source_id),
            source_id,
            kind,
            name: kind.default_name().to_string(),
            amount,
            date: Utc::now(),
            description: None,
            branch_id: Some(1),
            cashflow_id: None,
        }
    }

    #[test]
    fn test_empty_summary() {
        let summary = LedgerSummary::from_entries(&Vec::<LedgerEntry>::new());
        assert_eq!(summary, LedgerSummary::default());
    }

    #[test]
    fn test_totals_and_balance() {
        let entries = vec![
            entry(SourceKind::Income, 1, 5000.0),
            entry(SourceKind::Expense, 1, 1200.0),
            entry(SourceKind::Income, 2, 250.0),
            entry(SourceKind::Expense, 2, 4500.0),
        ];

        let summary = LedgerSummary::from_entries(&entries);
        assert_eq!(summary.total_income, 5250.0);
        assert_eq!(summary.total_expense, 5700.0);
        assert_eq!(summary.balance, -450.0);
        assert_eq!(summary.income_count, 2);
        assert_eq!(summary.expense_count, 2);
    }
}
