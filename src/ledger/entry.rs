use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Which backing source an entry lives in
///
/// Doubles as the entry's category: an income entry always comes from the
/// income source and can never move to the other one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Income,
    Expense,
}

impl SourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::Income => "income",
            SourceKind::Expense => "expense",
        }
    }

    /// Column that stores the entry's display label
    pub fn name_column(&self) -> &'static str {
        match self {
            SourceKind::Income => "income_type",
            SourceKind::Expense => "expense_category",
        }
    }

    /// Whether the source has a `description` column
    pub fn has_description(&self) -> bool {
        matches!(self, SourceKind::Expense)
    }

    /// Label used when the source row has none
    pub fn default_name(&self) -> &'static str {
        match self {
            SourceKind::Income => "Income",
            SourceKind::Expense => "Expense",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for SourceKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "income" => Ok(SourceKind::Income),
            "expense" => Ok(SourceKind::Expense),
            other => Err(format!("unknown category '{other}', expected income or expense")),
        }
    }
}

/// Ledger id for a source row: `income-3`, `expense-7`
pub fn entry_id(kind: SourceKind, source_id: i64) -> String {
    format!("{}-{}", kind.as_str(), source_id)
}

/// One income or expense record in the unified ledger
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub id: String,
    pub source_id: i64,
    #[serde(rename = "category")]
    pub kind: SourceKind,
    pub name: String,
    pub amount: f64,
    pub date: DateTime<Utc>,
    /// Always `None` for income entries
    pub description: Option<String>,
    pub branch_id: Option<i64>,
    pub cashflow_id: Option<i64>,
}

impl LedgerEntry {
    /// The table this entry lives in
    pub fn source_kind(&self) -> SourceKind {
        self.kind
    }

    pub fn category(&self) -> SourceKind {
        self.kind
    }
}

/// Fields for a new entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateInput {
    pub category: SourceKind,
    pub name: String,
    pub amount: f64,
    /// Any form [`parse_timestamp`](super::mapping::parse_timestamp) accepts;
    /// missing or unparsable means "now"
    #[serde(default)]
    pub date: Option<String>,
    /// Ignored for income entries
    #[serde(default)]
    pub description: Option<String>,
}

/// Sparse edit of an existing entry; `None` leaves a field untouched
///
/// `description` distinguishes "not supplied" (`None`) from an explicit
/// clear (`Some(None)`).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpdateInput {
    pub name: Option<String>,
    pub amount: Option<f64>,
    pub date: Option<String>,
    pub description: Option<Option<String>>,
}
