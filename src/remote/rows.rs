//! Row shapes of the external schema.
//!
//! Every column except `id` is nullable on the remote side, so every field
//! except `id` is optional here. `created_at` stays a raw string because the
//! mapper, not the decoder, decides what to do with unparsable timestamps.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncomeRow {
    pub id: i64,
    #[serde(default)]
    pub branch_id: Option<i64>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub amount: Option<f64>,
    #[serde(default)]
    pub income_type: Option<String>,
    #[serde(default)]
    pub cashflow_id: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpenseRow {
    pub id: i64,
    #[serde(default)]
    pub branch_id: Option<i64>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub amount: Option<f64>,
    #[serde(default)]
    pub expense_category: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub cashflow_id: Option<i64>,
}

/// Profile lookup result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileRow {
    pub id: String,
    #[serde(default)]
    pub branch_id: Option<i64>,
}
