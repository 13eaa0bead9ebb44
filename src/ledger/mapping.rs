//! Row-to-entry mapping and timestamp normalization.
//!
//! Mapping is total: any row that decodes against the external schema maps
//! to a valid entry. Missing labels and amounts get defaults, and a missing
//! or unparsable `created_at` becomes the current time.

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, SubsecRound, Utc};

use super::entry::{LedgerEntry, SourceKind, entry_id};
use crate::remote::rows::{ExpenseRow, IncomeRow};

/// Formats that carry an explicit offset, as Postgres prints them
const OFFSET_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S%.f%#z", "%Y-%m-%dT%H:%M:%S%.f%#z"];

/// Offset-less formats, read as UTC
const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d"];

/// Parse a timestamp in any of the accepted forms
///
/// Accepts RFC 3339, RFC 2822, Postgres text timestamps (`+00` or `+00:00`
/// offsets), offset-less date-times read as UTC, and bare `YYYY-MM-DD` or
/// `YYYY/MM/DD` dates at UTC midnight.
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Some(parsed.with_timezone(&Utc));
    }

    if let Ok(parsed) = DateTime::parse_from_rfc2822(value) {
        return Some(parsed.with_timezone(&Utc));
    }

    for format in OFFSET_FORMATS {
        if let Ok(parsed) = DateTime::parse_from_str(value, format) {
            return Some(parsed.with_timezone(&Utc));
        }
    }

    for format in NAIVE_FORMATS {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(value, format) {
            return Some(parsed.and_utc());
        }
    }

    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(value, format).ok())
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|midnight| midnight.and_utc())
}

/// Parse `value`, falling back to now when absent or unparsable
///
/// The result is truncated to milliseconds, the precision of the serialized
/// form, so rows within the same millisecond compare equal.
pub fn normalize_timestamp(value: Option<&str>) -> DateTime<Utc> {
    value
        .and_then(parse_timestamp)
        .unwrap_or_else(Utc::now)
        .trunc_subsecs(3)
}

/// Serialized form used in write payloads: `2024-03-01T00:00:00.000Z`
pub fn format_timestamp(timestamp: DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub fn map_income(row: &IncomeRow) -> LedgerEntry {
    let kind = SourceKind::Income;
    LedgerEntry {
        id: entry_id(kind, row.id),
        source_id: row.id,
        kind,
        name: row
            .income_type
            .clone()
            .unwrap_or_else(|| kind.default_name().to_string()),
        amount: row.amount.unwrap_or(0.0),
        date: normalize_timestamp(row.created_at.as_deref()),
        description: None,
        branch_id: row.branch_id,
        cashflow_id: row.cashflow_id,
    }
}

pub fn map_expense(row: &ExpenseRow) -> LedgerEntry {
    let kind = SourceKind::Expense;
    LedgerEntry {
        id: entry_id(kind, row.id),
        source_id: row.id,
        kind,
        name: row
            .expense_category
            .clone()
            .unwrap_or_else(|| kind.default_name().to_string()),
        amount: row.amount.unwrap_or(0.0),
        date: normalize_timestamp(row.created_at.as_deref()),
        description: row.description.clone(),
        branch_id: row.branch_id,
        cashflow_id: row.cashflow_id,
    }
}
