//! Write payloads for the two sources.
//!
//! Column routing is a function of [`SourceKind`] alone: the label goes to
//! `income_type` or `expense_category`, and `description` only ever reaches
//! the expense source.

use serde_json::{Map, Value};

use super::entry::{CreateInput, SourceKind, UpdateInput};
use super::mapping::{format_timestamp, normalize_timestamp, parse_timestamp};
use crate::profile::Profile;

/// Column-keyed JSON object sent to a source table
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Payload(Map<String, Value>);

impl Payload {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, column: &str, value: impl Into<Value>) {
        self.0.insert(column.to_string(), value.into());
    }

    pub fn remove(&mut self, column: &str) -> Option<Value> {
        self.0.remove(column)
    }

    pub fn get(&self, column: &str) -> Option<&Value> {
        self.0.get(column)
    }

    pub fn contains_key(&self, column: &str) -> bool {
        self.0.contains_key(column)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }
}

/// Full row for a new entry in `input.category`'s source
///
/// New entries are always scoped to the resolved branch and start without a
/// cashflow link.
pub fn insert_payload(input: &CreateInput, profile: &Profile) -> Payload {
    let created_at = normalize_timestamp(input.date.as_deref());

    let mut payload = Payload::new();
    payload.set("branch_id", profile.branch_id);
    payload.set("amount", input.amount);
    payload.set("created_at", format_timestamp(created_at));
    payload.set("cashflow_id", Value::Null);
    payload.set(input.category.name_column(), input.name.as_str());

    if input.category.has_description() {
        payload.set("description", input.description.clone());
    }

    payload
}

/// Sparse diff against an existing entry of kind `kind`
///
/// A supplied date that does not parse is dropped rather than rejected.
pub fn update_payload(input: &UpdateInput, kind: SourceKind) -> Payload {
    let mut diff = Payload::new();

    if let Some(amount) = input.amount {
        diff.set("amount", amount);
    }

    if let Some(timestamp) = input.date.as_deref().and_then(parse_timestamp) {
        diff.set("created_at", format_timestamp(timestamp));
    }

    if let Some(description) = &input.description {
        diff.set("description", description.clone());
    }

    if let Some(name) = &input.name {
        diff.set(kind.name_column(), name.as_str());
    }

    if !kind.has_description() {
        diff.remove("description");
    }

    diff
}
