//! Unified income/expense ledger
//!
//! Records live in two remote tables with different shapes. This module maps
//! both into one [`LedgerEntry`] type, keeps a branch-scoped cache of them in
//! a [`LedgerStore`], and builds the per-source write payloads for creates and
//! updates.
//!
//! ## Flow
//!
//! Every store operation resolves the caller's branch through a
//! [`ProfileResolver`](crate::profile::ProfileResolver), talks to the income
//! or expense [`SourceTable`](crate::remote::SourceTable), maps the returned
//! rows, and only then touches the cache. Mutations leave the cache untouched
//! on failure; a failed fetch empties it.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use cashbook::ledger::{CreateInput, LedgerStore, SourceKind};
//!
//! let store = LedgerStore::new(resolver, income_table, expense_table);
//! store.fetch().await?;
//! let entry = store
//!     .create(CreateInput {
//!         category: SourceKind::Income,
//!         name: "Salary".into(),
//!         amount: 5000.0,
//!         date: Some("2024-03-01".into()),
//!         description: None,
//!     })
//!     .await?;
//! ```

pub mod entry;
pub mod error;
pub mod mapping;
pub mod payload;
pub mod store;
pub mod summary;

pub use entry::{CreateInput, LedgerEntry, SourceKind, UpdateInput, entry_id};
pub use error::{LedgerError, Result};
pub use mapping::{format_timestamp, map_expense, map_income, normalize_timestamp, parse_timestamp};
pub use payload::{Payload, insert_payload, update_payload};
pub use store::{LedgerState, LedgerStore};
pub use summary::LedgerSummary;
