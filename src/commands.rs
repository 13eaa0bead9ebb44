use std::sync::Arc;

use cashbook::config::Config;
use cashbook::humanize::format_amount;
use cashbook::ledger::{CreateInput, LedgerEntry, LedgerStore, LedgerSummary, UpdateInput};
use cashbook::profile::ProfileResolver;
use cashbook::remote::{ExpenseRow, IncomeRow, PostgrestClient, RemoteError, SourceTable};
use serde::Serialize;
use tracing::info;

use crate::cli::{AddArgs, Commands, UpdateArgs};

type AnyError = Box<dyn std::error::Error + Send + Sync + 'static>;

pub async fn run(command: Commands, config: &Config) -> Result<(), AnyError> {
    match command {
        Commands::Config => {
            print!("{}", config.to_toml()?);
            Ok(())
        }
        command => run_ledger(command, config).await,
    }
}

async fn run_ledger(command: Commands, config: &Config) -> Result<(), AnyError> {
    let store = build_store(config)?;

    // Update and delete only accept ids already in the cache
    store.fetch().await?;

    match command {
        Commands::List(output) => {
            let entries = store.entries().await;
            if output.json {
                print_json(&entries)?;
            } else {
                print_entries(&entries);
            }
        }
        Commands::Add(args) => {
            let json = args.output.json;
            let entry = store.create(create_input(args)).await?;
            print_entry(&entry, json)?;
        }
        Commands::Update(args) => {
            let json = args.output.json;
            let id = args.id.clone();
            let entry = store.update(&id, update_input(args)).await?;
            print_entry(&entry, json)?;
        }
        Commands::Delete(args) => {
            store.delete(&args.id).await?;
            println!("Deleted {}", args.id);
        }
        Commands::Summary(output) => {
            let summary = store.summary().await;
            if output.json {
                print_json(&summary)?;
            } else {
                print_summary(&summary);
            }
        }
        Commands::Config => {}
    }

    Ok(())
}

/// Wire a ledger store over the configured PostgREST backend
fn build_store(config: &Config) -> Result<LedgerStore, RemoteError> {
    info!(url = %config.remote.url, "Connecting to remote");

    let client = Arc::new(PostgrestClient::new(
        &config.remote,
        &config.tables.profiles,
    )?);

    let resolver = ProfileResolver::new(client.clone(), client.clone());
    let income: Arc<dyn SourceTable<IncomeRow>> =
        Arc::new(client.table::<IncomeRow>(config.tables.income.as_str()));
    let expense: Arc<dyn SourceTable<ExpenseRow>> =
        Arc::new(client.table::<ExpenseRow>(config.tables.expense.as_str()));

    Ok(LedgerStore::new(resolver, income, expense))
}

fn create_input(args: AddArgs) -> CreateInput {
    CreateInput {
        category: args.category,
        name: args.name,
        amount: args.amount,
        date: args.date,
        description: args.description,
    }
}

fn update_input(args: UpdateArgs) -> UpdateInput {
    let description = if args.clear_description {
        Some(None)
    } else {
        args.description.map(Some)
    };

    UpdateInput {
        name: args.name,
        amount: args.amount,
        date: args.date,
        description,
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<(), AnyError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_entry(entry: &LedgerEntry, json: bool) -> Result<(), AnyError> {
    if json {
        print_json(entry)
    } else {
        println!("{}", entry_line(entry));
        Ok(())
    }
}

fn print_entries(entries: &[LedgerEntry]) {
    if entries.is_empty() {
        println!("No entries");
        return;
    }

    for entry in entries {
        println!("{}", entry_line(entry));
    }
}

fn entry_line(entry: &LedgerEntry) -> String {
    let line = format!(
        "{}  {:<16} {:<8} {:<24} {:>14}",
        entry.date.format("%Y-%m-%d"),
        entry.id,
        entry.kind,
        entry.name,
        format_amount(entry.amount)
    );

    match &entry.description {
        Some(description) => format!("{line}  {description}"),
        None => line,
    }
}

fn print_summary(summary: &LedgerSummary) {
    println!(
        "Income   {:>14}  ({} entries)",
        format_amount(summary.total_income),
        summary.income_count
    );
    println!(
        "Expense  {:>14}  ({} entries)",
        format_amount(summary.total_expense),
        summary.expense_count
    );
    println!("Balance  {:>14}", format_amount(summary.balance));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::OutputArgs;
    use cashbook::ledger::SourceKind;
    use chrono::{TimeZone, Utc};

    fn update_args() -> UpdateArgs {
        UpdateArgs {
            id: "expense-7".to_string(),
            name: None,
            amount: None,
            date: None,
            description: None,
            clear_description: false,
            output: OutputArgs { json: false },
        }
    }

    #[test]
    fn test_update_input_leaves_description_untouched_by_default() {
        assert_eq!(update_input(update_args()).description, None);
    }

    #[test]
    fn test_update_input_sets_or_clears_description() {
        let mut args = update_args();
        args.description = Some("deposit".to_string());
        assert_eq!(
            update_input(args).description,
            Some(Some("deposit".to_string()))
        );

        let mut args = update_args();
        args.clear_description = true;
        assert_eq!(update_input(args).description, Some(None));
    }

    #[test]
    fn test_entry_line() {
        let entry = LedgerEntry {
            id: "expense-7".to_string(),
            source_id: 7,
            kind: SourceKind::Expense,
            name: "Rent".to_string(),
            amount: 1250.0,
            date: Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap(),
            description: Some("January".to_string()),
            branch_id: Some(2),
            cashflow_id: None,
        };

        let line = entry_line(&entry);
        assert!(line.starts_with("2024-01-02  expense-7"));
        assert!(line.contains("1,250.00"));
        assert!(line.ends_with("January"));
    }
}
