use cashbook::ledger::SourceKind;
use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "cashbook")]
#[command(about = "Branch-scoped income and expense ledger", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List ledger entries, newest first
    List(OutputArgs),
    /// Record a new income or expense entry
    Add(AddArgs),
    /// Edit an existing entry
    Update(UpdateArgs),
    /// Delete an entry
    Delete(DeleteArgs),
    /// Show income, expense and balance totals
    Summary(OutputArgs),
    /// Print the effective configuration (secrets omitted)
    Config,
}

#[derive(clap::Args, Debug)]
pub struct OutputArgs {
    /// Print JSON instead of a table
    #[arg(long)]
    pub json: bool,
}

#[derive(clap::Args, Debug)]
pub struct AddArgs {
    /// income or expense
    #[arg(long)]
    pub category: SourceKind,
    /// Income type or expense category label
    #[arg(long)]
    pub name: String,
    #[arg(long, allow_negative_numbers = true)]
    pub amount: f64,
    /// Entry date, e.g. 2024-03-01; defaults to now
    #[arg(long)]
    pub date: Option<String>,
    /// Expense note; ignored for income
    #[arg(long)]
    pub description: Option<String>,
    #[command(flatten)]
    pub output: OutputArgs,
}

#[derive(clap::Args, Debug)]
pub struct UpdateArgs {
    /// Entry id as shown by `list`, e.g. expense-7
    pub id: String,
    #[arg(long)]
    pub name: Option<String>,
    #[arg(long, allow_negative_numbers = true)]
    pub amount: Option<f64>,
    #[arg(long)]
    pub date: Option<String>,
    #[arg(long, conflicts_with = "clear_description")]
    pub description: Option<String>,
    /// Remove the expense note
    #[arg(long)]
    pub clear_description: bool,
    #[command(flatten)]
    pub output: OutputArgs,
}

#[derive(clap::Args, Debug)]
pub struct DeleteArgs {
    /// Entry id as shown by `list`, e.g. income-3
    pub id: String,
}
