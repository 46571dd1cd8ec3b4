pub mod categories;
pub mod export;
pub mod init;
pub mod report;
pub mod settings;
pub mod status;
pub mod transactions;

use chrono::{Datelike, NaiveDateTime};
use clap::{Parser, Subcommand};
use rusqlite::Connection;

use crate::db::get_connection;
use crate::error::{Result, TrackError};
use crate::models::CategoryRule;
use crate::settings::db_path;

/// Parse an optional `YYYY-MM` argument, defaulting to the month of `now`.
pub(crate) fn parse_month_opt(month: &Option<String>, now: NaiveDateTime) -> Result<(i32, u32)> {
    let Some(raw) = month else {
        return Ok((now.year(), now.month()));
    };
    let invalid = || TrackError::InvalidPeriod(format!("'{raw}' (expected YYYY-MM)"));
    let (y, m) = raw.trim().split_once('-').ok_or_else(invalid)?;
    let year: i32 = y.parse().map_err(|_| invalid())?;
    let month: u32 = m.parse().map_err(|_| invalid())?;
    if !(1..=12).contains(&month) {
        return Err(invalid());
    }
    Ok((year, month))
}

pub(crate) fn now() -> NaiveDateTime {
    chrono::Local::now().naive_local()
}

pub(crate) fn open_db() -> Result<Connection> {
    let path = db_path();
    if !path.exists() {
        return Err(TrackError::Other(format!(
            "Database not found at {}. Run `swisstrack init` first.",
            path.display()
        )));
    }
    get_connection(&path)
}

/// Resolve a user-typed category name against the configured rules,
/// ignoring case. Returns the stored spelling.
pub(crate) fn resolve_category(name: &str, rules: &[CategoryRule]) -> Result<String> {
    let wanted = name.trim().to_lowercase();
    rules
        .iter()
        .find(|r| r.name.to_lowercase() == wanted)
        .map(|r| r.name.clone())
        .ok_or_else(|| TrackError::UnknownCategory(name.to_string()))
}

#[derive(Parser)]
#[command(
    name = "swisstrack",
    version,
    about = "Personal spending tracker: free-text entries, budget projection and behavioral insights."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Choose a data directory and initialize the database.
    Init {
        /// Path for SwissTrack data (default: ~/Documents/swisstrack)
        #[arg(long = "data-dir")]
        data_dir: Option<String>,
    },
    /// Add a transaction from free text, e.g. `swisstrack add 120 ifood nubank`.
    Add {
        /// AMOUNT DESCRIPTION [PAYMENT METHOD] [Nx]
        #[arg(required = true, num_args = 1.., allow_hyphen_values = true)]
        entry: Vec<String>,
    },
    /// Add a transaction from explicit fields.
    Record {
        /// Amount, e.g. 42.50 or 42,50
        #[arg(long, allow_hyphen_values = true)]
        amount: String,
        #[arg(long)]
        description: String,
        /// Category name (default: matched from the description)
        #[arg(long)]
        category: Option<String>,
        /// Record as a credit purchase
        #[arg(long)]
        credit: bool,
        #[arg(long, default_value_t = 1)]
        installments: u32,
        /// Payment method, e.g. nubank
        #[arg(long)]
        method: Option<String>,
    },
    /// List a month's transactions.
    List {
        /// Month: YYYY-MM (default: current month)
        #[arg(long)]
        month: Option<String>,
    },
    /// Edit a stored transaction. Omitted fields keep their value.
    Edit {
        id: i64,
        #[arg(long, allow_hyphen_values = true)]
        amount: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        category: Option<String>,
        /// Transaction type: debit or credit
        #[arg(long = "type")]
        direction: Option<String>,
        #[arg(long)]
        installments: Option<u32>,
        #[arg(long)]
        method: Option<String>,
    },
    /// Delete a stored transaction.
    Delete { id: i64 },
    /// Monthly report: totals, projection, categories and insights.
    Report {
        /// Month: YYYY-MM (default: current month)
        #[arg(long)]
        month: Option<String>,
    },
    /// Show or set the global monthly budget.
    Budget {
        /// New budget amount
        amount: Option<String>,
    },
    /// Show or set the hourly wage used by the time-cost insight.
    Wage {
        /// New hourly wage (0 clears it)
        amount: Option<String>,
    },
    /// Manage categories and their budgets.
    Categories {
        #[command(subcommand)]
        command: CategoriesCommands,
    },
    /// Re-match transactions left in legacy or empty categories.
    Recategorize,
    /// Export all transactions to CSV.
    Export {
        /// Output path (default: <data_dir>/exports/swisstrack-YYYY-MM-DD.csv)
        #[arg(long)]
        output: Option<String>,
    },
    /// Show current database and summary statistics.
    Status,
}

#[derive(Subcommand)]
pub enum CategoriesCommands {
    /// List categories in matching priority order.
    List,
    /// Set a category's monthly budget and alert threshold.
    SetBudget {
        name: String,
        #[arg(long)]
        budget: String,
        /// Alert threshold percent
        #[arg(long)]
        threshold: Option<i64>,
    },
}
