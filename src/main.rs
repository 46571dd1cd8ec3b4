mod aggregator;
mod categorizer;
mod cli;
mod db;
mod error;
mod fmt;
mod insights;
mod models;
mod parser;
mod projector;
mod reports;
mod settings;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::transactions::{EditArgs, RecordArgs};
use cli::{CategoriesCommands, Cli, Commands};

const LOG_ENV: &str = "SWISSTRACK_LOG";

fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    init_tracing();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Init { data_dir } => cli::init::run(data_dir),
        Commands::Add { entry } => cli::transactions::add(&entry),
        Commands::Record {
            amount,
            description,
            category,
            credit,
            installments,
            method,
        } => cli::transactions::record(RecordArgs {
            amount,
            description,
            category,
            credit,
            installments,
            method,
        }),
        Commands::List { month } => cli::transactions::list(month),
        Commands::Edit {
            id,
            amount,
            description,
            category,
            direction,
            installments,
            method,
        } => cli::transactions::edit(
            id,
            EditArgs {
                amount,
                description,
                category,
                direction,
                installments,
                method,
            },
        ),
        Commands::Delete { id } => cli::transactions::delete(id),
        Commands::Report { month } => cli::report::run(month),
        Commands::Budget { amount } => cli::settings::budget(amount),
        Commands::Wage { amount } => cli::settings::wage(amount),
        Commands::Categories { command } => match command {
            CategoriesCommands::List => cli::categories::list(),
            CategoriesCommands::SetBudget {
                name,
                budget,
                threshold,
            } => cli::categories::set_budget(&name, &budget, threshold),
        },
        Commands::Recategorize => cli::categories::recategorize(),
        Commands::Export { output } => cli::export::run(output),
        Commands::Status => cli::status::run(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
