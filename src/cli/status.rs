use crate::db::{get_connection, get_hourly_wage, get_monthly_budget, DB_FILE};
use crate::error::Result;
use crate::fmt::money;
use crate::settings::load_settings;

pub fn run() -> Result<()> {
    let settings = load_settings();
    let data_dir = std::path::PathBuf::from(&settings.data_dir);
    let db_path = data_dir.join(DB_FILE);

    println!("Data dir:     {}", data_dir.display());
    println!("Database:     {}", db_path.display());

    if db_path.exists() {
        let conn = get_connection(&db_path)?;
        let transactions: i64 =
            conn.query_row("SELECT count(*) FROM transactions", [], |r| r.get(0))?;
        let categories: i64 =
            conn.query_row("SELECT count(*) FROM categories", [], |r| r.get(0))?;
        let wage = get_hourly_wage(&conn)?
            .map(|w| format!("{}/h", money(w)))
            .unwrap_or_else(|| "(not set)".to_string());

        println!();
        println!("Transactions: {transactions}");
        println!("Categories:   {categories}");
        println!("Budget:       {}", money(get_monthly_budget(&conn)?));
        println!("Hourly wage:  {wage}");
        println!(
            "Goal rate:    {:.2} per {}",
            settings.insights.exchange_rate, settings.insights.secondary_currency
        );
    } else {
        println!();
        println!("Database not found. Run `swisstrack init` to set up.");
    }

    Ok(())
}
