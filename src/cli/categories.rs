use comfy_table::{Cell, Table};
use tracing::info;

use crate::categorizer::recategorize_legacy;
use crate::cli::{open_db, resolve_category};
use crate::db;
use crate::error::{Result, TrackError};
use crate::fmt::money;
use crate::parser::parse_amount;
use crate::settings::load_settings;

pub fn list() -> Result<()> {
    let conn = open_db()?;
    let rules = db::list_category_rules(&conn)?;

    let mut table = Table::new();
    table.set_header(vec!["#", "Category", "Budget", "Alert", "Keywords"]);
    for (i, rule) in rules.iter().enumerate() {
        let budget = if rule.has_budget() {
            money(rule.budget_cents)
        } else {
            "-".to_string()
        };
        table.add_row(vec![
            Cell::new(i + 1),
            Cell::new(&rule.name),
            Cell::new(budget),
            Cell::new(format!("{}%", rule.alert_threshold)),
            Cell::new(rule.keywords.join(", ")),
        ]);
    }
    println!("{table}");
    Ok(())
}

pub fn set_budget(name: &str, budget: &str, threshold: Option<i64>) -> Result<()> {
    let conn = open_db()?;
    let rules = db::list_category_rules(&conn)?;
    let name = resolve_category(name, &rules)?;
    let cents = parse_amount(budget)?;
    if cents < 0 {
        return Err(TrackError::InvalidAmount(budget.to_string()));
    }
    if let Some(t) = threshold {
        if !(0..=100).contains(&t) {
            return Err(TrackError::Other(format!(
                "Alert threshold must be between 0 and 100, got {t}"
            )));
        }
    }
    db::update_category_budget(&conn, &name, cents, threshold)?;
    info!(category = %name, budget = cents, "category budget updated");
    println!("{name}: budget {}", money(cents));
    Ok(())
}

pub fn recategorize() -> Result<()> {
    let settings = load_settings();
    let conn = open_db()?;
    let changed = recategorize_legacy(&conn, &settings.legacy_categories)?;
    println!("Recategorized {changed} transaction(s).");
    Ok(())
}
