use colored::Colorize;
use comfy_table::{Cell, Table};
use tracing::info;

use crate::categorizer::match_category;
use crate::cli::{now, open_db, parse_month_opt, resolve_category};
use crate::db;
use crate::error::{Result, TrackError};
use crate::fmt::money;
use crate::models::{CategoryRule, Direction, Transaction, TransactionDraft};
use crate::parser::{parse_amount, parse_entry};

fn describe(draft: &TransactionDraft) -> String {
    let mut extra = Vec::new();
    if draft.installments > 1 {
        extra.push(format!("{}x", draft.installments));
    }
    if let Some(method) = &draft.payment_method {
        extra.push(method.clone());
    }
    let extra = if extra.is_empty() {
        String::new()
    } else {
        format!(" ({})", extra.join(", "))
    };
    format!(
        "{} {} \u{2192} {} [{}]{extra}",
        money(draft.amount_cents),
        draft.description,
        draft.category.bold(),
        draft.direction,
    )
}

/// Free-text entry: `AMOUNT DESCRIPTION [METHOD] [Nx]`.
pub fn add(entry: &[String]) -> Result<()> {
    let conn = open_db()?;
    let rules = db::list_category_rules(&conn)?;
    let draft = parse_entry(&entry.join(" "), &rules)?;
    let id = db::insert_transaction(&conn, &draft, now())?;
    info!(id, category = %draft.category, "transaction added");
    println!("Added #{id}: {}", describe(&draft));
    Ok(())
}

pub struct RecordArgs {
    pub amount: String,
    pub description: String,
    pub category: Option<String>,
    pub credit: bool,
    pub installments: u32,
    pub method: Option<String>,
}

pub fn record(args: RecordArgs) -> Result<()> {
    let conn = open_db()?;
    let rules = db::list_category_rules(&conn)?;

    let description = args.description.trim().to_string();
    if description.is_empty() {
        return Err(TrackError::MissingDescription);
    }
    let category = match &args.category {
        Some(name) => resolve_category(name, &rules)?,
        None => match_category(&description, &rules),
    };
    let installments = args.installments.max(1);
    let payment_method = args
        .method
        .map(|m| m.trim().to_lowercase())
        .filter(|m| !m.is_empty());
    let direction = if args.credit || installments > 1 {
        Direction::Credit
    } else {
        Direction::Debit
    };

    let draft = TransactionDraft {
        amount_cents: parse_amount(&args.amount)?,
        description,
        category,
        direction,
        installments,
        payment_method,
    };
    let id = db::insert_transaction(&conn, &draft, now())?;
    info!(id, category = %draft.category, "transaction recorded");
    println!("Added #{id}: {}", describe(&draft));
    Ok(())
}

pub fn transactions_table(rows: &[Transaction]) -> Table {
    let mut table = Table::new();
    table.set_header(vec!["ID", "Date", "Description", "Category", "Type", "Amount", "Method"]);
    for t in rows {
        let kind = if t.installments > 1 {
            format!("{} {}x", t.direction, t.installments)
        } else {
            t.direction.to_string()
        };
        table.add_row(vec![
            Cell::new(t.id),
            Cell::new(t.created_at.format("%Y-%m-%d %H:%M")),
            Cell::new(&t.description),
            Cell::new(&t.category),
            Cell::new(kind),
            Cell::new(money(t.amount_cents)),
            Cell::new(t.payment_method.as_deref().unwrap_or("")),
        ]);
    }
    table
}

pub fn list(month: Option<String>) -> Result<()> {
    let conn = open_db()?;
    let (year, month) = parse_month_opt(&month, now())?;
    let rows = db::list_month_transactions(&conn, year, month)?;
    if rows.is_empty() {
        println!("No transactions for {year:04}-{month:02}.");
        return Ok(());
    }
    let total: i64 = rows.iter().map(|t| t.amount_cents).sum();
    println!("Transactions {year:04}-{month:02}\n{}", transactions_table(&rows));
    println!("{} {}", "Total:".bold(), money(total));
    Ok(())
}

pub struct EditArgs {
    pub amount: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub direction: Option<String>,
    pub installments: Option<u32>,
    pub method: Option<String>,
}

/// Merge edit arguments into a stored transaction. Omitted fields keep their
/// value; more than one installment means credit unless `--type` says
/// otherwise.
pub fn apply_edit(
    current: Transaction,
    args: EditArgs,
    rules: &[CategoryRule],
) -> Result<TransactionDraft> {
    let mut draft = TransactionDraft {
        amount_cents: current.amount_cents,
        description: current.description,
        category: current.category,
        direction: current.direction,
        installments: current.installments,
        payment_method: current.payment_method,
    };
    if let Some(amount) = &args.amount {
        draft.amount_cents = parse_amount(amount)?;
    }
    if let Some(desc) = args.description {
        let desc = desc.trim().to_string();
        if desc.is_empty() {
            return Err(TrackError::MissingDescription);
        }
        draft.description = desc;
    }
    if let Some(name) = &args.category {
        draft.category = resolve_category(name, rules)?;
    }
    if let Some(n) = args.installments {
        draft.installments = n.max(1);
    }
    match &args.direction {
        Some(kind) => draft.direction = kind.parse()?,
        None if draft.installments > 1 => draft.direction = Direction::Credit,
        None => {}
    }
    if let Some(method) = args.method {
        let method = method.trim().to_lowercase();
        draft.payment_method = (!method.is_empty()).then_some(method);
    }
    Ok(draft)
}

pub fn edit(id: i64, args: EditArgs) -> Result<()> {
    let conn = open_db()?;
    let rules = db::list_category_rules(&conn)?;
    let current = db::get_transaction(&conn, id)?;
    let draft = apply_edit(current, args, &rules)?;

    db::update_transaction(&conn, id, &draft)?;
    info!(id, "transaction updated");
    println!("Updated #{id}: {}", describe(&draft));
    Ok(())
}

pub fn delete(id: i64) -> Result<()> {
    let conn = open_db()?;
    db::delete_transaction(&conn, id)?;
    info!(id, "transaction deleted");
    println!("Deleted #{id}");
    Ok(())
}
