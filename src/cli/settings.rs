use crate::cli::open_db;
use crate::db;
use crate::error::{Result, TrackError};
use crate::fmt::money;
use crate::parser::parse_amount;

fn parse_non_negative(raw: &str) -> Result<i64> {
    let cents = parse_amount(raw)?;
    if cents < 0 {
        return Err(TrackError::InvalidAmount(raw.to_string()));
    }
    Ok(cents)
}

pub fn budget(amount: Option<String>) -> Result<()> {
    let conn = open_db()?;
    if let Some(raw) = amount {
        db::set_monthly_budget(&conn, parse_non_negative(&raw)?)?;
    }
    println!("Monthly budget: {}", money(db::get_monthly_budget(&conn)?));
    Ok(())
}

pub fn wage(amount: Option<String>) -> Result<()> {
    let conn = open_db()?;
    if let Some(raw) = amount {
        db::set_hourly_wage(&conn, parse_non_negative(&raw)?)?;
    }
    match db::get_hourly_wage(&conn)? {
        Some(cents) => println!("Hourly wage: {}/h", money(cents)),
        None => println!("Hourly wage: (not set)"),
    }
    Ok(())
}
