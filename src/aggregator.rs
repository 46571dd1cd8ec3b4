use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate, NaiveDateTime};

use crate::error::{Result, TrackError};
use crate::models::{CategoryRule, Transaction};

#[derive(Debug, Clone, PartialEq)]
pub struct MonthlyAggregate {
    pub year: i32,
    pub month: u32,
    pub start: NaiveDate,
    pub total_cents: i64,
    pub by_category: BTreeMap<String, i64>,
    pub days_elapsed: u32,
    pub days_in_month: u32,
    pub in_progress: bool,
}

impl MonthlyAggregate {
    pub fn spent(&self, category: &str) -> i64 {
        self.by_category.get(category).copied().unwrap_or(0)
    }

    pub fn start_date(&self) -> NaiveDate {
        self.start
    }
}

pub fn month_start(year: i32, month: u32) -> Result<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, 1)
        .ok_or_else(|| TrackError::InvalidPeriod(format!("{year:04}-{month:02}")))
}

pub fn days_in_month(year: i32, month: u32) -> Result<u32> {
    let start = month_start(year, month)?;
    let next = if month == 12 {
        month_start(year + 1, 1)?
    } else {
        month_start(year, month + 1)?
    };
    Ok((next - start).num_days() as u32)
}

/// Day count used as the projection divisor. For the running month this is
/// today's day-of-month (never below 1); any other month counts as complete.
pub fn days_elapsed(year: i32, month: u32, now: NaiveDateTime) -> Result<(u32, bool)> {
    let total = days_in_month(year, month)?;
    if now.year() == year && now.month() == month {
        Ok((now.day().max(1), true))
    } else {
        Ok((total, false))
    }
}

/// Sum a month's transactions per category. Every configured rule gets an
/// entry (zero when unspent) so budget checks see all categories.
pub fn aggregate_month(
    transactions: &[Transaction],
    rules: &[CategoryRule],
    year: i32,
    month: u32,
    now: NaiveDateTime,
) -> Result<MonthlyAggregate> {
    let start = month_start(year, month)?;
    let days_in_month = days_in_month(year, month)?;
    let (days_elapsed, in_progress) = days_elapsed(year, month, now)?;

    let mut by_category: BTreeMap<String, i64> =
        rules.iter().map(|r| (r.name.clone(), 0)).collect();
    let mut total_cents = 0i64;

    for txn in transactions
        .iter()
        .filter(|t| t.created_at.year() == year && t.created_at.month() == month)
    {
        let spent = by_category.entry(txn.category.clone()).or_insert(0);
        *spent = spent.saturating_add(txn.amount_cents);
        total_cents = total_cents.saturating_add(txn.amount_cents);
    }

    Ok(MonthlyAggregate {
        year,
        month,
        start,
        total_cents,
        by_category,
        days_elapsed,
        days_in_month,
        in_progress,
    })
}

/// Spend per day-of-month, one entry for every day of the month.
pub fn daily_totals(transactions: &[Transaction], year: i32, month: u32) -> Result<Vec<(u32, i64)>> {
    let days = days_in_month(year, month)?;
    let mut totals: Vec<(u32, i64)> = (1..=days).map(|d| (d, 0)).collect();
    for txn in transactions
        .iter()
        .filter(|t| t.created_at.year() == year && t.created_at.month() == month)
    {
        let idx = (txn.created_at.day() - 1) as usize;
        totals[idx].1 = totals[idx].1.saturating_add(txn.amount_cents);
    }
    Ok(totals)
}
