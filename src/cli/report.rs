use colored::Colorize;
use comfy_table::{Cell, Table};

use crate::cli::transactions::transactions_table;
use crate::cli::{now, open_db, parse_month_opt};
use crate::error::Result;
use crate::fmt::money;
use crate::models::Severity;
use crate::projector::BudgetStatus;
use crate::reports::{get_monthly_report, MonthlyReport};
use crate::settings::load_settings;

pub fn run(month: Option<String>) -> Result<()> {
    let settings = load_settings();
    let conn = open_db()?;
    let now = now();
    let (year, month) = parse_month_opt(&month, now)?;
    let report = get_monthly_report(&conn, year, month, now, &settings.insights)?;
    print!("{}", format_report(&report));
    Ok(())
}

fn summary_table(report: &MonthlyReport) -> Table {
    let agg = &report.aggregate;
    let status = match report.projection.status {
        BudgetStatus::Within => report.projection.status.label().green().bold(),
        BudgetStatus::Over => report.projection.status.label().red().bold(),
    };
    let period = if agg.in_progress {
        format!("day {} of {}", agg.days_elapsed, agg.days_in_month)
    } else {
        format!("{} days (closed)", agg.days_in_month)
    };

    let mut table = Table::new();
    table.set_header(vec!["", ""]);
    table.add_row(vec![Cell::new("Period"), Cell::new(period)]);
    table.add_row(vec![Cell::new("Spent"), Cell::new(money(agg.total_cents))]);
    table.add_row(vec![Cell::new("Budget"), Cell::new(money(report.budget_cents))]);
    table.add_row(vec![
        Cell::new("Budget used"),
        Cell::new(format!("{:.1}%", report.projection.budget_usage_pct)),
    ]);
    table.add_row(vec![
        Cell::new("Projected"),
        Cell::new(money(report.projection.total_cents)),
    ]);
    table.add_row(vec![Cell::new("Status"), Cell::new(status)]);
    table
}

fn category_table(report: &MonthlyReport) -> Table {
    let mut table = Table::new();
    table.set_header(vec!["Category", "Spent", "Projected", "Budget", "%"]);
    for line in &report.categories {
        if line.spent_cents == 0 && line.budget_cents == 0 {
            continue;
        }
        let budget = if line.budget_cents > 0 {
            money(line.budget_cents)
        } else {
            "-".to_string()
        };
        let pct = match line.usage_pct() {
            Some(pct) if line.at_alert() => format!("{pct:.0}%").red().to_string(),
            Some(pct) => format!("{pct:.0}%"),
            None => String::new(),
        };
        table.add_row(vec![
            Cell::new(&line.name),
            Cell::new(money(line.spent_cents)),
            Cell::new(money(line.projected_cents)),
            Cell::new(budget),
            Cell::new(pct),
        ]);
    }
    table
}

fn daily_table(report: &MonthlyReport) -> Option<Table> {
    let days: Vec<&(u32, i64)> = report.daily.iter().filter(|(_, cents)| *cents != 0).collect();
    if days.is_empty() {
        return None;
    }
    let mut table = Table::new();
    table.set_header(vec!["Day", "Spent"]);
    for (day, cents) in days {
        table.add_row(vec![Cell::new(day), Cell::new(money(*cents))]);
    }
    Some(table)
}

/// Render the whole report as terminal text.
pub fn format_report(report: &MonthlyReport) -> String {
    let agg = &report.aggregate;
    let mut out = format!(
        "{}\n{}\n",
        format!("Report {:04}-{:02}", agg.year, agg.month).bold(),
        summary_table(report)
    );

    out.push_str(&format!("\nBy category\n{}\n", category_table(report)));

    if let Some(table) = daily_table(report) {
        out.push_str(&format!("\nDaily spend\n{table}\n"));
    }

    if !report.insights.is_empty() {
        out.push_str(&format!("\n{}\n", "Insights".bold()));
        for insight in &report.insights {
            let title = match insight.severity {
                Severity::Info => insight.title.cyan(),
                Severity::Warning => insight.title.yellow(),
                Severity::Success => insight.title.green(),
            };
            let value = insight
                .value
                .as_deref()
                .map(|v| format!(" [{v}]"))
                .unwrap_or_default();
            out.push_str(&format!("{} {title}{value}: {}\n", insight.icon, insight.message));
        }
    }

    if !report.transactions.is_empty() {
        out.push_str(&format!(
            "\nTransactions\n{}\n",
            transactions_table(&report.transactions)
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{get_connection, init_db, insert_transaction};
    use crate::insights::InsightPolicy;
    use crate::models::{Direction, TransactionDraft};
    use chrono::NaiveDate;

    #[test]
    fn test_format_report_sections() {
        colored::control::set_override(false);
        let dir = tempfile::tempdir().unwrap();
        let conn = get_connection(&dir.path().join("test.db")).unwrap();
        init_db(&conn).unwrap();
        let when = NaiveDate::from_ymd_opt(2025, 4, 5).unwrap().and_hms_opt(20, 0, 0).unwrap();
        let draft = TransactionDraft {
            amount_cents: 12_000,
            description: "ifood".to_string(),
            category: "Plantão/Rua".to_string(),
            direction: Direction::Credit,
            installments: 1,
            payment_method: Some("nubank".to_string()),
        };
        insert_transaction(&conn, &draft, when).unwrap();

        let now = NaiveDate::from_ymd_opt(2025, 4, 10).unwrap().and_hms_opt(9, 0, 0).unwrap();
        let report = get_monthly_report(&conn, 2025, 4, now, &InsightPolicy::default()).unwrap();
        let text = format_report(&report);

        assert!(text.contains("Report 2025-04"));
        assert!(text.contains("day 10 of 30"));
        assert!(text.contains("R$ 120,00"));
        assert!(text.contains("R$ 360,00"));
        assert!(text.contains("Plantão/Rua"));
        assert!(text.contains("Daily spend"));
        assert!(text.contains("within budget"));
        assert!(text.contains("ifood"));
    }
}
