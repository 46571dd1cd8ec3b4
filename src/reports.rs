use chrono::NaiveDateTime;
use rusqlite::Connection;
use tracing::debug;

use crate::aggregator::{aggregate_month, daily_totals, MonthlyAggregate};
use crate::db;
use crate::error::Result;
use crate::insights::{generate_insights, InsightInputs, InsightPolicy};
use crate::models::{Insight, Transaction};
use crate::projector::{project, Projection};

// ---------------------------------------------------------------------------
// Monthly report
// ---------------------------------------------------------------------------

pub struct CategoryLine {
    pub name: String,
    pub spent_cents: i64,
    pub projected_cents: i64,
    pub budget_cents: i64,
    pub alert_threshold: i64,
}

impl CategoryLine {
    /// Spend as a percentage of the category budget; `None` when unbudgeted.
    pub fn usage_pct(&self) -> Option<f64> {
        (self.budget_cents > 0).then(|| self.spent_cents as f64 / self.budget_cents as f64 * 100.0)
    }

    pub fn at_alert(&self) -> bool {
        self.usage_pct()
            .is_some_and(|pct| pct >= self.alert_threshold as f64)
    }
}

pub struct MonthlyReport {
    pub aggregate: MonthlyAggregate,
    pub projection: Projection,
    pub budget_cents: i64,
    pub categories: Vec<CategoryLine>,
    pub daily: Vec<(u32, i64)>,
    pub transactions: Vec<Transaction>,
    pub insights: Vec<Insight>,
}

pub fn get_monthly_report(
    conn: &Connection,
    year: i32,
    month: u32,
    now: NaiveDateTime,
    policy: &InsightPolicy,
) -> Result<MonthlyReport> {
    let transactions = db::list_month_transactions(conn, year, month)?;
    let rules = db::list_category_rules(conn)?;
    let budget_cents = db::get_monthly_budget(conn)?;
    let hourly_wage_cents = db::get_hourly_wage(conn)?;

    let aggregate = aggregate_month(&transactions, &rules, year, month, now)?;
    let projection = project(&aggregate, budget_cents);
    let daily = daily_totals(&transactions, year, month)?;
    debug!(
        year,
        month,
        transactions = transactions.len(),
        total = aggregate.total_cents,
        projected = projection.total_cents,
        "month aggregated"
    );

    let insights = generate_insights(&InsightInputs {
        aggregate: &aggregate,
        projection: &projection,
        rules: &rules,
        history: &transactions,
        monthly_budget_cents: budget_cents,
        hourly_wage_cents,
        now,
        policy,
    });

    // Configured categories in priority order, then any stray labels found
    // only on transactions.
    let mut categories: Vec<CategoryLine> = rules
        .iter()
        .map(|r| CategoryLine {
            name: r.name.clone(),
            spent_cents: aggregate.spent(&r.name),
            projected_cents: projection.projected(&r.name),
            budget_cents: r.budget_cents,
            alert_threshold: r.alert_threshold,
        })
        .collect();
    for (name, spent) in &aggregate.by_category {
        if rules.iter().any(|r| &r.name == name) {
            continue;
        }
        categories.push(CategoryLine {
            name: name.clone(),
            spent_cents: *spent,
            projected_cents: projection.projected(name),
            budget_cents: 0,
            alert_threshold: 0,
        });
    }

    Ok(MonthlyReport {
        aggregate,
        projection,
        budget_cents,
        categories,
        daily,
        transactions,
        insights,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{init_db, insert_transaction, set_hourly_wage, set_monthly_budget};
    use crate::models::{Direction, Severity, TransactionDraft};
    use crate::projector::BudgetStatus;
    use chrono::NaiveDate;
    use tempfile::TempDir;

    fn test_db() -> (TempDir, Connection) {
        let dir = TempDir::new().unwrap();
        let conn = db::get_connection(&dir.path().join("test.db")).unwrap();
        init_db(&conn).unwrap();
        (dir, conn)
    }

    fn at(y: i32, m: u32, d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d).unwrap().and_hms_opt(12, 0, 0).unwrap()
    }

    fn add(conn: &Connection, cents: i64, desc: &str, category: &str, when: NaiveDateTime) {
        let draft = TransactionDraft {
            amount_cents: cents,
            description: desc.to_string(),
            category: category.to_string(),
            direction: Direction::Debit,
            installments: 1,
            payment_method: None,
        };
        insert_transaction(conn, &draft, when).unwrap();
    }

    #[test]
    fn test_empty_month_report() {
        let (_dir, conn) = test_db();
        let report =
            get_monthly_report(&conn, 2025, 2, at(2025, 2, 14), &InsightPolicy::default()).unwrap();
        assert_eq!(report.aggregate.total_cents, 0);
        assert_eq!(report.projection.total_cents, 0);
        assert_eq!(report.projection.status, BudgetStatus::Within);
        assert_eq!(report.daily.len(), 28);
        assert!(report.transactions.is_empty());
        // Default categories (plus the fallback bucket) are all listed.
        assert!(report.categories.iter().any(|c| c.name == "Pets"));
        assert!(report.categories.iter().any(|c| c.name == "Other"));
        // Nothing spent on the temptation category since the 1st.
        assert!(report.insights.iter().any(|i| i.title == "No bad spending"));
    }

    #[test]
    fn test_report_projects_and_flags_overrun() {
        let (_dir, conn) = test_db();
        set_monthly_budget(&conn, 100_000).unwrap();
        set_hourly_wage(&conn, 5_000).unwrap();
        add(&conn, 60_000, "jantar bar", "Social/Lazer", at(2025, 4, 3));
        add(&conn, 10_000, "ração", "Pets", at(2025, 4, 8));
        add(&conn, 99_999, "old", "Mercado", at(2025, 3, 30));

        let report =
            get_monthly_report(&conn, 2025, 4, at(2025, 4, 10), &InsightPolicy::default()).unwrap();
        assert_eq!(report.transactions.len(), 2);
        assert_eq!(report.transactions[0].description, "ração");
        assert_eq!(report.aggregate.total_cents, 70_000);
        assert_eq!(report.projection.total_cents, 210_000);
        assert_eq!(report.projection.status, BudgetStatus::Over);
        assert_eq!(report.daily[2], (3, 60_000));

        let titles: Vec<&str> = report.insights.iter().map(|i| i.title.as_str()).collect();
        assert_eq!(titles[0], "Fast pace");
        assert!(titles.contains(&"Time is money"));
        assert!(report
            .insights
            .iter()
            .any(|i| i.severity == Severity::Warning && i.title.contains("Social/Lazer")));
    }

    #[test]
    fn test_stray_category_gets_a_line() {
        let (_dir, conn) = test_db();
        add(&conn, 1_500, "imported", "Alimentação", at(2025, 5, 2));
        let report =
            get_monthly_report(&conn, 2025, 5, at(2025, 6, 1), &InsightPolicy::default()).unwrap();
        let line = report.categories.iter().find(|c| c.name == "Alimentação").unwrap();
        assert_eq!(line.spent_cents, 1_500);
        assert_eq!(line.usage_pct(), None);
        assert!(!line.at_alert());
    }

    #[test]
    fn test_category_alert_threshold() {
        let line = CategoryLine {
            name: "Mercado".to_string(),
            spent_cents: 70_000,
            projected_cents: 90_000,
            budget_cents: 100_000,
            alert_threshold: 70,
        };
        assert!(line.at_alert());
        let below = CategoryLine { spent_cents: 69_999, ..line };
        assert!(!below.at_alert());
    }
}
