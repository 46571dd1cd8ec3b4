use std::collections::BTreeMap;

use crate::aggregator::MonthlyAggregate;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BudgetStatus {
    Within,
    Over,
}

impl BudgetStatus {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Within => "within budget",
            Self::Over => "over",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Projection {
    pub total_cents: i64,
    pub by_category: BTreeMap<String, i64>,
    pub status: BudgetStatus,
    /// Actual spend as a share of the global budget, clamped to 0..=100.
    pub budget_usage_pct: f64,
}

impl Projection {
    pub fn projected(&self, category: &str) -> i64 {
        self.by_category.get(category).copied().unwrap_or(0)
    }
}

/// Linear end-of-month estimate for one amount. Integer arithmetic keeps the
/// result equal to `(spend / days_elapsed) * days_in_month`, truncated to
/// whole minor units and saturated at the `i64` range.
pub fn project_amount(spend_cents: i64, days_elapsed: u32, days_in_month: u32, in_progress: bool) -> i64 {
    if !in_progress {
        return spend_cents;
    }
    let elapsed = i128::from(days_elapsed.max(1));
    let projected = i128::from(spend_cents) * i128::from(days_in_month) / elapsed;
    projected.clamp(i128::from(i64::MIN), i128::from(i64::MAX)) as i64
}

pub fn budget_usage_pct(total_cents: i64, budget_cents: i64) -> f64 {
    if budget_cents <= 0 {
        return 0.0;
    }
    (total_cents as f64 / budget_cents as f64 * 100.0).clamp(0.0, 100.0)
}

pub fn project(aggregate: &MonthlyAggregate, budget_cents: i64) -> Projection {
    let by_category: BTreeMap<String, i64> = aggregate
        .by_category
        .iter()
        .map(|(name, spent)| {
            let projected = project_amount(
                *spent,
                aggregate.days_elapsed,
                aggregate.days_in_month,
                aggregate.in_progress,
            );
            (name.clone(), projected)
        })
        .collect();
    let total_cents = by_category
        .values()
        .fold(0i64, |acc, v| acc.saturating_add(*v));

    let status = if total_cents > budget_cents {
        BudgetStatus::Over
    } else {
        BudgetStatus::Within
    };

    Projection {
        total_cents,
        by_category,
        status,
        budget_usage_pct: budget_usage_pct(aggregate.total_cents, budget_cents),
    }
}
