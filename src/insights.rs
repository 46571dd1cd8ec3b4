//! Behavioral insight rules.
//!
//! Each rule is a plain function over the same read-only inputs and returns
//! zero or more insights. `generate_insights` runs them in a fixed order and
//! concatenates the results; no rule sees another rule's output.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::aggregator::MonthlyAggregate;
use crate::fmt::money;
use crate::models::{CategoryRule, Insight, Severity, Transaction};
use crate::projector::Projection;

pub const FAST_PACE: f64 = 1.15;
pub const ECONOMIC_PACE: f64 = 0.85;
pub const ECONOMIC_PACE_MIN_DAYS: u32 = 10;
pub const VILLAIN_MIN_OVERAGE: f64 = 50.0;
pub const EARLY_DEVIATION_MAX_DAY: u32 = 20;
pub const EARLY_DEVIATION_RATIO: f64 = 0.80;
pub const TIME_COST_MIN_CENTS: i64 = 10_000;
pub const SAVINGS_MIN_SECONDARY: f64 = 5.0;
pub const STREAK_MIN_DAYS: i64 = 2;

/// Which categories the behavioral rules look at, and how savings are
/// converted into the goal currency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InsightPolicy {
    /// Primary-currency units per one unit of the secondary currency.
    pub exchange_rate: f64,
    pub secondary_currency: String,
    pub temptation_category: String,
    pub savings_categories: Vec<String>,
    pub leisure_categories: Vec<String>,
}

impl Default for InsightPolicy {
    fn default() -> Self {
        Self {
            exchange_rate: 6.50,
            secondary_currency: "CHF".to_string(),
            temptation_category: "Plantão/Rua".to_string(),
            savings_categories: vec!["Mercado".to_string(), "Plantão/Rua".to_string()],
            leisure_categories: vec![
                "Social/Lazer".to_string(),
                "Tech/Simulação".to_string(),
                "Moto/Hobby".to_string(),
            ],
        }
    }
}

impl InsightPolicy {
    pub fn is_leisure(&self, category: &str) -> bool {
        self.leisure_categories.iter().any(|c| c == category)
    }
}

pub struct InsightInputs<'a> {
    pub aggregate: &'a MonthlyAggregate,
    pub projection: &'a Projection,
    pub rules: &'a [CategoryRule],
    /// Must be ordered most recent first.
    pub history: &'a [Transaction],
    pub monthly_budget_cents: i64,
    pub hourly_wage_cents: Option<i64>,
    pub now: NaiveDateTime,
    pub policy: &'a InsightPolicy,
}

fn budgeted(rules: &[CategoryRule]) -> impl Iterator<Item = &CategoryRule> {
    rules.iter().filter(|r| r.has_budget())
}

pub type InsightRule = fn(&InsightInputs<'_>) -> Vec<Insight>;

pub const RULES: &[(&str, InsightRule)] = &[
    ("pace", pace),
    ("villain", villain_category),
    ("early_deviation", early_deviation),
    ("time_cost", time_cost),
    ("savings", savings_toward_goal),
    ("streak", discipline_streak),
];

pub fn generate_insights(inputs: &InsightInputs<'_>) -> Vec<Insight> {
    RULES
        .iter()
        .flat_map(|(name, rule)| {
            let emitted = rule(inputs);
            debug!(rule = *name, emitted = emitted.len(), "insight rule evaluated");
            emitted
        })
        .collect()
}

/// Budget-usage fraction divided by elapsed-time fraction. `None` when no
/// global budget is set.
pub fn pace_ratio(aggregate: &MonthlyAggregate, budget_cents: i64) -> Option<f64> {
    if budget_cents <= 0 {
        return None;
    }
    let days_pct = f64::from(aggregate.days_elapsed.max(1)) / f64::from(aggregate.days_in_month);
    let usage_pct = aggregate.total_cents as f64 / budget_cents as f64;
    Some(usage_pct / days_pct)
}

pub fn pace(inputs: &InsightInputs<'_>) -> Vec<Insight> {
    let agg = inputs.aggregate;
    if !agg.in_progress {
        return Vec::new();
    }
    let Some(pace) = pace_ratio(agg, inputs.monthly_budget_cents) else {
        return Vec::new();
    };
    let days_pct = f64::from(agg.days_elapsed) / f64::from(agg.days_in_month) * 100.0;
    let usage_pct = agg.total_cents as f64 / inputs.monthly_budget_cents as f64 * 100.0;

    if pace > FAST_PACE {
        vec![Insight {
            severity: Severity::Warning,
            icon: "🔥",
            title: "Fast pace".to_string(),
            message: format!(
                "Today is day {} ({}% of the month), but you have already used {}% of the budget.",
                agg.days_elapsed, days_pct as i64, usage_pct as i64
            ),
            value: Some(format!("{pace:.2}x")),
        }]
    } else if pace < ECONOMIC_PACE && agg.days_elapsed > ECONOMIC_PACE_MIN_DAYS {
        vec![Insight {
            severity: Severity::Success,
            icon: "🌱",
            title: "Economic pace".to_string(),
            message: "You are spending slower than the month is passing. Great for saving!".to_string(),
            value: Some(format!("{pace:.2}x")),
        }]
    } else {
        Vec::new()
    }
}

/// The budgeted category with the largest projected overage. Ties go to the
/// category listed first.
pub fn villain_category(inputs: &InsightInputs<'_>) -> Vec<Insight> {
    let mut villain: Option<(&str, i64)> = None;
    for rule in budgeted(inputs.rules) {
        let over = inputs.projection.projected(&rule.name).saturating_sub(rule.budget_cents);
        if over > 0 && villain.map_or(true, |(_, max)| over > max) {
            villain = Some((rule.name.as_str(), over));
        }
    }

    match villain {
        Some((name, over)) if over as f64 / 100.0 > VILLAIN_MIN_OVERAGE => vec![Insight {
            severity: Severity::Warning,
            icon: "📉",
            title: format!("Overrun in {name}"),
            message: format!(
                "At this pace, {name} will close the month {} over plan.",
                money(over)
            ),
            value: Some(money(over)),
        }],
        _ => Vec::new(),
    }
}

pub fn early_deviation(inputs: &InsightInputs<'_>) -> Vec<Insight> {
    let agg = inputs.aggregate;
    if !agg.in_progress || agg.days_elapsed >= EARLY_DEVIATION_MAX_DAY {
        return Vec::new();
    }
    budgeted(inputs.rules)
        .filter_map(|rule| {
            let spent_ratio = agg.spent(&rule.name) as f64 / rule.budget_cents as f64;
            (spent_ratio > EARLY_DEVIATION_RATIO).then(|| Insight {
                severity: Severity::Warning,
                icon: "⚠️",
                title: format!("Watch {}", rule.name),
                message: format!(
                    "You have already used {:.0}% of the {} budget and it is only day {}.",
                    spent_ratio * 100.0,
                    rule.name,
                    agg.days_elapsed
                ),
                value: Some(format!("{:.0}%", spent_ratio * 100.0)),
            })
        })
        .collect()
}

/// Reports only the most recent qualifying leisure purchase. Relies on
/// `history` being most-recent-first; it is not re-sorted here.
pub fn time_cost(inputs: &InsightInputs<'_>) -> Vec<Insight> {
    let Some(wage) = inputs.hourly_wage_cents.filter(|w| *w > 0) else {
        return Vec::new();
    };
    inputs
        .history
        .iter()
        .find(|t| inputs.policy.is_leisure(&t.category) && t.amount_cents > TIME_COST_MIN_CENTS)
        .map(|t| {
            let hours = t.amount_cents as f64 / wage as f64;
            Insight {
                severity: Severity::Info,
                icon: "⏳",
                title: "Time is money".to_string(),
                message: format!("'{}' cost {hours:.1} hours of work.", t.description),
                value: Some(format!("{hours:.1}h")),
            }
        })
        .into_iter()
        .collect()
}

pub fn savings_toward_goal(inputs: &InsightInputs<'_>) -> Vec<Insight> {
    let policy = inputs.policy;
    if policy.exchange_rate <= 0.0 {
        return Vec::new();
    }
    policy
        .savings_categories
        .iter()
        .filter_map(|name| {
            let rule = budgeted(inputs.rules).find(|r| &r.name == name)?;
            let saving = rule.budget_cents.saturating_sub(inputs.projection.projected(name));
            if saving <= 0 {
                return None;
            }
            let converted = saving as f64 / 100.0 / policy.exchange_rate;
            (converted > SAVINGS_MIN_SECONDARY).then(|| Insight {
                severity: Severity::Success,
                icon: "🇨🇭",
                title: "Savings goal".to_string(),
                message: format!(
                    "Your discipline in '{name}' is putting {converted:.2} {} toward your goal.",
                    policy.secondary_currency
                ),
                value: Some(format!("+{converted:.0} {}", policy.secondary_currency)),
            })
        })
        .collect()
}

/// Whole days since the last temptation purchase, or since the start of the
/// period when there was none.
pub fn discipline_streak(inputs: &InsightInputs<'_>) -> Vec<Insight> {
    let target = &inputs.policy.temptation_category;
    let last = inputs
        .history
        .iter()
        .find(|t| &t.category == target)
        .map(|t| t.created_at)
        .or_else(|| inputs.aggregate.start_date().and_hms_opt(0, 0, 0));
    let Some(last) = last else {
        return Vec::new();
    };

    let days_since = (inputs.now - last).num_days();
    if days_since <= STREAK_MIN_DAYS {
        return Vec::new();
    }
    vec![Insight {
        severity: Severity::Success,
        icon: "🔥",
        title: "No bad spending".to_string(),
        message: format!("No spending on {target} for {days_since} days. Keep it up!"),
        value: Some(days_since.to_string()),
    }]
}
