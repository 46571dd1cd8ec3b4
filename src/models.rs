use std::fmt;
use std::str::FromStr;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::error::TrackError;

/// Debit is paid on the spot; Credit covers card purchases and installments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Direction {
    #[default]
    Debit,
    Credit,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Debit => "Debit",
            Self::Credit => "Credit",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Direction {
    type Err = TrackError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "debit" => Ok(Self::Debit),
            "credit" => Ok(Self::Credit),
            other => Err(TrackError::Other(format!("Unknown transaction type: '{other}'"))),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Transaction {
    pub id: i64,
    pub amount_cents: i64,
    pub description: String,
    pub category: String,
    pub direction: Direction,
    pub installments: u32,
    pub payment_method: Option<String>,
    pub created_at: NaiveDateTime,
}

/// A transaction before it has been stored: the output of the text parser
/// or of a structured entry form.
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionDraft {
    pub amount_cents: i64,
    pub description: String,
    pub category: String,
    pub direction: Direction,
    pub installments: u32,
    pub payment_method: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CategoryRule {
    pub id: i64,
    pub name: String,
    pub keywords: Vec<String>,
    pub budget_cents: i64,
    pub alert_threshold: i64,
}

impl CategoryRule {
    pub fn new(name: &str, keywords: &[&str], budget_cents: i64) -> Self {
        Self {
            id: 0,
            name: name.to_string(),
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
            budget_cents,
            alert_threshold: 70,
        }
    }

    pub fn has_budget(&self) -> bool {
        self.budget_cents > 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Warning,
    Success,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Insight {
    pub severity: Severity,
    pub icon: &'static str,
    pub title: String,
    pub message: String,
    pub value: Option<String>,
}
