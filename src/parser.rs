//! Free-text entry parsing: `AMOUNT DESCRIPTION [PAYMENT_METHOD] [Nx]`.
//!
//! Modifiers are peeled off the end of the description by small strip steps,
//! installments first and payment method second.

use std::sync::OnceLock;

use regex::Regex;

use crate::categorizer::match_category;
use crate::error::{Result, TrackError};
use crate::models::{CategoryRule, Direction, TransactionDraft};

pub const PAYMENT_METHODS: &[&str] = &[
    "itau", "nubank", "bradesco", "inter", "c6", "santander", "uv", "visa", "master",
];

fn installment_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)^(\d+)x$").expect("static regex"))
}

/// Largest accepted magnitude, in minor units (exclusive).
pub const MAX_AMOUNT_CENTS: f64 = 1e15;

/// Parse an amount written with either `.` or `,` as decimal separator into
/// minor units, rounding to the nearest cent.
pub fn parse_amount(raw: &str) -> Result<i64> {
    let normalized = raw.trim().replace(',', ".");
    let value: f64 = normalized
        .parse()
        .map_err(|_| TrackError::InvalidAmount(raw.to_string()))?;
    let cents = (value * 100.0).round();
    if !cents.is_finite() || cents.abs() >= MAX_AMOUNT_CENTS {
        return Err(TrackError::InvalidAmount(raw.to_string()));
    }
    Ok(cents as i64)
}

/// Strip a trailing `<n>x` installment marker.
pub fn strip_installments<'a>(tokens: &[&'a str]) -> (Vec<&'a str>, Option<u32>) {
    if let Some((last, rest)) = tokens.split_last() {
        let count = installment_re()
            .captures(last)
            .and_then(|caps| caps[1].parse::<u32>().ok())
            .filter(|n| *n >= 1);
        if let Some(n) = count {
            return (rest.to_vec(), Some(n));
        }
    }
    (tokens.to_vec(), None)
}

/// Strip a trailing payment-method word (bank or card brand).
pub fn strip_payment_method<'a>(tokens: &[&'a str]) -> (Vec<&'a str>, Option<String>) {
    if let Some((last, rest)) = tokens.split_last() {
        let lower = last.to_lowercase();
        if PAYMENT_METHODS.contains(&lower.as_str()) {
            return (rest.to_vec(), Some(lower));
        }
    }
    (tokens.to_vec(), None)
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParsedLine {
    pub amount_cents: i64,
    pub description: String,
    pub direction: Direction,
    pub installments: u32,
    pub payment_method: Option<String>,
}

pub fn parse_line(input: &str) -> Result<ParsedLine> {
    let parts: Vec<&str> = input.split_whitespace().collect();
    let Some((amount_token, desc_tokens)) = parts.split_first() else {
        return Err(TrackError::InvalidAmount(String::new()));
    };
    let amount_cents = parse_amount(amount_token)?;
    if desc_tokens.is_empty() {
        return Err(TrackError::MissingDescription);
    }

    let mut direction = Direction::Debit;

    let (tokens, installments) = strip_installments(desc_tokens);
    let installments = installments.unwrap_or(1);
    if installments > 1 {
        direction = Direction::Credit;
    }

    let (tokens, payment_method) = strip_payment_method(&tokens);
    if payment_method.is_some() {
        direction = Direction::Credit;
    }

    Ok(ParsedLine {
        amount_cents,
        description: tokens.join(" "),
        direction,
        installments,
        payment_method,
    })
}

/// Parse one free-text entry and classify it against `rules`.
pub fn parse_entry(input: &str, rules: &[CategoryRule]) -> Result<TransactionDraft> {
    let line = parse_line(input)?;
    let category = match_category(&line.description, rules);
    Ok(TransactionDraft {
        amount_cents: line.amount_cents,
        description: line.description,
        category,
        direction: line.direction,
        installments: line.installments,
        payment_method: line.payment_method,
    })
}
