//! Strike row parsing.
//!
//! A row either parses into a [`StrikeRow`] or is skipped with a reason.
//! Parsing never fails the surrounding scan.

use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::layout::{ColumnLayout, RowField};
use crate::data::StrikeRow;

/// Why a row produced no strike data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SkipReason {
    /// Line has fewer whitespace-separated tokens than the layout needs.
    TooFewTokens { found: usize, required: usize },
    /// A field token is not numeric.
    InvalidNumber { field: RowField, token: String },
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TooFewTokens { found, required } => {
                write!(f, "expected at least {} tokens, found {}", required, found)
            }
            Self::InvalidNumber { field, token } => {
                write!(f, "{} is not a number: {:?}", field, token)
            }
        }
    }
}

/// Result of parsing one data line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowOutcome {
    Parsed(StrikeRow),
    Skipped(SkipReason),
}

impl RowOutcome {
    pub fn is_parsed(&self) -> bool {
        matches!(self, Self::Parsed(_))
    }
}

/// Parse a data line against a column layout.
pub fn parse_row(line: &str, layout: &ColumnLayout) -> RowOutcome {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    let required = layout.required_tokens();
    if tokens.len() < required {
        return RowOutcome::Skipped(SkipReason::TooFewTokens {
            found: tokens.len(),
            required,
        });
    }

    match parse_fields(&tokens, layout) {
        Ok(row) => RowOutcome::Parsed(row),
        Err(reason) => RowOutcome::Skipped(reason),
    }
}

fn parse_fields(tokens: &[&str], layout: &ColumnLayout) -> Result<StrikeRow, SkipReason> {
    let token = |field: RowField| tokens[layout.index_of(field)];

    Ok(StrikeRow {
        strike: parse_decimal(RowField::Strike, token(RowField::Strike))?,
        call_gross: parse_gross(RowField::CallGross, token(RowField::CallGross))?,
        call_settle: parse_decimal(RowField::CallSettle, token(RowField::CallSettle))?,
        put_gross: parse_gross(RowField::PutGross, token(RowField::PutGross))?,
        put_settle: parse_decimal(RowField::PutSettle, token(RowField::PutSettle))?,
    })
}

/// Gross interest may carry thousands separators ("1,615").
fn parse_gross(field: RowField, token: &str) -> Result<i64, SkipReason> {
    token
        .replace(',', "")
        .parse::<i64>()
        .map_err(|_| invalid(field, token))
}

fn parse_decimal(field: RowField, token: &str) -> Result<Decimal, SkipReason> {
    Decimal::from_str(token).map_err(|_| invalid(field, token))
}

fn invalid(field: RowField, token: &str) -> SkipReason {
    SkipReason::InvalidNumber {
        field,
        token: token.to_string(),
    }
}
