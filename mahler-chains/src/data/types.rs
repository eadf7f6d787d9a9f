//! Core data types for option chain reports.
//!
//! A report is a sequence of blocks, one per underlying/expiration pair.
//! Each block holds the strike rows exactly as printed; rows are flattened
//! into [`OptionRecord`]s for the tabular layers.

use chrono::NaiveDate;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// Option type (call or put).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OptionType {
    Call,
    Put,
}

impl OptionType {
    /// Word used in record labels ("Call" / "Put").
    pub fn label(&self) -> &'static str {
        match self {
            Self::Call => "Call",
            Self::Put => "Put",
        }
    }
}

/// One strike line within a report block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StrikeRow {
    /// Exercise price
    pub strike: Decimal,

    /// Call side gross interest
    pub call_gross: i64,

    /// Call side settlement price
    pub call_settle: Decimal,

    /// Put side gross interest
    pub put_gross: i64,

    /// Put side settlement price
    pub put_settle: Decimal,
}

impl StrikeRow {
    /// Gross interest for one side.
    pub fn gross(&self, option_type: OptionType) -> i64 {
        match option_type {
            OptionType::Call => self.call_gross,
            OptionType::Put => self.put_gross,
        }
    }

    /// Settlement price for one side.
    pub fn settle(&self, option_type: OptionType) -> Decimal {
        match option_type {
            OptionType::Call => self.call_settle,
            OptionType::Put => self.put_settle,
        }
    }
}

/// One option chain section of a report.
///
/// Blocks are built while scanning and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportBlock {
    /// Underlying symbol (e.g., "CSE")
    pub underlying: String,

    /// Expiration label exactly as printed (e.g., "30 JUL 25")
    pub expiration_date: String,

    /// Strike rows in report order
    pub rows: Vec<StrikeRow>,

    /// 1-based line number of the block marker
    pub marker_line: usize,
}

impl ReportBlock {
    pub fn new(underlying: String, expiration_date: String, marker_line: usize) -> Self {
        Self {
            underlying,
            expiration_date,
            rows: Vec::new(),
            marker_line,
        }
    }

    /// Parse the expiration label as a calendar date.
    ///
    /// Reports print dates as `DD MON YY`; anything else yields `None`.
    pub fn expiration(&self) -> Option<NaiveDate> {
        NaiveDate::parse_from_str(self.expiration_date.trim(), "%d %b %y").ok()
    }

    /// Flatten rows into records: per strike, call then put, each only
    /// when its gross interest is positive.
    pub fn records(&self) -> Vec<OptionRecord> {
        let mut records = Vec::with_capacity(self.rows.len() * 2);
        for row in &self.rows {
            for option_type in [OptionType::Call, OptionType::Put] {
                let gross = row.gross(option_type);
                if gross > 0 {
                    records.push(OptionRecord {
                        label: self.label(option_type, row.strike),
                        gross_interest: gross,
                        settle_price: row.settle(option_type),
                    });
                }
            }
        }
        records
    }

    /// Record label: `"{underlying} {Call|Put} {strike} {expiration}"`.
    pub fn label(&self, option_type: OptionType, strike: Decimal) -> String {
        format!(
            "{} {} {} {}",
            self.underlying,
            option_type.label(),
            format_strike(strike),
            self.expiration_date
        )
    }
}

/// Render a strike with zero decimal places (half-even, as printed labels do).
pub fn format_strike(strike: Decimal) -> String {
    strike
        .round_dp_with_strategy(0, RoundingStrategy::MidpointNearestEven)
        .normalize()
        .to_string()
}

/// Output unit of extraction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionRecord {
    /// Contract label, e.g. "CSE Call 30 30 JUL 25"
    pub label: String,

    /// Gross interest (always positive)
    pub gross_interest: i64,

    /// Settlement price
    pub settle_price: Decimal,
}
