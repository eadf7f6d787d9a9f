//! Open interest summaries per report block.
//!
//! For each underlying/expiration:
//! - Call, put and total gross interest
//! - Put/call ratio and put share of total interest
//! - Strikes carrying the largest call and put interest

use std::collections::BTreeMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::data::{OptionType, ReportBlock};
use crate::parser::ExtractionReport;

/// Gross interest summary for one block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpenInterestSummary {
    pub underlying: String,
    pub expiration_date: String,
    /// Parsed expiration, when the label is a `DD MON YY` date.
    pub expiration: Option<NaiveDate>,
    pub call_gross: i64,
    pub put_gross: i64,
    pub total_gross: i64,
    /// Put gross / call gross; `None` without call interest.
    pub put_call_ratio: Option<f64>,
    /// Put gross as a percentage of total; `None` without any interest.
    pub put_share_pct: Option<f64>,
    pub max_call_strike: Option<Decimal>,
    pub max_put_strike: Option<Decimal>,
    /// Parsed strike rows in the block.
    pub strikes: usize,
}

impl OpenInterestSummary {
    pub fn from_block(block: &ReportBlock) -> Self {
        let call_gross = side_total(block, OptionType::Call);
        let put_gross = side_total(block, OptionType::Put);
        let (put_call_ratio, put_share_pct) = ratios(call_gross, put_gross);

        Self {
            underlying: block.underlying.clone(),
            expiration_date: block.expiration_date.clone(),
            expiration: block.expiration(),
            call_gross,
            put_gross,
            total_gross: call_gross.saturating_add(put_gross),
            put_call_ratio,
            put_share_pct,
            max_call_strike: max_strike(block, OptionType::Call),
            max_put_strike: max_strike(block, OptionType::Put),
            strikes: block.rows.len(),
        }
    }
}

/// Interest totals for one underlying across expirations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnderlyingInterest {
    pub underlying: String,
    pub expirations: usize,
    pub call_gross: i64,
    pub put_gross: i64,
    pub total_gross: i64,
    pub put_call_ratio: Option<f64>,
    pub put_share_pct: Option<f64>,
}

/// Summaries in block order.
pub fn summarize(report: &ExtractionReport) -> Vec<OpenInterestSummary> {
    report
        .blocks
        .iter()
        .map(OpenInterestSummary::from_block)
        .collect()
}

/// Sum block summaries per underlying, sorted by symbol.
pub fn aggregate_by_underlying(summaries: &[OpenInterestSummary]) -> Vec<UnderlyingInterest> {
    let mut totals: BTreeMap<&str, (usize, i64, i64)> = BTreeMap::new();
    for summary in summaries {
        let entry = totals.entry(summary.underlying.as_str()).or_default();
        entry.0 += 1;
        entry.1 = entry.1.saturating_add(summary.call_gross);
        entry.2 = entry.2.saturating_add(summary.put_gross);
    }

    totals
        .into_iter()
        .map(|(underlying, (expirations, call_gross, put_gross))| {
            let (put_call_ratio, put_share_pct) = ratios(call_gross, put_gross);
            UnderlyingInterest {
                underlying: underlying.to_string(),
                expirations,
                call_gross,
                put_gross,
                total_gross: call_gross.saturating_add(put_gross),
                put_call_ratio,
                put_share_pct,
            }
        })
        .collect()
}

/// Only positive interest counts, matching record emission. Saturates at `i64::MAX`.
fn side_total(block: &ReportBlock, option_type: OptionType) -> i64 {
    block
        .rows
        .iter()
        .map(|r| r.gross(option_type))
        .filter(|g| *g > 0)
        .fold(0, i64::saturating_add)
}

/// Strike with the largest positive interest; the first row wins ties.
fn max_strike(block: &ReportBlock, option_type: OptionType) -> Option<Decimal> {
    let mut best: Option<(i64, Decimal)> = None;
    for row in &block.rows {
        let gross = row.gross(option_type);
        if gross <= 0 {
            continue;
        }
        match best {
            Some((best_gross, _)) if gross <= best_gross => {}
            _ => best = Some((gross, row.strike)),
        }
    }
    best.map(|(_, strike)| strike)
}

fn ratios(call_gross: i64, put_gross: i64) -> (Option<f64>, Option<f64>) {
    let total = call_gross.saturating_add(put_gross);
    let put_call_ratio = if call_gross > 0 {
        Some(put_gross as f64 / call_gross as f64)
    } else {
        None
    };
    let put_share_pct = if total > 0 {
        Some(100.0 * put_gross as f64 / total as f64)
    } else {
        None
    };
    (put_call_ratio, put_share_pct)
}
