//! Report format constants.
//!
//! SOM stock option reports print each strike as one whitespace-separated
//! line: strike, then seven call columns (gross, net, net change, turnover,
//! deals, settle price, price change), then the same seven for puts.
//! Every positional assumption about that layout lives here.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Literal header line that opens a stock option block.
pub const SOM_BLOCK_MARKER: &str = "MARKET          : SOM   - STOCK OPTIONS";

/// Keyword that ends row scanning when a line starts with it.
pub const MARKET_KEYWORD: &str = "MARKET";

/// First token of the column header line.
pub const STRIKE_HEADER: &str = "STRIKE";

/// Offset from the `STRIKE` header line to the first data row
/// (the header line itself, then the dashed separator).
pub const HEADER_LINES_AFTER_STRIKE: usize = 2;

/// Prefix of a separator line.
pub const SEPARATOR_PREFIX: &str = "----";

/// Prefix of a totals line.
pub const TOTAL_PREFIX: &str = "TOTAL";

/// Fields extracted from a strike row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RowField {
    Strike,
    CallGross,
    CallSettle,
    PutGross,
    PutSettle,
}

impl RowField {
    pub const ALL: [RowField; 5] = [
        RowField::Strike,
        RowField::CallGross,
        RowField::CallSettle,
        RowField::PutGross,
        RowField::PutSettle,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Strike => "strike",
            Self::CallGross => "call_gross",
            Self::CallSettle => "call_settle",
            Self::PutGross => "put_gross",
            Self::PutSettle => "put_settle",
        }
    }
}

impl fmt::Display for RowField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Token positions (0-indexed) of each extracted field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnLayout {
    pub strike: usize,
    pub call_gross: usize,
    pub call_settle: usize,
    pub put_gross: usize,
    pub put_settle: usize,
    /// Rows with fewer tokens are malformed.
    pub min_tokens: usize,
}

/// Column layout of the SOM stock option report.
pub const SOM_LAYOUT: ColumnLayout = ColumnLayout {
    strike: 0,
    call_gross: 1,
    call_settle: 6,
    put_gross: 8,
    put_settle: 13,
    min_tokens: 14,
};

impl Default for ColumnLayout {
    fn default() -> Self {
        SOM_LAYOUT
    }
}

impl ColumnLayout {
    /// Token index for a field.
    pub fn index_of(&self, field: RowField) -> usize {
        match field {
            RowField::Strike => self.strike,
            RowField::CallGross => self.call_gross,
            RowField::CallSettle => self.call_settle,
            RowField::PutGross => self.put_gross,
            RowField::PutSettle => self.put_settle,
        }
    }

    /// Tokens a row needs so that every field index is addressable.
    pub fn required_tokens(&self) -> usize {
        let widest = RowField::ALL
            .iter()
            .map(|f| self.index_of(*f) + 1)
            .max()
            .unwrap_or(0);
        self.min_tokens.max(widest)
    }
}
