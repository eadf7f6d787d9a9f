//! SOM option chain report parsing.
//!
//! Provides:
//! - Fixed column layout of strike rows
//! - Per-row parsing with explicit skip reasons
//! - Multi-block extraction into option records

pub mod extractor;
pub mod layout;
pub mod row;

pub use extractor::{
    BlockIssue, ExtractionReport, ExtractorConfig, OptionChainExtractor, SkippedRow,
};
pub use layout::{ColumnLayout, RowField, SOM_BLOCK_MARKER, SOM_LAYOUT};
pub use row::{parse_row, RowOutcome, SkipReason};
