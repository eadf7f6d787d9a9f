//! Validation of extracted option chain reports.
//!
//! Checks structural integrity of a parsed report: block headers, strike
//! ordering, settle prices, skipped-row rate and repeated blocks.

pub mod report_integrity;

pub use report_integrity::{
    CheckResult, IntegrityReport, ReportIntegrityValidator, ValidatorConfig,
};
