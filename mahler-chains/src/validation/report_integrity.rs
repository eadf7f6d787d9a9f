//! Integrity checks over an extracted report.
//!
//! Validates:
//! - At least one block was found
//! - Every block had its header fields and `STRIKE` table
//! - Strikes strictly ascending within each block
//! - Settle prices non-negative
//! - Skipped rows stay under a tolerated share of scanned rows
//! - No underlying/expiration pair appears twice

use std::collections::HashSet;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::parser::ExtractionReport;

/// Result of a single validation check.
#[derive(Debug, Clone, Serialize)]
pub struct CheckResult {
    pub name: String,
    pub passed: bool,
    pub message: String,
    pub details: Option<String>,
}

impl CheckResult {
    pub fn pass(name: &str, message: &str) -> Self {
        Self {
            name: name.to_string(),
            passed: true,
            message: message.to_string(),
            details: None,
        }
    }

    pub fn fail(name: &str, message: &str, details: Option<String>) -> Self {
        Self {
            name: name.to_string(),
            passed: false,
            message: message.to_string(),
            details,
        }
    }
}

/// Complete integrity report for one source.
#[derive(Debug, Serialize)]
pub struct IntegrityReport {
    pub source: String,
    pub blocks: usize,
    pub rows: usize,
    pub checks: Vec<CheckResult>,
}

impl IntegrityReport {
    pub fn all_passed(&self) -> bool {
        self.checks.iter().all(|c| c.passed)
    }

    pub fn failed_checks(&self) -> Vec<&CheckResult> {
        self.checks.iter().filter(|c| !c.passed).collect()
    }

    pub fn summary(&self) -> String {
        let passed = self.checks.iter().filter(|c| c.passed).count();
        let total = self.checks.len();
        format!(
            "{} ({} blocks, {} rows): {}/{} checks passed",
            self.source, self.blocks, self.rows, passed, total
        )
    }
}

/// Validator thresholds.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidatorConfig {
    /// Largest tolerated percentage of skipped data rows.
    pub max_skip_pct: f64,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self { max_skip_pct: 5.0 }
    }
}

/// Validator for extracted report integrity.
#[derive(Debug, Clone, Default)]
pub struct ReportIntegrityValidator {
    config: ValidatorConfig,
}

impl ReportIntegrityValidator {
    pub fn new(config: ValidatorConfig) -> Self {
        Self { config }
    }

    /// Run all checks on an extraction result.
    pub fn validate(&self, source: &str, report: &ExtractionReport) -> IntegrityReport {
        let checks = vec![
            self.check_blocks_found(report),
            self.check_headers(report),
            self.check_strike_order(report),
            self.check_settle_prices(report),
            self.check_skip_rate(report),
            self.check_duplicate_blocks(report),
        ];

        IntegrityReport {
            source: source.to_string(),
            blocks: report.blocks.len(),
            rows: report.parsed_rows(),
            checks,
        }
    }

    fn check_blocks_found(&self, report: &ExtractionReport) -> CheckResult {
        if report.blocks.is_empty() {
            CheckResult::fail("blocks_found", "No option chain blocks found", None)
        } else {
            CheckResult::pass(
                "blocks_found",
                &format!("{} blocks found", report.blocks.len()),
            )
        }
    }

    fn check_headers(&self, report: &ExtractionReport) -> CheckResult {
        if report.issues.is_empty() {
            return CheckResult::pass("headers_present", "All block headers complete");
        }
        let details: Vec<String> = report
            .issues
            .iter()
            .map(|issue| format!("{:?}", issue))
            .collect();
        CheckResult::fail(
            "headers_present",
            &format!("{} block header issues", report.issues.len()),
            Some(details.join("; ")),
        )
    }

    fn check_strike_order(&self, report: &ExtractionReport) -> CheckResult {
        let mut issues = Vec::new();
        for block in &report.blocks {
            let out_of_order = block
                .rows
                .windows(2)
                .filter(|pair| pair[1].strike <= pair[0].strike)
                .count();
            if out_of_order > 0 {
                issues.push(format!(
                    "{} {} (line {}): {} out-of-order strikes",
                    block.underlying, block.expiration_date, block.marker_line, out_of_order
                ));
            }
        }

        if issues.is_empty() {
            CheckResult::pass("strike_order", "Strikes ascending in every block")
        } else {
            CheckResult::fail(
                "strike_order",
                "Strikes not strictly ascending",
                Some(issues.join("; ")),
            )
        }
    }

    fn check_settle_prices(&self, report: &ExtractionReport) -> CheckResult {
        let negative = report
            .blocks
            .iter()
            .flat_map(|b| b.rows.iter())
            .filter(|r| r.call_settle < Decimal::ZERO || r.put_settle < Decimal::ZERO)
            .count();

        if negative == 0 {
            CheckResult::pass("settle_prices", "All settle prices non-negative")
        } else {
            CheckResult::fail(
                "settle_prices",
                &format!("{} rows with negative settle prices", negative),
                None,
            )
        }
    }

    fn check_skip_rate(&self, report: &ExtractionReport) -> CheckResult {
        let scanned = report.scanned_rows();
        let skipped = report.skipped.len();
        if skipped == 0 {
            return CheckResult::pass("skip_rate", &format!("All {} rows parsed", scanned));
        }

        let pct = (skipped as f64 / scanned as f64) * 100.0;
        let message = format!("{} of {} rows skipped ({:.2}%)", skipped, scanned, pct);
        if pct <= self.config.max_skip_pct {
            CheckResult::pass("skip_rate", &message)
        } else {
            let details: Vec<String> = report
                .skipped
                .iter()
                .take(10)
                .map(|s| format!("line {}: {}", s.line_number, s.reason))
                .collect();
            CheckResult::fail("skip_rate", &message, Some(details.join("; ")))
        }
    }

    fn check_duplicate_blocks(&self, report: &ExtractionReport) -> CheckResult {
        let mut seen = HashSet::new();
        let mut duplicates = Vec::new();
        for block in &report.blocks {
            let key = (block.underlying.as_str(), block.expiration_date.as_str());
            if !seen.insert(key) {
                duplicates.push(format!(
                    "{} {} (line {})",
                    block.underlying, block.expiration_date, block.marker_line
                ));
            }
        }

        if duplicates.is_empty() {
            CheckResult::pass("duplicate_blocks", "No repeated underlying/expiration")
        } else {
            CheckResult::fail(
                "duplicate_blocks",
                &format!("{} repeated blocks", duplicates.len()),
                Some(duplicates.join("; ")),
            )
        }
    }
}
