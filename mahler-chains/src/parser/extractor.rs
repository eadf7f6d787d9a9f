//! Option chain extraction from SOM report text.
//!
//! The scanner walks the report line by line:
//! 1. A line starting with the block marker opens a block; the next two
//!    lines carry `UNDERLYING : <value>` and `EXPIRATION DATE : <value>`.
//! 2. The first line whose first token is `STRIKE` starts the column header;
//!    data rows begin two lines below it.
//! 3. Rows are parsed until a blank, `----`, `TOTAL` or `MARKET` line.
//!    A `MARKET` line is not consumed, so a following block is never lost.
//!
//! Malformed rows are skipped and reported; extraction itself cannot fail.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::layout::{
    ColumnLayout, HEADER_LINES_AFTER_STRIKE, MARKET_KEYWORD, SEPARATOR_PREFIX, SOM_BLOCK_MARKER,
    STRIKE_HEADER, TOTAL_PREFIX,
};
use super::row::{parse_row, RowOutcome, SkipReason};
use crate::data::{OptionRecord, ReportBlock};

/// Extractor configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractorConfig {
    /// Raw-line prefix that opens a block.
    pub block_marker: String,
    /// Token positions of the extracted fields.
    pub layout: ColumnLayout,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            block_marker: SOM_BLOCK_MARKER.to_string(),
            layout: ColumnLayout::default(),
        }
    }
}

impl ExtractorConfig {
    pub fn with_marker(mut self, marker: impl Into<String>) -> Self {
        self.block_marker = marker.into();
        self
    }
}

/// A data line that yielded no row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedRow {
    /// 1-based line number
    pub line_number: usize,
    /// Line text as read
    pub text: String,
    pub reason: SkipReason,
}

/// Block-level problems. None of them stop extraction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BlockIssue {
    /// No `STRIKE` header before end of input or the next block.
    MissingHeader { marker_line: usize },
    /// A header field line was absent or had no colon.
    MissingField {
        marker_line: usize,
        field: &'static str,
    },
}

/// Everything found in one pass over a report.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExtractionReport {
    /// Blocks in encounter order
    pub blocks: Vec<ReportBlock>,
    /// Rows dropped during scanning
    pub skipped: Vec<SkippedRow>,
    pub issues: Vec<BlockIssue>,
}

impl ExtractionReport {
    /// Records of all blocks, concatenated in block order.
    pub fn records(&self) -> Vec<OptionRecord> {
        self.blocks.iter().flat_map(|b| b.records()).collect()
    }

    /// Parsed strike rows across all blocks.
    pub fn parsed_rows(&self) -> usize {
        self.blocks.iter().map(|b| b.rows.len()).sum()
    }

    /// Data lines examined (parsed plus skipped).
    pub fn scanned_rows(&self) -> usize {
        self.parsed_rows() + self.skipped.len()
    }
}

/// Option chain extractor for SOM stock option reports.
///
/// Holds only configuration; every call is independent, so one extractor
/// can be shared freely across threads.
#[derive(Debug, Clone, Default)]
pub struct OptionChainExtractor {
    config: ExtractorConfig,
}

/// Where scanning of one block stopped.
struct BlockScan {
    block: ReportBlock,
    /// Index at which the outer loop resumes.
    resume_at: usize,
}

impl OptionChainExtractor {
    pub fn new(config: ExtractorConfig) -> Self {
        Self { config }
    }

    /// Extract records from lines of report text.
    pub fn extract<S: AsRef<str>>(&self, lines: &[S]) -> Vec<OptionRecord> {
        self.extract_report(lines).records()
    }

    /// Extract records from a whole text buffer.
    pub fn extract_text(&self, text: &str) -> Vec<OptionRecord> {
        let lines: Vec<&str> = text.lines().collect();
        self.extract(&lines)
    }

    /// Extract blocks together with skip and issue diagnostics.
    pub fn extract_report<S: AsRef<str>>(&self, lines: &[S]) -> ExtractionReport {
        let mut report = ExtractionReport::default();
        let mut idx = 0;

        while idx < lines.len() {
            if self.is_block_marker(lines[idx].as_ref()) {
                let scan = self.scan_block(lines, idx, &mut report);
                report.blocks.push(scan.block);
                idx = scan.resume_at;
            } else {
                idx += 1;
            }
        }

        debug!(
            blocks = report.blocks.len(),
            rows = report.parsed_rows(),
            skipped = report.skipped.len(),
            "extraction finished"
        );
        report
    }

    /// Extract from a whole text buffer, keeping diagnostics.
    pub fn extract_text_report(&self, text: &str) -> ExtractionReport {
        let lines: Vec<&str> = text.lines().collect();
        self.extract_report(&lines)
    }

    fn is_block_marker(&self, line: &str) -> bool {
        !self.config.block_marker.is_empty() && line.starts_with(self.config.block_marker.as_str())
    }

    fn scan_block<S: AsRef<str>>(
        &self,
        lines: &[S],
        marker_idx: usize,
        report: &mut ExtractionReport,
    ) -> BlockScan {
        let marker_line = marker_idx + 1;
        let underlying = header_field(lines, marker_idx + 1, "UNDERLYING", marker_line, report);
        let expiration =
            header_field(lines, marker_idx + 2, "EXPIRATION DATE", marker_line, report);
        let mut block = ReportBlock::new(underlying, expiration, marker_line);

        // Locate the column header, without running into the next block.
        let mut idx = marker_idx + 3;
        loop {
            if idx >= lines.len() {
                warn!(marker_line, "no STRIKE header before end of input");
                report.issues.push(BlockIssue::MissingHeader { marker_line });
                return BlockScan {
                    block,
                    resume_at: lines.len(),
                };
            }
            let line = lines[idx].as_ref();
            if self.is_block_marker(line) {
                warn!(marker_line, next_block = idx + 1, "no STRIKE header before next block");
                report.issues.push(BlockIssue::MissingHeader { marker_line });
                return BlockScan {
                    block,
                    resume_at: idx,
                };
            }
            if line.split_whitespace().next() == Some(STRIKE_HEADER) {
                break;
            }
            idx += 1;
        }

        idx += HEADER_LINES_AFTER_STRIKE;
        while idx < lines.len() {
            let raw = lines[idx].as_ref();
            let line = raw.trim();

            if line.starts_with(MARKET_KEYWORD) {
                return BlockScan {
                    block,
                    resume_at: idx,
                };
            }
            if line.is_empty()
                || line.starts_with(SEPARATOR_PREFIX)
                || line.starts_with(TOTAL_PREFIX)
            {
                return BlockScan {
                    block,
                    resume_at: idx + 1,
                };
            }

            match parse_row(line, &self.config.layout) {
                RowOutcome::Parsed(row) => block.rows.push(row),
                RowOutcome::Skipped(reason) => {
                    debug!(line_number = idx + 1, %reason, "skipping row");
                    report.skipped.push(SkippedRow {
                        line_number: idx + 1,
                        text: raw.to_string(),
                        reason,
                    });
                }
            }
            idx += 1;
        }

        BlockScan {
            block,
            resume_at: lines.len(),
        }
    }
}

/// Value after the first colon of a header line, trimmed.
fn header_field<S: AsRef<str>>(
    lines: &[S],
    idx: usize,
    field: &'static str,
    marker_line: usize,
    report: &mut ExtractionReport,
) -> String {
    match lines.get(idx).and_then(|l| l.as_ref().split_once(':')) {
        Some((_, value)) => value.trim().to_string(),
        None => {
            warn!(marker_line, field, "block header field missing");
            report
                .issues
                .push(BlockIssue::MissingField { marker_line, field });
            String::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::row::SkipReason;
    use rust_decimal_macros::dec;

    const SAMPLE: &str = include_str!("../../tests/fixtures/som_sample.txt");

    const HEADER: &str = "\
MARKET          : SOM   - STOCK OPTIONS
UNDERLYING      : CSE
EXPIRATION DATE : 30 JUL 25

         < ------------------  CALL OPTIONS  ------------------------ > < -------------------  PUT OPTIONS  ----------------------- >
                             NET                      SETTLE   PRICE                        NET                       SETTLE   PRICE
 STRIKE    GROSS    NET     CHANGE    T/O     DEAL    PRICE    CHANGE    GROSS     NET     CHANGE     T/O    DEAL     PRICE    CHANGE
-------- -------- -------- --------- ------- ------- --------- -------- -------- -------- --------- ------- ------- --------- --------
";

    fn block(underlying: &str, rows: &[&str]) -> String {
        let mut text = HEADER.replace("CSE", underlying);
        for row in rows {
            text.push_str(row);
            text.push('\n');
        }
        text
    }

    fn extract(text: &str) -> Vec<OptionRecord> {
        OptionChainExtractor::default().extract_text(text)
    }

    #[test]
    fn test_reference_row() {
        let text = block(
            "CSE",
            &["   30.00      969      967        40      41       6      1.31     0.17    2302     2107      -101     123       7      0.29    -0.04"],
        );
        let records = extract(&text);
        assert_eq!(
            records,
            vec![
                OptionRecord {
                    label: "CSE Call 30 30 JUL 25".to_string(),
                    gross_interest: 969,
                    settle_price: dec!(1.31),
                },
                OptionRecord {
                    label: "CSE Put 30 30 JUL 25".to_string(),
                    gross_interest: 2302,
                    settle_price: dec!(0.29),
                },
            ]
        );
    }

    #[test]
    fn test_both_sides_interleaved_in_strike_order() {
        let text = block(
            "CSE",
            &[
                "30.00 969 967 40 41 6 1.31 0.17 2302 2107 -101 123 7 0.29 -0.04",
                "31.00 1615 1463 12 110 6 0.73 0.15 1911 1594 31 72 6 0.68 -0.10",
                "32.00 878 681 0 28 4 0.34 0.08 592 434 -27 38 2 1.30 -0.17",
            ],
        );
        let labels: Vec<_> = extract(&text).into_iter().map(|r| r.label).collect();
        assert_eq!(labels.len(), 6);
        assert_eq!(labels[0], "CSE Call 30 30 JUL 25");
        assert_eq!(labels[1], "CSE Put 30 30 JUL 25");
        assert_eq!(labels[4], "CSE Call 32 30 JUL 25");
        assert_eq!(labels[5], "CSE Put 32 30 JUL 25");
    }

    #[test]
    fn test_zero_call_gross_yields_put_only() {
        let text = block(
            "CSE",
            &["24.00 0 0 0 0 0 7.07 0.25 120 400 0 0 0 0.01 0.00"],
        );
        let records = extract(&text);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].label, "CSE Put 24 30 JUL 25");
        assert_eq!(records[0].gross_interest, 120);
    }

    #[test]
    fn test_short_row_skipped_and_scan_continues() {
        let text = block(
            "CSE",
            &[
                "30.00 969 967 40 41 6 1.31 0.17 2302 2107 -101 123 7 0.29 -0.04",
                "31.00 1615 1463",
                "32.00 878 681 0 28 4 0.34 0.08 592 434 -27 38 2 1.30 -0.17",
            ],
        );
        let report = OptionChainExtractor::default().extract_text_report(&text);
        assert_eq!(report.records().len(), 4);
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].line_number, 10);
        assert_eq!(
            report.skipped[0].reason,
            SkipReason::TooFewTokens {
                found: 3,
                required: 14
            }
        );
        assert!(report
            .records()
            .iter()
            .all(|r| !r.label.contains(" 31 ")));
    }

    #[test]
    fn test_two_blocks_in_order() {
        let mut text = block(
            "CSE",
            &["30.00 969 967 40 41 6 1.31 0.17 2302 2107 -101 123 7 0.29 -0.04"],
        );
        text.push('\n');
        text.push_str(&block(
            "XYZ",
            &["10.00 5 5 0 0 0 0.50 0.00 7 7 0 0 0 0.40 0.00"],
        ));
        let labels: Vec<_> = extract(&text).into_iter().map(|r| r.label).collect();
        assert_eq!(
            labels,
            vec![
                "CSE Call 30 30 JUL 25",
                "CSE Put 30 30 JUL 25",
                "XYZ Call 10 30 JUL 25",
                "XYZ Put 10 30 JUL 25",
            ]
        );
    }

    #[test]
    fn test_market_line_ends_block_without_being_consumed() {
        // No blank line between the first block's rows and the next marker.
        let first = block(
            "CSE",
            &["30.00 969 967 40 41 6 1.31 0.17 2302 2107 -101 123 7 0.29 -0.04"],
        );
        let second = block(
            "XYZ",
            &["10.00 5 5 0 0 0 0.50 0.00 7 7 0 0 0 0.40 0.00"],
        );
        let text = format!("{}{}", first, second);
        let report = OptionChainExtractor::default().extract_text_report(&text);
        assert_eq!(report.blocks.len(), 2);
        assert_eq!(report.blocks[1].underlying, "XYZ");
        assert_eq!(report.blocks[1].rows.len(), 1);
    }

    #[test]
    fn test_header_without_rows() {
        let mut text = block("CSE", &[]);
        text.push_str("TOTAL 0 0\n");
        let report = OptionChainExtractor::default().extract_text_report(&text);
        assert_eq!(report.blocks.len(), 1);
        assert!(report.blocks[0].rows.is_empty());
        assert!(report.records().is_empty());
        assert!(report.issues.is_empty());
    }

    #[test]
    fn test_missing_strike_header() {
        let text = "MARKET          : SOM   - STOCK OPTIONS\nUNDERLYING      : CSE\nEXPIRATION DATE : 30 JUL 25\n\nno table here\n";
        let report = OptionChainExtractor::default().extract_text_report(text);
        assert_eq!(report.blocks.len(), 1);
        assert!(report.records().is_empty());
        assert_eq!(
            report.issues,
            vec![BlockIssue::MissingHeader { marker_line: 1 }]
        );
    }

    #[test]
    fn test_missing_header_does_not_swallow_next_block() {
        let mut text = String::from(
            "MARKET          : SOM   - STOCK OPTIONS\nUNDERLYING      : AAA\nEXPIRATION DATE : 30 JUL 25\n\n",
        );
        text.push_str(&block(
            "XYZ",
            &["10.00 5 5 0 0 0 0.50 0.00 7 7 0 0 0 0.40 0.00"],
        ));
        let report = OptionChainExtractor::default().extract_text_report(&text);
        assert_eq!(report.blocks.len(), 2);
        assert!(report.blocks[0].rows.is_empty());
        assert_eq!(report.records().len(), 2);
        assert_eq!(
            report.issues,
            vec![BlockIssue::MissingHeader { marker_line: 1 }]
        );
    }

    #[test]
    fn test_no_blocks() {
        assert!(extract("nothing to see\n 30.00 1 2 3\n").is_empty());
        assert!(extract("").is_empty());
    }

    #[test]
    fn test_marker_near_end_of_input() {
        let report = OptionChainExtractor::default()
            .extract_text_report("MARKET          : SOM   - STOCK OPTIONS\nUNDERLYING      : CSE");
        assert_eq!(report.blocks.len(), 1);
        assert_eq!(report.blocks[0].underlying, "CSE");
        assert_eq!(report.blocks[0].expiration_date, "");
        assert!(report
            .issues
            .contains(&BlockIssue::MissingField {
                marker_line: 1,
                field: "EXPIRATION DATE"
            }));
    }

    #[test]
    fn test_other_market_line_ends_rows_without_opening_block() {
        let mut text = block(
            "CSE",
            &["30.00 969 967 40 41 6 1.31 0.17 2302 2107 -101 123 7 0.29 -0.04"],
        );
        text.push_str("MARKET          : SOF   - STOCK FUTURES OPTIONS\n");
        text.push_str("UNDERLYING      : HSI\n");
        text.push_str("31.00 1615 1463 12 110 6 0.73 0.15 1911 1594 31 72 6 0.68 -0.10\n");
        text.push_str(&block(
            "XYZ",
            &["10.00 5 5 0 0 0 0.50 0.00 7 7 0 0 0 0.40 0.00"],
        ));

        let report = OptionChainExtractor::default().extract_text_report(&text);
        assert_eq!(report.blocks.len(), 2);
        assert_eq!(report.blocks[0].underlying, "CSE");
        assert_eq!(report.blocks[0].rows.len(), 1);
        assert_eq!(report.blocks[0].rows[0].strike, dec!(30.00));
        assert_eq!(report.blocks[1].underlying, "XYZ");
        assert_eq!(report.records().len(), 4);
        assert!(report.skipped.is_empty());
        assert!(report.issues.is_empty());
    }

    #[test]
    fn test_header_field_without_colon() {
        let mut text = HEADER.replace("UNDERLYING      : CSE", "UNDERLYING CSE");
        text.push_str("30.00 969 967 40 41 6 1.31 0.17 2302 2107 -101 123 7 0.29 -0.04\n");

        let report = OptionChainExtractor::default().extract_text_report(&text);
        assert_eq!(report.blocks.len(), 1);
        assert_eq!(report.blocks[0].underlying, "");
        assert_eq!(report.blocks[0].expiration_date, "30 JUL 25");
        assert_eq!(report.blocks[0].rows.len(), 1);
        assert_eq!(
            report.issues,
            vec![BlockIssue::MissingField {
                marker_line: 1,
                field: "UNDERLYING"
            }]
        );
    }

    #[test]
    fn test_custom_marker() {
        let text = block(
            "CSE",
            &["30.00 969 967 40 41 6 1.31 0.17 2302 2107 -101 123 7 0.29 -0.04"],
        )
        .replace("SOM   - STOCK OPTIONS", "SOF   - STOCK FUTURES OPTIONS");
        assert!(extract(&text).is_empty());

        let extractor = OptionChainExtractor::new(
            ExtractorConfig::default().with_marker("MARKET          : SOF"),
        );
        assert_eq!(extractor.extract_text(&text).len(), 2);
    }

    #[test]
    fn test_crlf_input() {
        let text = block(
            "CSE",
            &["30.00 969 967 40 41 6 1.31 0.17 2302 2107 -101 123 7 0.29 -0.04"],
        )
        .replace('\n', "\r\n");
        let records = extract(&text);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].label, "CSE Call 30 30 JUL 25");
    }

    #[test]
    fn test_fixture_report() {
        let report = OptionChainExtractor::default().extract_text_report(SAMPLE);
        assert_eq!(report.blocks.len(), 2);
        assert_eq!(report.blocks[0].underlying, "CSE");
        assert_eq!(report.blocks[0].rows.len(), 21);
        assert_eq!(report.blocks[1].underlying, "HSB");
        assert_eq!(report.blocks[1].rows.len(), 3);
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].line_number, 45);

        let records = report.records();
        // Strikes 26-40 carry call interest, 22-36 put interest.
        let cse = records.iter().filter(|r| r.label.starts_with("CSE ")).count();
        assert_eq!(cse, 30);
        assert_eq!(records.len(), 35);
        assert_eq!(records[0].label, "CSE Put 22 30 JUL 25");
        assert_eq!(records[30].label, "HSB Call 95 28 AUG 25");
        assert_eq!(records[30].gross_interest, 1250);
        let first_hsb = records
            .iter()
            .position(|r| r.label.starts_with("HSB "))
            .unwrap();
        assert!(records[..first_hsb].iter().all(|r| r.label.starts_with("CSE ")));
        assert!(records[first_hsb..].iter().all(|r| r.label.starts_with("HSB ")));
    }

    #[test]
    fn test_extraction_is_repeatable() {
        let extractor = OptionChainExtractor::default();
        assert_eq!(
            extractor.extract_text_report(SAMPLE),
            extractor.extract_text_report(SAMPLE)
        );
    }
}
