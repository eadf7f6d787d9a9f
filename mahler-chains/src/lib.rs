pub mod analytics;
pub mod data;
pub mod parser;
pub mod validation;

// Re-export commonly used types
pub use analytics::{OpenInterestSummary, UnderlyingInterest};
pub use data::{OptionRecord, OptionType, ReportBlock, ReportLoader, StrikeRow};
pub use parser::{ExtractionReport, ExtractorConfig, OptionChainExtractor, RowOutcome, SkipReason};
pub use validation::{IntegrityReport, ReportIntegrityValidator, ValidatorConfig};
