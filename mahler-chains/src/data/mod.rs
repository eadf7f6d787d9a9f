pub mod export;
pub mod loader;
pub mod types;

pub use export::{
    records_to_dataframe, to_json, write_csv, write_csv_to, write_parquet, ExportError,
};
pub use loader::{LoaderError, ReportLoader};
pub use types::{format_strike, OptionRecord, OptionType, ReportBlock, StrikeRow};
