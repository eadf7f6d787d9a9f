//! Option chain analytics.
//!
//! Provides:
//! - Open interest totals, put/call ratio and peak strikes per expiration
//! - Per-underlying aggregation across expirations

pub mod open_interest;

pub use open_interest::{
    aggregate_by_underlying, summarize, OpenInterestSummary, UnderlyingInterest,
};
