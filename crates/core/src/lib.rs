//! Profit evaluation and deal analysis on top of `resale-market-data`.
//!
//! - [`profit`] - Pure margin arithmetic for a listing against a market quote
//! - [`deals`] - Cached, concurrent pricing of many listings

pub mod deals;
pub mod errors;
pub mod profit;

pub use deals::{AnalyzedDeal, AnalyzerConfig, DealAnalyzer, QuoteCache};
pub use errors::{Error, Result};
pub use profit::{
    parse_price, FeeSchedule, NetProfit, ProfitEvaluator, ProfitResult, ProfitStatus,
    RetailListing, DEFAULT_PROFIT_THRESHOLD,
};
