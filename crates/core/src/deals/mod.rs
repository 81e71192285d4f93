//! Deal analysis: retail listings priced against the resale market.

mod analyzer;
mod cache;

pub use analyzer::{AnalyzedDeal, AnalyzerConfig, DealAnalyzer};
pub use cache::QuoteCache;
