//! Core error types for deal analysis.
//!
//! Marketplace failures never surface here as errors (sources degrade to
//! empty results); what remains is bad caller input.

use thiserror::Error;

use resale_market_data::MarketDataError;

/// Type alias for Result using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Market data operation failed: {0}")]
    MarketData(#[from] MarketDataError),

    #[error("Invalid listing: {0}")]
    InvalidListing(String),
}
