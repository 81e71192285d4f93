//! Resale Market Data Crate
//!
//! Fetches resale prices for a product from several secondary marketplaces
//! and merges them into one best-effort record.
//!
//! # Overview
//!
//! - Multiple marketplaces: StockX, GOAT, Flight Club
//! - Per-domain rate limiting shared by every source
//! - Retry with exponential backoff for transient failures
//! - Catalog code normalization and fuzzy matching
//! - Concurrent fan-out with an optional overall deadline
//!
//! # Architecture
//!
//! ```text
//!                    +-------------------+
//!  code / name  -->  | MarketDataService |  (one task per source)
//!                    +-------------------+
//!                       |      |      |
//!                       v      v      v
//!                    +-------------------+
//!                    |   SourceFetcher   |  (StockX, GOAT, Flight Club)
//!                    +-------------------+
//!                              |
//!                              v
//!                    +-------------------+
//!                    |    HttpSource     |  (rate limit -> request -> backoff)
//!                    +-------------------+
//!                              |
//!                              v
//!                    +-------------------+
//!                    | ConsolidatedQuote |  (mean price, richest metadata)
//!                    +-------------------+
//! ```
//!
//! # Core Types
//!
//! - [`MarketQuote`] - One marketplace's answer for one item
//! - [`ConsolidatedQuote`] - Merged record across marketplaces
//! - [`SourceFetcher`] - Marketplace abstraction
//! - [`RateLimiter`] - Per-domain request spacing
//! - [`CatalogMatcher`] - Style code normalization and matching

pub mod config;
pub mod errors;
pub mod matcher;
pub mod models;
pub mod registry;
pub mod service;
pub mod source;

pub use config::{MarketDataConfig, SourceConfig, SourceKind};
pub use errors::{MarketDataError, RetryClass};
pub use matcher::CatalogMatcher;
pub use models::{from_cents, parse_price, ConsolidatedQuote, MarketQuote};
pub use registry::{
    BackoffPolicy, Clock, DelayRange, ManualClock, QuoteValidator, RateLimiter, TokioClock,
    ValidationSeverity, ValidatorConfig, DEFAULT_DELAY_RANGE, DEFAULT_MAX_ATTEMPTS,
    MAX_DELAY_SECS,
};
pub use service::MarketDataService;
pub use source::{
    build_sources, ExtractedListing, FlightClubSource, GoatSource, HttpSource, ListingExtractor,
    SourceFetcher, StockXSource,
};
