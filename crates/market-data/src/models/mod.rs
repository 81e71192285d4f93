//! Market data models
//!
//! - `quote` - Per-source quotes (MarketQuote) and the merged record (ConsolidatedQuote)
//! - `price` - Price text parsing helpers shared by the sources

mod price;
mod quote;

pub use price::{from_cents, parse_price};
pub use quote::{ConsolidatedQuote, MarketQuote};
