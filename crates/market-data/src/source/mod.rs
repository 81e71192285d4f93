//! Marketplace sources.
//!
//! Each source implements [`SourceFetcher`] on top of a shared
//! [`HttpSource`], which owns rate limiting, retries and validation.

pub mod flight_club;
pub mod goat;
mod http;
pub mod stockx;
mod traits;

use std::sync::Arc;

use log::{debug, warn};

pub use flight_club::{ExtractedListing, FlightClubSource, ListingExtractor};
pub use goat::GoatSource;
pub use http::{HttpSource, DEFAULT_REQUEST_TIMEOUT};
pub use stockx::StockXSource;
pub use traits::{best_code_match, SourceFetcher};

use crate::config::{MarketDataConfig, SourceKind};
use crate::registry::{Clock, QuoteValidator, RateLimiter};

/// Build the enabled sources in configured order.
///
/// Per-source rate limit overrides are installed on `limiter`. Flight Club
/// is skipped with a warning when no `extractor` is supplied.
pub fn build_sources(
    config: &MarketDataConfig,
    limiter: Arc<RateLimiter>,
    clock: Arc<dyn Clock>,
    extractor: Option<Arc<dyn ListingExtractor>>,
) -> Vec<Arc<dyn SourceFetcher>> {
    let http = HttpSource::new(limiter.clone(), clock, config.request_timeout())
        .with_validator(QuoteValidator::with_config(config.validation.clone()));
    let mut sources: Vec<Arc<dyn SourceFetcher>> = Vec::new();

    for source in config.enabled_sources() {
        if let Some(range) = source.rate_limit {
            limiter.configure(source.kind.domain(), range);
        }

        match source.kind {
            SourceKind::StockX => sources.push(Arc::new(StockXSource::new(http.clone()))),
            SourceKind::Goat => sources.push(Arc::new(GoatSource::new(http.clone()))),
            SourceKind::FlightClub => match &extractor {
                Some(extractor) => sources.push(Arc::new(FlightClubSource::new(
                    http.clone(),
                    Arc::clone(extractor),
                ))),
                None => warn!("Skipping source '{}': no listing extractor configured", source.kind),
            },
        }
    }

    debug!(
        "Built {} market data sources: {:?}",
        sources.len(),
        sources.iter().map(|s| s.id()).collect::<Vec<_>>()
    );
    sources
}
