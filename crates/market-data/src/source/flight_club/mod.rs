//! Flight Club marketplace source.
//!
//! Flight Club only exposes an HTML catalog search. Pulling candidate
//! records out of the page is delegated to a [`ListingExtractor`]; this
//! source handles the request, URL resolution and price parsing.

use std::sync::Arc;

use async_trait::async_trait;

use crate::errors::MarketDataError;
use crate::models::{parse_price, MarketQuote};
use crate::source::http::{parse_error, HttpSource};
use crate::source::SourceFetcher;

const BASE_URL: &str = "https://www.flightclub.com";
const SOURCE_ID: &str = "FLIGHTCLUB";
const DOMAIN: &str = "flightclub.com";

/// A product tile as found on a catalog page, before any interpretation.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ExtractedListing {
    pub title: String,
    /// Link to the product page, absolute or site-relative.
    pub href: String,
    /// Price as printed, e.g. `"$1,200.00"`.
    pub price_text: String,
    pub image_url: Option<String>,
}

/// Turns a catalog page body into product tiles.
pub trait ListingExtractor: Send + Sync {
    /// Returns an error message when the page is not a catalog page.
    fn extract(&self, html: &str) -> Result<Vec<ExtractedListing>, String>;
}

pub struct FlightClubSource {
    http: HttpSource,
    extractor: Arc<dyn ListingExtractor>,
    base_url: String,
}

impl FlightClubSource {
    pub fn new(http: HttpSource, extractor: Arc<dyn ListingExtractor>) -> Self {
        Self::with_base_url(http, extractor, BASE_URL)
    }

    pub fn with_base_url(
        http: HttpSource,
        extractor: Arc<dyn ListingExtractor>,
        base_url: impl Into<String>,
    ) -> Self {
        Self {
            http,
            extractor,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    async fn fetch(&self, query: &str) -> Result<Vec<MarketQuote>, MarketDataError> {
        let url = format!("{}/catalogsearch/result", self.base_url);
        let params = [("q", query.to_string())];

        let body = self.http.get_text(SOURCE_ID, DOMAIN, &url, &params).await?;
        let listings = self
            .extractor
            .extract(&body)
            .map_err(|e| parse_error(SOURCE_ID, e))?;

        Ok(listings
            .into_iter()
            .filter(|l| !l.title.trim().is_empty())
            .map(|l| to_quote(l, &self.base_url))
            .collect())
    }
}

/// Resolve a site-relative link against the base URL.
fn absolute_url(href: &str, base_url: &str) -> String {
    if href.is_empty() || href.starts_with("http://") || href.starts_with("https://") {
        href.to_string()
    } else if href.starts_with('/') {
        format!("{}{}", base_url, href)
    } else {
        format!("{}/{}", base_url, href)
    }
}

/// Product pages end in the style code, e.g. `/air-jordan-1-high-555088-101`.
fn code_from_url(url: &str) -> String {
    let path = url.split(['?', '#']).next().unwrap_or_default();
    let segment = path
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or_default();

    // Trailing "-NNNNNN-NNN" style suffix when present, else the whole slug.
    let parts: Vec<&str> = segment.split('-').collect();
    match parts.as_slice() {
        [.., style, color]
            if style.len() >= 5
                && style.chars().any(|c| c.is_ascii_digit())
                && color.len() == 3
                && color.chars().all(|c| c.is_ascii_digit()) =>
        {
            format!("{}-{}", style.to_uppercase(), color)
        }
        _ => segment.to_string(),
    }
}

fn to_quote(listing: ExtractedListing, base_url: &str) -> MarketQuote {
    let url = absolute_url(listing.href.trim(), base_url);
    let price = parse_price(&listing.price_text).unwrap_or_default();

    let mut quote = MarketQuote::new(SOURCE_ID, listing.title.trim(), price);
    if !url.is_empty() {
        quote = quote.with_catalog_code(code_from_url(&url)).with_url(url);
    }
    if let Some(image) = listing.image_url {
        quote = quote.with_image_url(image);
    }
    quote
}

#[async_trait]
impl SourceFetcher for FlightClubSource {
    fn id(&self) -> &'static str {
        SOURCE_ID
    }

    fn domain(&self) -> &'static str {
        DOMAIN
    }

    async fn search_by_name(&self, query: &str) -> Vec<MarketQuote> {
        let result = self.fetch(query).await;
        self.http.settle(SOURCE_ID, query, result)
    }
}
