//! GOAT marketplace source.
//!
//! GOAT's storefront search is served by a hosted Constructor.io index,
//! queried as `{search_url}/{term}`. The index returns prices in cents,
//! which are converted on the way in.

use async_trait::async_trait;
use reqwest::Url;
use serde::Deserialize;

use crate::errors::MarketDataError;
use crate::models::{from_cents, MarketQuote};
use crate::source::http::{parse_error, HttpSource};
use crate::source::SourceFetcher;

const SEARCH_URL: &str = "https://ac.cnstrc.com/search";
const SITE_URL: &str = "https://www.goat.com";
const SOURCE_ID: &str = "GOAT";
const DOMAIN: &str = "goat.com";

/// Public storefront key of GOAT's search index.
const SEARCH_CLIENT_KEY: &str = "key_XT7bjdbvjgECO5d8";
/// Anonymous client id sent with every search.
const SEARCH_CLIENT_ID: &str = "7cd2b8e6-0380-4162-8cd8-167bcf172b41";
const RESULTS_PER_PAGE: usize = 20;

// ============================================================================
// API Response Structures
// ============================================================================

#[derive(Debug, Deserialize)]
struct SearchEnvelope {
    response: SearchResponse,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<SearchHit>,
}

#[derive(Debug, Deserialize)]
struct SearchHit {
    #[serde(default)]
    value: Option<String>,
    data: HitData,
}

#[derive(Debug, Deserialize)]
struct HitData {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    sku: Option<String>,
    #[serde(default)]
    brand_name: Option<String>,
    #[serde(default)]
    slug: Option<String>,
    #[serde(default)]
    image_url: Option<String>,
    #[serde(default)]
    lowest_price_cents: Option<f64>,
    #[serde(default)]
    retail_price_cents: Option<f64>,
    #[serde(default)]
    last_sale_price_cents: Option<f64>,
}

// ============================================================================
// GoatSource
// ============================================================================

pub struct GoatSource {
    http: HttpSource,
    search_url: String,
    site_url: String,
}

impl GoatSource {
    pub fn new(http: HttpSource) -> Self {
        Self {
            http,
            search_url: SEARCH_URL.to_string(),
            site_url: SITE_URL.to_string(),
        }
    }

    /// Point the search endpoint at another host, e.g. a local fixture server.
    pub fn with_search_url(mut self, search_url: impl Into<String>) -> Self {
        self.search_url = search_url.into().trim_end_matches('/').to_string();
        self
    }

    async fn fetch(&self, query: &str) -> Result<Vec<MarketQuote>, MarketDataError> {
        let url = search_term_url(&self.search_url, query)?;
        let params = [
            ("c", "ciojs-client-2.29.12".to_string()),
            ("key", SEARCH_CLIENT_KEY.to_string()),
            ("i", SEARCH_CLIENT_ID.to_string()),
            ("s", "1".to_string()),
            ("num_results_per_page", RESULTS_PER_PAGE.to_string()),
        ];

        let body = self
            .http
            .get_text(SOURCE_ID, DOMAIN, url.as_str(), &params)
            .await?;
        parse_search(&body, &self.site_url)
    }
}

/// Append the search term to the index URL as one percent-encoded segment.
fn search_term_url(search_url: &str, term: &str) -> Result<Url, MarketDataError> {
    let invalid = || MarketDataError::InvalidInput(format!("Invalid GOAT search URL '{}'", search_url));

    let mut url = Url::parse(search_url).map_err(|_| invalid())?;
    url.path_segments_mut()
        .map_err(|_| invalid())?
        .pop_if_empty()
        .push(term.trim());
    Ok(url)
}

fn cents(value: Option<f64>) -> Option<rust_decimal::Decimal> {
    value
        .filter(|v| v.is_finite())
        .map(|v| from_cents(v.round() as i64))
}

fn parse_search(body: &str, site_url: &str) -> Result<Vec<MarketQuote>, MarketDataError> {
    let envelope: SearchEnvelope =
        serde_json::from_str(body).map_err(|e| parse_error(SOURCE_ID, e))?;

    let quotes = envelope
        .response
        .results
        .into_iter()
        .filter_map(|hit| {
            let data = hit.data;
            let name = data
                .name
                .or(hit.value)
                .filter(|n| !n.trim().is_empty())?;

            let mut quote = MarketQuote::new(
                SOURCE_ID,
                name.trim(),
                cents(data.lowest_price_cents).unwrap_or_default(),
            );

            if let Some(sku) = data.sku {
                quote = quote.with_catalog_code(sku);
            }
            if let Some(retail) = cents(data.retail_price_cents) {
                quote = quote.with_retail_price(retail);
            }
            if let Some(slug) = data.slug.filter(|s| !s.is_empty()) {
                quote = quote.with_url(format!("{}/sneakers/{}", site_url, slug));
            }
            if let Some(image) = data.image_url {
                quote = quote.with_image_url(image);
            }
            quote.brand = data.brand_name.filter(|b| !b.trim().is_empty());
            quote.last_sale = cents(data.last_sale_price_cents);

            Some(quote)
        })
        .collect();

    Ok(quotes)
}

#[async_trait]
impl SourceFetcher for GoatSource {
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{DelayRange, ManualClock, RateLimiter};
    use crate::source::http::test_server;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use std::sync::Arc;
    use std::time::Duration;

    const SEARCH_FIXTURE: &str = r#"{
        "response": {
            "results": [
                {
                    "value": "Dunk Low 'Panda'",
                    "data": {
                        "name": "Dunk Low 'Black White'",
                        "sku": "DD1391 100",
                        "brand_name": "Nike",
                        "slug": "dunk-low-black-white-dd1391-100",
                        "image_url": "https://image.goat.com/panda.png",
                        "lowest_price_cents": 16000,
                        "retail_price_cents": 11000,
                        "last_sale_price_cents": 15550
                    }
                },
                {
                    "value": "Yeezy Boost 350",
                    "data": { "sku": "B75806" }
                },
                { "data": {} }
            ]
        }
    }"#;

    #[test]
    fn test_parse_search_converts_cents() {
        let quotes = parse_search(SEARCH_FIXTURE, SITE_URL).unwrap();

        assert_eq!(quotes.len(), 2);
        let panda = &quotes[0];
        assert_eq!(panda.source_name, "GOAT");
        assert_eq!(panda.display_name, "Dunk Low 'Black White'");
        assert_eq!(panda.catalog_code, "DD1391 100");
        assert_eq!(panda.market_price, dec!(160.00));
        assert_eq!(panda.retail_price, Some(dec!(110.00)));
        assert_eq!(panda.last_sale, Some(dec!(155.50)));
        assert_eq!(
            panda.url,
            "https://www.goat.com/sneakers/dunk-low-black-white-dd1391-100"
        );
    }

    #[test]
    fn test_parse_search_falls_back_to_value_name() {
        let quotes = parse_search(SEARCH_FIXTURE, SITE_URL).unwrap();

        assert_eq!(quotes[1].display_name, "Yeezy Boost 350");
        assert_eq!(quotes[1].market_price, Decimal::ZERO);
    }

    #[test]
    fn test_parse_search_requires_envelope() {
        assert!(matches!(
            parse_search(r#"{"results": []}"#, SITE_URL),
            Err(MarketDataError::Parse { .. })
        ));
    }

    fn local_source(base_url: &str) -> GoatSource {
        let clock = Arc::new(ManualClock::new());
        let limiter = Arc::new(RateLimiter::new(clock.clone()));
        limiter.configure(DOMAIN, DelayRange::new(0.0, 0.0));
        let http = HttpSource::new(limiter, clock, Duration::from_secs(5));
        GoatSource::new(http).with_search_url(format!("{}/search", base_url))
    }

    #[test]
    fn test_search_term_is_a_path_segment() {
        let url = search_term_url(SEARCH_URL, "dunk low/panda").unwrap();

        assert_eq!(url.as_str(), "https://ac.cnstrc.com/search/dunk%20low%2Fpanda");
        assert!(matches!(
            search_term_url("not a url", "dunk"),
            Err(MarketDataError::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn test_search_sends_query_in_path() {
        let server = test_server::serve(vec![(200, SEARCH_FIXTURE.to_string())]).await;
        let source = local_source(&server.base_url);

        let quotes = source.search_by_name("dunk low").await;

        assert_eq!(quotes.len(), 2);
        let (path, params) = server.last_request();
        assert_eq!(path, "/search/dunk%20low");
        assert_eq!(test_server::param(&params, "key"), Some(SEARCH_CLIENT_KEY));
        assert_eq!(test_server::param(&params, "i"), Some(SEARCH_CLIENT_ID));
        assert_eq!(test_server::param(&params, "num_results_per_page"), Some("20"));
    }

    #[tokio::test]
    async fn test_code_lookup_matches_normalized_sku() {
        let server = test_server::serve(vec![(200, SEARCH_FIXTURE.to_string())]).await;
        let source = local_source(&server.base_url);

        let found = source.search_by_code("B75806").await.unwrap();

        assert_eq!(found.display_name, "Yeezy Boost 350");
        assert_eq!(server.last_request().0, "/search/B75806");
    }
}
