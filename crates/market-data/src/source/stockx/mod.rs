//! StockX marketplace source.
//!
//! Uses the public browse endpoint, which answers a free-text query with a
//! JSON product list:
//! - `Products[].styleId` carries the catalog code
//! - `Products[].market` carries lowest ask, last sale and highest bid
//!
//! Code lookups go through the same endpoint and keep the exact style match.

use async_trait::async_trait;
use serde::Deserialize;

use crate::errors::MarketDataError;
use crate::models::MarketQuote;
use crate::source::http::{decimal, parse_error, HttpSource};
use crate::source::SourceFetcher;

const BASE_URL: &str = "https://stockx.com";
const SOURCE_ID: &str = "STOCKX";
const DOMAIN: &str = "stockx.com";

// ============================================================================
// API Response Structures
// ============================================================================

#[derive(Debug, Deserialize)]
struct BrowseResponse {
    #[serde(rename = "Products", default)]
    products: Vec<Product>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Product {
    #[serde(default)]
    title: String,
    #[serde(default)]
    style_id: Option<String>,
    #[serde(default)]
    brand: Option<String>,
    #[serde(default)]
    url_key: Option<String>,
    #[serde(default)]
    retail_price: Option<f64>,
    #[serde(default)]
    media: Option<Media>,
    #[serde(default)]
    market: Option<Market>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Media {
    image_url: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Market {
    lowest_ask: Option<f64>,
    last_sale: Option<f64>,
    highest_bid: Option<f64>,
}

// ============================================================================
// StockXSource
// ============================================================================

pub struct StockXSource {
    http: HttpSource,
    base_url: String,
}

impl StockXSource {
    pub fn new(http: HttpSource) -> Self {
        Self::with_base_url(http, BASE_URL)
    }

    /// Point the source at another host, e.g. a local fixture server.
    pub fn with_base_url(http: HttpSource, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    async fn fetch(&self, query: &str) -> Result<Vec<MarketQuote>, MarketDataError> {
        let url = format!("{}/api/browse", self.base_url);
        let params = [("_search", query.to_string()), ("dataType", "product".to_string())];

        let body = self.http.get_text(SOURCE_ID, DOMAIN, &url, &params).await?;
        parse_browse(&body, &self.base_url)
    }
}

fn parse_browse(body: &str, base_url: &str) -> Result<Vec<MarketQuote>, MarketDataError> {
    let response: BrowseResponse =
        serde_json::from_str(body).map_err(|e| parse_error(SOURCE_ID, e))?;

    Ok(response
        .products
        .into_iter()
        .filter(|p| !p.title.trim().is_empty())
        .map(|p| to_quote(p, base_url))
        .collect())
}

fn to_quote(product: Product, base_url: &str) -> MarketQuote {
    let market = product.market.unwrap_or(Market {
        lowest_ask: None,
        last_sale: None,
        highest_bid: None,
    });

    let mut quote = MarketQuote::new(
        SOURCE_ID,
        product.title.trim(),
        decimal(market.lowest_ask).unwrap_or_default(),
    );

    if let Some(code) = product.style_id {
        quote = quote.with_catalog_code(code);
    }
    if let Some(retail) = decimal(product.retail_price) {
        quote = quote.with_retail_price(retail);
    }
    if let Some(key) = product.url_key.filter(|k| !k.is_empty()) {
        quote = quote.with_url(format!("{}/{}", base_url, key));
    }
    if let Some(image) = product.media.and_then(|m| m.image_url) {
        quote = quote.with_image_url(image);
    }

    quote.brand = product.brand.filter(|b| !b.trim().is_empty());
    quote.last_sale = decimal(market.last_sale);
    quote.highest_bid = decimal(market.highest_bid);
    quote
}

#[async_trait]
impl SourceFetcher for StockXSource {
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
