use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One marketplace's answer for a query.
///
/// Built by a source fetcher after a successful retrieval and never
/// mutated afterwards. `market_price` of zero means the source listed the
/// item without an asking price.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MarketQuote {
    /// Source that produced the quote (STOCKX, GOAT, ...)
    pub source_name: String,

    /// Manufacturer style code as the source prints it
    pub catalog_code: String,

    pub display_name: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,

    /// Lowest ask on the marketplace
    pub market_price: Decimal,

    /// Manufacturer retail price, when the source knows it
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retail_price: Option<Decimal>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_sale: Option<Decimal>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub highest_bid: Option<Decimal>,

    pub url: String,

    pub image_url: String,

    pub fetched_at: DateTime<Utc>,
}

impl MarketQuote {
    /// Create a quote with the required fields; everything else empty.
    pub fn new(
        source_name: impl Into<String>,
        display_name: impl Into<String>,
        market_price: Decimal,
    ) -> Self {
        Self {
            source_name: source_name.into(),
            catalog_code: String::new(),
            display_name: display_name.into(),
            brand: None,
            market_price,
            retail_price: None,
            last_sale: None,
            highest_bid: None,
            url: String::new(),
            image_url: String::new(),
            fetched_at: Utc::now(),
        }
    }

    pub fn with_catalog_code(mut self, code: impl Into<String>) -> Self {
        self.catalog_code = code.into();
        self
    }

    pub fn with_retail_price(mut self, price: Decimal) -> Self {
        self.retail_price = Some(price);
        self
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    pub fn with_image_url(mut self, url: impl Into<String>) -> Self {
        self.image_url = url.into();
        self
    }

    pub fn has_price(&self) -> bool {
        self.market_price > Decimal::ZERO
    }

    /// Number of populated fields. Used to pick the quote that describes
    /// the item best when several sources answered.
    pub fn richness(&self) -> usize {
        let text = [
            &self.source_name,
            &self.catalog_code,
            &self.display_name,
            &self.url,
            &self.image_url,
        ]
        .iter()
        .filter(|value| !value.trim().is_empty())
        .count();

        let prices = [self.retail_price, self.last_sale, self.highest_bid]
            .iter()
            .filter(|value| value.is_some_and(|v| v > Decimal::ZERO))
            .count();

        text + prices + usize::from(self.has_price()) + usize::from(self.brand.is_some())
    }
}

/// Best-effort merge of every source's quote for one item.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ConsolidatedQuote {
    pub display_name: String,

    pub catalog_code: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,

    /// Mean of every strictly positive source price; zero when none had one
    pub market_price: Decimal,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub retail_price: Option<Decimal>,

    pub url: String,

    pub image_url: String,

    /// Sources that returned a usable quote
    pub contributing_sources: BTreeSet<String>,

    /// How many quotes fed the mean
    pub price_sources: usize,

    pub fetched_at: DateTime<Utc>,
}

impl ConsolidatedQuote {
    /// Merge quotes from several sources.
    ///
    /// `quotes` must be in source priority order: when two quotes are equally
    /// rich, the earlier one supplies the descriptive fields. Returns `None`
    /// for an empty slice. `fallback_code` fills `catalog_code` when the
    /// chosen quote has none.
    pub fn from_quotes(quotes: &[MarketQuote], fallback_code: Option<&str>) -> Option<Self> {
        let mut richest = quotes.first()?;
        for quote in &quotes[1..] {
            if quote.richness() > richest.richness() {
                richest = quote;
            }
        }

        let priced: Vec<Decimal> = quotes
            .iter()
            .filter(|q| q.has_price())
            .map(|q| q.market_price)
            .collect();

        let market_price = if priced.is_empty() {
            Decimal::ZERO
        } else {
            priced.iter().sum::<Decimal>() / Decimal::from(priced.len())
        };

        let catalog_code = if richest.catalog_code.trim().is_empty() {
            fallback_code.unwrap_or_default().to_string()
        } else {
            richest.catalog_code.clone()
        };

        let fetched_at = quotes
            .iter()
            .map(|q| q.fetched_at)
            .max()
            .unwrap_or_else(Utc::now);

        Some(Self {
            display_name: richest.display_name.clone(),
            catalog_code,
            brand: richest.brand.clone(),
            market_price,
            retail_price: richest.retail_price.filter(|p| *p > Decimal::ZERO),
            url: richest.url.clone(),
            image_url: richest.image_url.clone(),
            contributing_sources: quotes.iter().map(|q| q.source_name.clone()).collect(),
            price_sources: priced.len(),
            fetched_at,
        })
    }

    pub fn has_price(&self) -> bool {
        self.market_price > Decimal::ZERO
    }
}
