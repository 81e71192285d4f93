use std::sync::Arc;
use std::time::Duration;

use log::{debug, info, warn};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use resale_market_data::{ConsolidatedQuote, MarketDataService};

use super::cache::QuoteCache;
use crate::errors::Result;
use crate::profit::{
    FeeSchedule, NetProfit, ProfitEvaluator, ProfitResult, RetailListing, DEFAULT_PROFIT_THRESHOLD,
};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzerConfig {
    /// Minimum margin, in percent, for a deal to count as profitable.
    pub profit_threshold: Decimal,
    /// When set, every deal also carries a net evaluation.
    #[serde(default)]
    pub fees: Option<FeeSchedule>,
    pub cache_ttl_secs: u64,
    /// Listings analyzed at the same time by `analyze_all`.
    pub concurrency: usize,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            profit_threshold: DEFAULT_PROFIT_THRESHOLD,
            fees: None,
            cache_ttl_secs: 3600,
            concurrency: 5,
        }
    }
}

/// A listing together with what it would fetch on the resale market.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzedDeal {
    pub listing: RetailListing,
    pub quote: Option<ConsolidatedQuote>,
    pub profit: ProfitResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub net: Option<NetProfit>,
}

/// Prices retail listings against the resale market.
pub struct DealAnalyzer {
    market: Arc<MarketDataService>,
    cache: QuoteCache,
    config: AnalyzerConfig,
}

impl DealAnalyzer {
    pub fn new(market: Arc<MarketDataService>, config: AnalyzerConfig) -> Self {
        let cache = QuoteCache::new(Duration::from_secs(config.cache_ttl_secs));
        Self {
            market,
            cache,
            config,
        }
    }

    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    pub fn cache(&self) -> &QuoteCache {
        &self.cache
    }

    /// Market quote for a listing.
    ///
    /// Looks in the cache first, then asks the market by catalog code, then
    /// by brand and title. A priced answer is cached and returned at once;
    /// an unpriced one is only returned when nothing better turns up.
    pub async fn market_quote_for(
        &self,
        listing: &RetailListing,
    ) -> Result<Option<ConsolidatedQuote>> {
        listing.validate()?;

        let code = listing.code();
        let name = listing.search_name();
        let title_key = QuoteCache::title_key(&listing.title);

        let cached = match code {
            Some(code) => self.cache.get_by_code(code),
            None => None,
        }
        .or_else(|| self.cache.get(&title_key));
        if let Some(quote) = cached {
            debug!("Using cached market data for '{}'", listing.title);
            return Ok(Some(quote));
        }

        let mut fallback = None;

        if let Some(code) = code {
            if let Some(quote) = self.market.get_market_data(Some(code), None).await {
                if quote.has_price() {
                    self.cache.insert(QuoteCache::code_key(code), quote.clone());
                    return Ok(Some(quote));
                }
                fallback = Some(quote);
            }
        }

        if let Some(name) = name.as_deref() {
            if let Some(quote) = self.market.get_market_data(None, Some(name)).await {
                if quote.has_price() {
                    self.cache.insert(title_key, quote.clone());
                    return Ok(Some(quote));
                }
                fallback = Some(quote);
            }
        }

        if fallback.is_none() {
            info!("No market data for '{}'", listing.title);
        }
        Ok(fallback)
    }

    /// Price one listing.
    pub async fn analyze(&self, listing: RetailListing) -> Result<AnalyzedDeal> {
        let quote = self.market_quote_for(&listing).await?;
        let threshold = self.config.profit_threshold;

        let (profit, net) = match &quote {
            Some(quote) => (
                ProfitEvaluator::evaluate(&listing, quote, threshold),
                self.config
                    .fees
                    .as_ref()
                    .map(|fees| ProfitEvaluator::evaluate_net(&listing, quote, threshold, fees)),
            ),
            None => (
                ProfitEvaluator::evaluate_prices(listing.current_price, Decimal::ZERO, threshold),
                None,
            ),
        };

        Ok(AnalyzedDeal {
            listing,
            quote,
            profit,
            net,
        })
    }

    /// Price many listings, best margin first.
    ///
    /// Invalid listings are logged and left out.
    pub async fn analyze_all(&self, listings: Vec<RetailListing>) -> Vec<AnalyzedDeal> {
        let total = listings.len();
        let batch_size = self.config.concurrency.max(1);
        let mut deals = Vec::with_capacity(total);

        for chunk in listings.chunks(batch_size) {
            let futures: Vec<_> = chunk
                .iter()
                .cloned()
                .map(|listing| self.analyze(listing))
                .collect();

            for result in futures::future::join_all(futures).await {
                match result {
                    Ok(deal) => deals.push(deal),
                    Err(e) => warn!("Skipping listing: {}", e),
                }
            }
        }

        deals.sort_by(|a, b| b.profit.profit_percentage.cmp(&a.profit.profit_percentage));

        info!(
            "Analyzed {} of {} listings, {} profitable",
            deals.len(),
            total,
            deals.iter().filter(|d| d.profit.is_profitable).count()
        );
        deals
    }

    /// The `limit` most profitable deals among `listings`.
    pub async fn most_profitable(
        &self,
        listings: Vec<RetailListing>,
        limit: usize,
    ) -> Vec<AnalyzedDeal> {
        self.analyze_all(listings)
            .await
            .into_iter()
            .filter(|deal| deal.profit.is_profitable)
            .take(limit)
            .collect()
    }
}
