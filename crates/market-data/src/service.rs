//! Concurrent lookup across every configured marketplace.
//!
//! One task per source, no ordering between them. Each source degrades to
//! an empty answer on its own, and a task that panics is logged and treated
//! the same way, so a single marketplace can never sink a lookup.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use log::{debug, info, warn};
use tokio::task::JoinSet;

use crate::config::MarketDataConfig;
use crate::errors::MarketDataError;
use crate::models::{ConsolidatedQuote, MarketQuote};
use crate::registry::{Clock, RateLimiter, TokioClock};
use crate::source::{build_sources, ListingExtractor, SourceFetcher};

#[derive(Clone, Debug)]
enum Lookup {
    Code(String),
    Name(String),
}

pub struct MarketDataService {
    sources: Vec<Arc<dyn SourceFetcher>>,
    deadline: Option<Duration>,
}

impl MarketDataService {
    /// Sources are consulted concurrently; their order is the tie-break
    /// when two of them return equally complete quotes.
    pub fn new(sources: Vec<Arc<dyn SourceFetcher>>) -> Self {
        Self {
            sources,
            deadline: None,
        }
    }

    /// Abandon sources still running after `deadline`.
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Build the configured sources over a fresh process-wide rate limiter.
    pub fn from_config(
        config: &MarketDataConfig,
        extractor: Option<Arc<dyn ListingExtractor>>,
    ) -> Self {
        let clock: Arc<dyn Clock> = Arc::new(TokioClock);
        let limiter = Arc::new(RateLimiter::new(clock.clone()));
        let sources = build_sources(config, limiter, clock, extractor);

        Self {
            sources,
            deadline: config.deadline(),
        }
    }

    pub fn source_ids(&self) -> Vec<&'static str> {
        self.sources.iter().map(|s| s.id()).collect()
    }

    /// Consolidated market data for an item, preferring the catalog code.
    ///
    /// With a code every source runs a code lookup; otherwise every source
    /// runs a name search and contributes its top candidate. Blank inputs
    /// count as missing, and with neither present no source is called.
    pub async fn get_market_data(
        &self,
        code: Option<&str>,
        name: Option<&str>,
    ) -> Option<ConsolidatedQuote> {
        self.get_market_data_within(code, name, self.deadline).await
    }

    /// [`get_market_data`](Self::get_market_data) with a caller-supplied
    /// overall deadline in place of the configured one.
    pub async fn get_market_data_within(
        &self,
        code: Option<&str>,
        name: Option<&str>,
        deadline: Option<Duration>,
    ) -> Option<ConsolidatedQuote> {
        let code = code.map(str::trim).filter(|c| !c.is_empty());
        let name = name.map(str::trim).filter(|n| !n.is_empty());

        let lookup = match (code, name) {
            (Some(code), _) => Lookup::Code(code.to_string()),
            (None, Some(name)) => Lookup::Name(name.to_string()),
            (None, None) => {
                debug!("Market data lookup without code or name, skipping");
                return None;
            }
        };

        let indexed = self.sources.iter().cloned().enumerate().collect();
        let results = fan_out(indexed, deadline, move |source| {
            let lookup = lookup.clone();
            async move {
                match lookup {
                    Lookup::Code(code) => source.search_by_code(&code).await,
                    Lookup::Name(name) => source.search_by_name(&name).await.into_iter().next(),
                }
            }
        })
        .await;

        let quotes: Vec<MarketQuote> = results.into_iter().filter_map(|(_, quote)| quote).collect();

        let consolidated = ConsolidatedQuote::from_quotes(&quotes, code);
        match &consolidated {
            Some(quote) => debug!(
                "Consolidated '{}' at {} from {:?}",
                quote.display_name, quote.market_price, quote.contributing_sources
            ),
            None => info!(
                "No market data found for {}",
                code.or(name).unwrap_or_default()
            ),
        }
        consolidated
    }

    /// Raw name-search results per source, without consolidation.
    ///
    /// `sources` restricts the search to the given source ids (matched
    /// case-insensitively, unknown ids are ignored with a warning). Every
    /// searched source has an entry, empty when it found nothing or failed.
    pub async fn search_across_sources(
        &self,
        query: &str,
        sources: Option<&[&str]>,
    ) -> Result<HashMap<String, Vec<MarketQuote>>, MarketDataError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(MarketDataError::InvalidInput(
                "Search query must not be empty".to_string(),
            ));
        }

        let selected = self.select(sources);
        let mut by_source: HashMap<String, Vec<MarketQuote>> = selected
            .iter()
            .map(|(_, source)| (source.id().to_string(), Vec::new()))
            .collect();
        let ids: Vec<&'static str> = selected.iter().map(|(_, source)| source.id()).collect();

        let query = query.to_string();
        let results = fan_out(selected, self.deadline, move |source| {
            let query = query.clone();
            async move { source.search_by_name(&query).await }
        })
        .await;

        for (index, quotes) in results {
            if let Some(id) = ids.get(index) {
                by_source.insert(id.to_string(), quotes);
            }
        }

        Ok(by_source)
    }

    /// Sources matching the requested ids, indexed by their position in
    /// the returned list.
    fn select(&self, requested: Option<&[&str]>) -> Vec<(usize, Arc<dyn SourceFetcher>)> {
        let chosen: Vec<Arc<dyn SourceFetcher>> = match requested {
            None => self.sources.clone(),
            Some(ids) => {
                for id in ids {
                    if !self.sources.iter().any(|s| same_id(s.id(), id)) {
                        warn!("Ignoring unknown source '{}'", id);
                    }
                }
                self.sources
                    .iter()
                    .filter(|s| ids.iter().any(|id| same_id(s.id(), id)))
                    .cloned()
                    .collect()
            }
        };
        chosen.into_iter().enumerate().collect()
    }
}

fn same_id(source_id: &str, requested: &str) -> bool {
    let key = |s: &str| -> String {
        s.chars()
            .filter(char::is_ascii_alphanumeric)
            .map(|c| c.to_ascii_lowercase())
            .collect()
    };
    key(source_id) == key(requested)
}

/// Run `task` once per source concurrently and collect what finishes.
///
/// Results come back sorted by the index they were submitted with. Tasks
/// that panic are logged and dropped; tasks still running at `deadline`
/// are aborted.
async fn fan_out<T, F, Fut>(
    sources: Vec<(usize, Arc<dyn SourceFetcher>)>,
    deadline: Option<Duration>,
    task: F,
) -> Vec<(usize, T)>
where
    T: Send + 'static,
    F: Fn(Arc<dyn SourceFetcher>) -> Fut,
    Fut: Future<Output = T> + Send + 'static,
{
    let mut set = JoinSet::new();
    for (index, source) in sources {
        let work = task(source);
        set.spawn(async move { (index, work.await) });
    }

    let mut results = Vec::with_capacity(set.len());
    let collect = async {
        while let Some(joined) = set.join_next().await {
            match joined {
                Ok(result) => results.push(result),
                Err(e) => warn!("Source task failed: {}", e),
            }
        }
    };

    let finished = match deadline {
        Some(deadline) => tokio::time::timeout(deadline, collect).await.is_ok(),
        None => {
            collect.await;
            true
        }
    };

    if !finished {
        warn!(
            "Deadline reached, abandoning {} unfinished source(s)",
            set.len()
        );
        set.abort_all();
    }

    results.sort_by_key(|(index, _)| *index);
    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct MockSource {
        id: &'static str,
        results: Vec<MarketQuote>,
        delay: Option<Duration>,
        panics: bool,
        name_calls: AtomicUsize,
        code_calls: AtomicUsize,
    }

    impl MockSource {
        fn new(id: &'static str, results: Vec<MarketQuote>) -> Self {
            Self {
                id,
                results,
                ..Default::default()
            }
        }
    }

    #[async_trait]
    impl SourceFetcher for MockSource {
        fn id(&self) -> &'static str {
            self.id
        }

        fn domain(&self) -> &'static str {
            "mock.test"
        }

        async fn search_by_name(&self, _query: &str) -> Vec<MarketQuote> {
            self.name_calls.fetch_add(1, Ordering::SeqCst);
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            if self.panics {
                panic!("marketplace layout changed");
            }
            self.results.clone()
        }

        async fn search_by_code(&self, code: &str) -> Option<MarketQuote> {
            self.code_calls.fetch_add(1, Ordering::SeqCst);
            let candidates = self.search_by_name(code).await;
            crate::source::best_code_match(code, candidates)
        }
    }

    /// Times out on every attempt until the retry budget is spent.
    struct TimingOutSource {
        clock: crate::registry::ManualClock,
        attempts: AtomicUsize,
    }

    #[async_trait]
    impl SourceFetcher for TimingOutSource {
        fn id(&self) -> &'static str {
            "STOCKX"
        }

        fn domain(&self) -> &'static str {
            "stockx.com"
        }

        async fn search_by_name(&self, _query: &str) -> Vec<MarketQuote> {
            let result: Result<Vec<MarketQuote>, MarketDataError> =
                crate::registry::BackoffPolicy::default()
                    .run(&self.clock, "STOCKX", |_| {
                        self.attempts.fetch_add(1, Ordering::SeqCst);
                        async {
                            Err(MarketDataError::Timeout {
                                source_id: "STOCKX".to_string(),
                            })
                        }
                    })
                    .await;
            result.unwrap_or_default()
        }
    }

    fn quote(source: &str, price: Decimal) -> MarketQuote {
        MarketQuote::new(source, "Dunk Low Panda", price).with_catalog_code("DD1391-100")
    }

    fn service(sources: Vec<Arc<MockSource>>) -> MarketDataService {
        MarketDataService::new(
            sources
                .into_iter()
                .map(|s| s as Arc<dyn SourceFetcher>)
                .collect(),
        )
    }

    #[tokio::test]
    async fn test_consolidates_mean_of_positive_prices() {
        let stockx = Arc::new(MockSource::new("STOCKX", vec![quote("STOCKX", dec!(150))]));
        let goat = Arc::new(MockSource::new("GOAT", vec![quote("GOAT", dec!(160))]));
        let flight = Arc::new(MockSource::new("FLIGHTCLUB", Vec::new()));
        let service = service(vec![stockx, goat, flight]);

        let result = service
            .get_market_data(Some("DD1391-100"), None)
            .await
            .unwrap();

        assert_eq!(result.market_price, dec!(155));
        assert_eq!(result.price_sources, 2);
        assert_eq!(
            result.contributing_sources.iter().collect::<Vec<_>>(),
            vec!["GOAT", "STOCKX"]
        );
    }

    #[tokio::test]
    async fn test_code_lookup_uses_code_search() {
        let stockx = Arc::new(MockSource::new("STOCKX", vec![quote("STOCKX", dec!(150))]));
        let service = service(vec![stockx.clone()]);

        service
            .get_market_data(Some("DD1391-100"), Some("Dunk Low"))
            .await
            .unwrap();

        assert_eq!(stockx.code_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_name_lookup_takes_top_candidate() {
        let results = vec![quote("GOAT", dec!(160)), quote("GOAT", dec!(999))];
        let goat = Arc::new(MockSource::new("GOAT", results));
        let service = service(vec![goat.clone()]);

        let result = service.get_market_data(None, Some("panda")).await.unwrap();

        assert_eq!(result.market_price, dec!(160));
        assert_eq!(goat.code_calls.load(Ordering::SeqCst), 0);
        assert_eq!(goat.name_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_no_code_or_name_makes_no_calls() {
        let stockx = Arc::new(MockSource::new("STOCKX", vec![quote("STOCKX", dec!(150))]));
        let service = service(vec![stockx.clone()]);

        assert!(service.get_market_data(None, None).await.is_none());
        assert!(service.get_market_data(Some("  "), Some("")).await.is_none());
        assert_eq!(stockx.name_calls.load(Ordering::SeqCst), 0);
        assert_eq!(stockx.code_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_nothing_found_anywhere() {
        let service = service(vec![
            Arc::new(MockSource::new("STOCKX", Vec::new())),
            Arc::new(MockSource::new("GOAT", Vec::new())),
        ]);

        assert!(service.get_market_data(Some("ZZ0000-000"), None).await.is_none());
    }

    #[tokio::test]
    async fn test_zero_priced_quote_still_contributes_metadata() {
        let service = service(vec![Arc::new(MockSource::new(
            "FLIGHTCLUB",
            vec![quote("FLIGHTCLUB", Decimal::ZERO)],
        ))]);

        let result = service.get_market_data(None, Some("panda")).await.unwrap();

        assert_eq!(result.market_price, Decimal::ZERO);
        assert!(!result.has_price());
        assert!(result.contributing_sources.contains("FLIGHTCLUB"));
    }

    #[tokio::test]
    async fn test_panicking_source_is_insulated() {
        let broken = Arc::new(MockSource {
            id: "STOCKX",
            panics: true,
            ..Default::default()
        });
        let goat = Arc::new(MockSource::new("GOAT", vec![quote("GOAT", dec!(160))]));
        let service = service(vec![broken, goat]);

        let result = service.get_market_data(None, Some("panda")).await.unwrap();
        assert_eq!(result.market_price, dec!(160));

        let raw = service.search_across_sources("panda", None).await.unwrap();
        assert!(raw["STOCKX"].is_empty());
        assert_eq!(raw["GOAT"].len(), 1);
    }

    #[tokio::test]
    async fn test_exhausted_source_does_not_hide_others() {
        let stockx = Arc::new(TimingOutSource {
            clock: crate::registry::ManualClock::new(),
            attempts: AtomicUsize::new(0),
        });
        let goat: Arc<dyn SourceFetcher> =
            Arc::new(MockSource::new("GOAT", vec![quote("GOAT", dec!(160))]));
        let flight: Arc<dyn SourceFetcher> =
            Arc::new(MockSource::new("FLIGHTCLUB", vec![quote("FLIGHTCLUB", dec!(150))]));
        let service = MarketDataService::new(vec![stockx.clone(), goat, flight]);

        let result = service
            .get_market_data(Some("DD1391-100"), None)
            .await
            .unwrap();

        assert_eq!(stockx.attempts.load(Ordering::SeqCst), 3);
        assert_eq!(result.market_price, dec!(155));
        assert_eq!(
            result.contributing_sources.iter().collect::<Vec<_>>(),
            vec!["FLIGHTCLUB", "GOAT"]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_returns_partial_result() {
        let slow = Arc::new(MockSource {
            id: "STOCKX",
            results: vec![quote("STOCKX", dec!(150))],
            delay: Some(Duration::from_secs(120)),
            ..Default::default()
        });
        let goat = Arc::new(MockSource::new("GOAT", vec![quote("GOAT", dec!(160))]));
        let service = service(vec![slow, goat]).with_deadline(Duration::from_secs(10));

        let result = service
            .get_market_data(Some("DD1391-100"), None)
            .await
            .unwrap();

        assert_eq!(result.market_price, dec!(160));
        assert_eq!(result.contributing_sources.len(), 1);
    }

    #[tokio::test]
    async fn test_search_across_selected_sources() {
        let stockx = Arc::new(MockSource::new("STOCKX", vec![quote("STOCKX", dec!(150))]));
        let goat = Arc::new(MockSource::new("GOAT", vec![quote("GOAT", dec!(160))]));
        let service = service(vec![stockx, goat.clone()]);

        let raw = service
            .search_across_sources("dunk", Some(&["stockx", "ebay"]))
            .await
            .unwrap();

        assert_eq!(raw.len(), 1);
        assert_eq!(raw["STOCKX"][0].market_price, dec!(150));
        assert_eq!(goat.name_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_search_rejects_blank_query() {
        let service = service(vec![Arc::new(MockSource::new("STOCKX", Vec::new()))]);

        assert!(matches!(
            service.search_across_sources("   ", None).await,
            Err(MarketDataError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_same_id_ignores_case_and_separators() {
        assert!(same_id("FLIGHTCLUB", "flight_club"));
        assert!(same_id("STOCKX", "StockX"));
        assert!(!same_id("GOAT", "stockx"));
    }
}
