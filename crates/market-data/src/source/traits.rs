//! Source fetcher trait definition.

use async_trait::async_trait;

use crate::matcher::CatalogMatcher;
use crate::models::MarketQuote;

/// One marketplace that can be searched for quotes.
///
/// Implementations own their retry and degradation: neither method ever
/// fails. A source that is down, throttling or returning garbage answers
/// with an empty result, so one outage never hides another source's quote.
///
/// # Example
///
/// ```ignore
/// use async_trait::async_trait;
/// use resale_market_data::{MarketQuote, SourceFetcher};
///
/// struct MySource;
///
/// #[async_trait]
/// impl SourceFetcher for MySource {
///     fn id(&self) -> &'static str {
///         "MY_SOURCE"
///     }
///
///     fn domain(&self) -> &'static str {
///         "mysource.com"
///     }
///
///     async fn search_by_name(&self, query: &str) -> Vec<MarketQuote> {
///         // rate limit, fetch, parse ...
///     }
/// }
/// ```
#[async_trait]
pub trait SourceFetcher: Send + Sync {
    /// Constant identifier such as "STOCKX". Used in logs and as the
    /// quote's `source_name`.
    fn id(&self) -> &'static str;

    /// Marketplace domain used as the rate limiting key.
    fn domain(&self) -> &'static str;

    /// Search the marketplace by free text, best candidates first.
    async fn search_by_name(&self, query: &str) -> Vec<MarketQuote>;

    /// Look up a single item by catalog code.
    ///
    /// The default runs a name search over the code and keeps the candidate
    /// whose code matches exactly after normalization, else the first
    /// candidate. Sources with a real code lookup override this.
    async fn search_by_code(&self, code: &str) -> Option<MarketQuote> {
        let candidates = self.search_by_name(code).await;
        best_code_match(code, candidates)
    }
}

/// Pick the candidate whose catalog code equals `code` after normalization,
/// falling back to the first candidate.
pub fn best_code_match(code: &str, mut candidates: Vec<MarketQuote>) -> Option<MarketQuote> {
    match candidates
        .iter()
        .position(|q| CatalogMatcher::same_code(&q.catalog_code, code))
    {
        Some(index) => Some(candidates.swap_remove(index)),
        None => candidates.into_iter().next(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct NameOnlySource {
        results: Vec<MarketQuote>,
        queries: AtomicUsize,
    }

    #[async_trait]
    impl SourceFetcher for NameOnlySource {
        fn id(&self) -> &'static str {
            "NAME_ONLY"
        }

        fn domain(&self) -> &'static str {
            "nameonly.com"
        }

        async fn search_by_name(&self, _query: &str) -> Vec<MarketQuote> {
            self.queries.fetch_add(1, Ordering::SeqCst);
            self.results.clone()
        }
    }

    fn quote(name: &str, code: &str) -> MarketQuote {
        MarketQuote::new("NAME_ONLY", name, dec!(100)).with_catalog_code(code)
    }

    #[tokio::test]
    async fn test_code_search_prefers_exact_match() {
        let source = NameOnlySource {
            results: vec![quote("Panda GS", "DD1391-100GS"), quote("Panda", "dd1391 100")],
            queries: AtomicUsize::new(0),
        };

        let found = source.search_by_code("DD1391-100").await.unwrap();

        assert_eq!(found.display_name, "Panda");
        assert_eq!(source.queries.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_code_search_falls_back_to_first() {
        let source = NameOnlySource {
            results: vec![quote("First", "AAA"), quote("Second", "BBB")],
            queries: AtomicUsize::new(0),
        };

        let found = source.search_by_code("DD1391-100").await.unwrap();

        assert_eq!(found.display_name, "First");
    }

    #[tokio::test]
    async fn test_code_search_with_no_results() {
        let source = NameOnlySource {
            results: Vec::new(),
            queries: AtomicUsize::new(0),
        };

        assert!(source.search_by_code("DD1391-100").await.is_none());
    }
}
