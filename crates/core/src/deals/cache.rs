use std::time::Duration;

use dashmap::DashMap;
use log::debug;
use tokio::time::Instant;

use resale_market_data::{CatalogMatcher, ConsolidatedQuote};

const TITLE_PREFIX: &str = "title:";

#[derive(Clone, Debug)]
struct CachedQuote {
    quote: ConsolidatedQuote,
    stored_at: Instant,
}

/// In-memory consolidated quotes with a fixed time to live.
///
/// Keys are normalized catalog codes, or `title:<lowercased title>` for
/// quotes found by name. Only quotes with a market price are stored.
#[derive(Debug)]
pub struct QuoteCache {
    entries: DashMap<String, CachedQuote>,
    ttl: Duration,
}

impl QuoteCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
        }
    }

    pub fn code_key(code: &str) -> String {
        CatalogMatcher::normalize(code)
    }

    pub fn title_key(title: &str) -> String {
        format!("{}{}", TITLE_PREFIX, title.trim().to_lowercase())
    }

    /// Fresh entry under exactly `key`. Expired entries are evicted.
    pub fn get(&self, key: &str) -> Option<ConsolidatedQuote> {
        let (quote, stored_at) = self
            .entries
            .get(key)
            .map(|entry| (entry.quote.clone(), entry.stored_at))?;

        if stored_at.elapsed() > self.ttl {
            debug!("Cache entry '{}' expired", key);
            self.entries.remove(key);
            return None;
        }
        Some(quote)
    }

    /// Entry for a catalog code, tolerating formatting drift between the
    /// cached code and the requested one.
    pub fn get_by_code(&self, code: &str) -> Option<ConsolidatedQuote> {
        let key = Self::code_key(code);
        if key.is_empty() {
            return None;
        }
        if let Some(quote) = self.get(&key) {
            return Some(quote);
        }

        self.prune_expired();
        let mut codes: Vec<String> = self
            .entries
            .iter()
            .map(|entry| entry.key().clone())
            .filter(|k| !k.starts_with(TITLE_PREFIX))
            .collect();
        codes.sort();

        let similar = CatalogMatcher::find_similar(&key, &codes)?;
        debug!("Cache hit for '{}' via similar code '{}'", code, similar);
        self.get(similar)
    }

    /// Store a quote. Quotes without a market price are ignored. Expired
    /// entries are dropped on every insert.
    pub fn insert(&self, key: String, quote: ConsolidatedQuote) -> bool {
        if key.is_empty() || key == TITLE_PREFIX || !quote.has_price() {
            return false;
        }
        self.prune_expired();
        self.entries.insert(
            key,
            CachedQuote {
                quote,
                stored_at: Instant::now(),
            },
        );
        true
    }

    /// Remove every expired entry.
    pub fn prune_expired(&self) {
        let before = self.entries.len();
        self.entries
            .retain(|_, entry| entry.stored_at.elapsed() <= self.ttl);
        let removed = before.saturating_sub(self.entries.len());
        if removed > 0 {
            debug!("Pruned {} expired cache entries", removed);
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&self) {
        self.entries.clear();
    }
}
