//! HTTP plumbing shared by the marketplace sources.
//!
//! Every request goes through [`HttpSource::get_text`], which waits on the
//! shared [`RateLimiter`] before each attempt and retries transient failures
//! with the configured [`BackoffPolicy`].

use std::sync::Arc;
use std::time::Duration;

use log::{debug, warn};
use rand::seq::SliceRandom;
use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, USER_AGENT};
use reqwest::{Client, StatusCode};
use rust_decimal::Decimal;

use crate::errors::MarketDataError;
use crate::models::MarketQuote;
use crate::registry::{BackoffPolicy, Clock, QuoteValidator, RateLimiter};

/// Per-attempt request budget.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.4 Safari/605.1.15",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:125.0) Gecko/20100101 Firefox/125.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10.15; rv:125.0) Gecko/20100101 Firefox/125.0",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36",
];

const ACCEPT_HEADER: &str = "text/html,application/xhtml+xml,application/json;q=0.9,*/*;q=0.8";

/// Rate-limited, retrying HTTP client. Cheap to clone.
#[derive(Clone)]
pub struct HttpSource {
    client: Client,
    limiter: Arc<RateLimiter>,
    clock: Arc<dyn Clock>,
    backoff: BackoffPolicy,
    validator: QuoteValidator,
}

impl HttpSource {
    pub fn new(limiter: Arc<RateLimiter>, clock: Arc<dyn Clock>, timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            limiter,
            clock,
            backoff: BackoffPolicy::default(),
            validator: QuoteValidator::new(),
        }
    }

    pub fn with_backoff(mut self, backoff: BackoffPolicy) -> Self {
        self.backoff = backoff;
        self
    }

    pub fn with_validator(mut self, validator: QuoteValidator) -> Self {
        self.validator = validator;
        self
    }

    /// GET `url` and return the body, retrying transient failures.
    pub async fn get_text(
        &self,
        source_id: &'static str,
        domain: &str,
        url: &str,
        params: &[(&str, String)],
    ) -> Result<String, MarketDataError> {
        self.backoff
            .run(self.clock.as_ref(), source_id, |attempt| {
                self.send_once(source_id, domain, url, params, attempt)
            })
            .await
    }

    async fn send_once(
        &self,
        source_id: &'static str,
        domain: &str,
        url: &str,
        params: &[(&str, String)],
        attempt: u32,
    ) -> Result<String, MarketDataError> {
        self.limiter.wait(domain).await;

        let agent = USER_AGENTS
            .choose(&mut rand::thread_rng())
            .copied()
            .unwrap_or(USER_AGENTS[0]);

        debug!("{} request (attempt {}): {}", source_id, attempt + 1, url);

        let response = self
            .client
            .get(url)
            .query(params)
            .header(USER_AGENT, agent)
            .header(ACCEPT, ACCEPT_HEADER)
            .header(ACCEPT_LANGUAGE, "en-US,en;q=0.5")
            .send()
            .await
            .map_err(|e| MarketDataError::from_transport(source_id, e))?;

        let status = response.status();

        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(MarketDataError::RateLimited {
                source_id: source_id.to_string(),
            });
        }

        if !status.is_success() {
            return Err(MarketDataError::HttpStatus {
                source_id: source_id.to_string(),
                status: status.as_u16(),
            });
        }

        response
            .text()
            .await
            .map_err(|e| MarketDataError::from_transport(source_id, e))
    }

    /// Turn a retrieval outcome into the quotes a caller may see.
    ///
    /// Errors are logged and become an empty list; quotes failing validation
    /// are dropped.
    pub fn settle(
        &self,
        source_id: &str,
        query: &str,
        result: Result<Vec<MarketQuote>, MarketDataError>,
    ) -> Vec<MarketQuote> {
        match result {
            Ok(quotes) => {
                let quotes = self.validator.retain_valid(quotes);
                debug!("{} returned {} quotes for '{}'", source_id, quotes.len(), query);
                quotes
            }
            Err(e @ MarketDataError::Parse { .. }) => {
                warn!("{} sent a malformed payload for '{}': {}", source_id, query, e);
                Vec::new()
            }
            Err(e) => {
                warn!("{} unavailable for '{}': {}", source_id, query, e);
                Vec::new()
            }
        }
    }
}

/// Convert an optional JSON float into a price, ignoring non-finite values.
pub(crate) fn decimal(value: Option<f64>) -> Option<Decimal> {
    value
        .filter(|v| v.is_finite())
        .and_then(|v| Decimal::try_from(v).ok())
}

pub(crate) fn parse_error(source_id: &str, error: impl std::fmt::Display) -> MarketDataError {
    MarketDataError::Parse {
        source_id: source_id.to_string(),
        message: error.to_string(),
    }
}
