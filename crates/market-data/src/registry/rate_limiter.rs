//! Per-domain request spacing for marketplace sources.
//!
//! Every outbound call waits until a randomly drawn delay from the domain's
//! `[min, max]` range has passed since the previous call to the same domain.
//! Domains are collapsed to their registrable label (`www.stockx.com` and
//! `stockx.com/api` both map to `stockx`) so every endpoint of one marketplace
//! shares a single throttle.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use log::{debug, warn};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tokio::time::Instant;

use super::clock::{Clock, TokioClock};

/// Delay range used for domains without a built-in or configured range.
pub const DEFAULT_DELAY_RANGE: DelayRange = DelayRange::new(1.0, 3.0);

/// Longest spacing any range may ask for, in seconds.
pub const MAX_DELAY_SECS: f64 = 3600.0;

/// Built-in ranges. A key applies when it is contained in the normalized domain.
const SITE_DELAYS: &[(&str, DelayRange)] = &[
    ("footlocker", DelayRange::new(2.0, 4.0)),
    ("nike", DelayRange::new(3.0, 5.0)),
    ("adidas", DelayRange::new(2.0, 4.0)),
    ("finishline", DelayRange::new(1.5, 3.0)),
    ("jdsports", DelayRange::new(1.5, 3.0)),
    ("stockx", DelayRange::new(2.0, 4.0)),
    ("goat", DelayRange::new(2.0, 4.0)),
    ("flightclub", DelayRange::new(1.0, 2.0)),
];

/// Minimum and maximum spacing between calls, in seconds.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct DelayRange {
    pub min_secs: f64,
    pub max_secs: f64,
}

impl DelayRange {
    pub const fn new(min_secs: f64, max_secs: f64) -> Self {
        Self { min_secs, max_secs }
    }

    /// Parse `"2-4"` or `"2.5"` (a fixed delay).
    ///
    /// Bounds must lie within `0..=MAX_DELAY_SECS` and be in order.
    pub fn parse(text: &str) -> Option<Self> {
        let mut parts = text.splitn(2, '-');
        let min: f64 = parts.next()?.trim().parse().ok()?;
        let max: f64 = match parts.next() {
            Some(max) => max.trim().parse().ok()?,
            None => min,
        };
        let in_bounds = |v: f64| (0.0..=MAX_DELAY_SECS).contains(&v);
        if !in_bounds(min) || !in_bounds(max) || min > max {
            return None;
        }
        Some(Self::new(min, max))
    }

    /// Negative or non-finite bounds become zero, bounds above
    /// `MAX_DELAY_SECS` are capped, and an inverted range collapses to its
    /// lower bound.
    fn clamped(self) -> (f64, f64) {
        let clean = |v: f64| {
            if v.is_finite() && v > 0.0 {
                v.min(MAX_DELAY_SECS)
            } else {
                0.0
            }
        };
        let min = clean(self.min_secs);
        let max = clean(self.max_secs).max(min);
        (min, max)
    }

    pub fn min_delay(&self) -> Duration {
        Duration::from_secs_f64(self.clamped().0)
    }

    /// Draw a delay uniformly from the range.
    pub fn sample(&self) -> Duration {
        let (min, max) = self.clamped();
        if max <= min {
            return Duration::from_secs_f64(min);
        }
        Duration::from_secs_f64(rand::thread_rng().gen_range(min..=max))
    }
}

impl Default for DelayRange {
    fn default() -> Self {
        DEFAULT_DELAY_RANGE
    }
}

/// Domain-keyed rate limiter shared by all sources.
///
/// Construct one per process and hand it to every source fetcher.
pub struct RateLimiter {
    /// Time at which the most recent call to each domain was released.
    last_calls: Mutex<HashMap<String, Instant>>,
    /// Per-domain range overrides.
    overrides: Mutex<HashMap<String, DelayRange>>,
    clock: Arc<dyn Clock>,
}

impl RateLimiter {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            last_calls: Mutex::new(HashMap::new()),
            overrides: Mutex::new(HashMap::new()),
            clock,
        }
    }

    /// Lock the timestamp map, recovering from poison if necessary.
    ///
    /// The worst case after recovery is one slightly early request.
    fn lock_last_calls(&self) -> MutexGuard<'_, HashMap<String, Instant>> {
        self.last_calls.lock().unwrap_or_else(|poisoned| {
            warn!("Rate limiter timestamps mutex was poisoned, recovering");
            poisoned.into_inner()
        })
    }

    fn lock_overrides(&self) -> MutexGuard<'_, HashMap<String, DelayRange>> {
        self.overrides.lock().unwrap_or_else(|poisoned| {
            warn!("Rate limiter overrides mutex was poisoned, recovering");
            poisoned.into_inner()
        })
    }

    /// Install a delay range for a domain, replacing the built-in one.
    pub fn configure(&self, domain: &str, range: DelayRange) {
        let key = Self::normalize_domain(domain);
        debug!(
            "Rate limiter: '{}' configured to {:.2}-{:.2}s",
            key, range.min_secs, range.max_secs
        );
        self.lock_overrides().insert(key, range);
    }

    /// The range that applies to a domain.
    pub fn delay_range(&self, domain: &str) -> DelayRange {
        let key = Self::normalize_domain(domain);

        if let Some(range) = self.lock_overrides().get(&key) {
            return *range;
        }

        SITE_DELAYS
            .iter()
            .find(|(site, _)| key.contains(site))
            .map(|(_, range)| *range)
            .unwrap_or(DEFAULT_DELAY_RANGE)
    }

    /// Wait until the domain may be called again.
    ///
    /// The release time is reserved under the lock before sleeping, so
    /// concurrent waiters on one domain queue up one delay apart. The first
    /// call to a domain never waits.
    pub async fn wait(&self, domain: &str) {
        let key = Self::normalize_domain(domain);
        let delay = self.delay_range(&key).sample();

        let wait = {
            let mut last_calls = self.lock_last_calls();
            let now = self.clock.now();

            let release = match last_calls.get(&key) {
                Some(previous) => (*previous + delay).max(now),
                None => now,
            };
            last_calls.insert(key.clone(), release);

            release.saturating_duration_since(now)
        };

        if wait > Duration::ZERO {
            debug!("Rate limiter: waiting {:?} before calling '{}'", wait, key);
            self.clock.sleep(wait).await;
        }
    }

    /// Reduce a URL or host name to its throttle key.
    ///
    /// ```
    /// use resale_market_data::RateLimiter;
    ///
    /// assert_eq!(RateLimiter::normalize_domain("https://www.nike.com/launch"), "nike");
    /// assert_eq!(RateLimiter::normalize_domain("stockx.com"), "stockx");
    /// ```
    pub fn normalize_domain(input: &str) -> String {
        let without_scheme = match input.split_once("//") {
            Some((_, rest)) => rest,
            None => input,
        };
        let host = without_scheme.split('/').next().unwrap_or_default();
        let host = host.split(':').next().unwrap_or_default();

        let labels: Vec<&str> = host.split('.').filter(|l| !l.is_empty()).collect();
        let key = match labels.len() {
            0 => "",
            1 | 2 => labels[0],
            n => labels[n - 2],
        };

        key.trim().to_lowercase()
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(Arc::new(TokioClock))
    }
}
