//! Source selection and request budgets.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::errors::MarketDataError;
use crate::registry::{DelayRange, ValidatorConfig};

/// The marketplaces this crate knows how to query.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    StockX,
    Goat,
    FlightClub,
}

impl SourceKind {
    pub const ALL: [SourceKind; 3] = [SourceKind::StockX, SourceKind::Goat, SourceKind::FlightClub];

    /// Identifier used as `source_name` on quotes.
    pub fn id(&self) -> &'static str {
        match self {
            SourceKind::StockX => "STOCKX",
            SourceKind::Goat => "GOAT",
            SourceKind::FlightClub => "FLIGHTCLUB",
        }
    }

    pub fn domain(&self) -> &'static str {
        match self {
            SourceKind::StockX => "stockx.com",
            SourceKind::Goat => "goat.com",
            SourceKind::FlightClub => "flightclub.com",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SourceKind::StockX => "stockx",
            SourceKind::Goat => "goat",
            SourceKind::FlightClub => "flightclub",
        };
        f.write_str(name)
    }
}

impl FromStr for SourceKind {
    type Err = MarketDataError;

    /// Case-insensitive; separators are ignored (`flight_club`, `Flight Club`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key: String = s
            .chars()
            .filter(|c| !matches!(c, '-' | '_' | ' '))
            .collect::<String>()
            .to_lowercase();

        match key.as_str() {
            "stockx" => Ok(SourceKind::StockX),
            "goat" => Ok(SourceKind::Goat),
            "flightclub" => Ok(SourceKind::FlightClub),
            _ => Err(MarketDataError::InvalidInput(format!(
                "Unknown source '{}'",
                s.trim()
            ))),
        }
    }
}

/// One configured marketplace.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SourceConfig {
    pub kind: SourceKind,
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
    /// Replaces the built-in delay range for this source's domain.
    #[serde(default)]
    pub rate_limit: Option<DelayRange>,
}

fn enabled_by_default() -> bool {
    true
}

impl SourceConfig {
    pub fn new(kind: SourceKind) -> Self {
        Self {
            kind,
            enabled: true,
            rate_limit: None,
        }
    }

    pub fn with_rate_limit(mut self, range: DelayRange) -> Self {
        self.rate_limit = Some(range);
        self
    }
}

/// Which sources run, in which order, and how long they may take.
///
/// Source order matters: it is the tie-break when two sources return
/// equally complete quotes.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MarketDataConfig {
    #[serde(default = "default_sources")]
    pub sources: Vec<SourceConfig>,
    /// Per-attempt HTTP timeout.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Overall budget for one consolidated lookup. `None` waits for every
    /// source to finish.
    #[serde(default)]
    pub deadline_secs: Option<u64>,
    /// Sanity checks applied to every quote before it is returned.
    #[serde(default)]
    pub validation: ValidatorConfig,
}

fn default_sources() -> Vec<SourceConfig> {
    SourceKind::ALL.into_iter().map(SourceConfig::new).collect()
}

fn default_request_timeout_secs() -> u64 {
    30
}

impl Default for MarketDataConfig {
    fn default() -> Self {
        Self {
            sources: default_sources(),
            request_timeout_secs: default_request_timeout_secs(),
            deadline_secs: None,
            validation: ValidatorConfig::default(),
        }
    }
}

impl MarketDataConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }

    pub fn deadline(&self) -> Option<Duration> {
        self.deadline_secs.map(Duration::from_secs)
    }

    /// Enabled sources in configured order.
    pub fn enabled_sources(&self) -> impl Iterator<Item = &SourceConfig> {
        self.sources.iter().filter(|s| s.enabled)
    }
}
