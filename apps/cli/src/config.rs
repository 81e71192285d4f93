use std::str::FromStr;

use anyhow::{Context, Result};
use rust_decimal::Decimal;

use resale_core::{AnalyzerConfig, FeeSchedule};
use resale_market_data::{DelayRange, MarketDataConfig, SourceConfig, SourceKind, ValidatorConfig};

pub struct Config {
    pub market: MarketDataConfig,
    pub analyzer: AnalyzerConfig,
    pub log_format: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup. Unset keys take their defaults; set but
    /// malformed keys are errors.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let kinds = match var("SCOUT_SOURCES") {
            Some(list) => list
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(SourceKind::from_str)
                .collect::<std::result::Result<Vec<_>, _>>()
                .context("Invalid SCOUT_SOURCES")?,
            None => SourceKind::ALL.to_vec(),
        };

        let mut sources = Vec::with_capacity(kinds.len());
        for kind in kinds {
            let key = format!("SCOUT_RATE_LIMIT_{}", kind.id());
            let mut source = SourceConfig::new(kind);
            if let Some(text) = var(&key) {
                let range = DelayRange::parse(&text)
                    .with_context(|| format!("Invalid {}: expected MIN-MAX seconds", key))?;
                source = source.with_rate_limit(range);
            }
            sources.push(source);
        }

        let defaults = MarketDataConfig::default();
        let market = MarketDataConfig {
            sources,
            request_timeout_secs: parse_or(&var, "SCOUT_REQUEST_TIMEOUT_SECS", defaults.request_timeout_secs)?,
            deadline_secs: parse_opt(&var, "SCOUT_DEADLINE_SECS")?,
            validation: ValidatorConfig {
                max_price: parse_opt(&var, "SCOUT_MAX_PRICE")?.or(defaults.validation.max_price),
                ..defaults.validation
            },
        };

        let fee_percentage: Option<Decimal> = parse_opt(&var, "SCOUT_FEE_PERCENTAGE")?;
        let shipping_cost: Option<Decimal> = parse_opt(&var, "SCOUT_SHIPPING_COST")?;
        let fees = match (fee_percentage, shipping_cost) {
            (None, None) => None,
            (fee_percentage, shipping_cost) => {
                let schedule = FeeSchedule::default();
                Some(FeeSchedule {
                    fee_percentage: fee_percentage.unwrap_or(schedule.fee_percentage),
                    shipping_cost: shipping_cost.unwrap_or(schedule.shipping_cost),
                })
            }
        };

        let analyzer_defaults = AnalyzerConfig::default();
        let analyzer = AnalyzerConfig {
            profit_threshold: parse_or(&var, "SCOUT_PROFIT_THRESHOLD", analyzer_defaults.profit_threshold)?,
            fees,
            cache_ttl_secs: parse_or(&var, "SCOUT_CACHE_TTL_SECS", analyzer_defaults.cache_ttl_secs)?,
            concurrency: parse_or(&var, "SCOUT_CONCURRENCY", analyzer_defaults.concurrency)?,
        };

        Ok(Self {
            market,
            analyzer,
            log_format: var("SCOUT_LOG_FORMAT").unwrap_or_else(|| "text".to_string()),
        })
    }
}

fn parse_opt<T, V>(var: &V, key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    V: Fn(&str) -> Option<String>,
{
    match var(key) {
        Some(text) => text
            .parse()
            .map(Some)
            .map_err(|e| anyhow::anyhow!("Invalid {} '{}': {}", key, text, e)),
        None => Ok(None),
    }
}

fn parse_or<T, V>(var: &V, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    V: Fn(&str) -> Option<String>,
{
    Ok(parse_opt(var, key)?.unwrap_or(default))
}
