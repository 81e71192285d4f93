//! Quote data validation.
//!
//! Sanity checks applied to every quote a source produces:
//! - Non-negative prices
//! - Prices below a ceiling (catches cents/dollars mix-ups)
//! - Soft warning when a quote carries no catalog code

use log::warn;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::errors::MarketDataError;
use crate::models::MarketQuote;

/// Validation severity levels.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ValidationSeverity {
    /// Hard failure - drop the quote.
    Hard,
    /// Soft warning - keep the quote but log.
    Soft,
}

#[derive(Clone, Debug)]
struct ValidationIssue {
    severity: ValidationSeverity,
    message: String,
}

/// Quote validator configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidatorConfig {
    pub reject_negative_prices: bool,
    /// Prices above this are rejected.
    pub max_price: Option<Decimal>,
    pub warn_on_missing_code: bool,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            reject_negative_prices: true,
            max_price: Some(Decimal::from(1_000_000i64)),
            warn_on_missing_code: true,
        }
    }
}

/// Quote data validator.
#[derive(Clone, Debug, Default)]
pub struct QuoteValidator {
    config: ValidatorConfig,
}

impl QuoteValidator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: ValidatorConfig) -> Self {
        Self { config }
    }

    /// Validate a quote.
    ///
    /// Returns Ok(()) if the quote is usable. Warnings are logged but do not
    /// cause rejection.
    pub fn validate(&self, quote: &MarketQuote) -> Result<(), MarketDataError> {
        let mut issues = Vec::new();

        self.validate_prices(quote, &mut issues);

        if self.config.warn_on_missing_code && quote.catalog_code.trim().is_empty() {
            issues.push(ValidationIssue {
                severity: ValidationSeverity::Soft,
                message: "Missing catalog code".to_string(),
            });
        }

        let errors: Vec<_> = issues
            .iter()
            .filter(|i| i.severity == ValidationSeverity::Hard)
            .map(|i| i.message.as_str())
            .collect();

        if !errors.is_empty() {
            return Err(MarketDataError::ValidationFailed {
                message: errors.join("; "),
            });
        }

        for issue in issues.iter().filter(|i| i.severity == ValidationSeverity::Soft) {
            warn!(
                "Quote validation warning for '{}' from {}: {}",
                quote.display_name, quote.source_name, issue.message
            );
        }

        Ok(())
    }

    /// Keep the quotes that pass, logging the ones that don't.
    pub fn retain_valid(&self, quotes: Vec<MarketQuote>) -> Vec<MarketQuote> {
        quotes
            .into_iter()
            .filter(|quote| match self.validate(quote) {
                Ok(()) => true,
                Err(e) => {
                    warn!(
                        "Dropping quote '{}' from {}: {}",
                        quote.display_name, quote.source_name, e
                    );
                    false
                }
            })
            .collect()
    }

    fn validate_prices(&self, quote: &MarketQuote, issues: &mut Vec<ValidationIssue>) {
        let prices = [
            ("market", Some(quote.market_price)),
            ("retail", quote.retail_price),
            ("last sale", quote.last_sale),
            ("highest bid", quote.highest_bid),
        ];

        for (label, price) in prices {
            let Some(price) = price else { continue };

            if self.config.reject_negative_prices && price < Decimal::ZERO {
                issues.push(ValidationIssue {
                    severity: ValidationSeverity::Hard,
                    message: format!("Negative {} price: {}", label, price),
                });
            }

            if let Some(max_price) = self.config.max_price {
                if price > max_price {
                    issues.push(ValidationIssue {
                        severity: ValidationSeverity::Hard,
                        message: format!(
                            "{} price ({}) exceeds max threshold ({})",
                            label, price, max_price
                        ),
                    });
                }
            }
        }
    }
}
