//! Error types and retry classification for the market data crate.
//!
//! This module provides:
//! - [`MarketDataError`]: The main error enum for all market data operations
//! - [`RetryClass`]: Classification for determining retry behavior
//!
//! Only [`MarketDataError::InvalidInput`] ever reaches callers of the
//! [`MarketDataService`](crate::MarketDataService). Everything else is
//! retried or swallowed inside the source that produced it.

mod retry;

pub use retry::RetryClass;

use thiserror::Error;

/// Errors that can occur during market data operations.
#[derive(Error, Debug)]
pub enum MarketDataError {
    /// Connection failure or another transport-level problem.
    #[error("Network error: {source_id} - {message}")]
    Network {
        /// The source that failed
        source_id: String,
        /// Transport error description
        message: String,
    },

    /// The source answered with a non-2xx status other than 429.
    #[error("HTTP {status} from {source_id}")]
    HttpStatus {
        /// The source that answered
        source_id: String,
        /// Numeric HTTP status
        status: u16,
    },

    /// The request to the source timed out.
    #[error("Timeout: {source_id}")]
    Timeout {
        /// The source that timed out
        source_id: String,
    },

    /// The source throttled the request (HTTP 429 or equivalent).
    #[error("Rate limited: {source_id}")]
    RateLimited {
        /// The source that rate limited the request
        source_id: String,
    },

    /// The response body did not have the expected structure.
    #[error("Parse error: {source_id} - {message}")]
    Parse {
        /// The source whose payload was malformed
        source_id: String,
        /// What went wrong while decoding
        message: String,
    },

    /// A quote was returned but failed sanity checks.
    #[error("Validation failed: {message}")]
    ValidationFailed {
        /// Description of the validation failure
        message: String,
    },

    /// The caller supplied nothing to search for.
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl MarketDataError {
    /// Returns the retry classification for this error.
    ///
    /// # Examples
    ///
    /// ```
    /// use resale_market_data::errors::{MarketDataError, RetryClass};
    ///
    /// let error = MarketDataError::RateLimited { source_id: "STOCKX".to_string() };
    /// assert_eq!(error.retry_class(), RetryClass::WithBackoff);
    ///
    /// let error = MarketDataError::HttpStatus { source_id: "GOAT".to_string(), status: 404 };
    /// assert_eq!(error.retry_class(), RetryClass::Never);
    /// ```
    pub fn retry_class(&self) -> RetryClass {
        match self {
            Self::Network { .. } | Self::Timeout { .. } | Self::RateLimited { .. } => {
                RetryClass::WithBackoff
            }

            Self::HttpStatus { status, .. } if *status >= 500 => RetryClass::WithBackoff,

            Self::HttpStatus { .. }
            | Self::Parse { .. }
            | Self::ValidationFailed { .. }
            | Self::InvalidInput(_) => RetryClass::Never,
        }
    }

    /// Map a transport error from `reqwest` into the taxonomy.
    pub(crate) fn from_transport(source_id: &str, error: reqwest::Error) -> Self {
        if error.is_timeout() {
            Self::Timeout {
                source_id: source_id.to_string(),
            }
        } else if let Some(status) = error.status() {
            Self::HttpStatus {
                source_id: source_id.to_string(),
                status: status.as_u16(),
            }
        } else {
            Self::Network {
                source_id: source_id.to_string(),
                message: error.to_string(),
            }
        }
    }
}
