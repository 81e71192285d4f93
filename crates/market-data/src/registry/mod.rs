//! Shared infrastructure used by every source fetcher:
//! - Per-domain rate limiting
//! - Retry with exponential backoff
//! - Quote sanity validation
//! - An injectable clock so all of the above can be tested without waiting

mod backoff;
mod clock;
mod rate_limiter;
mod validator;

pub use backoff::{BackoffPolicy, DEFAULT_MAX_ATTEMPTS};
pub use clock::{Clock, ManualClock, TokioClock};
pub use rate_limiter::{DelayRange, RateLimiter, DEFAULT_DELAY_RANGE, MAX_DELAY_SECS};
pub use validator::{QuoteValidator, ValidationSeverity, ValidatorConfig};
