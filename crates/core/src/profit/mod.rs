//! Profit arithmetic for reselling retail listings at market price.

mod evaluator;
mod listing;

pub use evaluator::{
    FeeSchedule, NetProfit, ProfitEvaluator, ProfitResult, ProfitStatus, DEFAULT_PROFIT_THRESHOLD,
};
pub use listing::RetailListing;
pub use resale_market_data::parse_price;
