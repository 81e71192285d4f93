use log::warn;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use resale_market_data::ConsolidatedQuote;

use super::listing::RetailListing;

/// Threshold most callers use, in percent.
pub const DEFAULT_PROFIT_THRESHOLD: Decimal = Decimal::from_parts(20, 0, 0, false, 0);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProfitStatus {
    Profitable,
    /// Positive profit below the threshold.
    BreakEven,
    Loss,
    /// No market price or no retail price to compare.
    Unknown,
}

impl ProfitStatus {
    fn classify(amount: Decimal, is_profitable: bool) -> Self {
        if is_profitable {
            ProfitStatus::Profitable
        } else if amount > Decimal::ZERO {
            ProfitStatus::BreakEven
        } else {
            ProfitStatus::Loss
        }
    }
}

/// Gross margin of reselling a listing at market price.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfitResult {
    pub profit_amount: Decimal,
    pub profit_percentage: Decimal,
    pub is_profitable: bool,
    pub status: ProfitStatus,
}

/// `amount` as a percentage of `base`, `None` when it does not fit a `Decimal`.
fn percentage_of(amount: Decimal, base: Decimal) -> Option<Decimal> {
    amount.checked_div(base)?.checked_mul(Decimal::ONE_HUNDRED)
}

impl ProfitResult {
    fn unknown() -> Self {
        Self {
            profit_amount: Decimal::ZERO,
            profit_percentage: Decimal::ZERO,
            is_profitable: false,
            status: ProfitStatus::Unknown,
        }
    }
}

/// Marketplace seller fees and the cost of shipping to the buyer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeeSchedule {
    /// Percent of the sale price kept by the marketplace.
    pub fee_percentage: Decimal,
    pub shipping_cost: Decimal,
}

impl Default for FeeSchedule {
    fn default() -> Self {
        Self {
            fee_percentage: Decimal::from(12),
            shipping_cost: Decimal::from(15),
        }
    }
}

/// Margin after marketplace fees and shipping.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetProfit {
    pub fees: Decimal,
    pub shipping: Decimal,
    pub net_profit: Decimal,
    pub net_percentage: Decimal,
    pub is_profitable: bool,
    pub status: ProfitStatus,
}

/// Pure profit arithmetic. Never divides by zero.
pub struct ProfitEvaluator;

impl ProfitEvaluator {
    /// Evaluate a listing against a consolidated market quote.
    ///
    /// `threshold` is a percentage; a listing is profitable when its margin
    /// over the retail price reaches it.
    ///
    /// ```
    /// use resale_core::profit::{ProfitEvaluator, ProfitStatus};
    /// use rust_decimal::Decimal;
    ///
    /// let result = ProfitEvaluator::evaluate_prices(
    ///     Decimal::from(100),
    ///     Decimal::from(150),
    ///     Decimal::from(20),
    /// );
    /// assert_eq!(result.profit_percentage, Decimal::from(50));
    /// assert_eq!(result.status, ProfitStatus::Profitable);
    /// ```
    pub fn evaluate(
        listing: &RetailListing,
        quote: &ConsolidatedQuote,
        threshold: Decimal,
    ) -> ProfitResult {
        Self::evaluate_prices(listing.current_price, quote.market_price, threshold)
    }

    pub fn evaluate_prices(
        current_price: Decimal,
        market_price: Decimal,
        threshold: Decimal,
    ) -> ProfitResult {
        if current_price <= Decimal::ZERO || market_price <= Decimal::ZERO {
            return ProfitResult::unknown();
        }

        let profit_amount = market_price - current_price;
        let Some(profit_percentage) = percentage_of(profit_amount, current_price) else {
            warn!(
                "Profit of {} on {} is out of range, reporting unknown",
                profit_amount, current_price
            );
            return ProfitResult::unknown();
        };
        let is_profitable = profit_percentage >= threshold;

        ProfitResult {
            profit_amount,
            profit_percentage,
            is_profitable,
            status: ProfitStatus::classify(profit_amount, is_profitable),
        }
    }

    /// Evaluate after deducting marketplace fees and shipping.
    ///
    /// Amounts are rounded to cents and the percentage to two places.
    pub fn evaluate_net(
        listing: &RetailListing,
        quote: &ConsolidatedQuote,
        threshold: Decimal,
        schedule: &FeeSchedule,
    ) -> NetProfit {
        let current_price = listing.current_price;
        let market_price = quote.market_price;

        let unknown = NetProfit {
            fees: Decimal::ZERO,
            shipping: Decimal::ZERO,
            net_profit: Decimal::ZERO,
            net_percentage: Decimal::ZERO,
            is_profitable: false,
            status: ProfitStatus::Unknown,
        };
        if current_price <= Decimal::ZERO || market_price <= Decimal::ZERO {
            return unknown;
        }

        let net = market_price
            .checked_mul(schedule.fee_percentage)
            .and_then(|v| v.checked_div(Decimal::ONE_HUNDRED))
            .and_then(|fees| {
                let net_profit = market_price
                    .checked_sub(current_price)?
                    .checked_sub(fees)?
                    .checked_sub(schedule.shipping_cost)?;
                Some((fees, net_profit, percentage_of(net_profit, current_price)?))
            });
        let Some((fees, net_profit, net_percentage)) = net else {
            warn!(
                "Net profit on {} at market {} is out of range, reporting unknown",
                current_price, market_price
            );
            return unknown;
        };
        let is_profitable = net_percentage >= threshold;

        NetProfit {
            fees: fees.round_dp(2),
            shipping: schedule.shipping_cost,
            net_profit: net_profit.round_dp(2),
            net_percentage: net_percentage.round_dp(2),
            is_profitable,
            status: ProfitStatus::classify(net_profit, is_profitable),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn quote(price: Decimal) -> ConsolidatedQuote {
        let market = resale_market_data::MarketQuote::new("STOCKX", "Dunk Low", price);
        ConsolidatedQuote::from_quotes(&[market], None).unwrap()
    }

    #[test]
    fn test_profitable_at_threshold() {
        let result = ProfitEvaluator::evaluate_prices(dec!(100), dec!(120), dec!(20));

        assert_eq!(result.profit_amount, dec!(20));
        assert_eq!(result.profit_percentage, dec!(20));
        assert!(result.is_profitable);
        assert_eq!(result.status, ProfitStatus::Profitable);
    }

    #[test]
    fn test_positive_below_threshold_is_break_even() {
        let result = ProfitEvaluator::evaluate_prices(dec!(100), dec!(110), dec!(20));

        assert_eq!(result.profit_amount, dec!(10));
        assert_eq!(result.profit_percentage, dec!(10));
        assert!(!result.is_profitable);
        assert_eq!(result.status, ProfitStatus::BreakEven);
    }

    #[test]
    fn test_loss() {
        let result = ProfitEvaluator::evaluate_prices(dec!(200), dec!(150), dec!(20));

        assert_eq!(result.profit_amount, dec!(-50));
        assert_eq!(result.profit_percentage, dec!(-25));
        assert_eq!(result.status, ProfitStatus::Loss);
    }

    #[test]
    fn test_zero_prices_yield_unknown() {
        for (current, market) in [(dec!(0), dec!(150)), (dec!(100), dec!(0)), (dec!(-1), dec!(150))] {
            let result = ProfitEvaluator::evaluate_prices(current, market, dec!(20));
            assert_eq!(result.profit_amount, Decimal::ZERO);
            assert_eq!(result.profit_percentage, Decimal::ZERO);
            assert!(!result.is_profitable);
            assert_eq!(result.status, ProfitStatus::Unknown);
        }
    }

    #[test]
    fn test_out_of_range_percentage_is_unknown() {
        let tiny = Decimal::new(1, 22);

        let result = ProfitEvaluator::evaluate_prices(tiny, dec!(1000000), dec!(20));

        assert_eq!(result.status, ProfitStatus::Unknown);
        assert!(!result.is_profitable);
        assert_eq!(result.profit_percentage, Decimal::ZERO);
    }

    #[test]
    fn test_net_out_of_range_is_unknown() {
        let listing = RetailListing::new("Dunk Low", Decimal::new(1, 22));

        let net = ProfitEvaluator::evaluate_net(
            &listing,
            &quote(dec!(1000000)),
            dec!(20),
            &FeeSchedule::default(),
        );

        assert_eq!(net.status, ProfitStatus::Unknown);
        assert!(!net.is_profitable);

        let huge_fees = FeeSchedule {
            fee_percentage: Decimal::MAX,
            shipping_cost: dec!(15),
        };
        let net = ProfitEvaluator::evaluate_net(
            &RetailListing::new("Dunk Low", dec!(100)),
            &quote(dec!(200)),
            dec!(20),
            &huge_fees,
        );

        assert_eq!(net.status, ProfitStatus::Unknown);
    }

    #[test]
    fn test_evaluate_uses_consolidated_price() {
        let listing = RetailListing::new("Dunk Low", dec!(110));

        let result = ProfitEvaluator::evaluate(&listing, &quote(dec!(155)), dec!(20));

        assert_eq!(result.profit_amount, dec!(45));
        assert!(result.is_profitable);
    }

    #[test]
    fn test_net_deducts_fees_and_shipping() {
        let listing = RetailListing::new("Dunk Low", dec!(100));

        let net = ProfitEvaluator::evaluate_net(
            &listing,
            &quote(dec!(200)),
            dec!(20),
            &FeeSchedule::default(),
        );

        assert_eq!(net.fees, dec!(24));
        assert_eq!(net.shipping, dec!(15));
        assert_eq!(net.net_profit, dec!(61));
        assert_eq!(net.net_percentage, dec!(61));
        assert!(net.is_profitable);
    }

    #[test]
    fn test_net_rounds_to_two_places() {
        let listing = RetailListing::new("Dunk Low", dec!(90));

        let net = ProfitEvaluator::evaluate_net(
            &listing,
            &quote(dec!(133.33)),
            dec!(20),
            &FeeSchedule::default(),
        );

        assert_eq!(net.fees, dec!(16.00));
        assert_eq!(net.net_profit, dec!(12.33));
        assert_eq!(net.net_percentage, dec!(13.70));
        assert_eq!(net.status, ProfitStatus::BreakEven);
    }

    #[test]
    fn test_net_with_zero_market_is_unknown() {
        let listing = RetailListing::new("Dunk Low", dec!(100));

        let net = ProfitEvaluator::evaluate_net(
            &listing,
            &quote(Decimal::ZERO),
            dec!(20),
            &FeeSchedule::default(),
        );

        assert_eq!(net.status, ProfitStatus::Unknown);
        assert_eq!(net.net_profit, Decimal::ZERO);
    }
}
