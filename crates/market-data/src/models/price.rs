use std::str::FromStr;

use rust_decimal::Decimal;

/// Parse a human-formatted price such as `"$1,200.00"` or `"USD 95"`.
///
/// Everything except digits and the decimal point is dropped before
/// parsing. Returns `None` when nothing numeric is left.
pub fn parse_price(text: &str) -> Option<Decimal> {
    let cleaned: String = text
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();

    if cleaned.is_empty() {
        return None;
    }

    Decimal::from_str(&cleaned).ok()
}

/// Convert an integer amount of cents into a decimal price.
pub fn from_cents(cents: i64) -> Decimal {
    Decimal::new(cents, 2)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_parse_price_strips_symbols() {
        assert_eq!(parse_price("$1,200.00"), Some(dec!(1200.00)));
        assert_eq!(parse_price("USD 95"), Some(dec!(95)));
        assert_eq!(parse_price("  $110 "), Some(dec!(110)));
    }

    #[test]
    fn test_parse_price_rejects_non_numeric() {
        assert_eq!(parse_price("Sold out"), None);
        assert_eq!(parse_price(""), None);
        assert_eq!(parse_price("1.2.3"), None);
    }

    #[test]
    fn test_from_cents() {
        assert_eq!(from_cents(18_500), dec!(185.00));
        assert_eq!(from_cents(0), Decimal::ZERO);
    }
}
