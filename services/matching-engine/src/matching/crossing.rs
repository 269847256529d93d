//! Crossing detection logic
//!
//! Determines when an incoming order can match a resting order, for all
//! three match types. A NO contract at price p is economically the YES
//! contract at `100 - p`; the mint and merge predicates follow from that
//! equivalence.

use types::numeric::Price;
use types::order::Side;

/// Direct match within one contract's book: a buy crosses a resting ask at
/// or below its limit; a sell crosses a resting bid at or above its limit.
/// Market orders (no limit) cross any resting price.
pub fn direct_crosses(incoming_side: Side, incoming_limit: Option<Price>, resting: Price) -> bool {
    match (incoming_side, incoming_limit) {
        (_, None) => true,
        (Side::Buy, Some(limit)) => limit >= resting,
        (Side::Sell, Some(limit)) => limit <= resting,
    }
}

/// Mint match across the two buy books: the two bids jointly pay for a
/// complete set when their prices sum to at least $1.00.
pub fn mint_crosses(incoming: Price, resting: Price) -> bool {
    incoming.get() + resting.get() >= 100
}

/// Merge match across the two sell books: the two asks jointly sell a
/// complete set back when their prices sum to at most $1.00.
pub fn merge_crosses(incoming: Price, resting: Price) -> bool {
    incoming.get() + resting.get() <= 100
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direct_buy_crossing() {
        assert!(direct_crosses(
            Side::Buy,
            Some(Price::new(60)),
            Price::new(55)
        ));
        assert!(direct_crosses(
            Side::Buy,
            Some(Price::new(60)),
            Price::new(60)
        ));
        assert!(!direct_crosses(
            Side::Buy,
            Some(Price::new(60)),
            Price::new(61)
        ));
    }

    #[test]
    fn test_direct_sell_crossing() {
        assert!(direct_crosses(
            Side::Sell,
            Some(Price::new(55)),
            Price::new(60)
        ));
        assert!(!direct_crosses(
            Side::Sell,
            Some(Price::new(61)),
            Price::new(60)
        ));
    }

    #[test]
    fn test_market_orders_cross_any_price() {
        assert!(direct_crosses(Side::Buy, None, Price::new(99)));
        assert!(direct_crosses(Side::Sell, None, Price::new(1)));
    }

    #[test]
    fn test_mint_requires_sum_at_least_100() {
        assert!(mint_crosses(Price::new(60), Price::new(40)));
        assert!(mint_crosses(Price::new(70), Price::new(35)));
        assert!(!mint_crosses(Price::new(40), Price::new(40)));
    }

    #[test]
    fn test_merge_requires_sum_at_most_100() {
        assert!(merge_crosses(Price::new(55), Price::new(45)));
        assert!(merge_crosses(Price::new(60), Price::new(30)));
        assert!(!merge_crosses(Price::new(60), Price::new(60)));
    }
}
