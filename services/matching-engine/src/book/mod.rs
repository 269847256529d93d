//! Order book infrastructure module
//!
//! Contains price levels, bid/ask books, and the per-market four-queue
//! book (YES-bids, YES-asks, NO-bids, NO-asks).

pub mod ask_book;
pub mod bid_book;
pub mod market_book;
pub mod price_level;

pub use ask_book::AskBook;
pub use bid_book::BidBook;
pub use market_book::MarketBook;
pub use price_level::PriceLevel;

use types::ids::{OrderId, UserId};
use types::numeric::{Price, Quantity};

/// A resting order selected as a match candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BookMatch {
    pub price: Price,
    pub order_id: OrderId,
    pub user_id: UserId,
    pub remaining: Quantity,
}
