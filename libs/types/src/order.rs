//! Order lifecycle types
//!
//! An order buys or sells YES or NO contracts in a single market. Limit
//! orders may rest in the book; market orders never rest.

use crate::ids::{MarketId, OrderId, UserId};
use crate::numeric::{Price, Quantity};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Order side (buyer or seller)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    pub fn opposite(&self) -> Self {
        match self {
            Side::Buy => Side::Sell,
            Side::Sell => Side::Buy,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Buy => write!(f, "BUY"),
            Side::Sell => write!(f, "SELL"),
        }
    }
}

/// Which of the two binary contracts an order trades.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Contract {
    Yes,
    No,
}

impl Contract {
    pub fn opposite(&self) -> Self {
        match self {
            Contract::Yes => Contract::No,
            Contract::No => Contract::Yes,
        }
    }
}

impl fmt::Display for Contract {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Contract::Yes => write!(f, "YES"),
            Contract::No => write!(f, "NO"),
        }
    }
}

/// Order pricing behaviour.
///
/// Limit orders carry an explicit price and may rest; market orders execute
/// against the best available prices and never rest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "price", rename_all = "UPPERCASE")]
pub enum OrderKind {
    Limit(Price),
    Market,
}

/// Order status.
///
/// `Filled` and `Cancelled` are terminal; no transitions leave them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    Open,
    PartiallyFilled,
    Filled,
    Cancelled,
}

impl OrderStatus {
    /// Check if status is terminal (no further transitions possible)
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Filled | OrderStatus::Cancelled)
    }

    /// Check if the order can still rest in the book or be matched.
    pub fn is_active(&self) -> bool {
        matches!(self, OrderStatus::Open | OrderStatus::PartiallyFilled)
    }
}

/// The ceiling price used to reserve funds for market buy orders.
///
/// A market buy can never execute above the maximum valid price, so the
/// reservation at 99c per contract is always sufficient; the unused portion
/// is released after matching.
pub const MARKET_BUY_CEILING: Price = Price::MAX;

/// Complete order structure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub order_id: OrderId,
    pub user_id: UserId,
    pub market_id: MarketId,
    pub side: Side,
    pub contract: Contract,
    pub kind: OrderKind,
    pub quantity: Quantity,
    pub filled_quantity: Quantity,
    pub status: OrderStatus,
    /// Unix nanos at acceptance.
    pub created_at: i64,
    /// Monotonic sequence assigned by the matcher; authoritative time
    /// tiebreaker for price-time priority.
    pub book_seq: u64,
    /// Optimistic-locking version counter.
    pub version: u64,
}

impl Order {
    /// Create a new open order with no fills.
    pub fn new(
        user_id: UserId,
        market_id: MarketId,
        side: Side,
        contract: Contract,
        kind: OrderKind,
        quantity: Quantity,
        timestamp: i64,
    ) -> Self {
        Self {
            order_id: OrderId::new(),
            user_id,
            market_id,
            side,
            contract,
            kind,
            quantity,
            filled_quantity: Quantity::zero(),
            status: OrderStatus::Open,
            created_at: timestamp,
            book_seq: 0,
            version: 0,
        }
    }

    /// Unfilled remainder.
    pub fn remaining(&self) -> Quantity {
        self.quantity - self.filled_quantity
    }

    /// The explicit limit price, if any.
    pub fn limit_price(&self) -> Option<Price> {
        match self.kind {
            OrderKind::Limit(price) => Some(price),
            OrderKind::Market => None,
        }
    }

    /// Per-contract price at which funds were reserved (buy orders only).
    ///
    /// Limit buys reserve at their limit price; market buys reserve at the
    /// 99c ceiling.
    pub fn reserve_price(&self) -> Option<Price> {
        match self.side {
            Side::Buy => Some(match self.kind {
                OrderKind::Limit(price) => price,
                OrderKind::Market => MARKET_BUY_CEILING,
            }),
            Side::Sell => None,
        }
    }

    pub fn is_filled(&self) -> bool {
        self.filled_quantity == self.quantity
    }

    pub fn has_fills(&self) -> bool {
        !self.filled_quantity.is_zero()
    }

    /// Apply a fill and adjust status.
    ///
    /// # Panics
    /// Panics if the fill would exceed the order quantity or the order is
    /// already terminal.
    pub fn add_fill(&mut self, fill_quantity: Quantity) {
        assert!(
            self.status.is_active(),
            "Cannot fill terminal order {}",
            self.order_id
        );
        let new_filled = self.filled_quantity + fill_quantity;
        assert!(
            new_filled <= self.quantity,
            "Fill would exceed order quantity"
        );

        self.filled_quantity = new_filled;
        self.status = if self.is_filled() {
            OrderStatus::Filled
        } else {
            OrderStatus::PartiallyFilled
        };
        self.version += 1;
    }

    /// Cancel the order.
    ///
    /// # Panics
    /// Panics if the order is already terminal.
    pub fn cancel(&mut self) {
        assert!(
            self.status.is_active(),
            "Cannot cancel terminal order {}",
            self.order_id
        );
        self.status = OrderStatus::Cancelled;
        self.version += 1;
    }

    /// Check quantity invariant: filled <= total, status consistent.
    pub fn check_invariant(&self) -> bool {
        self.filled_quantity <= self.quantity
            && (self.status == OrderStatus::Filled) == self.is_filled()
    }
}
