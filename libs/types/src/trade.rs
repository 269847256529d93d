//! Trade execution types
//!
//! A trade records an atomic exchange produced by the matching engine.
//! Besides direct trades, the engine produces two cross-book trade types:
//! mint (two buyers jointly create a complete set) and merge (two sellers
//! jointly destroy one).

use crate::ids::{MarketId, OrderId, TradeId, UserId};
use crate::numeric::{Cents, Price, Quantity};
use crate::order::Contract;
use serde::{Deserialize, Serialize};

/// How the trade was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TradeType {
    /// Buyer matched seller on the same contract.
    Direct,
    /// BUY YES crossed BUY NO; a complete set was created.
    Mint,
    /// SELL YES crossed SELL NO; a complete set was destroyed.
    Merge,
}

/// An executed trade. Immutable once created.
///
/// For `Direct` trades `buy_order`/`sell_order` and `buyer`/`seller` are
/// literal. For `Mint` both parties are buyers and for `Merge` both are
/// sellers; the `buy_order`/`buyer` fields hold the YES leg and the
/// `sell_order`/`seller` fields the NO leg.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    pub trade_id: TradeId,
    pub market_id: MarketId,
    /// The book the trade printed on (`Yes` by convention for mint/merge).
    pub contract: Contract,
    pub trade_type: TradeType,
    /// Headline price in cents: the execution price for direct trades,
    /// 100 for mint, 0 for merge.
    pub price_cents: u32,
    /// YES-side leg price. For direct NO trades this is the complement.
    pub yes_price: Price,
    /// NO-side leg price. For direct YES trades this is the complement.
    pub no_price: Price,
    pub quantity: Quantity,
    pub buy_order_id: OrderId,
    pub sell_order_id: OrderId,
    pub buyer_id: UserId,
    pub seller_id: UserId,
    /// Unix nanos.
    pub executed_at: i64,
}

impl Trade {
    /// Create a direct trade at the resting order's price.
    #[allow(clippy::too_many_arguments)]
    pub fn direct(
        market_id: MarketId,
        contract: Contract,
        price: Price,
        quantity: Quantity,
        buy_order_id: OrderId,
        sell_order_id: OrderId,
        buyer_id: UserId,
        seller_id: UserId,
        executed_at: i64,
    ) -> Self {
        let (yes_price, no_price) = match contract {
            Contract::Yes => (price, price.complement()),
            Contract::No => (price.complement(), price),
        };
        Self {
            trade_id: TradeId::new(),
            market_id,
            contract,
            trade_type: TradeType::Direct,
            price_cents: price.get(),
            yes_price,
            no_price,
            quantity,
            buy_order_id,
            sell_order_id,
            buyer_id,
            seller_id,
            executed_at,
        }
    }

    /// Create a mint trade. Leg prices are the two buyers' quoted limit
    /// prices and must sum to at least 100.
    #[allow(clippy::too_many_arguments)]
    pub fn mint(
        market_id: MarketId,
        yes_price: Price,
        no_price: Price,
        quantity: Quantity,
        yes_order_id: OrderId,
        no_order_id: OrderId,
        yes_buyer_id: UserId,
        no_buyer_id: UserId,
        executed_at: i64,
    ) -> Self {
        debug_assert!(yes_price.get() + no_price.get() >= 100);
        Self {
            trade_id: TradeId::new(),
            market_id,
            contract: Contract::Yes,
            trade_type: TradeType::Mint,
            price_cents: 100,
            yes_price,
            no_price,
            quantity,
            buy_order_id: yes_order_id,
            sell_order_id: no_order_id,
            buyer_id: yes_buyer_id,
            seller_id: no_buyer_id,
            executed_at,
        }
    }

    /// Create a merge trade. Leg prices are the two sellers' quoted limit
    /// prices and must sum to at most 100.
    #[allow(clippy::too_many_arguments)]
    pub fn merge(
        market_id: MarketId,
        yes_price: Price,
        no_price: Price,
        quantity: Quantity,
        yes_order_id: OrderId,
        no_order_id: OrderId,
        yes_seller_id: UserId,
        no_seller_id: UserId,
        executed_at: i64,
    ) -> Self {
        debug_assert!(yes_price.get() + no_price.get() <= 100);
        Self {
            trade_id: TradeId::new(),
            market_id,
            contract: Contract::Yes,
            trade_type: TradeType::Merge,
            price_cents: 0,
            yes_price,
            no_price,
            quantity,
            buy_order_id: yes_order_id,
            sell_order_id: no_order_id,
            buyer_id: yes_seller_id,
            seller_id: no_seller_id,
            executed_at,
        }
    }

    /// Notional value at the headline price.
    pub fn value(&self) -> Cents {
        Cents::new(self.price_cents as i64 * self.quantity.get() as i64)
    }

    /// No trade may link two orders owned by the same user.
    pub fn validate_no_self_trade(&self) -> bool {
        self.buyer_id != self.seller_id
    }
}
