//! Per-market four-queue order book
//!
//! One binary market carries four sorted queues: YES-bids, YES-asks,
//! NO-bids, NO-asks. The mint and merge matches couple the two bid books
//! and the two ask books respectively.

use types::numeric::Price;
use types::order::{Contract, Order, Side};

use super::ask_book::AskBook;
use super::bid_book::BidBook;

/// The four queues of one market.
#[derive(Debug, Clone, Default)]
pub struct MarketBook {
    yes_bids: BidBook,
    yes_asks: AskBook,
    no_bids: BidBook,
    no_asks: AskBook,
}

impl MarketBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bids(&self, contract: Contract) -> &BidBook {
        match contract {
            Contract::Yes => &self.yes_bids,
            Contract::No => &self.no_bids,
        }
    }

    pub fn bids_mut(&mut self, contract: Contract) -> &mut BidBook {
        match contract {
            Contract::Yes => &mut self.yes_bids,
            Contract::No => &mut self.no_bids,
        }
    }

    pub fn asks(&self, contract: Contract) -> &AskBook {
        match contract {
            Contract::Yes => &self.yes_asks,
            Contract::No => &self.no_asks,
        }
    }

    pub fn asks_mut(&mut self, contract: Contract) -> &mut AskBook {
        match contract {
            Contract::Yes => &mut self.yes_asks,
            Contract::No => &mut self.no_asks,
        }
    }

    /// Insert a resting limit order into its queue.
    ///
    /// # Panics
    /// Panics if the order has no limit price; market orders never rest.
    pub fn insert_order(&mut self, order: &Order) {
        let price = order
            .limit_price()
            .expect("market orders never rest in the book");
        match order.side {
            Side::Buy => self.bids_mut(order.contract).insert(
                price,
                order.order_id,
                order.user_id,
                order.remaining(),
            ),
            Side::Sell => self.asks_mut(order.contract).insert(
                price,
                order.order_id,
                order.user_id,
                order.remaining(),
            ),
        }
    }

    /// Remove a resting order, if present.
    pub fn remove_order(&mut self, order: &Order) -> bool {
        let Some(price) = order.limit_price() else {
            return false;
        };
        match order.side {
            Side::Buy => self.bids_mut(order.contract).remove(&order.order_id, price),
            Side::Sell => self.asks_mut(order.contract).remove(&order.order_id, price),
        }
    }

    pub fn best_bid(&self, contract: Contract) -> Option<Price> {
        self.bids(contract).best_price()
    }

    pub fn best_ask(&self, contract: Contract) -> Option<Price> {
        self.asks(contract).best_price()
    }

    pub fn is_empty(&self) -> bool {
        self.yes_bids.is_empty()
            && self.yes_asks.is_empty()
            && self.no_bids.is_empty()
            && self.no_asks.is_empty()
    }

    /// Drop every resting order (settlement drains the market).
    pub fn clear(&mut self) {
        *self = Self::default();
    }
}
