//! Bid (buy-side) order book
//!
//! Maintains buy orders sorted by price descending (best bid first).
//! Uses BTreeMap for deterministic iteration; at each price level orders
//! are kept in FIFO order.

use std::collections::BTreeMap;
use types::ids::{OrderId, UserId};
use types::numeric::{Price, Quantity};

use super::price_level::PriceLevel;
use super::BookMatch;

/// Bid (buy) side of one contract's book.
#[derive(Debug, Clone, Default)]
pub struct BidBook {
    /// Price levels; highest key is the best bid.
    levels: BTreeMap<Price, PriceLevel>,
}

impl BidBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a resting order.
    pub fn insert(&mut self, price: Price, order_id: OrderId, user_id: UserId, remaining: Quantity) {
        self.levels
            .entry(price)
            .or_default()
            .push_back(order_id, user_id, remaining);
    }

    /// Remove a resting order. Empty price levels are dropped so they never
    /// appear in snapshots.
    pub fn remove(&mut self, order_id: &OrderId, price: Price) -> bool {
        if let Some(level) = self.levels.get_mut(&price) {
            if level.remove(order_id).is_some() {
                if level.is_empty() {
                    self.levels.remove(&price);
                }
                return true;
            }
        }
        false
    }

    /// Best (highest) bid price.
    pub fn best_price(&self) -> Option<Price> {
        self.levels.keys().next_back().copied()
    }

    /// Best candidate in priority order: highest price first, FIFO within a
    /// level, skipping orders owned by `exclude`. Stops at the first price
    /// where `crosses` fails.
    pub fn best_counterparty(
        &self,
        crosses: impl Fn(Price) -> bool,
        exclude: UserId,
    ) -> Option<BookMatch> {
        for (price, level) in self.levels.iter().rev() {
            if !crosses(*price) {
                break;
            }
            if let Some(entry) = level.first_counterparty(exclude) {
                return Some(BookMatch {
                    price: *price,
                    order_id: entry.order_id,
                    user_id: entry.user_id,
                    remaining: entry.remaining,
                });
            }
        }
        None
    }

    /// Reduce a resting order after a fill, dropping empty levels.
    pub fn fill(&mut self, price: Price, order_id: &OrderId, quantity: Quantity) -> bool {
        let Some(level) = self.levels.get_mut(&price) else {
            return false;
        };
        let found = level.fill(order_id, quantity);
        if level.is_empty() {
            self.levels.remove(&price);
        }
        found
    }

    /// Top-N aggregated depth, best price first.
    pub fn depth_snapshot(&self, depth: usize) -> Vec<(Price, u64)> {
        self.levels
            .iter()
            .rev()
            .take(depth)
            .map(|(price, level)| (*price, level.total_quantity()))
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    pub fn level_count(&self) -> usize {
        self.levels.len()
    }
}
