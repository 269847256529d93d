//! Order book depth snapshots
//!
//! Built from committed open orders, aggregated per price level. Levels
//! with zero remaining quantity never appear.

use ledger::Store;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use types::prelude::*;

/// One aggregated price level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelView {
    pub price: Price,
    pub quantity: u64,
}

/// The four ladders of one market, best price first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookSnapshot {
    pub market_id: MarketId,
    pub yes_bids: Vec<LevelView>,
    pub yes_asks: Vec<LevelView>,
    pub no_bids: Vec<LevelView>,
    pub no_asks: Vec<LevelView>,
}

/// Snapshot the committed book projection for one market.
pub fn order_book_snapshot(store: &Store, market_id: MarketId, depth: usize) -> BookSnapshot {
    let mut yes_bids = BTreeMap::new();
    let mut yes_asks = BTreeMap::new();
    let mut no_bids = BTreeMap::new();
    let mut no_asks = BTreeMap::new();

    for order in store.open_orders(market_id) {
        let Some(price) = order.limit_price() else {
            continue;
        };
        let ladder = match (order.side, order.contract) {
            (Side::Buy, Contract::Yes) => &mut yes_bids,
            (Side::Sell, Contract::Yes) => &mut yes_asks,
            (Side::Buy, Contract::No) => &mut no_bids,
            (Side::Sell, Contract::No) => &mut no_asks,
        };
        *ladder.entry(price).or_insert(0u64) += order.remaining().get();
    }

    let levels = |ladder: BTreeMap<Price, u64>, best_first_desc: bool| -> Vec<LevelView> {
        let iter: Box<dyn Iterator<Item = (Price, u64)>> = if best_first_desc {
            Box::new(ladder.into_iter().rev())
        } else {
            Box::new(ladder.into_iter())
        };
        iter.take(depth)
            .map(|(price, quantity)| LevelView { price, quantity })
            .collect()
    };

    BookSnapshot {
        market_id,
        yes_bids: levels(yes_bids, true),
        yes_asks: levels(yes_asks, false),
        no_bids: levels(no_bids, true),
        no_asks: levels(no_asks, false),
    }
}
