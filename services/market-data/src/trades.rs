//! Recent trade projections

use ledger::Store;
use serde::{Deserialize, Serialize};
use types::prelude::*;

/// A trade as presented to browsing surfaces.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeView {
    pub trade_id: TradeId,
    pub trade_type: TradeType,
    pub contract: Contract,
    pub price_cents: u32,
    pub yes_price: Price,
    pub no_price: Price,
    pub quantity: Quantity,
    pub executed_at: i64,
}

impl From<Trade> for TradeView {
    fn from(trade: Trade) -> Self {
        Self {
            trade_id: trade.trade_id,
            trade_type: trade.trade_type,
            contract: trade.contract,
            price_cents: trade.price_cents,
            yes_price: trade.yes_price,
            no_price: trade.no_price,
            quantity: trade.quantity,
            executed_at: trade.executed_at,
        }
    }
}

/// Most recent trades on a market, newest first.
pub fn recent_trades(store: &Store, market_id: MarketId, limit: usize) -> Vec<TradeView> {
    store
        .trades_for_market(market_id, limit)
        .into_iter()
        .map(TradeView::from)
        .collect()
}
