//! User position views with mark-to-market P&L

use ledger::Store;
use serde::{Deserialize, Serialize};
use types::prelude::*;

/// A user's holdings in one market, marked against the last traded prices.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionView {
    pub market_id: MarketId,
    pub yes_quantity: u64,
    pub no_quantity: u64,
    pub reserved_yes: u64,
    pub reserved_no: u64,
    pub yes_cost_basis: Cents,
    pub no_cost_basis: Cents,
    pub realized_pnl: Cents,
    pub unrealized_pnl: Cents,
}

/// Project a user's position in one market, or None without holdings.
pub fn user_position(store: &Store, user_id: UserId, market_id: MarketId) -> Option<PositionView> {
    let position = store.position(user_id, market_id)?;
    let market = store.market(market_id)?;
    Some(PositionView {
        market_id,
        yes_quantity: position.yes_quantity,
        no_quantity: position.no_quantity,
        reserved_yes: position.reserved_yes,
        reserved_no: position.reserved_no,
        yes_cost_basis: position.yes_cost_basis,
        no_cost_basis: position.no_cost_basis,
        realized_pnl: position.realized_pnl,
        unrealized_pnl: position.unrealized_pnl(market.last_yes_price, market.last_no_price),
    })
}
