//! Order intake: validation, reservation, and acceptance
//!
//! Intake runs on the caller's task, not the matcher: it validates the
//! request, reserves funds or shares, and persists the order OPEN, all in
//! one ledger transaction. The caller gets its accepted order back as soon
//! as the reservation commits; matching happens asynchronously.

use ledger::{EntryRefs, Ledger, Txn};
use types::prelude::*;

/// Validate and accept a new order, reserving funds (buy) or shares (sell).
///
/// `price_cents` must be given for limit orders and absent for market
/// orders. Market buys reserve at the 99c ceiling; the unused portion is
/// released as the order matches.
#[allow(clippy::too_many_arguments)]
pub fn accept_order(
    ledger: &Ledger,
    user_id: UserId,
    market_id: MarketId,
    side: Side,
    contract: Contract,
    price_cents: Option<u32>,
    quantity: u64,
    now: i64,
) -> Result<Order, TradingError> {
    let quantity = Quantity::try_new(quantity).ok_or(TradingError::InvalidQuantity(quantity))?;
    let kind = match price_cents {
        Some(cents) => {
            OrderKind::Limit(Price::try_new(cents).ok_or(TradingError::InvalidPrice(cents))?)
        }
        None => OrderKind::Market,
    };

    ledger.with_txn(now, |txn| {
        let market = txn.market(market_id)?;
        if !market.is_trading_active() {
            return Err(TradingError::MarketNotActive);
        }

        let order = Order::new(user_id, market_id, side, contract, kind, quantity, now);
        reserve_for(txn, &order)?;
        txn.put_order(order.clone());
        Ok(order)
    })
}

fn reserve_for(txn: &mut Txn<'_>, order: &Order) -> Result<(), TradingError> {
    let refs = EntryRefs::order(order.market_id, order.order_id);
    match order.side {
        Side::Buy => {
            let price = order
                .reserve_price()
                .expect("buy orders always have a reservation price");
            let amount = price.cost(order.quantity);
            let at = match order.kind {
                OrderKind::Limit(p) => format!("@ {}", p),
                OrderKind::Market => "at market".to_string(),
            };
            txn.reserve_funds(
                order.user_id,
                amount,
                refs,
                format!(
                    "Reserved {} for BUY {} {} {}",
                    amount, order.quantity, order.contract, at
                ),
            )
        }
        Side::Sell => txn.reserve_shares(
            order.user_id,
            order.market_id,
            order.contract,
            order.quantity,
            refs,
            format!(
                "Reserved {} {} shares for SELL order",
                order.quantity, order.contract
            ),
        ),
    }
}
