//! Market settlement and administrative cancellation
//!
//! Settlement pays every winning share $1.00, wipes losing shares, cancels
//! open orders, and releases their reservations, all in one ledger
//! transaction. Administrative cancellation instead refunds each position's
//! remaining cost basis; no resolution is synthesized.

use ledger::{EntryRefs, Ledger, Txn};
use serde::{Deserialize, Serialize};
use types::prelude::*;

/// Outcome summary of a settlement.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettlementStats {
    pub winners: usize,
    pub losers: usize,
    pub orders_cancelled: usize,
    pub total_payout: Cents,
}

/// Outcome summary of an administrative market cancellation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CancellationStats {
    pub orders_cancelled: usize,
    pub positions_refunded: usize,
    pub total_refunded: Cents,
}

/// Settle an active market with the given resolution.
///
/// Fails with `MARKET_NOT_ACTIVE` when already settled or cancelled, so
/// settlement is not repeatable and a second attempt changes nothing.
pub fn settle_market(
    ledger: &Ledger,
    market_id: MarketId,
    resolution: Resolution,
    now: i64,
) -> Result<SettlementStats, TradingError> {
    let stats = ledger.with_txn(now, |txn| {
        let market = txn.market(market_id)?;
        if !market.is_trading_active() {
            return Err(TradingError::MarketNotActive);
        }
        let winner = resolution.winning_contract();
        let mut stats = SettlementStats::default();

        cancel_open_orders(txn, ledger, market_id, "market settled", &mut stats.orders_cancelled)?;

        for position in ledger.store().positions_for_market(market_id) {
            let user_id = position.user_id;
            let win_qty = position.quantity(winner);
            let lose_qty = position.quantity(winner.opposite());

            if win_qty > 0 {
                let quantity = Quantity::new(win_qty);
                let payout = Cents::new(100 * win_qty as i64);
                txn.credit_funds(
                    user_id,
                    payout,
                    EntryKind::SettlementWin,
                    EntryRefs::market(market_id),
                    format!("Won {} {} contracts @ $1 each", win_qty, winner),
                )?;
                txn.consume_shares_available(user_id, market_id, winner, quantity, payout)?;
                stats.winners += 1;
                stats.total_payout += payout;
            }
            if lose_qty > 0 {
                let quantity = Quantity::new(lose_qty);
                txn.credit_funds(
                    user_id,
                    Cents::ZERO,
                    EntryKind::SettlementLoss,
                    EntryRefs::market(market_id),
                    format!(
                        "Lost {} {} contracts (worthless)",
                        lose_qty,
                        winner.opposite()
                    ),
                )?;
                txn.consume_shares_available(
                    user_id,
                    market_id,
                    winner.opposite(),
                    quantity,
                    Cents::ZERO,
                )?;
                stats.losers += 1;
            }
        }

        txn.update_market(market_id, |m| {
            m.status = MarketStatus::Settled;
            m.resolution = Some(resolution);
            m.resolved_at = Some(now);
            m.shares_outstanding = 0;
            m.set_quotes(Contract::Yes, None, None);
            m.set_quotes(Contract::No, None, None);
        })?;
        Ok(stats)
    })?;

    tracing::info!(
        %market_id,
        ?resolution,
        winners = stats.winners,
        losers = stats.losers,
        payout = %stats.total_payout,
        "market settled"
    );
    Ok(stats)
}

/// Administratively cancel a market: refund remaining cost bases and cancel
/// open orders. Logged, but no resolution is recorded.
pub fn cancel_market(
    ledger: &Ledger,
    market_id: MarketId,
    now: i64,
) -> Result<CancellationStats, TradingError> {
    let stats = ledger.with_txn(now, |txn| {
        let market = txn.market(market_id)?;
        if !market.is_trading_active() {
            return Err(TradingError::MarketNotActive);
        }
        let mut stats = CancellationStats::default();

        cancel_open_orders(
            txn,
            ledger,
            market_id,
            "market cancelled",
            &mut stats.orders_cancelled,
        )?;

        for position in ledger.store().positions_for_market(market_id) {
            let user_id = position.user_id;
            let refund = position.yes_cost_basis + position.no_cost_basis;
            if !refund.is_zero() {
                txn.credit_funds(
                    user_id,
                    refund,
                    EntryKind::Refund,
                    EntryRefs::market(market_id),
                    format!("Refunded {} cost basis (market cancelled)", refund),
                )?;
            }
            if position.yes_quantity > 0 {
                txn.consume_shares_available(
                    user_id,
                    market_id,
                    Contract::Yes,
                    Quantity::new(position.yes_quantity),
                    position.yes_cost_basis,
                )?;
            }
            if position.no_quantity > 0 {
                txn.consume_shares_available(
                    user_id,
                    market_id,
                    Contract::No,
                    Quantity::new(position.no_quantity),
                    position.no_cost_basis,
                )?;
            }
            stats.positions_refunded += 1;
            stats.total_refunded += refund;
        }

        txn.update_market(market_id, |m| {
            m.status = MarketStatus::Cancelled;
            m.resolved_at = Some(now);
            m.shares_outstanding = 0;
            m.set_quotes(Contract::Yes, None, None);
            m.set_quotes(Contract::No, None, None);
        })?;
        Ok(stats)
    })?;

    tracing::info!(
        %market_id,
        orders_cancelled = stats.orders_cancelled,
        refunded = %stats.total_refunded,
        "market cancelled without resolution"
    );
    Ok(stats)
}

/// Cancel every open order on the market, releasing its reservation.
fn cancel_open_orders(
    txn: &mut Txn<'_>,
    ledger: &Ledger,
    market_id: MarketId,
    reason: &str,
    cancelled: &mut usize,
) -> Result<(), TradingError> {
    for order in ledger.store().open_orders(market_id) {
        let remaining = order.remaining();
        let refs = EntryRefs::order(market_id, order.order_id);
        match order.side {
            Side::Buy => {
                let amount = order
                    .reserve_price()
                    .expect("buy orders always have a reservation price")
                    .cost(remaining);
                txn.release_funds(
                    order.user_id,
                    amount,
                    refs,
                    format!("Released funds from cancelled order ({})", reason),
                )?;
            }
            Side::Sell => {
                txn.release_shares(
                    order.user_id,
                    market_id,
                    order.contract,
                    remaining,
                    refs,
                    format!("Released shares from cancelled order ({})", reason),
                )?;
            }
        }
        txn.cancel_order(order.order_id)?;
        *cancelled += 1;
    }
    Ok(())
}
