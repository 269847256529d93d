//! Trade execution logic
//!
//! Applies the full accounting of one matched pair (balances, positions,
//! order fills, market stats, and the trade record) inside a single ledger
//! transaction, so each pair commits atomically.
//!
//! Surplus rule for the cross-book matches: the resting leg always pays or
//! receives its own quoted price, and the aggressor takes the complement of
//! the resting price. Every minted pair therefore costs exactly $1.00 and
//! every merged pair pays out exactly $1.00; any difference against the
//! aggressor's quote is a price improvement accruing to the aggressor.

use ledger::{EntryRefs, Txn};
use types::prelude::*;

fn self_trade_guard(a: UserId, b: UserId) -> Result<(), TradingError> {
    if a == b {
        // The engine skips same-user resting orders; reaching here is a bug.
        return Err(TradingError::InvariantViolation(
            "self-trade reached the executor".into(),
        ));
    }
    Ok(())
}

/// Execute a direct trade at the resting order's price.
pub fn execute_direct(
    txn: &mut Txn<'_>,
    market_id: MarketId,
    contract: Contract,
    buy_order_id: OrderId,
    sell_order_id: OrderId,
    price: Price,
    quantity: Quantity,
) -> Result<Trade, TradingError> {
    let buy = txn.order(buy_order_id)?;
    let sell = txn.order(sell_order_id)?;
    self_trade_guard(buy.user_id, sell.user_id)?;

    let trade_value = price.cost(quantity);
    let trade = Trade::direct(
        market_id,
        contract,
        price,
        quantity,
        buy_order_id,
        sell_order_id,
        buy.user_id,
        sell.user_id,
        txn.now(),
    );
    let buy_refs = EntryRefs::trade(market_id, buy_order_id, trade.trade_id);
    let sell_refs = EntryRefs::trade(market_id, sell_order_id, trade.trade_id);

    // Buyer: spend at the execution price, release any price improvement
    // against the reservation, receive shares at cost.
    txn.consume_funds(
        buy.user_id,
        trade_value,
        EntryKind::TradeBuy,
        buy_refs,
        format!("Bought {} {} @ {}", quantity, contract, price),
    )?;
    let reserve_price = buy.reserve_price().ok_or_else(|| {
        TradingError::InvariantViolation("buy order without a reservation price".into())
    })?;
    let excess = reserve_price.cost(quantity) - trade_value;
    if !excess.is_zero() {
        txn.release_funds(
            buy.user_id,
            excess,
            buy_refs,
            format!("Released {} price improvement", excess),
        )?;
    }
    txn.credit_shares(buy.user_id, market_id, contract, quantity, trade_value)?;

    // Seller: receive proceeds, burn the reserved shares.
    txn.credit_funds(
        sell.user_id,
        trade_value,
        EntryKind::TradeSell,
        sell_refs,
        format!("Sold {} {} @ {}", quantity, contract, price),
    )?;
    txn.consume_shares_reserved(sell.user_id, market_id, contract, quantity, trade_value)?;

    txn.fill_order(buy_order_id, quantity)?;
    txn.fill_order(sell_order_id, quantity)?;

    let (yes_price, no_price) = (trade.yes_price, trade.no_price);
    txn.update_market(market_id, |m| {
        m.set_last_prices(yes_price, no_price);
        m.total_volume += quantity.get();
    })?;
    txn.insert_trade(trade.clone());
    Ok(trade)
}

/// Execute a mint match: two buyers jointly pay $1.00 per pair and the
/// system creates the complete sets.
pub fn execute_mint(
    txn: &mut Txn<'_>,
    market_id: MarketId,
    yes_order_id: OrderId,
    no_order_id: OrderId,
    aggressor: Contract,
    quantity: Quantity,
) -> Result<Trade, TradingError> {
    let yes = txn.order(yes_order_id)?;
    let no = txn.order(no_order_id)?;
    self_trade_guard(yes.user_id, no.user_id)?;

    let yes_quote = yes.limit_price().ok_or_else(|| {
        TradingError::InvariantViolation("mint requires limit orders".into())
    })?;
    let no_quote = no.limit_price().ok_or_else(|| {
        TradingError::InvariantViolation("mint requires limit orders".into())
    })?;
    if yes_quote.get() + no_quote.get() < 100 {
        return Err(TradingError::InvariantViolation(format!(
            "mint legs {} + {} sum below $1.00",
            yes_quote, no_quote
        )));
    }

    // Resting leg pays its quote; the aggressor pays the complement.
    let (yes_unit, no_unit) = match aggressor {
        Contract::Yes => (no_quote.complement(), no_quote),
        Contract::No => (yes_quote, yes_quote.complement()),
    };

    let trade = Trade::mint(
        market_id,
        yes_quote,
        no_quote,
        quantity,
        yes_order_id,
        no_order_id,
        yes.user_id,
        no.user_id,
        txn.now(),
    );

    let legs = [
        (&yes, Contract::Yes, yes_unit, yes_quote),
        (&no, Contract::No, no_unit, no_quote),
    ];
    for (order, contract, unit, quote) in legs {
        let refs = EntryRefs::trade(market_id, order.order_id, trade.trade_id);
        let cost = unit.cost(quantity);
        txn.consume_funds(
            order.user_id,
            cost,
            EntryKind::MintMatch,
            refs,
            format!(
                "Minted {} {} @ {} (paired with {} buyer)",
                quantity,
                contract,
                unit,
                contract.opposite()
            ),
        )?;
        let excess = quote.cost(quantity) - cost;
        if !excess.is_zero() {
            txn.release_funds(
                order.user_id,
                excess,
                refs,
                format!("Released {} mint price improvement", excess),
            )?;
        }
        txn.credit_shares(order.user_id, market_id, contract, quantity, cost)?;
        txn.fill_order(order.order_id, quantity)?;
    }

    txn.update_market(market_id, |m| {
        m.set_last_prices(yes_quote, no_quote);
        m.total_volume += quantity.get();
        m.shares_outstanding += quantity.get();
    })?;
    txn.insert_trade(trade.clone());
    Ok(trade)
}

/// Execute a merge match: two sellers jointly receive $1.00 per pair and
/// the system destroys the complete sets.
pub fn execute_merge(
    txn: &mut Txn<'_>,
    market_id: MarketId,
    yes_order_id: OrderId,
    no_order_id: OrderId,
    aggressor: Contract,
    quantity: Quantity,
) -> Result<Trade, TradingError> {
    let yes = txn.order(yes_order_id)?;
    let no = txn.order(no_order_id)?;
    self_trade_guard(yes.user_id, no.user_id)?;

    let yes_quote = yes.limit_price().ok_or_else(|| {
        TradingError::InvariantViolation("merge requires limit orders".into())
    })?;
    let no_quote = no.limit_price().ok_or_else(|| {
        TradingError::InvariantViolation("merge requires limit orders".into())
    })?;
    if yes_quote.get() + no_quote.get() > 100 {
        return Err(TradingError::InvariantViolation(format!(
            "merge legs {} + {} sum above $1.00",
            yes_quote, no_quote
        )));
    }

    // Resting leg receives its quote; the aggressor receives the complement.
    let (yes_unit, no_unit) = match aggressor {
        Contract::Yes => (no_quote.complement(), no_quote),
        Contract::No => (yes_quote, yes_quote.complement()),
    };

    let trade = Trade::merge(
        market_id,
        yes_quote,
        no_quote,
        quantity,
        yes_order_id,
        no_order_id,
        yes.user_id,
        no.user_id,
        txn.now(),
    );

    let legs = [
        (&yes, Contract::Yes, yes_unit),
        (&no, Contract::No, no_unit),
    ];
    for (order, contract, unit) in legs {
        let refs = EntryRefs::trade(market_id, order.order_id, trade.trade_id);
        let payout = unit.cost(quantity);
        txn.credit_funds(
            order.user_id,
            payout,
            EntryKind::MergeMatch,
            refs,
            format!(
                "Merged {} {} @ {} (paired with {} seller)",
                quantity,
                contract,
                unit,
                contract.opposite()
            ),
        )?;
        txn.consume_shares_reserved(order.user_id, market_id, contract, quantity, payout)?;
        txn.fill_order(order.order_id, quantity)?;
    }

    txn.update_market(market_id, |m| {
        m.set_last_prices(yes_quote, no_quote);
        m.total_volume += quantity.get();
        m.shares_outstanding = m.shares_outstanding.saturating_sub(quantity.get());
    })?;
    txn.insert_trade(trade.clone());
    Ok(trade)
}
