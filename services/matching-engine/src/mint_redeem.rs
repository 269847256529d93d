//! Direct mint and redeem of complete sets
//!
//! These bypass the order book entirely: a user pays $1.00 per set to mint
//! 1 YES + 1 NO, or burns 1 of each to redeem $1.00. Both require an active
//! market. The set's cost basis is split evenly between the two legs.

use ledger::{EntryRefs, Ledger};
use serde::{Deserialize, Serialize};
use types::prelude::*;

/// Result of a direct mint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MintReceipt {
    pub quantity: Quantity,
    pub cost: Cents,
}

/// Result of a direct redeem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedeemReceipt {
    pub quantity: Quantity,
    pub payout: Cents,
}

/// Mint `quantity` complete sets against $1.00 each.
pub fn mint_set(
    ledger: &Ledger,
    user_id: UserId,
    market_id: MarketId,
    quantity: u64,
    now: i64,
) -> Result<MintReceipt, TradingError> {
    let quantity = Quantity::try_new(quantity).ok_or(TradingError::InvalidQuantity(quantity))?;
    ledger.with_txn(now, |txn| {
        let market = txn.market(market_id)?;
        if !market.is_trading_active() {
            return Err(TradingError::MarketNotActive);
        }

        let cost = Cents::for_sets(quantity);
        let refs = EntryRefs::market(market_id);
        txn.reserve_funds(
            user_id,
            cost,
            refs,
            format!("Reserved {} to mint {} complete sets", cost, quantity),
        )?;
        txn.consume_funds(
            user_id,
            cost,
            EntryKind::Mint,
            refs,
            format!("Minted {} complete sets (YES+NO) @ $1/set", quantity),
        )?;

        // Each leg carries half the set cost: 50c per share.
        let half = Cents::new(50 * quantity.get() as i64);
        txn.credit_shares(user_id, market_id, Contract::Yes, quantity, half)?;
        txn.credit_shares(user_id, market_id, Contract::No, quantity, half)?;
        txn.update_market(market_id, |m| m.shares_outstanding += quantity.get())?;

        Ok(MintReceipt { quantity, cost })
    })
}

/// Redeem `quantity` complete sets for $1.00 each. Requires that many
/// unreserved shares of both contracts.
pub fn redeem_set(
    ledger: &Ledger,
    user_id: UserId,
    market_id: MarketId,
    quantity: u64,
    now: i64,
) -> Result<RedeemReceipt, TradingError> {
    let quantity = Quantity::try_new(quantity).ok_or(TradingError::InvalidQuantity(quantity))?;
    ledger.with_txn(now, |txn| {
        let market = txn.market(market_id)?;
        if !market.is_trading_active() {
            return Err(TradingError::MarketNotActive);
        }

        let payout = Cents::for_sets(quantity);
        let half = Cents::new(50 * quantity.get() as i64);
        txn.consume_shares_available(user_id, market_id, Contract::Yes, quantity, half)?;
        txn.consume_shares_available(user_id, market_id, Contract::No, quantity, half)?;
        txn.credit_funds(
            user_id,
            payout,
            EntryKind::Redeem,
            EntryRefs::market(market_id),
            format!("Redeemed {} complete sets (YES+NO) @ $1/set", quantity),
        )?;
        txn.update_market(market_id, |m| {
            m.shares_outstanding = m.shares_outstanding.saturating_sub(quantity.get());
        })?;

        Ok(RedeemReceipt { quantity, payout })
    })
}
