//! Append-only ledger entry types
//!
//! Every balance change is recorded as a signed transaction entry; pure
//! reservations are logged with amount zero for auditability. For any user,
//! the sum of entry amounts equals the current balance.

use crate::ids::{EntryId, MarketId, OrderId, TradeId, UserId};
use crate::numeric::Cents;
use serde::{Deserialize, Serialize};

/// Ledger entry kind.
///
/// Amount sign conventions: debits negative (`TradeBuy`, `Mint`,
/// `MintMatch`, `Withdrawal`), credits positive (`TradeSell`, `Redeem`,
/// `MergeMatch`, `SettlementWin`, `Refund`, `Deposit`), reservations and
/// settlement losses zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntryKind {
    Deposit,
    Withdrawal,
    TradeBuy,
    TradeSell,
    SettlementWin,
    SettlementLoss,
    OrderReserve,
    OrderRelease,
    Refund,
    Mint,
    Redeem,
    MintMatch,
    MergeMatch,
}

/// A single ledger entry. Append-only; never updated or deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionEntry {
    pub entry_id: EntryId,
    pub user_id: UserId,
    pub kind: EntryKind,
    /// Signed balance delta in cents. Zero for reservation bookkeeping.
    pub amount: Cents,
    /// User balance after this entry was applied.
    pub balance_after: Cents,
    pub market_id: Option<MarketId>,
    pub order_id: Option<OrderId>,
    pub trade_id: Option<TradeId>,
    pub description: String,
    pub created_at: i64,
}

impl TransactionEntry {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        user_id: UserId,
        kind: EntryKind,
        amount: Cents,
        balance_after: Cents,
        market_id: Option<MarketId>,
        order_id: Option<OrderId>,
        trade_id: Option<TradeId>,
        description: impl Into<String>,
        created_at: i64,
    ) -> Self {
        Self {
            entry_id: EntryId::new(),
            user_id,
            kind,
            amount,
            balance_after,
            market_id,
            order_id,
            trade_id,
            description: description.into(),
            created_at,
        }
    }
}
