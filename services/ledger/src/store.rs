//! In-process persistence with row-level locking
//!
//! Row-keyed tables use `DashMap` so independent rows can be touched
//! concurrently; multi-row transaction commits serialize through a commit
//! gate held by [`crate::txn::Txn::commit`]. Readers see either the state
//! before or after a committed transaction, never a partial one for rows
//! they read individually.

use dashmap::DashMap;
use std::sync::{Mutex, RwLock};
use types::prelude::*;

/// Position rows are keyed per user per market.
pub type PositionKey = (UserId, MarketId);

/// The backing store for all trading state.
pub struct Store {
    pub(crate) users: DashMap<UserId, UserAccount>,
    pub(crate) positions: DashMap<PositionKey, Position>,
    pub(crate) orders: DashMap<OrderId, Order>,
    pub(crate) markets: DashMap<MarketId, Market>,
    pub(crate) trades: RwLock<Vec<Trade>>,
    pub(crate) entries: RwLock<Vec<TransactionEntry>>,
    /// Serializes multi-row commits.
    pub(crate) commit_gate: Mutex<()>,
}

impl Store {
    pub fn new() -> Self {
        Self {
            users: DashMap::new(),
            positions: DashMap::new(),
            orders: DashMap::new(),
            markets: DashMap::new(),
            trades: RwLock::new(Vec::new()),
            entries: RwLock::new(Vec::new()),
            commit_gate: Mutex::new(()),
        }
    }

    /// Create and persist a new empty user account.
    pub fn create_user(&self, timestamp: i64) -> UserAccount {
        let account = UserAccount::new(timestamp);
        self.users.insert(account.user_id, account.clone());
        account
    }

    /// Create and persist a new active market.
    pub fn create_market(&self, title: impl Into<String>, timestamp: i64) -> Market {
        let market = Market::new(title, timestamp);
        self.markets.insert(market.market_id, market.clone());
        market
    }

    // ── Row reads (cloned snapshots) ────────────────────────────────

    pub fn user(&self, user_id: UserId) -> Option<UserAccount> {
        self.users.get(&user_id).map(|r| r.clone())
    }

    pub fn position(&self, user_id: UserId, market_id: MarketId) -> Option<Position> {
        self.positions.get(&(user_id, market_id)).map(|r| r.clone())
    }

    pub fn order(&self, order_id: OrderId) -> Option<Order> {
        self.orders.get(&order_id).map(|r| r.clone())
    }

    pub fn market(&self, market_id: MarketId) -> Option<Market> {
        self.markets.get(&market_id).map(|r| r.clone())
    }

    // ── Projections ─────────────────────────────────────────────────

    /// All OPEN / PARTIALLY_FILLED orders on a market, in matcher
    /// acceptance order.
    pub fn open_orders(&self, market_id: MarketId) -> Vec<Order> {
        let mut orders: Vec<Order> = self
            .orders
            .iter()
            .filter(|r| r.market_id == market_id && r.status.is_active())
            .map(|r| r.clone())
            .collect();
        orders.sort_by_key(|o| (o.book_seq, o.created_at));
        orders
    }

    /// All open orders owned by a user.
    pub fn open_orders_for_user(&self, user_id: UserId) -> Vec<Order> {
        let mut orders: Vec<Order> = self
            .orders
            .iter()
            .filter(|r| r.user_id == user_id && r.status.is_active())
            .map(|r| r.clone())
            .collect();
        orders.sort_by_key(|o| (o.book_seq, o.created_at));
        orders
    }

    /// Every position row with holdings on a market.
    pub fn positions_for_market(&self, market_id: MarketId) -> Vec<Position> {
        self.positions
            .iter()
            .filter(|r| r.market_id == market_id && r.has_position())
            .map(|r| r.clone())
            .collect()
    }

    /// Most recent trades on a market, newest first.
    pub fn trades_for_market(&self, market_id: MarketId, limit: usize) -> Vec<Trade> {
        let trades = self.trades.read().expect("trade log poisoned");
        trades
            .iter()
            .rev()
            .filter(|t| t.market_id == market_id)
            .take(limit)
            .cloned()
            .collect()
    }

    /// Full trade log snapshot, oldest first.
    pub fn all_trades(&self) -> Vec<Trade> {
        self.trades.read().expect("trade log poisoned").clone()
    }

    /// A user's transaction entries, oldest first.
    pub fn entries_for_user(&self, user_id: UserId) -> Vec<TransactionEntry> {
        let entries = self.entries.read().expect("entry log poisoned");
        entries
            .iter()
            .filter(|e| e.user_id == user_id)
            .cloned()
            .collect()
    }

    /// Full transaction log snapshot, oldest first.
    pub fn all_entries(&self) -> Vec<TransactionEntry> {
        self.entries.read().expect("entry log poisoned").clone()
    }

    /// Snapshot of every user account.
    pub fn all_users(&self) -> Vec<UserAccount> {
        self.users.iter().map(|r| r.clone()).collect()
    }

    /// Snapshot of every position row.
    pub fn all_positions(&self) -> Vec<Position> {
        self.positions.iter().map(|r| r.clone()).collect()
    }

    /// Snapshot of every market.
    pub fn all_markets(&self) -> Vec<Market> {
        self.markets.iter().map(|r| r.clone()).collect()
    }
}

impl Default for Store {
    fn default() -> Self {
        Self::new()
    }
}
