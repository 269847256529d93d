//! Transactional ledger context
//!
//! A [`Txn`] stages every mutation of one engine event against cloned row
//! snapshots. Validation (sufficient funds, sufficient position) happens at
//! staging time, before anything is visible; commit verifies row versions
//! under the store's commit gate and applies everything, or nothing.
//!
//! Callers go through [`Ledger::with_txn`], which retries version conflicts
//! a bounded number of times. The single-writer matcher never conflicts with
//! itself; conflicts can only arise between concurrent intake reservations
//! touching the same account.

use crate::store::{PositionKey, Store};
use persistence::journal::JournalWriter;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;
use types::prelude::*;

/// Bounded retries for optimistic commit conflicts.
const MAX_COMMIT_ATTEMPTS: u32 = 8;

/// Commit-time failure: a row touched by this transaction changed underneath
/// it. Retried by [`Ledger::with_txn`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommitError {
    #[error("write conflict on {row}")]
    Conflict { row: String },
}

/// Optional references attached to a ledger entry.
#[derive(Debug, Clone, Copy, Default)]
pub struct EntryRefs {
    pub market: Option<MarketId>,
    pub order: Option<OrderId>,
    pub trade: Option<TradeId>,
}

impl EntryRefs {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn market(market: MarketId) -> Self {
        Self {
            market: Some(market),
            ..Self::default()
        }
    }

    pub fn order(market: MarketId, order: OrderId) -> Self {
        Self {
            market: Some(market),
            order: Some(order),
            ..Self::default()
        }
    }

    pub fn trade(market: MarketId, order: OrderId, trade: TradeId) -> Self {
        Self {
            market: Some(market),
            order: Some(order),
            trade: Some(trade),
        }
    }
}

/// A staged row: the version observed at first read (`None` when the row was
/// created by this transaction) plus the working copy.
struct Staged<T> {
    expected_version: Option<u64>,
    row: T,
}

/// One atomic engine event against the ledger.
pub struct Txn<'a> {
    store: &'a Store,
    now: i64,
    users: HashMap<UserId, Staged<UserAccount>>,
    positions: HashMap<PositionKey, Staged<Position>>,
    orders: HashMap<OrderId, Staged<Order>>,
    markets: HashMap<MarketId, Staged<Market>>,
    trades: Vec<Trade>,
    entries: Vec<TransactionEntry>,
}

impl<'a> Txn<'a> {
    fn new(store: &'a Store, now: i64) -> Self {
        Self {
            store,
            now,
            users: HashMap::new(),
            positions: HashMap::new(),
            orders: HashMap::new(),
            markets: HashMap::new(),
            trades: Vec::new(),
            entries: Vec::new(),
        }
    }

    /// Timestamp stamped on every entry written by this transaction.
    pub fn now(&self) -> i64 {
        self.now
    }

    // ── Row access (clone-on-first-touch) ───────────────────────────

    fn user_mut(&mut self, user_id: UserId) -> Result<&mut UserAccount, TradingError> {
        if !self.users.contains_key(&user_id) {
            let row = self
                .store
                .user(user_id)
                .ok_or(TradingError::UserNotFound(user_id))?;
            self.users.insert(
                user_id,
                Staged {
                    expected_version: Some(row.version),
                    row,
                },
            );
        }
        Ok(&mut self.users.get_mut(&user_id).expect("staged above").row)
    }

    fn position_mut(&mut self, user_id: UserId, market_id: MarketId) -> &mut Position {
        let key = (user_id, market_id);
        if !self.positions.contains_key(&key) {
            let staged = match self.store.position(user_id, market_id) {
                Some(row) => Staged {
                    expected_version: Some(row.version),
                    row,
                },
                None => Staged {
                    expected_version: None,
                    row: Position::new(user_id, market_id),
                },
            };
            self.positions.insert(key, staged);
        }
        &mut self.positions.get_mut(&key).expect("staged above").row
    }

    fn order_mut(&mut self, order_id: OrderId) -> Result<&mut Order, TradingError> {
        if !self.orders.contains_key(&order_id) {
            let row = self
                .store
                .order(order_id)
                .ok_or(TradingError::OrderNotFound(order_id))?;
            self.orders.insert(
                order_id,
                Staged {
                    expected_version: Some(row.version),
                    row,
                },
            );
        }
        Ok(&mut self.orders.get_mut(&order_id).expect("staged above").row)
    }

    fn market_mut(&mut self, market_id: MarketId) -> Result<&mut Market, TradingError> {
        if !self.markets.contains_key(&market_id) {
            let row = self
                .store
                .market(market_id)
                .ok_or(TradingError::MarketNotFound)?;
            self.markets.insert(
                market_id,
                Staged {
                    expected_version: Some(row.version),
                    row,
                },
            );
        }
        Ok(&mut self.markets.get_mut(&market_id).expect("staged above").row)
    }

    // ── Reads through the transaction ───────────────────────────────

    pub fn user(&mut self, user_id: UserId) -> Result<UserAccount, TradingError> {
        self.user_mut(user_id).map(|u| u.clone())
    }

    pub fn position(&mut self, user_id: UserId, market_id: MarketId) -> Position {
        self.position_mut(user_id, market_id).clone()
    }

    pub fn order(&mut self, order_id: OrderId) -> Result<Order, TradingError> {
        self.order_mut(order_id).map(|o| o.clone())
    }

    pub fn market(&mut self, market_id: MarketId) -> Result<Market, TradingError> {
        self.market_mut(market_id).map(|m| m.clone())
    }

    // ── Funds primitives ────────────────────────────────────────────

    /// Credit an external deposit.
    pub fn deposit(&mut self, user_id: UserId, amount: Cents) -> Result<(), TradingError> {
        let now = self.now;
        let account = self.user_mut(user_id)?;
        account.credit(amount);
        let balance_after = account.balance;
        self.entries.push(TransactionEntry::new(
            user_id,
            EntryKind::Deposit,
            amount,
            balance_after,
            None,
            None,
            None,
            format!("Deposited {}", amount),
            now,
        ));
        Ok(())
    }

    /// Withdraw unreserved funds.
    pub fn withdraw(&mut self, user_id: UserId, amount: Cents) -> Result<(), TradingError> {
        let now = self.now;
        let account = self.user_mut(user_id)?;
        if amount > account.available() {
            return Err(TradingError::InsufficientFunds {
                required: amount,
                available: account.available(),
            });
        }
        account.debit(amount);
        let balance_after = account.balance;
        self.entries.push(TransactionEntry::new(
            user_id,
            EntryKind::Withdrawal,
            -amount,
            balance_after,
            None,
            None,
            None,
            format!("Withdrew {}", amount),
            now,
        ));
        Ok(())
    }

    /// Earmark funds for an order. Fails with `INSUFFICIENT_FUNDS` if the
    /// available balance is short; nothing is staged on failure.
    pub fn reserve_funds(
        &mut self,
        user_id: UserId,
        amount: Cents,
        refs: EntryRefs,
        description: impl Into<String>,
    ) -> Result<(), TradingError> {
        let now = self.now;
        let account = self.user_mut(user_id)?;
        if amount > account.available() {
            return Err(TradingError::InsufficientFunds {
                required: amount,
                available: account.available(),
            });
        }
        account.reserve(amount);
        let balance_after = account.balance;
        // Reservations are not balance changes; logged with amount zero.
        self.entries.push(TransactionEntry::new(
            user_id,
            EntryKind::OrderReserve,
            Cents::ZERO,
            balance_after,
            refs.market,
            refs.order,
            refs.trade,
            description,
            now,
        ));
        Ok(())
    }

    /// Return earmarked funds to the available pool.
    pub fn release_funds(
        &mut self,
        user_id: UserId,
        amount: Cents,
        refs: EntryRefs,
        description: impl Into<String>,
    ) -> Result<(), TradingError> {
        if amount.is_zero() {
            return Ok(());
        }
        let now = self.now;
        let account = self.user_mut(user_id)?;
        if amount > account.reserved_balance {
            return Err(TradingError::InvariantViolation(format!(
                "release {} exceeds reservation {}",
                amount, account.reserved_balance
            )));
        }
        account.release(amount);
        let balance_after = account.balance;
        self.entries.push(TransactionEntry::new(
            user_id,
            EntryKind::OrderRelease,
            Cents::ZERO,
            balance_after,
            refs.market,
            refs.order,
            refs.trade,
            description,
            now,
        ));
        Ok(())
    }

    /// Spend earmarked funds; balance and reservation both shrink.
    pub fn consume_funds(
        &mut self,
        user_id: UserId,
        amount: Cents,
        kind: EntryKind,
        refs: EntryRefs,
        description: impl Into<String>,
    ) -> Result<(), TradingError> {
        let now = self.now;
        let account = self.user_mut(user_id)?;
        if amount > account.reserved_balance {
            return Err(TradingError::InvariantViolation(format!(
                "consume {} exceeds reservation {}",
                amount, account.reserved_balance
            )));
        }
        account.consume(amount);
        let balance_after = account.balance;
        self.entries.push(TransactionEntry::new(
            user_id,
            kind,
            -amount,
            balance_after,
            refs.market,
            refs.order,
            refs.trade,
            description,
            now,
        ));
        Ok(())
    }

    /// Credit funds to the available pool.
    pub fn credit_funds(
        &mut self,
        user_id: UserId,
        amount: Cents,
        kind: EntryKind,
        refs: EntryRefs,
        description: impl Into<String>,
    ) -> Result<(), TradingError> {
        let now = self.now;
        let account = self.user_mut(user_id)?;
        account.credit(amount);
        let balance_after = account.balance;
        self.entries.push(TransactionEntry::new(
            user_id,
            kind,
            amount,
            balance_after,
            refs.market,
            refs.order,
            refs.trade,
            description,
            now,
        ));
        Ok(())
    }

    // ── Share primitives ────────────────────────────────────────────

    /// Earmark shares for a sell order. Fails with `INSUFFICIENT_POSITION`
    /// if the unreserved holding is short.
    pub fn reserve_shares(
        &mut self,
        user_id: UserId,
        market_id: MarketId,
        contract: Contract,
        quantity: Quantity,
        refs: EntryRefs,
        description: impl Into<String>,
    ) -> Result<(), TradingError> {
        let now = self.now;
        let balance_after = self.user_mut(user_id)?.balance;
        let position = self.position_mut(user_id, market_id);
        if quantity.get() > position.available(contract) {
            return Err(TradingError::InsufficientPosition {
                contract,
                required: quantity.get(),
                available: position.available(contract),
            });
        }
        position.reserve(contract, quantity);
        self.entries.push(TransactionEntry::new(
            user_id,
            EntryKind::OrderReserve,
            Cents::ZERO,
            balance_after,
            Some(market_id),
            refs.order,
            refs.trade,
            description,
            now,
        ));
        Ok(())
    }

    /// Return earmarked shares to the available pool.
    pub fn release_shares(
        &mut self,
        user_id: UserId,
        market_id: MarketId,
        contract: Contract,
        quantity: Quantity,
        refs: EntryRefs,
        description: impl Into<String>,
    ) -> Result<(), TradingError> {
        if quantity.is_zero() {
            return Ok(());
        }
        let now = self.now;
        let balance_after = self.user_mut(user_id)?.balance;
        let position = self.position_mut(user_id, market_id);
        if quantity.get() > position.reserved(contract) {
            return Err(TradingError::InvariantViolation(format!(
                "release of {} {} shares exceeds reservation {}",
                quantity,
                contract,
                position.reserved(contract)
            )));
        }
        position.release(contract, quantity);
        self.entries.push(TransactionEntry::new(
            user_id,
            EntryKind::OrderRelease,
            Cents::ZERO,
            balance_after,
            Some(market_id),
            refs.order,
            refs.trade,
            description,
            now,
        ));
        Ok(())
    }

    /// Destroy reserved shares (sell fill), realizing P&L against the
    /// retired cost basis. The money side is ledgered separately.
    pub fn consume_shares_reserved(
        &mut self,
        user_id: UserId,
        market_id: MarketId,
        contract: Contract,
        quantity: Quantity,
        proceeds: Cents,
    ) -> Result<(), TradingError> {
        let position = self.position_mut(user_id, market_id);
        if quantity.get() > position.reserved(contract) {
            return Err(TradingError::InvariantViolation(format!(
                "fill of {} {} shares exceeds reservation {}",
                quantity,
                contract,
                position.reserved(contract)
            )));
        }
        position.consume_reserved(contract, quantity, proceeds);
        Ok(())
    }

    /// Destroy unreserved shares (redeem, settlement), realizing P&L.
    pub fn consume_shares_available(
        &mut self,
        user_id: UserId,
        market_id: MarketId,
        contract: Contract,
        quantity: Quantity,
        proceeds: Cents,
    ) -> Result<(), TradingError> {
        let position = self.position_mut(user_id, market_id);
        if quantity.get() > position.available(contract) {
            return Err(TradingError::InsufficientPosition {
                contract,
                required: quantity.get(),
                available: position.available(contract),
            });
        }
        position.consume_available(contract, quantity, proceeds);
        Ok(())
    }

    /// Credit shares acquired at the given total cost (buy fill, mint).
    pub fn credit_shares(
        &mut self,
        user_id: UserId,
        market_id: MarketId,
        contract: Contract,
        quantity: Quantity,
        cost: Cents,
    ) -> Result<(), TradingError> {
        self.position_mut(user_id, market_id)
            .credit(contract, quantity, cost);
        Ok(())
    }

    // ── Order / trade / market staging ──────────────────────────────

    /// Stage a newly accepted order.
    pub fn put_order(&mut self, order: Order) {
        self.orders.insert(
            order.order_id,
            Staged {
                expected_version: None,
                row: order,
            },
        );
    }

    /// Apply a fill to an order, returning the updated row.
    pub fn fill_order(
        &mut self,
        order_id: OrderId,
        quantity: Quantity,
    ) -> Result<Order, TradingError> {
        let order = self.order_mut(order_id)?;
        if quantity > order.remaining() {
            return Err(TradingError::InvariantViolation(format!(
                "fill {} exceeds remaining {} on order {}",
                quantity,
                order.remaining(),
                order_id
            )));
        }
        order.add_fill(quantity);
        Ok(order.clone())
    }

    /// Mark an order cancelled, returning the updated row.
    pub fn cancel_order(&mut self, order_id: OrderId) -> Result<Order, TradingError> {
        let order = self.order_mut(order_id)?;
        if order.status.is_terminal() {
            return Err(TradingError::OrderNotCancellable {
                status: order.status,
            });
        }
        order.cancel();
        Ok(order.clone())
    }

    /// Assign the matcher's monotonic book sequence to an order.
    pub fn set_book_seq(&mut self, order_id: OrderId, book_seq: u64) -> Result<(), TradingError> {
        self.order_mut(order_id)?.book_seq = book_seq;
        Ok(())
    }

    /// Append an immutable trade record.
    pub fn insert_trade(&mut self, trade: Trade) {
        self.trades.push(trade);
    }

    /// Mutate the market row in place.
    pub fn update_market(
        &mut self,
        market_id: MarketId,
        f: impl FnOnce(&mut Market),
    ) -> Result<(), TradingError> {
        f(self.market_mut(market_id)?);
        Ok(())
    }

    // ── Commit ──────────────────────────────────────────────────────

    /// Verify row versions and apply every staged mutation, or none.
    fn commit(self) -> Result<Vec<TransactionEntry>, CommitError> {
        let store = self.store;
        let _gate = store.commit_gate.lock().expect("commit gate poisoned");

        // Verify all versions first so nothing is applied on conflict.
        for (id, staged) in &self.users {
            let current = store.users.get(id).map(|r| r.version);
            if current != staged.expected_version {
                return Err(CommitError::Conflict {
                    row: format!("user {}", id),
                });
            }
        }
        for (key, staged) in &self.positions {
            let current = store.positions.get(key).map(|r| r.version);
            if current != staged.expected_version {
                return Err(CommitError::Conflict {
                    row: format!("position ({}, {})", key.0, key.1),
                });
            }
        }
        for (id, staged) in &self.orders {
            let current = store.orders.get(id).map(|r| r.version);
            if current != staged.expected_version {
                return Err(CommitError::Conflict {
                    row: format!("order {}", id),
                });
            }
        }
        for (id, staged) in &self.markets {
            let current = store.markets.get(id).map(|r| r.version);
            if current != staged.expected_version {
                return Err(CommitError::Conflict {
                    row: format!("market {}", id),
                });
            }
        }

        for (id, mut staged) in self.users {
            staged.row.version = staged.expected_version.map_or(0, |v| v + 1);
            store.users.insert(id, staged.row);
        }
        for (key, mut staged) in self.positions {
            staged.row.version = staged.expected_version.map_or(0, |v| v + 1);
            store.positions.insert(key, staged.row);
        }
        for (id, mut staged) in self.orders {
            staged.row.version = staged.expected_version.map_or(0, |v| v + 1);
            store.orders.insert(id, staged.row);
        }
        for (id, mut staged) in self.markets {
            staged.row.version = staged.expected_version.map_or(0, |v| v + 1);
            store.markets.insert(id, staged.row);
        }

        if !self.trades.is_empty() {
            store
                .trades
                .write()
                .expect("trade log poisoned")
                .extend(self.trades);
        }
        let committed = self.entries;
        if !committed.is_empty() {
            store
                .entries
                .write()
                .expect("entry log poisoned")
                .extend(committed.iter().cloned());
        }
        Ok(committed)
    }
}

/// The ledger facade: opens transactions against the store and optionally
/// mirrors committed entries into a durable journal.
pub struct Ledger {
    store: Arc<Store>,
    journal: Option<Mutex<JournalWriter>>,
}

impl Ledger {
    pub fn new(store: Arc<Store>) -> Self {
        Self {
            store,
            journal: None,
        }
    }

    /// Attach a durable journal; committed entries are appended to it.
    pub fn with_journal(store: Arc<Store>, journal: JournalWriter) -> Self {
        Self {
            store,
            journal: Some(Mutex::new(journal)),
        }
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    /// Run one atomic engine event, retrying bounded version conflicts.
    ///
    /// The closure may run more than once; it must derive everything from
    /// the transaction it is given. A business error aborts with nothing
    /// applied.
    pub fn with_txn<T>(
        &self,
        now: i64,
        mut f: impl FnMut(&mut Txn<'_>) -> Result<T, TradingError>,
    ) -> Result<T, TradingError> {
        for attempt in 0..MAX_COMMIT_ATTEMPTS {
            let mut txn = Txn::new(&self.store, now);
            let out = f(&mut txn)?;
            // The journal lock is taken before the commit gate so journal
            // order always equals commit order.
            let mut journal = self
                .journal
                .as_ref()
                .map(|j| j.lock().expect("journal poisoned"));
            match txn.commit() {
                Ok(entries) => {
                    if let Some(journal) = journal.as_mut() {
                        for entry in &entries {
                            if let Err(err) = journal.append(entry) {
                                tracing::warn!(%err, "failed to journal ledger entry");
                            }
                        }
                    }
                    return Ok(out);
                }
                Err(CommitError::Conflict { row }) => {
                    drop(journal);
                    tracing::debug!(attempt, %row, "ledger commit conflict, retrying");
                    std::thread::yield_now();
                }
            }
        }
        // Contention this persistent means something is broken, not busy.
        Err(TradingError::InvariantViolation(
            "ledger commit conflict persisted past retry bound".into(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> (Arc<Store>, Ledger, UserId, MarketId) {
        let store = Arc::new(Store::new());
        let ledger = Ledger::new(store.clone());
        let user = store.create_user(0).user_id;
        let market = store.create_market("m", 0).market_id;
        (store, ledger, user, market)
    }

    #[test]
    fn test_deposit_and_reserve() {
        let (store, ledger, user, _) = setup();

        ledger
            .with_txn(1, |txn| txn.deposit(user, Cents::new(10_000)))
            .unwrap();
        ledger
            .with_txn(2, |txn| {
                txn.reserve_funds(user, Cents::new(600), EntryRefs::none(), "reserve")
            })
            .unwrap();

        let account = store.user(user).unwrap();
        assert_eq!(account.balance, Cents::new(10_000));
        assert_eq!(account.reserved_balance, Cents::new(600));
        assert_eq!(account.available(), Cents::new(9_400));

        let entries = store.entries_for_user(user);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[1].kind, EntryKind::OrderReserve);
        assert!(entries[1].amount.is_zero());
    }

    #[test]
    fn test_insufficient_funds_stages_nothing() {
        let (store, ledger, user, _) = setup();

        ledger
            .with_txn(1, |txn| txn.deposit(user, Cents::new(100)))
            .unwrap();

        let err = ledger
            .with_txn(2, |txn| {
                // Deposit inside the same txn, then over-reserve: the whole
                // event must vanish.
                txn.deposit(user, Cents::new(50))?;
                txn.reserve_funds(user, Cents::new(1_000), EntryRefs::none(), "reserve")
            })
            .unwrap_err();

        assert_eq!(err.code(), "INSUFFICIENT_FUNDS");
        let account = store.user(user).unwrap();
        assert_eq!(account.balance, Cents::new(100));
        assert_eq!(store.entries_for_user(user).len(), 1);
    }

    #[test]
    fn test_share_reservation_and_fill() {
        let (store, ledger, user, market) = setup();

        ledger
            .with_txn(1, |txn| {
                txn.credit_shares(user, market, Contract::Yes, Quantity::new(10), Cents::new(500))
            })
            .unwrap();
        ledger
            .with_txn(2, |txn| {
                txn.reserve_shares(
                    user,
                    market,
                    Contract::Yes,
                    Quantity::new(10),
                    EntryRefs::none(),
                    "reserve shares",
                )
            })
            .unwrap();
        ledger
            .with_txn(3, |txn| {
                txn.consume_shares_reserved(
                    user,
                    market,
                    Contract::Yes,
                    Quantity::new(10),
                    Cents::new(600),
                )
            })
            .unwrap();

        let position = store.position(user, market).unwrap();
        assert_eq!(position.yes_quantity, 0);
        assert_eq!(position.realized_pnl, Cents::new(100));
    }

    #[test]
    fn test_insufficient_position() {
        let (_, ledger, user, market) = setup();

        let err = ledger
            .with_txn(1, |txn| {
                txn.reserve_shares(
                    user,
                    market,
                    Contract::No,
                    Quantity::new(1),
                    EntryRefs::none(),
                    "reserve",
                )
            })
            .unwrap_err();
        assert_eq!(err.code(), "INSUFFICIENT_POSITION");
    }

    #[test]
    fn test_order_staging_and_fill() {
        let (store, ledger, user, market) = setup();

        let order = Order::new(
            user,
            market,
            Side::Buy,
            Contract::Yes,
            OrderKind::Limit(Price::new(60)),
            Quantity::new(10),
            1,
        );
        let order_id = order.order_id;

        ledger
            .with_txn(1, |txn| {
                txn.put_order(order.clone());
                Ok(())
            })
            .unwrap();
        ledger
            .with_txn(2, |txn| txn.fill_order(order_id, Quantity::new(4)))
            .unwrap();

        let row = store.order(order_id).unwrap();
        assert_eq!(row.status, OrderStatus::PartiallyFilled);
        assert_eq!(row.remaining(), Quantity::new(6));
    }

    #[test]
    fn test_cancel_terminal_order_rejected() {
        let (_, ledger, user, market) = setup();

        let mut order = Order::new(
            user,
            market,
            Side::Buy,
            Contract::Yes,
            OrderKind::Limit(Price::new(60)),
            Quantity::new(1),
            1,
        );
        order.add_fill(Quantity::new(1));
        let order_id = order.order_id;

        ledger
            .with_txn(1, |txn| {
                txn.put_order(order.clone());
                Ok(())
            })
            .unwrap();

        let err = ledger
            .with_txn(2, |txn| txn.cancel_order(order_id))
            .unwrap_err();
        assert_eq!(err.code(), "ORDER_NOT_CANCELLABLE");
    }

    #[test]
    fn test_concurrent_reservations_serialize() {
        let (store, ledger, user, _) = setup();
        ledger
            .with_txn(0, |txn| txn.deposit(user, Cents::new(10_000)))
            .unwrap();

        let ledger = Arc::new(ledger);
        let mut handles = Vec::new();
        for _ in 0..8 {
            let ledger = ledger.clone();
            handles.push(std::thread::spawn(move || {
                ledger.with_txn(1, |txn| {
                    txn.reserve_funds(user, Cents::new(1_000), EntryRefs::none(), "r")
                })
            }));
        }
        for handle in handles {
            handle.join().unwrap().unwrap();
        }

        let account = store.user(user).unwrap();
        assert_eq!(account.reserved_balance, Cents::new(8_000));
        assert!(account.check_invariant());
    }
}
