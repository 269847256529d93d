//! Crash recovery: rebuild in-memory books from persisted orders
//!
//! Every matching event commits atomically, so no partial fill survives a
//! crash; the books can be reconstructed exactly from OPEN and
//! PARTIALLY_FILLED limit orders in (book_seq, created_at) order.

use std::collections::HashMap;

use ledger::Store;
use types::prelude::*;

use crate::book::MarketBook;

/// Books and matcher state reconstructed from the store.
pub struct RecoveredState {
    pub books: HashMap<MarketId, MarketBook>,
    /// Next book sequence to hand out (one past the highest persisted).
    pub next_book_seq: u64,
    /// Open market orders found in the store. They never rest, so their
    /// presence means the process died mid-matching; the caller cancels
    /// them with a refund.
    pub stranded: Vec<Order>,
}

/// Rebuild every active market's four queues from open orders.
pub fn rebuild_books(store: &Store) -> RecoveredState {
    let mut books = HashMap::new();
    let mut next_book_seq = 1;
    let mut stranded = Vec::new();
    let mut restored = 0usize;

    for market in store.all_markets() {
        if !market.is_trading_active() {
            continue;
        }
        let mut book = MarketBook::new();
        for order in store.open_orders(market.market_id) {
            next_book_seq = next_book_seq.max(order.book_seq + 1);
            match order.kind {
                OrderKind::Limit(_) => {
                    book.insert_order(&order);
                    restored += 1;
                }
                OrderKind::Market => stranded.push(order),
            }
        }
        books.insert(market.market_id, book);
    }

    tracing::info!(
        markets = books.len(),
        orders = restored,
        stranded = stranded.len(),
        "order books rebuilt from store"
    );
    RecoveredState {
        books,
        next_book_seq,
        stranded,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::intake;
    use crate::engine::Engine;
    use crate::events::EventSink;
    use ledger::Ledger;
    use std::sync::Arc;

    #[test]
    fn test_rebuild_restores_priority_order() {
        let store = Arc::new(Store::new());
        let ledger = Arc::new(Ledger::new(store.clone()));
        let market = store.create_market("m", 0).market_id;
        let mut engine = Engine::new(ledger.clone(), EventSink::new(16));

        let mut users = Vec::new();
        for price in [50u32, 55, 50] {
            let user = store.create_user(0).user_id;
            ledger
                .with_txn(0, |txn| txn.deposit(user, Cents::new(10_000)))
                .unwrap();
            let order = intake::accept_order(
                &ledger,
                user,
                market,
                Side::Buy,
                Contract::Yes,
                Some(price),
                5,
                1,
            )
            .unwrap();
            engine.process_new_order(order.order_id, 2).unwrap();
            users.push(user);
        }

        // A fresh engine rebuilt from the store must match the same order
        // the original would have: best price first, then acceptance order.
        let recovered = rebuild_books(&store);
        let book = &recovered.books[&market];
        assert_eq!(book.best_bid(Contract::Yes), Some(Price::new(55)));
        assert!(recovered.next_book_seq > 3);

        let seller = store.create_user(0).user_id;
        ledger
            .with_txn(0, |txn| {
                txn.credit_shares(
                    seller,
                    market,
                    Contract::Yes,
                    Quantity::new(15),
                    Cents::new(750),
                )
            })
            .unwrap();

        let mut engine = Engine::recover(ledger.clone(), EventSink::new(16), 3);
        let order = intake::accept_order(
            &ledger,
            seller,
            market,
            Side::Sell,
            Contract::Yes,
            Some(50),
            15,
            3,
        )
        .unwrap();
        let trades = engine.process_new_order(order.order_id, 4).unwrap();

        assert_eq!(trades.len(), 3);
        assert_eq!(trades[0].buyer_id, users[1], "best price first");
        assert_eq!(trades[1].buyer_id, users[0], "then earliest at 50");
        assert_eq!(trades[2].buyer_id, users[2]);
    }

    #[test]
    fn test_recover_cancels_stranded_market_orders() {
        let store = Arc::new(Store::new());
        let ledger = Arc::new(Ledger::new(store.clone()));
        let market = store.create_market("m", 0).market_id;
        let user = store.create_user(0).user_id;
        ledger
            .with_txn(0, |txn| txn.deposit(user, Cents::new(1_000)))
            .unwrap();

        // Accepted but never processed: the crash window.
        let order = intake::accept_order(
            &ledger,
            user,
            market,
            Side::Buy,
            Contract::Yes,
            None,
            10,
            1,
        )
        .unwrap();
        assert_eq!(store.user(user).unwrap().reserved_balance, Cents::new(990));

        let _engine = Engine::recover(ledger.clone(), EventSink::new(16), 2);

        assert_eq!(
            store.order(order.order_id).unwrap().status,
            OrderStatus::Cancelled
        );
        assert_eq!(store.user(user).unwrap().reserved_balance, Cents::ZERO);
    }
}
