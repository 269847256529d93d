//! End-to-end scenarios through the engine service
//!
//! Each test drives the public handle the way request handlers would:
//! place/cancel orders, mint/redeem, settle, then read committed state
//! after the matcher drains.

use ledger::{Ledger, Store};
use matching_engine::{spawn_engine, EngineConfig, EngineHandle};
use std::sync::Arc;
use types::prelude::*;

struct Exchange {
    store: Arc<Store>,
    ledger: Arc<Ledger>,
    handle: EngineHandle,
    market: MarketId,
}

async fn exchange() -> Exchange {
    let store = Arc::new(Store::new());
    let ledger = Arc::new(Ledger::new(store.clone()));
    let (handle, _join) = spawn_engine(ledger.clone(), EngineConfig::default());
    let market = store.create_market("Will it rain tomorrow?", 0).market_id;
    Exchange {
        store,
        ledger,
        handle,
        market,
    }
}

impl Exchange {
    fn user_with_funds(&self, cents: i64) -> UserId {
        let user = self.store.create_user(0).user_id;
        self.ledger
            .with_txn(0, |txn| txn.deposit(user, Cents::new(cents)))
            .unwrap();
        user
    }

    fn grant_shares(&self, user: UserId, contract: Contract, quantity: u64, basis: i64) {
        self.ledger
            .with_txn(0, |txn| {
                txn.credit_shares(
                    user,
                    self.market,
                    contract,
                    Quantity::new(quantity),
                    Cents::new(basis),
                )
            })
            .unwrap();
    }

    fn balance(&self, user: UserId) -> Cents {
        self.store.user(user).unwrap().balance
    }

    fn position(&self, user: UserId) -> Position {
        self.store
            .position(user, self.market)
            .unwrap_or_else(|| Position::new(user, self.market))
    }
}

#[tokio::test]
async fn s1_simple_direct_fill() {
    let ex = exchange().await;
    let a = ex.user_with_funds(10_000);
    let b = ex.user_with_funds(0);
    ex.grant_shares(b, Contract::Yes, 10, 500);

    ex.handle
        .place_order(a, ex.market, Side::Buy, Contract::Yes, Some(60), 10)
        .await
        .unwrap();
    ex.handle
        .place_order(b, ex.market, Side::Sell, Contract::Yes, Some(55), 10)
        .await
        .unwrap();
    ex.handle.drain().await.unwrap();

    let trades = ex.store.trades_for_market(ex.market, 10);
    assert_eq!(trades.len(), 1);
    assert_eq!(trades[0].trade_type, TradeType::Direct);
    // Execution at the resting bid's price, not the aggressor's 55.
    assert_eq!(trades[0].price_cents, 60);
    assert_eq!(trades[0].quantity, Quantity::new(10));

    assert_eq!(ex.balance(a), Cents::new(9_400));
    let pos_a = ex.position(a);
    assert_eq!(pos_a.yes_quantity, 10);
    assert_eq!(pos_a.yes_cost_basis, Cents::new(600));

    assert_eq!(ex.balance(b), Cents::new(600));
    assert_eq!(ex.position(b).yes_quantity, 0);
}

#[tokio::test]
async fn s2_partial_fill_then_rest() {
    let ex = exchange().await;
    let a = ex.user_with_funds(10_000);
    let b = ex.user_with_funds(0);
    ex.grant_shares(b, Contract::Yes, 4, 200);

    let buy = ex
        .handle
        .place_order(a, ex.market, Side::Buy, Contract::Yes, Some(50), 10)
        .await
        .unwrap();
    let sell = ex
        .handle
        .place_order(b, ex.market, Side::Sell, Contract::Yes, Some(50), 4)
        .await
        .unwrap();
    ex.handle.drain().await.unwrap();

    let trades = ex.store.trades_for_market(ex.market, 10);
    assert_eq!(trades.len(), 1);
    assert_eq!(trades[0].quantity, Quantity::new(4));
    assert_eq!(trades[0].price_cents, 50);

    let buy_row = ex.store.order(buy.order_id).unwrap();
    assert_eq!(buy_row.status, OrderStatus::PartiallyFilled);
    assert_eq!(buy_row.filled_quantity, Quantity::new(4));
    // $3.00 still reserved for the remaining 6 contracts.
    assert_eq!(
        ex.store.user(a).unwrap().reserved_balance,
        Cents::new(300)
    );

    let sell_row = ex.store.order(sell.order_id).unwrap();
    assert_eq!(sell_row.status, OrderStatus::Filled);
}

#[tokio::test]
async fn s3_mint_match() {
    let ex = exchange().await;
    let a = ex.user_with_funds(10_000);
    let b = ex.user_with_funds(10_000);

    // A's YES bid rests; B's NO bid crosses it (70 + 35 >= 100) and mints.
    ex.handle
        .place_order(a, ex.market, Side::Buy, Contract::Yes, Some(70), 5)
        .await
        .unwrap();
    ex.handle
        .place_order(b, ex.market, Side::Buy, Contract::No, Some(35), 5)
        .await
        .unwrap();
    ex.handle.drain().await.unwrap();

    let trades = ex.store.trades_for_market(ex.market, 10);
    assert_eq!(trades.len(), 1);
    assert_eq!(trades[0].trade_type, TradeType::Mint);
    assert_eq!(trades[0].price_cents, 100);
    assert!(trades[0].yes_price.get() + trades[0].no_price.get() >= 100);

    // The resting leg pays its quote; the aggressor pays the complement:
    // A pays 5 x 70 = 350, B pays 5 x (100 - 70) = 150. The pair sums to
    // exactly $1.00 per set, so balances drop by $5.00 in total.
    assert_eq!(ex.balance(a), Cents::new(10_000 - 350));
    assert_eq!(ex.balance(b), Cents::new(10_000 - 150));

    let pos_a = ex.position(a);
    assert_eq!(pos_a.yes_quantity, 5);
    assert_eq!(pos_a.yes_cost_basis, Cents::new(350));
    let pos_b = ex.position(b);
    assert_eq!(pos_b.no_quantity, 5);
    assert_eq!(pos_b.no_cost_basis, Cents::new(150));

    // No reservations left behind.
    assert_eq!(ex.store.user(a).unwrap().reserved_balance, Cents::ZERO);
    assert_eq!(ex.store.user(b).unwrap().reserved_balance, Cents::ZERO);

    // The system minted 5 pairs.
    assert_eq!(ex.store.market(ex.market).unwrap().shares_outstanding, 5);
}

#[tokio::test]
async fn s4_merge_match() {
    let ex = exchange().await;
    let a = ex.user_with_funds(0);
    let b = ex.user_with_funds(0);
    ex.grant_shares(a, Contract::Yes, 10, 500);
    ex.grant_shares(b, Contract::No, 10, 400);

    // A's YES ask rests; B's NO ask crosses it (60 + 30 <= 100) and merges.
    ex.handle
        .place_order(a, ex.market, Side::Sell, Contract::Yes, Some(60), 10)
        .await
        .unwrap();
    ex.handle
        .place_order(b, ex.market, Side::Sell, Contract::No, Some(30), 10)
        .await
        .unwrap();
    ex.handle.drain().await.unwrap();

    let trades = ex.store.trades_for_market(ex.market, 10);
    assert_eq!(trades.len(), 1);
    assert_eq!(trades[0].trade_type, TradeType::Merge);
    assert_eq!(trades[0].price_cents, 0);
    assert!(trades[0].yes_price.get() + trades[0].no_price.get() <= 100);

    // The resting leg receives its quote; the aggressor receives the
    // complement: A gets 10 x 60 = 600, B gets 10 x (100 - 60) = 400.
    // Every merged pair pays out exactly $1.00.
    assert_eq!(ex.balance(a), Cents::new(600));
    assert_eq!(ex.balance(b), Cents::new(400));

    assert_eq!(ex.position(a).yes_quantity, 0);
    assert_eq!(ex.position(b).no_quantity, 0);
}

#[tokio::test]
async fn s5_self_trade_skip() {
    let ex = exchange().await;
    let a = ex.user_with_funds(10_000);
    ex.grant_shares(a, Contract::Yes, 5, 200);

    let sell = ex
        .handle
        .place_order(a, ex.market, Side::Sell, Contract::Yes, Some(40), 5)
        .await
        .unwrap();
    let buy = ex
        .handle
        .place_order(a, ex.market, Side::Buy, Contract::Yes, Some(40), 5)
        .await
        .unwrap();
    ex.handle.drain().await.unwrap();

    assert!(ex.store.trades_for_market(ex.market, 10).is_empty());
    assert_eq!(
        ex.store.order(sell.order_id).unwrap().status,
        OrderStatus::Open
    );
    assert_eq!(
        ex.store.order(buy.order_id).unwrap().status,
        OrderStatus::Open
    );
}

#[tokio::test]
async fn s6_settlement() {
    let ex = exchange().await;
    let a = ex.user_with_funds(0);
    ex.grant_shares(a, Contract::Yes, 10, 500);
    ex.grant_shares(a, Contract::No, 2, 100);

    // An open order that settlement must cancel with a refund.
    let b = ex.user_with_funds(10_000);
    let open = ex
        .handle
        .place_order(b, ex.market, Side::Buy, Contract::Yes, Some(40), 5)
        .await
        .unwrap();
    ex.handle.drain().await.unwrap();

    let stats = ex
        .handle
        .settle_market(ex.market, Resolution::Yes)
        .await
        .unwrap();

    assert_eq!(stats.total_payout, Cents::new(1_000));
    assert_eq!(stats.orders_cancelled, 1);

    // 10 winning YES at $1 each; the NO side is wiped.
    assert_eq!(ex.balance(a), Cents::new(1_000));
    let position = ex.position(a);
    assert_eq!(position.yes_quantity, 0);
    assert_eq!(position.no_quantity, 0);
    assert_eq!(position.realized_pnl, Cents::new(1_000 - 500 - 100));

    assert_eq!(
        ex.store.order(open.order_id).unwrap().status,
        OrderStatus::Cancelled
    );
    assert_eq!(ex.store.user(b).unwrap().reserved_balance, Cents::ZERO);

    // Settled markets accept nothing further.
    let err = ex
        .handle
        .place_order(b, ex.market, Side::Buy, Contract::Yes, Some(40), 1)
        .await
        .unwrap_err();
    assert_eq!(err.code(), "MARKET_NOT_ACTIVE");
    let err = ex.handle.mint_set(b, ex.market, 1).await.unwrap_err();
    assert_eq!(err.code(), "MARKET_NOT_ACTIVE");
    let err = ex
        .handle
        .settle_market(ex.market, Resolution::No)
        .await
        .unwrap_err();
    assert_eq!(err.code(), "MARKET_NOT_ACTIVE");
}

#[tokio::test]
async fn mint_then_trade_then_redeem() {
    let ex = exchange().await;
    let a = ex.user_with_funds(2_000);
    let b = ex.user_with_funds(2_000);

    // A mints 10 sets, sells 10 YES to B directly, then redeems nothing;
    // B ends up long YES, A long NO.
    ex.handle.mint_set(a, ex.market, 10).await.unwrap();
    ex.handle
        .place_order(b, ex.market, Side::Buy, Contract::Yes, Some(55), 10)
        .await
        .unwrap();
    ex.handle
        .place_order(a, ex.market, Side::Sell, Contract::Yes, Some(55), 10)
        .await
        .unwrap();
    ex.handle.drain().await.unwrap();

    // A: -1000 mint, +550 sale.
    assert_eq!(ex.balance(a), Cents::new(2_000 - 1_000 + 550));
    assert_eq!(ex.position(a).yes_quantity, 0);
    assert_eq!(ex.position(a).no_quantity, 10);
    assert_eq!(ex.position(b).yes_quantity, 10);

    // YES and NO counts still balance across users.
    let positions = ex.store.positions_for_market(ex.market);
    let yes: u64 = positions.iter().map(|p| p.yes_quantity).sum();
    let no: u64 = positions.iter().map(|p| p.no_quantity).sum();
    assert_eq!(yes, no);
}

#[tokio::test]
async fn market_order_cancel_is_rejected() {
    let ex = exchange().await;
    let a = ex.user_with_funds(10_000);

    let order = ex
        .handle
        .place_order(a, ex.market, Side::Buy, Contract::Yes, None, 5)
        .await
        .unwrap();
    let err = ex.handle.cancel_order(a, order.order_id).await.unwrap_err();
    assert_eq!(err.code(), "ORDER_NOT_CANCELLABLE");
}

#[tokio::test]
async fn ledger_journal_mirrors_committed_entries() {
    let dir = tempfile::TempDir::new().unwrap();
    let store = Arc::new(Store::new());
    let journal = persistence::JournalWriter::open(persistence::JournalConfig::new(dir.path()))
        .unwrap();
    let ledger = Arc::new(Ledger::with_journal(store.clone(), journal));
    let (handle, _join) = spawn_engine(ledger.clone(), EngineConfig::default());
    let market = store.create_market("m", 0).market_id;

    let a = store.create_user(0).user_id;
    let b = store.create_user(0).user_id;
    ledger
        .with_txn(0, |txn| {
            txn.deposit(a, Cents::new(10_000))?;
            txn.deposit(b, Cents::new(10_000))
        })
        .unwrap();

    handle
        .place_order(a, market, Side::Buy, Contract::Yes, Some(60), 10)
        .await
        .unwrap();
    handle
        .place_order(b, market, Side::Buy, Contract::No, Some(40), 10)
        .await
        .unwrap();
    handle.drain().await.unwrap();

    let records = persistence::JournalReader::new(dir.path()).read_all().unwrap();
    assert_eq!(records.len(), store.all_entries().len());

    // Replaying the journal reproduces every user's balance exactly.
    let balances = persistence::JournalReader::replay_balances(&records).unwrap();
    assert_eq!(balances[&a], store.user(a).unwrap().balance);
    assert_eq!(balances[&b], store.user(b).unwrap().balance);
}

#[tokio::test]
async fn market_cancellation_refunds_cost_basis() {
    let ex = exchange().await;
    let a = ex.user_with_funds(1_000);
    ex.handle.mint_set(a, ex.market, 10).await.unwrap();

    let stats = ex.handle.cancel_market(ex.market).await.unwrap();
    assert_eq!(stats.total_refunded, Cents::new(1_000));
    assert_eq!(ex.balance(a), Cents::new(1_000));
    assert!(!ex.position(a).has_position());

    let market = ex.store.market(ex.market).unwrap();
    assert_eq!(market.status, MarketStatus::Cancelled);
    assert_eq!(market.resolution, None);
}
