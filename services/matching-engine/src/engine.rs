//! Matching engine core
//!
//! The single-writer coordinator: owns every market's in-memory book and
//! drives all fill accounting. Exactly one task calls the `process_*`
//! methods; intake and direct mint/redeem run on caller tasks and only
//! touch the ledger.
//!
//! For each incoming order the engine attempts match types in priority
//! order: direct first, then mint (incoming buys) or merge (incoming
//! sells) for the remainder. Limit remainders rest; market remainders are
//! cancelled with their reservation released.

use std::cmp;
use std::collections::HashMap;
use std::sync::Arc;

use ledger::{EntryRefs, Ledger};
use serde::{Deserialize, Serialize};
use types::prelude::*;

use crate::book::MarketBook;
use crate::events::{EngineEvent, EventSink};
use crate::matching::{crossing, executor};
use crate::recovery;
use crate::settlement::{self, CancellationStats, SettlementStats};

/// Result of a cancel request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CancelReceipt {
    pub order: Order,
    /// Funds returned to the available balance (zero for sell orders; the
    /// share reservation is released instead).
    pub refunded: Cents,
}

/// The single-writer matching engine.
pub struct Engine {
    ledger: Arc<Ledger>,
    books: HashMap<MarketId, MarketBook>,
    next_book_seq: u64,
    events: EventSink,
}

impl Engine {
    /// Create an engine over an empty book set.
    pub fn new(ledger: Arc<Ledger>, events: EventSink) -> Self {
        Self {
            ledger,
            books: HashMap::new(),
            next_book_seq: 1,
            events,
        }
    }

    /// Rebuild the in-memory books from persisted open orders. Open market
    /// orders found during recovery are cancelled with a refund; they never
    /// rest, so one being open means the process died mid-matching.
    pub fn recover(ledger: Arc<Ledger>, events: EventSink, now: i64) -> Self {
        let recovered = recovery::rebuild_books(ledger.store());
        let engine = Self {
            ledger,
            books: recovered.books,
            next_book_seq: recovered.next_book_seq,
            events,
        };
        for order in recovered.stranded {
            tracing::warn!(
                order_id = %order.order_id,
                "open market order found during recovery; cancelling with refund"
            );
            if let Err(err) =
                engine.release_remainder(&order, now, "Refunded market order during recovery")
            {
                tracing::error!(order_id = %order.order_id, %err, "recovery refund failed");
            }
        }
        engine
    }

    pub fn events(&self) -> &EventSink {
        &self.events
    }

    /// Match one newly accepted order. Returns the trades produced.
    pub fn process_new_order(
        &mut self,
        order_id: OrderId,
        now: i64,
    ) -> Result<Vec<Trade>, TradingError> {
        let ledger = self.ledger.clone();
        let store = ledger.store();
        let mut order = store
            .order(order_id)
            .ok_or(TradingError::OrderNotFound(order_id))?;
        // Cancelled before the matcher got to it.
        if !order.status.is_active() {
            return Ok(Vec::new());
        }
        let market_id = order.market_id;
        let mut trades = Vec::new();

        // (A) Direct match against the same contract's opposite side.
        while !order.remaining().is_zero() {
            let candidate = {
                let book = self.books.entry(market_id).or_default();
                let limit = order.limit_price();
                match order.side {
                    Side::Buy => book.asks(order.contract).best_counterparty(
                        |p| crossing::direct_crosses(Side::Buy, limit, p),
                        order.user_id,
                    ),
                    Side::Sell => book.bids(order.contract).best_counterparty(
                        |p| crossing::direct_crosses(Side::Sell, limit, p),
                        order.user_id,
                    ),
                }
            };
            let Some(resting) = candidate else { break };
            let quantity = cmp::min(order.remaining(), resting.remaining);
            let contract = order.contract;
            let (buy_id, sell_id) = match order.side {
                Side::Buy => (order.order_id, resting.order_id),
                Side::Sell => (resting.order_id, order.order_id),
            };

            let trade = ledger.with_txn(now, |txn| {
                executor::execute_direct(
                    txn,
                    market_id,
                    contract,
                    buy_id,
                    sell_id,
                    resting.price,
                    quantity,
                )
            })?;

            let book = self.books.get_mut(&market_id).expect("book created above");
            match order.side {
                Side::Buy => book
                    .asks_mut(contract)
                    .fill(resting.price, &resting.order_id, quantity),
                Side::Sell => book
                    .bids_mut(contract)
                    .fill(resting.price, &resting.order_id, quantity),
            };

            order = store
                .order(order_id)
                .ok_or(TradingError::OrderNotFound(order_id))?;
            self.events.emit(EngineEvent::TradeExecuted {
                trade: trade.clone(),
            });
            trades.push(trade);
        }

        // (B)/(C) Cross-book match for limit remainders: an incoming buy can
        // mint against the opposite contract's bids; an incoming sell can
        // merge against the opposite contract's asks. Market orders sweep
        // direct only.
        if let Some(limit) = order.limit_price() {
            while !order.remaining().is_zero() {
                let candidate = {
                    let book = self.books.entry(market_id).or_default();
                    match order.side {
                        Side::Buy => book.bids(order.contract.opposite()).best_counterparty(
                            |p| crossing::mint_crosses(limit, p),
                            order.user_id,
                        ),
                        Side::Sell => book.asks(order.contract.opposite()).best_counterparty(
                            |p| crossing::merge_crosses(limit, p),
                            order.user_id,
                        ),
                    }
                };
                let Some(resting) = candidate else { break };
                let quantity = cmp::min(order.remaining(), resting.remaining);
                let aggressor = order.contract;
                let side = order.side;
                let (yes_id, no_id) = match order.contract {
                    Contract::Yes => (order.order_id, resting.order_id),
                    Contract::No => (resting.order_id, order.order_id),
                };

                let trade = ledger.with_txn(now, |txn| match side {
                    Side::Buy => {
                        executor::execute_mint(txn, market_id, yes_id, no_id, aggressor, quantity)
                    }
                    Side::Sell => {
                        executor::execute_merge(txn, market_id, yes_id, no_id, aggressor, quantity)
                    }
                })?;

                let book = self.books.get_mut(&market_id).expect("book created above");
                match side {
                    Side::Buy => book
                        .bids_mut(aggressor.opposite())
                        .fill(resting.price, &resting.order_id, quantity),
                    Side::Sell => book
                        .asks_mut(aggressor.opposite())
                        .fill(resting.price, &resting.order_id, quantity),
                };

                order = store
                    .order(order_id)
                    .ok_or(TradingError::OrderNotFound(order_id))?;
                self.events.emit(EngineEvent::TradeExecuted {
                    trade: trade.clone(),
                });
                trades.push(trade);
            }
        }

        // Remainder: limit orders rest with the authoritative book sequence;
        // market orders are cancelled with a full refund of the remainder.
        if !order.remaining().is_zero() {
            match order.kind {
                OrderKind::Limit(_) => {
                    let seq = self.next_book_seq;
                    self.next_book_seq += 1;
                    ledger.with_txn(now, |txn| txn.set_book_seq(order_id, seq))?;
                    order.book_seq = seq;
                    self.books
                        .entry(market_id)
                        .or_default()
                        .insert_order(&order);
                }
                OrderKind::Market => {
                    let refunded = self.release_remainder(
                        &order,
                        now,
                        "Released remaining reservation from market order",
                    )?;
                    self.events
                        .emit(EngineEvent::OrderCancelled { order_id, refunded });
                }
            }
        }

        self.refresh_quotes(market_id, now)?;
        Ok(trades)
    }

    /// Cancel an order on the owner's behalf.
    ///
    /// Runs on the matcher so it serializes with fills: an order that was
    /// fully filled before this request is processed fails with
    /// `ORDER_NOT_CANCELLABLE`.
    pub fn process_cancel(
        &mut self,
        user_id: UserId,
        order_id: OrderId,
        now: i64,
    ) -> Result<CancelReceipt, TradingError> {
        let ledger = self.ledger.clone();
        let store = ledger.store();
        let order = store
            .order(order_id)
            .ok_or(TradingError::OrderNotFound(order_id))?;
        if order.user_id != user_id {
            // Not the owner's order as far as they can tell.
            return Err(TradingError::OrderNotFound(order_id));
        }
        if matches!(order.kind, OrderKind::Market) {
            // Market orders never rest; the only cancellable window is the
            // instant before the matcher dequeues them.
            return Err(TradingError::OrderNotCancellable {
                status: order.status,
            });
        }
        if order.status.is_terminal() {
            return Err(TradingError::OrderNotCancellable {
                status: order.status,
            });
        }

        if let Some(book) = self.books.get_mut(&order.market_id) {
            book.remove_order(&order);
        }
        let refunded =
            self.release_remainder(&order, now, "Released reservation from cancelled order")?;
        let order = store
            .order(order_id)
            .ok_or(TradingError::OrderNotFound(order_id))?;
        self.refresh_quotes(order.market_id, now)?;
        self.events
            .emit(EngineEvent::OrderCancelled { order_id, refunded });
        Ok(CancelReceipt { order, refunded })
    }

    /// Settle a market: cancel open orders, pay winners, wipe losers.
    pub fn process_settle(
        &mut self,
        market_id: MarketId,
        resolution: Resolution,
        now: i64,
    ) -> Result<SettlementStats, TradingError> {
        let stats = settlement::settle_market(&self.ledger, market_id, resolution, now)?;
        if let Some(book) = self.books.get_mut(&market_id) {
            book.clear();
        }
        self.events.emit(EngineEvent::MarketSettled {
            market_id,
            resolution,
            total_payout: stats.total_payout,
        });
        Ok(stats)
    }

    /// Administratively cancel a market: refund cost bases, cancel orders.
    pub fn process_cancel_market(
        &mut self,
        market_id: MarketId,
        now: i64,
    ) -> Result<CancellationStats, TradingError> {
        let stats = settlement::cancel_market(&self.ledger, market_id, now)?;
        if let Some(book) = self.books.get_mut(&market_id) {
            book.clear();
        }
        self.events.emit(EngineEvent::MarketCancelled {
            market_id,
            total_refunded: stats.total_refunded,
        });
        Ok(stats)
    }

    /// Cancel and refund an order after a matching failure. Best effort;
    /// errors are logged, not propagated.
    pub fn fail_order(&mut self, order_id: OrderId, now: i64) {
        let Some(order) = self.ledger.store().order(order_id) else {
            return;
        };
        if order.status.is_terminal() {
            return;
        }
        if let Some(book) = self.books.get_mut(&order.market_id) {
            book.remove_order(&order);
        }
        match self.release_remainder(&order, now, "Refunded after matching failure") {
            Ok(refunded) => self
                .events
                .emit(EngineEvent::OrderCancelled { order_id, refunded }),
            Err(err) => {
                tracing::error!(%order_id, %err, "failed to refund order after matching failure");
            }
        }
    }

    /// Release an active order's remaining reservation and cancel it.
    fn release_remainder(
        &self,
        order: &Order,
        now: i64,
        description: &str,
    ) -> Result<Cents, TradingError> {
        let order_id = order.order_id;
        self.ledger.with_txn(now, |txn| {
            let order = txn.order(order_id)?;
            let remaining = order.remaining();
            let refs = EntryRefs::order(order.market_id, order_id);
            let refunded = match order.side {
                Side::Buy => {
                    let amount = order
                        .reserve_price()
                        .expect("buy orders always have a reservation price")
                        .cost(remaining);
                    txn.release_funds(order.user_id, amount, refs, description)?;
                    amount
                }
                Side::Sell => {
                    txn.release_shares(
                        order.user_id,
                        order.market_id,
                        order.contract,
                        remaining,
                        refs,
                        description,
                    )?;
                    Cents::ZERO
                }
            };
            txn.cancel_order(order_id)?;
            Ok(refunded)
        })
    }

    /// Refresh the market row's cached best quotes from the book.
    fn refresh_quotes(&mut self, market_id: MarketId, now: i64) -> Result<(), TradingError> {
        let (yes_bid, yes_ask, no_bid, no_ask) = {
            let book = self.books.entry(market_id).or_default();
            (
                book.best_bid(Contract::Yes),
                book.best_ask(Contract::Yes),
                book.best_bid(Contract::No),
                book.best_ask(Contract::No),
            )
        };
        self.ledger.with_txn(now, |txn| {
            txn.update_market(market_id, |m| {
                m.set_quotes(Contract::Yes, yes_bid, yes_ask);
                m.set_quotes(Contract::No, no_bid, no_ask);
            })
        })
    }

    #[cfg(test)]
    pub(crate) fn book(&self, market_id: MarketId) -> Option<&MarketBook> {
        self.books.get(&market_id)
    }
}
