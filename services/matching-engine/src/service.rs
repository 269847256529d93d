//! Engine service: intake handles plus the single matcher task
//!
//! Request handlers call [`EngineHandle`] from any task. Order placement
//! returns as soon as the reservation commits (acceptance), without waiting
//! for matching; cancels and settlements round-trip through the matcher
//! queue so they serialize with fills. Direct mint/redeem never touch the
//! book and run on the caller's task.

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use ledger::{Ledger, Store};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use types::prelude::*;

use crate::engine::{CancelReceipt, Engine};
use crate::events::{EngineEvent, EventSink};
use crate::intake;
use crate::mint_redeem::{self, MintReceipt, RedeemReceipt};
use crate::settlement::{CancellationStats, SettlementStats};

/// Engine service configuration.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Bound of the matcher intake queue.
    pub queue_capacity: usize,
    /// Bound of the event broadcast channel.
    pub event_capacity: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            queue_capacity: 1024,
            event_capacity: 1024,
        }
    }
}

/// Commands consumed by the matcher task in FIFO order.
enum EngineCommand {
    NewOrder {
        order_id: OrderId,
    },
    Cancel {
        user_id: UserId,
        order_id: OrderId,
        reply: oneshot::Sender<Result<CancelReceipt, TradingError>>,
    },
    Settle {
        market_id: MarketId,
        resolution: Resolution,
        reply: oneshot::Sender<Result<SettlementStats, TradingError>>,
    },
    CancelMarket {
        market_id: MarketId,
        reply: oneshot::Sender<Result<CancellationStats, TradingError>>,
    },
    /// Barrier: replies once every previously enqueued command is done.
    Drain { reply: oneshot::Sender<()> },
}

/// Cloneable handle used by request handlers.
#[derive(Clone)]
pub struct EngineHandle {
    ledger: Arc<Ledger>,
    tx: mpsc::Sender<EngineCommand>,
    events: EventSink,
}

impl EngineHandle {
    /// Validate, reserve, persist, and enqueue a new order.
    ///
    /// Returns once the order is accepted; fills are observed through
    /// subsequent reads or the event stream. `price_cents` is required for
    /// limit orders and must be absent for market orders.
    pub async fn place_order(
        &self,
        user_id: UserId,
        market_id: MarketId,
        side: Side,
        contract: Contract,
        price_cents: Option<u32>,
        quantity: u64,
    ) -> Result<Order, TradingError> {
        let order = intake::accept_order(
            &self.ledger,
            user_id,
            market_id,
            side,
            contract,
            price_cents,
            quantity,
            now_nanos(),
        )?;
        self.events.emit(EngineEvent::OrderAccepted {
            order: order.clone(),
        });
        self.tx
            .send(EngineCommand::NewOrder {
                order_id: order.order_id,
            })
            .await
            .map_err(|_| TradingError::EngineUnavailable)?;
        Ok(order)
    }

    /// Cancel an order, releasing its remaining reservation.
    pub async fn cancel_order(
        &self,
        user_id: UserId,
        order_id: OrderId,
    ) -> Result<CancelReceipt, TradingError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(EngineCommand::Cancel {
                user_id,
                order_id,
                reply,
            })
            .await
            .map_err(|_| TradingError::EngineUnavailable)?;
        rx.await.map_err(|_| TradingError::EngineUnavailable)?
    }

    /// Mint complete sets directly against the ledger.
    pub async fn mint_set(
        &self,
        user_id: UserId,
        market_id: MarketId,
        quantity: u64,
    ) -> Result<MintReceipt, TradingError> {
        mint_redeem::mint_set(&self.ledger, user_id, market_id, quantity, now_nanos())
    }

    /// Redeem complete sets directly against the ledger.
    pub async fn redeem_set(
        &self,
        user_id: UserId,
        market_id: MarketId,
        quantity: u64,
    ) -> Result<RedeemReceipt, TradingError> {
        mint_redeem::redeem_set(&self.ledger, user_id, market_id, quantity, now_nanos())
    }

    /// Admin: settle a market with the given resolution.
    pub async fn settle_market(
        &self,
        market_id: MarketId,
        resolution: Resolution,
    ) -> Result<SettlementStats, TradingError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(EngineCommand::Settle {
                market_id,
                resolution,
                reply,
            })
            .await
            .map_err(|_| TradingError::EngineUnavailable)?;
        rx.await.map_err(|_| TradingError::EngineUnavailable)?
    }

    /// Admin: cancel a market, refunding cost bases.
    pub async fn cancel_market(
        &self,
        market_id: MarketId,
    ) -> Result<CancellationStats, TradingError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(EngineCommand::CancelMarket { market_id, reply })
            .await
            .map_err(|_| TradingError::EngineUnavailable)?;
        rx.await.map_err(|_| TradingError::EngineUnavailable)?
    }

    /// Wait until the matcher has drained everything enqueued before this
    /// call. Useful for tests and shutdown.
    pub async fn drain(&self) -> Result<(), TradingError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(EngineCommand::Drain { reply })
            .await
            .map_err(|_| TradingError::EngineUnavailable)?;
        rx.await.map_err(|_| TradingError::EngineUnavailable)
    }

    /// Subscribe to post-commit engine events.
    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<EngineEvent> {
        self.events.subscribe()
    }

    pub fn store(&self) -> &Store {
        self.ledger.store()
    }
}

/// Spawn the matcher task and return the handle request handlers use.
///
/// The in-memory books are rebuilt from persisted open orders before the
/// first command is processed.
pub fn spawn_engine(ledger: Arc<Ledger>, config: EngineConfig) -> (EngineHandle, JoinHandle<()>) {
    let events = EventSink::new(config.event_capacity);
    let (tx, mut rx) = mpsc::channel(config.queue_capacity);
    let mut engine = Engine::recover(ledger.clone(), events.clone(), now_nanos());

    let handle = EngineHandle {
        ledger,
        tx,
        events,
    };

    let join = tokio::spawn(async move {
        tracing::info!("matcher task started");
        while let Some(command) = rx.recv().await {
            let now = now_nanos();
            match command {
                EngineCommand::NewOrder { order_id } => {
                    if let Err(err) = engine.process_new_order(order_id, now) {
                        tracing::warn!(
                            %order_id,
                            %err,
                            "matching failed; cancelling order with refund"
                        );
                        engine.fail_order(order_id, now);
                    }
                }
                EngineCommand::Cancel {
                    user_id,
                    order_id,
                    reply,
                } => {
                    let _ = reply.send(engine.process_cancel(user_id, order_id, now));
                }
                EngineCommand::Settle {
                    market_id,
                    resolution,
                    reply,
                } => {
                    let _ = reply.send(engine.process_settle(market_id, resolution, now));
                }
                EngineCommand::CancelMarket { market_id, reply } => {
                    let _ = reply.send(engine.process_cancel_market(market_id, now));
                }
                EngineCommand::Drain { reply } => {
                    let _ = reply.send(());
                }
            }
        }
        tracing::info!("matcher task stopped");
    });

    (handle, join)
}

/// Current wall clock as unix nanos.
pub fn now_nanos() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system clock before unix epoch")
        .as_nanos() as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine_with_store() -> (EngineHandle, Arc<Store>, JoinHandle<()>) {
        let store = Arc::new(Store::new());
        let ledger = Arc::new(Ledger::new(store.clone()));
        let (handle, join) = spawn_engine(ledger, EngineConfig::default());
        (handle, store, join)
    }

    #[tokio::test]
    async fn test_place_order_returns_on_acceptance() {
        let (handle, store, _join) = engine_with_store();
        let market = store.create_market("m", 0).market_id;
        let user = store.create_user(0).user_id;
        let ledger = Ledger::new(store.clone());
        ledger
            .with_txn(0, |txn| txn.deposit(user, Cents::new(10_000)))
            .unwrap();

        let order = handle
            .place_order(user, market, Side::Buy, Contract::Yes, Some(60), 10)
            .await
            .unwrap();
        assert_eq!(order.status, OrderStatus::Open);

        handle.drain().await.unwrap();
        let resting = store.order(order.order_id).unwrap();
        assert!(resting.book_seq > 0, "matcher assigned the book sequence");
    }

    #[tokio::test]
    async fn test_cancel_round_trip() {
        let (handle, store, _join) = engine_with_store();
        let market = store.create_market("m", 0).market_id;
        let user = store.create_user(0).user_id;
        let ledger = Ledger::new(store.clone());
        ledger
            .with_txn(0, |txn| txn.deposit(user, Cents::new(10_000)))
            .unwrap();

        let order = handle
            .place_order(user, market, Side::Buy, Contract::Yes, Some(60), 10)
            .await
            .unwrap();
        let receipt = handle.cancel_order(user, order.order_id).await.unwrap();

        assert_eq!(receipt.refunded, Cents::new(600));
        assert_eq!(store.user(user).unwrap().reserved_balance, Cents::ZERO);
    }

    #[tokio::test]
    async fn test_cancel_unknown_order() {
        let (handle, store, _join) = engine_with_store();
        let user = store.create_user(0).user_id;

        let err = handle.cancel_order(user, OrderId::new()).await.unwrap_err();
        assert_eq!(err.code(), "ORDER_NOT_FOUND");
    }
}
