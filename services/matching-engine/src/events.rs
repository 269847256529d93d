//! Event structures for the matching engine
//!
//! Events are broadcast to subscribers (projections, notification surfaces)
//! after the corresponding ledger transaction has committed. Emission is
//! fire-and-forget; a lagging or absent subscriber never blocks matching.

use tokio::sync::broadcast;
use types::prelude::*;

/// Events emitted by the engine after commit.
#[derive(Debug, Clone)]
pub enum EngineEvent {
    OrderAccepted {
        order: Order,
    },
    TradeExecuted {
        trade: Trade,
    },
    OrderCancelled {
        order_id: OrderId,
        refunded: Cents,
    },
    MarketSettled {
        market_id: MarketId,
        resolution: Resolution,
        total_payout: Cents,
    },
    MarketCancelled {
        market_id: MarketId,
        total_refunded: Cents,
    },
}

/// Broadcast sink for engine events.
#[derive(Debug, Clone)]
pub struct EventSink {
    tx: broadcast::Sender<EngineEvent>,
}

impl EventSink {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<EngineEvent> {
        self.tx.subscribe()
    }

    /// Emit an event; dropped silently when nobody is listening.
    pub fn emit(&self, event: EngineEvent) {
        match &event {
            EngineEvent::TradeExecuted { trade } => {
                tracing::info!(
                    trade_id = %trade.trade_id,
                    market_id = %trade.market_id,
                    trade_type = ?trade.trade_type,
                    price = trade.price_cents,
                    quantity = %trade.quantity,
                    "trade executed"
                );
            }
            EngineEvent::MarketSettled {
                market_id,
                resolution,
                total_payout,
            } => {
                tracing::info!(%market_id, ?resolution, %total_payout, "market settled");
            }
            EngineEvent::MarketCancelled {
                market_id,
                total_refunded,
            } => {
                tracing::info!(%market_id, %total_refunded, "market cancelled");
            }
            EngineEvent::OrderAccepted { order } => {
                tracing::debug!(order_id = %order.order_id, "order accepted");
            }
            EngineEvent::OrderCancelled { order_id, refunded } => {
                tracing::debug!(%order_id, %refunded, "order cancelled");
            }
        }
        let _ = self.tx.send(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_subscribers_receive_events() {
        let sink = EventSink::new(16);
        let mut rx = sink.subscribe();

        sink.emit(EngineEvent::OrderCancelled {
            order_id: OrderId::new(),
            refunded: Cents::new(600),
        });

        match rx.recv().await.unwrap() {
            EngineEvent::OrderCancelled { refunded, .. } => {
                assert_eq!(refunded, Cents::new(600));
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[test]
    fn test_emit_without_subscribers_is_silent() {
        let sink = EventSink::new(16);
        sink.emit(EngineEvent::OrderAccepted {
            order: Order::new(
                UserId::new(),
                MarketId::new(),
                Side::Buy,
                Contract::Yes,
                OrderKind::Limit(Price::new(50)),
                Quantity::new(1),
                0,
            ),
        });
    }
}
