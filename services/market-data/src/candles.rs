//! OHLC price-history candles
//!
//! Aggregates YES-side trade prices into fixed timeframes with epoch-aligned
//! boundaries. Direct NO trades contribute their implied YES price, so one
//! series describes the whole market.

use ledger::Store;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use types::prelude::*;

/// Supported candle timeframes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Timeframe {
    /// 1 minute
    M1,
    /// 5 minutes
    M5,
    /// 15 minutes
    M15,
    /// 1 hour
    H1,
    /// 1 day
    D1,
}

impl Timeframe {
    /// Duration of this timeframe in nanoseconds.
    pub fn duration_nanos(&self) -> i64 {
        match self {
            Timeframe::M1 => 60 * 1_000_000_000,
            Timeframe::M5 => 5 * 60 * 1_000_000_000,
            Timeframe::M15 => 15 * 60 * 1_000_000_000,
            Timeframe::H1 => 3600 * 1_000_000_000,
            Timeframe::D1 => 86_400 * 1_000_000_000,
        }
    }

    /// Align a timestamp to this timeframe's boundary (floor).
    pub fn align(&self, timestamp_nanos: i64) -> i64 {
        let duration = self.duration_nanos();
        timestamp_nanos.div_euclid(duration) * duration
    }
}

/// One OHLC candle over the YES price, volume in contracts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candle {
    pub open_time: i64,
    pub close_time: i64,
    pub open: Price,
    pub high: Price,
    pub low: Price,
    pub close: Price,
    pub volume: u64,
    pub trade_count: u64,
}

impl Candle {
    fn new(price: Price, volume: u64, open_time: i64, timeframe: Timeframe) -> Self {
        Self {
            open_time,
            close_time: open_time + timeframe.duration_nanos() - 1,
            open: price,
            high: price,
            low: price,
            close: price,
            volume,
            trade_count: 1,
        }
    }

    fn update(&mut self, price: Price, volume: u64) {
        if price > self.high {
            self.high = price;
        }
        if price < self.low {
            self.low = price;
        }
        self.close = price;
        self.volume += volume;
        self.trade_count += 1;
    }
}

/// Build candles from a trade slice, oldest bucket first.
pub fn build_candles(trades: &[Trade], timeframe: Timeframe) -> Vec<Candle> {
    let mut buckets: BTreeMap<i64, Candle> = BTreeMap::new();
    for trade in trades {
        let open_time = timeframe.align(trade.executed_at);
        let price = trade.yes_price;
        let volume = trade.quantity.get();
        buckets
            .entry(open_time)
            .and_modify(|candle| candle.update(price, volume))
            .or_insert_with(|| Candle::new(price, volume, open_time, timeframe));
    }
    buckets.into_values().collect()
}

/// Price history for a market over a trailing window ending at `until`.
pub fn price_history(
    store: &Store,
    market_id: MarketId,
    timeframe: Timeframe,
    window_nanos: i64,
    until: i64,
) -> Vec<Candle> {
    let since = until - window_nanos;
    let trades: Vec<Trade> = store
        .all_trades()
        .into_iter()
        .filter(|t| t.market_id == market_id && t.executed_at >= since && t.executed_at <= until)
        .collect();
    build_candles(&trades, timeframe)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trade_at(market: MarketId, price: u32, qty: u64, at: i64) -> Trade {
        Trade::direct(
            market,
            Contract::Yes,
            Price::new(price),
            Quantity::new(qty),
            OrderId::new(),
            OrderId::new(),
            UserId::new(),
            UserId::new(),
            at,
        )
    }

    const MINUTE: i64 = 60 * 1_000_000_000;

    #[test]
    fn test_timeframe_alignment() {
        let ts = 3 * MINUTE + 17;
        assert_eq!(Timeframe::M1.align(ts), 3 * MINUTE);
        assert_eq!(Timeframe::M5.align(ts), 0);
    }

    #[test]
    fn test_candle_ohlc() {
        let market = MarketId::new();
        let trades = vec![
            trade_at(market, 50, 1, 10),
            trade_at(market, 65, 2, 20),
            trade_at(market, 45, 1, 30),
            trade_at(market, 55, 3, 40),
        ];

        let candles = build_candles(&trades, Timeframe::M1);
        assert_eq!(candles.len(), 1);

        let candle = &candles[0];
        assert_eq!(candle.open, Price::new(50));
        assert_eq!(candle.high, Price::new(65));
        assert_eq!(candle.low, Price::new(45));
        assert_eq!(candle.close, Price::new(55));
        assert_eq!(candle.volume, 7);
        assert_eq!(candle.trade_count, 4);
    }

    #[test]
    fn test_trades_split_across_buckets() {
        let market = MarketId::new();
        let trades = vec![
            trade_at(market, 50, 1, 0),
            trade_at(market, 60, 1, MINUTE + 1),
        ];

        let candles = build_candles(&trades, Timeframe::M1);
        assert_eq!(candles.len(), 2);
        assert_eq!(candles[0].close, Price::new(50));
        assert_eq!(candles[1].open, Price::new(60));
    }

    #[test]
    fn test_no_trades_contribute_implied_yes_price() {
        let market = MarketId::new();
        let trade = Trade::direct(
            market,
            Contract::No,
            Price::new(30),
            Quantity::new(1),
            OrderId::new(),
            OrderId::new(),
            UserId::new(),
            UserId::new(),
            0,
        );

        let candles = build_candles(&[trade], Timeframe::M1);
        assert_eq!(candles[0].close, Price::new(70));
    }
}
