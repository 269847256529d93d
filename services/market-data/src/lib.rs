//! Market Data Service
//!
//! Read-only projections over the store for the surrounding API: order book
//! depth snapshots, recent trades, user position views, and OHLC price
//! history. Projections read committed state and may lag the matcher's
//! in-memory books by at most one committed matching event.

pub mod candles;
pub mod positions;
pub mod snapshot;
pub mod trades;

pub use candles::{build_candles, price_history, Candle, Timeframe};
pub use positions::{user_position, PositionView};
pub use snapshot::{order_book_snapshot, BookSnapshot, LevelView};
pub use trades::{recent_trades, TradeView};
