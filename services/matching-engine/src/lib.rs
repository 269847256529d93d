//! Matching Engine Service
//!
//! Price-time priority matching for binary YES/NO prediction markets.
//! Besides direct matches within one contract's book, the engine performs
//! two cross-book matches that couple the YES and NO sides of a market:
//! mint (two buyers jointly pay $1 to create a complete set) and merge
//! (two sellers jointly receive $1 to destroy one).
//!
//! **Key invariants:**
//! - Price-time priority strictly enforced per book
//! - No self-trades (same-user resting orders are skipped, never matched)
//! - Conservation of money and shares across every matching event
//! - A single matcher task owns all book mutation and fill accounting

pub mod book;
pub mod engine;
pub mod events;
pub mod intake;
pub mod matching;
pub mod mint_redeem;
pub mod recovery;
pub mod service;
pub mod settlement;

pub use engine::{CancelReceipt, Engine};
pub use events::{EngineEvent, EventSink};
pub use mint_redeem::{MintReceipt, RedeemReceipt};
pub use service::{spawn_engine, EngineConfig, EngineHandle};
pub use settlement::SettlementStats;
