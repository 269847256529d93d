//! Market state and resolution types

use crate::ids::MarketId;
use crate::numeric::Price;
use crate::order::Contract;
use serde::{Deserialize, Serialize};

/// Market lifecycle status.
///
/// Once `Settled` or `Cancelled`, no new orders, mints, or redeems are
/// accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MarketStatus {
    Active,
    Settled,
    Cancelled,
}

/// The winning side chosen by the administrator at settlement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Resolution {
    Yes,
    No,
}

impl Resolution {
    /// The contract that pays $1.00 under this resolution.
    pub fn winning_contract(&self) -> Contract {
        match self {
            Resolution::Yes => Contract::Yes,
            Resolution::No => Contract::No,
        }
    }
}

/// A binary YES/NO market.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Market {
    pub market_id: MarketId,
    pub title: String,
    pub status: MarketStatus,
    pub resolution: Option<Resolution>,
    /// Last traded YES price. Tracked independently of `last_no_price`;
    /// mint/merge trades may leave the pair summing away from 100.
    pub last_yes_price: Price,
    pub last_no_price: Price,
    // Best-quote cache maintained after each matching event.
    pub best_yes_bid: Option<Price>,
    pub best_yes_ask: Option<Price>,
    pub best_no_bid: Option<Price>,
    pub best_no_ask: Option<Price>,
    /// Total contracts traded.
    pub total_volume: u64,
    /// Complete sets currently outstanding (YES count == NO count).
    pub shares_outstanding: u64,
    pub created_at: i64,
    pub resolved_at: Option<i64>,
    /// Optimistic-locking version counter.
    pub version: u64,
}

impl Market {
    /// Create a new active market with prices initialised to even odds.
    pub fn new(title: impl Into<String>, timestamp: i64) -> Self {
        Self {
            market_id: MarketId::new(),
            title: title.into(),
            status: MarketStatus::Active,
            resolution: None,
            last_yes_price: Price::new(50),
            last_no_price: Price::new(50),
            best_yes_bid: None,
            best_yes_ask: None,
            best_no_bid: None,
            best_no_ask: None,
            total_volume: 0,
            shares_outstanding: 0,
            created_at: timestamp,
            resolved_at: None,
            version: 0,
        }
    }

    pub fn is_trading_active(&self) -> bool {
        self.status == MarketStatus::Active
    }

    /// Record the leg prices of the most recent trade.
    pub fn set_last_prices(&mut self, yes: Price, no: Price) {
        self.last_yes_price = yes;
        self.last_no_price = no;
    }

    /// Update the cached best quotes for one contract's book.
    pub fn set_quotes(&mut self, contract: Contract, bid: Option<Price>, ask: Option<Price>) {
        match contract {
            Contract::Yes => {
                self.best_yes_bid = bid;
                self.best_yes_ask = ask;
            }
            Contract::No => {
                self.best_no_bid = bid;
                self.best_no_ask = ask;
            }
        }
    }

    /// Implied YES probability in percent, from the last traded price.
    pub fn yes_probability(&self) -> u32 {
        self.last_yes_price.get()
    }
}
