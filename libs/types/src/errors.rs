//! Error taxonomy for the trading engine
//!
//! A closed sum of business errors, each carrying a stable machine code and
//! a human message. Validation errors are detected before any reservation;
//! resource errors fail the reservation step with nothing persisted;
//! lifecycle errors leave state untouched. `InvariantViolation` must never
//! surface from a correct engine.

use crate::ids::{OrderId, UserId};
use crate::numeric::Cents;
use crate::order::{Contract, OrderStatus};
use thiserror::Error;

/// Top-level business error for every exposed operation.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TradingError {
    #[error("Market is not active")]
    MarketNotActive,

    #[error("Market not found")]
    MarketNotFound,

    #[error("Invalid price: {0} (must be 1-99 cents)")]
    InvalidPrice(u32),

    #[error("Invalid quantity: {0} (must be at least 1)")]
    InvalidQuantity(u64),

    #[error("Insufficient funds: required {required}, available {available}")]
    InsufficientFunds { required: Cents, available: Cents },

    #[error("Insufficient {contract} position: required {required}, available {available}")]
    InsufficientPosition {
        contract: Contract,
        required: u64,
        available: u64,
    },

    #[error("Order not found: {0}")]
    OrderNotFound(OrderId),

    #[error("Order cannot be cancelled: status is {status:?}")]
    OrderNotCancellable { status: OrderStatus },

    #[error("User not found: {0}")]
    UserNotFound(UserId),

    #[error("Matching engine unavailable")]
    EngineUnavailable,

    #[error("Ledger invariant violated: {0}")]
    InvariantViolation(String),
}

impl TradingError {
    /// Stable machine code for callers and transports.
    pub fn code(&self) -> &'static str {
        match self {
            TradingError::MarketNotActive => "MARKET_NOT_ACTIVE",
            TradingError::MarketNotFound => "MARKET_NOT_FOUND",
            TradingError::InvalidPrice(_) => "INVALID_PRICE",
            TradingError::InvalidQuantity(_) => "INVALID_QUANTITY",
            TradingError::InsufficientFunds { .. } => "INSUFFICIENT_FUNDS",
            TradingError::InsufficientPosition { .. } => "INSUFFICIENT_POSITION",
            TradingError::OrderNotFound(_) => "ORDER_NOT_FOUND",
            TradingError::OrderNotCancellable { .. } => "ORDER_NOT_CANCELLABLE",
            TradingError::UserNotFound(_) => "USER_NOT_FOUND",
            TradingError::EngineUnavailable => "ENGINE_UNAVAILABLE",
            TradingError::InvariantViolation(_) => "INVARIANT_VIOLATION",
        }
    }
}
