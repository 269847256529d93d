//! User balance and reservation types
//!
//! Invariant: 0 <= reserved_balance <= balance. The spendable amount is
//! `available() = balance - reserved_balance`.

use crate::ids::UserId;
use crate::numeric::Cents;
use serde::{Deserialize, Serialize};

/// A user's cash account.
///
/// All mutation methods assert the balance invariants; callers validate
/// sufficiency first and surface proper errors. An assertion firing here
/// means an accounting bug, not a user error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserAccount {
    pub user_id: UserId,
    pub balance: Cents,
    pub reserved_balance: Cents,
    pub created_at: i64,
    /// Optimistic-locking version counter.
    pub version: u64,
}

impl UserAccount {
    /// Create a new empty account.
    pub fn new(timestamp: i64) -> Self {
        Self {
            user_id: UserId::new(),
            balance: Cents::ZERO,
            reserved_balance: Cents::ZERO,
            created_at: timestamp,
            version: 0,
        }
    }

    /// Funds not earmarked for open orders.
    pub fn available(&self) -> Cents {
        self.balance - self.reserved_balance
    }

    /// Earmark funds for an open order.
    ///
    /// # Panics
    /// Panics if the amount exceeds available funds.
    pub fn reserve(&mut self, amount: Cents) {
        assert!(!amount.is_negative(), "Reserve amount must be non-negative");
        assert!(amount <= self.available(), "Insufficient available funds");
        self.reserved_balance += amount;
        debug_assert!(self.check_invariant());
    }

    /// Return earmarked funds to the available pool.
    ///
    /// # Panics
    /// Panics if the amount exceeds the reservation.
    pub fn release(&mut self, amount: Cents) {
        assert!(!amount.is_negative(), "Release amount must be non-negative");
        assert!(amount <= self.reserved_balance, "Insufficient reserved funds");
        self.reserved_balance -= amount;
        debug_assert!(self.check_invariant());
    }

    /// Spend earmarked funds: both balance and reservation shrink.
    ///
    /// # Panics
    /// Panics if the amount exceeds the reservation.
    pub fn consume(&mut self, amount: Cents) {
        assert!(!amount.is_negative(), "Consume amount must be non-negative");
        assert!(amount <= self.reserved_balance, "Insufficient reserved funds");
        self.reserved_balance -= amount;
        self.balance -= amount;
        debug_assert!(self.check_invariant());
    }

    /// Credit funds to the available pool.
    pub fn credit(&mut self, amount: Cents) {
        assert!(!amount.is_negative(), "Credit amount must be non-negative");
        self.balance += amount;
        debug_assert!(self.check_invariant());
    }

    /// Withdraw unreserved funds.
    ///
    /// # Panics
    /// Panics if the amount exceeds available funds.
    pub fn debit(&mut self, amount: Cents) {
        assert!(!amount.is_negative(), "Debit amount must be non-negative");
        assert!(amount <= self.available(), "Insufficient available funds");
        self.balance -= amount;
        debug_assert!(self.check_invariant());
    }

    /// Check: 0 <= reserved <= balance.
    pub fn check_invariant(&self) -> bool {
        !self.reserved_balance.is_negative() && self.reserved_balance <= self.balance
    }
}
