//! Per-market share holdings
//!
//! A position tracks a user's YES and NO contracts in one market, the
//! portion reserved for open sell orders, the aggregate cost basis of each
//! side, and realized P&L from closed contracts.
//!
//! Invariants: reserved_yes <= yes_quantity, reserved_no <= no_quantity,
//! cost bases non-negative.

use crate::ids::{MarketId, UserId};
use crate::numeric::{Cents, Price, Quantity};
use crate::order::Contract;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    pub user_id: UserId,
    pub market_id: MarketId,
    pub yes_quantity: u64,
    pub no_quantity: u64,
    /// Shares locked in open SELL YES orders.
    pub reserved_yes: u64,
    /// Shares locked in open SELL NO orders.
    pub reserved_no: u64,
    /// Aggregate acquisition cost of the YES side, in cents.
    pub yes_cost_basis: Cents,
    pub no_cost_basis: Cents,
    /// Realized P&L from contracts sold, merged, redeemed, or settled.
    pub realized_pnl: Cents,
    /// Optimistic-locking version counter.
    pub version: u64,
}

impl Position {
    /// Create an empty position row.
    pub fn new(user_id: UserId, market_id: MarketId) -> Self {
        Self {
            user_id,
            market_id,
            yes_quantity: 0,
            no_quantity: 0,
            reserved_yes: 0,
            reserved_no: 0,
            yes_cost_basis: Cents::ZERO,
            no_cost_basis: Cents::ZERO,
            realized_pnl: Cents::ZERO,
            version: 0,
        }
    }

    pub fn quantity(&self, contract: Contract) -> u64 {
        match contract {
            Contract::Yes => self.yes_quantity,
            Contract::No => self.no_quantity,
        }
    }

    pub fn reserved(&self, contract: Contract) -> u64 {
        match contract {
            Contract::Yes => self.reserved_yes,
            Contract::No => self.reserved_no,
        }
    }

    /// Shares not locked in open sell orders.
    pub fn available(&self, contract: Contract) -> u64 {
        self.quantity(contract) - self.reserved(contract)
    }

    pub fn cost_basis(&self, contract: Contract) -> Cents {
        match contract {
            Contract::Yes => self.yes_cost_basis,
            Contract::No => self.no_cost_basis,
        }
    }

    pub fn has_position(&self) -> bool {
        self.yes_quantity > 0 || self.no_quantity > 0
    }

    /// Add shares acquired at the given total cost.
    pub fn credit(&mut self, contract: Contract, quantity: Quantity, cost: Cents) {
        assert!(!cost.is_negative(), "Cost must be non-negative");
        match contract {
            Contract::Yes => {
                self.yes_quantity += quantity.get();
                self.yes_cost_basis += cost;
            }
            Contract::No => {
                self.no_quantity += quantity.get();
                self.no_cost_basis += cost;
            }
        }
        debug_assert!(self.check_invariant());
    }

    /// Earmark shares for an open sell order.
    ///
    /// # Panics
    /// Panics if the quantity exceeds available shares.
    pub fn reserve(&mut self, contract: Contract, quantity: Quantity) {
        assert!(
            quantity.get() <= self.available(contract),
            "Insufficient available {} shares",
            contract
        );
        match contract {
            Contract::Yes => self.reserved_yes += quantity.get(),
            Contract::No => self.reserved_no += quantity.get(),
        }
        debug_assert!(self.check_invariant());
    }

    /// Return earmarked shares to the available pool.
    ///
    /// # Panics
    /// Panics if the quantity exceeds the reservation.
    pub fn release(&mut self, contract: Contract, quantity: Quantity) {
        assert!(
            quantity.get() <= self.reserved(contract),
            "Insufficient reserved {} shares",
            contract
        );
        match contract {
            Contract::Yes => self.reserved_yes -= quantity.get(),
            Contract::No => self.reserved_no -= quantity.get(),
        }
        debug_assert!(self.check_invariant());
    }

    /// Remove reserved shares (sell fill), realizing P&L against the
    /// retired slice of cost basis.
    pub fn consume_reserved(&mut self, contract: Contract, quantity: Quantity, proceeds: Cents) {
        assert!(
            quantity.get() <= self.reserved(contract),
            "Insufficient reserved {} shares",
            contract
        );
        match contract {
            Contract::Yes => self.reserved_yes -= quantity.get(),
            Contract::No => self.reserved_no -= quantity.get(),
        }
        self.burn(contract, quantity, proceeds);
    }

    /// Remove unreserved shares (redeem, settlement), realizing P&L against
    /// the retired slice of cost basis.
    pub fn consume_available(&mut self, contract: Contract, quantity: Quantity, proceeds: Cents) {
        assert!(
            quantity.get() <= self.available(contract),
            "Insufficient available {} shares",
            contract
        );
        self.burn(contract, quantity, proceeds);
    }

    /// Retire shares and a proportional slice of the side's cost basis.
    /// Consuming the whole side retires the whole basis, so no rounding
    /// residue accumulates.
    fn burn(&mut self, contract: Contract, quantity: Quantity, proceeds: Cents) {
        let held = self.quantity(contract);
        let retired = if quantity.get() == held {
            self.cost_basis(contract)
        } else {
            let basis = self.cost_basis(contract).get();
            Cents::new(basis * quantity.get() as i64 / held as i64)
        };

        match contract {
            Contract::Yes => {
                self.yes_quantity -= quantity.get();
                self.yes_cost_basis -= retired;
            }
            Contract::No => {
                self.no_quantity -= quantity.get();
                self.no_cost_basis -= retired;
            }
        }
        self.realized_pnl += proceeds - retired;
        debug_assert!(self.check_invariant());
    }

    /// Mark-to-market P&L of open holdings against the given last prices.
    pub fn unrealized_pnl(&self, last_yes: Price, last_no: Price) -> Cents {
        let yes_value = Cents::new(last_yes.get() as i64 * self.yes_quantity as i64);
        let no_value = Cents::new(last_no.get() as i64 * self.no_quantity as i64);
        yes_value + no_value - self.yes_cost_basis - self.no_cost_basis
    }

    /// Check: reserved <= held, bases non-negative.
    pub fn check_invariant(&self) -> bool {
        self.reserved_yes <= self.yes_quantity
            && self.reserved_no <= self.no_quantity
            && !self.yes_cost_basis.is_negative()
            && !self.no_cost_basis.is_negative()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn position() -> Position {
        Position::new(UserId::new(), MarketId::new())
    }

    #[test]
    fn test_credit_and_basis() {
        let mut pos = position();
        pos.credit(Contract::Yes, Quantity::new(10), Cents::new(600));

        assert_eq!(pos.yes_quantity, 10);
        assert_eq!(pos.yes_cost_basis, Cents::new(600));
        assert_eq!(pos.available(Contract::Yes), 10);
        assert!(pos.check_invariant());
    }

    #[test]
    fn test_reserve_release() {
        let mut pos = position();
        pos.credit(Contract::No, Quantity::new(10), Cents::new(400));
        pos.reserve(Contract::No, Quantity::new(6));

        assert_eq!(pos.available(Contract::No), 4);

        pos.release(Contract::No, Quantity::new(6));
        assert_eq!(pos.available(Contract::No), 10);
    }

    #[test]
    fn test_consume_reserved_realizes_pnl() {
        let mut pos = position();
        pos.credit(Contract::Yes, Quantity::new(10), Cents::new(500));
        pos.reserve(Contract::Yes, Quantity::new(10));

        // Sell all 10 at 60c: proceeds 600, basis 500, pnl +100.
        pos.consume_reserved(Contract::Yes, Quantity::new(10), Cents::new(600));

        assert_eq!(pos.yes_quantity, 0);
        assert_eq!(pos.yes_cost_basis, Cents::ZERO);
        assert_eq!(pos.realized_pnl, Cents::new(100));
    }

    #[test]
    fn test_partial_consume_retires_proportional_basis() {
        let mut pos = position();
        pos.credit(Contract::Yes, Quantity::new(10), Cents::new(500));
        pos.reserve(Contract::Yes, Quantity::new(4));
        pos.consume_reserved(Contract::Yes, Quantity::new(4), Cents::new(260));

        assert_eq!(pos.yes_quantity, 6);
        assert_eq!(pos.yes_cost_basis, Cents::new(300));
        assert_eq!(pos.realized_pnl, Cents::new(60));
    }

    #[test]
    #[should_panic(expected = "Insufficient available YES shares")]
    fn test_reserve_more_than_held_panics() {
        let mut pos = position();
        pos.credit(Contract::Yes, Quantity::new(5), Cents::new(250));
        pos.reserve(Contract::Yes, Quantity::new(6));
    }

    #[test]
    fn test_consume_available_respects_reservation() {
        let mut pos = position();
        pos.credit(Contract::Yes, Quantity::new(10), Cents::new(500));
        pos.reserve(Contract::Yes, Quantity::new(8));

        // Only 2 available; consuming 2 is fine.
        pos.consume_available(Contract::Yes, Quantity::new(2), Cents::new(100));
        assert_eq!(pos.yes_quantity, 8);
        assert_eq!(pos.reserved_yes, 8);
    }

    #[test]
    fn test_unrealized_pnl() {
        let mut pos = position();
        pos.credit(Contract::Yes, Quantity::new(10), Cents::new(500));
        // Marked at 70c: value 700, basis 500 => +200.
        assert_eq!(
            pos.unrealized_pnl(Price::new(70), Price::new(30)),
            Cents::new(200)
        );
    }
}
