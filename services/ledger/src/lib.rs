//! Ledger Service
//!
//! The authoritative accounting layer: user accounts, positions, orders,
//! markets, trades, and the append-only transaction log.
//!
//! Every engine event (order acceptance, one match, one cancel, one
//! settlement step) runs inside a [`Txn`] opened from the [`Ledger`]: ledger
//! primitives stage validated mutations against row snapshots, and `commit`
//! applies all of them or none under optimistic row versioning.
//!
//! **Key invariants:**
//! - Conservation of money: internal events sum to zero across users;
//!   only deposits/withdrawals/mints/redeems/settlements move the total.
//! - reserved_balance <= balance, reserved shares <= held shares.
//! - The transaction log is append-only; per-user amounts sum to balance.

pub mod store;
pub mod txn;

pub use store::Store;
pub use txn::{CommitError, EntryRefs, Ledger, Txn};
