//! Matching logic module
//!
//! Crossing predicates for the three match types and the executor that
//! applies one matched pair's accounting inside a ledger transaction.

pub mod crossing;
pub mod executor;
