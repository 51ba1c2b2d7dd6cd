//! The point ledger core: balance operations, the like transaction, the
//! weekly reset sweep, and read-side aggregation.
//!
//! Every balance mutation in this module goes through one redb write
//! transaction. redb serializes write transactions, so a check-then-write
//! (a debit, the per-card like cap, a reset) commits as a single atomic
//! step with respect to every other writer.

pub mod balances;
pub mod cards;
pub mod likes;
pub mod reset;
pub mod stats;
