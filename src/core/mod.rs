//! Core business logic - framework-agnostic fee ledger and collections
//! operations.
//!
//! `normalizer` is the foundation: every other module reads outstanding
//! balances and statuses through it. `ledger` owns the canonical
//! transaction-type vocabulary. The remaining modules derive the payment,
//! aging, priority, reminder, and effectiveness views from that shared state,
//! and `report` composes them for the rest of the application.

pub mod aging;
pub mod effectiveness;
pub mod ledger;
pub mod normalizer;
pub mod payment;
pub mod priority;
pub mod reminders;
pub mod report;
