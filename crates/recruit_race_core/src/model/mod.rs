//! Domain model for the recruiting race.
//!
//! # Responsibility
//! - Define the persisted shapes of applicant records, participant ledgers
//!   and the campaign window.
//! - Keep wire field names aligned with the stored JSON blobs.
//!
//! # Invariants
//! - Ledger record order is insertion order.
//! - Records are never edited in place; they are only appended or trimmed.

pub mod applicant;
pub mod participant;
pub mod viewer;
pub mod window;
