//! Persistence layer: the record store and its SQL planning.
//!
//! # Responsibility
//! - Own durable storage and retrieval of records with relationship
//!   integrity.
//! - Keep SQL details inside this boundary; query and service layers see
//!   typed records and validated criteria only.
//!
//! # Invariants
//! - Every successful mutation persists before returning and then
//!   notifies all registered observers.
//! - Multi-statement mutations run inside one transaction; no partial
//!   write is ever visible.

pub(crate) mod plan;
pub mod record;
pub mod store;
