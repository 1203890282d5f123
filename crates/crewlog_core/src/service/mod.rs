//! Use-case services over the record store.
//!
//! # Responsibility
//! - Expose write-through editing surfaces for single records.
//! - Keep callers decoupled from SQL and notification details.
//!
//! # Invariants
//! - Services never bypass store persistence contracts; every mutation
//!   flows through a store operation.

pub mod editor;
