//! # Backend interface contracts
//!
//! This module defines the behaviour a storage backend must expose to host the Order Settlement Engine.
//!
//! * [`SettlementDatabase`] is the write side. Every method runs as a single atomic transaction in the backend, and
//!   is responsible for loading the aggregates, running the pure settlement components against them, and persisting
//!   the result. A method either commits all of its writes or none of them.
//! * [`CustomerManagement`] is the read side. It provides queries over customers, their ledgers, orders, sales and
//!   the catalog.
//!
//! Backends never publish events or call collaborators from inside a transaction. Anything that must happen after a
//! settlement (such as the "tier up" notification) is returned to the caller as data.
mod customer_management;
mod settlement_database;

pub use customer_management::{CustomerApiError, CustomerManagement};
pub use settlement_database::{SettlementDatabase, SettlementError};
