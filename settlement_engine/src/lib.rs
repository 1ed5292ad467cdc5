//! Order Settlement Engine
//!
//! The settlement engine finalizes retail orders, both online orders and point-of-sale checkouts. Settling an order
//! triggers its side effects in a single atomic transaction: stock is taken from the outlet, loyalty points are earned
//! and redeemed, lifetime spend grows, and the customer may be promoted to a higher membership tier.
//!
//! The library is divided into these sections:
//! 1. Pure settlement components ([`mod@settlement`]). The tier policy, loyalty ledger, inventory reconciler and
//!    idempotency guard are plain functions over data types, with no I/O.
//! 2. Backend contracts ([`mod@traits`]) and the SQLite backend ([`SqliteDatabase`]), which runs each settlement as
//!    one transaction.
//! 3. The public API ([`SettlementApi`] and [`CustomerApi`]). Use these rather than the backend directly.
//!
//! The engine also provides a set of events that can be subscribed to (see [`mod@events`]). They are published only
//! after a settlement has committed, which makes them the place to hook in customer notifications.
pub mod config;
pub mod db_types;
pub mod events;
pub mod settlement;
pub mod traits;

mod engine_api;
#[cfg(feature = "sqlite")]
mod sqlite;

#[cfg(feature = "sqlite")]
pub mod test_utils;

pub use config::{EngineConfig, PolicyMode};
pub use engine_api::{customer_api::CustomerApi, order_objects, settlement_api::SettlementApi, settlement_objects};
#[cfg(feature = "sqlite")]
pub use sqlite::{db as sqlite_db, SqliteDatabase};
pub use traits::{CustomerApiError, CustomerManagement, SettlementDatabase, SettlementError};
