//! # Order settlement engine public API
//!
//! The `engine_api` module exposes the programmatic API of the settlement engine.
//!
//! * [`settlement_api`] is the write side. It settles online orders and POS sales, cancels orders, records payments
//!   and administers points, and publishes events once the backend has committed.
//! * [`customer_api`] provides read access to customers, their ledgers, orders, sales and the catalog.
//!
//! The other submodules in this module are support types.
//!
//! # API usage
//!
//! An API instance is created by supplying a database backend that implements the backend traits the API needs.
//!
//! ```rust,ignore
//! use settlement_engine::{CustomerApi, SqliteDatabase};
//! let db = SqliteDatabase::new_with_url(...).await?;
//! // SqliteDatabase implements CustomerManagement
//! let api = CustomerApi::new(db);
//! let customer = api.customer_by_id("cust-1001").await?;
//! ```
pub mod customer_api;
pub mod order_objects;
pub mod settlement_api;
pub mod settlement_objects;
