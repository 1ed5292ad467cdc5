//! # Settlement server
//! This crate hosts the HTTP surface of the order settlement engine. It is responsible for:
//! * Accepting order hand-offs from the storefront checkout, and payment capture signals from the payment gateway.
//! * Settling online orders and point-of-sale checkouts through [`settlement_engine::SettlementApi`].
//! * Dispatching customer notifications (e.g. "welcome to Gold") once a settlement has committed.
//!
//! ## Configuration
//! The server is configured via environment variables. See [config](config/index.html) for more information.
//!
//! ## Routes
//! The server exposes the following routes:
//! * `/health`: A health check route that returns a 200 OK response.
//! * `/api/orders/...`: Order placement, payment, status progression, completion and cancellation.
//! * `/api/pos/sales`: Point-of-sale settlement.
//! * `/api/customers/...`: Customer balances, ledgers and manual point adjustments.
//! * `/api/search/orders`: Order search by customer, outlet, status and date range.
pub mod cli;
pub mod config;
pub mod data_objects;
pub mod errors;
pub mod notifications;
pub mod routes;
pub mod server;

#[cfg(test)]
mod endpoint_tests;
