//! # SQLite Database methods
//!
//! This module contains "low-level" SQLite database interactions.
//!
//! All these interaction are maintained by simple functions (rather than stateful structs) that accept a
//! `&mut SqliteConnection` argument. Callers can obtain a connection from a pool,
//! or create an atomic transaction as the need arises and call through to the functions without any other changes.
//!
//! None of these functions apply business rules. Those live in [`crate::settlement`], and the transaction
//! coordinator combines the two.
use std::{env, str::FromStr, time::Duration};

use log::info;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions},
    Error as SqlxError,
    SqlitePool,
};

pub mod coupons;
pub mod customers;
pub mod ledger;
pub mod loyalty_policy;
pub mod orders;
pub mod pos_sales;
pub mod products;

const SQLITE_DB_URL: &str = "sqlite://data/rse_store.db";
const BUSY_TIMEOUT_SECS: u64 = 5;

pub fn db_url() -> String {
    let result = env::var("RSE_DATABASE_URL").unwrap_or_else(|_| {
        info!("🗃️ RSE_DATABASE_URL is not set. Using the default.");
        SQLITE_DB_URL.to_string()
    });
    info!("🗃️ Using database URL: {result}");
    result
}

/// Opens a connection pool in WAL mode. Concurrent writers then fail fast with `SQLITE_BUSY_SNAPSHOT` instead of
/// waiting on each other, and the losing transaction is retried against the winner's committed state.
pub async fn new_pool(url: &str, max_connections: u32) -> Result<SqlitePool, SqlxError> {
    let options = SqliteConnectOptions::from_str(url)?
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(Duration::from_secs(BUSY_TIMEOUT_SECS));
    let pool = SqlitePoolOptions::new().max_connections(max_connections).connect_with(options).await?;
    Ok(pool)
}
