//! SQLite backend for the Order Settlement Engine.
//!
//! * [`db`] holds the low-level queries.
//! * `coordinator` holds the transaction bodies that combine those queries with the pure settlement components.
//! * [`SqliteDatabase`] runs every transaction body atomically, retrying bodies that lost a write conflict.
mod coordinator;
mod sqlite_impl;

pub mod db;
pub use sqlite_impl::SqliteDatabase;
