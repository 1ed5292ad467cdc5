//! # Settlement components
//!
//! Pure, I/O-free building blocks of an order settlement. Backends load the aggregates inside a transaction, feed
//! them through these functions, and persist whatever comes back. Nothing in here touches the store, so every
//! function can safely be re-run when the store retries a transaction.
//!
//! * [`tier_policy`] derives the membership tier from cumulative spend.
//! * [`loyalty_ledger`] produces point deltas and ledger entries for earn, redeem and adjustment events.
//! * [`inventory`] applies signed stock deltas to a product's variant and outlet stock.
//! * [`guard`] decides whether a requested status change should run, is already done, or is not allowed.
//! * [`plan`] combines the ledger and tier policy into the complete loyalty outcome of one settlement.
pub mod guard;
pub mod inventory;
pub mod loyalty_ledger;
pub mod plan;
pub mod tier_policy;

pub use guard::GuardDecision;
pub use inventory::{InventoryError, StockDirection};
pub use plan::LoyaltySettlement;
