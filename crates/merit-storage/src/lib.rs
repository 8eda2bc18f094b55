//! # Merit Storage
//!
//! The transactional storage contract for the Merit ledger, plus an
//! in-memory reference implementation.
//!
//! ## Contract
//!
//! - One wallet row per (user, scope) pair, versioned for optimistic
//!   concurrency ("no lost updates" on concurrent mutations)
//! - An append-only transaction log whose per-wallet order is commit order
//! - Append-only quota-usage records aggregated per (user, community, window)
//! - [`LedgerStore::commit`] is all-or-nothing: the balance change, the log
//!   record, and any quota-usage record land together or not at all

pub mod memory;
pub mod store;

pub use memory::MemoryStore;
pub use store::{LedgerStore, LedgerWrite, Version, VersionedWallet};
