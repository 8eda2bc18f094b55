//! # Merit Core
//!
//! Core data structures for the Merit ledger - the virtual-currency
//! accounting subsystem of the community platform.
//!
//! This crate provides the fundamental building blocks:
//! - `Wallet` - one balance per (user, wallet-scope) pair
//! - `Transaction` - the append-only record of every balance change
//! - `QuotaUsage` - consumption records for the renewable daily allowance
//! - `Community` - the external community view the ledger reads
//!
//! No I/O happens here; the storage contract lives in `merit-storage` and
//! orchestration in `merit-ledger`.

pub mod clock;
pub mod community;
pub mod error;
pub mod transaction;
pub mod types;
pub mod wallet;

pub use clock::*;
pub use community::*;
pub use error::*;
pub use transaction::*;
pub use types::*;
pub use wallet::*;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::clock::{midnight_utc, ManualTimeSource, SystemTimeSource, TimeSource};
    pub use crate::community::{Community, CommunitySettings, CurrencySourcePolicy};
    pub use crate::error::{LedgerError, Result};
    pub use crate::transaction::{
        QuotaUsage, QuotaUsageKind, ReferenceType, SourceType, Transaction, TransactionPage,
        TransactionType,
    };
    pub use crate::types::*;
    pub use crate::wallet::Wallet;
}
