//! Error types for Merit ledger operations

use crate::types::Amount;
use thiserror::Error;

/// Result type alias for ledger operations
pub type Result<T> = std::result::Result<T, LedgerError>;

/// Errors that can occur in Merit ledger operations
///
/// Business-rule rejections carry enough structured detail (requested vs
/// available amounts) for the transport layer to render an actionable
/// message. Only the transient variants are eligible for retry.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    // === Amount validation ===
    /// Requested add/deduct amount is zero (amounts are unsigned, so
    /// negative inputs are unrepresentable)
    #[error("Invalid amount: {amount} (must be positive)")]
    InvalidAmount { amount: Amount },

    /// Deduct would drive the balance negative
    #[error("Insufficient balance: requested {requested}, available {available}")]
    InsufficientBalance {
        requested: Amount,
        available: Amount,
    },

    /// Add would overflow the balance; the credit is rejected whole so the
    /// log never records an amount the balance did not absorb
    #[error("Balance overflow: crediting {amount} onto {balance}")]
    BalanceOverflow { balance: Amount, amount: Amount },

    /// A quota-only operation would exceed the remaining daily allowance
    #[error("Insufficient quota: requested {requested}, remaining {remaining}")]
    InsufficientQuota {
        requested: Amount,
        remaining: Amount,
    },

    /// The operation is structurally not allowed to draw from quota
    /// (e.g. a downvote), regardless of how much quota remains
    #[error("Quota cannot fund this operation: {reason}")]
    QuotaNotAllowed { reason: String },

    /// The community's posting mode does not accept ordinary votes.
    /// Checked before any sufficiency check so a structurally-disallowed
    /// operation never reports a misleading shortfall.
    #[error("Voting is disabled in community {0}")]
    VotingDisabled(String),

    // === Routing ===
    /// The operation kind requires a community and none was supplied
    #[error("Community is required for this operation")]
    CommunityRequired,

    /// The referenced community does not exist
    #[error("Community not found: {0}")]
    CommunityNotFound(String),

    /// No wallet exists for the (user, scope) pair and the operation
    /// does not create one
    #[error("Wallet not found for user {user} in scope {scope}")]
    WalletNotFound { user: String, scope: String },

    // === Transient storage failures ===
    /// The wallet row moved underneath an optimistic commit
    #[error("Commit conflict on wallet {wallet_id} (expected version {expected})")]
    CommitConflict { wallet_id: String, expected: u64 },

    /// The storage layer could not complete the atomic unit of work
    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),

    // === General ===
    /// Invalid input that fits no more specific variant
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl LedgerError {
    /// Whether the error is transient and the same atomic unit may be
    /// retried. Everything else is a caller error and must be surfaced
    /// as a rejection, never retried.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::CommitConflict { .. } | Self::StorageUnavailable(_)
        )
    }
}
