//! # Transaction log records
//!
//! Append-only record of every balance change. Records are created exactly
//! once, inside the same atomic unit as the wallet mutation they document,
//! and are never updated or deleted.
//!
//! ## Ledger consistency
//!
//! For any wallet, `initial_balance + Σ(credits) − Σ(debits)` over its
//! transaction log equals the wallet's current balance.

use crate::error::{LedgerError, Result};
use crate::types::{Amount, CommunityId, ReferenceId, TransactionId, UserId, WalletId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Direction of a balance change
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionType {
    Credit,
    Debit,
}

/// Where the funds came from
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceType {
    /// Standing wallet balance
    Personal,
    /// The renewable daily allowance
    Quota,
}

/// Why the movement happened
///
/// Fixed vocabulary shared with the calling flows; the ledger only tags and
/// aggregates by it, it never interprets the referenced entity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferenceType {
    PublicationCreation,
    PollCreation,
    PollCast,
    PublicationVote,
    VoteVote,
    PublicationWithdrawal,
    CommentWithdrawal,
    VoteWithdrawal,
    AdminCredit,
    AdminDebit,
    FakeDataAdd,
}

impl ReferenceType {
    pub fn name(&self) -> &'static str {
        match self {
            Self::PublicationCreation => "publication_creation",
            Self::PollCreation => "poll_creation",
            Self::PollCast => "poll_cast",
            Self::PublicationVote => "publication_vote",
            Self::VoteVote => "vote_vote",
            Self::PublicationWithdrawal => "publication_withdrawal",
            Self::CommentWithdrawal => "comment_withdrawal",
            Self::VoteWithdrawal => "vote_withdrawal",
            Self::AdminCredit => "admin_credit",
            Self::AdminDebit => "admin_debit",
            Self::FakeDataAdd => "fake_data_add",
        }
    }

    /// Withdrawal movements credit accumulated content score into a wallet
    pub fn is_withdrawal(&self) -> bool {
        matches!(
            self,
            Self::PublicationWithdrawal | Self::CommentWithdrawal | Self::VoteWithdrawal
        )
    }
}

/// One immutable entry in the transaction log
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    /// Synthetic id assigned at append time
    pub id: TransactionId,

    /// Wallet the movement applied to (scope is implicit in the wallet)
    pub wallet_id: WalletId,

    /// Credit or debit
    pub transaction_type: TransactionType,

    /// Positive amount in whole merit units
    pub amount: Amount,

    /// Renewable allowance or standing balance
    pub source_type: SourceType,

    /// Why the movement happened
    pub reference_type: ReferenceType,

    /// The entity that caused the movement
    pub reference_id: ReferenceId,

    /// Optional human description
    pub description: Option<String>,

    /// Append timestamp
    pub created_at: DateTime<Utc>,
}

impl Transaction {
    /// Build a record for appending. Fails only on a non-positive amount;
    /// the caller is responsible for appending it inside the same atomic
    /// unit as the wallet mutation it documents.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        wallet_id: WalletId,
        transaction_type: TransactionType,
        amount: Amount,
        source_type: SourceType,
        reference_type: ReferenceType,
        reference_id: ReferenceId,
        description: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<Self> {
        if amount == 0 {
            return Err(LedgerError::InvalidAmount { amount });
        }
        Ok(Self {
            id: TransactionId::generate(),
            wallet_id,
            transaction_type,
            amount,
            source_type,
            reference_type,
            reference_id,
            description,
            created_at: now,
        })
    }

    /// Signed effect on the wallet balance
    pub fn signed_amount(&self) -> i128 {
        match self.transaction_type {
            TransactionType::Credit => self.amount as i128,
            TransactionType::Debit => -(self.amount as i128),
        }
    }
}

/// What kind of activity consumed quota
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuotaUsageKind {
    Vote,
    PollCast,
    Generic,
}

/// Append-only record of renewable-allowance consumption
///
/// Keyed by (user, community) rather than wallet: priority communities
/// share the global wallet, but quota is always accounted per community.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuotaUsage {
    pub user_id: UserId,
    pub community_id: CommunityId,
    pub amount: Amount,
    pub kind: QuotaUsageKind,
    pub created_at: DateTime<Utc>,
}

/// A page of transaction history, newest-first
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TransactionPage {
    pub transactions: Vec<Transaction>,
    /// Total records for the wallet, before paging
    pub total: usize,
    pub limit: usize,
    pub offset: usize,
}
