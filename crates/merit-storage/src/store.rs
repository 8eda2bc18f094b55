//! The transactional storage contract
//!
//! The ledger pins no persistence engine; any backend satisfying this
//! contract works. The one non-negotiable guarantee is that [`LedgerStore::commit`]
//! applies the wallet balance change and the transaction-log append as a
//! single unit: both writes or neither.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use merit_core::prelude::*;

/// Wallet row version for optimistic concurrency
///
/// A commit carries the version it read; the store rejects the commit with
/// [`LedgerError::CommitConflict`] when the stored version has moved, which
/// closes the lost-update window between two concurrent mutations of the
/// same wallet.
pub type Version = u64;

/// A wallet together with the version it was read at
#[derive(Clone, Debug)]
pub struct VersionedWallet {
    pub wallet: Wallet,
    pub version: Version,
}

/// The atomic unit of work: one balance mutation plus its log record
///
/// `expected_version` is `None` for a freshly created wallet (the commit is
/// an insert and fails on conflict if another task created the same row
/// first). `quota_usage` rides in the same unit when the movement drew from
/// the renewable allowance.
#[derive(Clone, Debug)]
pub struct LedgerWrite {
    pub wallet: Wallet,
    pub expected_version: Option<Version>,
    pub transaction: Transaction,
    pub quota_usage: Option<QuotaUsage>,
}

/// Storage contract for the Merit ledger
///
/// All operations are async; the in-memory reference implementation
/// resolves immediately, a real backend performs I/O. Reads used for
/// advisory purposes (quota estimates) may be stale; only `commit` is
/// strictly consistent.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Load the wallet for a (user, scope) pair, with its version
    async fn load_wallet(
        &self,
        user: &UserId,
        scope: &WalletScope,
    ) -> Result<Option<VersionedWallet>>;

    /// Look up a wallet by its synthetic id
    async fn wallet_by_id(&self, id: &WalletId) -> Result<Option<Wallet>>;

    /// Atomically persist a balance change and append its transaction
    /// record (plus any quota-usage record) - both writes or neither
    async fn commit(&self, write: LedgerWrite) -> Result<()>;

    /// Transaction history for a wallet, newest-first
    async fn transactions_by_wallet(
        &self,
        wallet_id: &WalletId,
        limit: usize,
        offset: usize,
    ) -> Result<TransactionPage>;

    /// Net signed movement on a wallet since `since` (credits minus debits)
    async fn sum_by_wallet_since(
        &self,
        wallet_id: &WalletId,
        since: DateTime<Utc>,
    ) -> Result<i128>;

    /// Total credited for a (reference type, reference id) pair, used by
    /// withdrawal-cap checks before the ledger is touched
    async fn sum_credits_by_reference(
        &self,
        reference_type: ReferenceType,
        reference_id: &ReferenceId,
    ) -> Result<Amount>;

    /// Append a quota-usage record on its own
    ///
    /// Used when a movement is funded entirely by the renewable allowance
    /// and therefore mutates no wallet; a movement with a wallet share
    /// carries its usage record inside [`LedgerStore::commit`] instead.
    async fn record_quota_usage(&self, usage: QuotaUsage) -> Result<()>;

    /// Total quota consumed by a user in a community since `since`
    async fn quota_used_since(
        &self,
        user: &UserId,
        community: &CommunityId,
        since: DateTime<Utc>,
    ) -> Result<Amount>;

    /// Fetch the ledger-relevant view of a community
    async fn community(&self, id: &CommunityId) -> Result<Option<Community>>;

    /// Insert or replace a community view
    async fn upsert_community(&self, community: Community) -> Result<()>;

    /// Advance a community's quota-window boundary
    ///
    /// Historical transactions and usage records are untouched; only the
    /// boundary consumed by future window computations moves.
    async fn set_last_quota_reset(
        &self,
        id: &CommunityId,
        at: DateTime<Utc>,
    ) -> Result<()>;
}
